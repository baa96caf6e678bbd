//! Shared unit-test fixtures: a small characterized library and placed
//! design builders.

use vireo_netlist::{
    ArcKind, CellId, DelayModel, Design, Library, LibraryCell, LibraryPort, LinearDelay, NetId,
    Point, PortDirection, TimingArc, Transition,
};

pub(crate) fn input_port(name: &str, cap: f64) -> LibraryPort {
    LibraryPort {
        name: name.into(),
        direction: PortDirection::Input,
        cap_rise: cap,
        cap_fall: cap,
        max_cap: None,
        max_slew: None,
    }
}

pub(crate) fn output_port(name: &str, max_cap: f64, max_slew: f64) -> LibraryPort {
    LibraryPort {
        name: name.into(),
        direction: PortDirection::Output,
        cap_rise: 0.0,
        cap_fall: 0.0,
        max_cap: Some(max_cap),
        max_slew: Some(max_slew),
    }
}

pub(crate) fn comb_arcs(from: &str, to: &str, model: LinearDelay) -> Vec<TimingArc> {
    Transition::both()
        .into_iter()
        .map(|edge| TimingArc {
            from_port: from.into(),
            to_port: to.into(),
            from_edge: edge,
            to_edge: edge,
            kind: ArcKind::Combinational,
            model: DelayModel::Linear(model),
        })
        .collect()
}

fn gate(
    name: &str,
    function: &str,
    is_buffer: bool,
    inputs: &[(&str, f64)],
    model: LinearDelay,
) -> LibraryCell {
    let mut ports: Vec<LibraryPort> = inputs
        .iter()
        .map(|(port, cap)| input_port(port, *cap))
        .collect();
    ports.push(output_port("Z", 200.0e-15, 1.5e-9));
    let arcs = inputs
        .iter()
        .flat_map(|(port, _)| comb_arcs(port, "Z", model))
        .collect();
    LibraryCell {
        id: CellId::from_raw(0),
        name: name.into(),
        function: function.into(),
        is_buffer,
        has_physical: true,
        ports,
        arcs,
    }
}

/// Library with a three-member buffer family, a two-member inverter
/// family, a two-input AND gate, and a flip-flop. All delay models are
/// linear and monotone in load.
pub(crate) fn test_library() -> Library {
    let mut lib = Library::new();
    lib.add_cell(gate(
        "BUFX1",
        "BUF",
        true,
        &[("A", 5.0e-15)],
        LinearDelay {
            intrinsic: 40.0e-12,
            resistance: 8.0e3,
            slew_intrinsic: 60.0e-12,
            slew_resistance: 16.0e3,
            slew_input_factor: 0.1,
        },
    ));
    lib.add_cell(gate(
        "BUFX2",
        "BUF",
        true,
        &[("A", 8.0e-15)],
        LinearDelay {
            intrinsic: 35.0e-12,
            resistance: 4.0e3,
            slew_intrinsic: 50.0e-12,
            slew_resistance: 8.0e3,
            slew_input_factor: 0.1,
        },
    ));
    lib.add_cell(gate(
        "BUFX4",
        "BUF",
        true,
        &[("A", 14.0e-15)],
        LinearDelay {
            intrinsic: 30.0e-12,
            resistance: 2.0e3,
            slew_intrinsic: 40.0e-12,
            slew_resistance: 4.0e3,
            slew_input_factor: 0.1,
        },
    ));
    lib.add_cell(gate(
        "INVX1",
        "INV",
        false,
        &[("A", 4.0e-15)],
        LinearDelay {
            intrinsic: 30.0e-12,
            resistance: 7.0e3,
            slew_intrinsic: 55.0e-12,
            slew_resistance: 14.0e3,
            slew_input_factor: 0.1,
        },
    ));
    lib.add_cell(gate(
        "INVX4",
        "INV",
        false,
        &[("A", 12.0e-15)],
        LinearDelay {
            intrinsic: 25.0e-12,
            resistance: 1.75e3,
            slew_intrinsic: 45.0e-12,
            slew_resistance: 3.5e3,
            slew_input_factor: 0.1,
        },
    ));
    lib.add_cell(gate(
        "AND2X1",
        "AND2",
        false,
        &[("A", 6.0e-15), ("B", 6.0e-15)],
        LinearDelay {
            intrinsic: 60.0e-12,
            resistance: 5.0e3,
            slew_intrinsic: 70.0e-12,
            slew_resistance: 10.0e3,
            slew_input_factor: 0.1,
        },
    ));

    let mut dff = LibraryCell {
        id: CellId::from_raw(0),
        name: "DFFX1".into(),
        function: "DFF".into(),
        is_buffer: false,
        has_physical: true,
        ports: vec![
            input_port("D", 6.0e-15),
            input_port("CK", 4.0e-15),
            output_port("Q", 150.0e-15, 1.5e-9),
        ],
        arcs: comb_arcs(
            "CK",
            "Q",
            LinearDelay {
                intrinsic: 80.0e-12,
                resistance: 5.0e3,
                slew_intrinsic: 70.0e-12,
                slew_resistance: 10.0e3,
                slew_input_factor: 0.1,
            },
        ),
    };
    dff.arcs.push(TimingArc {
        from_port: "CK".into(),
        to_port: "D".into(),
        from_edge: Transition::Rise,
        to_edge: Transition::Rise,
        kind: ArcKind::SetupCheck,
        model: DelayModel::Linear(LinearDelay {
            intrinsic: 30.0e-12,
            resistance: 0.0,
            slew_intrinsic: 0.0,
            slew_resistance: 0.0,
            slew_input_factor: 0.0,
        }),
    });
    lib.add_cell(dff);
    lib
}

/// A driver at the origin fanning out to `n_sinks` buffer inputs placed
/// on a horizontal line at multiples of `pitch_dbu`. Returns the design
/// and the fanout net.
pub(crate) fn linear_design(lib: &Library, n_sinks: usize, pitch_dbu: i64) -> (Design, NetId) {
    let buf = lib.find_cell("BUFX2").unwrap();
    let mut design = Design::new("top", 1000.0);
    let drvr = design.make_instance(lib, buf, "drv");
    design.set_location(drvr, Point::new(0, 0));
    let net = design.make_net("n0");
    design.connect_pin(design.instance(drvr).pins[1], net);
    for i in 0..n_sinks {
        let sink = design.make_instance(lib, buf, &format!("s{i}"));
        design.set_location(sink, Point::new(pitch_dbu * (i as i64 + 1), 0));
        design.connect_pin(design.instance(sink).pins[0], net);
    }
    (design, net)
}
