//! Target-load characterization.
//!
//! Two artifacts are produced once per engine lifetime and cached:
//!
//! 1. **Reference output slews** (rise, fall): over every buffer in the
//!    loaded libraries, evaluate each input-to-output arc driving ten
//!    times the buffer's input capacitance, re-apply the model with the
//!    just-computed slew as input slew, and average per output transition.
//! 2. **Per-cell target load**: the load capacitance at which a cell's
//!    output slew equals the reference slew, found by a step-halving
//!    search seeded at 1 pF, averaged over the cell's combinational arcs.

use std::collections::HashMap;
use vireo_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink, Subject};
use vireo_netlist::{CellId, DelayModel, Library, Transition};

/// Fanout factor applied to the buffer input capacitance when deriving
/// the reference slew.
const REFERENCE_FANOUT: f64 = 10.0;

/// Seed capacitance for the target-load search, farads (1 pF).
const SEARCH_CAP_INIT: f64 = 1.0e-12;

/// The search stops when the step falls below this fraction of the seed.
const SEARCH_CAP_TOLERANCE: f64 = 0.001;

/// Reference output slews per transition direction (rise, fall), seconds.
pub type TargetSlews = [f64; Transition::COUNT];

/// Computes the reference output slews from the buffer population.
///
/// Buffers without a usable delay model contribute nothing; a library
/// with no characterizable buffers yields zero slews.
pub fn find_buffer_target_slews(library: &Library) -> TargetSlews {
    let mut slews = [0.0_f64; Transition::COUNT];
    let mut counts = [0_usize; Transition::COUNT];
    for buffer in library.buffers() {
        let Some((input, output)) = buffer.buffer_ports() else {
            continue;
        };
        for arc in buffer.arcs_to(&output.name) {
            if arc.from_port != input.name || !arc.kind.is_characterizable() {
                continue;
            }
            let in_cap = input.capacitance(arc.from_edge);
            let load_cap = in_cap * REFERENCE_FANOUT;
            let Some(first) = arc.model.gate_delay(0.0, load_cap) else {
                continue;
            };
            // One fixed-point pass: feed the computed slew back as the
            // input slew.
            let Some(settled) = arc.model.gate_delay(first.slew, load_cap) else {
                continue;
            };
            slews[arc.to_edge.index()] += settled.slew;
            counts[arc.to_edge.index()] += 1;
        }
    }
    for i in 0..Transition::COUNT {
        if counts[i] > 0 {
            slews[i] /= counts[i] as f64;
        }
    }
    slews
}

/// Computes the target load for every cell in the library.
///
/// Cells with no characterizable arcs get a target load of 0. Cells whose
/// characterizable arcs all lack a gate-delay model are excluded from the
/// map (and thus from resizing) and reported once through the sink.
pub fn find_target_loads(
    library: &Library,
    target_slews: &TargetSlews,
    sink: &DiagnosticSink,
) -> HashMap<CellId, f64> {
    let mut map = HashMap::new();
    for cell in &library.cells {
        let mut sum = 0.0;
        let mut count = 0_usize;
        let mut missing_model = false;
        for arc in &cell.arcs {
            if !arc.kind.is_characterizable() {
                continue;
            }
            match find_target_load(&arc.model, target_slews[arc.from_edge.index()]) {
                Some(load) => {
                    sum += load;
                    count += 1;
                }
                None => missing_model = true,
            }
        }
        if count == 0 && missing_model {
            sink.emit(Diagnostic::warning(
                DiagnosticCode::new(Category::Library, 20),
                "cell has no gate-delay model and cannot be characterized",
                Subject::library_cell(cell.name.clone()),
            ));
            continue;
        }
        let target_load = if count > 0 { sum / count as f64 } else { 0.0 };
        map.insert(cell.id, target_load);
    }
    map
}

/// Finds the load capacitance at which the model's output slew equals
/// `target_slew`, by step halving from the 1 pF seed down to 0.1 % of it.
///
/// The search evaluates the model at zero input slew. Returns `None` when
/// the arc lacks a gate-delay model.
pub fn find_target_load(model: &DelayModel, target_slew: f64) -> Option<f64> {
    model.gate_delay(0.0, SEARCH_CAP_INIT)?;
    let cap_tolerance = SEARCH_CAP_INIT * SEARCH_CAP_TOLERANCE;
    let mut load_cap = SEARCH_CAP_INIT;
    let mut cap_step = SEARCH_CAP_INIT;
    while cap_step > cap_tolerance {
        let timing = model.gate_delay(0.0, load_cap)?;
        if timing.slew > target_slew {
            load_cap -= cap_step;
            cap_step /= 2.0;
        }
        load_cap += cap_step;
    }
    Some(load_cap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::test_library;
    use vireo_netlist::{ArcKind, CellId, LibraryCell, LibraryPort, PortDirection, TimingArc};

    #[test]
    fn reference_slew_matches_fanout_of_ten() {
        let mut lib = Library::new();
        // Single buffer: reference slew is exactly its settled slew at
        // ten times the input capacitance.
        lib.add_cell(LibraryCell {
            id: CellId::from_raw(0),
            name: "BUFX2".into(),
            function: "BUF".into(),
            is_buffer: true,
            has_physical: true,
            ports: vec![
                crate::test_fixtures::input_port("A", 10.0e-15),
                crate::test_fixtures::output_port("Z", 200.0e-15, 1.5e-9),
            ],
            arcs: crate::test_fixtures::comb_arcs(
                "A",
                "Z",
                vireo_netlist::LinearDelay {
                    intrinsic: 35.0e-12,
                    resistance: 4.0e3,
                    slew_intrinsic: 50.0e-12,
                    slew_resistance: 8.0e3,
                    slew_input_factor: 0.1,
                },
            ),
        });

        let slews = find_buffer_target_slews(&lib);
        // load = 100 fF; first pass = 50ps + 8e3*100fF = 850ps;
        // settled = 850ps + 0.1*850ps = 935ps.
        let first = 50.0e-12 + 8.0e3 * 100.0e-15;
        let expected = first + 0.1 * first;
        assert!((slews[0] - expected).abs() < 1e-15);
        assert!((slews[1] - expected).abs() < 1e-15);
    }

    #[test]
    fn reference_slew_averages_buffer_population() {
        let lib = test_library();
        let slews = find_buffer_target_slews(&lib);
        assert!(slews[0] > 0.0);
        assert_eq!(slews[0], slews[1]);

        // The average lies between the slowest and fastest buffer's
        // settled slews.
        let settle = |intrinsic: f64, res: f64, in_cap: f64| {
            let s1 = intrinsic + res * in_cap * 10.0;
            intrinsic + res * in_cap * 10.0 + 0.1 * s1
        };
        let x1 = settle(60.0e-12, 16.0e3, 5.0e-15);
        let x4 = settle(40.0e-12, 4.0e3, 14.0e-15);
        assert!(slews[0] < x1.max(x4));
        assert!(slews[0] > x1.min(x4));
    }

    #[test]
    fn target_load_search_hits_reference_slew() {
        let lib = test_library();
        let slews = find_buffer_target_slews(&lib);
        let sink = DiagnosticSink::new();
        let loads = find_target_loads(&lib, &slews, &sink);

        // Fixpoint property: the model's slew at the per-arc target load
        // equals the reference slew within the 1 fF search tolerance.
        for cell in &lib.cells {
            let Some(&target) = loads.get(&cell.id) else {
                continue;
            };
            assert!(target.is_finite());
            for arc in &cell.arcs {
                if !arc.kind.is_characterizable() {
                    continue;
                }
                let reference = slews[arc.from_edge.index()];
                let per_arc = find_target_load(&arc.model, reference).unwrap();
                let slew = arc.model.gate_delay(0.0, per_arc).unwrap().slew;
                // Slew error bounded by the model slope over the 1 fF
                // search tolerance.
                let slope = arc.model.gate_delay(0.0, per_arc + 1.0e-15).unwrap().slew - slew;
                assert!(
                    (slew - reference).abs() <= 2.0 * slope.abs(),
                    "cell {} slew {slew} missed reference {reference}",
                    cell.name
                );
            }
        }
    }

    #[test]
    fn stronger_cells_get_larger_target_loads() {
        let lib = test_library();
        let slews = find_buffer_target_slews(&lib);
        let sink = DiagnosticSink::new();
        let loads = find_target_loads(&lib, &slews, &sink);

        let x1 = loads[&lib.find_cell("BUFX1").unwrap()];
        let x2 = loads[&lib.find_cell("BUFX2").unwrap()];
        let x4 = loads[&lib.find_cell("BUFX4").unwrap()];
        assert!(x1 < x2);
        assert!(x2 < x4);
    }

    #[test]
    fn uncharacterizable_cell_excluded_with_warning() {
        let mut lib = Library::new();
        lib.add_cell(LibraryCell {
            id: CellId::from_raw(0),
            name: "MACRO".into(),
            function: "MACRO".into(),
            is_buffer: false,
            has_physical: true,
            ports: vec![
                crate::test_fixtures::input_port("A", 10.0e-15),
                crate::test_fixtures::output_port("Z", 200.0e-15, 1.5e-9),
            ],
            arcs: vec![TimingArc {
                from_port: "A".into(),
                to_port: "Z".into(),
                from_edge: Transition::Rise,
                to_edge: Transition::Rise,
                kind: ArcKind::Combinational,
                model: DelayModel::Missing,
            }],
        });

        let sink = DiagnosticSink::new();
        let loads = find_target_loads(&lib, &[100.0e-12, 100.0e-12], &sink);
        assert!(loads.is_empty());
        let diags = sink.diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].subject, Subject::library_cell("MACRO"));
    }

    #[test]
    fn cell_with_no_qualifying_arcs_gets_zero() {
        let mut lib = Library::new();
        lib.add_cell(LibraryCell {
            id: CellId::from_raw(0),
            name: "CHECKONLY".into(),
            function: "CHECKONLY".into(),
            is_buffer: false,
            has_physical: true,
            ports: vec![LibraryPort {
                name: "D".into(),
                direction: PortDirection::Input,
                cap_rise: 5.0e-15,
                cap_fall: 5.0e-15,
                max_cap: None,
                max_slew: None,
            }],
            arcs: vec![TimingArc {
                from_port: "CK".into(),
                to_port: "D".into(),
                from_edge: Transition::Rise,
                to_edge: Transition::Rise,
                kind: ArcKind::SetupCheck,
                model: DelayModel::Missing,
            }],
        });

        let sink = DiagnosticSink::new();
        let loads = find_target_loads(&lib, &[100.0e-12, 100.0e-12], &sink);
        let id = lib.find_cell("CHECKONLY").unwrap();
        assert_eq!(loads[&id], 0.0);
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn search_converges_within_tolerance() {
        let model = DelayModel::Linear(vireo_netlist::LinearDelay {
            intrinsic: 35.0e-12,
            resistance: 4.0e3,
            slew_intrinsic: 50.0e-12,
            slew_resistance: 8.0e3,
            slew_input_factor: 0.1,
        });
        // slew(0, L) = 50ps + 8e3*L == 850ps  =>  L = 100 fF.
        let target = find_target_load(&model, 850.0e-12).unwrap();
        assert!((target - 100.0e-15).abs() < 2.0e-15);
    }

    #[test]
    fn search_rejects_missing_model() {
        assert!(find_target_load(&DelayModel::Missing, 1.0e-10).is_none());
    }
}
