//! Parasitic extraction: Steiner branches to pi-model RC networks.
//!
//! Each placed net gets a routing tree from the Steiner builder; every
//! branch becomes a pi model (half the wire capacitance at each end, the
//! wire resistance in between). Zero-length branches get a tiny resistor
//! that only preserves electrical connectivity. The finished network is
//! registered with the timing engine, replacing any previous model for
//! the net.

use crate::steiner::{build_steiner_tree, SteinerPt, SteinerTree};
use vireo_netlist::{Design, NetId};
use vireo_timing::{ParasiticNetwork, Sta};

/// Resistance used to bridge zero-length branches, ohms.
const ZERO_LENGTH_RESISTANCE: f64 = 1.0e-3;

/// Extracts and registers the pi-model parasitics of one net.
///
/// `wire_res` and `wire_cap` are per-meter values. Returns `false` when
/// the net has no driver or unplaced pins; extraction is skipped and any
/// previous model for the net is left in place.
pub fn make_net_parasitics(
    design: &Design,
    net: NetId,
    wire_res: f64,
    wire_cap: f64,
    sta: &mut Sta,
) -> bool {
    let Some(tree) = build_steiner_tree(design, net, false) else {
        return false;
    };
    let mut network = ParasiticNetwork::new(net);
    for branch in tree.branches() {
        let n1 = parasitic_node(&tree, &mut network, branch.from);
        let n2 = parasitic_node(&tree, &mut network, branch.to);
        if n1 == n2 {
            continue;
        }
        if branch.length_dbu == 0 {
            // Keep the connectivity intact across collocated points.
            network.make_resistor(n1, n2, ZERO_LENGTH_RESISTANCE);
        } else {
            let wire_length = design.dbu_to_meters(branch.length_dbu);
            let branch_cap = wire_length * wire_cap;
            let branch_res = wire_length * wire_res;
            network.incr_cap(n1, branch_cap / 2.0);
            network.make_resistor(n1, n2, branch_res);
            network.incr_cap(n2, branch_cap / 2.0);
        }
    }
    sta.register_parasitics(network);
    true
}

/// Extracts parasitics for every live net of the design. Returns the
/// number of nets extracted; unplaced nets are skipped.
pub fn make_design_parasitics(design: &Design, wire_res: f64, wire_cap: f64, sta: &mut Sta) -> usize {
    let nets: Vec<NetId> = design.nets().map(|n| n.id).collect();
    nets.into_iter()
        .filter(|&net| make_net_parasitics(design, net, wire_res, wire_cap, sta))
        .count()
}

/// Pin-carrying points reuse the pin's parasitic node; pure Steiner
/// points get a node keyed by their point index.
fn parasitic_node(tree: &SteinerTree, network: &mut ParasiticNetwork, pt: SteinerPt) -> u32 {
    match tree.pin(pt) {
        Some(pin) => network.ensure_pin_node(pin),
        None => network.ensure_steiner_node(pt),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{linear_design, test_library};
    use vireo_netlist::Point;
    use vireo_timing::TimingConstraints;

    const WIRE_RES: f64 = 2.0e3; // ohms/m
    const WIRE_CAP: f64 = 200.0e-12; // F/m

    #[test]
    fn single_branch_pi_model() {
        let lib = test_library();
        let (design, net) = linear_design(&lib, 1, 10_000);
        let mut sta = Sta::new(TimingConstraints::new());

        assert!(make_net_parasitics(&design, net, WIRE_RES, WIRE_CAP, &mut sta));
        let network = sta.parasitics().network(net).unwrap();

        // 10_000 DBU at 1000 DBU/um = 10 um = 1e-5 m.
        let wire_length = 1.0e-5;
        assert_eq!(network.resistor_count(), 1);
        assert!((network.total_resistance() - wire_length * WIRE_RES).abs() < 1e-12);
        assert!((network.total_cap() - wire_length * WIRE_CAP).abs() < 1e-24);
        // C/2 at each end.
        let caps: Vec<f64> = network.nodes.iter().map(|n| n.cap).collect();
        assert_eq!(caps.len(), 2);
        assert!((caps[0] - caps[1]).abs() < 1e-24);
    }

    #[test]
    fn zero_length_branches_get_connectivity_resistor() {
        let lib = test_library();
        let buf = lib.find_cell("BUFX2").unwrap();
        let mut design = Design::new("top", 1000.0);
        let drvr = design.make_instance(&lib, buf, "drv");
        design.set_location(drvr, Point::new(0, 0));
        let net = design.make_net("n0");
        design.connect_pin(design.instance(drvr).pins[1], net);
        // Two sinks collocated with the driver: every branch is zero length.
        for i in 0..2 {
            let sink = design.make_instance(&lib, buf, &format!("s{i}"));
            design.set_location(sink, Point::new(0, 0));
            design.connect_pin(design.instance(sink).pins[0], net);
        }

        let mut sta = Sta::new(TimingConstraints::new());
        assert!(make_net_parasitics(&design, net, WIRE_RES, WIRE_CAP, &mut sta));
        let network = sta.parasitics().network(net).unwrap();

        // 3 branches (root->junction, junction->leaf, junction->leaf),
        // each bridged by the 1 mOhm connectivity resistor.
        assert_eq!(network.resistor_count(), 3);
        assert!((network.total_resistance() - 3.0e-3).abs() < 1e-9);
        assert_eq!(network.total_cap(), 0.0);
    }

    #[test]
    fn extraction_replaces_previous_model() {
        let lib = test_library();
        let (design, net) = linear_design(&lib, 2, 10_000);
        let mut sta = Sta::new(TimingConstraints::new());

        assert!(make_net_parasitics(&design, net, WIRE_RES, WIRE_CAP, &mut sta));
        let cap_before = sta.parasitics().network(net).unwrap().total_cap();

        // Re-extract with doubled unit capacitance.
        assert!(make_net_parasitics(&design, net, WIRE_RES, 2.0 * WIRE_CAP, &mut sta));
        let cap_after = sta.parasitics().network(net).unwrap().total_cap();
        assert!((cap_after - 2.0 * cap_before).abs() < 1e-24);
    }

    #[test]
    fn unplaced_net_skipped() {
        let lib = test_library();
        let (mut design, net) = linear_design(&lib, 1, 10_000);
        let load = design.loads(net)[0];
        let vireo_netlist::PinOwner::Instance(inst) = design.pin(load).owner else {
            panic!("expected instance pin");
        };
        design.instances[inst.as_raw() as usize].location = None;

        let mut sta = Sta::new(TimingConstraints::new());
        assert!(!make_net_parasitics(&design, net, WIRE_RES, WIRE_CAP, &mut sta));
        assert!(sta.parasitics().network(net).is_none());
    }

    #[test]
    fn design_wide_extraction_counts_placed_nets() {
        let lib = test_library();
        let (mut design, _net) = linear_design(&lib, 2, 10_000);
        // Add an unplaced instance on its own net.
        let buf = lib.find_cell("BUFX1").unwrap();
        let u = design.make_instance(&lib, buf, "floating");
        let n = design.make_net("nf");
        design.connect_pin(design.instance(u).pins[1], n);

        let mut sta = Sta::new(TimingConstraints::new());
        let count = make_design_parasitics(&design, WIRE_RES, WIRE_CAP, &mut sta);
        assert_eq!(count, 1);
        assert_eq!(sta.parasitics().len(), 1);
    }

    #[test]
    fn pin_nodes_are_aliased() {
        let lib = test_library();
        let (design, net) = linear_design(&lib, 3, 5_000);
        let mut sta = Sta::new(TimingConstraints::new());
        assert!(make_net_parasitics(&design, net, WIRE_RES, WIRE_CAP, &mut sta));
        let network = sta.parasitics().network(net).unwrap();

        // One node per pin (driver + 3 sinks) and one per pure Steiner
        // point (2 junctions).
        let pin_nodes = network.nodes.iter().filter(|n| n.pin.is_some()).count();
        let steiner_nodes = network.nodes.iter().filter(|n| n.pin.is_none()).count();
        assert_eq!(pin_nodes, 4);
        assert_eq!(steiner_nodes, 2);
    }
}
