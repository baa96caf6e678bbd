//! Static timing analysis and parasitic storage for Vireo.
//!
//! This crate provides the timing view of a placed design: a
//! pin-resolution timing graph with levelization, per-net parasitic RC
//! storage, and a lazy analyzer computing arrival times, required times,
//! driver slews, load capacitances, clock-network membership, and
//! electrical limits. A single worst-case (max) corner is analyzed.
//!
//! # Architecture
//!
//! - [`constraints`] — clocks, output delays, design-level slew limit
//! - [`graph`] — pin-resolution timing graph and levelization
//! - [`parasitics`] — per-net RC networks and the keyed store
//! - [`sta`] — the lazy analyzer and its queries

#![warn(missing_docs)]

pub mod constraints;
pub mod graph;
pub mod ids;
pub mod parasitics;
pub mod sta;

pub use constraints::{ClockConstraint, IoDelay, PortSlewLimit, TimingConstraints};
pub use graph::{TimingEdge, TimingEdgeKind, TimingGraph, TimingVertex};
pub use ids::VertexId;
pub use parasitics::{ParasiticNetwork, ParasiticStore, Resistor};
pub use sta::{AnalysisPoint, MinMax, Sta};

#[cfg(test)]
mod tests {
    use super::*;
    use vireo_netlist::NetId;

    #[test]
    fn reexports_available() {
        let _ = TimingConstraints::new();
        let _ = Sta::new(TimingConstraints::new());
        let _ = ParasiticNetwork::new(NetId::from_raw(0));
        let _ = ParasiticStore::new();
        let _ = VertexId::from_raw(0);
        let _ = AnalysisPoint::max_corner("wc");
    }
}
