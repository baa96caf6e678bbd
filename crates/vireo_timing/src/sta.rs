//! Lazy static timing analysis over the pin-resolution graph.
//!
//! The [`Sta`] engine computes arrival times (forward propagation in level
//! order), required times (backward propagation from constrained
//! endpoints), and driver slews (from the cells' delay models), and
//! answers the electrical queries repair needs: driver load capacitance,
//! clock-network membership, and slew/capacitance limits.
//!
//! Results are cached and recomputed lazily: mutating the netlist
//! invalidates the graph, registering parasitics invalidates delays, and
//! the next query rebuilds what it needs. Only the single worst-case
//! (max) corner is analyzed.

use crate::constraints::TimingConstraints;
use crate::graph::{TimingEdgeKind, TimingGraph};
use crate::parasitics::{ParasiticNetwork, ParasiticStore};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use vireo_common::Interner;
use vireo_netlist::{
    ArcKind, Design, Library, LibraryCell, NetId, PinId, PinOwner, Transition,
};

/// Analysis side: minimum (early) or maximum (late) delays.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum MinMax {
    /// Early/minimum analysis side. Not computed; present for interface
    /// completeness under the single worst-case corner.
    Min,
    /// Late/maximum analysis side. The side all repair decisions use.
    Max,
}

impl MinMax {
    /// Returns the opposite analysis side.
    pub fn opposite(self) -> MinMax {
        match self {
            MinMax::Min => MinMax::Max,
            MinMax::Max => MinMax::Min,
        }
    }
}

/// The (corner, min/max) tuple delays and parasitics are evaluated under.
///
/// A single worst-case corner is in use; the corner name is carried for
/// reporting.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct AnalysisPoint {
    /// Corner name (e.g., "wc").
    pub corner: String,
    /// Analysis side.
    pub min_max: MinMax,
}

impl AnalysisPoint {
    /// Creates the worst-case max analysis point for a named corner.
    pub fn max_corner(corner: impl Into<String>) -> Self {
        Self {
            corner: corner.into(),
            min_max: MinMax::Max,
        }
    }
}

/// The static timing analyzer.
///
/// Owns the timing graph, the parasitic store, and the cached analysis
/// results. All query methods ensure the caches they need are up to date
/// before answering.
pub struct Sta {
    /// The timing constraints in force.
    pub constraints: TimingConstraints,
    parasitics: ParasiticStore,
    graph: Option<TimingGraph>,
    clock_pins: HashSet<PinId>,
    arrival: Vec<f64>,
    required: Vec<f64>,
    slew: Vec<[f64; 2]>,
    delays_valid: bool,
}

impl Sta {
    /// Creates an analyzer with the given constraints.
    pub fn new(constraints: TimingConstraints) -> Self {
        Self {
            constraints,
            parasitics: ParasiticStore::new(),
            graph: None,
            clock_pins: HashSet::new(),
            arrival: Vec::new(),
            required: Vec::new(),
            slew: Vec::new(),
            delays_valid: false,
        }
    }

    /// Registers a net's extracted parasitics, replacing any previous
    /// network for that net, and invalidates cached delays.
    pub fn register_parasitics(&mut self, network: ParasiticNetwork) {
        self.parasitics.register(network);
        self.delays_invalid();
    }

    /// Returns the parasitic store.
    pub fn parasitics(&self) -> &ParasiticStore {
        &self.parasitics
    }

    /// Invalidates the timing graph (and with it, all cached results).
    /// Call after any netlist mutation.
    pub fn graph_invalid(&mut self) {
        self.graph = None;
        self.delays_valid = false;
    }

    /// Invalidates arrival/required/slew caches while keeping the graph.
    pub fn delays_invalid(&mut self) {
        self.delays_valid = false;
    }

    /// Ensures the timing graph and clock-network set are current.
    pub fn ensure_graph(&mut self, design: &Design, library: &Library, interner: &Interner) {
        if self.graph.is_none() {
            self.graph = Some(TimingGraph::build(design, library));
            self.clock_pins = compute_clock_network(design, library, &self.constraints, interner);
            self.delays_valid = false;
        }
    }

    /// Ensures arrival, required, and slew caches are current.
    pub fn ensure_delays(&mut self, design: &Design, library: &Library, interner: &Interner) {
        self.ensure_graph(design, library, interner);
        if self.delays_valid {
            return;
        }
        let graph = self.graph.as_ref().expect("graph ensured above");
        let n = graph.vertex_count();
        let order = graph.level_order();

        let mut out_edges: Vec<Vec<u32>> = vec![Vec::new(); n];
        for (i, edge) in graph.edges.iter().enumerate() {
            out_edges[edge.from.as_raw() as usize].push(i as u32);
        }

        // Forward pass: arrivals and slews, recording each edge's delay for
        // the backward pass.
        let mut arrival = vec![0.0_f64; n];
        let mut slew = vec![[0.0_f64; 2]; n];
        let mut edge_delay = vec![0.0_f64; graph.edge_count()];
        for &vi in &order {
            let v = vi as usize;
            for &ei in &out_edges[v] {
                let edge = &graph.edges[ei as usize];
                let to = edge.to.as_raw() as usize;
                match edge.kind {
                    TimingEdgeKind::Net { net } => {
                        let delay = net_delay(&self.parasitics, net);
                        edge_delay[ei as usize] = delay;
                        arrival[to] = arrival[to].max(arrival[v] + delay);
                        slew[to][0] = slew[to][0].max(slew[v][0]);
                        slew[to][1] = slew[to][1].max(slew[v][1]);
                    }
                    TimingEdgeKind::Cell { inst } => {
                        let from_pin = design.pin(PinId::from_raw(vi));
                        let to_pin_id = PinId::from_raw(edge.to.as_raw());
                        let to_pin = design.pin(to_pin_id);
                        let load =
                            load_cap_of(design, library, &self.parasitics, to_pin_id);
                        let cell = library.cell(design.instance(inst).cell);
                        for arc in &cell.arcs {
                            if arc.kind != ArcKind::Combinational
                                || arc.from_port != from_pin.name
                                || arc.to_port != to_pin.name
                            {
                                continue;
                            }
                            let in_slew = slew[v][arc.from_edge.index()];
                            if let Some(t) = arc.model.gate_delay(in_slew, load) {
                                edge_delay[ei as usize] = edge_delay[ei as usize].max(t.delay);
                                arrival[to] = arrival[to].max(arrival[v] + t.delay);
                                let out = arc.to_edge.index();
                                slew[to][out] = slew[to][out].max(t.slew);
                            }
                        }
                    }
                }
            }
        }

        // Backward pass: required times from constrained endpoints.
        let period = self.constraints.primary_period();
        let mut required = vec![f64::INFINITY; n];
        for v in 0..n {
            if out_edges[v].is_empty() {
                required[v] = endpoint_required(
                    design,
                    library,
                    &self.constraints,
                    interner,
                    PinId::from_raw(v as u32),
                    period,
                );
            }
        }
        for &vi in order.iter().rev() {
            let v = vi as usize;
            for &ei in &out_edges[v] {
                let edge = &graph.edges[ei as usize];
                let to = edge.to.as_raw() as usize;
                let r = required[to] - edge_delay[ei as usize];
                if r < required[v] {
                    required[v] = r;
                }
            }
        }

        self.arrival = arrival;
        self.required = required;
        self.slew = slew;
        self.delays_valid = true;
    }

    /// Returns the level of a pin's vertex.
    pub fn level(
        &mut self,
        design: &Design,
        library: &Library,
        interner: &Interner,
        pin: PinId,
    ) -> u32 {
        self.ensure_graph(design, library, interner);
        self.graph.as_ref().expect("graph ensured").level(pin)
    }

    /// Returns `true` if the pin is part of the clock network.
    pub fn is_clock(
        &mut self,
        design: &Design,
        library: &Library,
        interner: &Interner,
        pin: PinId,
    ) -> bool {
        self.ensure_graph(design, library, interner);
        self.clock_pins.contains(&pin)
    }

    /// Returns the arrival time at a pin, seconds. Only the max side is
    /// computed; the min side returns 0.
    pub fn arrival(
        &mut self,
        design: &Design,
        library: &Library,
        interner: &Interner,
        pin: PinId,
        min_max: MinMax,
    ) -> f64 {
        self.ensure_delays(design, library, interner);
        match min_max {
            MinMax::Max => self.arrival[pin.as_raw() as usize],
            MinMax::Min => 0.0,
        }
    }

    /// Returns the required time at a pin, seconds. Unconstrained pins
    /// report positive infinity. Only the max side is computed; the min
    /// side returns negative infinity.
    pub fn required(
        &mut self,
        design: &Design,
        library: &Library,
        interner: &Interner,
        pin: PinId,
        min_max: MinMax,
    ) -> f64 {
        self.ensure_delays(design, library, interner);
        match min_max {
            MinMax::Max => self.required[pin.as_raw() as usize],
            MinMax::Min => f64::NEG_INFINITY,
        }
    }

    /// Returns the slack (required − arrival) at a pin, seconds.
    pub fn slack(
        &mut self,
        design: &Design,
        library: &Library,
        interner: &Interner,
        pin: PinId,
    ) -> f64 {
        self.ensure_delays(design, library, interner);
        let i = pin.as_raw() as usize;
        self.required[i] - self.arrival[i]
    }

    /// Returns the transition time at a pin for one direction, seconds.
    pub fn slew(
        &mut self,
        design: &Design,
        library: &Library,
        interner: &Interner,
        pin: PinId,
        transition: Transition,
    ) -> f64 {
        self.ensure_delays(design, library, interner);
        self.slew[pin.as_raw() as usize][transition.index()]
    }

    /// Returns the capacitance a driver pin sees: downstream pin
    /// capacitances plus the net's extracted wire capacitance.
    pub fn load_cap(
        &self,
        design: &Design,
        library: &Library,
        pin: PinId,
        _ap: &AnalysisPoint,
    ) -> f64 {
        load_cap_of(design, library, &self.parasitics, pin)
    }

    /// Resolves the tightest transition-time limit that applies to a pin.
    ///
    /// Starts from the design-level limit, then tightens with the
    /// port-constraint limit for top-level port pins or the library-port
    /// limit for instance pins.
    pub fn slew_limit(
        &self,
        design: &Design,
        library: &Library,
        interner: &Interner,
        pin: PinId,
    ) -> Option<f64> {
        let mut limit = self.constraints.max_slew;
        let mut tighten = |candidate: Option<f64>| {
            limit = match (limit, candidate) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            };
        };
        if let PinOwner::Port(port) = design.pin(pin).owner {
            let port_name = &design.port(port).name;
            tighten(
                self.constraints
                    .port_slew_limits
                    .iter()
                    .find(|l| interner.resolve(l.port) == *port_name)
                    .map(|l| l.limit),
            );
        } else if let Some(port) = design.liberty_port(library, pin) {
            tighten(port.max_slew);
        }
        limit
    }

    /// Returns the capacitance limit of the library port behind a driver
    /// pin, if any.
    pub fn cap_limit(&self, design: &Design, library: &Library, pin: PinId) -> Option<f64> {
        design.liberty_port(library, pin).and_then(|p| p.max_cap)
    }
}

/// Net propagation delay: the lumped `R_total * C_total` Elmore
/// simplification, matching the wire-delay term used during rebuffering.
fn net_delay(parasitics: &ParasiticStore, net: NetId) -> f64 {
    match parasitics.network(net) {
        Some(p) => p.total_resistance() * p.total_cap(),
        None => 0.0,
    }
}

/// Driver load capacitance: downstream library-pin caps (worst of
/// rise/fall) plus extracted wire capacitance.
fn load_cap_of(design: &Design, library: &Library, parasitics: &ParasiticStore, pin: PinId) -> f64 {
    let Some(net) = design.pin(pin).net else {
        return 0.0;
    };
    let mut cap = 0.0;
    for load in design.loads(net) {
        if let Some(port) = design.liberty_port(library, load) {
            cap += port.worst_capacitance();
        }
    }
    if let Some(p) = parasitics.network(net) {
        cap += p.total_cap();
    }
    cap
}

/// Required time at an unclocked-output endpoint.
///
/// Output ports get `period − output_delay`; register data pins get
/// `period − setup`; everything else (clock pins, dangling pins) is
/// unconstrained.
fn endpoint_required(
    design: &Design,
    library: &Library,
    constraints: &TimingConstraints,
    interner: &Interner,
    pin: PinId,
    period: Option<f64>,
) -> f64 {
    let p = design.pin(pin);
    match p.owner {
        PinOwner::Port(port) if p.direction.is_output() => {
            let Some(period) = period else {
                return f64::INFINITY;
            };
            let port_name = &design.port(port).name;
            let output_delay = constraints
                .output_delays
                .iter()
                .find(|d| interner.resolve(d.port) == *port_name)
                .map_or(0.0, |d| d.delay);
            period - output_delay
        }
        PinOwner::Instance(inst) => {
            let cell = library.cell(design.instance(inst).cell);
            let setup = cell
                .arcs
                .iter()
                .filter(|a| a.kind == ArcKind::SetupCheck && a.to_port == p.name)
                .filter_map(|a| a.model.gate_delay(0.0, 0.0))
                .map(|t| t.delay)
                .fold(f64::NEG_INFINITY, f64::max);
            match (period, setup.is_finite()) {
                (Some(period), true) => period - setup,
                _ => f64::INFINITY,
            }
        }
        _ => f64::INFINITY,
    }
}

/// Collects the clock network: every pin reachable from a clock root net
/// through single-input single-output combinational cells (clock buffers
/// and inverters). Register clock pins terminate the traversal.
fn compute_clock_network(
    design: &Design,
    library: &Library,
    constraints: &TimingConstraints,
    interner: &Interner,
) -> HashSet<PinId> {
    let mut pins = HashSet::new();
    let mut nets: Vec<NetId> = Vec::new();
    for clock in &constraints.clocks {
        let port_name = interner.resolve(clock.port);
        if let Some(port) = design.ports.iter().find(|p| p.name == port_name) {
            pins.insert(port.pin);
            if let Some(net) = design.pin(port.pin).net {
                nets.push(net);
            }
        }
    }
    while let Some(net) = nets.pop() {
        for &pin in &design.net(net).pins {
            if !pins.insert(pin) {
                continue;
            }
            let p = design.pin(pin);
            let PinOwner::Instance(inst) = p.owner else {
                continue;
            };
            if !p.direction.is_input() {
                continue;
            }
            let cell = library.cell(design.instance(inst).cell);
            if !is_clock_tree_cell(cell) {
                continue;
            }
            for &out in &design.instance(inst).pins {
                if design.pin(out).direction.is_output() {
                    pins.insert(out);
                    if let Some(out_net) = design.pin(out).net {
                        nets.push(out_net);
                    }
                }
            }
        }
    }
    pins
}

/// A cell the clock tree is built from: one input, one output, and a
/// combinational arc (buffers and inverters).
fn is_clock_tree_cell(cell: &LibraryCell) -> bool {
    let inputs = cell.ports.iter().filter(|p| p.direction.is_input()).count();
    let outputs = cell.ports.iter().filter(|p| p.direction.is_output()).count();
    inputs == 1 && outputs == 1 && cell.arcs.iter().any(|a| a.kind == ArcKind::Combinational)
}
