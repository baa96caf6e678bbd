//! Pin-resolution timing graph with levelization.
//!
//! The graph has one vertex per design pin (the raw [`VertexId`] equals
//! the raw pin index) and directed edges for combinational cell arcs
//! (instance input pin to output pin) and net connections (driver pin to
//! each load pin). Levels are the longest edge count from a startpoint;
//! they strictly increase along every edge, which is what reverse-level
//! driver ordering relies on.

use crate::ids::VertexId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use vireo_netlist::{ArcKind, Design, InstId, Library, NetId, PinId};

/// The semantic type of a timing edge.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum TimingEdgeKind {
    /// Propagation through an instance, from an input pin to an output pin.
    Cell {
        /// The instance the arc belongs to.
        inst: InstId,
    },
    /// Propagation along a net, from the driver pin to a load pin.
    Net {
        /// The net being traversed.
        net: NetId,
    },
}

/// A directed edge in the timing graph.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct TimingEdge {
    /// Source vertex.
    pub from: VertexId,
    /// Destination vertex.
    pub to: VertexId,
    /// What this edge models.
    pub kind: TimingEdgeKind,
}

/// A vertex in the timing graph: one design pin.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct TimingVertex {
    /// The vertex ID (raw index equals the pin's raw index).
    pub id: VertexId,
    /// The pin this vertex represents.
    pub pin: PinId,
    /// Longest edge count from a startpoint.
    pub level: u32,
}

/// The timing graph of a design.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TimingGraph {
    /// All vertices, one per pin.
    pub vertices: Vec<TimingVertex>,
    /// All directed edges.
    pub edges: Vec<TimingEdge>,
}

impl TimingGraph {
    /// Builds the graph for a design and levelizes it.
    ///
    /// Cell edges are created for every (input pin, output pin) pair with
    /// at least one combinational arc; check and tristate-control arcs do
    /// not create edges. Net edges connect each driver to each load.
    pub fn build(design: &Design, library: &Library) -> Self {
        let mut graph = TimingGraph {
            vertices: (0..design.pin_count())
                .map(|i| TimingVertex {
                    id: VertexId::from_raw(i as u32),
                    pin: PinId::from_raw(i as u32),
                    level: 0,
                })
                .collect(),
            edges: Vec::new(),
        };

        let mut seen: HashSet<(PinId, PinId)> = HashSet::new();
        for inst in design.instances() {
            let cell = library.cell(inst.cell);
            for arc in &cell.arcs {
                if arc.kind != ArcKind::Combinational {
                    continue;
                }
                let from = inst
                    .pins
                    .iter()
                    .copied()
                    .find(|&p| design.pin(p).name == arc.from_port);
                let to = inst
                    .pins
                    .iter()
                    .copied()
                    .find(|&p| design.pin(p).name == arc.to_port);
                if let (Some(from), Some(to)) = (from, to) {
                    if seen.insert((from, to)) {
                        graph.edges.push(TimingEdge {
                            from: VertexId::from_raw(from.as_raw()),
                            to: VertexId::from_raw(to.as_raw()),
                            kind: TimingEdgeKind::Cell { inst: inst.id },
                        });
                    }
                }
            }
        }

        for net in design.nets() {
            for drvr in design.drivers(net.id) {
                for load in design.loads(net.id) {
                    graph.edges.push(TimingEdge {
                        from: VertexId::from_raw(drvr.as_raw()),
                        to: VertexId::from_raw(load.as_raw()),
                        kind: TimingEdgeKind::Net { net: net.id },
                    });
                }
            }
        }

        graph.levelize();
        graph
    }

    /// Computes longest-path levels by iterative relaxation.
    ///
    /// The pass count is bounded by the vertex count so a corrupt graph
    /// with a combinational cycle cannot loop forever.
    fn levelize(&mut self) {
        let n = self.vertices.len();
        for _ in 0..n {
            let mut changed = false;
            for edge in &self.edges {
                let from_level = self.vertices[edge.from.as_raw() as usize].level;
                let to = &mut self.vertices[edge.to.as_raw() as usize];
                if to.level < from_level + 1 {
                    to.level = from_level + 1;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
    }

    /// Returns the vertex for a pin.
    pub fn vertex_of_pin(&self, pin: PinId) -> &TimingVertex {
        &self.vertices[pin.as_raw() as usize]
    }

    /// Returns the level of a pin's vertex.
    pub fn level(&self, pin: PinId) -> u32 {
        self.vertex_of_pin(pin).level
    }

    /// Returns the number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Returns the number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns vertex indices sorted by ascending level (ties by index).
    pub fn level_order(&self) -> Vec<u32> {
        let mut order: Vec<u32> = (0..self.vertices.len() as u32).collect();
        order.sort_by_key(|&i| (self.vertices[i as usize].level, i));
        order
    }
}
