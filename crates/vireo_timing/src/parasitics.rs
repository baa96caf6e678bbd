//! Per-net parasitic RC storage.
//!
//! A [`ParasiticNetwork`] holds the extracted RC elements of one net:
//! nodes (aliased to pins where a Steiner point sits on a pin, otherwise
//! keyed by Steiner point index), grounded capacitances per node, and
//! series resistors between nodes. The [`ParasiticStore`] keeps one
//! network per net; registering a new network for a net replaces any
//! previous one.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use vireo_netlist::{NetId, PinId};

/// A node in a parasitic network.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParasiticNode {
    /// The pin this node is aliased to, if any.
    pub pin: Option<PinId>,
    /// The Steiner point index this node represents, if not a pin node.
    pub steiner_pt: Option<u32>,
    /// Grounded capacitance at this node, farads.
    pub cap: f64,
}

/// A series resistor between two parasitic nodes.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Resistor {
    /// First endpoint (node index).
    pub node1: u32,
    /// Second endpoint (node index).
    pub node2: u32,
    /// Resistance in ohms.
    pub ohms: f64,
}

/// The extracted RC network of one net.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParasiticNetwork {
    /// The net this network models.
    pub net: NetId,
    /// All nodes.
    pub nodes: Vec<ParasiticNode>,
    /// All series resistors.
    pub resistors: Vec<Resistor>,
    #[serde(skip)]
    node_by_pin: HashMap<PinId, u32>,
    #[serde(skip)]
    node_by_pt: HashMap<u32, u32>,
}

impl ParasiticNetwork {
    /// Creates an empty network for the given net.
    pub fn new(net: NetId) -> Self {
        Self {
            net,
            nodes: Vec::new(),
            resistors: Vec::new(),
            node_by_pin: HashMap::new(),
            node_by_pt: HashMap::new(),
        }
    }

    /// Returns the node for a pin, creating it on first use.
    pub fn ensure_pin_node(&mut self, pin: PinId) -> u32 {
        if let Some(&n) = self.node_by_pin.get(&pin) {
            return n;
        }
        let n = self.nodes.len() as u32;
        self.nodes.push(ParasiticNode {
            pin: Some(pin),
            steiner_pt: None,
            cap: 0.0,
        });
        self.node_by_pin.insert(pin, n);
        n
    }

    /// Returns the node for a pure Steiner point, creating it on first use.
    pub fn ensure_steiner_node(&mut self, steiner_pt: u32) -> u32 {
        if let Some(&n) = self.node_by_pt.get(&steiner_pt) {
            return n;
        }
        let n = self.nodes.len() as u32;
        self.nodes.push(ParasiticNode {
            pin: None,
            steiner_pt: Some(steiner_pt),
            cap: 0.0,
        });
        self.node_by_pt.insert(steiner_pt, n);
        n
    }

    /// Adds grounded capacitance at a node.
    pub fn incr_cap(&mut self, node: u32, farads: f64) {
        self.nodes[node as usize].cap += farads;
    }

    /// Adds a series resistor between two nodes.
    pub fn make_resistor(&mut self, node1: u32, node2: u32, ohms: f64) {
        self.resistors.push(Resistor { node1, node2, ohms });
    }

    /// Total grounded capacitance of the network, farads.
    pub fn total_cap(&self) -> f64 {
        self.nodes.iter().map(|n| n.cap).sum()
    }

    /// Sum of all series resistances, ohms.
    pub fn total_resistance(&self) -> f64 {
        self.resistors.iter().map(|r| r.ohms).sum()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of resistors.
    pub fn resistor_count(&self) -> usize {
        self.resistors.len()
    }
}

/// Keyed storage of parasitic networks, one per net.
#[derive(Clone, Debug, Default)]
pub struct ParasiticStore {
    networks: HashMap<NetId, ParasiticNetwork>,
}

impl ParasiticStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a network, replacing any previous network for the net.
    pub fn register(&mut self, network: ParasiticNetwork) {
        self.networks.insert(network.net, network);
    }

    /// Returns the network for a net, if one has been extracted.
    pub fn network(&self, net: NetId) -> Option<&ParasiticNetwork> {
        self.networks.get(&net)
    }

    /// Drops the network for a net.
    pub fn remove(&mut self, net: NetId) {
        self.networks.remove(&net);
    }

    /// Number of nets with extracted parasitics.
    pub fn len(&self) -> usize {
        self.networks.len()
    }

    /// Returns `true` if no net has extracted parasitics.
    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }
}
