//! The placed design: instances, top-level ports, pins, and nets.
//!
//! This is the in-memory form of the placed netlist produced by the
//! LEF/DEF reader. It is read-mostly; only repair mutates it (buffer
//! insertion, cell replacement, sink reconnection). All entities live in
//! arenas indexed by their typed IDs, with name indexes for lookup.

use crate::geom::Point;
use crate::ids::{CellId, InstId, NetId, PinId, PortId};
use crate::library::{Library, LibraryPort, PortDirection};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The owner of a pin: an instance or a top-level port.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum PinOwner {
    /// The pin belongs to an instance.
    Instance(InstId),
    /// The pin belongs to a top-level port.
    Port(PortId),
}

/// An occurrence of a library cell in the design.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Instance {
    /// The unique ID of this instance.
    pub id: InstId,
    /// Instance path name (e.g., "u1").
    pub name: String,
    /// The library cell this instance realizes.
    pub cell: CellId,
    /// Placement location in DBU (`None` = unplaced).
    pub location: Option<Point>,
    /// Pins of this instance, one per cell port.
    pub pins: Vec<PinId>,
}

/// A top-level port of the design.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Port {
    /// The unique ID of this port.
    pub id: PortId,
    /// Port name.
    pub name: String,
    /// Direction seen from outside the design.
    pub direction: PortDirection,
    /// Pad location in DBU (`None` = unplaced).
    pub location: Option<Point>,
    /// The pin through which this port connects to a net.
    pub pin: PinId,
}

/// A pin: the connection point of an instance port or top-level port.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Pin {
    /// The unique ID of this pin.
    pub id: PinId,
    /// Port name on the owning instance, or the port name itself for
    /// top-level ports.
    pub name: String,
    /// Direction of the pin relative to its owner.
    pub direction: PortDirection,
    /// The instance or port owning this pin.
    pub owner: PinOwner,
    /// The net this pin is connected to (`None` = unconnected).
    pub net: Option<NetId>,
}

/// A net: a set of electrically connected pins.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Net {
    /// The unique ID of this net.
    pub id: NetId,
    /// Net name. Empty for removed nets.
    pub name: String,
    /// The pins connected to this net.
    pub pins: Vec<PinId>,
}

/// The placed design.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Design {
    /// Design (top cell) name.
    pub name: String,
    /// Database units per micron, for DBU to meters conversion.
    pub dbu_per_micron: f64,
    /// All instances. Removed instances keep their slot with an empty name.
    pub instances: Vec<Instance>,
    /// All top-level ports.
    pub ports: Vec<Port>,
    /// All pins.
    pub pins: Vec<Pin>,
    /// All nets. Removed nets keep their slot with an empty name.
    pub nets: Vec<Net>,
    /// Auxiliary index: instance name to ID (rebuilt on deserialization).
    #[serde(skip)]
    instance_by_name: HashMap<String, InstId>,
    /// Auxiliary index: net name to ID (rebuilt on deserialization).
    #[serde(skip)]
    net_by_name: HashMap<String, NetId>,
}

impl Design {
    /// Creates an empty design with the given name and DBU resolution.
    pub fn new(name: impl Into<String>, dbu_per_micron: f64) -> Self {
        Self {
            name: name.into(),
            dbu_per_micron,
            instances: Vec::new(),
            ports: Vec::new(),
            pins: Vec::new(),
            nets: Vec::new(),
            instance_by_name: HashMap::new(),
            net_by_name: HashMap::new(),
        }
    }

    /// Converts a DBU length to meters.
    pub fn dbu_to_meters(&self, dbu: i64) -> f64 {
        dbu as f64 / self.dbu_per_micron * 1.0e-6
    }

    /// Creates an instance of `cell`, materializing one pin per cell port.
    pub fn make_instance(&mut self, library: &Library, cell: CellId, name: &str) -> InstId {
        let id = InstId::from_raw(self.instances.len() as u32);
        let mut pins = Vec::new();
        for port in &library.cell(cell).ports {
            let pin_id = PinId::from_raw(self.pins.len() as u32);
            self.pins.push(Pin {
                id: pin_id,
                name: port.name.clone(),
                direction: port.direction,
                owner: PinOwner::Instance(id),
                net: None,
            });
            pins.push(pin_id);
        }
        self.instance_by_name.insert(name.to_string(), id);
        self.instances.push(Instance {
            id,
            name: name.to_string(),
            cell,
            location: None,
            pins,
        });
        id
    }

    /// Removes an instance: disconnects its pins and retires its name.
    /// The arena slot is kept so existing IDs stay valid.
    pub fn remove_instance(&mut self, id: InstId) {
        let pins = self.instances[id.as_raw() as usize].pins.clone();
        for pin in pins {
            self.disconnect_pin(pin);
        }
        let inst = &mut self.instances[id.as_raw() as usize];
        self.instance_by_name.remove(&inst.name);
        inst.name.clear();
        inst.pins.clear();
    }

    /// Creates a top-level port and its pin.
    pub fn make_port(&mut self, name: &str, direction: PortDirection) -> PortId {
        let id = PortId::from_raw(self.ports.len() as u32);
        let pin_id = PinId::from_raw(self.pins.len() as u32);
        self.pins.push(Pin {
            id: pin_id,
            name: name.to_string(),
            direction,
            owner: PinOwner::Port(id),
            net: None,
        });
        self.ports.push(Port {
            id,
            name: name.to_string(),
            direction,
            location: None,
            pin: pin_id,
        });
        id
    }

    /// Creates a net with the given name.
    pub fn make_net(&mut self, name: &str) -> NetId {
        let id = NetId::from_raw(self.nets.len() as u32);
        self.net_by_name.insert(name.to_string(), id);
        self.nets.push(Net {
            id,
            name: name.to_string(),
            pins: Vec::new(),
        });
        id
    }

    /// Removes a net: disconnects all its pins and retires its name.
    /// The arena slot is kept so existing IDs stay valid.
    pub fn remove_net(&mut self, id: NetId) {
        let pins = self.nets[id.as_raw() as usize].pins.clone();
        for pin in pins {
            self.pins[pin.as_raw() as usize].net = None;
        }
        let net = &mut self.nets[id.as_raw() as usize];
        self.net_by_name.remove(&net.name);
        net.name.clear();
        net.pins.clear();
    }

    /// Connects a pin to a net, disconnecting it from any previous net
    /// first. A pin is connected to at most one net.
    pub fn connect_pin(&mut self, pin: PinId, net: NetId) {
        if self.pins[pin.as_raw() as usize].net == Some(net) {
            return;
        }
        self.disconnect_pin(pin);
        self.pins[pin.as_raw() as usize].net = Some(net);
        self.nets[net.as_raw() as usize].pins.push(pin);
    }

    /// Disconnects a pin from its net, if connected.
    pub fn disconnect_pin(&mut self, pin: PinId) {
        if let Some(net) = self.pins[pin.as_raw() as usize].net.take() {
            let net = &mut self.nets[net.as_raw() as usize];
            net.pins.retain(|&p| p != pin);
        }
    }

    /// Replaces the library cell of an instance in place.
    ///
    /// The caller is responsible for ensuring the new cell's port
    /// footprint matches; pins keep their names and connections.
    pub fn replace_cell(&mut self, inst: InstId, cell: CellId) {
        self.instances[inst.as_raw() as usize].cell = cell;
    }

    /// Sets the placement location of an instance.
    pub fn set_location(&mut self, inst: InstId, location: Point) {
        self.instances[inst.as_raw() as usize].location = Some(location);
    }

    /// Sets the pad location of a top-level port.
    pub fn set_port_location(&mut self, port: PortId, location: Point) {
        self.ports[port.as_raw() as usize].location = Some(location);
    }

    /// Returns the instance with the given ID.
    pub fn instance(&self, id: InstId) -> &Instance {
        &self.instances[id.as_raw() as usize]
    }

    /// Returns the port with the given ID.
    pub fn port(&self, id: PortId) -> &Port {
        &self.ports[id.as_raw() as usize]
    }

    /// Returns the pin with the given ID.
    pub fn pin(&self, id: PinId) -> &Pin {
        &self.pins[id.as_raw() as usize]
    }

    /// Returns the net with the given ID.
    pub fn net(&self, id: NetId) -> &Net {
        &self.nets[id.as_raw() as usize]
    }

    /// Returns the ID of the instance with the given name, if any.
    pub fn find_instance(&self, name: &str) -> Option<InstId> {
        self.instance_by_name.get(name).copied()
    }

    /// Returns the ID of the net with the given name, if any.
    pub fn find_net(&self, name: &str) -> Option<NetId> {
        self.net_by_name.get(name).copied()
    }

    /// Iterates over live (non-removed) instances.
    pub fn instances(&self) -> impl Iterator<Item = &Instance> {
        self.instances.iter().filter(|i| !i.name.is_empty())
    }

    /// Iterates over live (non-removed) nets.
    pub fn nets(&self) -> impl Iterator<Item = &Net> {
        self.nets.iter().filter(|n| !n.name.is_empty())
    }

    /// Returns the number of live instances.
    pub fn instance_count(&self) -> usize {
        self.instances().count()
    }

    /// Returns the number of live nets.
    pub fn net_count(&self) -> usize {
        self.nets().count()
    }

    /// Returns the number of pins (including pins of removed objects).
    pub fn pin_count(&self) -> usize {
        self.pins.len()
    }

    /// Returns `true` if the pin belongs to a top-level port.
    pub fn is_top_level_port(&self, pin: PinId) -> bool {
        matches!(self.pin(pin).owner, PinOwner::Port(_))
    }

    /// Returns `true` if the pin sources its net: an instance output or a
    /// top-level input port.
    pub fn is_driver(&self, pin: PinId) -> bool {
        let pin = self.pin(pin);
        match pin.owner {
            PinOwner::Instance(_) => pin.direction.is_output(),
            PinOwner::Port(_) => pin.direction.is_input(),
        }
    }

    /// Returns `true` if the pin sinks its net: an instance input or a
    /// top-level output port.
    pub fn is_load(&self, pin: PinId) -> bool {
        let pin = self.pin(pin);
        match pin.owner {
            PinOwner::Instance(_) => pin.direction.is_input(),
            PinOwner::Port(_) => pin.direction.is_output(),
        }
    }

    /// Returns the driver pins of a net.
    pub fn drivers(&self, net: NetId) -> Vec<PinId> {
        self.net(net)
            .pins
            .iter()
            .copied()
            .filter(|&p| self.is_driver(p))
            .collect()
    }

    /// Returns the load pins of a net.
    pub fn loads(&self, net: NetId) -> Vec<PinId> {
        self.net(net)
            .pins
            .iter()
            .copied()
            .filter(|&p| self.is_load(p))
            .collect()
    }

    /// Returns the location of a pin: the owning instance's placement or
    /// the owning port's pad location.
    pub fn pin_location(&self, pin: PinId) -> Option<Point> {
        match self.pin(pin).owner {
            PinOwner::Instance(inst) => self.instance(inst).location,
            PinOwner::Port(port) => self.port(port).location,
        }
    }

    /// Returns the hierarchical path name of a pin (`inst/PORT`, or the
    /// bare port name for top-level ports).
    pub fn pin_path_name(&self, pin: PinId) -> String {
        let p = self.pin(pin);
        match p.owner {
            PinOwner::Instance(inst) => format!("{}/{}", self.instance(inst).name, p.name),
            PinOwner::Port(_) => p.name.clone(),
        }
    }

    /// Returns the library port backing an instance pin, or `None` for
    /// top-level port pins.
    pub fn liberty_port<'l>(&self, library: &'l Library, pin: PinId) -> Option<&'l LibraryPort> {
        let p = self.pin(pin);
        match p.owner {
            PinOwner::Instance(inst) => library.cell(self.instance(inst).cell).port(&p.name),
            PinOwner::Port(_) => None,
        }
    }

    /// Rebuilds the name indexes after deserialization.
    pub fn rebuild_indices(&mut self) {
        self.instance_by_name.clear();
        for (i, inst) in self.instances.iter().enumerate() {
            if !inst.name.is_empty() {
                self.instance_by_name
                    .insert(inst.name.clone(), InstId::from_raw(i as u32));
            }
        }
        self.net_by_name.clear();
        for (i, net) in self.nets.iter().enumerate() {
            if !net.name.is_empty() {
                self.net_by_name
                    .insert(net.name.clone(), NetId::from_raw(i as u32));
            }
        }
    }
}
