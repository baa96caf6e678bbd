//! Characterized standard-cell library model.
//!
//! Holds the timing-relevant view of the loaded libraries: cells with
//! per-pin capacitances and electrical limits, timing arcs with delay/slew
//! models, equivalence classes of functionally interchangeable cells, and
//! the buffer predicate used by repair. Parsing the library files is the
//! job of an upstream reader; this module only stores the result.

use crate::ids::CellId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Direction of a port or pin.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum PortDirection {
    /// Signal flows into the cell or design.
    Input,
    /// Signal flows out of the cell or design.
    Output,
    /// Bidirectional signal.
    InOut,
}

impl PortDirection {
    /// Returns `true` for [`Output`](PortDirection::Output).
    pub fn is_output(self) -> bool {
        self == PortDirection::Output
    }

    /// Returns `true` for [`Input`](PortDirection::Input).
    pub fn is_input(self) -> bool {
        self == PortDirection::Input
    }
}

/// A signal transition direction.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Transition {
    /// Low-to-high transition.
    Rise,
    /// High-to-low transition.
    Fall,
}

impl Transition {
    /// Number of transition directions.
    pub const COUNT: usize = 2;

    /// Returns the array index for this transition (rise 0, fall 1).
    pub fn index(self) -> usize {
        match self {
            Transition::Rise => 0,
            Transition::Fall => 1,
        }
    }

    /// Both transitions, in index order.
    pub fn both() -> [Transition; 2] {
        [Transition::Rise, Transition::Fall]
    }
}

/// The role of a timing arc.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum ArcKind {
    /// Combinational propagation from an input pin to an output pin.
    Combinational,
    /// Setup constraint between a clock pin and a data pin.
    SetupCheck,
    /// Hold constraint between a clock pin and a data pin.
    HoldCheck,
    /// Tristate enable arc.
    TristateEnable,
    /// Tristate disable arc.
    TristateDisable,
}

impl ArcKind {
    /// Returns `true` for setup/hold constraint arcs.
    pub fn is_check(self) -> bool {
        matches!(self, ArcKind::SetupCheck | ArcKind::HoldCheck)
    }

    /// Returns `true` if arcs of this kind contribute to target-load
    /// characterization (checks and tristate control arcs do not).
    pub fn is_characterizable(self) -> bool {
        self == ArcKind::Combinational
    }
}

/// Delay and output slew produced by a gate-delay evaluation.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct GateTiming {
    /// Propagation delay through the arc, in seconds.
    pub delay: f64,
    /// Transition time at the output, in seconds.
    pub slew: f64,
}

/// The delay/slew model attached to a timing arc.
///
/// Models are keyed by input slew and output load. A cell whose arcs all
/// carry [`DelayModel::Missing`] cannot be characterized and is excluded
/// from resizing.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub enum DelayModel {
    /// Linear delay model: delay and slew grow linearly with load.
    Linear(LinearDelay),
    /// No gate-delay data available for this arc.
    Missing,
}

/// Coefficients of the linear delay model.
///
/// `delay = intrinsic + resistance * load`
/// `slew  = slew_intrinsic + slew_resistance * load + slew_input_factor * in_slew`
///
/// Both expressions are monotone increasing in load, which the target-load
/// search relies on.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct LinearDelay {
    /// Load-independent delay component, seconds.
    pub intrinsic: f64,
    /// Drive resistance, seconds per farad.
    pub resistance: f64,
    /// Load-independent slew component, seconds.
    pub slew_intrinsic: f64,
    /// Slew sensitivity to load, seconds per farad.
    pub slew_resistance: f64,
    /// Slew sensitivity to input slew, dimensionless.
    pub slew_input_factor: f64,
}

impl DelayModel {
    /// Evaluates the model at the given input slew and output load.
    ///
    /// Returns `None` when the arc has no gate-delay data.
    pub fn gate_delay(&self, in_slew: f64, load_cap: f64) -> Option<GateTiming> {
        match self {
            DelayModel::Linear(m) => Some(GateTiming {
                delay: m.intrinsic + m.resistance * load_cap,
                slew: m.slew_intrinsic + m.slew_resistance * load_cap + m.slew_input_factor * in_slew,
            }),
            DelayModel::Missing => None,
        }
    }
}

/// A timing arc of a library cell.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimingArc {
    /// Name of the source port of this arc.
    pub from_port: String,
    /// Name of the destination port of this arc.
    pub to_port: String,
    /// Transition direction at the source.
    pub from_edge: Transition,
    /// Transition direction at the destination.
    pub to_edge: Transition,
    /// The role of this arc.
    pub kind: ArcKind,
    /// The delay/slew model for this arc.
    pub model: DelayModel,
}

/// A port of a library cell.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LibraryPort {
    /// Port name (e.g., "A", "Z").
    pub name: String,
    /// Direction of the port.
    pub direction: PortDirection,
    /// Input capacitance for a rising transition, farads.
    pub cap_rise: f64,
    /// Input capacitance for a falling transition, farads.
    pub cap_fall: f64,
    /// Maximum capacitance this port may drive, farads.
    pub max_cap: Option<f64>,
    /// Maximum transition time allowed at this port, seconds.
    pub max_slew: Option<f64>,
}

impl LibraryPort {
    /// Returns the capacitance for the given transition direction.
    pub fn capacitance(&self, transition: Transition) -> f64 {
        match transition {
            Transition::Rise => self.cap_rise,
            Transition::Fall => self.cap_fall,
        }
    }

    /// Returns the worst-case (max of rise/fall) capacitance.
    pub fn worst_capacitance(&self) -> f64 {
        self.cap_rise.max(self.cap_fall)
    }
}

/// A characterized library cell.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LibraryCell {
    /// The unique ID of this cell.
    pub id: CellId,
    /// Cell name (e.g., "BUFX4").
    pub name: String,
    /// Logical function key; cells with equal functions form an
    /// equivalence class differing only in drive strength.
    pub function: String,
    /// Whether this cell is a (non-inverting) buffer.
    pub is_buffer: bool,
    /// Whether a physical (LEF) abstract exists for this cell.
    pub has_physical: bool,
    /// Ports of this cell.
    pub ports: Vec<LibraryPort>,
    /// Timing arcs of this cell.
    pub arcs: Vec<TimingArc>,
}

impl LibraryCell {
    /// Returns the port with the given name, if any.
    pub fn port(&self, name: &str) -> Option<&LibraryPort> {
        self.ports.iter().find(|p| p.name == name)
    }

    /// Returns the (input, output) port pair of a buffer cell.
    ///
    /// Returns `None` if the cell is not a buffer or does not have exactly
    /// one input and one output port.
    pub fn buffer_ports(&self) -> Option<(&LibraryPort, &LibraryPort)> {
        if !self.is_buffer {
            return None;
        }
        let mut input = None;
        let mut output = None;
        for port in &self.ports {
            match port.direction {
                PortDirection::Input => {
                    if input.is_some() {
                        return None;
                    }
                    input = Some(port);
                }
                PortDirection::Output => {
                    if output.is_some() {
                        return None;
                    }
                    output = Some(port);
                }
                PortDirection::InOut => return None,
            }
        }
        Some((input?, output?))
    }

    /// Returns all arcs terminating at the named output port.
    pub fn arcs_to<'a>(&'a self, to_port: &'a str) -> impl Iterator<Item = &'a TimingArc> + 'a {
        self.arcs.iter().filter(move |a| a.to_port == to_port)
    }

    /// Returns `true` if `other` exposes exactly the same port names and
    /// directions. Physical-library swaps require a matching footprint so
    /// the placed pin geometry stays valid.
    pub fn footprint_matches(&self, other: &LibraryCell) -> bool {
        if self.ports.len() != other.ports.len() {
            return false;
        }
        self.ports.iter().all(|p| {
            other
                .port(&p.name)
                .is_some_and(|q| q.direction == p.direction)
        })
    }
}

/// The set of loaded libraries, merged into one cell space.
///
/// Cells are stored in an arena indexed by [`CellId`], with a name index
/// and equivalence classes grouped by function. Rebuilding the indexes
/// after deserialization is the caller's responsibility via
/// [`rebuild_indices`](Self::rebuild_indices).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Library {
    /// All cells, indexed by [`CellId`].
    pub cells: Vec<LibraryCell>,
    /// Auxiliary index: cell name to ID (rebuilt on deserialization).
    #[serde(skip)]
    cell_by_name: HashMap<String, CellId>,
    /// Equivalence classes: each entry lists the member cell IDs.
    #[serde(skip)]
    classes: Vec<Vec<CellId>>,
    /// Auxiliary index: cell ID to its class index.
    #[serde(skip)]
    class_of: HashMap<CellId, usize>,
    /// Auxiliary index: function key to class index.
    #[serde(skip)]
    class_by_function: HashMap<String, usize>,
}

impl Library {
    /// Creates an empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a cell and returns its ID. The cell joins the equivalence
    /// class of its function key.
    pub fn add_cell(&mut self, mut cell: LibraryCell) -> CellId {
        let id = CellId::from_raw(self.cells.len() as u32);
        cell.id = id;
        self.cell_by_name.insert(cell.name.clone(), id);
        let class = match self.class_by_function.get(&cell.function) {
            Some(&class) => class,
            None => {
                let class = self.classes.len();
                self.classes.push(Vec::new());
                self.class_by_function.insert(cell.function.clone(), class);
                class
            }
        };
        self.classes[class].push(id);
        self.class_of.insert(id, class);
        self.cells.push(cell);
        id
    }

    /// Returns the cell with the given ID.
    pub fn cell(&self, id: CellId) -> &LibraryCell {
        &self.cells[id.as_raw() as usize]
    }

    /// Returns the ID of the cell with the given name, if any.
    pub fn find_cell(&self, name: &str) -> Option<CellId> {
        self.cell_by_name.get(name).copied()
    }

    /// Returns the number of cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Returns the equivalence class of the given cell (including itself).
    pub fn equiv_cells(&self, id: CellId) -> &[CellId] {
        match self.class_of.get(&id) {
            Some(&class) => &self.classes[class],
            None => std::slice::from_ref(&self.cells[id.as_raw() as usize].id),
        }
    }

    /// Iterates over all buffer cells.
    pub fn buffers(&self) -> impl Iterator<Item = &LibraryCell> {
        self.cells.iter().filter(|c| c.is_buffer)
    }

    /// Rebuilds the name index and equivalence classes after
    /// deserialization.
    pub fn rebuild_indices(&mut self) {
        self.cell_by_name.clear();
        self.classes.clear();
        self.class_of.clear();
        self.class_by_function.clear();
        for i in 0..self.cells.len() {
            let id = CellId::from_raw(i as u32);
            self.cell_by_name.insert(self.cells[i].name.clone(), id);
            let function = self.cells[i].function.clone();
            let class = match self.class_by_function.get(&function) {
                Some(&class) => class,
                None => {
                    let class = self.classes.len();
                    self.classes.push(Vec::new());
                    self.class_by_function.insert(function, class);
                    class
                }
            };
            self.classes[class].push(id);
            self.class_of.insert(id, class);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear(res: f64, slew_res: f64) -> DelayModel {
        DelayModel::Linear(LinearDelay {
            intrinsic: 10.0e-12,
            resistance: res,
            slew_intrinsic: 20.0e-12,
            slew_resistance: slew_res,
            slew_input_factor: 0.1,
        })
    }

    fn make_buffer(name: &str, in_cap: f64, res: f64) -> LibraryCell {
        LibraryCell {
            id: CellId::from_raw(0),
            name: name.into(),
            function: "BUF".into(),
            is_buffer: true,
            has_physical: true,
            ports: vec![
                LibraryPort {
                    name: "A".into(),
                    direction: PortDirection::Input,
                    cap_rise: in_cap,
                    cap_fall: in_cap,
                    max_cap: None,
                    max_slew: None,
                },
                LibraryPort {
                    name: "Z".into(),
                    direction: PortDirection::Output,
                    cap_rise: 0.0,
                    cap_fall: 0.0,
                    max_cap: Some(100.0e-15),
                    max_slew: Some(1.5e-9),
                },
            ],
            arcs: vec![
                TimingArc {
                    from_port: "A".into(),
                    to_port: "Z".into(),
                    from_edge: Transition::Rise,
                    to_edge: Transition::Rise,
                    kind: ArcKind::Combinational,
                    model: linear(res, res),
                },
                TimingArc {
                    from_port: "A".into(),
                    to_port: "Z".into(),
                    from_edge: Transition::Fall,
                    to_edge: Transition::Fall,
                    kind: ArcKind::Combinational,
                    model: linear(res, res),
                },
            ],
        }
    }

    #[test]
    fn linear_model_evaluation() {
        let model = linear(1.0e3, 2.0e3);
        let t = model.gate_delay(0.0, 10.0e-15).unwrap();
        assert!((t.delay - (10.0e-12 + 1.0e3 * 10.0e-15)).abs() < 1e-18);
        assert!((t.slew - (20.0e-12 + 2.0e3 * 10.0e-15)).abs() < 1e-18);
    }

    #[test]
    fn linear_model_input_slew_sensitivity() {
        let model = linear(1.0e3, 2.0e3);
        let fast = model.gate_delay(0.0, 10.0e-15).unwrap();
        let slow = model.gate_delay(1.0e-9, 10.0e-15).unwrap();
        assert!(slow.slew > fast.slew);
    }

    #[test]
    fn missing_model_returns_none() {
        assert!(DelayModel::Missing.gate_delay(0.0, 1.0e-15).is_none());
    }

    #[test]
    fn port_capacitance_lookup() {
        let port = LibraryPort {
            name: "A".into(),
            direction: PortDirection::Input,
            cap_rise: 9.0e-15,
            cap_fall: 11.0e-15,
            max_cap: None,
            max_slew: None,
        };
        assert_eq!(port.capacitance(Transition::Rise), 9.0e-15);
        assert_eq!(port.capacitance(Transition::Fall), 11.0e-15);
        assert_eq!(port.worst_capacitance(), 11.0e-15);
    }

    #[test]
    fn buffer_ports_found() {
        let cell = make_buffer("BUFX1", 5.0e-15, 1.0e3);
        let (input, output) = cell.buffer_ports().unwrap();
        assert_eq!(input.name, "A");
        assert_eq!(output.name, "Z");
    }

    #[test]
    fn buffer_ports_rejects_non_buffer() {
        let mut cell = make_buffer("NOTBUF", 5.0e-15, 1.0e3);
        cell.is_buffer = false;
        assert!(cell.buffer_ports().is_none());
    }

    #[test]
    fn equiv_class_membership() {
        let mut lib = Library::new();
        let b1 = lib.add_cell(make_buffer("BUFX1", 5.0e-15, 4.0e3));
        let b2 = lib.add_cell(make_buffer("BUFX2", 8.0e-15, 2.0e3));
        let b4 = lib.add_cell(make_buffer("BUFX4", 14.0e-15, 1.0e3));
        let class = lib.equiv_cells(b2);
        assert_eq!(class, &[b1, b2, b4]);
    }

    #[test]
    fn distinct_functions_distinct_classes() {
        let mut lib = Library::new();
        let buf = lib.add_cell(make_buffer("BUFX1", 5.0e-15, 4.0e3));
        let mut inv = make_buffer("INVX1", 4.0e-15, 3.0e3);
        inv.function = "INV".into();
        inv.is_buffer = false;
        let inv = lib.add_cell(inv);
        assert_eq!(lib.equiv_cells(buf), &[buf]);
        assert_eq!(lib.equiv_cells(inv), &[inv]);
    }

    #[test]
    fn find_cell_by_name() {
        let mut lib = Library::new();
        let id = lib.add_cell(make_buffer("BUFX2", 8.0e-15, 2.0e3));
        assert_eq!(lib.find_cell("BUFX2"), Some(id));
        assert_eq!(lib.find_cell("BUFX8"), None);
    }

    #[test]
    fn buffers_iterator() {
        let mut lib = Library::new();
        lib.add_cell(make_buffer("BUFX1", 5.0e-15, 4.0e3));
        let mut inv = make_buffer("INVX1", 4.0e-15, 3.0e3);
        inv.function = "INV".into();
        inv.is_buffer = false;
        lib.add_cell(inv);
        assert_eq!(lib.buffers().count(), 1);
    }

    #[test]
    fn footprint_matching() {
        let a = make_buffer("BUFX1", 5.0e-15, 4.0e3);
        let b = make_buffer("BUFX4", 14.0e-15, 1.0e3);
        assert!(a.footprint_matches(&b));

        let mut c = make_buffer("BUFODD", 5.0e-15, 4.0e3);
        c.ports[0].name = "IN".into();
        assert!(!a.footprint_matches(&c));
    }

    #[test]
    fn serde_rebuild_indices() {
        let mut lib = Library::new();
        lib.add_cell(make_buffer("BUFX1", 5.0e-15, 4.0e3));
        lib.add_cell(make_buffer("BUFX2", 8.0e-15, 2.0e3));

        let json = serde_json::to_string(&lib).unwrap();
        let mut restored: Library = serde_json::from_str(&json).unwrap();
        restored.rebuild_indices();

        assert_eq!(restored.cell_count(), 2);
        let id = restored.find_cell("BUFX1").unwrap();
        assert_eq!(restored.equiv_cells(id).len(), 2);
    }

    #[test]
    fn arcs_to_output() {
        let cell = make_buffer("BUFX1", 5.0e-15, 4.0e3);
        assert_eq!(cell.arcs_to("Z").count(), 2);
        assert_eq!(cell.arcs_to("A").count(), 0);
    }

    #[test]
    fn arc_kind_predicates() {
        assert!(ArcKind::SetupCheck.is_check());
        assert!(ArcKind::HoldCheck.is_check());
        assert!(!ArcKind::Combinational.is_check());
        assert!(ArcKind::Combinational.is_characterizable());
        assert!(!ArcKind::TristateEnable.is_characterizable());
        assert!(!ArcKind::TristateDisable.is_characterizable());
        assert!(!ArcKind::SetupCheck.is_characterizable());
    }

    #[test]
    fn transition_indices() {
        assert_eq!(Transition::Rise.index(), 0);
        assert_eq!(Transition::Fall.index(), 1);
        assert_eq!(Transition::both().len(), Transition::COUNT);
    }
}
