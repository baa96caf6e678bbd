//! Placed netlist and characterized-library data model for Vireo.
//!
//! This crate holds the two read-mostly inputs of the engine: the
//! [`Library`] (characterized cells with timing arcs, equivalence classes,
//! and electrical limits) and the [`Design`] (placed instances, top-level
//! ports, pins, and nets). Parsing Liberty and LEF/DEF files is done by
//! upstream readers; this crate only stores their results and exposes the
//! mutators repair needs (connect/disconnect, make instance/net, cell
//! replacement, placement).
//!
//! # Architecture
//!
//! - [`ids`] — typed `u32` IDs for cells, instances, ports, pins, nets
//! - [`geom`] — DBU points and Manhattan distance
//! - [`library`] — cells, ports, timing arcs, delay models, equivalence
//!   classes
//! - [`design`] — the placed netlist and its mutators

#![warn(missing_docs)]

pub mod design;
pub mod geom;
pub mod ids;
pub mod library;

pub use design::{Design, Instance, Net, Pin, PinOwner, Port};
pub use geom::Point;
pub use ids::{CellId, InstId, NetId, PinId, PortId};
pub use library::{
    ArcKind, DelayModel, GateTiming, Library, LibraryCell, LibraryPort, LinearDelay,
    PortDirection, TimingArc, Transition,
};
