//! Level-sorted driver sequence.
//!
//! Repair walks drivers from the sinks back toward the startpoints so
//! that downstream fanout is already final when an upstream driver is
//! processed. The sequence is sorted by (level ascending, pin path name
//! ascending) — the name tie-break exists solely for determinism — and
//! consumers iterate it in reverse. It is built lazily on first request
//! and invalidated whenever the netlist mutates.

use vireo_common::Interner;
use vireo_netlist::{Design, Library, PinId};
use vireo_timing::Sta;

/// The lazily-built, level-sorted sequence of driver pins.
#[derive(Debug, Default)]
pub struct DriverOrdering {
    drivers: Vec<PinId>,
    valid: bool,
}

impl DriverOrdering {
    /// Creates an empty, invalid ordering.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the sequence stale. Call after any netlist mutation.
    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    /// Returns `true` if the cached sequence is current.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Rebuilds the sequence if stale and returns it, sorted by
    /// (level, path name).
    pub fn ensure<'a>(
        &'a mut self,
        design: &Design,
        library: &Library,
        sta: &mut Sta,
        interner: &Interner,
    ) -> &'a [PinId] {
        if !self.valid {
            let mut keyed: Vec<(u32, String, PinId)> = Vec::new();
            for inst in design.instances() {
                for &pin in &inst.pins {
                    if design.is_driver(pin) {
                        let level = sta.level(design, library, interner, pin);
                        keyed.push((level, design.pin_path_name(pin), pin));
                    }
                }
            }
            for port in &design.ports {
                if design.is_driver(port.pin) {
                    let level = sta.level(design, library, interner, port.pin);
                    keyed.push((level, design.pin_path_name(port.pin), port.pin));
                }
            }
            keyed.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
            self.drivers = keyed.into_iter().map(|(_, _, pin)| pin).collect();
            self.valid = true;
        }
        &self.drivers
    }
}
