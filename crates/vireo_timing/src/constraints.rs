//! Timing constraint types consumed by the analyzer.
//!
//! Defines clocks, output delays, and the design-level transition-time
//! limit. Constraints reference ports by interned [`Ident`]; the analyzer
//! resolves them against netlist names on demand. A single worst-case
//! corner is analyzed.

use serde::{Deserialize, Serialize};
use vireo_common::Ident;

/// A collection of timing constraints for a design.
///
/// Populated by the constraint reader and consumed by the analyzer.
/// All times are in seconds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimingConstraints {
    /// Clock definitions.
    pub clocks: Vec<ClockConstraint>,
    /// Output delay constraints (external delay beyond an output port).
    pub output_delays: Vec<IoDelay>,
    /// Design-level maximum transition time, seconds.
    pub max_slew: Option<f64>,
    /// Per-port maximum transition times, seconds.
    pub port_slew_limits: Vec<PortSlewLimit>,
}

impl TimingConstraints {
    /// Creates an empty set of timing constraints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the clock constraint applied to the given port, if any.
    pub fn find_clock(&self, port: Ident) -> Option<&ClockConstraint> {
        self.clocks.iter().find(|c| c.port == port)
    }

    /// Returns the number of defined clocks.
    pub fn clock_count(&self) -> usize {
        self.clocks.len()
    }

    /// Returns the period of the primary (first-defined) clock, if any.
    pub fn primary_period(&self) -> Option<f64> {
        self.clocks.first().map(|c| c.period)
    }
}

/// A periodic clock applied to a port.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockConstraint {
    /// The name of the clock domain.
    pub name: Ident,
    /// The port the clock is applied to.
    pub port: Ident,
    /// Clock period in seconds.
    pub period: f64,
}

/// An output delay constraint.
///
/// Specifies the external delay between an output port and its capturing
/// clock, tightening the required time at the port.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IoDelay {
    /// The port this delay applies to.
    pub port: Ident,
    /// The reference clock for this delay.
    pub clock: Ident,
    /// The delay value in seconds.
    pub delay: f64,
}

/// A maximum transition time applied to one top-level port.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortSlewLimit {
    /// The port this limit applies to.
    pub port: Ident,
    /// The limit value in seconds.
    pub limit: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use vireo_common::Interner;

    #[test]
    fn empty_constraints() {
        let c = TimingConstraints::new();
        assert_eq!(c.clock_count(), 0);
        assert!(c.primary_period().is_none());
        assert!(c.max_slew.is_none());
    }

    #[test]
    fn find_clock_by_port() {
        let interner = Interner::new();
        let clk = interner.get_or_intern("clk");
        let mut c = TimingConstraints::new();
        c.clocks.push(ClockConstraint {
            name: interner.get_or_intern("core_clk"),
            port: clk,
            period: 2.0e-9,
        });

        assert!(c.find_clock(clk).is_some());
        assert!(c.find_clock(interner.get_or_intern("other")).is_none());
        assert_eq!(c.primary_period(), Some(2.0e-9));
    }

    #[test]
    fn output_delay_fields() {
        let interner = Interner::new();
        let d = IoDelay {
            port: interner.get_or_intern("dout"),
            clock: interner.get_or_intern("clk"),
            delay: 0.5e-9,
        };
        assert_eq!(d.delay, 0.5e-9);
    }

    #[test]
    fn serde_roundtrip() {
        let mut c = TimingConstraints::new();
        c.max_slew = Some(1.5e-9);
        let json = serde_json::to_string(&c).unwrap();
        let back: TimingConstraints = serde_json::from_str(&json).unwrap();
        assert_eq!(back.max_slew, Some(1.5e-9));
    }
}
