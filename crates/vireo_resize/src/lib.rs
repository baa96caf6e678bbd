//! Gate resizing and buffer insertion for placed netlists.
//!
//! After placement and timing setup, this engine improves timing quality
//! with two coordinated transformations:
//!
//! 1. **Resizing** — each driver is swapped for the equivalence-class
//!    member whose characterized target load best matches its actual
//!    load.
//! 2. **Rebuffering** — nets violating capacitance or transition-time
//!    limits get repeater buffers inserted along their routing trees,
//!    placed by a dynamic program that maximizes the driver's required
//!    time.
//!
//! # Usage
//!
//! ```ignore
//! use vireo_resize::{RepairContext, RepairOptions, Resizer};
//!
//! let mut resizer = Resizer::new();
//! let mut ctx = RepairContext::new(&mut design, &library, &mut sta, &interner, &sink);
//! let report = resizer.repair(&mut ctx, &options)?;
//! println!("resized {}, inserted {}", report.resize_count, report.inserted_buffer_count);
//! ```
//!
//! # Architecture
//!
//! - [`steiner`] — routing-tree oracle over placed pins
//! - [`parasitics`] — pi-model extraction registered with the analyzer
//! - [`target_load`] — reference slews and per-cell target loads
//! - [`ordering`] — level-sorted driver sequence
//! - [`resize`] — drive-strength selection
//! - [`rebuffer`] — the buffer-insertion dynamic program
//! - [`options`] — invocation options and errors

#![warn(missing_docs)]

pub mod options;
pub mod ordering;
pub mod parasitics;
pub mod rebuffer;
pub mod resize;
pub mod steiner;
pub mod target_load;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use options::{RepairError, RepairOptions};
pub use ordering::DriverOrdering;
pub use parasitics::{make_design_parasitics, make_net_parasitics};
pub use resize::{resize_to_target_load, single_output_pin};
pub use steiner::{build_steiner_tree, SteinerBranch, SteinerNode, SteinerPt, SteinerTree};
pub use target_load::{
    find_buffer_target_slews, find_target_load, find_target_loads, TargetSlews,
};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use vireo_common::Interner;
use vireo_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink, Subject};
use vireo_netlist::{CellId, Design, InstId, Library, NetId, PinOwner};
use vireo_timing::{AnalysisPoint, Sta};

/// Borrowed collaborators for one engine invocation.
///
/// The engine mutates the design and the analyzer; the library, interner,
/// and sink are shared.
pub struct RepairContext<'a> {
    /// The placed design being repaired.
    pub design: &'a mut Design,
    /// The characterized library.
    pub library: &'a Library,
    /// The timing analyzer.
    pub sta: &'a mut Sta,
    /// Interner resolving constraint identifiers.
    pub interner: &'a Interner,
    /// Destination for warnings and summaries.
    pub sink: &'a DiagnosticSink,
}

impl<'a> RepairContext<'a> {
    /// Bundles the collaborators for one invocation.
    pub fn new(
        design: &'a mut Design,
        library: &'a Library,
        sta: &'a mut Sta,
        interner: &'a Interner,
        sink: &'a DiagnosticSink,
    ) -> Self {
        Self {
            design,
            library,
            sta,
            interner,
            sink,
        }
    }
}

/// Counts reported by a repair invocation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairReport {
    /// Instances whose cell was replaced.
    pub resize_count: usize,
    /// Buffers inserted by rebuffering.
    pub inserted_buffer_count: usize,
    /// Nets that received at least one buffer.
    pub rebuffer_net_count: usize,
}

/// The resizer/rebuffer engine.
///
/// One long-lived object holding the analysis corner, wire RC,
/// characterization caches, the level-sorted driver sequence, and the
/// unique-name counters. Counters are engine-scoped and reset only when a
/// new engine is created.
pub struct Resizer {
    wire_res: f64,
    wire_cap: f64,
    corner: AnalysisPoint,
    tgt_slews: Option<TargetSlews>,
    target_load_map: Option<HashMap<CellId, f64>>,
    ordering: DriverOrdering,
    unique_net_index: u64,
    unique_buffer_index: u64,
    resize_count: usize,
    inserted_buffer_count: usize,
    rebuffer_net_count: usize,
}

impl Resizer {
    /// Creates an engine with no wire RC and empty caches.
    pub fn new() -> Self {
        Self {
            wire_res: 0.0,
            wire_cap: 0.0,
            corner: AnalysisPoint::max_corner("default"),
            tgt_slews: None,
            target_load_map: None,
            ordering: DriverOrdering::new(),
            unique_net_index: 1,
            unique_buffer_index: 1,
            resize_count: 0,
            inserted_buffer_count: 0,
            rebuffer_net_count: 0,
        }
    }

    /// Sets the per-meter wire RC and the analysis corner, then extracts
    /// parasitics for every placed net of the design.
    pub fn set_wire_rc(
        &mut self,
        design: &Design,
        sta: &mut Sta,
        wire_res: f64,
        wire_cap: f64,
        corner: AnalysisPoint,
    ) {
        self.wire_res = wire_res;
        self.wire_cap = wire_cap;
        self.corner = corner;
        // Incremental timing is off the table once the wire model changes.
        sta.delays_invalid();
        make_design_parasitics(design, wire_res, wire_cap, sta);
    }

    /// Runs the configured transformations and returns the counts.
    ///
    /// Fails synchronously on configuration errors (non-positive wire RC,
    /// missing or unusable buffer cell). Everything else is local
    /// recovery: problem drivers are skipped with a diagnostic at most.
    pub fn repair(
        &mut self,
        ctx: &mut RepairContext,
        options: &RepairOptions,
    ) -> Result<RepairReport, RepairError> {
        let buffer_cell = options.validate(ctx.library)?;
        self.set_wire_rc(
            ctx.design,
            ctx.sta,
            options.wire_res_per_meter,
            options.wire_cap_per_meter,
            AnalysisPoint::max_corner(options.corner.clone()),
        );
        self.init();
        self.ensure_target_loads(ctx.library, ctx.sink);

        if options.resize {
            self.resize_all(ctx);
            ctx.sink.emit(Diagnostic::note(
                DiagnosticCode::new(Category::Timing, 1),
                format!("resized {} instances", self.resize_count),
                Subject::Design,
            ));
        }
        if options.repairs_requested() {
            let buffer_cell = buffer_cell.ok_or(RepairError::MissingBufferCell)?;
            self.rebuffer_all(
                ctx,
                buffer_cell,
                options.repair_max_cap,
                options.repair_max_slew,
            )?;
            ctx.sink.emit(Diagnostic::note(
                DiagnosticCode::new(Category::Timing, 2),
                format!(
                    "inserted {} buffers in {} nets",
                    self.inserted_buffer_count, self.rebuffer_net_count
                ),
                Subject::Design,
            ));
        }
        Ok(self.report())
    }

    /// Resizes a single instance toward its target load. Returns `true`
    /// if the cell was replaced.
    pub fn resize_instance(&mut self, ctx: &mut RepairContext, inst: InstId) -> bool {
        self.ensure_target_loads(ctx.library, ctx.sink);
        let target_loads = self.target_load_map.take().expect("target loads ensured");
        let changed = resize_to_target_load(
            ctx.design,
            ctx.library,
            ctx.sta,
            &target_loads,
            &self.corner,
            inst,
        );
        self.target_load_map = Some(target_loads);
        if changed {
            self.resize_count += 1;
            self.ordering.invalidate();
        }
        changed
    }

    /// Rebuffers every driver of one net unconditionally (no violation
    /// check). Returns the number of buffers inserted.
    pub fn rebuffer_net(
        &mut self,
        ctx: &mut RepairContext,
        net: NetId,
        options: &RepairOptions,
    ) -> Result<usize, RepairError> {
        let buffer_cell = options
            .validate(ctx.library)?
            .ok_or(RepairError::MissingBufferCell)?;
        self.set_wire_rc(
            ctx.design,
            ctx.sta,
            options.wire_res_per_meter,
            options.wire_cap_per_meter,
            AnalysisPoint::max_corner(options.corner.clone()),
        );
        self.ensure_target_loads(ctx.library, ctx.sink);

        let before = self.inserted_buffer_count;
        let drivers = ctx.design.drivers(net);
        for drvr in drivers {
            self.rebuffer_drvr(ctx, drvr, buffer_cell)?;
        }
        Ok(self.inserted_buffer_count - before)
    }

    /// Returns the accumulated counts.
    pub fn report(&self) -> RepairReport {
        RepairReport {
            resize_count: self.resize_count,
            inserted_buffer_count: self.inserted_buffer_count,
            rebuffer_net_count: self.rebuffer_net_count,
        }
    }

    /// Zeroes the per-run counters.
    fn init(&mut self) {
        self.resize_count = 0;
        self.inserted_buffer_count = 0;
        self.rebuffer_net_count = 0;
    }

    /// Computes the reference slews and target-load map once per engine
    /// lifetime.
    pub fn ensure_target_loads(&mut self, library: &Library, sink: &DiagnosticSink) {
        if self.tgt_slews.is_none() {
            self.tgt_slews = Some(find_buffer_target_slews(library));
        }
        if self.target_load_map.is_none() {
            let tgt_slews = self.tgt_slews.expect("set above");
            self.target_load_map = Some(find_target_loads(library, &tgt_slews, sink));
        }
    }

    /// Resizes every driver in reverse level order.
    fn resize_all(&mut self, ctx: &mut RepairContext) {
        let drivers: Vec<_> = self
            .ordering
            .ensure(ctx.design, ctx.library, ctx.sta, ctx.interner)
            .to_vec();
        let target_loads = self.target_load_map.take().expect("target loads ensured");
        let mut resized = 0;
        for &drvr in drivers.iter().rev() {
            let PinOwner::Instance(inst) = ctx.design.pin(drvr).owner else {
                continue;
            };
            if resize_to_target_load(
                ctx.design,
                ctx.library,
                ctx.sta,
                &target_loads,
                &self.corner,
                inst,
            ) {
                resized += 1;
            }
        }
        self.target_load_map = Some(target_loads);
        self.resize_count += resized;
        if resized > 0 {
            self.ordering.invalidate();
        }
    }
}

impl Default for Resizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{linear_design, test_library};
    use vireo_netlist::Point;
    use vireo_timing::{ParasiticNetwork, TimingConstraints};

    fn make_ctx<'a>(
        design: &'a mut Design,
        library: &'a Library,
        sta: &'a mut Sta,
        interner: &'a Interner,
        sink: &'a DiagnosticSink,
    ) -> RepairContext<'a> {
        RepairContext::new(design, library, sta, interner, sink)
    }

    #[test]
    fn fresh_engine_reports_zero() {
        let resizer = Resizer::new();
        assert_eq!(resizer.report(), RepairReport::default());
    }

    #[test]
    fn repair_rejects_bad_config() {
        let lib = test_library();
        let (mut design, _net) = linear_design(&lib, 1, 1_000);
        let mut sta = Sta::new(TimingConstraints::new());
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let mut resizer = Resizer::new();

        let mut ctx = make_ctx(&mut design, &lib, &mut sta, &interner, &sink);
        let options = RepairOptions {
            repair_max_cap: true,
            ..Default::default()
        };
        assert!(resizer.repair(&mut ctx, &options).is_err());
    }

    #[test]
    fn set_wire_rc_extracts_all_nets() {
        let lib = test_library();
        let (design, _net) = linear_design(&lib, 2, 10_000);
        let mut sta = Sta::new(TimingConstraints::new());
        let mut resizer = Resizer::new();

        resizer.set_wire_rc(
            &design,
            &mut sta,
            2.0e3,
            200.0e-12,
            AnalysisPoint::max_corner("wc"),
        );
        assert_eq!(sta.parasitics().len(), 1);
    }

    #[test]
    fn resize_only_repair_upsizes_overloaded_driver() {
        let lib = test_library();
        let inv = lib.find_cell("INVX1").unwrap();
        let buf = lib.find_cell("BUFX4").unwrap();
        let mut design = Design::new("top", 1000.0);
        let u1 = design.make_instance(&lib, inv, "u1");
        design.set_location(u1, Point::new(0, 0));
        // A sink 3 mm away: the extracted wire capacitance dwarfs the
        // INVX1 target load.
        let sink_inst = design.make_instance(&lib, buf, "s0");
        design.set_location(sink_inst, Point::new(3_000_000, 0));
        let net = design.make_net("n0");
        design.connect_pin(design.instance(u1).pins[1], net);
        design.connect_pin(design.instance(sink_inst).pins[0], net);

        let mut sta = Sta::new(TimingConstraints::new());
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let mut resizer = Resizer::new();
        let mut ctx = make_ctx(&mut design, &lib, &mut sta, &interner, &sink);
        let options = RepairOptions {
            wire_res_per_meter: 2.0e3,
            wire_cap_per_meter: 200.0e-12,
            resize: true,
            ..Default::default()
        };

        let report = resizer.repair(&mut ctx, &options).unwrap();
        assert_eq!(report.resize_count, 1);
        assert_eq!(design.instance(u1).cell, lib.find_cell("INVX4").unwrap());
        // A summary note was emitted.
        assert!(sink
            .diagnostics()
            .iter()
            .any(|d| d.message.contains("resized 1 instances")));
    }

    #[test]
    fn resize_instance_variant_counts() {
        let lib = test_library();
        let inv = lib.find_cell("INVX1").unwrap();
        let mut design = Design::new("top", 1000.0);
        let u1 = design.make_instance(&lib, inv, "u1");
        let net = design.make_net("n0");
        design.connect_pin(design.instance(u1).pins[1], net);

        let mut sta = Sta::new(TimingConstraints::new());
        // Drive the load with raw parasitic capacitance.
        let mut network = ParasiticNetwork::new(net);
        let node = network.ensure_steiner_node(0);
        network.incr_cap(node, 520.0e-15);
        sta.register_parasitics(network);

        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let mut resizer = Resizer::new();
        let mut ctx = make_ctx(&mut design, &lib, &mut sta, &interner, &sink);

        assert!(resizer.resize_instance(&mut ctx, u1));
        assert_eq!(resizer.report().resize_count, 1);
        // Already at the best size: second call is a no-op.
        assert!(!resizer.resize_instance(&mut ctx, u1));
        assert_eq!(resizer.report().resize_count, 1);
    }

    #[test]
    fn report_serde_roundtrip() {
        let report = RepairReport {
            resize_count: 2,
            inserted_buffer_count: 3,
            rebuffer_net_count: 1,
        };
        let json = serde_json::to_string(&report).unwrap();
        let back: RepairReport = serde_json::from_str(&json).unwrap();
        assert_eq!(report, back);
    }
}
