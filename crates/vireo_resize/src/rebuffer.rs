//! Buffer insertion by dynamic programming over the routing tree.
//!
//! For each driver in reverse level order (clock network excluded), a
//! violated net's Steiner tree is walked bottom-up, producing a Pareto
//! set of candidate solutions per point: sink options at leaves, junction
//! options from the Cartesian product of child sets, and for every edge a
//! wire option per candidate plus one buffer option for the candidate
//! that maximizes required time behind a buffer. Dominated junction
//! options are pruned pairwise. The root option maximizing the driver's
//! required time (after its own gate delay) is committed top-down,
//! splitting the net at each buffer and re-extracting parasitics.
//!
//! Options live in a per-net arena and are freed in bulk when the net's
//! commit completes.

use crate::parasitics::make_net_parasitics;
use crate::steiner::{build_steiner_tree, SteinerPt, SteinerTree};
use crate::{RepairContext, Resizer};
use vireo_common::{fuzzy_greater, fuzzy_inf, fuzzy_less, InternalError, VireoResult};
use vireo_diagnostics::{Category, Diagnostic, DiagnosticCode, Subject};
use vireo_netlist::{CellId, Library, NetId, PinId, PinOwner, Point, Transition};
use vireo_timing::MinMax;

/// Index of an option in the per-net arena.
pub(crate) type OptionIdx = u32;

/// One candidate solution for the subtree below a Steiner point.
///
/// `cap` is the capacitance seen looking into the subtree; `req` is the
/// required arrival time at this point for the worst sink below, given
/// the choices already committed beneath it.
#[derive(Clone, Copy, Debug)]
pub(crate) enum BufferOption {
    /// A load pin at a leaf.
    Sink {
        /// Pin capacitance (worst of rise/fall).
        cap: f64,
        /// Required arrival time at the pin.
        req: f64,
        /// The load pin itself.
        load_pin: PinId,
        /// Location of the leaf.
        location: Point,
    },
    /// A candidate carried across a tree edge to the parent point.
    Wire {
        /// Child capacitance plus the edge's wire capacitance.
        cap: f64,
        /// Child required time minus the edge's wire delay.
        req: f64,
        /// Location of the parent point.
        location: Point,
        /// The candidate below the wire.
        child: OptionIdx,
    },
    /// Two child candidates merged at a Steiner point.
    Junction {
        /// Sum of both children's capacitances.
        cap: f64,
        /// The tighter of the two children's required times.
        req: f64,
        /// Location of the Steiner point.
        location: Point,
        /// Left child candidate.
        left: OptionIdx,
        /// Right child candidate.
        right: OptionIdx,
    },
    /// A buffer driving the chosen wire candidate.
    Buffer {
        /// Input capacitance of the buffer cell.
        cap: f64,
        /// Wire candidate's required time minus the buffer delay.
        req: f64,
        /// Location of the buffer.
        location: Point,
        /// The wire candidate the buffer drives.
        child: OptionIdx,
    },
}

impl BufferOption {
    fn cap(&self) -> f64 {
        match *self {
            BufferOption::Sink { cap, .. }
            | BufferOption::Wire { cap, .. }
            | BufferOption::Junction { cap, .. }
            | BufferOption::Buffer { cap, .. } => cap,
        }
    }

    fn req(&self) -> f64 {
        match *self {
            BufferOption::Sink { req, .. }
            | BufferOption::Wire { req, .. }
            | BufferOption::Junction { req, .. }
            | BufferOption::Buffer { req, .. } => req,
        }
    }
}

/// Arena owning every option generated for one net's DP.
#[derive(Default)]
pub(crate) struct OptionArena {
    options: Vec<BufferOption>,
}

impl OptionArena {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, option: BufferOption) -> OptionIdx {
        let idx = self.options.len() as OptionIdx;
        self.options.push(option);
        idx
    }

    pub(crate) fn option(&self, idx: OptionIdx) -> BufferOption {
        self.options[idx as usize]
    }

    pub(crate) fn cap(&self, idx: OptionIdx) -> f64 {
        self.options[idx as usize].cap()
    }

    pub(crate) fn req(&self, idx: OptionIdx) -> f64 {
        self.options[idx as usize].req()
    }
}

impl Resizer {
    /// Rebuffers every violating driver, sinks first.
    pub(crate) fn rebuffer_all(
        &mut self,
        ctx: &mut RepairContext,
        buffer_cell: CellId,
        repair_max_cap: bool,
        repair_max_slew: bool,
    ) -> VireoResult<()> {
        let drivers: Vec<PinId> = self
            .ordering
            .ensure(ctx.design, ctx.library, ctx.sta, ctx.interner)
            .to_vec();
        for &drvr_pin in drivers.iter().rev() {
            // Hands off the clock tree.
            if ctx
                .sta
                .is_clock(ctx.design, ctx.library, ctx.interner, drvr_pin)
            {
                continue;
            }
            if (repair_max_cap && self.has_max_cap_violation(ctx, drvr_pin))
                || (repair_max_slew && self.has_max_slew_violation(ctx, drvr_pin))
            {
                self.rebuffer_drvr(ctx, drvr_pin, buffer_cell)?;
            }
        }
        Ok(())
    }

    /// Returns `true` if the driver's load exceeds its port's capacitance
    /// limit.
    pub(crate) fn has_max_cap_violation(&self, ctx: &RepairContext, drvr_pin: PinId) -> bool {
        let Some(limit) = ctx.sta.cap_limit(ctx.design, ctx.library, drvr_pin) else {
            return false;
        };
        let load_cap = ctx
            .sta
            .load_cap(ctx.design, ctx.library, drvr_pin, &self.corner);
        fuzzy_greater(load_cap, limit)
    }

    /// Returns `true` if either transition's slew at the driver exceeds
    /// the tightest applicable limit.
    pub(crate) fn has_max_slew_violation(
        &self,
        ctx: &mut RepairContext,
        drvr_pin: PinId,
    ) -> bool {
        let Some(limit) = ctx
            .sta
            .slew_limit(ctx.design, ctx.library, ctx.interner, drvr_pin)
        else {
            return false;
        };
        for transition in Transition::both() {
            let slew = ctx
                .sta
                .slew(ctx.design, ctx.library, ctx.interner, drvr_pin, transition);
            if fuzzy_greater(slew, limit) {
                return true;
            }
        }
        false
    }

    /// Runs the per-net DP for one driver pin and commits the best
    /// solution.
    pub(crate) fn rebuffer_drvr(
        &mut self,
        ctx: &mut RepairContext,
        drvr_pin: PinId,
        buffer_cell: CellId,
    ) -> VireoResult<()> {
        let Some(net) = ctx.design.pin(drvr_pin).net else {
            return Ok(());
        };

        // The gate-delay term at the root uses the driving port; a
        // top-level input port has none, so stand in the buffer's output.
        let (drvr_cell, drvr_port_name) = if ctx.design.is_top_level_port(drvr_pin) {
            let cell = ctx.library.cell(buffer_cell);
            let (_, output) = cell
                .buffer_ports()
                .ok_or_else(|| InternalError::new("buffer cell has no buffer ports"))?;
            (buffer_cell, output.name.clone())
        } else {
            let PinOwner::Instance(inst) = ctx.design.pin(drvr_pin).owner else {
                return Err(InternalError::new("driver pin with no owner instance").into());
            };
            (
                ctx.design.instance(inst).cell,
                ctx.design.pin(drvr_pin).name.clone(),
            )
        };

        let Some(tree) = build_steiner_tree(ctx.design, net, true) else {
            ctx.sink.emit(Diagnostic::warning(
                DiagnosticCode::new(Category::Warning, 30),
                "net has unplaced pins; rebuffering skipped",
                Subject::net(ctx.design.net(net).name.clone()),
            ));
            return Ok(());
        };

        // An unconstrained driver has nothing to optimize for.
        let drvr_req = self.pin_required(ctx, drvr_pin);
        if fuzzy_inf(drvr_req) {
            return Ok(());
        }

        let mut arena = OptionArena::new();
        let drvr_pt = tree.drvr_pt();
        let candidates = self.rebuffer_bottom_up(
            ctx,
            &mut arena,
            &tree,
            tree.left(drvr_pt),
            drvr_pt,
            buffer_cell,
        );

        let mut best: Option<OptionIdx> = None;
        let mut best_req = f64::NEG_INFINITY;
        for &p in &candidates {
            let req = arena.req(p)
                - self.gate_delay(ctx.library, drvr_cell, &drvr_port_name, arena.cap(p));
            if fuzzy_greater(req, best_req) {
                best_req = req;
                best = Some(p);
            }
        }
        if let Some(best) = best {
            let inserted = self.rebuffer_top_down(ctx, &arena, best, net, buffer_cell)?;
            if inserted > 0 {
                self.inserted_buffer_count += inserted;
                self.rebuffer_net_count += 1;
            }
        }
        // The arena (and with it every option of this net) is dropped
        // here.
        Ok(())
    }

    /// Bottom-up pass: builds the Pareto set of options for the subtree
    /// rooted at `k`, then carries it across the edge to `prev`.
    fn rebuffer_bottom_up(
        &mut self,
        ctx: &mut RepairContext,
        arena: &mut OptionArena,
        tree: &SteinerTree,
        k: Option<SteinerPt>,
        prev: SteinerPt,
        buffer_cell: CellId,
    ) -> Vec<OptionIdx> {
        let Some(k) = k else {
            return Vec::new();
        };
        if let Some(pin) = tree.pin(k) {
            if ctx.design.is_load(pin) {
                let sink = arena.push(BufferOption::Sink {
                    cap: self.pin_capacitance(ctx, pin),
                    req: self.pin_required(ctx, pin),
                    load_pin: pin,
                    location: tree.location(k),
                });
                return self.add_wire_and_buffer(ctx, arena, vec![sink], tree, k, prev, buffer_cell);
            }
            Vec::new()
        } else {
            let left = self.rebuffer_bottom_up(ctx, arena, tree, tree.left(k), k, buffer_cell);
            let right = self.rebuffer_bottom_up(ctx, arena, tree, tree.right(k), k, buffer_cell);

            // Combine the options from both branches.
            let mut merged: Vec<Option<OptionIdx>> = Vec::with_capacity(left.len() * right.len());
            for &p in &left {
                for &q in &right {
                    let junction = arena.push(BufferOption::Junction {
                        cap: arena.cap(p) + arena.cap(q),
                        req: arena.req(p).min(arena.req(q)),
                        location: tree.location(k),
                        left: p,
                        right: q,
                    });
                    merged.push(Some(junction));
                }
            }

            // Prune dominated options. This is fanout^2.
            for i in 0..merged.len() {
                let Some(p) = merged[i] else {
                    continue;
                };
                let p_req = self.buffer_required(ctx.library, arena, p, buffer_cell);
                let p_cap = arena.cap(p);
                for j in 0..merged.len() {
                    if i == j {
                        continue;
                    }
                    let Some(q) = merged[j] else {
                        continue;
                    };
                    let q_req = self.buffer_required(ctx.library, arena, q, buffer_cell);
                    let q_cap = arena.cap(q);
                    if fuzzy_less(q_req, p_req) && fuzzy_greater(q_cap, p_cap) {
                        // q is strictly worse than p on both axes.
                        merged[j] = None;
                    }
                }
            }
            let survivors: Vec<OptionIdx> = merged.into_iter().flatten().collect();
            self.add_wire_and_buffer(ctx, arena, survivors, tree, k, prev, buffer_cell)
        }
    }

    /// Carries every candidate across the edge from `k` to `prev` and
    /// adds the single best buffered alternative.
    fn add_wire_and_buffer(
        &mut self,
        ctx: &mut RepairContext,
        arena: &mut OptionArena,
        candidates: Vec<OptionIdx>,
        tree: &SteinerTree,
        k: SteinerPt,
        prev: SteinerPt,
        buffer_cell: CellId,
    ) -> Vec<OptionIdx> {
        let k_loc = tree.location(k);
        let prev_loc = tree.location(prev);
        let wire_length_dbu = k_loc.manhattan_distance(prev_loc);
        let wire_length = ctx.design.dbu_to_meters(wire_length_dbu);
        let wire_cap = wire_length * self.wire_cap;
        let wire_res = wire_length * self.wire_res;
        let wire_delay = wire_res * wire_cap;

        let mut carried = Vec::with_capacity(candidates.len() + 1);
        let mut best_req = f64::NEG_INFINITY;
        let mut best_wire: Option<OptionIdx> = None;
        for &p in &candidates {
            let wire = arena.push(BufferOption::Wire {
                cap: arena.cap(p) + wire_cap,
                req: arena.req(p) - wire_delay,
                location: prev_loc,
                child: p,
            });
            carried.push(wire);
            // A single buffer size keeps the option count linear; drive
            // strengths are the resizer's job.
            let req = self.buffer_required(ctx.library, arena, wire, buffer_cell);
            if fuzzy_greater(req, best_req) {
                best_req = req;
                best_wire = Some(wire);
            }
        }
        if let Some(best_wire) = best_wire {
            let buffer = arena.push(BufferOption::Buffer {
                cap: self.buffer_input_capacitance(ctx.library, buffer_cell),
                req: best_req,
                // The buffer sits at the far end of the wire.
                location: prev_loc,
                child: best_wire,
            });
            carried.push(buffer);
        }
        carried
    }

    /// Top-down commit of the chosen option. Returns the total number of
    /// buffers inserted across all branches.
    fn rebuffer_top_down(
        &mut self,
        ctx: &mut RepairContext,
        arena: &OptionArena,
        choice: OptionIdx,
        net: NetId,
        buffer_cell: CellId,
    ) -> VireoResult<usize> {
        match arena.option(choice) {
            BufferOption::Buffer {
                location, child, ..
            } => {
                let (input_name, output_name) = {
                    let cell = ctx.library.cell(buffer_cell);
                    let (input, output) = cell
                        .buffer_ports()
                        .ok_or_else(|| InternalError::new("buffer cell has no buffer ports"))?;
                    (input.name.clone(), output.name.clone())
                };
                let net2_name = self.make_unique_net_name(ctx.design);
                let buffer_name = self.make_unique_buffer_name(ctx.design);
                let net2 = ctx.design.make_net(&net2_name);
                let buffer = ctx.design.make_instance(ctx.library, buffer_cell, &buffer_name);
                self.ordering.invalidate();
                ctx.sta.graph_invalid();

                let find_pin = |design: &vireo_netlist::Design, name: &str| {
                    design
                        .instance(buffer)
                        .pins
                        .iter()
                        .copied()
                        .find(|&p| design.pin(p).name == name)
                        .ok_or_else(|| InternalError::new("buffer instance missing port pin"))
                };
                let input_pin = find_pin(ctx.design, &input_name)?;
                let output_pin = find_pin(ctx.design, &output_name)?;
                ctx.design.connect_pin(input_pin, net);
                ctx.design.connect_pin(output_pin, net2);
                ctx.design.set_location(buffer, location);

                let below = self.rebuffer_top_down(ctx, arena, child, net2, buffer_cell)?;
                make_net_parasitics(ctx.design, net, self.wire_res, self.wire_cap, ctx.sta);
                make_net_parasitics(ctx.design, net2, self.wire_res, self.wire_cap, ctx.sta);
                Ok(1 + below)
            }
            BufferOption::Wire { child, .. } => {
                self.rebuffer_top_down(ctx, arena, child, net, buffer_cell)
            }
            BufferOption::Junction { left, right, .. } => {
                let l = self.rebuffer_top_down(ctx, arena, left, net, buffer_cell)?;
                let r = self.rebuffer_top_down(ctx, arena, right, net, buffer_cell)?;
                Ok(l + r)
            }
            BufferOption::Sink { load_pin, .. } => {
                if ctx.design.pin(load_pin).net != Some(net) {
                    ctx.design.disconnect_pin(load_pin);
                    ctx.design.connect_pin(load_pin, net);
                    self.ordering.invalidate();
                    ctx.sta.graph_invalid();
                }
                Ok(0)
            }
        }
    }

    /// Required time behind a buffer driving this option.
    fn buffer_required(
        &self,
        library: &Library,
        arena: &OptionArena,
        option: OptionIdx,
        buffer_cell: CellId,
    ) -> f64 {
        arena.req(option) - self.buffer_delay(library, buffer_cell, arena.cap(option))
    }

    /// Delay through the buffer cell driving `load_cap`.
    pub(crate) fn buffer_delay(&self, library: &Library, buffer_cell: CellId, load_cap: f64) -> f64 {
        let cell = library.cell(buffer_cell);
        match cell.buffer_ports() {
            Some((_, output)) => {
                let name = output.name.clone();
                self.gate_delay(library, buffer_cell, &name, load_cap)
            }
            None => 0.0,
        }
    }

    /// Worst rise/fall delay through any arc into `out_port`, evaluated
    /// at the characterized target input slews.
    pub(crate) fn gate_delay(
        &self,
        library: &Library,
        cell: CellId,
        out_port: &str,
        load_cap: f64,
    ) -> f64 {
        let tgt_slews = self.tgt_slews.unwrap_or([0.0; 2]);
        let cell = library.cell(cell);
        let mut max_delay = f64::NEG_INFINITY;
        for arc in cell.arcs_to(out_port) {
            if !arc.kind.is_characterizable() {
                continue;
            }
            let in_slew = tgt_slews[arc.from_edge.index()];
            if let Some(t) = arc.model.gate_delay(in_slew, load_cap) {
                max_delay = max_delay.max(t.delay);
            }
        }
        if max_delay.is_finite() {
            max_delay
        } else {
            0.0
        }
    }

    /// Input capacitance of the buffer cell (worst of rise/fall).
    pub(crate) fn buffer_input_capacitance(&self, library: &Library, buffer_cell: CellId) -> f64 {
        match library.cell(buffer_cell).buffer_ports() {
            Some((input, _)) => input.worst_capacitance(),
            None => 0.0,
        }
    }

    /// Capacitance of a pin: its library port's worst-case value, or 0
    /// for top-level port pins.
    pub(crate) fn pin_capacitance(&self, ctx: &RepairContext, pin: PinId) -> f64 {
        ctx.design
            .liberty_port(ctx.library, pin)
            .map_or(0.0, |port| port.worst_capacitance())
    }

    /// Required arrival time at a pin on the max side.
    pub(crate) fn pin_required(&self, ctx: &mut RepairContext, pin: PinId) -> f64 {
        ctx.sta
            .required(ctx.design, ctx.library, ctx.interner, pin, MinMax::Max)
    }

    /// Allocates a net name unused in the design.
    pub(crate) fn make_unique_net_name(&mut self, design: &vireo_netlist::Design) -> String {
        loop {
            let name = format!("net{}", self.unique_net_index);
            self.unique_net_index += 1;
            if design.find_net(&name).is_none() {
                return name;
            }
        }
    }

    /// Allocates a buffer instance name unused in the design.
    pub(crate) fn make_unique_buffer_name(&mut self, design: &vireo_netlist::Design) -> String {
        loop {
            let name = format!("buffer{}", self.unique_buffer_index);
            self.unique_buffer_index += 1;
            if design.find_instance(&name).is_none() {
                return name;
            }
        }
    }
}
