//! Drive-strength selection against characterized target loads.
//!
//! A driver's cell is swapped for the equivalence-class member whose
//! target load is closest to the actual load in log space, i.e., the one
//! maximizing `min(target/load, load/target)`. Only single-output gates
//! are considered. Cells backed by a physical (LEF) library may only be
//! replaced by physical cells with a matching port footprint.

use std::collections::HashMap;
use vireo_netlist::{CellId, Design, InstId, Library, PinId};
use vireo_timing::{AnalysisPoint, Sta};

/// Returns the single output pin of an instance, or `None` when the
/// instance has zero or more than one output.
pub fn single_output_pin(design: &Design, inst: InstId) -> Option<PinId> {
    let mut output = None;
    for &pin in &design.instance(inst).pins {
        if design.pin(pin).direction.is_output() {
            if output.is_some() {
                return None;
            }
            output = Some(pin);
        }
    }
    output
}

/// Resizes one instance toward its target load.
///
/// Returns `true` if the cell was replaced. Multi-output instances,
/// instances whose equivalence class offers no better match, and
/// physical-library cells without a footprint-compatible physical peer
/// are left untouched.
pub fn resize_to_target_load(
    design: &mut Design,
    library: &Library,
    sta: &mut Sta,
    target_loads: &HashMap<CellId, f64>,
    ap: &AnalysisPoint,
    inst: InstId,
) -> bool {
    let current = design.instance(inst).cell;
    let Some(output) = single_output_pin(design, inst) else {
        return false;
    };
    // Includes net parasitic capacitance.
    let load_cap = sta.load_cap(design, library, output, ap);

    let mut best_cell: Option<CellId> = None;
    let mut best_ratio = 0.0_f64;
    for &candidate in library.equiv_cells(current) {
        // Cells excluded from characterization are not candidates.
        let Some(&target_load) = target_loads.get(&candidate) else {
            continue;
        };
        let mut ratio = target_load / load_cap;
        if ratio > 1.0 {
            ratio = 1.0 / ratio;
        }
        if ratio > best_ratio {
            best_ratio = ratio;
            best_cell = Some(candidate);
        }
    }

    match best_cell {
        Some(best) if best != current => {
            let cell = library.cell(current);
            if cell.has_physical {
                // Physical cells swap only with physical cells whose
                // ports stay aligned.
                let replacement = library.cell(best);
                if !replacement.has_physical || !cell.footprint_matches(replacement) {
                    return false;
                }
            }
            design.replace_cell(inst, best);
            sta.graph_invalid();
            true
        }
        _ => false,
    }
}
