//! Engine invocation options and the public error type.

use serde::{Deserialize, Serialize};
use vireo_common::InternalError;
use vireo_netlist::{CellId, Library};

/// Options for one repair invocation.
///
/// Wire RC values are per meter of routed wire. The corner name labels
/// the single worst-case analysis point. At least one of `resize`,
/// `repair_max_cap`, `repair_max_slew` should be set for the call to do
/// anything.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RepairOptions {
    /// Wire resistance, ohms per meter.
    pub wire_res_per_meter: f64,
    /// Wire capacitance, farads per meter.
    pub wire_cap_per_meter: f64,
    /// Name of the analysis corner.
    pub corner: String,
    /// Resize drivers toward their target load.
    pub resize: bool,
    /// Rebuffer nets violating their capacitance limit.
    pub repair_max_cap: bool,
    /// Rebuffer nets violating their transition-time limit.
    pub repair_max_slew: bool,
    /// Name of the buffer cell used for insertion. Required when either
    /// repair flag is set.
    pub buffer_cell: Option<String>,
}

impl Default for RepairOptions {
    fn default() -> Self {
        Self {
            wire_res_per_meter: 0.0,
            wire_cap_per_meter: 0.0,
            corner: "default".into(),
            resize: false,
            repair_max_cap: false,
            repair_max_slew: false,
            buffer_cell: None,
        }
    }
}

impl RepairOptions {
    /// Returns `true` if either rebuffering repair is enabled.
    pub fn repairs_requested(&self) -> bool {
        self.repair_max_cap || self.repair_max_slew
    }

    /// Validates the options against the library.
    ///
    /// Fails synchronously when the wire RC is not positive or when
    /// rebuffering is requested without a usable buffer cell. On success
    /// returns the resolved buffer cell, if one was named.
    pub fn validate(&self, library: &Library) -> Result<Option<CellId>, RepairError> {
        if self.wire_res_per_meter <= 0.0 || self.wire_cap_per_meter <= 0.0 {
            return Err(RepairError::InvalidWireRc {
                res: self.wire_res_per_meter,
                cap: self.wire_cap_per_meter,
            });
        }
        let buffer = match &self.buffer_cell {
            Some(name) => {
                let id = library
                    .find_cell(name)
                    .ok_or_else(|| RepairError::UnknownBufferCell(name.clone()))?;
                let cell = library.cell(id);
                let characterized = cell.buffer_ports().is_some()
                    && cell.arcs.iter().any(|a| {
                        a.kind.is_characterizable() && a.model.gate_delay(0.0, 0.0).is_some()
                    });
                if !characterized {
                    return Err(RepairError::UnusableBufferCell(name.clone()));
                }
                Some(id)
            }
            None => None,
        };
        if self.repairs_requested() && buffer.is_none() {
            return Err(RepairError::MissingBufferCell);
        }
        Ok(buffer)
    }
}

/// Errors reported across the engine's public API.
///
/// Configuration problems fail synchronously at the call site; internal
/// errors indicate corrupt engine state and are fatal to the operation.
#[derive(Debug, thiserror::Error)]
pub enum RepairError {
    /// Wire RC values were missing or non-positive.
    #[error("wire RC must be positive (res {res} ohm/m, cap {cap} F/m)")]
    InvalidWireRc {
        /// Supplied resistance per meter.
        res: f64,
        /// Supplied capacitance per meter.
        cap: f64,
    },
    /// Rebuffering was requested without naming a buffer cell.
    #[error("rebuffering requires a buffer cell")]
    MissingBufferCell,
    /// The named buffer cell does not exist in the library.
    #[error("buffer cell `{0}` not found in the library")]
    UnknownBufferCell(String),
    /// The named cell is not a characterized single-input buffer.
    #[error("cell `{0}` is not a characterized buffer")]
    UnusableBufferCell(String),
    /// Corrupt engine state.
    #[error(transparent)]
    Internal(#[from] InternalError),
}
