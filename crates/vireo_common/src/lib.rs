//! Shared leaf types for the Vireo physical-synthesis engine.
//!
//! Provides interned identifiers, the common result/error types, and the
//! fuzzy floating-point comparators used for all delay, required-time, and
//! capacitance comparisons. Exact floating-point equality is never relied
//! upon anywhere in the engine.

#![warn(missing_docs)]

pub mod fuzzy;
pub mod ident;
pub mod result;

pub use fuzzy::{fuzzy_equal, fuzzy_greater, fuzzy_inf, fuzzy_less};
pub use ident::{Ident, Interner};
pub use result::{InternalError, VireoResult};
