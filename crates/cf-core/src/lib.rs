//! cf-core: stable foundation for coolflow.
//!
//! Contains:
//! - constants (CGS physical constants shared by the rate physics)
//! - units (uom constructors for run-file and CLI inputs)
//! - numeric (Real + tolerances + float helpers)
//! - ids (stable element identifiers)
//! - error (shared error types)

pub mod constants;
pub mod error;
pub mod ids;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CfError, CfResult};
pub use ids::*;
pub use numeric::*;
