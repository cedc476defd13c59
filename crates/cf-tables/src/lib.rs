//! cf-tables: read-only rate tables for the coolflow solver.
//!
//! Provides:
//! - Collisional, recombination and free-free rate curves on a uniform log-T grid
//! - The redshift-indexed ionizing UV background (TREECOOL-style text rows)
//! - Per-species metal-line cooling grids over (log nH, log T, redshift)
//! - The self-shielding attenuation of the UV background
//!
//! Every table is built once and then only read. Construction is the only
//! place a table can fail; lookups clamp to the covered range instead.

pub mod error;
pub mod metal_table;
pub mod rate_table;
pub mod shielding;
pub mod uv_background;

pub use error::{TableError, TableResult};
pub use metal_table::{
    bracket_sources, MetalCoolingTable, MetalGrid, MetalSnapshot, MetalSnapshotSource,
};
pub use rate_table::{GridCell, RateCoefficients, RateGrid, RateTable};
pub use shielding::shield_factor;
pub use uv_background::{UvBackgroundTable, UvRates, UvRow};
