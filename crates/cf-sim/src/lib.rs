//! Element driver and box runs for the coolflow solver.
//!
//! Provides:
//! - A data-parallel cooling phase over many elements (rayon)
//! - Flat ΛCDM time/redshift conversion for comoving runs
//! - A fixed-step box run with redshift stepping between phases and
//!   decimated recording

pub mod cosmology;
pub mod driver;
pub mod error;
pub mod run;

pub use cosmology::Cosmology;
pub use driver::{cool_elements, ElementSample, PhaseReport, PhaseStats};
pub use error::{SimError, SimResult};
pub use run::{run_box, SimOptions, SimRecord};
