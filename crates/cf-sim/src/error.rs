//! Error types for driver operations.

use cf_core::ElementId;
use cf_solver::SolverError;
use thiserror::Error;

/// Errors encountered while driving cooling phases.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: String },

    /// First failing element of a phase, by array index.
    #[error("Element {id} (index {index}) failed: {source}")]
    Element {
        index: usize,
        id: ElementId,
        #[source]
        source: SolverError,
    },

    #[error(transparent)]
    Solver(#[from] SolverError),
}

pub type SimResult<T> = Result<T, SimError>;
