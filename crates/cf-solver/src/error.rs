//! Error types for solver operations.

use cf_core::{CfError, ElementId};
use cf_tables::TableError;
use std::fmt;
use thiserror::Error;

/// Snapshot of the inputs of a solve that failed to converge.
///
/// Divergence is treated as a symptom of corrupted upstream state, so the dump
/// carries enough to reproduce the call offline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConvergenceDump {
    pub element: Option<ElementId>,
    pub density: Option<f64>,
    pub specific_energy: Option<f64>,
    pub temperature: Option<f64>,
    pub ne_guess: Option<f64>,
    pub iterations: usize,
    pub bracket: Option<(f64, f64)>,
}

impl fmt::Display for ConvergenceDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.element {
            Some(id) => write!(f, "element={id}")?,
            None => write!(f, "element=?")?,
        }
        if let Some(rho) = self.density {
            write!(f, " rho={rho:.6e}")?;
        }
        if let Some(u) = self.specific_energy {
            write!(f, " u={u:.6e}")?;
        }
        if let Some(t) = self.temperature {
            write!(f, " T={t:.6e}")?;
        }
        if let Some(ne) = self.ne_guess {
            write!(f, " ne={ne:.6e}")?;
        }
        if let Some((lo, hi)) = self.bracket {
            write!(f, " bracket=[{lo:.6e}, {hi:.6e}]")?;
        }
        write!(f, " iterations={}", self.iterations)
    }
}

/// Errors that can occur while cooling an element.
///
/// Every variant is fatal for the run: the driver stops the parallel phase
/// and reports the first failure instead of retrying.
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Invalid configuration: {what}")]
    InvalidConfig { what: String },

    #[error("Invalid element state: {what}")]
    InvalidState { what: String },

    #[error("Ionization balance did not converge: {0}")]
    IonizationNotConverged(Box<ConvergenceDump>),

    #[error("Temperature iteration did not converge: {0}")]
    TemperatureNotConverged(Box<ConvergenceDump>),

    #[error("Energy bracket not found: {0}")]
    BracketNotFound(Box<ConvergenceDump>),

    #[error("Energy bisection did not converge: {0}")]
    EnergyNotConverged(Box<ConvergenceDump>),

    #[error("Table error: {0}")]
    Table(#[from] TableError),

    #[error("Numeric error: {0}")]
    Core(#[from] CfError),
}

pub type SolverResult<T> = Result<T, SolverError>;

impl SolverError {
    /// Diagnostic dump carried by convergence failures.
    pub fn dump(&self) -> Option<&ConvergenceDump> {
        match self {
            SolverError::IonizationNotConverged(d)
            | SolverError::TemperatureNotConverged(d)
            | SolverError::BracketNotFound(d)
            | SolverError::EnergyNotConverged(d) => Some(d),
            _ => None,
        }
    }

    /// Fill in element identity on dumps raised below the element level.
    pub fn with_element(mut self, id: ElementId, density: f64) -> Self {
        match &mut self {
            SolverError::IonizationNotConverged(d)
            | SolverError::TemperatureNotConverged(d)
            | SolverError::BracketNotFound(d)
            | SolverError::EnergyNotConverged(d) => {
                d.element.get_or_insert(id);
                d.density.get_or_insert(density);
            }
            _ => {}
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_display_lists_inputs() {
        let dump = ConvergenceDump {
            element: Some(ElementId::new(7)),
            density: Some(1.67e-24),
            specific_energy: Some(1.0e12),
            ne_guess: Some(0.5),
            iterations: 150,
            ..ConvergenceDump::default()
        };
        let msg = SolverError::TemperatureNotConverged(Box::new(dump)).to_string();
        assert!(msg.contains("element=7"));
        assert!(msg.contains("rho=1.670000e-24"));
        assert!(msg.contains("iterations=150"));
    }

    #[test]
    fn with_element_keeps_existing_identity() {
        let dump = ConvergenceDump {
            element: Some(ElementId::new(1)),
            ..ConvergenceDump::default()
        };
        let err = SolverError::EnergyNotConverged(Box::new(dump))
            .with_element(ElementId::new(2), 3.0);
        let d = err.dump().unwrap();
        assert_eq!(d.element, Some(ElementId::new(1)));
        assert_eq!(d.density, Some(3.0));
    }
}
