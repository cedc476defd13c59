//! Flat ΛCDM age/redshift conversion.
//!
//! Radiation is neglected, which leaves closed forms in both directions:
//!
//! ```text
//! t(a) = 2 / (3 H0 sqrt(ΩΛ)) · asinh( sqrt(ΩΛ/Ωm) · a^(3/2) )
//! a(t) = (Ωm/ΩΛ)^(1/3) · sinh( 3/2 · sqrt(ΩΛ) · H0 · t )^(2/3)
//! ```

use crate::error::{SimError, SimResult};
use serde::{Deserialize, Serialize};

/// 100 km/s/Mpc in s^-1.
const HUBBLE_UNIT: f64 = 3.240_779_29e-18;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cosmology {
    /// Dimensionless Hubble parameter `h`
    pub hubble: f64,
    /// Matter density parameter; the remainder is Λ
    pub omega_matter: f64,
}

impl Default for Cosmology {
    fn default() -> Self {
        Self {
            hubble: 0.7,
            omega_matter: 0.3,
        }
    }
}

impl Cosmology {
    pub fn validate(&self) -> SimResult<()> {
        if !(self.hubble > 0.0) || !self.hubble.is_finite() {
            return Err(SimError::InvalidArg {
                what: format!("hubble must be positive, got {}", self.hubble),
            });
        }
        if !(self.omega_matter > 0.0 && self.omega_matter < 1.0) {
            return Err(SimError::InvalidArg {
                what: format!("omega_matter must be in (0, 1), got {}", self.omega_matter),
            });
        }
        Ok(())
    }

    fn h0(&self) -> f64 {
        self.hubble * HUBBLE_UNIT
    }

    fn omega_lambda(&self) -> f64 {
        1.0 - self.omega_matter
    }

    /// Cosmic time at `redshift` [s].
    pub fn age_at(&self, redshift: f64) -> f64 {
        let a = 1.0 / (1.0 + redshift);
        let ol = self.omega_lambda();
        let x = (ol / self.omega_matter).sqrt() * a.powf(1.5);
        2.0 / (3.0 * self.h0() * ol.sqrt()) * x.asinh()
    }

    /// Redshift at cosmic time `age` [s].
    pub fn redshift_at(&self, age: f64) -> f64 {
        let ol = self.omega_lambda();
        let s = (1.5 * ol.sqrt() * self.h0() * age).sinh();
        let a = (self.omega_matter / ol).cbrt() * s.powf(2.0 / 3.0);
        1.0 / a - 1.0
    }
}
