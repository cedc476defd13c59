//! Collisional, recombination and free-free rate curves on a uniform log-T grid.
//!
//! Rate fits follow Katz, Weinberg & Hernquist (1996) Table 2 and Cen (1992):
//!
//! | field         | process                                   | units          |
//! |---------------|-------------------------------------------|----------------|
//! | `beta_h0`     | collisional excitation cooling of H0      | erg cm^3 s^-1  |
//! | `beta_hep`    | collisional excitation cooling of He+     | erg cm^3 s^-1  |
//! | `beta_ff`     | free-free (Gaunt factor included)         | erg cm^3 s^-1  |
//! | `alpha_*`     | radiative recombination                   | cm^3 s^-1      |
//! | `alpha_d`     | dielectronic recombination of He+         | cm^3 s^-1      |
//! | `gamma_e_*`   | collisional ionization                    | cm^3 s^-1      |

use crate::error::{TableError, TableResult};
use cf_core::lerp;
use serde::{Deserialize, Serialize};

/// Boltzmann-factor exponents above this are treated as zero rate.
const MAX_BOLTZMANN_EXPONENT: f64 = 70.0;

/// Uniform grid in log10(T).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateGrid {
    /// log10 of the lowest tabulated temperature [K]
    pub log_t_min: f64,
    /// log10 of the highest tabulated temperature [K]
    pub log_t_max: f64,
    /// Number of grid intervals; the table holds `n_cool_tab + 1` nodes
    pub n_cool_tab: usize,
}

impl Default for RateGrid {
    fn default() -> Self {
        Self {
            log_t_min: 1.0,
            log_t_max: 9.0,
            n_cool_tab: 2000,
        }
    }
}

impl RateGrid {
    /// Constant node spacing in log10(T).
    pub fn delta(&self) -> f64 {
        (self.log_t_max - self.log_t_min) / self.n_cool_tab as f64
    }

    /// Lowest tabulated temperature [K].
    pub fn t_min(&self) -> f64 {
        10f64.powf(self.log_t_min)
    }

    /// Highest tabulated temperature [K].
    pub fn t_max(&self) -> f64 {
        10f64.powf(self.log_t_max)
    }

    pub fn validate(&self) -> TableResult<()> {
        if self.n_cool_tab < 2 {
            return Err(TableError::InvalidSetup {
                what: format!("n_cool_tab must be at least 2, got {}", self.n_cool_tab),
            });
        }
        if !self.log_t_min.is_finite()
            || !self.log_t_max.is_finite()
            || self.log_t_min >= self.log_t_max
        {
            return Err(TableError::InvalidSetup {
                what: format!(
                    "log-T range must be finite and increasing, got [{}, {}]",
                    self.log_t_min, self.log_t_max
                ),
            });
        }
        Ok(())
    }
}

/// Interpolation cell: lower node index plus the weight of the upper node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCell {
    pub index: usize,
    pub weight_hi: f64,
}

/// Rate coefficients at one temperature.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RateCoefficients {
    pub beta_h0: f64,
    pub beta_hep: f64,
    pub beta_ff: f64,
    pub alpha_hp: f64,
    pub alpha_hep: f64,
    pub alpha_hepp: f64,
    pub alpha_d: f64,
    pub gamma_e_h0: f64,
    pub gamma_e_he0: f64,
    pub gamma_e_hep: f64,
}

impl RateCoefficients {
    /// Evaluate the closed-form fits at temperature `t` [K].
    pub fn at_temperature(t: f64) -> Self {
        let log_t = t.log10();
        let t_fact = 1.0 / (1.0 + (t / 1.0e5).sqrt());
        let boltz = |t_exc: f64| -> Option<f64> {
            let x = t_exc / t;
            (x < MAX_BOLTZMANN_EXPONENT).then(|| (-x).exp())
        };

        let mut c = Self::default();

        if let Some(b) = boltz(118_348.0) {
            c.beta_h0 = 7.5e-19 * b * t_fact;
        }
        if let Some(b) = boltz(473_638.0) {
            c.beta_hep = 5.54e-17 * t.powf(-0.397) * b * t_fact;
        }
        let gaunt_arg = 5.5 - log_t;
        c.beta_ff = 1.43e-27 * t.sqrt() * (1.1 + 0.34 * (-gaunt_arg * gaunt_arg / 3.0).exp());

        c.alpha_hp = 8.4e-11 * (t / 1000.0).powf(-0.2) / (1.0 + (t / 1.0e6).powf(0.7)) / t.sqrt();
        c.alpha_hep = 1.5e-10 * t.powf(-0.6353);
        c.alpha_hepp = 4.0 * c.alpha_hp;
        if let Some(b) = boltz(470_000.0) {
            c.alpha_d = 1.9e-3 * t.powf(-1.5) * b * (1.0 + 0.3 * (-94_000.0 / t).exp());
        }

        if let Some(b) = boltz(157_809.1) {
            c.gamma_e_h0 = 5.85e-11 * t.sqrt() * b * t_fact;
        }
        if let Some(b) = boltz(285_335.4) {
            c.gamma_e_he0 = 2.38e-11 * t.sqrt() * b * t_fact;
        }
        if let Some(b) = boltz(631_515.0) {
            c.gamma_e_hep = 5.68e-12 * t.sqrt() * b * t_fact;
        }
        c
    }

    fn blend(lo: &Self, hi: &Self, w: f64) -> Self {
        Self {
            beta_h0: lerp(lo.beta_h0, hi.beta_h0, w),
            beta_hep: lerp(lo.beta_hep, hi.beta_hep, w),
            beta_ff: lerp(lo.beta_ff, hi.beta_ff, w),
            alpha_hp: lerp(lo.alpha_hp, hi.alpha_hp, w),
            alpha_hep: lerp(lo.alpha_hep, hi.alpha_hep, w),
            alpha_hepp: lerp(lo.alpha_hepp, hi.alpha_hepp, w),
            alpha_d: lerp(lo.alpha_d, hi.alpha_d, w),
            gamma_e_h0: lerp(lo.gamma_e_h0, hi.gamma_e_h0, w),
            gamma_e_he0: lerp(lo.gamma_e_he0, hi.gamma_e_he0, w),
            gamma_e_hep: lerp(lo.gamma_e_hep, hi.gamma_e_hep, w),
        }
    }
}

/// Immutable rate table on `n_cool_tab + 1` nodes.
#[derive(Debug, Clone)]
pub struct RateTable {
    grid: RateGrid,
    nodes: Vec<RateCoefficients>,
}

impl RateTable {
    pub fn build(grid: RateGrid) -> TableResult<Self> {
        grid.validate()?;
        let delta = grid.delta();
        let nodes: Vec<RateCoefficients> = (0..=grid.n_cool_tab)
            .map(|i| RateCoefficients::at_temperature(10f64.powf(grid.log_t_min + delta * i as f64)))
            .collect();

        if let Some(i) = nodes.iter().position(|c| !all_finite(c)) {
            return Err(TableError::InvalidSetup {
                what: format!("non-finite rate coefficient at node {i}"),
            });
        }

        tracing::debug!(
            nodes = nodes.len(),
            log_t_min = grid.log_t_min,
            log_t_max = grid.log_t_max,
            "built rate table"
        );
        Ok(Self { grid, nodes })
    }

    pub fn grid(&self) -> &RateGrid {
        &self.grid
    }

    pub fn node(&self, index: usize) -> Option<&RateCoefficients> {
        self.nodes.get(index)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Locate the interpolation cell for `log_t`, clamping to the grid.
    pub fn cell(&self, log_t: f64) -> GridCell {
        let last = self.grid.n_cool_tab - 1;
        let t = (log_t - self.grid.log_t_min) / self.grid.delta();
        if !t.is_finite() || t <= 0.0 {
            return GridCell {
                index: 0,
                weight_hi: 0.0,
            };
        }
        let index = (t.floor() as usize).min(last);
        GridCell {
            index,
            weight_hi: (t - index as f64).clamp(0.0, 1.0),
        }
    }

    /// Linearly interpolated coefficients at `log_t`.
    pub fn interpolate(&self, log_t: f64) -> RateCoefficients {
        let cell = self.cell(log_t);
        RateCoefficients::blend(
            &self.nodes[cell.index],
            &self.nodes[cell.index + 1],
            cell.weight_hi,
        )
    }
}

fn all_finite(c: &RateCoefficients) -> bool {
    [
        c.beta_h0,
        c.beta_hep,
        c.beta_ff,
        c.alpha_hp,
        c.alpha_hep,
        c.alpha_hepp,
        c.alpha_d,
        c.gamma_e_h0,
        c.gamma_e_he0,
        c.gamma_e_hep,
    ]
    .iter()
    .all(|v| v.is_finite())
}
