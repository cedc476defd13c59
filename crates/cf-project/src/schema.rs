//! Run file schema definitions.

use cf_core::units::{myr, seconds};
use cf_sim::{Cosmology, SimOptions};
use cf_solver::CoolingConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunFile {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub cooling: CoolingConfig,
    #[serde(default)]
    pub elements: Vec<ElementDef>,
    #[serde(default)]
    pub run: RunDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementDef {
    pub id: u64,
    pub density_g_cm3: f64,
    pub thermal: ThermalDef,
    /// Total metal mass fraction
    #[serde(default)]
    pub metallicity: f64,
    /// Per-species metal mass fractions; empty means solar pattern
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub species: Vec<f64>,
    #[serde(default)]
    pub hydro_du_dt: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photon_energy_density: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_density_g_cm2: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cosmic_ray_ev_cm3: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hot_source_erg_cm3: Option<f64>,
    #[serde(default)]
    pub ionized_region: bool,
}

/// Initial thermal state of an element.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ThermalDef {
    /// Temperature with the matching equilibrium ionization
    Temperature { temperature_k: f64 },
    SpecificEnergy { erg_per_g: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunDef {
    pub dt_myr: f64,
    pub t_end_myr: f64,
    pub max_steps: usize,
    pub record_every: usize,
    pub cosmology: Cosmology,
}

impl Default for RunDef {
    fn default() -> Self {
        Self {
            dt_myr: 1.0,
            t_end_myr: 100.0,
            max_steps: 100_000,
            record_every: 10,
            cosmology: Cosmology::default(),
        }
    }
}

impl RunDef {
    pub fn sim_options(&self) -> SimOptions {
        SimOptions {
            dt: seconds(myr(self.dt_myr)),
            t_end: seconds(myr(self.t_end_myr)),
            max_steps: self.max_steps,
            record_every: self.record_every,
            cosmology: self.cosmology,
        }
    }
}
