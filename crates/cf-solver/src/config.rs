//! Cooling configuration.
//!
//! Resolved once by [`crate::Context::build`]; nothing here is consulted on
//! the per-element hot path except through the channel table the context
//! derives from [`CoolingTerms`].

use crate::error::{SolverError, SolverResult};
use cf_tables::{MetalGrid, MetalSnapshotSource, RateGrid};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level cooling configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoolingConfig {
    /// Log-T grid of the collisional/recombination rate table
    pub rate_grid: RateGrid,
    /// Hydrogen mass fraction X
    pub hydrogen_mass_fraction: f64,
    /// Adiabatic index of the gas
    pub gamma: f64,
    /// Specific energy floor [erg/g]; derived from the table's lowest
    /// temperature for neutral gas when absent
    pub min_specific_energy: Option<f64>,
    /// Total metal mass fraction of solar-composition gas
    pub solar_metallicity: f64,
    pub terms: CoolingTerms,
    pub uv_background: UvBackgroundConfig,
    pub metals: Option<MetalConfig>,
    /// FUV field for photoelectric heating, in Habing units
    pub photoelectric_g0: f64,
    /// Uniform cosmic-ray energy density [eV/cm^3], used when the element
    /// carries no value of its own
    pub cosmic_ray_energy_density_ev: f64,
    /// Dust temperature for dust-gas collisional exchange [K]
    pub dust_temperature: f64,
    /// Effective Compton temperature of hot-source radiation [K]
    pub hot_source_temperature: f64,
    /// Frequency bands of explicitly supplied photon fields
    pub photon_bands: Vec<PhotonBand>,
    /// When false, the hydrodynamic energy source term is integrated
    /// implicitly together with the radiative rate
    pub operator_split: bool,
    /// Cosmological run: redshift advances between element phases
    pub comoving: bool,
    /// Redshift at context construction
    pub redshift: f64,
    pub limits: SolverLimits,
}

impl Default for CoolingConfig {
    fn default() -> Self {
        Self {
            rate_grid: RateGrid::default(),
            hydrogen_mass_fraction: 0.76,
            gamma: 5.0 / 3.0,
            min_specific_energy: None,
            solar_metallicity: 0.014,
            terms: CoolingTerms::default(),
            uv_background: UvBackgroundConfig::default(),
            metals: None,
            photoelectric_g0: 1.7,
            cosmic_ray_energy_density_ev: 1.0,
            dust_temperature: 30.0,
            hot_source_temperature: 2.0e7,
            photon_bands: PhotonBand::default_bands(),
            operator_split: true,
            comoving: false,
            redshift: 0.0,
            limits: SolverLimits::default(),
        }
    }
}

impl CoolingConfig {
    /// Primordial gas with no UV background: only the H/He atomic channels,
    /// free-free and CMB Compton.
    pub fn primordial() -> Self {
        Self {
            terms: CoolingTerms::primordial(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> SolverResult<()> {
        let bad = |what: String| Err(SolverError::InvalidConfig { what });

        if !(self.hydrogen_mass_fraction > 0.0 && self.hydrogen_mass_fraction <= 1.0) {
            return bad(format!(
                "hydrogen_mass_fraction must be in (0, 1], got {}",
                self.hydrogen_mass_fraction
            ));
        }
        if !(self.gamma > 1.0) {
            return bad(format!("gamma must exceed 1, got {}", self.gamma));
        }
        if let Some(u_min) = self.min_specific_energy {
            if !(u_min >= 0.0) || !u_min.is_finite() {
                return bad(format!("min_specific_energy must be finite and >= 0, got {u_min}"));
            }
        }
        if !(self.solar_metallicity > 0.0) {
            return bad("solar_metallicity must be positive".to_string());
        }
        if !(self.redshift > -1.0) {
            return bad(format!("redshift must exceed -1, got {}", self.redshift));
        }
        if self.limits.max_iter < 12 || self.limits.max_bracket_iter == 0 {
            return bad("iteration limits too small (max_iter >= 12, max_bracket_iter >= 1)".into());
        }
        if self.uv_background.enabled && self.uv_background.path.is_none() {
            return bad("uv_background enabled without a path".to_string());
        }
        for band in &self.photon_bands {
            if !(band.mean_energy_ev > 0.0) {
                return bad(format!("photon band '{}' needs a positive mean energy", band.name));
            }
            if band.sigma_h0 < 0.0 || band.sigma_he0 < 0.0 || band.sigma_hep < 0.0 {
                return bad(format!("photon band '{}' has a negative cross-section", band.name));
            }
        }
        if let Some(metals) = &self.metals {
            metals.grid.validate()?;
            if metals.solar_abundances.len() != metals.grid.n_species {
                return bad(format!(
                    "metals.solar_abundances has {} entries, grid has {} species",
                    metals.solar_abundances.len(),
                    metals.grid.n_species
                ));
            }
            if metals.solar_abundances.iter().any(|a| !(*a > 0.0)) {
                return bad("metals.solar_abundances must be positive".to_string());
            }
        }
        Ok(())
    }
}

/// Which heating and cooling channels are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoolingTerms {
    pub collisional_excitation: bool,
    pub collisional_ionization: bool,
    pub recombination: bool,
    pub free_free: bool,
    pub compton_cmb: bool,
    pub compton_hot_source: bool,
    pub metal_lines: bool,
    /// Fitting-function molecular and fine-structure cooling
    pub low_temperature: bool,
    pub dust_gas: bool,
    pub uv_photoheating: bool,
    pub photoelectric: bool,
    pub cosmic_rays: bool,
    pub explicit_radiation: bool,
    pub optically_thick: bool,
}

impl Default for CoolingTerms {
    fn default() -> Self {
        Self {
            collisional_excitation: true,
            collisional_ionization: true,
            recombination: true,
            free_free: true,
            compton_cmb: true,
            compton_hot_source: false,
            metal_lines: true,
            low_temperature: false,
            dust_gas: false,
            uv_photoheating: true,
            photoelectric: false,
            cosmic_rays: false,
            explicit_radiation: true,
            optically_thick: true,
        }
    }
}

impl CoolingTerms {
    pub fn primordial() -> Self {
        Self {
            metal_lines: false,
            uv_photoheating: false,
            explicit_radiation: false,
            optically_thick: false,
            ..Self::default()
        }
    }

    /// Everything on, including the low-temperature approximations.
    pub fn all() -> Self {
        Self {
            collisional_excitation: true,
            collisional_ionization: true,
            recombination: true,
            free_free: true,
            compton_cmb: true,
            compton_hot_source: true,
            metal_lines: true,
            low_temperature: true,
            dust_gas: true,
            uv_photoheating: true,
            photoelectric: true,
            cosmic_rays: true,
            explicit_radiation: true,
            optically_thick: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UvBackgroundConfig {
    pub enabled: bool,
    pub path: Option<PathBuf>,
}

/// Metal-line cooling table setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetalConfig {
    #[serde(default)]
    pub grid: MetalGrid,
    /// Snapshot files sorted by increasing redshift
    pub snapshots: Vec<MetalSnapshotSource>,
    /// Solar mass fraction of each tabulated species, in table order
    #[serde(default = "MetalConfig::default_solar_abundances")]
    pub solar_abundances: Vec<f64>,
}

impl MetalConfig {
    /// Asplund et al. (2009) mass fractions of C, N, O, Ne, Mg, Si, S, Ca, Fe.
    pub fn default_solar_abundances() -> Vec<f64> {
        vec![
            2.38e-3, 0.70e-3, 5.79e-3, 1.26e-3, 7.14e-4, 6.71e-4, 3.12e-4, 0.65e-4, 1.31e-3,
        ]
    }
}

/// One frequency band of an explicitly transported photon field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotonBand {
    pub name: String,
    /// Mean photon energy in the band [eV]
    pub mean_energy_ev: f64,
    /// Band-averaged photoionization cross-sections [cm^2]
    pub sigma_h0: f64,
    pub sigma_he0: f64,
    pub sigma_hep: f64,
}

impl PhotonBand {
    /// H-ionizing, He-ionizing and He+-ionizing bands.
    pub fn default_bands() -> Vec<PhotonBand> {
        vec![
            PhotonBand {
                name: "HI".to_string(),
                mean_energy_ev: 16.0,
                sigma_h0: 3.0e-18,
                sigma_he0: 0.0,
                sigma_hep: 0.0,
            },
            PhotonBand {
                name: "HeI".to_string(),
                mean_energy_ev: 30.0,
                sigma_h0: 5.7e-19,
                sigma_he0: 4.5e-18,
                sigma_hep: 0.0,
            },
            PhotonBand {
                name: "HeII".to_string(),
                mean_energy_ev: 65.0,
                sigma_h0: 7.9e-20,
                sigma_he0: 1.1e-18,
                sigma_hep: 1.1e-18,
            },
        ]
    }
}

/// Iteration caps shared by the nested solvers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverLimits {
    /// Cap for each fixed point and for the bisection
    pub max_iter: usize,
    /// Cap for the exponential bracket search
    pub max_bracket_iter: usize,
    /// Iterations before the cap at which a warning is logged
    pub warn_margin: usize,
}

impl Default for SolverLimits {
    fn default() -> Self {
        Self {
            max_iter: 150,
            max_bracket_iter: 150,
            warn_margin: 10,
        }
    }
}

impl SolverLimits {
    pub(crate) fn near_cap(&self, iter: usize) -> bool {
        iter + self.warn_margin == self.max_iter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        CoolingConfig::default().validate().unwrap();
        CoolingConfig::primordial().validate().unwrap();
    }

    #[test]
    fn uv_without_path_rejected() {
        let mut cfg = CoolingConfig::default();
        cfg.uv_background.enabled = true;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("uv_background"));
    }

    #[test]
    fn solar_abundance_count_must_match_grid() {
        let cfg = CoolingConfig {
            metals: Some(MetalConfig {
                grid: MetalGrid::default(),
                snapshots: vec![],
                solar_abundances: vec![0.01; 3],
            }),
            ..CoolingConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn bad_hydrogen_fraction_rejected() {
        let cfg = CoolingConfig {
            hydrogen_mass_fraction: 0.0,
            ..CoolingConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_terms_deserialize_with_defaults() {
        let terms: CoolingTerms = serde_json::from_str(r#"{"dust_gas": true}"#).unwrap();
        assert!(terms.dust_gas);
        assert!(terms.free_free);
        assert!(!terms.photoelectric);
    }
}
