//! Immutable solver context.
//!
//! Built once from a [`CoolingConfig`]; every per-element call borrows it
//! shared. The only mutation is [`Context::set_redshift`], which takes
//! `&mut self` and therefore cannot overlap a parallel element phase.

use crate::config::{CoolingConfig, SolverLimits};
use crate::error::{SolverError, SolverResult};
use crate::rates::{self, Channel, ChannelFn};
use crate::state::mean_molecular_weight;
use cf_core::constants::{BOLTZMANN, PROTON_MASS, T_CMB0};
use cf_tables::{bracket_sources, MetalCoolingTable, RateTable, UvBackgroundTable, UvRates};

pub struct Context {
    config: CoolingConfig,
    rate_table: RateTable,
    uv: Option<UvBackgroundTable>,
    metals: Option<MetalCoolingTable>,
    channels: Vec<(Channel, ChannelFn)>,
    y_helium: f64,
    min_specific_energy: f64,
    redshift: f64,
    uv_rates: UvRates,
    t_cmb: f64,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("redshift", &self.redshift)
            .field("channels", &self.channels.iter().map(|(c, _)| *c).collect::<Vec<_>>())
            .field("uv_background", &self.uv.is_some())
            .field("metals", &self.metals.as_ref().map(|m| m.bracket()))
            .finish()
    }
}

impl Context {
    /// Validate the configuration and load every table it names.
    pub fn build(config: CoolingConfig) -> SolverResult<Self> {
        config.validate()?;

        let uv = match (&config.uv_background.enabled, &config.uv_background.path) {
            (true, Some(path)) => Some(UvBackgroundTable::from_path(path)?),
            _ => None,
        };
        let metals = match &config.metals {
            Some(m) if config.terms.metal_lines => Some(MetalCoolingTable::load(
                m.grid,
                &m.snapshots,
                config.redshift,
            )?),
            _ => None,
        };
        Self::build_with_tables(config, uv, metals)
    }

    /// Build from tables already in memory.
    pub fn build_with_tables(
        config: CoolingConfig,
        uv: Option<UvBackgroundTable>,
        metals: Option<MetalCoolingTable>,
    ) -> SolverResult<Self> {
        config.validate()?;
        if let (Some(table), Some(mc)) = (&metals, &config.metals) {
            if table.grid() != &mc.grid {
                return Err(SolverError::InvalidConfig {
                    what: "metal table grid differs from metals.grid".to_string(),
                });
            }
        }
        let metals = if config.terms.metal_lines { metals } else { None };
        let rate_table = RateTable::build(config.rate_grid)?;

        let x = config.hydrogen_mass_fraction;
        let y_helium = (1.0 - x) / (4.0 * x);
        let min_specific_energy = config.min_specific_energy.unwrap_or_else(|| {
            // neutral gas at the bottom of the rate table
            let mu = mean_molecular_weight(y_helium, 0.0);
            BOLTZMANN * config.rate_grid.t_min() / ((config.gamma - 1.0) * PROTON_MASS * mu)
        });

        let channels = rates::resolve_channels(&config, uv.is_some(), metals.is_some());
        let redshift = config.redshift;
        let uv_rates = uv.as_ref().map_or(UvRates::ZERO, |t| t.rates_at(redshift));

        tracing::debug!(
            channels = channels.len(),
            uv_background = uv.is_some(),
            metals = metals.is_some(),
            redshift,
            "built cooling context"
        );

        Ok(Self {
            rate_table,
            uv,
            metals,
            channels,
            y_helium,
            min_specific_energy,
            redshift,
            uv_rates,
            t_cmb: T_CMB0 * (1.0 + redshift),
            config,
        })
    }

    /// Move to a new redshift between element phases.
    ///
    /// Re-interpolates the UV background and re-weights the metal snapshots,
    /// reloading them from disk when `redshift` leaves the loaded bracket.
    /// Returns `true` if snapshots were reloaded.
    pub fn set_redshift(&mut self, redshift: f64) -> SolverResult<bool> {
        if !(redshift > -1.0) || !redshift.is_finite() {
            return Err(SolverError::InvalidConfig {
                what: format!("redshift must be finite and exceed -1, got {redshift}"),
            });
        }
        self.redshift = redshift;
        self.t_cmb = T_CMB0 * (1.0 + redshift);
        self.uv_rates = self
            .uv
            .as_ref()
            .map_or(UvRates::ZERO, |t| t.rates_at(redshift));

        let mut reloaded = false;
        if let (Some(table), Some(mc)) = (&mut self.metals, &self.config.metals) {
            if !table.reweight(redshift) && !mc.snapshots.is_empty() {
                let (lo, hi) = bracket_sources(&mc.snapshots, redshift)?;
                let wanted = (mc.snapshots[lo].redshift, hi.map(|i| mc.snapshots[i].redshift));
                if wanted != table.bracket() {
                    *table = MetalCoolingTable::load(mc.grid, &mc.snapshots, redshift)?;
                    reloaded = true;
                    tracing::debug!(
                        redshift,
                        lower = wanted.0,
                        upper = ?wanted.1,
                        "reloaded metal cooling snapshots"
                    );
                }
            }
        }
        Ok(reloaded)
    }

    pub fn config(&self) -> &CoolingConfig {
        &self.config
    }

    pub fn limits(&self) -> &SolverLimits {
        &self.config.limits
    }

    pub fn rate_table(&self) -> &RateTable {
        &self.rate_table
    }

    pub fn metals(&self) -> Option<&MetalCoolingTable> {
        self.metals.as_ref()
    }

    pub fn uv_background(&self) -> Option<&UvBackgroundTable> {
        self.uv.as_ref()
    }

    /// Unshielded background rates at the current redshift.
    pub fn uv_rates(&self) -> UvRates {
        self.uv_rates
    }

    pub fn redshift(&self) -> f64 {
        self.redshift
    }

    pub fn t_cmb(&self) -> f64 {
        self.t_cmb
    }

    /// Helium abundance by number relative to hydrogen.
    pub fn y_helium(&self) -> f64 {
        self.y_helium
    }

    pub fn min_specific_energy(&self) -> f64 {
        self.min_specific_energy
    }

    /// Temperature floor [K].
    pub fn t_floor(&self) -> f64 {
        self.config.rate_grid.t_min()
    }

    pub fn active_channels(&self) -> impl Iterator<Item = Channel> + '_ {
        self.channels.iter().map(|(c, _)| *c)
    }

    pub(crate) fn channel_table(&self) -> &[(Channel, ChannelFn)] {
        &self.channels
    }

    /// `T = (γ-1)/k_B · u · m_p · μ(ne)`.
    pub fn temperature_from_energy(&self, specific_energy: f64, ne: f64) -> f64 {
        let mu = mean_molecular_weight(self.y_helium, ne);
        (self.config.gamma - 1.0) / BOLTZMANN * specific_energy * PROTON_MASS * mu
    }

    /// Inverse of [`Context::temperature_from_energy`].
    pub fn energy_from_temperature(&self, temperature: f64, ne: f64) -> f64 {
        let mu = mean_molecular_weight(self.y_helium, ne);
        temperature * BOLTZMANN / ((self.config.gamma - 1.0) * PROTON_MASS * mu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_tables::{MetalGrid, MetalSnapshot, UvRow};

    fn flat_uv(gamma_h0: f64) -> UvBackgroundTable {
        let rates = UvRates {
            gamma_h0,
            eps_h0: gamma_h0 * 5.0e-12,
            ..UvRates::ZERO
        };
        UvBackgroundTable::from_rows(vec![
            UvRow { log_1pz: 0.0, rates },
            UvRow { log_1pz: 1.0, rates },
        ])
        .unwrap()
    }

    #[test]
    fn primordial_context_derives_floor_and_helium() {
        let ctx = Context::build(CoolingConfig::primordial()).unwrap();
        assert!((ctx.y_helium() - 0.24 / 3.04).abs() < 1e-12);
        let t = ctx.temperature_from_energy(ctx.min_specific_energy(), 0.0);
        assert!((t - 10.0).abs() < 1e-9, "t = {t}");
        assert!(ctx.active_channels().any(|c| c == Channel::FreeFree));
        assert!(!ctx.active_channels().any(|c| c == Channel::MetalLines));
    }

    #[test]
    fn energy_temperature_roundtrip() {
        let ctx = Context::build(CoolingConfig::primordial()).unwrap();
        let u = ctx.energy_from_temperature(1.0e6, 1.1);
        let t = ctx.temperature_from_energy(u, 1.1);
        assert!((t - 1.0e6).abs() < 1e-6);
    }

    #[test]
    fn set_redshift_updates_cmb_and_uv() {
        let mut config = CoolingConfig::default();
        config.terms.uv_photoheating = true;
        let mut ctx = Context::build_with_tables(config, Some(flat_uv(1.0e-12)), None).unwrap();
        assert!((ctx.uv_rates().gamma_h0 - 1.0e-12).abs() < 1e-24);

        assert!(!ctx.set_redshift(3.0).unwrap());
        assert!((ctx.t_cmb() - 4.0 * T_CMB0).abs() < 1e-12);
        assert!(ctx.uv_rates().gamma_h0 > 0.0);

        // beyond the table: background off
        ctx.set_redshift(20.0).unwrap();
        assert!(ctx.uv_rates().is_zero());
        assert!(ctx.set_redshift(-2.0).is_err());
    }

    #[test]
    fn metal_table_dropped_when_channel_off() {
        let grid = MetalGrid {
            n_species: 1,
            n_density: 2,
            n_temperature: 2,
            ..MetalGrid::default()
        };
        let snap = MetalSnapshot::from_values(&grid, 0.0, vec![1.0e-23; 4]).unwrap();
        let table = MetalCoolingTable::new(grid, snap, None, 0.0).unwrap();
        let ctx = Context::build_with_tables(CoolingConfig::primordial(), None, Some(table)).unwrap();
        assert!(ctx.metals().is_none());
    }

    #[test]
    fn missing_uv_file_is_fatal() {
        let mut config = CoolingConfig::default();
        config.uv_background.enabled = true;
        config.uv_background.path = Some(std::env::temp_dir().join("cf-no-such-treecool"));
        let err = Context::build(config).unwrap_err();
        assert!(matches!(err, SolverError::Table(_)));
        assert!(err.to_string().contains("cf-no-such-treecool"));
    }
}
