//! Net heating-minus-cooling rate at one temperature.
//!
//! Every rate is normalized per `nH^2` [erg cm^3 s^-1]. Channels are
//! resolved from [`CoolingTerms`](crate::CoolingTerms) once, when the
//! [`Context`] is built, into a fixed table of plain functions.

use crate::config::CoolingConfig;
use crate::context::Context;
use crate::ionization::{collisional_electrons, solve_ionization, IonizationSolution, RateMode};
use crate::error::SolverResult;
use crate::opacity;
use crate::state::GasView;
use cf_core::constants::{COMPTON_COEFF, RADIATION_CONSTANT, T_HII_REGION};
use cf_core::finite_or;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One heating or cooling process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    CollisionalExcitation,
    CollisionalIonization,
    Recombination,
    FreeFree,
    ComptonCmb,
    ComptonHotSource,
    MetalLines,
    Molecular,
    DustGas,
    UvPhotoheating,
    ExplicitRadiation,
    Photoelectric,
    CosmicRays,
}

impl Channel {
    pub const COUNT: usize = 13;

    pub const ALL: [Channel; Channel::COUNT] = [
        Channel::CollisionalExcitation,
        Channel::CollisionalIonization,
        Channel::Recombination,
        Channel::FreeFree,
        Channel::ComptonCmb,
        Channel::ComptonHotSource,
        Channel::MetalLines,
        Channel::Molecular,
        Channel::DustGas,
        Channel::UvPhotoheating,
        Channel::ExplicitRadiation,
        Channel::Photoelectric,
        Channel::CosmicRays,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Channel::CollisionalExcitation => "collisional_excitation",
            Channel::CollisionalIonization => "collisional_ionization",
            Channel::Recombination => "recombination",
            Channel::FreeFree => "free_free",
            Channel::ComptonCmb => "compton_cmb",
            Channel::ComptonHotSource => "compton_hot_source",
            Channel::MetalLines => "metal_lines",
            Channel::Molecular => "molecular",
            Channel::DustGas => "dust_gas",
            Channel::UvPhotoheating => "uv_photoheating",
            Channel::ExplicitRadiation => "explicit_radiation",
            Channel::Photoelectric => "photoelectric",
            Channel::CosmicRays => "cosmic_rays",
        }
    }

    /// Heating channels are positive when they heat; all others are
    /// positive when they cool and may go negative (Compton below the
    /// radiation temperature, dust warmer than gas).
    pub fn is_heating(self) -> bool {
        matches!(
            self,
            Channel::UvPhotoheating
                | Channel::ExplicitRadiation
                | Channel::Photoelectric
                | Channel::CosmicRays
        )
    }

    /// Channels still evaluated above the top of the rate table.
    fn survives_above_grid(self) -> bool {
        matches!(
            self,
            Channel::FreeFree | Channel::ComptonCmb | Channel::ComptonHotSource
        )
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Net rate with its components.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NetRate {
    pub heating: f64,
    pub cooling: f64,
    /// Hydrodynamic source term folded in when not operator-split
    pub hydro: f64,
    /// `heating - cooling + hydro`
    pub net: f64,
    /// Optically-thick ceiling on `|heating - cooling|`, when a column was supplied
    pub cooling_limit: Option<f64>,
    channels: [f64; Channel::COUNT],
}

impl NetRate {
    /// Unclamped contribution of one channel.
    pub fn channel(&self, channel: Channel) -> f64 {
        self.channels[channel.index()]
    }

    /// Non-zero channel contributions.
    pub fn breakdown(&self) -> impl Iterator<Item = (Channel, f64)> + '_ {
        Channel::ALL
            .iter()
            .map(|c| (*c, self.channels[c.index()]))
            .filter(|(_, v)| *v != 0.0)
    }

    /// The cooling channel contributing most.
    pub fn dominant_cooling(&self) -> Option<Channel> {
        Channel::ALL
            .iter()
            .filter(|c| !c.is_heating() && self.channels[c.index()] > 0.0)
            .copied()
            .max_by(|a, b| self.channels[a.index()].total_cmp(&self.channels[b.index()]))
    }
}

pub(crate) struct RateInputs<'a> {
    ctx: &'a Context,
    view: &'a GasView<'a>,
    sol: &'a IonizationSolution,
}

pub(crate) type ChannelFn = fn(&RateInputs<'_>) -> f64;

/// Active channels for `config`, in a fixed order.
pub(crate) fn resolve_channels(
    config: &CoolingConfig,
    has_uv: bool,
    has_metals: bool,
) -> Vec<(Channel, ChannelFn)> {
    let t = &config.terms;
    let mut channels: Vec<(Channel, ChannelFn)> = Vec::with_capacity(Channel::COUNT);
    let mut add = |on: bool, channel: Channel, f: ChannelFn| {
        if on {
            channels.push((channel, f));
        }
    };

    add(t.collisional_excitation, Channel::CollisionalExcitation, collisional_excitation);
    add(t.collisional_ionization, Channel::CollisionalIonization, collisional_ionization);
    add(t.recombination, Channel::Recombination, recombination);
    add(t.free_free, Channel::FreeFree, free_free);
    add(t.compton_cmb, Channel::ComptonCmb, compton_cmb);
    add(t.compton_hot_source, Channel::ComptonHotSource, compton_hot_source);
    add(t.metal_lines && has_metals, Channel::MetalLines, metal_lines);
    add(t.low_temperature, Channel::Molecular, molecular);
    add(t.dust_gas, Channel::DustGas, dust_gas);
    add(t.uv_photoheating && has_uv, Channel::UvPhotoheating, uv_photoheating);
    add(
        t.explicit_radiation && !config.photon_bands.is_empty(),
        Channel::ExplicitRadiation,
        explicit_radiation,
    );
    add(
        t.photoelectric && config.photoelectric_g0 > 0.0,
        Channel::Photoelectric,
        photoelectric,
    );
    add(t.cosmic_rays, Channel::CosmicRays, cosmic_rays);
    channels
}

/// Sum the active channels for an ionization solution.
pub(crate) fn assemble(ctx: &Context, view: &GasView<'_>, sol: &IonizationSolution) -> NetRate {
    let inputs = RateInputs { ctx, view, sol };
    let above_grid = sol.log_t >= ctx.config().rate_grid.log_t_max;
    let mut out = NetRate::default();

    for (channel, f) in ctx.channel_table() {
        if above_grid && !channel.survives_above_grid() {
            continue;
        }
        let v = finite_or(f(&inputs), 0.0);
        out.channels[channel.index()] = v;
        if channel.is_heating() {
            out.heating += v;
        } else if v >= 0.0 {
            out.cooling += v;
        } else {
            out.heating -= v;
        }
    }

    if ctx.config().terms.optically_thick {
        if let Some(column) = view.element.column_density.filter(|c| *c > 0.0) {
            let limit = opacity::cooling_limit(ctx, view, sol.temperature, column);
            let q = out.heating - out.cooling;
            let cap = limit.max(0.0);
            // |Q| shrinks to the cap, its sign is kept
            if q.abs() > cap {
                let clamped = q.signum() * cap;
                if q < 0.0 {
                    out.cooling = out.heating - clamped;
                } else {
                    out.heating = out.cooling + clamped;
                }
            }
            out.cooling_limit = Some(limit);
        }
    }

    if view.element.ionized_region && sol.temperature < T_HII_REGION {
        out.cooling = out.cooling.min(out.heating);
    }

    if !ctx.config().operator_split {
        out.hydro = finite_or(
            view.element.hydro_du_dt * view.element.density / (view.n_h * view.n_h),
            0.0,
        );
    }
    out.net = out.heating - out.cooling + out.hydro;
    out
}

/// Ionization balance and net rate at `temperature` [K].
pub fn net_rate_at_temperature(
    ctx: &Context,
    view: &GasView<'_>,
    temperature: f64,
    ne_guess: f64,
) -> SolverResult<(IonizationSolution, NetRate)> {
    let sol = solve_ionization(ctx, view, temperature.log10(), ne_guess, RateMode::WithNetRate)?;
    let rate = sol.net_rate.unwrap_or_else(|| assemble(ctx, view, &sol));
    Ok((sol, rate))
}

fn collisional_excitation(r: &RateInputs<'_>) -> f64 {
    let (s, c) = (&r.sol.state, &r.sol.coefficients);
    (c.beta_h0 * s.nh0 + c.beta_hep * s.nhep) * s.ne
}

fn collisional_ionization(r: &RateInputs<'_>) -> f64 {
    let (s, c) = (&r.sol.state, &r.sol.coefficients);
    (2.18e-11 * c.gamma_e_h0 * s.nh0 + 3.94e-11 * c.gamma_e_he0 * s.nhe0 + 8.72e-11 * c.gamma_e_hep * s.nhep)
        * s.ne
}

fn recombination(r: &RateInputs<'_>) -> f64 {
    let (s, c) = (&r.sol.state, &r.sol.coefficients);
    let radiative = 1.036e-16
        * r.sol.temperature
        * s.ne
        * (c.alpha_hp * s.nhp + c.alpha_hep * s.nhep + c.alpha_hepp * s.nhepp);
    let dielectronic = 6.526e-11 * c.alpha_d * s.ne * s.nhep;
    radiative + dielectronic
}

fn free_free(r: &RateInputs<'_>) -> f64 {
    let (s, c) = (&r.sol.state, &r.sol.coefficients);
    c.beta_ff * (s.nhp + s.nhep + 4.0 * s.nhepp) * s.ne
}

fn compton_cmb(r: &RateInputs<'_>) -> f64 {
    let t_cmb = r.ctx.t_cmb();
    let u_cmb = RADIATION_CONSTANT * t_cmb.powi(4);
    COMPTON_COEFF * u_cmb * r.sol.state.ne * (r.sol.temperature - t_cmb) / r.view.n_h
}

fn compton_hot_source(r: &RateInputs<'_>) -> f64 {
    let u_rad = r.view.element.hot_source_energy_density.unwrap_or(0.0);
    let t_rad = r.ctx.config().hot_source_temperature;
    COMPTON_COEFF * u_rad * r.sol.state.ne * (r.sol.temperature - t_rad) / r.view.n_h
}

fn metal_lines(r: &RateInputs<'_>) -> f64 {
    let Some(table) = r.ctx.metals() else {
        return 0.0;
    };
    let config = r.ctx.config();
    let metallicity = &r.view.element.metallicity;
    if metallicity.total <= 0.0 && metallicity.species.is_empty() {
        return 0.0;
    }

    let defaults;
    let solar: &[f64] = match &config.metals {
        Some(m) => &m.solar_abundances,
        None => {
            defaults = crate::config::MetalConfig::default_solar_abundances();
            &defaults
        }
    };

    let ne_table = collisional_electrons(&r.sol.coefficients, r.ctx.y_helium()).max(1.0e-4);
    let ne_scale = r.sol.state.ne / ne_table;

    let mut total = 0.0;
    for species in 0..table.grid().n_species {
        let ratio = match (metallicity.species.get(species), solar.get(species)) {
            (Some(z), Some(z_sun)) if metallicity.species.len() == table.grid().n_species => {
                z / z_sun
            }
            _ => metallicity.total / config.solar_metallicity,
        };
        if ratio > 0.0 {
            total += table.species_rate(species, r.view.log_n_h, r.sol.log_t) * ratio;
        }
    }
    total * ne_scale
}

fn molecular(r: &RateInputs<'_>) -> f64 {
    let t = r.sol.temperature;
    let n = r.view.n_h;
    let z = r.view.metallicity_ratio;
    let base = 2.8958e-26
        / ((t / 125.215).powf(-4.9202) + (t / 1349.86).powf(-1.7288) + (t / 6450.06).powf(-0.3075));
    let density_term = 0.001 + 0.10 * n / (1.0 + n) + 0.09 * n / (1.0 + 0.1 * n) + z * z / (1.0 + n);
    base * density_term * (1.0 + z) / (1.0 + 0.00143 * n) * r.sol.state.nh0
}

fn dust_gas(r: &RateInputs<'_>) -> f64 {
    let t = r.sol.temperature;
    let t_dust = r.ctx.config().dust_temperature;
    1.116e-32 * (t - t_dust) * t.sqrt() * (1.0 - 0.8 * (-75.0 / t).exp()) * r.view.metallicity_ratio
}

fn uv_photoheating(r: &RateInputs<'_>) -> f64 {
    let (s, bg) = (&r.sol.state, &r.sol.background);
    (s.nh0 * bg.eps_h0 + s.nhe0 * bg.eps_he0 + s.nhep * bg.eps_hep) / r.view.n_h
}

fn explicit_radiation(r: &RateInputs<'_>) -> f64 {
    let (s, rad) = (&r.sol.state, &r.view.radiation);
    (s.nh0 * rad.eps_h0 + s.nhe0 * rad.eps_he0 + s.nhep * rad.eps_hep) / r.view.n_h
}

/// Bakes & Tielens (1994) grain photoelectric heating.
fn photoelectric(r: &RateInputs<'_>) -> f64 {
    let g0 = r.ctx.config().photoelectric_g0;
    let t = r.sol.temperature;
    let necgs = r.sol.state.ne * r.view.n_h;
    if necgs <= 0.0 {
        return 0.0;
    }
    let x = g0 * t.sqrt() / necgs;
    let efficiency = 4.9e-2 / (1.0 + (x / 1925.0).powf(0.73))
        + 3.7e-2 * (t / 1.0e4).powf(0.7) / (1.0 + x / 5000.0);
    1.3e-24 * efficiency * g0 * r.view.metallicity_ratio / r.view.n_h
}

/// Coulomb and hadronic heating by cosmic rays.
fn cosmic_rays(r: &RateInputs<'_>) -> f64 {
    let n_h = r.view.n_h;
    let e_cr = match r.view.element.cosmic_ray_energy_density {
        Some(e) => e,
        // uniform background, suppressed in diffuse gas
        None => r.ctx.config().cosmic_ray_energy_density_ev * (n_h / 0.01).min(1.0),
    };
    1.0e-16 * (0.98 + 1.65 * r.sol.state.ne) * e_cr / n_h
}
