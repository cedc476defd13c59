//! Effective opacity and the optically-thick cooling ceiling.

use crate::context::Context;
use crate::state::GasView;
use cf_core::constants::STEFAN_BOLTZMANN;
use cf_core::finite_or;

/// Electron donors left in metal-free gas for the H- term.
const HMINUS_Z_FLOOR: f64 = 1.0e-6;

/// Effective Rosseland-like opacity [cm^2/g].
///
/// Radiative opacity combines molecular/dust absorption with H-, electron
/// scattering and Kramers terms; conduction acts in parallel.
///
/// # Arguments
/// * `density` - mass density [g/cm^3]
/// * `temperature` - [K]
/// * `metal_fraction` - total metal mass fraction Z
/// * `metallicity_ratio` - Z relative to solar
/// * `hydrogen_fraction` - hydrogen mass fraction X
pub fn effective_opacity(
    density: f64,
    temperature: f64,
    metal_fraction: f64,
    metallicity_ratio: f64,
    hydrogen_fraction: f64,
) -> f64 {
    let (rho, t, z, x) = (density, temperature, metal_fraction.max(0.0), hydrogen_fraction);

    let kappa_mol = 0.1 * metallicity_ratio.max(0.0);
    let kappa_hminus = 1.1e-25 * z.max(HMINUS_Z_FLOOR).sqrt() * rho.sqrt() * t.powf(7.7);
    let kappa_es = 0.2 * (1.0 + x);
    let kappa_kramers = 4.0e25 * (1.0 + x) * (z + 0.001) * rho * t.powf(-3.5);
    let kappa_rad = kappa_mol + 1.0 / (1.0 / kappa_hminus + 1.0 / (kappa_es + kappa_kramers));

    let kappa_cond = 2.6e-7 * t * t / (rho * rho);
    finite_or(1.0 / (1.0 / kappa_rad + 1.0 / kappa_cond), 0.0)
}

/// Largest cooling rate per nH^2 a column `column` [g/cm^2] can radiate.
pub(crate) fn cooling_limit(ctx: &Context, view: &GasView<'_>, temperature: f64, column: f64) -> f64 {
    let el = view.element;
    let kappa = effective_opacity(
        el.density,
        temperature,
        el.metallicity.total,
        view.metallicity_ratio,
        ctx.config().hydrogen_mass_fraction,
    );
    let tau = kappa * column;
    let t_cmb = ctx.t_cmb();
    let flux = STEFAN_BOLTZMANN * (temperature.powi(4) - t_cmb.powi(4));
    let per_mass = flux / ((1.0 + tau) * column);
    finite_or(per_mass * el.density / (view.n_h * view.n_h), f64::INFINITY)
}
