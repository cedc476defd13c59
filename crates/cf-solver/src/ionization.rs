//! Ionization balance of H and He at fixed temperature.
//!
//! Collisional ionization, photoionization and radiative plus dielectronic
//! recombination are balanced species by species. Photoionization rates
//! enter divided by the electron density, so with a photo source present the
//! balance is a fixed point in `ne`; without one a single pass is exact.

use crate::context::Context;
use crate::error::{ConvergenceDump, SolverError, SolverResult};
use crate::rates::{self, NetRate};
use crate::state::{GasView, IonizationState};
use cf_tables::{RateCoefficients, UvRates};

/// Rates below this are treated as zero in the He balance.
const SMALLNUM: f64 = 1.0e-20;

/// Electron densities below this [cm^-3] switch photo terms off.
const MIN_ELECTRON_DENSITY: f64 = 1.0e-25;

/// Whether to also assemble the net cooling rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateMode {
    FractionsOnly,
    WithNetRate,
}

/// Equilibrium state at one temperature.
#[derive(Debug, Clone)]
pub struct IonizationSolution {
    pub state: IonizationState,
    pub temperature: f64,
    pub log_t: f64,
    pub mu: f64,
    /// Rate coefficients the balance was computed with
    pub coefficients: RateCoefficients,
    /// Background rates after self-shielding
    pub background: UvRates,
    /// Self-shielding factor applied to the background
    pub shield: f64,
    pub iterations: usize,
    pub net_rate: Option<NetRate>,
}

/// Solve the ionization balance at `log_t`, starting the `ne` iteration from
/// `ne_guess`.
pub fn solve_ionization(
    ctx: &Context,
    view: &GasView<'_>,
    log_t: f64,
    ne_guess: f64,
    mode: RateMode,
) -> SolverResult<IonizationSolution> {
    let grid = ctx.config().rate_grid;
    let y = ctx.y_helium();
    let temperature = 10f64.powf(log_t);
    let (photo, shield) = view.photo_rates(ctx, log_t);
    let background = ctx.uv_rates().scaled(shield);

    let (mut state, coefficients, iterations) = if log_t <= grid.log_t_min {
        (
            IonizationState::neutral(y),
            ctx.rate_table().interpolate(log_t),
            0,
        )
    } else if log_t >= grid.log_t_max {
        (
            IonizationState::fully_ionized(y),
            RateCoefficients::at_temperature(temperature),
            0,
        )
    } else {
        let coefficients = ctx.rate_table().interpolate(log_t);
        let (mut state, iterations) =
            iterate_electrons(ctx, view, &coefficients, &photo, temperature, ne_guess)?;

        if let Some(prev) = &view.previous {
            if !view.radiation.is_zero() && view.element.dt > 0.0 {
                let necgs = state.ne * view.n_h;
                let rate = necgs * (coefficients.alpha_hp + coefficients.gamma_e_h0) + photo.gamma_h0;
                state = state.relax_from(prev, view.element.dt * rate);
            }
        }
        (state, coefficients, iterations)
    };

    if view.element.ionized_region {
        state.nhep += state.nhe0;
        state.nhe0 = 0.0;
        state.nh0 = 0.0;
        state.nhp = 1.0;
        state.ne = state.electrons();
    }

    let mut solution = IonizationSolution {
        mu: state.mu(y),
        state,
        temperature,
        log_t,
        coefficients,
        background,
        shield,
        iterations,
        net_rate: None,
    };
    if mode == RateMode::WithNetRate {
        solution.net_rate = Some(rates::assemble(ctx, view, &solution));
    }
    Ok(solution)
}

fn iterate_electrons(
    ctx: &Context,
    view: &GasView<'_>,
    c: &RateCoefficients,
    photo: &UvRates,
    temperature: f64,
    ne_guess: f64,
) -> SolverResult<(IonizationState, usize)> {
    let y = ctx.y_helium();
    let limits = ctx.limits();
    let photo_on = !photo.is_zero();
    let mut ne = if ne_guess.is_finite() && ne_guess >= 0.0 {
        ne_guess
    } else {
        0.0
    };

    for iter in 1..=limits.max_iter {
        let ne_old = ne;
        let necgs = ne * view.n_h;
        let per_electron = if photo_on && necgs > MIN_ELECTRON_DENSITY {
            (
                photo.gamma_h0 / necgs,
                photo.gamma_he0 / necgs,
                photo.gamma_hep / necgs,
            )
        } else {
            (0.0, 0.0, 0.0)
        };

        let state = balance(c, y, per_electron);
        if !photo_on {
            return Ok((state, iter));
        }

        ne = 0.5 * (state.ne + ne_old);
        if (ne - ne_old).abs() < (0.01 * ne).max(1.0e-4) {
            return Ok((state, iter));
        }
        if limits.near_cap(iter) {
            tracing::warn!(
                element = %view.element.id,
                iter,
                temperature,
                ne,
                "ionization balance approaching iteration cap"
            );
        }
    }

    let dump = ConvergenceDump {
        element: Some(view.element.id),
        density: Some(view.element.density),
        temperature: Some(temperature),
        ne_guess: Some(ne_guess),
        iterations: limits.max_iter,
        ..ConvergenceDump::default()
    };
    tracing::error!(%dump, "ionization balance did not converge");
    Err(SolverError::IonizationNotConverged(Box::new(dump)))
}

/// One pass of the species balance with photo rates given per free electron.
fn balance(c: &RateCoefficients, y: f64, (g_h0, g_he0, g_hep): (f64, f64, f64)) -> IonizationState {
    let nh0 = c.alpha_hp / (c.alpha_hp + c.gamma_e_h0 + g_h0);
    let nhp = 1.0 - nh0;

    let ionize_he0 = c.gamma_e_he0 + g_he0;
    let (nhe0, nhep, nhepp) = if ionize_he0 <= SMALLNUM {
        (y, 0.0, 0.0)
    } else {
        let recomb_hep = c.alpha_hep + c.alpha_d;
        let ionize_hep = c.gamma_e_hep + g_hep;
        let nhep = y / (1.0 + recomb_hep / ionize_he0 + ionize_hep / c.alpha_hepp);
        (nhep * recomb_hep / ionize_he0, nhep, nhep * ionize_hep / c.alpha_hepp)
    };

    let mut state = IonizationState {
        nh0,
        nhp,
        nhe0,
        nhep,
        nhepp,
        ne: 0.0,
    };
    state.ne = state.electrons();
    state
}

/// Electron abundance of purely collisional equilibrium.
pub(crate) fn collisional_electrons(c: &RateCoefficients, y: f64) -> f64 {
    balance(c, y, (0.0, 0.0, 0.0)).ne
}

/// Starting electron abundance when no usable seed is persisted.
pub(crate) fn default_ne_guess(ctx: &Context, log_t: f64, photo_on: bool) -> f64 {
    if log_t < 3.8 {
        if photo_on {
            0.5
        } else {
            1.0e-3
        }
    } else if log_t < 4.5 {
        0.5
    } else {
        1.0 + 2.0 * ctx.y_helium()
    }
}
