//! Implicit energy update.
//!
//! Backward Euler over one timestep:
//!
//! ```text
//! F(u) = u - u_old - ratefact * dt * Λ(u) = 0,   ratefact = nH^2 / rho
//! ```
//!
//! `Λ(u)` is the net rate at the temperature that energy implies. The root is
//! bracketed by geometric steps of 1.1 away from `u_old` and then bisected.
//! Both endpoints of the bracket always carry opposite signs of `F`.

use crate::config::SolverLimits;
use crate::context::Context;
use crate::error::{ConvergenceDump, SolverError, SolverResult};
use crate::molecular::molecular_fraction;
use crate::rates::{net_rate_at_temperature, NetRate};
use crate::state::{GasElement, GasView, IonizationSeed, IonizationState};
use crate::temperature::solve_temperature;

/// Geometric bracket step.
const BRACKET_FACTOR: f64 = 1.1;

/// Relative bracket width accepted outright.
const TIGHT_TOL: f64 = 3.0e-4;

/// Relative bracket width accepted after `LOOSE_AFTER` bisections.
const LOOSE_TOL: f64 = 3.0e-2;
const LOOSE_AFTER: usize = 10;

/// Converged root of the implicit update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyRoot {
    pub specific_energy: f64,
    pub iterations: usize,
    pub bracket_iterations: usize,
    pub bracket: (f64, f64),
}

/// Solve `u - u_old - ratefact_dt * net_rate(u) = 0` for `u`.
///
/// `net_rate` is evaluated once per probe; errors it returns propagate
/// unchanged.
pub fn implicit_energy_solve<F>(
    u_old: f64,
    ratefact_dt: f64,
    limits: &SolverLimits,
    mut net_rate: F,
) -> SolverResult<EnergyRoot>
where
    F: FnMut(f64) -> SolverResult<f64>,
{
    let mut residual = |u: f64| -> SolverResult<f64> {
        let lambda = net_rate(u)?;
        Ok(cf_core::ensure_finite(u - u_old - ratefact_dt * lambda, "energy residual")?)
    };

    let f_old = residual(u_old)?;
    if f_old == 0.0 {
        return Ok(EnergyRoot {
            specific_energy: u_old,
            iterations: 0,
            bracket_iterations: 0,
            bracket: (u_old, u_old),
        });
    }

    let (mut lo, mut hi) = (u_old, u_old);
    let mut bracket_iterations = 0;
    loop {
        if bracket_iterations == limits.max_bracket_iter {
            let dump = ConvergenceDump {
                specific_energy: Some(u_old),
                iterations: bracket_iterations,
                bracket: Some((lo, hi)),
                ..ConvergenceDump::default()
            };
            return Err(SolverError::BracketNotFound(Box::new(dump)));
        }
        bracket_iterations += 1;
        if bracket_iterations + limits.warn_margin == limits.max_bracket_iter {
            tracing::warn!(u_old, lo, hi, "energy bracket search approaching cap");
        }

        if f_old < 0.0 {
            // net heating: root lies above u_old
            lo = hi;
            hi *= BRACKET_FACTOR;
            if residual(hi)? >= 0.0 {
                break;
            }
        } else {
            hi = lo;
            lo /= BRACKET_FACTOR;
            if residual(lo)? <= 0.0 {
                break;
            }
        }
    }

    for iter in 1..=limits.max_iter {
        let u = 0.5 * (lo + hi);
        if residual(u)? > 0.0 {
            hi = u;
        } else {
            lo = u;
        }
        let rel = ((hi - lo) / u).abs();
        if rel <= TIGHT_TOL || (iter >= LOOSE_AFTER && rel <= LOOSE_TOL) {
            return Ok(EnergyRoot {
                specific_energy: u,
                iterations: iter,
                bracket_iterations,
                bracket: (lo, hi),
            });
        }
        if limits.near_cap(iter) {
            tracing::warn!(u_old, lo, hi, iter, "energy bisection approaching cap");
        }
    }

    let dump = ConvergenceDump {
        specific_energy: Some(u_old),
        iterations: limits.max_iter,
        bracket: Some((lo, hi)),
        ..ConvergenceDump::default()
    };
    Err(SolverError::EnergyNotConverged(Box::new(dump)))
}

/// Result of cooling one element over its timestep.
#[derive(Debug, Clone)]
pub struct CoolingOutcome {
    /// Updated specific energy [erg/g]
    pub specific_energy: f64,
    /// New value of the element's rate-of-change field [erg/g/s]: zero when
    /// clamped to the floor or when the hydro term was integrated here
    pub du_dt: f64,
    /// `(u_new - u_old) / dt`
    pub radiative_du_dt: f64,
    pub temperature: f64,
    pub mu: f64,
    /// `(γ-1) rho u`
    pub pressure: f64,
    pub ionization: IonizationState,
    /// Warm start for the next call
    pub seed: IonizationSeed,
    /// Rates at the final state
    pub rates: NetRate,
    pub molecular_fraction: f64,
    pub iterations: usize,
    pub temperature_iterations: usize,
    pub floor_clamped: bool,
}

impl CoolingOutcome {
    pub fn electron_fraction(&self) -> f64 {
        self.ionization.ne
    }

    /// Write the persisted fields back.
    pub fn apply(&self, element: &mut GasElement, seed: &mut IonizationSeed) {
        element.specific_energy = self.specific_energy;
        element.hydro_du_dt = self.du_dt;
        *seed = self.seed;
    }
}

fn check_element(ctx: &Context, element: &GasElement) -> SolverResult<()> {
    let bad = |what: String| Err(SolverError::InvalidState { what });
    if !element.density.is_finite() || element.density <= 0.0 {
        return bad(format!("element {}: density must be positive, got {}", element.id, element.density));
    }
    if !element.specific_energy.is_finite() {
        return bad(format!("element {}: non-finite specific energy", element.id));
    }
    if !element.dt.is_finite() || element.dt < 0.0 {
        return bad(format!("element {}: timestep must be >= 0, got {}", element.id, element.dt));
    }
    if element.photon_energy_density.len() > ctx.config().photon_bands.len() {
        return bad(format!(
            "element {}: {} photon fields for {} bands",
            element.id,
            element.photon_energy_density.len(),
            ctx.config().photon_bands.len()
        ));
    }
    Ok(())
}

/// Advance one element's specific energy over its timestep.
///
/// Pure in `ctx`, `element` and `seed`; the caller persists the outcome
/// (see [`CoolingOutcome::apply`]).
pub fn cool_element(
    ctx: &Context,
    element: &GasElement,
    seed: &IonizationSeed,
) -> SolverResult<CoolingOutcome> {
    check_element(ctx, element)?;

    let view = GasView::new(ctx, element, seed);
    let u_min = ctx.min_specific_energy();
    let u_old = element.specific_energy;
    let mut ne_guess = seed.ne_guess();

    let (u_new, iterations, floor_clamped) = if u_old < u_min {
        (u_min, 0, true)
    } else if element.dt == 0.0 {
        (u_old, 0, false)
    } else {
        let root = implicit_energy_solve(u_old, view.ratefact() * element.dt, ctx.limits(), |u| {
            let t = solve_temperature(ctx, &view, u, ne_guess)?;
            ne_guess = Some(t.ne).filter(|ne| *ne > 0.0).or(ne_guess);
            let (_, rate) = net_rate_at_temperature(ctx, &view, t.temperature, t.ne)?;
            Ok(rate.net)
        })
        .map_err(|e| {
            let e = e.with_element(element.id, element.density);
            if let SolverError::BracketNotFound(dump) | SolverError::EnergyNotConverged(dump) = &e {
                tracing::error!(%dump, "energy update failed");
            }
            e
        })?;

        if root.specific_energy < u_min {
            (u_min, root.iterations, true)
        } else {
            (root.specific_energy, root.iterations, false)
        }
    };

    let t = solve_temperature(ctx, &view, u_new, ne_guess)?;
    let (ion, rates) = net_rate_at_temperature(ctx, &view, t.temperature, t.ne)?;

    let du_dt = if floor_clamped || !ctx.config().operator_split {
        0.0
    } else {
        element.hydro_du_dt
    };
    let radiative_du_dt = if element.dt > 0.0 {
        (u_new - u_old) / element.dt
    } else {
        0.0
    };

    Ok(CoolingOutcome {
        specific_energy: u_new,
        du_dt,
        radiative_du_dt,
        temperature: t.temperature,
        mu: ion.mu,
        pressure: (ctx.config().gamma - 1.0) * element.density * u_new,
        ionization: ion.state,
        seed: IonizationSeed::new(ion.state),
        molecular_fraction: molecular_fraction(
            element.column_density,
            view.metallicity_ratio,
            ion.state.nh0,
        ),
        rates,
        iterations,
        temperature_iterations: t.iterations,
        floor_clamped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoolingConfig;
    use cf_core::ElementId;

    #[test]
    fn sinusoidal_rate_brackets_within_cap() {
        let limits = SolverLimits::default();
        let root = implicit_energy_solve(1.0, 1.0, &limits, |u| Ok(5.0 + 0.5 * u.sin())).unwrap();
        assert!((root.specific_energy - 5.7431).abs() / 5.7431 < 1e-3, "u = {}", root.specific_energy);
        assert!(root.bracket_iterations > 0 && root.bracket_iterations < limits.max_bracket_iter);
        let (lo, hi) = root.bracket;
        let f = |u: f64| u - 1.0 - (5.0 + 0.5 * u.sin());
        assert!(f(lo) <= 0.0 && f(hi) >= 0.0);
    }

    #[test]
    fn non_monotonic_residual_with_one_sign_change() {
        let lambda = |u: f64| 4.0 + 0.5 * (3.0 * u).sin();
        let f = |u: f64| u - 1.0 - lambda(u);
        // the residual falls between 1.9 and 2.3, inside the expansion range
        assert!(f(1.9) > f(2.3));
        assert!(f(2.3) < 0.0);

        let limits = SolverLimits::default();
        let root = implicit_energy_solve(1.0, 1.0, &limits, |u| Ok(lambda(u))).unwrap();
        let exact = 5.140_820_078;
        assert!((root.specific_energy - exact).abs() / exact < 1e-3, "u = {}", root.specific_energy);
        let (lo, hi) = root.bracket;
        assert!(lo <= exact && exact <= hi);
        assert!(f(lo) <= 0.0 && f(hi) >= 0.0);
        assert!(root.bracket_iterations > 1 && root.bracket_iterations < limits.max_bracket_iter);
    }

    #[test]
    fn linear_cooling_root() {
        let root = implicit_energy_solve(1.0, 0.5, &SolverLimits::default(), |u| Ok(-u)).unwrap();
        assert!((root.specific_energy - 2.0 / 3.0).abs() < 1e-3);
    }

    #[test]
    fn zero_residual_returns_u_old() {
        let root = implicit_energy_solve(3.0, 1.0, &SolverLimits::default(), |_| Ok(0.0)).unwrap();
        assert_eq!(root.specific_energy, 3.0);
        assert_eq!(root.iterations, 0);
    }

    #[test]
    fn runaway_heating_exhausts_bracket_cap() {
        let err = implicit_energy_solve(1.0, 1.0, &SolverLimits::default(), |_| Ok(1.0e30)).unwrap_err();
        match err {
            SolverError::BracketNotFound(dump) => {
                assert_eq!(dump.iterations, 150);
                assert_eq!(dump.specific_energy, Some(1.0));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn bisection_cap_is_fatal() {
        let limits = SolverLimits {
            max_iter: 3,
            ..SolverLimits::default()
        };
        let err = implicit_energy_solve(1.0, 0.5, &limits, |u| Ok(-u)).unwrap_err();
        assert!(matches!(err, SolverError::EnergyNotConverged(_)));
    }

    #[test]
    fn rate_errors_propagate() {
        let err = implicit_energy_solve(1.0, 1.0, &SolverLimits::default(), |_| {
            Err(SolverError::InvalidState { what: "boom".into() })
        })
        .unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn invalid_elements_rejected() {
        let ctx = Context::build(CoolingConfig::primordial()).unwrap();
        let seed = IonizationSeed::default();
        let mut el = GasElement::new(ElementId::new(1), 0.0, 1.0e12, 1.0);
        assert!(matches!(cool_element(&ctx, &el, &seed), Err(SolverError::InvalidState { .. })));
        el.density = 1.0e-24;
        el.dt = -1.0;
        assert!(cool_element(&ctx, &el, &seed).is_err());
        el.dt = 1.0;
        el.specific_energy = f64::NAN;
        assert!(cool_element(&ctx, &el, &seed).is_err());
    }

    #[test]
    fn zero_timestep_is_identity() {
        let ctx = Context::build(CoolingConfig::primordial()).unwrap();
        let u = ctx.energy_from_temperature(1.0e5, 1.0);
        let el = GasElement::new(ElementId::new(1), 1.0e-24, u, 0.0);
        let out = cool_element(&ctx, &el, &IonizationSeed::default()).unwrap();
        assert_eq!(out.specific_energy, u);
        assert_eq!(out.radiative_du_dt, 0.0);
        assert!(out.seed.state.is_some());
    }

    #[test]
    fn below_floor_returns_floor_exactly() {
        let ctx = Context::build(CoolingConfig::primordial()).unwrap();
        let mut el = GasElement::new(ElementId::new(1), 1.0e-24, 0.5 * ctx.min_specific_energy(), 1.0e13);
        el.hydro_du_dt = 42.0;
        let out = cool_element(&ctx, &el, &IonizationSeed::default()).unwrap();
        assert_eq!(out.specific_energy, ctx.min_specific_energy());
        assert_eq!(out.du_dt, 0.0);
        assert!(out.floor_clamped);
    }

    #[test]
    fn split_mode_keeps_hydro_rate() {
        let ctx = Context::build(CoolingConfig::primordial()).unwrap();
        let u = ctx.energy_from_temperature(1.0e6, 1.15);
        let mut el = GasElement::new(ElementId::new(1), 1.0e-26, u, 1.0e12);
        el.hydro_du_dt = 5.0;
        let mut seed = IonizationSeed::default();
        let out = cool_element(&ctx, &el, &seed).unwrap();
        assert_eq!(out.du_dt, 5.0);
        assert!(out.specific_energy < u);
        assert!((out.pressure - (2.0 / 3.0) * el.density * out.specific_energy).abs() < 1e-12 * out.pressure);

        out.apply(&mut el, &mut seed);
        assert_eq!(el.specific_energy, out.specific_energy);
        assert_eq!(seed, out.seed);
    }
}
