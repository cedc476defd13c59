//! Temperature from specific energy.
//!
//! `T = (γ-1)/k_B · u · m_p · μ` with `μ` depending on the electron abundance,
//! which in turn depends on `T` through the ionization balance. The fixed point
//! is damped by the largest `dT/dne` sensitivity seen so far, and 2-cycles are
//! broken with a deterministic convex blend.

use crate::context::Context;
use crate::error::{ConvergenceDump, SolverError, SolverResult};
use crate::ionization::{default_ne_guess, solve_ionization, RateMode};
use crate::jitter;
use crate::state::{mean_molecular_weight, GasView, IonizationState};

/// Relative change accepted once the temperature exceeds `above`.
struct ToleranceTier {
    above: f64,
    rel: f64,
    /// Only while fewer than 100 iterations have elapsed
    early_only: bool,
}

const TOLERANCE_TIERS: [ToleranceTier; 5] = [
    ToleranceTier { above: 0.0, rel: 0.25, early_only: false },
    ToleranceTier { above: 20.0, rel: 0.10, early_only: false },
    ToleranceTier { above: 200.0, rel: 0.05, early_only: false },
    ToleranceTier { above: 2000.0, rel: 0.01, early_only: false },
    ToleranceTier { above: 2.0e4, rel: 1.0e-3, early_only: true },
];

const EARLY_ITERATIONS: usize = 100;

/// Relative 2-cycle detection threshold.
const CYCLE_TOL: f64 = 1.0e-3;

fn tolerance(temperature: f64, iter: usize) -> f64 {
    TOLERANCE_TIERS
        .iter()
        .filter(|tier| temperature > tier.above && (!tier.early_only || iter < EARLY_ITERATIONS))
        .map(|tier| tier.rel)
        .last()
        .unwrap_or(TOLERANCE_TIERS[0].rel)
}

/// Self-consistent temperature and ionization state for one energy.
#[derive(Debug, Clone)]
pub struct TemperatureSolution {
    pub temperature: f64,
    pub ne: f64,
    pub mu: f64,
    pub state: IonizationState,
    pub iterations: usize,
}

/// Solve for the temperature of gas with specific energy `specific_energy`.
///
/// `ne_guess` seeds the electron abundance; without one a regime-based
/// default is used.
pub fn solve_temperature(
    ctx: &Context,
    view: &GasView<'_>,
    specific_energy: f64,
    ne_guess: Option<f64>,
) -> SolverResult<TemperatureSolution> {
    if !specific_energy.is_finite() || specific_energy < 0.0 {
        return Err(SolverError::InvalidState {
            what: format!("specific energy must be finite and >= 0, got {specific_energy}"),
        });
    }

    let floor = ctx.t_floor();
    let limits = ctx.limits();
    let ne_start = match ne_guess.filter(|ne| ne.is_finite() && *ne > 0.0) {
        Some(ne) => ne,
        None => {
            let photo_on = !ctx.uv_rates().is_zero() || !view.radiation.is_zero();
            let t_neutral = ctx.temperature_from_energy(specific_energy, 0.0).max(floor);
            default_ne_guess(ctx, t_neutral.log10(), photo_on)
        }
    };

    let mut ne = ne_start;
    let mut t = ctx.temperature_from_energy(specific_energy, ne).max(floor);
    let mut t_old_old = 0.0;
    let mut max_sensitivity: f64 = 0.0;

    for iter in 1..=limits.max_iter {
        let ne_old = ne;
        let sol = solve_ionization(ctx, view, t.log10(), ne, RateMode::FractionsOnly)?;
        ne = sol.state.ne;

        let t_old = t;
        let t_new = ctx.temperature_from_energy(specific_energy, ne);
        let sensitivity = t_new / (1.0 + ne) * ((ne - ne_old) / (t_new - t_old + 1.0)).abs();
        if sensitivity.is_finite() {
            max_sensitivity = max_sensitivity.max(sensitivity);
        }
        t = t_old + (t_new - t_old) / (1.0 + max_sensitivity);

        if (t - t_old_old).abs() / (t + t_old_old) < CYCLE_TOL {
            let w = jitter::blend_weight(view.element.id, iter);
            t = w * t_old + (1.0 - w) * t_new;
        }
        t = t.max(floor);
        t_old_old = t_old;

        if (t - t_old).abs() <= tolerance(t, iter) * t {
            return Ok(TemperatureSolution {
                temperature: t,
                ne,
                mu: mean_molecular_weight(ctx.y_helium(), ne),
                state: sol.state,
                iterations: iter,
            });
        }
        if limits.near_cap(iter) {
            tracing::warn!(
                element = %view.element.id,
                iter,
                temperature = t,
                ne,
                "temperature iteration approaching cap"
            );
        }
    }

    let dump = ConvergenceDump {
        element: Some(view.element.id),
        density: Some(view.element.density),
        specific_energy: Some(specific_energy),
        temperature: Some(t),
        ne_guess: Some(ne_start),
        iterations: limits.max_iter,
        bracket: None,
    };
    tracing::error!(%dump, "temperature iteration did not converge");
    Err(SolverError::TemperatureNotConverged(Box::new(dump)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoolingConfig;
    use crate::state::{GasElement, IonizationSeed};
    use cf_core::ElementId;
    use proptest::prelude::*;

    fn primordial() -> Context {
        Context::build(CoolingConfig::primordial()).unwrap()
    }

    #[test]
    fn tiers_tighten_with_temperature() {
        assert_eq!(tolerance(15.0, 0), 0.25);
        assert_eq!(tolerance(100.0, 0), 0.10);
        assert_eq!(tolerance(1000.0, 0), 0.05);
        assert_eq!(tolerance(1.0e4, 0), 0.01);
        assert_eq!(tolerance(1.0e6, 5), 1.0e-3);
        assert_eq!(tolerance(1.0e6, 100), 0.01);
    }

    #[test]
    fn hot_gas_is_ionized_and_consistent() {
        let ctx = primordial();
        let el = GasElement::new(ElementId::new(3), 1.0e-26, 0.0, 0.0);
        let view = GasView::new(&ctx, &el, &IonizationSeed::default());
        let u = ctx.energy_from_temperature(1.0e7, 1.0 + 2.0 * ctx.y_helium());
        let sol = solve_temperature(&ctx, &view, u, None).unwrap();
        assert!((sol.temperature - 1.0e7).abs() / 1.0e7 < 0.01, "T = {}", sol.temperature);
        assert!(sol.state.nhp > 0.999);
    }

    #[test]
    fn cold_gas_is_neutral() {
        let ctx = primordial();
        let el = GasElement::new(ElementId::new(3), 1.0e-24, 0.0, 0.0);
        let view = GasView::new(&ctx, &el, &IonizationSeed::default());
        let u = ctx.energy_from_temperature(500.0, 0.0);
        let sol = solve_temperature(&ctx, &view, u, Some(0.3)).unwrap();
        assert!((sol.temperature - 500.0).abs() / 500.0 < 0.06, "T = {}", sol.temperature);
        assert!(sol.ne < 1.0e-3);
    }

    #[test]
    fn temperature_never_below_floor() {
        let ctx = primordial();
        let el = GasElement::new(ElementId::new(3), 1.0e-24, 0.0, 0.0);
        let view = GasView::new(&ctx, &el, &IonizationSeed::default());
        let sol = solve_temperature(&ctx, &view, 1.0, None).unwrap();
        assert_eq!(sol.temperature, ctx.t_floor());
    }

    #[test]
    fn negative_energy_rejected() {
        let ctx = primordial();
        let el = GasElement::new(ElementId::new(3), 1.0e-24, 0.0, 0.0);
        let view = GasView::new(&ctx, &el, &IonizationSeed::default());
        assert!(matches!(
            solve_temperature(&ctx, &view, -1.0, None),
            Err(SolverError::InvalidState { .. })
        ));
    }

    proptest! {
        #[test]
        fn converges_across_range(
            log_t in 1.5_f64..8.5,
            log_rho in -30.0_f64..-20.0,
            id in 0_u64..1000,
        ) {
            let ctx = primordial();
            let el = GasElement::new(ElementId::new(id), 10f64.powf(log_rho), 0.0, 0.0);
            let view = GasView::new(&ctx, &el, &IonizationSeed::default());
            let u = ctx.energy_from_temperature(10f64.powf(log_t), 0.5);
            let sol = solve_temperature(&ctx, &view, u, None).unwrap();
            prop_assert!(sol.temperature >= ctx.t_floor());
            prop_assert!(sol.mu > 0.5 && sol.mu < 1.3);
        }
    }
}
