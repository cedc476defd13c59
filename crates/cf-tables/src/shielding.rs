//! Self-shielding of the UV background.
//!
//! Rahmati et al. (2013) fit: the photoionization rate seen by gas at hydrogen
//! density `nH` is the optically-thin rate times
//!
//! ```text
//! f(q) = 0.98 (1 + q^1.64)^-2.28 + 0.02 (1 + q)^-0.84,   q = nH / n_ss
//! ```
//!
//! where the self-shielding density `n_ss` rises with temperature and with the
//! strength of the background.

/// Self-shielding density at 10^4 K and Γ_12 = 1 [cm^-3]
const N_SS_REFERENCE: f64 = 0.0123;

/// Attenuation factor in [0, 1] applied to every UV-background term.
///
/// # Arguments
/// * `n_h` - hydrogen number density [cm^-3]
/// * `log_t` - log10 temperature [K]
/// * `gamma_12` - H0 photoionization rate in units of 1e-12 s^-1
pub fn shield_factor(n_h: f64, log_t: f64, gamma_12: f64) -> f64 {
    if n_h.is_nan() || n_h <= 0.0 {
        return 1.0;
    }
    let mut n_ss = N_SS_REFERENCE * 10f64.powf(0.173 * (log_t - 4.0));
    if gamma_12 > 0.0 {
        n_ss *= gamma_12.powf(0.66);
    }
    let q = n_h / n_ss;
    let f = 0.98 * (1.0 + q.powf(1.64)).powf(-2.28) + 0.02 * (1.0 + q).powf(-0.84);
    if f.is_finite() {
        f.clamp(0.0, 1.0)
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn unshielded_at_low_density() {
        let f = shield_factor(1.0e-6, 4.0, 1.0);
        assert!(f > 0.999, "f = {f}");
    }

    #[test]
    fn strongly_shielded_at_high_density() {
        let f = shield_factor(100.0, 4.0, 1.0);
        assert!(f < 0.05, "f = {f}");
    }

    #[test]
    fn hotter_gas_shields_less() {
        let cold = shield_factor(0.05, 3.0, 1.0);
        let warm = shield_factor(0.05, 4.5, 1.0);
        assert!(warm > cold);
    }

    #[test]
    fn zero_density_is_unshielded() {
        assert_eq!(shield_factor(0.0, 4.0, 1.0), 1.0);
        assert_eq!(shield_factor(f64::NAN, 4.0, 1.0), 1.0);
    }

    proptest! {
        #[test]
        fn bounded_and_monotone_in_density(
            log_n in -8.0_f64..4.0,
            log_t in 1.0_f64..9.0,
            gamma_12 in 0.0_f64..10.0,
        ) {
            let n = 10f64.powf(log_n);
            let f1 = shield_factor(n, log_t, gamma_12);
            let f2 = shield_factor(2.0 * n, log_t, gamma_12);
            prop_assert!((0.0..=1.0).contains(&f1));
            prop_assert!(f2 <= f1 + 1e-12);
        }
    }
}
