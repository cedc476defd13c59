//! Photoionization from explicitly transported photon fields.
//!
//! Each band carries an energy density `E` at mean photon energy `hν`; the
//! photon flux is `c E / hν` and every species picks up
//! `Γ = Σ flux σ` and `ε = Σ flux σ (hν - I)` with `I` its ionization
//! threshold.

use crate::config::PhotonBand;
use cf_core::constants::{C_LIGHT, ELECTRONVOLT};
use cf_tables::UvRates;

const THRESHOLD_H0_EV: f64 = 13.6;
const THRESHOLD_HE0_EV: f64 = 24.59;
const THRESHOLD_HEP_EV: f64 = 54.42;

/// Photoionization and heating rates per ion for the given band energies.
///
/// Bands beyond the shorter of the two slices are ignored.
pub fn band_rates(bands: &[PhotonBand], energy_density: &[f64]) -> UvRates {
    let mut out = UvRates::ZERO;
    for (band, &e) in bands.iter().zip(energy_density) {
        if !(e > 0.0) || !e.is_finite() {
            continue;
        }
        let h_nu = band.mean_energy_ev * ELECTRONVOLT;
        let flux = C_LIGHT * e / h_nu;
        let excess = |threshold_ev: f64| ((band.mean_energy_ev - threshold_ev) * ELECTRONVOLT).max(0.0);

        out.gamma_h0 += flux * band.sigma_h0;
        out.gamma_he0 += flux * band.sigma_he0;
        out.gamma_hep += flux * band.sigma_hep;
        out.eps_h0 += flux * band.sigma_h0 * excess(THRESHOLD_H0_EV);
        out.eps_he0 += flux * band.sigma_he0 * excess(THRESHOLD_HE0_EV);
        out.eps_hep += flux * band.sigma_hep * excess(THRESHOLD_HEP_EV);
    }
    out
}
