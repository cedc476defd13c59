//! Molecular hydrogen fraction (Krumholz & Gnedin 2011).
//!
//! Diagnostic only: the fraction is reported per element but does not feed
//! back into the rates.

use cf_core::constants::MSUN_PER_PC2;

/// Molecular mass fraction of hydrogen.
///
/// Zero without a column density or for metal-free gas. The fit gives the
/// molecular share of the neutral gas, so it is scaled by `nh0`.
pub fn molecular_fraction(column_density: Option<f64>, metallicity_ratio: f64, nh0: f64) -> f64 {
    let Some(column) = column_density.filter(|c| *c > 0.0) else {
        return 0.0;
    };
    if !(metallicity_ratio > 0.0) {
        return 0.0;
    }
    let tau_c = 0.066 * (column / MSUN_PER_PC2) * metallicity_ratio;
    let chi = 3.1 * (1.0 + 3.1 * metallicity_ratio.powf(0.365)) / 4.1;
    let s = (1.0 + 0.6 * chi + 0.01 * chi * chi).ln() / (0.6 * tau_c);
    let f = if s < 2.0 { 1.0 - 0.75 * s / (1.0 + 0.25 * s) } else { 0.0 };
    (f * nh0).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn needs_column_and_metals() {
        assert_eq!(molecular_fraction(None, 1.0, 1.0), 0.0);
        assert_eq!(molecular_fraction(Some(0.1), 0.0, 1.0), 0.0);
    }

    #[test]
    fn thick_solar_column_is_molecular() {
        // 1000 Msun/pc^2
        let f = molecular_fraction(Some(1000.0 * MSUN_PER_PC2), 1.0, 1.0);
        assert!(f > 0.95, "f = {f}");
        let ionized = molecular_fraction(Some(1000.0 * MSUN_PER_PC2), 1.0, 0.1);
        assert!(ionized < 0.11);
    }

    #[test]
    fn thin_column_is_atomic() {
        assert_eq!(molecular_fraction(Some(1.0 * MSUN_PER_PC2), 1.0, 1.0), 0.0);
    }

    #[test]
    fn increases_with_column() {
        let lo = molecular_fraction(Some(20.0 * MSUN_PER_PC2), 1.0, 1.0);
        let hi = molecular_fraction(Some(50.0 * MSUN_PER_PC2), 1.0, 1.0);
        assert!(hi > lo);
    }
}
