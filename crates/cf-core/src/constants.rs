//! Physical constants in CGS units.

pub const PROTON_MASS: f64 = 1.672_621_78e-24;
pub const ELECTRON_MASS: f64 = 9.109_383_7e-28;
pub const BOLTZMANN: f64 = 1.380_648_8e-16;
pub const C_LIGHT: f64 = 2.997_924_58e10;
pub const STEFAN_BOLTZMANN: f64 = 5.670_373e-5;
/// Radiation constant `a = 4σ/c`.
pub const RADIATION_CONSTANT: f64 = 7.565_723e-15;
pub const THOMSON_CROSS_SECTION: f64 = 6.652_458_73e-25;
pub const ELECTRONVOLT: f64 = 1.602_176_57e-12;

/// CMB temperature today [K]
pub const T_CMB0: f64 = 2.725;

/// Compton coupling `4 σ_T k_B / (m_e c)`; multiply by `U_rad n_e (T - T_rad)`.
pub const COMPTON_COEFF: f64 =
    4.0 * THOMSON_CROSS_SECTION * BOLTZMANN / (ELECTRON_MASS * C_LIGHT);

/// 1 M_sun/pc^2 in g/cm^2
pub const MSUN_PER_PC2: f64 = 2.089_5e-4;

/// Temperature at which a photoionized region settles [K]
pub const T_HII_REGION: f64 = 1.0e4;
