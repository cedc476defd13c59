//! Per-element gas state as seen by the solver.

use crate::context::Context;
use crate::radiation;
use cf_core::constants::PROTON_MASS;
use cf_core::ElementId;
use cf_tables::UvRates;
use serde::{Deserialize, Serialize};

/// Metal content of an element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metallicity {
    /// Total metal mass fraction
    pub total: f64,
    /// Per-species mass fractions in metal-table order; empty means solar
    /// pattern scaled by `total`
    pub species: Vec<f64>,
}

impl Metallicity {
    pub fn primordial() -> Self {
        Self::default()
    }

    /// Solar-pattern metals at the given total mass fraction.
    pub fn scaled(total: f64) -> Self {
        Self {
            total,
            species: Vec::new(),
        }
    }
}

/// One gas resolution element, owned by the caller.
///
/// The solver reads it by reference; results come back in
/// [`crate::CoolingOutcome`] for the caller to persist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasElement {
    pub id: ElementId,
    /// Proper mass density [g/cm^3]
    pub density: f64,
    /// Specific internal energy [erg/g]
    pub specific_energy: f64,
    /// Timestep [s]
    pub dt: f64,
    /// Hydrodynamic rate of change of specific energy [erg/g/s]
    #[serde(default)]
    pub hydro_du_dt: f64,
    #[serde(default)]
    pub metallicity: Metallicity,
    /// Energy density per photon band [erg/cm^3]
    #[serde(default)]
    pub photon_energy_density: Vec<f64>,
    /// Gas column density [g/cm^2]
    #[serde(default)]
    pub column_density: Option<f64>,
    /// Local cosmic-ray energy density [eV/cm^3]
    #[serde(default)]
    pub cosmic_ray_energy_density: Option<f64>,
    /// Energy density of hot-source radiation [erg/cm^3]
    #[serde(default)]
    pub hot_source_energy_density: Option<f64>,
    /// Inside a photoionized region
    #[serde(default)]
    pub ionized_region: bool,
}

impl GasElement {
    pub fn new(id: ElementId, density: f64, specific_energy: f64, dt: f64) -> Self {
        Self {
            id,
            density,
            specific_energy,
            dt,
            hydro_du_dt: 0.0,
            metallicity: Metallicity::primordial(),
            photon_energy_density: Vec::new(),
            column_density: None,
            cosmic_ray_energy_density: None,
            hot_source_energy_density: None,
            ionized_region: false,
        }
    }
}

/// Ionization fractions per hydrogen nucleus.
///
/// Hydrogen fractions sum to one, helium fractions to `y = nHe/nH`, and
/// `ne = nhp + nhep + 2 nhepp`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IonizationState {
    pub nh0: f64,
    pub nhp: f64,
    pub nhe0: f64,
    pub nhep: f64,
    pub nhepp: f64,
    pub ne: f64,
}

impl IonizationState {
    pub fn neutral(y_helium: f64) -> Self {
        Self {
            nh0: 1.0,
            nhp: 0.0,
            nhe0: y_helium,
            nhep: 0.0,
            nhepp: 0.0,
            ne: 0.0,
        }
    }

    pub fn fully_ionized(y_helium: f64) -> Self {
        Self {
            nh0: 0.0,
            nhp: 1.0,
            nhe0: 0.0,
            nhep: 0.0,
            nhepp: y_helium,
            ne: 1.0 + 2.0 * y_helium,
        }
    }

    /// Electron abundance implied by the ion fractions.
    pub fn electrons(&self) -> f64 {
        self.nhp + self.nhep + 2.0 * self.nhepp
    }

    /// Mean molecular weight in proton masses.
    pub fn mu(&self, y_helium: f64) -> f64 {
        mean_molecular_weight(y_helium, self.ne)
    }

    /// `(prev + r * self) / (1 + r)`, species by species.
    pub fn relax_from(&self, prev: &IonizationState, r: f64) -> Self {
        let mix = |p: f64, e: f64| (p + r * e) / (1.0 + r);
        let mut out = Self {
            nh0: mix(prev.nh0, self.nh0),
            nhp: 0.0,
            nhe0: mix(prev.nhe0, self.nhe0),
            nhep: mix(prev.nhep, self.nhep),
            nhepp: mix(prev.nhepp, self.nhepp),
            ne: 0.0,
        };
        out.nhp = 1.0 - out.nh0;
        out.ne = out.electrons();
        out
    }
}

pub(crate) fn mean_molecular_weight(y_helium: f64, ne: f64) -> f64 {
    (1.0 + 4.0 * y_helium) / (1.0 + y_helium + ne)
}

/// Warm-start state carried between calls for one element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IonizationSeed {
    pub state: Option<IonizationState>,
}

impl IonizationSeed {
    pub fn new(state: IonizationState) -> Self {
        Self { state: Some(state) }
    }

    /// Usable electron guess, if any.
    pub fn ne_guess(&self) -> Option<f64> {
        self.state
            .map(|s| s.ne)
            .filter(|ne| ne.is_finite() && *ne > 0.0)
    }
}

/// Quantities derived once per element and shared by every nested solve.
#[derive(Debug, Clone)]
pub struct GasView<'a> {
    pub element: &'a GasElement,
    /// Hydrogen number density [cm^-3]
    pub n_h: f64,
    pub log_n_h: f64,
    /// Metallicity relative to solar
    pub metallicity_ratio: f64,
    /// Photoionization and heating rates from the explicit photon field
    pub radiation: UvRates,
    /// Fractions persisted from the previous call
    pub previous: Option<IonizationState>,
}

impl<'a> GasView<'a> {
    pub fn new(ctx: &Context, element: &'a GasElement, seed: &IonizationSeed) -> Self {
        let n_h = ctx.config().hydrogen_mass_fraction * element.density / PROTON_MASS;
        let radiation = if ctx.config().terms.explicit_radiation {
            radiation::band_rates(&ctx.config().photon_bands, &element.photon_energy_density)
        } else {
            UvRates::ZERO
        };
        Self {
            element,
            n_h,
            log_n_h: n_h.log10(),
            metallicity_ratio: element.metallicity.total / ctx.config().solar_metallicity,
            radiation,
            previous: seed.state,
        }
    }

    /// Background rates after self-shielding plus the explicit field.
    pub fn photo_rates(&self, ctx: &Context, log_t: f64) -> (UvRates, f64) {
        let background = ctx.uv_rates();
        if background.is_zero() {
            return (self.radiation, 1.0);
        }
        let shield = cf_tables::shield_factor(self.n_h, log_t, background.gamma_12());
        (background.scaled(shield).plus(&self.radiation), shield)
    }

    /// `nH^2 / rho`, converting a per-nH^2 rate to erg/g/s.
    pub fn ratefact(&self) -> f64 {
        self.n_h * self.n_h / self.element.density
    }
}
