//! Radiative cooling and ionization-equilibrium solver.
//!
//! This crate advances the specific internal energy of one gas element over a
//! timestep. Three nested solvers do the work:
//!
//! - [`energy`]: implicit (backward-Euler) bisection over specific energy
//! - [`temperature`]: fixed point coupling energy, temperature and ionization
//! - [`ionization`]: H/He ionization balance and electron density at fixed T
//!
//! [`rates`] assembles the net heating-minus-cooling rate the outer solver
//! integrates. All tables live in an immutable [`Context`] built once up
//! front; every solve is a pure function of the context plus one element.

pub mod config;
pub mod context;
pub mod energy;
pub mod error;
pub mod ionization;
pub mod jitter;
pub mod molecular;
pub mod opacity;
pub mod radiation;
pub mod rates;
pub mod state;
pub mod temperature;

pub use config::{CoolingConfig, CoolingTerms, MetalConfig, PhotonBand, SolverLimits, UvBackgroundConfig};
pub use context::Context;
pub use energy::{cool_element, implicit_energy_solve, CoolingOutcome, EnergyRoot};
pub use error::{ConvergenceDump, SolverError, SolverResult};
pub use ionization::{solve_ionization, IonizationSolution, RateMode};
pub use rates::{net_rate_at_temperature, Channel, NetRate};
pub use state::{GasElement, GasView, IonizationSeed, IonizationState, Metallicity};
pub use temperature::{solve_temperature, TemperatureSolution};
