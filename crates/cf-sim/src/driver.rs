//! Data-parallel cooling phase.
//!
//! Every element is solved independently against the shared read-only
//! [`Context`]. A phase is all-or-nothing: outcomes are computed first and
//! written back only when every element succeeded.

use crate::error::{SimError, SimResult};
use cf_core::ElementId;
use cf_solver::{cool_element, Context, CoolingOutcome, GasElement, IonizationSeed};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Aggregate counters for one phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseStats {
    pub elements: usize,
    pub cooled: usize,
    pub heated: usize,
    pub floor_clamped: usize,
    /// Largest bisection count over the phase
    pub max_iterations: usize,
    pub max_temperature_iterations: usize,
}

impl PhaseStats {
    fn record(&mut self, u_old: f64, out: &CoolingOutcome) {
        self.elements += 1;
        if out.specific_energy < u_old {
            self.cooled += 1;
        } else if out.specific_energy > u_old {
            self.heated += 1;
        }
        if out.floor_clamped {
            self.floor_clamped += 1;
        }
        self.max_iterations = self.max_iterations.max(out.iterations);
        self.max_temperature_iterations =
            self.max_temperature_iterations.max(out.temperature_iterations);
    }
}

/// Per-element diagnostics after a phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElementSample {
    pub id: ElementId,
    pub specific_energy: f64,
    pub temperature: f64,
    pub mu: f64,
    pub pressure: f64,
    pub electron_fraction: f64,
    pub molecular_fraction: f64,
    /// Heating and cooling per nH^2 [erg cm^3 s^-1]
    pub heating: f64,
    pub cooling: f64,
}

impl ElementSample {
    fn from_outcome(id: ElementId, out: &CoolingOutcome) -> Self {
        Self {
            id,
            specific_energy: out.specific_energy,
            temperature: out.temperature,
            mu: out.mu,
            pressure: out.pressure,
            electron_fraction: out.electron_fraction(),
            molecular_fraction: out.molecular_fraction,
            heating: out.rates.heating,
            cooling: out.rates.cooling,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PhaseReport {
    pub stats: PhaseStats,
    /// In element order
    pub samples: Vec<ElementSample>,
}

/// Cool every element over its own timestep and write the results back.
///
/// `elements` and `seeds` are parallel arrays. On failure nothing is written
/// and the error names the lowest failing index.
pub fn cool_elements(
    ctx: &Context,
    elements: &mut [GasElement],
    seeds: &mut [IonizationSeed],
) -> SimResult<PhaseReport> {
    if elements.len() != seeds.len() {
        return Err(SimError::InvalidArg {
            what: format!(
                "{} elements but {} ionization seeds",
                elements.len(),
                seeds.len()
            ),
        });
    }

    let results: Vec<_> = elements
        .par_iter()
        .zip(seeds.par_iter())
        .map(|(el, seed)| cool_element(ctx, el, seed))
        .collect();

    let mut outcomes = Vec::with_capacity(results.len());
    for (index, result) in results.into_iter().enumerate() {
        match result {
            Ok(out) => outcomes.push(out),
            Err(source) => {
                let id = elements[index].id;
                tracing::error!(index, %id, error = %source, "cooling phase aborted");
                return Err(SimError::Element { index, id, source });
            }
        }
    }

    let mut report = PhaseReport {
        stats: PhaseStats::default(),
        samples: Vec::with_capacity(outcomes.len()),
    };
    for (el, out) in elements.iter().zip(&outcomes) {
        report.stats.record(el.specific_energy, out);
        report.samples.push(ElementSample::from_outcome(el.id, out));
    }

    elements
        .par_iter_mut()
        .zip(seeds.par_iter_mut())
        .zip(outcomes.par_iter())
        .for_each(|((el, seed), out)| out.apply(el, seed));

    Ok(report)
}
