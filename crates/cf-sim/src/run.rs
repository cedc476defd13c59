//! Fixed-step box runs.

use crate::cosmology::Cosmology;
use crate::driver::{cool_elements, ElementSample, PhaseStats};
use crate::error::{SimError, SimResult};
use cf_core::units::{myr, seconds};
use cf_solver::{Context, GasElement, IonizationSeed};
use serde::{Deserialize, Serialize};

/// Options for box runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimOptions {
    /// Fixed time step (seconds)
    pub dt: f64,
    /// Final time (seconds)
    pub t_end: f64,
    /// Maximum number of steps (safety limit)
    pub max_steps: usize,
    /// Record every N-th step (decimation)
    pub record_every: usize,
    /// Used to advance the redshift when the context is comoving
    pub cosmology: Cosmology,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            dt: seconds(myr(1.0)),
            t_end: seconds(myr(100.0)),
            max_steps: 100_000,
            record_every: 10,
            cosmology: Cosmology::default(),
        }
    }
}

impl SimOptions {
    pub fn validate(&self) -> SimResult<()> {
        let bad = |what: &str| {
            Err(SimError::InvalidArg {
                what: what.to_string(),
            })
        };
        if !(self.dt > 0.0) || !self.dt.is_finite() {
            return bad("dt must be positive");
        }
        if !(self.t_end >= 0.0) || !self.t_end.is_finite() {
            return bad("t_end must be non-negative");
        }
        if self.max_steps == 0 {
            return bad("max_steps must be positive");
        }
        if self.record_every == 0 {
            return bad("record_every must be positive");
        }
        self.cosmology.validate()
    }
}

/// Decimated history of a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimRecord {
    /// Time since the start of the run (seconds)
    pub t: Vec<f64>,
    pub redshift: Vec<f64>,
    pub stats: Vec<PhaseStats>,
    pub samples: Vec<Vec<ElementSample>>,
    /// Metal snapshot reloads over the run
    pub table_reloads: usize,
}

impl SimRecord {
    fn push(&mut self, t: f64, redshift: f64, stats: PhaseStats, samples: Vec<ElementSample>) {
        self.t.push(t);
        self.redshift.push(redshift);
        self.stats.push(stats);
        self.samples.push(samples);
    }
}

/// Cool a box of elements with a shared fixed timestep.
///
/// The first record is an equilibrium evaluation at `t = 0`. In comoving
/// runs the redshift is advanced between phases, never during one. Any
/// element failure aborts the run.
pub fn run_box(
    ctx: &mut Context,
    elements: &mut [GasElement],
    seeds: &mut [IonizationSeed],
    opts: &SimOptions,
) -> SimResult<SimRecord> {
    opts.validate()?;
    let comoving = ctx.config().comoving;
    let start_age = opts.cosmology.age_at(ctx.redshift());

    for el in elements.iter_mut() {
        el.dt = 0.0;
    }
    let initial = cool_elements(ctx, elements, seeds)?;
    let mut record = SimRecord::default();
    record.push(0.0, ctx.redshift(), initial.stats, initial.samples);

    for el in elements.iter_mut() {
        el.dt = opts.dt;
    }

    let mut t = 0.0;
    let mut step = 0;
    let mut last = None;
    while t < opts.t_end && step < opts.max_steps {
        let report = cool_elements(ctx, elements, seeds)?;
        t += opts.dt;
        step += 1;

        if comoving {
            let z = opts.cosmology.redshift_at(start_age + t).max(0.0);
            if ctx.set_redshift(z)? {
                record.table_reloads += 1;
            }
        }

        if step % opts.record_every == 0 {
            tracing::info!(
                step,
                t,
                redshift = ctx.redshift(),
                cooled = report.stats.cooled,
                heated = report.stats.heated,
                "box step"
            );
            record.push(t, ctx.redshift(), report.stats, report.samples);
        } else {
            last = Some(report);
        }
    }

    // Always record the final state
    if step % opts.record_every != 0 {
        if let Some(report) = last {
            record.push(t, ctx.redshift(), report.stats, report.samples);
        }
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_defaults() {
        let opts = SimOptions::default();
        assert_eq!(opts.max_steps, 100_000);
        assert_eq!(opts.record_every, 10);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn invalid_options_rejected() {
        for opts in [
            SimOptions { dt: 0.0, ..SimOptions::default() },
            SimOptions { t_end: -1.0, ..SimOptions::default() },
            SimOptions { max_steps: 0, ..SimOptions::default() },
            SimOptions { record_every: 0, ..SimOptions::default() },
        ] {
            assert!(matches!(opts.validate(), Err(SimError::InvalidArg { .. })));
        }
    }
}
