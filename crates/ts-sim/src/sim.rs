//! Fixed-step driver with stability cutback.

use tracing::{info, warn};

use crate::error::{SimError, SimResult};
use crate::plant::Plant;
use ts_core::numeric::Real;

/// Step control for [`run_sim`].
#[derive(Clone, Debug)]
pub struct SimOptions {
    /// Nominal time step (seconds)
    pub dt: f64,
    /// End of the run [s]
    pub t_end: f64,
    /// Maximum number of accepted steps (safety limit)
    pub max_steps: usize,
    /// Keep every N-th accepted step
    pub record_every: usize,
    /// Smallest step a retry may propose (seconds)
    pub min_dt: f64,
    /// Retries per step before giving up
    pub max_retries: usize,
    /// Growth back toward `dt` after an accepted step
    pub grow_factor: f64,
    /// With checking off, breaches are only counted by the parts.
    pub check_stability: bool,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            dt: 1.0,
            t_end: 3600.0,
            max_steps: 1_000_000,
            record_every: 60,
            min_dt: 1e-6,
            max_retries: 8,
            grow_factor: 2.0,
            check_stability: true,
        }
    }
}

impl SimOptions {
    fn validate(&self) -> SimResult<()> {
        if !(self.dt > 0.0 && self.dt.is_finite()) {
            return Err(SimError::InvalidArg {
                what: "dt must be positive and finite",
            });
        }
        if self.t_end < 0.0 {
            return Err(SimError::InvalidArg {
                what: "t_end must be non-negative",
            });
        }
        if self.max_steps == 0 {
            return Err(SimError::InvalidArg {
                what: "max_steps must be positive",
            });
        }
        if self.record_every == 0 {
            return Err(SimError::InvalidArg {
                what: "record_every must be positive",
            });
        }
        if !(self.min_dt > 0.0 && self.min_dt <= self.dt) {
            return Err(SimError::InvalidArg {
                what: "min_dt must be positive and not above dt",
            });
        }
        if self.grow_factor < 1.0 {
            return Err(SimError::InvalidArg {
                what: "grow_factor must be at least 1",
            });
        }
        Ok(())
    }
}

/// Sampled temperature history of a run.
#[derive(Clone, Debug, Default)]
pub struct SimRecord {
    /// Time points (seconds)
    pub t: Vec<f64>,
    /// Temperature fields of all thermal parts at each time point.
    pub temperatures: Vec<Vec<Vec<Real>>>,
    /// Rejected attempts over the whole run.
    pub retries: usize,
}

impl SimRecord {
    fn push(&mut self, t: f64, plant: &Plant) {
        self.t.push(t);
        self.temperatures.push(plant.snapshot());
    }
}

/// Run `plant` from t = 0 to `opts.t_end` with explicit Euler steps.
///
/// Every step evaluates the network flows once, then attempts the step on
/// all thermal parts. An unstable verdict retries the whole pass with the
/// smallest proposed step; nothing is committed until all parts accept.
pub fn run_sim(plant: &mut Plant, opts: &SimOptions) -> SimResult<SimRecord> {
    opts.validate()?;
    plant.set_stability_checking(opts.check_stability);

    let mut t = 0.0;
    let mut dt = opts.dt;
    let mut record = SimRecord::default();
    record.push(t, plant);

    let mut step = 0;
    while t < opts.t_end && step < opts.max_steps {
        plant.update_ambient(t);
        plant.propagate_flows();
        plant.propagate_temperatures()?;

        let mut dt_try = dt.min(opts.t_end - t);
        let mut retries = 0;
        let attempt = loop {
            let attempt = plant.attempt(dt_try)?;
            if attempt.verdict.stable {
                break attempt;
            }
            if retries == opts.max_retries {
                warn!(t, dt = dt_try, retries, "giving up on unstable step");
                return Err(SimError::RetriesExhausted { t, retries });
            }
            let proposed = attempt.verdict.proposed_dt.unwrap_or(0.5 * dt_try);
            if proposed < opts.min_dt {
                warn!(t, dt = proposed, min_dt = opts.min_dt, "step size below minimum");
                return Err(SimError::StepTooSmall {
                    t,
                    dt: proposed,
                    min_dt: opts.min_dt,
                });
            }
            info!(t, dt = dt_try, proposed, "unstable step, retrying");
            dt_try = proposed;
            retries += 1;
        };
        record.retries += retries;

        plant.commit(dt_try, &attempt);
        t += dt_try;
        step += 1;
        dt = (dt_try * opts.grow_factor).min(opts.dt);

        if step % opts.record_every == 0 {
            record.push(t, plant);
        }
    }

    // The final state is always kept.
    if step % opts.record_every != 0 {
        record.push(t, plant);
    }
    Ok(record)
}
