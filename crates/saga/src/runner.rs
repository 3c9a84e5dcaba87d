//! Generic saga runner.
//!
//! A saga is an ordered list of [`SagaStep`] values. Each step's forward
//! action either fails (with a reason) or succeeds, optionally yielding the
//! [`Compensation`] that undoes it. The runner executes steps in order,
//! pushing compensations onto a stack; on the first failure it unwinds the
//! stack in reverse, attempting every compensation even when earlier ones
//! fail.

use std::future::Future;
use std::pin::Pin;

use crate::error::{CompensationFailure, SagaError, StepFailure};

type BoxFut<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// The undo half of a completed step.
pub struct Compensation {
    step: &'static str,
    undo: Box<dyn FnOnce() -> BoxFut<Result<(), String>> + Send>,
}

impl Compensation {
    /// Creates a compensation for the named step.
    pub fn new<F, Fut>(step: &'static str, undo: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), String>> + Send + 'static,
    {
        Self {
            step,
            undo: Box::new(move || Box::pin(undo())),
        }
    }

    /// The step this compensation belongs to.
    pub fn step(&self) -> &'static str {
        self.step
    }
}

/// One forward action in a saga.
///
/// A successful forward action returns `Ok(Some(compensation))`, or
/// `Ok(None)` for terminal steps that need no undo.
pub struct SagaStep {
    name: &'static str,
    forward: Box<dyn FnOnce() -> BoxFut<Result<Option<Compensation>, String>> + Send>,
}

impl SagaStep {
    /// Creates a named step from its forward action.
    pub fn new<F, Fut>(name: &'static str, forward: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Option<Compensation>, String>> + Send + 'static,
    {
        Self {
            name,
            forward: Box::new(move || Box::pin(forward())),
        }
    }

    /// The step's name, used in failure reports.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Runs the steps in order, unwinding on the first failure.
///
/// The unwind is LIFO over the compensations of completed steps. A failing
/// compensation is logged and collected but never stops the remaining
/// compensations from being attempted. The outcome distinguishes a clean
/// rollback ([`SagaError::StepFailed`]) from a dirty one
/// ([`SagaError::CompensationFailed`], which carries both the original
/// failure and every broken compensation).
pub async fn run_saga(steps: Vec<SagaStep>) -> Result<(), SagaError> {
    let mut compensations: Vec<Compensation> = Vec::new();

    for step in steps {
        let name = step.name;
        tracing::debug!(step = name, "saga step started");

        match (step.forward)().await {
            Ok(Some(compensation)) => {
                compensations.push(compensation);
            }
            Ok(None) => {}
            Err(reason) => {
                tracing::warn!(step = name, %reason, "saga step failed, unwinding");
                let original = StepFailure { step: name, reason };

                let mut failures = Vec::new();
                for compensation in compensations.into_iter().rev() {
                    let comp_step = compensation.step;
                    if let Err(reason) = (compensation.undo)().await {
                        tracing::error!(
                            step = comp_step,
                            %reason,
                            "compensation failed, continuing unwind"
                        );
                        failures.push(CompensationFailure {
                            step: comp_step,
                            reason,
                        });
                    }
                }

                return if failures.is_empty() {
                    Err(SagaError::StepFailed(original))
                } else {
                    metrics::counter!("saga_compensation_failures_total")
                        .increment(failures.len() as u64);
                    Err(SagaError::CompensationFailed { original, failures })
                };
            }
        }
    }

    Ok(())
}
