//! Batch driver for error-isolating stages.
//!
//! Pushes a sequence of elements through a stage, splitting results across
//! the primary (outputs) and secondary (error entries) channels. A host
//! with its own channel plumbing can skip this and call
//! [`process_element`](crate::stage::process_element) directly.

use crate::error::TransformError;
use crate::error_entry::{Clock, ErrorEntry};
use crate::stage::{ElementOutcome, ErrorReportingStage, process_element};

/// Push `inputs` through `stage`, routing outputs to `primary` and error
/// entries to `secondary`.
///
/// Stops at the first fatal element and returns its original failure; the
/// element's entry reaches `secondary` before the failure is returned, so
/// the diagnostic record survives the abort. Elements are processed in
/// order here, but nothing in the stage contract requires that; callers
/// may fan elements out across threads with their own sinks.
pub fn execute_isolated<S: ErrorReportingStage>(
    stage: &S,
    clock: &dyn Clock,
    inputs: impl IntoIterator<Item = S::Input>,
    primary: &mut impl FnMut(S::Output),
    secondary: &mut impl FnMut(ErrorEntry),
) -> Result<(), TransformError> {
    for input in inputs {
        match process_element(stage, clock, &input) {
            ElementOutcome::Output(output) => primary(output),
            ElementOutcome::Suppressed(entry) => secondary(entry),
            ElementOutcome::Fatal(entry, err) => {
                secondary(entry);
                return Err(err);
            }
        }
    }
    Ok(())
}

/// Everything a finished (or aborted) run produced.
#[derive(Debug)]
pub struct IsolatedRun<O> {
    /// Primary channel: one output per successful element.
    pub outputs: Vec<O>,
    /// Secondary channel: one entry per failed element, fatal or not.
    pub errors: Vec<ErrorEntry>,
    /// The original failure of the element that aborted the run, if any.
    pub fatal: Option<TransformError>,
}

impl<O> IsolatedRun<O> {
    pub fn is_fatal(&self) -> bool {
        self.fatal.is_some()
    }
}

/// Convenience wrapper around [`execute_isolated`] collecting both
/// channels into vectors.
pub fn run_isolated<S: ErrorReportingStage>(
    stage: &S,
    clock: &dyn Clock,
    inputs: impl IntoIterator<Item = S::Input>,
) -> IsolatedRun<S::Output> {
    let mut outputs = Vec::new();
    let mut errors = Vec::new();
    let fatal = execute_isolated(
        stage,
        clock,
        inputs,
        &mut |output| outputs.push(output),
        &mut |entry| errors.push(entry),
    )
    .err();
    IsolatedRun {
        outputs,
        errors,
        fatal,
    }
}
