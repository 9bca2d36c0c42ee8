//! Error-isolating stage trait and per-element execution wrapper.
//!
//! A stage wraps a caller-supplied transformation so that one element's
//! failure becomes a structured [`ErrorEntry`] on a secondary channel
//! instead of aborting the whole run. Whether the failure also propagates
//! is decided per failure class by [`ErrorReportingStage::is_recoverable`].

use tracing::{error, warn};

use crate::error::TransformError;
use crate::error_entry::{Clock, ErrorEntry};

/// A per-element transformation with error reporting attached.
///
/// Implementors supply `process` and `name`; `is_recoverable` and `sources`
/// have conservative defaults. Overrides of `is_recoverable` whitelist
/// additional recoverable failure kinds for their domain; they never change
/// how entries are built. The predicate must be total and side-effect-free.
pub trait ErrorReportingStage {
    type Input;
    type Output;

    /// The main processing logic.
    fn process(&self, input: &Self::Input) -> Result<Self::Output, TransformError>;

    /// Identifying name of this stage; recorded as the `step` of every
    /// entry it captures, so it must be stable and operator-meaningful.
    fn name(&self) -> &str;

    /// Whether a failure should be reported only, rather than failing the
    /// pipeline. The default suppresses just the generic, unclassified
    /// kind; every classified kind propagates.
    fn is_recoverable(&self, err: &TransformError) -> bool {
        matches!(err, TransformError::Generic(_))
    }

    /// Identifiers of the input(s) behind one element, recorded as the
    /// entry's `sources`. Defaults to none.
    fn sources(&self, _input: &Self::Input) -> Vec<String> {
        Vec::new()
    }
}

/// Terminal state of one element's traversal through a stage.
#[derive(Debug)]
pub enum ElementOutcome<O> {
    /// The transformation succeeded; `O` belongs on the primary channel.
    Output(O),
    /// The transformation failed recoverably; the entry belongs on the
    /// secondary channel and processing continues with the next element.
    Suppressed(ErrorEntry),
    /// The transformation failed fatally; the entry still belongs on the
    /// secondary channel, after which the host must fail the pipeline
    /// with the original error.
    Fatal(ErrorEntry, TransformError),
}

/// Push one element through `stage`, capturing any failure.
///
/// The entry is always built before recoverability is evaluated, so
/// diagnostic visibility is never lost for fatal failures. Holds no state
/// across calls; disjoint elements may be processed concurrently.
pub fn process_element<S: ErrorReportingStage>(
    stage: &S,
    clock: &dyn Clock,
    input: &S::Input,
) -> ElementOutcome<S::Output> {
    match stage.process(input) {
        Ok(output) => ElementOutcome::Output(output),
        Err(err) => {
            let entry = ErrorEntry::of_with_clock(&err, clock)
                .with_step(stage.name())
                .with_sources(stage.sources(input));
            if stage.is_recoverable(&err) {
                warn!(step = stage.name(), error = %err, "recoverable failure suppressed");
                ElementOutcome::Suppressed(entry)
            } else {
                error!(step = stage.name(), error = %err, "fatal failure, propagating");
                ElementOutcome::Fatal(entry, err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_entry::FixedClock;
    use chrono::{TimeZone, Utc};

    /// Uppercases its input; fails on demand for exercising the wrapper.
    struct UppercaseStage;

    impl ErrorReportingStage for UppercaseStage {
        type Input = String;
        type Output = String;

        fn process(&self, input: &String) -> Result<String, TransformError> {
            match input.as_str() {
                "generic" => Err(TransformError::generic("transient glitch")),
                "classified" => Err(TransformError::classified("SchemaMismatch", "no MSH")),
                other => Ok(other.to_uppercase()),
            }
        }

        fn name(&self) -> &str {
            "UppercaseStage"
        }

        fn sources(&self, input: &String) -> Vec<String> {
            vec![format!("input:{input}")]
        }
    }

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap())
    }

    #[test]
    fn test_success_emits_output_only() {
        let outcome = process_element(&UppercaseStage, &clock(), &"adt".to_string());
        match outcome {
            ElementOutcome::Output(o) => assert_eq!(o, "ADT"),
            other => panic!("expected Output, got {other:?}"),
        }
    }

    #[test]
    fn test_generic_failure_is_suppressed() {
        let outcome = process_element(&UppercaseStage, &clock(), &"generic".to_string());
        match outcome {
            ElementOutcome::Suppressed(entry) => {
                assert_eq!(entry.error_message(), "transient glitch");
                assert_eq!(entry.step(), "UppercaseStage");
                assert_eq!(entry.sources(), ["input:generic".to_string()]);
                assert!(!entry.timestamp().is_empty());
            }
            other => panic!("expected Suppressed, got {other:?}"),
        }
    }

    #[test]
    fn test_classified_failure_is_fatal_and_keeps_entry() {
        let outcome = process_element(&UppercaseStage, &clock(), &"classified".to_string());
        match outcome {
            ElementOutcome::Fatal(entry, err) => {
                assert_eq!(entry.error_message(), "SchemaMismatch: no MSH");
                assert_eq!(entry.step(), "UppercaseStage");
                assert!(matches!(err, TransformError::Classified { .. }));
            }
            other => panic!("expected Fatal, got {other:?}"),
        }
    }

    #[test]
    fn test_override_widens_recoverable_set() {
        /// Treats schema mismatches as report-only.
        struct LenientStage;

        impl ErrorReportingStage for LenientStage {
            type Input = String;
            type Output = String;

            fn process(&self, _input: &String) -> Result<String, TransformError> {
                Err(TransformError::classified("SchemaMismatch", "no MSH"))
            }

            fn name(&self) -> &str {
                "LenientStage"
            }

            fn is_recoverable(&self, err: &TransformError) -> bool {
                matches!(err, TransformError::Generic(_))
                    || matches!(
                        err,
                        TransformError::Classified { kind, .. } if kind == "SchemaMismatch"
                    )
            }
        }

        let outcome = process_element(&LenientStage, &clock(), &"x".to_string());
        assert!(matches!(outcome, ElementOutcome::Suppressed(_)));
    }

    #[test]
    fn test_codec_failure_is_fatal_by_default() {
        struct DecodeStage;

        impl ErrorReportingStage for DecodeStage {
            type Input = Vec<u8>;
            type Output = crate::message::Hl7v2Message;

            fn process(&self, input: &Vec<u8>) -> Result<Self::Output, TransformError> {
                use crate::codec::WireCodec;
                Ok(crate::message::Hl7v2Message::from_bytes(input)?)
            }

            fn name(&self) -> &str {
                "DecodeStage"
            }
        }

        let outcome = process_element(&DecodeStage, &clock(), &vec![9u8]);
        assert!(matches!(outcome, ElementOutcome::Fatal(_, _)));
    }
}
