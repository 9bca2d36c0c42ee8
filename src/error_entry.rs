//! Structured failure records for the secondary (diagnostic) channel.

use chrono::{DateTime, Utc};

/// Injectable time source for [`ErrorEntry`] timestamps.
///
/// Production code uses [`SystemClock`]; tests pin a [`FixedClock`] so that
/// entries are byte-for-byte reproducible.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The real-time system clock. The default time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Information about one captured failure, for logging and debugging.
///
/// Constructed exactly once per failure and immutable once `step` and
/// `sources` are attached; ownership moves to whatever consumes the
/// secondary channel (a log sink, a dead-letter table).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEntry {
    error_message: String,
    stack_trace: String,
    timestamp: String,
    step: String,
    sources: Vec<String>,
}

impl ErrorEntry {
    /// Capture `err` with a timestamp from the system clock.
    pub fn of(err: &dyn std::error::Error) -> Self {
        Self::of_with_clock(err, &SystemClock)
    }

    /// Capture `err` with a timestamp from `clock`.
    pub fn of_with_clock(err: &dyn std::error::Error, clock: &dyn Clock) -> Self {
        ErrorEntry {
            error_message: err.to_string(),
            stack_trace: render_trace(err),
            timestamp: clock.now().to_rfc3339(),
            step: String::new(),
            sources: Vec::new(),
        }
    }

    /// Attach the identifying name of the stage that captured the failure.
    pub fn with_step(mut self, step: impl Into<String>) -> Self {
        self.step = step.into();
        self
    }

    /// Attach the identifiers of the input(s) that produced the failure.
    pub fn with_sources(mut self, sources: Vec<String>) -> Self {
        self.sources = sources;
        self
    }

    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    pub fn stack_trace(&self) -> &str {
        &self.stack_trace
    }

    /// ISO-8601 capture time.
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Name of the stage that captured the failure.
    pub fn step(&self) -> &str {
        &self.step
    }

    /// Input identifiers; empty (never absent) when unset.
    pub fn sources(&self) -> &[String] {
        &self.sources
    }
}

/// The failure's display line followed by its `source()` chain, the textual
/// trace available for a Rust error value.
fn render_trace(err: &dyn std::error::Error) -> String {
    let mut trace = err.to_string();
    let mut cause = err.source();
    while let Some(err) = cause {
        trace.push_str("\ncaused by: ");
        trace.push_str(&err.to_string());
        cause = err.source();
    }
    trace
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransformError;
    use chrono::TimeZone;

    fn fixed_clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2020, 7, 1, 12, 30, 0).unwrap())
    }

    #[test]
    fn test_captures_message_and_timestamp() {
        let err = TransformError::generic("parse blew up");
        let entry = ErrorEntry::of_with_clock(&err, &fixed_clock());
        assert_eq!(entry.error_message(), "parse blew up");
        assert_eq!(entry.timestamp(), "2020-07-01T12:30:00+00:00");
    }

    #[test]
    fn test_step_and_sources_attach() {
        let err = TransformError::generic("boom");
        let entry = ErrorEntry::of_with_clock(&err, &fixed_clock())
            .with_step("NormalizeStage")
            .with_sources(vec!["msg-1".to_string()]);
        assert_eq!(entry.step(), "NormalizeStage");
        assert_eq!(entry.sources(), ["msg-1".to_string()]);
    }

    #[test]
    fn test_sources_default_empty_not_absent() {
        let err = TransformError::generic("boom");
        let entry = ErrorEntry::of_with_clock(&err, &fixed_clock());
        assert!(entry.sources().is_empty());
    }

    #[test]
    fn test_trace_includes_cause_chain() {
        let err: TransformError = crate::error::CodecError::TrailingBytes { remaining: 2 }.into();
        let entry = ErrorEntry::of_with_clock(&err, &fixed_clock());
        assert!(entry.stack_trace().starts_with("codec: 2 trailing bytes"));
        assert!(entry.stack_trace().contains("caused by: 2 trailing bytes"));
    }
}
