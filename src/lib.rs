//! # hl7v2-etl
//!
//! Building blocks for HL7v2 record-processing pipelines.
//!
//! Two independent pieces, composed by a hosting pipeline:
//!
//! - **Record codec**: a deterministic, order-fixed binary encoding for
//!   [`Hl7v2Message`], whose fields (scalars, a label dictionary, a nested
//!   parsed-data record) are all individually optional. Absent and empty
//!   round-trip distinctly; truncated input fails loudly.
//! - **Error-isolating stage**: a wrapper around a per-element
//!   transformation that turns one element's failure into a structured
//!   [`ErrorEntry`] on a secondary channel, then either suppresses the
//!   failure (pipeline continues) or propagates it (pipeline fails) based
//!   on a per-stage recoverability policy.
//!
//! ## Example
//!
//! ```
//! use hl7v2_etl::{
//!     ErrorReportingStage, Hl7v2Message, SystemClock, TransformError, run_isolated,
//! };
//!
//! struct TagStage;
//!
//! impl ErrorReportingStage for TagStage {
//!     type Input = Hl7v2Message;
//!     type Output = Hl7v2Message;
//!
//!     fn process(&self, input: &Hl7v2Message) -> Result<Hl7v2Message, TransformError> {
//!         let mut out = input.clone();
//!         out.send_facility = Some("ETL".to_string());
//!         Ok(out)
//!     }
//!
//!     fn name(&self) -> &str {
//!         "TagStage"
//!     }
//! }
//!
//! let run = run_isolated(&TagStage, &SystemClock, vec![Hl7v2Message::new()]);
//! assert_eq!(run.outputs.len(), 1);
//! assert!(run.errors.is_empty());
//! ```

pub mod codec;
pub mod error;
pub mod error_entry;
pub mod executor;
pub mod message;
pub mod stage;

pub use codec::{ByteReader, WireCodec};
pub use error::{CodecError, TransformError};
pub use error_entry::{Clock, ErrorEntry, FixedClock, SystemClock};
pub use executor::{IsolatedRun, execute_isolated, run_isolated};
pub use message::{Hl7v2Message, LabelMap, ParsedData, Segment};
pub use stage::{ElementOutcome, ErrorReportingStage, process_element};
