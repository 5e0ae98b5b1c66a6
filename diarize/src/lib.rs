//! Diarization ingest and speaker mapping.
//!
//! This crate holds the input side of the voice-replacement pipeline:
//! - [`SegmentStore`]: validated, read-only speaker-labeled time segments
//!   produced by a diarization service
//! - [`IdentityMapper`]: completes an operator-supplied partial mapping from
//!   detected speaker labels to target identities
//!
//! Both are pure: no I/O happens here. Diarization output crosses a service
//! boundary, so [`SegmentStore::ingest`] checks it defensively before any
//! remote job is dispatched.

mod mapping;
mod segment;

pub use mapping::*;
pub use segment::*;

/// Error type for diarization ingest and mapping operations.
#[derive(Debug, thiserror::Error)]
pub enum DiarizeError {
    /// Diarization output failed structural validation.
    #[error("malformed diarization input: {0}")]
    MalformedInput(String),

    /// Two segments of the same speaker overlap in time.
    #[error(
        "overlapping segments for speaker {label}: [{first_start}, {first_end}) and [{second_start}, {second_end})"
    )]
    Overlap {
        label: String,
        first_start: f64,
        first_end: f64,
        second_start: f64,
        second_end: f64,
    },

    /// A mapping references a speaker label absent from the segment store.
    #[error("unknown speaker label in mapping: {0}")]
    UnknownSpeaker(String),
}

/// Result type alias for diarization operations.
pub type Result<T> = std::result::Result<T, DiarizeError>;
