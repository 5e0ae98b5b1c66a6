//! Speaker-labeled time segments.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{DiarizeError, Result};

/// One speaker-labeled time interval in the source media.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakerSegment {
    /// Diarization speaker label (e.g. "SPEAKER_00").
    #[serde(alias = "speaker")]
    pub speaker_label: String,

    /// Start time in seconds from the beginning of the source.
    pub start: f64,

    /// End time in seconds; always greater than `start`.
    pub end: f64,

    /// Diarization confidence in [0, 1].
    #[serde(default = "default_confidence")]
    pub confidence: f64,

    /// Transcript of this interval, when the diarizer produced one.
    #[serde(default, alias = "text")]
    pub transcript: Option<String>,
}

fn default_confidence() -> f64 {
    1.0
}

impl SpeakerSegment {
    /// Duration of the segment in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Raw diarization service output, as received over the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDiarization {
    pub segments: Vec<SpeakerSegment>,
}

/// Validated, immutable collection of diarization segments for one source
/// media file.
///
/// Invariants established by [`SegmentStore::ingest`]:
/// - every segment has `end > start`, a non-empty label, and a confidence
///   in [0, 1]
/// - segments of the same speaker never overlap and are sorted by start
///
/// Segments of *different* speakers may overlap (cross-talk); the assembler
/// treats the source as one sequential timeline keyed by absolute time.
#[derive(Debug, Clone)]
pub struct SegmentStore {
    segments: Vec<SpeakerSegment>,
    duration: f64,
}

impl SegmentStore {
    /// Validates raw diarization output and builds a store from it.
    pub fn ingest(raw: RawDiarization) -> Result<Self> {
        if raw.segments.is_empty() {
            return Err(DiarizeError::MalformedInput(
                "diarization produced no segments".to_string(),
            ));
        }

        for seg in &raw.segments {
            if seg.speaker_label.is_empty() {
                return Err(DiarizeError::MalformedInput(format!(
                    "segment at [{}, {}) has an empty speaker label",
                    seg.start, seg.end
                )));
            }
            if !seg.start.is_finite() || !seg.end.is_finite() || seg.start < 0.0 {
                return Err(DiarizeError::MalformedInput(format!(
                    "segment for {} has invalid bounds [{}, {})",
                    seg.speaker_label, seg.start, seg.end
                )));
            }
            if seg.end <= seg.start {
                return Err(DiarizeError::MalformedInput(format!(
                    "segment for {} ends at {} before it starts at {}",
                    seg.speaker_label, seg.end, seg.start
                )));
            }
            if !(0.0..=1.0).contains(&seg.confidence) {
                return Err(DiarizeError::MalformedInput(format!(
                    "segment for {} has confidence {} outside [0, 1]",
                    seg.speaker_label, seg.confidence
                )));
            }
        }

        let mut segments = raw.segments;
        segments.sort_by(|a, b| a.start.total_cmp(&b.start));

        // Same-speaker overlap check on the start-sorted list.
        for label in segments
            .iter()
            .map(|s| s.speaker_label.clone())
            .collect::<BTreeSet<_>>()
        {
            let mut prev: Option<&SpeakerSegment> = None;
            for seg in segments.iter().filter(|s| s.speaker_label == label) {
                if let Some(p) = prev {
                    if seg.start < p.end {
                        return Err(DiarizeError::Overlap {
                            label: label.clone(),
                            first_start: p.start,
                            first_end: p.end,
                            second_start: seg.start,
                            second_end: seg.end,
                        });
                    }
                }
                prev = Some(seg);
            }
        }

        let duration = segments.iter().map(|s| s.end).fold(0.0, f64::max);

        Ok(Self { segments, duration })
    }

    /// All segments, sorted by start time.
    pub fn segments(&self) -> &[SpeakerSegment] {
        &self.segments
    }

    /// Segments belonging to one speaker, sorted by start time.
    pub fn segments_for(&self, label: &str) -> impl Iterator<Item = &SpeakerSegment> {
        self.segments.iter().filter(move |s| s.speaker_label == label)
    }

    /// The set of distinct speaker labels present in the store.
    pub fn distinct_speakers(&self) -> BTreeSet<String> {
        self.segments
            .iter()
            .map(|s| s.speaker_label.clone())
            .collect()
    }

    /// Total source duration in seconds (the latest segment end).
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Concatenated transcript text for one speaker, in timeline order.
    /// Returns `None` when no segment of that speaker carries a transcript.
    pub fn transcript_for(&self, label: &str) -> Option<String> {
        let parts: Vec<&str> = self
            .segments_for(label)
            .filter_map(|s| s.transcript.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

#[cfg(test)]
mod segment_tests {
    use super::*;

    fn seg(label: &str, start: f64, end: f64) -> SpeakerSegment {
        SpeakerSegment {
            speaker_label: label.to_string(),
            start,
            end,
            confidence: 0.9,
            transcript: Some(format!("{label} {start}")),
        }
    }

    #[test]
    fn ingest_sorts_and_measures_duration() {
        let store = SegmentStore::ingest(RawDiarization {
            segments: vec![seg("B", 2.0, 4.0), seg("A", 0.0, 2.0)],
        })
        .unwrap();

        assert_eq!(store.segments()[0].speaker_label, "A");
        assert_eq!(store.duration(), 4.0);
        assert_eq!(store.distinct_speakers().len(), 2);
    }

    #[test]
    fn ingest_rejects_inverted_bounds() {
        let err = SegmentStore::ingest(RawDiarization {
            segments: vec![seg("A", 3.0, 1.0)],
        })
        .unwrap_err();
        assert!(matches!(err, DiarizeError::MalformedInput(_)));
    }

    #[test]
    fn ingest_rejects_empty_label() {
        let err = SegmentStore::ingest(RawDiarization {
            segments: vec![seg("", 0.0, 1.0)],
        })
        .unwrap_err();
        assert!(matches!(err, DiarizeError::MalformedInput(_)));
    }

    #[test]
    fn ingest_rejects_bad_confidence() {
        let mut s = seg("A", 0.0, 1.0);
        s.confidence = 1.5;
        let err = SegmentStore::ingest(RawDiarization { segments: vec![s] }).unwrap_err();
        assert!(matches!(err, DiarizeError::MalformedInput(_)));
    }

    #[test]
    fn ingest_rejects_same_speaker_overlap() {
        let err = SegmentStore::ingest(RawDiarization {
            segments: vec![seg("A", 0.0, 2.0), seg("A", 1.5, 3.0)],
        })
        .unwrap_err();

        match err {
            DiarizeError::Overlap {
                label,
                first_end,
                second_start,
                ..
            } => {
                assert_eq!(label, "A");
                assert_eq!(first_end, 2.0);
                assert_eq!(second_start, 1.5);
            }
            other => panic!("expected Overlap, got {other:?}"),
        }
    }

    #[test]
    fn cross_speaker_overlap_is_allowed() {
        let store = SegmentStore::ingest(RawDiarization {
            segments: vec![seg("A", 0.0, 2.0), seg("B", 1.0, 3.0)],
        });
        assert!(store.is_ok());
    }

    #[test]
    fn transcript_joins_in_timeline_order() {
        let store = SegmentStore::ingest(RawDiarization {
            segments: vec![seg("A", 2.0, 3.0), seg("A", 0.0, 1.0)],
        })
        .unwrap();
        assert_eq!(store.transcript_for("A").unwrap(), "A 0 A 2");
        assert_eq!(store.transcript_for("missing"), None);
    }

    #[test]
    fn raw_diarization_accepts_wire_aliases() {
        let raw: RawDiarization = serde_json::from_str(
            r#"{"segments":[{"speaker":"SPEAKER_00","start":0.0,"end":1.5,"text":"hi"}]}"#,
        )
        .unwrap();
        let store = SegmentStore::ingest(raw).unwrap();
        assert_eq!(store.segments()[0].speaker_label, "SPEAKER_00");
        assert_eq!(store.segments()[0].transcript.as_deref(), Some("hi"));
        assert_eq!(store.segments()[0].confidence, 1.0);
    }
}
