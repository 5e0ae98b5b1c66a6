//! Timeline assembly.
//!
//! All fallback decisions live here, in one deterministic function: a
//! segment uses synthesized audio only when its speaker's job completed and
//! the QC gate accepted the result; everything else falls back to the
//! original source audio.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use revoice_diarize::{SegmentStore, SpeakerMapping};

use crate::job::JobOutcome;

/// Tolerance for float comparisons on segment boundaries, in seconds.
const BOUNDARY_EPSILON: f64 = 1e-3;

/// Where one timeline span's audio comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioSource {
    /// Sliced from the source track at the span's interval.
    Original,
    /// Synthesized audio blob accepted by the QC gate.
    Synthesized,
}

/// One span of the assembled output track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineSegment {
    pub start: f64,
    pub end: f64,
    pub speaker_label: String,
    pub source: AudioSource,
    /// Source media reference for `Original` spans, synthesized audio blob
    /// reference for `Synthesized` spans.
    pub source_ref: String,
}

/// Ordered reconstruction of the full source duration.
///
/// Built once, after every dispatched job is terminal; never partially
/// published.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeline {
    pub segments: Vec<TimelineSegment>,
    /// Total duration in seconds; equals the source media duration.
    pub duration: f64,
}

/// Assembly contract violations.
///
/// A coverage gap means diarization did not tile the source duration. That
/// is an upstream contract violation and is surfaced instead of being
/// papered over with synthetic silence.
#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    #[error("coverage gap at {at}s: next segment starts at {next_start}s")]
    CoverageGap { at: f64, next_start: f64 },

    #[error("segments overlap at {at}s: next segment starts at {next_start}s")]
    SegmentOverlap { at: f64, next_start: f64 },

    #[error("first segment starts at {start}s, not at 0")]
    LeadingGap { start: f64 },
}

/// Assembles the output timeline from the segment store and the terminal
/// job outcomes.
///
/// Spans are emitted in ascending start order and must tile `[0, duration]`
/// exactly (within a millisecond tolerance).
pub fn assemble(
    store: &SegmentStore,
    mapping: &SpeakerMapping,
    jobs: &BTreeMap<String, JobOutcome>,
    source_ref: &str,
) -> Result<Timeline, AssemblyError> {
    let segments = store.segments();

    // Coverage check over the start-sorted segments.
    let first = &segments[0];
    if first.start > BOUNDARY_EPSILON {
        return Err(AssemblyError::LeadingGap { start: first.start });
    }
    for pair in segments.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.start > prev.end + BOUNDARY_EPSILON {
            return Err(AssemblyError::CoverageGap {
                at: prev.end,
                next_start: next.start,
            });
        }
        if next.start < prev.end - BOUNDARY_EPSILON {
            return Err(AssemblyError::SegmentOverlap {
                at: prev.end,
                next_start: next.start,
            });
        }
    }

    let spans = segments
        .iter()
        .map(|seg| {
            let accepted = mapping.target(&seg.speaker_label).identity().is_some()
                && jobs
                    .get(&seg.speaker_label)
                    .is_some_and(JobOutcome::is_accepted);

            if accepted {
                let blob = jobs[&seg.speaker_label]
                    .result
                    .as_ref()
                    .expect("accepted outcome carries a result")
                    .audio_blob_ref
                    .clone();
                TimelineSegment {
                    start: seg.start,
                    end: seg.end,
                    speaker_label: seg.speaker_label.clone(),
                    source: AudioSource::Synthesized,
                    source_ref: blob,
                }
            } else {
                TimelineSegment {
                    start: seg.start,
                    end: seg.end,
                    speaker_label: seg.speaker_label.clone(),
                    source: AudioSource::Original,
                    source_ref: source_ref.to_string(),
                }
            }
        })
        .collect::<Vec<_>>();

    debug!(
        spans = spans.len(),
        synthesized = spans
            .iter()
            .filter(|s| s.source == AudioSource::Synthesized)
            .count(),
        "timeline assembled"
    );

    Ok(Timeline {
        segments: spans,
        duration: store.duration(),
    })
}

#[cfg(test)]
mod timeline_tests {
    use super::*;
    use crate::job::{CloneResult, JobState};
    use crate::qc::QcDecision;
    use revoice_diarize::{IdentityMapper, RawDiarization, SpeakerSegment, SpeakerTarget};

    fn seg(label: &str, start: f64, end: f64) -> SpeakerSegment {
        SpeakerSegment {
            speaker_label: label.to_string(),
            start,
            end,
            confidence: 1.0,
            transcript: Some("text".to_string()),
        }
    }

    fn store(segments: Vec<SpeakerSegment>) -> SegmentStore {
        SegmentStore::ingest(RawDiarization { segments }).unwrap()
    }

    fn accepted_outcome(label: &str) -> JobOutcome {
        JobOutcome {
            job_id: Some(format!("job-{label}")),
            speaker_label: label.to_string(),
            identity_id: format!("id-{label}"),
            state: JobState::Completed,
            result: Some(CloneResult {
                audio_blob_ref: format!("blob://{label}"),
                wer: Some(0.05),
                speaker_cosine: Some(0.9),
                qc_decision: QcDecision::Pass,
            }),
            error: None,
            attempts: 2,
        }
    }

    fn mapping_for(store: &SegmentStore, mapped: &[&str]) -> SpeakerMapping {
        let partial = mapped
            .iter()
            .map(|l| {
                (
                    l.to_string(),
                    SpeakerTarget::Identity(format!("id-{l}")),
                )
            })
            .collect();
        IdentityMapper::resolve(store, &partial).unwrap()
    }

    #[test]
    fn accepted_jobs_become_synthesized_spans() {
        let store = store(vec![seg("A", 0.0, 2.0), seg("B", 2.0, 4.0)]);
        let mapping = mapping_for(&store, &["A", "B"]);
        let mut jobs = BTreeMap::new();
        jobs.insert("A".to_string(), accepted_outcome("A"));
        jobs.insert("B".to_string(), accepted_outcome("B"));

        let timeline = assemble(&store, &mapping, &jobs, "media://src").unwrap();

        assert_eq!(timeline.duration, 4.0);
        assert!(
            timeline
                .segments
                .iter()
                .all(|s| s.source == AudioSource::Synthesized)
        );
        assert_eq!(timeline.segments[0].source_ref, "blob://A");
    }

    #[test]
    fn unmapped_speaker_stays_original() {
        let store = store(vec![seg("A", 0.0, 1.0), seg("B", 1.0, 2.0)]);
        let mapping = mapping_for(&store, &["A"]);
        let mut jobs = BTreeMap::new();
        jobs.insert("A".to_string(), accepted_outcome("A"));

        let timeline = assemble(&store, &mapping, &jobs, "media://src").unwrap();

        assert_eq!(timeline.segments[0].source, AudioSource::Synthesized);
        assert_eq!(timeline.segments[1].source, AudioSource::Original);
        assert_eq!(timeline.segments[1].source_ref, "media://src");
    }

    #[test]
    fn rejected_job_falls_back_to_original() {
        let store = store(vec![seg("A", 0.0, 1.0)]);
        let mapping = mapping_for(&store, &["A"]);
        let mut outcome = accepted_outcome("A");
        outcome.result.as_mut().unwrap().qc_decision = QcDecision::Fail;
        let mut jobs = BTreeMap::new();
        jobs.insert("A".to_string(), outcome);

        let timeline = assemble(&store, &mapping, &jobs, "media://src").unwrap();
        assert_eq!(timeline.segments[0].source, AudioSource::Original);
    }

    #[test]
    fn coverage_gap_is_fatal() {
        let store = store(vec![seg("A", 0.0, 1.0), seg("B", 1.5, 2.0)]);
        let mapping = mapping_for(&store, &[]);
        let err = assemble(&store, &mapping, &BTreeMap::new(), "media://src").unwrap_err();
        assert!(matches!(err, AssemblyError::CoverageGap { .. }));
    }

    #[test]
    fn leading_gap_is_fatal() {
        let store = store(vec![seg("A", 0.5, 1.0)]);
        let mapping = mapping_for(&store, &[]);
        let err = assemble(&store, &mapping, &BTreeMap::new(), "media://src").unwrap_err();
        assert!(matches!(err, AssemblyError::LeadingGap { .. }));
    }

    #[test]
    fn overlap_across_speakers_is_fatal_in_assembly() {
        let store = store(vec![seg("A", 0.0, 2.0), seg("B", 1.0, 3.0)]);
        let mapping = mapping_for(&store, &[]);
        let err = assemble(&store, &mapping, &BTreeMap::new(), "media://src").unwrap_err();
        assert!(matches!(err, AssemblyError::SegmentOverlap { .. }));
    }

    #[test]
    fn spans_are_strictly_ordered_and_cover_duration() {
        let store = store(vec![
            seg("A", 0.0, 1.0),
            seg("B", 1.0, 2.5),
            seg("A", 2.5, 4.0),
        ]);
        let mapping = mapping_for(&store, &[]);
        let timeline = assemble(&store, &mapping, &BTreeMap::new(), "media://src").unwrap();

        for pair in timeline.segments.windows(2) {
            assert!(pair[0].start < pair[1].start);
            assert!((pair[0].end - pair[1].start).abs() <= BOUNDARY_EPSILON);
        }
        assert_eq!(
            timeline.segments.last().unwrap().end,
            timeline.duration
        );
    }
}
