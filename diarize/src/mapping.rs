//! Speaker-to-identity mapping.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{DiarizeError, Result, SegmentStore};

/// Identifier of a target identity (a person with a trained voice).
pub type IdentityId = String;

/// Target for one detected speaker.
///
/// Untagged: an operator mapping file writes an identity id as a plain string
/// and preserve-original as an explicit `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpeakerTarget {
    /// Replace this speaker's audio with the given identity's voice.
    Identity(IdentityId),
    /// Keep the original audio for this speaker.
    PreserveOriginal,
}

impl SpeakerTarget {
    /// Returns the identity id when this target replaces audio.
    pub fn identity(&self) -> Option<&str> {
        match self {
            SpeakerTarget::Identity(id) => Some(id),
            SpeakerTarget::PreserveOriginal => None,
        }
    }
}

/// Total mapping from every distinct speaker label in a [`SegmentStore`] to a
/// [`SpeakerTarget`]. Built by [`IdentityMapper::resolve`]; labels the
/// operator left out default to [`SpeakerTarget::PreserveOriginal`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeakerMapping {
    targets: BTreeMap<String, SpeakerTarget>,
}

impl SpeakerMapping {
    /// Returns the target for a speaker label. Labels outside the mapping's
    /// domain preserve original audio.
    pub fn target(&self, label: &str) -> &SpeakerTarget {
        self.targets
            .get(label)
            .unwrap_or(&SpeakerTarget::PreserveOriginal)
    }

    /// Iterates over `(label, target)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &SpeakerTarget)> {
        self.targets.iter()
    }

    /// Speaker labels mapped to a real identity, with their identity ids.
    pub fn replaced_speakers(&self) -> impl Iterator<Item = (&String, &IdentityId)> {
        self.targets.iter().filter_map(|(label, t)| match t {
            SpeakerTarget::Identity(id) => Some((label, id)),
            SpeakerTarget::PreserveOriginal => None,
        })
    }

    /// Number of labels in the mapping's domain.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// True when the mapping's domain is empty.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Completes partial operator mappings against a segment store.
pub struct IdentityMapper;

impl IdentityMapper {
    /// Resolves a partial operator-supplied mapping into a total
    /// [`SpeakerMapping`] over every distinct speaker in `store`.
    ///
    /// Labels present in `partial` but absent from the store are rejected
    /// with [`DiarizeError::UnknownSpeaker`]; labels the operator did not
    /// mention default to preserve-original. Pure and deterministic.
    pub fn resolve(
        store: &SegmentStore,
        partial: &BTreeMap<String, SpeakerTarget>,
    ) -> Result<SpeakerMapping> {
        let known = store.distinct_speakers();

        for label in partial.keys() {
            if !known.contains(label) {
                return Err(DiarizeError::UnknownSpeaker(label.clone()));
            }
        }

        let targets = known
            .into_iter()
            .map(|label| {
                let target = partial
                    .get(&label)
                    .cloned()
                    .unwrap_or(SpeakerTarget::PreserveOriginal);
                (label, target)
            })
            .collect();

        Ok(SpeakerMapping { targets })
    }
}

#[cfg(test)]
mod mapping_tests {
    use super::*;
    use crate::{RawDiarization, SpeakerSegment};

    fn store(labels: &[&str]) -> SegmentStore {
        let segments = labels
            .iter()
            .enumerate()
            .map(|(i, l)| SpeakerSegment {
                speaker_label: l.to_string(),
                start: i as f64,
                end: i as f64 + 1.0,
                confidence: 1.0,
                transcript: None,
            })
            .collect();
        SegmentStore::ingest(RawDiarization { segments }).unwrap()
    }

    #[test]
    fn resolve_covers_every_speaker() {
        let store = store(&["A", "B", "C"]);
        let mut partial = BTreeMap::new();
        partial.insert(
            "A".to_string(),
            SpeakerTarget::Identity("person-1".to_string()),
        );

        let mapping = IdentityMapper::resolve(&store, &partial).unwrap();

        assert_eq!(mapping.len(), 3);
        assert_eq!(mapping.target("A").identity(), Some("person-1"));
        assert_eq!(mapping.target("B"), &SpeakerTarget::PreserveOriginal);
        assert_eq!(mapping.target("C"), &SpeakerTarget::PreserveOriginal);
    }

    #[test]
    fn resolve_rejects_unknown_labels() {
        let store = store(&["A"]);
        let mut partial = BTreeMap::new();
        partial.insert(
            "GHOST".to_string(),
            SpeakerTarget::Identity("person-1".to_string()),
        );

        let err = IdentityMapper::resolve(&store, &partial).unwrap_err();
        assert!(matches!(err, DiarizeError::UnknownSpeaker(l) if l == "GHOST"));
    }

    #[test]
    fn resolve_is_deterministic() {
        let store = store(&["A", "B"]);
        let mut partial = BTreeMap::new();
        partial.insert(
            "B".to_string(),
            SpeakerTarget::Identity("person-2".to_string()),
        );

        let first = IdentityMapper::resolve(&store, &partial).unwrap();
        let second = IdentityMapper::resolve(&store, &partial).unwrap();
        assert_eq!(
            first.iter().collect::<Vec<_>>(),
            second.iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn replaced_speakers_skips_preserved() {
        let store = store(&["A", "B"]);
        let mut partial = BTreeMap::new();
        partial.insert(
            "A".to_string(),
            SpeakerTarget::Identity("person-1".to_string()),
        );
        partial.insert("B".to_string(), SpeakerTarget::PreserveOriginal);

        let mapping = IdentityMapper::resolve(&store, &partial).unwrap();
        let replaced: Vec<_> = mapping.replaced_speakers().collect();
        assert_eq!(replaced.len(), 1);
        assert_eq!(replaced[0].0, "A");
    }

    #[test]
    fn mapping_file_roundtrip() {
        let json = r#"{"targets":{"A":"person-1","B":null}}"#;
        let mapping: SpeakerMapping = serde_json::from_str(json).unwrap();
        assert_eq!(mapping.target("A").identity(), Some("person-1"));
        assert_eq!(mapping.target("B"), &SpeakerTarget::PreserveOriginal);
    }
}
