//! Track timeline: the arrangement of sequences along the playback clock.

use serde::{Deserialize, Serialize};

use crate::tracks::Sequence;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackType {
    Audio,
    Video,
}

/// One placed sequence on the timeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineSequence {
    pub id: String,
    pub sequence_id: String,
    pub track_type: TrackType,
    pub start_time_ms: u32,
    pub duration_ms: u32,
}

/// Persisted timeline arrangement.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedTimelineConfig {
    pub timeline_sequences: Vec<TimelineSequence>,
}

impl SavedTimelineConfig {
    /// The sequence that should be playing at `current_time_ms`, walking
    /// video tracks in order. The placed entry's own duration is ignored
    /// in favor of the sequence's authoritative `duration_ms`, matching
    /// how the editor resolves stale placements.
    pub fn active_sequence<'a>(
        &self,
        sequences: &'a [Sequence],
        current_time_ms: u32,
    ) -> Option<&'a Sequence> {
        for placed in &self.timeline_sequences {
            if placed.track_type != TrackType::Video {
                continue;
            }
            let Some(sequence) = sequences.iter().find(|s| s.id == placed.sequence_id) else {
                continue;
            };
            let end = placed.start_time_ms + sequence.duration_ms;
            if current_time_ms >= placed.start_time_ms && current_time_ms < end {
                return Some(sequence);
            }
        }
        None
    }
}
