//! Persistence wire format.
//!
//! A saved project is the JSON shape the web editor reads and writes:
//! camelCase field names throughout, keyframe times in milliseconds.
//! Parsing always runs validation so a hand-edited file fails loudly
//! instead of producing a sequence the stepper trips over.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::timeline::SavedTimelineConfig;
use crate::tracks::Sequence;

/// The root saved-project document.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavedState {
    pub id: String,
    pub name: String,
    pub sequences: Vec<Sequence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline_state: Option<SavedTimelineConfig>,
}

impl SavedState {
    /// Restore invariants the wire format does not guarantee: keyframe
    /// ordering within every property track.
    pub fn normalize(&mut self) {
        for sequence in &mut self.sequences {
            sequence.sort_keyframes();
        }
    }

    /// Validate every sequence. Dangling animation references are
    /// reported but not fatal; structural problems are.
    pub fn validate(&self) -> Result<Vec<String>, EngineError> {
        let mut dangling = Vec::new();
        for sequence in &self.sequences {
            dangling.extend(sequence.validate()?);
        }
        Ok(dangling)
    }
}

/// Parse a saved project from JSON, restore invariants, and validate.
/// Returns the state plus any dangling animation ids the caller may want
/// to surface.
pub fn parse_saved_state_json(json: &str) -> Result<(SavedState, Vec<String>), EngineError> {
    let mut state: SavedState =
        serde_json::from_str(json).map_err(|e| EngineError::Parse(e.to_string()))?;
    state.normalize();
    let dangling = state.validate()?;
    Ok((state, dangling))
}

pub fn to_saved_state_json(state: &SavedState) -> Result<String, EngineError> {
    serde_json::to_string_pretty(state).map_err(|e| EngineError::Parse(e.to_string()))
}

/// Parse a single sequence document, as exported or imported on its own.
pub fn parse_sequence_json(json: &str) -> Result<Sequence, EngineError> {
    let mut sequence: Sequence =
        serde_json::from_str(json).map_err(|e| EngineError::Parse(e.to_string()))?;
    sequence.sort_keyframes();
    sequence.validate()?;
    Ok(sequence)
}

pub fn parse_timeline_json(json: &str) -> Result<SavedTimelineConfig, EngineError> {
    serde_json::from_str(json).map_err(|e| EngineError::Parse(e.to_string()))
}

pub fn to_timeline_json(config: &SavedTimelineConfig) -> Result<String, EngineError> {
    serde_json::to_string_pretty(config).map_err(|e| EngineError::Parse(e.to_string()))
}
