//! Canvas configuration shared by the stepper and the motion generator.

use serde::{Deserialize, Serialize};

/// Logical canvas dimensions and the editor's viewport offsets.
///
/// Prediction values are percentages of `width`/`height`; the offsets are
/// added to every Position write so composition space stays independent of
/// where the canvas sits in the editor window.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasConfig {
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub horiz_offset: f32,
    #[serde(default)]
    pub vert_offset: f32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 450.0,
            horiz_offset: 0.0,
            vert_offset: 0.0,
        }
    }
}
