//! Keyframe records: a timed value plus its easing, path shape, and
//! frame/range kind. Pure data apart from the default-curve heuristic.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value::KeyframeValue;

/// Easing applied to the normalized progress within one bracket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EasingType {
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
}

impl EasingType {
    /// Map raw progress in [0,1] to eased progress. Endpoints are stable
    /// for every kind.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseIn => t * t,
            Self::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Self::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(2) / 2.0)
                }
            }
        }
    }
}

/// Spatial shape of the path toward the next keyframe. Only Position
/// channels honor Bezier; everything else lerps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathType {
    Linear,
    Bezier,
}

/// A Bezier control point in the same canvas space as Position values.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    pub x: f32,
    pub y: f32,
}

/// Two optional control points; missing points fall back to linear thirds.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurveData {
    #[serde(default)]
    pub control_point1: Option<ControlPoint>,
    #[serde(default)]
    pub control_point2: Option<ControlPoint>,
}

/// End of the held interval for a Range keyframe, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeData {
    pub end_time: u32,
}

/// Frame keyframes are instantaneous; Range keyframes hold their value
/// from `time` until `end_time`, after which evaluation continues toward
/// the next real keyframe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyType {
    Frame,
    Range(RangeData),
}

/// A timestamped target value for one animatable channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Keyframe {
    pub id: String,
    /// Milliseconds from the owning animation's start.
    pub time: u32,
    pub value: KeyframeValue,
    pub easing: EasingType,
    pub path_type: PathType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curve_data: Option<CurveData>,
    pub key_type: KeyType,
}

const MAX_PERPENDICULAR_OFFSET: f32 = 50.0;
const MAX_FORWARD_OFFSET: f32 = 100.0;

impl Keyframe {
    pub fn new(time: u32, value: KeyframeValue, easing: EasingType) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            time,
            value,
            easing,
            path_type: PathType::Linear,
            curve_data: None,
            key_type: KeyType::Frame,
        }
    }

    /// Effective end of this keyframe: `end_time` for ranges, `time`
    /// otherwise.
    pub fn end_time(&self) -> u32 {
        match self.key_type {
            KeyType::Frame => self.time,
            KeyType::Range(range) => range.end_time,
        }
    }

    /// Default control points for a gentle symmetric arc between this
    /// Position keyframe and the next one.
    ///
    /// The perpendicular offset is 20% of the inter-point distance capped
    /// at 50 units; the forward offset is 25% of velocity * duration
    /// capped at 100 units. Plausible arc, not least-squares anything.
    pub fn calculate_default_curve(&self, next: &Keyframe) -> Option<CurveData> {
        let start = self.value.as_position()?;
        let end = next.value.as_position()?;

        let dx = end[0] - start[0];
        let dy = end[1] - start[1];
        let distance = (dx * dx + dy * dy).sqrt();
        if distance <= f32::EPSILON {
            return None;
        }

        let dir = [dx / distance, dy / distance];
        let perp = [-dir[1], dir[0]];
        let perp_offset = (distance * 0.2).min(MAX_PERPENDICULAR_OFFSET);

        let duration_s = next.time.saturating_sub(self.time) as f32 / 1000.0;
        let forward_offset = if duration_s > 0.0 {
            let velocity = distance / duration_s;
            (velocity * duration_s * 0.25).min(MAX_FORWARD_OFFSET)
        } else {
            (distance * 0.25).min(MAX_FORWARD_OFFSET)
        };

        Some(CurveData {
            control_point1: Some(ControlPoint {
                x: start[0] + dir[0] * forward_offset + perp[0] * perp_offset,
                y: start[1] + dir[1] * forward_offset + perp[1] * perp_offset,
            }),
            control_point2: Some(ControlPoint {
                x: end[0] - dir[0] * forward_offset + perp[0] * perp_offset,
                y: end[1] - dir[1] * forward_offset + perp[1] * perp_offset,
            }),
        })
    }
}
