//! Animatable channel values.
//!
//! A keyframe carries exactly one of these tags; consumers match
//! exhaustively so adding a channel is a compile-time-checked change.

use serde::{Deserialize, Serialize};

/// Zoom target for video items: a canvas-space focus point plus a zoom
/// level in percent (100 = no zoom).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoomValue {
    pub position: [f32; 2],
    pub zoom_level: f32,
}

/// Tagged union over the animatable channels.
///
/// Units: Position is canvas units, Rotation degrees, ScaleX/ScaleY and
/// Opacity percent (100 = identity), PerspectiveX/PerspectiveY degrees at
/// a *1000 scale as stored by the editor UI.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum KeyframeValue {
    Position([f32; 2]),
    Rotation(f32),
    ScaleX(f32),
    ScaleY(f32),
    PerspectiveX(f32),
    PerspectiveY(f32),
    Opacity(f32),
    Zoom(ZoomValue),
    Custom(Vec<f32>),
}

#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
pub fn lerp_vec2(a: [f32; 2], b: [f32; 2], t: f32) -> [f32; 2] {
    [lerp_f32(a[0], b[0], t), lerp_f32(a[1], b[1], t)]
}

impl KeyframeValue {
    /// Component-wise linear blend between two values of the same tag.
    /// Mismatched tags fail soft to the left value.
    pub fn lerp(&self, other: &KeyframeValue, t: f32) -> KeyframeValue {
        use KeyframeValue::*;
        match (self, other) {
            (Position(a), Position(b)) => Position(lerp_vec2(*a, *b, t)),
            (Rotation(a), Rotation(b)) => Rotation(lerp_f32(*a, *b, t)),
            (ScaleX(a), ScaleX(b)) => ScaleX(lerp_f32(*a, *b, t)),
            (ScaleY(a), ScaleY(b)) => ScaleY(lerp_f32(*a, *b, t)),
            (PerspectiveX(a), PerspectiveX(b)) => PerspectiveX(lerp_f32(*a, *b, t)),
            (PerspectiveY(a), PerspectiveY(b)) => PerspectiveY(lerp_f32(*a, *b, t)),
            (Opacity(a), Opacity(b)) => Opacity(lerp_f32(*a, *b, t)),
            (Zoom(a), Zoom(b)) => Zoom(ZoomValue {
                position: lerp_vec2(a.position, b.position, t),
                zoom_level: lerp_f32(a.zoom_level, b.zoom_level, t),
            }),
            (Custom(a), Custom(b)) if a.len() == b.len() => Custom(
                a.iter()
                    .zip(b.iter())
                    .map(|(x, y)| lerp_f32(*x, *y, t))
                    .collect(),
            ),
            _ => self.clone(),
        }
    }

    /// The Position payload, if this value is a Position.
    pub fn as_position(&self) -> Option<[f32; 2]> {
        match self {
            KeyframeValue::Position(p) => Some(*p),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_endpoints_are_exact() {
        let a = KeyframeValue::Position([0.0, 10.0]);
        let b = KeyframeValue::Position([100.0, -10.0]);
        assert_eq!(a.lerp(&b, 0.0), a);
        assert_eq!(a.lerp(&b, 1.0), b);
    }

    #[test]
    fn mismatched_tags_keep_left() {
        let a = KeyframeValue::Rotation(45.0);
        let b = KeyframeValue::Opacity(50.0);
        assert_eq!(a.lerp(&b, 0.5), a);
    }
}
