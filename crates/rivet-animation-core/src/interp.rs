//! Bracket resolution and keyframe evaluation.
//!
//! `resolve_bracket` walks a pre-sorted keyframe list (the model keeps the
//! sorted invariant at mutation time) and materializes a virtual keyframe
//! where Range semantics demand one. `evaluate` turns a bracket plus the
//! current time into an eased, path-shaped value.

use crate::keyframe::{CurveData, EasingType, KeyType, Keyframe, PathType};
use crate::value::KeyframeValue;

/// Id given to virtual keyframes synthesized for Range boundaries.
pub const VIRTUAL_KEYFRAME_ID: &str = "virtual";

fn virtual_frame_at(time: u32, value: KeyframeValue) -> Keyframe {
    Keyframe {
        id: VIRTUAL_KEYFRAME_ID.to_string(),
        time,
        value,
        // Easing/path are irrelevant for a static range boundary.
        easing: EasingType::Linear,
        path_type: PathType::Linear,
        curve_data: None,
        key_type: KeyType::Frame,
    }
}

/// Resolve the two keyframes bracketing `time` (milliseconds).
///
/// When the previous keyframe is a Range: inside `[time, end_time)` the
/// bracket is `(range, virtual(end_time))` so the value holds; inside
/// `[end_time, next.time)` it is `(virtual(end_time), next)` so evaluation
/// continues toward the next real keyframe. Past the last keyframe there
/// is no bracket and the caller must no-op.
pub fn resolve_bracket(keyframes: &[Keyframe], time: u32) -> Option<(Keyframe, Keyframe)> {
    debug_assert!(
        keyframes.windows(2).all(|w| w[0].time <= w[1].time),
        "keyframes must be pre-sorted by time"
    );

    for (i, frame) in keyframes.iter().enumerate() {
        if frame.time > time {
            if i > 0 {
                let prev = &keyframes[i - 1];
                if let KeyType::Range(range) = prev.key_type {
                    if time >= prev.time && time < range.end_time {
                        let hold = virtual_frame_at(range.end_time, prev.value.clone());
                        return Some((prev.clone(), hold));
                    }
                    if time >= range.end_time && time < frame.time {
                        let hold = virtual_frame_at(range.end_time, prev.value.clone());
                        return Some((hold, frame.clone()));
                    }
                }
                return Some((prev.clone(), frame.clone()));
            }
            // Before the first keyframe: treat the list as circular, the
            // same way the path overlay does.
            return Some((keyframes[keyframes.len() - 1].clone(), frame.clone()));
        }
    }

    None
}

/// Like `resolve_bracket`, but past the end returns `(last, first)`.
/// Wrap semantics are used only by the path visualization, never by live
/// playback.
pub fn resolve_bracket_wrapping(keyframes: &[Keyframe], time: u32) -> Option<(Keyframe, Keyframe)> {
    if keyframes.is_empty() {
        return None;
    }
    if let Some(bracket) = resolve_bracket(keyframes, time) {
        return Some(bracket);
    }
    Some((
        keyframes[keyframes.len() - 1].clone(),
        keyframes[0].clone(),
    ))
}

#[inline]
fn cubic_bezier(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let u = 1.0 - t;
    u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
}

/// Position-space cubic Bezier between two keyframes. Missing control
/// points fall back to linear thirds.
fn bezier_position(
    start: [f32; 2],
    end: [f32; 2],
    curve: Option<&CurveData>,
    t: f32,
) -> [f32; 2] {
    let third = |frac: f32| {
        [
            start[0] + (end[0] - start[0]) * frac,
            start[1] + (end[1] - start[1]) * frac,
        ]
    };
    let p1 = curve
        .and_then(|c| c.control_point1.as_ref())
        .map(|cp| [cp.x, cp.y])
        .unwrap_or_else(|| third(0.33));
    let p2 = curve
        .and_then(|c| c.control_point2.as_ref())
        .map(|cp| [cp.x, cp.y])
        .unwrap_or_else(|| third(0.66));

    [
        cubic_bezier(start[0], p1[0], p2[0], end[0], t),
        cubic_bezier(start[1], p1[1], p2[1], end[1], t),
    ]
}

/// Eased progress of `time` through the bracket. A zero-length bracket
/// snaps to the end value.
fn bracket_progress(start: &Keyframe, end: &Keyframe, time: u32) -> f32 {
    if end.time <= start.time {
        return 1.0;
    }
    let span = (end.time - start.time) as f32;
    let elapsed = time.saturating_sub(start.time) as f32;
    start.easing.apply(elapsed / span)
}

/// Evaluate a bracket at `time` (milliseconds).
///
/// Position keyframes with `PathType::Bezier` follow their cubic curve;
/// every other channel lerps component-wise regardless of path type.
pub fn evaluate(start: &Keyframe, end: &Keyframe, time: u32) -> KeyframeValue {
    let progress = bracket_progress(start, end, time);

    match (&start.value, &end.value) {
        (KeyframeValue::Position(a), KeyframeValue::Position(b))
            if start.path_type == PathType::Bezier =>
        {
            KeyframeValue::Position(bezier_position(*a, *b, start.curve_data.as_ref(), progress))
        }
        _ => start.value.lerp(&end.value, progress),
    }
}
