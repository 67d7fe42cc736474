//! Motion path visualization: drawable handle/segment/arrow shapes for one
//! object's Position track.
//!
//! Paths are derived state. They are rebuilt wholesale whenever the owning
//! sequence's selection or keyframes change and never patched in place;
//! each shape carries id back-references (object id, keyframe id, path id)
//! so a dragged handle can be mapped back to the keyframe it came from
//! without holding a live pointer into the sequence.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::interp::evaluate;
use crate::keyframe::{EasingType, KeyType, Keyframe};
use crate::tracks::AnimationData;

/// Subdivisions per keyframe pair for eased segments. Linear pairs need a
/// single straight segment.
const EASED_SEGMENTS: u32 = 9;

/// Rotation marker distinguishing "hold" (Range) handles from plain
/// frame handles.
const RANGE_HANDLE_ROTATION: f32 = 45.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathShapeKind {
    Handle,
    Segment,
    Arrow,
}

/// One drawable shape of a motion path, positioned in keyframe space.
/// The owning path's `group_position` re-homes every shape at draw time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathShape {
    pub id: String,
    pub kind: PathShapeKind,
    pub position: [f32; 2],
    /// Degrees. Segments/arrows: heading between the sampled points.
    /// Handles: 0, or 45 for Range starts.
    pub rotation: f32,
    /// Segment length between its two sampled points; 0 for handles.
    pub length: f32,
    pub source_object_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_keyframe_id: Option<String>,
    pub source_path_id: String,
}

/// The full drawable path for one animated object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionPath {
    pub id: String,
    pub associated_polygon_id: String,
    /// Canvas position of the source object; moves the whole path rigidly.
    pub group_position: [f32; 2],
    pub shapes: Vec<PathShape>,
}

fn handle_shape(keyframe: &Keyframe, object_id: &str, path_id: &str) -> Option<PathShape> {
    let position = keyframe.value.as_position()?;
    let rotation = match keyframe.key_type {
        KeyType::Range(_) => RANGE_HANDLE_ROTATION,
        KeyType::Frame => 0.0,
    };
    Some(PathShape {
        id: Uuid::new_v4().to_string(),
        kind: PathShapeKind::Handle,
        position,
        rotation,
        length: 0.0,
        source_object_id: object_id.to_string(),
        source_keyframe_id: Some(keyframe.id.clone()),
        source_path_id: path_id.to_string(),
    })
}

/// Build the drawable path for one animation's Position track. Returns
/// None when the track is missing or has fewer than two keyframes.
pub fn build_motion_path(animation: &AnimationData, group_position: [f32; 2]) -> Option<MotionPath> {
    let property = animation.position_property()?;
    if property.keyframes.len() < 2 {
        return None;
    }

    let mut keyframes = property.keyframes.clone();
    keyframes.sort_by_key(|k| k.time);

    let path_id = animation.id.clone();
    let object_id = animation.polygon_id.clone();
    let mut shapes = Vec::new();

    for (pair_idx, pair) in keyframes.windows(2).enumerate() {
        let (start, end) = (&pair[0], &pair[1]);

        if pair_idx == 0 {
            if let Some(handle) = handle_shape(start, &object_id, &path_id) {
                shapes.push(handle);
            }
        }
        if let Some(handle) = handle_shape(end, &object_id, &path_id) {
            shapes.push(handle);
        }

        let (Some(_), Some(_)) = (start.value.as_position(), end.value.as_position()) else {
            continue;
        };

        let segments = if start.easing == EasingType::Linear {
            1
        } else {
            EASED_SEGMENTS
        };
        let span = end.time.saturating_sub(start.time) as f32;

        for s in 0..segments {
            let t0 = start.time + (span * s as f32 / segments as f32) as u32;
            let t1 = start.time + (span * (s + 1) as f32 / segments as f32) as u32;
            let Some(p0) = evaluate(start, end, t0).as_position() else {
                continue;
            };
            let Some(p1) = evaluate(start, end, t1).as_position() else {
                continue;
            };

            let dx = p1[0] - p0[0];
            let dy = p1[1] - p0[1];
            let length = (dx * dx + dy * dy).sqrt();
            let rotation = dy.atan2(dx).to_degrees();
            let midpoint = [(p0[0] + p1[0]) / 2.0, (p0[1] + p1[1]) / 2.0];

            shapes.push(PathShape {
                id: Uuid::new_v4().to_string(),
                kind: PathShapeKind::Segment,
                position: midpoint,
                rotation,
                length,
                source_object_id: object_id.clone(),
                source_keyframe_id: Some(start.id.clone()),
                source_path_id: path_id.clone(),
            });

            // Direction arrow on every other segment.
            if s % 2 == 0 {
                shapes.push(PathShape {
                    id: Uuid::new_v4().to_string(),
                    kind: PathShapeKind::Arrow,
                    position: midpoint,
                    rotation,
                    length: 0.0,
                    source_object_id: object_id.clone(),
                    source_keyframe_id: None,
                    source_path_id: path_id.clone(),
                });
            }
        }
    }

    Some(MotionPath {
        id: path_id,
        associated_polygon_id: object_id,
        group_position,
        shapes,
    })
}
