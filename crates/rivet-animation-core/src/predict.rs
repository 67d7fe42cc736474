//! Predictive motion generation: turn a flat vector of model predictions
//! into full keyframe tracks, plus the box-overlap relaxation shared with
//! layout prediction.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::config::CanvasConfig;
use crate::keyframe::{EasingType, KeyType, Keyframe, PathType, RangeData};
use crate::tracks::{AnimationData, AnimationProperty, ObjectType};
use crate::value::{KeyframeValue, ZoomValue};

/// Floats per prediction slot: `[headerA, headerB, width%, height%, x%,
/// y%, direction]`.
pub const NUM_INFERENCE_FEATURES: usize = 7;
/// Prediction slots per object.
pub const KEYFRAMES_PER_OBJECT: usize = 6;

/// Default track length for non-video objects, in milliseconds.
pub const DEFAULT_DURATION_MS: u32 = 20_000;

/// Millisecond deltas for the six candidate timestamps: the first three
/// are from the start, the last three from the end of the duration.
const TIMESTAMP_DIFFS: [f32; 6] = [0.0, 2500.0, 5000.0, -5000.0, -2500.0, 0.0];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyframeCount {
    Six,
    Four,
}

/// Generation switches, as the editor exposes them.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Copy the elected object's path shape onto every object.
    pub choreographed: bool,
    /// Attach default Bezier arcs to every adjacent keyframe pair.
    pub curved: bool,
    /// Fade opacity to zero at the first and last keyframe.
    pub fade: bool,
    pub count: KeyframeCount,
    pub canvas: CanvasConfig,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            choreographed: false,
            curved: false,
            fade: false,
            count: KeyframeCount::Six,
            canvas: CanvasConfig::default(),
        }
    }
}

/// A live object the generator targets. `position` is canvas space with
/// viewport offsets already removed; video items pass their source
/// duration, everything else `DEFAULT_DURATION_MS`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionTarget {
    pub id: String,
    pub object_type: ObjectType,
    pub position: [f32; 2],
    pub duration_ms: u32,
}

impl PredictionTarget {
    pub fn new(id: &str, object_type: ObjectType, position: [f32; 2]) -> Self {
        Self {
            id: id.to_string(),
            object_type,
            position,
            duration_ms: DEFAULT_DURATION_MS,
        }
    }
}

/// Predicted canvas position for one object slot, or None when the vector
/// is too short for the requested indices.
fn predicted_position(
    predictions: &[f32],
    object_idx: usize,
    slot_idx: usize,
    canvas: &CanvasConfig,
) -> Option<[f32; 2]> {
    let base = object_idx * (NUM_INFERENCE_FEATURES * KEYFRAMES_PER_OBJECT)
        + slot_idx * NUM_INFERENCE_FEATURES;
    if base + 5 >= predictions.len() {
        return None;
    }
    Some([
        ((predictions[base + 4] * 0.01) * canvas.width).round(),
        ((predictions[base + 5] * 0.01) * canvas.height).round(),
    ])
}

/// Predicted canvas footprint for one object slot, or None when the
/// vector is too short for the requested indices.
fn predicted_size(
    predictions: &[f32],
    object_idx: usize,
    slot_idx: usize,
    canvas: &CanvasConfig,
) -> Option<[f32; 2]> {
    let base = object_idx * (NUM_INFERENCE_FEATURES * KEYFRAMES_PER_OBJECT)
        + slot_idx * NUM_INFERENCE_FEATURES;
    if base + 3 >= predictions.len() {
        return None;
    }
    Some([
        (predictions[base + 2] * 0.01) * canvas.width,
        (predictions[base + 3] * 0.01) * canvas.height,
    ])
}

/// Elect the object whose six predicted positions trace the longest total
/// path. Raw pixel distances, no duration normalization: amplitude wins
/// over speed. Deterministic for identical inputs (first maximum wins).
fn elect_longest_path(
    predictions: &[f32],
    num_objects: usize,
    canvas: &CanvasConfig,
) -> Option<usize> {
    let mut longest = None;
    let mut max_distance = 0.0f32;

    for object_idx in 0..num_objects {
        let mut path_length = 0.0f32;
        let mut prev: Option<[f32; 2]> = None;

        for slot_idx in 0..KEYFRAMES_PER_OBJECT {
            let Some(p) = predicted_position(predictions, object_idx, slot_idx, canvas) else {
                continue;
            };
            if let Some(q) = prev {
                let dx = p[0] - q[0];
                let dy = p[1] - q[1];
                path_length += (dx * dx + dy * dy).sqrt();
            }
            prev = Some(p);
        }

        if path_length > max_distance {
            max_distance = path_length;
            longest = Some(object_idx);
        }
    }

    longest
}

fn aux_keyframes(timestamps: &[f32], value_at: impl Fn(usize) -> KeyframeValue) -> Vec<Keyframe> {
    timestamps
        .iter()
        .enumerate()
        .map(|(i, &t)| Keyframe::new(t as u32, value_at(i), EasingType::EaseInOut))
        .collect()
}

/// Synthesize keyframe tracks for every target from a flat prediction
/// vector. Objects whose prediction rows run out of range are skipped.
/// Paths whose starting footprints land on top of each other are pushed
/// apart with the box relaxation before they are returned.
pub fn generate_motion_paths(
    predictions: &[f32],
    targets: &[PredictionTarget],
    cfg: &GenerationConfig,
) -> Vec<AnimationData> {
    let num_objects = predictions.len() / (NUM_INFERENCE_FEATURES * KEYFRAMES_PER_OBJECT);

    let elected = if cfg.choreographed {
        elect_longest_path(predictions, num_objects, &cfg.canvas)
    } else {
        None
    };

    let mut animations = Vec::new();
    let mut footprints = Vec::new();

    for (object_idx, target) in targets.iter().enumerate() {
        let total_duration = target.duration_ms as f32;
        let timestamps: Vec<f32> = TIMESTAMP_DIFFS
            .iter()
            .enumerate()
            .map(|(i, &diff)| if i < 3 { diff } else { total_duration + diff })
            .collect();

        let path_source_idx = if cfg.choreographed {
            elected.unwrap_or(object_idx)
        } else {
            object_idx
        };

        // Anchor the predicted path through the object's true current
        // position: offset from the elected source's third sample.
        let Some(center) = predicted_position(predictions, path_source_idx, 2, &cfg.canvas) else {
            warn!(
                "prediction vector too short for object {} (source {}), skipping",
                target.id, path_source_idx
            );
            continue;
        };
        let offset = [target.position[0] - center[0], target.position[1] - center[1]];

        let mut position_keyframes: Vec<Keyframe> = Vec::new();
        for slot_idx in 0..KEYFRAMES_PER_OBJECT {
            if cfg.count == KeyframeCount::Four && (slot_idx == 1 || slot_idx == 4) {
                continue;
            }
            let Some(p) = predicted_position(predictions, path_source_idx, slot_idx, &cfg.canvas)
            else {
                continue;
            };
            position_keyframes.push(Keyframe::new(
                timestamps[slot_idx] as u32,
                KeyframeValue::Position([p[0] + offset[0], p[1] + offset[1]]),
                EasingType::EaseInOut,
            ));
        }

        // Collapse the middle pair into a single held Range keyframe:
        // "hold then move" instead of continuous drift.
        if position_keyframes.len() == 6 {
            let end_time = position_keyframes[3].time;
            position_keyframes[2].key_type = KeyType::Range(RangeData { end_time });
            position_keyframes.remove(3);
        }
        if position_keyframes.len() == 4 {
            let end_time = position_keyframes[2].time;
            position_keyframes[1].key_type = KeyType::Range(RangeData { end_time });
            position_keyframes.remove(2);
        }

        if cfg.curved {
            for i in 0..position_keyframes.len().saturating_sub(1) {
                let next = position_keyframes[i + 1].clone();
                let prev = &mut position_keyframes[i];
                if let Some(curve) = prev.calculate_default_curve(&next) {
                    prev.curve_data = Some(curve);
                    prev.path_type = PathType::Bezier;
                }
            }
        }

        if position_keyframes.is_empty() {
            continue;
        }

        let last = timestamps.len() - 1;
        let fade = cfg.fade;
        let mut properties = vec![
            AnimationProperty::new("Position", "position", position_keyframes),
            AnimationProperty::new(
                "Rotation",
                "rotation",
                aux_keyframes(&timestamps, |_| KeyframeValue::Rotation(0.0)),
            ),
            AnimationProperty::new(
                "Scale X",
                "scale_x",
                aux_keyframes(&timestamps, |_| KeyframeValue::ScaleX(100.0)),
            ),
            AnimationProperty::new(
                "Scale Y",
                "scale_y",
                aux_keyframes(&timestamps, |_| KeyframeValue::ScaleY(100.0)),
            ),
            AnimationProperty::new(
                "Opacity",
                "opacity",
                aux_keyframes(&timestamps, |i| {
                    let opacity = if fade && (i == 0 || i == last) {
                        0.0
                    } else {
                        100.0
                    };
                    KeyframeValue::Opacity(opacity)
                }),
            ),
        ];

        if target.object_type == ObjectType::VideoItem {
            let zoom_center = target.position;
            properties.push(AnimationProperty::new(
                "Zoom / Popout",
                "zoom",
                aux_keyframes(&timestamps, |i| {
                    let level = if i == 0 || i == last { 100.0 } else { 135.0 };
                    KeyframeValue::Zoom(ZoomValue {
                        position: zoom_center,
                        zoom_level: level,
                    })
                }),
            ));
        }

        let mut animation = AnimationData::new(target.object_type, &target.id, target.duration_ms);
        animation.properties = properties;
        animations.push(animation);
        footprints.push(
            predicted_size(predictions, object_idx, 0, &cfg.canvas).unwrap_or([100.0, 100.0]),
        );
    }

    separate_first_samples(&mut animations, &footprints);
    animations
}

/// Relax the generated paths so no two start on top of each other: box
/// each animation's first position sample with its predicted footprint,
/// run the overlap solver, and shift whole tracks by the resulting delta.
fn separate_first_samples(animations: &mut [AnimationData], footprints: &[[f32; 2]]) {
    let mut boxes: Vec<BoundingBox> = animations
        .iter()
        .zip(footprints)
        .map(|(animation, size)| {
            let center = animation
                .position_property()
                .and_then(|p| p.keyframes.first())
                .and_then(|k| k.value.as_position())
                .unwrap_or([0.0, 0.0]);
            BoundingBox::new(
                [center[0] - size[0] / 2.0, center[1] - size[1] / 2.0],
                [center[0] + size[0] / 2.0, center[1] + size[1] / 2.0],
            )
        })
        .collect();
    let before: Vec<[f32; 2]> = boxes.iter().map(BoundingBox::center).collect();

    resolve_overlaps(&mut boxes);

    for ((animation, resolved), original) in animations.iter_mut().zip(&boxes).zip(&before) {
        let after = resolved.center();
        let delta = [after[0] - original[0], after[1] - original[1]];
        if delta == [0.0, 0.0] {
            continue;
        }
        for property in &mut animation.properties {
            if !property.name.starts_with("Position") {
                continue;
            }
            for keyframe in &mut property.keyframes {
                if let KeyframeValue::Position(p) = &mut keyframe.value {
                    p[0] += delta[0];
                    p[1] += delta[1];
                }
            }
        }
    }
}

// ---- overlap resolution (shared with layout prediction) ----

/// Margin within which two boxes count as overlapping.
pub const OVERLAP_MARGIN: f32 = 10.0;
/// Units each box is pushed per relaxation step.
const SEPARATION_STEP: f32 = 20.0;
/// Relaxation pass cap. Deliberately "good enough": the solver is damped,
/// not guaranteed to converge.
const MAX_RESOLUTION_PASSES: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: [f32; 2],
    pub max: [f32; 2],
}

impl BoundingBox {
    pub fn new(min: [f32; 2], max: [f32; 2]) -> Self {
        Self { min, max }
    }

    pub fn center(&self) -> [f32; 2] {
        [
            (self.min[0] + self.max[0]) / 2.0,
            (self.min[1] + self.max[1]) / 2.0,
        ]
    }

    pub fn translate(&mut self, delta: [f32; 2]) {
        self.min[0] += delta[0];
        self.min[1] += delta[1];
        self.max[0] += delta[0];
        self.max[1] += delta[1];
    }
}

/// Axis-aligned overlap test with a slack margin.
pub fn is_overlapping(a: &BoundingBox, b: &BoundingBox, margin: f32) -> bool {
    a.min[0] < b.max[0] + margin
        && a.max[0] > b.min[0] - margin
        && a.min[1] < b.max[1] + margin
        && a.max[1] > b.min[1] - margin
}

/// Push overlapping boxes apart along their center-to-center vector, a
/// fixed step per pass, for at most `MAX_RESOLUTION_PASSES` passes.
/// Coincident centers separate along +x.
pub fn resolve_overlaps(boxes: &mut [BoundingBox]) {
    for _ in 0..MAX_RESOLUTION_PASSES {
        let mut any_overlap = false;

        for i in 0..boxes.len() {
            for j in (i + 1)..boxes.len() {
                if !is_overlapping(&boxes[i], &boxes[j], OVERLAP_MARGIN) {
                    continue;
                }
                any_overlap = true;

                let ca = boxes[i].center();
                let cb = boxes[j].center();
                let dx = cb[0] - ca[0];
                let dy = cb[1] - ca[1];
                let len = (dx * dx + dy * dy).sqrt();
                let dir = if len <= f32::EPSILON {
                    [1.0, 0.0]
                } else {
                    [dx / len, dy / len]
                };

                boxes[i].translate([-dir[0] * SEPARATION_STEP, -dir[1] * SEPARATION_STEP]);
                boxes[j].translate([dir[0] * SEPARATION_STEP, dir[1] * SEPARATION_STEP]);
            }
        }

        if !any_overlap {
            break;
        }
    }
}
