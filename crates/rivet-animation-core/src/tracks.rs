//! Timeline data model: per-channel tracks, per-object animations, and
//! sequences. Field names are the wire contract (`durationMs`,
//! `startTimeMs`, `propertyPath`, `polygonMotionPaths`, ...).
//!
//! Keyframe lists keep a sorted-by-time invariant at mutation time so the
//! interpolator never re-sorts on the per-frame path. Duplicate times are
//! allowed and keep insertion order (stable sort).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;
use crate::keyframe::Keyframe;

/// One timeline track for a single animatable channel of one object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationProperty {
    pub name: String,
    pub property_path: String,
    pub keyframes: Vec<Keyframe>,
    /// Nested/grouped properties; unused by the core algorithms.
    #[serde(default)]
    pub children: Vec<AnimationProperty>,
    #[serde(default)]
    pub depth: u32,
}

impl AnimationProperty {
    pub fn new(name: &str, property_path: &str, keyframes: Vec<Keyframe>) -> Self {
        let mut prop = Self {
            name: name.to_string(),
            property_path: property_path.to_string(),
            keyframes,
            children: Vec::new(),
            depth: 0,
        };
        prop.sort_keyframes();
        prop
    }

    /// Restore the sorted invariant after bulk edits or deserialization.
    pub fn sort_keyframes(&mut self) {
        self.keyframes.sort_by_key(|k| k.time);
        for child in &mut self.children {
            child.sort_keyframes();
        }
    }

    /// Insert keeping time order; an equal time lands after existing ones.
    pub fn insert_keyframe(&mut self, keyframe: Keyframe) {
        let at = self.keyframes.partition_point(|k| k.time <= keyframe.time);
        self.keyframes.insert(at, keyframe);
    }

    /// Move a keyframe to a new time, preserving order. Returns false when
    /// the id is unknown.
    pub fn update_keyframe_time(&mut self, id: &str, new_time: u32) -> bool {
        let Some(idx) = self.keyframes.iter().position(|k| k.id == id) else {
            return false;
        };
        let mut keyframe = self.keyframes.remove(idx);
        keyframe.time = new_time;
        self.insert_keyframe(keyframe);
        true
    }

    pub fn remove_keyframe(&mut self, id: &str) -> Option<Keyframe> {
        let idx = self.keyframes.iter().position(|k| k.id == id)?;
        Some(self.keyframes.remove(idx))
    }
}

/// Kind of canvas object an animation targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectType {
    Polygon,
    TextItem,
    ImageItem,
    VideoItem,
}

/// Keyframe tracks for one animated object within a sequence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationData {
    pub id: String,
    pub object_type: ObjectType,
    /// Id of the target object (kept as `polygonId` on the wire for
    /// historical reasons; it references any object kind).
    pub polygon_id: String,
    pub duration_ms: u32,
    pub start_time_ms: u32,
    /// Static group offset added to every interpolated Position value.
    pub position: [f32; 2],
    pub properties: Vec<AnimationProperty>,
}

impl AnimationData {
    pub fn new(object_type: ObjectType, polygon_id: &str, duration_ms: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            object_type,
            polygon_id: polygon_id.to_string(),
            duration_ms,
            start_time_ms: 0,
            position: [0.0, 0.0],
            properties: Vec::new(),
        }
    }

    /// The Position property, if present.
    pub fn position_property(&self) -> Option<&AnimationProperty> {
        self.properties
            .iter()
            .find(|p| p.name.starts_with("Position"))
    }

    pub fn sort_keyframes(&mut self) {
        for property in &mut self.properties {
            property.sort_keyframes();
        }
    }
}

/// Sequence background.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum BackgroundFill {
    Color([f32; 4]),
}

/// A saved canvas item (minimal record: the engine only needs identity).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedItemConfig {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// One composition: active items plus their keyframe animations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sequence {
    pub id: String,
    pub duration_ms: u32,
    #[serde(default)]
    pub active_polygons: Vec<SavedItemConfig>,
    #[serde(default)]
    pub active_text_items: Vec<SavedItemConfig>,
    #[serde(default)]
    pub active_image_items: Vec<SavedItemConfig>,
    #[serde(default)]
    pub active_video_items: Vec<SavedItemConfig>,
    #[serde(default)]
    pub polygon_motion_paths: Vec<AnimationData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_fill: Option<BackgroundFill>,
}

impl Sequence {
    pub fn new(duration_ms: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            duration_ms,
            active_polygons: Vec::new(),
            active_text_items: Vec::new(),
            active_image_items: Vec::new(),
            active_video_items: Vec::new(),
            polygon_motion_paths: Vec::new(),
            background_fill: None,
        }
    }

    /// Whether an animation's target id is present in the matching
    /// active-item list. The stepper skips dangling references; this
    /// exists so hosts can surface them at load time.
    pub fn references_active_item(&self, animation: &AnimationData) -> bool {
        let items = match animation.object_type {
            ObjectType::Polygon => &self.active_polygons,
            ObjectType::TextItem => &self.active_text_items,
            ObjectType::ImageItem => &self.active_image_items,
            ObjectType::VideoItem => &self.active_video_items,
        };
        items.iter().any(|item| item.id == animation.polygon_id)
    }

    /// Basic invariants: non-zero duration, range keyframes that end after
    /// they start. Dangling animation references are reported, not fatal.
    pub fn validate(&self) -> Result<Vec<String>, EngineError> {
        if self.duration_ms == 0 {
            return Err(EngineError::InvalidSequence(format!(
                "sequence {} has zero duration",
                self.id
            )));
        }
        for animation in &self.polygon_motion_paths {
            for property in &animation.properties {
                for keyframe in &property.keyframes {
                    if keyframe.end_time() < keyframe.time {
                        return Err(EngineError::InvalidSequence(format!(
                            "keyframe {} in {} ends before it starts",
                            keyframe.id, property.property_path
                        )));
                    }
                }
            }
        }
        let dangling = self
            .polygon_motion_paths
            .iter()
            .filter(|anim| !self.references_active_item(anim))
            .map(|anim| anim.polygon_id.clone())
            .collect();
        Ok(dangling)
    }

    pub fn sort_keyframes(&mut self) {
        for animation in &mut self.polygon_motion_paths {
            animation.sort_keyframes();
        }
    }
}
