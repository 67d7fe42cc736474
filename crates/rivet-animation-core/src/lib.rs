//! Rivet Animation Core (renderer-agnostic)
//!
//! Keyframe timeline engine for a canvas video-composition editor:
//! keyframe data model, bracketing interpolator, sequence stepper with
//! video frame cadence, motion-path visualization builder, and the
//! prediction-to-keyframe motion generator.

pub mod config;
pub mod error;
pub mod interp;
pub mod keyframe;
pub mod motion_path;
pub mod predict;
pub mod stepper;
pub mod stored;
pub mod timeline;
pub mod tracks;
pub mod value;

// Re-exports for consumers (adapters)
pub use config::CanvasConfig;
pub use error::EngineError;
pub use interp::{evaluate, resolve_bracket, resolve_bracket_wrapping};
pub use keyframe::{
    ControlPoint, CurveData, EasingType, KeyType, Keyframe, PathType, RangeData,
};
pub use motion_path::{build_motion_path, MotionPath, PathShape, PathShapeKind};
pub use predict::{
    generate_motion_paths, is_overlapping, resolve_overlaps, BoundingBox, GenerationConfig,
    KeyframeCount, PredictionTarget,
};
pub use stepper::{
    CursorSample, MediaDecoder, ObjectRef, ObjectTransform, Renderer, Scene, SceneObject,
    StepContext, Stepper, VideoObject,
};
pub use stored::{
    parse_saved_state_json, parse_sequence_json, parse_timeline_json, to_saved_state_json,
    to_timeline_json, SavedState,
};
pub use timeline::{SavedTimelineConfig, TimelineSequence, TrackType};
pub use tracks::{
    AnimationData, AnimationProperty, BackgroundFill, ObjectType, SavedItemConfig, Sequence,
};
pub use value::{KeyframeValue, ZoomValue};
