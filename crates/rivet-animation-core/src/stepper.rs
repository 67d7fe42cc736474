//! Sequence stepper: owns "now" for a playing composition.
//!
//! Each tick walks every animated object's animated properties, asks the
//! interpolator for a value, and writes it into the renderer. Video
//! objects additionally pace their decoder against the playback clock and
//! smooth their zoom focus point.
//!
//! The stepper is single-threaded and cooperative: ticks happen inside the
//! host's render callback, and all scene/renderer mutation goes through
//! the explicit `StepContext` handed to `tick`.

use log::debug;

use crate::config::CanvasConfig;
use crate::error::EngineError;
use crate::interp::{evaluate, resolve_bracket};
use crate::timeline::SavedTimelineConfig;
use crate::tracks::{AnimationData, ObjectType, Sequence};
use crate::value::KeyframeValue;

/// Hard cap on catch-up decodes per tick. Bounds the stall a slow decoder
/// can cause inside one render callback; remaining catch-up is deferred.
pub const MAX_CATCH_UP_FRAMES: u32 = 5;

/// Minimum wall-clock gap before the pan-follow window may re-target.
const FOLLOW_RETARGET_MS: u32 = 150;
/// Minimum endpoint movement that forces a re-target within the gap.
const FOLLOW_RETARGET_DISTANCE: f32 = 30.0;
/// Constant lag applied when picking cursor samples for the window.
const FOLLOW_DELAY_OFFSET_MS: u32 = 500;
const FOLLOW_ALPHA_MIN: f32 = 0.005;
const FOLLOW_ALPHA_MAX: f32 = 0.05;
const FOLLOW_ALPHA_SCALING: f32 = 0.01;

/// Identifies one renderer write target. `backdrop` is set only for the
/// background shape behind a text item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectRef {
    pub ty: ObjectType,
    pub id: String,
    pub backdrop: bool,
}

impl ObjectRef {
    pub fn new(ty: ObjectType, id: &str) -> Self {
        Self {
            ty,
            id: id.to_string(),
            backdrop: false,
        }
    }

    pub fn text_backdrop(id: &str) -> Self {
        Self {
            ty: ObjectType::TextItem,
            id: id.to_string(),
            backdrop: true,
        }
    }
}

/// Write surface the engine drives. Implementations own the GPU side; the
/// engine never sees a buffer or texture.
pub trait Renderer {
    fn set_transform(
        &mut self,
        target: &ObjectRef,
        position: [f32; 2],
        rotation: f32,
        scale_x: f32,
        scale_y: f32,
    );
    fn set_opacity(&mut self, target: &ObjectRef, opacity: f32);
    fn set_zoom(&mut self, target: &ObjectRef, level: f32, center: [f32; 2]);
}

/// One decoded-frame step. Advancing is the decoder's business; the
/// stepper only decides when to ask.
pub trait MediaDecoder {
    fn draw_frame(&mut self) -> Result<(), EngineError>;
}

/// Last-written transform state for one object. The stepper interpolates
/// channels independently, so it keeps the full tuple here and writes it
/// whole on every change.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObjectTransform {
    pub position: [f32; 2],
    pub rotation: f32,
    pub scale_x: f32,
    pub scale_y: f32,
}

impl Default for ObjectTransform {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0],
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }
}

/// A live canvas object as the stepper sees it.
#[derive(Clone, Debug)]
pub struct SceneObject {
    pub id: String,
    pub transform: ObjectTransform,
    pub hidden: bool,
}

impl SceneObject {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            transform: ObjectTransform::default(),
            hidden: false,
        }
    }
}

/// A cursor sample from the source recording, canvas space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CursorSample {
    pub time_ms: u32,
    pub position: [f32; 2],
}

/// Pan-follow smoothing state. Re-targeting is throttled; the displayed
/// center is blended, never snapped.
#[derive(Clone, Copy, Debug, Default)]
struct FollowState {
    last_shift_ms: Option<u32>,
    window_start: Option<CursorSample>,
    window_end: Option<CursorSample>,
    alpha: f32,
    last_center: Option<[f32; 2]>,
}

/// A live video object: a scene object plus decode pacing and follow
/// state.
pub struct VideoObject {
    pub object: SceneObject,
    pub source_frame_rate: f32,
    pub source_duration_ms: u32,
    pub num_frames_drawn: u32,
    pub cursor_track: Vec<CursorSample>,
    pub decoder: Option<Box<dyn MediaDecoder>>,
    follow: FollowState,
}

impl VideoObject {
    pub fn new(id: &str, source_frame_rate: f32, source_duration_ms: u32) -> Self {
        Self {
            object: SceneObject::new(id),
            source_frame_rate,
            source_duration_ms,
            num_frames_drawn: 0,
            cursor_track: Vec::new(),
            decoder: None,
            follow: FollowState::default(),
        }
    }
}

/// All live objects, split by kind. Drag/selection state lives with the
/// editor, not here; this is only what the stepper writes to.
#[derive(Default)]
pub struct Scene {
    pub polygons: Vec<SceneObject>,
    pub text_items: Vec<SceneObject>,
    pub image_items: Vec<SceneObject>,
    pub video_items: Vec<VideoObject>,
}

impl Scene {
    fn object_mut(&mut self, ty: ObjectType, id: &str) -> Option<&mut SceneObject> {
        match ty {
            ObjectType::Polygon => self.polygons.iter_mut().find(|o| o.id == id),
            ObjectType::TextItem => self.text_items.iter_mut().find(|o| o.id == id),
            ObjectType::ImageItem => self.image_items.iter_mut().find(|o| o.id == id),
            ObjectType::VideoItem => self
                .video_items
                .iter_mut()
                .map(|v| &mut v.object)
                .find(|o| o.id == id),
        }
    }

    fn video_index(&self, id: &str) -> Option<usize> {
        self.video_items.iter().position(|v| v.object.id == id)
    }

    /// Visibility of the object, or None when it is not in the scene.
    fn visibility(&self, ty: ObjectType, id: &str) -> Option<bool> {
        let object = match ty {
            ObjectType::Polygon => self.polygons.iter().find(|o| o.id == id),
            ObjectType::TextItem => self.text_items.iter().find(|o| o.id == id),
            ObjectType::ImageItem => self.image_items.iter().find(|o| o.id == id),
            ObjectType::VideoItem => self
                .video_items
                .iter()
                .map(|v| &v.object)
                .find(|o| o.id == id),
        };
        object.map(|o| !o.hidden)
    }
}

/// Everything one tick may touch, passed by reference. No global editor
/// state.
pub struct StepContext<'a> {
    pub renderer: &'a mut dyn Renderer,
    pub scene: &'a mut Scene,
}

/// Per-sequence playback driver. Stopped -> Playing -> Stopped; pausing is
/// the caller withholding ticks.
pub struct Stepper {
    canvas: CanvasConfig,
    sequence: Option<Sequence>,
    playing: bool,
}

impl Stepper {
    pub fn new(canvas: CanvasConfig) -> Self {
        Self {
            canvas,
            sequence: None,
            playing: false,
        }
    }

    pub fn play(&mut self, sequence: Sequence) {
        self.sequence = Some(sequence);
        self.playing = true;
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn sequence(&self) -> Option<&Sequence> {
        self.sequence.as_ref()
    }

    /// The timeline's playing sequence at `current_time_ms`. The returned
    /// sequence carries its own `background_fill`, so hosts can repaint
    /// when the active sequence changes.
    pub fn active_sequence<'a>(
        &self,
        timeline: &SavedTimelineConfig,
        sequences: &'a [Sequence],
        current_time_ms: u32,
    ) -> Option<&'a Sequence> {
        timeline.active_sequence(sequences, current_time_ms)
    }

    /// Advance the composition to wall-clock time `total_dt` (seconds
    /// since playback started) and write every animated value.
    pub fn tick(&mut self, total_dt: f32, ctx: &mut StepContext) -> Result<(), EngineError> {
        if !self.playing {
            return Ok(());
        }
        let Some(sequence) = self.sequence.as_ref() else {
            return Ok(());
        };

        // Looping is implicit: local time wraps at the sequence duration.
        let duration_s = sequence.duration_ms as f32 / 1000.0;
        let local_t = if duration_s > 0.0 {
            total_dt % duration_s
        } else {
            0.0
        };
        let local_ms = (local_t * 1000.0) as u32;

        for animation in &sequence.polygon_motion_paths {
            step_animation(animation, local_ms, &self.canvas, ctx)?;
        }

        Ok(())
    }
}

fn step_animation(
    animation: &AnimationData,
    local_ms: u32,
    canvas: &CanvasConfig,
    ctx: &mut StepContext,
) -> Result<(), EngineError> {
    // Active window check (half-open).
    let start = animation.start_time_ms;
    if local_ms < start || local_ms >= start + animation.duration_ms {
        return Ok(());
    }

    match ctx.scene.visibility(animation.object_type, &animation.polygon_id) {
        Some(true) => {}
        // Hidden objects keep their state but take no writes.
        Some(false) => return Ok(()),
        None => {
            debug!(
                "skipping animation {}: no live object {}",
                animation.id, animation.polygon_id
            );
            return Ok(());
        }
    }

    let elapsed_ms = local_ms - start;

    // Video frame pacing runs before property interpolation so content
    // and transform land in the same frame.
    let animate_properties = if animation.object_type == ObjectType::VideoItem {
        pace_video_frames(&animation.polygon_id, elapsed_ms, ctx.scene)?
    } else {
        true
    };
    if !animate_properties {
        return Ok(());
    }

    for property in &animation.properties {
        if property.keyframes.len() < 2 {
            continue;
        }
        let Some((start_frame, end_frame)) = resolve_bracket(&property.keyframes, elapsed_ms)
        else {
            // Missing bracket: the last written value persists.
            continue;
        };
        let value = evaluate(&start_frame, &end_frame, elapsed_ms);
        apply_value(animation, &value, elapsed_ms, canvas, ctx)?;
    }

    Ok(())
}

/// Decide how many frames the video decoder should advance this tick.
/// Returns whether the object's properties should animate (they do only
/// on ticks where frame content moved, keeping content and transform in
/// step).
fn pace_video_frames(id: &str, elapsed_ms: u32, scene: &mut Scene) -> Result<bool, EngineError> {
    let Some(idx) = scene.video_index(id) else {
        return Ok(false);
    };
    let video = &mut scene.video_items[idx];

    let frame_interval = 1.0 / video.source_frame_rate as f64;
    let elapsed_s = elapsed_ms as f64 / 1000.0;
    let current_frame_time = video.num_frames_drawn as f64 * frame_interval;

    // Stay clear of the source tail so the decoder never runs off the end.
    let within_source = (elapsed_ms + 1000) < video.source_duration_ms;

    let frames_to_draw = if elapsed_s >= current_frame_time
        && elapsed_s < current_frame_time + frame_interval
    {
        1
    } else if elapsed_s > current_frame_time {
        let behind = ((elapsed_s - current_frame_time) / frame_interval).floor() as u32;
        behind.min(MAX_CATCH_UP_FRAMES)
    } else {
        0
    };

    if frames_to_draw == 0 || !within_source {
        return Ok(false);
    }

    let decoder = video
        .decoder
        .as_mut()
        .ok_or_else(|| EngineError::MissingResources {
            what: format!("video decoder for {id}"),
        })?;
    for _ in 0..frames_to_draw {
        decoder.draw_frame()?;
        video.num_frames_drawn += 1;
    }

    Ok(true)
}

fn apply_value(
    animation: &AnimationData,
    value: &KeyframeValue,
    elapsed_ms: u32,
    canvas: &CanvasConfig,
    ctx: &mut StepContext,
) -> Result<(), EngineError> {
    let ty = animation.object_type;
    let id = animation.polygon_id.as_str();
    let target = ObjectRef::new(ty, id);

    match value {
        KeyframeValue::Position(p) => {
            let position = [
                canvas.horiz_offset + p[0] + animation.position[0],
                canvas.vert_offset + p[1] + animation.position[1],
            ];
            write_transform(ctx, ty, id, |t| t.position = position);
        }
        KeyframeValue::Rotation(deg) => {
            let rotation = *deg;
            write_transform(ctx, ty, id, |t| t.rotation = rotation);
        }
        KeyframeValue::ScaleX(pct) => {
            let scale = pct / 100.0;
            write_transform(ctx, ty, id, |t| t.scale_x = scale);
        }
        KeyframeValue::ScaleY(pct) => {
            let scale = pct / 100.0;
            write_transform(ctx, ty, id, |t| t.scale_y = scale);
        }
        KeyframeValue::Opacity(pct) => {
            let opacity = pct / 100.0;
            ctx.renderer.set_opacity(&target, opacity);
            if ty == ObjectType::TextItem {
                ctx.renderer
                    .set_opacity(&ObjectRef::text_backdrop(id), opacity);
            }
        }
        KeyframeValue::Zoom(zoom) => {
            // Zoom only has a write target on video items.
            if ty == ObjectType::VideoItem {
                if let Some(idx) = ctx.scene.video_index(id) {
                    let video = &mut ctx.scene.video_items[idx];
                    let center =
                        follow_center(video, elapsed_ms).unwrap_or(zoom.position);
                    ctx.renderer
                        .set_zoom(&target, zoom.zoom_level / 100.0, center);
                }
            }
        }
        // No renderer write target; the channels still interpolate for
        // consumers that read them back (e.g. the properties panel).
        KeyframeValue::PerspectiveX(_)
        | KeyframeValue::PerspectiveY(_)
        | KeyframeValue::Custom(_) => {}
    }

    Ok(())
}

/// Apply a single-channel edit to the object's last-written transform and
/// push the whole tuple to the renderer. Text items mirror every
/// transform write onto their backdrop shape.
fn write_transform(
    ctx: &mut StepContext,
    ty: ObjectType,
    id: &str,
    edit: impl FnOnce(&mut ObjectTransform),
) {
    let Some(object) = ctx.scene.object_mut(ty, id) else {
        return;
    };
    edit(&mut object.transform);
    let t = object.transform;

    let target = ObjectRef::new(ty, id);
    ctx.renderer
        .set_transform(&target, t.position, t.rotation, t.scale_x, t.scale_y);
    if ty == ObjectType::TextItem {
        ctx.renderer.set_transform(
            &ObjectRef::text_backdrop(id),
            t.position,
            t.rotation,
            t.scale_x,
            t.scale_y,
        );
    }
}

/// Smoothed pan-follow center for a video's zoom, driven by the source
/// recording's cursor track. Returns None when there is no track, in
/// which case the keyframe's own focus point is used.
fn follow_center(video: &mut VideoObject, elapsed_ms: u32) -> Option<[f32; 2]> {
    if video.cursor_track.is_empty() {
        return None;
    }

    let should_retarget = match video.follow.last_shift_ms {
        Some(last) => elapsed_ms.saturating_sub(last) > FOLLOW_RETARGET_MS,
        None => {
            // First sight: seed the window without blending.
            video.follow.last_shift_ms = Some(elapsed_ms);
            let start = video
                .cursor_track
                .iter()
                .find(|s| s.time_ms >= elapsed_ms)
                .copied();
            let end = video
                .cursor_track
                .iter()
                .find(|s| s.time_ms >= elapsed_ms + FOLLOW_RETARGET_MS)
                .copied();
            if let (Some(start), Some(end)) = (start, end) {
                video.follow.window_start = Some(start);
                video.follow.window_end = Some(end);
            }
            false
        }
    };

    if should_retarget {
        let from = elapsed_ms.saturating_sub(FOLLOW_RETARGET_MS) + FOLLOW_DELAY_OFFSET_MS;
        let to = elapsed_ms + FOLLOW_DELAY_OFFSET_MS;
        let candidate_start = video
            .cursor_track
            .iter()
            .find(|s| s.time_ms >= from && s.time_ms < video.source_duration_ms)
            .copied();
        let candidate_end = video
            .cursor_track
            .iter()
            .find(|s| s.time_ms >= to && s.time_ms < video.source_duration_ms)
            .copied();

        if let (Some(start), Some(end)) = (candidate_start, candidate_end) {
            if let (Some(last_start), Some(last_end)) =
                (video.follow.window_start, video.follow.window_end)
            {
                let d1 = distance(start.position, last_start.position);
                let d2 = distance(end.position, last_end.position);

                // Re-target only on meaningful movement; small drift keeps
                // the current window to avoid jitter.
                if d1 >= FOLLOW_RETARGET_DISTANCE || d2 >= FOLLOW_RETARGET_DISTANCE {
                    video.follow.last_shift_ms = Some(elapsed_ms);
                    video.follow.window_start = Some(start);
                    video.follow.window_end = Some(end);

                    let jump = d1.max(d2);
                    video.follow.alpha = FOLLOW_ALPHA_MIN
                        + (FOLLOW_ALPHA_MAX - FOLLOW_ALPHA_MIN)
                            * (1.0 - (-FOLLOW_ALPHA_SCALING * jump).exp());
                }
            } else {
                video.follow.window_start = Some(start);
                video.follow.window_end = Some(end);
            }
        }
    }

    let (start, end) = (video.follow.window_start?, video.follow.window_end?);
    let clamped = elapsed_ms.clamp(start.time_ms, end.time_ms);
    let span = end.time_ms.saturating_sub(start.time_ms);
    let progress = if span == 0 {
        1.0
    } else {
        (clamped - start.time_ms) as f32 / span as f32
    };
    let fresh = [
        start.position[0] + (end.position[0] - start.position[0]) * progress,
        start.position[1] + (end.position[1] - start.position[1]) * progress,
    ];

    let center = match video.follow.last_center {
        Some(last) => {
            let alpha = if video.follow.alpha > 0.0 {
                video.follow.alpha
            } else {
                FOLLOW_ALPHA_MIN
            };
            [
                last[0] * (1.0 - alpha) + fresh[0] * alpha,
                last[1] * (1.0 - alpha) + fresh[1] * alpha,
            ]
        }
        None => fresh,
    };
    video.follow.last_center = Some(center);
    Some(center)
}

#[inline]
fn distance(a: [f32; 2], b: [f32; 2]) -> f32 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    (dx * dx + dy * dy).sqrt()
}
