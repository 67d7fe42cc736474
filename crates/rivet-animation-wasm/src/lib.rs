use js_sys::{Function, JSON};
use serde_wasm_bindgen as swb;
use wasm_bindgen::prelude::*;

use rivet_animation_core::{
    build_motion_path, generate_motion_paths, parse_saved_state_json, AnimationData,
    BackgroundFill, CanvasConfig, CursorSample, EngineError, GenerationConfig, MediaDecoder,
    ObjectRef, PredictionTarget, Renderer, SavedTimelineConfig, Scene, SceneObject,
    StepContext, Stepper, VideoObject,
};

#[wasm_bindgen]
pub struct RivetAnimation {
    stepper: Stepper,
    scene: Scene,
    renderer: JsRenderer,
    sequences: Vec<rivet_animation_core::Sequence>,
    timeline: Option<SavedTimelineConfig>,
    canvas: CanvasConfig,
}

fn jsvalue_is_undefined_or_null(v: &JsValue) -> bool {
    v.is_undefined() || v.is_null()
}

fn object_ref_to_js(target: &ObjectRef) -> JsValue {
    let obj = js_sys::Object::new();
    let _ = js_sys::Reflect::set(
        &obj,
        &JsValue::from_str("id"),
        &JsValue::from_str(&target.id),
    );
    let _ = js_sys::Reflect::set(
        &obj,
        &JsValue::from_str("backdrop"),
        &JsValue::from_bool(target.backdrop),
    );
    obj.into()
}

/// Renderer backed by JS callbacks registered from the host page.
/// Missing callbacks make the corresponding writes no-ops, which keeps
/// headless use (tests, thumbnail generation) trivial.
#[derive(Default)]
struct JsRenderer {
    set_transform: Option<Function>,
    set_opacity: Option<Function>,
    set_zoom: Option<Function>,
}

impl Renderer for JsRenderer {
    fn set_transform(
        &mut self,
        target: &ObjectRef,
        position: [f32; 2],
        rotation: f32,
        scale_x: f32,
        scale_y: f32,
    ) {
        if let Some(f) = &self.set_transform {
            let args = js_sys::Array::of5(
                &object_ref_to_js(target),
                &swb::to_value(&position).unwrap_or(JsValue::NULL),
                &JsValue::from_f64(rotation as f64),
                &JsValue::from_f64(scale_x as f64),
                &JsValue::from_f64(scale_y as f64),
            );
            let _ = f.apply(&JsValue::UNDEFINED, &args);
        }
    }

    fn set_opacity(&mut self, target: &ObjectRef, opacity: f32) {
        if let Some(f) = &self.set_opacity {
            let _ = f.call2(
                &JsValue::UNDEFINED,
                &object_ref_to_js(target),
                &JsValue::from_f64(opacity as f64),
            );
        }
    }

    fn set_zoom(&mut self, target: &ObjectRef, level: f32, center: [f32; 2]) {
        if let Some(f) = &self.set_zoom {
            let _ = f.call3(
                &JsValue::UNDEFINED,
                &object_ref_to_js(target),
                &JsValue::from_f64(level as f64),
                &swb::to_value(&center).unwrap_or(JsValue::NULL),
            );
        }
    }
}

/// Decoder backed by a JS callback. The callback must advance exactly one
/// frame synchronously (the host drains its decode queue ahead of the
/// tick); a thrown exception surfaces as a decode error.
struct JsDecoder {
    id: String,
    draw_frame: Function,
}

impl MediaDecoder for JsDecoder {
    fn draw_frame(&mut self) -> Result<(), EngineError> {
        self.draw_frame
            .call0(&JsValue::UNDEFINED)
            .map(|_| ())
            .map_err(|e| EngineError::Decode {
                id: self.id.clone(),
                reason: format!("{e:?}"),
            })
    }
}

#[wasm_bindgen]
impl RivetAnimation {
    /// Create a new engine instance. Pass a JSON config object or
    /// undefined/null for the default 800x450 canvas.
    /// Example:
    ///   new RivetAnimation({ width: 1280, height: 720 })
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<RivetAnimation, JsError> {
        console_error_panic_hook::set_once();

        let canvas: CanvasConfig = if jsvalue_is_undefined_or_null(&config) {
            CanvasConfig::default()
        } else {
            swb::from_value(config).map_err(|e| JsError::new(&format!("config error: {e}")))?
        };

        Ok(RivetAnimation {
            stepper: Stepper::new(canvas),
            scene: Scene::default(),
            renderer: JsRenderer::default(),
            sequences: Vec::new(),
            timeline: None,
            canvas,
        })
    }

    /// Load a saved project (JS object). Replaces any previously loaded
    /// sequences. Returns the ids of animations whose target object is
    /// missing from the saved item lists.
    #[wasm_bindgen(js_name = load_saved_state)]
    pub fn load_saved_state(&mut self, state_json: JsValue) -> Result<JsValue, JsError> {
        if jsvalue_is_undefined_or_null(&state_json) {
            return Err(JsError::new("load_saved_state: state is null/undefined"));
        }
        let s = JSON::stringify(&state_json)
            .map_err(|e| JsError::new(&format!("load_saved_state stringify error: {e:?}")))?
            .as_string()
            .ok_or_else(|| JsError::new("load_saved_state: stringify produced non-string"))?;
        let (state, dangling) = parse_saved_state_json(&s)
            .map_err(|e| JsError::new(&format!("load_saved_state parse error: {e}")))?;
        self.timeline = state.timeline_state;
        self.sequences = state.sequences;
        swb::to_value(&dangling).map_err(|e| JsError::new(&format!("output error: {e}")))
    }

    /// Register the renderer callbacks. Each is called as
    /// `f(target, ...)` where `target` is `{ id, backdrop }`.
    #[wasm_bindgen(js_name = set_renderer)]
    pub fn set_renderer(
        &mut self,
        set_transform: Function,
        set_opacity: Function,
        set_zoom: Function,
    ) {
        self.renderer = JsRenderer {
            set_transform: Some(set_transform),
            set_opacity: Some(set_opacity),
            set_zoom: Some(set_zoom),
        };
    }

    #[wasm_bindgen(js_name = add_polygon)]
    pub fn add_polygon(&mut self, id: String) {
        self.scene.polygons.push(SceneObject::new(&id));
    }

    #[wasm_bindgen(js_name = add_text_item)]
    pub fn add_text_item(&mut self, id: String) {
        self.scene.text_items.push(SceneObject::new(&id));
    }

    #[wasm_bindgen(js_name = add_image_item)]
    pub fn add_image_item(&mut self, id: String) {
        self.scene.image_items.push(SceneObject::new(&id));
    }

    /// Register a video item. `draw_frame` advances the decoder by one
    /// frame each call.
    #[wasm_bindgen(js_name = add_video_item)]
    pub fn add_video_item(
        &mut self,
        id: String,
        source_frame_rate: f32,
        source_duration_ms: u32,
        draw_frame: Function,
    ) {
        let mut video = VideoObject::new(&id, source_frame_rate, source_duration_ms);
        video.decoder = Some(Box::new(JsDecoder { id, draw_frame }));
        self.scene.video_items.push(video);
    }

    /// Attach a cursor track to a video item. `samples` is an array of
    /// `{ timeMs, position: [x, y] }` objects, ascending by time.
    #[wasm_bindgen(js_name = set_cursor_track)]
    pub fn set_cursor_track(&mut self, id: String, samples: JsValue) -> Result<(), JsError> {
        #[derive(serde::Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct WireSample {
            time_ms: u32,
            position: [f32; 2],
        }
        let wire: Vec<WireSample> = swb::from_value(samples)
            .map_err(|e| JsError::new(&format!("cursor track error: {e}")))?;
        let video = self
            .scene
            .video_items
            .iter_mut()
            .find(|v| v.object.id == id)
            .ok_or_else(|| JsError::new(&format!("unknown video item {id}")))?;
        video.cursor_track = wire
            .into_iter()
            .map(|s| CursorSample {
                time_ms: s.time_ms,
                position: s.position,
            })
            .collect();
        Ok(())
    }

    /// Start playing the sequence with the given id.
    #[wasm_bindgen]
    pub fn play(&mut self, sequence_id: String) -> Result<(), JsError> {
        let sequence = self
            .sequences
            .iter()
            .find(|s| s.id == sequence_id)
            .cloned()
            .ok_or_else(|| JsError::new(&format!("unknown sequence {sequence_id}")))?;
        self.stepper.play(sequence);
        Ok(())
    }

    /// Start playing whatever video-track sequence covers `timeline_ms`
    /// in the loaded timeline. Returns `{ id, backgroundFill }` for the
    /// selected sequence, or null (and stops playback) when no sequence
    /// covers that time.
    #[wasm_bindgen(js_name = play_at)]
    pub fn play_at(&mut self, timeline_ms: u32) -> Result<JsValue, JsError> {
        #[derive(serde::Serialize)]
        #[serde(rename_all = "camelCase")]
        struct ActiveInfo<'a> {
            id: &'a str,
            background_fill: &'a Option<BackgroundFill>,
        }
        let timeline = self
            .timeline
            .as_ref()
            .ok_or_else(|| JsError::new("play_at: no timeline loaded"))?;
        match self
            .stepper
            .active_sequence(timeline, &self.sequences, timeline_ms)
        {
            Some(sequence) => {
                let info = swb::to_value(&ActiveInfo {
                    id: &sequence.id,
                    background_fill: &sequence.background_fill,
                })
                .map_err(|e| JsError::new(&format!("output error: {e}")))?;
                let sequence = sequence.clone();
                self.stepper.play(sequence);
                Ok(info)
            }
            None => {
                self.stepper.stop();
                Ok(JsValue::NULL)
            }
        }
    }

    #[wasm_bindgen]
    pub fn stop(&mut self) {
        self.stepper.stop();
    }

    #[wasm_bindgen(js_name = is_playing)]
    pub fn is_playing(&self) -> bool {
        self.stepper.is_playing()
    }

    /// Advance playback to `total_dt` seconds since play() and write every
    /// animated value through the registered renderer callbacks.
    #[wasm_bindgen]
    pub fn tick(&mut self, total_dt: f32) -> Result<(), JsError> {
        let mut ctx = StepContext {
            renderer: &mut self.renderer,
            scene: &mut self.scene,
        };
        self.stepper
            .tick(total_dt, &mut ctx)
            .map_err(|e| JsError::new(&format!("tick error: {e}")))
    }

    /// Build the editor-overlay motion path for one animation (JS object).
    /// Returns the path JSON or null when the animation has no drawable
    /// position track.
    #[wasm_bindgen(js_name = build_motion_path)]
    pub fn build_motion_path(
        &self,
        animation_json: JsValue,
        group_x: f32,
        group_y: f32,
    ) -> Result<JsValue, JsError> {
        let animation: AnimationData = swb::from_value(animation_json)
            .map_err(|e| JsError::new(&format!("animation parse error: {e}")))?;
        match build_motion_path(&animation, [group_x, group_y]) {
            Some(path) => {
                swb::to_value(&path).map_err(|e| JsError::new(&format!("output error: {e}")))
            }
            None => Ok(JsValue::NULL),
        }
    }

    /// Turn a model prediction buffer into keyframe animations. `predictions`
    /// is the flat feature array, `targets` the described objects, `config`
    /// the generation options (or undefined for defaults).
    #[wasm_bindgen(js_name = generate_from_predictions)]
    pub fn generate_from_predictions(
        &self,
        predictions: Vec<f32>,
        targets_json: JsValue,
        config: JsValue,
    ) -> Result<JsValue, JsError> {
        let targets: Vec<PredictionTarget> = swb::from_value(targets_json)
            .map_err(|e| JsError::new(&format!("targets parse error: {e}")))?;
        let cfg: GenerationConfig = if jsvalue_is_undefined_or_null(&config) {
            GenerationConfig {
                canvas: self.canvas,
                ..GenerationConfig::default()
            }
        } else {
            swb::from_value(config).map_err(|e| JsError::new(&format!("config error: {e}")))?
        };
        let animations = generate_motion_paths(&predictions, &targets, &cfg);
        swb::to_value(&animations).map_err(|e| JsError::new(&format!("output error: {e}")))
    }
}

/// Numeric ABI version for compatibility checks at init.
#[wasm_bindgen]
pub fn abi_version() -> u32 {
    1
}
