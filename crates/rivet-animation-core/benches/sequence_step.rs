use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rivet_animation_core::{
    evaluate, resolve_bracket, AnimationData, AnimationProperty, CanvasConfig, EasingType,
    Keyframe, KeyframeValue, ObjectType, Scene, SceneObject, Sequence, StepContext, Stepper,
};

struct NullRenderer;

impl rivet_animation_core::Renderer for NullRenderer {
    fn set_transform(
        &mut self,
        _target: &rivet_animation_core::ObjectRef,
        _position: [f32; 2],
        _rotation: f32,
        _scale_x: f32,
        _scale_y: f32,
    ) {
    }
    fn set_opacity(&mut self, _target: &rivet_animation_core::ObjectRef, _opacity: f32) {}
    fn set_zoom(
        &mut self,
        _target: &rivet_animation_core::ObjectRef,
        _level: f32,
        _center: [f32; 2],
    ) {
    }
}

fn dense_track(keyframes: usize) -> Vec<Keyframe> {
    (0..keyframes)
        .map(|i| {
            Keyframe::new(
                (i as u32) * 100,
                KeyframeValue::Position([i as f32, i as f32 * 2.0]),
                EasingType::EaseInOut,
            )
        })
        .collect()
}

fn bench_sequence(objects: usize, keyframes: usize) -> Sequence {
    let mut sequence = Sequence::new(keyframes as u32 * 100);
    for i in 0..objects {
        let id = format!("obj-{i}");
        let mut animation =
            AnimationData::new(ObjectType::Polygon, &id, sequence.duration_ms);
        animation.properties = vec![
            AnimationProperty::new("Position", "position", dense_track(keyframes)),
            AnimationProperty::new(
                "Rotation",
                "rotation",
                vec![
                    Keyframe::new(0, KeyframeValue::Rotation(0.0), EasingType::Linear),
                    Keyframe::new(
                        keyframes as u32 * 100,
                        KeyframeValue::Rotation(360.0),
                        EasingType::Linear,
                    ),
                ],
            ),
        ];
        sequence.active_polygons.push(
            rivet_animation_core::SavedItemConfig {
                id: id.clone(),
                name: id,
            },
        );
        sequence.polygon_motion_paths.push(animation);
    }
    sequence
}

fn bench_resolve_bracket(c: &mut Criterion) {
    let track = dense_track(200);
    c.bench_function("resolve_bracket/200kf", |b| {
        b.iter(|| {
            for t in (0..20_000).step_by(33) {
                black_box(resolve_bracket(&track, black_box(t)));
            }
        })
    });
}

fn bench_evaluate(c: &mut Criterion) {
    let a = Keyframe::new(
        0,
        KeyframeValue::Position([0.0, 0.0]),
        EasingType::EaseInOut,
    );
    let b_kf = Keyframe::new(
        1000,
        KeyframeValue::Position([100.0, 50.0]),
        EasingType::EaseInOut,
    );
    c.bench_function("evaluate/position", |b| {
        b.iter(|| black_box(evaluate(&a, &b_kf, black_box(417))))
    });
}

fn bench_tick(c: &mut Criterion) {
    let sequence = bench_sequence(20, 60);
    let mut scene = Scene::default();
    for i in 0..20 {
        scene.polygons.push(SceneObject::new(&format!("obj-{i}")));
    }
    let mut renderer = NullRenderer;
    let mut stepper = Stepper::new(CanvasConfig::default());
    stepper.play(sequence);

    c.bench_function("stepper_tick/20obj_60kf", |b| {
        let mut t = 0.0f32;
        b.iter(|| {
            t += 1.0 / 60.0;
            let mut ctx = StepContext {
                renderer: &mut renderer,
                scene: &mut scene,
            };
            stepper.tick(black_box(t), &mut ctx).unwrap();
        })
    });
}

criterion_group!(benches, bench_resolve_bracket, bench_evaluate, bench_tick);
criterion_main!(benches);
