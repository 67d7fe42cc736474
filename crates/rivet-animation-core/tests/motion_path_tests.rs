use rivet_animation_core::{
    build_motion_path, AnimationData, AnimationProperty, EasingType, KeyType, Keyframe,
    KeyframeValue, ObjectType, PathShapeKind, RangeData,
};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn animation_with_positions(keyframes: Vec<Keyframe>) -> AnimationData {
    let mut animation = AnimationData::new(ObjectType::Polygon, "poly-1", 20_000);
    animation.properties = vec![AnimationProperty::new("Position", "position", keyframes)];
    animation
}

fn position_kf(time: u32, x: f32, y: f32, easing: EasingType) -> Keyframe {
    Keyframe::new(time, KeyframeValue::Position([x, y]), easing)
}

fn count(path: &rivet_animation_core::MotionPath, kind: PathShapeKind) -> usize {
    path.shapes.iter().filter(|s| s.kind == kind).count()
}

#[test]
fn linear_pair_yields_one_segment() {
    let animation = animation_with_positions(vec![
        position_kf(0, 0.0, 0.0, EasingType::Linear),
        position_kf(1000, 100.0, 0.0, EasingType::Linear),
    ]);
    let path = build_motion_path(&animation, [5.0, 5.0]).unwrap();

    assert_eq!(count(&path, PathShapeKind::Handle), 2);
    assert_eq!(count(&path, PathShapeKind::Segment), 1);
    // arrows land on every other segment, starting with the first
    assert_eq!(count(&path, PathShapeKind::Arrow), 1);
    assert_eq!(path.group_position, [5.0, 5.0]);
    assert_eq!(path.associated_polygon_id, "poly-1");
}

/// it should subdivide eased pairs into nine segments
#[test]
fn eased_pair_yields_nine_segments() {
    let animation = animation_with_positions(vec![
        position_kf(0, 0.0, 0.0, EasingType::EaseInOut),
        position_kf(1000, 100.0, 0.0, EasingType::Linear),
    ]);
    let path = build_motion_path(&animation, [0.0, 0.0]).unwrap();

    assert_eq!(count(&path, PathShapeKind::Handle), 2);
    assert_eq!(count(&path, PathShapeKind::Segment), 9);
    assert_eq!(count(&path, PathShapeKind::Arrow), 5);
}

#[test]
fn segment_geometry_is_midpoint_heading_and_length() {
    let animation = animation_with_positions(vec![
        position_kf(0, 0.0, 0.0, EasingType::Linear),
        position_kf(1000, 0.0, 100.0, EasingType::Linear),
    ]);
    let path = build_motion_path(&animation, [0.0, 0.0]).unwrap();
    let segment = path
        .shapes
        .iter()
        .find(|s| s.kind == PathShapeKind::Segment)
        .unwrap();
    approx(segment.position[0], 0.0, 1e-3);
    approx(segment.position[1], 50.0, 1e-3);
    approx(segment.rotation, 90.0, 1e-3);
    approx(segment.length, 100.0, 1e-3);
}

#[test]
fn range_handles_carry_the_hold_marker() {
    let mut held = position_kf(0, 0.0, 0.0, EasingType::Linear);
    held.key_type = KeyType::Range(RangeData { end_time: 500 });
    let animation = animation_with_positions(vec![
        held,
        position_kf(1000, 100.0, 0.0, EasingType::Linear),
    ]);
    let path = build_motion_path(&animation, [0.0, 0.0]).unwrap();

    let handles: Vec<f32> = path
        .shapes
        .iter()
        .filter(|s| s.kind == PathShapeKind::Handle)
        .map(|s| s.rotation)
        .collect();
    assert_eq!(handles, vec![45.0, 0.0]);
}

#[test]
fn handles_reference_their_source_keyframe() {
    let animation = animation_with_positions(vec![
        position_kf(0, 0.0, 0.0, EasingType::Linear),
        position_kf(1000, 100.0, 0.0, EasingType::Linear),
    ]);
    let keyframe_ids: Vec<String> = animation.position_property().unwrap().keyframes
        [..]
        .iter()
        .map(|k| k.id.clone())
        .collect();
    let path = build_motion_path(&animation, [0.0, 0.0]).unwrap();

    for shape in &path.shapes {
        assert_eq!(shape.source_object_id, "poly-1");
        assert_eq!(shape.source_path_id, animation.id);
    }
    let handle_refs: Vec<Option<String>> = path
        .shapes
        .iter()
        .filter(|s| s.kind == PathShapeKind::Handle)
        .map(|s| s.source_keyframe_id.clone())
        .collect();
    assert_eq!(
        handle_refs,
        vec![Some(keyframe_ids[0].clone()), Some(keyframe_ids[1].clone())]
    );
    // arrows are decoration, not draggable
    assert!(path
        .shapes
        .iter()
        .filter(|s| s.kind == PathShapeKind::Arrow)
        .all(|s| s.source_keyframe_id.is_none()));
}

#[test]
fn too_few_keyframes_is_no_path() {
    let animation =
        animation_with_positions(vec![position_kf(0, 0.0, 0.0, EasingType::Linear)]);
    assert!(build_motion_path(&animation, [0.0, 0.0]).is_none());

    let mut no_position = AnimationData::new(ObjectType::Polygon, "poly-1", 20_000);
    no_position.properties = vec![AnimationProperty::new(
        "Opacity",
        "opacity",
        vec![
            Keyframe::new(0, KeyframeValue::Opacity(0.0), EasingType::Linear),
            Keyframe::new(1000, KeyframeValue::Opacity(100.0), EasingType::Linear),
        ],
    )];
    assert!(build_motion_path(&no_position, [0.0, 0.0]).is_none());
}

#[test]
fn unsorted_keyframes_are_drawn_in_time_order() {
    let animation = animation_with_positions(vec![
        position_kf(1000, 100.0, 0.0, EasingType::Linear),
        position_kf(0, 0.0, 0.0, EasingType::Linear),
    ]);
    let path = build_motion_path(&animation, [0.0, 0.0]).unwrap();
    let handles: Vec<[f32; 2]> = path
        .shapes
        .iter()
        .filter(|s| s.kind == PathShapeKind::Handle)
        .map(|s| s.position)
        .collect();
    assert_eq!(handles, vec![[0.0, 0.0], [100.0, 0.0]]);
}
