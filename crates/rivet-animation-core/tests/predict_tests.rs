use rivet_animation_core::{
    generate_motion_paths, is_overlapping, resolve_overlaps, BoundingBox, CanvasConfig,
    GenerationConfig, KeyType, KeyframeCount, KeyframeValue, ObjectType, PathType,
    PredictionTarget,
};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

/// Flat prediction vector: 6 slots of 7 features per object. `points` are
/// percentages of the canvas dimensions.
fn prediction_rows(objects: &[[(f32, f32); 6]]) -> Vec<f32> {
    let mut out = Vec::new();
    for object in objects {
        for &(x, y) in object {
            out.extend_from_slice(&[0.0, 0.0, 10.0, 10.0, x, y, 0.0]);
        }
    }
    out
}

fn positions_of(animation: &rivet_animation_core::AnimationData) -> Vec<[f32; 2]> {
    animation
        .position_property()
        .unwrap()
        .keyframes
        .iter()
        .filter_map(|k| k.value.as_position())
        .collect()
}

const STRAIGHT_LINE: [(f32, f32); 6] = [
    (10.0, 50.0),
    (20.0, 50.0),
    (30.0, 50.0),
    (40.0, 50.0),
    (50.0, 50.0),
    (60.0, 50.0),
];

/// it should collapse the middle pair into one held range keyframe
#[test]
fn six_count_collapses_to_five_keyframes() {
    let predictions = prediction_rows(&[STRAIGHT_LINE]);
    let targets = vec![PredictionTarget::new(
        "obj-0",
        ObjectType::Polygon,
        [240.0, 225.0],
    )];
    let animations =
        generate_motion_paths(&predictions, &targets, &GenerationConfig::default());
    assert_eq!(animations.len(), 1);

    let keyframes = &animations[0].position_property().unwrap().keyframes;
    assert_eq!(keyframes.len(), 5);
    let times: Vec<u32> = keyframes.iter().map(|k| k.time).collect();
    assert_eq!(times, vec![0, 2500, 5000, 17_500, 20_000]);
    // the third keyframe holds until the removed fourth one's timestamp
    match keyframes[2].key_type {
        KeyType::Range(range) => assert_eq!(range.end_time, 15_000),
        KeyType::Frame => panic!("expected range keyframe"),
    }
}

#[test]
fn four_count_collapses_to_three_keyframes() {
    let predictions = prediction_rows(&[STRAIGHT_LINE]);
    let targets = vec![PredictionTarget::new(
        "obj-0",
        ObjectType::Polygon,
        [240.0, 225.0],
    )];
    let cfg = GenerationConfig {
        count: KeyframeCount::Four,
        ..GenerationConfig::default()
    };
    let animations = generate_motion_paths(&predictions, &targets, &cfg);

    let keyframes = &animations[0].position_property().unwrap().keyframes;
    assert_eq!(keyframes.len(), 3);
    let times: Vec<u32> = keyframes.iter().map(|k| k.time).collect();
    assert_eq!(times, vec![0, 5000, 20_000]);
    match keyframes[1].key_type {
        KeyType::Range(range) => assert_eq!(range.end_time, 15_000),
        KeyType::Frame => panic!("expected range keyframe"),
    }
}

/// it should anchor the path so the third sample lands on the object's position
#[test]
fn path_is_anchored_through_the_current_position() {
    let predictions = prediction_rows(&[STRAIGHT_LINE]);
    let target_position = [123.0, 321.0];
    let targets = vec![PredictionTarget::new(
        "obj-0",
        ObjectType::Polygon,
        target_position,
    )];
    let animations =
        generate_motion_paths(&predictions, &targets, &GenerationConfig::default());

    let positions = positions_of(&animations[0]);
    // slot 2 is the anchor; after collapsing it is still the third entry
    approx(positions[2][0], target_position[0], 1e-3);
    approx(positions[2][1], target_position[1], 1e-3);
}

#[test]
fn prediction_percentages_scale_to_the_canvas() {
    let predictions = prediction_rows(&[STRAIGHT_LINE]);
    // anchor at the scaled slot-2 position so offsets vanish
    let targets = vec![PredictionTarget::new(
        "obj-0",
        ObjectType::Polygon,
        [240.0, 225.0],
    )];
    let animations =
        generate_motion_paths(&predictions, &targets, &GenerationConfig::default());

    let positions = positions_of(&animations[0]);
    // 10% of 800 = 80, 50% of 450 = 225
    approx(positions[0][0], 80.0, 1e-3);
    approx(positions[0][1], 225.0, 1e-3);
    approx(positions[4][0], 480.0, 1e-3);
}

/// it should copy the elected longest path onto every object when choreographed
#[test]
fn choreography_elects_the_longest_path() {
    let short: [(f32, f32); 6] = [
        (50.0, 50.0),
        (51.0, 50.0),
        (52.0, 50.0),
        (53.0, 50.0),
        (54.0, 50.0),
        (55.0, 50.0),
    ];
    let long: [(f32, f32); 6] = [
        (10.0, 10.0),
        (90.0, 10.0),
        (10.0, 90.0),
        (90.0, 90.0),
        (10.0, 10.0),
        (90.0, 90.0),
    ];
    let predictions = prediction_rows(&[short, long]);
    let targets = vec![
        PredictionTarget::new("obj-0", ObjectType::Polygon, [100.0, 100.0]),
        PredictionTarget::new("obj-1", ObjectType::Polygon, [300.0, 300.0]),
    ];
    let cfg = GenerationConfig {
        choreographed: true,
        ..GenerationConfig::default()
    };
    let animations = generate_motion_paths(&predictions, &targets, &cfg);
    assert_eq!(animations.len(), 2);

    let a = positions_of(&animations[0]);
    let b = positions_of(&animations[1]);
    // both follow the same shape, rigidly offset to their own anchor
    for (pa, pb) in a.iter().zip(b.iter()) {
        approx(pa[0] - a[2][0], pb[0] - b[2][0], 1e-3);
        approx(pa[1] - a[2][1], pb[1] - b[2][1], 1e-3);
    }
    approx(a[2][0], 100.0, 1e-3);
    approx(b[2][0], 300.0, 1e-3);
}

#[test]
fn choreography_is_deterministic() {
    let rows: [[(f32, f32); 6]; 2] = [STRAIGHT_LINE, STRAIGHT_LINE];
    let predictions = prediction_rows(&rows);
    let targets = vec![
        PredictionTarget::new("obj-0", ObjectType::Polygon, [100.0, 100.0]),
        PredictionTarget::new("obj-1", ObjectType::Polygon, [300.0, 300.0]),
    ];
    let cfg = GenerationConfig {
        choreographed: true,
        ..GenerationConfig::default()
    };
    let first = generate_motion_paths(&predictions, &targets, &cfg);
    let second = generate_motion_paths(&predictions, &targets, &cfg);
    assert_eq!(positions_of(&first[0]), positions_of(&second[0]));
    assert_eq!(positions_of(&first[1]), positions_of(&second[1]));
}

#[test]
fn fade_zeroes_first_and_last_opacity() {
    let predictions = prediction_rows(&[STRAIGHT_LINE]);
    let targets = vec![PredictionTarget::new(
        "obj-0",
        ObjectType::Polygon,
        [240.0, 225.0],
    )];
    let cfg = GenerationConfig {
        fade: true,
        ..GenerationConfig::default()
    };
    let animations = generate_motion_paths(&predictions, &targets, &cfg);

    let opacity = animations[0]
        .properties
        .iter()
        .find(|p| p.name == "Opacity")
        .unwrap();
    let values: Vec<f32> = opacity
        .keyframes
        .iter()
        .map(|k| match &k.value {
            KeyframeValue::Opacity(o) => *o,
            other => panic!("expected opacity, got {other:?}"),
        })
        .collect();
    assert_eq!(values, vec![0.0, 100.0, 100.0, 100.0, 100.0, 0.0]);
}

#[test]
fn curved_generation_attaches_bezier_arcs() {
    let predictions = prediction_rows(&[STRAIGHT_LINE]);
    let targets = vec![PredictionTarget::new(
        "obj-0",
        ObjectType::Polygon,
        [240.0, 225.0],
    )];
    let cfg = GenerationConfig {
        curved: true,
        ..GenerationConfig::default()
    };
    let animations = generate_motion_paths(&predictions, &targets, &cfg);

    let keyframes = &animations[0].position_property().unwrap().keyframes;
    for kf in &keyframes[..keyframes.len() - 1] {
        assert_eq!(kf.path_type, PathType::Bezier);
        assert!(kf.curve_data.is_some());
    }
    // the terminal keyframe has no outgoing arc
    assert_eq!(keyframes[keyframes.len() - 1].path_type, PathType::Linear);
}

/// it should give video targets a zoom ramp and their own duration
#[test]
fn video_targets_get_a_zoom_track() {
    let predictions = prediction_rows(&[STRAIGHT_LINE]);
    let mut target = PredictionTarget::new("vid-0", ObjectType::VideoItem, [240.0, 225.0]);
    target.duration_ms = 30_000;
    let animations =
        generate_motion_paths(&predictions, &[target], &GenerationConfig::default());

    let animation = &animations[0];
    assert_eq!(animation.duration_ms, 30_000);
    let zoom = animation
        .properties
        .iter()
        .find(|p| p.property_path == "zoom")
        .unwrap();
    assert_eq!(zoom.keyframes.len(), 6);
    let levels: Vec<f32> = zoom
        .keyframes
        .iter()
        .map(|k| match &k.value {
            KeyframeValue::Zoom(z) => z.zoom_level,
            other => panic!("expected zoom, got {other:?}"),
        })
        .collect();
    assert_eq!(levels, vec![100.0, 135.0, 135.0, 135.0, 135.0, 100.0]);
    // end-anchored timestamps track the longer duration
    assert_eq!(zoom.keyframes[3].time, 25_000);
}

#[test]
fn polygon_targets_have_no_zoom_track() {
    let predictions = prediction_rows(&[STRAIGHT_LINE]);
    let targets = vec![PredictionTarget::new(
        "obj-0",
        ObjectType::Polygon,
        [240.0, 225.0],
    )];
    let animations =
        generate_motion_paths(&predictions, &targets, &GenerationConfig::default());
    assert!(animations[0]
        .properties
        .iter()
        .all(|p| p.property_path != "zoom"));
}

#[test]
fn short_prediction_vector_skips_the_object() {
    let predictions = prediction_rows(&[STRAIGHT_LINE]);
    let targets = vec![
        PredictionTarget::new("obj-0", ObjectType::Polygon, [240.0, 225.0]),
        PredictionTarget::new("obj-1", ObjectType::Polygon, [100.0, 100.0]),
    ];
    // only one object's worth of rows for two targets
    let animations =
        generate_motion_paths(&predictions, &targets, &GenerationConfig::default());
    assert_eq!(animations.len(), 1);
    assert_eq!(animations[0].polygon_id, "obj-0");
}

#[test]
fn generation_respects_the_canvas_size() {
    let predictions = prediction_rows(&[STRAIGHT_LINE]);
    let cfg = GenerationConfig {
        canvas: CanvasConfig {
            width: 1600.0,
            height: 900.0,
            ..CanvasConfig::default()
        },
        ..GenerationConfig::default()
    };
    let targets = vec![PredictionTarget::new(
        "obj-0",
        ObjectType::Polygon,
        [480.0, 450.0],
    )];
    let animations = generate_motion_paths(&predictions, &targets, &cfg);
    let positions = positions_of(&animations[0]);
    approx(positions[0][0], 160.0, 1e-3);
    approx(positions[0][1], 450.0, 1e-3);
}

#[test]
fn overlapping_boxes_are_pushed_apart() {
    let mut boxes = vec![
        BoundingBox::new([0.0, 0.0], [100.0, 100.0]),
        BoundingBox::new([50.0, 0.0], [150.0, 100.0]),
    ];
    resolve_overlaps(&mut boxes);
    assert!(!is_overlapping(&boxes[0], &boxes[1], 10.0));
    // pushed apart along x, symmetric about the original centers
    assert!(boxes[0].min[0] < 0.0);
    assert!(boxes[1].min[0] > 50.0);
}

#[test]
fn coincident_boxes_separate_along_x() {
    let mut boxes = vec![
        BoundingBox::new([0.0, 0.0], [40.0, 40.0]),
        BoundingBox::new([0.0, 0.0], [40.0, 40.0]),
    ];
    resolve_overlaps(&mut boxes);
    assert!(boxes[0].center()[0] < boxes[1].center()[0]);
    approx(boxes[0].center()[1], boxes[1].center()[1], 1e-3);
}

#[test]
fn disjoint_boxes_are_untouched() {
    let mut boxes = vec![
        BoundingBox::new([0.0, 0.0], [40.0, 40.0]),
        BoundingBox::new([500.0, 500.0], [540.0, 540.0]),
    ];
    let before = boxes.clone();
    resolve_overlaps(&mut boxes);
    assert_eq!(boxes, before);
}

/// it should not generate two paths that start on top of each other
#[test]
fn coincident_generated_starts_are_separated() {
    let predictions = prediction_rows(&[STRAIGHT_LINE, STRAIGHT_LINE]);
    // both targets sit at the same canvas position, so the anchored
    // paths would otherwise coincide exactly
    let targets = vec![
        PredictionTarget::new("obj-0", ObjectType::Polygon, [240.0, 225.0]),
        PredictionTarget::new("obj-1", ObjectType::Polygon, [240.0, 225.0]),
    ];
    let animations =
        generate_motion_paths(&predictions, &targets, &GenerationConfig::default());
    assert_eq!(animations.len(), 2);

    let a = positions_of(&animations[0]);
    let b = positions_of(&animations[1]);
    // predicted footprints are 80x45, so the starts must end up at
    // least a footprint-plus-margin apart
    assert!((b[0][0] - a[0][0]).abs() >= 90.0);
    approx(a[0][1], b[0][1], 1e-3);
    // the shift moves the whole track, keeping its shape
    approx(b[4][0] - b[0][0], a[4][0] - a[0][0], 1e-3);
}
