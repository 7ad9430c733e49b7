use bevy::prelude::{Quat, Vec3};
use rs_utils::{FlatGround, exponential01};

use super::decoder::{self, RootDelta};
use super::encoder::{self, FeatureLayout, JOINT_WIDTH};
use super::ik::{Effector, IkCorrector, LimbRole, goal_weight};
use super::steering::pooled_bias;
use super::*;

struct ScriptedNetwork {
    inputs: Vec<f32>,
    outputs: Vec<f32>,
    initialised: bool,
    predictions: u32,
}

impl ScriptedNetwork {
    fn for_layout(layout: &FeatureLayout) -> Self {
        Self {
            inputs: vec![0.0; layout.input_len()],
            outputs: vec![0.0; layout.output_len()],
            initialised: true,
            predictions: 0,
        }
    }
}

impl Network for ScriptedNetwork {
    fn input_len(&self) -> usize {
        self.inputs.len()
    }

    fn output_len(&self) -> usize {
        self.outputs.len()
    }

    fn is_initialised(&self) -> bool {
        self.initialised
    }

    fn set_input(&mut self, index: usize, value: f32) {
        self.inputs[index] = value;
    }

    fn predict(&mut self) {
        self.predictions += 1;
    }

    fn output(&self, index: usize) -> f32 {
        self.outputs[index]
    }
}

/// Joints without hierarchy; IK moves the tip straight onto the goal.
struct TestSkeleton {
    names: Vec<String>,
    positions: Vec<Vec3>,
    rotations: Vec<Quat>,
    root_position: Vec3,
    root_rotation: Quat,
    solved: Vec<(usize, Vec3)>,
}

impl TestSkeleton {
    fn new(positions: &[Vec3]) -> Self {
        Self {
            names: (0..positions.len()).map(|i| format!("joint{i}")).collect(),
            positions: positions.to_vec(),
            rotations: vec![Quat::IDENTITY; positions.len()],
            root_position: Vec3::ZERO,
            root_rotation: Quat::IDENTITY,
            solved: Vec::new(),
        }
    }
}

impl Skeleton for TestSkeleton {
    fn joint_count(&self) -> usize {
        self.positions.len()
    }

    fn joint_name(&self, joint: usize) -> Option<&str> {
        self.names.get(joint).map(String::as_str)
    }

    fn joint_position(&self, joint: usize) -> Vec3 {
        self.positions[joint]
    }

    fn joint_rotation(&self, joint: usize) -> Quat {
        self.rotations[joint]
    }

    fn set_joint_position(&mut self, joint: usize, position: Vec3) {
        self.positions[joint] = position;
    }

    fn set_joint_rotation(&mut self, joint: usize, rotation: Quat) {
        self.rotations[joint] = rotation;
    }

    fn root_position(&self) -> Vec3 {
        self.root_position
    }

    fn root_rotation(&self) -> Quat {
        self.root_rotation
    }

    fn set_root(&mut self, position: Vec3, rotation: Quat) {
        self.root_position = position;
        self.root_rotation = rotation;
    }

    fn solve_ik(&mut self, tip: usize, goal: Vec3) {
        self.positions[tip] = goal;
        self.solved.push((tip, goal));
    }
}

fn geometry(length: usize, root_index: usize, stride: usize, samples: usize) -> TrajectoryConfig {
    TrajectoryConfig {
        length,
        root_index,
        stride,
        samples,
        sample_width: 0.5,
    }
}

/// Moves every future keyframe somewhere distinct and deterministic.
fn scatter_keyframes(trajectory: &mut Trajectory) {
    let root = trajectory.root_index();
    let stride = trajectory.stride();
    for i in (root..trajectory.len()).step_by(stride) {
        let k = i as f32;
        let point = trajectory.point_mut(i);
        point.set_position(Vec3::new(k * 0.37 - 3.0, (k * 0.11).sin(), k * -0.21 + 1.0));
        point.set_direction(Vec3::new((k * 0.7).cos(), 0.0, (k * 0.7).sin()));
        point.set_slope(k * 0.01);
    }
}

#[test]
fn interpolated_points_match_keyframe_blend() {
    for config in [
        geometry(111, 60, 10, 12),
        geometry(41, 20, 5, 8),
        geometry(13, 6, 3, 4),
        geometry(9, 4, 1, 9),
    ] {
        config.validate().unwrap();
        let mut trajectory = Trajectory::new(&config, 2, Vec3::ZERO, Vec3::Z);
        scatter_keyframes(&mut trajectory);
        trajectory.reinterpolate_future();

        for i in config.root_index + 1..config.length {
            if i % config.stride == 0 {
                continue;
            }
            let prev = trajectory.point(trajectory.previous_keyframe(i));
            let next = trajectory.point(trajectory.next_keyframe(i));
            let f = (i % config.stride) as f32 / config.stride as f32;
            let expected = (1.0 - f) * prev.position() + f * next.position();
            let diff = (trajectory.point(i).position() - expected).length();
            assert!(diff < 1e-5, "index {i} off by {diff} (stride {})", config.stride);
            let slope = (1.0 - f) * prev.slope() + f * next.slope();
            assert!((trajectory.point(i).slope() - slope).abs() < 1e-5);
        }
    }
}

#[test]
fn reinterpolation_is_idempotent() {
    let config = TrajectoryConfig::default();
    let mut trajectory = Trajectory::new(&config, 3, Vec3::ZERO, Vec3::Z);
    scatter_keyframes(&mut trajectory);
    trajectory.reinterpolate_future();
    let first: Vec<_> = trajectory.points().to_vec();

    for _ in 0..5 {
        trajectory.reinterpolate_future();
    }
    for (a, b) in first.iter().zip(trajectory.points()) {
        assert!((a.position() - b.position()).length() < 1e-6);
        assert!((a.direction() - b.direction()).length() < 1e-6);
        assert!((a.left_sample() - b.left_sample()).length() < 1e-6);
    }
}

#[test]
fn keyframe_lookup_tie_breaks() {
    let trajectory = Trajectory::new(&TrajectoryConfig::default(), 1, Vec3::ZERO, Vec3::Z);
    assert_eq!(trajectory.previous_keyframe(70), 70);
    assert_eq!(trajectory.next_keyframe(70), 70);
    assert_eq!(trajectory.previous_keyframe(63), 60);
    assert_eq!(trajectory.next_keyframe(63), 70);
    assert_eq!(trajectory.next_keyframe(109), 110);
    assert_eq!(trajectory.sample(11).index(), 110);
    assert_eq!(trajectory.sample(40).index(), 110);
    assert!((trajectory.keyframe_factor(67) - 0.7).abs() < 1e-6);
}

#[test]
fn frame_round_trip() {
    let frames = [
        CoordinateFrame::new(Vec3::ZERO, Vec3::Z),
        CoordinateFrame::new(Vec3::new(3.0, 1.5, -2.0), Vec3::new(1.0, 0.4, 1.0)),
        CoordinateFrame::new(Vec3::new(-10.0, 0.0, 7.0), Vec3::NEG_X),
        CoordinateFrame::new(Vec3::new(0.5, -2.0, 0.5), Vec3::ZERO),
    ];
    let vectors = [
        Vec3::ZERO,
        Vec3::new(1.0, 2.0, 3.0),
        Vec3::new(-4.5, 0.25, 9.0),
    ];
    for frame in frames {
        let forward = frame.forward();
        assert!((forward.length() - 1.0).abs() < 1e-5);
        assert!(forward.y.abs() < 1e-6);
        for v in vectors {
            let p = frame.to_local_position(frame.to_world_position(v));
            assert!((p - v).length() < 1e-4);
            let d = frame.to_local_direction(frame.to_world_direction(v));
            assert!((d - v).length() < 1e-4);
        }
    }
}

#[test]
fn flattened_frame_keeps_heading() {
    let frame = CoordinateFrame::new(Vec3::new(1.0, 4.0, 2.0), Vec3::X).flattened();
    assert_eq!(frame.position(), Vec3::new(1.0, 0.0, 2.0));
    assert!((frame.forward() - Vec3::X).length() < 1e-5);
}

#[test]
fn prediction_pulls_future_toward_target() {
    let config = TrajectoryConfig::default();
    let mut trajectory = Trajectory::new(&config, 4, Vec3::ZERO, Vec3::Z);
    let ground = FlatGround::default();
    trajectory.postprocess_all(&ground);
    let before = trajectory.point(70).position();

    trajectory.predict(Vec3::Z, Vec3::X, 1.0, &ground);

    let after = trajectory.point(70).position();
    assert!(after.x > before.x, "point 70 did not move toward +x");

    let p60 = trajectory.point(60).position();
    for i in 61..70 {
        let f = (i - 60) as f32 / 10.0;
        let expected = (1.0 - f) * p60 + f * after;
        assert!((trajectory.point(i).position() - expected).length() < 1e-6);
    }
    for point in &trajectory.points()[61..] {
        assert!(point.styles.iter().all(|&s| s == 0.0));
    }
}

#[test]
fn prediction_turns_future_heading_toward_target() {
    let config = TrajectoryConfig::default();
    let mut trajectory = Trajectory::new(&config, 1, Vec3::ZERO, Vec3::Z);
    let ground = FlatGround::default();
    trajectory.predict(Vec3::X, Vec3::ZERO, 0.0, &ground);

    let t = 10.0 / 60.0f32;
    let expected = Vec3::Z.lerp(Vec3::X, 1.0 - (1.0 - t).powf(1.25)).normalize();
    assert!((trajectory.point(70).direction() - expected).length() < 1e-5);
    assert!((trajectory.root().direction() - Vec3::Z).length() < 1e-6);

    let mut previous = 0.0;
    for i in (70..=110).step_by(10) {
        let heading = trajectory.point(i).direction().angle_between(Vec3::Z);
        assert!(heading > previous, "heading at {i} did not turn further");
        previous = heading;
    }
}

#[test]
fn prediction_copies_root_styles_forward() {
    let config = TrajectoryConfig::default();
    let mut trajectory = Trajectory::new(&config, 3, Vec3::ZERO, Vec3::Z);
    trajectory.root_mut().styles = vec![0.2, 0.5, 1.0];
    trajectory.predict(Vec3::Z, Vec3::ZERO, 0.0, &FlatGround::default());
    for point in &trajectory.points()[61..] {
        assert_eq!(point.styles, vec![0.2, 0.5, 1.0]);
    }
    assert_eq!(trajectory.point(59).styles, vec![0.0; 3]);
}

#[test]
fn postprocess_samples_terrain() {
    let ground = rs_utils::SlopedGround {
        base_height: 1.0,
        gradient_x: 0.5,
        gradient_z: 0.0,
    };
    let mut point = TrajectoryPoint::new(0, 1, Vec3::new(2.0, 10.0, 0.0), Vec3::Z);
    point.postprocess(&ground, 0.5);
    assert!((point.position().y - 2.0).abs() < 1e-6);
    // heading +Z: right is +X
    assert!((point.right_sample() - Vec3::new(2.5, 2.25, 0.0)).length() < 1e-5);
    assert!((point.left_sample() - Vec3::new(1.5, 1.75, 0.0)).length() < 1e-5);
    assert!(point.slope() > 0.0);
}

#[test]
fn zero_direction_keeps_previous_heading() {
    let mut point = TrajectoryPoint::new(0, 1, Vec3::ZERO, Vec3::X);
    point.set_direction(Vec3::ZERO);
    assert!((point.direction() - Vec3::X).length() < 1e-6);
    point.set_direction(Vec3::new(0.0, 3.0, -2.0));
    assert!((point.direction() - Vec3::NEG_Z).length() < 1e-6);
}

#[test]
fn shift_past_moves_window_forward() {
    let config = TrajectoryConfig::default();
    let mut trajectory = Trajectory::new(&config, 1, Vec3::ZERO, Vec3::Z);
    for i in 0..trajectory.len() {
        let point = trajectory.point_mut(i);
        point.set_position(Vec3::new(i as f32, 0.0, 0.0));
        point.styles[0] = i as f32 / 200.0;
    }
    trajectory.shift_past();
    for i in 0..60 {
        assert_eq!(trajectory.point(i).position().x, (i + 1) as f32);
        assert_eq!(trajectory.point(i).styles[0], (i + 1) as f32 / 200.0);
        assert_eq!(trajectory.point(i).index(), i);
    }
    assert_eq!(trajectory.point(60).position().x, 60.0);
    assert_eq!(trajectory.point(61).position().x, 61.0);
}

#[test]
fn dead_zone_attenuates_small_translation() {
    let delta = RootDelta {
        translation: Vec3::new(0.0005, 0.0, 0.0),
        angle: 0.0,
    }
    .damped();
    let gain = exponential01(0.5);
    assert!((delta.translation.x - 0.0005 * gain).abs() < 1e-9);
    assert!(delta.translation.x > 0.0 && delta.translation.x < 0.0005);
    assert_eq!(delta.angle, 0.0);

    let large = RootDelta {
        translation: Vec3::new(0.0, 0.0, 0.2),
        angle: 3.0,
    }
    .damped();
    assert!((large.translation.z - 0.2).abs() < 1e-6);
    assert!((large.angle - 3.0).abs() < 1e-6);

    let turn = RootDelta {
        translation: Vec3::ZERO,
        angle: 0.005,
    }
    .damped();
    assert!((turn.angle - 0.005 * gain).abs() < 1e-9);
    assert_eq!(turn.translation, Vec3::ZERO);

    let back = RootDelta {
        translation: Vec3::ZERO,
        angle: -0.005,
    }
    .damped();
    assert!((back.angle + 0.005 * gain).abs() < 1e-9);
}

#[test]
fn layout_offsets_follow_wire_contract() {
    let layout = FeatureLayout::new(&TrajectoryConfig::default(), 6, 27);
    assert_eq!(layout.future_samples, 6);
    assert_eq!(layout.trajectory_input_width(), 13);
    assert_eq!(layout.input_len(), 12 * 13 + 27 * 12);
    assert_eq!(layout.joint_output_offset(), 24);
    assert_eq!(layout.root_delta_offset(), 24 + 27 * 12);
    assert_eq!(layout.output_len(), 24 + 27 * 12 + 3);
}

#[test]
fn encoder_writes_root_relative_features() {
    let config = TrajectoryConfig::default();
    let mut trajectory = Trajectory::new(&config, 2, Vec3::new(5.0, 2.0, 3.0), Vec3::X);
    {
        let sample = trajectory.point_mut(70);
        sample.set_position(Vec3::new(6.0, 2.0, 5.0));
        sample.set_direction(Vec3::Z);
        sample.styles = vec![0.25, 0.75];
    }
    let pose = [JointPose {
        position: Vec3::new(5.0, 1.0, 4.0),
        forward: Vec3::X,
        up: Vec3::Y,
        velocity: Vec3::new(0.0, 0.0, 2.0),
    }];
    let layout = FeatureLayout::new(&config, 2, 1);
    let mut network = ScriptedNetwork::for_layout(&layout);

    let (current, _) = encoder::encode(&layout, &trajectory, &pose, &mut network);
    assert_eq!(current.position(), Vec3::new(5.0, 0.0, 3.0));

    let width = layout.trajectory_input_width();
    let entry = &network.inputs[7 * width..8 * width];
    let expected = [-2.0, 0.0, 1.0, -1.0, 0.0, 0.0, 0.0, 0.25, 0.75];
    for (got, want) in entry.iter().zip(expected) {
        assert!((got - want).abs() < 1e-5, "{entry:?}");
    }

    // sample 6 is the root itself
    let root_entry = &network.inputs[6 * width..6 * width + 5];
    assert!(root_entry[0].abs() < 1e-5 && root_entry[2].abs() < 1e-5);
    assert!((root_entry[4] - 1.0).abs() < 1e-5);

    let joint = &network.inputs[layout.joint_input_offset()..];
    assert_eq!(joint.len(), JOINT_WIDTH);
    let expected = [-1.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, -2.0, 0.0, 0.0];
    for (got, want) in joint.iter().zip(expected) {
        assert!((got - want).abs() < 1e-5, "{joint:?}");
    }
}

#[test]
fn joint_position_blends_velocity_and_decoded_position() {
    let layout = FeatureLayout::new(&TrajectoryConfig::default(), 1, 1);
    let mut network = ScriptedNetwork::for_layout(&layout);
    let base = layout.joint_output_offset();
    network.outputs[base + 1] = 1.0; // position y
    network.outputs[base + 5] = 1.0; // forward z
    network.outputs[base + 7] = 1.0; // up y
    network.outputs[base + 10] = 2.0; // velocity y

    let mut pose = [JointPose::default()];
    let root = CoordinateFrame::new(Vec3::ZERO, Vec3::Z);
    decoder::decode_joints(&layout, &network, &mut pose, &root);

    assert!((pose[0].position - Vec3::new(0.0, 1.5, 0.0)).length() < 1e-6);
    assert!((pose[0].velocity - Vec3::new(0.0, 2.0, 0.0)).length() < 1e-6);
    assert!((pose[0].forward - Vec3::Z).length() < 1e-6);
}

#[test]
fn decoded_joint_maps_through_current_root() {
    let layout = FeatureLayout::new(&TrajectoryConfig::default(), 1, 1);
    let mut network = ScriptedNetwork::for_layout(&layout);
    let base = layout.joint_output_offset();
    network.outputs[base + 2] = 1.0; // one unit ahead of the root
    network.outputs[base + 5] = 3.0; // unnormalised forward
    // up left at zero: keeps the previous up

    let root = CoordinateFrame::new(Vec3::new(10.0, 0.0, 0.0), Vec3::X);
    let mut pose = [JointPose {
        position: Vec3::new(11.0, 0.0, 0.0),
        forward: Vec3::X,
        up: Vec3::Y,
        velocity: Vec3::ZERO,
    }];
    decoder::decode_joints(&layout, &network, &mut pose, &root);

    assert!((pose[0].position - Vec3::new(11.0, 0.0, 0.0)).length() < 1e-5);
    assert!((pose[0].forward - Vec3::X).length() < 1e-5);
    assert!((pose[0].up - Vec3::Y).length() < 1e-5);
}

#[test]
fn root_advance_shifts_past_and_turns() {
    let config = TrajectoryConfig::default();
    let mut trajectory = Trajectory::new(&config, 1, Vec3::ZERO, Vec3::X);
    let ground = FlatGround { height: 0.25 };
    let current = trajectory.root().frame().flattened();
    let delta = RootDelta {
        translation: Vec3::new(0.0, 0.0, 1.0),
        angle: 90.0,
    };

    let next = decoder::advance_root(&mut trajectory, delta, &current, &ground);

    let root = trajectory.root();
    assert!((root.position() - Vec3::new(1.0, 0.25, 0.0)).length() < 1e-5);
    // +X turned 90 degrees about +Y
    assert!((root.direction() - Vec3::NEG_Z).length() < 1e-5);
    assert!((next.position() - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);
    assert_eq!(trajectory.point(59).position(), Vec3::ZERO);
}

#[test]
fn future_correction_follows_decoded_keyframes() {
    let config = TrajectoryConfig::default();
    let mut trajectory = Trajectory::new(&config, 1, Vec3::ZERO, Vec3::Z);
    let layout = FeatureLayout::new(&config, 1, 0);
    let mut network = ScriptedNetwork::for_layout(&layout);
    for k in 0..layout.future_samples {
        network.outputs[k * 4 + 1] = k as f32; // z ahead of the root
        network.outputs[k * 4 + 3] = 1.0; // facing forward
    }
    let ground = FlatGround::default();
    let root = trajectory.root().frame().flattened();
    let delta = RootDelta {
        translation: Vec3::ZERO,
        angle: 0.0,
    };

    decoder::correct_future(&layout, &mut trajectory, &network, delta, &root, 1.0, &ground);

    assert!((trajectory.point(80).position() - Vec3::new(0.0, 0.0, 2.0)).length() < 1e-5);
    assert!((trajectory.point(85).position() - Vec3::new(0.0, 0.0, 2.5)).length() < 1e-5);
    assert!((trajectory.point(110).position() - Vec3::new(0.0, 0.0, 5.0)).length() < 1e-5);

    // zero correction only carries the future along with the root delta
    let mut trajectory = Trajectory::new(&config, 1, Vec3::ZERO, Vec3::Z);
    let delta = RootDelta {
        translation: Vec3::new(0.0, 0.0, 0.5),
        angle: 0.0,
    };
    decoder::correct_future(&layout, &mut trajectory, &network, delta, &root, 0.0, &ground);
    assert!((trajectory.point(90).position() - Vec3::new(0.0, 0.0, 0.5)).length() < 1e-5);
}

#[test]
fn goal_weight_stays_in_unit_range() {
    for role in [LimbRole::Front, LimbRole::Rear, LimbRole::Tail] {
        for v in [-1.0, 0.0, 0.001, 0.01, 0.02, 0.5, 10.0] {
            for h in [-2.0, 0.0, 0.01, 0.03, 0.1, 5.0] {
                let w = goal_weight(role, v, h);
                assert!((0.0..=1.0).contains(&w), "{role:?} {v} {h} -> {w}");
            }
        }
    }
    assert_eq!(goal_weight(LimbRole::Front, 0.0, 1.0), 0.0);
    assert_eq!(goal_weight(LimbRole::Rear, 1.0, 0.0), 0.0);
    assert!((goal_weight(LimbRole::Front, 1.0, 1.0) - 1.0).abs() < 1e-6);
    assert!(goal_weight(LimbRole::Front, 1.0, 0.02) > goal_weight(LimbRole::Rear, 1.0, 0.02));
}

#[test]
fn planting_keeps_grounded_feet_and_skips_tail() {
    let mut skeleton = TestSkeleton::new(&[
        Vec3::new(0.3, 0.0, 0.5),
        Vec3::new(-0.3, 0.4, -0.5),
        Vec3::new(0.0, 0.3, -0.9),
    ]);
    let mut ik = IkCorrector::new(
        vec![
            Effector::new(0, LimbRole::Front),
            Effector::new(1, LimbRole::Rear),
            Effector::new(2, LimbRole::Tail),
        ],
        None,
    );
    ik.reset_goals(&skeleton);

    // front foot slides on the ground, rear foot swings through the air
    skeleton.positions[0] = Vec3::new(0.35, 0.0, 0.5);
    skeleton.positions[1] = Vec3::new(-0.3, 0.4, 0.5);
    ik.plant_limbs(&mut skeleton);

    let goals = ik.effectors();
    assert!((goals[0].goal - Vec3::new(0.3, 0.0, 0.5)).length() < 1e-6);
    assert!((goals[1].goal - Vec3::new(-0.3, 0.4, 0.5)).length() < 1e-6);
    assert_eq!(skeleton.solved.len(), 2);
    assert!(skeleton.solved.iter().all(|(tip, _)| *tip != 2));
}

#[test]
fn ground_fit_lifts_goals_onto_terrain() {
    let mut skeleton = TestSkeleton::new(&[
        Vec3::new(0.3, 0.1, 0.5),
        Vec3::new(0.0, -0.2, -0.9),
    ]);
    skeleton.root_position = Vec3::ZERO;
    let mut ik = IkCorrector::new(
        vec![
            Effector::new(0, LimbRole::Rear),
            Effector::new(1, LimbRole::Tail),
        ],
        None,
    );
    ik.fit_to_ground(&mut skeleton, &FlatGround { height: 1.0 });

    let goals = ik.effectors();
    assert!((goals[0].goal.y - 1.1).abs() < 1e-6);
    // the tail never sinks below the ground
    assert!((goals[1].goal.y - 1.0).abs() < 1e-6);
    assert_eq!(skeleton.solved.len(), 2);
}

#[test]
fn spine_follows_ground_under_neck() {
    // spine, neck, left shoulder, right shoulder
    let mut skeleton = TestSkeleton::new(&[
        Vec3::new(0.0, 0.5, 0.0),
        Vec3::new(0.0, 0.6, 1.0),
        Vec3::new(0.2, 0.5, 0.8),
        Vec3::new(-0.2, 0.5, 0.8),
    ]);
    skeleton.names = vec![
        "Spine1".into(),
        "Neck".into(),
        "LeftShoulder".into(),
        "RightShoulder".into(),
    ];
    let spine =
        SpineJoints::resolve(&skeleton, "Spine1", "Neck", "LeftShoulder", "RightShoulder").unwrap();
    assert!(SpineJoints::resolve(&skeleton, "Spine1", "Head", "LeftShoulder", "RightShoulder").is_err());

    let ground = rs_utils::SlopedGround {
        base_height: 0.0,
        gradient_x: 0.0,
        gradient_z: 0.5,
    };
    let mut ik = IkCorrector::new(Vec::new(), Some(spine));
    ik.fit_to_ground(&mut skeleton, &ground);

    assert!((skeleton.positions[1].y - 1.1).abs() < 1e-5);
    assert!((skeleton.positions[0].y - 0.5).abs() < 1e-5);
    assert!((skeleton.positions[2].y - 0.9).abs() < 1e-5);
    // half way toward pitching the spine up the slope
    let pitched = skeleton.rotations[0] * Vec3::Z;
    assert!(pitched.y > 0.0);
}

#[test]
fn pooled_bias_caps_with_held_multiplier() {
    let styles = vec![
        StyleConfig::new("idle", 1.0),
        StyleConfig::new("move", 2.5).with_multiplier(0, 0.5),
    ];
    let mut input = SteeringInput::default();
    assert!((pooled_bias(&styles, &[0.0, 1.0], &input) - 2.5).abs() < 1e-6);
    input.modifiers = vec![true];
    assert!((pooled_bias(&styles, &[0.0, 1.0], &input) - 1.25).abs() < 1e-6);
    assert!((pooled_bias(&styles, &[0.5, 0.5], &input) - 1.125).abs() < 1e-6);
}

#[test]
fn steering_blends_toward_input() {
    let config = AnimatorConfig::default();
    let mut trajectory = Trajectory::new(&config.trajectory, config.style_count(), Vec3::ZERO, Vec3::Z);
    let mut steering = SteeringState::new(Vec3::Z, 1.0);

    let idle = SteeringInput::default();
    steering.update(&config, &idle, &mut trajectory);
    assert!((trajectory.root().styles[0] - 0.25).abs() < 1e-6);
    assert_eq!(steering.target_velocity(), Vec3::ZERO);
    assert!((steering.trajectory_correction() - 0.75).abs() < 1e-6);

    let run = SteeringInput {
        turn: 0.0,
        movement: Vec3::Z,
        active_styles: vec![false, true],
        modifiers: Vec::new(),
    };
    for _ in 0..40 {
        steering.update(&config, &run, &mut trajectory);
    }
    assert!(trajectory.root().styles[0] < 0.01);
    assert!(trajectory.root().styles[1] > 0.99);
    assert!((steering.target_velocity() - Vec3::Z).length() < 1e-3);
    assert!((steering.bias() - 2.5).abs() < 1e-2);
    assert!((steering.trajectory_correction() - 1.0).abs() < 1e-3);

    let turn = SteeringInput {
        turn: 1.0,
        ..run.clone()
    };
    steering.update(&config, &turn, &mut trajectory);
    assert!(steering.target_direction().x > 0.0);
}

#[test]
fn config_validation_rejects_bad_geometry() {
    assert!(AnimatorConfig::default().validate().is_ok());
    assert!(geometry(111, 65, 10, 12).validate().is_err());
    assert!(geometry(110, 60, 10, 12).validate().is_err());
    assert!(geometry(111, 60, 0, 12).validate().is_err());
    assert!(geometry(111, 60, 10, 13).validate().is_err());
    assert!(geometry(61, 60, 10, 6).validate().is_err());

    let config = AnimatorConfig {
        styles: Vec::new(),
        ..AnimatorConfig::default()
    };
    assert!(matches!(config.validate(), Err(AnimatorError::StyleCount { .. })));
}

#[test]
fn mlp_forward_pass() {
    let params = MlpParameters {
        x_mean: vec![0.0, 0.0],
        x_std: vec![1.0, 1.0],
        y_mean: vec![1.0],
        y_std: vec![2.0],
        layers: vec![DenseLayer {
            weights: vec![2.0, -1.0],
            bias: vec![0.5],
        }],
    };
    let mut mlp = Mlp::new(params).unwrap();
    mlp.set_input(0, 1.0);
    mlp.set_input(1, 1.0);
    mlp.predict();
    assert!((mlp.output(0) - 4.0).abs() < 1e-6);

    let params = MlpParameters {
        x_mean: vec![0.0, 0.0],
        x_std: vec![1.0, 1.0],
        y_mean: vec![0.0],
        y_std: vec![1.0],
        layers: vec![
            DenseLayer {
                weights: vec![1.0, 0.0],
                bias: vec![0.0],
            },
            DenseLayer {
                weights: vec![1.0],
                bias: vec![0.0],
            },
        ],
    };
    let mut mlp = Mlp::new(params).unwrap();
    mlp.set_input(0, -1.0);
    mlp.predict();
    assert!((mlp.output(0) - ((-1.0f32).exp() - 1.0)).abs() < 1e-6);
}

#[test]
fn mlp_rejects_mismatched_parameters() {
    let params = MlpParameters {
        x_mean: vec![0.0; 3],
        x_std: vec![1.0; 3],
        y_mean: vec![0.0],
        y_std: vec![1.0],
        layers: vec![DenseLayer {
            weights: vec![1.0, 1.0],
            bias: vec![0.0],
        }],
    };
    assert!(matches!(Mlp::new(params), Err(AnimatorError::Parameters(_))));
    assert!(!Mlp::empty(4, 2).is_initialised());
}

fn animator_fixture(joints: usize) -> (Animator, TestSkeleton) {
    let positions: Vec<Vec3> = (0..joints)
        .map(|j| Vec3::new(0.0, 0.5 + j as f32 * 0.1, 0.0))
        .collect();
    let skeleton = TestSkeleton::new(&positions);
    let animator = Animator::new(
        AnimatorConfig::default(),
        &skeleton,
        (0..joints).collect(),
        IkCorrector::default(),
        &FlatGround::default(),
    )
    .unwrap();
    (animator, skeleton)
}

#[test]
fn tick_without_network_only_predicts() {
    let (mut animator, mut skeleton) = animator_fixture(2);
    let pose_before = animator.pose().to_vec();
    let mut network = Mlp::empty(animator.layout().input_len(), animator.layout().output_len());
    let input = SteeringInput {
        movement: Vec3::Z,
        active_styles: vec![false, true],
        ..SteeringInput::default()
    };

    // the first tick only starts blending the styles in, so give the bias time to build
    for _ in 0..4 {
        let outcome = animator.tick(&input, &mut network, &FlatGround::default(), &mut skeleton);
        assert_eq!(outcome, TickOutcome::TrajectoryOnly);
    }
    assert_eq!(animator.pose(), pose_before.as_slice());
    assert!(animator.trajectory().point(110).position().z > 0.0);
    assert_eq!(skeleton.root_position, Vec3::ZERO);

    animator.set_trajectory_control(false);
    let outcome = animator.tick(&input, &mut network, &FlatGround::default(), &mut skeleton);
    assert_eq!(outcome, TickOutcome::Idle);
}

#[test]
fn tick_with_network_moves_root_and_pose() {
    let (mut animator, mut skeleton) = animator_fixture(2);
    let layout = *animator.layout();
    let mut network = ScriptedNetwork::for_layout(&layout);
    network.outputs[layout.root_delta_offset() + 1] = 0.5;
    let joint = layout.joint_output_offset();
    network.outputs[joint + 1] = 0.8;
    network.outputs[joint + 5] = 1.0;
    network.outputs[joint + 7] = 1.0;

    let ground = FlatGround::default();
    let outcome = animator.tick(&SteeringInput::default(), &mut network, &ground, &mut skeleton);

    assert_eq!(outcome, TickOutcome::Animated);
    assert_eq!(network.predictions, 1);
    assert!((animator.trajectory().root().position() - Vec3::new(0.0, 0.0, 0.5)).length() < 1e-5);
    assert!((skeleton.root_position - Vec3::new(0.0, 0.0, 0.5)).length() < 1e-5);
    assert_eq!(animator.trajectory().point(59).position(), Vec3::ZERO);
    // previous (0, 0.5, 0) advanced by zero velocity, blended with decoded (0, 0.8, 0)
    assert!((animator.pose()[0].position - Vec3::new(0.0, 0.65, 0.0)).length() < 1e-5);
    assert!((skeleton.positions[0] - Vec3::new(0.0, 0.65, 0.0)).length() < 1e-5);
}

#[test]
fn joint_configuration_ignores_out_of_range() {
    let (mut animator, skeleton) = animator_fixture(3);
    let inputs = animator.layout().input_len();

    animator.add_joint(&skeleton, 7);
    animator.set_joint(&skeleton, 9, 0);
    animator.set_joint(&skeleton, 0, 42);
    animator.remove_joint(5);
    animator.set_joint_count(10);
    animator.ik_mut().set_effector_goal(3, Vec3::ONE);
    assert_eq!(animator.joints(), &[0, 1, 2]);
    assert_eq!(animator.layout().input_len(), inputs);

    animator.remove_joint(1);
    assert_eq!(animator.joints(), &[0, 2]);
    assert_eq!(animator.layout().input_len(), inputs - JOINT_WIDTH);

    animator.set_joint_count(1);
    animator.add_joint(&skeleton, 2);
    assert_eq!(animator.joints(), &[0, 2]);

    animator.auto_detect(&skeleton);
    assert_eq!(animator.joints(), &[0, 1, 2]);
    assert_eq!(animator.pose().len(), 3);
}

#[test]
fn mismatched_network_is_reported() {
    let (animator, _) = animator_fixture(2);
    let network = Mlp::empty(3, 3);
    assert!(matches!(
        animator.check_network(&network),
        Err(AnimatorError::NetworkShape { .. })
    ));
    let layout = *animator.layout();
    assert!(animator.check_network(&ScriptedNetwork::for_layout(&layout)).is_ok());
}

#[test]
fn animator_rejects_unknown_joints() {
    let skeleton = TestSkeleton::new(&[Vec3::ZERO]);
    let result = Animator::new(
        AnimatorConfig::default(),
        &skeleton,
        vec![0, 3],
        IkCorrector::default(),
        &FlatGround::default(),
    );
    assert!(matches!(result, Err(AnimatorError::UnknownJoint(3))));
}

#[test]
fn effectors_outside_the_skeleton_are_ignored() {
    let (mut animator, mut skeleton) = animator_fixture(2);
    animator.add_effector(&skeleton, Effector::new(99, LimbRole::Front));
    assert!(animator.ik().effectors().is_empty());

    animator.add_effector(&skeleton, Effector::new(1, LimbRole::Rear));
    assert_eq!(animator.ik().effectors().len(), 1);
    assert_eq!(animator.ik().effectors()[0].goal, skeleton.positions[1]);

    let layout = *animator.layout();
    let mut network = ScriptedNetwork::for_layout(&layout);
    let ground = FlatGround::default();
    let outcome = animator.tick(&SteeringInput::default(), &mut network, &ground, &mut skeleton);
    assert_eq!(outcome, TickOutcome::Animated);
    assert!(skeleton.solved.iter().all(|&(tip, _)| tip == 1));

    animator.use_ik(true, &skeleton);
    assert_eq!(animator.ik().effectors()[0].goal, skeleton.positions[1]);
}

#[test]
fn animator_rejects_unknown_spine_joints() {
    let skeleton = TestSkeleton::new(&[Vec3::ZERO, Vec3::Y]);
    let spine = SpineJoints {
        spine: 0,
        neck: 7,
        left_shoulder: 1,
        right_shoulder: 1,
    };
    let result = Animator::new(
        AnimatorConfig::default(),
        &skeleton,
        vec![0, 1],
        IkCorrector::new(Vec::new(), Some(spine)),
        &FlatGround::default(),
    );
    assert!(matches!(result, Err(AnimatorError::UnknownJoint(7))));
}
