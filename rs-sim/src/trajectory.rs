use bevy::prelude::{Quat, Vec3};
use rs_utils::{Terrain, ground_direction};
use tracing::trace;

use crate::config::TrajectoryConfig;
use crate::frame::CoordinateFrame;

const POSITION_BIAS: f32 = 0.75;
const DIRECTION_BIAS: f32 = 1.25;

#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryPoint {
    index: usize,
    position: Vec3,
    direction: Vec3,
    /// One weight in `[0, 1]` per style channel.
    pub styles: Vec<f32>,
    left_sample: Vec3,
    right_sample: Vec3,
    slope: f32,
}

impl TrajectoryPoint {
    pub fn new(index: usize, styles: usize, position: Vec3, direction: Vec3) -> Self {
        Self {
            index,
            position,
            direction: ground_direction(direction, Vec3::Z),
            styles: vec![0.0; styles],
            left_sample: position,
            right_sample: position,
            slope: 0.0,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Stores the ground heading of `direction`. A zero-length heading keeps
    /// the previous one.
    pub fn set_direction(&mut self, direction: Vec3) {
        self.direction = ground_direction(direction, self.direction);
    }

    pub fn left_sample(&self) -> Vec3 {
        self.left_sample
    }

    pub fn set_left_sample(&mut self, sample: Vec3) {
        self.left_sample = sample;
    }

    pub fn right_sample(&self) -> Vec3 {
        self.right_sample
    }

    pub fn set_right_sample(&mut self, sample: Vec3) {
        self.right_sample = sample;
    }

    pub fn slope(&self) -> f32 {
        self.slope
    }

    pub fn set_slope(&mut self, slope: f32) {
        self.slope = slope;
    }

    pub fn frame(&self) -> CoordinateFrame {
        CoordinateFrame::new(self.position, self.direction)
    }

    /// Drops the point onto the terrain and refreshes its slope and the
    /// lateral samples `width` to either side.
    pub fn postprocess<T: Terrain + ?Sized>(&mut self, terrain: &T, width: f32) {
        self.position.y = terrain.ground_height(self.position);
        self.slope = terrain.slope(self.position);

        let ortho = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2) * self.direction;
        let mut right = self.position + width * ortho;
        right.y = terrain.ground_height(right);
        let mut left = self.position - width * ortho;
        left.y = terrain.ground_height(left);
        self.right_sample = right;
        self.left_sample = left;
    }

    /// Copies every field except the slot index.
    fn take_state_from(&mut self, other: &TrajectoryPoint) {
        self.position = other.position;
        self.direction = other.direction;
        self.styles.clone_from(&other.styles);
        self.left_sample = other.left_sample;
        self.right_sample = other.right_sample;
        self.slope = other.slope;
    }

    fn geometry(&self) -> Geometry {
        Geometry {
            position: self.position,
            direction: self.direction,
            left_sample: self.left_sample,
            right_sample: self.right_sample,
            slope: self.slope,
        }
    }
}

/// The interpolated part of a point's state.
#[derive(Debug, Clone, Copy)]
struct Geometry {
    position: Vec3,
    direction: Vec3,
    left_sample: Vec3,
    right_sample: Vec3,
    slope: f32,
}

impl Geometry {
    fn blend(prev: Geometry, next: Geometry, factor: f32) -> Geometry {
        let mix = |a: Vec3, b: Vec3| (1.0 - factor) * a + factor * b;
        Geometry {
            position: mix(prev.position, next.position),
            direction: mix(prev.direction, next.direction),
            left_sample: mix(prev.left_sample, next.left_sample),
            right_sample: mix(prev.right_sample, next.right_sample),
            slope: (1.0 - factor) * prev.slope + factor * next.slope,
        }
    }

    fn apply_to(self, point: &mut TrajectoryPoint) {
        point.position = self.position;
        point.set_direction(self.direction);
        point.left_sample = self.left_sample;
        point.right_sample = self.right_sample;
        point.slope = self.slope;
    }
}

/// Fixed-length window of past, current and predicted future points.
///
/// Allocated once; every tick mutates the points in place. Points at multiples
/// of `stride` are keyframes, everything between two keyframes is derived from
/// them by linear interpolation.
#[derive(Debug, Clone)]
pub struct Trajectory {
    points: Vec<TrajectoryPoint>,
    root: usize,
    stride: usize,
    sample_width: f32,
}

impl Trajectory {
    /// Every point starts at `position` facing `direction`. The geometry is
    /// expected to have passed [`TrajectoryConfig::validate`].
    pub fn new(config: &TrajectoryConfig, styles: usize, position: Vec3, direction: Vec3) -> Self {
        let points = (0..config.length)
            .map(|i| TrajectoryPoint::new(i, styles, position, direction))
            .collect();
        Self {
            points,
            root: config.root_index,
            stride: config.stride,
            sample_width: config.sample_width,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn root_index(&self) -> usize {
        self.root
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn style_count(&self) -> usize {
        self.points.first().map_or(0, |p| p.styles.len())
    }

    pub fn points(&self) -> &[TrajectoryPoint] {
        &self.points
    }

    pub fn point(&self, index: usize) -> &TrajectoryPoint {
        &self.points[index]
    }

    pub fn point_mut(&mut self, index: usize) -> &mut TrajectoryPoint {
        &mut self.points[index]
    }

    pub fn root(&self) -> &TrajectoryPoint {
        &self.points[self.root]
    }

    pub fn root_mut(&mut self) -> &mut TrajectoryPoint {
        &mut self.points[self.root]
    }

    /// The `k`-th keyframe counted from index 0, clamped to the last point.
    pub fn sample(&self, k: usize) -> &TrajectoryPoint {
        &self.points[(k * self.stride).min(self.points.len() - 1)]
    }

    /// Keyframe at or below `index`.
    pub fn previous_keyframe(&self, index: usize) -> usize {
        ((index / self.stride) * self.stride).min(self.points.len() - 1)
    }

    /// `index` itself when it is a keyframe, otherwise the keyframe above it.
    pub fn next_keyframe(&self, index: usize) -> usize {
        if index % self.stride == 0 {
            self.previous_keyframe(index)
        } else {
            ((index / self.stride + 1) * self.stride).min(self.points.len() - 1)
        }
    }

    /// Fractional position of `index` between its enclosing keyframes.
    pub fn keyframe_factor(&self, index: usize) -> f32 {
        (index % self.stride) as f32 / self.stride as f32
    }

    /// Moves every past point one slot toward the start of the window. The
    /// root point keeps its state; the caller overwrites it afterwards.
    pub fn shift_past(&mut self) {
        for i in 0..self.root {
            let (head, tail) = self.points.split_at_mut(i + 1);
            head[i].take_state_from(&tail[0]);
        }
    }

    /// Bends the future toward the steering targets.
    ///
    /// The position deltas between consecutive future points are pulled
    /// toward `bias * target_velocity` (spread over the future span) with an
    /// ease-in that grows with distance from the root, and headings are pulled
    /// toward `target_direction` the same way. Future styles copy the root.
    pub fn blend_future(&mut self, target_direction: Vec3, target_velocity: Vec3, bias: f32) {
        let root = self.root;
        let len = self.points.len();
        let scale = 1.0 / (len as f32 - (root as f32 + 1.0));
        let target_step = scale * bias * target_velocity;

        let mut blended = vec![Vec3::ZERO; len];
        blended[root] = self.points[root].position;
        let root_styles = self.points[root].styles.clone();

        for i in root + 1..len {
            let t = (i - root) as f32 / root as f32;
            let scale_pos = 1.0 - (1.0 - t).max(0.0).powf(POSITION_BIAS);
            let scale_dir = 1.0 - (1.0 - t).max(0.0).powf(DIRECTION_BIAS);

            let raw_step = self.points[i].position - self.points[i - 1].position;
            blended[i] = blended[i - 1] + raw_step.lerp(target_step, scale_pos);

            let point = &mut self.points[i];
            let direction = point.direction.lerp(target_direction, scale_dir);
            point.set_direction(direction);
            point.styles.clone_from(&root_styles);
        }
        for i in root + 1..len {
            self.points[i].position = blended[i];
        }
    }

    pub fn postprocess_root<T: Terrain + ?Sized>(&mut self, terrain: &T) {
        let width = self.sample_width;
        self.points[self.root].postprocess(terrain, width);
    }

    pub fn postprocess_all<T: Terrain + ?Sized>(&mut self, terrain: &T) {
        let width = self.sample_width;
        for point in &mut self.points {
            point.postprocess(terrain, width);
        }
    }

    /// Re-samples terrain for every keyframe from `from` to the end of the window.
    pub fn postprocess_keyframes<T: Terrain + ?Sized>(&mut self, from: usize, terrain: &T) {
        let width = self.sample_width;
        for i in (from..self.points.len()).step_by(self.stride) {
            self.points[i].postprocess(terrain, width);
        }
    }

    /// Rebuilds every future point from its enclosing keyframes.
    pub fn reinterpolate_future(&mut self) {
        for i in self.root + 1..self.points.len() {
            let prev = self.previous_keyframe(i);
            let next = self.next_keyframe(i);
            if prev == i && next == i {
                continue;
            }
            let factor = self.keyframe_factor(i);
            let blended =
                Geometry::blend(self.points[prev].geometry(), self.points[next].geometry(), factor);
            blended.apply_to(&mut self.points[i]);
        }
    }

    /// One full prediction step: blend toward the targets, re-sample terrain
    /// at the keyframes, then re-interpolate the points between them.
    pub fn predict<T: Terrain + ?Sized>(
        &mut self,
        target_direction: Vec3,
        target_velocity: Vec3,
        bias: f32,
        terrain: &T,
    ) {
        self.blend_future(target_direction, target_velocity, bias);
        self.postprocess_keyframes(self.root, terrain);
        self.reinterpolate_future();
        trace!(
            root = ?self.root().position(),
            end = ?self.points[self.points.len() - 1].position(),
            "trajectory predicted"
        );
    }
}
