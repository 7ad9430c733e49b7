use bevy::prelude::{Resource, Vec3};
use rs_sim::SteeringInput;

use crate::config::ScriptSegment;

/// Looping steering input that stands in for a player.
#[derive(Resource, Debug, Clone)]
pub struct SteeringScript {
    segments: Vec<ScriptSegment>,
    styles: usize,
    cycle: u64,
}

impl SteeringScript {
    pub fn new(segments: Vec<ScriptSegment>, styles: usize) -> Self {
        let cycle = segments.iter().map(|s| s.ticks).sum();
        Self {
            segments,
            styles,
            cycle,
        }
    }

    pub fn segment_at(&self, tick: u64) -> Option<&ScriptSegment> {
        if self.cycle == 0 {
            return None;
        }
        let mut t = tick % self.cycle;
        for segment in &self.segments {
            if t < segment.ticks {
                return Some(segment);
            }
            t -= segment.ticks;
        }
        None
    }

    pub fn input_at(&self, tick: u64) -> SteeringInput {
        let Some(segment) = self.segment_at(tick) else {
            return SteeringInput {
                active_styles: vec![false; self.styles],
                ..SteeringInput::default()
            };
        };

        let mut active_styles = vec![false; self.styles];
        if let Some(slot) = segment.style.and_then(|s| active_styles.get_mut(s)) {
            *slot = true;
        }
        let held = segment.modifiers.iter().copied().max().map_or(0, |m| m + 1);
        let mut modifiers = vec![false; held];
        for &m in &segment.modifiers {
            modifiers[m] = true;
        }

        SteeringInput {
            turn: segment.turn.clamp(-1.0, 1.0),
            movement: Vec3::new(segment.strafe, 0.0, segment.forward),
            active_styles,
            modifiers,
        }
    }
}
