// All simulation-wide constants gathered in one place and passed into the
// driver at startup; nothing in the core reads ambient globals.

use glam::Vec2;

use crate::sim::rules::{Rule, RuleKind};

/// Flat set of named numeric options for one simulation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimConfig {
    /// Number of boids spawned at startup. Default 200.
    pub boid_count: usize,
    /// World width in world units; positions wrap toroidally. Default 1920.
    pub world_width: f32,
    /// World height in world units; positions wrap toroidally. Default 1080.
    pub world_height: f32,
    /// Hard speed ceiling applied after every integration step. Default 150.
    pub max_speed: f32,
    /// Fixed magnitude every composed steering force is scaled to.
    /// Default 300.
    pub max_force: f32,
    /// Radius within which other boids count as neighbours. Default 90.
    pub perception_radius: f32,
    /// Distance below which the separation rule pushes boids apart.
    /// Default 60.
    pub separation_threshold: f32,
    /// Blend weight of the maintain-heading rule. Default 0.
    pub accelerate_weight: f32,
    /// Blend weight of velocity alignment. Default 4.
    pub alignment_weight: f32,
    /// Blend weight of cohesion toward the local centroid. Default 0.9.
    pub cohesion_weight: f32,
    /// Blend weight of separation. Default 2.
    pub separation_weight: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            boid_count: 200,
            world_width: 1920.0,
            world_height: 1080.0,
            max_speed: 150.0,
            max_force: 300.0,
            perception_radius: 90.0,
            separation_threshold: 60.0,
            accelerate_weight: 0.0,
            alignment_weight: 4.0,
            cohesion_weight: 0.9,
            separation_weight: 2.0,
        }
    }
}

impl SimConfig {
    pub fn world_extent(&self) -> Vec2 {
        Vec2::new(self.world_width, self.world_height)
    }

    /// The classic flocking rule set wired to the configured weights, in a
    /// fixed evaluation order.
    pub fn default_rules(&self) -> Vec<Rule> {
        vec![
            Rule::new(RuleKind::Accelerate, self.accelerate_weight),
            Rule::new(RuleKind::Alignment, self.alignment_weight),
            Rule::new(RuleKind::Cohesion, self.cohesion_weight),
            Rule::new(
                RuleKind::Separation {
                    threshold: self.separation_threshold,
                },
                self.separation_weight,
            ),
        ]
    }
}
