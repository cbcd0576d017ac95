// Per-tick orchestration: rebuild the spatial index, evaluate the steering
// rules against each boid's neighbourhood, then integrate motion.
//
// The tick is strictly sequential: all inserts happen before any query, all
// queries before any mutation. The quadtree borrows the boid list for the
// duration of the neighbour phase and is dropped before integration, so
// mid-tick mutation cannot compile.

use glam::Vec2;

use crate::sim::boid::Boid;
use crate::sim::config::SimConfig;
use crate::sim::quadtree::{Quadtree, Rect};
use crate::sim::rules::Rule;
use crate::sim::vec_ops::normalise;

/// The simulation driver: owns the boid list, the ordered rule set and the
/// diagnostic snapshots taken during the most recent tick.
pub struct Simulation {
    config: SimConfig,
    rules: Vec<Rule>,
    boids: Vec<Boid>,
    next_id: u32,
    // Visualisation-only snapshots from the last tick; neither feeds back
    // into the simulation.
    leaf_bounds: Vec<Rect>,
    resultant_forces: Vec<Vec2>,
}

impl Simulation {
    pub fn new(config: SimConfig, rules: Vec<Rule>) -> Self {
        Self {
            config,
            rules,
            boids: Vec::new(),
            next_id: 0,
            leaf_bounds: Vec::new(),
            resultant_forces: Vec::new(),
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn boids(&self) -> &[Boid] {
        &self.boids
    }

    /// Leaf rectangles of the quadtree built during the last tick.
    pub fn leaf_bounds(&self) -> &[Rect] {
        &self.leaf_bounds
    }

    /// Composed steering direction per boid from the last tick, aligned with
    /// `boids()`.
    pub fn resultant_forces(&self) -> &[Vec2] {
        &self.resultant_forces
    }

    /// Add a boid with the configured tunables. Must only be called between
    /// ticks; ids are monotonic and never reused.
    pub fn spawn(&mut self, position: Vec2, velocity: Vec2) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.boids.push(Boid::new(
            id,
            position,
            velocity,
            self.config.max_speed,
            self.config.max_force,
            self.config.perception_radius,
        ));
        id
    }

    /// Advance the flock by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        let world = Rect::new(Vec2::ZERO, self.config.world_extent());

        let mut quadtree = Quadtree::new(world);
        for boid in &self.boids {
            quadtree.insert(boid);
        }

        let mut forces = Vec::with_capacity(self.boids.len());
        for boid in &self.boids {
            let neighbours = quadtree.points_within_circle(boid.position(), boid.perception());

            let mut resultant = Vec2::ZERO;
            for rule in &self.rules {
                resultant += normalise(rule.evaluate(boid, &neighbours)) * rule.weight;
            }
            // Direction-only composition: the weighted magnitudes are
            // discarded here, and apply_force rescales to max_force.
            forces.push(normalise(resultant));
        }

        self.leaf_bounds = quadtree.leaf_bounds();
        drop(quadtree);

        self.resultant_forces = forces;

        let extent = self.config.world_extent();
        for (boid, force) in self.boids.iter_mut().zip(&self.resultant_forces) {
            boid.apply_force(*force);
            boid.update(dt, extent);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Simulation;
    use crate::sim::config::SimConfig;
    use crate::sim::rules::{Rule, RuleKind};
    use glam::Vec2;

    const EPS: f32 = 1.0e-4;

    #[test]
    fn spawn_assigns_monotonic_ids() {
        let config = SimConfig::default();
        let mut sim = Simulation::new(config, config.default_rules());

        let a = sim.spawn(Vec2::new(10.0, 10.0), Vec2::ZERO);
        let b = sim.spawn(Vec2::new(20.0, 20.0), Vec2::ZERO);
        assert!(b > a);
        assert_eq!(sim.boids().len(), 2);
        assert_eq!(sim.boids()[0].max_speed(), config.max_speed);
        assert_eq!(sim.boids()[1].perception(), config.perception_radius);
    }

    #[test]
    fn isolated_boid_with_accelerate_keeps_its_heading() {
        let config = SimConfig::default();
        let rules = vec![Rule::new(RuleKind::Accelerate, 1.0)];
        let mut sim = Simulation::new(config, rules);

        let velocity = Vec2::new(30.0, 40.0);
        sim.spawn(Vec2::new(960.0, 540.0), velocity);
        sim.tick(0.1);

        let forces = sim.resultant_forces();
        assert_eq!(forces.len(), 1);
        assert!((forces[0] - velocity.normalize()).length() < EPS);

        // The boid sped up along its own heading without turning.
        let after = sim.boids()[0].velocity();
        assert!((after.normalize() - velocity.normalize()).length() < EPS);
        assert!(after.length() > velocity.length());
    }

    #[test]
    fn speed_stays_clamped_across_many_ticks() {
        let config = SimConfig::default();
        let rules = vec![Rule::new(RuleKind::Accelerate, 1.0)];
        let mut sim = Simulation::new(config, rules);
        sim.spawn(Vec2::new(100.0, 100.0), Vec2::new(140.0, 0.0));

        for _ in 0..50 {
            sim.tick(0.05);
            let speed = sim.boids()[0].velocity().length();
            assert!(speed <= config.max_speed + 1.0e-3, "speed {speed}");
        }
    }

    #[test]
    fn positions_stay_inside_the_world() {
        let config = SimConfig::default();
        let mut sim = Simulation::new(config, config.default_rules());
        sim.spawn(Vec2::new(1919.0, 1079.0), Vec2::new(120.0, 90.0));
        sim.spawn(Vec2::new(1.0, 1.0), Vec2::new(-120.0, -90.0));

        for _ in 0..40 {
            sim.tick(0.05);
            for boid in sim.boids() {
                let pos = boid.position();
                assert!(pos.x >= 0.0 && pos.x < config.world_width, "x {}", pos.x);
                assert!(pos.y >= 0.0 && pos.y < config.world_height, "y {}", pos.y);
            }
        }
    }

    #[test]
    fn two_close_boids_separate() {
        let config = SimConfig::default();
        let rules = vec![Rule::new(
            RuleKind::Separation {
                threshold: config.separation_threshold,
            },
            1.0,
        )];
        let mut sim = Simulation::new(config, rules);

        sim.spawn(Vec2::new(500.0, 500.0), Vec2::ZERO);
        sim.spawn(Vec2::new(530.0, 500.0), Vec2::ZERO);
        sim.tick(0.016);

        let forces = sim.resultant_forces();
        // Each pushed along the line between them, away from the other.
        assert!((forces[0] - Vec2::NEG_X).length() < EPS);
        assert!((forces[1] - Vec2::X).length() < EPS);
    }

    #[test]
    fn identical_runs_are_deterministic() {
        let run = || {
            let config = SimConfig::default();
            let mut sim = Simulation::new(config, config.default_rules());
            for i in 0..24 {
                let angle = i as f32 * 0.7;
                sim.spawn(
                    Vec2::new(400.0 + 40.0 * (i % 6) as f32, 300.0 + 37.0 * (i / 6) as f32),
                    Vec2::new(angle.cos(), angle.sin()) * 20.0,
                );
            }
            for _ in 0..20 {
                sim.tick(1.0 / 60.0);
            }
            sim.boids()
                .iter()
                .map(|b| (b.position(), b.velocity()))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn leaf_bounds_snapshot_tracks_the_flock() {
        let config = SimConfig::default();
        let mut sim = Simulation::new(config, config.default_rules());
        assert!(sim.leaf_bounds().is_empty());

        for i in 0..30 {
            sim.spawn(
                Vec2::new(100.0 + 55.0 * (i % 10) as f32, 200.0 + 90.0 * (i / 10) as f32),
                Vec2::new(5.0, 0.0),
            );
        }
        sim.tick(0.016);

        // 30 boids cannot fit one leaf of capacity 4.
        assert!(sim.leaf_bounds().len() > 1);
        let total: f32 = sim
            .leaf_bounds()
            .iter()
            .map(|r| r.width() * r.height())
            .sum();
        let world_area = config.world_width * config.world_height;
        assert!((total - world_area).abs() / world_area < 1.0e-4);
        assert_eq!(sim.resultant_forces().len(), 30);
    }
}
