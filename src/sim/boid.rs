// One flocking agent: kinematic state plus its steering limits.
// Integration is forward Euler with toroidal wrapping at the world edges.

use glam::Vec2;

use crate::sim::quadtree::Positioned;
use crate::sim::vec_ops::{heading_degrees, normalise};

/// A boid. The id is stable for the boid's lifetime and unique among live
/// boids; the speed/force/perception tunables are fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Boid {
    id: u32,
    position: Vec2,
    velocity: Vec2,
    // Per-tick scratch value: set by apply_force, consumed and zeroed by
    // update.
    acceleration: Vec2,
    max_speed: f32,
    max_force: f32,
    perception: f32,
}

impl Boid {
    pub fn new(
        id: u32,
        position: Vec2,
        velocity: Vec2,
        max_speed: f32,
        max_force: f32,
        perception: f32,
    ) -> Self {
        Self {
            id,
            position,
            velocity,
            acceleration: Vec2::ZERO,
            max_speed,
            max_force,
            perception,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn acceleration(&self) -> Vec2 {
        self.acceleration
    }

    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    pub fn max_force(&self) -> f32 {
        self.max_force
    }

    /// Radius within which other boids count as neighbours.
    pub fn perception(&self) -> f32 {
        self.perception
    }

    /// Sprite heading for the renderer, derived from the current velocity.
    pub fn heading_degrees(&self) -> f32 {
        heading_degrees(self.velocity)
    }

    /// Accept a steering force. Only its direction matters: the acceleration
    /// is always the force direction scaled to `max_force`.
    pub fn apply_force(&mut self, force: Vec2) {
        self.acceleration = normalise(force) * self.max_force;
    }

    /// One forward-Euler step against the world extent. After this returns,
    /// the position lies inside the world rectangle, `|velocity|` is at most
    /// `max_speed`, and the acceleration scratch is zeroed.
    pub fn update(&mut self, dt: f32, world_extent: Vec2) {
        self.position += self.velocity * dt;

        if self.position.x < 0.0 {
            self.position.x += world_extent.x;
        }
        if self.position.x >= world_extent.x {
            self.position.x -= world_extent.x;
        }
        if self.position.y < 0.0 {
            self.position.y += world_extent.y;
        }
        if self.position.y >= world_extent.y {
            self.position.y -= world_extent.y;
        }

        self.velocity += self.acceleration * dt;

        let speed = self.velocity.length();
        if speed > self.max_speed {
            self.velocity = self.velocity / speed * self.max_speed;
        }

        self.acceleration = Vec2::ZERO;
    }
}

impl Positioned for Boid {
    fn position(&self) -> Vec2 {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::Boid;
    use glam::Vec2;

    const WORLD: Vec2 = Vec2::new(1920.0, 1080.0);

    fn boid_at(position: Vec2, velocity: Vec2) -> Boid {
        Boid::new(0, position, velocity, 150.0, 300.0, 90.0)
    }

    #[test]
    fn apply_force_keeps_direction_and_fixes_magnitude() {
        let mut boid = boid_at(Vec2::ZERO, Vec2::ZERO);
        boid.apply_force(Vec2::new(1000.0, 0.0));
        assert_eq!(boid.acceleration(), Vec2::new(300.0, 0.0));

        boid.apply_force(Vec2::new(0.0, -0.001));
        assert_eq!(boid.acceleration(), Vec2::new(0.0, -300.0));

        // Zero force leaves a zero acceleration rather than NaN.
        boid.apply_force(Vec2::ZERO);
        assert_eq!(boid.acceleration(), Vec2::ZERO);
    }

    #[test]
    fn wraps_toroidally_at_the_right_edge() {
        let mut boid = boid_at(Vec2::new(WORLD.x - 0.5, 300.0), Vec2::new(1.0, 0.0));
        boid.update(1.0, WORLD);
        assert!((boid.position().x - 0.5).abs() < 1.0e-4);
        assert_eq!(boid.position().y, 300.0);
    }

    #[test]
    fn wraps_toroidally_at_the_top_edge() {
        let mut boid = boid_at(Vec2::new(10.0, 0.25), Vec2::new(0.0, -1.0));
        boid.update(1.0, WORLD);
        assert!((boid.position().y - (WORLD.y - 0.75)).abs() < 1.0e-3);
    }

    #[test]
    fn speed_is_clamped_after_update() {
        let mut boid = boid_at(Vec2::new(500.0, 500.0), Vec2::new(149.0, 0.0));
        boid.apply_force(Vec2::new(1.0, 0.0));
        boid.update(1.0, WORLD);
        assert!(boid.velocity().length() <= 150.0 + 1.0e-3);
        // Direction preserved by the clamp.
        assert!(boid.velocity().y.abs() < 1.0e-6);
        assert!(boid.velocity().x > 0.0);
    }

    #[test]
    fn acceleration_resets_each_step() {
        let mut boid = boid_at(Vec2::new(100.0, 100.0), Vec2::new(10.0, 0.0));
        boid.apply_force(Vec2::new(0.0, 1.0));
        boid.update(0.016, WORLD);
        assert_eq!(boid.acceleration(), Vec2::ZERO);

        // A second step without a new force leaves the velocity unchanged.
        let velocity = boid.velocity();
        boid.update(0.016, WORLD);
        assert_eq!(boid.velocity(), velocity);
    }
}
