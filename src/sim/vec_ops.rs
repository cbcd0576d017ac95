// Shared vector helpers used by every other simulation module.

use glam::Vec2;

/// Zero-safe normalisation: returns `v / |v|` for a non-zero vector and the
/// vector unchanged otherwise, so the zero vector maps to itself instead of
/// NaN.
pub fn normalise(v: Vec2) -> Vec2 {
    let mag = v.length();
    if mag > 0.0 { v / mag } else { v }
}

/// Unit direction that steers a boid at `position` moving with `velocity`
/// toward `target`. Subtracting the current velocity acts as a braking term
/// so boids ease onto the target instead of orbiting it.
pub fn steer_toward(position: Vec2, velocity: Vec2, target: Vec2) -> Vec2 {
    normalise(target - position - velocity)
}

/// Convert a direction vector to a sprite heading in degrees.
///
/// The mapping is non-standard on purpose: the axis special cases and the
/// quadrant offsets below are what the boid sprite artwork is tuned against,
/// so they are kept as-is rather than replaced with `atan2`. Note in
/// particular that a pure +x direction maps to 180 while a pure -x direction
/// maps to 0.
pub fn heading_degrees(v: Vec2) -> f32 {
    if v.x == 0.0 {
        return if v.y > 0.0 {
            90.0
        } else if v.y == 0.0 {
            0.0
        } else {
            270.0
        };
    }
    if v.y == 0.0 {
        return if v.x >= 0.0 { 180.0 } else { 0.0 };
    }

    let degrees = (v.y / v.x).atan().to_degrees();
    if v.x < 0.0 {
        degrees + 180.0
    } else if v.y < 0.0 {
        degrees + 360.0
    } else {
        degrees
    }
}

#[cfg(test)]
mod tests {
    use super::{heading_degrees, normalise, steer_toward};
    use glam::Vec2;

    const EPS: f32 = 1.0e-4;

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn normalise_zero_vector_is_identity() {
        let zero = Vec2::ZERO;
        assert_eq!(normalise(zero), zero);
        assert_eq!(normalise(normalise(zero)), zero);
    }

    #[test]
    fn normalise_produces_unit_length() {
        for v in [
            Vec2::new(3.0, 4.0),
            Vec2::new(-0.01, 0.02),
            Vec2::new(1500.0, -900.0),
        ] {
            assert_close(normalise(v).length(), 1.0);
            // Idempotent up to float tolerance.
            assert!((normalise(normalise(v)) - normalise(v)).length() < EPS);
        }
    }

    #[test]
    fn steer_toward_damps_with_current_velocity() {
        let position = Vec2::new(10.0, 10.0);
        let target = Vec2::new(20.0, 10.0);

        // At rest the steer is straight at the target.
        let at_rest = steer_toward(position, Vec2::ZERO, target);
        assert!((at_rest - Vec2::X).length() < EPS);

        // Already moving there faster than the gap: the brake flips the sign.
        let overshooting = steer_toward(position, Vec2::new(25.0, 0.0), target);
        assert!((overshooting - Vec2::NEG_X).length() < EPS);
    }

    #[test]
    fn steer_toward_zero_gap_is_zero() {
        let position = Vec2::new(5.0, 5.0);
        let velocity = Vec2::new(1.0, -1.0);
        // target - position - velocity == 0
        let target = position + velocity;
        assert_eq!(steer_toward(position, velocity, target), Vec2::ZERO);
    }

    #[test]
    fn heading_axis_cases() {
        assert_close(heading_degrees(Vec2::new(0.0, 2.0)), 90.0);
        assert_close(heading_degrees(Vec2::new(0.0, 0.0)), 0.0);
        assert_close(heading_degrees(Vec2::new(0.0, -7.5)), 270.0);
        assert_close(heading_degrees(Vec2::new(3.0, 0.0)), 180.0);
        assert_close(heading_degrees(Vec2::new(-3.0, 0.0)), 0.0);
    }

    #[test]
    fn heading_quadrant_offsets() {
        assert_close(heading_degrees(Vec2::new(1.0, 1.0)), 45.0);
        assert_close(heading_degrees(Vec2::new(-1.0, 1.0)), 135.0);
        assert_close(heading_degrees(Vec2::new(-1.0, -1.0)), 225.0);
        assert_close(heading_degrees(Vec2::new(1.0, -1.0)), 315.0);
    }
}
