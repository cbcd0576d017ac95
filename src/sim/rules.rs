// The steering rule set.
//
// Each rule maps (boid, neighbour set) to a direction vector. The driver
// normalises every rule's output, scales it by the rule's weight, sums, and
// normalises the resultant again before handing it to `Boid::apply_force` —
// so weights shape the blend direction only, never the force magnitude.

use glam::Vec2;

use crate::sim::boid::Boid;
use crate::sim::vec_ops::{normalise, steer_toward};

/// One steering rule variant with its immutable parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RuleKind {
    /// Hold the current heading when flying alone; idle otherwise.
    Accelerate,
    /// Match the average velocity of everything in perception range.
    Alignment,
    /// Steer toward the centroid of perceived flockmates.
    Cohesion,
    /// Push away from flockmates closer than `threshold`.
    Separation { threshold: f32 },
    /// Steer toward a fixed point.
    Seek { target: Vec2 },
    /// Steer away from a fixed point, falling off with distance squared.
    Avoid { target: Vec2 },
    /// Axis-aligned repulsion that ramps up linearly within
    /// `area_of_effect` of the rectangle's edges.
    BoundingBox {
        top_left: Vec2,
        bottom_right: Vec2,
        area_of_effect: f32,
    },
    /// Pull toward a horizontal ground line from above (y-down world).
    Gravity { ground: f32 },
}

/// A rule plus its blend weight in the composed steering force.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rule {
    pub kind: RuleKind,
    pub weight: f32,
}

impl Rule {
    pub fn new(kind: RuleKind, weight: f32) -> Self {
        Self { kind, weight }
    }

    /// Evaluate this rule for one boid against its neighbour set for the
    /// current tick. Pure: no rule holds per-tick state.
    pub fn evaluate(&self, boid: &Boid, neighbours: &[&Boid]) -> Vec2 {
        match self.kind {
            RuleKind::Accelerate => accelerate(boid, neighbours),
            RuleKind::Alignment => alignment(boid, neighbours),
            RuleKind::Cohesion => cohesion(boid, neighbours),
            RuleKind::Separation { threshold } => separation(boid, neighbours, threshold),
            RuleKind::Seek { target } => steer_toward(boid.position(), boid.velocity(), target),
            RuleKind::Avoid { target } => avoid(boid, target),
            RuleKind::BoundingBox {
                top_left,
                bottom_right,
                area_of_effect,
            } => bounding_box(boid, top_left, bottom_right, area_of_effect),
            RuleKind::Gravity { ground } => gravity(boid, ground),
        }
    }
}

/// A maintain-heading force that only fires when the boid perceives no
/// flockmates at all.
fn accelerate(boid: &Boid, neighbours: &[&Boid]) -> Vec2 {
    let has_company = neighbours.iter().any(|other| {
        other.id() != boid.id()
            && (other.position() - boid.position()).length() < boid.perception()
    });
    if has_company {
        Vec2::ZERO
    } else {
        normalise(boid.velocity())
    }
}

fn alignment(boid: &Boid, neighbours: &[&Boid]) -> Vec2 {
    let mut average_velocity = Vec2::ZERO;
    let mut count = 0u32;
    // The boid's own velocity is part of the average here; alignment is the
    // one rule that does not filter itself out of the neighbour set.
    for other in neighbours {
        if (other.position() - boid.position()).length() < boid.perception() {
            average_velocity += other.velocity();
            count += 1;
        }
    }
    if count == 0 {
        return Vec2::ZERO;
    }
    normalise(average_velocity / count as f32)
}

fn cohesion(boid: &Boid, neighbours: &[&Boid]) -> Vec2 {
    let mut centre_of_mass = Vec2::ZERO;
    let mut count = 0u32;
    for other in neighbours {
        if other.id() == boid.id() {
            continue;
        }
        if (other.position() - boid.position()).length() < boid.perception() {
            centre_of_mass += other.position();
            count += 1;
        }
    }
    if count == 0 {
        return Vec2::ZERO;
    }
    steer_toward(
        boid.position(),
        boid.velocity(),
        centre_of_mass / count as f32,
    )
}

fn separation(boid: &Boid, neighbours: &[&Boid], threshold: f32) -> Vec2 {
    // Accumulate a virtual target: for every too-close neighbour, push the
    // target `threshold` further along the away-direction.
    let mut target = boid.position();
    let mut activated = false;
    for other in neighbours {
        if other.id() == boid.id() {
            continue;
        }
        let distance = (other.position() - boid.position()).length();
        if distance < threshold {
            activated = true;
            let away = normalise(boid.position() - other.position());
            target += away * threshold;
        }
    }
    if activated {
        steer_toward(boid.position(), boid.velocity(), target)
    } else {
        Vec2::ZERO
    }
}

fn avoid(boid: &Boid, target: Vec2) -> Vec2 {
    let distance = (boid.position() - target).length();
    // Unguarded inverse-square falloff: the force spikes as the boid closes
    // on the target.
    -steer_toward(boid.position(), boid.velocity(), target) / (distance * distance)
}

fn bounding_box(boid: &Boid, top_left: Vec2, bottom_right: Vec2, area_of_effect: f32) -> Vec2 {
    let pos = boid.position();

    let mut x_repulsion = if pos.x - top_left.x < area_of_effect {
        area_of_effect - (pos.x - top_left.x)
    } else {
        0.0
    };
    // The far-edge term goes negative inside the margin, pushing back toward
    // the interior.
    if bottom_right.x - pos.x < area_of_effect {
        x_repulsion += bottom_right.x - pos.x - area_of_effect;
    }

    let mut y_repulsion = if pos.y - top_left.y < area_of_effect {
        area_of_effect - (pos.y - top_left.y)
    } else {
        0.0
    };
    if bottom_right.y - pos.y < area_of_effect {
        y_repulsion += bottom_right.y - pos.y - area_of_effect;
    }

    Vec2::new(x_repulsion, y_repulsion)
}

fn gravity(boid: &Boid, ground: f32) -> Vec2 {
    let pos = boid.position();
    if pos.y < ground {
        steer_toward(pos, boid.velocity(), Vec2::new(pos.x, ground))
    } else {
        Vec2::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::{Rule, RuleKind};
    use crate::sim::boid::Boid;
    use glam::Vec2;

    const EPS: f32 = 1.0e-4;

    fn boid(id: u32, position: Vec2, velocity: Vec2) -> Boid {
        Boid::new(id, position, velocity, 150.0, 300.0, 90.0)
    }

    #[test]
    fn neighbour_rules_are_zero_for_an_isolated_boid() {
        let me = boid(0, Vec2::new(500.0, 500.0), Vec2::new(30.0, 0.0));
        let neighbours: Vec<&Boid> = vec![&me]; // the index always returns self

        for kind in [
            RuleKind::Cohesion,
            RuleKind::Separation { threshold: 60.0 },
        ] {
            assert_eq!(Rule::new(kind, 1.0).evaluate(&me, &neighbours), Vec2::ZERO);
        }
    }

    #[test]
    fn accelerate_maintains_heading_when_alone() {
        let me = boid(0, Vec2::new(500.0, 500.0), Vec2::new(30.0, 40.0));
        let neighbours: Vec<&Boid> = vec![&me];

        let force = Rule::new(RuleKind::Accelerate, 1.0).evaluate(&me, &neighbours);
        assert!((force - Vec2::new(0.6, 0.8)).length() < EPS);

        // A flockmate in range silences it.
        let other = boid(1, Vec2::new(520.0, 500.0), Vec2::ZERO);
        let crowded: Vec<&Boid> = vec![&me, &other];
        assert_eq!(
            Rule::new(RuleKind::Accelerate, 1.0).evaluate(&me, &crowded),
            Vec2::ZERO
        );
    }

    #[test]
    fn alignment_includes_the_boid_itself() {
        let me = boid(0, Vec2::new(500.0, 500.0), Vec2::new(10.0, 0.0));
        let other = boid(1, Vec2::new(530.0, 500.0), Vec2::new(0.0, 10.0));
        let neighbours: Vec<&Boid> = vec![&me, &other];

        let force = Rule::new(RuleKind::Alignment, 1.0).evaluate(&me, &neighbours);
        // Average of (10,0) and (0,10), normalised: the diagonal.
        let expected = Vec2::new(1.0, 1.0).normalize();
        assert!((force - expected).length() < EPS);

        // Alone, the average is the boid's own heading.
        let solo: Vec<&Boid> = vec![&me];
        let force = Rule::new(RuleKind::Alignment, 1.0).evaluate(&me, &solo);
        assert!((force - Vec2::X).length() < EPS);
    }

    #[test]
    fn cohesion_steers_toward_the_centroid() {
        let me = boid(0, Vec2::new(500.0, 500.0), Vec2::ZERO);
        let a = boid(1, Vec2::new(540.0, 500.0), Vec2::ZERO);
        let b = boid(2, Vec2::new(540.0, 520.0), Vec2::ZERO);
        let neighbours: Vec<&Boid> = vec![&me, &a, &b];

        let force = Rule::new(RuleKind::Cohesion, 1.0).evaluate(&me, &neighbours);
        let expected = (Vec2::new(540.0, 510.0) - me.position()).normalize();
        assert!((force - expected).length() < EPS);
    }

    #[test]
    fn separation_pushes_directly_away_from_a_close_neighbour() {
        let me = boid(0, Vec2::new(500.0, 500.0), Vec2::ZERO);
        let intruder = boid(1, Vec2::new(530.0, 500.0), Vec2::ZERO);
        let neighbours: Vec<&Boid> = vec![&me, &intruder];

        let rule = Rule::new(RuleKind::Separation { threshold: 60.0 }, 1.0);
        let force = rule.evaluate(&me, &neighbours);
        // Exactly opposite the approach direction.
        assert!((force - Vec2::NEG_X).length() < EPS);

        // Outside the threshold the rule stays quiet.
        let bystander = boid(2, Vec2::new(580.0, 500.0), Vec2::ZERO);
        let distant: Vec<&Boid> = vec![&me, &bystander];
        assert_eq!(rule.evaluate(&me, &distant), Vec2::ZERO);
    }

    #[test]
    fn seek_steers_at_the_target() {
        let me = boid(0, Vec2::new(100.0, 100.0), Vec2::ZERO);
        let rule = Rule::new(
            RuleKind::Seek {
                target: Vec2::new(100.0, 200.0),
            },
            1.0,
        );
        let force = rule.evaluate(&me, &[]);
        assert!((force - Vec2::Y).length() < EPS);
    }

    #[test]
    fn avoid_magnitude_scales_inverse_square() {
        let target = Vec2::new(500.0, 500.0);
        let near = boid(0, target + Vec2::new(10.0, 0.0), Vec2::ZERO);
        let far = boid(1, target + Vec2::new(30.0, 0.0), Vec2::ZERO);

        let rule = Rule::new(RuleKind::Avoid { target }, 1.0);
        let near_force = rule.evaluate(&near, &[]);
        let far_force = rule.evaluate(&far, &[]);

        // Both point away from the target along +x.
        assert!(near_force.x > 0.0 && far_force.x > 0.0);
        // Tripling the distance cuts the magnitude ninefold.
        let ratio = near_force.length() / far_force.length();
        assert!((ratio - 9.0).abs() < 1.0e-2, "ratio was {ratio}");
    }

    #[test]
    fn bounding_box_repels_linearly_inside_the_margin() {
        let rule_kind = RuleKind::BoundingBox {
            top_left: Vec2::new(100.0, 100.0),
            bottom_right: Vec2::new(900.0, 900.0),
            area_of_effect: 50.0,
        };
        let rule = Rule::new(rule_kind, 1.0);

        // Deep interior: no force.
        let centred = boid(0, Vec2::new(500.0, 500.0), Vec2::ZERO);
        assert_eq!(rule.evaluate(&centred, &[]), Vec2::ZERO);

        // 20 inside the left margin: pushed right by the remaining 30.
        let left = boid(1, Vec2::new(120.0, 500.0), Vec2::ZERO);
        let force = rule.evaluate(&left, &[]);
        assert!((force - Vec2::new(30.0, 0.0)).length() < EPS);

        // 20 inside the bottom margin: pushed up (negative y) by 30.
        let low = boid(2, Vec2::new(500.0, 880.0), Vec2::ZERO);
        let force = rule.evaluate(&low, &[]);
        assert!((force - Vec2::new(0.0, -30.0)).length() < EPS);
    }

    #[test]
    fn gravity_only_pulls_from_above_the_ground_line() {
        let rule = Rule::new(RuleKind::Gravity { ground: 800.0 }, 1.0);

        let airborne = boid(0, Vec2::new(400.0, 300.0), Vec2::ZERO);
        let force = rule.evaluate(&airborne, &[]);
        assert!((force - Vec2::Y).length() < EPS);

        let grounded = boid(1, Vec2::new(400.0, 800.0), Vec2::ZERO);
        assert_eq!(rule.evaluate(&grounded, &[]), Vec2::ZERO);
    }
}
