//! Steering behaviors for AI movement
//!
//! Each behavior maps a kinematic snapshot to a planar force. Forces are
//! summed with friction into the body's acceleration before integration.

use glam::Vec2;
use rand::Rng;

/// Below this length a vector has no usable direction
const EPSILON: f32 = 1e-5;

/// Kinematic snapshot of the steering agent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kinematics {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Speed the desired velocity is scaled to
    pub max_speed: f32,
    /// Upper bound on the returned steering force
    pub max_force: f32,
}

/// Trait for steering behaviors
pub trait SteeringBehavior {
    /// Calculate the steering force for the agent
    fn calculate(&self, agent: &Kinematics) -> Vec2;
}

/// Steer from the current velocity towards `desired`, limited by max force
fn steer_towards(agent: &Kinematics, desired: Vec2) -> Vec2 {
    (desired - agent.velocity).clamp_length_max(agent.max_force.max(0.0))
}

/// Unit heading of a velocity, if it has one
fn heading(velocity: Vec2) -> Option<Vec2> {
    (velocity.length_squared() > EPSILON * EPSILON).then(|| velocity.normalize())
}

/// Kinetic friction: opposes motion with constant magnitude
#[must_use]
pub fn friction(velocity: Vec2, magnitude: f32) -> Vec2 {
    -velocity.normalize_or_zero() * magnitude
}

/// Seek behavior - move towards target
#[derive(Debug, Clone, Copy)]
pub struct Seek {
    pub target: Vec2,
}

impl Seek {
    #[must_use]
    pub fn new(target: Vec2) -> Self {
        Self { target }
    }
}

impl SteeringBehavior for Seek {
    fn calculate(&self, agent: &Kinematics) -> Vec2 {
        let desired = (self.target - agent.position).normalize_or_zero() * agent.max_speed;
        steer_towards(agent, desired)
    }
}

/// Flee behavior - move away from target
#[derive(Debug, Clone, Copy)]
pub struct Flee {
    pub target: Vec2,
}

impl Flee {
    #[must_use]
    pub fn new(target: Vec2) -> Self {
        Self { target }
    }
}

impl SteeringBehavior for Flee {
    fn calculate(&self, agent: &Kinematics) -> Vec2 {
        let desired = (agent.position - self.target).normalize_or_zero() * agent.max_speed;
        steer_towards(agent, desired)
    }
}

/// Arrive behavior - seek, slowing linearly inside `slow_radius`
#[derive(Debug, Clone, Copy)]
pub struct Arrive {
    pub target: Vec2,
    pub slow_radius: f32,
}

impl Arrive {
    #[must_use]
    pub fn new(target: Vec2, slow_radius: f32) -> Self {
        Self {
            target,
            slow_radius,
        }
    }
}

impl SteeringBehavior for Arrive {
    fn calculate(&self, agent: &Kinematics) -> Vec2 {
        let to_target = self.target - agent.position;
        let distance = to_target.length();

        // Desired velocity is zero on the target: brake
        if distance < EPSILON {
            return steer_towards(agent, Vec2::ZERO);
        }

        let speed = if distance < self.slow_radius {
            agent.max_speed * distance / self.slow_radius
        } else {
            agent.max_speed
        };
        steer_towards(agent, to_target / distance * speed)
    }
}

/// Pursue behavior - seek where a moving target will be
#[derive(Debug, Clone, Copy)]
pub struct Pursue {
    pub target_position: Vec2,
    pub target_velocity: Vec2,
    /// Seconds of linear prediction
    pub lookahead: f32,
}

impl Pursue {
    #[must_use]
    pub fn new(target_position: Vec2, target_velocity: Vec2, lookahead: f32) -> Self {
        Self {
            target_position,
            target_velocity,
            lookahead,
        }
    }

    /// Where the target is predicted to be
    #[must_use]
    pub fn predicted(&self) -> Vec2 {
        self.target_position + self.target_velocity * self.lookahead
    }
}

impl SteeringBehavior for Pursue {
    fn calculate(&self, agent: &Kinematics) -> Vec2 {
        Seek::new(self.predicted()).calculate(agent)
    }
}

/// Wander behavior - seek a point drifting around a circle ahead.
///
/// The wander angle is the behavior's only state and must persist per agent
/// between calls.
#[derive(Debug, Clone)]
pub struct Wander {
    /// Distance of the circle centre ahead of the agent
    pub distance: f32,
    /// Circle radius
    pub radius: f32,
    /// Largest angle change per update (radians)
    pub max_delta: f32,
    /// Current wander angle, relative to the heading
    angle: f32,
}

impl Wander {
    #[must_use]
    pub fn new(distance: f32, radius: f32, max_delta: f32) -> Self {
        Self {
            distance,
            radius,
            max_delta,
            angle: 0.0,
        }
    }

    #[must_use]
    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Random-walk the angle by at most `max_delta`. Returns the change.
    pub fn update<R: Rng + ?Sized>(&mut self, rng: &mut R) -> f32 {
        let limit = self.max_delta.abs();
        let delta = if limit > 0.0 {
            rng.random_range(-limit..=limit)
        } else {
            0.0
        };
        self.angle += delta;
        delta
    }

    /// Point on the wander circle the agent currently seeks
    #[must_use]
    pub fn target(&self, agent: &Kinematics) -> Vec2 {
        let forward = heading(agent.velocity).unwrap_or(Vec2::X);
        let center = agent.position + forward * self.distance;
        let theta = self.angle + forward.to_angle();
        center + Vec2::from_angle(theta) * self.radius
    }

    /// Update the angle, then steer
    pub fn steer<R: Rng + ?Sized>(&mut self, agent: &Kinematics, rng: &mut R) -> Vec2 {
        self.update(rng);
        self.calculate(agent)
    }
}

impl SteeringBehavior for Wander {
    fn calculate(&self, agent: &Kinematics) -> Vec2 {
        Seek::new(self.target(agent)).calculate(agent)
    }
}

/// Obstacle avoidance - sidestep discs that block the path ahead
#[derive(Debug, Clone, Copy)]
pub struct AvoidObstacles<'a> {
    /// Obstacle centres near the agent
    pub obstacles: &'a [Vec2],
    /// Length of the probe ray
    pub lookahead: f32,
    /// Radius of each obstacle disc, including the agent's own size
    pub obstacle_radius: f32,
}

impl<'a> AvoidObstacles<'a> {
    #[must_use]
    pub fn new(obstacles: &'a [Vec2], lookahead: f32, obstacle_radius: f32) -> Self {
        Self {
            obstacles,
            lookahead,
            obstacle_radius,
        }
    }

    /// Free distance along a ray before it touches an obstacle disc.
    ///
    /// Equals `lookahead` for an open ray; negative when the origin already
    /// overlaps an obstacle.
    #[must_use]
    pub fn clearance(&self, origin: Vec2, direction: Vec2) -> f32 {
        self.obstacles
            .iter()
            .filter_map(|&obstacle| {
                let along = (obstacle - origin).dot(direction);
                let closest = origin + direction * along.clamp(0.0, self.lookahead);
                let gap = obstacle.distance(closest) - self.obstacle_radius;
                // Discs behind the origin only matter if we are inside them
                (gap < 0.0 && along > -self.obstacle_radius).then(|| along.max(0.0) + gap)
            })
            .fold(self.lookahead, f32::min)
    }
}

impl SteeringBehavior for AvoidObstacles<'_> {
    fn calculate(&self, agent: &Kinematics) -> Vec2 {
        let Some(forward) = heading(agent.velocity) else {
            return Vec2::ZERO;
        };
        if self.clearance(agent.position, forward) >= self.lookahead {
            return Vec2::ZERO;
        }

        // Sample each side at 45° and 90°; a side is as good as its best ray
        let left = forward.perp();
        let side_clearance = |side: Vec2| {
            let diagonal = (forward + side).normalize();
            self.clearance(agent.position, diagonal)
                .max(self.clearance(agent.position, side))
        };
        let (left_clear, right_clear) = (side_clearance(left), side_clearance(-left));

        let open = |clear: f32| clear >= self.lookahead;
        let side = match (open(left_clear), open(right_clear)) {
            (true, false) => left,
            (false, true) => -left,
            // Both open or both blocked: take the roomier side
            _ if right_clear > left_clear => -left,
            _ => left,
        };
        side * agent.max_speed
    }
}

/// Rotate a direction by `angle` radians, counter-clockwise in the x/z plane
#[must_use]
pub fn rotate(direction: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(angle).rotate(direction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn agent(position: Vec2, velocity: Vec2) -> Kinematics {
        Kinematics {
            position,
            velocity,
            max_speed: 10.0,
            max_force: 5.0,
        }
    }

    #[test]
    fn test_seek() {
        let output = Seek::new(Vec2::new(10.0, 0.0)).calculate(&agent(Vec2::ZERO, Vec2::ZERO));

        assert!(output.x > 0.0);
        assert!((output.length() - 5.0).abs() < 0.01);
    }

    #[test]
    fn test_seek_never_exceeds_max_force() {
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        for _ in 0..500 {
            let mut random_vec =
                || Vec2::new(rng.random_range(-50.0..50.0), rng.random_range(-50.0..50.0));
            let kin = Kinematics {
                position: random_vec(),
                velocity: random_vec(),
                max_speed: 12.0,
                max_force: 3.5,
            };
            let target = random_vec();
            let force = Seek::new(target).calculate(&kin);
            assert!(force.length() <= kin.max_force + 1e-4);
        }
    }

    #[test]
    fn test_seek_at_target_only_cancels_velocity() {
        let kin = agent(Vec2::ONE, Vec2::new(1.0, 0.0));
        let output = Seek::new(Vec2::ONE).calculate(&kin);
        assert!((output - Vec2::new(-1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_flee() {
        let output = Flee::new(Vec2::new(10.0, 0.0)).calculate(&agent(Vec2::ZERO, Vec2::ZERO));

        assert!(output.x < 0.0); // Flee in opposite direction
        assert!(output.length() <= 5.0 + 1e-4);
    }

    #[test]
    fn test_arrive_slowing() {
        let kin = Kinematics {
            max_force: 100.0,
            ..agent(Vec2::ZERO, Vec2::ZERO)
        };

        let far = Arrive::new(Vec2::new(20.0, 0.0), 4.0).calculate(&kin);
        let near = Arrive::new(Vec2::new(1.0, 0.0), 4.0).calculate(&kin);

        assert!((far.x - 10.0).abs() < 1e-4);
        assert!((near.x - 2.5).abs() < 1e-4);
    }

    #[test]
    fn test_arrive_brakes_on_target() {
        let kin = Kinematics {
            max_force: 100.0,
            ..agent(Vec2::new(3.0, 3.0), Vec2::new(2.0, -1.0))
        };
        let output = Arrive::new(Vec2::new(3.0, 3.0), 4.0).calculate(&kin);
        assert!((output - Vec2::new(-2.0, 1.0)).length() < 1e-5);
    }

    #[test]
    fn test_pursue_leads_target() {
        let pursue = Pursue::new(Vec2::new(10.0, 0.0), Vec2::new(0.0, 5.0), 2.0);
        assert_eq!(pursue.predicted(), Vec2::new(10.0, 10.0));

        let output = pursue.calculate(&agent(Vec2::ZERO, Vec2::ZERO));
        assert!(output.x > 0.0 && output.y > 0.0);
        assert!((output.x - output.y).abs() < 1e-4);
    }

    #[test]
    fn test_wander_bounded_per_call() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut wander = Wander::new(5.0, 2.0, 0.3);
        let kin = agent(Vec2::ZERO, Vec2::X);

        for _ in 0..1000 {
            let before = wander.angle();
            let force = wander.steer(&kin, &mut rng);
            assert!((wander.angle() - before).abs() <= 0.3 + 1e-6);
            assert!(force.length() <= kin.max_force + 1e-4);
        }
    }

    #[test]
    fn test_wander_deterministic_with_seed() {
        let run = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut wander = Wander::new(5.0, 2.0, 0.5);
            (0..50).map(|_| wander.update(&mut rng)).collect::<Vec<_>>()
        };

        assert_eq!(run(99), run(99));
        assert_ne!(run(99), run(100));
    }

    #[test]
    fn test_wander_direction_changes_with_angle() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut wander = Wander::new(5.0, 2.0, 0.5);
        let kin = agent(Vec2::ZERO, Vec2::X);

        let output = wander.calculate(&kin);
        // Zero angle: target straight ahead on the circle's far side
        assert!(output.x > 0.0);
        assert!(output.y.abs() < 1e-4);

        while wander.update(&mut rng).abs() < 0.01 {}
        let output2 = wander.calculate(&kin);
        assert!((output - output2).length() > 1e-4);
    }

    #[test]
    fn test_avoid_ignores_clear_path() {
        let obstacles = [Vec2::new(0.0, 10.0)];
        let avoid = AvoidObstacles::new(&obstacles, 5.0, 1.0);
        assert_eq!(avoid.calculate(&agent(Vec2::ZERO, Vec2::X)), Vec2::ZERO);
        // Standing still: no heading, no avoidance
        assert_eq!(avoid.calculate(&agent(Vec2::ZERO, Vec2::ZERO)), Vec2::ZERO);
    }

    #[test]
    fn test_avoid_turns_towards_open_side() {
        // Blocker ahead, a second obstacle off to the left (+y)
        let obstacles = [Vec2::new(3.0, 0.0), Vec2::new(0.0, 3.0), Vec2::new(2.0, 2.0)];
        let avoid = AvoidObstacles::new(&obstacles, 5.0, 1.0);
        let kin = agent(Vec2::ZERO, Vec2::X);

        let force = avoid.calculate(&kin);

        // Perpendicular to travel, scaled by top speed, pointing right (-y)
        assert!(force.x.abs() < 1e-4);
        assert!((force.y + kin.max_speed).abs() < 1e-4);
    }

    #[test]
    fn test_avoid_falls_back_when_boxed_in() {
        let obstacles = [
            Vec2::new(3.0, 0.0),
            Vec2::new(0.0, 2.0),
            Vec2::new(0.0, -4.0),
            Vec2::new(2.0, 2.0),
            Vec2::new(3.0, -3.0),
        ];
        let avoid = AvoidObstacles::new(&obstacles, 5.0, 1.0);
        let kin = agent(Vec2::ZERO, Vec2::X);

        // Both sides blocked, right side (-y) has more room
        let force = avoid.calculate(&kin);
        assert!(force.y < 0.0);
        assert!((force.length() - kin.max_speed).abs() < 1e-4);
    }

    #[test]
    fn test_friction_opposes_motion() {
        let f = friction(Vec2::new(3.0, 4.0), 10.0);
        assert!((f - Vec2::new(-6.0, -8.0)).length() < 1e-4);
        assert_eq!(friction(Vec2::ZERO, 10.0), Vec2::ZERO);
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let r = rotate(Vec2::X, std::f32::consts::FRAC_PI_2);
        assert!((r - Vec2::Y).length() < 1e-5);
    }
}
