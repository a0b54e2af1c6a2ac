use nalgebra::{UnitQuaternion, Vector3};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::{ObstacleConfig, WORLD_EXTENT};

/// Difficulty setting for the balloon field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleLevel {
    /// No balloons take part in collision at all.
    None,
    /// Balloons hang in place.
    Static,
    /// Balloons drift along their headings and wrap around the map.
    #[default]
    Moving,
}

/// One drifting balloon, modelled as a horizontal capsule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub origin: Vector3<f64>,
    /// Compass heading of the drift [rad].
    pub heading: f64,
    pub velocity: Vector3<f64>,
    /// Yaw of the capsule long axis, cached for rendering layers.
    pub rotation: UnitQuaternion<f64>,
}

impl Obstacle {
    fn spawn(config: &ObstacleConfig, rng: &mut ChaCha8Rng) -> Self {
        let origin = Vector3::new(
            rng.gen_range(-WORLD_EXTENT..WORLD_EXTENT),
            rng.gen_range(-WORLD_EXTENT..WORLD_EXTENT),
            rng.gen_range(config.min_altitude..config.max_altitude),
        );
        let heading = rng.gen_range(-std::f64::consts::PI..std::f64::consts::PI);
        let speed = rng.gen_range(config.min_speed..config.max_speed);
        Self::at(origin, heading, speed)
    }

    pub fn at(origin: Vector3<f64>, heading: f64, speed: f64) -> Self {
        Self {
            origin,
            heading,
            velocity: Vector3::new(-speed * heading.sin(), speed * heading.cos(), 0.0),
            rotation: UnitQuaternion::from_axis_angle(&Vector3::z_axis(), heading),
        }
    }

    /// Capsule endpoints: the nose leads along the drift heading, the tail
    /// trails behind.
    pub fn endpoints(&self, half_length: f64) -> (Vector3<f64>, Vector3<f64>) {
        let along = Vector3::new(-half_length * self.heading.sin(), half_length * self.heading.cos(), 0.0);
        (self.origin + along, self.origin - along)
    }

    /// Whether `probe` lies inside the capsule. Points beyond either end cap
    /// are misses; the game never noticed the missing hemispheres and the
    /// capsules are long enough that nobody else will either.
    pub fn probe_hit(&self, probe: &Vector3<f64>, half_length: f64, radius: f64) -> bool {
        let (a, b) = self.endpoints(half_length);
        let axis = (b - a) / (2.0 * half_length);
        let offset = probe - a;
        let along = offset.dot(&axis);
        if along <= 0.0 || along >= 2.0 * half_length {
            return false;
        }
        offset.cross(&axis).norm() < radius
    }
}

/// The full balloon population. Spawned once per session seed; a restart
/// keeps the same balloons in their current positions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObstacleField {
    config: ObstacleConfig,
    obstacles: Vec<Obstacle>,
}

impl ObstacleField {
    pub fn new(config: ObstacleConfig, rng: &mut ChaCha8Rng) -> Self {
        let obstacles = (0..config.count).map(|_| Obstacle::spawn(&config, rng)).collect();
        Self { config, obstacles }
    }

    /// Rebuild a field from a known population, e.g. a recorded session.
    pub fn from_parts(config: ObstacleConfig, obstacles: Vec<Obstacle>) -> Self {
        Self { config, obstacles }
    }

    pub fn level(&self) -> ObstacleLevel {
        self.config.level
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Drift every balloon and wrap it back onto the map. Static and
    /// disabled fields never move.
    pub fn step(&mut self, dt: f64) {
        if self.config.level != ObstacleLevel::Moving {
            return;
        }
        let bound = self.config.wrap_bound;
        let span = 2.0 * bound;
        for obstacle in &mut self.obstacles {
            obstacle.origin += obstacle.velocity * dt;
            for axis in 0..2 {
                if obstacle.origin[axis] > bound {
                    obstacle.origin[axis] -= span;
                } else if obstacle.origin[axis] < -bound {
                    obstacle.origin[axis] += span;
                }
            }
        }
    }

    /// Whether `probe` is inside any balloon. Always false with the field
    /// disabled.
    pub fn hit_test(&self, probe: &Vector3<f64>) -> bool {
        if self.config.level == ObstacleLevel::None {
            return false;
        }
        self.obstacles
            .iter()
            .any(|o| o.probe_hit(probe, self.config.half_length, self.config.radius))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;

    fn field(level: ObstacleLevel) -> ObstacleField {
        let config = ObstacleConfig {
            level,
            ..ObstacleConfig::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        ObstacleField::new(config, &mut rng)
    }

    #[test]
    fn test_spawn_ranges() {
        let field = field(ObstacleLevel::Moving);
        let config = ObstacleConfig::default();
        assert_eq!(field.obstacles().len(), config.count);
        for o in field.obstacles() {
            assert!((-1.0..1.0).contains(&o.origin.x));
            assert!((-1.0..1.0).contains(&o.origin.y));
            assert!((config.min_altitude..config.max_altitude).contains(&o.origin.z));
            let speed = o.velocity.norm();
            assert!((config.min_speed..config.max_speed).contains(&speed));
            assert_relative_eq!(o.velocity.z, 0.0);
        }
    }

    #[test]
    fn test_moving_field_drifts_along_heading() {
        let mut field = field(ObstacleLevel::Moving);
        let before: Vec<_> = field.obstacles().iter().map(|o| o.origin).collect();
        field.step(1.0);
        for (o, start) in field.obstacles().iter().zip(&before) {
            let expected = start + o.velocity;
            // Wrapping may relocate an obstacle that crossed the boundary.
            if expected.x.abs() <= 1.2 && expected.y.abs() <= 1.2 {
                assert_relative_eq!(o.origin, expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_static_field_never_moves() {
        let mut field = field(ObstacleLevel::Static);
        let before: Vec<_> = field.obstacles().iter().map(|o| o.origin).collect();
        field.step(100.0);
        for (o, start) in field.obstacles().iter().zip(&before) {
            assert_eq!(&o.origin, start);
        }
    }

    #[test]
    fn test_wrap_at_boundary() {
        let config = ObstacleConfig::default();
        let mut field = field(ObstacleLevel::Moving);
        field.obstacles[0] = Obstacle::at(Vector3::new(1.19, 0.0, 0.5), -std::f64::consts::FRAC_PI_2, 0.05);
        // Heading -pi/2 drifts along +x at 0.05 per second.
        field.step(1.0);
        let x = field.obstacles()[0].origin.x;
        assert_relative_eq!(x, 1.24 - 2.0 * config.wrap_bound, epsilon = 1e-12);
    }

    #[test]
    fn test_capsule_hit_and_miss() {
        let config = ObstacleConfig::default();
        let o = Obstacle::at(Vector3::new(0.0, 0.0, 0.5), 0.0, 0.01);
        // Heading 0 points the capsule along +y.
        assert!(o.probe_hit(&Vector3::new(0.0, 0.0, 0.5), config.half_length, config.radius));
        assert!(o.probe_hit(
            &Vector3::new(config.radius * 0.99, 0.05, 0.5),
            config.half_length,
            config.radius
        ));
        // Just outside the radius.
        assert!(!o.probe_hit(
            &Vector3::new(config.radius * 1.01, 0.0, 0.5),
            config.half_length,
            config.radius
        ));
        // Beyond the end cap.
        assert!(!o.probe_hit(
            &Vector3::new(0.0, config.half_length * 1.01, 0.5),
            config.half_length,
            config.radius
        ));
        // Vertically clear.
        assert!(!o.probe_hit(
            &Vector3::new(0.0, 0.0, 0.5 + config.radius * 1.01),
            config.half_length,
            config.radius
        ));
    }

    #[test]
    fn test_disabled_field_never_hits() {
        let mut field = field(ObstacleLevel::None);
        field.obstacles[0] = Obstacle::at(Vector3::new(0.0, 0.0, 0.5), 0.0, 0.01);
        assert!(!field.hit_test(&Vector3::new(0.0, 0.0, 0.5)));
    }

    #[test]
    fn test_same_seed_same_population() {
        let a = field(ObstacleLevel::Moving);
        let b = field(ObstacleLevel::Moving);
        for (x, y) in a.obstacles().iter().zip(b.obstacles()) {
            assert_eq!(x.origin, y.origin);
            assert_eq!(x.heading, y.heading);
        }
    }
}
