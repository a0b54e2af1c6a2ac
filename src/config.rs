use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::obstacles::ObstacleLevel;
use crate::utils::errors::SimError;
use crate::utils::math::deg_to_rad;

/// Half-extent of the landmass: terrain spans x, y in [-WORLD_EXTENT, WORLD_EXTENT].
pub const WORLD_EXTENT: f64 = 1.0;

/// Full configuration surface of the simulation core.
///
/// Everything is a startup constant; there is no runtime file or network
/// configuration. Malformed values are rejected once by [`GameConfig::validate`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameConfig {
    pub terrain: TerrainConfig,
    pub physics: PhysicsConfig,
    pub obstacles: ObstacleConfig,
    pub limits: LimitsConfig,
    pub runways: RunwayConfig,
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), SimError> {
        self.terrain.validate()?;
        self.physics.validate()?;
        self.obstacles.validate()?;
        self.limits.validate()?;
        self.runways.validate()?;
        Ok(())
    }
}

/// Fractal heightfield parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainConfig {
    /// Detail level L; the grid has `2^L + 1` vertices per side.
    pub detail_level: u32,
    /// Initial displacement amplitude of the midpoint noise.
    pub amplitude: f64,
    /// Geometric decay of the noise per subdivision level.
    pub decay: f64,
    /// Heights above this render as snow; also scales the green ramp.
    pub snow_line: f64,
    /// Half-width of the flattened runway corridors.
    pub runway_half_width: f64,
    /// Seeded control heights: the four corners,
    pub corner_height: f64,
    /// the edge midpoints on the y = +-1 sides (shore dips),
    pub shore_height: f64,
    /// the edge midpoints on the x = +-1 sides,
    pub ridge_height: f64,
    /// and the central peak.
    pub peak_height: f64,
}

impl TerrainConfig {
    /// Number of vertices per grid side.
    pub fn grid_size(&self) -> usize {
        (1usize << self.detail_level) + 1
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if !(1..=12).contains(&self.detail_level) {
            return Err(SimError::InvalidConfig(format!(
                "terrain detail level {} outside 1..=12",
                self.detail_level
            )));
        }
        if self.amplitude < 0.0 {
            return Err(SimError::InvalidConfig("terrain amplitude must be non-negative".into()));
        }
        if !(self.decay > 0.0 && self.decay <= 1.0) {
            return Err(SimError::InvalidConfig("terrain decay must be in (0, 1]".into()));
        }
        if self.runway_half_width <= 0.0 {
            return Err(SimError::InvalidConfig("runway half-width must be positive".into()));
        }
        Ok(())
    }
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            detail_level: 8,
            amplitude: 0.75,
            decay: 0.6,
            snow_line: 0.6,
            runway_half_width: 0.004,
            corner_height: 0.1,
            shore_height: -0.3,
            ridge_height: 0.6,
            peak_height: 0.8,
        }
    }
}

/// Force coefficients and dynamics constants for the player aircraft.
///
/// Units are world units (the landmass is 2x2) and seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsConfig {
    /// Gravitational acceleration along -z.
    pub gravity: f64,
    /// Thrust acceleration at full throttle.
    pub thrust_coeff: f64,
    /// Thrust multiplier with reverse engaged while rolling backward.
    pub reverse_creep: f64,
    /// Thrust multiplier with reverse engaged while rolling forward (braking).
    pub reverse_brake: f64,
    /// Lift acceleration per unit of horizontal speed.
    pub lift_coeff: f64,
    /// Lift multipliers for pitch-down / neutral / pitch-up input.
    pub lift_pitch_scale: [f64; 3],
    /// Drag acceleration coefficient.
    pub drag_coeff: f64,
    /// Drag grows with |v|^drag_power.
    pub drag_power: f64,
    /// Below this speed, drag is zeroed and the attitude is left alone.
    pub speed_epsilon: f64,
    /// Roll applied per tick of left/right input while airborne [rad].
    pub roll_rate: f64,
    /// Taxi yaw applied per second of left/right input while grounded [rad/s].
    pub yaw_rate: f64,
    /// Throttle change per tick of throttle input.
    pub throttle_step: f64,
    /// Altitude of the aircraft reference point while on the ground.
    pub ground_height: f64,
    /// Forward offset of the collision tip from the reference point.
    pub tip_forward: f64,
    /// Up offset of the collision tip from the reference point.
    pub tip_up: f64,
    /// Upper clamp on a single integration step [s].
    pub max_dt: f64,
}

impl PhysicsConfig {
    pub fn validate(&self) -> Result<(), SimError> {
        for (name, value) in [
            ("gravity", self.gravity),
            ("thrust_coeff", self.thrust_coeff),
            ("lift_coeff", self.lift_coeff),
            ("drag_coeff", self.drag_coeff),
            ("throttle_step", self.throttle_step),
            ("ground_height", self.ground_height),
            ("max_dt", self.max_dt),
        ] {
            if value <= 0.0 {
                return Err(SimError::InvalidConfig(format!("{name} must be positive")));
            }
        }
        if self.speed_epsilon <= 0.0 {
            return Err(SimError::InvalidConfig("speed_epsilon must be positive".into()));
        }
        Ok(())
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 0.002,
            thrust_coeff: 1.2e-3,
            reverse_creep: -0.2,
            reverse_brake: -1.6,
            lift_coeff: 0.1,
            lift_pitch_scale: [0.4, 1.0, 1.6],
            drag_coeff: 0.0883883,
            drag_power: 1.5,
            speed_epsilon: 1.0e-6,
            roll_rate: 2.0e-3,
            yaw_rate: 0.1,
            throttle_step: 5.0e-3,
            ground_height: 6.0e-4,
            tip_forward: 1.0e-3,
            tip_up: -4.0e-4,
            max_dt: 0.1,
        }
    }
}

/// Obstacle population parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObstacleConfig {
    pub count: usize,
    pub level: ObstacleLevel,
    /// Capsule radius used for collision.
    pub radius: f64,
    /// Capsule half-length along the obstacle heading.
    pub half_length: f64,
    pub min_altitude: f64,
    pub max_altitude: f64,
    pub min_speed: f64,
    pub max_speed: f64,
    /// Toroidal wrap boundary on both horizontal axes.
    pub wrap_bound: f64,
}

impl ObstacleConfig {
    pub fn validate(&self) -> Result<(), SimError> {
        if self.count == 0 {
            return Err(SimError::InvalidConfig("obstacle count must be non-zero".into()));
        }
        if self.radius <= 0.0 || self.half_length <= 0.0 {
            return Err(SimError::InvalidConfig("obstacle capsule dimensions must be positive".into()));
        }
        if self.min_speed <= 0.0 || self.min_speed >= self.max_speed {
            return Err(SimError::InvalidConfig("obstacle speed range must be ordered and positive".into()));
        }
        if self.min_altitude >= self.max_altitude {
            return Err(SimError::InvalidConfig("obstacle altitude range must be ordered".into()));
        }
        if self.wrap_bound < WORLD_EXTENT {
            return Err(SimError::InvalidConfig("obstacle wrap bound must cover the landmass".into()));
        }
        Ok(())
    }
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self {
            count: 75,
            level: ObstacleLevel::Moving,
            radius: 0.03,
            half_length: 0.11,
            min_altitude: 0.4,
            max_altitude: 1.0,
            min_speed: 0.005,
            max_speed: 0.1,
            wrap_bound: 1.2,
        }
    }
}

/// Crash thresholds, the fuel limit, and the win tolerances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Sink rate at touchdown beyond which the landing counts as a crash.
    pub sink_rate: f64,
    /// Maximum |roll| at touchdown [rad].
    pub roll_limit: f64,
    /// Maximum |pitch| at touchdown [rad].
    pub pitch_limit: f64,
    /// Tolerance below the interpolated terrain surface before a mountain crash.
    pub mountain_clearance: f64,
    /// How far beyond the landmass edge the lateral walls begin.
    pub wall_tolerance: f64,
    /// Session time limit [s].
    pub fuel_limit: f64,
    /// Half-width of the destination touchdown box.
    pub win_half_width: f64,
    /// Maximum horizontal speed that still counts as parked.
    pub win_speed: f64,
}

impl LimitsConfig {
    pub fn validate(&self) -> Result<(), SimError> {
        for (name, value) in [
            ("sink_rate", self.sink_rate),
            ("roll_limit", self.roll_limit),
            ("pitch_limit", self.pitch_limit),
            ("wall_tolerance", self.wall_tolerance),
            ("fuel_limit", self.fuel_limit),
            ("win_half_width", self.win_half_width),
            ("win_speed", self.win_speed),
        ] {
            if value <= 0.0 {
                return Err(SimError::InvalidConfig(format!("{name} must be positive")));
            }
        }
        Ok(())
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            sink_rate: 0.025,
            roll_limit: deg_to_rad(20.0),
            pitch_limit: deg_to_rad(20.0),
            mountain_clearance: 0.01,
            wall_tolerance: 0.1,
            fuel_limit: 900.0,
            win_half_width: 0.003,
            win_speed: 0.002,
        }
    }
}

/// An axis-aligned runway strip along the y axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Runway {
    pub center_x: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Runway {
    pub fn contains(&self, x: f64, y: f64, half_width: f64) -> bool {
        (x - self.center_x).abs() <= half_width && y >= self.y_min && y <= self.y_max
    }
}

/// The departure strip (spawn) and the destination strip (win box).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunwayConfig {
    pub departure: Runway,
    pub destination: Runway,
}

impl RunwayConfig {
    /// Where the aircraft sits at session start: the inland end of the
    /// departure runway, at ground height.
    pub fn spawn_point(&self, ground_height: f64) -> Vector3<f64> {
        Vector3::new(self.departure.center_x, self.departure.y_max, ground_height)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        for (name, runway) in [("departure", &self.departure), ("destination", &self.destination)] {
            if runway.y_min >= runway.y_max {
                return Err(SimError::InvalidConfig(format!("{name} runway y band must be ordered")));
            }
        }
        Ok(())
    }
}

impl Default for RunwayConfig {
    fn default() -> Self {
        Self {
            departure: Runway {
                center_x: 0.0,
                y_min: -1.0,
                y_max: -0.9,
            },
            destination: Runway {
                center_x: 0.0,
                y_min: 0.9,
                y_max: 1.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_obstacles() {
        let mut config = GameConfig::default();
        config.obstacles.count = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_detail_level() {
        let mut config = GameConfig::default();
        config.terrain.detail_level = 0;
        assert!(config.validate().is_err());
        config.terrain.detail_level = 13;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_grid_size_power_of_two_plus_one() {
        let config = TerrainConfig {
            detail_level: 8,
            ..TerrainConfig::default()
        };
        assert_eq!(config.grid_size(), 257);
    }

    #[test]
    fn test_rejects_inverted_runway() {
        let mut config = GameConfig::default();
        config.runways.destination.y_min = 1.0;
        config.runways.destination.y_max = 0.9;
        assert!(config.validate().is_err());
    }
}
