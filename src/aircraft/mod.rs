mod controls;

pub use controls::{InputState, KeyCode, PitchInput};

use log::debug;
use nalgebra::{UnitQuaternion, UnitVector3, Vector3};
use serde::{Deserialize, Serialize};

use crate::config::{PhysicsConfig, WORLD_EXTENT};
use crate::utils::math::{azimuth, horizontal_speed, normalize_angle};

/// Body axes in the untransformed reference pose: the aircraft spawns on the
/// departure runway facing -y, with z up.
pub const FORWARD_REF: Vector3<f64> = Vector3::new(0.0, -1.0, 0.0);
pub const UP_REF: Vector3<f64> = Vector3::new(0.0, 0.0, 1.0);
pub const RIGHT_REF: Vector3<f64> = Vector3::new(-1.0, 0.0, 0.0);

/// Full dynamic state of the player aircraft.
///
/// The attitude is free of any independent angular state: each tick it is
/// re-derived by rotating the current forward axis onto the velocity
/// direction, so velocity is the single source of truth for where the nose
/// points. Roll is the only extra degree of freedom and only while airborne.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Aircraft {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub attitude: UnitQuaternion<f64>,
    pub grounded: bool,
    pub throttle: f64,
    pub reverse: bool,
    /// Session time consumed so far [s].
    pub elapsed: f64,
    config: PhysicsConfig,
    spawn: Vector3<f64>,
}

impl Aircraft {
    pub fn new(config: PhysicsConfig, spawn: Vector3<f64>) -> Self {
        Self {
            position: spawn,
            velocity: Vector3::zeros(),
            attitude: UnitQuaternion::identity(),
            grounded: true,
            throttle: 0.0,
            reverse: false,
            elapsed: 0.0,
            config,
            spawn,
        }
    }

    pub fn physics(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Back to the spawn point with everything zeroed.
    pub fn reset(&mut self) {
        self.position = self.spawn;
        self.velocity = Vector3::zeros();
        self.attitude = UnitQuaternion::identity();
        self.grounded = true;
        self.throttle = 0.0;
        self.reverse = false;
        self.elapsed = 0.0;
    }

    pub fn forward(&self) -> Vector3<f64> {
        self.attitude * FORWARD_REF
    }

    pub fn up(&self) -> Vector3<f64> {
        self.attitude * UP_REF
    }

    pub fn right(&self) -> Vector3<f64> {
        self.attitude * RIGHT_REF
    }

    /// Bank angle: how far the right wing dips below the horizon.
    pub fn roll(&self) -> f64 {
        self.right().angle(&UP_REF) - std::f64::consts::FRAC_PI_2
    }

    /// Nose elevation above the horizon.
    pub fn pitch(&self) -> f64 {
        std::f64::consts::FRAC_PI_2 - self.forward().angle(&UP_REF)
    }

    /// Slip angle between the nose heading and the velocity track, in
    /// (-pi, pi]. Zero when (nearly) stationary.
    pub fn slip(&self) -> f64 {
        if self.velocity.norm() < self.config.speed_epsilon {
            return 0.0;
        }
        normalize_angle(azimuth(&self.forward()) - azimuth(&self.velocity))
    }

    /// Compass azimuth of the nose.
    pub fn heading(&self) -> f64 {
        azimuth(&self.forward())
    }

    /// Rolling tail-first: the track points more than 90 degrees away from
    /// the nose.
    pub fn moving_backward(&self) -> bool {
        self.slip().abs() > std::f64::consts::FRAC_PI_2
    }

    pub fn horizontal_speed(&self) -> f64 {
        horizontal_speed(&self.velocity)
    }

    /// Speed readout, negated while rolling backward.
    pub fn indicated_speed(&self) -> f64 {
        let speed = self.velocity.norm();
        if self.moving_backward() {
            -speed
        } else {
            speed
        }
    }

    /// The nose probe used for every collision test.
    pub fn tip(&self) -> Vector3<f64> {
        self.position + self.forward() * self.config.tip_forward + self.up() * self.config.tip_up
    }

    /// Whether the reference point is above the landmass. The upper edges
    /// are exclusive so a point exactly on x = 1 or y = 1 counts as ocean.
    pub fn over_land(&self) -> bool {
        (-WORLD_EXTENT..WORLD_EXTENT).contains(&self.position.x)
            && (-WORLD_EXTENT..WORLD_EXTENT).contains(&self.position.y)
    }

    /// Advance the aircraft by one tick.
    pub fn step(&mut self, dt: f64, input: &InputState) {
        let dt = self.integrate(dt, input);
        self.settle(dt, input);
    }

    /// First half of a tick: throttle, translation, and the force update.
    /// Returns the (possibly clamped) dt actually applied, which the caller
    /// must pass on to [`Aircraft::settle`]. Crash conditions are meant to
    /// be judged between the two halves, on the pre-contact velocity.
    pub fn integrate(&mut self, dt: f64, input: &InputState) -> f64 {
        let dt = if dt > self.config.max_dt {
            debug!("clamping oversized step {dt:.3}s to {:.3}s", self.config.max_dt);
            self.config.max_dt
        } else {
            dt
        };
        self.apply_throttle_input(input);
        self.position += self.velocity * dt;
        self.apply_forces(dt, input.pitch());
        dt
    }

    /// Second half of a tick: ground contact, steering, and attitude.
    pub fn settle(&mut self, dt: f64, input: &InputState) {
        self.update_ground_state();
        self.apply_steering(dt, input.steer());
        self.align_with_velocity();
        self.elapsed += dt;
    }

    /// Throttle moves a fixed step per tick, not per second, so holding the
    /// key sweeps idle to full in 200 ticks regardless of frame rate.
    fn apply_throttle_input(&mut self, input: &InputState) {
        self.throttle = (self.throttle + input.throttle() * self.config.throttle_step).clamp(0.0, 1.0);
    }

    fn apply_forces(&mut self, dt: f64, pitch: PitchInput) {
        let config = &self.config;
        let forward = self.forward();

        let mut accel = Vector3::new(0.0, 0.0, -config.gravity);

        // Thrust acts along the nose. Reverse is a weak push-back when
        // already rolling backward and a strong brake otherwise.
        let thrust_scale = if self.reverse {
            if self.moving_backward() {
                config.reverse_creep
            } else {
                config.reverse_brake
            }
        } else {
            1.0
        };
        accel += forward * (config.thrust_coeff * self.throttle * thrust_scale);

        // Lift scales with horizontal speed and the pitch command, directed
        // along the part of the up axis orthogonal to the horizontal track.
        let pitch_scale = match pitch {
            PitchInput::Down => config.lift_pitch_scale[0],
            PitchInput::Neutral => config.lift_pitch_scale[1],
            PitchInput::Up => config.lift_pitch_scale[2],
        };
        let forward_flat = Vector3::new(forward.x, forward.y, 0.0);
        if let Some(track) = UnitVector3::try_new(forward_flat, config.speed_epsilon) {
            let up = self.up();
            let lift_dir = up - track.into_inner() * up.dot(&track);
            if let Some(lift_dir) = UnitVector3::try_new(lift_dir, config.speed_epsilon) {
                accel += lift_dir.into_inner()
                    * (config.lift_coeff * pitch_scale * self.horizontal_speed());
            }
        }

        // Drag opposes the nose, not the track, and cuts off near rest so a
        // parked aircraft does not creep.
        let speed = self.velocity.norm();
        if speed >= config.speed_epsilon {
            accel -= forward * (config.drag_coeff * speed.powf(config.drag_power));
        }

        self.velocity += accel * dt;
    }

    /// Ground contact state machine. Land keeps the aircraft pinned at
    /// ground height until it climbs; driving off the coast drops it over
    /// the ocean.
    fn update_ground_state(&mut self) {
        if self.grounded {
            if self.velocity.z > 0.0 {
                self.grounded = false;
            } else if self.over_land() {
                self.velocity.z = 0.0;
                self.position.z = self.config.ground_height;
            } else {
                self.grounded = false;
            }
        } else if self.over_land() && self.position.z <= self.config.ground_height {
            self.velocity.z = 0.0;
            self.position.z = self.config.ground_height;
            self.grounded = true;
        }
    }

    fn apply_steering(&mut self, dt: f64, steer: f64) {
        if steer == 0.0 {
            return;
        }
        if self.grounded {
            // Taxi steering turns the velocity itself; the attitude follows
            // in the alignment pass.
            let yaw = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), -steer * self.config.yaw_rate * dt);
            self.velocity = yaw * self.velocity;
        } else {
            // Roll is a fixed angle per tick, matching the throttle step.
            if let Some(axis) = UnitVector3::try_new(self.forward(), self.config.speed_epsilon) {
                let roll = UnitQuaternion::from_axis_angle(&axis, steer * self.config.roll_rate);
                self.attitude = roll * self.attitude;
            }
        }
    }

    /// Rotate the nose onto the track (or onto the reversed track while
    /// rolling backward), then strip any bank while on the ground.
    fn align_with_velocity(&mut self) {
        if self.velocity.norm() >= self.config.speed_epsilon {
            // The nose chases the track unless the track points behind the
            // nose, in which case it chases the reversed track. This keeps
            // the aircraft facing forward while being pushed backward.
            let target = if self.forward().dot(&self.velocity) < 0.0 {
                -self.velocity
            } else {
                self.velocity
            };
            let correction =
                UnitQuaternion::rotation_between(&self.forward(), &target).unwrap_or_else(UnitQuaternion::identity);
            self.attitude = correction * self.attitude;
            self.attitude.renormalize();
        }
        if self.grounded {
            let roll = self.roll();
            if roll.abs() > 0.0 {
                if let Some(axis) = UnitVector3::try_new(self.forward(), self.config.speed_epsilon) {
                    self.attitude = UnitQuaternion::from_axis_angle(&axis, -roll) * self.attitude;
                }
            }
        }
    }
}
