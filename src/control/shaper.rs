// Operator input shaping: raw sticks in, drive command out.
//
// Pipeline per cycle: deadband each axis, polar slew-limit the translation
// vector, slew or heading-lock the rotation, then optionally rotate the
// result from field frame into robot frame. A held lock input skips all of
// it and returns the locked command as-is.
//
// The polar limiter treats translation as (direction, magnitude) instead
// of limiting x and y separately: direction changes are cheap near zero
// speed and expensive at full speed, which approximates a bounded lateral
// acceleration without ever clipping the commanded direction.

use std::f64::consts::PI;

use crate::chassis::types::{ChassisVelocity, DriveCommand};
use crate::config;
use crate::math::{angle_difference, step_towards_circular, wrap_to_pi, wrap_to_tau};
use crate::messages::OperatorFrame;

use super::profile::{Constraints, ProfileState, TrapezoidProfile};
use super::slew::SlewRateLimiter;

// Angular gap between commanded and current translation direction that
// selects the limiter branch: below NEAR we steer and accelerate freely,
// above REVERSE we treat the input as a reversal.
const DIRECTION_GAP_NEAR_RAD: f64 = 0.45 * PI;
const DIRECTION_GAP_REVERSE_RAD: f64 = 0.85 * PI;

// Below this magnitude the direction may snap instead of slewing
const MAGNITUDE_EPSILON: f64 = 1e-4;

// Direction slew applied while the magnitude is ~0 (effectively instant)
const INSTANT_DIRECTION_RATE_RADPS: f64 = 500.0;

/// Heading reading handed to the shaper each cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadingState {
    pub heading_rad: f64,
    pub rate_radps: f64,
}

/// Heading-lock mode: rotation follows a motion profile toward the heading
/// the rotation stick points at, instead of mapping stick to rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadingLockConfig {
    /// Stick deflection (either axis) that retargets the profile.
    pub engage_threshold: f64,
    pub max_velocity_radps: f64,
    pub max_acceleration_radps2: f64,
}

impl Default for HeadingLockConfig {
    fn default() -> Self {
        Self {
            engage_threshold: config::HEADING_LOCK_THRESHOLD,
            max_velocity_radps: config::HEADING_LOCK_MAX_VEL_RADPS,
            max_acceleration_radps2: config::HEADING_LOCK_MAX_ACCEL_RADPS2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputShaperConfig {
    pub deadband: f64,
    pub max_speed_mps: f64,
    pub max_rotation_radps: f64,
    /// Translation magnitude slew, fraction of full scale per second.
    pub magnitude_slew_per_s: f64,
    /// Translation direction slew at full magnitude, rad/s.
    pub direction_slew_radps: f64,
    /// Rotation axis slew, fraction of full scale per second.
    pub rotation_slew_per_s: f64,
    /// Interpret sticks in the field frame, rotating by the heading.
    pub field_oriented: bool,
    pub heading_lock: Option<HeadingLockConfig>,
}

impl Default for InputShaperConfig {
    fn default() -> Self {
        Self {
            deadband: config::DRIVE_DEADBAND,
            max_speed_mps: config::TELEOP_MAX_SPEED_MPS,
            max_rotation_radps: config::TELEOP_MAX_ROTATION_RADPS,
            magnitude_slew_per_s: config::MAGNITUDE_SLEW_PER_S,
            direction_slew_radps: config::DIRECTION_SLEW_RADPS,
            rotation_slew_per_s: config::ROTATION_SLEW_PER_S,
            field_oriented: true,
            heading_lock: None,
        }
    }
}

/// Symmetric deadband with rescale: inside ±`deadband` snaps to zero,
/// outside is stretched so full deflection still reaches ±1.
fn apply_deadband(value: f64, deadband: f64) -> f64 {
    if value.abs() > deadband {
        (value - deadband.copysign(value)) / (1.0 - deadband)
    } else {
        0.0
    }
}

pub struct InputShaper {
    config: InputShaperConfig,
    translation_dir_rad: f64,
    translation_mag: f64,
    magnitude_limiter: SlewRateLimiter,
    rotation_limiter: SlewRateLimiter,
    heading_target_rad: f64,
}

impl InputShaper {
    pub fn new(config: InputShaperConfig) -> Self {
        Self {
            config,
            translation_dir_rad: 0.0,
            translation_mag: 0.0,
            magnitude_limiter: SlewRateLimiter::new(config.magnitude_slew_per_s),
            rotation_limiter: SlewRateLimiter::new(config.rotation_slew_per_s),
            heading_target_rad: 0.0,
        }
    }

    /// Shape one operator frame into a drive command. `heading` feeds the
    /// field-oriented transform and heading lock; when it is absent both
    /// fall back to robot-oriented, stick-rate behavior.
    pub fn shape(
        &mut self,
        frame: &OperatorFrame,
        heading: Option<HeadingState>,
        dt_s: f64,
    ) -> DriveCommand {
        if frame.lock {
            return DriveCommand::LOCKED;
        }

        // Gamepad polarity: stick up is -y, stick right is +x; chassis
        // wants +x forward, +y left, CCW-positive rotation.
        let x_input = -apply_deadband(frame.left_y, self.config.deadband);
        let y_input = -apply_deadband(frame.left_x, self.config.deadband);
        let rotation_input = -apply_deadband(frame.right_x, self.config.deadband);

        let (x_shaped, y_shaped) = self.limit_translation(x_input, y_input, dt_s);

        let omega_radps = match (self.config.heading_lock, heading) {
            (Some(lock), Some(heading)) => self.snap_to_heading(lock, frame, heading, dt_s),
            _ => {
                self.rotation_limiter.calculate(rotation_input, dt_s)
                    * self.config.max_rotation_radps
            }
        };

        let vx_mps = x_shaped * self.config.max_speed_mps;
        let vy_mps = y_shaped * self.config.max_speed_mps;

        let velocity = match heading {
            Some(heading) if self.config.field_oriented => ChassisVelocity::from_field_relative(
                vx_mps,
                vy_mps,
                omega_radps,
                heading.heading_rad,
            ),
            _ => ChassisVelocity::new(vx_mps, vy_mps, omega_radps),
        };

        DriveCommand::moving(velocity)
    }

    /// Polar slew limiting over the translation vector. Returns the shaped
    /// (x, y) pair, still in input units.
    fn limit_translation(&mut self, x_input: f64, y_input: f64, dt_s: f64) -> (f64, f64) {
        let input_dir = y_input.atan2(x_input);
        let input_mag = x_input.hypot(y_input);

        let direction_rate = if self.translation_mag != 0.0 {
            (self.config.direction_slew_radps / self.translation_mag).abs()
        } else {
            INSTANT_DIRECTION_RATE_RADPS
        };

        let gap = angle_difference(input_dir, self.translation_dir_rad);
        if gap < DIRECTION_GAP_NEAR_RAD {
            self.translation_dir_rad = step_towards_circular(
                self.translation_dir_rad,
                input_dir,
                direction_rate * dt_s,
            );
            self.translation_mag = self.magnitude_limiter.calculate(input_mag, dt_s);
        } else if gap > DIRECTION_GAP_REVERSE_RAD {
            if self.translation_mag > MAGNITUDE_EPSILON {
                // Reversal at speed: scrub the magnitude off first, holding
                // direction, so the vector never flips discontinuously
                self.translation_mag = self.magnitude_limiter.calculate(0.0, dt_s);
            } else {
                self.translation_dir_rad = wrap_to_tau(self.translation_dir_rad + PI);
                self.translation_mag = self.magnitude_limiter.calculate(input_mag, dt_s);
            }
        } else {
            // Sharp turn: steer toward the new direction but never
            // accelerate into it
            self.translation_dir_rad = step_towards_circular(
                self.translation_dir_rad,
                input_dir,
                direction_rate * dt_s,
            );
            self.translation_mag = self.magnitude_limiter.calculate(0.0, dt_s);
        }

        (
            self.translation_mag * self.translation_dir_rad.cos(),
            self.translation_mag * self.translation_dir_rad.sin(),
        )
    }

    /// Profiled rotation toward the heading the rotation stick points at.
    fn snap_to_heading(
        &mut self,
        lock: HeadingLockConfig,
        frame: &OperatorFrame,
        heading: HeadingState,
        dt_s: f64,
    ) -> f64 {
        if frame.right_x.abs() > lock.engage_threshold
            || frame.right_y.abs() > lock.engage_threshold
        {
            // Stick deflection in chassis terms: up = forward = 0 rad
            self.heading_target_rad = (-frame.right_x).atan2(-frame.right_y);
        }

        let error = wrap_to_pi(self.heading_target_rad - heading.heading_rad);
        let profile = TrapezoidProfile::new(Constraints {
            max_velocity: lock.max_velocity_radps,
            max_acceleration: lock.max_acceleration_radps2,
        });
        // Goal is the target unwrapped to the nearest revolution, so the
        // profile always takes the short way around
        let setpoint = profile.calculate(
            dt_s,
            ProfileState::new(heading.heading_rad, heading.rate_radps),
            ProfileState::new(heading.heading_rad + error, 0.0),
        );
        setpoint.velocity
    }

    /// Current heading-lock target, for observability.
    pub fn heading_target_rad(&self) -> f64 {
        self.heading_target_rad
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    const DT: f64 = 0.02;

    fn frame(left_x: f64, left_y: f64, right_x: f64) -> OperatorFrame {
        OperatorFrame {
            left_x,
            left_y,
            right_x,
            right_y: 0.0,
            lock: false,
        }
    }

    fn instant_config() -> InputShaperConfig {
        // Slew fast enough to converge in one 20 ms tick
        InputShaperConfig {
            magnitude_slew_per_s: 1000.0,
            rotation_slew_per_s: 1000.0,
            field_oriented: false,
            ..InputShaperConfig::default()
        }
    }

    #[test]
    fn test_deadband_snaps_and_rescales() {
        assert_eq!(apply_deadband(0.03, 0.05), 0.0);
        assert_eq!(apply_deadband(-0.05, 0.05), 0.0);
        assert_relative_eq!(apply_deadband(1.0, 0.05), 1.0);
        assert_relative_eq!(apply_deadband(-1.0, 0.05), -1.0);
        assert_relative_eq!(apply_deadband(0.525, 0.05), 0.5);
    }

    #[test]
    fn test_lock_input_bypasses_shaping() {
        let mut shaper = InputShaper::new(instant_config());
        let mut input = frame(1.0, -1.0, 1.0);
        input.lock = true;
        assert_eq!(shaper.shape(&input, None, DT), DriveCommand::LOCKED);
    }

    #[test]
    fn test_full_forward_reaches_max_speed() {
        let mut shaper = InputShaper::new(instant_config());
        let cmd = shaper.shape(&frame(0.0, -1.0, 0.0), None, DT);
        assert_relative_eq!(cmd.velocity.vx_mps, config::TELEOP_MAX_SPEED_MPS);
        assert_abs_diff_eq!(cmd.velocity.vy_mps, 0.0, epsilon = 1e-12);
        assert!(!cmd.lock);
    }

    #[test]
    fn test_magnitude_and_direction_are_rate_bounded() {
        let mut shaper = InputShaper::new(InputShaperConfig {
            field_oriented: false,
            ..InputShaperConfig::default()
        });

        // Step to full forward, then a hard step to full left
        let steps = [frame(0.0, -1.0, 0.0), frame(-1.0, 0.0, 0.0)];
        let mut prev_mag = 0.0_f64;
        let mut prev_dir = 0.0_f64;

        for input in steps.iter().cycle().take(120) {
            let allowed_dir_step = if prev_mag != 0.0 {
                (config::DIRECTION_SLEW_RADPS / prev_mag).abs() * DT
            } else {
                INSTANT_DIRECTION_RATE_RADPS * DT
            };

            shaper.shape(input, None, DT);
            let mag = shaper.translation_mag;
            let dir = shaper.translation_dir_rad;

            assert!(
                (mag - prev_mag).abs() <= config::MAGNITUDE_SLEW_PER_S * DT + 1e-9,
                "magnitude jumped {} -> {}",
                prev_mag,
                mag
            );
            assert!(
                angle_difference(dir, prev_dir) <= allowed_dir_step + 1e-9,
                "direction jumped {} -> {}",
                prev_dir,
                dir
            );

            prev_mag = mag;
            prev_dir = dir;
        }
    }

    #[test]
    fn test_reversal_scrubs_magnitude_before_flipping() {
        let mut shaper = InputShaper::new(InputShaperConfig {
            field_oriented: false,
            ..InputShaperConfig::default()
        });

        // Settle at full forward
        for _ in 0..60 {
            shaper.shape(&frame(0.0, -1.0, 0.0), None, DT);
        }
        assert_relative_eq!(shaper.translation_mag, 1.0, epsilon = 1e-9);

        // Hard reverse: direction must hold at 0 while magnitude decays
        shaper.shape(&frame(0.0, 1.0, 0.0), None, DT);
        assert_relative_eq!(shaper.translation_dir_rad, 0.0, epsilon = 1e-9);
        assert!(shaper.translation_mag < 1.0);

        // Keep commanding reverse until the magnitude is scrubbed off;
        // only then does the direction flip by pi
        for _ in 0..60 {
            shaper.shape(&frame(0.0, 1.0, 0.0), None, DT);
        }
        assert_relative_eq!(shaper.translation_dir_rad, PI, epsilon = 1e-9);
        assert!(shaper.translation_mag > 0.0);
    }

    #[test]
    fn test_sharp_turn_decelerates_while_steering() {
        let mut shaper = InputShaper::new(InputShaperConfig {
            field_oriented: false,
            ..InputShaperConfig::default()
        });

        for _ in 0..60 {
            shaper.shape(&frame(0.0, -1.0, 0.0), None, DT);
        }

        // 90° is between the near and reversal gaps
        shaper.shape(&frame(-1.0, 0.0, 0.0), None, DT);
        assert!(shaper.translation_mag < 1.0);
        assert!(shaper.translation_dir_rad > 0.0);
    }

    #[test]
    fn test_field_oriented_rotates_by_heading() {
        let mut shaper = InputShaper::new(InputShaperConfig {
            field_oriented: true,
            ..instant_config()
        });
        let heading = HeadingState {
            heading_rad: std::f64::consts::FRAC_PI_2,
            rate_radps: 0.0,
        };

        // Field +x request while facing field +y: robot strafes right
        let cmd = shaper.shape(&frame(0.0, -1.0, 0.0), Some(heading), DT);
        assert_abs_diff_eq!(cmd.velocity.vx_mps, 0.0, epsilon = 1e-9);
        assert_relative_eq!(
            cmd.velocity.vy_mps,
            -config::TELEOP_MAX_SPEED_MPS,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_heading_lock_profiles_toward_stick_heading() {
        let mut shaper = InputShaper::new(InputShaperConfig {
            heading_lock: Some(HeadingLockConfig::default()),
            field_oriented: false,
            ..InputShaperConfig::default()
        });
        let heading = HeadingState {
            heading_rad: -0.5,
            rate_radps: 0.0,
        };

        // Right stick up: target heading 0, robot at -0.5 -> positive omega
        let mut input = frame(0.0, 0.0, 0.0);
        input.right_y = -1.0;
        let cmd = shaper.shape(&input, Some(heading), DT);
        assert_relative_eq!(shaper.heading_target_rad(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(
            cmd.velocity.omega_radps,
            config::HEADING_LOCK_MAX_ACCEL_RADPS2 * DT,
            epsilon = 1e-9
        );

        // Centered stick keeps the target; error now negative -> negative omega
        let heading = HeadingState {
            heading_rad: 0.5,
            rate_radps: 0.0,
        };
        let cmd = shaper.shape(&frame(0.0, 0.0, 0.0), Some(heading), DT);
        assert_relative_eq!(shaper.heading_target_rad(), 0.0, epsilon = 1e-12);
        assert!(cmd.velocity.omega_radps < 0.0);
    }

    #[test]
    fn test_heading_lock_without_heading_falls_back_to_stick_rate() {
        let mut shaper = InputShaper::new(InputShaperConfig {
            heading_lock: Some(HeadingLockConfig::default()),
            ..instant_config()
        });

        let cmd = shaper.shape(&frame(0.0, 0.0, -1.0), None, DT);
        assert_relative_eq!(
            cmd.velocity.omega_radps,
            config::TELEOP_MAX_ROTATION_RADPS,
            epsilon = 1e-9
        );
    }
}
