// Value types shared across the chassis stack.
//
// Conventions: x forward, y left, angles in radians counter-clockwise
// positive, speeds in m/s. All types are plain values; operations that
// change a state build a new one instead of mutating the input.

use serde::{Deserialize, Serialize};

/// Wheel speed and steering angle for one module, commanded or measured.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ModuleState {
    pub speed_mps: f64,
    pub angle_rad: f64,
}

impl ModuleState {
    pub fn new(speed_mps: f64, angle_rad: f64) -> Self {
        Self { speed_mps, angle_rad }
    }

    /// Zero speed at the given steering angle.
    pub fn stopped_at(angle_rad: f64) -> Self {
        Self { speed_mps: 0.0, angle_rad }
    }
}

/// Rolling drive distance and steering angle for one module. The distance
/// accumulates over the module's life; odometry works on its deltas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ModulePosition {
    pub distance_m: f64,
    pub angle_rad: f64,
}

impl ModulePosition {
    pub fn new(distance_m: f64, angle_rad: f64) -> Self {
        Self { distance_m, angle_rad }
    }
}

/// Chassis velocity in the robot frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ChassisVelocity {
    pub vx_mps: f64,
    pub vy_mps: f64,
    pub omega_radps: f64,
}

impl ChassisVelocity {
    pub const ZERO: ChassisVelocity = ChassisVelocity {
        vx_mps: 0.0,
        vy_mps: 0.0,
        omega_radps: 0.0,
    };

    pub fn new(vx_mps: f64, vy_mps: f64, omega_radps: f64) -> Self {
        Self { vx_mps, vy_mps, omega_radps }
    }

    /// Re-express a field-frame velocity in the robot frame given the
    /// current heading (rotation by -heading; omega is frame-independent).
    pub fn from_field_relative(vx_mps: f64, vy_mps: f64, omega_radps: f64, heading_rad: f64) -> Self {
        let (sin_h, cos_h) = heading_rad.sin_cos();
        Self {
            vx_mps: vx_mps * cos_h + vy_mps * sin_h,
            vy_mps: -vx_mps * sin_h + vy_mps * cos_h,
            omega_radps,
        }
    }
}

/// Chassis pose in the field frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub x_m: f64,
    pub y_m: f64,
    pub heading_rad: f64,
}

impl Pose {
    pub fn new(x_m: f64, y_m: f64, heading_rad: f64) -> Self {
        Self { x_m, y_m, heading_rad }
    }
}

/// One cycle's drive intent: a robot-frame velocity, or the locked X-stance.
/// Lock wins over whatever velocity is carried alongside it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriveCommand {
    pub velocity: ChassisVelocity,
    pub lock: bool,
}

impl DriveCommand {
    /// Safe state: stop and hold the X-stance.
    pub const LOCKED: DriveCommand = DriveCommand {
        velocity: ChassisVelocity::ZERO,
        lock: true,
    };

    pub fn moving(velocity: ChassisVelocity) -> Self {
        Self { velocity, lock: false }
    }
}

impl Default for DriveCommand {
    fn default() -> Self {
        DriveCommand::LOCKED
    }
}
