// Actuator capability traits for a swerve module.
//
// This crate never talks to motor controllers directly: every module is
// built from one drive-side and one steer-side implementation of these
// traits, and device drivers live outside the crate. Setpoints end here;
// closed-loop control behind them is the driver's problem.

use thiserror::Error;

/// Errors surfaced through the actuator interface.
#[derive(Debug, Error)]
pub enum ActuatorError {
    #[error("actuator {id} rejected configuration: {reason}")]
    ConfigRejected { id: u8, reason: String },

    #[error("actuator {id} not responding")]
    Offline { id: u8 },

    #[error("bus failure on actuator {id}: {reason}")]
    Bus { id: u8, reason: String },
}

pub type Result<T> = std::result::Result<T, ActuatorError>;

/// Drive side of a module: closed-loop wheel velocity plus distance and
/// velocity readback. Distance accumulates until explicitly reset.
pub trait DriveActuator {
    /// Apply (or re-apply) controller configuration.
    fn configure(&mut self) -> Result<()>;

    /// Command a wheel velocity setpoint in m/s.
    fn set_velocity(&mut self, speed_mps: f64) -> Result<()>;

    /// Measured wheel velocity in m/s.
    fn velocity(&mut self) -> Result<f64>;

    /// Accumulated drive distance in meters.
    fn distance(&mut self) -> Result<f64>;

    /// Zero the accumulated drive distance.
    fn reset_distance(&mut self) -> Result<()>;
}

/// Steering side of a module: closed-loop angle plus angle readback.
/// Angles here are in the module's own frame; the chassis-frame offset is
/// the module controller's business.
pub trait SteerActuator {
    /// Apply (or re-apply) controller configuration.
    fn configure(&mut self) -> Result<()>;

    /// Command a steering angle setpoint in radians.
    fn set_angle(&mut self, angle_rad: f64) -> Result<()>;

    /// Measured steering angle in radians.
    fn angle(&mut self) -> Result<f64>;
}
