// Module controller: one instance per wheel, generic over the actuator pair.
//
// Commands arrive in the chassis frame. The controller applies the mounting
// offset, optimizes the steering target against the measured angle (never
// turn more than 90° when flipping drive direction gets there faster), and
// dispatches velocity/position setpoints. Readbacks subtract the offset so
// everything above this layer stays in the chassis frame.

use std::f64::consts::{FRAC_PI_2, PI};

use tracing::{info, warn};

use crate::math::{angle_difference, wrap_to_pi};

use super::actuator::{DriveActuator, Result, SteerActuator};
use super::geometry::ModuleGeometry;
use super::types::{ModulePosition, ModuleState};

/// Rotate a steering target 180° and negate the speed when that shortens
/// the move. The flipped pair drives the wheel along the same line.
fn optimize(target: ModuleState, measured_angle_rad: f64) -> ModuleState {
    if angle_difference(target.angle_rad, measured_angle_rad) > FRAC_PI_2 {
        ModuleState::new(-target.speed_mps, wrap_to_pi(target.angle_rad + PI))
    } else {
        target
    }
}

pub struct SwerveModule<D: DriveActuator, S: SteerActuator> {
    name: &'static str,
    geometry: ModuleGeometry,
    drive: D,
    steer: S,
    last_command: ModuleState,
}

impl<D: DriveActuator, S: SteerActuator> SwerveModule<D, S> {
    /// Build a module and configure both actuators. A configuration
    /// failure here is fatal: an unconfigured controller cannot be
    /// trusted with setpoints, so the error aborts bring-up.
    pub fn new(
        name: &'static str,
        geometry: ModuleGeometry,
        mut drive: D,
        mut steer: S,
    ) -> Result<Self> {
        drive.configure()?;
        steer.configure()?;
        info!(
            "module {} configured at ({:.2}, {:.2}) m",
            name,
            geometry.x_m(),
            geometry.y_m()
        );

        Ok(Self {
            name,
            geometry,
            drive,
            steer,
            last_command: ModuleState::default(),
        })
    }

    /// Re-apply actuator configuration after a fault (brown-out, controller
    /// reset). Unlike construction, a failure here is reported, not fatal.
    pub fn reconfigure(&mut self) -> Result<()> {
        self.drive.configure()?;
        self.steer.configure()
    }

    /// Command a chassis-frame module state: offset, optimize, dispatch.
    pub fn command_state(&mut self, desired: ModuleState) -> Result<()> {
        let target = ModuleState::new(
            desired.speed_mps,
            desired.angle_rad + self.geometry.angular_offset_rad(),
        );
        let setpoint = optimize(target, self.steer.angle()?);

        self.drive.set_velocity(setpoint.speed_mps)?;
        self.steer.set_angle(setpoint.angle_rad)?;
        self.last_command = desired;
        Ok(())
    }

    /// Steer to the radial X-stance angle at zero speed.
    pub fn lock(&mut self) -> Result<()> {
        self.command_state(ModuleState::stopped_at(self.geometry.lock_angle_rad()))
    }

    /// Measured wheel velocity and chassis-frame steering angle.
    pub fn measured_state(&mut self) -> Result<ModuleState> {
        Ok(ModuleState::new(
            self.drive.velocity()?,
            wrap_to_pi(self.steer.angle()? - self.geometry.angular_offset_rad()),
        ))
    }

    /// Accumulated drive distance and chassis-frame steering angle.
    pub fn measured_position(&mut self) -> Result<ModulePosition> {
        Ok(ModulePosition::new(
            self.drive.distance()?,
            wrap_to_pi(self.steer.angle()? - self.geometry.angular_offset_rad()),
        ))
    }

    /// Zero the drive distance accumulator. Steering is untouched.
    pub fn reset_position(&mut self) -> Result<()> {
        self.drive.reset_distance()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn geometry(&self) -> ModuleGeometry {
        self.geometry
    }

    /// Most recent chassis-frame command, for state reporting.
    pub fn last_command(&self) -> ModuleState {
        self.last_command
    }
}

impl<D: DriveActuator, S: SteerActuator> Drop for SwerveModule<D, S> {
    fn drop(&mut self) {
        // Leave the wheel stopped on teardown
        if let Err(e) = self.drive.set_velocity(0.0) {
            warn!("module {}: failed to stop drive on drop: {}", self.name, e);
        }
    }
}
