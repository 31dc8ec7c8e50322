// Ideal actuators for running the stack without hardware.
//
// Setpoints are reflected straight back as measurements; drive distance
// integrates the commanded velocity whenever the owner advances time with
// step(). The structs are cheap clone handles over shared state, so the
// runtime keeps one handle for stepping while the module owns another.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::actuator::{DriveActuator, Result, SteerActuator};

#[derive(Debug, Default)]
struct DriveState {
    velocity_mps: f64,
    distance_m: f64,
}

/// Simulated drive motor. The commanded velocity is immediately the
/// measured velocity; distance integrates on `step`.
#[derive(Debug, Clone, Default)]
pub struct SimDriveActuator {
    state: Arc<Mutex<DriveState>>,
}

impl SimDriveActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the wheel by one control period at the commanded velocity.
    pub fn step(&self, dt_s: f64) {
        let mut state = self.lock();
        state.distance_m += state.velocity_mps * dt_s;
    }

    fn lock(&self) -> MutexGuard<'_, DriveState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DriveActuator for SimDriveActuator {
    fn configure(&mut self) -> Result<()> {
        Ok(())
    }

    fn set_velocity(&mut self, speed_mps: f64) -> Result<()> {
        self.lock().velocity_mps = speed_mps;
        Ok(())
    }

    fn velocity(&mut self) -> Result<f64> {
        Ok(self.lock().velocity_mps)
    }

    fn distance(&mut self) -> Result<f64> {
        Ok(self.lock().distance_m)
    }

    fn reset_distance(&mut self) -> Result<()> {
        self.lock().distance_m = 0.0;
        Ok(())
    }
}

/// Simulated steering motor. The commanded angle is immediately the
/// measured angle; starts at 0 rad.
#[derive(Debug, Clone, Default)]
pub struct SimSteerActuator {
    angle_rad: Arc<Mutex<f64>>,
}

impl SimSteerActuator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, f64> {
        self.angle_rad.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SteerActuator for SimSteerActuator {
    fn configure(&mut self) -> Result<()> {
        Ok(())
    }

    fn set_angle(&mut self, angle_rad: f64) -> Result<()> {
        *self.lock() = angle_rad;
        Ok(())
    }

    fn angle(&mut self) -> Result<f64> {
        Ok(*self.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drive_integrates_distance_on_step() {
        let mut drive = SimDriveActuator::new();
        let handle = drive.clone();

        drive.set_velocity(2.0).unwrap();
        handle.step(0.5);
        assert_eq!(drive.distance().unwrap(), 1.0);
        assert_eq!(drive.velocity().unwrap(), 2.0);

        drive.reset_distance().unwrap();
        assert_eq!(drive.distance().unwrap(), 0.0);
    }

    #[test]
    fn test_steer_reflects_setpoint() {
        let mut steer = SimSteerActuator::new();
        assert_eq!(steer.angle().unwrap(), 0.0);
        steer.set_angle(1.25).unwrap();
        assert_eq!(steer.angle().unwrap(), 1.25);
    }
}
