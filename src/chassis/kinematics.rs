// Chassis kinematics: chassis velocity <-> per-module states.
//
// The map is fixed by geometry. Module i must carry the chassis linear
// velocity plus the tangential velocity induced by rotation at its mount:
//   module_vx = vx - omega * y_i
//   module_vy = vy + omega * x_i
// Stacked, that is a constant 2Nx3 matrix applied to (vx, vy, omega). The
// reverse estimate (chassis from measured modules) solves the same system
// in the least-squares sense with the matrix's pseudo-inverse. Both are
// computed exactly once, at construction.

use nalgebra::{DMatrix, DVector, Vector3};
use thiserror::Error;

use super::geometry::ModuleGeometry;
use super::types::{ChassisVelocity, ModulePosition, ModuleState};

/// Below this commanded module speed the previous steering angle is held
/// instead of trusting atan2 of a near-zero vector.
const SPEED_EPSILON_MPS: f64 = 1e-9;

/// Singular-value cutoff for the pseudo-inverse.
const PINV_EPSILON: f64 = 1e-9;

#[derive(Debug, Error)]
pub enum KinematicsError {
    #[error("cannot build kinematics from an empty module set")]
    EmptyModuleSet,

    #[error("module geometry is degenerate: {0}")]
    DegenerateGeometry(&'static str),

    #[error("module count mismatch: kinematics built for {expected}, got {actual}")]
    ModuleCountMismatch { expected: usize, actual: usize },
}

/// Chassis-frame displacement over one integration interval.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChassisDelta {
    pub dx_m: f64,
    pub dy_m: f64,
    pub dtheta_rad: f64,
}

pub struct SwerveKinematics {
    forward: DMatrix<f64>,
    inverse: DMatrix<f64>,
    // steering hold for near-zero speeds, one slot per module
    last_angles: Vec<f64>,
}

impl SwerveKinematics {
    pub fn new(geometries: &[ModuleGeometry]) -> Result<Self, KinematicsError> {
        if geometries.is_empty() {
            return Err(KinematicsError::EmptyModuleSet);
        }

        let n = geometries.len();
        let mut forward = DMatrix::zeros(2 * n, 3);
        for (i, geometry) in geometries.iter().enumerate() {
            forward[(2 * i, 0)] = 1.0;
            forward[(2 * i, 2)] = -geometry.y_m();
            forward[(2 * i + 1, 1)] = 1.0;
            forward[(2 * i + 1, 2)] = geometry.x_m();
        }

        let inverse = forward
            .clone()
            .pseudo_inverse(PINV_EPSILON)
            .map_err(KinematicsError::DegenerateGeometry)?;

        Ok(Self {
            forward,
            inverse,
            last_angles: vec![0.0; n],
        })
    }

    pub fn module_count(&self) -> usize {
        self.last_angles.len()
    }

    /// Inverse kinematics: chassis velocity -> per-module (speed, angle).
    /// Takes `&mut self` because modules commanded to ~zero speed keep
    /// their previous angle rather than snapping to atan2(0, 0).
    pub fn to_module_states(&mut self, v: ChassisVelocity) -> Vec<ModuleState> {
        let wheels = &self.forward * Vector3::new(v.vx_mps, v.vy_mps, v.omega_radps);

        (0..self.last_angles.len())
            .map(|i| {
                let vx = wheels[2 * i];
                let vy = wheels[2 * i + 1];
                let speed = vx.hypot(vy);
                let angle = if speed < SPEED_EPSILON_MPS {
                    self.last_angles[i]
                } else {
                    vy.atan2(vx)
                };
                self.last_angles[i] = angle;
                ModuleState::new(speed, angle)
            })
            .collect()
    }

    /// Least-squares chassis velocity from measured module states.
    pub fn to_chassis_velocity(
        &self,
        states: &[ModuleState],
    ) -> Result<ChassisVelocity, KinematicsError> {
        let wheels = self.stack(states.len(), |i| {
            let state = &states[i];
            (state.speed_mps, state.angle_rad)
        })?;
        let chassis = &self.inverse * wheels;
        Ok(ChassisVelocity::new(chassis[0], chassis[1], chassis[2]))
    }

    /// Chassis-frame displacement from per-module distance deltas, using
    /// the same least-squares solve as `to_chassis_velocity`.
    pub fn to_chassis_delta(
        &self,
        deltas: &[ModulePosition],
    ) -> Result<ChassisDelta, KinematicsError> {
        let wheels = self.stack(deltas.len(), |i| {
            let delta = &deltas[i];
            (delta.distance_m, delta.angle_rad)
        })?;
        let chassis = &self.inverse * wheels;
        Ok(ChassisDelta {
            dx_m: chassis[0],
            dy_m: chassis[1],
            dtheta_rad: chassis[2],
        })
    }

    /// If any module exceeds `max_speed_mps`, scale every speed by
    /// `max_speed_mps / max(|speed|)`. Directions and relative ratios are
    /// untouched, so the commanded path shape survives saturation.
    pub fn desaturate(states: &[ModuleState], max_speed_mps: f64) -> Vec<ModuleState> {
        let top = states
            .iter()
            .map(|s| s.speed_mps.abs())
            .fold(0.0_f64, f64::max);

        if top <= max_speed_mps || top < SPEED_EPSILON_MPS {
            return states.to_vec();
        }

        let scale = max_speed_mps / top;
        states
            .iter()
            .map(|s| ModuleState::new(s.speed_mps * scale, s.angle_rad))
            .collect()
    }

    /// Stack N (magnitude, angle) pairs into a 2N vector of components.
    fn stack(
        &self,
        len: usize,
        pair: impl Fn(usize) -> (f64, f64),
    ) -> Result<DVector<f64>, KinematicsError> {
        let n = self.last_angles.len();
        if len != n {
            return Err(KinematicsError::ModuleCountMismatch {
                expected: n,
                actual: len,
            });
        }

        let mut wheels = DVector::zeros(2 * n);
        for i in 0..n {
            let (magnitude, angle) = pair(i);
            let (sin_a, cos_a) = angle.sin_cos();
            wheels[2 * i] = magnitude * cos_a;
            wheels[2 * i + 1] = magnitude * sin_a;
        }
        Ok(wheels)
    }
}
