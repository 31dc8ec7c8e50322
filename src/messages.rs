// Wire messages for the runtime, JSON over zenoh.

use serde::{Deserialize, Serialize};

use crate::chassis::types::{ChassisVelocity, ModuleState, Pose};
use crate::estimator::EstimateMode;

/// Raw operator sticks, teleop publisher -> runtime. Axes are gamepad
/// convention: x right-positive, y down-positive, both in [-1, 1].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct OperatorFrame {
    pub left_x: f64,
    pub left_y: f64,
    pub right_x: f64,
    pub right_y: f64,
    pub lock: bool,
}

/// External chassis-velocity command, autonomous layer -> runtime.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VelocityCommand {
    pub vx_mps: f64,
    pub vy_mps: f64,
    pub omega_radps: f64,
}

impl From<&VelocityCommand> for ChassisVelocity {
    fn from(cmd: &VelocityCommand) -> Self {
        Self {
            vx_mps: cmd.vx_mps,
            vy_mps: cmd.vy_mps,
            omega_radps: cmd.omega_radps,
        }
    }
}

/// Operating-phase selection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum PhaseCommand {
    Teleop,
    Autonomous,
}

/// Operator-forced pose overwrite.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResetPose {
    pub x_m: f64,
    pub y_m: f64,
    pub heading_rad: f64,
}

impl From<&ResetPose> for Pose {
    fn from(msg: &ResetPose) -> Self {
        Pose::new(msg.x_m, msg.y_m, msg.heading_rad)
    }
}

/// One heading reading from the gyro bridge, radians CCW-positive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HeadingSample {
    pub heading_rad: f64,
    /// Epoch seconds at measurement time.
    pub stamp_s: f64,
}

/// One landmark seen by the vision pipeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LandmarkObservation {
    pub id: u32,
    pub range_m: f64,
    pub ambiguity: f64,
}

/// One detection batch from the vision pipeline. `pose` is the pipeline's
/// best field-frame estimate, absent when it could not solve one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionFrame {
    /// Epoch seconds at capture time, not arrival time.
    pub stamp_s: f64,
    pub pose: Option<Pose>,
    pub landmarks: Vec<LandmarkObservation>,
}

/// Published pose estimate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PoseReport {
    pub pose: Pose,
    pub mode: EstimateMode,
    /// Most recently (re)acquired landmark id, if any was ever seen.
    pub acquired_id: Option<u32>,
}

/// Published per-module commanded vs measured state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleReport {
    pub name: String,
    pub commanded: ModuleState,
    pub measured: ModuleState,
}

/// Health status published by the runtime.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeHealth {
    Ok,
    /// Active input source stale; chassis held in the locked safe state.
    InputStale,
    /// Running without a heading source; pose queries fail.
    Degraded,
}
