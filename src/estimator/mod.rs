// Pose estimation for the swerve base
//
// Provides:
// - Wheel odometry integration (module position deltas + gyro heading)
// - Vision measurement gating and landmark acquisition bookkeeping
// - The fused estimator consumed by the chassis coordinator

pub mod fusion;
pub mod odometry;
pub mod vision;

pub use fusion::{EstimateMode, EstimatorError, PoseEstimator};
pub use odometry::WheelOdometry;
pub use vision::{AcquisitionTracker, GateRejection, VisionGate, VisionMeasurement};
