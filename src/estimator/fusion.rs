// Pose fusion: periodic wheel-odometry integration plus asynchronous,
// quality-gated vision corrections.
//
// Vision frames arrive on their own cadence and may be stale relative to
// the control cycle; the correction weight scales with both the
// measurement's confidence and its recency, so a late frame nudges the
// estimate instead of yanking it to an old pose.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chassis::kinematics::{KinematicsError, SwerveKinematics};
use crate::chassis::types::{ModulePosition, Pose};
use crate::config;
use crate::messages::VisionFrame;

use super::odometry::WheelOdometry;
use super::vision::{AcquisitionTracker, GateRejection, VisionGate};

pub type Result<T> = std::result::Result<T, EstimatorError>;

#[derive(Debug, Error)]
pub enum EstimatorError {
    /// No heading source was configured; there is no pose to report.
    #[error("no heading source configured, pose estimate unavailable")]
    HeadingUnavailable,
    #[error(transparent)]
    Kinematics(#[from] KinematicsError),
}

/// How the current pose estimate was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateMode {
    /// Wheel integration alone, no recent vision contribution.
    DeadReckoning,
    /// At least one gated vision measurement fused within the recency
    /// horizon.
    VisionCorrected,
}

pub struct PoseEstimator {
    odometry: WheelOdometry,
    gate: VisionGate,
    tracker: AcquisitionTracker,
    fusion_gain: f64,
    recency_horizon_s: f64,
    last_fused_s: Option<f64>,
    now_s: f64,
}

impl PoseEstimator {
    pub fn new(initial: Pose) -> Self {
        Self {
            odometry: WheelOdometry::new(initial),
            gate: VisionGate::default(),
            tracker: AcquisitionTracker::new(),
            fusion_gain: config::VISION_FUSION_GAIN,
            recency_horizon_s: config::VISION_RECENCY_HORIZON_S,
            last_fused_s: None,
            now_s: 0.0,
        }
    }

    /// Periodic integration step, once per control cycle.
    pub fn update(
        &mut self,
        kinematics: &SwerveKinematics,
        positions: &[ModulePosition],
        heading_rad: f64,
        now_s: f64,
    ) -> Result<Pose> {
        self.now_s = self.now_s.max(now_s);
        Ok(self.odometry.update(kinematics, positions, heading_rad)?)
    }

    /// Offer a vision frame for fusion. Landmark bookkeeping happens
    /// whether or not the frame passes the gate. On acceptance the applied
    /// fusion weight is returned; zero means the frame was older than the
    /// recency horizon and left the pose unchanged.
    pub fn ingest(
        &mut self,
        frame: &VisionFrame,
        now_s: f64,
    ) -> std::result::Result<f64, GateRejection> {
        self.now_s = self.now_s.max(now_s);
        self.tracker.observe(&frame.landmarks);

        let measurement = self.gate.evaluate(frame)?;
        let age_s = (now_s - measurement.stamp_s).max(0.0);
        let recency = (1.0 - age_s / self.recency_horizon_s).clamp(0.0, 1.0);
        let weight = self.fusion_gain * measurement.confidence * recency;

        if weight > 0.0 {
            self.odometry.correct_towards(measurement.pose, weight);
            self.last_fused_s = Some(now_s);
        }
        Ok(weight)
    }

    pub fn pose(&self) -> Pose {
        self.odometry.pose()
    }

    pub fn mode(&self) -> EstimateMode {
        match self.last_fused_s {
            Some(fused_s) if self.now_s - fused_s <= self.recency_horizon_s => {
                EstimateMode::VisionCorrected
            }
            _ => EstimateMode::DeadReckoning,
        }
    }

    pub fn acquired_id(&self) -> Option<u32> {
        self.tracker.acquired_id()
    }

    /// Unconditional overwrite; also drops any standing vision credit.
    pub fn reset(&mut self, pose: Pose) {
        self.odometry.reset(pose);
        self.last_fused_s = None;
    }

    /// Re-anchor wheel integration after distance counters were zeroed.
    pub fn rebaseline(&mut self) {
        self.odometry.rebaseline();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chassis::geometry::ModuleGeometry;
    use crate::messages::LandmarkObservation;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn square_kinematics() -> SwerveKinematics {
        let geometries = [
            ModuleGeometry::new(0.3, 0.3),
            ModuleGeometry::new(0.3, -0.3),
            ModuleGeometry::new(-0.3, 0.3),
            ModuleGeometry::new(-0.3, -0.3),
        ];
        SwerveKinematics::new(&geometries).unwrap()
    }

    fn positions(distance_m: f64) -> Vec<ModulePosition> {
        vec![ModulePosition::new(distance_m, 0.0); 4]
    }

    fn vision(pose: Pose, stamp_s: f64, ambiguity: f64) -> VisionFrame {
        VisionFrame {
            stamp_s,
            pose: Some(pose),
            landmarks: vec![LandmarkObservation {
                id: 3,
                range_m: 2.0,
                ambiguity,
            }],
        }
    }

    #[test]
    fn test_update_integrates_odometry() {
        let kin = square_kinematics();
        let mut est = PoseEstimator::new(Pose::new(0.0, 0.0, 0.0));
        est.update(&kin, &positions(0.0), 0.0, 0.0).unwrap();
        let pose = est.update(&kin, &positions(1.0), 0.0, 0.02).unwrap();
        assert_relative_eq!(pose.x_m, 1.0, epsilon = 1e-9);
        assert_eq!(est.mode(), EstimateMode::DeadReckoning);
    }

    #[test]
    fn test_rejected_frame_leaves_pose_unchanged() {
        let kin = square_kinematics();
        let mut est = PoseEstimator::new(Pose::new(0.0, 0.0, 0.0));
        est.update(&kin, &positions(0.0), 0.0, 10.0).unwrap();

        let bad = vision(Pose::new(4.0, 4.0, 1.0), 10.0, 0.9);
        assert!(est.ingest(&bad, 10.0).is_err());
        assert_eq!(est.pose(), Pose::new(0.0, 0.0, 0.0));
        assert_eq!(est.mode(), EstimateMode::DeadReckoning);
    }

    #[test]
    fn test_fresh_confident_frame_shifts_estimate() {
        let kin = square_kinematics();
        let mut est = PoseEstimator::new(Pose::new(0.0, 0.0, 0.0));
        est.update(&kin, &positions(0.0), 0.0, 10.0).unwrap();

        // Zero ambiguity, zero age: weight is exactly the fusion gain
        let weight = est
            .ingest(&vision(Pose::new(1.0, 0.0, 0.0), 10.0, 0.0), 10.0)
            .unwrap();
        assert_relative_eq!(weight, config::VISION_FUSION_GAIN, epsilon = 1e-12);
        assert_relative_eq!(est.pose().x_m, config::VISION_FUSION_GAIN, epsilon = 1e-12);
        assert_eq!(est.mode(), EstimateMode::VisionCorrected);
        assert_eq!(est.acquired_id(), Some(3));
    }

    #[test]
    fn test_stale_frame_is_downweighted() {
        let kin = square_kinematics();
        let mut est = PoseEstimator::new(Pose::new(0.0, 0.0, 0.0));
        est.update(&kin, &positions(0.0), 0.0, 10.0).unwrap();

        // Stamped half a horizon ago: recency 0.5
        let weight = est
            .ingest(&vision(Pose::new(1.0, 0.0, 0.0), 9.5, 0.0), 10.0)
            .unwrap();
        assert_relative_eq!(weight, 0.5 * config::VISION_FUSION_GAIN, epsilon = 1e-12);

        // Older than the horizon: accepted but weightless
        let mut est = PoseEstimator::new(Pose::new(0.0, 0.0, 0.0));
        est.update(&kin, &positions(0.0), 0.0, 10.0).unwrap();
        let weight = est
            .ingest(&vision(Pose::new(1.0, 0.0, 0.0), 8.0, 0.0), 10.0)
            .unwrap();
        assert_abs_diff_eq!(weight, 0.0);
        assert_eq!(est.pose(), Pose::new(0.0, 0.0, 0.0));
        assert_eq!(est.mode(), EstimateMode::DeadReckoning);
    }

    #[test]
    fn test_mode_decays_after_recency_horizon() {
        let kin = square_kinematics();
        let mut est = PoseEstimator::new(Pose::new(0.0, 0.0, 0.0));
        est.update(&kin, &positions(0.0), 0.0, 10.0).unwrap();
        est.ingest(&vision(Pose::new(0.1, 0.0, 0.0), 10.0, 0.0), 10.0)
            .unwrap();

        est.update(&kin, &positions(0.0), 0.0, 10.5).unwrap();
        assert_eq!(est.mode(), EstimateMode::VisionCorrected);

        est.update(&kin, &positions(0.0), 0.0, 11.6).unwrap();
        assert_eq!(est.mode(), EstimateMode::DeadReckoning);
    }

    #[test]
    fn test_reset_overwrites_and_clears_credit() {
        let kin = square_kinematics();
        let mut est = PoseEstimator::new(Pose::new(0.0, 0.0, 0.0));
        est.update(&kin, &positions(0.0), 0.0, 10.0).unwrap();
        est.ingest(&vision(Pose::new(1.0, 0.0, 0.0), 10.0, 0.0), 10.0)
            .unwrap();

        est.reset(Pose::new(-3.0, 2.0, 0.5));
        assert_eq!(est.pose(), Pose::new(-3.0, 2.0, 0.5));
        assert_eq!(est.mode(), EstimateMode::DeadReckoning);

        // Acquisition history is bookkeeping, not pose state; it survives
        assert_eq!(est.acquired_id(), Some(3));
    }
}
