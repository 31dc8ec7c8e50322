// Dead-reckoning pose integration from wheel odometry and a heading source.
//
// Translation comes from the least-squares chassis delta over per-module
// distance deltas; heading is taken from the gyro, not from the wheels. A
// stored offset maps raw gyro readings onto the field-frame heading so pose
// resets and vision corrections survive subsequent gyro updates.

use crate::chassis::kinematics::{KinematicsError, SwerveKinematics};
use crate::chassis::types::{ModulePosition, Pose};
use crate::math::wrap_to_pi;

pub struct WheelOdometry {
    pose: Pose,
    heading_offset_rad: f64,
    last_heading_rad: Option<f64>,
    last_positions: Option<Vec<ModulePosition>>,
}

impl WheelOdometry {
    pub fn new(initial: Pose) -> Self {
        Self {
            pose: initial,
            heading_offset_rad: 0.0,
            last_heading_rad: None,
            last_positions: None,
        }
    }

    /// Integrate one control cycle of wheel motion. The first call only
    /// establishes the baseline (positions and gyro alignment) and leaves
    /// the pose untouched.
    pub fn update(
        &mut self,
        kinematics: &SwerveKinematics,
        positions: &[ModulePosition],
        heading_rad: f64,
    ) -> Result<Pose, KinematicsError> {
        let (Some(prev), Some(last_heading)) =
            (self.last_positions.as_deref(), self.last_heading_rad)
        else {
            self.heading_offset_rad = wrap_to_pi(self.pose.heading_rad - heading_rad);
            self.last_positions = Some(positions.to_vec());
            self.last_heading_rad = Some(heading_rad);
            return Ok(self.pose);
        };

        let deltas: Vec<ModulePosition> = positions
            .iter()
            .zip(prev)
            .map(|(cur, last)| ModulePosition::new(cur.distance_m - last.distance_m, cur.angle_rad))
            .collect();
        let delta = kinematics.to_chassis_delta(&deltas)?;

        // Rotate the body-frame displacement into the field frame at the
        // midpoint heading of the interval, which keeps curved segments
        // from skewing toward either endpoint.
        let dtheta = wrap_to_pi(heading_rad - last_heading);
        let mid = self.pose.heading_rad + dtheta / 2.0;
        let (sin_mid, cos_mid) = mid.sin_cos();
        self.pose.x_m += delta.dx_m * cos_mid - delta.dy_m * sin_mid;
        self.pose.y_m += delta.dx_m * sin_mid + delta.dy_m * cos_mid;
        self.pose.heading_rad = wrap_to_pi(heading_rad + self.heading_offset_rad);

        self.last_positions = Some(positions.to_vec());
        self.last_heading_rad = Some(heading_rad);
        Ok(self.pose)
    }

    /// Pull the pose part way toward `target`. Weight 0 is a no-op, 1 jumps
    /// all the way. The gyro offset absorbs the heading share so the
    /// correction is not erased by the next `update`.
    pub fn correct_towards(&mut self, target: Pose, weight: f64) {
        self.pose.x_m += weight * (target.x_m - self.pose.x_m);
        self.pose.y_m += weight * (target.y_m - self.pose.y_m);
        let heading_step = weight * wrap_to_pi(target.heading_rad - self.pose.heading_rad);
        self.pose.heading_rad = wrap_to_pi(self.pose.heading_rad + heading_step);
        self.heading_offset_rad = wrap_to_pi(self.heading_offset_rad + heading_step);
    }

    /// Drop the stored wheel baseline. The next `update` only re-anchors;
    /// required after drive distance counters are zeroed underneath us.
    pub fn rebaseline(&mut self) {
        self.last_positions = None;
        self.last_heading_rad = None;
    }

    /// Overwrite the estimate. Wheel baselines are kept so integration
    /// continues seamlessly from the new pose.
    pub fn reset(&mut self, pose: Pose) {
        self.pose = pose;
        if let Some(last_heading) = self.last_heading_rad {
            self.heading_offset_rad = wrap_to_pi(pose.heading_rad - last_heading);
        }
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }
}
