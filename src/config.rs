// Loop timing, topics, geometry, and control limits.

use std::time::Duration;

// Runtime loop frequency
pub const LOOP_HZ: u64 = 50;

// Input staleness window for the watchdog
pub const CMD_TIMEOUT: Duration = Duration::from_millis(250);

// Zenoh topics
pub const TOPIC_CMD_OPERATOR: &str = "swerve/cmd/operator"; // teleop stick frames
pub const TOPIC_CMD_VELOCITY: &str = "swerve/cmd/velocity"; // external velocity commands
pub const TOPIC_CMD_PHASE: &str = "swerve/cmd/phase"; // teleop/autonomous switch
pub const TOPIC_CMD_RESET_POSE: &str = "swerve/cmd/reset_pose"; // forced pose overwrite
pub const TOPIC_SENSOR_HEADING: &str = "swerve/sensor/heading"; // gyro bridge
pub const TOPIC_SENSOR_VISION: &str = "swerve/sensor/vision"; // landmark detection batches
pub const TOPIC_STATE_POSE: &str = "swerve/state/pose"; // pose estimate
pub const TOPIC_STATE_MODULES: &str = "swerve/state/modules"; // per-module states
pub const TOPIC_STATE_HEALTH: &str = "swerve/state/health"; // health status

// Module mounting positions, half the wheelbase in each direction
pub const WHEEL_BASE_X_M: f64 = 0.3;
pub const WHEEL_BASE_Y_M: f64 = 0.3;

// Module order everywhere: front-left, front-right, rear-left, rear-right
pub const MODULE_NAMES: [&str; 4] = ["front_left", "front_right", "rear_left", "rear_right"];

/// Module (x, y) placements in `MODULE_NAMES` order.
pub const fn module_placements() -> [(f64, f64); 4] {
    [
        (WHEEL_BASE_X_M, WHEEL_BASE_Y_M),
        (WHEEL_BASE_X_M, -WHEEL_BASE_Y_M),
        (-WHEEL_BASE_X_M, WHEEL_BASE_Y_M),
        (-WHEEL_BASE_X_M, -WHEEL_BASE_Y_M),
    ]
}

// Speed ceilings. Teleop scaling is allowed to over-ask so the chassis
// desaturation limit sets the real top speed.
pub const TELEOP_MAX_SPEED_MPS: f64 = 4.8;
pub const TELEOP_MAX_ROTATION_RADPS: f64 = 4.0;
pub const CHASSIS_MAX_SPEED_MPS: f64 = 4.0;

// Operator input shaping
pub const DRIVE_DEADBAND: f64 = 0.05;
pub const MAGNITUDE_SLEW_PER_S: f64 = 1.8; // fraction of full scale per second
pub const DIRECTION_SLEW_RADPS: f64 = 1.2; // at full translation magnitude
pub const ROTATION_SLEW_PER_S: f64 = 2.0;

// Heading lock
pub const HEADING_LOCK_THRESHOLD: f64 = 0.75; // stick deflection to retarget
pub const HEADING_LOCK_MAX_VEL_RADPS: f64 = std::f64::consts::PI;
pub const HEADING_LOCK_MAX_ACCEL_RADPS2: f64 = 2.0 * std::f64::consts::PI;

// Vision measurement gates
pub const VISION_MAX_RANGE_M: f64 = 5.0;
pub const VISION_MAX_AMBIGUITY: f64 = 0.25;
pub const VISION_MIN_CONFIDENCE: f64 = 0.5;

// Vision fusion weighting
pub const VISION_FUSION_GAIN: f64 = 0.5;
pub const VISION_RECENCY_HORIZON_S: f64 = 1.0;
