// Motion-control core for a four-wheel independently-steered swerve base:
// module control, chassis kinematics, operator input shaping, and pose
// estimation, wired into a zenoh pub/sub runtime.

pub mod chassis;
pub mod config;
pub mod control;
pub mod estimator;
pub mod math;
pub mod messages;
pub mod runtime;
