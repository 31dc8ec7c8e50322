// Chassis module for the swerve drive base
//
// Provides:
// - Actuator traits and the simulated backend
// - Per-module steering/drive control with angular offsets
// - Whole-chassis kinematics (chassis velocity <-> module states)
// - The coordinator tying modules, kinematics and pose estimation together

pub mod actuator;
pub mod geometry;
pub mod kinematics;
pub mod module;
pub mod sim;
pub mod swerve;
pub mod types;

pub use actuator::{ActuatorError, DriveActuator, SteerActuator};
pub use geometry::ModuleGeometry;
pub use kinematics::{ChassisDelta, KinematicsError, SwerveKinematics};
pub use module::SwerveModule;
pub use sim::{SimDriveActuator, SimSteerActuator};
pub use swerve::{CommandSource, DriveError, SwerveChassis};
pub use types::{ChassisVelocity, DriveCommand, ModulePosition, ModuleState, Pose};
