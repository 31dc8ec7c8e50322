// Chassis coordinator: selects the active command source, runs the
// kinematics chain into the modules, and owns the pose estimator.
//
// One instance per vehicle, constructed by the runtime and driven once
// per control period. Inputs (operator frames, external velocities) are
// submitted as they arrive; each cycle consumes whichever one the active
// source calls for.

use thiserror::Error;
use tracing::{info, warn};

use crate::control::shaper::{HeadingState, InputShaper, InputShaperConfig};
use crate::estimator::fusion::{EstimateMode, EstimatorError, PoseEstimator};
use crate::estimator::vision::GateRejection;
use crate::messages::{ModuleReport, OperatorFrame, VisionFrame};

use super::actuator::{ActuatorError, DriveActuator, SteerActuator};
use super::geometry::ModuleGeometry;
use super::kinematics::{KinematicsError, SwerveKinematics};
use super::module::SwerveModule;
use super::types::{ChassisVelocity, DriveCommand, ModulePosition, Pose};

#[derive(Debug, Error)]
pub enum DriveError {
    #[error(transparent)]
    Actuator(#[from] ActuatorError),

    #[error(transparent)]
    Kinematics(#[from] KinematicsError),

    #[error(transparent)]
    Estimator(#[from] EstimatorError),

    #[error("vision frame rejected: {0}")]
    VisionRejected(#[from] GateRejection),
}

pub type Result<T> = std::result::Result<T, DriveError>;

/// Where the next drive command comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandSource {
    /// Operator sticks, shaped through the input pipeline.
    Teleop,
    /// Chassis velocities from an autonomous or external layer.
    External,
    /// Ignore all input and hold the X-stance.
    AlwaysLocked,
}

pub struct SwerveChassis<D: DriveActuator, S: SteerActuator> {
    modules: Vec<SwerveModule<D, S>>,
    kinematics: SwerveKinematics,
    shaper: InputShaper,
    estimator: Option<PoseEstimator>,
    source: CommandSource,
    last_operator: OperatorFrame,
    last_external: ChassisVelocity,
    max_speed_mps: f64,
}

impl<D: DriveActuator, S: SteerActuator> SwerveChassis<D, S> {
    /// Build the coordinator over an ordered set of modules. Pass an
    /// origin pose to enable pose estimation; leave it `None` when no
    /// heading source exists, in which case pose queries fail rather
    /// than reporting dead-reckoning drift as truth.
    pub fn new(
        modules: Vec<SwerveModule<D, S>>,
        shaper_config: InputShaperConfig,
        max_speed_mps: f64,
        estimator_origin: Option<Pose>,
    ) -> Result<Self> {
        let geometries: Vec<ModuleGeometry> =
            modules.iter().map(|module| module.geometry()).collect();
        let kinematics = SwerveKinematics::new(&geometries)?;

        let estimator = match estimator_origin {
            Some(origin) => {
                info!(
                    "pose estimation enabled from ({:.2}, {:.2}, {:.2} rad)",
                    origin.x_m, origin.y_m, origin.heading_rad
                );
                Some(PoseEstimator::new(origin))
            }
            None => {
                warn!("no heading source: pose estimation disabled");
                None
            }
        };

        Ok(Self {
            modules,
            kinematics,
            shaper: InputShaper::new(shaper_config),
            estimator,
            source: CommandSource::AlwaysLocked,
            last_operator: OperatorFrame::default(),
            last_external: ChassisVelocity::ZERO,
            max_speed_mps,
        })
    }

    pub fn select_source(&mut self, source: CommandSource) {
        if source != self.source {
            info!("command source {:?} -> {:?}", self.source, source);
            self.source = source;
        }
    }

    pub fn source(&self) -> CommandSource {
        self.source
    }

    /// Latest operator frame; consumed by the next teleop cycle.
    pub fn submit_operator(&mut self, frame: OperatorFrame) {
        self.last_operator = frame;
    }

    /// Latest external velocity; consumed by the next external cycle.
    pub fn submit_velocity(&mut self, velocity: ChassisVelocity) {
        self.last_external = velocity;
    }

    /// One control period: resolve the active source to a command, drive
    /// the modules, then integrate odometry if a heading is available.
    /// Returns the command that was dispatched.
    pub fn cycle(
        &mut self,
        heading: Option<HeadingState>,
        now_s: f64,
        dt_s: f64,
    ) -> Result<DriveCommand> {
        let command = match self.source {
            CommandSource::Teleop => {
                let frame = self.last_operator;
                self.shaper.shape(&frame, heading, dt_s)
            }
            CommandSource::External => DriveCommand::moving(self.last_external),
            CommandSource::AlwaysLocked => DriveCommand::LOCKED,
        };
        self.run(command)?;

        if let Some(heading) = heading {
            if self.estimator.is_some() {
                let positions = self.measured_positions()?;
                if let Some(estimator) = self.estimator.as_mut() {
                    estimator.update(&self.kinematics, &positions, heading.heading_rad, now_s)?;
                }
            }
        }
        Ok(command)
    }

    /// Dispatch one drive command: locked means every module to its
    /// X-stance; otherwise kinematics, desaturation, per-module dispatch.
    pub fn run(&mut self, command: DriveCommand) -> Result<()> {
        if command.lock {
            for module in &mut self.modules {
                module.lock()?;
            }
            return Ok(());
        }

        let states = self.kinematics.to_module_states(command.velocity);
        let states = SwerveKinematics::desaturate(&states, self.max_speed_mps);
        for (module, state) in self.modules.iter_mut().zip(states) {
            module.command_state(state)?;
        }
        Ok(())
    }

    fn measured_positions(&mut self) -> Result<Vec<ModulePosition>> {
        let mut positions = Vec::with_capacity(self.modules.len());
        for module in &mut self.modules {
            positions.push(module.measured_position()?);
        }
        Ok(positions)
    }

    /// Current pose estimate. Fails when no heading source was configured
    /// so a caller cannot mistake a never-corrected origin for a fix.
    pub fn pose(&self) -> Result<Pose> {
        let estimator = self
            .estimator
            .as_ref()
            .ok_or(EstimatorError::HeadingUnavailable)?;
        Ok(estimator.pose())
    }

    pub fn estimate_mode(&self) -> Option<EstimateMode> {
        self.estimator.as_ref().map(PoseEstimator::mode)
    }

    pub fn acquired_landmark(&self) -> Option<u32> {
        self.estimator.as_ref().and_then(PoseEstimator::acquired_id)
    }

    /// Force the estimate to a known pose.
    pub fn reset_pose(&mut self, pose: Pose) {
        match self.estimator.as_mut() {
            Some(estimator) => {
                info!(
                    "pose reset to ({:.2}, {:.2}, {:.2} rad)",
                    pose.x_m, pose.y_m, pose.heading_rad
                );
                estimator.reset(pose);
            }
            None => warn!("pose reset ignored: no heading source"),
        }
    }

    /// Offer a vision frame to the estimator. Returns the applied fusion
    /// weight; a gate failure or a missing heading source is an error.
    pub fn ingest_vision(&mut self, frame: &VisionFrame, now_s: f64) -> Result<f64> {
        let estimator = self
            .estimator
            .as_mut()
            .ok_or(EstimatorError::HeadingUnavailable)?;
        Ok(estimator.ingest(frame, now_s)?)
    }

    /// Chassis velocity recovered from measured module states.
    pub fn chassis_velocity(&mut self) -> Result<ChassisVelocity> {
        let mut states = Vec::with_capacity(self.modules.len());
        for module in &mut self.modules {
            states.push(module.measured_state()?);
        }
        Ok(self.kinematics.to_chassis_velocity(&states)?)
    }

    /// Commanded vs measured state of every module, for publication.
    pub fn module_reports(&mut self) -> Result<Vec<ModuleReport>> {
        let mut reports = Vec::with_capacity(self.modules.len());
        for module in &mut self.modules {
            reports.push(ModuleReport {
                name: module.name().to_string(),
                commanded: module.last_command(),
                measured: module.measured_state()?,
            });
        }
        Ok(reports)
    }

    /// Re-apply actuator configuration on every module.
    pub fn reconfigure(&mut self) -> Result<()> {
        for module in &mut self.modules {
            module.reconfigure()?;
        }
        info!("all modules reconfigured");
        Ok(())
    }

    /// Zero every drive distance accumulator. Odometry is re-anchored so
    /// the counter jump does not read as motion.
    pub fn reset_drive_distances(&mut self) -> Result<()> {
        for module in &mut self.modules {
            module.reset_position()?;
        }
        if let Some(estimator) = self.estimator.as_mut() {
            estimator.rebaseline();
        }
        Ok(())
    }
}
