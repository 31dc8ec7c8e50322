// 50 Hz control loop with a command watchdog.
// If the active input source stops refreshing (operator drops, autonomous
// layer crashes), the watchdog drives the chassis to its safe state: the
// locked X-stance, wheels radial at zero speed.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tokio::time::interval;
use tracing::{debug, error, info, warn};

use crate::chassis::geometry::ModuleGeometry;
use crate::chassis::module::SwerveModule;
use crate::chassis::sim::{SimDriveActuator, SimSteerActuator};
use crate::chassis::swerve::{CommandSource, DriveError, SwerveChassis};
use crate::chassis::types::{ChassisVelocity, Pose};
use crate::config::{self, CMD_TIMEOUT, LOOP_HZ};
use crate::control::shaper::{HeadingLockConfig, HeadingState, InputShaperConfig};
use crate::estimator::fusion::EstimateMode;
use crate::math::wrap_to_pi;
use crate::messages::{
    HeadingSample, OperatorFrame, PhaseCommand, PoseReport, ResetPose, RuntimeHealth,
    VelocityCommand, VisionFrame,
};

/// Feature switches for the binary, set from the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// Drive simulated actuators and synthesize a heading when no gyro
    /// bridge is publishing.
    pub sim: bool,
    /// Interpret operator translation in the field frame.
    pub field_oriented: bool,
    /// Replace stick-rate rotation with profiled snap-to-heading.
    pub heading_lock: bool,
}

/// Watchdog and source-selection bookkeeping for the control loop.
pub struct Runtime {
    phase_source: CommandSource,
    input_received_at: Option<Instant>,
    health: RuntimeHealth,
}

impl Runtime {
    pub fn new() -> Self {
        Self {
            phase_source: CommandSource::Teleop,
            input_received_at: None,
            // Start stale until the first input of the right kind
            health: RuntimeHealth::InputStale,
        }
    }

    /// Switch operating phase. The new source starts stale: a teleop
    /// frame cannot keep an autonomous phase alive, or vice versa.
    fn on_phase(&mut self, phase: PhaseCommand) {
        let source = match phase {
            PhaseCommand::Teleop => CommandSource::Teleop,
            PhaseCommand::Autonomous => CommandSource::External,
        };
        if source != self.phase_source {
            info!("Operating phase: {:?}", phase);
            self.phase_source = source;
            self.input_received_at = None;
        }
    }

    /// Record an input arrival. Only input matching the active phase
    /// feeds the watchdog.
    fn on_input(&mut self, source: CommandSource, now: Instant) {
        if source == self.phase_source {
            self.input_received_at = Some(now);
        }
    }

    /// Pick the source to drive this cycle, applying the watchdog, and
    /// update health alongside.
    fn effective_source(&mut self, now: Instant, pose_available: bool) -> CommandSource {
        let fresh = self
            .input_received_at
            .map(|at| now.duration_since(at) <= CMD_TIMEOUT)
            .unwrap_or(false);

        if !fresh {
            if self.health != RuntimeHealth::InputStale {
                warn!("Active input stale, locking chassis");
            }
            self.health = RuntimeHealth::InputStale;
            return CommandSource::AlwaysLocked;
        }

        let health = if pose_available {
            RuntimeHealth::Ok
        } else {
            RuntimeHealth::Degraded
        };
        if health != self.health {
            match health {
                RuntimeHealth::Degraded => warn!("Pose estimation unavailable, degraded"),
                _ => info!("Input fresh, resuming {:?}", self.phase_source),
            }
        }
        self.health = health;
        self.phase_source
    }
}

/// Derives angular rate from successive heading samples; samples older
/// than the last accepted one are dropped, arrival order is not trusted.
#[derive(Debug, Default)]
struct HeadingTracker {
    last: Option<HeadingSample>,
    rate_radps: f64,
}

impl HeadingTracker {
    fn on_sample(&mut self, sample: HeadingSample) {
        if let Some(prev) = self.last {
            let dt_s = sample.stamp_s - prev.stamp_s;
            if dt_s <= 0.0 {
                debug!(
                    "dropping out-of-order heading sample ({:.3} <= {:.3})",
                    sample.stamp_s, prev.stamp_s
                );
                return;
            }
            self.rate_radps = wrap_to_pi(sample.heading_rad - prev.heading_rad) / dt_s;
        }
        self.last = Some(sample);
    }

    fn state(&self) -> Option<HeadingState> {
        self.last.map(|sample| HeadingState {
            heading_rad: sample.heading_rad,
            rate_radps: self.rate_radps,
        })
    }
}

fn epoch_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|since| since.as_secs_f64())
        .unwrap_or_default()
}

pub async fn run(options: RuntimeOptions) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if !options.sim {
        return Err(
            "no hardware actuator drivers are built into this runtime; \
             run with --sim, or embed SwerveChassis with real actuator implementations"
                .into(),
        );
    }

    let shaper_config = InputShaperConfig {
        field_oriented: options.field_oriented,
        heading_lock: options.heading_lock.then(HeadingLockConfig::default),
        ..InputShaperConfig::default()
    };

    info!("Bringing up simulated chassis...");
    let mut modules = Vec::new();
    let mut drives = Vec::new();
    for (name, (x_m, y_m)) in config::MODULE_NAMES.into_iter().zip(config::module_placements()) {
        let drive = SimDriveActuator::new();
        drives.push(drive.clone());
        modules.push(SwerveModule::new(
            name,
            ModuleGeometry::new(x_m, y_m),
            drive,
            SimSteerActuator::new(),
        )?);
    }
    let mut chassis = SwerveChassis::new(
        modules,
        shaper_config,
        config::CHASSIS_MAX_SPEED_MPS,
        Some(Pose::default()),
    )?;

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    info!("Setting up publishers and subscribers...");
    let sub_operator = session.declare_subscriber(config::TOPIC_CMD_OPERATOR).await?;
    let sub_velocity = session.declare_subscriber(config::TOPIC_CMD_VELOCITY).await?;
    let sub_phase = session.declare_subscriber(config::TOPIC_CMD_PHASE).await?;
    let sub_reset = session.declare_subscriber(config::TOPIC_CMD_RESET_POSE).await?;
    let sub_heading = session.declare_subscriber(config::TOPIC_SENSOR_HEADING).await?;
    let sub_vision = session.declare_subscriber(config::TOPIC_SENSOR_VISION).await?;
    let pub_pose = session.declare_publisher(config::TOPIC_STATE_POSE).await?;
    let pub_modules = session.declare_publisher(config::TOPIC_STATE_MODULES).await?;
    let pub_health = session.declare_publisher(config::TOPIC_STATE_HEALTH).await?;

    let mut runtime = Runtime::new();
    let mut heading_tracker = HeadingTracker::default();
    let mut heading_live = false;
    let mut sim_heading_rad = 0.0_f64;
    let mut sim_rate_radps = 0.0_f64;

    let dt_s = 1.0 / LOOP_HZ as f64;
    let mut tick = interval(Duration::from_millis(1000 / LOOP_HZ));

    info!(
        "Runtime started: {} Hz loop, {} ms watchdog timeout",
        LOOP_HZ,
        CMD_TIMEOUT.as_millis()
    );
    info!(
        "Subscribed to: {}, {}, {}, {}, {}, {}",
        config::TOPIC_CMD_OPERATOR,
        config::TOPIC_CMD_VELOCITY,
        config::TOPIC_CMD_PHASE,
        config::TOPIC_CMD_RESET_POSE,
        config::TOPIC_SENSOR_HEADING,
        config::TOPIC_SENSOR_VISION
    );
    info!(
        "Publishing to: {}, {}, {}",
        config::TOPIC_STATE_POSE,
        config::TOPIC_STATE_MODULES,
        config::TOPIC_STATE_HEALTH
    );

    loop {
        tick.tick().await;
        let now = Instant::now();
        let now_s = epoch_seconds();

        // 1. Drain all pending inbound messages (non-blocking), keep latest
        while let Ok(Some(sample)) = sub_operator.try_recv() {
            let payload = sample.payload().to_bytes();
            match serde_json::from_slice::<OperatorFrame>(&payload) {
                Ok(frame) => {
                    debug!("Operator frame: {:?}", frame);
                    chassis.submit_operator(frame);
                    runtime.on_input(CommandSource::Teleop, now);
                }
                Err(e) => warn!("Failed to parse operator frame: {}", e),
            }
        }
        while let Ok(Some(sample)) = sub_velocity.try_recv() {
            let payload = sample.payload().to_bytes();
            match serde_json::from_slice::<VelocityCommand>(&payload) {
                Ok(cmd) => {
                    debug!("Velocity command: {:?}", cmd);
                    chassis.submit_velocity(ChassisVelocity::from(&cmd));
                    runtime.on_input(CommandSource::External, now);
                }
                Err(e) => warn!("Failed to parse velocity command: {}", e),
            }
        }
        while let Ok(Some(sample)) = sub_phase.try_recv() {
            let payload = sample.payload().to_bytes();
            match serde_json::from_slice::<PhaseCommand>(&payload) {
                Ok(phase) => runtime.on_phase(phase),
                Err(e) => warn!("Failed to parse phase command: {}", e),
            }
        }
        while let Ok(Some(sample)) = sub_reset.try_recv() {
            let payload = sample.payload().to_bytes();
            match serde_json::from_slice::<ResetPose>(&payload) {
                Ok(reset) => chassis.reset_pose(Pose::from(&reset)),
                Err(e) => warn!("Failed to parse pose reset: {}", e),
            }
        }
        while let Ok(Some(sample)) = sub_heading.try_recv() {
            let payload = sample.payload().to_bytes();
            match serde_json::from_slice::<HeadingSample>(&payload) {
                Ok(reading) => {
                    heading_tracker.on_sample(reading);
                    heading_live = true;
                }
                Err(e) => warn!("Failed to parse heading sample: {}", e),
            }
        }
        while let Ok(Some(sample)) = sub_vision.try_recv() {
            let payload = sample.payload().to_bytes();
            match serde_json::from_slice::<VisionFrame>(&payload) {
                Ok(frame) => match chassis.ingest_vision(&frame, now_s) {
                    Ok(weight) => debug!("Vision frame fused, weight {:.3}", weight),
                    Err(DriveError::VisionRejected(reason)) => {
                        debug!("Vision frame rejected: {}", reason)
                    }
                    Err(e) => warn!("Vision ingest failed: {}", e),
                },
                Err(e) => warn!("Failed to parse vision frame: {}", e),
            }
        }

        // 2. Pick the command source (includes watchdog logic)
        let pose_available = chassis.estimate_mode().is_some();
        chassis.select_source(runtime.effective_source(now, pose_available));

        // 3. One drive cycle; a real gyro always wins over the synthetic one
        let heading = if heading_live {
            heading_tracker.state()
        } else {
            Some(HeadingState {
                heading_rad: sim_heading_rad,
                rate_radps: sim_rate_radps,
            })
        };
        if let Err(e) = chassis.cycle(heading, now_s, dt_s) {
            error!("Drive cycle failed: {}", e);
        }

        // 4. Advance the simulated hardware by one period
        for drive in &drives {
            drive.step(dt_s);
        }
        if !heading_live {
            match chassis.chassis_velocity() {
                Ok(velocity) => {
                    sim_rate_radps = velocity.omega_radps;
                    sim_heading_rad =
                        wrap_to_pi(sim_heading_rad + velocity.omega_radps * dt_s);
                }
                Err(e) => warn!("Simulated heading integration failed: {}", e),
            }
        }

        // 5. Publish state
        if let Ok(pose) = chassis.pose() {
            let report = PoseReport {
                pose,
                mode: chassis
                    .estimate_mode()
                    .unwrap_or(EstimateMode::DeadReckoning),
                acquired_id: chassis.acquired_landmark(),
            };
            pub_pose.put(serde_json::to_string(&report)?).await?;
        }
        match chassis.module_reports() {
            Ok(reports) => pub_modules.put(serde_json::to_string(&reports)?).await?,
            Err(e) => error!("Module state readback failed: {}", e),
        }
        pub_health.put(serde_json::to_string(&runtime.health)?).await?;
    }
}
