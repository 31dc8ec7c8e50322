// Synthetic sensor feed for sim runs: a steady heading at 50Hz plus vision
// frames at 5Hz whose pose orbits the field origin. Every eighth frame is
// published with hopeless ambiguity so the runtime's gate has something to
// reject.
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::time::interval;
use tracing::info;

use swerve_zenoh_runtime::chassis::Pose;
use swerve_zenoh_runtime::config;
use swerve_zenoh_runtime::messages::{HeadingSample, LandmarkObservation, VisionFrame};

const ORBIT_RADIUS_M: f64 = 1.5;
const ORBIT_RATE_RADPS: f64 = 0.05;
const VISION_EVERY_N_TICKS: u64 = 10; // 5Hz against the 50Hz heading
const REJECTED_EVERY_N_FRAMES: u64 = 8;

fn epoch_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;
    let heading_pub = session
        .declare_publisher(config::TOPIC_SENSOR_HEADING)
        .await?;
    let vision_pub = session
        .declare_publisher(config::TOPIC_SENSOR_VISION)
        .await?;

    info!(
        "Publishing heading on {} and vision on {}",
        config::TOPIC_SENSOR_HEADING,
        config::TOPIC_SENSOR_VISION
    );

    let mut ticker = interval(Duration::from_millis(1000 / config::LOOP_HZ));

    let start_s = epoch_seconds();
    let mut tick: u64 = 0;
    let mut frames: u64 = 0;

    loop {
        ticker.tick().await;
        tick += 1;
        let now_s = epoch_seconds();

        let heading = HeadingSample {
            heading_rad: 0.0,
            stamp_s: now_s,
        };
        heading_pub.put(serde_json::to_string(&heading)?).await?;

        if tick % VISION_EVERY_N_TICKS != 0 {
            continue;
        }
        frames += 1;

        let phase = (now_s - start_s) * ORBIT_RATE_RADPS;
        let ambiguity = if frames % REJECTED_EVERY_N_FRAMES == 0 {
            0.6
        } else {
            0.05
        };
        let frame = VisionFrame {
            stamp_s: now_s,
            pose: Some(Pose::new(
                ORBIT_RADIUS_M * phase.cos(),
                ORBIT_RADIUS_M * phase.sin(),
                0.0,
            )),
            landmarks: vec![
                LandmarkObservation {
                    id: 7,
                    range_m: 2.0 + 0.5 * phase.sin(),
                    ambiguity,
                },
                LandmarkObservation {
                    id: 12,
                    range_m: 3.5,
                    ambiguity: 0.15,
                },
            ],
        };
        vision_pub.put(serde_json::to_string(&frame)?).await?;

        if frames % 25 == 0 {
            info!("{} vision frames published", frames);
        }
    }
}
