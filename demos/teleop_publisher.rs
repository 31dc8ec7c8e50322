// Keyboard teleop: WASD move, Q/E rotate, Space lock, R/F stick scale, Esc quit
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::time::{Duration, Instant};
use tracing::info;

use swerve_zenoh_runtime::config;
use swerve_zenoh_runtime::messages::OperatorFrame;

const DEFLECTIONS: [f64; 3] = [0.3, 0.6, 1.0]; // virtual stick throw
const INPUT_TIMEOUT_MS: u64 = 100; // Recenter sticks after this much time with no input

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;
    let publisher = session.declare_publisher(config::TOPIC_CMD_OPERATOR).await?;

    info!("Controls: WASD=move, Q/E=rotate, Space=lock, R/F=stick scale, Esc=quit");
    info!("Stick scale: LOW");

    enable_raw_mode()?;
    let result = run_teleop(&publisher).await;
    disable_raw_mode()?;

    result
}

async fn run_teleop(
    publisher: &zenoh::pubsub::Publisher<'_>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut scale_idx: usize = 0;

    // Persistent virtual-stick state, gamepad polarity: the runtime reads
    // stick up as -y and stick right as +x
    let mut frame = OperatorFrame::default();
    let mut last_movement_input = Instant::now();

    loop {
        // Poll for key with 20ms timeout (50Hz effective rate)
        if event::poll(Duration::from_millis(20))? {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                let pressed = kind == KeyEventKind::Press || kind == KeyEventKind::Repeat;
                let throw = DEFLECTIONS[scale_idx];

                match code {
                    // Translation on the left stick
                    KeyCode::Char('w') if pressed => {
                        frame.left_y = -throw;
                        last_movement_input = Instant::now();
                    }
                    KeyCode::Char('s') if pressed => {
                        frame.left_y = throw;
                        last_movement_input = Instant::now();
                    }
                    KeyCode::Char('a') if pressed => {
                        frame.left_x = -throw;
                        last_movement_input = Instant::now();
                    }
                    KeyCode::Char('d') if pressed => {
                        frame.left_x = throw;
                        last_movement_input = Instant::now();
                    }

                    // Rotation on the right stick
                    KeyCode::Char('q') if pressed => {
                        frame.right_x = -throw;
                        last_movement_input = Instant::now();
                    }
                    KeyCode::Char('e') if pressed => {
                        frame.right_x = throw;
                        last_movement_input = Instant::now();
                    }

                    // X-stance latch
                    KeyCode::Char(' ') if pressed => {
                        frame.lock = !frame.lock;
                        info!("Lock: {}", if frame.lock { "ON" } else { "OFF" });
                    }

                    // Stick scale
                    KeyCode::Char('r') if pressed => {
                        scale_idx = (scale_idx + 1).min(2);
                        print_scale(scale_idx);
                    }
                    KeyCode::Char('f') if pressed => {
                        scale_idx = scale_idx.saturating_sub(1);
                        print_scale(scale_idx);
                    }

                    KeyCode::Esc if pressed => break,

                    _ => {}
                }
            }
        }

        // Recenter sticks if no movement input for INPUT_TIMEOUT_MS; the
        // lock latch stays where it was put
        if last_movement_input.elapsed() > Duration::from_millis(INPUT_TIMEOUT_MS) {
            frame.left_x = 0.0;
            frame.left_y = 0.0;
            frame.right_x = 0.0;
            frame.right_y = 0.0;
        }

        // Always publish at ~50Hz so the runtime's watchdog stays fed
        publisher.put(serde_json::to_string(&frame)?).await?;
    }

    Ok(())
}

fn print_scale(idx: usize) {
    let label = ["LOW", "MED", "HIGH"][idx];
    info!("Stick scale: {}", label);
}
