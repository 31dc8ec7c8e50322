use clap::Parser;
use tracing_subscriber::EnvFilter;

use swerve_zenoh_runtime::runtime::RuntimeOptions;

/// Swerve drive control runtime over zenoh.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Drive simulated actuators (the only backend built into this binary)
    #[arg(long)]
    sim: bool,

    /// Interpret operator translation in the field frame
    #[arg(long)]
    field_oriented: bool,

    /// Snap-to-heading rotation from the right stick instead of stick rate
    #[arg(long)]
    heading_lock: bool,
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init(); // installs the subscriber globally

    let args = Args::parse();
    let options = RuntimeOptions {
        sim: args.sim,
        field_oriented: args.field_oriented,
        heading_lock: args.heading_lock,
    };

    if let Err(e) = swerve_zenoh_runtime::runtime::run(options).await {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}
