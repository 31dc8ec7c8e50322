// Operator input shaping and motion profiling
//
// Provides:
// - Slew rate limiting for scalar inputs
// - Trapezoidal motion profiles for heading snaps
// - The input shaper turning gamepad frames into drive commands

pub mod profile;
pub mod shaper;
pub mod slew;

pub use profile::{Constraints, ProfileState, TrapezoidProfile};
pub use shaper::{HeadingLockConfig, HeadingState, InputShaper, InputShaperConfig};
pub use slew::SlewRateLimiter;
