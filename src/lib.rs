// Library surface for the binary, headless/integration tests and reuse.
// Terminal rendering stays in the binary.
pub mod app_dirs;
pub mod attempt;
pub mod clock;
pub mod error;
pub mod generator;
pub mod problem;
pub mod records;
pub mod runtime;
pub mod session;
pub mod settings;
pub mod stats;
pub mod timed;
pub mod trainer;
pub mod util;

/// Interval between ticks of the event loop. Timed challenges are polled at this rate.
pub const TICK_RATE_MS: u64 = 100;
