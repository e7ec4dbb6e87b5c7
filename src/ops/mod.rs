pub mod telemetry;

pub use telemetry::{init_tracing, init_tracing_pretty, init_with_format, LogFormat};
