//! Logging abstractions

mod noop;
mod tracing_logger;
mod traits;

pub use noop::NoOpLogger;
pub use tracing_logger::TracingLogger;
pub use traits::{Logger, SharedLogger};
