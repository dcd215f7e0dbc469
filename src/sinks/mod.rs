//! Built-in sinks

pub mod buffered;
pub mod file;
pub mod rotation;
pub mod stdout;

pub use buffered::{BufferOptions, BufferedSink, Reopen, ReopenFuture};
pub use file::{FileSink, FileSinkOptions};
pub use rotation::{RetentionReport, RotationManager};
pub use stdout::{SharedWriter, StdoutSink};
