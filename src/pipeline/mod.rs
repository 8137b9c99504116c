//! The running system: one worker per watched source feeding a shared
//! dispatcher and a single analytics writer.

mod error;
mod runner;
mod worker;

pub use error::PipelineError;
pub use runner::{shutdown_signal, Pipeline};
pub use worker::{ChannelWorker, WorkerStats};
