//! Application wiring: config loading, async logging, background
//! reclamation, drop-rate statistics, and the orchestrator that starts and
//! stops every pipeline stage in order.

pub mod config;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod reclaim;
pub mod stats;

pub use config::{AppConfig, FindfaceCredentials};
pub use error::{AppError, AppResult};
pub use logging::AsyncLogger;
pub use orchestrator::{Orchestrator, PipelineDeps};
pub use reclaim::{BackgroundReclaimer, NullTensorCacheReleaser, TensorCacheReleaser};
pub use stats::DropStats;
