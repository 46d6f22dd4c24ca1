//! Training loop controller: prepares samples, compiles the learning rate
//! schedule and drives user supplied [`TrainingHooks`] through iterations.

pub mod config;
pub mod error;
pub mod hooks;
pub mod metrics;
pub mod runner;
pub mod timing;

pub use config::{Mode, OptimizerConfig, RunConfig};
pub use error::TrainerError;
pub use hooks::{StepContext, TrainingHooks};
pub use metrics::{Metrics, log_line};
pub use runner::{TRAIN_SAMPLE, TrainerCore, VAL_SAMPLE};
pub use timing::TimingSummary;
