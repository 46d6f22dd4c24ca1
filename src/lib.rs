//! Staged learning-rate training controller: schedule compilation, sample
//! fetching and the training loop.

pub use datasets;
pub use lr_schedule;
pub use trainer;

pub use lr_schedule::{Schedule, ScheduleError, StageConfig, compile, compile_configs};
pub use trainer::{RunConfig, TrainerCore, TrainingHooks};
