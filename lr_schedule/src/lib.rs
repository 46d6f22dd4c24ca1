//! Piecewise learning-rate schedules compiled from declarative stage lists.
//!
//! A schedule is described as an ordered list of named stages, each with a
//! start epoch, a duration and a shape (linear ramp, flat rate or exponential
//! decay). [`compile`] validates the list and produces an immutable
//! [`Schedule`] that maps a training iteration to a learning rate.

pub mod error;
pub mod rate;
pub mod schedule;
pub mod stage;

pub use error::ScheduleError;
pub use rate::{Condition, RateFn};
pub use schedule::{CompiledStage, CoverageIssue, ProgressScale, Schedule, compile};
pub use stage::{NamedStage, Shape, Stage, StageConfig, default_stages, parse_stages};

/// Parses `configs` and compiles them in one step.
pub fn compile_configs(
    configs: &[StageConfig],
    base_learning_rate: f64,
    epochs_per_iteration: f64,
) -> Result<Schedule, ScheduleError> {
    let stages = parse_stages(configs)?;
    compile(&stages, base_learning_rate, epochs_per_iteration)
}
