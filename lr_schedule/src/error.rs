use thiserror::Error;

/// Errors raised while compiling or evaluating a learning-rate schedule.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScheduleError {
    /// The stage list did not contain any stage.
    #[error("learning rate schedule must contain at least one stage")]
    EmptySchedule,
    /// A stage named a shape that is not `linear`, `flat` or `decay`.
    #[error("stage `{stage}` uses unknown function `{shape}`")]
    UnknownShape { stage: String, shape: String },
    /// A shape-specific parameter without a fallback was omitted.
    #[error("stage `{stage}` is missing required parameter `{parameter}`")]
    MissingParameter {
        stage: String,
        parameter: &'static str,
    },
    /// Stage durations must be positive and finite.
    #[error("stage `{stage}` has non-positive duration {duration}")]
    NonPositiveDuration { stage: String, duration: f64 },
    /// Stage starts must be non-negative and finite.
    #[error("stage `{stage}` has invalid start {start}")]
    InvalidStart { stage: String, start: f64 },
    /// Decay stages need a positive decay rate.
    #[error("stage `{stage}` has non-positive decay rate {decay_rate}")]
    NonPositiveDecayRate { stage: String, decay_rate: f64 },
    /// A rate parameter was NaN or infinite.
    #[error("stage `{stage}` has non-finite `{parameter}`")]
    NonFiniteRate {
        stage: String,
        parameter: &'static str,
    },
    /// Two stages share a name.
    #[error("stage `{0}` is declared more than once")]
    DuplicateStage(String),
    /// The fallback learning rate was not a finite number.
    #[error("base learning rate {0} is not finite")]
    InvalidBaseRate(f64),
    /// The iteration to epoch conversion factor was unusable.
    #[error("epochs per iteration must be positive and finite, got {0}")]
    InvalidProgressScale(f64),
    /// Minibatch or dataset size of zero while deriving the progress scale.
    #[error("cannot derive progress scale from minibatch size {minibatch_size} and {train_data_size} training samples")]
    EmptyProgressInputs {
        minibatch_size: usize,
        train_data_size: usize,
    },
    /// No stage condition held at the requested progress.
    #[error("no schedule stage covers progress {progress} (epochs)")]
    Uncovered { progress: f64 },
}
