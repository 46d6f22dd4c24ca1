use std::path::PathBuf;

use datasets::DatasetError;
use lr_schedule::ScheduleError;
use thiserror::Error;

/// Errors that abort a training or inference run.
#[derive(Debug, Error)]
pub enum TrainerError {
    /// The configured training file does not exist.
    #[error("can not open training file {file} in directory {directory}")]
    MissingTrainingFile { file: PathBuf, directory: PathBuf },
    #[error("dataset error: {0}")]
    Dataset(#[from] DatasetError),
    /// The learning rate schedule failed to compile or evaluate.
    #[error("learning rate schedule error: {0}")]
    Schedule(#[from] ScheduleError),
    /// A step hook was invoked that the hooks implementation does not provide.
    #[error("`{0}` is not implemented by these training hooks")]
    NotImplemented(&'static str),
    /// A schedule was requested before one was built.
    #[error("learning rate schedule has not been built")]
    ScheduleNotBuilt,
    /// Failure raised inside a hook implementation.
    #[error(transparent)]
    Hook(#[from] anyhow::Error),
}
