//! Lifecycle hooks a concrete trainer supplies to [`TrainerCore`](crate::TrainerCore).

use datasets::SampleFetcher;

use crate::{Metrics, TrainerError};

/// State handed to step hooks for the current iteration.
pub struct StepContext<'a> {
    pub iteration: u64,
    pub global_step: u64,
    /// Epoch-fractional progress, known once the training sample is prepared.
    pub progress: Option<f64>,
    /// Scheduled learning rate for this iteration (train mode only).
    pub learning_rate: Option<f64>,
    pub fetcher: &'a mut dyn SampleFetcher,
}

/// Network-specific behaviour plugged into the training loop.
///
/// Every hook has a default: lifecycle hooks do nothing, [`Self::metrics`]
/// passes metrics through unchanged, and the three step hooks report
/// [`TrainerError::NotImplemented`].
pub trait TrainingHooks {
    fn init_network(&mut self) -> Result<(), TrainerError> {
        Ok(())
    }

    fn print_network_info(&self) {}

    fn set_compute_parameters(&mut self) -> Result<(), TrainerError> {
        Ok(())
    }

    fn train_step(&mut self, _ctx: &mut StepContext<'_>) -> Result<Metrics, TrainerError> {
        Err(TrainerError::NotImplemented("train_step"))
    }

    fn val_step(&mut self, _ctx: &mut StepContext<'_>) -> Result<Metrics, TrainerError> {
        Err(TrainerError::NotImplemented("val_step"))
    }

    fn ana_step(&mut self, _ctx: &mut StepContext<'_>) -> Result<Metrics, TrainerError> {
        Err(TrainerError::NotImplemented("ana_step"))
    }

    fn checkpoint(&mut self, _ctx: &StepContext<'_>) -> Result<(), TrainerError> {
        Ok(())
    }

    fn on_step_end(&mut self, _ctx: &StepContext<'_>) -> Result<(), TrainerError> {
        Ok(())
    }

    fn on_epoch_end(&mut self, _epoch: u64, _ctx: &StepContext<'_>) -> Result<(), TrainerError> {
        Ok(())
    }

    /// Reduction point for metrics, e.g. averaging across workers.
    fn metrics(&mut self, metrics: Metrics) -> Metrics {
        metrics
    }

    fn stop(&mut self) {}

    fn close_savers(&mut self) -> Result<(), TrainerError> {
        Ok(())
    }
}
