//! Training hooks that exercise the data path and schedule without a network.

use std::time::Instant;

use trainer::metrics::{IMAGES_PER_SECOND, IO_FETCH_TIME};
use trainer::{Metrics, StepContext, TRAIN_SAMPLE, TrainerError, TrainingHooks, VAL_SAMPLE};

/// Fetches one minibatch per step and reports its timing together with the
/// scheduled learning rate.
#[derive(Debug, Default)]
pub struct DryRunHooks {
    pub train_steps: u64,
    pub val_steps: u64,
    pub ana_steps: u64,
    pub checkpoints: u64,
    pub epochs_completed: u64,
    pub last_learning_rate: Option<f64>,
    pub samples_seen: usize,
}

impl DryRunHooks {
    fn fetch(&mut self, ctx: &mut StepContext<'_>, sample: &str) -> Result<Metrics, TrainerError> {
        let started = Instant::now();
        let batch = ctx.fetcher.next_batch(sample)?;
        let io_fetch_time = started.elapsed().as_secs_f64();
        self.samples_seen += batch.len();

        let mut metrics = Metrics::new();
        metrics.insert(IO_FETCH_TIME.to_string(), io_fetch_time);
        metrics.insert(
            IMAGES_PER_SECOND.to_string(),
            batch.len() as f64 / io_fetch_time.max(f64::EPSILON),
        );
        if let Some(rate) = ctx.learning_rate {
            metrics.insert("learning_rate".to_string(), rate);
        }
        Ok(metrics)
    }
}

impl TrainingHooks for DryRunHooks {
    fn train_step(&mut self, ctx: &mut StepContext<'_>) -> Result<Metrics, TrainerError> {
        self.train_steps += 1;
        self.last_learning_rate = ctx.learning_rate;
        self.fetch(ctx, TRAIN_SAMPLE)
    }

    fn val_step(&mut self, ctx: &mut StepContext<'_>) -> Result<Metrics, TrainerError> {
        self.val_steps += 1;
        self.fetch(ctx, VAL_SAMPLE)
    }

    fn ana_step(&mut self, ctx: &mut StepContext<'_>) -> Result<Metrics, TrainerError> {
        self.ana_steps += 1;
        let mut metrics = Metrics::new();
        if let Some(progress) = ctx.progress {
            metrics.insert("progress".to_string(), progress);
        }
        Ok(metrics)
    }

    fn checkpoint(&mut self, _ctx: &StepContext<'_>) -> Result<(), TrainerError> {
        self.checkpoints += 1;
        Ok(())
    }

    fn on_epoch_end(&mut self, epoch: u64, ctx: &StepContext<'_>) -> Result<(), TrainerError> {
        self.epochs_completed = epoch;
        tracing::info!(epoch, global_step = ctx.global_step, "epoch complete");
        Ok(())
    }
}
