//! The training runner: IO preparation, schedule construction and the
//! iteration loop that drives [`TrainingHooks`].

use std::time::{Duration, Instant};

use datasets::{SampleFetcher, SampleRequest};
use lr_schedule::{ProgressScale, Schedule, StageConfig, compile_configs, default_stages};
use tracing::{info, instrument, warn};

use crate::hooks::{StepContext, TrainingHooks};
use crate::metrics::{Metrics, log_line};
use crate::timing::TimingSummary;
use crate::{Mode, RunConfig, TrainerError};

pub const TRAIN_SAMPLE: &str = "primary";
pub const VAL_SAMPLE: &str = "val";

/// Coordinates data preparation, learning rate scheduling and the step loop
/// for a set of [`TrainingHooks`].
pub struct TrainerCore<F, H> {
    config: RunConfig,
    fetcher: F,
    hooks: H,
    iteration: u64,
    global_step: u64,
    train_data_size: Option<usize>,
    val_data_size: Option<usize>,
    schedule: Option<Schedule>,
}

impl<F, H> TrainerCore<F, H>
where
    F: SampleFetcher,
    H: TrainingHooks,
{
    pub fn new(config: RunConfig, fetcher: F, hooks: H) -> Self {
        Self {
            config,
            fetcher,
            hooks,
            iteration: 0,
            global_step: 0,
            train_data_size: None,
            val_data_size: None,
            schedule: None,
        }
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn into_hooks(self) -> H {
        self.hooks
    }

    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    pub fn global_step(&self) -> u64 {
        self.global_step
    }

    pub fn train_data_size(&self) -> Option<usize> {
        self.train_data_size
    }

    pub fn val_data_size(&self) -> Option<usize> {
        self.val_data_size
    }

    pub fn schedule(&self) -> Option<&Schedule> {
        self.schedule.as_ref()
    }

    /// Prepares IO, builds the learning rate schedule for training runs and
    /// runs the network setup hooks.
    pub fn initialize(&mut self) -> Result<(), TrainerError> {
        self.initialize_io()?;
        if self.config.mode == Mode::Train {
            let stages = self.config.optimizer.lr_schedule.clone();
            self.build_lr_schedule(stages.as_deref())?;
        }
        self.hooks.init_network()?;
        self.hooks.print_network_info();
        self.hooks.set_compute_parameters()?;
        Ok(())
    }

    /// Prepares the training sample and, when its file exists, the validation
    /// sample. Inference runs prepare nothing.
    #[instrument(skip(self), fields(mode = self.config.mode.as_str()))]
    pub fn initialize_io(&mut self) -> Result<(), TrainerError> {
        if self.config.mode != Mode::Train {
            return Ok(());
        }

        let dataset = &self.config.dataset;
        let train_path = dataset.train_path();
        if !train_path.exists() {
            return Err(TrainerError::MissingTrainingFile {
                file: dataset.train_file.clone(),
                directory: dataset.data_directory.clone(),
            });
        }

        let request = SampleRequest::new(TRAIN_SAMPLE, train_path, self.config.minibatch_size);
        self.train_data_size = Some(self.fetcher.prepare_sample(&request)?);

        let val_path = dataset.val_path();
        if val_path.exists() {
            let request = SampleRequest::new(VAL_SAMPLE, val_path, self.config.minibatch_size);
            self.val_data_size = Some(self.fetcher.prepare_sample(&request)?);
        } else {
            self.val_data_size = None;
            info!(
                file = %dataset.val_file.display(),
                directory = %dataset.data_directory.display(),
                "can not open validation file, skipping"
            );
        }

        Ok(())
    }

    /// Compiles `stages` (the default schedule when `None`) against the base
    /// optimizer rate and the prepared training sample size.
    pub fn build_lr_schedule(&mut self, stages: Option<&[StageConfig]>) -> Result<(), TrainerError> {
        let train_data_size = self.train_data_size.unwrap_or(0);
        let scale = ProgressScale::new(self.config.minibatch_size, train_data_size)?;

        let defaults;
        let stages = match stages {
            Some(stages) => stages,
            None => {
                defaults = default_stages();
                defaults.as_slice()
            }
        };

        let schedule = compile_configs(
            stages,
            self.config.optimizer.learning_rate,
            scale.epochs_per_iteration(),
        )?;
        info!(%schedule, "learning rate schedule built");
        self.schedule = Some(schedule);
        Ok(())
    }

    /// Scheduled learning rate for the current iteration.
    pub fn learning_rate(&self) -> Result<f64, TrainerError> {
        let schedule = self
            .schedule
            .as_ref()
            .ok_or(TrainerError::ScheduleNotBuilt)?;
        Ok(schedule.learning_rate(self.iteration)?)
    }

    /// Runs the configured number of iterations. Training runs validate (when
    /// a validation sample exists), train and checkpoint each iteration;
    /// inference runs analyse. Savers are closed even when a step fails.
    #[instrument(skip(self), fields(mode = self.config.mode.as_str(), iterations = self.config.iterations))]
    pub fn batch_process(&mut self) -> Result<TimingSummary, TrainerError> {
        let start = Instant::now();
        let mut post_one: Option<Instant> = None;
        let mut post_two: Option<Instant> = None;
        let mut times: Vec<Duration> = Vec::new();

        let outcome = self.run_iterations(&mut post_one, &mut post_two, &mut times);
        if let Err(error) = &outcome {
            warn!(iteration = self.iteration, %error, "batch processing aborted");
        }
        let closed = self.hooks.close_savers();
        outcome?;
        closed?;

        if self.config.mode == Mode::Train {
            info!(iteration = self.iteration, global_step = self.global_step, "finished training");
        }

        let end = Instant::now();
        let summary = TimingSummary::from_iterations(
            end - start,
            post_one.map(|instant| end - instant),
            post_two.map(|instant| end - instant),
            &times,
        );
        summary.log();
        Ok(summary)
    }

    fn run_iterations(
        &mut self,
        post_one: &mut Option<Instant>,
        post_two: &mut Option<Instant>,
        times: &mut Vec<Duration>,
    ) -> Result<(), TrainerError> {
        for iteration in 0..self.config.iterations {
            self.iteration = iteration;
            let iteration_start = Instant::now();

            match self.config.mode {
                Mode::Train => self.train_iteration()?,
                Mode::Inference => self.inference_iteration()?,
            }

            if post_one.is_none() {
                *post_one = Some(Instant::now());
            } else if post_two.is_none() {
                *post_two = Some(Instant::now());
            }
            times.push(iteration_start.elapsed());
        }
        Ok(())
    }

    /// Stops the hooks and releases prepared samples.
    pub fn stop(&mut self) {
        self.hooks.stop();
        self.fetcher.stop();
    }

    fn train_iteration(&mut self) -> Result<(), TrainerError> {
        let learning_rate = self.learning_rate()?;
        let (progress, next_progress) = match &self.schedule {
            Some(schedule) => (
                schedule.progress(self.iteration),
                schedule.progress(self.iteration + 1),
            ),
            None => return Err(TrainerError::ScheduleNotBuilt),
        };

        let mut ctx = StepContext {
            iteration: self.iteration,
            global_step: self.global_step,
            progress: Some(progress),
            learning_rate: Some(learning_rate),
            fetcher: &mut self.fetcher,
        };

        if self.val_data_size.is_some() {
            let metrics = self.hooks.val_step(&mut ctx)?;
            let metrics = self.hooks.metrics(metrics);
            log_metrics("val", self.global_step, &metrics, &self.config.log_keys);
        }

        let metrics = self.hooks.train_step(&mut ctx)?;
        let metrics = self.hooks.metrics(metrics);
        log_metrics("train", self.global_step, &metrics, &self.config.log_keys);
        self.global_step += 1;
        ctx.global_step = self.global_step;

        self.hooks.checkpoint(&ctx)?;
        self.hooks.on_step_end(&ctx)?;

        if next_progress.floor() > progress.floor() {
            self.hooks.on_epoch_end(next_progress.floor() as u64, &ctx)?;
        }
        Ok(())
    }

    fn inference_iteration(&mut self) -> Result<(), TrainerError> {
        let mut ctx = StepContext {
            iteration: self.iteration,
            global_step: self.global_step,
            progress: self.schedule.as_ref().map(|s| s.progress(self.iteration)),
            learning_rate: None,
            fetcher: &mut self.fetcher,
        };

        let metrics = self.hooks.ana_step(&mut ctx)?;
        let metrics = self.hooks.metrics(metrics);
        log_metrics("ana", self.global_step, &metrics, &self.config.log_keys);
        self.hooks.on_step_end(&ctx)?;
        Ok(())
    }
}

fn log_metrics(kind: &str, global_step: u64, metrics: &Metrics, log_keys: &[String]) {
    info!("{}", log_line(kind, global_step, metrics, log_keys));
}
