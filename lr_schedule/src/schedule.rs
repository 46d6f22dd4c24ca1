//! Compilation of an ordered stage list into a single evaluable schedule.

use std::fmt;

use tracing::{debug, instrument, warn};

use crate::rate::{Condition, RateFn};
use crate::stage::{NamedStage, Stage};
use crate::ScheduleError;

/// Conversion factor from iteration count to epoch-fractional progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressScale {
    epochs_per_iteration: f64,
}

impl ProgressScale {
    /// Derives the scale as `minibatch_size / train_data_size`.
    pub fn new(minibatch_size: usize, train_data_size: usize) -> Result<Self, ScheduleError> {
        if minibatch_size == 0 || train_data_size == 0 {
            return Err(ScheduleError::EmptyProgressInputs {
                minibatch_size,
                train_data_size,
            });
        }
        Self::from_epochs_per_iteration(minibatch_size as f64 / train_data_size as f64)
    }

    pub fn from_epochs_per_iteration(epochs_per_iteration: f64) -> Result<Self, ScheduleError> {
        if !epochs_per_iteration.is_finite() || epochs_per_iteration <= 0.0 {
            return Err(ScheduleError::InvalidProgressScale(epochs_per_iteration));
        }
        Ok(Self {
            epochs_per_iteration,
        })
    }

    pub fn epochs_per_iteration(&self) -> f64 {
        self.epochs_per_iteration
    }

    pub fn progress(&self, iteration: u64) -> f64 {
        iteration as f64 * self.epochs_per_iteration
    }
}

/// One stage after compilation: its selection interval and rate function.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledStage {
    name: String,
    condition: Condition,
    rate_fn: RateFn,
}

impl CompiledStage {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn condition(&self) -> Condition {
        self.condition
    }

    pub fn rate_fn(&self) -> RateFn {
        self.rate_fn
    }
}

/// Discontinuity between consecutive declared stage intervals.
#[derive(Debug, Clone, PartialEq)]
pub enum CoverageIssue {
    /// The first stage starts after epoch zero.
    LeadingGap { stage: String, start: f64 },
    /// Progress in `[from, to)` is claimed by no stage.
    Gap {
        before: String,
        after: String,
        from: f64,
        to: f64,
    },
    /// Progress in `[from, to)` is claimed by both stages; the earlier one wins.
    Overlap {
        earlier: String,
        later: String,
        from: f64,
        to: f64,
    },
}

impl fmt::Display for CoverageIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoverageIssue::LeadingGap { stage, start } => {
                write!(f, "no stage covers [0, {start}) before `{stage}`")
            }
            CoverageIssue::Gap {
                before,
                after,
                from,
                to,
            } => write!(f, "no stage covers [{from}, {to}) between `{before}` and `{after}`"),
            CoverageIssue::Overlap {
                earlier,
                later,
                from,
                to,
            } => write!(f, "`{earlier}` shadows `{later}` over [{from}, {to})"),
        }
    }
}

/// Immutable piecewise learning-rate function over training iterations.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    stages: Vec<CompiledStage>,
    scale: ProgressScale,
    coverage: Vec<CoverageIssue>,
}

impl Schedule {
    /// Learning rate at `iteration`, after conversion to epochs.
    pub fn learning_rate(&self, iteration: u64) -> Result<f64, ScheduleError> {
        self.rate_at(self.scale.progress(iteration))
    }

    /// Learning rate at `progress` epochs. The first stage whose condition
    /// holds wins.
    pub fn rate_at(&self, progress: f64) -> Result<f64, ScheduleError> {
        self.select(progress)
            .map(|stage| stage.rate_fn.evaluate(progress))
            .ok_or(ScheduleError::Uncovered { progress })
    }

    /// Name of the stage selected at `progress`, if any.
    pub fn stage_at(&self, progress: f64) -> Option<&str> {
        self.select(progress).map(CompiledStage::name)
    }

    pub fn progress(&self, iteration: u64) -> f64 {
        self.scale.progress(iteration)
    }

    pub fn stages(&self) -> &[CompiledStage] {
        &self.stages
    }

    /// Gaps and overlaps between the declared intervals.
    pub fn coverage_gaps(&self) -> &[CoverageIssue] {
        &self.coverage
    }

    fn select(&self, progress: f64) -> Option<&CompiledStage> {
        self.stages
            .iter()
            .find(|stage| stage.condition.contains(progress))
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .stages
            .iter()
            .map(|stage| match stage.condition.end {
                Some(end) => format!("{}[{}, {})", stage.name, stage.condition.start, end),
                None => format!("{}[{}, inf)", stage.name, stage.condition.start),
            })
            .collect();
        write!(
            f,
            "{} (epochs/iteration {})",
            parts.join(" -> "),
            self.scale.epochs_per_iteration
        )
    }
}

/// Compiles `stages` into a [`Schedule`].
///
/// Stage rates left unspecified fall back to `base_learning_rate`. The final
/// stage stays active for all progress past its start, whatever its declared
/// duration. All validation happens here so evaluation can only fail on
/// progress that no stage covers.
#[instrument(skip(stages), fields(stage_count = stages.len()))]
pub fn compile(
    stages: &[NamedStage],
    base_learning_rate: f64,
    epochs_per_iteration: f64,
) -> Result<Schedule, ScheduleError> {
    if stages.is_empty() {
        return Err(ScheduleError::EmptySchedule);
    }
    if !base_learning_rate.is_finite() {
        return Err(ScheduleError::InvalidBaseRate(base_learning_rate));
    }
    let scale = ProgressScale::from_epochs_per_iteration(epochs_per_iteration)?;

    let mut seen = Vec::with_capacity(stages.len());
    for named in stages {
        if seen.contains(&named.name.as_str()) {
            return Err(ScheduleError::DuplicateStage(named.name.clone()));
        }
        seen.push(named.name.as_str());
        named.validate()?;
    }

    let last = stages.len() - 1;
    let compiled: Vec<CompiledStage> = stages
        .iter()
        .enumerate()
        .map(|(index, named)| {
            let stage = &named.stage;
            let condition = if index == last {
                Condition::open_ended(stage.start())
            } else {
                Condition::bounded(stage.start(), stage.end())
            };
            let rate_fn = rate_fn_for(stage, base_learning_rate);
            debug!(stage = %named.name, shape = %stage.shape(), ?condition, ?rate_fn, "compiled stage");
            CompiledStage {
                name: named.name.clone(),
                condition,
                rate_fn,
            }
        })
        .collect();

    let coverage = coverage_issues(stages);
    for issue in &coverage {
        warn!(%issue, "learning rate schedule is not contiguous");
    }

    Ok(Schedule {
        stages: compiled,
        scale,
        coverage,
    })
}

fn rate_fn_for(stage: &Stage, base_learning_rate: f64) -> RateFn {
    match *stage {
        Stage::Linear {
            start,
            duration,
            initial_rate,
            final_rate,
        } => RateFn::Linear {
            start,
            end: start + duration,
            initial_rate,
            final_rate: final_rate.unwrap_or(base_learning_rate),
        },
        Stage::Flat { rate, .. } => RateFn::Flat {
            rate: rate.unwrap_or(base_learning_rate),
        },
        Stage::Decay {
            start,
            decay_rate,
            floor,
            rate,
            ..
        } => RateFn::Decay {
            start,
            decay_rate,
            floor,
            rate: rate.unwrap_or(base_learning_rate),
        },
    }
}

fn coverage_issues(stages: &[NamedStage]) -> Vec<CoverageIssue> {
    let mut issues = Vec::new();

    if let Some(first) = stages.first() {
        if first.stage.start() > 0.0 {
            issues.push(CoverageIssue::LeadingGap {
                stage: first.name.clone(),
                start: first.stage.start(),
            });
        }
    }

    for pair in stages.windows(2) {
        let (earlier, later) = (&pair[0], &pair[1]);
        let end = earlier.stage.end();
        let next = later.stage.start();
        if next > end {
            issues.push(CoverageIssue::Gap {
                before: earlier.name.clone(),
                after: later.name.clone(),
                from: end,
                to: next,
            });
        } else if next < end {
            issues.push(CoverageIssue::Overlap {
                earlier: earlier.name.clone(),
                later: later.name.clone(),
                from: next,
                to: end,
            });
        }
    }

    issues
}
