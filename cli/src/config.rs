use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use trainer::{OptimizerConfig, RunConfig};

/// Settings driving the `train` and `inference` commands.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RunSettings {
    /// Training core configuration: mode, iterations, dataset and optimizer.
    #[serde(default)]
    pub run: RunConfig,
    /// Serve this many synthetic samples instead of reading dataset files.
    #[serde(default)]
    pub synthetic_samples: Option<usize>,
    /// Location where the run summary is written.
    #[serde(default = "RunSettings::default_report")]
    pub report: PathBuf,
    /// Optional flamegraph destination collected while the loop runs.
    #[serde(default)]
    pub profile_output: Option<PathBuf>,
}

impl RunSettings {
    fn default_report() -> PathBuf {
        PathBuf::from("reports/run_summary.txt")
    }
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            run: RunConfig::default(),
            synthetic_samples: None,
            report: Self::default_report(),
            profile_output: None,
        }
    }
}

/// Settings for previewing a learning rate schedule without training.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ScheduleSettings {
    /// Base rate and stages, in the same form as a run's optimizer section.
    #[serde(default)]
    pub optimizer: OptimizerConfig,
    #[serde(default = "ScheduleSettings::default_minibatch_size")]
    pub minibatch_size: usize,
    /// Number of samples in one training epoch.
    #[serde(default = "ScheduleSettings::default_train_data_size")]
    pub train_data_size: usize,
    /// Last iteration printed.
    #[serde(default = "ScheduleSettings::default_iterations")]
    pub iterations: u64,
    /// Print one row every `every` iterations.
    #[serde(default = "ScheduleSettings::default_every")]
    pub every: u64,
}

impl ScheduleSettings {
    fn default_minibatch_size() -> usize {
        RunConfig::default().minibatch_size
    }

    fn default_train_data_size() -> usize {
        200
    }

    fn default_iterations() -> u64 {
        2_500
    }

    fn default_every() -> u64 {
        100
    }
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            optimizer: OptimizerConfig::default(),
            minibatch_size: Self::default_minibatch_size(),
            train_data_size: Self::default_train_data_size(),
            iterations: Self::default_iterations(),
            every: Self::default_every(),
        }
    }
}

/// Loads TOML settings for the requested command, falling back to defaults when missing.
pub fn load_settings<T>(command: &str, explicit: Option<PathBuf>) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let (candidate, explicit_provided) = match explicit {
        Some(path) => (path, true),
        None => (PathBuf::from(format!("{command}.toml")), false),
    };

    if candidate.exists() {
        let raw = std::fs::read_to_string(&candidate).with_context(|| {
            format!(
                "failed to read configuration for `{command}` from {}",
                candidate.display()
            )
        })?;
        let parsed = toml::from_str(&raw).with_context(|| {
            format!(
                "failed to parse TOML configuration for `{command}` at {}",
                candidate.display()
            )
        })?;
        Ok(parsed)
    } else if explicit_provided {
        bail!(
            "configuration file for `{command}` not found at {}",
            candidate.display()
        );
    } else {
        Ok(T::default())
    }
}
