use datasets::DatasetConfig;
use lr_schedule::StageConfig;
use serde::{Deserialize, Serialize};

/// Whether a run optimizes the network or only analyses data with it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Train,
    Inference,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Train => "train",
            Mode::Inference => "inference",
        }
    }
}

/// Optimizer settings that feed the learning rate schedule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Base rate used by stages that do not set their own.
    pub learning_rate: f64,
    /// Ordered schedule stages; the default three-stage schedule when absent.
    pub lr_schedule: Option<Vec<StageConfig>>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-3,
            lr_schedule: None,
        }
    }
}

/// Configuration for a single run of the training core.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub mode: Mode,
    pub iterations: u64,
    pub minibatch_size: usize,
    pub dataset: DatasetConfig,
    pub optimizer: OptimizerConfig,
    /// Metric keys included in per-step log lines.
    pub log_keys: Vec<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Train,
            iterations: 500,
            minibatch_size: 2,
            dataset: DatasetConfig::default(),
            optimizer: OptimizerConfig::default(),
            log_keys: vec!["loss".into(), "accuracy".into(), "learning_rate".into()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: RunConfig = toml::from_str(
            r#"
mode = "inference"
iterations = 10

[optimizer]
learning_rate = 0.01
"#,
        )
        .expect("run config parses");

        assert_eq!(config.mode, Mode::Inference);
        assert_eq!(config.iterations, 10);
        assert_eq!(config.minibatch_size, 2);
        assert_eq!(config.optimizer.learning_rate, 0.01);
        assert!(config.optimizer.lr_schedule.is_none());
        assert_eq!(config.dataset, DatasetConfig::default());
    }

    #[test]
    fn schedule_stages_keep_declaration_order() {
        let config: RunConfig = toml::from_str(
            r#"
[[optimizer.lr_schedule]]
name = "ramp_up"
function = "linear"
start = 0
n_epochs = 10
initial_rate = 1e-5
final_rate = 1e-3

[[optimizer.lr_schedule]]
name = "ramp_down"
function = "linear"
start = 10
n_epochs = 10
initial_rate = 1e-3
final_rate = 1e-5
"#,
        )
        .expect("run config parses");

        let stages = config.optimizer.lr_schedule.expect("stages present");
        let names: Vec<_> = stages.iter().map(|stage| stage.name.as_str()).collect();
        assert_eq!(names, vec!["ramp_up", "ramp_down"]);
    }
}
