//! Declarative stage descriptions and their validated, strongly typed form.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ScheduleError;

/// Rate-shaping function applied within a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Linear,
    Flat,
    Decay,
}

impl Shape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shape::Linear => "linear",
            Shape::Flat => "flat",
            Shape::Decay => "decay",
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Shape {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "linear" => Ok(Shape::Linear),
            "flat" => Ok(Shape::Flat),
            "decay" => Ok(Shape::Decay),
            other => Err(other.to_string()),
        }
    }
}

/// Loosely typed stage record as it appears in configuration files.
///
/// Every shape-specific parameter is optional here; [`StageConfig::to_stage`]
/// checks that the parameters required by `function` are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageConfig {
    /// Unique stage label, used in logs and error messages.
    pub name: String,
    /// Shape name: `linear`, `flat` or `decay`.
    pub function: String,
    /// First epoch covered by the stage.
    pub start: f64,
    /// Stage length in epochs.
    pub n_epochs: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decay_rate: Option<f64>,
}

impl StageConfig {
    fn new(name: &str, function: Shape, start: f64, n_epochs: f64) -> Self {
        Self {
            name: name.to_string(),
            function: function.as_str().to_string(),
            start,
            n_epochs,
            initial_rate: None,
            final_rate: None,
            rate: None,
            floor: None,
            decay_rate: None,
        }
    }

    /// Validates the record and converts it into a typed [`NamedStage`].
    pub fn to_stage(&self) -> Result<NamedStage, ScheduleError> {
        let shape: Shape = self
            .function
            .parse()
            .map_err(|shape| ScheduleError::UnknownShape {
                stage: self.name.clone(),
                shape,
            })?;

        let required = |value: Option<f64>, parameter: &'static str| {
            value.ok_or_else(|| ScheduleError::MissingParameter {
                stage: self.name.clone(),
                parameter,
            })
        };

        let stage = match shape {
            Shape::Linear => Stage::Linear {
                start: self.start,
                duration: self.n_epochs,
                initial_rate: required(self.initial_rate, "initial_rate")?,
                final_rate: self.final_rate,
            },
            Shape::Flat => Stage::Flat {
                start: self.start,
                duration: self.n_epochs,
                rate: self.rate,
            },
            Shape::Decay => Stage::Decay {
                start: self.start,
                duration: self.n_epochs,
                decay_rate: required(self.decay_rate, "decay_rate")?,
                floor: required(self.floor, "floor")?,
                rate: self.rate,
            },
        };

        let named = NamedStage::new(self.name.clone(), stage);
        named.validate()?;
        Ok(named)
    }
}

/// Strongly typed stage. Rates left as `None` fall back to the base learning
/// rate when the schedule is compiled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stage {
    Linear {
        start: f64,
        duration: f64,
        initial_rate: f64,
        final_rate: Option<f64>,
    },
    Flat {
        start: f64,
        duration: f64,
        rate: Option<f64>,
    },
    Decay {
        start: f64,
        duration: f64,
        decay_rate: f64,
        floor: f64,
        rate: Option<f64>,
    },
}

impl Stage {
    pub fn shape(&self) -> Shape {
        match self {
            Stage::Linear { .. } => Shape::Linear,
            Stage::Flat { .. } => Shape::Flat,
            Stage::Decay { .. } => Shape::Decay,
        }
    }

    pub fn start(&self) -> f64 {
        match *self {
            Stage::Linear { start, .. } | Stage::Flat { start, .. } | Stage::Decay { start, .. } => {
                start
            }
        }
    }

    pub fn duration(&self) -> f64 {
        match *self {
            Stage::Linear { duration, .. }
            | Stage::Flat { duration, .. }
            | Stage::Decay { duration, .. } => duration,
        }
    }

    /// Exclusive end of the declared interval.
    pub fn end(&self) -> f64 {
        self.start() + self.duration()
    }
}

/// A stage together with its label.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedStage {
    pub name: String,
    pub stage: Stage,
}

impl NamedStage {
    pub fn new(name: impl Into<String>, stage: Stage) -> Self {
        Self {
            name: name.into(),
            stage,
        }
    }

    /// Checks timing and shape parameters that do not depend on the base rate.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        let start = self.stage.start();
        if !start.is_finite() || start < 0.0 {
            return Err(ScheduleError::InvalidStart {
                stage: self.name.clone(),
                start,
            });
        }

        let duration = self.stage.duration();
        if !duration.is_finite() || duration <= 0.0 {
            return Err(ScheduleError::NonPositiveDuration {
                stage: self.name.clone(),
                duration,
            });
        }

        let finite = |value: Option<f64>, parameter: &'static str| match value {
            Some(value) if !value.is_finite() => Err(ScheduleError::NonFiniteRate {
                stage: self.name.clone(),
                parameter,
            }),
            _ => Ok(()),
        };

        match self.stage {
            Stage::Linear {
                initial_rate,
                final_rate,
                ..
            } => {
                finite(Some(initial_rate), "initial_rate")?;
                finite(final_rate, "final_rate")?;
            }
            Stage::Flat { rate, .. } => finite(rate, "rate")?,
            Stage::Decay {
                decay_rate,
                floor,
                rate,
                ..
            } => {
                if decay_rate.is_nan() || decay_rate <= 0.0 {
                    return Err(ScheduleError::NonPositiveDecayRate {
                        stage: self.name.clone(),
                        decay_rate,
                    });
                }
                finite(Some(decay_rate), "decay_rate")?;
                finite(Some(floor), "floor")?;
                finite(rate, "rate")?;
            }
        }

        Ok(())
    }
}

/// Converts configuration records into typed stages, preserving order.
pub fn parse_stages(configs: &[StageConfig]) -> Result<Vec<NamedStage>, ScheduleError> {
    let mut seen = HashSet::new();
    configs
        .iter()
        .map(|config| {
            if !seen.insert(config.name.as_str()) {
                return Err(ScheduleError::DuplicateStage(config.name.clone()));
            }
            config.to_stage()
        })
        .collect()
}

/// The schedule used when a run does not configure one: a one epoch linear
/// warm-up from `1e-5`, twenty flat epochs at the base rate, then a decay
/// toward `1e-5`.
pub fn default_stages() -> Vec<StageConfig> {
    vec![
        StageConfig {
            initial_rate: Some(1e-5),
            ..StageConfig::new("warm_up", Shape::Linear, 0.0, 1.0)
        },
        StageConfig::new("flat", Shape::Flat, 1.0, 20.0),
        StageConfig {
            floor: Some(1e-5),
            decay_rate: Some(0.999),
            ..StageConfig::new("decay", Shape::Decay, 21.0, 4.0)
        },
    ]
}
