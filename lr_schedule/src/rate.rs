//! Per-stage interval conditions and rate functions.

/// Interval of progress (in epochs) during which a stage is active.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Condition {
    pub start: f64,
    /// Exclusive upper bound; `None` for the open-ended final stage.
    pub end: Option<f64>,
}

impl Condition {
    pub fn bounded(start: f64, end: f64) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    pub fn open_ended(start: f64) -> Self {
        Self { start, end: None }
    }

    pub fn contains(&self, progress: f64) -> bool {
        match self.end {
            Some(end) => progress >= self.start && progress < end,
            None => progress >= self.start,
        }
    }
}

/// Rate function of a compiled stage with its parameters captured by value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateFn {
    /// Interpolates over `[start, end]`, saturating at the endpoint rates.
    Linear {
        start: f64,
        end: f64,
        initial_rate: f64,
        final_rate: f64,
    },
    Flat {
        rate: f64,
    },
    /// Relaxes from `rate` at `start` toward `floor`.
    Decay {
        start: f64,
        decay_rate: f64,
        floor: f64,
        rate: f64,
    },
}

impl RateFn {
    pub fn evaluate(&self, progress: f64) -> f64 {
        match *self {
            RateFn::Linear {
                start,
                end,
                initial_rate,
                final_rate,
            } => {
                if progress <= start {
                    initial_rate
                } else if progress >= end {
                    final_rate
                } else {
                    let fraction = (progress - start) / (end - start);
                    initial_rate + fraction * (final_rate - initial_rate)
                }
            }
            RateFn::Flat { rate } => rate,
            RateFn::Decay {
                start,
                decay_rate,
                floor,
                rate,
            } => (rate - floor) * (-decay_rate * (progress - start)).exp() + floor,
        }
    }
}
