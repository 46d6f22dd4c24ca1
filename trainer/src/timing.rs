use std::time::Duration;

use tracing::info;

const TAIL_WINDOW: usize = 40;

/// Wall-clock breakdown of a `batch_process` run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TimingSummary {
    pub iterations: usize,
    pub total: Duration,
    /// Time after the first iteration completed.
    pub except_first: Option<Duration>,
    /// Time after the second iteration completed.
    pub except_first_two: Option<Duration>,
    /// Summed duration of the last 40 iterations, when more than 40 ran.
    pub last_window: Option<Duration>,
}

impl TimingSummary {
    pub(crate) fn from_iterations(
        total: Duration,
        except_first: Option<Duration>,
        except_first_two: Option<Duration>,
        iteration_times: &[Duration],
    ) -> Self {
        let last_window = (iteration_times.len() > TAIL_WINDOW).then(|| {
            iteration_times[iteration_times.len() - TAIL_WINDOW..]
                .iter()
                .sum::<Duration>()
        });
        Self {
            iterations: iteration_times.len(),
            total,
            except_first,
            except_first_two,
            last_window,
        }
    }

    pub fn log(&self) {
        info!(
            iterations = self.iterations,
            seconds = self.total.as_secs_f64(),
            "total time to batch_process"
        );
        if let Some(elapsed) = self.except_first {
            info!(
                seconds = elapsed.as_secs_f64(),
                "total time to batch process except first iteration"
            );
        }
        if let Some(elapsed) = self.except_first_two {
            info!(
                seconds = elapsed.as_secs_f64(),
                "total time to batch process except first two iterations"
            );
        }
        if let Some(elapsed) = self.last_window {
            info!(
                seconds = elapsed.as_secs_f64(),
                window = TAIL_WINDOW,
                "total time to batch process last iterations"
            );
        }
    }
}
