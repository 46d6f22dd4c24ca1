use std::collections::BTreeMap;
use std::fmt::Write;

/// Named scalar metrics reported by a step.
pub type Metrics = BTreeMap<String, f64>;

pub const IMAGES_PER_SECOND: &str = "images_per_second";
pub const IO_FETCH_TIME: &str = "io_fetch_time";
pub const GLOBAL_STEP: &str = "global_step";

/// Formats one log line for the metrics of a `kind` step (`train`, `val`,
/// `ana`). Only `log_keys` are printed, in their configured order; train lines
/// end with throughput and IO time.
pub fn log_line(kind: &str, global_step: u64, metrics: &Metrics, log_keys: &[String]) -> String {
    let mut line = format!("{kind} Global Step {global_step}: ");

    for key in log_keys.iter().filter(|key| key.as_str() != GLOBAL_STEP) {
        if let Some(value) = metrics.get(key) {
            let _ = write!(line, "{key}: {}, ", format_value(*value));
        }
    }

    if kind == "train" {
        if let Some(rate) = metrics.get(IMAGES_PER_SECOND) {
            let _ = write!(line, "Img/s: {rate:.2} ");
        }
        if let Some(io) = metrics.get(IO_FETCH_TIME) {
            let _ = write!(line, "IO: {io:.2} ");
        }
    }
    line.truncate(line.trim_end_matches([',', ' ']).len());

    line
}

fn format_value(value: f64) -> String {
    if value != 0.0 && value.abs() < 1e-2 {
        format!("{value:.3e}")
    } else {
        format!("{value:.3}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(entries: &[(&str, f64)]) -> Metrics {
        entries
            .iter()
            .map(|(key, value)| (key.to_string(), *value))
            .collect()
    }

    fn keys(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|key| key.to_string()).collect()
    }

    #[test]
    fn train_line_appends_throughput() {
        let values = metrics(&[
            ("loss", 0.25),
            ("learning_rate", 1e-5),
            (IMAGES_PER_SECOND, 123.456),
            (IO_FETCH_TIME, 0.0421),
            ("ignored", 9.0),
        ]);
        let line = log_line("train", 7, &values, &keys(&["loss", "learning_rate", "global_step"]));
        assert_eq!(
            line,
            "train Global Step 7: loss: 0.250, learning_rate: 1.000e-5, Img/s: 123.46 IO: 0.04"
        );
    }

    #[test]
    fn validation_line_trims_trailing_separator() {
        let values = metrics(&[("loss", 1.5), ("accuracy", 0.875)]);
        let line = log_line("val", 3, &values, &keys(&["accuracy", "loss"]));
        assert_eq!(line, "val Global Step 3: accuracy: 0.875, loss: 1.500");
    }

    #[test]
    fn train_line_without_throughput_has_no_trailing_comma() {
        let values = metrics(&[("loss", 0.25)]);
        let line = log_line("train", 0, &values, &keys(&["loss"]));
        assert_eq!(line, "train Global Step 0: loss: 0.250");
    }

    #[test]
    fn missing_keys_are_skipped() {
        let line = log_line("ana", 0, &Metrics::new(), &keys(&["loss"]));
        assert_eq!(line, "ana Global Step 0:");
    }
}
