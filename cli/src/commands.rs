use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use datasets::{JsonlFetcher, SampleFetcher, SyntheticFetcher};
use lr_schedule::{ProgressScale, Schedule, compile_configs, default_stages};
use tracing::info;
use trainer::{Mode, TimingSummary, TrainerCore};

use crate::config::{RunSettings, ScheduleSettings, load_settings};
use crate::hooks::DryRunHooks;
use crate::telemetry::{start_profiler, write_profile};

pub fn run_train(config_path: Option<PathBuf>) -> Result<()> {
    let settings = load_settings::<RunSettings>("train", config_path)?;
    run_loop(settings, Mode::Train)
}

pub fn run_inference(config_path: Option<PathBuf>) -> Result<()> {
    let settings = load_settings::<RunSettings>("inference", config_path)?;
    run_loop(settings, Mode::Inference)
}

pub fn run_schedule(config_path: Option<PathBuf>) -> Result<()> {
    let settings = load_settings::<ScheduleSettings>("schedule", config_path)?;
    let schedule = compile_schedule(&settings)?;
    println!("Learning rate schedule: {schedule}");
    println!("{:>10} {:>10} {:>12} {:>12}", "iteration", "epoch", "stage", "rate");
    for row in schedule_rows(&schedule, settings.iterations, settings.every)? {
        let rate = row
            .rate
            .map_or_else(|| "-".to_string(), |rate| format!("{rate:.4e}"));
        println!(
            "{:>10} {:>10.3} {:>12} {:>12}",
            row.iteration,
            row.progress,
            row.stage.as_deref().unwrap_or("-"),
            rate
        );
    }
    Ok(())
}

fn run_loop(mut settings: RunSettings, mode: Mode) -> Result<()> {
    settings.run.mode = mode;
    let profiler_guard = start_profiler(settings.profile_output.as_deref());

    let fetcher: Box<dyn SampleFetcher> = match settings.synthetic_samples {
        Some(samples) => {
            info!(samples, "using synthetic samples");
            Box::new(SyntheticFetcher::new(samples))
        }
        None => Box::new(JsonlFetcher::new()),
    };
    info!(?settings.run, "run configuration");

    let mut core = TrainerCore::new(settings.run.clone(), fetcher, DryRunHooks::default());
    core.initialize()
        .with_context(|| format!("failed to initialize {} run", mode.as_str()))?;
    let outcome = core.batch_process();
    core.stop();
    let timing = outcome
        .with_context(|| format!("{} run aborted at iteration {}", mode.as_str(), core.iteration()))?;

    let report_text = render_report(mode, &timing, core.global_step(), core.hooks());
    println!("Run summary:\n{report_text}");
    write_text_file(&settings.report, &format!("# {} run summary\n{report_text}", mode.as_str()))?;
    println!("Run summary written to {}", settings.report.display());

    if let Some(guard) = profiler_guard {
        if let Some(profile_path) = &settings.profile_output {
            ensure_parent(profile_path)?;
            write_profile(guard, profile_path);
            println!("CPU profile written to {}", profile_path.display());
        }
    }

    Ok(())
}

fn compile_schedule(settings: &ScheduleSettings) -> Result<Schedule> {
    let scale = ProgressScale::new(settings.minibatch_size, settings.train_data_size)?;
    let defaults = default_stages();
    let stages = settings
        .optimizer
        .lr_schedule
        .as_deref()
        .unwrap_or(&defaults);
    let schedule = compile_configs(
        stages,
        settings.optimizer.learning_rate,
        scale.epochs_per_iteration(),
    )?;
    for issue in schedule.coverage_gaps() {
        println!("warning: {issue}");
    }
    Ok(schedule)
}

/// One preview line; `stage` and `rate` are `None` where no stage covers the
/// iteration.
#[derive(Debug, Clone, PartialEq)]
struct ScheduleRow {
    iteration: u64,
    progress: f64,
    stage: Option<String>,
    rate: Option<f64>,
}

fn schedule_rows(schedule: &Schedule, iterations: u64, every: u64) -> Result<Vec<ScheduleRow>> {
    ensure!(every > 0, "`every` must be positive");
    let rows = (0..=iterations)
        .step_by(every as usize)
        .map(|iteration| {
            let progress = schedule.progress(iteration);
            ScheduleRow {
                iteration,
                progress,
                stage: schedule.stage_at(progress).map(str::to_string),
                rate: schedule.rate_at(progress).ok(),
            }
        })
        .collect();
    Ok(rows)
}

fn render_report(
    mode: Mode,
    timing: &TimingSummary,
    global_step: u64,
    hooks: &DryRunHooks,
) -> String {
    let mut lines = vec![
        format!("mode = {}", mode.as_str()),
        format!("iterations = {}", timing.iterations),
        format!("global_step = {global_step}"),
        format!("train_steps = {}", hooks.train_steps),
        format!("val_steps = {}", hooks.val_steps),
        format!("ana_steps = {}", hooks.ana_steps),
        format!("samples_seen = {}", hooks.samples_seen),
        format!("checkpoints = {}", hooks.checkpoints),
        format!("epochs_completed = {}", hooks.epochs_completed),
        format!("total_seconds = {:.6}", timing.total.as_secs_f64()),
    ];
    if let Some(rate) = hooks.last_learning_rate {
        lines.push(format!("final_learning_rate = {rate:.6e}"));
    }
    if let Some(window) = timing.last_window {
        lines.push(format!("last_window_seconds = {:.6}", window.as_secs_f64()));
    }
    lines.join("\n")
}

fn write_text_file(path: &Path, contents: &str) -> Result<()> {
    ensure_parent(path)?;
    let mut body = contents.to_string();
    if !body.ends_with('\n') {
        body.push('\n');
    }
    fs::write(path, body).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use lr_schedule::StageConfig;

    #[test]
    fn schedule_preview_rows_follow_default_stages() {
        let settings = ScheduleSettings::default();
        let schedule = compile_schedule(&settings).expect("default schedule");
        let rows = schedule_rows(&schedule, 2_500, 100).expect("rows");

        assert_eq!(rows.len(), 26);
        assert_eq!(rows[0].stage.as_deref(), Some("warm_up"));
        assert_relative_eq!(rows[0].rate.unwrap(), 1e-5);
        assert_eq!(rows[1].stage.as_deref(), Some("flat"));
        assert_relative_eq!(rows[1].progress, 1.0);
        assert_eq!(rows[21].stage.as_deref(), Some("decay"));
        assert_relative_eq!(rows[21].rate.unwrap(), 1e-3);
        assert!(rows[25].rate.unwrap() < rows[22].rate.unwrap());
    }

    #[test]
    fn uncovered_iterations_preview_without_stage_or_rate() {
        let flat = |name: &str, start: f64| StageConfig {
            name: name.into(),
            function: "flat".into(),
            start,
            n_epochs: 1.0,
            initial_rate: None,
            final_rate: None,
            rate: None,
            floor: None,
            decay_rate: None,
        };
        let mut settings = ScheduleSettings {
            minibatch_size: 2,
            train_data_size: 4,
            ..ScheduleSettings::default()
        };
        settings.optimizer.lr_schedule = Some(vec![flat("a", 0.0), flat("b", 2.0)]);
        let schedule = compile_schedule(&settings).expect("gapped schedule compiles");
        let rows = schedule_rows(&schedule, 4, 1).expect("rows");

        assert_eq!(rows.len(), 5);
        assert_eq!(rows[1].stage.as_deref(), Some("a"));
        assert_relative_eq!(rows[2].progress, 1.0);
        assert_eq!(rows[2].stage, None);
        assert_eq!(rows[2].rate, None);
        assert_eq!(rows[3].stage, None);
        assert_eq!(rows[4].stage.as_deref(), Some("b"));
        assert_relative_eq!(rows[4].rate.unwrap(), settings.optimizer.learning_rate);
    }

    #[test]
    fn zero_step_is_rejected() {
        let schedule = compile_schedule(&ScheduleSettings::default()).unwrap();
        assert!(schedule_rows(&schedule, 10, 0).is_err());
    }

    #[test]
    fn synthetic_train_run_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let report = dir.path().join("reports/summary.txt");
        let mut settings = RunSettings {
            synthetic_samples: Some(8),
            report: report.clone(),
            ..RunSettings::default()
        };
        settings.run.iterations = 10;
        settings.run.dataset.data_directory = dir.path().to_path_buf();
        fs::write(settings.run.dataset.train_path(), "").unwrap();

        run_loop(settings, Mode::Train).expect("dry run succeeds");

        let body = fs::read_to_string(report).unwrap();
        assert!(body.starts_with("# train run summary"));
        assert!(body.contains("global_step = 10"));
        assert!(body.contains("train_steps = 10"));
        assert!(body.contains("val_steps = 0"));
        assert!(body.contains("samples_seen = 20"));
        assert!(body.contains("epochs_completed = 2"));
    }

    #[test]
    fn inference_run_skips_dataset_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = RunSettings {
            report: dir.path().join("inference.txt"),
            ..RunSettings::default()
        };
        settings.run.iterations = 3;
        settings.run.dataset.data_directory = dir.path().join("missing");

        run_loop(settings, Mode::Inference).expect("inference dry run");
        let body = fs::read_to_string(dir.path().join("inference.txt")).unwrap();
        assert!(body.contains("mode = inference"));
        assert!(body.contains("global_step = 0"));
        assert!(body.contains("ana_steps = 3"));
    }
}
