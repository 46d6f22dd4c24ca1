use approx::assert_relative_eq;
use lr_schedule::{ScheduleError, StageConfig, compile_configs};
use rstest::{fixture, rstest};

const SCHEDULE_TOML: &str = r#"
[[stages]]
name = "warm_up"
function = "linear"
start = 0
n_epochs = 1
initial_rate = 1e-5
final_rate = 1e-3

[[stages]]
name = "flat"
function = "flat"
start = 1
n_epochs = 20
rate = 1e-3

[[stages]]
name = "decay"
function = "decay"
start = 21
n_epochs = 4
decay_rate = 0.999
floor = 1e-5
rate = 1e-3
"#;

#[derive(serde::Deserialize)]
struct StageFile {
    stages: Vec<StageConfig>,
}

#[fixture]
fn stages() -> Vec<StageConfig> {
    toml::from_str::<StageFile>(SCHEDULE_TOML)
        .expect("stage file parses")
        .stages
}

#[rstest]
#[case(0, 1e-5)]
#[case(50, (1e-5 + 1e-3) / 2.0)]
#[case(100, 1e-3)]
#[case(1_500, 1e-3)]
#[case(2_100, 1e-3)]
fn warm_up_flat_decay_scenario(
    stages: Vec<StageConfig>,
    #[case] iteration: u64,
    #[case] expected: f64,
) {
    let schedule = compile_configs(&stages, 5e-4, 0.01).expect("schedule compiles");
    assert_relative_eq!(
        schedule.learning_rate(iteration).unwrap(),
        expected,
        epsilon = 1e-12
    );
}

#[rstest]
fn decay_stage_approaches_floor(stages: Vec<StageConfig>) {
    let schedule = compile_configs(&stages, 1e-3, 0.01).unwrap();
    let late = schedule.learning_rate(1_000_000).unwrap();
    assert_relative_eq!(late, 1e-5, epsilon = 1e-12);
    assert_eq!(schedule.stage_at(schedule.progress(1_000_000)), Some("decay"));
}

#[rstest]
fn unknown_shape_in_file_fails_compilation(mut stages: Vec<StageConfig>) {
    stages[1].function = "cyclic".into();
    assert_eq!(
        compile_configs(&stages, 1e-3, 0.01),
        Err(ScheduleError::UnknownShape {
            stage: "flat".into(),
            shape: "cyclic".into(),
        })
    );
}

#[test]
fn unknown_fields_are_rejected_by_the_parser() {
    let raw = r#"
[[stages]]
name = "flat"
function = "flat"
start = 0
n_epochs = 1
final_rte = 1e-3
"#;
    assert!(toml::from_str::<StageFile>(raw).is_err());
}

#[test]
fn schedule_is_shareable_across_threads() {
    let schedule = std::sync::Arc::new(
        compile_configs(&lr_schedule::default_stages(), 1e-3, 0.01).unwrap(),
    );
    let handles: Vec<_> = (0..4u64)
        .map(|worker| {
            let schedule = std::sync::Arc::clone(&schedule);
            std::thread::spawn(move || schedule.learning_rate(worker * 1_000).unwrap())
        })
        .collect();
    let rates: Vec<f64> = handles
        .into_iter()
        .map(|handle| handle.join().expect("worker finished"))
        .collect();
    assert_relative_eq!(rates[0], 1e-5);
    assert_relative_eq!(rates[1], 1e-3);
}
