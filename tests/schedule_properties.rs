use approx::assert_relative_eq;
use stagewise::lr_schedule::{NamedStage, Stage, default_stages, parse_stages};
use stagewise::{ScheduleError, compile, compile_configs};

fn scenario_stages() -> Vec<NamedStage> {
    vec![
        NamedStage::new(
            "warm_up",
            Stage::Linear {
                start: 0.0,
                duration: 1.0,
                initial_rate: 1e-5,
                final_rate: Some(1e-3),
            },
        ),
        NamedStage::new(
            "flat",
            Stage::Flat {
                start: 1.0,
                duration: 20.0,
                rate: Some(1e-3),
            },
        ),
        NamedStage::new(
            "decay",
            Stage::Decay {
                start: 21.0,
                duration: 4.0,
                decay_rate: 0.999,
                floor: 1e-5,
                rate: Some(1e-3),
            },
        ),
    ]
}

#[test]
fn concrete_scenario_matches_expected_rates() {
    let schedule = compile(&scenario_stages(), 1e-3, 0.01).expect("scenario compiles");

    assert_relative_eq!(schedule.learning_rate(0).unwrap(), 1e-5);
    assert_relative_eq!(schedule.learning_rate(100).unwrap(), 1e-3);
    assert_relative_eq!(schedule.learning_rate(2_100).unwrap(), 1e-3);
    assert!(schedule.learning_rate(2_200).unwrap() < 1e-3);
}

#[test]
fn default_schedule_is_gapless_and_monotone_after_warm_up() {
    let stages = parse_stages(&default_stages()).unwrap();
    let schedule = compile(&stages, 1e-3, 0.01).unwrap();
    assert!(schedule.coverage_gaps().is_empty());

    let mut previous = 0.0;
    for iteration in 0..=100 {
        let rate = schedule.learning_rate(iteration).unwrap();
        assert!(rate >= previous, "warm-up must not decrease at {iteration}");
        previous = rate;
    }
    for iteration in (2_100..10_000).step_by(50) {
        let rate = schedule.learning_rate(iteration).unwrap();
        assert!(rate <= previous);
        assert!(rate >= 1e-5);
        previous = rate;
    }
}

#[test]
fn open_ended_last_stage_handles_far_progress() {
    let stages = &scenario_stages()[..2];
    let schedule = compile(stages, 1e-3, 1.0).unwrap();
    assert_eq!(schedule.stage_at(1_000.0), Some("flat"));
    assert_relative_eq!(schedule.learning_rate(1_000).unwrap(), 1e-3);
}

#[test]
fn configuration_errors_surface_at_compile_time() {
    assert_eq!(
        compile_configs(&[], 1e-3, 0.01),
        Err(ScheduleError::EmptySchedule)
    );

    let mut configs = default_stages();
    configs[2].decay_rate = Some(-1.0);
    assert!(matches!(
        compile_configs(&configs, 1e-3, 0.01),
        Err(ScheduleError::NonPositiveDecayRate { .. })
    ));

    let mut configs = default_stages();
    configs[0].n_epochs = -2.0;
    assert!(matches!(
        compile_configs(&configs, 1e-3, 0.01),
        Err(ScheduleError::NonPositiveDuration { .. })
    ));
}
