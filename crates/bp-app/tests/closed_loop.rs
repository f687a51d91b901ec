//! Closed-loop runs of process + both controllers.

use bp_app::{PlantConfig, SimOptions, SimulationMode, read_mode_file, simulate};
use bp_core::Tag;

fn run_steps(mode: SimulationMode, max_steps: usize) -> bp_app::SimOutcome {
    let opts = SimOptions {
        dt: 0.1,
        t_end: f64::MAX,
        max_steps,
        mode,
        ..SimOptions::default()
    };
    simulate(&PlantConfig::default(), &opts).expect("simulation should run")
}

#[test]
fn normal_mode_fills_and_ships_bottles() {
    let outcome = run_steps(SimulationMode::Normal, 1200);
    let counters = &outcome.counters;

    assert_eq!(counters.failed_ticks, 0);
    assert_eq!(counters.faults_applied, 0);
    assert!(counters.bottles_shipped > 0, "{counters:?}");
    assert!(counters.bottles_filled > 0, "{counters:?}");

    for state in &outcome.record.x {
        assert!((0.0..=1.0).contains(&state.tank_level));
        assert!((0.0..=1.0).contains(&state.bottle_level));
        assert!((0.0..5.0).contains(&state.bottle_distance_to_filler));
    }
}

#[test]
fn normal_mode_keeps_tank_inside_band() {
    let outcome = run_steps(SimulationMode::Normal, 3000);
    // Hysteresis may overshoot by at most one tick of inflow.
    let slack = 0.1 * 1.0 / 10.0 + 1e-9;
    for state in outcome.record.x.iter().skip(1) {
        assert!(state.tank_level <= state.thresholds.tank_level_max + slack);
    }
}

#[test]
fn absent_mode_file_means_no_faults() {
    let dir = tempfile::tempdir().unwrap();
    let mode = read_mode_file(&dir.path().join("mode.conf"));
    assert_eq!(mode, SimulationMode::Normal);

    let outcome = run_steps(mode, 100);
    assert_eq!(outcome.counters.faults_applied, 0);
    assert_eq!(outcome.counters.injected_delay, std::time::Duration::ZERO);
}

#[test]
fn fault_mode_applies_faults_without_sleeping() {
    let started = std::time::Instant::now();
    let outcome = run_steps(SimulationMode::Faults, 50);
    let counters = &outcome.counters;

    // 50 ticks: 6 one-shot process faults plus one per controller tick.
    assert_eq!(counters.steps, 50);
    assert_eq!(counters.faults_applied, 6 + 50 + 50);
    assert!(counters.injected_delay > std::time::Duration::from_secs(10));
    assert!(started.elapsed() < std::time::Duration::from_secs(10));
}

#[test]
fn seeded_runs_are_reproducible() {
    let a = run_steps(SimulationMode::Faults, 80);
    let b = run_steps(SimulationMode::Faults, 80);
    assert_eq!(a.counters, b.counters);
    assert_eq!(a.record.x, b.record.x);
}

#[test]
fn manual_conveyor_off_parks_the_line() {
    let mut config = PlantConfig::default();
    config.initial_tags.insert(Tag::ConveyorEngineMode, 1.0);
    config.initial_tags.insert(Tag::BottleDistanceToFiller, 3.0);
    let opts = SimOptions {
        dt: 0.1,
        t_end: 10.0,
        ..SimOptions::default()
    };
    let outcome = simulate(&config, &opts).unwrap();
    let last = outcome.record.x.last().unwrap();
    assert_eq!(last.bottle_distance_to_filler, 3.0);
    assert!(!last.conveyor_engine_status);
    assert!(!last.tank_output_valve_status);
}
