use bp_core::ProcessState;
use bp_faults::{CursorPolicy, FaultSequencer, presets};
use proptest::prelude::*;

fn start_state() -> ProcessState {
    let mut state = ProcessState::default();
    state.tank_level = 0.5;
    state.bottle_level = 0.4;
    state.bottle_distance_to_filler = 0.3;
    state
}

proptest! {
    #[test]
    fn one_shot_is_inert_after_exhaustion(seed in any::<u64>()) {
        let faults = presets::process();
        let n = faults.len();
        let mut seq = FaultSequencer::seeded(faults, CursorPolicy::OneShot, seed).unwrap();
        let mut state = start_state();

        for _ in 0..n + 1 {
            seq.apply_next(&mut state).unwrap();
        }
        let after_n_plus_1 = state.clone();
        let outcome = seq.apply_next(&mut state).unwrap();

        prop_assert!(outcome.applied.is_none());
        prop_assert!(seq.is_exhausted());
        prop_assert_eq!(seq.cursor(), n);
        prop_assert_eq!(state, after_n_plus_1);
    }

    #[test]
    fn cyclic_returns_cursor_to_start(seed in any::<u64>(), warmup in 0usize..10) {
        let faults = presets::controller_b();
        let n = faults.len();
        let mut seq = FaultSequencer::seeded(faults, CursorPolicy::Cyclic, seed).unwrap();
        let mut state = start_state();

        for _ in 0..warmup {
            seq.apply_next(&mut state).unwrap();
        }
        let start = seq.cursor();
        for _ in 0..n {
            prop_assert!(seq.apply_next(&mut state).unwrap().applied.is_some());
        }
        prop_assert_eq!(seq.cursor(), start);
    }

    #[test]
    fn same_seed_same_perturbations(seed in any::<u64>()) {
        let mut a = FaultSequencer::seeded(presets::controller_a(), CursorPolicy::Cyclic, seed).unwrap();
        let mut b = FaultSequencer::seeded(presets::controller_a(), CursorPolicy::Cyclic, seed).unwrap();
        let mut state_a = start_state();
        let mut state_b = start_state();

        for _ in 0..12 {
            let outcome_a = a.apply_next(&mut state_a).unwrap();
            let outcome_b = b.apply_next(&mut state_b).unwrap();
            prop_assert_eq!(outcome_a, outcome_b);
            prop_assert_eq!(&state_a, &state_b);
        }
    }
}

#[test]
fn process_list_walks_every_fault_class_in_order() {
    let mut seq = FaultSequencer::seeded(presets::process(), CursorPolicy::OneShot, 42).unwrap();
    let mut state = start_state();
    let mut names = Vec::new();
    while let Some(applied) = seq.apply_next(&mut state).unwrap().applied {
        names.push(applied.name);
    }
    assert_eq!(
        names,
        [
            "sensor drift",
            "leak",
            "sticking",
            "sticking",
            "memory corruption",
            "overheating delay"
        ]
    );
}
