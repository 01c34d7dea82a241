//! Property tests for the breathing engine.

use mindora_core::{
    BreathPattern, BreathingEngine, Exercise, MemoryStore, Phase, SessionState, Termination,
};
use proptest::prelude::*;

fn pattern_strategy() -> impl Strategy<Value = [u32; 4]> {
    prop::array::uniform4(0u32..6).prop_filter("at least one non-zero phase", |p| {
        p.iter().any(|&s| s > 0)
    })
}

fn engine(pattern: [u32; 4], cycles: u32, store: &MemoryStore) -> BreathingEngine<&MemoryStore> {
    let exercise = Exercise::new(
        "prop",
        "Property session",
        BreathPattern::new(pattern).unwrap(),
        Termination::Cycles(cycles),
    )
    .unwrap();
    let mut engine = BreathingEngine::new(exercise, store).unwrap();
    engine.open();
    engine
}

type Position = (Phase, u32, u32, SessionState);

fn position(engine: &BreathingEngine<&MemoryStore>) -> Position {
    (
        engine.phase(),
        engine.seconds_left_in_phase(),
        engine.progress_left(),
        engine.state(),
    )
}

proptest! {
    #[test]
    fn completes_after_exactly_cycle_len_times_cycles(
        pattern in pattern_strategy(),
        cycles in 1u32..4,
    ) {
        let store = MemoryStore::new();
        let mut engine = engine(pattern, cycles, &store);
        engine.start();

        let expected: u32 = pattern.iter().sum::<u32>() * cycles;
        for _ in 0..expected - 1 {
            engine.tick();
            prop_assert!(!engine.is_completed());
        }
        engine.tick();
        prop_assert!(engine.is_completed());
        prop_assert_eq!(engine.cycles_completed(), cycles);
    }

    #[test]
    fn phases_follow_cyclic_order_and_skip_empty_ones(
        pattern in pattern_strategy(),
        cycles in 1u32..4,
    ) {
        let store = MemoryStore::new();
        let mut engine = engine(pattern, cycles, &store);
        engine.start();

        let mut previous = engine.phase();
        prop_assert!(pattern[previous.index()] > 0);
        while !engine.is_completed() {
            engine.tick();
            if engine.is_completed() {
                break;
            }
            let current = engine.phase();
            prop_assert!(engine.seconds_left_in_phase() > 0);
            prop_assert!(engine.seconds_left_in_phase() <= pattern[current.index()]);
            if current != previous {
                // Every phase stepped over on the way must be empty.
                let mut p = previous.next();
                while p != current {
                    prop_assert_eq!(pattern[p.index()], 0);
                    p = p.next();
                }
            }
            previous = current;
        }
    }

    #[test]
    fn pause_resume_and_reopen_lose_no_time(
        pattern in pattern_strategy(),
        cycles in 1u32..3,
        pause_at in 0u32..20,
    ) {
        let straight_store = MemoryStore::new();
        let mut straight = engine(pattern, cycles, &straight_store);
        straight.start();
        let mut expected = Vec::new();
        while !straight.is_completed() {
            straight.tick();
            expected.push(position(&straight));
        }

        let store = MemoryStore::new();
        let mut paused = engine(pattern, cycles, &store);
        paused.start();
        let pause_at = pause_at.min(expected.len() as u32 - 1) as usize;
        let mut actual = Vec::new();
        for _ in 0..pause_at {
            paused.tick();
            actual.push(position(&paused));
        }
        paused.pause();
        // Simulate a reload: a new engine over the same store.
        let mut reopened = engine(pattern, cycles, &store);
        reopened.resume();
        while !reopened.is_completed() {
            reopened.tick();
            actual.push(position(&reopened));
        }

        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn reset_restores_initial_state(
        pattern in pattern_strategy(),
        cycles in 1u32..3,
        ticks in 0u32..40,
    ) {
        let store = MemoryStore::new();
        let mut engine = engine(pattern, cycles, &store);
        let initial = position(&engine);
        engine.start();
        for _ in 0..ticks {
            engine.tick();
        }
        engine.reset();

        prop_assert_eq!(position(&engine), initial);
        prop_assert_eq!(engine.progress_percent(), 0);
        prop_assert!(!engine.is_completed());
        prop_assert!(!engine.has_saved_progress());
        if pattern[0] > 0 {
            prop_assert_eq!(engine.phase(), Phase::Inhale);
            prop_assert_eq!(engine.seconds_left_in_phase(), pattern[0]);
        }
    }

    #[test]
    fn progress_is_monotonic_and_hits_100_only_at_completion(
        pattern in pattern_strategy(),
        cycles in 1u32..4,
    ) {
        let store = MemoryStore::new();
        let mut engine = engine(pattern, cycles, &store);
        engine.start();
        let mut last = engine.progress_percent();
        while !engine.is_completed() {
            engine.tick();
            let pct = engine.progress_percent();
            prop_assert!(pct >= last);
            prop_assert_eq!(pct == 100, engine.is_completed());
            last = pct;
        }
        prop_assert_eq!(last, 100);
    }
}

#[test]
fn box_four_by_one_completes_on_sixteenth_tick() {
    let store = MemoryStore::new();
    let mut engine = engine([4, 4, 4, 4], 1, &store);
    engine.start();
    for tick in 1..=16 {
        engine.tick();
        assert_eq!(engine.is_completed(), tick == 16, "tick {tick}");
    }
    assert_eq!(engine.progress_percent(), 100);
}
