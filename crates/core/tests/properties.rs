//! Property tests for schedule, timing and stepping invariants.

use proptest::prelude::*;
use tdm_sim_core::{Error, Simulation, StateError};

/// Between 2 and 8 non-empty unit sequences of up to 12 characters.
fn sequences() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z0-9]{1,12}", 2..=8)
}

fn configured(seqs: &[String], cycle_time: f64) -> Simulation {
    let mut sim = Simulation::new();
    sim.setup(seqs.len(), cycle_time, seqs).unwrap();
    sim
}

fn forward(sim: &mut Simulation) {
    sim.step_forward().unwrap();
    sim.finish_transition().unwrap();
}

proptest! {
    #[test]
    fn slot_duration_divides_cycle(seqs in sequences(), cycle_time in 0.001f64..1000.0) {
        let sim = configured(&seqs, cycle_time);
        let metrics = sim.metrics().unwrap();
        let n = seqs.len() as f64;

        prop_assert_eq!(metrics.round_duration, cycle_time);
        prop_assert_eq!(metrics.slot_duration, cycle_time / n);
        let rebuilt = metrics.slot_duration * n;
        prop_assert!((rebuilt - metrics.round_duration).abs() <= metrics.round_duration * 4.0 * f64::EPSILON);
    }

    #[test]
    fn total_rounds_is_longest_sequence(seqs in sequences()) {
        let sim = configured(&seqs, 1.0);
        let longest = seqs.iter().map(|s| s.chars().count()).max().unwrap();

        prop_assert_eq!(sim.metrics().unwrap().total_rounds, longest);
        prop_assert_eq!(sim.schedule().len(), longest);
        for round in sim.schedule().rounds() {
            prop_assert_eq!(round.slots.len(), seqs.len());
        }
    }

    #[test]
    fn efficiency_in_range(seqs in sequences()) {
        let sim = configured(&seqs, 1.0);
        for timing in &sim.metrics().unwrap().per_device {
            prop_assert!(timing.efficiency > 0.0 && timing.efficiency <= 100.0);
        }
    }

    #[test]
    fn forward_then_backward_restores_start(seqs in sequences(), k in 0usize..=12) {
        let mut sim = configured(&seqs, 1.0);
        let k = k.min(sim.schedule().len());

        for _ in 0..k {
            forward(&mut sim);
        }
        for _ in 0..k {
            sim.step_backward().unwrap();
        }

        prop_assert_eq!(sim.cursor(), 0);
        prop_assert!(sim.devices().iter().all(|d| d.received().is_empty()));
    }

    #[test]
    fn buffers_track_occupied_slots(seqs in sequences(), c in 0usize..=12) {
        let mut sim = configured(&seqs, 1.0);
        let c = c.min(sim.schedule().len());

        for _ in 0..c {
            forward(&mut sim);
        }

        for device in sim.devices() {
            let expected = sim.schedule().rounds()[..c]
                .iter()
                .filter(|r| r.slots[device.id].content.is_some())
                .count();
            prop_assert_eq!(device.received().len(), expected);
            prop_assert!(device.received().len() <= device.units().len());
            prop_assert!(device.units().starts_with(device.received()));
        }
    }

    #[test]
    fn boundaries_leave_cursor_unchanged(seqs in sequences()) {
        let mut sim = configured(&seqs, 1.0);

        let at_start = sim.step_backward();
        prop_assert!(matches!(at_start, Err(Error::State(StateError::AtStart))));
        prop_assert_eq!(sim.cursor(), 0);

        while !sim.is_complete() {
            forward(&mut sim);
        }
        let end = sim.cursor();
        let at_end = sim.step_forward();
        prop_assert!(matches!(at_end, Err(Error::State(StateError::AtEnd { .. }))), "expected AtEnd");
        prop_assert_eq!(sim.cursor(), end);
    }
}
