//! TDM schedule construction.
//!
//! The schedule interleaves one unit from every device per round. Each
//! round carries exactly one slot per device, in registration order, so a
//! slot's position within its round is the device id.
//!
//! # Layout
//!
//! ```text
//!            slot 0   slot 1   slot 2
//! round 0  |   A    |   B    |   C    |
//! round 1  |   A    |   B    |   C    |
//! round 2  |  ---   |   B    |   C    |   <- A exhausted, slot stays allocated
//! round 3  |  ---   |  ---   |   C    |
//! ```
//!
//! An exhausted device keeps its slot; the slot is simply empty. That is
//! what makes TDM synchronous: slot timing never depends on who has data.
//!
//! Building is a pure function of the device order and unit sequences, so
//! rebuilding at any time reproduces the same rounds exactly.

use crate::device::{Device, DeviceId, Unit};
use serde::{Deserialize, Serialize};

/// The portion of a round allocated to one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub device_id: DeviceId,

    /// The device's unit for this round, or `None` once it is exhausted
    pub content: Option<Unit>,
}

impl Slot {
    pub fn is_empty(&self) -> bool {
        self.content.is_none()
    }
}

/// One full cycle of the schedule (a "frame").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRound {
    pub index: usize,
    pub slots: Vec<Slot>,
}

impl ScheduleRound {
    /// Slot belonging to `device_id`.
    pub fn slot(&self, device_id: DeviceId) -> Option<&Slot> {
        self.slots.get(device_id)
    }

    /// Number of slots carrying a unit.
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|s| !s.is_empty()).count()
    }
}

/// Ordered sequence of rounds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    rounds: Vec<ScheduleRound>,
    device_count: usize,
}

impl Schedule {
    pub fn rounds(&self) -> &[ScheduleRound] {
        &self.rounds
    }

    pub fn round(&self, index: usize) -> Option<&ScheduleRound> {
        self.rounds.get(index)
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    pub fn device_count(&self) -> usize {
        self.device_count
    }

    /// Count rounds before `cursor` in which `device_id` had a unit.
    ///
    /// This is the length the device's receive buffer must have when the
    /// stepper sits at `cursor`.
    pub fn delivered_before(&self, device_id: DeviceId, cursor: usize) -> usize {
        self.rounds
            .iter()
            .take(cursor)
            .filter(|round| round.slot(device_id).is_some_and(|s| !s.is_empty()))
            .count()
    }

    /// Fraction of all slots that carry a unit, in `[0, 1]`.
    pub fn utilization(&self) -> f64 {
        let total = self.rounds.len() * self.device_count;
        if total == 0 {
            0.0
        } else {
            let occupied: usize = self.rounds.iter().map(ScheduleRound::occupied).sum();
            occupied as f64 / total as f64
        }
    }
}

/// Build the schedule for the given devices.
///
/// Round count is the longest unit sequence. For round `r` and device `d`
/// the slot holds `units[r]` if the device still has data, else nothing.
pub fn build(devices: &[Device]) -> Schedule {
    let round_count = devices.iter().map(Device::unit_count).max().unwrap_or(0);

    let rounds = (0..round_count)
        .map(|index| ScheduleRound {
            index,
            slots: devices
                .iter()
                .enumerate()
                .map(|(device_id, device)| Slot {
                    device_id,
                    content: device.units().get(index).copied(),
                })
                .collect(),
        })
        .collect();

    Schedule {
        rounds,
        device_count: devices.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceRegistry, DeviceSpec};

    fn registry(texts: &[&str]) -> DeviceRegistry {
        DeviceRegistry::from_specs(
            texts
                .iter()
                .enumerate()
                .map(|(i, t)| DeviceSpec::from_text(crate::device::label_for(i), t))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_unequal_lengths() {
        let registry = registry(&["AA", "BBB"]);
        let schedule = build(registry.devices());

        assert_eq!(schedule.len(), 3);
        assert_eq!(schedule.device_count(), 2);

        let contents: Vec<Vec<Option<char>>> = schedule
            .rounds()
            .iter()
            .map(|r| r.slots.iter().map(|s| s.content).collect())
            .collect();

        assert_eq!(
            contents,
            vec![
                vec![Some('A'), Some('B')],
                vec![Some('A'), Some('B')],
                vec![None, Some('B')],
            ]
        );
    }

    #[test]
    fn test_slot_order_matches_registration() {
        let registry = registry(&["xyz", "1", "pq"]);
        let schedule = build(registry.devices());

        for round in schedule.rounds() {
            assert_eq!(round.slots.len(), 3);
            for (i, slot) in round.slots.iter().enumerate() {
                assert_eq!(slot.device_id, i);
            }
        }

        assert_eq!(schedule.round(1).unwrap().slot(0).unwrap().content, Some('y'));
        assert_eq!(schedule.round(1).unwrap().slot(2).unwrap().content, Some('q'));
        assert!(schedule.round(2).unwrap().slot(1).unwrap().is_empty());
    }

    #[test]
    fn test_deterministic_rebuild() {
        let registry = registry(&["hello", "tdm", "x"]);
        assert_eq!(build(registry.devices()), build(registry.devices()));
    }

    #[test]
    fn test_empty_device_list() {
        let schedule = build(&[]);
        assert!(schedule.is_empty());
        assert_eq!(schedule.utilization(), 0.0);
    }

    #[test]
    fn test_delivered_before() {
        let registry = registry(&["AA", "BBB"]);
        let schedule = build(registry.devices());

        assert_eq!(schedule.delivered_before(0, 0), 0);
        assert_eq!(schedule.delivered_before(0, 3), 2);
        assert_eq!(schedule.delivered_before(1, 3), 3);
        assert_eq!(schedule.delivered_before(1, 2), 2);
    }

    #[test]
    fn test_utilization() {
        let registry = registry(&["AA", "BBB"]);
        let schedule = build(registry.devices());

        // 5 of 6 slots carry a unit
        assert!((schedule.utilization() - 5.0 / 6.0).abs() < 1e-12);
    }
}
