//! Cursor-based stepping over a built schedule.
//!
//! The stepper owns the device registry and the schedule once initialized.
//! Its cursor counts fully processed rounds; every device's receive buffer
//! always holds exactly the units carried for it by rounds `< cursor`.
//!
//! # States
//!
//! ```text
//!            initialize                 step_forward / step_backward
//!   Idle  ------------->  Ready(c)  ---------------------------------> Transitioning(c')
//!                           ^                                                |
//!                           +------------------ finish_transition -----------+
//! ```
//!
//! A step applies all of its data changes synchronously before returning,
//! then parks the stepper in `Transitioning` until the presentation layer
//! calls `finish_transition`. Any step attempted meanwhile is rejected with
//! `StateError::TransitionInFlight` and changes nothing.
//!
//! # Rewinding
//!
//! Stepping backward pops the last received unit of every device whose
//! slot in the rewound round was occupied. That is correct only because
//! forward steps append in cursor order and empty slots arise solely from a
//! device running out of data, never from gaps inside a sequence.

use crate::device::{Device, DeviceId, DeviceRegistry, Unit};
use crate::error::{Result, StateError};
use crate::schedule::{Schedule, ScheduleRound};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Stepping direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Forward,
    Backward,
}

/// Stepper lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepperState {
    /// No schedule loaded
    Idle,

    /// Accepting steps
    Ready { cursor: usize },

    /// Data already updated; presentation of the last step still running
    Transitioning { cursor: usize },
}

impl StepperState {
    pub fn cursor(&self) -> usize {
        match self {
            Self::Idle => 0,
            Self::Ready { cursor } | Self::Transitioning { cursor } => *cursor,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Idle => "Idle",
            Self::Ready { .. } => "Ready",
            Self::Transitioning { .. } => "Transitioning",
        }
    }
}

/// What happened to one device's slot during a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDelivery {
    pub device_id: DeviceId,

    /// Unit appended (forward) or removed (backward), `None` for an empty slot
    pub unit: Option<Unit>,
}

impl SlotDelivery {
    pub fn delivered(&self) -> bool {
        self.unit.is_some()
    }
}

/// Result of one step, computed before any presentation begins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundTransitionResult {
    pub direction: Direction,

    /// The round consumed (forward) or rewound (backward)
    pub round: ScheduleRound,

    pub cursor_before: usize,
    pub cursor_after: usize,

    /// One entry per device, in device order
    pub deliveries: Vec<SlotDelivery>,
}

impl RoundTransitionResult {
    /// Devices whose buffer changed in this step.
    pub fn delivered_devices(&self) -> Vec<DeviceId> {
        self.deliveries
            .iter()
            .filter(|d| d.delivered())
            .map(|d| d.device_id)
            .collect()
    }
}

/// State machine advancing or rewinding one round at a time.
#[derive(Debug, Clone)]
pub struct SimulationStepper {
    state: StepperState,
    schedule: Schedule,
    registry: DeviceRegistry,
}

impl SimulationStepper {
    /// Create an idle stepper.
    pub fn new() -> Self {
        Self {
            state: StepperState::Idle,
            schedule: Schedule::default(),
            registry: DeviceRegistry::new(),
        }
    }

    /// Load a schedule and its devices, moving to `Ready(0)`.
    ///
    /// All receive buffers are cleared.
    ///
    /// # Errors
    /// - `StateError::EmptySchedule` if the schedule has no rounds
    /// - `StateError::TransitionInFlight` if a step is still being presented
    pub fn initialize(&mut self, schedule: Schedule, mut registry: DeviceRegistry) -> Result<()> {
        if matches!(self.state, StepperState::Transitioning { .. }) {
            return Err(StateError::TransitionInFlight.into());
        }

        if schedule.is_empty() {
            return Err(StateError::EmptySchedule.into());
        }

        debug_assert_eq!(schedule.device_count(), registry.len());

        registry.clear_received();
        self.schedule = schedule;
        self.registry = registry;
        self.state = StepperState::Ready { cursor: 0 };

        debug!(
            rounds = self.schedule.len(),
            devices = self.registry.len(),
            "stepper initialized"
        );
        Ok(())
    }

    /// Consume the round at the cursor, delivering its units.
    ///
    /// # Errors
    /// - `StateError::NotInitialized` before `initialize`
    /// - `StateError::TransitionInFlight` while the previous step is presented
    /// - `StateError::AtEnd` when every round has been consumed
    pub fn step_forward(&mut self) -> Result<RoundTransitionResult> {
        let cursor = self.ready_cursor()?;

        let Some(round) = self.schedule.round(cursor).cloned() else {
            warn!(cursor, "forward step rejected at end of schedule");
            return Err(StateError::AtEnd { cursor }.into());
        };

        let devices = self.registry.devices_mut();
        let mut deliveries = Vec::with_capacity(round.slots.len());

        for slot in &round.slots {
            if let (Some(unit), Some(device)) = (slot.content, devices.get_mut(slot.device_id)) {
                device.push_received(unit);
            }
            deliveries.push(SlotDelivery {
                device_id: slot.device_id,
                unit: slot.content,
            });
        }

        let cursor_after = cursor + 1;
        self.state = StepperState::Transitioning { cursor: cursor_after };

        debug!(
            round = round.index,
            cursor = cursor_after,
            delivered = round.occupied(),
            "stepped forward"
        );

        Ok(RoundTransitionResult {
            direction: Direction::Forward,
            round,
            cursor_before: cursor,
            cursor_after,
            deliveries,
        })
    }

    /// Rewind the most recently consumed round, removing its units.
    ///
    /// # Errors
    /// - `StateError::NotInitialized` before `initialize`
    /// - `StateError::TransitionInFlight` while the previous step is presented
    /// - `StateError::AtStart` when nothing has been consumed
    pub fn step_backward(&mut self) -> Result<RoundTransitionResult> {
        let cursor = self.ready_cursor()?;

        if cursor == 0 {
            warn!("backward step rejected at start of schedule");
            return Err(StateError::AtStart.into());
        }

        let cursor_after = cursor - 1;
        let round = match self.schedule.round(cursor_after) {
            Some(round) => round.clone(),
            None => return Err(StateError::AtStart.into()),
        };

        let devices = self.registry.devices_mut();
        let mut deliveries = Vec::with_capacity(round.slots.len());

        for slot in &round.slots {
            let removed = match (slot.content, devices.get_mut(slot.device_id)) {
                (Some(expected), Some(device)) => {
                    let popped = device.pop_received();
                    debug_assert_eq!(popped, Some(expected));
                    popped
                }
                _ => None,
            };
            deliveries.push(SlotDelivery {
                device_id: slot.device_id,
                unit: removed,
            });
        }

        self.state = StepperState::Transitioning { cursor: cursor_after };

        debug!(round = round.index, cursor = cursor_after, "stepped backward");

        Ok(RoundTransitionResult {
            direction: Direction::Backward,
            round,
            cursor_before: cursor,
            cursor_after,
            deliveries,
        })
    }

    /// Step in the given direction.
    pub fn step(&mut self, direction: Direction) -> Result<RoundTransitionResult> {
        match direction {
            Direction::Forward => self.step_forward(),
            Direction::Backward => self.step_backward(),
        }
    }

    /// Mark the presentation of the last step as done.
    ///
    /// # Errors
    /// `StateError::NoTransitionInFlight` unless the stepper is `Transitioning`.
    pub fn finish_transition(&mut self) -> Result<()> {
        match self.state {
            StepperState::Transitioning { cursor } => {
                self.state = StepperState::Ready { cursor };
                Ok(())
            }
            _ => Err(StateError::NoTransitionInFlight.into()),
        }
    }

    /// Rewind to cursor 0 with empty buffers, keeping the schedule.
    pub fn reset(&mut self) -> Result<()> {
        self.ready_cursor()?;
        self.registry.clear_received();
        self.state = StepperState::Ready { cursor: 0 };
        Ok(())
    }

    pub fn state(&self) -> StepperState {
        self.state
    }

    pub fn current_cursor(&self) -> usize {
        self.state.cursor()
    }

    pub fn total_rounds(&self) -> usize {
        self.schedule.len()
    }

    /// True when every round has been consumed.
    pub fn is_complete(&self) -> bool {
        !matches!(self.state, StepperState::Idle) && self.current_cursor() == self.schedule.len()
    }

    pub fn is_at_start(&self) -> bool {
        self.current_cursor() == 0
    }

    pub fn is_transitioning(&self) -> bool {
        matches!(self.state, StepperState::Transitioning { .. })
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn devices(&self) -> &[Device] {
        self.registry.devices()
    }

    /// Check every receive buffer against the schedule at the current cursor.
    pub fn buffers_consistent(&self) -> bool {
        let cursor = self.current_cursor();
        self.registry.devices().iter().all(|device| {
            let expected = self.schedule.delivered_before(device.id, cursor);
            device.received().len() == expected && device.units().starts_with(device.received())
        })
    }

    fn ready_cursor(&self) -> Result<usize> {
        match self.state {
            StepperState::Idle => Err(StateError::NotInitialized.into()),
            StepperState::Transitioning { .. } => {
                warn!("step rejected: transition in flight");
                Err(StateError::TransitionInFlight.into())
            }
            StepperState::Ready { cursor } => Ok(cursor),
        }
    }
}

impl Default for SimulationStepper {
    fn default() -> Self {
        Self::new()
    }
}
