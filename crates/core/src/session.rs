//! The simulation session.
//!
//! `Simulation` is the single owner of everything a run needs: devices,
//! schedule, timing metrics, stepper and presentation speed. Presentation
//! layers drive it through four commands (`setup`, `step`,
//! `finish_transition`, `set_speed`) and read it back through `snapshot`.
//!
//! # Setup is atomic
//!
//! `setup` validates and builds the new registry, schedule, metrics and
//! stepper off to the side. Only when all of it succeeds does it replace the
//! running simulation, so a rejected setup leaves the previous run intact.

use crate::device::{self, Device, DeviceId, DeviceRegistry, DeviceSpec, MAX_DEVICES, MIN_DEVICES};
use crate::error::{ConfigError, Result, StateError};
use crate::phases::{self, PhasePlan, Speed};
use crate::schedule::{self, Schedule};
use crate::status::{LinkStatus, ReceiverStatus, SenderStatus};
use crate::stepper::{Direction, RoundTransitionResult, SimulationStepper};
use crate::timing::{self, TimingMetrics};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Result of a step command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub transition: RoundTransitionResult,

    /// Phases to play before calling `finish_transition`; empty means the
    /// session is already back to accepting steps
    pub phases: PhasePlan,
}

/// Per-device view for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub id: DeviceId,
    pub label: char,
    pub units: String,
    pub received: String,
    pub sender: SenderStatus,
    pub receiver: ReceiverStatus,
}

/// Owned copy of everything a presentation layer renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub state: String,
    pub cursor: usize,
    pub total_rounds: usize,
    pub at_start: bool,
    pub at_end: bool,
    pub transitioning: bool,
    pub speed_ms: f64,
    pub multiplexer: LinkStatus,
    pub demultiplexer: LinkStatus,
    pub devices: Vec<DeviceSnapshot>,
    pub schedule: Schedule,
    pub metrics: Option<TimingMetrics>,
}

/// One simulation run.
#[derive(Debug, Clone)]
pub struct Simulation {
    stepper: SimulationStepper,
    metrics: Option<TimingMetrics>,
    speed: Speed,
    stepped: bool,
}

impl Simulation {
    /// Create an unconfigured session.
    pub fn new() -> Self {
        Self {
            stepper: SimulationStepper::new(),
            metrics: None,
            speed: Speed::default(),
            stepped: false,
        }
    }

    /// Configure from raw text sequences, one character per unit.
    ///
    /// Device `i` is labelled `'A' + i` and takes `unit_sequences[i]`; a
    /// missing sequence counts as empty, and extra sequences are an error.
    ///
    /// # Errors
    /// - `ConfigError::DeviceCount` if `device_count` is outside `[2, 8]`
    /// - `ConfigError::SequenceCount` if there are more sequences than devices
    /// - `ConfigError::EmptyUnits` if any sequence is empty
    /// - `ConfigError::NonPositiveCycleTime` if `cycle_time <= 0`
    /// - `StateError::TransitionInFlight` while a step is being presented
    pub fn setup<S: AsRef<str>>(&mut self, device_count: usize, cycle_time: f64, unit_sequences: &[S]) -> Result<()> {
        if !(MIN_DEVICES..=MAX_DEVICES).contains(&device_count) {
            warn!(device_count, "setup rejected: device count out of range");
            return Err(ConfigError::DeviceCount {
                count: device_count,
                min: MIN_DEVICES,
                max: MAX_DEVICES,
            }
            .into());
        }

        if unit_sequences.len() > device_count {
            warn!(
                device_count,
                sequences = unit_sequences.len(),
                "setup rejected: more sequences than devices"
            );
            return Err(ConfigError::SequenceCount {
                devices: device_count,
                sequences: unit_sequences.len(),
            }
            .into());
        }

        let specs = (0..device_count)
            .map(|i| {
                let text = unit_sequences.get(i).map(|s| s.as_ref()).unwrap_or("");
                DeviceSpec::from_text(device::label_for(i), text)
            })
            .collect();

        self.setup_with_specs(cycle_time, specs)
    }

    /// Configure from explicit device specs.
    pub fn setup_with_specs(&mut self, cycle_time: f64, specs: Vec<DeviceSpec>) -> Result<()> {
        if self.stepper.is_transitioning() {
            warn!("setup rejected: transition in flight");
            return Err(StateError::TransitionInFlight.into());
        }

        let registry = DeviceRegistry::from_specs(specs).inspect_err(|e| warn!(error = %e, "setup rejected"))?;
        let schedule = schedule::build(registry.devices());
        let metrics = timing::compute(registry.devices(), &schedule, cycle_time)
            .inspect_err(|e| warn!(error = %e, "setup rejected"))?;

        let mut stepper = SimulationStepper::new();
        stepper.initialize(schedule, registry)?;

        info!(
            devices = stepper.devices().len(),
            rounds = metrics.total_rounds,
            cycle_time,
            slot_duration = metrics.slot_duration,
            "simulation configured"
        );

        self.stepper = stepper;
        self.metrics = Some(metrics);
        self.stepped = false;
        Ok(())
    }

    /// Configure with the default data for `device_count` devices.
    pub fn setup_defaults(&mut self, device_count: usize, cycle_time: f64) -> Result<()> {
        if !(MIN_DEVICES..=MAX_DEVICES).contains(&device_count) {
            return Err(ConfigError::DeviceCount {
                count: device_count,
                min: MIN_DEVICES,
                max: MAX_DEVICES,
            }
            .into());
        }
        let specs = (0..device_count).map(DeviceSpec::default_for).collect();
        self.setup_with_specs(cycle_time, specs)
    }

    /// Advance or rewind one round.
    ///
    /// The data change is complete when this returns. If the returned plan
    /// is non-empty, further steps are rejected until `finish_transition`.
    pub fn step(&mut self, direction: Direction) -> Result<StepOutcome> {
        let transition = self.stepper.step(direction)?;
        let phases = phases::plan(&transition, self.speed);

        if phases.is_empty() {
            self.stepper.finish_transition()?;
        }
        self.stepped = true;

        Ok(StepOutcome { transition, phases })
    }

    pub fn step_forward(&mut self) -> Result<StepOutcome> {
        self.step(Direction::Forward)
    }

    pub fn step_backward(&mut self) -> Result<StepOutcome> {
        self.step(Direction::Backward)
    }

    /// Signal that the presentation of the last step has finished.
    pub fn finish_transition(&mut self) -> Result<()> {
        self.stepper.finish_transition()
    }

    /// Change presentation speed. Affects only plans produced afterwards.
    pub fn set_speed(&mut self, ms: f64) -> Result<()> {
        self.speed = Speed::new(ms)?;
        Ok(())
    }

    /// Rewind to the first round, keeping the configuration.
    pub fn reset(&mut self) -> Result<()> {
        self.stepper.reset()?;
        self.stepped = false;
        Ok(())
    }

    pub fn speed(&self) -> Speed {
        self.speed
    }

    pub fn is_configured(&self) -> bool {
        self.metrics.is_some()
    }

    pub fn cursor(&self) -> usize {
        self.stepper.current_cursor()
    }

    pub fn is_complete(&self) -> bool {
        self.stepper.is_complete()
    }

    pub fn is_at_start(&self) -> bool {
        self.stepper.is_at_start()
    }

    pub fn is_transitioning(&self) -> bool {
        self.stepper.is_transitioning()
    }

    pub fn devices(&self) -> &[Device] {
        self.stepper.devices()
    }

    pub fn schedule(&self) -> &Schedule {
        self.stepper.schedule()
    }

    pub fn metrics(&self) -> Option<&TimingMetrics> {
        self.metrics.as_ref()
    }

    pub fn stepper(&self) -> &SimulationStepper {
        &self.stepper
    }

    pub fn multiplexer_status(&self) -> LinkStatus {
        LinkStatus::at(self.cursor(), self.stepper.total_rounds(), self.stepped)
    }

    /// Capture the current state for rendering.
    pub fn snapshot(&self) -> Snapshot {
        let cursor = self.cursor();
        let link = self.multiplexer_status();

        let devices = self
            .devices()
            .iter()
            .map(|d| DeviceSnapshot {
                id: d.id,
                label: d.label,
                units: d.units().iter().collect(),
                received: d.received().iter().collect(),
                sender: SenderStatus::at(d, cursor),
                receiver: ReceiverStatus::at(d, cursor),
            })
            .collect();

        Snapshot {
            state: self.stepper.state().name().to_string(),
            cursor,
            total_rounds: self.stepper.total_rounds(),
            at_start: self.is_at_start(),
            at_end: self.is_complete(),
            transitioning: self.is_transitioning(),
            speed_ms: self.speed.millis(),
            multiplexer: link,
            demultiplexer: link,
            devices,
            schedule: self.schedule().clone(),
            metrics: self.metrics.clone(),
        }
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::time::Duration;

    fn configured() -> Simulation {
        let mut sim = Simulation::new();
        sim.setup(2, 1.0, &["AA", "BBB"]).unwrap();
        sim
    }

    #[test]
    fn test_setup_example() {
        let sim = configured();
        let metrics = sim.metrics().unwrap();

        assert_eq!(metrics.total_rounds, 3);
        assert_eq!(metrics.slot_duration, 0.5);
        assert!(sim.is_at_start());
        assert!(!sim.is_complete());
        assert_eq!(sim.multiplexer_status(), LinkStatus::ReadyToStart);
    }

    #[test]
    fn test_setup_single_device_fails() {
        let mut sim = Simulation::new();
        let result = sim.setup(1, 1.0, &["AA"]);
        assert!(matches!(result, Err(Error::Config(ConfigError::DeviceCount { .. }))));
        assert!(!sim.is_configured());
    }

    #[test]
    fn test_setup_empty_sequence_fails() {
        let mut sim = Simulation::new();
        let result = sim.setup(2, 1.0, &["AA", ""]);
        assert!(matches!(result, Err(Error::Config(ConfigError::EmptyUnits { label: 'B' }))));
        assert!(sim.schedule().is_empty());
    }

    #[test]
    fn test_missing_sequence_counts_as_empty() {
        let mut sim = Simulation::new();
        let result = sim.setup(3, 1.0, &["AA", "BB"]);
        assert!(matches!(result, Err(Error::Config(ConfigError::EmptyUnits { label: 'C' }))));
    }

    #[test]
    fn test_extra_sequences_rejected() {
        let mut sim = configured();
        let result = sim.setup(2, 1.0, &["AB", "CD", "EF"]);
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::SequenceCount { devices: 2, sequences: 3 }))
        ));
        assert_eq!(sim.devices().len(), 2);
        assert_eq!(sim.devices()[0].units(), &['A', 'A']);
    }

    #[test]
    fn test_failed_setup_preserves_previous_run() {
        let mut sim = configured();
        sim.step_forward().unwrap();
        sim.finish_transition().unwrap();

        assert!(sim.setup(2, -1.0, &["X", "Y"]).is_err());

        assert_eq!(sim.cursor(), 1);
        assert_eq!(sim.devices()[0].received(), &['A']);
        assert_eq!(sim.metrics().unwrap().total_cycle_time, 1.0);
    }

    #[test]
    fn test_forward_step_blocks_until_finished() {
        let mut sim = configured();
        let outcome = sim.step_forward().unwrap();

        assert_eq!(outcome.phases.len(), 5);
        assert!(sim.is_transitioning());
        assert!(matches!(
            sim.step_forward(),
            Err(Error::State(StateError::TransitionInFlight))
        ));
        assert!(matches!(
            sim.setup(2, 1.0, &["A", "B"]),
            Err(Error::State(StateError::TransitionInFlight))
        ));

        sim.finish_transition().unwrap();
        assert!(sim.step_forward().is_ok());
    }

    #[test]
    fn test_backward_step_needs_no_finish() {
        let mut sim = configured();
        sim.step_forward().unwrap();
        sim.finish_transition().unwrap();

        let outcome = sim.step_backward().unwrap();
        assert!(outcome.phases.is_empty());
        assert!(!sim.is_transitioning());
        assert_eq!(sim.multiplexer_status(), LinkStatus::ReadyForFrame(1));
    }

    #[test]
    fn test_set_speed_affects_later_plans() {
        let mut sim = configured();
        sim.set_speed(500.0).unwrap();

        let outcome = sim.step_forward().unwrap();
        assert_eq!(outcome.phases.total(), Duration::from_millis(1650));
        assert!(sim.set_speed(0.0).is_err());
        assert_eq!(sim.speed(), Speed::FAST);
    }

    #[test]
    fn test_step_before_setup() {
        let mut sim = Simulation::new();
        assert!(matches!(
            sim.step_forward(),
            Err(Error::State(StateError::NotInitialized))
        ));
    }

    #[test]
    fn test_snapshot() {
        let mut sim = configured();
        for _ in 0..2 {
            sim.step_forward().unwrap();
            sim.finish_transition().unwrap();
        }

        let snapshot = sim.snapshot();
        assert_eq!(snapshot.cursor, 2);
        assert_eq!(snapshot.state, "Ready");
        assert_eq!(snapshot.devices[0].received, "AA");
        assert_eq!(snapshot.devices[0].sender, SenderStatus::Complete);
        assert_eq!(snapshot.devices[1].receiver.to_string(), "Receiving (2/3)");
        assert_eq!(snapshot.multiplexer, LinkStatus::ReadyForFrame(3));
        assert_eq!(snapshot.schedule.len(), 3);
    }

    #[test]
    fn test_setup_defaults() {
        let mut sim = Simulation::new();
        sim.setup_defaults(3, 2.0).unwrap();

        let snapshot = sim.snapshot();
        assert_eq!(snapshot.devices[2].units, "CCCC");
        assert_eq!(snapshot.total_rounds, 4);
        assert!(sim.setup_defaults(9, 1.0).is_err());
    }

    #[test]
    fn test_reset() {
        let mut sim = configured();
        sim.step_forward().unwrap();
        sim.finish_transition().unwrap();

        sim.reset().unwrap();
        assert!(sim.is_at_start());
        assert_eq!(sim.multiplexer_status(), LinkStatus::ReadyToStart);
    }
}
