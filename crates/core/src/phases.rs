//! Presentation phase plans.
//!
//! A forward step is presented as a fixed, strictly ordered series of timed
//! phases. The core never waits on them: it hands the plan to the caller,
//! which plays it and then calls `Simulation::finish_transition`.
//!
//! # Forward plan (base durations at medium speed)
//!
//! ```text
//! SourceToScheduler   800 ms   units travel from senders to the multiplexer
//! SchedulerHold       500 ms   multiplexer assembles the frame
//! ScheduleHighlight   500 ms   frame highlighted in the schedule view
//! SchedulerToSink     800 ms   frame travels to the demultiplexer
//! SinkToDestination   700 ms   units distributed to receivers, then settle
//! ```
//!
//! Backward steps rewind instantly and produce an empty plan.

use crate::device::DeviceId;
use crate::error::{ConfigError, Result};
use crate::stepper::{Direction, RoundTransitionResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Presentation speed: milliseconds per second of the reference pace.
///
/// `factor = ms / 1000`, so 1000 is the reference pace, 2000 plays twice as
/// slowly and 500 twice as fast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Speed(f64);

impl Speed {
    pub const SLOW: Speed = Speed(2000.0);
    pub const MEDIUM: Speed = Speed(1000.0);
    pub const FAST: Speed = Speed(500.0);

    /// # Errors
    /// `ConfigError::InvalidSpeed` unless `ms` is positive and finite.
    pub fn new(ms: f64) -> Result<Self> {
        if !ms.is_finite() || ms <= 0.0 {
            return Err(ConfigError::InvalidSpeed { value: ms }.into());
        }
        Ok(Self(ms))
    }

    pub fn millis(&self) -> f64 {
        self.0
    }

    pub fn factor(&self) -> f64 {
        self.0 / 1000.0
    }

    /// Scale a base duration in milliseconds.
    pub fn scale(&self, base_ms: u64) -> Duration {
        Duration::from_nanos((base_ms as f64 * self.factor() * 1_000_000.0).round() as u64)
    }
}

impl Default for Speed {
    fn default() -> Self {
        Self::MEDIUM
    }
}

/// Kind of presentation phase, in playing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhaseKind {
    SourceToScheduler,
    SchedulerHold,
    ScheduleHighlight,
    SchedulerToSink,
    SinkToDestination,
}

impl PhaseKind {
    pub const ORDER: [PhaseKind; 5] = [
        PhaseKind::SourceToScheduler,
        PhaseKind::SchedulerHold,
        PhaseKind::ScheduleHighlight,
        PhaseKind::SchedulerToSink,
        PhaseKind::SinkToDestination,
    ];

    /// Duration at the reference pace.
    pub fn base_millis(&self) -> u64 {
        match self {
            Self::SourceToScheduler => 800,
            Self::SchedulerHold => 500,
            Self::ScheduleHighlight => 500,
            Self::SchedulerToSink => 800,
            // 500 distribution + 200 settle
            Self::SinkToDestination => 700,
        }
    }

    /// Status line for a 1-based frame number.
    pub fn describe(&self, frame: usize) -> String {
        match self {
            Self::SourceToScheduler => format!("Multiplexer receiving Frame {}", frame),
            Self::SchedulerHold => format!("Multiplexing Frame {}", frame),
            Self::ScheduleHighlight => format!("Transmitting Frame {}", frame),
            Self::SchedulerToSink => format!("Demultiplexer receiving Frame {}", frame),
            Self::SinkToDestination => format!("Distributing Frame {}", frame),
        }
    }
}

/// One timed phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    pub kind: PhaseKind,
    pub duration: Duration,

    /// Round being presented
    pub round: usize,

    /// Devices animated in this phase (empty for scheduler-only phases)
    pub devices: Vec<DeviceId>,
}

impl Phase {
    pub fn describe(&self) -> String {
        self.kind.describe(self.round + 1)
    }
}

/// Ordered list of phases for one step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhasePlan {
    phases: Vec<Phase>,
}

impl PhasePlan {
    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    /// Sum of all phase durations.
    pub fn total(&self) -> Duration {
        self.phases.iter().map(|p| p.duration).sum()
    }
}

/// Build the presentation plan for a completed step.
pub fn plan(transition: &RoundTransitionResult, speed: Speed) -> PhasePlan {
    if transition.direction == Direction::Backward {
        return PhasePlan::default();
    }

    let delivered = transition.delivered_devices();
    let round = transition.round.index;

    let phases = PhaseKind::ORDER
        .iter()
        .map(|&kind| Phase {
            kind,
            duration: speed.scale(kind.base_millis()),
            round,
            devices: match kind {
                PhaseKind::SourceToScheduler | PhaseKind::SinkToDestination => delivered.clone(),
                _ => Vec::new(),
            },
        })
        .collect();

    PhasePlan { phases }
}
