//! tdm-sim-core: Educational time-division multiplexing simulator
//!
//! This library provides the engine behind a step-by-step TDM demo:
//! - Several devices each hold an ordered sequence of units
//! - A scheduler interleaves one unit per device per round
//! - A stepper moves through the rounds one at a time, forward or backward,
//!   filling each device's receive buffer on the far side of the link
//! - Timing metrics show slot/frame durations and per-device efficiency
//!
//! # Architecture
//!
//! - `device`: device specs and the registry
//! - `schedule`: pure schedule construction
//! - `timing`: slot/frame durations and efficiency
//! - `stepper`: cursor state machine with re-entrancy guard
//! - `phases`: presentation phase plans (pure data, never awaited)
//! - `status`: status lines derived from the cursor
//! - `session`: the `Simulation` object tying it all together
//!
//! # Design Principles
//!
//! - **No panics**: every failure is a `ConfigError` or `StateError`
//! - **No globals**: all state lives in a `Simulation` value
//! - **Deterministic**: the same setup always yields the same schedule
//! - **Rejected commands change nothing**

pub mod device;
pub mod error;
pub mod phases;
pub mod schedule;
pub mod session;
pub mod status;
pub mod stepper;
pub mod timing;

// Re-export commonly used types
pub use device::{Device, DeviceId, DeviceRegistry, DeviceSpec, Unit};
pub use error::{ConfigError, Error, Result, StateError};
pub use phases::{Phase, PhaseKind, PhasePlan, Speed};
pub use schedule::{Schedule, ScheduleRound, Slot};
pub use session::{Simulation, Snapshot, StepOutcome};
pub use stepper::{Direction, RoundTransitionResult, SimulationStepper};
pub use timing::TimingMetrics;
