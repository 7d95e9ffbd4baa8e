//! Status lines derived from the cursor.
//!
//! Nothing here is stored; every status is recomputed from the cursor and
//! the device buffers, so it can never drift from the stepper's state.

use crate::device::Device;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sending side of one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SenderStatus {
    Sending { sent: usize, total: usize },
    Complete,
}

impl SenderStatus {
    pub fn at(device: &Device, cursor: usize) -> Self {
        if device.is_complete_at(cursor) {
            Self::Complete
        } else {
            Self::Sending {
                sent: cursor,
                total: device.unit_count(),
            }
        }
    }
}

impl fmt::Display for SenderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sending { sent, total } => write!(f, "Sending ({}/{})", sent, total),
            Self::Complete => write!(f, "Complete"),
        }
    }
}

/// Receiving side of one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiverStatus {
    Receiving { received: usize, total: usize },
    Complete,
}

impl ReceiverStatus {
    pub fn at(device: &Device, cursor: usize) -> Self {
        if device.is_complete_at(cursor) {
            Self::Complete
        } else {
            Self::Receiving {
                received: device.received().len(),
                total: device.unit_count(),
            }
        }
    }
}

impl fmt::Display for ReceiverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Receiving { received, total } => write!(f, "Receiving ({}/{})", received, total),
            Self::Complete => write!(f, "Complete"),
        }
    }
}

/// Multiplexer / demultiplexer status between steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkStatus {
    /// Freshly set up, nothing stepped yet
    ReadyToStart,

    /// Waiting for the given 1-based frame
    ReadyForFrame(usize),

    SimulationComplete,
}

impl LinkStatus {
    /// `stepped` is false only right after setup.
    pub fn at(cursor: usize, total_rounds: usize, stepped: bool) -> Self {
        if cursor >= total_rounds {
            Self::SimulationComplete
        } else if cursor == 0 && !stepped {
            Self::ReadyToStart
        } else {
            Self::ReadyForFrame(cursor + 1)
        }
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadyToStart => write!(f, "Ready to start"),
            Self::ReadyForFrame(frame) => write!(f, "Ready for Frame {}", frame),
            Self::SimulationComplete => write!(f, "Simulation complete"),
        }
    }
}
