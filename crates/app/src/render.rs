//! Console rendering of simulation state.
//!
//! Everything here is a pure function from core data to a `String`, so the
//! layout is testable without capturing stdout.

use tdm_sim_core::phases::Phase;
use tdm_sim_core::{Direction, Schedule, Snapshot, StepOutcome};

/// Placeholder shown for an empty slot.
const EMPTY_SLOT: char = '-';

/// Render the schedule as a table, marking the round at the cursor.
///
/// ```text
///          A B
///   F1     A B
/// > F2     A B
///   F3     - B
/// ```
pub fn schedule_table(schedule: &Schedule, labels: &[char], cursor: usize) -> String {
    let mut out = String::from("=== TDM Schedule ===\n");

    out.push_str("        ");
    for label in labels {
        out.push_str(&format!(" {}", label));
    }
    out.push('\n');

    for round in schedule.rounds() {
        let marker = if round.index == cursor { '>' } else { ' ' };
        out.push_str(&format!("{} F{:<4} ", marker, round.index + 1));
        for slot in &round.slots {
            out.push_str(&format!(" {}", slot.content.unwrap_or(EMPTY_SLOT)));
        }
        out.push('\n');
    }
    out.push_str(&format!("Slot utilization: {:.1}%\n", schedule.utilization() * 100.0));

    out
}

/// Render devices, link status and progress.
pub fn status(snapshot: &Snapshot) -> String {
    let mut out = format!(
        "=== Frame {}/{} ({}) ===\n",
        snapshot.cursor, snapshot.total_rounds, snapshot.state
    );
    out.push_str(&format!("MUX:   {}\n", snapshot.multiplexer));
    out.push_str(&format!("DEMUX: {}\n", snapshot.demultiplexer));

    for device in &snapshot.devices {
        out.push_str(&format!(
            "  {} [{:<8}] {:<16} -> [{:<8}] {}\n",
            device.label,
            device.units,
            device.sender.to_string(),
            device.received,
            device.receiver
        ));
    }

    out
}

/// One line per presentation phase.
pub fn phase(phase: &Phase) -> String {
    format!("  .. {} ({} ms)", phase.describe(), phase.duration.as_millis())
}

/// Summary line for a completed step.
pub fn transition(outcome: &StepOutcome, labels: &[char]) -> String {
    let t = &outcome.transition;
    let delivered: Vec<String> = t
        .deliveries
        .iter()
        .filter_map(|d| {
            d.unit
                .map(|u| format!("{}:{}", labels.get(d.device_id).copied().unwrap_or('?'), u))
        })
        .collect();

    match t.direction {
        Direction::Forward => format!(
            "Frame {} transmitted [{}]",
            t.round.index + 1,
            delivered.join(" ")
        ),
        Direction::Backward => format!(
            "Frame {} rewound [{}]",
            t.round.index + 1,
            delivered.join(" ")
        ),
    }
}
