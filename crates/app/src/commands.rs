//! Interactive commands and their execution against a simulation.

use crate::render;
use anyhow::{anyhow, Result};
use std::str::FromStr;
use tdm_sim_core::{Direction, Simulation, StepOutcome};
use tracing::debug;

/// One line of interactive input.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Setup {
        devices: usize,
        cycle_time: f64,
        sequences: Vec<String>,
    },
    Step(Direction),
    Speed(f64),
    Status,
    Schedule,
    Metrics,
    Reset,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut parts = line.split_whitespace();
        let word = parts.next().unwrap_or("next");

        let command = match word {
            "n" | "next" => Command::Step(Direction::Forward),
            "p" | "prev" => Command::Step(Direction::Backward),
            "speed" => {
                let value = parts.next().ok_or_else(|| anyhow!("speed requires a value in ms"))?;
                Command::Speed(value.parse().map_err(|_| anyhow!("invalid speed: {}", value))?)
            }
            "setup" => {
                let usage = "usage: setup <DEVICES> <CYCLE_TIME> <UNITS>...";
                let devices = parts.next().ok_or_else(|| anyhow!(usage))?;
                let devices = devices
                    .parse()
                    .map_err(|_| anyhow!("invalid device count: {}", devices))?;
                let cycle_time = parts.next().ok_or_else(|| anyhow!(usage))?;
                let cycle_time = cycle_time
                    .parse()
                    .map_err(|_| anyhow!("invalid cycle time: {}", cycle_time))?;
                Command::Setup {
                    devices,
                    cycle_time,
                    sequences: parts.map(String::from).collect(),
                }
            }
            "s" | "status" => Command::Status,
            "schedule" => Command::Schedule,
            "m" | "metrics" => Command::Metrics,
            "reset" => Command::Reset,
            "h" | "help" | "?" => Command::Help,
            "q" | "quit" | "exit" => Command::Quit,
            other => return Err(anyhow!("unknown command: {} (try 'help')", other)),
        };

        Ok(command)
    }
}

/// Whether the command loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Plays a step's presentation phases.
pub struct Presenter {
    pub animate: bool,
}

impl Presenter {
    /// Print each phase (sleeping through it when animating), then release
    /// the session for the next step.
    pub fn play(&self, sim: &mut Simulation, outcome: &StepOutcome) -> Result<()> {
        for phase in outcome.phases.phases() {
            println!("{}", render::phase(phase));
            if self.animate {
                std::thread::sleep(phase.duration);
            }
        }

        if !outcome.phases.is_empty() {
            sim.finish_transition()?;
        }
        Ok(())
    }
}

/// Execute one command, printing its result.
///
/// Rejected steps are reported and the loop continues; the simulation is
/// unchanged by them.
pub fn execute(sim: &mut Simulation, command: Command, presenter: &Presenter) -> Result<Flow> {
    debug!(?command, "executing command");

    match command {
        Command::Setup {
            devices,
            cycle_time,
            sequences,
        } => match sim.setup(devices, cycle_time, sequences.as_slice()) {
            Ok(()) => print_overview(sim),
            Err(e) => println!("Setup rejected: {}", e),
        },
        Command::Step(direction) => match sim.step(direction) {
            Ok(outcome) => {
                println!("{}", render::transition(&outcome, &labels(sim)));
                presenter.play(sim, &outcome)?;
                print!("{}", render::status(&sim.snapshot()));
            }
            Err(e) => println!("Cannot step: {}", e),
        },
        Command::Speed(ms) => match sim.set_speed(ms) {
            Ok(()) => println!("Speed set to {} ms", ms),
            Err(e) => println!("{}", e),
        },
        Command::Status => print!("{}", render::status(&sim.snapshot())),
        Command::Schedule => print!("{}", render::schedule_table(sim.schedule(), &labels(sim), sim.cursor())),
        Command::Metrics => {
            if let Some(metrics) = sim.metrics() {
                metrics.print_summary();
            }
        }
        Command::Reset => match sim.reset() {
            Ok(()) => print!("{}", render::status(&sim.snapshot())),
            Err(e) => println!("Cannot reset: {}", e),
        },
        Command::Help => print_help(),
        Command::Quit => return Ok(Flow::Quit),
    }

    Ok(Flow::Continue)
}

/// Print metrics, the schedule and the current status.
pub fn print_overview(sim: &Simulation) {
    if let Some(metrics) = sim.metrics() {
        metrics.print_summary();
    }
    println!("{}", render::schedule_table(sim.schedule(), &labels(sim), sim.cursor()));
    print!("{}", render::status(&sim.snapshot()));
}

/// Device labels in device order.
pub fn labels(sim: &Simulation) -> Vec<char> {
    sim.devices().iter().map(|d| d.label).collect()
}

pub fn print_help() {
    println!("Commands:");
    println!("    setup <N> <T> <UNITS>...  Reconfigure N devices with cycle time T");
    println!("    n, next          Transmit the next frame");
    println!("    p, prev          Rewind the last frame");
    println!("    speed <MS>       Presentation speed (500 fast, 1000 medium, 2000 slow)");
    println!("    s, status        Show devices and link status");
    println!("    schedule         Show the TDM schedule");
    println!("    m, metrics       Show timing metrics");
    println!("    reset            Rewind to the first frame");
    println!("    q, quit          Exit");
    println!("An empty line is the same as 'next'.");
}
