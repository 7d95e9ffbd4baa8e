//! tdm-sim - step through a TDM simulation in the terminal.
//!
//! Runs interactively by default; `--steps K` runs K frames and exits.

mod commands;
mod config;
mod input_gen;
mod render;

use anyhow::{Context, Result};
use clap::Parser;
use commands::{Command, Flow, Presenter};
use config::{Cli, Config};
use std::io::{self, BufRead, Write};
use tdm_sim_core::Simulation;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let config = Config::from_cli(Cli::parse())?;

    if config.print_config {
        config.print();
    } else if let Some(line) = config.seed_line() {
        // Keep JSON output parseable
        if config.json {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }

    let mut sim = Simulation::new();
    sim.set_speed(config.speed.millis())?;
    sim.setup_with_specs(config.cycle_time, config.devices.clone())
        .context("invalid simulation setup")?;

    let presenter = Presenter { animate: config.animate };

    match config.steps {
        Some(steps) => run_batch(&mut sim, steps, &presenter, &config)?,
        None => run_interactive(&mut sim, &presenter)?,
    }

    Ok(())
}

/// Run `steps` forward steps, then print the final state.
fn run_batch(sim: &mut Simulation, steps: usize, presenter: &Presenter, config: &Config) -> Result<()> {
    if !config.json {
        commands::print_overview(sim);
    }

    let mut taken = 0;
    for _ in 0..steps {
        if sim.is_complete() {
            break;
        }
        taken += 1;
        let outcome = sim.step_forward()?;
        if !config.json {
            println!("{}", render::transition(&outcome, &commands::labels(sim)));
        }
        if config.json {
            // Phases are not printed in JSON mode, only released
            sim.finish_transition()?;
        } else {
            presenter.play(sim, &outcome)?;
        }
    }

    if let Some(footer) = batch_footer(sim, taken, config.json)? {
        print!("{}", footer);
    }

    Ok(())
}

/// Final output of a batch run after `taken` steps.
fn batch_footer(sim: &Simulation, taken: usize, json: bool) -> Result<Option<String>> {
    if json {
        Ok(Some(format!("{}\n", serde_json::to_string_pretty(&sim.snapshot())?)))
    } else if taken > 0 {
        Ok(Some(render::status(&sim.snapshot())))
    } else {
        // The overview already ended with this status
        Ok(None)
    }
}

/// Read commands from stdin until `quit` or end of input.
fn run_interactive(sim: &mut Simulation, presenter: &Presenter) -> Result<()> {
    commands::print_overview(sim);
    commands::print_help();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("tdm> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };

        match line?.parse::<Command>() {
            Ok(command) => {
                if commands::execute(sim, command, presenter)? == Flow::Quit {
                    break;
                }
            }
            Err(e) => println!("{}", e),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_footer_skips_repeated_status() {
        let mut sim = Simulation::new();
        sim.setup(2, 1.0, &["AA", "BBB"]).unwrap();

        assert!(batch_footer(&sim, 0, false).unwrap().is_none());

        let json = batch_footer(&sim, 0, true).unwrap().unwrap();
        assert!(json.contains("\"cursor\": 0"));

        sim.step_forward().unwrap();
        sim.finish_transition().unwrap();
        let footer = batch_footer(&sim, 1, false).unwrap().unwrap();
        assert!(footer.contains("Frame 1/3"));
    }
}
