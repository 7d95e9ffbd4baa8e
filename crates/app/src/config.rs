//! Configuration for the tdm-sim application.
//!
//! Handles parsing command-line arguments and resolving sensible defaults.
//!
//! # Philosophy
//!
//! The tool should work with ZERO arguments: three devices carrying the
//! classic demo data (A="AA", B="BBB", C="CCCC") and `T = 1s`. Random data
//! is opt-in and always seeded, and the seed is printed so runs are
//! reproducible.

use crate::input_gen;
use anyhow::{bail, Result};
use clap::Parser;
use tdm_sim_core::device::{label_for, DeviceSpec, MAX_DEVICES, MIN_DEVICES};
use tdm_sim_core::timing::DEFAULT_CYCLE_TIME;
use tdm_sim_core::Speed;

/// Device count used when neither `--devices` nor `--data` is given.
pub const DEFAULT_DEVICE_COUNT: usize = 3;

/// Command-line arguments.
#[derive(Debug, Clone, Parser)]
#[command(name = "tdm-sim")]
#[command(about = "Step through a time-division multiplexing simulation")]
pub struct Cli {
    /// Number of devices (2-8)
    #[arg(short = 'n', long)]
    pub devices: Option<usize>,

    /// Total cycle time T in seconds
    #[arg(short = 't', long = "cycle-time", default_value_t = DEFAULT_CYCLE_TIME)]
    pub cycle_time: f64,

    /// Unit data for the next device, as `UNITS` or `LABEL=UNITS` (repeatable)
    #[arg(short, long = "data", value_name = "LABEL=UNITS")]
    pub data: Vec<String>,

    /// Generate random unit data instead of the demo defaults
    #[arg(long)]
    pub random_data: bool,

    /// Random seed for generated data (default: time-based)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Presentation speed in ms per reference second (500 fast, 1000 medium, 2000 slow)
    #[arg(long, default_value_t = 1000.0)]
    pub speed: f64,

    /// Run this many forward steps non-interactively, then exit
    #[arg(long)]
    pub steps: Option<usize>,

    /// Print the final snapshot as JSON
    #[arg(long)]
    pub json: bool,

    /// Sleep through each presentation phase
    #[arg(long)]
    pub animate: bool,

    /// Print the resolved configuration
    #[arg(long)]
    pub print_config: bool,
}

/// Where the unit data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Defaults,
    Explicit,
    Random { seed: u64 },
}

/// Complete configuration for a run.
#[derive(Debug, Clone)]
pub struct Config {
    // === Simulation ===
    pub cycle_time: f64,
    pub devices: Vec<DeviceSpec>,
    pub source: DataSource,

    // === Presentation ===
    pub speed: Speed,
    pub animate: bool,

    // === Behavior ===
    /// Forward steps to run in batch mode (None = interactive)
    pub steps: Option<usize>,
    pub json: bool,
    pub print_config: bool,
}

impl Config {
    /// Resolve parsed arguments into a full configuration.
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let speed = Speed::new(cli.speed)?;

        let (devices, source) = if !cli.data.is_empty() {
            if cli.random_data {
                bail!("--data and --random-data are mutually exclusive");
            }
            (parse_data(&cli.data, cli.devices)?, DataSource::Explicit)
        } else if cli.random_data {
            let seed = cli.seed.unwrap_or_else(time_seed);
            let count = cli.devices.unwrap_or_else(|| input_gen::device_count(seed));
            check_count(count)?;
            let texts = input_gen::generate_sequences(seed, count);
            let specs = texts
                .iter()
                .enumerate()
                .map(|(i, t)| DeviceSpec::from_text(label_for(i), t))
                .collect();
            (specs, DataSource::Random { seed })
        } else {
            let count = cli.devices.unwrap_or(DEFAULT_DEVICE_COUNT);
            check_count(count)?;
            ((0..count).map(DeviceSpec::default_for).collect(), DataSource::Defaults)
        };

        Ok(Config {
            cycle_time: cli.cycle_time,
            devices,
            source,
            speed,
            animate: cli.animate,
            steps: cli.steps,
            json: cli.json,
            print_config: cli.print_config,
        })
    }

    /// Where the unit data came from, including the seed for random data.
    pub fn data_line(&self) -> String {
        match self.source {
            DataSource::Defaults => "Data: demo defaults".to_string(),
            DataSource::Explicit => "Data: from --data".to_string(),
            DataSource::Random { seed } => format!("Data: random (seed {})", seed),
        }
    }

    /// The line to print on every run so generated data can be replayed.
    pub fn seed_line(&self) -> Option<String> {
        match self.source {
            DataSource::Random { .. } => Some(self.data_line()),
            _ => None,
        }
    }

    /// Print the configuration in human-readable form.
    pub fn print(&self) {
        println!("=== Configuration ===");
        println!("{}", self.data_line());
        println!("Devices: {}", self.devices.len());
        for spec in &self.devices {
            println!("  {}: {}", spec.label, spec.units.iter().collect::<String>());
        }
        println!("Cycle time (T): {} s", self.cycle_time);
        println!("Speed: {} ms", self.speed.millis());
        println!();
    }
}

/// Parse `--data` values in device order.
///
/// A `LABEL=` prefix is optional but, when present, must name the device
/// at that position. Units are not checked here; empty data is reported by
/// the simulation itself.
fn parse_data(values: &[String], devices: Option<usize>) -> Result<Vec<DeviceSpec>> {
    if let Some(count) = devices {
        if count != values.len() {
            bail!("--devices {} does not match {} --data values", count, values.len());
        }
    }

    values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let expected = label_for(i);
            let units = match value.split_once('=') {
                Some((label, units)) => {
                    let label = label.trim();
                    if label.len() != 1 || !label.eq_ignore_ascii_case(&expected.to_string()) {
                        bail!("--data #{} is labelled {:?}, expected {}", i + 1, label, expected);
                    }
                    units
                }
                None => value.as_str(),
            };
            Ok(DeviceSpec::from_text(expected, units))
        })
        .collect()
}

fn check_count(count: usize) -> Result<()> {
    if !(MIN_DEVICES..=MAX_DEVICES).contains(&count) {
        bail!("device count must be between {} and {}, got {}", MIN_DEVICES, MAX_DEVICES, count);
    }
    Ok(())
}

fn time_seed() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
