//! Timing metrics for a TDM schedule.
//!
//! TDM divides every round ("frame") into equal slots regardless of how
//! much data each device actually has:
//!
//! ```text
//! slot duration  = T / n          (real division, n = device count)
//! round duration = T
//! total time     = rounds * T
//! efficiency(d)  = units(d) / rounds * 100
//! ```
//!
//! A device with fewer units than the longest device still occupies its
//! slot in every round, so its efficiency drops below 100%. That overhead
//! is the thing the simulator is meant to make visible.

use crate::device::{Device, DeviceId};
use crate::error::{ConfigError, Result};
use crate::schedule::Schedule;
use serde::{Deserialize, Serialize};

/// Default total cycle time `T` in seconds.
pub const DEFAULT_CYCLE_TIME: f64 = 1.0;

/// Per-device timing figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceTiming {
    pub device_id: DeviceId,
    pub label: char,

    /// Number of units the device sends
    pub unit_count: usize,

    /// Time to send the units with a dedicated link: `units * T`
    pub original_time: f64,

    /// Time until the multiplexed schedule finishes: `rounds * T`
    pub tdm_time: f64,

    /// Share of rounds carrying this device's data, as a percentage
    pub efficiency: f64,
}

/// Derived timing for a configured simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingMetrics {
    /// Total cycle time `T` in seconds
    pub total_cycle_time: f64,

    /// `T / n`
    pub slot_duration: f64,

    /// Equal to `T`
    pub round_duration: f64,

    /// Number of rounds in the schedule
    pub total_rounds: usize,

    /// Indexed by device id
    pub per_device: Vec<DeviceTiming>,
}

impl TimingMetrics {
    /// Time to play the whole schedule: `rounds * round_duration`.
    pub fn total_transmission_time(&self) -> f64 {
        self.total_rounds as f64 * self.round_duration
    }

    pub fn device(&self, id: DeviceId) -> Option<&DeviceTiming> {
        self.per_device.get(id)
    }

    /// Average efficiency across devices.
    pub fn mean_efficiency(&self) -> f64 {
        if self.per_device.is_empty() {
            0.0
        } else {
            self.per_device.iter().map(|d| d.efficiency).sum::<f64>() / self.per_device.len() as f64
        }
    }

    /// Human-readable report.
    pub fn summary(&self) -> String {
        let n = self.per_device.len();
        let mut out = String::new();

        out.push_str("=== Timing Metrics ===\n");
        out.push_str(&format!("Base time (T): {:.3} second(s)\n", self.total_cycle_time));
        out.push_str(&format!("Slot time (T/{}): {:.3} second(s)\n", n, self.slot_duration));
        out.push_str(&format!("Frame time: {:.3} second(s)\n", self.round_duration));
        out.push_str(&format!("Total frames: {}\n", self.total_rounds));
        out.push_str(&format!(
            "Total transmission time: {:.3} second(s)\n",
            self.total_transmission_time()
        ));
        out.push('\n');

        out.push_str("=== Device Efficiency ===\n");
        for d in &self.per_device {
            out.push_str(&format!(
                "Device {}: {} frames / {} total = {:.1}% efficiency (original {:.3}s, TDM {:.3}s)\n",
                d.label, d.unit_count, self.total_rounds, d.efficiency, d.original_time, d.tdm_time
            ));
        }
        out.push_str(&format!("Mean efficiency: {:.1}%\n", self.mean_efficiency()));

        out
    }

    /// Print the report to stdout.
    pub fn print_summary(&self) {
        println!("{}", self.summary());
    }

    /// Export as `key=value` lines (for parsing/testing).
    pub fn export_text(&self) -> String {
        let mut out = format!(
            "cycle_time={:.6}\n\
             slot_duration={:.6}\n\
             round_duration={:.6}\n\
             total_rounds={}\n\
             total_time={:.6}\n",
            self.total_cycle_time,
            self.slot_duration,
            self.round_duration,
            self.total_rounds,
            self.total_transmission_time(),
        );

        for d in &self.per_device {
            out.push_str(&format!("efficiency_{}={:.4}\n", d.label, d.efficiency));
        }

        out
    }
}

/// Compute timing metrics.
///
/// # Errors
/// - `ConfigError::NonPositiveCycleTime` if `total_cycle_time` is not a positive finite number
/// - `ConfigError::NoDevices` if `devices` is empty
/// - `ConfigError::NoRounds` if the schedule has no rounds (efficiency undefined)
pub fn compute(devices: &[Device], schedule: &Schedule, total_cycle_time: f64) -> Result<TimingMetrics> {
    if !total_cycle_time.is_finite() || total_cycle_time <= 0.0 {
        return Err(ConfigError::NonPositiveCycleTime {
            value: total_cycle_time,
        }
        .into());
    }

    if devices.is_empty() {
        return Err(ConfigError::NoDevices.into());
    }

    let total_rounds = schedule.len();
    if total_rounds == 0 {
        return Err(ConfigError::NoRounds.into());
    }

    let round_duration = total_cycle_time;
    let slot_duration = total_cycle_time / devices.len() as f64;
    let tdm_time = total_rounds as f64 * round_duration;

    let per_device = devices
        .iter()
        .map(|device| DeviceTiming {
            device_id: device.id,
            label: device.label,
            unit_count: device.unit_count(),
            original_time: device.unit_count() as f64 * total_cycle_time,
            tdm_time,
            efficiency: device.unit_count() as f64 / total_rounds as f64 * 100.0,
        })
        .collect();

    Ok(TimingMetrics {
        total_cycle_time,
        slot_duration,
        round_duration,
        total_rounds,
        per_device,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{label_for, DeviceRegistry, DeviceSpec};
    use crate::error::Error;
    use crate::schedule;

    fn setup(texts: &[&str]) -> (DeviceRegistry, Schedule) {
        let registry = DeviceRegistry::from_specs(
            texts
                .iter()
                .enumerate()
                .map(|(i, t)| DeviceSpec::from_text(label_for(i), t))
                .collect(),
        )
        .unwrap();
        let schedule = schedule::build(registry.devices());
        (registry, schedule)
    }

    #[test]
    fn test_two_device_example() {
        let (registry, schedule) = setup(&["AA", "BBB"]);
        let metrics = compute(registry.devices(), &schedule, 1.0).unwrap();

        assert_eq!(metrics.total_rounds, 3);
        assert_eq!(metrics.slot_duration, 0.5);
        assert_eq!(metrics.round_duration, 1.0);
        assert_eq!(metrics.total_transmission_time(), 3.0);

        let a = metrics.device(0).unwrap();
        assert!((a.efficiency - 66.666_666).abs() < 1e-3);
        assert_eq!(a.original_time, 2.0);
        assert_eq!(a.tdm_time, 3.0);

        assert_eq!(metrics.device(1).unwrap().efficiency, 100.0);
    }

    #[test]
    fn test_real_division() {
        let (registry, schedule) = setup(&["a", "b", "c"]);
        let metrics = compute(registry.devices(), &schedule, 1.0).unwrap();

        assert!((metrics.slot_duration - 1.0 / 3.0).abs() < 1e-15);
        assert!(metrics.slot_duration > 0.0);
    }

    #[test]
    fn test_invalid_cycle_time() {
        let (registry, schedule) = setup(&["AA", "BBB"]);

        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let result = compute(registry.devices(), &schedule, bad);
            assert!(matches!(
                result,
                Err(Error::Config(ConfigError::NonPositiveCycleTime { .. }))
            ));
        }
    }

    #[test]
    fn test_no_devices() {
        let result = compute(&[], &Schedule::default(), 1.0);
        assert!(matches!(result, Err(Error::Config(ConfigError::NoDevices))));
    }

    #[test]
    fn test_no_rounds() {
        let (registry, _) = setup(&["AA", "BBB"]);
        let result = compute(registry.devices(), &Schedule::default(), 1.0);
        assert!(matches!(result, Err(Error::Config(ConfigError::NoRounds))));
    }

    #[test]
    fn test_summary_format() {
        let (registry, schedule) = setup(&["AA", "BBB"]);
        let metrics = compute(registry.devices(), &schedule, 1.0).unwrap();
        let summary = metrics.summary();

        assert!(summary.contains("Slot time (T/2): 0.500 second(s)"));
        assert!(summary.contains("Total frames: 3"));
        assert!(summary.contains("Device A: 2 frames / 3 total = 66.7% efficiency"));
        assert!(summary.contains("Device B: 3 frames / 3 total = 100.0% efficiency"));
        assert!(summary.contains("Mean efficiency: 83.3%"));
    }

    #[test]
    fn test_export_text() {
        let (registry, schedule) = setup(&["AA", "BBB"]);
        let metrics = compute(registry.devices(), &schedule, 2.0).unwrap();
        let text = metrics.export_text();

        assert!(text.contains("slot_duration=1.000000"));
        assert!(text.contains("total_rounds=3"));
        assert!(text.contains("total_time=6.000000"));
        assert!(text.contains("efficiency_B=100.0000"));
    }
}
