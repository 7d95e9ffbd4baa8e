//! Source devices and the registry that holds them.
//!
//! Each device owns an immutable sequence of units (one symbol per unit)
//! and a receive buffer on the far side of the link. The receive buffer is
//! only ever touched by the stepper, which keeps it consistent with the
//! simulation cursor.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};

/// One transmitted symbol.
pub type Unit = char;

/// Ordinal index of a device in registration order (0-based).
pub type DeviceId = usize;

/// Minimum number of devices a simulation may be configured with.
pub const MIN_DEVICES: usize = 2;

/// Maximum number of devices a simulation may be configured with.
pub const MAX_DEVICES: usize = 8;

/// Conventional label for a device id: 0 -> 'A', 1 -> 'B', ...
pub fn label_for(id: DeviceId) -> char {
    (b'A' + (id % 26) as u8) as char
}

/// Setup input for one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSpec {
    pub label: char,
    pub units: Vec<Unit>,
}

impl DeviceSpec {
    pub fn new(label: char, units: Vec<Unit>) -> Self {
        Self { label, units }
    }

    /// Parse a unit sequence from text, one character per unit.
    ///
    /// Surrounding whitespace is trimmed. An empty result is not rejected
    /// here; `DeviceRegistry::configure` reports it with the device label.
    pub fn from_text(label: char, text: &str) -> Self {
        Self {
            label,
            units: text.trim().chars().collect(),
        }
    }

    /// Default data for device `id`: its label repeated `id + 2` times.
    pub fn default_for(id: DeviceId) -> Self {
        let label = label_for(id);
        Self {
            label,
            units: std::iter::repeat(label).take(id + 2).collect(),
        }
    }
}

/// A configured source and its matching destination buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub label: char,
    units: Vec<Unit>,
    received: Vec<Unit>,
}

impl Device {
    fn new(id: DeviceId, spec: DeviceSpec) -> Self {
        Self {
            id,
            label: spec.label,
            units: spec.units,
            received: Vec::new(),
        }
    }

    /// Units this device sends, in order.
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Units delivered to this device's destination so far.
    pub fn received(&self) -> &[Unit] {
        &self.received
    }

    /// Number of units this device sends.
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// True once the cursor has passed this device's last unit.
    ///
    /// Independent of the global end of the simulation: a short device
    /// finishes early while longer devices keep the schedule running.
    pub fn is_complete_at(&self, cursor: usize) -> bool {
        cursor >= self.units.len()
    }

    pub(crate) fn push_received(&mut self, unit: Unit) {
        self.received.push(unit);
    }

    pub(crate) fn pop_received(&mut self) -> Option<Unit> {
        self.received.pop()
    }

    pub(crate) fn clear_received(&mut self) {
        self.received.clear();
    }
}

/// The set of configured devices, in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRegistry {
    devices: Vec<Device>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry directly from specs.
    pub fn from_specs(specs: Vec<DeviceSpec>) -> Result<Self> {
        let mut registry = Self::new();
        registry.configure(specs)?;
        Ok(registry)
    }

    /// Replace all devices with the given specs.
    ///
    /// # Errors
    /// - `ConfigError::DeviceCount` if the count is outside `[2, 8]`
    /// - `ConfigError::EmptyUnits` if any device has no units
    /// - `ConfigError::DuplicateLabel` if two devices share a label
    ///
    /// On error the registry is left exactly as it was.
    pub fn configure(&mut self, specs: Vec<DeviceSpec>) -> Result<()> {
        validate_specs(&specs)?;

        self.devices = specs
            .into_iter()
            .enumerate()
            .map(|(id, spec)| Device::new(id, spec))
            .collect();

        Ok(())
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub(crate) fn devices_mut(&mut self) -> &mut [Device] {
        &mut self.devices
    }

    pub fn get(&self, id: DeviceId) -> Option<&Device> {
        self.devices.get(id)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Longest unit sequence across all devices (0 when empty).
    pub fn max_units(&self) -> usize {
        self.devices.iter().map(Device::unit_count).max().unwrap_or(0)
    }

    pub(crate) fn clear_received(&mut self) {
        for device in &mut self.devices {
            device.clear_received();
        }
    }
}

/// Check a set of specs without touching any registry.
pub fn validate_specs(specs: &[DeviceSpec]) -> Result<()> {
    if specs.len() < MIN_DEVICES || specs.len() > MAX_DEVICES {
        return Err(ConfigError::DeviceCount {
            count: specs.len(),
            min: MIN_DEVICES,
            max: MAX_DEVICES,
        }
        .into());
    }

    for (i, spec) in specs.iter().enumerate() {
        if spec.units.is_empty() {
            return Err(ConfigError::EmptyUnits { label: spec.label }.into());
        }

        if specs[..i].iter().any(|other| other.label == spec.label) {
            return Err(ConfigError::DuplicateLabel { label: spec.label }.into());
        }
    }

    Ok(())
}
