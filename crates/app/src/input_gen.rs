//! Unit data generation for demo runs.
//!
//! When `--random-data` is given, each device gets a sequence of 1 to 8
//! units drawn from its own small alphabet (its label in both cases plus
//! the digits), so unequal lengths and the resulting empty slots show up in
//! almost every run.
//!
//! Everything is derived from a ChaCha8 RNG seeded by the caller, so the
//! same seed always yields the same devices.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tdm_sim_core::device::{label_for, MAX_DEVICES, MIN_DEVICES};

/// Longest generated unit sequence.
pub const MAX_GENERATED_UNITS: usize = 8;

/// Pick a device count in `[2, 8]` from the seed.
pub fn device_count(seed: u64) -> usize {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.gen_range(MIN_DEVICES..=MAX_DEVICES)
}

/// Generate one unit sequence per device.
///
/// # Arguments
/// - `seed`: random seed for determinism
/// - `count`: number of devices
pub fn generate_sequences(seed: u64, count: usize) -> Vec<String> {
    // Offset so the sequences do not replay the device-count draw
    let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(1));

    (0..count)
        .map(|id| {
            let alphabet = alphabet_for(label_for(id));
            let len = rng.gen_range(1..=MAX_GENERATED_UNITS);
            (0..len)
                .map(|_| alphabet[rng.gen_range(0..alphabet.len())])
                .collect()
        })
        .collect()
}

fn alphabet_for(label: char) -> Vec<char> {
    let mut alphabet = vec![label, label.to_ascii_lowercase()];
    alphabet.extend('0'..='9');
    alphabet
}
