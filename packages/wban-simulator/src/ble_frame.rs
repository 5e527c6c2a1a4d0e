//! ble_frame.rs — Synthetic BLE frame generation
//!
//! Produces one frame per (patient, sensor) per tick:
//! 1. Stamp the generator-wide frame number and wall-clock time
//! 2. Draw transmit-power class, channel and antenna
//! 3. Derive carrier frequency from the channel
//! 4. Draw RSSI around a strong-signal baseline, scaled by the device's noise factor
//! 5. Map RSSI to a 0–100 strength percentage and draw the decode outcome
//! 6. Fill bit length and the placeholder phase / I/Q arrays
//!
//! The arrays carry no signal content; they only give a frame its shape.
//!
//! Draw order per frame (matters for fixed-sequence tests): noise factor (first
//! frame of a device only), power class, channel, antenna, RSSI, decode,
//! bit length, 5 phase values, 10 I/Q values.

use std::collections::HashMap;

use chrono::Utc;
use serde::Deserialize;
use tracing::debug;
use wban_types::{BleFrame, Placement, PowerClass};

use crate::error::{Result, WbanError};
use crate::random::UniformSource;

// ── Channel plan ──────────────────────────────────────────────────────────────

/// Channel indices the generator draws from. Index 11 is not part of the plan.
pub const CHANNEL_MAP: [u8; 39] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10,
    12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26, 27, 28, 29, 30,
    31, 32, 33, 34, 35, 36,
    37, 38, 39,
];

pub const BASE_FREQUENCY_MHZ: f64 = 2402.0;
pub const CHANNEL_SPACING_MHZ: f64 = 2.0;

const ANTENNAS: [u8; 4] = [1, 2, 3, 4];
const PHASE_UNWRAP_LEN: usize = 5;
const IQ_SAMPLES_LEN: usize = 10;

/// Carrier frequency in GHz for a channel index.
pub fn channel_frequency_ghz(channel: u8) -> f64 {
    (BASE_FREQUENCY_MHZ + channel as f64 * CHANNEL_SPACING_MHZ) / 1000.0
}

/// Affine RSSI → percentage map: −100 dBm is 0 %, −30 dBm is 100 %.
pub fn signal_strength_pct(rssi_dbm: f64) -> f64 {
    ((rssi_dbm + 100.0) / 70.0 * 100.0).clamp(0.0, 100.0)
}

// ── Radio configuration ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RadioConfig {
    pub base_rssi_dbm:        f64,
    /// RSSI noise half-width before noise-factor scaling
    pub rssi_spread_dbm:      f64,
    pub noise_factor_min:     f64,
    pub noise_factor_max:     f64,
    pub decode_success_rate:  f64,
    pub bit_length_min:       u32,
    /// Exclusive
    pub bit_length_max:       u32,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            base_rssi_dbm: -40.0,
            rssi_spread_dbm: 10.0,
            noise_factor_min: 0.9,
            noise_factor_max: 1.0,
            decode_success_rate: 0.95,
            bit_length_min: 150,
            bit_length_max: 250,
        }
    }
}

impl RadioConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.noise_factor_min > 0.0 && self.noise_factor_min <= self.noise_factor_max) {
            return Err(WbanError::Config(format!(
                "noise factor range [{}, {}] must be positive and ordered",
                self.noise_factor_min, self.noise_factor_max
            )));
        }
        if !(0.0..=1.0).contains(&self.decode_success_rate) {
            return Err(WbanError::Config(format!(
                "decode_success_rate {} outside [0, 1]",
                self.decode_success_rate
            )));
        }
        if self.bit_length_min >= self.bit_length_max {
            return Err(WbanError::Config(format!(
                "bit length range [{}, {}) is empty",
                self.bit_length_min, self.bit_length_max
            )));
        }
        if self.rssi_spread_dbm < 0.0 {
            return Err(WbanError::Config("rssi_spread_dbm must be >= 0".into()));
        }
        Ok(())
    }
}

// ── Synthesizer ───────────────────────────────────────────────────────────────

/// Owns the frame counter and the per-device noise factors.
pub struct FrameSynthesizer {
    cfg: RadioConfig,
    frame_counter: u64,
    /// Fixed once per device on its first frame, in [noise_factor_min, noise_factor_max]
    noise_factors: HashMap<String, f64>,
}

impl FrameSynthesizer {
    pub fn new(cfg: RadioConfig) -> Self {
        Self { cfg, frame_counter: 0, noise_factors: HashMap::new() }
    }

    /// Number of frames generated so far (= last frame number).
    pub fn frame_counter(&self) -> u64 { self.frame_counter }

    pub fn noise_factor(&self, device_id: &str) -> Option<f64> {
        self.noise_factors.get(device_id).copied()
    }

    pub fn generate_frame(
        &mut self,
        rng: &mut impl UniformSource,
        device_id: &str,
        placement: Placement,
    ) -> BleFrame {
        self.frame_counter += 1;

        let noise_factor = match self.noise_factors.get(device_id) {
            Some(f) => *f,
            None => {
                let f = rng.uniform(self.cfg.noise_factor_min, self.cfg.noise_factor_max);
                self.noise_factors.insert(device_id.to_string(), f);
                f
            }
        };

        let power_class = draw_power_class(rng);
        let channel = rng.pick(&CHANNEL_MAP);
        let antenna = rng.pick(&ANTENNAS);

        let spread = self.cfg.rssi_spread_dbm;
        let rssi_dbm = self.cfg.base_rssi_dbm + rng.uniform(-spread, spread) / noise_factor;
        let decoded = rng.chance(self.cfg.decode_success_rate);

        let bit_length = rng
            .uniform(self.cfg.bit_length_min as f64, self.cfg.bit_length_max as f64)
            .floor() as u32;
        let phase_unwrap = (0..PHASE_UNWRAP_LEN).map(|_| rng.centered(1.0)).collect();
        let iq_samples = (0..IQ_SAMPLES_LEN).map(|_| rng.uniform(-1.0, 1.0)).collect();

        debug!(
            "BLE #{} {device_id} ch={channel} rssi={rssi_dbm:.1}dBm decoded={decoded}",
            self.frame_counter
        );

        BleFrame {
            frame_number: self.frame_counter,
            timestamp: Utc::now(),
            device_id: device_id.to_string(),
            placement,
            power_class,
            antenna,
            frequency_ghz: channel_frequency_ghz(channel),
            channel,
            rssi_dbm,
            signal_strength_pct: signal_strength_pct(rssi_dbm),
            decoded,
            bit_length,
            phase_unwrap,
            iq_samples,
        }
    }
}

/// ~30 % 9 dBm, ~20 % 6 dBm, rest 3 dBm. 0 dBm is never drawn.
fn draw_power_class(rng: &mut impl UniformSource) -> PowerClass {
    let u = rng.next_f64();
    if u < 0.3 {
        PowerClass::Dbm9
    } else if u < 0.5 {
        PowerClass::Dbm6
    } else {
        PowerClass::Dbm3
    }
}
