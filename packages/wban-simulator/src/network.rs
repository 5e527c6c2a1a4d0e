//! network.rs — Per-patient network reading
//!
//! One tick for one patient: a frame per catalog sensor, vitals per frame,
//! one aggregated reading plus network statistics.
//!
//! The generator owns every piece of mutable state (frame counter, noise
//! factors, last readings, random source). Use one instance per update stream.

use rand::rngs::StdRng;
use tracing::{debug, warn};
use wban_types::{
    BleFrame, ConnectionStatus, NetworkReading, NetworkStats, Placement, VitalsReading,
    ENCRYPTION_STATUS, SENSOR_CATALOG,
};

use crate::aggregator::aggregate;
use crate::ble_frame::{FrameSynthesizer, RadioConfig};
use crate::error::Result;
use crate::random::{RngSource, UniformSource};
use crate::vitals::VitalsEngine;

pub struct WbanGenerator<S: UniformSource> {
    rng: S,
    frames: FrameSynthesizer,
    vitals: VitalsEngine,
}

impl WbanGenerator<RngSource<StdRng>> {
    pub fn seeded(cfg: RadioConfig, seed: u64) -> Self {
        Self::new(cfg, RngSource::seeded(seed))
    }

    pub fn from_entropy(cfg: RadioConfig) -> Self {
        Self::new(cfg, RngSource::from_entropy())
    }
}

impl<S: UniformSource> WbanGenerator<S> {
    pub fn new(cfg: RadioConfig, rng: S) -> Self {
        Self {
            rng,
            frames: FrameSynthesizer::new(cfg),
            vitals: VitalsEngine::new(),
        }
    }

    pub fn frame_counter(&self) -> u64 {
        self.frames.frame_counter()
    }

    pub fn last_reading(&self, device_id: &str) -> Option<&VitalsReading> {
        self.vitals.last_reading(device_id)
    }

    pub fn generate_frame(&mut self, device_id: &str, placement: Placement) -> BleFrame {
        self.frames.generate_frame(&mut self.rng, device_id, placement)
    }

    pub fn derive_vitals(&mut self, frame: &BleFrame) -> VitalsReading {
        let counter = self.frames.frame_counter();
        self.vitals.derive_vitals(&mut self.rng, frame, counter)
    }

    /// One tick for `patient_id` across the whole sensor catalog.
    ///
    /// Only fails if the catalog were empty, which it is not by construction.
    pub fn generate_network_reading(&mut self, patient_id: &str) -> Result<NetworkReading> {
        let mut frames = Vec::with_capacity(SENSOR_CATALOG.len());
        let mut readings = Vec::with_capacity(SENSOR_CATALOG.len());

        for position in &SENSOR_CATALOG {
            let frame = self.generate_frame(&position.device_id(patient_id), position.placement);
            readings.push(self.derive_vitals(&frame));
            frames.push(frame);
        }

        let vitals = aggregate(&readings)?;
        let stats = network_stats(&frames);

        debug!(
            "{patient_id}: {}/{} active, rssi={:.1}dBm, hr={} q={:?}",
            stats.active_devices,
            stats.total_devices,
            stats.average_rssi_dbm,
            vitals.heart_rate,
            vitals.signal_quality
        );
        if vitals.connection != ConnectionStatus::Connected {
            warn!("{patient_id}: sensor network {:?}", vitals.connection);
        }

        Ok(NetworkReading {
            patient_id: patient_id.to_string(),
            vitals,
            frames,
            stats,
        })
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn network_stats(frames: &[BleFrame]) -> NetworkStats {
    let total = frames.len();
    let active = frames.iter().filter(|f| f.decoded).count();
    let (average_rssi_dbm, packet_loss_pct) = if total == 0 {
        (0.0, 0.0)
    } else {
        let mean = frames.iter().map(|f| f.rssi_dbm).sum::<f64>() / total as f64;
        let loss = (total - active) as f64 / total as f64 * 100.0;
        (round1(mean), round1(loss))
    };

    NetworkStats {
        total_devices: total,
        active_devices: active,
        average_rssi_dbm,
        packet_loss_pct,
        encryption_status: ENCRYPTION_STATUS.to_string(),
    }
}
