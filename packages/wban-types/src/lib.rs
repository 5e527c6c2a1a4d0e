//! # wban-types
//!
//! Shared record types for the WBAN patient-monitoring simulator.
//!
//! These types are used by:
//! - `wban-simulator`: producing BLE frames, per-sensor vitals and network readings
//! - the browser dashboard: consuming `NetworkReading` JSON from the `/ws` feed
//!
//! ## Units
//!
//! - RSSI in dBm (more negative = weaker), carrier frequency in GHz
//! - Heart rate in beats/min, blood pressure in mmHg, SpO₂ in percent
//! - Body temperature in degrees Fahrenheit
//!
//! ## Invariants
//! - Every vital in a `VitalsReading` lies inside its band in [`bands`]
//! - `signal_strength_pct` is always within [0, 100]
//! - Frame numbers are strictly increasing per generator, starting at 1

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Placement & Sensor Catalog ────────────────────────────────────────────────

/// Anatomical placement of a body-worn sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    Head,
    Arm,
    Wrist,
    Chest,
    TorsoFront,
    TorsoBack,
}

impl Placement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Head => "head",
            Self::Arm => "arm",
            Self::Wrist => "wrist",
            Self::Chest => "chest",
            Self::TorsoFront => "torso_front",
            Self::TorsoBack => "torso_back",
        }
    }
}

/// One entry of the static sensor catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SensorPosition {
    /// Short identifier, used as the suffix of the device id
    pub id: &'static str,
    /// Label shown on the dashboard
    pub name: &'static str,
    pub placement: Placement,
    /// 1 = most important
    pub priority: u8,
}

impl SensorPosition {
    /// Device id for this sensor on a given patient: `{patient}_{position}`.
    pub fn device_id(&self, patient_id: &str) -> String {
        format!("{patient_id}_{}", self.id)
    }
}

/// Fixed sensor layout worn by every patient, in reporting order.
pub const SENSOR_CATALOG: [SensorPosition; 6] = [
    SensorPosition { id: "chest",      name: "Chest ECG",    placement: Placement::Chest,     priority: 1 },
    SensorPosition { id: "wrist_l",    name: "Left Wrist",   placement: Placement::Wrist,     priority: 2 },
    SensorPosition { id: "wrist_r",    name: "Right Wrist",  placement: Placement::Wrist,     priority: 2 },
    SensorPosition { id: "head",       name: "Head Monitor", placement: Placement::Head,      priority: 3 },
    SensorPosition { id: "arm_l",      name: "Left Arm BP",  placement: Placement::Arm,       priority: 2 },
    SensorPosition { id: "torso_back", name: "Back Monitor", placement: Placement::TorsoBack, priority: 4 },
];

// ── Radio Classifications ─────────────────────────────────────────────────────

/// Transmit-power class of a BLE frame.
/// `Dbm0` is part of the wire vocabulary but the generator never selects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerClass {
    #[serde(rename = "9dbm")]
    Dbm9,
    #[serde(rename = "6dbm")]
    Dbm6,
    #[serde(rename = "3dbm")]
    Dbm3,
    #[serde(rename = "0dbm")]
    Dbm0,
}

impl PowerClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dbm9 => "9dbm",
            Self::Dbm6 => "6dbm",
            Self::Dbm3 => "3dbm",
            Self::Dbm0 => "0dbm",
        }
    }
}

/// Coarse link-quality classification. Ordered: `Poor < Fair < Good < Excellent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalQuality {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl SignalQuality {
    /// Multiplier applied to every derived vital for this link quality.
    pub fn vitals_factor(&self) -> f64 {
        match self {
            Self::Excellent => 1.0,
            Self::Good => 0.95,
            Self::Fair => 0.85,
            Self::Poor => 0.7,
        }
    }

    pub fn is_poor(&self) -> bool { *self == Self::Poor }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connected,
    Weak,
    Disconnected,
}

// ── BLE Frame ─────────────────────────────────────────────────────────────────

/// One synthetic BLE transmission from a body sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BleFrame {
    /// Generator-wide sequence number, starting at 1
    pub frame_number: u64,
    pub timestamp: DateTime<Utc>,
    /// `{patient}_{position}`
    pub device_id: String,
    pub placement: Placement,
    pub power_class: PowerClass,
    /// Antenna index, 1–4
    pub antenna: u8,
    /// Carrier frequency in GHz, derived from `channel`
    pub frequency_ghz: f64,
    pub channel: u8,
    pub rssi_dbm: f64,
    /// RSSI mapped onto 0–100
    pub signal_strength_pct: f64,
    /// Whether the receiver decoded the frame
    pub decoded: bool,
    pub bit_length: u32,
    /// Placeholder phase-unwrap trace (5 values)
    pub phase_unwrap: Vec<f64>,
    /// Placeholder I/Q samples (10 values)
    pub iq_samples: Vec<f64>,
}

// ── Vitals ────────────────────────────────────────────────────────────────────

/// Physiological bands every published vital is clamped to.
pub mod bands {
    pub const HEART_RATE: (f64, f64) = (50.0, 150.0);
    pub const SYSTOLIC: (f64, f64) = (90.0, 180.0);
    pub const DIASTOLIC: (f64, f64) = (60.0, 120.0);
    pub const OXYGEN_SATURATION: (f64, f64) = (85.0, 100.0);
    pub const TEMPERATURE_F: (f64, f64) = (95.0, 104.0);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalsReading {
    /// Beats per minute
    pub heart_rate: u16,
    /// mmHg
    pub systolic: u16,
    /// mmHg
    pub diastolic: u16,
    /// Percent
    pub oxygen_saturation: u16,
    /// Degrees Fahrenheit, one decimal
    pub temperature_f: f64,
    pub timestamp: DateTime<Utc>,
    pub signal_quality: SignalQuality,
    /// Percent, non-increasing over a generator's lifetime, never below 10
    pub battery_pct: f64,
    pub connection: ConnectionStatus,
}

impl VitalsReading {
    /// True when every vital sits inside its band.
    pub fn is_within_bands(&self) -> bool {
        let inside = |v: f64, (lo, hi): (f64, f64)| v >= lo && v <= hi;
        inside(self.heart_rate as f64, bands::HEART_RATE)
            && inside(self.systolic as f64, bands::SYSTOLIC)
            && inside(self.diastolic as f64, bands::DIASTOLIC)
            && inside(self.oxygen_saturation as f64, bands::OXYGEN_SATURATION)
            && inside(self.temperature_f, bands::TEMPERATURE_F)
    }
}

// ── Network Reading (engine → dashboard) ─────────────────────────────────────

/// Informational label only; no encryption happens in the simulator.
pub const ENCRYPTION_STATUS: &str = "AES-128 (simulated)";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkStats {
    /// Sensors in the catalog
    pub total_devices: usize,
    /// Sensors whose frame decoded this tick
    pub active_devices: usize,
    /// Mean RSSI over all frames this tick, one decimal
    pub average_rssi_dbm: f64,
    /// `(total - active) / total * 100`, one decimal
    pub packet_loss_pct: f64,
    pub encryption_status: String,
}

/// Everything the dashboard needs for one patient for one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkReading {
    pub patient_id: String,
    /// Consensus reading across all sensors
    pub vitals: VitalsReading,
    /// One frame per catalog entry, in catalog order
    pub frames: Vec<BleFrame>,
    pub stats: NetworkStats,
}
