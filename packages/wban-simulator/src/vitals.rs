//! vitals.rs — Per-sensor vitals derivation
//!
//! Turns one BLE frame into one `VitalsReading`:
//! 1. Classify link quality from RSSI + decode outcome
//! 2. Step the placement's vitals as a bounded random walk from the device's
//!    last reading (or the default on first sight); all other vitals take defaults
//! 3. Scale by the quality factor, round, clamp to the physiological band
//! 4. Battery from the generator-wide frame counter, connection status from signal strength
//! 5. Replace the device's last reading
//!
//! Step 5 must come after 2–4: the walk reads the previous reading.
//! One engine instance serves at most one update stream per device id at a time.

use std::collections::HashMap;

use tracing::debug;
use wban_types::{bands, BleFrame, ConnectionStatus, Placement, SignalQuality, VitalsReading};

use crate::random::UniformSource;

pub const MIN_BATTERY_PCT: f64 = 10.0;
const BATTERY_DRAIN_PER_FRAME: f64 = 0.01;

// ── Vital catalog ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vital {
    HeartRate,
    Systolic,
    Diastolic,
    OxygenSaturation,
    Temperature,
}

impl Vital {
    pub const ALL: [Vital; 5] = [
        Vital::HeartRate,
        Vital::Systolic,
        Vital::Diastolic,
        Vital::OxygenSaturation,
        Vital::Temperature,
    ];

    pub fn band(&self) -> (f64, f64) {
        match self {
            Self::HeartRate => bands::HEART_RATE,
            Self::Systolic => bands::SYSTOLIC,
            Self::Diastolic => bands::DIASTOLIC,
            Self::OxygenSaturation => bands::OXYGEN_SATURATION,
            Self::Temperature => bands::TEMPERATURE_F,
        }
    }

    /// Resting value used before a device has reported and for vitals its
    /// placement does not measure.
    pub fn default_value(&self) -> f64 {
        match self {
            Self::HeartRate => 72.0,
            Self::Systolic => 120.0,
            Self::Diastolic => 80.0,
            Self::OxygenSaturation => 98.0,
            Self::Temperature => 98.6,
        }
    }

    fn read(&self, r: &VitalsReading) -> f64 {
        match self {
            Self::HeartRate => r.heart_rate as f64,
            Self::Systolic => r.systolic as f64,
            Self::Diastolic => r.diastolic as f64,
            Self::OxygenSaturation => r.oxygen_saturation as f64,
            Self::Temperature => r.temperature_f,
        }
    }

    /// Temperature keeps one decimal; the rest are whole units.
    fn round(&self, v: f64) -> f64 {
        match self {
            Self::Temperature => (v * 10.0).round() / 10.0,
            _ => v.round(),
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

// ── Random-walk rules ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Walk {
    /// `last * stability + U(-a/2, a/2)`
    Decay { stability: f64, amplitude: f64 },
    /// `last + U(-a/2, a/2)`
    Additive { amplitude: f64 },
}

impl Walk {
    pub fn step(&self, last: f64, rng: &mut impl UniformSource, (lo, hi): (f64, f64)) -> f64 {
        let next = match *self {
            Walk::Decay { stability, amplitude } => last * stability + rng.centered(amplitude),
            Walk::Additive { amplitude } => last + rng.centered(amplitude),
        };
        next.clamp(lo, hi)
    }
}

/// Which vitals a placement drives, in draw order.
pub fn walk_rules(placement: Placement) -> &'static [(Vital, Walk)] {
    match placement {
        Placement::Chest => &[
            (Vital::HeartRate, Walk::Decay { stability: 0.8, amplitude: 10.0 }),
        ],
        Placement::Wrist => &[
            (Vital::HeartRate, Walk::Decay { stability: 0.9, amplitude: 10.0 }),
            (Vital::OxygenSaturation, Walk::Decay { stability: 0.95, amplitude: 2.0 }),
        ],
        Placement::Arm => &[
            (Vital::Systolic, Walk::Additive { amplitude: 8.0 }),
            (Vital::Diastolic, Walk::Additive { amplitude: 6.0 }),
        ],
        Placement::Head => &[
            (Vital::Temperature, Walk::Additive { amplitude: 0.5 }),
        ],
        Placement::TorsoBack => &[
            (Vital::HeartRate, Walk::Decay { stability: 0.7, amplitude: 10.0 }),
            (Vital::Temperature, Walk::Additive { amplitude: 0.5 }),
        ],
        Placement::TorsoFront => &[],
    }
}

// ── Classifications ───────────────────────────────────────────────────────────

/// Poor if RSSI < −70 dBm or the frame failed to decode, then fair / good /
/// excellent at −60 / −50 dBm.
pub fn classify_signal(frame: &BleFrame) -> SignalQuality {
    if frame.rssi_dbm < -70.0 || !frame.decoded {
        SignalQuality::Poor
    } else if frame.rssi_dbm < -60.0 {
        SignalQuality::Fair
    } else if frame.rssi_dbm < -50.0 {
        SignalQuality::Good
    } else {
        SignalQuality::Excellent
    }
}

pub fn connection_status(signal_strength_pct: f64) -> ConnectionStatus {
    if signal_strength_pct > 70.0 {
        ConnectionStatus::Connected
    } else if signal_strength_pct > 40.0 {
        ConnectionStatus::Weak
    } else {
        ConnectionStatus::Disconnected
    }
}

/// `max(10, 100 − frames × 0.01)`
pub fn battery_level(frame_counter: u64) -> f64 {
    (100.0 - frame_counter as f64 * BATTERY_DRAIN_PER_FRAME).max(MIN_BATTERY_PCT)
}

// ── Engine ────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct VitalsEngine {
    last_readings: HashMap<String, VitalsReading>,
}

impl VitalsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_reading(&self, device_id: &str) -> Option<&VitalsReading> {
        self.last_readings.get(device_id)
    }

    pub fn tracked_devices(&self) -> usize {
        self.last_readings.len()
    }

    /// `frames_generated` is the generator-wide frame counter at derivation
    /// time, not the frame's own number: battery must not recover when an
    /// older frame is derived late.
    pub fn derive_vitals(
        &mut self,
        rng: &mut impl UniformSource,
        frame: &BleFrame,
        frames_generated: u64,
    ) -> VitalsReading {
        let quality = classify_signal(frame);
        let last = self.last_readings.get(&frame.device_id);

        let mut values = Vital::ALL.map(|v| v.default_value());
        for (vital, walk) in walk_rules(frame.placement) {
            let prev = last.map_or_else(|| vital.default_value(), |r| vital.read(r));
            values[vital.index()] = walk.step(prev, rng, vital.band());
        }

        let factor = quality.vitals_factor();
        let finish = |vital: Vital| {
            let (lo, hi) = vital.band();
            vital.round(values[vital.index()] * factor).clamp(lo, hi)
        };

        let reading = VitalsReading {
            heart_rate: finish(Vital::HeartRate) as u16,
            systolic: finish(Vital::Systolic) as u16,
            diastolic: finish(Vital::Diastolic) as u16,
            oxygen_saturation: finish(Vital::OxygenSaturation) as u16,
            temperature_f: finish(Vital::Temperature),
            timestamp: frame.timestamp,
            signal_quality: quality,
            battery_pct: battery_level(frames_generated),
            connection: connection_status(frame.signal_strength_pct),
        };
        debug_assert!(reading.is_within_bands());

        debug!(
            "{} {:?} hr={} bp={}/{} spo2={} temp={:.1}",
            frame.device_id,
            quality,
            reading.heart_rate,
            reading.systolic,
            reading.diastolic,
            reading.oxygen_saturation,
            reading.temperature_f
        );

        self.last_readings.insert(frame.device_id.clone(), reading.clone());
        reading
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble_frame::signal_strength_pct;
    use crate::random::{FixedSequence, RngSource};
    use chrono::Utc;
    use wban_types::PowerClass;

    fn frame(device: &str, placement: Placement, rssi: f64, decoded: bool, n: u64) -> BleFrame {
        BleFrame {
            frame_number: n,
            timestamp: Utc::now(),
            device_id: device.to_string(),
            placement,
            power_class: PowerClass::Dbm6,
            antenna: 1,
            frequency_ghz: 2.44,
            channel: 19,
            rssi_dbm: rssi,
            signal_strength_pct: signal_strength_pct(rssi),
            decoded,
            bit_length: 200,
            phase_unwrap: vec![0.0; 5],
            iq_samples: vec![0.0; 10],
        }
    }

    #[test]
    fn quality_precedence() {
        let q = |rssi, decoded| classify_signal(&frame("d", Placement::Chest, rssi, decoded, 1));
        assert_eq!(q(-40.0, true), SignalQuality::Excellent);
        assert_eq!(q(-50.0, true), SignalQuality::Excellent);
        assert_eq!(q(-50.1, true), SignalQuality::Good);
        assert_eq!(q(-60.0, true), SignalQuality::Good);
        assert_eq!(q(-60.5, true), SignalQuality::Fair);
        assert_eq!(q(-70.0, true), SignalQuality::Fair);
        assert_eq!(q(-70.1, true), SignalQuality::Poor);
        assert_eq!(q(-35.0, false), SignalQuality::Poor);
    }

    #[test]
    fn connection_thresholds() {
        assert_eq!(connection_status(70.1), ConnectionStatus::Connected);
        assert_eq!(connection_status(70.0), ConnectionStatus::Weak);
        assert_eq!(connection_status(40.1), ConnectionStatus::Weak);
        assert_eq!(connection_status(40.0), ConnectionStatus::Disconnected);
    }

    #[test]
    fn battery_drains_and_floors() {
        assert!((battery_level(0) - 100.0).abs() < 1e-9);
        assert!((battery_level(1) - 99.99).abs() < 1e-9);
        assert!((battery_level(5000) - 50.0).abs() < 1e-9);
        assert_eq!(battery_level(9000), MIN_BATTERY_PCT);
        assert_eq!(battery_level(u64::MAX), MIN_BATTERY_PCT);
    }

    #[test]
    fn battery_follows_counter_not_frame_number() {
        let mut engine = VitalsEngine::new();
        let mut rng = FixedSequence::constant(0.5);
        let late = engine.derive_vitals(&mut rng, &frame("a", Placement::Head, -40.0, true, 502), 502);
        let stale = engine.derive_vitals(&mut rng, &frame("b", Placement::Head, -40.0, true, 1), 502);
        assert!((late.battery_pct - 94.98).abs() < 1e-9);
        assert_eq!(stale.battery_pct, late.battery_pct);
    }

    #[test]
    fn chest_first_reading_walks_from_default() {
        let mut engine = VitalsEngine::new();
        let mut rng = FixedSequence::constant(0.5);
        let r = engine.derive_vitals(&mut rng, &frame("P_chest", Placement::Chest, -40.0, true, 1), 1);

        // 72 * 0.8 + 0
        assert_eq!(r.heart_rate, 58);
        assert_eq!(r.systolic, 120);
        assert_eq!(r.diastolic, 80);
        assert_eq!(r.oxygen_saturation, 98);
        assert!((r.temperature_f - 98.6).abs() < 1e-9);
        assert_eq!(r.signal_quality, SignalQuality::Excellent);
        assert_eq!(r.connection, ConnectionStatus::Connected);
        assert_eq!(engine.last_reading("P_chest"), Some(&r));
    }

    #[test]
    fn second_reading_is_anchored_to_first() {
        let mut engine = VitalsEngine::new();
        let mut rng = FixedSequence::constant(0.5);
        engine.derive_vitals(&mut rng, &frame("w", Placement::Wrist, -40.0, true, 1), 1);
        let r2 = engine.derive_vitals(&mut rng, &frame("w", Placement::Wrist, -40.0, true, 2), 2);

        // First: hr 72*0.9 = 64.8 → 65, spo2 98*0.95 = 93.1 → 93
        // Second: hr 65*0.9 = 58.5 → 59 (round half away from zero), spo2 93*0.95 = 88.35 → 88
        assert_eq!(r2.heart_rate, 59);
        assert_eq!(r2.oxygen_saturation, 88);

        // Other devices are independent.
        let other = engine.derive_vitals(&mut rng, &frame("w2", Placement::Wrist, -40.0, true, 3), 3);
        assert_eq!(other.heart_rate, 65);
        assert_eq!(engine.tracked_devices(), 2);
    }

    #[test]
    fn walk_clamps_at_band_floor() {
        let mut engine = VitalsEngine::new();
        let mut rng = FixedSequence::constant(0.5);
        let mut hr = 0;
        for n in 1..=10 {
            hr = engine
                .derive_vitals(&mut rng, &frame("c", Placement::Chest, -40.0, true, n), n)
                .heart_rate;
        }
        assert_eq!(hr, 50);
    }

    #[test]
    fn arm_walk_is_additive() {
        let mut engine = VitalsEngine::new();
        // systolic draw 0.75 → +2, diastolic draw 0.25 → −1.5
        let mut rng = FixedSequence::new(vec![0.75, 0.25]);
        let r = engine.derive_vitals(&mut rng, &frame("a", Placement::Arm, -40.0, true, 1), 1);
        assert_eq!(r.systolic, 122);
        assert_eq!(r.diastolic, 79); // 78.5 rounds up
        assert_eq!(r.heart_rate, 72);

        let r = engine.derive_vitals(&mut rng, &frame("a", Placement::Arm, -40.0, true, 2), 2);
        assert_eq!(r.systolic, 124);
        assert_eq!(r.diastolic, 78); // 77.5 → 78
    }

    #[test]
    fn head_walks_temperature_only() {
        let mut engine = VitalsEngine::new();
        // +0.2 °F
        let mut rng = FixedSequence::constant(0.9);
        let r = engine.derive_vitals(&mut rng, &frame("h", Placement::Head, -40.0, true, 1), 1);
        assert!((r.temperature_f - 98.8).abs() < 1e-9);
        assert_eq!(r.heart_rate, 72);
    }

    #[test]
    fn poor_quality_scaling_is_clamped_into_bands() {
        let mut engine = VitalsEngine::new();
        let mut rng = FixedSequence::constant(0.5);
        let r = engine.derive_vitals(&mut rng, &frame("t", Placement::TorsoBack, -40.0, false, 1), 1);

        assert_eq!(r.signal_quality, SignalQuality::Poor);
        // 72*0.7 = 50.4 → 35.28 after scaling, floored to the band
        assert_eq!(r.heart_rate, 50);
        // 120 * 0.7 = 84 → 90
        assert_eq!(r.systolic, 90);
        assert_eq!(r.diastolic, 60);
        assert_eq!(r.oxygen_saturation, 85);
        assert!((r.temperature_f - 95.0).abs() < 1e-9);
        assert!(r.is_within_bands());
    }

    #[test]
    fn good_quality_scales_by_095() {
        let mut engine = VitalsEngine::new();
        let mut rng = FixedSequence::constant(0.5);
        let r = engine.derive_vitals(&mut rng, &frame("g", Placement::TorsoFront, -55.0, true, 1), 1);
        assert_eq!(r.signal_quality, SignalQuality::Good);
        assert_eq!(r.heart_rate, 68); // 68.4
        assert_eq!(r.systolic, 114);
        assert_eq!(r.diastolic, 76);
        assert_eq!(r.oxygen_saturation, 93); // 93.1
    }

    #[test]
    fn bands_hold_for_random_sequences() {
        let placements = [
            Placement::Chest,
            Placement::Wrist,
            Placement::Arm,
            Placement::Head,
            Placement::TorsoBack,
            Placement::TorsoFront,
        ];
        let mut engine = VitalsEngine::new();
        let mut rng = RngSource::seeded(1234);
        let mut last_battery = 100.0;

        for n in 1..=20_000u64 {
            let placement = rng.pick(&placements);
            let rssi = rng.uniform(-90.0, -25.0);
            let decoded = rng.chance(0.9);
            let device = format!("dev{}", n % 11);
            let r = engine.derive_vitals(&mut rng, &frame(&device, placement, rssi, decoded, n), n);

            assert!(r.is_within_bands(), "{r:?}");
            assert!(r.battery_pct <= last_battery);
            assert!(r.battery_pct >= MIN_BATTERY_PCT);
            last_battery = r.battery_pct;
        }
        assert_eq!(last_battery, MIN_BATTERY_PCT);
    }
}
