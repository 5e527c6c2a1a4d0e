//! aggregator.rs — Consensus reading across a patient's sensors
//!
//! Base template: first excellent reading, else first non-poor, else first.
//! Heart rate is the rounded mean over readings reporting a positive rate.
//! Quality collapses to good/fair; connection to connected/weak/disconnected.

use wban_types::{ConnectionStatus, SignalQuality, VitalsReading};

use crate::error::{Result, WbanError};

pub fn aggregate(readings: &[VitalsReading]) -> Result<VitalsReading> {
    let base = select_base(readings).ok_or(WbanError::NoReadings)?;

    let rates: Vec<f64> = readings
        .iter()
        .filter(|r| r.heart_rate > 0)
        .map(|r| r.heart_rate as f64)
        .collect();
    let heart_rate = if rates.is_empty() {
        base.heart_rate
    } else {
        (rates.iter().sum::<f64>() / rates.len() as f64).round() as u16
    };

    let non_poor = readings.iter().filter(|r| !r.signal_quality.is_poor()).count();
    let signal_quality = if non_poor * 2 > readings.len() {
        SignalQuality::Good
    } else {
        SignalQuality::Fair
    };

    let connected = readings
        .iter()
        .filter(|r| r.connection == ConnectionStatus::Connected)
        .count();
    let connection = if connected == readings.len() {
        ConnectionStatus::Connected
    } else if connected > 0 {
        ConnectionStatus::Weak
    } else {
        ConnectionStatus::Disconnected
    };

    Ok(VitalsReading {
        heart_rate,
        signal_quality,
        connection,
        ..base.clone()
    })
}

fn select_base(readings: &[VitalsReading]) -> Option<&VitalsReading> {
    readings
        .iter()
        .find(|r| r.signal_quality == SignalQuality::Excellent)
        .or_else(|| readings.iter().find(|r| !r.signal_quality.is_poor()))
        .or_else(|| readings.first())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use wban_types::ConnectionStatus::{Connected, Disconnected, Weak};
    use wban_types::SignalQuality::{Excellent, Fair, Good, Poor};

    fn reading(hr: u16, sys: u16, q: SignalQuality, c: ConnectionStatus) -> VitalsReading {
        VitalsReading {
            heart_rate: hr,
            systolic: sys,
            diastolic: 80,
            oxygen_saturation: 98,
            temperature_f: 98.6,
            timestamp: Utc::now(),
            signal_quality: q,
            battery_pct: 99.0,
            connection: c,
        }
    }

    #[test]
    fn empty_input_is_rejected() {
        assert_eq!(aggregate(&[]), Err(WbanError::NoReadings));
    }

    #[test]
    fn single_reading_passes_through() {
        let r = reading(77, 131, Good, Connected);
        let agg = aggregate(std::slice::from_ref(&r)).unwrap();
        assert_eq!(agg.heart_rate, 77);
        assert_eq!(agg.systolic, 131);
        assert_eq!(agg.diastolic, r.diastolic);
        assert_eq!(agg.oxygen_saturation, r.oxygen_saturation);
        assert_eq!(agg.temperature_f, r.temperature_f);
        assert_eq!(agg.timestamp, r.timestamp);
        assert_eq!(agg.battery_pct, r.battery_pct);
        assert_eq!(agg.signal_quality, Good);
        assert_eq!(agg.connection, Connected);
    }

    #[test]
    fn base_prefers_first_excellent() {
        let rs = [
            reading(60, 100, Poor, Weak),
            reading(70, 110, Good, Connected),
            reading(80, 120, Excellent, Connected),
            reading(90, 130, Excellent, Connected),
        ];
        let agg = aggregate(&rs).unwrap();
        assert_eq!(agg.systolic, 120);
        assert_eq!(agg.heart_rate, 75);
    }

    #[test]
    fn base_falls_back_to_first_non_poor() {
        let rs = [
            reading(60, 100, Poor, Weak),
            reading(70, 110, Fair, Weak),
            reading(80, 120, Good, Weak),
        ];
        assert_eq!(aggregate(&rs).unwrap().systolic, 110);
    }

    #[test]
    fn all_poor_uses_first_and_reports_fair() {
        let rs = [
            reading(61, 101, Poor, Disconnected),
            reading(62, 102, Poor, Disconnected),
            reading(64, 103, Poor, Weak),
        ];
        let agg = aggregate(&rs).unwrap();
        assert_eq!(agg.systolic, 101);
        assert_eq!(agg.heart_rate, 62); // 62.33
        assert_eq!(agg.signal_quality, Fair);
        assert_eq!(agg.connection, Disconnected);
    }

    #[test]
    fn quality_needs_strict_majority() {
        let half = [reading(70, 120, Excellent, Connected), reading(70, 120, Poor, Connected)];
        assert_eq!(aggregate(&half).unwrap().signal_quality, Fair);

        let most = [
            reading(70, 120, Fair, Connected),
            reading(70, 120, Fair, Connected),
            reading(70, 120, Poor, Connected),
        ];
        assert_eq!(aggregate(&most).unwrap().signal_quality, Good);
    }

    #[test]
    fn connection_rollup() {
        let all = [reading(70, 120, Good, Connected), reading(70, 120, Good, Connected)];
        assert_eq!(aggregate(&all).unwrap().connection, Connected);

        let some = [reading(70, 120, Good, Disconnected), reading(70, 120, Good, Connected)];
        assert_eq!(aggregate(&some).unwrap().connection, Weak);

        let none = [reading(70, 120, Good, Weak), reading(70, 120, Good, Weak)];
        assert_eq!(aggregate(&none).unwrap().connection, Disconnected);
    }

    #[test]
    fn zero_heart_rates_are_ignored() {
        let rs = [reading(0, 120, Excellent, Connected), reading(81, 120, Good, Connected)];
        assert_eq!(aggregate(&rs).unwrap().heart_rate, 81);

        let none = [reading(0, 120, Good, Connected)];
        assert_eq!(aggregate(&none).unwrap().heart_rate, 0);
    }

    #[test]
    fn mean_rounds_half_up() {
        let rs = [reading(70, 120, Good, Connected), reading(71, 120, Good, Connected)];
        assert_eq!(aggregate(&rs).unwrap().heart_rate, 71);
    }
}
