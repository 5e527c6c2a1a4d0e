//! history.rs — Bounded per-patient reading history for the dashboard feed

use std::collections::{HashMap, VecDeque};

use serde::Serialize;
use wban_types::NetworkReading;

/// Ring buffer of the most recent readings of one patient.
#[derive(Debug, Clone)]
pub struct ReadingHistory {
    capacity: usize,
    readings: VecDeque<NetworkReading>,
}

/// Aggregated heart rate over the retained window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeartRateSummary {
    pub min: u16,
    pub max: u16,
    pub mean: f64,
    pub samples: usize,
}

impl ReadingHistory {
    /// A capacity of zero is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { capacity, readings: VecDeque::with_capacity(capacity) }
    }

    pub fn push(&mut self, reading: NetworkReading) {
        if self.readings.len() == self.capacity {
            self.readings.pop_front();
        }
        self.readings.push_back(reading);
    }

    pub fn latest(&self) -> Option<&NetworkReading> {
        self.readings.back()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &NetworkReading> {
        self.readings.iter()
    }

    pub fn len(&self) -> usize { self.readings.len() }
    pub fn is_empty(&self) -> bool { self.readings.is_empty() }
    pub fn capacity(&self) -> usize { self.capacity }

    pub fn heart_rate_summary(&self) -> Option<HeartRateSummary> {
        let rates = self.readings.iter().map(|r| r.vitals.heart_rate);
        let min = rates.clone().min()?;
        let max = rates.clone().max()?;
        let samples = self.readings.len();
        let mean = rates.map(f64::from).sum::<f64>() / samples as f64;
        Some(HeartRateSummary { min, max, mean, samples })
    }
}

/// One `ReadingHistory` per patient id.
#[derive(Debug)]
pub struct HistoryBook {
    capacity: usize,
    patients: HashMap<String, ReadingHistory>,
}

impl HistoryBook {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, patients: HashMap::new() }
    }

    pub fn record(&mut self, reading: NetworkReading) {
        let capacity = self.capacity;
        self.patients
            .entry(reading.patient_id.clone())
            .or_insert_with(|| ReadingHistory::new(capacity))
            .push(reading);
    }

    pub fn patient(&self, patient_id: &str) -> Option<&ReadingHistory> {
        self.patients.get(patient_id)
    }

    pub fn latest(&self) -> impl Iterator<Item = &NetworkReading> {
        self.patients.values().filter_map(|h| h.latest())
    }

    pub fn clear(&mut self) {
        self.patients.clear();
    }
}
