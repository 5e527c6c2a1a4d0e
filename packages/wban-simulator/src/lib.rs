//! # wban-simulator
//!
//! Signal-to-vitals simulation engine for the WBAN patient dashboard.
//!
//! - [`ble_frame`]: synthetic BLE frames per body sensor
//! - [`vitals`]: per-sensor vitals as bounded random walks, scaled by link quality
//! - [`aggregator`]: consensus reading across a patient's sensors
//! - [`network`]: [`WbanGenerator`], one tick per patient with network stats
//!
//! The `wban-sim` binary drives the generator on a timer and feeds the dashboard.

pub mod aggregator;
pub mod ble_frame;
pub mod config;
pub mod control;
pub mod error;
pub mod history;
pub mod network;
pub mod random;
pub mod vitals;

pub use aggregator::aggregate;
pub use ble_frame::{FrameSynthesizer, RadioConfig};
pub use error::{Result, WbanError};
pub use history::{HistoryBook, ReadingHistory};
pub use network::WbanGenerator;
pub use random::{FixedSequence, RngSource, UniformSource};
pub use vitals::VitalsEngine;
