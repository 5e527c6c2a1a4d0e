//! config.rs — config.toml layout
//!
//! The file shipped next to the package is embedded as a fallback so the
//! simulator starts without one on disk.

use serde::Deserialize;
use tracing::warn;

use crate::ble_frame::RadioConfig;
use crate::error::{Result, WbanError};

pub const DEFAULT_CONFIG: &str = include_str!("../config.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct FullConfig {
    pub simulation: SimulationConfig,
    pub patients:   PatientsConfig,
    #[serde(default)]
    pub radio:      RadioConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    pub update_interval_ms: u64,
    #[serde(default = "default_history_len")]
    pub history_len: usize,
    /// Fixed seed for reproducible runs; entropy when absent
    pub seed: Option<u64>,
    #[serde(default = "default_ctrl_port")]
    pub ctrl_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatientsConfig {
    pub ids: Vec<String>,
}

fn default_history_len() -> usize { 120 }
fn default_ctrl_port() -> u16 { 9090 }

impl FullConfig {
    pub fn parse(raw: &str) -> Result<Self> {
        let cfg: FullConfig = toml::from_str(raw).map_err(|e| WbanError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads `path`, falling back to the embedded default when it is missing.
    pub fn load_or_default(path: &str) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(raw) => Self::parse(&raw),
            Err(e) => {
                warn!("config {path} not readable ({e}), using built-in defaults");
                Self::parse(DEFAULT_CONFIG)
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.simulation.update_interval_ms == 0 {
            return Err(WbanError::Config("update_interval_ms must be > 0".into()));
        }
        if self.patients.ids.is_empty() {
            return Err(WbanError::Config("at least one patient id is required".into()));
        }
        if self.patients.ids.iter().any(|id| id.trim().is_empty()) {
            return Err(WbanError::Config("patient ids must be non-empty".into()));
        }
        self.radio.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_default_parses() {
        let cfg = FullConfig::parse(DEFAULT_CONFIG).unwrap();
        assert_eq!(cfg.simulation.update_interval_ms, 2500);
        assert_eq!(cfg.simulation.history_len, 120);
        assert_eq!(cfg.simulation.seed, None);
        assert_eq!(cfg.patients.ids, ["P001", "P002", "P003"]);
        assert_eq!(cfg.radio.decode_success_rate, 0.95);
        assert_eq!(cfg.radio.base_rssi_dbm, -40.0);
    }

    #[test]
    fn radio_section_is_optional() {
        let cfg = FullConfig::parse(
            r#"
            [simulation]
            update_interval_ms = 2000
            seed = 7

            [patients]
            ids = ["A"]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.simulation.seed, Some(7));
        assert_eq!(cfg.simulation.ctrl_port, 9090);
        assert_eq!(cfg.radio.bit_length_max, 250);
    }

    #[test]
    fn rejects_bad_values() {
        let no_patients = r#"
            [simulation]
            update_interval_ms = 2000
            [patients]
            ids = []
        "#;
        assert!(matches!(FullConfig::parse(no_patients), Err(WbanError::Config(_))));

        let bad_radio = r#"
            [simulation]
            update_interval_ms = 2000
            [patients]
            ids = ["A"]
            [radio]
            decode_success_rate = 2.0
        "#;
        assert!(FullConfig::parse(bad_radio).is_err());

        assert!(FullConfig::parse("not toml [").is_err());
    }

    #[test]
    fn missing_file_falls_back() {
        let cfg = FullConfig::load_or_default("/nonexistent/wban.toml").unwrap();
        assert_eq!(cfg.patients.ids.len(), 3);
    }
}
