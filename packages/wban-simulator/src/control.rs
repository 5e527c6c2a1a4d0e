//! control.rs — Commands accepted on the dashboard WebSocket
//!
//! Commands are JSON: `{ "cmd": "...", "args": {...} }`. `args` may be
//! absent, null or an object; commands without arguments ignore it.

use serde::Deserialize;
use serde_json::Value;

pub const MIN_INTERVAL_MS: u64 = 250;
pub const MAX_INTERVAL_MS: u64 = 60_000;

#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    Pause,
    Resume,
    /// New generator: frame counter, battery and walk state start over
    Reset,
    SetInterval { interval_ms: u64 },
}

#[derive(Deserialize)]
struct RawCommand {
    cmd: String,
    #[serde(default)]
    args: Value,
}

#[derive(Deserialize)]
struct IntervalArgs {
    interval_ms: u64,
}

impl ControlCommand {
    pub fn parse(raw: &str) -> Option<Self> {
        let RawCommand { cmd, args } = serde_json::from_str(raw).ok()?;
        match cmd.as_str() {
            "pause" => Some(Self::Pause),
            "resume" => Some(Self::Resume),
            "reset" => Some(Self::Reset),
            "set_interval" => {
                let IntervalArgs { interval_ms } = serde_json::from_value(args).ok()?;
                Some(Self::SetInterval { interval_ms })
            }
            _ => None,
        }
    }
}

pub fn clamp_interval(ms: u64) -> u64 {
    ms.clamp(MIN_INTERVAL_MS, MAX_INTERVAL_MS)
}
