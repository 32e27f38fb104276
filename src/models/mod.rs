use serde::{Deserialize, Serialize};
use chrono::{DateTime, Local};
use std::time::Duration;


/// One framed telegram, one entry per line with surrounding whitespace trimmed
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawTelegram {
    lines: Vec<Vec<u8>>,
}

impl RawTelegram {
    pub fn new(lines: Vec<Vec<u8>>) -> Self {
        RawTelegram { lines }
    }

    pub fn lines(&self) -> &[Vec<u8>] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Line `index` decoded as Latin-1, every byte maps to exactly one char
    pub fn line(&self, index: usize) -> Option<String> {
        self.lines.get(index).map(|l| latin1_to_string(l))
    }
}

pub fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Where the snapshot timestamp came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TimestampSource {
    #[default]
    Telegram,
    /// The telegram carried no 0-0:1.0.0 line, the time of decoding was used
    WallClock,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Tariff {
    /// Electricity delivered to the client in kWh (1-0:1.8.x)
    pub consumed: f64,
    /// Electricity delivered by the client in kWh (1-0:2.8.x)
    pub produced: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Phase {
    /// Number of voltage sags (1-0:32.32.0 / 52.32.0 / 72.32.0)
    pub voltage_sags: i64,
    /// Number of voltage swells (1-0:32.36.0 / 52.36.0 / 72.36.0)
    pub voltage_swells: i64,
    /// Instantaneous voltage in V (1-0:32.7.0 / 52.7.0 / 72.7.0)
    pub instantaneous_voltage: f64,
    /// Instantaneous current in A (1-0:31.7.0 / 51.7.0 / 71.7.0)
    pub instantaneous_current: f64,
    /// Instantaneous active power +P in kW (1-0:21.7.0 / 41.7.0 / 61.7.0)
    pub instantaneous_active_positive_power: f64,
    /// Instantaneous active power -P in kW (1-0:22.7.0 / 42.7.0 / 62.7.0)
    pub instantaneous_active_negative_power: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PowerFailure {
    /// Moment the power failure ended
    pub end: DateTime<Local>,
    pub duration: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Electricity {
    /// Equipment identifier (0-0:96.1.1)
    pub equipment_id: String,
    /// Tariff indicator (0-0:96.14.0)
    pub tariff: i64,
    /// Switch position in/out/enabled (0-0:96.3.10)
    pub switch_position: i64,
    /// Threshold in the unit of `threshold_unit` (0-0:17.0.0)
    pub threshold: f64,
    /// Declared unit of the threshold, kW or A
    pub threshold_unit: String,

    /// Per tariff readings, index 0 is tariff 1
    pub tariffs: Vec<Tariff>,

    /// Actual power delivered in kW (1-0:1.7.0)
    pub current_consumed: f64,
    /// Actual power produced in kW (1-0:2.7.0)
    pub current_produced: f64,

    /// Number of power failures in any phase (0-0:96.7.21)
    pub number_of_power_failures: i64,
    /// Number of long power failures in any phase (0-0:96.7.9)
    pub number_of_long_power_failures: i64,

    /// Per phase readings, index 0 is L1
    pub phases: Vec<Phase>,

    /// Power failure event log (1-0:99.97.0) in telegram order
    pub power_failures: Vec<PowerFailure>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Gas {
    /// Equipment identifier (0-1:96.1.0)
    pub equipment_id: String,
    /// Device type (0-1:24.1.0)
    pub device_type: i64,
    /// Valve position on/off/released (0-1:24.4.0)
    pub valve_position: i64,
    /// Gas delivered to the client in m3 (0-1:24.2.1 or 0-1:24.3.0)
    pub consumed: f64,
    pub measured_at: Option<DateTime<Local>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Message {
    /// Text message code (0-0:96.13.1)
    pub code: String,
    /// Text message (0-0:96.13.0)
    pub text: String,
}

/// A fully decoded telegram
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    /// P1 protocol version (1-3:0.2.8), missing in DSMR 2.2
    pub protocol_version: Option<String>,
    /// Telegram generation time (0-0:1.0.0)
    pub timestamp: DateTime<Local>,
    pub timestamp_source: TimestampSource,
    pub electricity: Electricity,
    pub gas: Gas,
    pub message: Message,
    #[serde(skip)]
    pub raw: RawTelegram,
}

impl Snapshot {
    pub fn new(raw: RawTelegram) -> Self {
        Snapshot {
            protocol_version: None,
            timestamp: Local::now(),
            timestamp_source: TimestampSource::WallClock,
            electricity: Electricity::default(),
            gas: Gas::default(),
            message: Message::default(),
            raw,
        }
    }

    /// Device name used for MQTT topics and discovery, the electricity
    /// equipment id when the meter sends one
    pub fn device_id(&self) -> String {
        if self.electricity.equipment_id.is_empty() {
            return "unknown".to_string();
        }
        self.electricity.equipment_id.clone()
    }
}
