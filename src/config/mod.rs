use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no config found, tried {0}")]
    NotFound(String),
    #[error("unable to read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("unable to parse config: {0}")]
    Parse(#[from] serde_yml::Error),
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Serial,
    File,
    Network,
}

fn serial_port_default() -> String { return "/dev/ttyUSB0".to_string() }
fn serial_baud_rate_default() -> u32 { return 115200 }
fn serial_data_bits_default() -> u8 { return 8 }
fn serial_stop_bits_default() -> u8 { return 1 }
fn serial_parity_default() -> String { return "N".to_string() }
fn serial_timeout_ms_default() -> u64 { return 30000 }

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct SerialConfig {
    #[serde(default="serial_port_default")]
    pub port: String,
    #[serde(default="serial_baud_rate_default")]
    pub baud_rate: u32,
    #[serde(default="serial_data_bits_default")]
    pub data_bits: u8,
    #[serde(default="serial_stop_bits_default")]
    pub stop_bits: u8,
    #[serde(default="serial_parity_default")]
    pub parity: String,
    /// A read blocking longer than this ends the stream
    #[serde(default="serial_timeout_ms_default")]
    pub timeout_ms: u64,
}

fn file_repeat_default() -> bool { return false }
fn file_repeat_delay_ms_default() -> u64 { return 10000 }

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct FileConfig {
    pub filename: String,
    #[serde(default="file_repeat_default")]
    pub repeat: bool,
    #[serde(default="file_repeat_delay_ms_default")]
    pub repeat_delay_ms: u64,
}

fn network_dial_timeout_ms_default() -> u64 { return 10000 }
fn network_read_timeout_ms_default() -> u64 { return 0 }

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct NetworkConfig {
    pub address: String,
    #[serde(default="network_dial_timeout_ms_default")]
    pub dial_timeout_ms: u64,
    /// 0 disables the read deadline
    #[serde(default="network_read_timeout_ms_default")]
    pub read_timeout_ms: u64,
}

fn serial_default() -> SerialConfig {
    return SerialConfig {
        port: serial_port_default(),
        baud_rate: serial_baud_rate_default(),
        data_bits: serial_data_bits_default(),
        stop_bits: serial_stop_bits_default(),
        parity: serial_parity_default(),
        timeout_ms: serial_timeout_ms_default(),
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct InputConfig {
    #[serde(rename = "type")]
    pub input_type: InputType,
    #[serde(default="serial_default")]
    pub serial: SerialConfig,
    pub file: Option<FileConfig>,
    pub network: Option<NetworkConfig>,
}

fn mqtt_port_default() -> u16 { return 1883 }
fn mqtt_user_default() -> String { return "".to_string() }
fn mqtt_client_name_default() -> String { return "p1mqtt".to_string() }
fn mqtt_topic_default() -> String { return "p1mqtt/telegram".to_string() }
fn mqtt_qos_default() -> u8 { return 1 }
fn mqtt_ha_enabled_default() -> bool { return false }
fn mqtt_discovery_prefix_default() -> String { return "homeassistant".to_string() }
fn mqtt_device_name_default() -> String { return "Smart Meter".to_string() }

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct MqttConfig {
    pub host: String,
    #[serde(default="mqtt_port_default")]
    pub port: u16,
    #[serde(default="mqtt_user_default")]
    pub user: String,
    #[serde(default="mqtt_user_default")]
    pub pass: String,
    #[serde(default="mqtt_client_name_default")]
    pub client_name: String,
    #[serde(default="mqtt_topic_default")]
    pub topic: String,
    #[serde(default="mqtt_qos_default")]
    pub qos: u8,
    #[serde(default="mqtt_ha_enabled_default")]
    pub ha_enabled: bool,
    #[serde(default="mqtt_discovery_prefix_default")]
    pub discovery_prefix: String,
    #[serde(default="mqtt_device_name_default")]
    pub device_name: String,
}

fn json_output_default() -> bool { return false }

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Config {
    pub input: InputConfig,
    pub mqtt: Option<MqttConfig>,
    #[serde(default="json_output_default")]
    pub json_output: bool,
}

impl Config {
    /// Loads the config from `P1_CONFIG`, `config/p1mqtt.yaml` or `p1mqtt.yaml`,
    /// whichever exists first
    pub fn load() -> Result<Self, ConfigError> {
        let mut candidates: Vec<PathBuf> = Vec::new();
        if let Ok(path) = std::env::var("P1_CONFIG") {
            candidates.push(PathBuf::from(path));
        }
        candidates.push(PathBuf::from("config/p1mqtt.yaml"));
        candidates.push(PathBuf::from("p1mqtt.yaml"));

        Self::load_first(&candidates)
    }

    fn load_first(candidates: &[PathBuf]) -> Result<Self, ConfigError> {
        match candidates.iter().find(|p| p.is_file()) {
            Some(path) => Self::from_path(path),
            None => {
                let tried: Vec<String> = candidates.iter().map(|p| p.display().to_string()).collect();
                Err(ConfigError::NotFound(tried.join(", ")))
            }
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        info!("Loading config from {}", path.display());
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(contents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_minimal_serial_config_uses_defaults() {
        let config = Config::from_yaml("input:\n  type: serial\n").unwrap();
        assert_eq!(config.input.input_type, InputType::Serial);
        assert_eq!(config.input.serial, serial_default());
        assert_eq!(config.input.serial.baud_rate, 115200);
        assert_eq!(config.mqtt, None);
        assert!(!config.json_output);
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
input:
  type: network
  serial:
    port: /dev/ttyAMA0
    baud_rate: 9600
    data_bits: 7
    parity: E
  network:
    address: 192.168.1.20:8088
    read_timeout_ms: 5000
mqtt:
  host: broker.local
  user: meter
  pass: secret
  ha_enabled: true
json_output: true
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.input.input_type, InputType::Network);
        assert_eq!(config.input.serial.data_bits, 7);
        assert_eq!(config.input.serial.parity, "E");
        assert_eq!(config.input.serial.stop_bits, 1);

        let network = config.input.network.unwrap();
        assert_eq!(network.address, "192.168.1.20:8088");
        assert_eq!(network.dial_timeout_ms, 10000);
        assert_eq!(network.read_timeout_ms, 5000);

        let mqtt = config.mqtt.unwrap();
        assert_eq!(mqtt.port, 1883);
        assert_eq!(mqtt.topic, "p1mqtt/telegram");
        assert_eq!(mqtt.discovery_prefix, "homeassistant");
        assert!(mqtt.ha_enabled);
        assert!(config.json_output);
    }

    #[test]
    fn test_unknown_input_type_is_rejected() {
        assert!(matches!(
            Config::from_yaml("input:\n  type: carrier-pigeon\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_first_existing_candidate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p1mqtt.yaml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "input:\n  type: file\n  file:\n    filename: telegrams.txt\n    repeat: true").unwrap();

        let missing = dir.path().join("missing.yaml");
        let config = Config::load_first(&[missing, path]).unwrap();
        let file_config = config.input.file.unwrap();
        assert_eq!(file_config.filename, "telegrams.txt");
        assert!(file_config.repeat);
        assert_eq!(file_config.repeat_delay_ms, 10000);
    }

    #[test]
    fn test_load_first_reports_all_candidates() {
        let err = Config::load_first(&[PathBuf::from("nope-a.yaml"), PathBuf::from("nope-b.yaml")]).unwrap_err();
        assert_eq!(err.to_string(), "no config found, tried nope-a.yaml, nope-b.yaml");
    }
}
