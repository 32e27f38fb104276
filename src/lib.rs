//! DSMR/ESMR P1 smart meter telegram decoding
//!
//! This library frames P1 telegrams from a line source, decodes them into
//! typed snapshots and forwards them to MQTT.

pub mod config;
pub mod input;
pub mod metering_p1;
pub mod models;
pub mod mqtt;
pub mod obis_utils;

// Re-export common types for easier access
pub use config::Config;
pub use metering_p1::{P1Error, P1Manager, P1Reader};
pub use models::Snapshot;
pub use mqtt::{MqttManager, Transmission};
