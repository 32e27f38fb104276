pub mod ha_interface;

use crate::config::MqttConfig;
use crate::models::Snapshot;
use crate::mqtt::ha_interface::HaDiscover;
use log::{debug, error, info, warn};
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::mpsc::{Receiver, Sender};

#[derive(Debug, Clone, PartialEq)]
pub struct PublishData {
    pub topic: String,
    pub payload: String,
    pub qos: u8,
    pub retain: bool,
}

pub enum Transmission {
    Snapshot(Box<Snapshot>),
    Publish(PublishData),
}

fn to_qos(qos: u8) -> QoS {
    match qos {
        0 => QoS::AtMostOnce,
        1 => QoS::AtLeastOnce,
        2 => QoS::ExactlyOnce,
        _ => QoS::AtMostOnce,
    }
}

/// Turns transmissions into MQTT publications. Discovery for a meter is
/// announced once, ahead of its first snapshot.
pub struct PublishPlanner {
    config: MqttConfig,
    announced: HashSet<String>,
}

impl PublishPlanner {
    pub fn new(config: MqttConfig) -> Self {
        Self { config, announced: HashSet::new() }
    }

    pub fn plan(&mut self, transmission: Transmission) -> Vec<PublishData> {
        let snapshot = match transmission {
            Transmission::Publish(data) => return vec![data],
            Transmission::Snapshot(snapshot) => snapshot,
        };

        let mut publications = Vec::new();
        if self.config.ha_enabled && self.announced.insert(snapshot.device_id()) {
            let disc = HaDiscover::for_snapshot(&self.config, &snapshot);
            info!("Announcing {} to Home Assistant", disc.get_dev_id());
            match serde_json::to_string(&disc) {
                Ok(payload) => publications.push(PublishData {
                    topic: disc.discover_topic.clone(),
                    payload,
                    qos: self.config.qos,
                    retain: true,
                }),
                Err(e) => error!("Unable to serialize discovery document: {e}"),
            }
        }

        match serde_json::to_string(&snapshot) {
            Ok(payload) => publications.push(PublishData {
                topic: self.config.topic.clone(),
                payload,
                qos: self.config.qos,
                retain: false,
            }),
            Err(e) => error!("Unable to serialize snapshot: {e}"),
        }

        publications
    }
}

pub struct MqttManager {
    rx: Receiver<Transmission>,
    client: AsyncClient,
    planner: PublishPlanner,
}

impl MqttManager {
    /// Connects lazily; the event loop task keeps retrying in the background
    pub fn new(config: &MqttConfig) -> (Self, Sender<Transmission>) {
        let (mtx, mrx) = tokio::sync::mpsc::channel(100);

        info!("MQTT connection to {}:{} starting up", config.host, config.port);
        let mut mqttoptions = MqttOptions::new(config.client_name.clone(), config.host.clone(), config.port);
        mqttoptions.set_keep_alive(Duration::from_secs(5));
        if !config.user.is_empty() {
            mqttoptions.set_credentials(config.user.clone(), config.pass.clone());
        }

        let (client, mut eventloop) = AsyncClient::new(mqttoptions, 10);

        tokio::spawn(async move {
            info!("MQTT Eventloop started");
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!("Connected to MQTT broker");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!("Error in MQTT {:?}, reconnecting", e);
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });

        (
            MqttManager {
                rx: mrx,
                client,
                planner: PublishPlanner::new(config.clone()),
            },
            mtx,
        )
    }

    /// Publishes until every sender is gone
    pub async fn start_thread(&mut self) {
        while let Some(transmission) = self.rx.recv().await {
            for data in self.planner.plan(transmission) {
                let topic = data.topic.clone();
                match self
                    .client
                    .publish(data.topic, to_qos(data.qos), data.retain, data.payload)
                    .await
                {
                    Err(e) => warn!("Error publishing to {topic}: {e}"),
                    Ok(_) => debug!("Published to {topic}"),
                }
            }
        }

        info!("Transmission channel closed, MQTT thread exits");
    }
}

/// Queues the retained `online` marker on `<topic>/status`. Returns false
/// when the MQTT thread is gone.
pub async fn publish_status(mqtt_sender: &Sender<Transmission>, config: &MqttConfig) -> bool {
    let status = PublishData {
        topic: format!("{}/status", config.topic),
        payload: "online".to_string(),
        qos: config.qos,
        retain: true,
    };
    match mqtt_sender.send(Transmission::Publish(status)).await {
        Ok(_) => true,
        Err(e) => {
            warn!("Unable to queue the status message: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::metering_p1::decoder::decode;
    use crate::metering_p1::test_telegrams::{raw_telegram, DSMR40, ESMR50};

    fn planner(ha_enabled: bool) -> PublishPlanner {
        let yaml = format!("input:\n  type: serial\nmqtt:\n  host: localhost\n  qos: 2\n  ha_enabled: {ha_enabled}\n");
        PublishPlanner::new(Config::from_yaml(&yaml).unwrap().mqtt.unwrap())
    }

    fn snapshot(telegram: &str) -> Transmission {
        Transmission::Snapshot(Box::new(decode(raw_telegram(telegram)).unwrap()))
    }

    #[test]
    fn test_snapshot_is_published_as_json() {
        let publications = planner(false).plan(snapshot(ESMR50));
        assert_eq!(publications.len(), 1);

        let data = &publications[0];
        assert_eq!(data.topic, "p1mqtt/telegram");
        assert_eq!(data.qos, 2);
        assert!(!data.retain);

        let json: serde_json::Value = serde_json::from_str(&data.payload).unwrap();
        assert_eq!(json["protocol_version"], "50");
        assert_eq!(json["electricity"]["phases"][1]["instantaneous_voltage"], 230.5);
        assert!(json.get("raw").is_none());
    }

    #[test]
    fn test_discovery_is_announced_once_per_meter() {
        let mut planner = planner(true);

        let first = planner.plan(snapshot(DSMR40));
        assert_eq!(first.len(), 2);
        assert!(first[0].topic.starts_with("homeassistant/device/p1mqtt_"));
        assert!(first[0].retain);
        assert_eq!(first[1].topic, "p1mqtt/telegram");

        assert_eq!(planner.plan(snapshot(DSMR40)).len(), 1);
        assert_eq!(planner.plan(snapshot(ESMR50)).len(), 2);
    }

    #[test]
    fn test_publish_passes_through() {
        let data = PublishData { topic: "p1mqtt/status".to_string(), payload: "online".to_string(), qos: 0, retain: true };
        assert_eq!(planner(true).plan(Transmission::Publish(data.clone())), vec![data]);
    }

    #[test]
    fn test_qos_mapping() {
        assert_eq!(to_qos(0), QoS::AtMostOnce);
        assert_eq!(to_qos(1), QoS::AtLeastOnce);
        assert_eq!(to_qos(2), QoS::ExactlyOnce);
        assert_eq!(to_qos(7), QoS::AtMostOnce);
    }

    #[test]
    fn test_publish_status() {
        let config = planner(false).config;
        let runtime = tokio::runtime::Runtime::new().unwrap();

        let (tx, mut rx) = tokio::sync::mpsc::channel(1);
        assert!(runtime.block_on(publish_status(&tx, &config)));
        match rx.try_recv() {
            Ok(Transmission::Publish(data)) => {
                assert_eq!(data.topic, "p1mqtt/telegram/status");
                assert_eq!(data.payload, "online");
                assert!(data.retain);
            }
            _ => panic!("expected a status publication"),
        }

        drop(rx);
        assert!(!runtime.block_on(publish_status(&tx, &config)));
    }
}
