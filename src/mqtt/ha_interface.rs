use crate::config::MqttConfig;
use crate::models::Snapshot;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HaDevice {
    pub ids: String,
    pub name: String,
    pub manufacturer: String,
    pub model: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HaOrigin {
    pub name: String,
    pub sw_version: String,
}

fn is_empty_str(value: &String) -> bool {
    return value.is_empty();
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HaComponent {
    pub p: String,
    pub name: String,
    #[serde(skip_serializing_if = "is_empty_str", default)]
    pub device_class: String,
    #[serde(skip_serializing_if = "is_empty_str", default)]
    pub unit_of_measurement: String,
    pub value_template: String,
    pub unique_id: String,
    pub object_id: String,
    #[serde(skip_serializing_if = "is_empty_str", default)]
    pub state_class: String,
}

impl HaComponent {
    /// Plain text sensor without a device class
    pub fn new_text(device: &str, key: &str, name: &str, json_path: &str) -> Self {
        return HaComponent {
            p: "sensor".to_string(),
            name: name.to_string(),
            device_class: String::new(),
            unit_of_measurement: String::new(),
            value_template: format!("{{{{ value_json.{json_path} }}}}"),
            unique_id: format!("p1mqtt_{device}_{key}").to_lowercase(),
            object_id: format!("{device}_{key}").to_lowercase(),
            state_class: String::new(),
        }
    }

    pub fn new_measurement(device: &str, key: &str, name: &str, json_path: &str, dclass: &str, uof: &str, state_class: &str) -> Self {
        let mut component = HaComponent::new_text(device, key, name, json_path);
        component.device_class = dclass.to_string();
        component.unit_of_measurement = uof.to_string();
        component.state_class = state_class.to_string();
        return component;
    }

    pub fn new_energy(device: &str, key: &str, name: &str, json_path: &str) -> Self {
        return HaComponent::new_measurement(device, key, name, json_path, "energy", "kWh", "total");
    }

    pub fn new_power(device: &str, key: &str, name: &str, json_path: &str) -> Self {
        return HaComponent::new_measurement(device, key, name, json_path, "power", "kW", "measurement");
    }

    pub fn new_voltage(device: &str, key: &str, name: &str, json_path: &str) -> Self {
        return HaComponent::new_measurement(device, key, name, json_path, "voltage", "V", "measurement");
    }

    pub fn new_current(device: &str, key: &str, name: &str, json_path: &str) -> Self {
        return HaComponent::new_measurement(device, key, name, json_path, "current", "A", "measurement");
    }
}

#[derive(Serialize, Debug)]
pub struct HaDiscover {
    pub dev: HaDevice,
    pub o: HaOrigin,
    pub cmps: serde_json::Map<String, serde_json::Value>,
    pub state_topic: String,
    pub qos: u8,
    #[serde(skip_serializing)]
    pub discover_topic: String,
}

/// Splits the identification line, `/ISk5\2ME382-1003`, into the three
/// letter manufacturer flag and the rest
fn meter_identification(snapshot: &Snapshot) -> (String, String) {
    let header = snapshot
        .raw
        .line(0)
        .and_then(|line| line.strip_prefix('/').map(|h| h.to_string()));

    match header {
        Some(header) if header.len() > 3 && header.is_char_boundary(3) => {
            let (flag, model) = header.split_at(3);
            (flag.to_string(), model.strip_prefix('5').unwrap_or(model).to_string())
        }
        Some(header) => (header, String::new()),
        None => ("unknown".to_string(), String::new()),
    }
}

impl HaDiscover {
    pub fn new(config: &MqttConfig, device_id: &str, manufacturer: String, model: String) -> Self {
        return HaDiscover {
            discover_topic: format!("{}/device/p1mqtt_{}/config", config.discovery_prefix, device_id),
            dev: HaDevice {
                ids: format!("p1mqtt_{device_id}"),
                name: config.device_name.clone(),
                manufacturer: manufacturer,
                model: model,
            },
            o: HaOrigin {
                name: "p1mqtt".to_string(),
                sw_version: env!("CARGO_PKG_VERSION").to_string(),
            },
            cmps: serde_json::Map::new(),
            state_topic: config.topic.clone(),
            qos: config.qos,
        }
    }

    pub fn add_component(&mut self, key: &str, component: HaComponent) {
        match serde_json::to_value(component) {
            Ok(value) => { self.cmps.insert(key.to_string(), value); }
            Err(e) => log::warn!("Unable to serialize discovery component {key}: {e}"),
        }
    }

    /// Discovery document describing every sensor a snapshot can feed
    pub fn for_snapshot(config: &MqttConfig, snapshot: &Snapshot) -> Self {
        let device = snapshot.device_id();
        let (manufacturer, model) = meter_identification(snapshot);
        let mut disc = HaDiscover::new(config, &device, manufacturer, model);

        disc.add_component("electricity_equipment_id", HaComponent::new_text(
            &device, "electricity_equipment_id", "Electricity Equipment ID", "electricity.equipment_id"));

        for tariff in 0..2 {
            let key = format!("tariff{}_consumed", tariff + 1);
            disc.add_component(&key, HaComponent::new_energy(&device, &key,
                &format!("Energy Consumption (tariff {})", tariff + 1),
                &format!("electricity.tariffs[{tariff}].consumed")));

            let key = format!("tariff{}_produced", tariff + 1);
            disc.add_component(&key, HaComponent::new_energy(&device, &key,
                &format!("Energy Production (tariff {})", tariff + 1),
                &format!("electricity.tariffs[{tariff}].produced")));
        }

        disc.add_component("tariff", HaComponent::new_text(&device, "tariff", "Energy Tariff", "electricity.tariff"));
        disc.add_component("current_consumption", HaComponent::new_power(
            &device, "current_consumption", "Energy Consumption", "electricity.current_consumed"));
        disc.add_component("current_production", HaComponent::new_power(
            &device, "current_production", "Energy Production", "electricity.current_produced"));

        for phase in 0..3 {
            let key = format!("phase{}_instantaneous_voltage", phase + 1);
            disc.add_component(&key, HaComponent::new_voltage(&device, &key,
                &format!("Instantaneous voltage (phase {})", phase + 1),
                &format!("electricity.phases[{phase}].instantaneous_voltage")));

            let key = format!("phase{}_instantaneous_current", phase + 1);
            disc.add_component(&key, HaComponent::new_current(&device, &key,
                &format!("Instantaneous current (phase {})", phase + 1),
                &format!("electricity.phases[{phase}].instantaneous_current")));
        }

        disc.add_component("power_failures", HaComponent::new_measurement(&device, "power_failures",
            "Power Failures", "electricity.number_of_power_failures", "", "", "total_increasing"));
        disc.add_component("long_power_failures", HaComponent::new_measurement(&device, "long_power_failures",
            "Long Power Failures", "electricity.number_of_long_power_failures", "", "", "total_increasing"));

        disc.add_component("gas_equipment_id", HaComponent::new_text(
            &device, "gas_equipment_id", "Gas Equipment ID", "gas.equipment_id"));
        disc.add_component("gas_consumed", HaComponent::new_measurement(
            &device, "gas_consumed", "Gas Consumed", "gas.consumed", "gas", "m³", "total"));

        return disc;
    }

    pub fn get_dev_id(&self) -> String {
        return self.dev.ids.clone();
    }
}
