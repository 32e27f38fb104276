use super::meter_definitions::get_field_definition;
use super::obis_parser::parse_obis_line;
use super::structs::{FieldDefinition, FieldHandler, IntegerTarget, QuantityTarget, TextTarget};
use super::sub_parsers::{parse_gas_reading, parse_legacy_gas_reading, parse_power_failure_log};
use super::utils::{parse_dst_timestamp, parse_integer, parse_quantity};
use super::P1Error;
use crate::models::{Phase, RawTelegram, Snapshot, Tariff, TimestampSource};
use crate::obis_utils;
use log::debug;

/// Decodes a framed telegram. The first field that fails to decode aborts
/// the whole telegram.
pub fn decode(raw: RawTelegram) -> Result<Snapshot, P1Error> {
    let lines: Vec<String> = (0..raw.len()).filter_map(|i| raw.line(i)).collect();
    let mut snapshot = Snapshot::new(RawTelegram::default());

    let mut index = 0;
    while index < lines.len() {
        index += decode_line(&lines, index, &mut snapshot)?;
    }

    snapshot.raw = raw;
    Ok(snapshot)
}

fn decode_line(lines: &[String], index: usize, snapshot: &mut Snapshot) -> Result<usize, P1Error> {
    let Some(obis_line) = parse_obis_line(&lines[index]) else {
        return Ok(1);
    };

    let Some(definition) = get_field_definition(obis_line.code) else {
        if obis_utils::validate_obis_code(obis_line.code) {
            debug!(
                "Skipping OBIS code {} ({})",
                obis_line.code,
                obis_utils::get_obis_description(obis_line.code).unwrap_or("unknown")
            );
        }
        return Ok(1);
    };

    let FieldDefinition { field, handler, .. } = *definition;
    match handler {
        FieldHandler::Quantity { units, target } => {
            let (value, unit) = parse_quantity(field, obis_line.payload, units)?;
            apply_quantity(snapshot, target, value, unit);
        }
        FieldHandler::Integer(target) => {
            let value = parse_integer(field, obis_line.payload)?;
            apply_integer(snapshot, target, value);
        }
        FieldHandler::Text(target) => apply_text(snapshot, target, obis_line.payload),
        FieldHandler::Timestamp => {
            snapshot.timestamp = parse_dst_timestamp(field, obis_line.payload)?;
            snapshot.timestamp_source = TimestampSource::Telegram;
        }
        FieldHandler::GasReading => return parse_gas_reading(lines, index, &mut snapshot.gas),
        FieldHandler::LegacyGasReading => return parse_legacy_gas_reading(lines, index, &mut snapshot.gas),
        FieldHandler::PowerFailureLog => {
            return parse_power_failure_log(lines, index, &mut snapshot.electricity.power_failures)
        }
    }

    Ok(1)
}

/// Element `index` of a positional list, growing the list when needed
fn slot<T: Default + Clone>(list: &mut Vec<T>, index: usize) -> &mut T {
    if list.len() <= index {
        list.resize(index + 1, T::default());
    }
    &mut list[index]
}

fn tariff(snapshot: &mut Snapshot, index: usize) -> &mut Tariff {
    slot(&mut snapshot.electricity.tariffs, index)
}

fn phase(snapshot: &mut Snapshot, index: usize) -> &mut Phase {
    slot(&mut snapshot.electricity.phases, index)
}

fn apply_quantity(snapshot: &mut Snapshot, target: QuantityTarget, value: f64, unit: &str) {
    match target {
        QuantityTarget::Threshold => {
            snapshot.electricity.threshold = value;
            snapshot.electricity.threshold_unit = unit.to_string();
        }
        QuantityTarget::TariffConsumed(i) => tariff(snapshot, i).consumed = value,
        QuantityTarget::TariffProduced(i) => tariff(snapshot, i).produced = value,
        QuantityTarget::CurrentConsumed => snapshot.electricity.current_consumed = value,
        QuantityTarget::CurrentProduced => snapshot.electricity.current_produced = value,
        QuantityTarget::PhaseVoltage(i) => phase(snapshot, i).instantaneous_voltage = value,
        QuantityTarget::PhaseCurrent(i) => phase(snapshot, i).instantaneous_current = value,
        QuantityTarget::PhaseActivePositivePower(i) => phase(snapshot, i).instantaneous_active_positive_power = value,
        QuantityTarget::PhaseActiveNegativePower(i) => phase(snapshot, i).instantaneous_active_negative_power = value,
    }
}

fn apply_integer(snapshot: &mut Snapshot, target: IntegerTarget, value: i64) {
    match target {
        IntegerTarget::Tariff => snapshot.electricity.tariff = value,
        IntegerTarget::SwitchPosition => snapshot.electricity.switch_position = value,
        IntegerTarget::PowerFailures => snapshot.electricity.number_of_power_failures = value,
        IntegerTarget::LongPowerFailures => snapshot.electricity.number_of_long_power_failures = value,
        IntegerTarget::PhaseVoltageSags(i) => phase(snapshot, i).voltage_sags = value,
        IntegerTarget::PhaseVoltageSwells(i) => phase(snapshot, i).voltage_swells = value,
        IntegerTarget::GasDeviceType => snapshot.gas.device_type = value,
        IntegerTarget::GasValvePosition => snapshot.gas.valve_position = value,
    }
}

fn apply_text(snapshot: &mut Snapshot, target: TextTarget, value: &str) {
    match target {
        TextTarget::ProtocolVersion => snapshot.protocol_version = Some(value.to_string()),
        TextTarget::ElectricityEquipmentId => snapshot.electricity.equipment_id = value.to_string(),
        TextTarget::GasEquipmentId => snapshot.gas.equipment_id = value.to_string(),
        TextTarget::MessageCode => snapshot.message.code = value.to_string(),
        TextTarget::MessageText => snapshot.message.text = value.to_string(),
    }
}
