use super::structs::{FieldDefinition, FieldHandler, IntegerTarget, QuantityTarget, TextTarget};
use lazy_static::lazy_static;
use std::collections::HashMap;

const KWH: &[&str] = &["kWh"];
const KW: &[&str] = &["kW"];
const VOLT: &[&str] = &["V"];
const AMPERE: &[&str] = &["A"];
// DSMR 2.2 meters report the threshold in A, later versions in kW
const THRESHOLD_UNITS: &[&str] = &["kW", "A"];

const fn def(obis_code: &'static str, field: &'static str, handler: FieldHandler) -> FieldDefinition {
    FieldDefinition { obis_code, field, handler }
}

const fn quantity(units: &'static [&'static str], target: QuantityTarget) -> FieldHandler {
    FieldHandler::Quantity { units, target }
}

/// Every OBIS identifier the decoder understands. Anything else in a
/// telegram is skipped.
pub const FIELD_DEFINITIONS: &[FieldDefinition] = &[
    def("1-3:0.2.8", "protocol version", FieldHandler::Text(TextTarget::ProtocolVersion)),
    def("0-0:1.0.0", "timestamp", FieldHandler::Timestamp),

    // Electricity
    def("0-0:96.1.1", "electricity equipment id", FieldHandler::Text(TextTarget::ElectricityEquipmentId)),
    def("0-0:96.14.0", "tariff indicator", FieldHandler::Integer(IntegerTarget::Tariff)),
    def("0-0:96.3.10", "switch position", FieldHandler::Integer(IntegerTarget::SwitchPosition)),
    def("0-0:17.0.0", "threshold", quantity(THRESHOLD_UNITS, QuantityTarget::Threshold)),
    def("1-0:1.8.1", "electricity delivery (tariff 1)", quantity(KWH, QuantityTarget::TariffConsumed(0))),
    def("1-0:1.8.2", "electricity delivery (tariff 2)", quantity(KWH, QuantityTarget::TariffConsumed(1))),
    def("1-0:2.8.1", "electricity production (tariff 1)", quantity(KWH, QuantityTarget::TariffProduced(0))),
    def("1-0:2.8.2", "electricity production (tariff 2)", quantity(KWH, QuantityTarget::TariffProduced(1))),
    def("1-0:1.7.0", "electricity usage", quantity(KW, QuantityTarget::CurrentConsumed)),
    def("1-0:2.7.0", "electricity return", quantity(KW, QuantityTarget::CurrentProduced)),
    def("0-0:96.7.21", "number of power failures", FieldHandler::Integer(IntegerTarget::PowerFailures)),
    def("0-0:96.7.9", "number of long power failures", FieldHandler::Integer(IntegerTarget::LongPowerFailures)),
    def("1-0:99.97.0", "power failure log", FieldHandler::PowerFailureLog),

    // Phase L1
    def("1-0:32.32.0", "voltage sags (phase 1)", FieldHandler::Integer(IntegerTarget::PhaseVoltageSags(0))),
    def("1-0:32.36.0", "voltage swells (phase 1)", FieldHandler::Integer(IntegerTarget::PhaseVoltageSwells(0))),
    def("1-0:32.7.0", "instantaneous voltage (phase 1)", quantity(VOLT, QuantityTarget::PhaseVoltage(0))),
    def("1-0:31.7.0", "instantaneous current (phase 1)", quantity(AMPERE, QuantityTarget::PhaseCurrent(0))),
    def("1-0:21.7.0", "active power +P (phase 1)", quantity(KW, QuantityTarget::PhaseActivePositivePower(0))),
    def("1-0:22.7.0", "active power -P (phase 1)", quantity(KW, QuantityTarget::PhaseActiveNegativePower(0))),

    // Phase L2
    def("1-0:52.32.0", "voltage sags (phase 2)", FieldHandler::Integer(IntegerTarget::PhaseVoltageSags(1))),
    def("1-0:52.36.0", "voltage swells (phase 2)", FieldHandler::Integer(IntegerTarget::PhaseVoltageSwells(1))),
    def("1-0:52.7.0", "instantaneous voltage (phase 2)", quantity(VOLT, QuantityTarget::PhaseVoltage(1))),
    def("1-0:51.7.0", "instantaneous current (phase 2)", quantity(AMPERE, QuantityTarget::PhaseCurrent(1))),
    def("1-0:41.7.0", "active power +P (phase 2)", quantity(KW, QuantityTarget::PhaseActivePositivePower(1))),
    def("1-0:42.7.0", "active power -P (phase 2)", quantity(KW, QuantityTarget::PhaseActiveNegativePower(1))),

    // Phase L3
    def("1-0:72.32.0", "voltage sags (phase 3)", FieldHandler::Integer(IntegerTarget::PhaseVoltageSags(2))),
    def("1-0:72.36.0", "voltage swells (phase 3)", FieldHandler::Integer(IntegerTarget::PhaseVoltageSwells(2))),
    def("1-0:72.7.0", "instantaneous voltage (phase 3)", quantity(VOLT, QuantityTarget::PhaseVoltage(2))),
    def("1-0:71.7.0", "instantaneous current (phase 3)", quantity(AMPERE, QuantityTarget::PhaseCurrent(2))),
    def("1-0:61.7.0", "active power +P (phase 3)", quantity(KW, QuantityTarget::PhaseActivePositivePower(2))),
    def("1-0:62.7.0", "active power -P (phase 3)", quantity(KW, QuantityTarget::PhaseActiveNegativePower(2))),

    // Gas
    def("0-1:96.1.0", "gas equipment id", FieldHandler::Text(TextTarget::GasEquipmentId)),
    def("0-1:24.1.0", "gas device type", FieldHandler::Integer(IntegerTarget::GasDeviceType)),
    def("0-1:24.4.0", "gas valve position", FieldHandler::Integer(IntegerTarget::GasValvePosition)),
    def("0-1:24.2.1", "gas consumption", FieldHandler::GasReading),
    def("0-1:24.3.0", "gas consumption", FieldHandler::LegacyGasReading),

    // Text messages
    def("0-0:96.13.1", "message code", FieldHandler::Text(TextTarget::MessageCode)),
    def("0-0:96.13.0", "message text", FieldHandler::Text(TextTarget::MessageText)),
];

lazy_static! {
    static ref DEFINITIONS_BY_CODE: HashMap<&'static str, &'static FieldDefinition> =
        FIELD_DEFINITIONS.iter().map(|d| (d.obis_code, d)).collect();
}

pub fn get_field_definition(obis_code: &str) -> Option<&'static FieldDefinition> {
    DEFINITIONS_BY_CODE.get(obis_code).copied()
}
