/// Destination of a value+unit field
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QuantityTarget {
    Threshold,
    TariffConsumed(usize),
    TariffProduced(usize),
    CurrentConsumed,
    CurrentProduced,
    PhaseVoltage(usize),
    PhaseCurrent(usize),
    PhaseActivePositivePower(usize),
    PhaseActiveNegativePower(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IntegerTarget {
    Tariff,
    SwitchPosition,
    PowerFailures,
    LongPowerFailures,
    PhaseVoltageSags(usize),
    PhaseVoltageSwells(usize),
    GasDeviceType,
    GasValvePosition,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TextTarget {
    ProtocolVersion,
    ElectricityEquipmentId,
    GasEquipmentId,
    MessageCode,
    MessageText,
}

/// How the payload of a known OBIS identifier is decoded
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldHandler {
    /// `<number>*<unit>`, the unit must be one of `units`
    Quantity { units: &'static [&'static str], target: QuantityTarget },
    Integer(IntegerTarget),
    Text(TextTarget),
    /// Telegram timestamp, `YYMMDDhhmmss` plus DST indicator
    Timestamp,
    /// Single line gas reading (DSMR 4 and later)
    GasReading,
    /// Gas reading split over this line and the next one (DSMR 2.2/3)
    LegacyGasReading,
    PowerFailureLog,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldDefinition {
    pub obis_code: &'static str,
    /// Name used in error messages
    pub field: &'static str,
    pub handler: FieldHandler,
}

/// A data line split into identifier and first payload group
#[derive(Debug, Clone, PartialEq)]
pub struct ObisLine<'a> {
    pub code: &'a str,
    pub payload: &'a str,
    /// Byte offset just past the closing parenthesis of the payload
    pub payload_end: usize,
}
