//! Fields that cannot be decoded from a single payload group: both gas
//! encodings and the power failure event log. Every parser takes the whole
//! telegram plus the index of the current line and returns how many lines it
//! consumed.

use super::obis_parser::{next_group, parse_obis_line};
use super::utils::{parse_dst_timestamp, parse_integer, parse_quantity, parse_timestamp};
use super::{FieldCause, P1Error};
use crate::models::{Gas, PowerFailure};
use lazy_static::lazy_static;
use regex::Regex;
use std::time::Duration;

const GAS_FIELD: &str = "gas consumption";
const POWER_FAILURE_FIELD: &str = "power failure log";
const POWER_FAILURE_MARKER: &str = "0-0:96.7.19";

lazy_static! {
    static ref GAS_FORMAT: Regex = Regex::new(r"^0-1:24\.2\.1\((\d{12})([SW])\)\((\d{5}\.\d{3})\*m3\)$").unwrap();
    static ref LEGACY_GAS_FORMAT: Regex = Regex::new(r"^0-1:24\.3\.0\((\d{12})\)").unwrap();
    static ref LEGACY_GAS_VALUE_FORMAT: Regex = Regex::new(r"^\((\d{5}\.\d{3})\)$").unwrap();
}

fn gas_format_error(line: &str) -> P1Error {
    P1Error::field(
        GAS_FIELD,
        line,
        FieldCause::Format("line does not match the gas format".to_string()),
    )
}

fn parse_gas_value(value: &str) -> Result<f64, P1Error> {
    value
        .parse::<f64>()
        .map_err(|e| P1Error::field(GAS_FIELD, value, e.into()))
}

/// `0-1:24.2.1(161129200000W)(00981.443*m3)`
pub fn parse_gas_reading(lines: &[String], index: usize, gas: &mut Gas) -> Result<usize, P1Error> {
    let line = &lines[index];
    let captures = GAS_FORMAT.captures(line).ok_or_else(|| gas_format_error(line))?;

    let dst = captures[2].chars().next();
    gas.measured_at = Some(parse_timestamp(GAS_FIELD, &captures[1], dst)?);
    gas.consumed = parse_gas_value(&captures[3])?;

    Ok(1)
}

/// `0-1:24.3.0(121018120000)(00)(60)(1)(0-1:24.2.1)(m3)` followed by a line
/// holding only the value, `(00197.334)`
pub fn parse_legacy_gas_reading(lines: &[String], index: usize, gas: &mut Gas) -> Result<usize, P1Error> {
    let line = &lines[index];
    let captures = LEGACY_GAS_FORMAT.captures(line).ok_or_else(|| gas_format_error(line))?;

    let value_line = lines.get(index + 1).ok_or_else(|| gas_format_error(line))?;
    let value = LEGACY_GAS_VALUE_FORMAT
        .captures(value_line)
        .ok_or_else(|| gas_format_error(value_line))?;

    gas.measured_at = Some(parse_timestamp(GAS_FIELD, &captures[1], None)?);
    gas.consumed = parse_gas_value(&value[1])?;

    Ok(2)
}

/// `1-0:99.97.0(2)(0-0:96.7.19)(101208152415W)(0000000240*s)(101208151004W)(0000000301*s)`
///
/// The first group holds the number of events, followed by the marker
/// `0-0:96.7.19` and a timestamp/duration pair per event. A log holding
/// fewer events than declared is rejected.
pub fn parse_power_failure_log(lines: &[String], index: usize, events: &mut Vec<PowerFailure>) -> Result<usize, P1Error> {
    let line = &lines[index];
    let obis_line = parse_obis_line(line).ok_or_else(|| truncated_log(line, 0, 0))?;

    let declared = parse_integer(POWER_FAILURE_FIELD, obis_line.payload)?;
    let declared = usize::try_from(declared).map_err(|_| {
        P1Error::field(
            POWER_FAILURE_FIELD,
            obis_line.payload,
            FieldCause::Format("event count out of range".to_string()),
        )
    })?;

    let mut pos = obis_line.payload_end;
    match next_group(line, pos) {
        Some((marker, next)) => {
            if marker != POWER_FAILURE_MARKER {
                return Err(P1Error::field(
                    POWER_FAILURE_FIELD,
                    marker,
                    FieldCause::Format(format!("expected {POWER_FAILURE_MARKER}")),
                ));
            }
            pos = next;
        }
        // Some meters drop the marker when the log is empty
        None if declared == 0 => return Ok(1),
        None => return Err(truncated_log(line, declared, 0)),
    }

    let mut parsed = Vec::new();
    for found in 0..declared {
        let (end, next) = next_group(line, pos).ok_or_else(|| truncated_log(line, declared, found))?;
        let (duration, next) = next_group(line, next).ok_or_else(|| truncated_log(line, declared, found))?;
        pos = next;

        let end = parse_dst_timestamp(POWER_FAILURE_FIELD, end)?;

        let (seconds, _) = parse_quantity(POWER_FAILURE_FIELD, duration, &["s"])?;
        let duration = Duration::try_from_secs_f64(seconds).map_err(|e| {
            P1Error::field(POWER_FAILURE_FIELD, duration, FieldCause::Format(e.to_string()))
        })?;

        parsed.push(PowerFailure { end, duration });
    }

    events.extend(parsed);
    Ok(1)
}

fn truncated_log(line: &str, declared: usize, found: usize) -> P1Error {
    P1Error::field(
        POWER_FAILURE_FIELD,
        line,
        FieldCause::Format(format!("declared {declared} events, found {found}")),
    )
}
