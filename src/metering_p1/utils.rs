use super::{obis_parser::split_value_unit, FieldCause, P1Error};
use chrono::{DateTime, Local, LocalResult, NaiveDateTime, TimeZone};

const DATE_FORMAT: &str = "%y%m%d%H%M%S";

/// Parses `<number>*<unit>` and checks the unit against the accepted units
/// for the field. The unit is returned as declared, no conversion happens.
pub fn parse_quantity<'a>(field: &str, payload: &'a str, units: &[&str]) -> Result<(f64, &'a str), P1Error> {
    let (value, unit) = split_value_unit(payload);

    if !units.contains(&unit) {
        return Err(P1Error::InvalidUnit {
            field: field.to_string(),
            unit: unit.to_string(),
        });
    }

    let number = value
        .parse::<f64>()
        .map_err(|e| P1Error::field(field, value, e.into()))?;

    Ok((number, unit))
}

pub fn parse_integer(field: &str, payload: &str) -> Result<i64, P1Error> {
    payload
        .parse::<i64>()
        .map_err(|e| P1Error::field(field, payload, e.into()))
}

/// Splits `161113205757W` into the digits and the DST indicator
pub fn strip_dst_suffix(payload: &str) -> (&str, Option<char>) {
    match payload.chars().last() {
        Some(c @ ('S' | 'W')) => (&payload[..payload.len() - 1], Some(c)),
        _ => (payload, None),
    }
}

/// Parses a `YYMMDDhhmmss` timestamp in local time
pub fn parse_timestamp(field: &str, digits: &str, dst: Option<char>) -> Result<DateTime<Local>, P1Error> {
    if digits.len() != 12 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(P1Error::field(
            field,
            digits,
            FieldCause::Format("expected 12 digits YYMMDDhhmmss".to_string()),
        ));
    }

    let naive = NaiveDateTime::parse_from_str(digits, DATE_FORMAT)
        .map_err(|e| P1Error::field(field, digits, e.into()))?;

    resolve_local(Local.from_local_datetime(&naive), dst).ok_or_else(|| {
        P1Error::field(
            field,
            digits,
            FieldCause::Format("time does not exist in the local time zone".to_string()),
        )
    })
}

/// Parses a `YYMMDDhhmmss` timestamp followed by its mandatory `S`/`W`
/// DST indicator
pub fn parse_dst_timestamp(field: &str, payload: &str) -> Result<DateTime<Local>, P1Error> {
    match strip_dst_suffix(payload) {
        (digits, Some(dst)) => parse_timestamp(field, digits, Some(dst)),
        (_, None) => Err(P1Error::field(
            field,
            payload,
            FieldCause::Format("missing DST indicator S or W".to_string()),
        )),
    }
}

/// Picks the instant for a wall clock time. During the autumn fold the time
/// occurs twice, the meter's DST indicator tells which one is meant.
pub fn resolve_local<Tz: TimeZone>(result: LocalResult<DateTime<Tz>>, dst: Option<char>) -> Option<DateTime<Tz>> {
    match result {
        LocalResult::Single(t) => Some(t),
        LocalResult::Ambiguous(earliest, latest) => match dst {
            Some('W') => Some(latest),
            _ => Some(earliest),
        },
        LocalResult::None => None,
    }
}
