use super::structs::ObisLine;

pub fn parse_obis_line(line: &str) -> Option<ObisLine<'_>> {
    // Example formats:
    // 1-0:1.8.1(000123.456*kWh)
    // 0-0:1.0.0(161113205757W)
    // 0-1:24.2.1(161129200000W)(00981.443*m3)

    // Lines without a payload (header, blank lines, checksum) carry no data
    let paren_start = line.find('(')?;
    let paren_end = line.find(')')?;

    if paren_start > paren_end {
        return None;
    }

    Some(ObisLine {
        code: &line[..paren_start],
        payload: &line[paren_start + 1..paren_end],
        payload_end: paren_end + 1,
    })
}

/// Finds the next `(...)` group starting at byte offset `from`. Returns the
/// group content and the offset just past its closing parenthesis.
pub fn next_group(line: &str, from: usize) -> Option<(&str, usize)> {
    let rest = line.get(from..)?;
    let open = from + rest.find('(')?;
    let close = open + line[open..].find(')')?;
    Some((&line[open + 1..close], close + 1))
}

/// Splits `000123.456*kWh` into value and unit at the last `*`. Without a
/// `*` the unit is empty.
pub fn split_value_unit(payload: &str) -> (&str, &str) {
    match payload.rfind('*') {
        Some(star_pos) => (&payload[..star_pos], &payload[star_pos + 1..]),
        None => (payload, ""),
    }
}
