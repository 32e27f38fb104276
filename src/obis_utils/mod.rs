use lazy_static::lazy_static;
use std::collections::HashMap;

lazy_static! {
    /// OBIS codes seen on P1 ports that are not decoded into a snapshot
    static ref UNDECODED_DESCRIPTIONS: HashMap<&'static str, &'static str> = {
        let mut map = HashMap::new();

        // Totals sent by meters next to the per tariff registers
        map.insert("1-0:1.8.0", "Active energy + (total)");
        map.insert("1-0:2.8.0", "Active energy - (total)");
        map.insert("1-0:3.8.0", "Reactive energy + (total)");
        map.insert("1-0:4.8.0", "Reactive energy - (total)");

        // Aggregated and reactive power
        map.insert("1-0:16.7.0", "Sum active instantaneous power");
        map.insert("1-0:3.7.0", "Reactive power + (total)");
        map.insert("1-0:4.7.0", "Reactive power - (total)");
        map.insert("1-0:13.7.0", "Power factor");
        map.insert("1-0:14.7.0", "Supply frequency");

        // Belgian and Luxembourg extensions
        map.insert("0-0:96.1.4", "Version information");
        map.insert("1-0:1.4.0", "Current average demand + (quarter hour)");
        map.insert("1-0:1.6.0", "Maximum demand + (current month)");
        map.insert("0-0:98.1.0", "Maximum demand history");
        map.insert("1-0:31.4.0", "Fuse supervision threshold (L1)");

        // Other M-Bus channels
        map.insert("0-1:24.2.3", "Gas delivered (temperature corrected)");
        map.insert("0-2:24.1.0", "Device type (channel 2)");
        map.insert("0-2:96.1.0", "Equipment identifier (channel 2)");
        map.insert("0-2:24.2.1", "Last 5-minute value (channel 2)");
        map.insert("0-3:24.1.0", "Device type (channel 3)");
        map.insert("0-4:24.1.0", "Device type (channel 4)");

        map
    };
}

pub fn get_obis_description(obis_code: &str) -> Option<&'static str> {
    UNDECODED_DESCRIPTIONS.get(obis_code).copied()
}

/// Checks the `A-B:C.D.E` shape of an OBIS reduced identifier, every part
/// being a number between 0 and 255
pub fn validate_obis_code(code: &str) -> bool {
    let Some((ab_part, cde_part)) = code.split_once(':') else {
        return false;
    };

    let ab_parts: Vec<&str> = ab_part.split('-').collect();
    if ab_parts.len() != 2 {
        return false;
    }

    let cde_parts: Vec<&str> = cde_part.split('.').collect();
    if cde_parts.len() != 3 {
        return false;
    }

    ab_parts
        .iter()
        .chain(cde_parts.iter())
        .all(|part| !part.is_empty() && part.parse::<u8>().is_ok())
}
