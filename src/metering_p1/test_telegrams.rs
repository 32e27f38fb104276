//! Telegrams captured from real meters, one per dialect

/// DSMR 2.2, two line gas reading, no timestamp or phase data
pub const DSMR22: &str = r"/ISk5\2ME382-1003

0-0:96.1.1(4B414C37303035313039393434383133)
1-0:1.8.1(00153.602*kWh)
1-0:1.8.2(00111.702*kWh)
1-0:2.8.1(00000.000*kWh)
1-0:2.8.2(00000.000*kWh)
0-0:96.14.0(0002)
1-0:1.7.0(0000.19*kW)
1-0:2.7.0(0000.00*kW)
0-0:17.0.0(0999.00*kW)
0-0:96.3.10(1)
0-0:96.13.1()
0-0:96.13.0()
0-1:24.1.0(3)
0-1:96.1.0(3238303131303031323231323831333133)
0-1:24.3.0(121018120000)(00)(60)(1)(0-1:24.2.1)(m3)
(00197.334)
0-1:24.4.0(1)
!";

/// DSMR 4.0 with three power failure events
pub const DSMR40: &str = r"/KFM5KAIFA-METER

1-3:0.2.8(42)
0-0:1.0.0(161113205757W)
0-0:96.1.1(3960221976967177082151037881335713)
1-0:1.8.1(001581.123*kWh)
1-0:1.8.2(001435.706*kWh)
1-0:2.8.1(000000.000*kWh)
1-0:2.8.2(000000.000*kWh)
0-0:96.14.0(0002)
1-0:1.7.0(02.027*kW)
1-0:2.7.0(00.000*kW)
0-0:96.7.21(00015)
0-0:96.7.9(00007)
1-0:99.97.0(3)(0-0:96.7.19)(160410180320S)(0000237126*s)(160911093010S)(0000000301*s)(161102071503W)(0000004020*s)
1-0:32.32.0(00000)
1-0:52.32.0(00000)
1-0:72.32.0(00000)
1-0:32.36.0(00000)
1-0:52.36.0(00000)
1-0:72.36.0(00000)
0-0:96.13.1()
0-0:96.13.0()
1-0:31.7.0(003*A)
1-0:51.7.0(005*A)
1-0:71.7.0(005*A)
1-0:21.7.0(00.503*kW)
1-0:41.7.0(01.100*kW)
1-0:61.7.0(00.424*kW)
1-0:22.7.0(00.000*kW)
1-0:42.7.0(00.000*kW)
1-0:62.7.0(00.000*kW)
0-1:24.1.0(003)
0-1:96.1.0(4819243993373755377509728609491464)
0-1:24.2.1(161129200000W)(00981.443*m3)
!6796";

/// ESMR 5.0 with voltages, an empty power failure log and a text message
pub const ESMR50: &str = r"/Ene5\XS210 ESMR 5.0

1-3:0.2.8(50)
0-0:1.0.0(171105201324W)
0-0:96.1.1(4530303437303030303037363330383137)
1-0:1.8.1(000051.775*kWh)
1-0:1.8.2(000000.000*kWh)
1-0:2.8.1(000024.413*kWh)
1-0:2.8.2(000000.000*kWh)
0-0:96.14.0(0001)
1-0:1.7.0(00.335*kW)
1-0:2.7.0(00.000*kW)
0-0:96.7.21(00003)
0-0:96.7.9(00001)
1-0:99.97.0(0)(0-0:96.7.19)
1-0:32.32.0(00002)
1-0:52.32.0(00002)
1-0:72.32.0(00002)
1-0:32.36.0(00000)
1-0:52.36.0(00000)
1-0:72.36.0(00001)
0-0:96.13.0(48656C6C6F)
1-0:32.7.0(229.0*V)
1-0:52.7.0(230.5*V)
1-0:72.7.0(231.1*V)
1-0:31.7.0(000*A)
1-0:51.7.0(000*A)
1-0:71.7.0(001*A)
1-0:21.7.0(00.046*kW)
1-0:41.7.0(00.093*kW)
1-0:61.7.0(00.178*kW)
1-0:22.7.0(00.000*kW)
1-0:42.7.0(00.000*kW)
1-0:62.7.0(00.000*kW)
0-1:24.1.0(003)
0-1:96.1.0(4730303339303031373030343630313137)
0-1:24.2.1(171105201000W)(00016.713*m3)
!8F46";

/// Raw telegram as the framer would produce it
pub fn raw_telegram(telegram: &str) -> crate::models::RawTelegram {
    crate::models::RawTelegram::new(
        telegram
            .lines()
            .map(|l| l.trim().as_bytes().to_vec())
            .collect(),
    )
}

const PHASE_CODES: [[&str; 6]; 3] = [
    ["32.32.0", "32.36.0", "32.7.0", "31.7.0", "21.7.0", "22.7.0"],
    ["52.32.0", "52.36.0", "52.7.0", "51.7.0", "41.7.0", "42.7.0"],
    ["72.32.0", "72.36.0", "72.7.0", "71.7.0", "61.7.0", "62.7.0"],
];

fn wire_time(ts: &chrono::DateTime<chrono::Local>) -> String {
    format!("{}W", ts.format("%y%m%d%H%M%S"))
}

/// Renders a snapshot back into telegram lines
pub fn encode_snapshot(snapshot: &crate::models::Snapshot) -> String {
    let electricity = &snapshot.electricity;
    let mut lines = vec!["/TST5\\ENCODER".to_string(), String::new()];

    if let Some(version) = &snapshot.protocol_version {
        lines.push(format!("1-3:0.2.8({version})"));
    }
    lines.push(format!("0-0:1.0.0({})", wire_time(&snapshot.timestamp)));
    lines.push(format!("0-0:96.1.1({})", electricity.equipment_id));
    for (i, tariff) in electricity.tariffs.iter().enumerate() {
        lines.push(format!("1-0:1.8.{}({:010.3}*kWh)", i + 1, tariff.consumed));
        lines.push(format!("1-0:2.8.{}({:010.3}*kWh)", i + 1, tariff.produced));
    }
    lines.push(format!("0-0:96.14.0({:04})", electricity.tariff));
    lines.push(format!("0-0:96.3.10({})", electricity.switch_position));
    if !electricity.threshold_unit.is_empty() {
        lines.push(format!("0-0:17.0.0({:07.2}*{})", electricity.threshold, electricity.threshold_unit));
    }
    lines.push(format!("1-0:1.7.0({:06.3}*kW)", electricity.current_consumed));
    lines.push(format!("1-0:2.7.0({:06.3}*kW)", electricity.current_produced));
    lines.push(format!("0-0:96.7.21({:05})", electricity.number_of_power_failures));
    lines.push(format!("0-0:96.7.9({:05})", electricity.number_of_long_power_failures));

    let mut log = format!("1-0:99.97.0({})(0-0:96.7.19)", electricity.power_failures.len());
    for failure in &electricity.power_failures {
        log.push_str(&format!("({})({:010}*s)", wire_time(&failure.end), failure.duration.as_secs()));
    }
    lines.push(log);

    for (phase, codes) in electricity.phases.iter().zip(PHASE_CODES.iter()) {
        lines.push(format!("1-0:{}({:05})", codes[0], phase.voltage_sags));
        lines.push(format!("1-0:{}({:05})", codes[1], phase.voltage_swells));
        lines.push(format!("1-0:{}({:05.1}*V)", codes[2], phase.instantaneous_voltage));
        lines.push(format!("1-0:{}({:03}*A)", codes[3], phase.instantaneous_current));
        lines.push(format!("1-0:{}({:06.3}*kW)", codes[4], phase.instantaneous_active_positive_power));
        lines.push(format!("1-0:{}({:06.3}*kW)", codes[5], phase.instantaneous_active_negative_power));
    }

    lines.push(format!("0-0:96.13.1({})", snapshot.message.code));
    lines.push(format!("0-0:96.13.0({})", snapshot.message.text));
    lines.push(format!("0-1:24.1.0({:03})", snapshot.gas.device_type));
    lines.push(format!("0-1:96.1.0({})", snapshot.gas.equipment_id));
    if let Some(measured_at) = &snapshot.gas.measured_at {
        lines.push(format!("0-1:24.2.1({})({:09.3}*m3)", wire_time(measured_at), snapshot.gas.consumed));
    }
    lines.push(format!("0-1:24.4.0({})", snapshot.gas.valve_position));
    lines.push("!".to_string());

    lines.join("\r\n")
}
