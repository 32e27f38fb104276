//! Byte sources a P1 telegram stream can be read from

use crate::config::{FileConfig, InputConfig, InputType, NetworkConfig, SerialConfig};
use crate::metering_p1::framer::{BufReadLines, LineSource};
use log::info;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InputError {
    #[error("input type {0:?} selected but its section is missing")]
    MissingSection(InputType),
    #[error("unable to open {filename}: {source}")]
    File {
        filename: String,
        source: io::Error,
    },
    #[error("unable to connect to {address}: {source}")]
    Network {
        address: String,
        source: io::Error,
    },
    #[error("invalid serial setting {setting}: {value}")]
    SerialSetting { setting: &'static str, value: String },
    #[cfg(feature = "serial")]
    #[error("unable to open serial port {port}: {source}")]
    Serial {
        port: String,
        source: tokio_serial::Error,
    },
    #[cfg(not(feature = "serial"))]
    #[error("serial input requires the serial feature")]
    SerialUnsupported,
}

pub type BoxedLineSource = Box<dyn LineSource + Send>;

/// Opens the source selected in the config
pub fn open(config: &InputConfig) -> Result<BoxedLineSource, InputError> {
    match config.input_type {
        InputType::File => {
            let file = config.file.as_ref().ok_or(InputError::MissingSection(InputType::File))?;
            open_file(file)
        }
        InputType::Network => {
            let network = config.network.as_ref().ok_or(InputError::MissingSection(InputType::Network))?;
            open_network(network)
        }
        InputType::Serial => open_serial(&config.serial),
    }
}

fn lines<R: Read + Send + 'static>(reader: R) -> BoxedLineSource {
    Box::new(BufReadLines::new(BufReader::new(reader)))
}

pub fn open_file(config: &FileConfig) -> Result<BoxedLineSource, InputError> {
    let file_error = |source: io::Error| InputError::File { filename: config.filename.clone(), source };

    if !config.repeat {
        info!("Reading telegrams from {}", config.filename);
        let file = File::open(&config.filename).map_err(file_error)?;
        return Ok(lines(file));
    }

    info!(
        "Replaying telegrams from {} every {} ms",
        config.filename, config.repeat_delay_ms
    );
    let content = std::fs::read(&config.filename).map_err(file_error)?;
    Ok(lines(ReplayReader::new(content, Duration::from_millis(config.repeat_delay_ms))))
}

/// Offers the same content again and again, pausing between passes
pub struct ReplayReader {
    content: Vec<u8>,
    position: usize,
    delay: Duration,
}

impl ReplayReader {
    pub fn new(content: Vec<u8>, delay: Duration) -> Self {
        Self { content, position: 0, delay }
    }
}

impl Read for ReplayReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.content.is_empty() {
            return Ok(0);
        }

        if self.position >= self.content.len() {
            std::thread::sleep(self.delay);
            self.position = 0;
        }

        let remaining = &self.content[self.position..];
        let count = remaining.len().min(buf.len());
        buf[..count].copy_from_slice(&remaining[..count]);
        self.position += count;
        Ok(count)
    }
}

fn resolve(address: &str) -> io::Result<SocketAddr> {
    address
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "address did not resolve"))
}

pub fn open_network(config: &NetworkConfig) -> Result<BoxedLineSource, InputError> {
    let network_error = |source: io::Error| InputError::Network { address: config.address.clone(), source };

    info!("Connecting to {}", config.address);
    let address = resolve(&config.address).map_err(network_error)?;
    let stream = if config.dial_timeout_ms > 0 {
        TcpStream::connect_timeout(&address, Duration::from_millis(config.dial_timeout_ms))
    } else {
        TcpStream::connect(address)
    }
    .map_err(network_error)?;

    if config.read_timeout_ms > 0 {
        stream
            .set_read_timeout(Some(Duration::from_millis(config.read_timeout_ms)))
            .map_err(network_error)?;
    }

    Ok(lines(stream))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Parity {
    None,
    Odd,
    Even,
}

/// Accepts the first letter of none, odd or even in either case
pub fn parse_parity(value: &str) -> Result<Parity, InputError> {
    match value.trim().chars().next().map(|c| c.to_ascii_uppercase()) {
        Some('N') => Ok(Parity::None),
        Some('O') => Ok(Parity::Odd),
        Some('E') => Ok(Parity::Even),
        _ => Err(InputError::SerialSetting { setting: "parity", value: value.to_string() }),
    }
}

fn check_serial_settings(config: &SerialConfig) -> Result<Parity, InputError> {
    if !(5..=8).contains(&config.data_bits) {
        return Err(InputError::SerialSetting { setting: "data_bits", value: config.data_bits.to_string() });
    }
    if !(1..=2).contains(&config.stop_bits) {
        return Err(InputError::SerialSetting { setting: "stop_bits", value: config.stop_bits.to_string() });
    }
    parse_parity(&config.parity)
}

#[cfg(feature = "serial")]
pub fn open_serial(config: &SerialConfig) -> Result<BoxedLineSource, InputError> {
    let parity = match check_serial_settings(config)? {
        Parity::None => tokio_serial::Parity::None,
        Parity::Odd => tokio_serial::Parity::Odd,
        Parity::Even => tokio_serial::Parity::Even,
    };
    let data_bits = match config.data_bits {
        5 => tokio_serial::DataBits::Five,
        6 => tokio_serial::DataBits::Six,
        7 => tokio_serial::DataBits::Seven,
        _ => tokio_serial::DataBits::Eight,
    };
    let stop_bits = match config.stop_bits {
        2 => tokio_serial::StopBits::Two,
        _ => tokio_serial::StopBits::One,
    };

    info!(
        "Opening serial port {} at {} baud, {}{}{}",
        config.port, config.baud_rate, config.data_bits, config.parity, config.stop_bits
    );
    let port = tokio_serial::new(config.port.as_str(), config.baud_rate)
        .data_bits(data_bits)
        .stop_bits(stop_bits)
        .parity(parity)
        .timeout(Duration::from_millis(config.timeout_ms))
        .open()
        .map_err(|source| InputError::Serial { port: config.port.clone(), source })?;

    Ok(lines(port))
}

#[cfg(not(feature = "serial"))]
pub fn open_serial(config: &SerialConfig) -> Result<BoxedLineSource, InputError> {
    check_serial_settings(config)?;
    Err(InputError::SerialUnsupported)
}
