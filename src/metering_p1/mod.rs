use crate::models::Snapshot;
use crate::mqtt::Transmission;
use log::{debug, error, info, warn};
use std::num::{ParseFloatError, ParseIntError};
use thiserror::Error;
use tokio::sync::mpsc::Sender;

pub mod structs;
pub mod framer;
pub mod decoder;
pub mod sub_parsers;
pub mod obis_parser;
pub mod meter_definitions;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_telegrams;

use framer::{Framer, FramerObserver, LineSource};

#[derive(Error, Debug)]
pub enum FramingError {
    #[error("stream ended after {lines_read} lines without a complete telegram")]
    EndOfStream { lines_read: usize },
    #[error("read failed after {lines_read} lines: {source}")]
    Read {
        lines_read: usize,
        source: std::io::Error,
    },
}

/// Why a field payload could not be decoded
#[derive(Error, Debug)]
pub enum FieldCause {
    #[error(transparent)]
    Float(#[from] ParseFloatError),
    #[error(transparent)]
    Integer(#[from] ParseIntError),
    #[error(transparent)]
    Timestamp(#[from] chrono::ParseError),
    #[error("{0}")]
    Format(String),
}

#[derive(Error, Debug)]
pub enum P1Error {
    #[error("failed to find a complete telegram: {0}")]
    Framing(#[from] FramingError),
    #[error("failed to parse {value:?} as {field}: {cause}")]
    FieldParse {
        field: String,
        value: String,
        #[source]
        cause: FieldCause,
    },
    #[error("invalid unit for {field}: {unit:?}")]
    InvalidUnit { field: String, unit: String },
    #[error("P1 reader thread failed: {0}")]
    ReaderThread(String),
}

impl P1Error {
    pub fn field(field: &str, value: &str, cause: FieldCause) -> Self {
        P1Error::FieldParse {
            field: field.to_string(),
            value: value.to_string(),
            cause,
        }
    }
}

/// Reads and decodes one telegram per call from a line source
pub struct P1Reader<S> {
    framer: Framer<S>,
}

impl<S: LineSource> P1Reader<S> {
    pub fn new(source: S) -> Self {
        Self { framer: Framer::new(source) }
    }

    pub fn with_observer(source: S, observer: Box<dyn FramerObserver>) -> Self {
        Self { framer: Framer::with_observer(source, observer) }
    }

    pub fn read(&mut self) -> Result<Snapshot, P1Error> {
        let raw = self.framer.frame()?;
        decoder::decode(raw)
    }
}

pub struct P1Manager {
    sender: Option<Sender<Transmission>>,
    json_output: bool,
}

impl P1Manager {
    pub fn new(sender: Option<Sender<Transmission>>, json_output: bool) -> Self {
        Self { sender, json_output }
    }

    /// Runs the blocking read loop on a dedicated thread until the source is
    /// exhausted or nobody listens for snapshots anymore
    pub async fn start_thread(self, source: Box<dyn LineSource + Send>) -> Result<(), P1Error> {
        info!("Starting P1 reader thread");

        match tokio::task::spawn_blocking(move || self.run(source)).await {
            Ok(result) => result,
            Err(e) => {
                error!("P1 reader thread failed: {e}");
                Err(P1Error::ReaderThread(e.to_string()))
            }
        }
    }

    fn run(self, source: Box<dyn LineSource + Send>) -> Result<(), P1Error> {
        let mut reader = P1Reader::with_observer(source, Box::new(framer::LogObserver));

        loop {
            let snapshot = match reader.read() {
                Ok(snapshot) => snapshot,
                Err(P1Error::Framing(e)) => {
                    error!("P1 input stopped: {e}");
                    return Err(e.into());
                }
                Err(e) => {
                    error!("P1 telegram parse error: {e}");
                    continue;
                }
            };

            debug!(
                "Decoded telegram from {} with {} lines",
                snapshot.device_id(),
                snapshot.raw.len()
            );

            if self.json_output {
                match serde_json::to_string(&snapshot) {
                    Ok(json) => println!("{json}"),
                    Err(e) => warn!("Failed to serialize snapshot: {e}"),
                }
            }

            if let Some(sender) = &self.sender {
                if sender.blocking_send(Transmission::Snapshot(Box::new(snapshot))).is_err() {
                    info!("Transmission channel closed, stopping P1 reader");
                    return Ok(());
                }
            }
        }
    }
}
