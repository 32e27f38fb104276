use super::FramingError;
use crate::models::RawTelegram;
use log::debug;
use std::io::{self, BufRead};
use std::time::{Duration, Instant};

/// Blocking source of lines. `None` signals the end of the stream.
pub trait LineSource {
    fn next_line(&mut self) -> Option<io::Result<Vec<u8>>>;
}

impl<S: LineSource + ?Sized> LineSource for Box<S> {
    fn next_line(&mut self) -> Option<io::Result<Vec<u8>>> {
        (**self).next_line()
    }
}

/// Newline delimited lines from any buffered reader
pub struct BufReadLines<R> {
    reader: R,
}

impl<R: BufRead> BufReadLines<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> LineSource for BufReadLines<R> {
    fn next_line(&mut self) -> Option<io::Result<Vec<u8>>> {
        let mut line = Vec::new();
        match self.reader.read_until(b'\n', &mut line) {
            Ok(0) => None,
            Ok(_) => {
                if line.last() == Some(&b'\n') {
                    line.pop();
                }
                Some(Ok(line))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

/// Hooks for framing statistics. All methods default to doing nothing.
pub trait FramerObserver {
    fn line_read(&mut self, _line: &[u8]) {}

    /// A start marker was seen, `discarded` buffered lines were dropped
    fn start_found(&mut self, _discarded: usize) {}

    fn telegram_framed(&mut self, _lines_read: usize, _telegram_lines: usize, _elapsed: Duration) {}
}

/// Writes framing statistics to the debug log
pub struct LogObserver;

impl FramerObserver for LogObserver {
    fn start_found(&mut self, discarded: usize) {
        if discarded > 0 {
            debug!("Telegram start found, discarding {discarded} buffered lines");
        }
    }

    fn telegram_framed(&mut self, lines_read: usize, telegram_lines: usize, elapsed: Duration) {
        debug!(
            "Framed telegram of {telegram_lines} lines after reading {lines_read} lines in {:?}",
            elapsed
        );
    }
}

pub struct Framer<S> {
    source: S,
    observer: Option<Box<dyn FramerObserver>>,
}

impl<S: LineSource> Framer<S> {
    pub fn new(source: S) -> Self {
        Self { source, observer: None }
    }

    pub fn with_observer(source: S, observer: Box<dyn FramerObserver>) -> Self {
        Self { source, observer: Some(observer) }
    }

    /// Reads lines until a line containing `/` has been followed by a line
    /// containing `!`. A new start marker drops everything buffered so far.
    pub fn frame(&mut self) -> Result<RawTelegram, FramingError> {
        let started = Instant::now();
        let mut telegram: Vec<Vec<u8>> = Vec::new();
        let mut lines_read = 0;
        let mut start_found = false;
        let mut end_found = false;

        while !start_found || !end_found {
            let line = match self.source.next_line() {
                Some(Ok(line)) => line,
                Some(Err(source)) => return Err(FramingError::Read { lines_read, source }),
                None => return Err(FramingError::EndOfStream { lines_read }),
            };
            lines_read += 1;

            if let Some(observer) = self.observer.as_mut() {
                observer.line_read(&line);
            }

            if line.contains(&b'/') {
                if let Some(observer) = self.observer.as_mut() {
                    observer.start_found(telegram.len());
                }
                telegram.clear();
                start_found = true;
                end_found = false;
            } else if line.contains(&b'!') {
                end_found = true;
            }

            telegram.push(line.trim_ascii().to_vec());
        }

        if let Some(observer) = self.observer.as_mut() {
            observer.telegram_framed(lines_read, telegram.len(), started.elapsed());
        }

        Ok(RawTelegram::new(telegram))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn framer(input: &str) -> Framer<BufReadLines<&[u8]>> {
        Framer::new(BufReadLines::new(input.as_bytes()))
    }

    fn lines(raw: &RawTelegram) -> Vec<String> {
        (0..raw.len()).filter_map(|i| raw.line(i)).collect()
    }

    #[test]
    fn test_frame_basic_telegram() {
        let raw = framer("/ISk5\\2MT382-1000\r\n\r\n1-0:1.8.1(000123.456*kWh)\r\n!\r\n").frame().unwrap();
        assert_eq!(lines(&raw), vec!["/ISk5\\2MT382-1000", "", "1-0:1.8.1(000123.456*kWh)", "!"]);
    }

    #[test]
    fn test_frame_discards_leading_garbage() {
        let raw = framer("1-0:1.8.1(000001.000*kWh)\n!A1B2\n/XMX5\n1-0:1.8.2(000002.000*kWh)\n!\n")
            .frame()
            .unwrap();
        assert_eq!(lines(&raw), vec!["/XMX5", "1-0:1.8.2(000002.000*kWh)", "!"]);
    }

    #[test]
    fn test_frame_restarts_on_second_start_marker() {
        let raw = framer("/FIRST\n1-0:1.8.1(000001.000*kWh)\n/SECOND\n1-0:1.8.2(000002.000*kWh)\n!\n")
            .frame()
            .unwrap();
        assert_eq!(lines(&raw), vec!["/SECOND", "1-0:1.8.2(000002.000*kWh)", "!"]);
    }

    #[test]
    fn test_frame_trims_whitespace() {
        let raw = framer("  /XMX5  \n\t1-0:1.8.1(000001.000*kWh) \n !\n").frame().unwrap();
        assert_eq!(lines(&raw), vec!["/XMX5", "1-0:1.8.1(000001.000*kWh)", "!"]);
    }

    #[test]
    fn test_frame_end_of_stream_without_end_marker() {
        let err = framer("/XMX5\n1-0:1.8.1(000001.000*kWh)\n").frame().unwrap_err();
        assert!(matches!(err, FramingError::EndOfStream { lines_read: 2 }));
    }

    #[test]
    fn test_frame_empty_stream() {
        assert!(matches!(framer("").frame(), Err(FramingError::EndOfStream { lines_read: 0 })));
    }

    #[test]
    fn test_frame_read_error() {
        struct FailingSource {
            lines: Vec<Vec<u8>>,
        }

        impl LineSource for FailingSource {
            fn next_line(&mut self) -> Option<io::Result<Vec<u8>>> {
                if self.lines.is_empty() {
                    return Some(Err(io::Error::new(io::ErrorKind::TimedOut, "read timeout")));
                }
                Some(Ok(self.lines.remove(0)))
            }
        }

        let mut framer = Framer::new(FailingSource { lines: vec![b"/XMX5".to_vec()] });
        match framer.frame() {
            Err(FramingError::Read { lines_read, source }) => {
                assert_eq!(lines_read, 1);
                assert_eq!(source.kind(), io::ErrorKind::TimedOut);
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_frame_consecutive_calls_start_fresh() {
        let mut framer = framer("/A\n1-0:1.8.1(000001.000*kWh)\n!\n/B\n!\n");
        assert_eq!(framer.frame().unwrap().len(), 3);
        assert_eq!(lines(&framer.frame().unwrap()), vec!["/B", "!"]);
    }

    #[test]
    fn test_observer_receives_statistics() {
        #[derive(Default)]
        struct Stats {
            lines: usize,
            discarded: Vec<usize>,
            framed: Option<(usize, usize)>,
        }

        struct Recorder(Arc<Mutex<Stats>>);

        impl FramerObserver for Recorder {
            fn line_read(&mut self, _line: &[u8]) {
                self.0.lock().unwrap().lines += 1;
            }
            fn start_found(&mut self, discarded: usize) {
                self.0.lock().unwrap().discarded.push(discarded);
            }
            fn telegram_framed(&mut self, lines_read: usize, telegram_lines: usize, _elapsed: Duration) {
                self.0.lock().unwrap().framed = Some((lines_read, telegram_lines));
            }
        }

        let stats = Arc::new(Mutex::new(Stats::default()));
        let source = BufReadLines::new("junk\n/A\ndata\n!\n".as_bytes());
        let mut framer = Framer::with_observer(source, Box::new(Recorder(stats.clone())));
        framer.frame().unwrap();

        let stats = stats.lock().unwrap();
        assert_eq!(stats.lines, 4);
        assert_eq!(stats.discarded, vec![1]);
        assert_eq!(stats.framed, Some((4, 3)));
    }
}
