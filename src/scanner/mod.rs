//! Barcode scanner input
//!
//! The scanner is attached either as a USB keyboard wedge (line-delimited
//! text on a stream) or on a COM/RS232 port read byte by byte until CR or
//! LF. Reads block until end-of-line; that wait is operator-paced and has no
//! timeout or cancellation.

pub mod input;

pub use input::{validate_serial, InputManager, InputSource, SourceStatus};

use std::io::{self, BufRead, BufReader, Read};
use std::time::Duration;

use crate::errors::StationError;

/// Byte source for COM mode. `read_byte` returns `None` for an empty read
/// (port timeout), which the scan loop skips.
pub trait ScanPort: Send {
    fn read_byte(&mut self) -> io::Result<Option<u8>>;
}

/// [`ScanPort`] over a real serial port
struct ComPort {
    port: Box<dyn serialport::SerialPort>,
}

impl ScanPort for ComPort {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        match self.port.read(&mut buf) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(buf[0])),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(None),
            Err(e) => Err(e),
        }
    }
}

enum ScannerSource {
    /// Line-delimited text stream (USB keyboard wedge)
    Usb(Box<dyn BufRead + Send>),

    /// Raw byte port (COM/RS232)
    Com(Box<dyn ScanPort>),
}

/// Reads barcodes from a USB or COM scanner
pub struct BarcodeScanner {
    source: ScannerSource,
}

impl BarcodeScanner {
    /// USB mode over an arbitrary text stream
    pub fn usb(input: Box<dyn BufRead + Send>) -> Self {
        Self {
            source: ScannerSource::Usb(input),
        }
    }

    /// USB mode reading from stdin
    pub fn usb_stdin() -> Self {
        Self::usb(Box::new(BufReader::new(io::stdin())))
    }

    /// COM mode on `port_name` at `baudrate`.
    ///
    /// The port is opened immediately so callers learn about a bad port up
    /// front. The 1s timeout only bounds single reads; `scan` retries empty
    /// reads indefinitely.
    pub fn com(port_name: &str, baudrate: u32) -> Result<Self, StationError> {
        let port = serialport::new(port_name, baudrate)
            .timeout(Duration::from_secs(1))
            .open()?;
        Ok(Self {
            source: ScannerSource::Com(Box::new(ComPort { port })),
        })
    }

    /// COM mode over an injected port (tests)
    pub fn com_with_port(port: Box<dyn ScanPort>) -> Self {
        Self {
            source: ScannerSource::Com(port),
        }
    }

    /// Return the next scanned barcode string.
    ///
    /// USB mode reads one line and trims it. COM mode accumulates bytes
    /// until CR or LF, discarding empty reads and leading terminators.
    pub fn scan(&mut self) -> Result<String, StationError> {
        match &mut self.source {
            ScannerSource::Usb(input) => {
                let mut line = String::new();
                let n = input.read_line(&mut line)?;
                if n == 0 {
                    return Err(StationError::Scanner("scanner stream closed".to_string()));
                }
                Ok(line.trim().to_string())
            }
            ScannerSource::Com(port) => {
                let mut bytes = Vec::new();
                loop {
                    match port.read_byte()? {
                        None => continue,
                        Some(b'\r') | Some(b'\n') => {
                            if bytes.is_empty() {
                                continue;
                            }
                            break;
                        }
                        Some(byte) => bytes.push(byte),
                    }
                }
                Ok(String::from_utf8_lossy(&bytes).into_owned())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    struct ScriptedPort {
        bytes: Vec<Option<u8>>,
        pos: usize,
    }

    impl ScanPort for ScriptedPort {
        fn read_byte(&mut self) -> io::Result<Option<u8>> {
            let byte = self.bytes.get(self.pos).copied().flatten();
            self.pos += 1;
            Ok(byte)
        }
    }

    #[test]
    fn test_usb_scan_trims_line() {
        let mut scanner = BarcodeScanner::usb(Box::new(Cursor::new(b"SN12345678\r\n".to_vec())));
        assert_eq!(scanner.scan().unwrap(), "SN12345678");
    }

    #[test]
    fn test_com_scan_skips_empty_reads_and_leading_terminators() {
        let mut bytes: Vec<Option<u8>> = vec![None, Some(b'\n'), None];
        bytes.extend(b"AB12".iter().map(|b| Some(*b)));
        bytes.push(None);
        bytes.push(Some(b'\r'));
        let mut scanner = BarcodeScanner::com_with_port(Box::new(ScriptedPort { bytes, pos: 0 }));
        assert_eq!(scanner.scan().unwrap(), "AB12");
    }

    #[test]
    fn test_usb_scan_on_closed_stream_fails() {
        let mut scanner = BarcodeScanner::usb(Box::new(Cursor::new(Vec::new())));
        assert!(scanner.scan().is_err());
    }
}
