//! Serial input source selection
//!
//! Operators either type serials at the console or scan them; the manager
//! switches between the manual prompt and the USB/COM scanner at runtime.

use std::fmt;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

use tracing::warn;

use crate::errors::StationError;
use crate::scanner::BarcodeScanner;

/// Accepted serial shape: 4-20 alphanumeric characters
pub fn validate_serial(serial: &str) -> bool {
    let len = serial.chars().count();
    (4..=20).contains(&len) && serial.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Selectable input source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    Manual,
    ScannerUsb,
    ScannerCom,
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputSource::Manual => f.write_str("manual"),
            InputSource::ScannerUsb => f.write_str("scanner-USB"),
            InputSource::ScannerCom => f.write_str("scanner-COM"),
        }
    }
}

impl FromStr for InputSource {
    type Err = StationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(InputSource::Manual),
            "scanner-USB" => Ok(InputSource::ScannerUsb),
            "scanner-COM" => Ok(InputSource::ScannerCom),
            other => Err(StationError::Scanner(format!("unknown source: {}", other))),
        }
    }
}

/// Health of the currently selected source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceStatus {
    Available,
    Error,
}

impl fmt::Display for SourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceStatus::Available => f.write_str("available"),
            SourceStatus::Error => f.write_str("error"),
        }
    }
}

/// Prompting function for manual entry: receives the prompt, returns one raw
/// line of input.
pub type PromptFn = Box<dyn FnMut(&str) -> io::Result<String> + Send>;

/// Notification function for validation feedback shown to the operator
pub type NotifyFn = Box<dyn FnMut(&str) + Send>;

fn stdin_prompt() -> PromptFn {
    Box::new(|prompt| {
        print!("{}", prompt);
        io::stdout().flush()?;
        let mut line = String::new();
        let n = io::stdin().lock().read_line(&mut line)?;
        if n == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"));
        }
        Ok(line)
    })
}

fn stdout_notify() -> NotifyFn {
    Box::new(|message| println!("{}", message))
}

/// Switches between manual keyboard entry and scanner-based acquisition
pub struct InputManager {
    com_port: Option<String>,
    baudrate: u32,
    scanner: Option<BarcodeScanner>,
    source: InputSource,
    status: SourceStatus,
    prompt: PromptFn,
    notify: NotifyFn,
}

impl InputManager {
    /// Manager starting in manual mode, prompting on stdin/stdout
    pub fn new(com_port: Option<String>, baudrate: u32) -> Self {
        Self {
            com_port,
            baudrate,
            scanner: None,
            source: InputSource::Manual,
            status: SourceStatus::Available,
            prompt: stdin_prompt(),
            notify: stdout_notify(),
        }
    }

    /// Replace the manual-entry prompt function (tests, embedding)
    pub fn with_prompt(mut self, prompt: PromptFn) -> Self {
        self.prompt = prompt;
        self
    }

    /// Replace the operator notification function
    pub fn with_notify(mut self, notify: NotifyFn) -> Self {
        self.notify = notify;
        self
    }

    /// Currently selected source
    pub fn current_source(&self) -> InputSource {
        self.source
    }

    /// Status of the current source
    pub fn status(&self) -> SourceStatus {
        self.status
    }

    /// Switch to `source` and report `(current_source, status)`.
    ///
    /// A COM scanner that fails to open leaves the source selected with
    /// status `error`; reads will then fail until the source is switched
    /// again.
    pub fn set_source(&mut self, source: InputSource) -> (InputSource, SourceStatus) {
        self.close();
        self.status = SourceStatus::Available;

        match source {
            InputSource::Manual => {}
            InputSource::ScannerUsb => {
                self.scanner = Some(BarcodeScanner::usb_stdin());
            }
            InputSource::ScannerCom => {
                let port = self.com_port.as_deref().unwrap_or_default();
                match BarcodeScanner::com(port, self.baudrate) {
                    Ok(scanner) => self.scanner = Some(scanner),
                    Err(e) => {
                        warn!("Failed to open COM scanner on {:?}: {}", self.com_port, e);
                        self.status = SourceStatus::Error;
                    }
                }
            }
        }

        self.source = source;
        (self.source, self.status)
    }

    /// Install a pre-built scanner for `source` (tests)
    pub fn set_scanner(&mut self, source: InputSource, scanner: BarcodeScanner) {
        self.close();
        self.status = SourceStatus::Available;
        self.scanner = Some(scanner);
        self.source = source;
    }

    /// Read one serial using the currently selected source.
    ///
    /// Manual mode re-prompts until the serial validates; scanner modes
    /// return the scanned string as-is.
    pub fn read_serial(&mut self, prompt: &str) -> Result<String, StationError> {
        match self.source {
            InputSource::Manual => loop {
                let line = (self.prompt)(prompt)?;
                let value = line.trim();
                if validate_serial(value) {
                    return Ok(value.to_string());
                }
                (self.notify)("Invalid serial. Please enter 4-20 alphanumeric characters.");
            },
            InputSource::ScannerUsb | InputSource::ScannerCom => match &mut self.scanner {
                Some(scanner) => scanner.scan(),
                None => Err(StationError::Scanner("scanner not initialised".to_string())),
            },
        }
    }

    /// Drop any active scanner
    pub fn close(&mut self) {
        self.scanner = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_serial() {
        assert!(validate_serial("AB12"));
        assert!(validate_serial("SN1234567890"));
        assert!(!validate_serial("AB1"));
        assert!(!validate_serial(""));
        assert!(!validate_serial("AB 12"));
        assert!(!validate_serial("X".repeat(21).as_str()));
    }

    #[test]
    fn test_manual_reprompts_until_valid() {
        let inputs = std::sync::Arc::new(std::sync::Mutex::new(vec![
            "ok".to_string(),
            "SN123456".to_string(),
        ]));
        let feed = std::sync::Arc::clone(&inputs);
        let rejected = std::sync::Arc::new(std::sync::Mutex::new(0u32));
        let counter = std::sync::Arc::clone(&rejected);

        let mut mgr = InputManager::new(None, 9600)
            .with_prompt(Box::new(move |_| {
                let mut feed = feed.lock().unwrap();
                Ok(feed.remove(0))
            }))
            .with_notify(Box::new(move |_| {
                *counter.lock().unwrap() += 1;
            }));

        assert_eq!(mgr.read_serial("Enter serial: ").unwrap(), "SN123456");
        assert_eq!(*rejected.lock().unwrap(), 1);
        assert_eq!(inputs.lock().unwrap().len(), 0);
    }

    #[test]
    fn test_set_source_reports_source_and_status() {
        let mut mgr = InputManager::new(None, 9600);
        let (source, status) = mgr.set_source(InputSource::Manual);
        assert_eq!(source, InputSource::Manual);
        assert_eq!(status, SourceStatus::Available);

        // No COM port configured: the source switches but reports an error.
        let (source, status) = mgr.set_source(InputSource::ScannerCom);
        assert_eq!(source, InputSource::ScannerCom);
        assert_eq!(status, SourceStatus::Error);
        assert!(mgr.read_serial("").is_err());
    }
}
