//! Serial QR scanner. The scanner pushes one line per decoded code over its
//! UART at 9600 8N1; the test opens the port for the duration of one scan and
//! blocks until a non-empty line arrives.

use std::fmt::Display;
use std::time::Duration;

use log::debug;
use rppal::uart::{Parity, Uart};

#[derive(Debug)]
pub enum QrError {
    Uart(rppal::uart::Error),
}

impl Display for QrError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QrError::Uart(e) => write!(f, "QR scanner serial failure: {e}"),
        }
    }
}

impl std::error::Error for QrError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            QrError::Uart(e) => Some(e),
        }
    }
}

impl From<rppal::uart::Error> for QrError {
    fn from(e: rppal::uart::Error) -> Self {
        QrError::Uart(e)
    }
}

/// Scoped handle on the scanner's serial port; the port closes when the
/// handle drops.
pub struct QrScanner {
    uart: Uart,
    pending: Vec<u8>,
}

impl QrScanner {
    pub fn open(path: &str, baud_rate: u32) -> Result<Self, QrError> {
        let mut uart = Uart::with_path(path, baud_rate, Parity::None, 8, 1)?;
        // Block until at least one byte is available.
        uart.set_read_mode(1, Duration::ZERO)?;

        Ok(Self {
            uart,
            pending: Vec::new(),
        })
    }

    /// Blocks until the scanner delivers a non-empty line and returns it
    /// trimmed.
    pub fn wait_for_scan(&mut self) -> Result<String, QrError> {
        let mut buf = [0u8; 256];
        loop {
            if let Some(line) = take_line(&mut self.pending) {
                if !line.is_empty() {
                    debug!("scanned {line}");
                    return Ok(line);
                }
                continue;
            }

            let n = self.uart.read(&mut buf)?;
            self.pending.extend_from_slice(&buf[..n]);
        }
    }
}

/// Pops the first complete line off `pending`, trimmed of whitespace.
fn take_line(pending: &mut Vec<u8>) -> Option<String> {
    let newline = pending.iter().position(|&b| b == b'\n')?;
    let line: Vec<u8> = pending.drain(..=newline).collect();

    Some(String::from_utf8_lossy(&line).trim().to_string())
}
