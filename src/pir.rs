//! PIR motion sensor test. The sensor output floats low through a pull-down;
//! after power-up it needs a settle window before its output means anything.
//! A sensor still reporting high after that window is miswired or missing,
//! and the test refuses to run rather than pass on a stuck line.

use std::fmt::Display;
use std::thread;
use std::time::{Duration, Instant};

use log::info;

use crate::gpio::LevelProbe;

#[derive(Debug)]
pub enum PirError {
    /// Output was still high after the settle window.
    StuckHigh { settle: Duration },
}

impl Display for PirError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PirError::StuckHigh { settle } => write!(
                f,
                "PIR output stuck high after {settle:?} settle window, check the wiring"
            ),
        }
    }
}

impl std::error::Error for PirError {}

pub struct PirSensor<P: LevelProbe> {
    pin: P,
}

impl<P: LevelProbe> PirSensor<P> {
    /// Waits out the settle window, then verifies the output has gone low.
    pub fn settle(pin: P, settle: Duration) -> Result<Self, PirError> {
        info!("waiting {settle:?} for PIR to settle");
        thread::sleep(settle);

        if pin.is_high() {
            return Err(PirError::StuckHigh { settle });
        }

        Ok(Self { pin })
    }

    /// Blocks until motion is seen or the timeout passes.
    pub fn detect_motion(&self, timeout: Duration, poll_interval: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.pin.is_high() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(poll_interval);
        }
    }
}
