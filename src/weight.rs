//! Calibrated weight readings.
//!
//! One averaged raw sample through the bound primitive, then the stored
//! offset/scale conversion. The post-read power cycle is best effort; the
//! amplifier not powering down is never a reason to fail a reading.

use std::fmt::Display;
use std::thread;
use std::time::Duration;

use log::debug;

use crate::sampler::{DeviceError, LoadCell, SampleSource};
use crate::store::ScaleConfig;

const POWER_CYCLE_PAUSE: Duration = Duration::from_millis(100);

#[derive(Debug)]
pub enum WeightError {
    /// The supplied config would divide by zero. Normally caught at load
    /// time; checked again here so a hand-built config can never divide.
    ZeroReferenceUnit,
    Device(DeviceError),
}

impl Display for WeightError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeightError::ZeroReferenceUnit => {
                write!(f, "scale config has a zero reference unit")
            }
            WeightError::Device(e) => write!(f, "device failure while reading weight: {e}"),
        }
    }
}

impl std::error::Error for WeightError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WeightError::Device(e) => Some(e),
            WeightError::ZeroReferenceUnit => None,
        }
    }
}

impl From<DeviceError> for WeightError {
    fn from(e: DeviceError) -> Self {
        WeightError::Device(e)
    }
}

/// Reads an averaged weight in grams: `(raw - zero_offset) / reference_unit`
/// over `count` raw readings.
pub fn read<D: LoadCell>(
    source: &mut SampleSource<D>,
    config: &ScaleConfig,
    count: usize,
) -> Result<f64, WeightError> {
    if config.reference_unit == 0.0 {
        return Err(WeightError::ZeroReferenceUnit);
    }

    let raw = source.sample(count)?;
    let grams = (raw - config.zero_offset) / config.reference_unit;
    debug!("raw={raw:.2} -> {grams:.2}g");

    rest(source);

    Ok(grams)
}

// Power cycle to save energy between readings; failures are ignored.
fn rest<D: LoadCell>(source: &mut SampleSource<D>) {
    if source.power_down().is_err() {
        return;
    }
    thread::sleep(POWER_CYCLE_PAUSE);
    let _ = source.power_up();
}
