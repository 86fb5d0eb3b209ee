//! Two-phase load cell calibration.
//!
//! Phase one captures the zero offset with an empty platform, phase two
//! captures an averaged reading under a known mass and derives the reference
//! unit (raw counts per gram). Cancelling at any confirmation point aborts
//! with nothing sampled further and nothing persisted; persisting the result
//! is the caller's step, so a failed save can still surface the values.

use std::fmt::Display;

use log::info;

use crate::operator::Operator;
use crate::sampler::{DeviceError, LoadCell, SampleSource};

/// Readings averaged for the zero-offset capture.
pub const ZERO_PHASE_SAMPLES: usize = 20;
/// Readings averaged for the known-mass capture.
pub const LOAD_PHASE_SAMPLES: usize = 100;

/// Where in the protocol a failure or cancellation happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    AwaitingZeroConfirm,
    SamplingZero,
    AwaitingMassInput,
    AwaitingLoadConfirm,
    SamplingLoaded,
}

#[derive(Debug)]
pub enum CalibrationError {
    /// Known mass was zero, negative, or not a finite number.
    InvalidMass(f64),
    /// Operator cancelled at the given stage.
    Cancelled(Stage),
    /// Device failure at the given stage.
    Device { stage: Stage, source: DeviceError },
}

impl Display for CalibrationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalibrationError::InvalidMass(grams) => {
                write!(f, "known mass must be a positive number of grams, got {grams}")
            }
            CalibrationError::Cancelled(stage) => {
                write!(f, "calibration cancelled at {stage:?}")
            }
            CalibrationError::Device { stage, source } => {
                write!(f, "device failure at {stage:?}: {source}")
            }
        }
    }
}

impl std::error::Error for CalibrationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CalibrationError::Device { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Either fully computed or absent, never partial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationResult {
    /// Raw count of the empty platform.
    pub offset: f64,
    /// Raw counts per gram.
    pub reference_unit: f64,
}

/// Runs the interactive two-phase procedure against a live sample source.
pub fn run<D: LoadCell, O: Operator>(
    source: &mut SampleSource<D>,
    operator: &mut O,
) -> Result<CalibrationResult, CalibrationError> {
    if !operator.confirm("Make sure the platform is empty") {
        return Err(CalibrationError::Cancelled(Stage::AwaitingZeroConfirm));
    }

    info!("sampling zero offset over {ZERO_PHASE_SAMPLES} readings");
    let offset = source
        .sample(ZERO_PHASE_SAMPLES)
        .map_err(|source| CalibrationError::Device {
            stage: Stage::SamplingZero,
            source,
        })?;
    operator.message(&format!("Offset (raw zero count): {offset:.2}"));

    let known_grams = operator
        .read_grams("Place a known mass on the platform and enter its weight in grams")
        .ok_or(CalibrationError::Cancelled(Stage::AwaitingMassInput))?;
    if !known_grams.is_finite() || known_grams <= 0.0 {
        return Err(CalibrationError::InvalidMass(known_grams));
    }

    if !operator.confirm("Press Enter when the mass is stable and settled") {
        return Err(CalibrationError::Cancelled(Stage::AwaitingLoadConfirm));
    }

    info!("sampling loaded platform over {LOAD_PHASE_SAMPLES} readings");
    let raw_loaded = source
        .sample(LOAD_PHASE_SAMPLES)
        .map_err(|source| CalibrationError::Device {
            stage: Stage::SamplingLoaded,
            source,
        })?;
    operator.message(&format!("Raw reading with mass: {raw_loaded:.2}"));

    let reference_unit = (raw_loaded - offset) / known_grams;
    operator.message(&format!(
        "Suggested reference unit (counts per gram): {reference_unit:.2}"
    ));

    Ok(CalibrationResult {
        offset,
        reference_unit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::testing::Scripted;
    use crate::sampler::testing::SimCell;
    use crate::sampler::ReadPrimitive;

    fn source_with(readings: Vec<f64>) -> SampleSource<SimCell> {
        SampleSource::bind(SimCell::new(vec![ReadPrimitive::Single], readings)).unwrap()
    }

    #[test]
    fn derives_reference_unit_from_both_phases() {
        // 20 zero readings at 477000, then 100 loaded readings at 500000.
        let mut readings = vec![477_000.0; ZERO_PHASE_SAMPLES];
        readings.extend(vec![500_000.0; LOAD_PHASE_SAMPLES]);
        let mut source = source_with(readings);
        let mut operator = Scripted::new(vec![true, true], vec![Some(1350.0)]);

        let result = run(&mut source, &mut operator).unwrap();

        assert_eq!(result.offset, 477_000.0);
        assert!((result.reference_unit - 23_000.0 / 1350.0).abs() < 1e-9);
    }

    #[test]
    fn zero_mass_is_rejected_before_load_sampling() {
        let mut source = source_with(vec![477_000.0]);
        let mut operator = Scripted::new(vec![true, true], vec![Some(0.0)]);

        match run(&mut source, &mut operator) {
            Err(CalibrationError::InvalidMass(grams)) => assert_eq!(grams, 0.0),
            other => panic!("expected InvalidMass, got {other:?}"),
        }
        // The settle confirmation never ran.
        assert_eq!(operator.confirms.len(), 1);
    }

    #[test]
    fn zero_mass_leaves_only_zero_phase_draws_on_the_device() {
        let cell = SimCell::new(vec![ReadPrimitive::Single], vec![477_000.0]);
        let reads = cell.reads.clone();
        let mut source = SampleSource::bind(cell).unwrap();
        let mut operator = Scripted::new(vec![true, true], vec![Some(-5.0)]);

        assert!(matches!(
            run(&mut source, &mut operator),
            Err(CalibrationError::InvalidMass(_))
        ));
        assert_eq!(*reads.borrow(), ZERO_PHASE_SAMPLES);
    }

    #[test]
    fn cancel_before_zero_phase_samples_nothing() {
        let cell = SimCell::new(vec![ReadPrimitive::Single], vec![0.0]);
        let reads = cell.reads.clone();
        let mut source = SampleSource::bind(cell).unwrap();
        let mut operator = Scripted::new(vec![false], vec![]);

        assert!(matches!(
            run(&mut source, &mut operator),
            Err(CalibrationError::Cancelled(Stage::AwaitingZeroConfirm))
        ));
        assert_eq!(*reads.borrow(), 0);
    }

    #[test]
    fn cancel_at_mass_input_reports_that_stage() {
        let mut source = source_with(vec![477_000.0]);
        let mut operator = Scripted::new(vec![true], vec![None]);

        assert!(matches!(
            run(&mut source, &mut operator),
            Err(CalibrationError::Cancelled(Stage::AwaitingMassInput))
        ));
    }

    #[test]
    fn cancel_at_settle_confirm_skips_the_load_phase() {
        let cell = SimCell::new(vec![ReadPrimitive::Single], vec![477_000.0]);
        let reads = cell.reads.clone();
        let mut source = SampleSource::bind(cell).unwrap();
        let mut operator = Scripted::new(vec![true, false], vec![Some(1350.0)]);

        assert!(matches!(
            run(&mut source, &mut operator),
            Err(CalibrationError::Cancelled(Stage::AwaitingLoadConfirm))
        ));
        assert_eq!(*reads.borrow(), ZERO_PHASE_SAMPLES);
    }
}
