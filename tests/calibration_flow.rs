//! End-to-end calibration flow against simulated hardware: calibrate,
//! persist, read back, convert.

use std::fs;
use std::path::PathBuf;

use rig_bench_lib::calibration::{self, CalibrationError, Stage, ZERO_PHASE_SAMPLES};
use rig_bench_lib::operator::Operator;
use rig_bench_lib::sampler::{DeviceError, LoadCell, ReadPrimitive, SampleSource};
use rig_bench_lib::store::ConfigStore;
use rig_bench_lib::weight;

/// Amplifier stand-in: the platform is empty for the zero phase and carries
/// the reference mass for every read after it.
struct BenchCell {
    reads: usize,
    empty_count: f64,
    loaded_count: f64,
}

impl BenchCell {
    fn new(empty_count: f64, loaded_count: f64) -> Self {
        Self {
            reads: 0,
            empty_count,
            loaded_count,
        }
    }
}

impl LoadCell for BenchCell {
    fn capabilities(&self) -> &[ReadPrimitive] {
        &[ReadPrimitive::Single, ReadPrimitive::Raw]
    }

    fn read_single(&mut self) -> Result<f64, DeviceError> {
        self.reads += 1;
        Ok(if self.reads <= ZERO_PHASE_SAMPLES {
            self.empty_count
        } else {
            self.loaded_count
        })
    }
}

/// Operator who confirms every step and knows the reference mass.
struct BenchOperator {
    known_grams: Option<f64>,
}

impl Operator for BenchOperator {
    fn message(&mut self, _text: &str) {}

    fn confirm(&mut self, _prompt: &str) -> bool {
        true
    }

    fn read_grams(&mut self, _prompt: &str) -> Option<f64> {
        self.known_grams
    }
}

struct Scratch {
    dir: PathBuf,
}

impl Scratch {
    fn new(name: &str) -> Self {
        let dir =
            std::env::temp_dir().join(format!("rig-bench-flow-{}-{name}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        Self { dir }
    }

    fn record(&self) -> PathBuf {
        self.dir.join("scale.json")
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.dir);
    }
}

#[test]
fn calibrate_persist_and_read_back() {
    let scratch = Scratch::new("happy-path");
    let store = ConfigStore::new(scratch.record());

    let mut source = SampleSource::bind(BenchCell::new(477_000.0, 500_000.0)).unwrap();
    let mut operator = BenchOperator {
        known_grams: Some(1350.0),
    };

    let result = calibration::run(&mut source, &mut operator).unwrap();
    assert_eq!(result.offset, 477_000.0);
    assert!((result.reference_unit - 17.037).abs() < 1e-3);

    store.save(result.offset, result.reference_unit).unwrap();

    // A fresh load plus a fresh reading reports the known mass back.
    let config = store.load().unwrap();
    let grams = weight::read(&mut source, &config, 30).unwrap();
    assert!((grams - 1350.0).abs() < 1e-6);
}

#[test]
fn cancelling_at_mass_input_leaves_the_record_untouched() {
    let scratch = Scratch::new("cancel");
    let store = ConfigStore::new(scratch.record());
    store.save(123_456.0, 42.0).unwrap();
    let before = store.load().unwrap();

    let mut source = SampleSource::bind(BenchCell::new(477_000.0, 500_000.0)).unwrap();
    let mut operator = BenchOperator { known_grams: None };

    let outcome = calibration::run(&mut source, &mut operator);
    assert!(matches!(
        outcome,
        Err(CalibrationError::Cancelled(Stage::AwaitingMassInput))
    ));

    assert_eq!(store.load().unwrap(), before);
}
