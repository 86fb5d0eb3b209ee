//! Device capability surface and raw sampling.
//!
//! A load cell amplifier may expose more than one way to pull a raw count
//! (device-side averaging, a single settled read, or a low-level raw read).
//! [`SampleSource::bind`] probes the capability set once, at construction,
//! and every later draw goes through the primitive selected there.

use std::fmt::Display;

use log::debug;

/// Read primitives a device may offer, in probe priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadPrimitive {
    /// Device-side averaging over n conversions.
    Averaged,
    /// One settled conversion (blocks until data is ready).
    Single,
    /// One immediate low-level conversion, may fail if data is not ready.
    Raw,
}

/// Fixed priority order used by [`SampleSource::bind`].
pub const PRIMITIVE_PRIORITY: [ReadPrimitive; 3] = [
    ReadPrimitive::Averaged,
    ReadPrimitive::Single,
    ReadPrimitive::Raw,
];

#[derive(Debug)]
pub enum DeviceError {
    /// The capability set was empty at bind time.
    NoReadPrimitive,
    /// The bound primitive is not actually implemented by the device.
    Unsupported(ReadPrimitive),
    /// Data line never signalled ready within the configured window.
    NotReady,
    /// Clock line was found in an unexpected state.
    BusFault,
}

impl Display for DeviceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceError::NoReadPrimitive => {
                write!(f, "device exposes no supported read primitive")
            }
            DeviceError::Unsupported(p) => {
                write!(f, "device does not implement the {:?} read primitive", p)
            }
            DeviceError::NotReady => write!(f, "device data line not ready"),
            DeviceError::BusFault => write!(f, "device clock line in unexpected state"),
        }
    }
}

impl std::error::Error for DeviceError {}

/// A load cell amplifier handle. Implementations advertise the primitives
/// they support through [`LoadCell::capabilities`]; the default method bodies
/// report the primitive as unsupported so a device only overrides what it
/// actually has.
pub trait LoadCell {
    fn capabilities(&self) -> &[ReadPrimitive];

    fn read_averaged(&mut self, n: usize) -> Result<f64, DeviceError> {
        let _ = n;
        Err(DeviceError::Unsupported(ReadPrimitive::Averaged))
    }

    fn read_single(&mut self) -> Result<f64, DeviceError> {
        Err(DeviceError::Unsupported(ReadPrimitive::Single))
    }

    fn read_raw(&mut self) -> Result<f64, DeviceError> {
        Err(DeviceError::Unsupported(ReadPrimitive::Raw))
    }

    /// Best-effort power management hooks, no-ops by default.
    fn power_down(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }

    fn power_up(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }
}

/// Draws raw counts from a [`LoadCell`] through the one primitive selected
/// at bind time.
pub struct SampleSource<D: LoadCell> {
    device: D,
    primitive: ReadPrimitive,
}

impl<D: LoadCell> SampleSource<D> {
    /// Probes the device capability set in [`PRIMITIVE_PRIORITY`] order and
    /// binds to the first primitive present. Fails with
    /// [`DeviceError::NoReadPrimitive`] when none is.
    pub fn bind(device: D) -> Result<Self, DeviceError> {
        let caps = device.capabilities();
        let primitive = PRIMITIVE_PRIORITY
            .iter()
            .copied()
            .find(|p| caps.contains(p))
            .ok_or(DeviceError::NoReadPrimitive)?;

        debug!("bound to {:?} read primitive", primitive);

        Ok(Self { device, primitive })
    }

    pub fn primitive(&self) -> ReadPrimitive {
        self.primitive
    }

    /// Draws `count` independent readings and returns their arithmetic mean.
    /// Every reading is kept, there is no outlier rejection, and any transport
    /// failure propagates.
    pub fn sample(&mut self, count: usize) -> Result<f64, DeviceError> {
        assert!(count >= 1, "sample count must be >= 1");

        let mut sum = 0_f64;
        for _ in 0..count {
            sum += self.draw()?;
        }

        Ok(sum / count as f64)
    }

    fn draw(&mut self) -> Result<f64, DeviceError> {
        match self.primitive {
            // An averaging device is still asked for single-conversion
            // averages so the mean is over `count` independent draws.
            ReadPrimitive::Averaged => self.device.read_averaged(1),
            ReadPrimitive::Single => self.device.read_single(),
            ReadPrimitive::Raw => self.device.read_raw(),
        }
    }

    pub fn power_down(&mut self) -> Result<(), DeviceError> {
        self.device.power_down()
    }

    pub fn power_up(&mut self) -> Result<(), DeviceError> {
        self.device.power_up()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Scripted stand-in for a real amplifier. Readings are served in order
    /// from `readings`, cycling on exhaustion; `reads` counts every draw.
    pub(crate) struct SimCell {
        caps: Vec<ReadPrimitive>,
        readings: Vec<f64>,
        pub(crate) reads: Rc<RefCell<usize>>,
    }

    impl SimCell {
        pub(crate) fn new(caps: Vec<ReadPrimitive>, readings: Vec<f64>) -> Self {
            Self {
                caps,
                readings,
                reads: Rc::new(RefCell::new(0)),
            }
        }

        fn next(&mut self) -> f64 {
            let mut n = self.reads.borrow_mut();
            let value = self.readings[*n % self.readings.len()];
            *n += 1;
            value
        }
    }

    impl LoadCell for SimCell {
        fn capabilities(&self) -> &[ReadPrimitive] {
            &self.caps
        }

        fn read_averaged(&mut self, _n: usize) -> Result<f64, DeviceError> {
            if !self.caps.contains(&ReadPrimitive::Averaged) {
                return Err(DeviceError::Unsupported(ReadPrimitive::Averaged));
            }
            Ok(self.next())
        }

        fn read_single(&mut self) -> Result<f64, DeviceError> {
            if !self.caps.contains(&ReadPrimitive::Single) {
                return Err(DeviceError::Unsupported(ReadPrimitive::Single));
            }
            Ok(self.next())
        }

        fn read_raw(&mut self) -> Result<f64, DeviceError> {
            if !self.caps.contains(&ReadPrimitive::Raw) {
                return Err(DeviceError::Unsupported(ReadPrimitive::Raw));
            }
            Ok(self.next())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::SimCell;
    use super::*;

    #[test]
    fn sample_returns_exact_arithmetic_mean() {
        let cell = SimCell::new(
            vec![ReadPrimitive::Single],
            vec![10.0, 20.0, 30.0, 40.0, 50.0],
        );
        let mut source = SampleSource::bind(cell).unwrap();

        assert_eq!(source.sample(5).unwrap(), 30.0);
    }

    #[test]
    fn sample_of_one_is_the_reading_itself() {
        let cell = SimCell::new(vec![ReadPrimitive::Raw], vec![477_428.75]);
        let mut source = SampleSource::bind(cell).unwrap();

        assert_eq!(source.sample(1).unwrap(), 477_428.75);
    }

    #[test]
    fn bind_prefers_averaged_over_single_and_raw() {
        let cell = SimCell::new(
            vec![
                ReadPrimitive::Raw,
                ReadPrimitive::Single,
                ReadPrimitive::Averaged,
            ],
            vec![1.0],
        );
        let source = SampleSource::bind(cell).unwrap();

        assert_eq!(source.primitive(), ReadPrimitive::Averaged);
    }

    #[test]
    fn bind_falls_back_to_raw_when_it_is_all_there_is() {
        let cell = SimCell::new(vec![ReadPrimitive::Raw], vec![1.0]);
        let source = SampleSource::bind(cell).unwrap();

        assert_eq!(source.primitive(), ReadPrimitive::Raw);
    }

    #[test]
    fn bind_fails_on_empty_capability_set() {
        let cell = SimCell::new(vec![], vec![]);

        match SampleSource::bind(cell) {
            Err(DeviceError::NoReadPrimitive) => {}
            other => panic!("expected NoReadPrimitive, got {:?}", other.err()),
        }
    }

    #[test]
    fn negative_counts_average_like_any_other() {
        let cell = SimCell::new(vec![ReadPrimitive::Single], vec![-100.0, 300.0]);
        let mut source = SampleSource::bind(cell).unwrap();

        assert_eq!(source.sample(2).unwrap(), 100.0);
    }
}
