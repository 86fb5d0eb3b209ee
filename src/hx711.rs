//! Bit-banged driver for the HX711 load cell amplifier, wired to two GPIO
//! pins. Readings are raw 24-bit two's-complement counts; converting counts
//! to grams is the job of [`crate::weight`] and the persisted scale record.

use std::time::{Duration, Instant};
use std::thread;

use log::debug;
use rppal::gpio::{InputPin, Level, OutputPin};

use crate::sampler::{DeviceError, LoadCell, ReadPrimitive};

const RESET_PULSE: Duration = Duration::from_micros(120);
const POWER_DOWN_SETTLE: Duration = Duration::from_micros(80);
const READY_POLL: Duration = Duration::from_millis(1);

pub struct Config {
    pub dout: InputPin,
    pub pd_sck: OutputPin,
    pub gain: Gain,
    /// Upper bound on the data-ready wait for settled reads. `None` blocks
    /// until the amplifier produces a conversion.
    pub ready_timeout: Option<Duration>,
}

/// Channel/gain selection for the conversion following each read.
pub enum Gain {
    /// Channel A, gain 128 (1 extra clock pulse).
    G128,
    /// Channel A, gain 64 (3 extra clock pulses).
    G64,
    /// Channel B, gain 32 (2 extra clock pulses).
    G32,
}

pub struct Scale {
    dout: InputPin,
    pd_sck: OutputPin,
    gain: Gain,
    ready_timeout: Option<Duration>,
}

impl Scale {
    pub fn new(c: Config) -> Self {
        Self {
            dout: c.dout,
            pd_sck: c.pd_sck,
            gain: c.gain,
            ready_timeout: c.ready_timeout,
        }
    }

    /// Resets the ADC (clock held high for min 60us), default gain after
    /// boot is 128.
    pub fn reset(&mut self) {
        self.pd_sck.set_high();
        thread::sleep(RESET_PULSE);
        self.pd_sck.set_low();
    }

    /// True when dout is low, which indicates data is ready for read.
    pub fn is_ready(&self) -> bool {
        self.dout.is_low()
    }

    fn wait_ready(&mut self) -> Result<(), DeviceError> {
        let started = Instant::now();

        while !self.is_ready() {
            if let Some(limit) = self.ready_timeout {
                if started.elapsed() > limit {
                    return Err(DeviceError::NotReady);
                }
            }
            thread::sleep(READY_POLL);
        }

        Ok(())
    }

    fn send_pulse(&mut self) -> Result<(), DeviceError> {
        match self.pd_sck.is_set_high() {
            true => Err(DeviceError::BusFault),
            false => {
                self.pd_sck.set_high();
                self.pd_sck.set_low();

                Ok(())
            }
        }
    }

    /// Clocks out the pending 24-bit conversion & sets gain for future com.
    fn read_bits(&mut self) -> Result<i32, DeviceError> {
        let mut buff: u32 = 0;

        for _ in 0..24 {
            self.send_pulse()?;
            thread::sleep(Duration::from_nanos(100));
            buff <<= 1;
            buff |= match self.dout.read() {
                Level::Low => 0b0,
                Level::High => 0b1,
            };
        }

        // 25/27/26 total pulses select channel & gain for the next conversion.
        for _ in 0..match self.gain {
            Gain::G128 => 1,
            Gain::G64 => 3,
            Gain::G32 => 2,
        } {
            self.send_pulse()?;
        }

        // Sign-extend the 24-bit two's-complement count.
        let raw = if buff & 0x80_0000 != 0 {
            (buff | 0xFF00_0000) as i32
        } else {
            buff as i32
        };

        Ok(raw)
    }
}

impl LoadCell for Scale {
    fn capabilities(&self) -> &[ReadPrimitive] {
        &[ReadPrimitive::Single, ReadPrimitive::Raw]
    }

    fn read_single(&mut self) -> Result<f64, DeviceError> {
        self.wait_ready()?;
        let raw = self.read_bits()?;
        debug!("hx711 raw count {}", raw);

        Ok(raw as f64)
    }

    fn read_raw(&mut self) -> Result<f64, DeviceError> {
        if !self.is_ready() {
            return Err(DeviceError::NotReady);
        }

        Ok(self.read_bits()? as f64)
    }

    fn power_down(&mut self) -> Result<(), DeviceError> {
        self.pd_sck.set_low();
        self.pd_sck.set_high();
        thread::sleep(POWER_DOWN_SETTLE);

        Ok(())
    }

    fn power_up(&mut self) -> Result<(), DeviceError> {
        self.pd_sck.set_low();

        Ok(())
    }
}
