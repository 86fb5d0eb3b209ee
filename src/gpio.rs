//! Thin level-read/level-write seams over `rppal` pins so the polling
//! peripherals can be driven by scripted levels in tests.

use rppal::gpio::{InputPin, OutputPin};

pub trait LevelProbe {
    fn is_high(&self) -> bool;

    fn is_low(&self) -> bool {
        !self.is_high()
    }
}

impl LevelProbe for InputPin {
    fn is_high(&self) -> bool {
        InputPin::is_high(self)
    }
}

pub trait SwitchOutput {
    fn set_high(&mut self);
    fn set_low(&mut self);
}

impl SwitchOutput for OutputPin {
    fn set_high(&mut self) {
        OutputPin::set_high(self)
    }

    fn set_low(&mut self) {
        OutputPin::set_low(self)
    }
}
