//! Single-channel relay control. The boards on the rig are active-low: the
//! relay energizes when the control pin is driven low. Dropping the handle
//! releases the relay so a panicking test never leaves a lock energized.

use std::thread;
use std::time::Duration;

use log::info;

use crate::gpio::SwitchOutput;

pub struct Relay<O: SwitchOutput> {
    pin: O,
}

impl<O: SwitchOutput> Relay<O> {
    /// Takes the pin and drives it to the released state.
    pub fn new(mut pin: O) -> Self {
        pin.set_high();
        Self { pin }
    }

    /// Energizes the relay (closes the circuit).
    pub fn energize(&mut self) {
        self.pin.set_low();
    }

    /// De-energizes the relay (opens the circuit).
    pub fn release(&mut self) {
        self.pin.set_high();
    }

    /// On-for-duration then off.
    pub fn pulse(&mut self, duration: Duration) {
        info!("energizing relay for {duration:?}");
        self.energize();
        thread::sleep(duration);
        self.release();
    }
}

impl<O: SwitchOutput> Drop for Relay<O> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpio::testing::RecordingSwitch;

    #[test]
    fn pulse_drives_low_then_high() {
        let switch = RecordingSwitch::new();
        let transitions = switch.transitions.clone();

        let mut relay = Relay::new(switch);
        relay.pulse(Duration::from_millis(0));
        drop(relay);

        // released on construction, energized, released, released on drop
        assert_eq!(*transitions.borrow(), vec![true, false, true, true]);
    }

    #[test]
    fn drop_releases_an_energized_relay() {
        let switch = RecordingSwitch::new();
        let transitions = switch.transitions.clone();

        let mut relay = Relay::new(switch);
        relay.energize();
        drop(relay);

        assert_eq!(transitions.borrow().last(), Some(&true));
    }
}
