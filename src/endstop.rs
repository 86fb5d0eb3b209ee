//! Mechanical endstop switch tests. Switches are wired against an internal
//! pull-up, so a press pulls the pin low. A full test is a press followed by
//! a release, each within its own timeout window.

use std::thread;
use std::time::{Duration, Instant};

use log::info;

use crate::gpio::LevelProbe;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

fn wait_until<P: LevelProbe>(pin: &P, pressed: bool, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if pin.is_low() == pressed {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(POLL_INTERVAL);
    }
}

pub fn wait_for_press<P: LevelProbe>(pin: &P, timeout: Duration) -> bool {
    wait_until(pin, true, timeout)
}

pub fn wait_for_release<P: LevelProbe>(pin: &P, timeout: Duration) -> bool {
    wait_until(pin, false, timeout)
}

/// Full press-and-release test on one switch.
pub fn test_endstop<P: LevelProbe>(pin: &P, label: &str, timeout: Duration) -> bool {
    info!("endstop {label}: waiting up to {timeout:?} for press");
    if !wait_for_press(pin, timeout) {
        info!("endstop {label}: timeout waiting for press");
        return false;
    }

    info!("endstop {label}: press detected, waiting up to {timeout:?} for release");
    if !wait_for_release(pin, timeout) {
        info!("endstop {label}: timeout waiting for release");
        return false;
    }

    info!("endstop {label}: release detected");
    true
}

/// Flexible two-switch test: the operator may press either switch first. The
/// first press is attributed to whichever switch reports it, that switch
/// completes its release, then the other one runs a full press-and-release.
pub fn test_endstop_pair<P: LevelProbe>(
    first: &P,
    second: &P,
    labels: (&str, &str),
    timeout: Duration,
) -> bool {
    info!(
        "endstop pair: press either {} or {} within {timeout:?}",
        labels.0, labels.1
    );

    let deadline = Instant::now() + timeout;
    let (pressed, remaining, pressed_label, remaining_label) = loop {
        if first.is_low() {
            break (first, second, labels.0, labels.1);
        }
        if second.is_low() {
            break (second, first, labels.1, labels.0);
        }
        if Instant::now() >= deadline {
            info!("endstop pair: timeout, neither switch was pressed");
            return false;
        }
        thread::sleep(POLL_INTERVAL);
    };

    info!("endstop {pressed_label}: press detected");
    if !wait_for_release(pressed, timeout) {
        info!("endstop {pressed_label}: timeout waiting for release");
        return false;
    }
    info!("endstop {pressed_label}: release detected");

    test_endstop(remaining, remaining_label, timeout)
}
