//! rig-bench is the interactive acceptance-test harness for the bench rig.
//! Each menu entry exercises one peripheral end to end and reports a
//! pass/fail; peripherals are opened at the start of an entry and released
//! when it finishes.
//!
//! ## Calibrate
//! Runs the two-phase load cell calibration and persists the result to the
//! scale record.
//!
//! ```bash
//! rig-bench --calibrate
//! ```
//!
//! ## Run
//! Starts the interactive test menu.
//!
//! ```bash
//! rig-bench # Reads settings from `~/.config/rig-bench/settings.toml` by default.
//!
//! rig-bench --help
//! ```
//!
//! ## Example settings
//! ```toml
//! # ~/.config/rig-bench/settings.toml
//! weight_readings = 30
//! left_lock_pin = 18
//! right_lock_pin = 27
//! buzzer_pin = 22
//! endstop_left_pin = 23
//! endstop_right_pin = 24
//! pir_pin = 17
//! qr_port = "/dev/ttyACM0"
//! ```

use std::error::Error;
use std::io;
use std::time::Duration;

use clap::Parser;
use log::{error, info, warn};
use rppal::gpio::Gpio;
use simple_logger::SimpleLogger;

mod cli_config;
mod init;

use crate::cli_config::{Args, HarnessSettings};
use crate::init::{bootstrap, open_scale};
use rig_bench_lib::calibration::{self, CalibrationError};
use rig_bench_lib::endstop::test_endstop_pair;
use rig_bench_lib::operator::{Console, Operator};
use rig_bench_lib::pir::PirSensor;
use rig_bench_lib::qr::QrScanner;
use rig_bench_lib::relay::Relay;
use rig_bench_lib::sampler::SampleSource;
use rig_bench_lib::store::ConfigStore;
use rig_bench_lib::{report, weight};

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    SimpleLogger::new()
        .with_level(match args.verbose {
            true => log::LevelFilter::Debug,
            false => log::LevelFilter::Warn,
        })
        .init()?;

    let (settings, store) = bootstrap(&args)?;
    info!("rig-bench ready, scale record at {}", store.path().display());

    if args.calibrate {
        return calibrate_scale(&settings, &store);
    }

    let mut console = Console;
    loop {
        println!("\nSelect a test to run:");
        println!("1. Weight reading test");
        println!("2. Load cell calibration");
        println!("3. Relay test (choose channel)");
        println!("4. Endstop switch flexible test");
        println!("5. PIR sensor test");
        println!("6. QR code scan test");
        println!("0. Exit");

        let choice = console.read_reply("Enter choice: ")?;
        let outcome = match choice.as_str() {
            "0" => {
                println!("Exiting interactive test menu.");
                return Ok(());
            }
            "1" => weight_test(&settings, &store),
            "2" => calibrate_scale(&settings, &store),
            "3" => relay_test(&settings, &mut console),
            "4" => endstop_test(&settings),
            "5" => pir_test(&settings),
            "6" => qr_test(&settings),
            _ => {
                println!("Invalid choice. Please try again.");
                continue;
            }
        };

        // A failed test should not take the whole menu down.
        if let Err(e) = outcome {
            error!("test failed: {e}");
        }
    }
}

fn weight_test(settings: &HarnessSettings, store: &ConfigStore) -> Result<(), Box<dyn Error>> {
    let config = store.load()?;
    let scale = open_scale(&config, settings)?;
    let mut source = SampleSource::bind(scale)?;
    let mut console = Console;

    let grams = weight::read(&mut source, &config, settings.weight_readings)?;
    println!("Current reading: {grams:.2}g");

    if !console.confirm("Place a weight on the platform") {
        return Ok(());
    }

    let grams = weight::read(&mut source, &config, settings.weight_readings)?;
    report::write_sample(grams, &mut io::stdout())?;
    println!("Weight reading completed.");

    Ok(())
}

fn calibrate_scale(settings: &HarnessSettings, store: &ConfigStore) -> Result<(), Box<dyn Error>> {
    // The record may be unloadable (zero reference unit) and calibration is
    // how that gets fixed, so only the pin assignment is taken from it.
    let config = store.load_unchecked().unwrap_or_default();
    let scale = open_scale(&config, settings)?;
    let mut source = SampleSource::bind(scale)?;

    let result = match calibration::run(&mut source, &mut Console) {
        Ok(result) => result,
        Err(CalibrationError::Cancelled(stage)) => {
            println!("Calibration cancelled ({stage:?}), nothing was changed.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    match store.save(result.offset, result.reference_unit) {
        Ok(()) => println!("Calibration saved to {}", store.path().display()),
        Err(e) => {
            warn!("{e}");
            println!(
                "Saving failed, apply manually: zero_offset={}, reference_unit={}",
                result.offset, result.reference_unit
            );
        }
    }

    Ok(())
}

fn relay_test(settings: &HarnessSettings, console: &mut Console) -> Result<(), Box<dyn Error>> {
    println!("\nSelect which relay channel to test:");
    println!("1. Left Lock");
    println!("2. Right Lock");
    println!("3. Buzzer");
    println!("0. Back to main menu");

    let pin = match console.read_reply("Enter choice: ")?.as_str() {
        "1" => settings.left_lock_pin,
        "2" => settings.right_lock_pin,
        "3" => settings.buzzer_pin,
        "0" => return Ok(()),
        _ => {
            println!("Invalid choice for relay channel. Returning to main menu.");
            return Ok(());
        }
    };

    let gpio = Gpio::new()?;
    let mut relay = Relay::new(gpio.get(pin)?.into_output());
    relay.pulse(Duration::from_secs(settings.relay_pulse_secs));
    println!("Relay test on pin {pin} completed.");

    Ok(())
}

fn endstop_test(settings: &HarnessSettings) -> Result<(), Box<dyn Error>> {
    let gpio = Gpio::new()?;
    let left = gpio.get(settings.endstop_left_pin)?.into_input_pullup();
    let right = gpio.get(settings.endstop_right_pin)?.into_input_pullup();
    let timeout = Duration::from_secs(settings.endstop_timeout_secs);

    println!(
        "TEST: Press either endstop switch on pin {} or pin {}, then the other.",
        settings.endstop_left_pin, settings.endstop_right_pin
    );

    if test_endstop_pair(&left, &right, ("left", "right"), timeout) {
        println!("Both endstop switches passed the flexible test.");
    } else {
        println!("Endstop switch test failed.");
    }

    Ok(())
}

fn pir_test(settings: &HarnessSettings) -> Result<(), Box<dyn Error>> {
    let gpio = Gpio::new()?;
    let pin = gpio.get(settings.pir_pin)?.into_input_pulldown();

    println!(
        "Letting the PIR sensor settle for {}s...",
        settings.pir_settle_secs
    );
    let sensor = PirSensor::settle(pin, Duration::from_secs(settings.pir_settle_secs))?;

    println!("TEST: Move in front of the sensor...");
    if sensor.detect_motion(
        Duration::from_secs(settings.pir_timeout_secs),
        Duration::from_millis(100),
    ) {
        println!("PIR sensor test passed.");
    } else {
        println!("PIR failed to detect motion.");
    }

    Ok(())
}

fn qr_test(settings: &HarnessSettings) -> Result<(), Box<dyn Error>> {
    let mut scanner = QrScanner::open(&settings.qr_port, settings.qr_baud)?;

    println!("Waiting for QR code...");
    let data = scanner.wait_for_scan()?;
    println!("Scanned QR code data: {data}");

    Ok(())
}
