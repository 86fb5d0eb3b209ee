use std::{env, error::Error, path::PathBuf, time::Duration};

use config::Config;
use log::debug;
use rig_bench_lib::hx711::{Config as HxConfig, Gain, Scale};
use rig_bench_lib::store::{ConfigStore, ScaleConfig};
use rppal::gpio::Gpio;

use crate::cli_config::{Args, HarnessSettings};

fn config_dir() -> Result<PathBuf, Box<dyn Error>> {
    let home = env::var("HOME")?;
    Ok(PathBuf::from(home).join(".config").join("rig-bench"))
}

/// Reads settings from the given path or `~/.config/rig-bench/settings.toml`,
/// falling back to the built-in defaults when no file exists, and locates the
/// persisted scale record.
pub fn bootstrap(args: &Args) -> Result<(HarnessSettings, ConfigStore), Box<dyn Error>> {
    let settings_file = match args.settings_path.clone() {
        Some(file_path) => PathBuf::from(file_path),
        None => config_dir()?.join("settings.toml"),
    };

    let settings = if settings_file.exists() {
        debug!("reading settings from {}", settings_file.display());
        let name = settings_file
            .to_str()
            .ok_or("settings file path is not valid UTF-8")?;

        Config::builder()
            .add_source(config::File::with_name(name))
            .build()?
            .try_deserialize::<HarnessSettings>()?
    } else {
        debug!(
            "no settings file at {}, using defaults",
            settings_file.display()
        );
        HarnessSettings::default()
    };

    let record_path = match settings.scale_record.clone() {
        Some(path) => PathBuf::from(path),
        None => config_dir()?.join("scale.json"),
    };

    Ok((settings, ConfigStore::new(record_path)))
}

/// Acquires the load cell GPIO pins for the duration of one menu action and
/// resets the amplifier.
pub fn open_scale(
    config: &ScaleConfig,
    settings: &HarnessSettings,
) -> Result<Scale, Box<dyn Error>> {
    let gpio = Gpio::new()?;
    let mut scale = Scale::new(HxConfig {
        dout: gpio.get(config.dout_pin)?.into_input(),
        pd_sck: gpio.get(config.pd_sck_pin)?.into_output(),
        gain: Gain::G128,
        ready_timeout: settings.sensor_ready_timeout_ms.map(Duration::from_millis),
    });
    scale.reset();

    Ok(scale)
}
