use clap::Parser;

#[derive(serde::Deserialize, Debug, Clone)]
#[serde(default)]
pub struct HarnessSettings {
    /// Path of the persisted scale record,
    /// `~/.config/rig-bench/scale.json` when unset.
    pub scale_record: Option<String>,

    /// Readings averaged per weight measurement in the menu test.
    pub weight_readings: usize,

    /// Upper bound in milliseconds on the HX711 data-ready wait. Unset means
    /// reads block until the amplifier produces a conversion.
    pub sensor_ready_timeout_ms: Option<u64>,

    /// Relay pins (BCM) for the two lock channels and the buzzer.
    pub left_lock_pin: u8,
    pub right_lock_pin: u8,
    pub buzzer_pin: u8,

    /// How long a relay test holds the channel energized.
    pub relay_pulse_secs: u64,

    /// Endstop switch pins (BCM), wired against the internal pull-ups.
    pub endstop_left_pin: u8,
    pub endstop_right_pin: u8,

    /// Seconds to wait for each endstop press/release event.
    pub endstop_timeout_secs: u64,

    /// PIR sensor output pin (BCM) and its settle/detection windows.
    pub pir_pin: u8,
    pub pir_settle_secs: u64,
    pub pir_timeout_secs: u64,

    /// Serial port and baud rate of the QR scanner.
    pub qr_port: String,
    pub qr_baud: u32,
}

impl Default for HarnessSettings {
    fn default() -> Self {
        Self {
            scale_record: None,
            weight_readings: 30,
            sensor_ready_timeout_ms: None,
            left_lock_pin: 18,
            right_lock_pin: 27,
            buzzer_pin: 22,
            relay_pulse_secs: 3,
            endstop_left_pin: 23,
            endstop_right_pin: 24,
            endstop_timeout_secs: 30,
            pir_pin: 17,
            pir_settle_secs: 10,
            pir_timeout_secs: 15,
            qr_port: "/dev/ttyACM0".to_string(),
            qr_baud: 9600,
        }
    }
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Jump straight to the load cell calibration procedure
    #[arg(short, long, default_value_t = false)]
    pub calibrate: bool,

    /// Target settings file, tries `~/.config/rig-bench/settings.toml` by default
    #[arg(short, long)]
    pub settings_path: Option<String>,

    /// Toggles verbose output
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}
