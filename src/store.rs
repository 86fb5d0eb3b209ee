//! Persisted scale record.
//!
//! The record is a single JSON file holding the HX711 pin assignment and the
//! calibration pair. Saves go through a temp file in the same directory
//! followed by a rename, so a reader (this process on a later run, or anyone
//! else) observes either the fully-old or the fully-new calibration pair,
//! never a half-updated record.

use std::fmt::Display;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

fn default_dout_pin() -> u8 {
    5
}

fn default_pd_sck_pin() -> u8 {
    6
}

fn default_reference_unit() -> f64 {
    2280.0
}

/// Conversion parameters and pin assignment for the load cell. The record is
/// read-only everywhere except the calibration write-back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleConfig {
    /// Data out pin (BCM).
    #[serde(default = "default_dout_pin")]
    pub dout_pin: u8,

    /// Clock pin (BCM).
    #[serde(default = "default_pd_sck_pin")]
    pub pd_sck_pin: u8,

    /// Calibration factor in raw counts per gram. Never zero on a loadable
    /// record.
    #[serde(default = "default_reference_unit")]
    pub reference_unit: f64,

    /// Raw count of the empty platform.
    #[serde(default)]
    pub zero_offset: f64,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            dout_pin: default_dout_pin(),
            pd_sck_pin: default_pd_sck_pin(),
            reference_unit: default_reference_unit(),
            zero_offset: 0.0,
        }
    }
}

#[derive(Debug)]
pub enum StoreError {
    /// The record carries a zero reference unit; weight conversion would
    /// divide by it.
    ZeroReferenceUnit,
    /// The record exists but could not be read.
    Read(io::Error),
    /// The record exists but is not a valid JSON record.
    Parse(serde_json::Error),
    /// Persisting the record failed. The attempted pair is carried so the
    /// operator can apply it by hand.
    Write {
        offset: f64,
        reference_unit: f64,
        source: io::Error,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::ZeroReferenceUnit => {
                write!(f, "scale record has a zero reference unit")
            }
            StoreError::Read(e) => write!(f, "failed to read scale record: {e}"),
            StoreError::Parse(e) => write!(f, "scale record is not valid JSON: {e}"),
            StoreError::Write {
                offset,
                reference_unit,
                source,
            } => write!(
                f,
                "failed to persist scale record (apply manually: zero_offset={offset}, \
                 reference_unit={reference_unit}): {source}"
            ),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Read(e) => Some(e),
            StoreError::Parse(e) => Some(e),
            StoreError::Write { source, .. } => Some(source),
            StoreError::ZeroReferenceUnit => None,
        }
    }
}

pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Returns the persisted record, or the documented defaults when none has
    /// been written yet. A record with a zero reference unit fails here, at
    /// load time, rather than producing infinite weights later.
    pub fn load(&self) -> Result<ScaleConfig, StoreError> {
        let config = self.load_unchecked()?;

        if config.reference_unit == 0.0 {
            return Err(StoreError::ZeroReferenceUnit);
        }

        Ok(config)
    }

    /// Like [`ConfigStore::load`] but skips the reference-unit invariant.
    /// Only for flows about to rewrite the calibration pair, which still need
    /// the record's pin assignment.
    pub fn load_unchecked(&self) -> Result<ScaleConfig, StoreError> {
        if !self.path.exists() {
            debug!("no scale record at {}, using defaults", self.path.display());
            return Ok(ScaleConfig::default());
        }

        let raw = fs::read_to_string(&self.path).map_err(StoreError::Read)?;
        let config: ScaleConfig = serde_json::from_str(&raw).map_err(StoreError::Parse)?;

        debug!(
            "loaded scale record from {}: offset={}, reference_unit={}",
            self.path.display(),
            config.zero_offset,
            config.reference_unit
        );

        Ok(config)
    }

    /// Replaces the calibration pair in the record, preserving the pin
    /// assignment. The full updated record lands via temp-file-then-rename;
    /// a crash anywhere on this path leaves the previous record intact.
    pub fn save(&self, offset: f64, reference_unit: f64) -> Result<(), StoreError> {
        if reference_unit == 0.0 {
            return Err(StoreError::ZeroReferenceUnit);
        }

        // Pins carry over from whatever record is present; a missing or
        // unreadable one falls back to the defaults.
        let mut config = self.load_unchecked().unwrap_or_default();
        config.zero_offset = offset;
        config.reference_unit = reference_unit;

        self.replace(&config).map_err(|source| StoreError::Write {
            offset,
            reference_unit,
            source,
        })?;

        info!(
            "persisted scale record to {}: offset={}, reference_unit={}",
            self.path.display(),
            offset,
            reference_unit
        );

        Ok(())
    }

    fn replace(&self, config: &ScaleConfig) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let serialized = serde_json::to_string_pretty(config)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let temp = self.temp_path();
        fs::write(&temp, serialized)?;
        fs::rename(&temp, &self.path)?;

        Ok(())
    }
}
