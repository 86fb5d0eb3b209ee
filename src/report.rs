//! Serialized weight samples. Each reading taken through the menu can be
//! relayed as a JSON line to any writer [Write], typically stdout or a log
//! file kept next to the bench.

use chrono::{DateTime, Utc};
use std::error::Error;
use std::io::Write;

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct Sample {
    /// Time of sample creation.
    pub datetime: DateTime<Utc>,

    /// Weight at the given sample time.
    pub grams: f64,
}

/// Writes the reading as one JSON line. Assumes the metric system.
pub fn write_sample<W: Write>(grams: f64, writer: &mut W) -> Result<(), Box<dyn Error>> {
    let sample = Sample {
        grams,
        datetime: Utc::now(),
    };

    writer.write_all(serde_json::to_string(&sample)?.as_bytes())?;
    writer.write_all(b"\n")?;

    Ok(())
}
