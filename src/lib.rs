//! Internal components used by [rig-bench](../rig_bench/index.html), a manual
//! acceptance-test harness for the bench rig's peripherals. The load cell path
//! (HX711 driver, sampling, calibration, persisted scale record, weight
//! conversion) lives here together with the simpler GPIO and serial exercises.
//! See the readme & the rig-bench crate for setup and settings.
pub mod calibration;
pub mod endstop;
pub mod gpio;
pub mod hx711;
pub mod operator;
pub mod pir;
pub mod qr;
pub mod relay;
pub mod report;
pub mod sampler;
pub mod store;
pub mod weight;
