//! # bimstore-worker
//!
//! Background tasks that run alongside the HTTP server. Currently the only
//! task is the sensor feed, which keeps a process-wide reading fresh.

pub mod sensor;

pub use sensor::{SensorFeed, SensorHandle, SensorReading};
