//! Route handlers.

pub mod convert;
pub mod health;
pub mod metrics;
pub mod model;
pub mod sensor;
