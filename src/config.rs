//! Configuration module
//!
//! Default parameters and the validated configuration structures for the
//! current loop and the Hall estimator.

pub mod hall;
pub mod motor;
pub mod params;

pub use hall::HallConfig;
pub use motor::{ConfigError, MotorConfig};
pub use params::*;
