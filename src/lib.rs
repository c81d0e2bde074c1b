//! Hall sensor field oriented current control
//!
//! The control core runs on the host for tests and on the STM32G4 in the
//! `hall-foc` firmware binary.

#![cfg_attr(not(test), no_std)]

// Must stay first: the logging macros are textually scoped
mod fmt;

pub mod config;
pub mod drive;
pub mod foc;
pub mod sensing;
