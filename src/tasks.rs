//! Tasks

pub mod motor_control;

pub use motor_control::motor_control_task;
