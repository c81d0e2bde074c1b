// FOC (Field Oriented Control) module
// Hall sensor-based current control for BLDC/PMSM motors

pub mod current_control;
pub mod hall_sensor;
pub mod pi_controller;
pub mod svpwm;
pub mod transforms;
pub mod trig;

// Re-export main types for easier access
pub use current_control::{
    torque_to_current, ControlInputs, ControlMode, ControlOutputs, ControlState,
    CurrentController,
};
pub use hall_sensor::{
    HallEstimator, HallInputs, HallSnapshot, HallTimer, Rotation, SectorTransitionHandler,
};
pub use pi_controller::PiController;
pub use svpwm::{calculate_svpwm, guard_bus_voltage};
pub use trig::{wrap_angle, CosSin, IdspCosSin, LibmCosSin};
