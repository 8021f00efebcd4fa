pub mod calibration;
pub mod position_remapping;
pub mod trajectory;
