//! Raw device input and its normalized standard form.

pub mod normalizer;
pub mod sample;
pub mod state;

#[cfg(feature = "backend")]
pub mod collector;

pub use normalizer::{Applied, Normalizer, AXIS_THRESHOLD};
pub use sample::{DeviceClass, DeviceIdentity, RawButton, RawDeviceSample};
pub use state::{ButtonState, StandardGamepadState};
