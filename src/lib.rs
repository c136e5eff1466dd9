//! Normalizes vendor-specific game controller input into one standard
//! 17-button / 4-axis layout.
//!
//! ```text
//! RawDeviceSample + identity ──► resolve ──► compile (cached) ──► normalize ──► StandardGamepadState
//! ```

pub mod config;
pub mod controller;
pub mod mapping;

pub use config::EngineConfig;
pub use controller::{DeviceClass, DeviceIdentity, RawButton, RawDeviceSample, StandardGamepadState};
pub use mapping::{CompiledMapping, ControllerDefinition, GamepadSnapshot, MappingDatabase, MappingEngine, MappingError};
