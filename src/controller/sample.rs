// Raw per-poll input as handed over by the device backend

use serde::{Deserialize, Serialize};

/// How the backend produced the sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DeviceClass {
    /// Backend already reports buttons and axes in standard order
    Recognized,
    /// Vendor-specific ordering, needs a mapping
    #[default]
    Raw,
}

/// One raw button, digital or analog
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RawButton {
    pub pressed: bool,
    pub value: f32,
}

// Analog buttons count as pressed past the halfway point.
const ANALOG_PRESS_THRESHOLD: f32 = 0.5;

impl From<bool> for RawButton {
    fn from(pressed: bool) -> Self {
        Self {
            pressed,
            value: if pressed { 1.0 } else { 0.0 },
        }
    }
}

impl From<f32> for RawButton {
    fn from(value: f32) -> Self {
        let value = value.clamp(0.0, 1.0);
        Self {
            pressed: value > ANALOG_PRESS_THRESHOLD,
            value,
        }
    }
}

/// Identity used to key per-device state
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub guid: String,
    pub name: String,
}

impl DeviceIdentity {
    pub fn new(guid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            name: name.into(),
        }
    }
}

/// Raw device state for one poll. Missing inputs are simply absent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawDeviceSample {
    pub device_guid: String,
    pub device_name: String,
    pub buttons: Vec<RawButton>,
    pub axes: Vec<f32>,
    pub class: DeviceClass,
    /// Reported by the backend, never computed here
    pub has_haptics: bool,
}

impl RawDeviceSample {
    pub fn new(guid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            device_guid: guid.into(),
            device_name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_buttons<B: Into<RawButton>>(mut self, buttons: impl IntoIterator<Item = B>) -> Self {
        self.buttons = buttons.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_axes(mut self, axes: impl IntoIterator<Item = f32>) -> Self {
        self.axes = axes.into_iter().collect();
        self
    }

    pub fn with_class(mut self, class: DeviceClass) -> Self {
        self.class = class;
        self
    }

    pub fn with_haptics(mut self, has_haptics: bool) -> Self {
        self.has_haptics = has_haptics;
        self
    }

    pub fn identity(&self) -> DeviceIdentity {
        DeviceIdentity::new(self.device_guid.clone(), self.device_name.clone())
    }
}
