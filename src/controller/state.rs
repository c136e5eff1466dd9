// Normalized output handed to consumers every poll

use crate::mapping::symbols::{
    StandardAxis, StandardButton, STANDARD_AXIS_COUNT, STANDARD_BUTTON_COUNT,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ButtonState {
    pub pressed: bool,
    pub touched: bool,
    pub value: f32,
}

impl ButtonState {
    pub fn digital(pressed: bool) -> Self {
        Self {
            pressed,
            touched: pressed,
            value: if pressed { 1.0 } else { 0.0 },
        }
    }
}

/// Fixed 17-button / 4-axis gamepad state
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StandardGamepadState {
    pub buttons: [ButtonState; STANDARD_BUTTON_COUNT],
    pub axes: [f32; STANDARD_AXIS_COUNT],
}

impl StandardGamepadState {
    pub fn button(&self, button: StandardButton) -> &ButtonState {
        &self.buttons[button.index()]
    }

    pub fn button_mut(&mut self, button: StandardButton) -> &mut ButtonState {
        &mut self.buttons[button.index()]
    }

    pub fn axis(&self, axis: StandardAxis) -> f32 {
        self.axes[axis.index()]
    }

    pub fn pressed_buttons(&self) -> Vec<StandardButton> {
        StandardButton::ALL
            .into_iter()
            .filter(|b| self.button(*b).pressed)
            .collect()
    }
}
