//! Standard gamepad layout and the symbolic names that address it
//!
//! Buttons are named by physical position (south/east/west/north), never by the
//! printed label. Two databases spell those positions differently, so each
//! source format gets its own [`Vocabulary`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of buttons in the standard layout
pub const STANDARD_BUTTON_COUNT: usize = 17;

/// Number of axes in the standard layout
pub const STANDARD_AXIS_COUNT: usize = 4;

/// Standard button slots, in output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StandardButton {
    South,
    East,
    West,
    North,
    LeftShoulder,
    RightShoulder,
    LeftTrigger,
    RightTrigger,
    Select,
    Start,
    LeftStick,
    RightStick,
    DPadUp,
    DPadDown,
    DPadLeft,
    DPadRight,
    Guide,
}

impl StandardButton {
    pub const ALL: [StandardButton; STANDARD_BUTTON_COUNT] = [
        StandardButton::South,
        StandardButton::East,
        StandardButton::West,
        StandardButton::North,
        StandardButton::LeftShoulder,
        StandardButton::RightShoulder,
        StandardButton::LeftTrigger,
        StandardButton::RightTrigger,
        StandardButton::Select,
        StandardButton::Start,
        StandardButton::LeftStick,
        StandardButton::RightStick,
        StandardButton::DPadUp,
        StandardButton::DPadDown,
        StandardButton::DPadLeft,
        StandardButton::DPadRight,
        StandardButton::Guide,
    ];

    /// Index of this button in [`crate::StandardGamepadState::buttons`]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn is_trigger(self) -> bool {
        matches!(self, StandardButton::LeftTrigger | StandardButton::RightTrigger)
    }

    pub fn is_dpad(self) -> bool {
        matches!(
            self,
            StandardButton::DPadUp
                | StandardButton::DPadDown
                | StandardButton::DPadLeft
                | StandardButton::DPadRight
        )
    }
}

impl fmt::Display for StandardButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Standard stick axes. Negative is left/up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StandardAxis {
    LeftX,
    LeftY,
    RightX,
    RightY,
}

impl StandardAxis {
    pub const ALL: [StandardAxis; STANDARD_AXIS_COUNT] = [
        StandardAxis::LeftX,
        StandardAxis::LeftY,
        StandardAxis::RightX,
        StandardAxis::RightY,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// What a symbolic name refers to in the standard layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Button(StandardButton),
    Axis(StandardAxis),
}

/// Spelling of symbolic names used by a database format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vocabulary {
    /// Structured records (retro frontend style, `b` = south)
    Structured,
    /// Delimited lines (community SDL style, `a` = south)
    Delimited,
}

impl Vocabulary {
    /// Looks up a symbolic name. Matching is case-sensitive; unknown names yield `None`.
    pub fn lookup(self, name: &str) -> Option<Target> {
        match self {
            Vocabulary::Structured => structured_symbol(name),
            Vocabulary::Delimited => delimited_symbol(name),
        }
    }
}

fn structured_symbol(name: &str) -> Option<Target> {
    use StandardButton::*;

    let target = match name {
        "b" => Target::Button(South),
        "a" => Target::Button(East),
        "y" => Target::Button(West),
        "x" => Target::Button(North),
        "pageup" => Target::Button(LeftShoulder),
        "pagedown" => Target::Button(RightShoulder),
        "l2" => Target::Button(LeftTrigger),
        "r2" => Target::Button(RightTrigger),
        "select" => Target::Button(Select),
        "start" => Target::Button(Start),
        "l3" => Target::Button(LeftStick),
        "r3" => Target::Button(RightStick),
        "up" => Target::Button(DPadUp),
        "down" => Target::Button(DPadDown),
        "left" => Target::Button(DPadLeft),
        "right" => Target::Button(DPadRight),
        "hotkey" => Target::Button(Guide),
        "joystick1left" => Target::Axis(StandardAxis::LeftX),
        "joystick1up" => Target::Axis(StandardAxis::LeftY),
        "joystick2left" => Target::Axis(StandardAxis::RightX),
        "joystick2up" => Target::Axis(StandardAxis::RightY),
        _ => return None,
    };
    Some(target)
}

fn delimited_symbol(name: &str) -> Option<Target> {
    use StandardButton::*;

    let target = match name {
        "a" => Target::Button(South),
        "b" => Target::Button(East),
        "x" => Target::Button(West),
        "y" => Target::Button(North),
        "leftshoulder" => Target::Button(LeftShoulder),
        "rightshoulder" => Target::Button(RightShoulder),
        "lefttrigger" => Target::Button(LeftTrigger),
        "righttrigger" => Target::Button(RightTrigger),
        "back" => Target::Button(Select),
        "start" => Target::Button(Start),
        "leftstick" => Target::Button(LeftStick),
        "rightstick" => Target::Button(RightStick),
        "dpup" => Target::Button(DPadUp),
        "dpdown" => Target::Button(DPadDown),
        "dpleft" => Target::Button(DPadLeft),
        "dpright" => Target::Button(DPadRight),
        "guide" => Target::Button(Guide),
        "leftx" => Target::Axis(StandardAxis::LeftX),
        "lefty" => Target::Axis(StandardAxis::LeftY),
        "rightx" => Target::Axis(StandardAxis::RightX),
        "righty" => Target::Axis(StandardAxis::RightY),
        _ => return None,
    };
    Some(target)
}
