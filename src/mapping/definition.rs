//! Mapping definitions as loaded from the controller databases

use crate::mapping::symbols::Vocabulary;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which database a definition came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTag {
    #[default]
    RetroDbA,
    RetroDbB,
    CommunitySdl,
    Custom,
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            SourceTag::RetroDbA => "retro_db_a",
            SourceTag::RetroDbB => "retro_db_b",
            SourceTag::CommunitySdl => "community_sdl",
            SourceTag::Custom => "custom",
        };
        f.write_str(tag)
    }
}

/// Platforms named by the `platform:` token of delimited lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Windows,
    #[serde(rename = "Mac OS X")]
    MacOs,
    Linux,
    #[serde(rename = "iOS")]
    Ios,
    Android,
}

impl Platform {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "Windows" => Some(Platform::Windows),
            "Mac OS X" => Some(Platform::MacOs),
            "Linux" => Some(Platform::Linux),
            "iOS" => Some(Platform::Ios),
            "Android" => Some(Platform::Android),
            _ => None,
        }
    }

    /// Platform of the running process, if it is one the databases know
    pub fn host() -> Option<Self> {
        if cfg!(target_os = "windows") {
            Some(Platform::Windows)
        } else if cfg!(target_os = "macos") {
            Some(Platform::MacOs)
        } else if cfg!(target_os = "ios") {
            Some(Platform::Ios)
        } else if cfg!(target_os = "android") {
            Some(Platform::Android)
        } else if cfg!(target_os = "linux") {
            Some(Platform::Linux)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    Button,
    Axis,
}

/// Expected sign of a raw axis value for a direction-gated binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Negative,
    Positive,
}

impl Direction {
    /// `None` for zero: a zero sign never gates anything.
    pub fn from_signum(value: i32) -> Option<Self> {
        match value.signum() {
            -1 => Some(Direction::Negative),
            1 => Some(Direction::Positive),
            _ => None,
        }
    }

    pub fn as_i32(self) -> i32 {
        match self {
            Direction::Negative => -1,
            Direction::Positive => 1,
        }
    }

    /// Whether `value` points the way this direction expects. Zero matches neither.
    pub fn admits(self, value: f32) -> bool {
        match self {
            Direction::Negative => value < 0.0,
            Direction::Positive => value > 0.0,
        }
    }
}

/// One symbolic input bound to a raw button or axis
#[derive(Debug, Clone, PartialEq)]
pub struct InputBinding {
    pub symbolic_name: String,
    pub kind: BindingKind,
    pub raw_index: usize,
    pub sign: Option<Direction>,
    pub multiplier: Option<i32>,
}

impl InputBinding {
    pub fn button(symbolic_name: impl Into<String>, raw_index: usize) -> Self {
        Self {
            symbolic_name: symbolic_name.into(),
            kind: BindingKind::Button,
            raw_index,
            sign: None,
            multiplier: None,
        }
    }

    pub fn axis(symbolic_name: impl Into<String>, raw_index: usize, multiplier: i32) -> Self {
        Self {
            symbolic_name: symbolic_name.into(),
            kind: BindingKind::Axis,
            raw_index,
            sign: None,
            multiplier: Some(multiplier),
        }
    }

    pub fn with_sign(mut self, sign: Option<Direction>) -> Self {
        self.sign = sign;
        self
    }
}

/// A controller mapping as stored in a database. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerDefinition {
    pub name: String,
    pub guid: String,
    pub source_tag: SourceTag,
    /// Spelling of `bindings[..].symbolic_name`
    pub vocabulary: Vocabulary,
    pub bindings: Vec<InputBinding>,
}

impl ControllerDefinition {
    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }
}
