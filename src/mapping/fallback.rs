//! Built-in layouts for devices no database knows about

use crate::mapping::compiler::{AxisBinding, AxisTarget, CompiledMapping};
use crate::mapping::symbols::{StandardAxis, StandardButton};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::sync::{LazyLock, Mutex};
use tracing::warn;

/// Default capacity of the warned-identity cache
pub const DEFAULT_WARNED_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FallbackLayout {
    /// Xbox 360 style, used for anything not recognizably Sony
    Xbox360,
    /// DualShock 4 style
    PlayStation,
}

impl FallbackLayout {
    /// Case-insensitive substring match on the display name
    pub fn select(display_name: &str) -> Self {
        let name = display_name.to_lowercase();
        if ["sony", "ps4", "dualshock"].iter().any(|hint| name.contains(hint)) {
            FallbackLayout::PlayStation
        } else {
            FallbackLayout::Xbox360
        }
    }

    pub fn mapping(self) -> &'static CompiledMapping {
        match self {
            FallbackLayout::Xbox360 => &*XBOX_360,
            FallbackLayout::PlayStation => &*PLAYSTATION,
        }
    }
}

// Both layouts share the raw axis order of common HID pads:
// left stick 0/1, left trigger 2, right stick 3/4, right trigger 5.
fn common_axes(mapping: &mut CompiledMapping) {
    let axes = [
        (0, AxisTarget::Stick(StandardAxis::LeftX)),
        (1, AxisTarget::Stick(StandardAxis::LeftY)),
        (2, AxisTarget::Trigger(StandardButton::LeftTrigger)),
        (3, AxisTarget::Stick(StandardAxis::RightX)),
        (4, AxisTarget::Stick(StandardAxis::RightY)),
        (5, AxisTarget::Trigger(StandardButton::RightTrigger)),
    ];
    for (raw_index, target) in axes {
        mapping.push_axis(
            raw_index,
            AxisBinding {
                target,
                sign: None,
                multiplier: 1,
            },
        );
    }
}

fn layout(buttons: &[Option<StandardButton>]) -> CompiledMapping {
    let mut mapping = CompiledMapping::default();
    for (raw_index, button) in buttons.iter().enumerate() {
        if let Some(button) = button {
            mapping.set_button(raw_index, *button);
        }
    }
    common_axes(&mut mapping);
    mapping
}

static XBOX_360: LazyLock<CompiledMapping> = LazyLock::new(|| {
    use StandardButton::*;
    layout(&[
        Some(South),
        Some(East),
        Some(West),
        Some(North),
        Some(LeftShoulder),
        Some(RightShoulder),
        Some(Select),
        Some(Start),
        Some(Guide),
        Some(LeftStick),
        Some(RightStick),
    ])
});

// Raw 2 is triangle (north) and raw 3 square (west) on these pads.
static PLAYSTATION: LazyLock<CompiledMapping> = LazyLock::new(|| {
    use StandardButton::*;
    layout(&[
        Some(South),
        Some(East),
        Some(North),
        Some(West),
        Some(LeftShoulder),
        Some(RightShoulder),
        None,
        None,
        Some(Select),
        Some(Start),
        Some(Guide),
        Some(LeftStick),
        Some(RightStick),
    ])
});

/// Bounded set of hardware identities already reported, oldest evicted first
#[derive(Debug)]
pub struct WarnedIdentities {
    capacity: usize,
    order: VecDeque<String>,
    seen: HashSet<String>,
}

impl WarnedIdentities {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            order: VecDeque::new(),
            seen: HashSet::new(),
        }
    }

    /// Records `identity`; returns `true` the first time it is seen.
    pub fn first_sighting(&mut self, identity: &str) -> bool {
        if self.seen.contains(identity) {
            return false;
        }
        if self.order.len() == self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        self.order.push_back(identity.to_string());
        self.seen.insert(identity.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Chooses a built-in layout and reports each unknown device once
#[derive(Debug)]
pub struct FallbackPolicy {
    warned: Mutex<WarnedIdentities>,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_WARNED_CAPACITY)
    }
}

impl FallbackPolicy {
    pub fn new(warned_capacity: usize) -> Self {
        Self {
            warned: Mutex::new(WarnedIdentities::new(warned_capacity)),
        }
    }

    pub fn fallback_for(&self, display_name: &str) -> &'static CompiledMapping {
        FallbackLayout::select(display_name).mapping()
    }

    /// Picks the layout for an unmapped device, warning once per guid.
    pub fn apply(&self, guid: &str, display_name: &str) -> FallbackLayout {
        let layout = FallbackLayout::select(display_name);

        // The set stays consistent even if a holder panicked.
        let mut warned = match self.warned.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if warned.first_sighting(guid) {
            warn!(
                "No database mapping for \"{}\" ({}), using {:?} fallback",
                display_name, guid, layout
            );
        }

        layout
    }

    pub fn warned_count(&self) -> usize {
        match self.warned.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::symbols::STANDARD_BUTTON_COUNT;

    #[test]
    fn selects_layout_by_name() {
        assert_eq!(FallbackLayout::select("Sony DualShock 4"), FallbackLayout::PlayStation);
        assert_eq!(FallbackLayout::select("Wireless PS4 pad"), FallbackLayout::PlayStation);
        assert_eq!(FallbackLayout::select("DUALSHOCK clone"), FallbackLayout::PlayStation);
        assert_eq!(FallbackLayout::select("Generic USB Gamepad"), FallbackLayout::Xbox360);
        assert_eq!(FallbackLayout::select(""), FallbackLayout::Xbox360);
    }

    #[test]
    fn layouts_are_full_width() {
        for layout in [FallbackLayout::Xbox360, FallbackLayout::PlayStation] {
            let mapping = layout.mapping();
            assert_eq!(mapping.button_table.len(), STANDARD_BUTTON_COUNT);
            let keys: Vec<usize> = mapping.axis_table.keys().copied().collect();
            assert_eq!(keys, vec![0, 1, 2, 3, 4, 5]);
        }
    }

    #[test]
    fn playstation_layout_swaps_top_face_buttons() {
        let ps = FallbackLayout::PlayStation.mapping();
        assert_eq!(ps.button_for(2), Some(StandardButton::North));
        assert_eq!(ps.button_for(3), Some(StandardButton::West));
        assert_eq!(ps.button_for(6), None);
        assert_eq!(ps.button_for(10), Some(StandardButton::Guide));

        let xbox = FallbackLayout::Xbox360.mapping();
        assert_eq!(xbox.button_for(2), Some(StandardButton::West));
        assert_eq!(xbox.button_for(8), Some(StandardButton::Guide));
    }

    #[test]
    fn warned_identities_are_bounded() {
        let mut warned = WarnedIdentities::new(2);
        assert!(warned.first_sighting("a"));
        assert!(!warned.first_sighting("a"));
        assert!(warned.first_sighting("b"));
        assert!(warned.first_sighting("c"));
        assert_eq!(warned.len(), 2);
        // "a" was evicted and counts as new again
        assert!(warned.first_sighting("a"));
        assert!(!warned.first_sighting("c"));
    }

    #[test]
    fn policies_do_not_share_warnings() {
        let first = FallbackPolicy::new(8);
        let second = FallbackPolicy::new(8);
        first.apply("guid-1", "Pad");
        first.apply("guid-1", "Pad");
        assert_eq!(first.warned_count(), 1);
        assert_eq!(second.warned_count(), 0);
    }
}
