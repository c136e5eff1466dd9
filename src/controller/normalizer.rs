//! Applies a compiled mapping to one raw sample
//!
//! ```text
//! RawDeviceSample ──► [CompiledMapping | native passthrough | fallback] ──► StandardGamepadState
//! ```
//!
//! Normalization is a pure function of its inputs. The only state kept here is
//! the fallback policy's bounded set of already-reported devices.

use crate::controller::sample::{DeviceClass, RawDeviceSample};
use crate::controller::state::{ButtonState, StandardGamepadState};
use crate::mapping::compiler::{AxisTarget, CompiledMapping};
use crate::mapping::fallback::{FallbackLayout, FallbackPolicy};
use crate::mapping::symbols::STANDARD_BUTTON_COUNT;

/// Analog magnitude past which a synthesized button counts as pressed
pub const AXIS_THRESHOLD: f32 = 0.11;

/// Which path produced a normalized state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Backend data was already in standard order
    Native,
    /// A resolved or explicitly supplied mapping
    Mapping,
    /// A built-in layout
    Fallback(FallbackLayout),
}

#[derive(Debug, Default)]
pub struct Normalizer {
    fallback: FallbackPolicy,
}

impl Normalizer {
    pub fn new(warned_capacity: usize) -> Self {
        Self {
            fallback: FallbackPolicy::new(warned_capacity),
        }
    }

    pub fn fallback(&self) -> &FallbackPolicy {
        &self.fallback
    }

    pub fn normalize(
        &self,
        sample: &RawDeviceSample,
        mapping: Option<&CompiledMapping>,
    ) -> StandardGamepadState {
        self.normalize_with_source(sample, mapping).0
    }

    /// Like [`Normalizer::normalize`], also reporting which path was taken.
    ///
    /// A supplied mapping always wins. Without one, recognized devices pass
    /// through and everything else gets a fallback layout.
    pub fn normalize_with_source(
        &self,
        sample: &RawDeviceSample,
        mapping: Option<&CompiledMapping>,
    ) -> (StandardGamepadState, Applied) {
        match (mapping, sample.class) {
            (Some(mapping), _) => (apply_mapping(sample, mapping), Applied::Mapping),
            (None, DeviceClass::Recognized) => (passthrough(sample), Applied::Native),
            (None, DeviceClass::Raw) => {
                let layout = self
                    .fallback
                    .apply(&sample.device_guid, &sample.device_name);
                (apply_mapping(sample, layout.mapping()), Applied::Fallback(layout))
            }
        }
    }
}

/// Copies already-standard data, fitting it to 17 buttons and 4 axes.
pub fn passthrough(sample: &RawDeviceSample) -> StandardGamepadState {
    let mut state = StandardGamepadState::default();

    for (slot, raw) in state.buttons.iter_mut().zip(&sample.buttons) {
        *slot = ButtonState {
            pressed: raw.pressed,
            touched: raw.pressed,
            value: raw.value,
        };
    }
    for (slot, value) in state.axes.iter_mut().zip(&sample.axes) {
        *slot = *value;
    }

    state
}

/// Runs `sample` through `mapping`. Unmapped raw inputs are ignored.
pub fn apply_mapping(sample: &RawDeviceSample, mapping: &CompiledMapping) -> StandardGamepadState {
    let mut state = StandardGamepadState::default();

    for (raw_index, raw) in sample.buttons.iter().enumerate().take(STANDARD_BUTTON_COUNT) {
        if let Some(button) = mapping.button_for(raw_index) {
            *state.button_mut(button) = ButtonState::digital(raw.pressed);
        }
    }

    for (raw_index, &value) in sample.axes.iter().enumerate() {
        for binding in mapping.axis_bindings(raw_index) {
            // One bidirectional raw axis must not fire both opposite outputs.
            if binding.sign.is_some_and(|sign| !sign.admits(value)) {
                continue;
            }

            let candidate = value * binding.multiplier as f32;
            match binding.target {
                AxisTarget::Stick(axis) => state.axes[axis.index()] = candidate,
                AxisTarget::Trigger(button) => {
                    let trigger = state.button_mut(button);
                    trigger.value = (candidate + 1.0) / 2.0;
                    trigger.pressed = trigger.value > AXIS_THRESHOLD;
                }
                AxisTarget::DPad(button) => {
                    state.button_mut(button).pressed = candidate.abs() > AXIS_THRESHOLD;
                }
            }
        }
    }

    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::sample::RawButton;
    use crate::mapping::compiler::AxisBinding;
    use crate::mapping::definition::Direction;
    use crate::mapping::symbols::{StandardAxis, StandardButton};

    fn dpad_left_mapping() -> CompiledMapping {
        let mut mapping = CompiledMapping::default();
        mapping.push_axis(
            0,
            AxisBinding {
                target: AxisTarget::DPad(StandardButton::DPadLeft),
                sign: Some(Direction::Negative),
                multiplier: -1,
            },
        );
        mapping
    }

    #[test]
    fn sign_gate_blocks_opposite_direction() {
        let mapping = dpad_left_mapping();

        let positive = RawDeviceSample::new("g", "n").with_axes([0.5]);
        let state = apply_mapping(&positive, &mapping);
        assert!(!state.button(StandardButton::DPadLeft).pressed);

        let negative = RawDeviceSample::new("g", "n").with_axes([-0.5]);
        let state = apply_mapping(&negative, &mapping);
        assert!(state.button(StandardButton::DPadLeft).pressed);
        // pressed flag only
        assert_eq!(state.button(StandardButton::DPadLeft).value, 0.0);
    }

    #[test]
    fn dpad_below_threshold_is_released() {
        let mapping = dpad_left_mapping();
        let sample = RawDeviceSample::new("g", "n").with_axes([-0.1]);
        assert!(!apply_mapping(&sample, &mapping).button(StandardButton::DPadLeft).pressed);
    }

    #[test]
    fn shared_axis_drives_only_the_matching_direction() {
        let mapping = CompiledMapping::compile_line("g,n,dpleft:-a6,dpright:+a6,platform:Linux").unwrap();
        let mut axes = vec![0.0; 7];

        axes[6] = 1.0;
        let state = apply_mapping(&RawDeviceSample::new("g", "n").with_axes(axes.clone()), &mapping);
        assert!(state.button(StandardButton::DPadRight).pressed);
        assert!(!state.button(StandardButton::DPadLeft).pressed);

        axes[6] = -1.0;
        let state = apply_mapping(&RawDeviceSample::new("g", "n").with_axes(axes), &mapping);
        assert!(state.button(StandardButton::DPadLeft).pressed);
        assert!(!state.button(StandardButton::DPadRight).pressed);
    }

    #[test]
    fn last_admitted_binding_wins_on_shared_target() {
        let mapping = CompiledMapping::compile_line("g,n,leftx:a0,leftx:-a0,platform:Linux").unwrap();

        // both bindings admit a negative value, the later one flips it
        let negative = RawDeviceSample::new("g", "n").with_axes([-0.5]);
        assert_eq!(apply_mapping(&negative, &mapping).axis(StandardAxis::LeftX), 0.5);

        // the gated binding skips, the first one stands
        let positive = RawDeviceSample::new("g", "n").with_axes([0.5]);
        assert_eq!(apply_mapping(&positive, &mapping).axis(StandardAxis::LeftX), 0.5);
    }

    #[test]
    fn trigger_axis_is_rescaled() {
        let mapping = FallbackLayout::Xbox360.mapping();

        let released = RawDeviceSample::new("g", "n").with_axes([0.0, 0.0, -1.0]);
        let trigger = *apply_mapping(&released, mapping).button(StandardButton::LeftTrigger);
        assert_eq!(trigger.value, 0.0);
        assert!(!trigger.pressed);

        let half = RawDeviceSample::new("g", "n").with_axes([0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let trigger = *apply_mapping(&half, mapping).button(StandardButton::RightTrigger);
        assert_eq!(trigger.value, 0.5);
        assert!(trigger.pressed);
    }

    #[test]
    fn unmapped_inputs_are_never_copied() {
        let mapping = CompiledMapping::default();
        let sample = RawDeviceSample::new("g", "n")
            .with_buttons([true; 20])
            .with_axes([0.9; 8]);
        assert_eq!(apply_mapping(&sample, &mapping), StandardGamepadState::default());
    }

    #[test]
    fn empty_sample_normalizes_to_rest() {
        let normalizer = Normalizer::default();
        let state = normalizer.normalize(&RawDeviceSample::default(), Some(&CompiledMapping::default()));
        assert_eq!(state, StandardGamepadState::default());
    }

    #[test]
    fn recognized_devices_pass_through() {
        let normalizer = Normalizer::default();
        let sample = RawDeviceSample::new("g", "Native Pad")
            .with_class(DeviceClass::Recognized)
            .with_buttons([RawButton::from(true), RawButton::from(0.25)])
            .with_axes([0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);

        let (state, applied) = normalizer.normalize_with_source(&sample, None);
        assert_eq!(applied, Applied::Native);
        assert!(state.button(StandardButton::South).pressed);
        assert_eq!(state.button(StandardButton::East).value, 0.25);
        assert_eq!(state.axes, [0.1, 0.2, 0.3, 0.4]);
        assert_eq!(normalizer.fallback().warned_count(), 0);
    }

    #[test]
    fn explicit_mapping_overrides_passthrough() {
        let normalizer = Normalizer::default();
        let mapping = CompiledMapping::compile_line("g,n,a:b1,leftx:a1,platform:Linux").unwrap();
        let sample = RawDeviceSample::new("g", "n")
            .with_class(DeviceClass::Recognized)
            .with_buttons([false, true])
            .with_axes([0.3, -0.7]);

        let (state, applied) = normalizer.normalize_with_source(&sample, Some(&mapping));
        assert_eq!(applied, Applied::Mapping);
        assert!(state.button(StandardButton::South).pressed);
        assert_eq!(state.axis(StandardAxis::LeftX), -0.7);
        assert_eq!(state.axis(StandardAxis::LeftY), 0.0);
    }

    #[test]
    fn fallback_warns_once_per_guid() {
        let normalizer = Normalizer::new(4);
        let sample = RawDeviceSample::new("guid-a", "Sony Pad").with_buttons([true]);

        let (_, applied) = normalizer.normalize_with_source(&sample, None);
        assert_eq!(applied, Applied::Fallback(FallbackLayout::PlayStation));
        normalizer.normalize(&sample, None);
        assert_eq!(normalizer.fallback().warned_count(), 1);
    }
}
