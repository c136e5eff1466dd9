//! Turns a [`ControllerDefinition`] into lookup tables the normalizer can apply

use crate::mapping::definition::{BindingKind, ControllerDefinition, Direction, SourceTag};
use crate::mapping::loader::parse_line;
use crate::mapping::symbols::{StandardAxis, StandardButton, Target, STANDARD_BUTTON_COUNT};
use crate::mapping::MappingError;
use std::collections::BTreeMap;
use tracing::debug;

/// Destination of an axis binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisTarget {
    /// Written straight into a standard stick slot
    Stick(StandardAxis),
    /// Analog trigger synthesized into button 6 or 7
    Trigger(StandardButton),
    /// Digital d-pad button synthesized from an axis threshold
    DPad(StandardButton),
}

impl AxisTarget {
    /// Axis-capable targets only; face buttons and the like have no axis meaning.
    pub fn from_target(target: Target) -> Option<Self> {
        match target {
            Target::Axis(axis) => Some(AxisTarget::Stick(axis)),
            Target::Button(button) if button.is_trigger() => Some(AxisTarget::Trigger(button)),
            Target::Button(button) if button.is_dpad() => Some(AxisTarget::DPad(button)),
            Target::Button(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisBinding {
    pub target: AxisTarget,
    pub sign: Option<Direction>,
    pub multiplier: i32,
}

/// Executable form of a mapping definition
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledMapping {
    /// `button_table[raw] = standard button`, `None` when the raw button is unmapped
    pub button_table: [Option<StandardButton>; STANDARD_BUTTON_COUNT],
    /// Raw axis index to its bindings, in declaration order
    pub axis_table: BTreeMap<usize, Vec<AxisBinding>>,
}

impl Default for CompiledMapping {
    fn default() -> Self {
        Self {
            button_table: [None; STANDARD_BUTTON_COUNT],
            axis_table: BTreeMap::new(),
        }
    }
}

impl CompiledMapping {
    /// Compiles a definition. Never fails; anything unusable is dropped.
    pub fn compile(definition: &ControllerDefinition) -> Self {
        let mut compiled = Self::default();

        for binding in &definition.bindings {
            let Some(target) = definition.vocabulary.lookup(&binding.symbolic_name) else {
                continue;
            };

            match binding.kind {
                BindingKind::Button => {
                    let Target::Button(button) = target else {
                        debug!(
                            "{}: '{}' names an axis but is bound to a button",
                            definition.guid, binding.symbolic_name
                        );
                        continue;
                    };
                    compiled.set_button(binding.raw_index, button);
                }
                BindingKind::Axis => {
                    let Some(target) = AxisTarget::from_target(target) else {
                        debug!(
                            "{}: '{}' cannot be driven by an axis",
                            definition.guid, binding.symbolic_name
                        );
                        continue;
                    };
                    compiled.push_axis(
                        binding.raw_index,
                        AxisBinding {
                            target,
                            sign: binding.sign,
                            multiplier: binding.multiplier.unwrap_or(1),
                        },
                    );
                }
            }
        }

        compiled
    }

    /// Compiles a single delimited mapping line such as
    /// `GUID,Name,a:b0,leftx:a0,dpleft:-a6,platform:Linux`.
    pub fn compile_line(line: &str) -> Result<Self, MappingError> {
        let definition = parse_line(line)?.into_definition(SourceTag::Custom);
        Ok(Self::compile(&definition))
    }

    /// Later writes to the same raw index replace earlier ones.
    pub(crate) fn set_button(&mut self, raw_index: usize, button: StandardButton) {
        match self.button_table.get_mut(raw_index) {
            Some(slot) => *slot = Some(button),
            None => debug!(
                "Raw button {} is outside the {}-entry table, ignoring",
                raw_index, STANDARD_BUTTON_COUNT
            ),
        }
    }

    pub(crate) fn push_axis(&mut self, raw_index: usize, binding: AxisBinding) {
        self.axis_table.entry(raw_index).or_default().push(binding);
    }

    pub fn button_for(&self, raw_index: usize) -> Option<StandardButton> {
        self.button_table.get(raw_index).copied().flatten()
    }

    pub fn axis_bindings(&self, raw_index: usize) -> &[AxisBinding] {
        self.axis_table
            .get(&raw_index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
