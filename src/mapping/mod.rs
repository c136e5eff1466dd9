//! Mapping database, resolution and compilation.
//!
//! Controller databases are loaded once into a read-only [`MappingDatabase`].
//! For each device the resolver picks the best [`ControllerDefinition`], the
//! compiler turns it into a [`CompiledMapping`], and [`MappingEngine`] caches
//! the result per connected device. Devices nothing matches get a built-in
//! [`FallbackLayout`].

pub mod compiler;
pub mod definition;
pub mod engine;
pub mod error;
pub mod fallback;
pub mod loader;
#[cfg(test)]
mod log_capture;
pub mod resolver;
pub mod symbols;

// Re-exports for easier access
pub use compiler::{AxisBinding, AxisTarget, CompiledMapping};
pub use definition::{BindingKind, ControllerDefinition, Direction, InputBinding, Platform, SourceTag};
pub use engine::{GamepadSnapshot, MappingEngine, MappingSource};
pub use error::MappingError;
pub use fallback::{FallbackLayout, FallbackPolicy};
pub use loader::LoadReport;
pub use resolver::{MappingDatabase, MatchTier};
pub use symbols::{StandardAxis, StandardButton, Target, Vocabulary};
