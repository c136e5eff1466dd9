//! Per-device mapping engine
//!
//! Ties the read-only [`MappingDatabase`] to the [`Normalizer`] and keeps one
//! compiled mapping per connected device, so resolution and compilation happen
//! once per connection instead of once per poll.
//!
//! # Flow
//!
//! ```text
//! RawDeviceSample ──► cache hit? ──no──► resolve ──► compile ──► cache
//!                         │                                        │
//!                         └──────────────► normalize ◄─────────────┘
//!                                              │
//!                                              ▼
//!                                       GamepadSnapshot
//! ```
//!
//! The cache is keyed by [`DeviceIdentity`] and only cleared by an external
//! disconnect signal. Misses are cached as well, a device without a
//! definition keeps its fallback layout until it reconnects.

use crate::config::EngineConfig;
use crate::controller::normalizer::{Applied, Normalizer};
use crate::controller::sample::{DeviceIdentity, RawDeviceSample};
use crate::controller::state::StandardGamepadState;
use crate::mapping::compiler::CompiledMapping;
use crate::mapping::definition::{ControllerDefinition, SourceTag};
use crate::mapping::fallback::FallbackLayout;
use crate::mapping::resolver::{MappingDatabase, MatchTier};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Where the mapping applied to a device came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MappingSource {
    Native,
    Database(SourceTag),
    Fallback(FallbackLayout),
}

/// Normalized view of one device after a poll
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GamepadSnapshot {
    pub guid: String,
    pub name: String,
    /// Always `"standard"`
    pub mapping: &'static str,
    pub source: MappingSource,
    pub has_haptics: bool,
    pub state: StandardGamepadState,
}

// `None` records a resolver miss.
type CachedMapping = Option<(Arc<CompiledMapping>, SourceTag)>;

pub struct MappingEngine {
    database: Arc<MappingDatabase>,
    normalizer: Normalizer,
    cache: HashMap<DeviceIdentity, CachedMapping>,
}

impl MappingEngine {
    pub fn new(database: Arc<MappingDatabase>, config: &EngineConfig) -> Self {
        info!(
            "Creating mapping engine over {} definitions",
            database.len()
        );
        Self {
            database,
            normalizer: Normalizer::new(config.warned_capacity),
            cache: HashMap::new(),
        }
    }

    pub fn database(&self) -> &Arc<MappingDatabase> {
        &self.database
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn resolve(&self, guid: &str, name: &str) -> Option<&ControllerDefinition> {
        self.database.resolve(guid, name)
    }

    pub fn has_definition(&self, guid: &str, name: &str) -> bool {
        self.database.has_definition(guid, name)
    }

    /// Connect signal: resolves and compiles eagerly so the first poll is cheap.
    pub fn connect(&mut self, identity: &DeviceIdentity) {
        info!("Device connected: {} ({})", identity.name, identity.guid);
        self.cache.remove(identity);
        self.cached_mapping(identity);
    }

    /// Disconnect signal: forgets the compiled mapping for `identity`.
    pub fn disconnect(&mut self, identity: &DeviceIdentity) {
        if self.cache.remove(identity).is_some() {
            info!("Device disconnected: {} ({})", identity.name, identity.guid);
        } else {
            debug!("Disconnect for unknown device {} ({})", identity.name, identity.guid);
        }
    }

    pub fn cached_devices(&self) -> usize {
        self.cache.len()
    }

    /// Normalizes one sample, resolving and compiling its mapping on first sight.
    pub fn poll(&mut self, sample: &RawDeviceSample) -> GamepadSnapshot {
        let identity = sample.identity();
        let cached = self.cached_mapping(&identity).clone();

        let (state, applied) = self
            .normalizer
            .normalize_with_source(sample, cached.as_ref().map(|(compiled, _)| compiled.as_ref()));

        let source = match (applied, cached) {
            (Applied::Mapping, Some((_, tag))) => MappingSource::Database(tag),
            (Applied::Fallback(layout), _) => MappingSource::Fallback(layout),
            _ => MappingSource::Native,
        };

        GamepadSnapshot {
            guid: sample.device_guid.clone(),
            name: sample.device_name.clone(),
            mapping: "standard",
            source,
            has_haptics: sample.has_haptics,
            state,
        }
    }

    // Tier-4 borrows are reported here, once per connection.
    fn cached_mapping(&mut self, identity: &DeviceIdentity) -> &CachedMapping {
        let database = &self.database;
        self.cache.entry(identity.clone()).or_insert_with(|| {
            let (definition, tier) = database.lookup(&identity.guid, &identity.name)?;
            if tier == MatchTier::VendorProduct {
                info!(
                    "Vendor/product match for {}: using mapping from {}",
                    identity.guid, definition.guid
                );
            }
            debug!(
                "Compiling {} mapping '{}' for {}",
                definition.source_tag, definition.name, identity.guid
            );
            Some((
                Arc::new(CompiledMapping::compile(definition)),
                definition.source_tag,
            ))
        })
    }
}
