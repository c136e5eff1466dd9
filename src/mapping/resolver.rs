//! Read-only mapping database with tiered lookup
//!
//! Lookup order, first tier with any candidate wins:
//!
//! ```text
//! 1. guid + name   2. guid   3. name   4. vendor/product region of the guid
//! ```
//!
//! Within a tier the definition with the most bindings is chosen; ties go to
//! whichever was loaded first.

use crate::config::DatabaseConfig;
use crate::mapping::definition::{ControllerDefinition, SourceTag};
use crate::mapping::loader::{self, LoadReport};
use tracing::{info, warn};

const VENDOR_PRODUCT_OFFSET: usize = 8;
const VENDOR_PRODUCT_LEN: usize = 12;

/// Hardware-identifying region of a guid (characters 8..20)
pub fn vendor_product(guid: &str) -> Option<&str> {
    guid.get(VENDOR_PRODUCT_OFFSET..VENDOR_PRODUCT_OFFSET + VENDOR_PRODUCT_LEN)
}

/// Resolver tier that produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    GuidAndName,
    Guid,
    Name,
    VendorProduct,
}

#[derive(Debug, Default)]
pub struct MappingDatabase {
    definitions: Vec<ControllerDefinition>,
}

impl MappingDatabase {
    /// Builds a database from definitions in load order
    pub fn from_definitions(definitions: Vec<ControllerDefinition>) -> Self {
        Self { definitions }
    }

    /// Loads every configured database file, then the extra delimited lines.
    ///
    /// A file that cannot be read is logged and skipped; the result is always
    /// a usable (possibly empty) database.
    pub fn load(config: &DatabaseConfig, custom_mappings: &[String]) -> (Self, LoadReport) {
        let mut definitions = Vec::new();
        let mut report = LoadReport::default();

        for path in &config.structured {
            match loader::load_structured_file(path) {
                Ok((loaded, file_report)) => {
                    definitions.extend(loaded);
                    report.merge(file_report);
                }
                Err(e) => warn!("Skipping structured database: {}", e),
            }
        }

        let platform = config.platform();
        for path in &config.delimited {
            match loader::load_delimited_file(path, platform) {
                Ok((loaded, file_report)) => {
                    definitions.extend(loaded);
                    report.merge(file_report);
                }
                Err(e) => warn!("Skipping delimited database: {}", e),
            }
        }

        if !custom_mappings.is_empty() {
            let text = custom_mappings.join("\n");
            let (loaded, custom_report) = loader::parse_delimited(&text, platform, SourceTag::Custom);
            definitions.extend(loaded);
            report.merge(custom_report);
        }

        info!(
            "Mapping database ready: {} definitions ({} skipped, {} for other platforms)",
            definitions.len(),
            report.skipped,
            report.filtered
        );
        (Self::from_definitions(definitions), report)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn definitions(&self) -> &[ControllerDefinition] {
        &self.definitions
    }

    /// Best definition for a device, or `None` when no tier matches.
    pub fn resolve(&self, guid: &str, display_name: &str) -> Option<&ControllerDefinition> {
        self.lookup(guid, display_name).map(|(found, _)| found)
    }

    /// Like [`MappingDatabase::resolve`], also reporting which tier matched.
    pub fn lookup(&self, guid: &str, display_name: &str) -> Option<(&ControllerDefinition, MatchTier)> {
        let name = display_name.trim();

        if let Some(found) = self.richest(|d| d.guid == guid && d.name == name) {
            return Some((found, MatchTier::GuidAndName));
        }
        if let Some(found) = self.richest(|d| d.guid == guid) {
            return Some((found, MatchTier::Guid));
        }
        if let Some(found) = self.richest(|d| d.name == name) {
            return Some((found, MatchTier::Name));
        }

        let region = vendor_product(guid)?;
        self.richest(|d| vendor_product(&d.guid) == Some(region))
            .map(|found| (found, MatchTier::VendorProduct))
    }

    pub fn has_definition(&self, guid: &str, display_name: &str) -> bool {
        self.resolve(guid, display_name).is_some()
    }

    // Strictly-greater comparison keeps the first loaded on ties.
    fn richest<F>(&self, matches: F) -> Option<&ControllerDefinition>
    where
        F: Fn(&ControllerDefinition) -> bool,
    {
        let mut best: Option<&ControllerDefinition> = None;
        for candidate in self.definitions.iter().filter(|d| matches(d)) {
            match best {
                Some(current) if candidate.binding_count() <= current.binding_count() => {}
                _ => best = Some(candidate),
            }
        }
        best
    }
}
