//! Manifest loading.
//!
//! A manifest is a TOML file describing one recipe multiset and the stock a
//! container holds:
//!
//! ```toml
//! version = "1.0.0"
//!
//! [container]
//! kind = "player"
//!
//! [[recipe]]
//! item = 267
//! amount = 1
//! wildcards = ["durability"]
//!
//! [[stock]]
//! item = 267
//! durability = 7
//! amount = 1
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tally_common::{ItemTypeId, SchemaVersion};
use tally_items::catalog::ItemCatalog;
use tally_items::container::{ContainerKind, SlotContainer};
use tally_items::criteria::{ItemCriteria, Wildcards};
use tally_items::item::{Item, ItemBuilder};
use tally_items::multiset::ItemMultiset;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{TallyConfig, MAX_CONTAINER_SIZE};

/// Errors that can occur during manifest loading.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// File not found.
    #[error("Manifest file not found: {0}")]
    NotFound(PathBuf),

    /// Failed to read file.
    #[error("Failed to read manifest file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML.
    #[error("Failed to parse manifest TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Validation error.
    #[error("Manifest validation error: {0}")]
    ValidationError(String),

    /// Layout version this build cannot read.
    #[error("Unsupported manifest version: {0}")]
    UnsupportedVersion(String),
}

/// Result type for manifest loading operations.
pub type ManifestResult<T> = Result<T, ManifestError>;

/// Container layout named in a manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerLayout {
    /// Every slot is storage; size from the manifest or configuration.
    #[default]
    Generic,
    /// A player inventory.
    Player,
}

/// Stock container definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerDefinition {
    /// Layout of the container.
    #[serde(default)]
    pub kind: ContainerLayout,
    /// Slot count for generic containers.
    #[serde(default)]
    pub size: Option<usize>,
}

/// One item line of a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemEntry {
    /// Raw item type ID.
    pub item: u32,
    /// Durability or sub-variant.
    #[serde(default)]
    pub durability: i16,
    /// Number of items.
    pub amount: u32,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Lore lines.
    #[serde(default)]
    pub lore: Vec<String>,
    /// Enchantment levels by ID.
    #[serde(default)]
    pub enchants: BTreeMap<String, u32>,
    /// Unbreakable flag.
    #[serde(default)]
    pub unbreakable: bool,
    /// Wildcarded dimensions, by name.
    #[serde(default)]
    pub wildcards: Vec<String>,
}

impl ItemEntry {
    /// Validates the entry.
    pub fn validate(&self, section: &str, index: usize) -> ManifestResult<()> {
        if !ItemTypeId::new(self.item).is_holdable() {
            return Err(ManifestError::ValidationError(format!(
                "{section} entry {index} has unholdable item type {}",
                self.item
            )));
        }
        if self.amount == 0 {
            return Err(ManifestError::ValidationError(format!(
                "{section} entry {index} has zero amount"
            )));
        }
        for name in &self.wildcards {
            if Wildcards::from_name(name).is_none() {
                return Err(ManifestError::ValidationError(format!(
                    "{section} entry {index} has unknown wildcard: {name}"
                )));
            }
        }
        Ok(())
    }

    /// Builds the exemplar item.
    #[must_use]
    pub fn to_item(&self) -> Item {
        let mut builder = ItemBuilder::new(ItemTypeId::new(self.item))
            .durability(self.durability)
            .unbreakable(self.unbreakable);
        if let Some(name) = &self.name {
            builder = builder.display_name(name.as_str());
        }
        for line in &self.lore {
            builder = builder.lore_line(line.as_str());
        }
        for (id, level) in &self.enchants {
            builder = builder.enchant(id.as_str(), *level);
        }
        builder.build()
    }

    /// Builds the criteria; unknown wildcard names are skipped.
    #[must_use]
    pub fn to_criteria(&self) -> ItemCriteria {
        let wildcards = self
            .wildcards
            .iter()
            .filter_map(|name| Wildcards::from_name(name))
            .fold(Wildcards::NONE, Wildcards::with);
        ItemCriteria::new(self.to_item(), wildcards)
    }
}

/// A recipe and the stock to match it against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// File format version.
    #[serde(default = "default_version")]
    pub version: String,
    /// Stock container layout.
    #[serde(default)]
    pub container: ContainerDefinition,
    /// Recipe lines.
    #[serde(default)]
    pub recipe: Vec<ItemEntry>,
    /// Stock lines.
    #[serde(default)]
    pub stock: Vec<ItemEntry>,
}

fn default_version() -> String {
    SchemaVersion::MANIFEST.to_string()
}

impl Manifest {
    /// Loads and validates a manifest file.
    pub fn load(path: &Path) -> ManifestResult<Self> {
        if !path.exists() {
            return Err(ManifestError::NotFound(path.to_path_buf()));
        }
        debug!("Loading manifest file: {:?}", path);

        let content = fs::read_to_string(path)?;
        let manifest = Self::parse(&content)?;
        info!(
            "Loaded manifest with {} recipe and {} stock entries",
            manifest.recipe.len(),
            manifest.stock.len()
        );
        Ok(manifest)
    }

    /// Parses and validates manifest text.
    pub fn parse(content: &str) -> ManifestResult<Self> {
        let manifest: Self = toml::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Validates the manifest.
    pub fn validate(&self) -> ManifestResult<()> {
        let compatible = SchemaVersion::parse(&self.version)
            .is_some_and(|stored| SchemaVersion::MANIFEST.is_compatible_with(&stored));
        if !compatible {
            return Err(ManifestError::UnsupportedVersion(self.version.clone()));
        }

        for (i, entry) in self.recipe.iter().enumerate() {
            entry.validate("recipe", i)?;
        }
        for (i, entry) in self.stock.iter().enumerate() {
            entry.validate("stock", i)?;
            if !entry.wildcards.is_empty() {
                return Err(ManifestError::ValidationError(format!(
                    "stock entry {i} has wildcards; stock holds concrete items"
                )));
            }
        }
        if let Some(size) = self.container.size {
            if !(1..=MAX_CONTAINER_SIZE).contains(&size) {
                return Err(ManifestError::ValidationError(format!(
                    "container size {size} is outside 1..={MAX_CONTAINER_SIZE}"
                )));
            }
        }
        Ok(())
    }

    /// The recipe as a multiset.
    #[must_use]
    pub fn recipe(&self) -> ItemMultiset {
        self.recipe
            .iter()
            .map(|entry| (entry.to_criteria(), i64::from(entry.amount)))
            .collect()
    }

    /// Fills a fresh container with the stock lines.
    ///
    /// Stock that does not fit is dropped with a warning.
    #[must_use]
    pub fn stock_container(&self, config: &TallyConfig, catalog: &ItemCatalog) -> SlotContainer {
        let mut container = match self.container.kind {
            ContainerLayout::Player => SlotContainer::player_inventory(),
            ContainerLayout::Generic => SlotContainer::new(
                ContainerKind::Generic,
                self.container
                    .size
                    .unwrap_or(config.container_size)
                    .clamp(1, MAX_CONTAINER_SIZE),
            ),
        };
        for entry in &self.stock {
            let stack = entry.to_item().stack(entry.amount);
            let leftover = container.add_stack(catalog, &stack);
            if leftover > 0 {
                warn!("Dropped {leftover} of {} that did not fit the container", stack.item);
            }
        }
        container
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tally_items::container::Container;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
version = "1.0.0"

[container]
kind = "generic"
size = 9

[[recipe]]
item = 265
amount = 3

[[recipe]]
item = 267
amount = 1
wildcards = ["durability", "enchants"]

[[stock]]
item = 265
amount = 10

[[stock]]
item = 267
durability = 12
amount = 1
enchants = { sharpness = 2 }
"#;

    #[test]
    fn test_parse_sample() {
        let manifest = Manifest::parse(SAMPLE).expect("valid manifest");
        assert_eq!(manifest.recipe.len(), 2);
        assert_eq!(manifest.stock.len(), 2);
        assert_eq!(manifest.container.size, Some(9));

        let recipe = manifest.recipe();
        assert_eq!(recipe.total(), 4);
        let sword = recipe
            .iter()
            .find(|(criteria, _)| criteria.has_wildcard())
            .map(|(criteria, _)| criteria.wildcards());
        assert_eq!(sword, Some(Wildcards::DURABILITY.with(Wildcards::ENCHANTS)));
    }

    #[test]
    fn test_stock_container() {
        let manifest = Manifest::parse(SAMPLE).expect("valid manifest");
        let config = TallyConfig::default();
        let container = manifest.stock_container(&config, &config.catalog());
        assert_eq!(container.size(), 9);
        assert_eq!(ItemMultiset::from_container(&container).total(), 11);
        assert!(manifest.recipe().is_contained_in_container(&container));
    }

    #[test]
    fn test_player_container() {
        let manifest =
            Manifest::parse("[container]\nkind = \"player\"\n").expect("valid manifest");
        let config = TallyConfig::default();
        let container = manifest.stock_container(&config, &config.catalog());
        assert_eq!(container.kind(), ContainerKind::PlayerInventory);
        assert_eq!(manifest.version, "1.0.0");
    }

    #[test]
    fn test_rejects_unknown_wildcard() {
        let err = Manifest::parse("[[recipe]]\nitem = 1\namount = 1\nwildcards = [\"color\"]\n")
            .expect_err("unknown wildcard");
        assert!(matches!(err, ManifestError::ValidationError(_)));
    }

    #[test]
    fn test_rejects_wildcard_stock() {
        let err = Manifest::parse("[[stock]]\nitem = 1\namount = 1\nwildcards = [\"lore\"]\n")
            .expect_err("wildcard stock");
        assert!(matches!(err, ManifestError::ValidationError(_)));
    }

    #[test]
    fn test_rejects_zero_amount_and_air() {
        assert!(Manifest::parse("[[recipe]]\nitem = 1\namount = 0\n").is_err());
        assert!(Manifest::parse("[[recipe]]\nitem = 0\namount = 1\n").is_err());
    }

    #[test]
    fn test_rejects_container_size_out_of_range() {
        for size in ["0", "257", "1000000000000"] {
            let err = Manifest::parse(&format!("[container]\nsize = {size}\n"))
                .expect_err("size out of range");
            assert!(matches!(err, ManifestError::ValidationError(_)));
        }
        let manifest = Manifest::parse("[container]\nsize = 256\n").expect("largest size");
        assert_eq!(manifest.container.size, Some(MAX_CONTAINER_SIZE));
    }

    #[test]
    fn test_stock_container_clamps_unvalidated_size() {
        let manifest = Manifest {
            version: default_version(),
            container: ContainerDefinition {
                kind: ContainerLayout::Generic,
                size: Some(usize::MAX),
            },
            recipe: Vec::new(),
            stock: Vec::new(),
        };
        let config = TallyConfig::default();
        let container = manifest.stock_container(&config, &config.catalog());
        assert_eq!(container.size(), MAX_CONTAINER_SIZE);
    }

    #[test]
    fn test_rejects_future_version() {
        let err = Manifest::parse("version = \"2.0.0\"\n").expect_err("future version");
        assert!(matches!(err, ManifestError::UnsupportedVersion(v) if v == "2.0.0"));
    }

    #[test]
    fn test_parse_error() {
        let err = Manifest::parse("[[recipe]]\nitem = \"iron\"\n").expect_err("bad toml");
        assert!(matches!(err, ManifestError::ParseError(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(SAMPLE.as_bytes()).expect("write");

        let manifest = Manifest::load(file.path()).expect("load");
        assert_eq!(manifest.recipe().total(), 4);

        let missing = Manifest::load(Path::new("/nonexistent/manifest.toml"));
        assert!(matches!(missing, Err(ManifestError::NotFound(_))));
    }
}
