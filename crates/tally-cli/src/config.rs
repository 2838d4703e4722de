//! Tally configuration.
//!
//! Holds the stack sizes and container layout used when laying out and
//! matching stock. Configuration can be loaded from and saved to a TOML file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tally_common::ItemTypeId;
use tally_items::catalog::{ItemCatalog, DEFAULT_MAX_STACK};
use tracing::{info, warn};

/// Configuration file name.
const CONFIG_FILE: &str = "tally.toml";

/// Largest stack size accepted from configuration.
const MAX_STACK_LIMIT: u32 = 1024;

/// Largest slot count of a generic stock container.
pub const MAX_CONTAINER_SIZE: usize = 256;

/// Per-type stack size override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackOverride {
    /// Raw item type ID
    pub item: u32,
    /// Maximum stack size for this type
    pub max_stack: u32,
}

/// Tally configuration parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TallyConfig {
    /// Stack size for types without an override
    pub default_max_stack: u32,
    /// Slots of a generic stock container
    pub container_size: usize,
    /// Per-type stack sizes
    #[serde(rename = "stack_override")]
    pub stack_overrides: Vec<StackOverride>,
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self {
            default_max_stack: DEFAULT_MAX_STACK,
            container_size: 27,
            stack_overrides: Vec::new(),
        }
    }
}

impl TallyConfig {
    /// Load configuration from the default file location.
    /// Returns default config if file doesn't exist.
    pub fn load() -> Self {
        Self::load_from(Self::config_path())
    }

    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        let mut contents = String::new();
        if let Err(e) = fs::File::open(path).and_then(|mut file| file.read_to_string(&mut contents))
        {
            warn!("Failed to read config file: {e}");
            return Self::default();
        }

        match toml::from_str::<Self>(&contents) {
            Ok(mut config) => {
                config.validate();
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Failed to parse config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Get the default configuration file path.
    fn config_path() -> PathBuf {
        dirs::config_dir().map_or_else(
            || PathBuf::from(CONFIG_FILE),
            |dir| dir.join("tally").join(CONFIG_FILE),
        )
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        self.default_max_stack = self.default_max_stack.clamp(1, MAX_STACK_LIMIT);
        self.container_size = self.container_size.clamp(1, MAX_CONTAINER_SIZE);

        self.stack_overrides.retain(|o| {
            let holdable = ItemTypeId::new(o.item).is_holdable();
            if !holdable {
                warn!("Ignoring stack override for unholdable type {}", o.item);
            }
            holdable
        });
        for o in &mut self.stack_overrides {
            o.max_stack = o.max_stack.clamp(1, MAX_STACK_LIMIT);
        }
    }

    /// Build the stack size catalog described by this configuration.
    #[must_use]
    pub fn catalog(&self) -> ItemCatalog {
        self.stack_overrides
            .iter()
            .fold(ItemCatalog::new(self.default_max_stack), |catalog, o| {
                catalog.with_max_stack(ItemTypeId::new(o.item), o.max_stack)
            })
    }
}
