//! ID types for item kinds and enchantments.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an item type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemTypeId(u32);

impl ItemTypeId {
    /// The empty/air type. It can never be held in a container.
    pub const AIR: Self = Self(0);

    /// Creates an item type ID from a raw value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Checks if this type can exist as a physical stack.
    #[must_use]
    pub const fn is_holdable(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for ItemTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of an enchantment, e.g. `"sharpness"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EnchantmentId(String);

impl EnchantmentId {
    /// Creates an enchantment ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EnchantmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EnchantmentId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for EnchantmentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}
