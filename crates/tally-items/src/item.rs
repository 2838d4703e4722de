//! Item exemplars and physical stacks.
//!
//! An [`Item`] describes one concrete kind of item: its type, its
//! durability/variant number and a metadata bundle. It carries no amount;
//! amounts live either in an [`ItemStack`] (what a container holds) or in a
//! multiset entry.
//!
//! # Example
//!
//! ```
//! use tally_common::ItemTypeId;
//! use tally_items::item::ItemBuilder;
//!
//! let sword = ItemBuilder::new(ItemTypeId::new(276))
//!     .durability(12)
//!     .display_name("Oathkeeper")
//!     .enchant("sharpness", 3)
//!     .build();
//!
//! assert_eq!(sword.durability(), 12);
//! assert!(sword.meta().has_enchants());
//! ```

use std::collections::BTreeMap;
use std::fmt;

use tally_common::{EnchantmentId, ItemTypeId};
use tracing::info;

use crate::tag::TagValue;

/// Item metadata bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ItemMeta {
    /// Custom display name.
    display_name: Option<String>,
    /// Descriptive text lines; empty means "no lore".
    lore: Vec<String>,
    /// Enchantment levels.
    enchants: BTreeMap<EnchantmentId, u32>,
    /// Unbreakable flag.
    unbreakable: bool,
    /// Anvil repair cost; reset on normalization.
    repair_cost: u32,
    /// Attributes without a dedicated field.
    other: BTreeMap<String, TagValue>,
}

impl ItemMeta {
    /// Create empty metadata.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a display name is set.
    #[must_use]
    pub const fn has_display_name(&self) -> bool {
        self.display_name.is_some()
    }

    /// Get the display name.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Set or clear the display name.
    pub fn set_display_name(&mut self, name: Option<String>) {
        self.display_name = name;
    }

    /// Check if any lore is present.
    #[must_use]
    pub fn has_lore(&self) -> bool {
        !self.lore.is_empty()
    }

    /// Get the lore lines.
    #[must_use]
    pub fn lore(&self) -> &[String] {
        &self.lore
    }

    /// Replace the lore lines.
    pub fn set_lore(&mut self, lore: Vec<String>) {
        self.lore = lore;
    }

    /// Append one lore line.
    pub fn push_lore(&mut self, line: impl Into<String>) {
        self.lore.push(line.into());
    }

    /// Check if any enchantment is present.
    #[must_use]
    pub fn has_enchants(&self) -> bool {
        !self.enchants.is_empty()
    }

    /// Get the enchantment levels.
    #[must_use]
    pub const fn enchants(&self) -> &BTreeMap<EnchantmentId, u32> {
        &self.enchants
    }

    /// Set an enchantment level.
    pub fn set_enchant(&mut self, id: EnchantmentId, level: u32) {
        self.enchants.insert(id, level);
    }

    /// Remove all enchantments.
    pub fn clear_enchants(&mut self) {
        self.enchants.clear();
    }

    /// Get the unbreakable flag.
    #[must_use]
    pub const fn is_unbreakable(&self) -> bool {
        self.unbreakable
    }

    /// Set the unbreakable flag.
    pub fn set_unbreakable(&mut self, unbreakable: bool) {
        self.unbreakable = unbreakable;
    }

    /// Get the repair cost.
    #[must_use]
    pub const fn repair_cost(&self) -> u32 {
        self.repair_cost
    }

    /// Set the repair cost.
    pub fn set_repair_cost(&mut self, cost: u32) {
        self.repair_cost = cost;
    }

    /// Get the attributes without a dedicated field.
    #[must_use]
    pub const fn other(&self) -> &BTreeMap<String, TagValue> {
        &self.other
    }

    /// Set an attribute without a dedicated field.
    pub fn set_other(&mut self, key: impl Into<String>, value: TagValue) {
        self.other.insert(key.into(), value);
    }

    /// Check if no metadata is set at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Copy with name, lore, enchants and repair cost erased.
    ///
    /// What remains is the part of the bundle that only the catch-all
    /// "other metadata" wildcard can ignore.
    #[must_use]
    pub fn residual(&self) -> Self {
        Self {
            display_name: None,
            lore: Vec::new(),
            enchants: BTreeMap::new(),
            repair_cost: 0,
            ..self.clone()
        }
    }
}

/// One concrete kind of item, without an amount.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Item {
    /// Item type.
    type_id: ItemTypeId,
    /// Durability or sub-variant number.
    durability: i16,
    /// Metadata bundle.
    meta: ItemMeta,
}

impl Item {
    /// Create an item with durability 0 and no metadata.
    #[must_use]
    pub fn new(type_id: ItemTypeId) -> Self {
        Self::with_durability(type_id, 0)
    }

    /// Create an item with a durability and no metadata.
    #[must_use]
    pub fn with_durability(type_id: ItemTypeId, durability: i16) -> Self {
        Self {
            type_id,
            durability,
            meta: ItemMeta::new(),
        }
    }

    /// Get the item type.
    #[must_use]
    pub const fn type_id(&self) -> ItemTypeId {
        self.type_id
    }

    /// Get the durability.
    #[must_use]
    pub const fn durability(&self) -> i16 {
        self.durability
    }

    /// Get the metadata.
    #[must_use]
    pub const fn meta(&self) -> &ItemMeta {
        &self.meta
    }

    /// Get mutable metadata.
    pub fn meta_mut(&mut self) -> &mut ItemMeta {
        &mut self.meta
    }

    /// Canonical single-unit form used as a multiset key.
    ///
    /// Returns `None` when the item cannot exist in a container at all.
    /// The repair cost never participates in matching and is reset.
    #[must_use]
    pub fn normalized(&self) -> Option<Self> {
        if !self.type_id.is_holdable() {
            info!("Cannot normalize {self}: type cannot be held in containers");
            return None;
        }
        let mut copy = self.clone();
        copy.meta.repair_cost = 0;
        Some(copy)
    }

    /// Check if two items are the same kind once normalized.
    #[must_use]
    pub fn same_kind(&self, other: &Self) -> bool {
        self.type_id == other.type_id
            && self.durability == other.durability
            && self.meta.without_cost() == other.meta.without_cost()
    }

    /// Create a stack of this item.
    #[must_use]
    pub fn stack(&self, amount: u32) -> ItemStack {
        ItemStack::new(self.clone(), amount)
    }
}

impl ItemMeta {
    fn without_cost(&self) -> Self {
        Self {
            repair_cost: 0,
            ..self.clone()
        }
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.type_id, self.durability)?;
        if let Some(name) = &self.meta.display_name {
            write!(f, " \"{name}\"")?;
        }
        if self.meta.has_enchants() {
            let enchants: Vec<String> = self
                .meta
                .enchants
                .iter()
                .map(|(id, level)| format!("{id}={level}"))
                .collect();
            write!(f, " {{{}}}", enchants.join(","))?;
        }
        Ok(())
    }
}

/// A physical stack: an item plus how many of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemStack {
    /// The item kind.
    pub item: Item,
    /// Number of items.
    pub amount: u32,
}

impl ItemStack {
    /// Create a new stack.
    #[must_use]
    pub const fn new(item: Item, amount: u32) -> Self {
        Self { item, amount }
    }

    /// Check if the stack holds nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.amount == 0 || !self.item.type_id.is_holdable()
    }
}

impl fmt::Display for ItemStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {}", self.amount, self.item)
    }
}

/// Builder for items with complex metadata.
#[derive(Debug, Clone)]
pub struct ItemBuilder {
    item: Item,
}

impl ItemBuilder {
    /// Create a new builder for an item type.
    #[must_use]
    pub fn new(type_id: ItemTypeId) -> Self {
        Self {
            item: Item::new(type_id),
        }
    }

    /// Set the durability.
    #[must_use]
    pub const fn durability(mut self, durability: i16) -> Self {
        self.item.durability = durability;
        self
    }

    /// Set the display name.
    #[must_use]
    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.item.meta.display_name = Some(name.into());
        self
    }

    /// Append a lore line.
    #[must_use]
    pub fn lore_line(mut self, line: impl Into<String>) -> Self {
        self.item.meta.lore.push(line.into());
        self
    }

    /// Add an enchantment.
    #[must_use]
    pub fn enchant(mut self, id: impl Into<EnchantmentId>, level: u32) -> Self {
        self.item.meta.enchants.insert(id.into(), level);
        self
    }

    /// Set the unbreakable flag.
    #[must_use]
    pub const fn unbreakable(mut self, unbreakable: bool) -> Self {
        self.item.meta.unbreakable = unbreakable;
        self
    }

    /// Set the repair cost.
    #[must_use]
    pub const fn repair_cost(mut self, cost: u32) -> Self {
        self.item.meta.repair_cost = cost;
        self
    }

    /// Set an attribute without a dedicated field.
    #[must_use]
    pub fn attribute(mut self, key: impl Into<String>, value: TagValue) -> Self {
        self.item.meta.other.insert(key.into(), value);
        self
    }

    /// Build the item.
    #[must_use]
    pub fn build(self) -> Item {
        self.item
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IRON_INGOT: ItemTypeId = ItemTypeId::new(265);

    #[test]
    fn test_item_creation() {
        let item = Item::with_durability(IRON_INGOT, 3);
        assert_eq!(item.type_id(), IRON_INGOT);
        assert_eq!(item.durability(), 3);
        assert!(item.meta().is_empty());
    }

    #[test]
    fn test_normalize_resets_repair_cost() {
        let item = ItemBuilder::new(IRON_INGOT).repair_cost(7).build();
        let normal = item.normalized().expect("iron is holdable");
        assert_eq!(normal.meta().repair_cost(), 0);
        assert!(item.same_kind(&normal));
    }

    #[test]
    fn test_normalize_rejects_air() {
        assert!(Item::new(ItemTypeId::AIR).normalized().is_none());
        assert!(Item::new(ItemTypeId::AIR).stack(3).is_empty());
    }

    #[test]
    fn test_residual_drops_explicit_fields() {
        let item = ItemBuilder::new(IRON_INGOT)
            .display_name("Shiny")
            .lore_line("From the deep mines")
            .enchant("luck", 1)
            .attribute("color", TagValue::Int(0xff0000))
            .build();
        let residual = item.meta().residual();
        assert!(!residual.has_display_name());
        assert!(!residual.has_lore());
        assert!(!residual.has_enchants());
        assert_eq!(residual.other().len(), 1);
    }

    #[test]
    fn test_same_kind_sees_names() {
        let plain = Item::new(IRON_INGOT);
        let named = ItemBuilder::new(IRON_INGOT).display_name("Shiny").build();
        assert!(!plain.same_kind(&named));
        assert!(named.same_kind(&named.clone()));
    }

    #[test]
    fn test_display() {
        let item = ItemBuilder::new(IRON_INGOT)
            .durability(2)
            .display_name("Shiny")
            .enchant("luck", 1)
            .build();
        assert_eq!(item.stack(4).to_string(), "4 x #265:2 \"Shiny\" {luck=1}");
    }
}
