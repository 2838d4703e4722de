//! Wildcard-aware item criteria.
//!
//! An [`ItemCriteria`] is an exemplar [`Item`] plus a set of [`Wildcards`].
//! It accepts every item that agrees with the exemplar on all dimensions
//! that are not wildcarded. Amounts never play a role here.
//!
//! Criteria form a strict partial order by specificity: `a` is more
//! specific than `b` when `a` accepts a strict subset of what `b` accepts.
//! Criteria wildcarding different dimensions are incomparable.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use tally_common::{EnchantmentId, ItemTypeId};

use crate::item::Item;

/// Wildcard toggles of a criteria.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Wildcards(u8);

impl Wildcards {
    /// No wildcards; only the exact item is accepted.
    pub const NONE: Self = Self(0);
    /// Any durability.
    pub const DURABILITY: Self = Self(1 << 0);
    /// Any lore.
    pub const LORE: Self = Self(1 << 1);
    /// Any enchantments.
    pub const ENCHANTS: Self = Self(1 << 2);
    /// Any display name.
    pub const NAME: Self = Self(1 << 3);
    /// Any metadata at all; implies lore, enchants, name and other.
    pub const ALL_METADATA: Self = Self(1 << 4);
    /// Any metadata without a dedicated toggle.
    pub const OTHER_METADATA: Self = Self(1 << 5);

    /// Every dimension, in the order specificity is compared.
    pub const DIMENSIONS: [Self; 6] = [
        Self::DURABILITY,
        Self::ALL_METADATA,
        Self::LORE,
        Self::ENCHANTS,
        Self::NAME,
        Self::OTHER_METADATA,
    ];

    /// Creates wildcards from a raw value, dropping unknown bits.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw & 0b11_1111)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Checks if every toggle in `flag` is set.
    #[must_use]
    pub const fn has(self, flag: Self) -> bool {
        (self.0 & flag.0) == flag.0
    }

    /// Combines two toggle sets.
    #[must_use]
    pub const fn with(self, flag: Self) -> Self {
        Self(self.0 | flag.0)
    }

    /// Checks if any toggle is set.
    #[must_use]
    pub const fn any(self) -> bool {
        self.0 != 0
    }

    const fn name(self) -> &'static str {
        match self.0 {
            0b00_0001 => "durability",
            0b00_0010 => "lore",
            0b00_0100 => "enchants",
            0b00_1000 => "name",
            0b01_0000 => "all-metadata",
            0b10_0000 => "other-metadata",
            _ => "mixed",
        }
    }

    /// Looks up a single dimension by the name it displays with.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::DIMENSIONS
            .into_iter()
            .find(|flag| flag.name() == name)
    }
}

impl fmt::Display for Wildcards {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = Self::DIMENSIONS
            .iter()
            .filter(|flag| self.has(**flag))
            .map(|flag| flag.name())
            .collect();
        write!(f, "[{}]", names.join(","))
    }
}

/// An immutable predicate over items.
#[derive(Debug, Clone)]
pub struct ItemCriteria {
    /// Base exemplar; repair cost is always zero.
    item: Item,
    /// Active toggles.
    wildcards: Wildcards,
}

impl ItemCriteria {
    /// Creates a criteria from an exemplar and wildcard toggles.
    #[must_use]
    pub fn new(mut item: Item, wildcards: Wildcards) -> Self {
        item.meta_mut().set_repair_cost(0);
        Self { item, wildcards }
    }

    /// Creates a criteria accepting only items identical to `item`.
    #[must_use]
    pub fn exact(item: Item) -> Self {
        Self::new(item, Wildcards::NONE)
    }

    /// Returns the base exemplar.
    #[must_use]
    pub const fn item(&self) -> &Item {
        &self.item
    }

    /// Returns the wildcard toggles.
    #[must_use]
    pub const fn wildcards(&self) -> Wildcards {
        self.wildcards
    }

    /// Returns the exemplar's type.
    #[must_use]
    pub const fn type_id(&self) -> ItemTypeId {
        self.item.type_id()
    }

    /// Whether durability is ignored.
    #[must_use]
    pub const fn is_durability_wildcarded(&self) -> bool {
        self.wildcards.has(Wildcards::DURABILITY)
    }

    /// Whether all metadata is ignored.
    #[must_use]
    pub const fn is_all_metadata_wildcarded(&self) -> bool {
        self.wildcards.has(Wildcards::ALL_METADATA)
    }

    /// Whether lore is ignored.
    #[must_use]
    pub const fn is_lore_wildcarded(&self) -> bool {
        self.wildcards.has(Wildcards::LORE) || self.is_all_metadata_wildcarded()
    }

    /// Whether enchantments are ignored.
    #[must_use]
    pub const fn are_enchants_wildcarded(&self) -> bool {
        self.wildcards.has(Wildcards::ENCHANTS) || self.is_all_metadata_wildcarded()
    }

    /// Whether the display name is ignored.
    #[must_use]
    pub const fn is_name_wildcarded(&self) -> bool {
        self.wildcards.has(Wildcards::NAME) || self.is_all_metadata_wildcarded()
    }

    /// Whether metadata without a dedicated toggle is ignored.
    #[must_use]
    pub const fn is_other_metadata_wildcarded(&self) -> bool {
        self.wildcards.has(Wildcards::OTHER_METADATA) || self.is_all_metadata_wildcarded()
    }

    /// Checks whether any wildcard is set.
    #[must_use]
    pub const fn has_wildcard(&self) -> bool {
        self.wildcards.any()
    }

    /// Required durability, or `None` when wildcarded.
    #[must_use]
    pub const fn durability(&self) -> Option<i16> {
        if self.is_durability_wildcarded() {
            None
        } else {
            Some(self.item.durability())
        }
    }

    /// Required lore, or `None` when wildcarded. Empty means "no lore".
    #[must_use]
    pub fn lore(&self) -> Option<&[String]> {
        (!self.is_lore_wildcarded()).then(|| self.item.meta().lore())
    }

    /// Required enchantments, or `None` when wildcarded.
    #[must_use]
    pub fn enchants(&self) -> Option<&BTreeMap<EnchantmentId, u32>> {
        (!self.are_enchants_wildcarded()).then(|| self.item.meta().enchants())
    }

    /// Required display name, or `None` when wildcarded.
    /// An empty string means "must not be named".
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        (!self.is_name_wildcarded()).then(|| self.item.meta().display_name().unwrap_or(""))
    }

    /// Checks whether `candidate` is within the set this criteria describes.
    #[must_use]
    pub fn accepts(&self, candidate: &Item) -> bool {
        if candidate.type_id() != self.item.type_id() {
            return false;
        }
        if !(self.is_durability_wildcarded() || candidate.durability() == self.item.durability())
        {
            return false;
        }
        if self.is_all_metadata_wildcarded() {
            return true;
        }

        let wanted = self.item.meta();
        let meta = candidate.meta();
        // A missing field on the exemplar requires a missing field on the
        // candidate; a present one requires an equal one.
        if !self.wildcards.has(Wildcards::LORE) && wanted.lore() != meta.lore() {
            return false;
        }
        if !self.wildcards.has(Wildcards::ENCHANTS) && wanted.enchants() != meta.enchants() {
            return false;
        }
        if !self.wildcards.has(Wildcards::NAME) && wanted.display_name() != meta.display_name() {
            return false;
        }
        if wanted.is_unbreakable() != meta.is_unbreakable() {
            return false;
        }
        if self.wildcards.has(Wildcards::OTHER_METADATA) {
            return true;
        }
        wanted.residual() == meta.residual()
    }

    /// Checks whether `self` accepts a strict subset of what `other` accepts.
    ///
    /// Returns `false` in both directions for identical or incomparable
    /// wildcard sets.
    #[must_use]
    pub fn more_specific_than(&self, other: &Self) -> bool {
        if !self.accepts(&other.item) {
            return false;
        }
        let mut narrower = false;
        let theirs = other.effective_wildcards();
        for (mine, theirs) in self.effective_wildcards().into_iter().zip(theirs) {
            match (mine, theirs) {
                (true, false) => return false,
                (false, true) => narrower = true,
                _ => {},
            }
        }
        narrower
    }

    /// Wildcarded dimensions after the all-metadata toggle is applied, in
    /// [`Wildcards::DIMENSIONS`] order.
    const fn effective_wildcards(&self) -> [bool; 6] {
        [
            self.is_durability_wildcarded(),
            self.is_all_metadata_wildcarded(),
            self.is_lore_wildcarded(),
            self.are_enchants_wildcarded(),
            self.is_name_wildcarded(),
            self.is_other_metadata_wildcarded(),
        ]
    }
}

impl PartialEq for ItemCriteria {
    fn eq(&self, other: &Self) -> bool {
        if self.wildcards != other.wildcards || self.item.type_id() != other.item.type_id() {
            return false;
        }
        if !self.is_durability_wildcarded() && self.item.durability() != other.item.durability() {
            return false;
        }
        if self.is_all_metadata_wildcarded() {
            return true;
        }
        let (a, b) = (self.item.meta(), other.item.meta());
        (self.is_lore_wildcarded() || a.lore() == b.lore())
            && (self.are_enchants_wildcarded() || a.enchants() == b.enchants())
            && (self.is_name_wildcarded() || a.display_name() == b.display_name())
            && a.is_unbreakable() == b.is_unbreakable()
            && (self.is_other_metadata_wildcarded() || a.other() == b.other())
    }
}

impl Eq for ItemCriteria {}

impl Hash for ItemCriteria {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.wildcards.hash(state);
        self.item.type_id().hash(state);
        self.durability().hash(state);
        if self.is_all_metadata_wildcarded() {
            return;
        }
        let meta = self.item.meta();
        self.lore().hash(state);
        self.enchants().hash(state);
        if !self.is_name_wildcarded() {
            meta.display_name().hash(state);
        }
        meta.is_unbreakable().hash(state);
        if !self.is_other_metadata_wildcarded() {
            meta.other().hash(state);
        }
    }
}

impl fmt::Display for ItemCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.item)?;
        if self.has_wildcard() {
            write!(f, " any{}", self.wildcards)?;
        }
        Ok(())
    }
}
