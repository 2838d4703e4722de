//! Display forms of criteria and multisets.
//!
//! These produce plain items and stacks for a UI to show; none of them
//! feed back into matching.

use tracing::trace;

use crate::catalog::ItemCatalog;
use crate::criteria::ItemCriteria;
use crate::item::{Item, ItemStack};
use crate::multiset::ItemMultiset;

/// Separator line between the exemplar's own lore and wildcard notes.
pub const LORE_SEPARATOR: &str = "------------------";

impl ItemCriteria {
    /// Exemplar copy with lore lines describing the active wildcards.
    #[must_use]
    pub fn gui_representation(&self) -> Item {
        let mut item = self.item().clone();
        if !self.has_wildcard() {
            return item;
        }

        let meta = item.meta_mut();
        meta.push_lore(LORE_SEPARATOR);
        if self.is_durability_wildcarded() {
            meta.push_lore("May have any durability");
        }
        if self.is_all_metadata_wildcarded() {
            meta.push_lore("May have any item meta data");
            return item;
        }
        if self.are_enchants_wildcarded() {
            meta.push_lore("May have any enchants");
        }
        if self.is_lore_wildcarded() {
            meta.push_lore("May have any lore");
        }
        if self.is_name_wildcarded() {
            meta.push_lore("May have any custom name");
        }
        if self.is_other_metadata_wildcarded() {
            meta.push_lore("May have any other NBT tags");
        }
        item
    }
}

impl ItemMultiset {
    /// Lays the multiset out as stacks no larger than the type's max size.
    ///
    /// Entries with non-positive amounts produce nothing.
    #[must_use]
    pub fn item_stack_representation(&self, catalog: &ItemCatalog) -> Vec<ItemStack> {
        let mut stacks = Vec::new();
        for (criteria, amount) in self.iter() {
            let max = u64::from(catalog.max_stack_size(criteria.type_id()));
            let mut left = u64::try_from(amount).unwrap_or(0);
            while left > 0 {
                let size = left.min(max);
                // `size <= max`, and `max` came from a u32.
                stacks.push(criteria.item().stack(size as u32));
                left -= size;
            }
        }
        trace!("{} laid out as {} stacks", self, stacks.len());
        stacks
    }

    /// One single-item stack per entry, with the count written into lore.
    ///
    /// Each stack shows `Total item count: N`; when `N` is more than one
    /// full stack, a second line breaks it down into stacks and a rest.
    #[must_use]
    pub fn lored_count_representation(&self, catalog: &ItemCatalog) -> Vec<ItemStack> {
        self.iter()
            .map(|(criteria, amount)| {
                let mut item = criteria.gui_representation();
                let max = i64::from(catalog.max_stack_size(criteria.type_id()));
                let meta = item.meta_mut();
                meta.push_lore(format!("Total item count: {amount}"));
                if amount > max {
                    meta.push_lore(count_breakdown(amount, max));
                }
                item.stack(1)
            })
            .collect()
    }
}

fn count_breakdown(amount: i64, max: i64) -> String {
    let stacks = amount / max;
    let extra = amount % max;
    let plural = |n: i64, word: &str| {
        if n == 1 {
            format!("{n} {word}")
        } else {
            format!("{n} {word}s")
        }
    };
    let mut text = format!(
        "{} total, which equals {}",
        plural(amount, "item"),
        plural(stacks, "stack")
    );
    if extra > 0 {
        text.push_str(&format!(" and {}", plural(extra, "item")));
    }
    text
}
