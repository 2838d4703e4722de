//! Counted collection of item criteria.
//!
//! An [`ItemMultiset`] maps [`ItemCriteria`] to signed amounts and keeps a
//! cached total that is updated on every mutation. One entry aggregates any
//! number of physical stacks.
//!
//! Entries keep insertion order. Everything that scans entries (amount
//! lookups, [`ItemMultiset::most_specific`], the matching sweep) therefore
//! behaves deterministically for a given sequence of insertions.
//!
//! Negative amounts are allowed through [`ItemMultiset::insert`]. A multiset
//! holding them can look non-empty while its total is zero, or "contain"
//! things an empty container does not; callers mixing signs own that.

use std::fmt;

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::container::Container;
use crate::criteria::ItemCriteria;
use crate::item::{Item, ItemStack};

/// Counted collection of item criteria.
#[derive(Debug, Clone, Default)]
pub struct ItemMultiset {
    /// Amount per criteria, in insertion order.
    entries: IndexMap<ItemCriteria, i64>,
    /// Sum of all entry amounts.
    total: i64,
}

impl ItemMultiset {
    /// Creates an empty multiset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a multiset holding a single stack.
    #[must_use]
    pub fn from_stack(stack: &ItemStack) -> Self {
        let mut multiset = Self::new();
        multiset.insert_stack(stack);
        multiset
    }

    /// Creates a multiset from a collection of stacks.
    #[must_use]
    pub fn from_stacks<'a>(stacks: impl IntoIterator<Item = &'a ItemStack>) -> Self {
        let mut multiset = Self::new();
        multiset.insert_all(stacks);
        multiset
    }

    /// Snapshots the current contents of a container.
    ///
    /// The snapshot never follows later changes of the container.
    #[must_use]
    pub fn from_container(container: &impl Container) -> Self {
        let mut multiset = Self::new();
        multiset.refresh_from(container);
        multiset
    }

    /// Replaces all contents with a fresh snapshot of `container`.
    pub fn refresh_from(&mut self, container: &impl Container) {
        self.entries.clear();
        self.total = 0;
        for stack in container.slots().iter().flatten() {
            self.insert_stack(stack);
        }
    }

    /// Adds `amount` to the entry for `criteria`, creating it if needed.
    pub fn insert(&mut self, criteria: ItemCriteria, amount: i64) {
        *self.entries.entry(criteria).or_insert(0) += amount;
        self.total += amount;
    }

    /// Removes up to `amount` from the entry for `criteria`.
    ///
    /// Returns how much could not be removed. An entry that reaches zero or
    /// below is dropped.
    pub fn remove(&mut self, criteria: &ItemCriteria, amount: i64) -> i64 {
        let Some(current) = self.entries.get_mut(criteria) else {
            return amount;
        };
        let remaining = *current - amount;
        self.total -= amount;
        if remaining > 0 {
            *current = remaining;
            return 0;
        }
        let not_removed = remaining.abs();
        self.total += not_removed;
        self.entries.shift_remove(criteria);
        not_removed
    }

    /// Adds a physical stack under its exact criteria.
    ///
    /// Items that cannot be held in a container are ignored.
    pub fn insert_stack(&mut self, stack: &ItemStack) {
        self.insert_amount(&stack.item, i64::from(stack.amount));
    }

    /// Adds `amount` of `item` under its exact criteria.
    pub fn insert_amount(&mut self, item: &Item, amount: i64) {
        if let Some(normal) = item.normalized() {
            self.insert(ItemCriteria::exact(normal), amount);
        }
    }

    /// Adds every stack of a collection.
    pub fn insert_all<'a>(&mut self, stacks: impl IntoIterator<Item = &'a ItemStack>) {
        for stack in stacks {
            self.insert_stack(stack);
        }
    }

    /// Removes a physical stack from its exact criteria.
    ///
    /// Returns how much could not be removed.
    pub fn remove_stack(&mut self, stack: &ItemStack) -> i64 {
        let amount = i64::from(stack.amount);
        match stack.item.normalized() {
            Some(normal) => self.remove(&ItemCriteria::exact(normal), amount),
            None => {
                info!("Nothing removed for unrepresentable stack {stack}");
                amount
            },
        }
    }

    /// Drops the exact entry for `item`, whatever its amount.
    ///
    /// Returns false if there was no such entry.
    pub fn remove_completely(&mut self, item: &Item) -> bool {
        let Some(criteria) = item.normalized().map(ItemCriteria::exact) else {
            return false;
        };
        match self.entries.get(&criteria).copied() {
            Some(amount) => {
                self.remove(&criteria, amount);
                true
            },
            None => false,
        }
    }

    /// Sum of the amounts of every entry accepting `item`.
    #[must_use]
    pub fn amount_for_item(&self, item: &Item) -> i64 {
        self.entries
            .iter()
            .filter(|(criteria, _)| criteria.accepts(item))
            .map(|(_, amount)| amount)
            .sum()
    }

    /// Amount stored for exactly this criteria, without acceptance tests.
    #[must_use]
    pub fn amount_for(&self, criteria: &ItemCriteria) -> i64 {
        self.entries.get(criteria).copied().unwrap_or(0)
    }

    /// All criteria accepting `item`, in insertion order.
    #[must_use]
    pub fn accepting_criteria(&self, item: &Item) -> Vec<&ItemCriteria> {
        self.entries
            .keys()
            .filter(|criteria| criteria.accepts(item))
            .collect()
    }

    /// The accepting criteria no other accepting criteria is more specific
    /// than.
    ///
    /// When several incomparable criteria qualify, the earliest inserted one
    /// that is not beaten by a later one wins.
    #[must_use]
    pub fn most_specific(&self, item: &Item) -> Option<&ItemCriteria> {
        let mut best: Option<&ItemCriteria> = None;
        for criteria in self.entries.keys().filter(|criteria| criteria.accepts(item)) {
            match best {
                Some(current) if !criteria.more_specific_than(current) => {},
                _ => best = Some(criteria),
            }
        }
        best
    }

    /// Adds every entry of `other` into `self`.
    pub fn merge(&mut self, other: &Self) {
        for (criteria, amount) in &other.entries {
            self.insert(criteria.clone(), *amount);
        }
    }

    /// Returns a copy with every amount multiplied by `factor`.
    ///
    /// Each entry is truncated toward zero on its own, so the new total can
    /// drift from `total * factor` by up to one unit per entry.
    #[must_use]
    pub fn scale(&self, factor: f64) -> Self {
        let mut scaled = Self::new();
        for (criteria, amount) in &self.entries {
            #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
            let amount = (*amount as f64 * factor).trunc() as i64;
            scaled.entries.insert(criteria.clone(), amount);
            scaled.total += amount;
        }
        debug!(
            "Scaled multiset by {factor}: total {} -> {}",
            self.total, scaled.total
        );
        scaled
    }

    /// Sum of all amounts.
    #[must_use]
    pub const fn total(&self) -> i64 {
        self.total
    }

    /// Number of distinct criteria.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Checks if no entry is stored.
    ///
    /// With negative entries this can disagree with `total() == 0`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&ItemCriteria, i64)> + '_ {
        self.entries.iter().map(|(criteria, &amount)| (criteria, amount))
    }

    /// Owned copy of all entries, detached from `self`.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(ItemCriteria, i64)> {
        self.entries
            .iter()
            .map(|(criteria, &amount)| (criteria.clone(), amount))
            .collect()
    }
}

impl PartialEq for ItemMultiset {
    fn eq(&self, other: &Self) -> bool {
        // IndexMap equality ignores order.
        self.total == other.total && self.entries == other.entries
    }
}

impl Eq for ItemMultiset {}

impl fmt::Display for ItemMultiset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (criteria, amount) in &self.entries {
            write!(f, "{amount} x {criteria};")?;
        }
        Ok(())
    }
}

impl FromIterator<(ItemCriteria, i64)> for ItemMultiset {
    fn from_iter<T: IntoIterator<Item = (ItemCriteria, i64)>>(iter: T) -> Self {
        let mut multiset = Self::new();
        for (criteria, amount) in iter {
            multiset.insert(criteria, amount);
        }
        multiset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{ContainerKind, SlotContainer};
    use crate::criteria::Wildcards;
    use crate::item::ItemBuilder;
    use proptest::prelude::*;
    use tally_common::ItemTypeId;

    const IRON_INGOT: ItemTypeId = ItemTypeId::new(265);
    const SWORD: ItemTypeId = ItemTypeId::new(267);

    fn iron() -> ItemCriteria {
        ItemCriteria::exact(Item::new(IRON_INGOT))
    }

    #[test]
    fn test_insert_and_remove() {
        let mut multiset = ItemMultiset::new();
        multiset.insert(iron(), 5);
        assert_eq!(multiset.total(), 5);
        assert_eq!(multiset.amount_for(&iron()), 5);

        assert_eq!(multiset.remove(&iron(), 3), 0);
        assert_eq!(multiset.amount_for(&iron()), 2);
        assert_eq!(multiset.total(), 2);
    }

    #[test]
    fn test_remove_reports_shortfall() {
        let mut multiset = ItemMultiset::new();
        multiset.insert(iron(), 2);

        assert_eq!(multiset.remove(&iron(), 5), 3);
        assert!(multiset.is_empty());
        assert_eq!(multiset.total(), 0);
    }

    #[test]
    fn test_remove_exact_amount_drops_entry() {
        let mut multiset = ItemMultiset::new();
        multiset.insert(iron(), 4);
        assert_eq!(multiset.remove(&iron(), 4), 0);
        assert!(multiset.is_empty());
    }

    #[test]
    fn test_remove_absent_entry() {
        let mut multiset = ItemMultiset::new();
        assert_eq!(multiset.remove(&iron(), 4), 4);
        assert_eq!(multiset.total(), 0);
    }

    #[test]
    fn test_negative_entries_stay() {
        let mut multiset = ItemMultiset::new();
        multiset.insert(iron(), 3);
        multiset.insert(ItemCriteria::exact(Item::new(SWORD)), -3);
        assert_eq!(multiset.total(), 0);
        assert!(!multiset.is_empty());
    }

    #[test]
    fn test_unrepresentable_stacks_are_ignored() {
        let air = Item::new(ItemTypeId::AIR).stack(3);
        let mut multiset = ItemMultiset::new();
        multiset.insert_stack(&air);
        assert!(multiset.is_empty());
        assert_eq!(multiset.remove_stack(&air), 3);
        assert!(!multiset.remove_completely(&air.item));
    }

    #[test]
    fn test_stacks_aggregate_under_one_key() {
        let worn = ItemBuilder::new(IRON_INGOT).repair_cost(4).build();
        let multiset = ItemMultiset::from_stacks(&[
            Item::new(IRON_INGOT).stack(10),
            worn.stack(6),
        ]);
        assert_eq!(multiset.len(), 1);
        assert_eq!(multiset.total(), 16);
    }

    #[test]
    fn test_remove_completely() {
        let mut multiset = ItemMultiset::from_stack(&Item::new(IRON_INGOT).stack(12));
        assert!(multiset.remove_completely(&Item::new(IRON_INGOT)));
        assert!(multiset.is_empty());
        assert!(!multiset.remove_completely(&Item::new(IRON_INGOT)));
    }

    #[test]
    fn test_amount_for_item_sums_overlapping_entries() {
        let sword = Item::with_durability(SWORD, 7);
        let mut multiset = ItemMultiset::new();
        multiset.insert(ItemCriteria::exact(sword.clone()), 1);
        multiset.insert(ItemCriteria::new(Item::new(SWORD), Wildcards::DURABILITY), 2);
        multiset.insert(ItemCriteria::new(Item::new(SWORD), Wildcards::ALL_METADATA), 4);

        assert_eq!(multiset.amount_for_item(&sword), 3);
        assert_eq!(multiset.accepting_criteria(&sword).len(), 2);
        assert_eq!(
            multiset.amount_for(&ItemCriteria::new(Item::new(SWORD), Wildcards::DURABILITY)),
            2
        );
    }

    #[test]
    fn test_most_specific_prefers_narrower() {
        let sword = Item::with_durability(SWORD, 0);
        let broad = ItemCriteria::new(sword.clone(), Wildcards::DURABILITY);
        let narrow = ItemCriteria::exact(sword.clone());

        let mut multiset = ItemMultiset::new();
        multiset.insert(broad.clone(), 1);
        multiset.insert(narrow.clone(), 1);
        assert_eq!(multiset.most_specific(&sword), Some(&narrow));

        let mut reversed = ItemMultiset::new();
        reversed.insert(narrow.clone(), 1);
        reversed.insert(broad, 1);
        assert_eq!(reversed.most_specific(&sword), Some(&narrow));
    }

    #[test]
    fn test_most_specific_with_incomparable_entries() {
        let sword = Item::new(SWORD);
        let any_lore = ItemCriteria::new(sword.clone(), Wildcards::LORE);
        let any_name = ItemCriteria::new(sword.clone(), Wildcards::NAME);

        let mut multiset = ItemMultiset::new();
        multiset.insert(any_lore.clone(), 1);
        multiset.insert(any_name.clone(), 1);

        // Incomparable: the first inserted wins, every time.
        let first = multiset.most_specific(&sword);
        assert_eq!(first, Some(&any_lore));
        assert_eq!(multiset.most_specific(&sword), first);
        assert_eq!(multiset.most_specific(&Item::new(IRON_INGOT)), None);
    }

    #[test]
    fn test_merge() {
        let mut a = ItemMultiset::from_stack(&Item::new(IRON_INGOT).stack(3));
        let b = ItemMultiset::from_stacks(&[Item::new(IRON_INGOT).stack(2), Item::new(SWORD).stack(1)]);
        a.merge(&b);
        assert_eq!(a.total(), 6);
        assert_eq!(a.amount_for(&iron()), 5);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_scale_truncates_per_entry() {
        let mut multiset = ItemMultiset::new();
        multiset.insert(iron(), 3);
        multiset.insert(ItemCriteria::exact(Item::new(SWORD)), 3);

        let half = multiset.scale(0.5);
        assert_eq!(half.amount_for(&iron()), 1);
        // 1 + 1, not trunc(6 * 0.5) = 3
        assert_eq!(half.total(), 2);

        let negative = multiset.scale(-0.5);
        assert_eq!(negative.amount_for(&iron()), -1);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut multiset = ItemMultiset::from_stack(&Item::new(IRON_INGOT).stack(3));
        let snapshot = multiset.snapshot();
        multiset.insert(iron(), 10);
        assert_eq!(snapshot, vec![(iron(), 3)]);
    }

    #[test]
    fn test_container_snapshot_is_one_time() {
        let catalog = crate::catalog::ItemCatalog::default();
        let mut chest = SlotContainer::new(ContainerKind::Generic, 27);
        chest.add_stack(&catalog, &Item::new(IRON_INGOT).stack(5));

        let mut snapshot = ItemMultiset::from_container(&chest);
        chest.add_stack(&catalog, &Item::new(IRON_INGOT).stack(5));
        assert_eq!(snapshot.total(), 5);

        snapshot.refresh_from(&chest);
        assert_eq!(snapshot.total(), 10);
    }

    #[test]
    fn test_equality_and_display() {
        let a = ItemMultiset::from_stacks(&[Item::new(IRON_INGOT).stack(2), Item::new(SWORD).stack(1)]);
        let b = ItemMultiset::from_stacks(&[Item::new(SWORD).stack(1), Item::new(IRON_INGOT).stack(2)]);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "2 x #265:0;1 x #267:0;");
    }

    #[derive(Debug, Clone)]
    enum Op {
        Insert(usize, i64),
        Remove(usize, i64),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0usize..4, -20i64..50).prop_map(|(k, n)| Op::Insert(k, n)),
            (0usize..4, 0i64..50).prop_map(|(k, n)| Op::Remove(k, n)),
        ]
    }

    proptest! {
        #[test]
        fn prop_total_matches_entries(ops in prop::collection::vec(op_strategy(), 0..64)) {
            let keys: Vec<ItemCriteria> = (0..4)
                .map(|i| ItemCriteria::new(Item::with_durability(SWORD, i), Wildcards::NONE))
                .collect();
            let mut multiset = ItemMultiset::new();
            for op in ops {
                match op {
                    Op::Insert(k, n) => multiset.insert(keys[k].clone(), n),
                    Op::Remove(k, n) => {
                        let before = multiset.amount_for(&keys[k]);
                        let not_removed = multiset.remove(&keys[k], n);
                        prop_assert!(not_removed >= 0);
                        if before > n {
                            prop_assert_eq!(not_removed, 0);
                        }
                    },
                }
                let sum: i64 = multiset.iter().map(|(_, amount)| amount).sum();
                prop_assert_eq!(multiset.total(), sum);
            }
        }
    }
}
