//! Slot-based containers.
//!
//! The matching engine only reads container contents and asks containers
//! to remove amounts of a given item. [`Container`] is that seam;
//! [`SlotContainer`] is a plain in-memory implementation.

use thiserror::Error;
use tracing::debug;

use crate::catalog::ItemCatalog;
use crate::item::{Item, ItemStack};
use crate::multiset::ItemMultiset;

/// Number of general storage slots in a player inventory.
pub const PLAYER_STORAGE_SLOTS: usize = 36;

/// Total slots of a player inventory: storage, armor and off hand.
pub const PLAYER_INVENTORY_SLOTS: usize = PLAYER_STORAGE_SLOTS + 5;

/// Container error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContainerError {
    /// Slot index past the end of the container
    #[error("Slot {index} out of range: size {size}")]
    SlotOutOfRange {
        /// Requested slot
        index: usize,
        /// Container size
        size: usize,
    },
}

/// Result type for container operations.
pub type ContainerResult<T> = Result<T, ContainerError>;

/// Something that holds item stacks in slots.
pub trait Container {
    /// Number of slots.
    fn size(&self) -> usize;

    /// Number of slots usable for general storage.
    fn storage_size(&self) -> usize {
        self.size()
    }

    /// Copy of every slot, empty ones as `None`.
    fn slots(&self) -> Vec<Option<ItemStack>>;

    /// Copy of the general storage slots.
    fn storage_contents(&self) -> Vec<Option<ItemStack>> {
        let mut slots = self.slots();
        slots.truncate(self.storage_size());
        slots
    }

    /// Removes up to `amount` items of the same kind as `item`.
    ///
    /// Returns the amount that could not be removed.
    fn remove_count_of(&mut self, item: &Item, amount: u32) -> u32;
}

/// Layout of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContainerKind {
    /// Every slot is storage.
    #[default]
    Generic,
    /// Only the first [`PLAYER_STORAGE_SLOTS`] slots are storage.
    PlayerInventory,
}

/// In-memory container backed by a slot vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotContainer {
    kind: ContainerKind,
    slots: Vec<Option<ItemStack>>,
}

impl SlotContainer {
    /// Creates an empty container.
    #[must_use]
    pub fn new(kind: ContainerKind, size: usize) -> Self {
        Self {
            kind,
            slots: vec![None; size],
        }
    }

    /// Creates an empty player inventory.
    #[must_use]
    pub fn player_inventory() -> Self {
        Self::new(ContainerKind::PlayerInventory, PLAYER_INVENTORY_SLOTS)
    }

    /// Returns the container layout.
    #[must_use]
    pub const fn kind(&self) -> ContainerKind {
        self.kind
    }

    /// Returns the stack in a slot.
    #[must_use]
    pub fn slot(&self, index: usize) -> Option<&ItemStack> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Replaces a slot, returning what was there.
    pub fn set_slot(
        &mut self,
        index: usize,
        stack: Option<ItemStack>,
    ) -> ContainerResult<Option<ItemStack>> {
        let size = self.slots.len();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(ContainerError::SlotOutOfRange { index, size })?;
        let stack = stack.filter(|s| !s.is_empty());
        Ok(std::mem::replace(slot, stack))
    }

    /// Adds a stack to the storage slots.
    ///
    /// Tops up stacks of the same kind first, then fills empty slots.
    /// Returns the amount that did not fit.
    pub fn add_stack(&mut self, catalog: &ItemCatalog, stack: &ItemStack) -> u32 {
        if stack.is_empty() {
            return 0;
        }
        let max = catalog.max_stack_size(stack.item.type_id());
        let storage = self.storage_size();
        let mut left = stack.amount;

        for existing in self.slots[..storage].iter_mut().flatten() {
            if left == 0 {
                break;
            }
            if existing.item.same_kind(&stack.item) && existing.amount < max {
                let moved = left.min(max - existing.amount);
                existing.amount += moved;
                left -= moved;
            }
        }
        for slot in &mut self.slots[..storage] {
            if left == 0 {
                break;
            }
            if slot.is_none() {
                let moved = left.min(max);
                *slot = Some(ItemStack::new(stack.item.clone(), moved));
                left -= moved;
            }
        }

        if left > 0 {
            debug!("{left} of {} did not fit", stack.item);
        }
        left
    }

    /// Counts items of the same kind as `item`.
    #[must_use]
    pub fn count_of(&self, item: &Item) -> u64 {
        self.slots
            .iter()
            .flatten()
            .filter(|stack| stack.item.same_kind(item))
            .map(|stack| u64::from(stack.amount))
            .sum()
    }

    /// Checks if every slot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}

impl Container for SlotContainer {
    fn size(&self) -> usize {
        self.slots.len()
    }

    fn storage_size(&self) -> usize {
        match self.kind {
            ContainerKind::Generic => self.slots.len(),
            ContainerKind::PlayerInventory => PLAYER_STORAGE_SLOTS.min(self.slots.len()),
        }
    }

    fn slots(&self) -> Vec<Option<ItemStack>> {
        self.slots.clone()
    }

    fn remove_count_of(&mut self, item: &Item, amount: u32) -> u32 {
        let mut left = amount;
        for slot in &mut self.slots {
            if left == 0 {
                break;
            }
            let Some(stack) = slot else { continue };
            if !stack.item.same_kind(item) {
                continue;
            }
            let taken = left.min(stack.amount);
            stack.amount -= taken;
            left -= taken;
            if stack.amount == 0 {
                *slot = None;
            }
        }
        left
    }
}

impl ItemMultiset {
    /// Checks whether this multiset, laid out as stacks, fits into the
    /// storage slots of `container` next to what is already there.
    #[must_use]
    pub fn fits_in(&self, container: &impl Container, catalog: &ItemCatalog) -> bool {
        let mut combined = self.clone();
        for stack in container.storage_contents().iter().flatten() {
            combined.insert_stack(stack);
        }
        let needed = combined.item_stack_representation(catalog).len();
        debug!(
            "Need {needed} slots, container offers {}",
            container.storage_size()
        );
        needed <= container.storage_size()
    }
}
