//! Per-type item properties needed for stack layout.

use std::collections::HashMap;

use tally_common::ItemTypeId;

/// Stack size used for types without an override.
pub const DEFAULT_MAX_STACK: u32 = 64;

/// Lookup of maximum stack sizes by item type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemCatalog {
    /// Fallback maximum stack size
    default_max_stack: u32,
    /// Per-type maximum stack sizes
    max_stack: HashMap<ItemTypeId, u32>,
}

impl ItemCatalog {
    /// Creates a catalog where every type stacks to `default_max_stack`.
    #[must_use]
    pub fn new(default_max_stack: u32) -> Self {
        Self {
            default_max_stack: default_max_stack.max(1),
            max_stack: HashMap::new(),
        }
    }

    /// Adds a per-type override.
    #[must_use]
    pub fn with_max_stack(mut self, type_id: ItemTypeId, max: u32) -> Self {
        self.set_max_stack(type_id, max);
        self
    }

    /// Sets a per-type override. Zero is raised to one.
    pub fn set_max_stack(&mut self, type_id: ItemTypeId, max: u32) {
        self.max_stack.insert(type_id, max.max(1));
    }

    /// Maximum number of items of `type_id` one slot can hold.
    #[must_use]
    pub fn max_stack_size(&self, type_id: ItemTypeId) -> u32 {
        self.max_stack
            .get(&type_id)
            .copied()
            .unwrap_or(self.default_max_stack)
    }

    /// Fallback maximum stack size.
    #[must_use]
    pub const fn default_max_stack(&self) -> u32 {
        self.default_max_stack
    }
}

impl Default for ItemCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_STACK)
    }
}
