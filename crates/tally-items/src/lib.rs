//! # Tally Items
//!
//! Wildcard-aware item matching.
//!
//! This crate provides:
//! - Item exemplars and physical stacks
//! - Criteria: an exemplar plus wildcard toggles, with a specificity order
//! - Multisets of criteria with signed amounts
//! - Matching between multisets (containment, exact equality, repetition
//!   count, subtraction, safe extraction from containers)
//! - A slot container adapter and a per-type stack size catalog
//! - Tag tree serialization and display representations

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod catalog;
pub mod container;
pub mod criteria;
pub mod item;
pub mod matching;
pub mod multiset;
pub mod presentation;
pub mod serialize;
pub mod tag;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::catalog::*;
    pub use crate::container::*;
    pub use crate::criteria::*;
    pub use crate::item::*;
    pub use crate::matching::*;
    pub use crate::multiset::*;
    pub use crate::presentation::*;
    pub use crate::tag::{Compound, FromTag, TagError, TagResult, TagValue, ToTag};
}

pub use prelude::*;
