//! Wildcard-aware matching between multisets.
//!
//! Every operation here runs the same sweep. One side supplies the
//! criteria that do the accepting (the *query*), the other supplies
//! exemplars with amounts (the *stock*). Stock exemplars are grouped into
//! buckets by how many query criteria accept them, and the sweep assigns
//! amounts bucket by bucket in ascending order. Exemplars that only one
//! criteria can take are served before flexible ones, so a broad wildcard
//! does not eat amounts a narrow criteria depends on.
//!
//! Inside a bucket, exemplars and their accepting criteria are visited in
//! insertion order. The assignment is a greedy heuristic: it does not
//! solve the general bipartite problem, and a stock that could satisfy the
//! query under some other assignment can still be rejected.
//!
//! Stock exemplars that no query criteria accepts are handled two ways.
//! [`ItemMultiset::build_ambiguity_buckets`] and
//! [`ItemMultiset::contained_exactly`] give up on them, since an exact match
//! cannot have leftover. The containment, repetition, subtraction and
//! extraction operations instead leave them out of the buckets and count
//! their amounts as leftover, so a chest holding unrelated items can still
//! contain a recipe. Bucket building is therefore not fail-fast for those
//! operations.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::container::Container;
use crate::criteria::ItemCriteria;
use crate::item::Item;
use crate::multiset::ItemMultiset;

/// Matching error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    /// The multiset is not contained in the other side
    #[error("No assignment of the given items satisfies the multiset")]
    NoMatch,
    /// A sweep left work undone after its precondition held
    #[error("Inconsistent matching during {operation}: {left} against {right}")]
    Inconsistent {
        /// Operation that failed
        operation: &'static str,
        /// Multiset the operation was called on
        left: String,
        /// The other operand
        right: String,
    },
    /// A container did not give up an amount it was asked for
    #[error("Container kept {not_removed} of {item}")]
    ContainerRefused {
        /// Item being removed
        item: Item,
        /// Amount left in the container
        not_removed: u32,
    },
}

/// Result type for matching operations.
pub type MatchResult<T> = Result<T, MatchError>;

/// A stock exemplar together with every query criteria accepting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Stock entry key; its exemplar is what gets matched.
    pub target: ItemCriteria,
    /// Query criteria accepting the target exemplar, in insertion order.
    pub accepting: Vec<ItemCriteria>,
}

/// Stock candidates keyed by their number of accepting criteria.
pub type AmbiguityBuckets = BTreeMap<usize, Vec<Candidate>>;

/// What to do with a stock exemplar nothing on the query side accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unmatched {
    /// Give up on the whole bucket map.
    Fail,
    /// Leave the exemplar out; its amount stays as leftover.
    Skip,
}

impl ItemMultiset {
    /// Groups the exemplars of `stock` by how many criteria of `self`
    /// accept them.
    ///
    /// Returns `None` as soon as one exemplar has no accepting criteria.
    #[must_use]
    pub fn build_ambiguity_buckets(&self, stock: &Self) -> Option<AmbiguityBuckets> {
        self.buckets(stock, Unmatched::Fail)
    }

    fn buckets(&self, stock: &Self, unmatched: Unmatched) -> Option<AmbiguityBuckets> {
        let mut buckets = AmbiguityBuckets::new();
        for (target, _) in stock.iter() {
            let accepting: Vec<ItemCriteria> = self
                .accepting_criteria(target.item())
                .into_iter()
                .cloned()
                .collect();
            if accepting.is_empty() {
                match unmatched {
                    Unmatched::Fail => {
                        debug!("Nothing accepts {target}");
                        return None;
                    },
                    Unmatched::Skip => continue,
                }
            }
            buckets.entry(accepting.len()).or_default().push(Candidate {
                target: target.clone(),
                accepting,
            });
        }
        Some(buckets)
    }

    /// Checks that `self` and `other` describe the same items, with no
    /// leftover on either side.
    ///
    /// An `other` with a total of zero counts as matched whatever `self`
    /// holds.
    #[must_use]
    pub fn contained_exactly(&self, other: &Self) -> bool {
        if other.total() == 0 {
            return true;
        }
        let Some(buckets) = self.build_ambiguity_buckets(other) else {
            return false;
        };
        let mut query = self.clone();
        let mut stock = other.clone();
        if sweep(&buckets, &mut query, &mut stock, |_, _, _| Ok(())).is_err() {
            return false;
        }
        query.is_satisfied() && stock.is_satisfied()
    }

    /// Checks that every amount of `self` can be assigned to accepted
    /// items of `other`. Leftover in `other` is fine.
    #[must_use]
    pub fn is_contained_in(&self, other: &Self) -> bool {
        if other.total() < self.total() {
            return false;
        }
        if self.is_satisfied() {
            return true;
        }
        let Some(buckets) = self.buckets(other, Unmatched::Skip) else {
            return false;
        };
        let mut query = self.clone();
        let mut stock = other.clone();
        if sweep(&buckets, &mut query, &mut stock, |_, _, _| Ok(())).is_err() {
            return false;
        }
        query.is_satisfied()
    }

    /// Counts how many full copies of `self` can be taken out of `other`
    /// one after another.
    ///
    /// Returns `u64::MAX` when `self` asks for nothing.
    #[must_use]
    pub fn repetitions_contained_in(&self, other: &Self) -> u64 {
        if self.is_satisfied() {
            return u64::MAX;
        }
        let Some(buckets) = self.buckets(other, Unmatched::Skip) else {
            return 0;
        };
        let mut stock = other.clone();
        let mut rounds = 0;
        loop {
            let mut query = self.clone();
            if sweep(&buckets, &mut query, &mut stock, |_, _, _| Ok(())).is_err()
                || !query.is_satisfied()
            {
                trace!("{self} fits {rounds} times");
                return rounds;
            }
            rounds += 1;
        }
    }

    /// [`contained_exactly`](Self::contained_exactly) against a container
    /// snapshot.
    #[must_use]
    pub fn contained_exactly_in_container(&self, container: &impl Container) -> bool {
        self.contained_exactly(&Self::from_container(container))
    }

    /// [`is_contained_in`](Self::is_contained_in) against a container
    /// snapshot.
    #[must_use]
    pub fn is_contained_in_container(&self, container: &impl Container) -> bool {
        self.is_contained_in(&Self::from_container(container))
    }

    /// [`repetitions_contained_in`](Self::repetitions_contained_in)
    /// against a container snapshot.
    #[must_use]
    pub fn repetitions_in_container(&self, container: &impl Container) -> u64 {
        self.repetitions_contained_in(&Self::from_container(container))
    }

    /// Removes one copy of `subtrahend` from `self`, honoring the
    /// subtrahend's wildcards.
    ///
    /// Succeeds exactly when `subtrahend.repetitions_contained_in(self)`
    /// is at least one. On failure `self` is left untouched.
    pub fn subtract(&mut self, subtrahend: &Self) -> MatchResult<()> {
        if subtrahend.repetitions_contained_in(self) < 1 {
            return Err(MatchError::NoMatch);
        }
        if subtrahend.is_satisfied() {
            return Ok(());
        }
        let Some(buckets) = subtrahend.buckets(self, Unmatched::Skip) else {
            return Err(inconsistent("subtract", self, subtrahend));
        };

        let before = self.clone();
        let mut query = subtrahend.clone();
        let swept = sweep(&buckets, &mut query, self, |_, _, _| Ok(()));
        if swept.is_err() || !query.is_satisfied() {
            warn!("Invalid matching trying to subtract {subtrahend} from {before}");
            *self = before;
            return Err(inconsistent("subtract", self, subtrahend));
        }
        Ok(())
    }

    /// Removes the items `self` describes from `container`.
    ///
    /// Matches against a snapshot of the container first and only touches
    /// the container when everything can be assigned. Returns the exact
    /// items that were removed.
    pub fn extract_safely(&self, container: &mut impl Container) -> MatchResult<Self> {
        let snapshot = Self::from_container(container);
        if !self.is_contained_in(&snapshot) {
            return Err(MatchError::NoMatch);
        }
        let mut removed = Self::new();
        if self.is_satisfied() {
            return Ok(removed);
        }
        let Some(buckets) = self.buckets(&snapshot, Unmatched::Skip) else {
            return Err(inconsistent("extract", self, &snapshot));
        };

        let mut query = self.clone();
        let mut stock = snapshot.clone();
        sweep(&buckets, &mut query, &mut stock, |_, target, amount| {
            let amount =
                u32::try_from(amount).map_err(|_| inconsistent("extract", self, &snapshot))?;
            let not_removed = container.remove_count_of(target.item(), amount);
            if not_removed > 0 {
                warn!("Container kept {not_removed} of {}", target.item());
                return Err(MatchError::ContainerRefused {
                    item: target.item().clone(),
                    not_removed,
                });
            }
            removed.insert(target.clone(), i64::from(amount));
            Ok(())
        })?;

        if !query.is_satisfied() {
            warn!("Invalid matching trying to extract {self} from {snapshot}");
            return Err(inconsistent("extract", self, &snapshot));
        }
        debug!("Extracted {removed}");
        Ok(removed)
    }

    /// No entry asks for a positive amount.
    fn is_satisfied(&self) -> bool {
        self.iter().all(|(_, amount)| amount <= 0)
    }
}

fn inconsistent(operation: &'static str, left: &ItemMultiset, right: &ItemMultiset) -> MatchError {
    MatchError::Inconsistent {
        operation,
        left: left.to_string(),
        right: right.to_string(),
    }
}

/// Assigns stock amounts to query criteria, bucket by bucket.
///
/// `on_move` sees every assignment as (query criteria, stock key,
/// amount) after both sides have been updated; an error stops the sweep.
fn sweep<F>(
    buckets: &AmbiguityBuckets,
    query: &mut ItemMultiset,
    stock: &mut ItemMultiset,
    mut on_move: F,
) -> MatchResult<()>
where
    F: FnMut(&ItemCriteria, &ItemCriteria, i64) -> MatchResult<()>,
{
    for candidate in buckets.values().flatten() {
        let mut remaining = stock.amount_for(&candidate.target);
        for criteria in &candidate.accepting {
            if remaining <= 0 {
                break;
            }
            let wanted = query.amount_for(criteria);
            if wanted <= 0 {
                continue;
            }
            let moved = wanted.min(remaining);
            query.remove(criteria, moved);
            stock.remove(&candidate.target, moved);
            remaining -= moved;
            trace!("Assigned {moved} of {} to {criteria}", candidate.target);
            on_move(criteria, &candidate.target, moved)?;
        }
    }
    Ok(())
}
