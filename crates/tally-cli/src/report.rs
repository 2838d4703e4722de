//! Matching report for a manifest.

use std::fmt;

use tally_items::catalog::ItemCatalog;
use tally_items::container::SlotContainer;
use tally_items::matching::MatchError;
use tally_items::multiset::ItemMultiset;
use tracing::info;

/// Outcome of matching a recipe against stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Recipe being matched.
    pub recipe: ItemMultiset,
    /// Snapshot of the stock before anything was taken.
    pub stock: ItemMultiset,
    /// Recipe and stock describe the same items.
    pub exact: bool,
    /// Recipe can be taken from the stock.
    pub contained: bool,
    /// Copies of the recipe in the stock; `None` when unbounded.
    pub repetitions: Option<u64>,
    /// Recipe would fit into the container next to the stock.
    pub fits: bool,
    /// Items one extraction took, or why it failed.
    pub extracted: Result<ItemMultiset, MatchError>,
    /// Stock left after subtracting every copy of the recipe.
    pub remainder: ItemMultiset,
}

impl Report {
    /// Runs every matching operation of `recipe` against `container`.
    ///
    /// The container itself is left untouched; extraction runs on a copy.
    #[must_use]
    pub fn build(recipe: &ItemMultiset, container: &SlotContainer, catalog: &ItemCatalog) -> Self {
        let stock = ItemMultiset::from_container(container);
        let repetitions = recipe.repetitions_contained_in(&stock);

        let mut scratch = container.clone();
        let extracted = recipe.extract_safely(&mut scratch);

        let mut remainder = stock.clone();
        // A recipe asking for nothing subtracts forever.
        if repetitions != u64::MAX {
            while remainder.subtract(recipe).is_ok() {}
        }

        let report = Self {
            recipe: recipe.clone(),
            exact: recipe.contained_exactly(&stock),
            contained: recipe.is_contained_in(&stock),
            repetitions: (repetitions != u64::MAX).then_some(repetitions),
            fits: recipe.fits_in(container, catalog),
            extracted,
            remainder,
            stock,
        };
        info!(
            "Matched recipe of {} items against stock of {}",
            report.recipe.total(),
            report.stock.total()
        );
        report
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "recipe:      {}", self.recipe)?;
        writeln!(f, "stock:       {}", self.stock)?;
        writeln!(f, "exact:       {}", self.exact)?;
        writeln!(f, "contained:   {}", self.contained)?;
        match self.repetitions {
            Some(n) => writeln!(f, "repetitions: {n}")?,
            None => writeln!(f, "repetitions: unbounded")?,
        }
        writeln!(f, "fits:        {}", self.fits)?;
        match &self.extracted {
            Ok(taken) => writeln!(f, "extracted:   {taken}")?,
            Err(e) => writeln!(f, "extracted:   failed ({e})")?,
        }
        write!(f, "remainder:   {}", self.remainder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_common::ItemTypeId;
    use tally_items::container::{Container, ContainerKind};
    use tally_items::criteria::{ItemCriteria, Wildcards};
    use tally_items::item::Item;

    const IRON_INGOT: ItemTypeId = ItemTypeId::new(265);
    const SWORD: ItemTypeId = ItemTypeId::new(267);

    fn chest() -> SlotContainer {
        let catalog = ItemCatalog::default();
        let mut chest = SlotContainer::new(ContainerKind::Generic, 4);
        chest.add_stack(&catalog, &Item::new(IRON_INGOT).stack(16));
        chest.add_stack(&catalog, &Item::with_durability(SWORD, 7).stack(1));
        chest
    }

    #[test]
    fn test_report() {
        let mut recipe = ItemMultiset::new();
        recipe.insert(ItemCriteria::exact(Item::new(IRON_INGOT)), 3);

        let container = chest();
        let report = Report::build(&recipe, &container, &ItemCatalog::default());

        assert!(!report.exact);
        assert!(report.contained);
        assert_eq!(report.repetitions, Some(5));
        assert!(report.fits);
        assert_eq!(report.extracted.as_ref().map(ItemMultiset::total), Ok(3));
        assert_eq!(report.remainder.total(), 2);
        // Extraction ran on a copy.
        assert_eq!(ItemMultiset::from_container(&container).total(), 17);
        assert_eq!(container.size(), 4);
    }

    #[test]
    fn test_report_with_wildcards() {
        let mut recipe = ItemMultiset::new();
        recipe.insert(ItemCriteria::new(Item::new(SWORD), Wildcards::DURABILITY), 2);

        let report = Report::build(&recipe, &chest(), &ItemCatalog::default());
        assert!(!report.contained);
        assert_eq!(report.repetitions, Some(0));
        assert_eq!(report.extracted, Err(MatchError::NoMatch));
        assert_eq!(report.remainder, report.stock);
        assert!(report.to_string().contains("extracted:   failed"));
    }

    #[test]
    fn test_empty_recipe_is_unbounded() {
        let report = Report::build(&ItemMultiset::new(), &chest(), &ItemCatalog::default());
        assert_eq!(report.repetitions, None);
        assert!(report.to_string().contains("repetitions: unbounded"));
    }

    #[test]
    fn test_zero_amount_recipe_is_unbounded() {
        let mut recipe = ItemMultiset::new();
        recipe.insert(ItemCriteria::exact(Item::new(IRON_INGOT)), 0);

        let report = Report::build(&recipe, &chest(), &ItemCatalog::default());
        assert!(report.contained);
        assert_eq!(report.repetitions, None);
        assert_eq!(report.remainder, report.stock);
    }
}
