//! Tag tree layout of items, criteria and multisets.
//!
//! ```text
//! multiset: { "version": "1.0.0",
//!             "items": [ { "criteria": <criteria>, "amount": long } ],
//!             "totalItems": long }
//! criteria: { "item": <item>, "wildcardDurability": byte, ... }
//! item:     { "type": int, "durability": short, "meta": { ... } }
//! ```
//!
//! Reading a multiset recomputes its total from the entries; the stored
//! `totalItems` is only compared and logged.

use tally_common::{EnchantmentId, ItemTypeId, SchemaVersion};
use tracing::warn;

use crate::criteria::{ItemCriteria, Wildcards};
use crate::item::{Item, ItemMeta};
use crate::multiset::ItemMultiset;
use crate::tag::{wrong_type, Compound, CompoundExt, FromTag, TagError, TagResult, TagValue, ToTag};

const WILDCARD_KEYS: [(&str, Wildcards); 6] = [
    ("wildcardDurability", Wildcards::DURABILITY),
    ("wildcardLore", Wildcards::LORE),
    ("wildcardName", Wildcards::NAME),
    ("wildcardEnchants", Wildcards::ENCHANTS),
    ("wildcardItemMeta", Wildcards::ALL_METADATA),
    ("wildcardNonExplicitItemMeta", Wildcards::OTHER_METADATA),
];

fn as_compound<'a>(tag: &'a TagValue, what: &str) -> TagResult<&'a Compound> {
    tag.as_compound().ok_or_else(|| wrong_type(what, "compound"))
}

fn ranged<T: TryFrom<i64>>(field: &str, value: i64) -> TagResult<T> {
    T::try_from(value).map_err(|_| TagError::OutOfRange {
        field: field.to_owned(),
        value,
    })
}

impl ToTag for ItemMeta {
    fn to_tag(&self) -> TagValue {
        let mut tag = Compound::new();
        if let Some(name) = self.display_name() {
            tag.insert("name".into(), name.into());
        }
        if self.has_lore() {
            let lines = self.lore().iter().map(|line| line.as_str().into()).collect();
            tag.insert("lore".into(), TagValue::List(lines));
        }
        if self.has_enchants() {
            let enchants: Compound = self
                .enchants()
                .iter()
                .map(|(id, level)| (id.to_string(), TagValue::Long(i64::from(*level))))
                .collect();
            tag.insert("enchants".into(), enchants.into());
        }
        if self.is_unbreakable() {
            tag.insert("unbreakable".into(), TagValue::from_bool(true));
        }
        if self.repair_cost() > 0 {
            tag.insert("repairCost".into(), TagValue::Long(i64::from(self.repair_cost())));
        }
        if !self.other().is_empty() {
            tag.insert("other".into(), self.other().clone().into());
        }
        tag.into()
    }
}

impl FromTag for ItemMeta {
    fn from_tag(tag: &TagValue) -> TagResult<Self> {
        let tag = as_compound(tag, "meta")?;
        let mut meta = Self::new();
        if tag.contains_key("name") {
            meta.set_display_name(Some(tag.str_field("name")?.to_owned()));
        }
        if tag.contains_key("lore") {
            let lore = tag
                .list_field("lore")?
                .iter()
                .map(|line| {
                    line.as_str()
                        .map(str::to_owned)
                        .ok_or_else(|| wrong_type("lore", "string"))
                })
                .collect::<TagResult<Vec<_>>>()?;
            meta.set_lore(lore);
        }
        if tag.contains_key("enchants") {
            for (id, level) in tag.compound_field("enchants")? {
                let level = level.as_i64().ok_or_else(|| wrong_type(id, "integer"))?;
                meta.set_enchant(EnchantmentId::new(id.as_str()), ranged(id, level)?);
            }
        }
        if tag.contains_key("unbreakable") {
            meta.set_unbreakable(tag.bool_field("unbreakable")?);
        }
        if tag.contains_key("repairCost") {
            meta.set_repair_cost(ranged("repairCost", tag.int_field("repairCost")?)?);
        }
        if tag.contains_key("other") {
            for (key, value) in tag.compound_field("other")? {
                meta.set_other(key.as_str(), value.clone());
            }
        }
        Ok(meta)
    }
}

impl ToTag for Item {
    fn to_tag(&self) -> TagValue {
        let mut tag = Compound::new();
        tag.insert("type".into(), TagValue::Long(i64::from(self.type_id().raw())));
        tag.insert("durability".into(), TagValue::Short(self.durability()));
        tag.insert("meta".into(), self.meta().to_tag());
        tag.into()
    }
}

impl FromTag for Item {
    fn from_tag(tag: &TagValue) -> TagResult<Self> {
        let tag = as_compound(tag, "item")?;
        let type_id = ItemTypeId::new(ranged("type", tag.int_field("type")?)?);
        let durability = ranged("durability", tag.int_field("durability")?)?;
        let mut item = Self::with_durability(type_id, durability);
        if let Some(meta) = tag.get("meta") {
            *item.meta_mut() = ItemMeta::from_tag(meta)?;
        }
        Ok(item)
    }
}

impl ToTag for ItemCriteria {
    fn to_tag(&self) -> TagValue {
        let mut tag = Compound::new();
        tag.insert("item".into(), self.item().to_tag());
        for (key, flag) in WILDCARD_KEYS {
            tag.insert(key.into(), TagValue::from_bool(self.wildcards().has(flag)));
        }
        tag.into()
    }
}

impl FromTag for ItemCriteria {
    /// Absent wildcard keys read as "not wildcarded".
    fn from_tag(tag: &TagValue) -> TagResult<Self> {
        let tag = as_compound(tag, "criteria")?;
        let item = Item::from_tag(tag.field("item")?)?;
        let mut wildcards = Wildcards::NONE;
        for (key, flag) in WILDCARD_KEYS {
            if tag.contains_key(key) && tag.bool_field(key)? {
                wildcards = wildcards.with(flag);
            }
        }
        Ok(Self::new(item, wildcards))
    }
}

impl ToTag for ItemMultiset {
    fn to_tag(&self) -> TagValue {
        let items = self
            .iter()
            .map(|(criteria, amount)| {
                let mut entry = Compound::new();
                entry.insert("criteria".into(), criteria.to_tag());
                entry.insert("amount".into(), TagValue::Long(amount));
                TagValue::Compound(entry)
            })
            .collect();

        let mut tag = Compound::new();
        tag.insert("version".into(), SchemaVersion::ITEM_TAG.to_string().into());
        tag.insert("items".into(), TagValue::List(items));
        tag.insert("totalItems".into(), TagValue::Long(self.total()));
        tag.into()
    }
}

impl FromTag for ItemMultiset {
    fn from_tag(tag: &TagValue) -> TagResult<Self> {
        let tag = as_compound(tag, "multiset")?;
        if tag.contains_key("version") {
            let text = tag.str_field("version")?;
            let compatible = SchemaVersion::parse(text)
                .is_some_and(|stored| SchemaVersion::ITEM_TAG.is_compatible_with(&stored));
            if !compatible {
                return Err(TagError::UnsupportedVersion(text.to_owned()));
            }
        }

        let mut multiset = Self::new();
        for entry in tag.list_field("items")? {
            let entry = as_compound(entry, "items")?;
            let criteria = ItemCriteria::from_tag(entry.field("criteria")?)?;
            multiset.insert(criteria, entry.int_field("amount")?);
        }

        if let Some(stored) = tag.get("totalItems").and_then(TagValue::as_i64) {
            if stored != multiset.total() {
                warn!(
                    "Stored total {stored} disagrees with entries, using {}",
                    multiset.total()
                );
            }
        }
        Ok(multiset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemBuilder;
    use proptest::prelude::*;
    use uuid::Uuid;

    const IRON_INGOT: ItemTypeId = ItemTypeId::new(265);
    const SWORD: ItemTypeId = ItemTypeId::new(267);

    fn fancy_sword() -> Item {
        ItemBuilder::new(SWORD)
            .durability(31)
            .display_name("Oathkeeper")
            .lore_line("Forged in the north")
            .lore_line("Never dulls")
            .enchant("sharpness", 5)
            .enchant("unbreaking", 3)
            .unbreakable(true)
            .repair_cost(9)
            .attribute("owner", TagValue::Uuid(Uuid::from_u128(42)))
            .build()
    }

    #[test]
    fn test_item_round_trip() {
        let item = fancy_sword();
        assert_eq!(Item::from_tag(&item.to_tag()), Ok(item));
    }

    #[test]
    fn test_criteria_layout() {
        let criteria = ItemCriteria::new(Item::new(SWORD), Wildcards::DURABILITY);
        let tag = criteria.to_tag();
        let compound = tag.as_compound().expect("compound");
        assert_eq!(compound.get("wildcardDurability"), Some(&TagValue::from_bool(true)));
        assert_eq!(compound.get("wildcardItemMeta"), Some(&TagValue::from_bool(false)));
        assert_eq!(ItemCriteria::from_tag(&tag), Ok(criteria));
    }

    #[test]
    fn test_missing_wildcards_read_as_exact() {
        let mut compound = Compound::new();
        compound.insert("item".into(), Item::new(IRON_INGOT).to_tag());
        let criteria = ItemCriteria::from_tag(&compound.into()).expect("criteria");
        assert!(!criteria.has_wildcard());
    }

    #[test]
    fn test_multiset_layout() {
        let mut multiset = ItemMultiset::new();
        multiset.insert(ItemCriteria::exact(Item::new(IRON_INGOT)), 5);
        multiset.insert(ItemCriteria::new(fancy_sword(), Wildcards::LORE), 2);

        let tag = multiset.to_tag();
        let compound = tag.as_compound().expect("compound");
        assert_eq!(compound.get("totalItems"), Some(&TagValue::Long(7)));
        assert_eq!(compound.get("version"), Some(&TagValue::from("1.0.0")));
        assert_eq!(compound.list_field("items").map(<[TagValue]>::len), Ok(2));
        assert_eq!(ItemMultiset::from_tag(&tag), Ok(multiset));
    }

    #[test]
    fn test_stored_total_is_recomputed() {
        let multiset = ItemMultiset::from_stack(&Item::new(IRON_INGOT).stack(5));
        let TagValue::Compound(mut compound) = multiset.to_tag() else {
            panic!("multiset tag is a compound");
        };
        compound.insert("totalItems".into(), TagValue::Long(999));
        let back = ItemMultiset::from_tag(&compound.into()).expect("multiset");
        assert_eq!(back.total(), 5);
    }

    #[test]
    fn test_version_mismatch() {
        let TagValue::Compound(mut compound) = ItemMultiset::new().to_tag() else {
            panic!("multiset tag is a compound");
        };
        compound.insert("version".into(), TagValue::from("2.0.0"));
        assert_eq!(
            ItemMultiset::from_tag(&compound.into()),
            Err(TagError::UnsupportedVersion("2.0.0".into()))
        );
    }

    #[test]
    fn test_out_of_range_durability() {
        let mut compound = Compound::new();
        compound.insert("type".into(), TagValue::Int(265));
        compound.insert("durability".into(), TagValue::Long(1 << 20));
        assert_eq!(
            Item::from_tag(&compound.into()),
            Err(TagError::OutOfRange {
                field: "durability".into(),
                value: 1 << 20,
            })
        );
    }

    #[test]
    fn test_multiset_through_json() {
        let multiset = ItemMultiset::from_stacks(&[
            fancy_sword().stack(1),
            Item::new(IRON_INGOT).stack(12),
        ]);
        let text = serde_json::to_string(&multiset.to_tag()).expect("serialize");
        let tree: TagValue = serde_json::from_str(&text).expect("deserialize");
        assert_eq!(ItemMultiset::from_tag(&tree), Ok(multiset));
    }

    fn criteria_strategy() -> impl Strategy<Value = ItemCriteria> {
        (
            1u32..600,
            -5i16..40,
            proptest::option::of("[a-z]{1,8}"),
            prop::collection::vec("[a-z ]{0,12}", 0..3),
            0u8..64,
        )
            .prop_map(|(type_id, durability, name, lore, wildcards)| {
                let mut builder = ItemBuilder::new(ItemTypeId::new(type_id)).durability(durability);
                if let Some(name) = name {
                    builder = builder.display_name(name);
                }
                for line in lore {
                    builder = builder.lore_line(line);
                }
                ItemCriteria::new(builder.build(), Wildcards::from_raw(wildcards))
            })
    }

    proptest! {
        #[test]
        fn prop_multiset_round_trip(
            entries in prop::collection::vec((criteria_strategy(), 0i64..10_000), 0..8)
        ) {
            let multiset: ItemMultiset = entries.into_iter().collect();
            let back = ItemMultiset::from_tag(&multiset.to_tag());
            prop_assert_eq!(back, Ok(multiset));
        }
    }
}
