//! Generic key/value tag tree.
//!
//! Items, criteria and multisets are persisted as a nested tree of
//! string-keyed compounds, lists and primitive scalars. The tree itself
//! derives serde so any serde backend can write it out.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use tally_common::{SchemaVersion, TallyError};
use thiserror::Error;
use uuid::Uuid;

/// Tag tree error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagError {
    /// A required key is absent
    #[error("Missing tag field: {0}")]
    Missing(String),
    /// A value has an unexpected shape
    #[error("Tag field {field} has wrong type: expected {expected}")]
    WrongType {
        /// Field name
        field: String,
        /// Expected tag kind
        expected: &'static str,
    },
    /// A value is out of range for its target type
    #[error("Tag field {field} out of range: {value}")]
    OutOfRange {
        /// Field name
        field: String,
        /// Offending value
        value: i64,
    },
    /// Stored layout version cannot be read
    #[error("Unsupported tag version: {0}")]
    UnsupportedVersion(String),
}

/// Result type for tag operations.
pub type TagResult<T> = Result<T, TagError>;

impl From<TagError> for TallyError {
    fn from(err: TagError) -> Self {
        match err {
            TagError::UnsupportedVersion(actual) => Self::VersionMismatch {
                expected: SchemaVersion::ITEM_TAG.to_string(),
                actual,
            },
            other => Self::Tag(other.to_string()),
        }
    }
}

/// String-keyed compound of tags.
pub type Compound = BTreeMap<String, TagValue>;

/// A node in the tag tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum TagValue {
    /// 8-bit integer (also used for booleans)
    Byte(i8),
    /// 16-bit integer
    Short(i16),
    /// 32-bit integer
    Int(i32),
    /// 64-bit integer
    Long(i64),
    /// 64-bit float
    Double(f64),
    /// UTF-8 string
    String(String),
    /// Raw bytes
    ByteArray(Vec<u8>),
    /// Packed 32-bit integers
    IntArray(Vec<i32>),
    /// 128-bit identifier
    Uuid(Uuid),
    /// Ordered list
    List(Vec<TagValue>),
    /// Nested compound
    Compound(Compound),
}

impl TagValue {
    /// Encodes a boolean as a byte tag.
    #[must_use]
    pub const fn from_bool(value: bool) -> Self {
        Self::Byte(value as i8)
    }

    /// Returns the kind name used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Byte(_) => "byte",
            Self::Short(_) => "short",
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Double(_) => "double",
            Self::String(_) => "string",
            Self::ByteArray(_) => "byte array",
            Self::IntArray(_) => "int array",
            Self::Uuid(_) => "uuid",
            Self::List(_) => "list",
            Self::Compound(_) => "compound",
        }
    }

    /// Widens any integer tag to `i64`.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Byte(v) => Some(v as i64),
            Self::Short(v) => Some(v as i64),
            Self::Int(v) => Some(v as i64),
            Self::Long(v) => Some(v),
            _ => None,
        }
    }

    /// Reads a byte tag as a boolean.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Byte(v) => Some(v != 0),
            _ => None,
        }
    }

    /// Returns the string payload.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the list payload.
    #[must_use]
    pub fn as_list(&self) -> Option<&[TagValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the compound payload.
    #[must_use]
    pub const fn as_compound(&self) -> Option<&Compound> {
        match self {
            Self::Compound(map) => Some(map),
            _ => None,
        }
    }
}

impl PartialEq for TagValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Byte(a), Self::Byte(b)) => a == b,
            (Self::Short(a), Self::Short(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Long(a), Self::Long(b)) => a == b,
            // Bit equality keeps Eq and Hash consistent (NaN == NaN here).
            (Self::Double(a), Self::Double(b)) => a.to_bits() == b.to_bits(),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::ByteArray(a), Self::ByteArray(b)) => a == b,
            (Self::IntArray(a), Self::IntArray(b)) => a == b,
            (Self::Uuid(a), Self::Uuid(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Compound(a), Self::Compound(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for TagValue {}

impl Hash for TagValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Byte(v) => v.hash(state),
            Self::Short(v) => v.hash(state),
            Self::Int(v) => v.hash(state),
            Self::Long(v) => v.hash(state),
            Self::Double(v) => v.to_bits().hash(state),
            Self::String(v) => v.hash(state),
            Self::ByteArray(v) => v.hash(state),
            Self::IntArray(v) => v.hash(state),
            Self::Uuid(v) => v.hash(state),
            Self::List(v) => v.hash(state),
            Self::Compound(v) => v.hash(state),
        }
    }
}

impl From<Compound> for TagValue {
    fn from(value: Compound) -> Self {
        Self::Compound(value)
    }
}

impl From<String> for TagValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

/// Conversion into a tag tree.
pub trait ToTag {
    /// Builds the tag representation of `self`.
    fn to_tag(&self) -> TagValue;
}

/// Conversion out of a tag tree.
pub trait FromTag: Sized {
    /// Rebuilds a value from its tag representation.
    fn from_tag(tag: &TagValue) -> TagResult<Self>;
}

/// Typed field lookups on a compound.
pub(crate) trait CompoundExt {
    fn field(&self, key: &str) -> TagResult<&TagValue>;
    fn int_field(&self, key: &str) -> TagResult<i64>;
    fn bool_field(&self, key: &str) -> TagResult<bool>;
    fn str_field(&self, key: &str) -> TagResult<&str>;
    fn list_field(&self, key: &str) -> TagResult<&[TagValue]>;
    fn compound_field(&self, key: &str) -> TagResult<&Compound>;
}

impl CompoundExt for Compound {
    fn field(&self, key: &str) -> TagResult<&TagValue> {
        self.get(key).ok_or_else(|| TagError::Missing(key.to_owned()))
    }

    fn int_field(&self, key: &str) -> TagResult<i64> {
        self.field(key)?.as_i64().ok_or_else(|| wrong_type(key, "integer"))
    }

    fn bool_field(&self, key: &str) -> TagResult<bool> {
        self.field(key)?.as_bool().ok_or_else(|| wrong_type(key, "byte"))
    }

    fn str_field(&self, key: &str) -> TagResult<&str> {
        self.field(key)?.as_str().ok_or_else(|| wrong_type(key, "string"))
    }

    fn list_field(&self, key: &str) -> TagResult<&[TagValue]> {
        self.field(key)?.as_list().ok_or_else(|| wrong_type(key, "list"))
    }

    fn compound_field(&self, key: &str) -> TagResult<&Compound> {
        self.field(key)?
            .as_compound()
            .ok_or_else(|| wrong_type(key, "compound"))
    }
}

pub(crate) fn wrong_type(field: &str, expected: &'static str) -> TagError {
    TagError::WrongType {
        field: field.to_owned(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(tag: &TagValue) -> u64 {
        let mut hasher = DefaultHasher::new();
        tag.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_integer_widening() {
        assert_eq!(TagValue::Byte(-3).as_i64(), Some(-3));
        assert_eq!(TagValue::Short(300).as_i64(), Some(300));
        assert_eq!(TagValue::Long(1 << 40).as_i64(), Some(1 << 40));
        assert_eq!(TagValue::from("x").as_i64(), None);
    }

    #[test]
    fn test_double_equality_by_bits() {
        let nan = TagValue::Double(f64::NAN);
        assert_eq!(nan, nan.clone());
        assert_eq!(hash_of(&nan), hash_of(&nan.clone()));
        assert_ne!(TagValue::Double(0.0), TagValue::Double(-0.0));
    }

    #[test]
    fn test_kinds_never_equal_across_variants() {
        assert_ne!(TagValue::Int(1), TagValue::Long(1));
        assert_ne!(TagValue::Byte(1), TagValue::from_bool(false));
        assert_eq!(TagValue::Byte(1), TagValue::from_bool(true));
    }

    #[test]
    fn test_compound_field_errors() {
        let mut compound = Compound::new();
        compound.insert("name".into(), TagValue::from("Excalibur"));

        assert_eq!(compound.str_field("name"), Ok("Excalibur"));
        assert_eq!(
            compound.int_field("name"),
            Err(TagError::WrongType {
                field: "name".into(),
                expected: "integer"
            })
        );
        assert_eq!(
            compound.bool_field("flag"),
            Err(TagError::Missing("flag".into()))
        );
    }

    #[test]
    fn test_into_tally_error() {
        let err: TallyError = TagError::UnsupportedVersion("9.0.0".into()).into();
        assert!(matches!(err, TallyError::VersionMismatch { actual, .. } if actual == "9.0.0"));

        let err: TallyError = TagError::Missing("items".into()).into();
        assert_eq!(err.to_string(), "Tag error: Missing tag field: items");
    }

    #[test]
    fn test_tree_through_json() {
        let id = Uuid::from_u128(0x1234_5678_9abc_def0_1234_5678_9abc_def0);
        let mut compound = Compound::new();
        compound.insert("owner".into(), TagValue::Uuid(id));
        compound.insert("bytes".into(), TagValue::ByteArray(vec![1, 2, 3]));
        compound.insert(
            "list".into(),
            TagValue::List(vec![TagValue::Int(7), TagValue::Double(0.5)]),
        );
        let tree = TagValue::Compound(compound);

        let text = serde_json::to_string(&tree).expect("serialize");
        let back: TagValue = serde_json::from_str(&text).expect("deserialize");
        assert_eq!(back, tree);
    }
}
