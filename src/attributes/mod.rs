mod merge;
mod names;

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub use merge::{annotate_blocks, fill_holes, merge_block_attributes, MergeReport, DEFAULT_ID_FIELD};
pub use names::{annotate_categories, calling_code_names, CategoryNames, CODE_FIELD, NAME_FIELD};

/// A single attribute value. Numbers keep their JSON type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl AttrValue {
    /// Integer-looking text becomes `Int`; anything else stays text.
    pub fn parse_lossy(raw: &str) -> Self {
        match raw.trim().parse::<i64>() {
            Ok(n) => AttrValue::Int(n),
            Err(_) => AttrValue::Text(raw.to_string()),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Int(n) => write!(f, "{n}"),
            AttrValue::Float(x) => write!(f, "{x}"),
            AttrValue::Text(s) => f.write_str(s),
        }
    }
}

/// Ordered attribute record of one node; `None` is an explicit null.
pub type Attributes = IndexMap<String, Option<AttrValue>>;

/// Result of looking up one attribute key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup<'a> {
    Value(&'a AttrValue),
    Null,
    Absent,
}

impl<'a> Lookup<'a> {
    /// True when the key is missing or explicitly null.
    #[inline] pub fn is_missing(&self) -> bool { !matches!(self, Lookup::Value(_)) }
}

/// Typed lookup that distinguishes an explicit null from a missing key.
pub fn lookup<'a>(attrs: &'a Attributes, key: &str) -> Lookup<'a> {
    match attrs.get(key) {
        Some(Some(value)) => Lookup::Value(value),
        Some(None) => Lookup::Null,
        None => Lookup::Absent,
    }
}

/// External descriptive records keyed by region identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeTable {
    records: IndexMap<String, Attributes>,
}

impl AttributeTable {
    pub fn new() -> Self { Self::default() }

    #[inline] pub fn len(&self) -> usize { self.records.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.records.is_empty() }

    #[inline] pub fn get(&self, id: &str) -> Option<&Attributes> { self.records.get(id) }

    /// Insert or replace the record for `id`.
    pub fn insert(&mut self, id: impl Into<String>, record: Attributes) -> Option<Attributes> {
        self.records.insert(id.into(), record)
    }

    /// Absorb another table; later records replace earlier ones.
    pub fn extend(&mut self, other: AttributeTable) {
        self.records.extend(other.records);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Attributes)> {
        self.records.iter().map(|(id, record)| (id.as_str(), record))
    }
}
