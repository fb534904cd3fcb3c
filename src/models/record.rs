//! Field observations and their per-identifier aggregation.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

/// Fields returned by one site for one identifier.
pub type FieldMap = BTreeMap<String, String>;

/// An aggregated field: a scalar until a second distinct value shows up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Single(String),
    Many(BTreeSet<String>),
}

impl FieldValue {
    /// All distinct values, sets expanded element-wise.
    pub fn values(&self) -> Vec<&str> {
        match self {
            FieldValue::Single(value) => vec![value.as_str()],
            FieldValue::Many(values) => values.iter().map(String::as_str).collect(),
        }
    }

    fn merge(&mut self, value: &str) {
        match self {
            FieldValue::Single(current) if current == value => {}
            FieldValue::Single(current) => {
                let set = BTreeSet::from([std::mem::take(current), value.to_string()]);
                *self = FieldValue::Many(set);
            }
            FieldValue::Many(values) => {
                values.insert(value.to_string());
            }
        }
    }
}

/// Aggregated state for one identifier across every site probed for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IdentifierRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl IdentifierRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one observation into the record.
    pub fn aggregate(&mut self, name: &str, value: &str) {
        match self.fields.get_mut(name) {
            Some(existing) => existing.merge(value),
            None => {
                self.fields
                    .insert(name.to_string(), FieldValue::Single(value.to_string()));
            }
        }
    }

    /// Merge every observation of one site as a unit.
    pub fn aggregate_site(&mut self, fields: &FieldMap) {
        for (name, value) in fields {
            self.aggregate(name, value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
