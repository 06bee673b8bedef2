//! Row model abstraction
//!
//! The grid is generic over the record type it edits. Snapshots for revert
//! are taken with `Clone` and dirty checks use `PartialEq`, so a model must be
//! plain acyclic data whose clone shares nothing mutable with the original.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::types::Value;

/// A record type that can be edited by the grid
pub trait GridModel: Clone + PartialEq + std::fmt::Debug + Send + Sync + 'static {
    /// Read a field by name. `None` means the field is absent.
    fn get(&self, field: &str) -> Option<Value>;

    /// Write a field by name
    fn set(&mut self, field: &str, value: Value);
}

/// Ordered field-name to value map, the default grid model
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: IndexMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field assignment
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl GridModel for Record {
    fn get(&self, field: &str) -> Option<Value> {
        self.fields.get(field).cloned()
    }

    fn set(&mut self, field: &str, value: Value) {
        self.fields.insert(field.to_string(), value);
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
