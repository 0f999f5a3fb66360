//! Field-mapping normalizer.
//!
//! A [`Mapping`] tells the normalizer how to fill each canonical field from a
//! source-native JSON record: either copy a top-level source field verbatim
//! ([`FieldRule::Copy`]) or compute the value from the whole record
//! ([`FieldRule::Derive`]). Anything the mapping does not produce keeps the
//! canonical default, so every field is always present in the output.
//!
//! ```
//! use manga_extensions::normalize::{normalize_manga, Mapping};
//! use serde_json::json;
//!
//! let mapping = Mapping::new()
//!     .copy("id", "id")
//!     .derive("title", |r| r["attributes"]["title"]["en"].clone());
//! let manga = normalize_manga(&json!({"id": "42", "attributes": {"title": {"en": "Foo"}}}), &mapping).unwrap();
//! assert_eq!(manga.id.as_deref(), Some("42"));
//! assert_eq!(manga.title.as_deref(), Some("Foo"));
//! ```

use crate::error::{Error, Result};
use crate::models::{Chapter, Manga};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

pub type DeriveFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

#[derive(Clone)]
pub enum FieldRule {
    /// Name of a top-level field of the source record.
    Copy(String),
    /// Must be pure and return `Value::Null` rather than panic on incomplete input.
    Derive(DeriveFn),
}

impl fmt::Debug for FieldRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRule::Copy(src) => f.debug_tuple("Copy").field(src).finish(),
            FieldRule::Derive(_) => f.write_str("Derive(..)"),
        }
    }
}

/// Canonical field name (camelCase, as serialized) to rule.
#[derive(Clone, Debug, Default)]
pub struct Mapping {
    rules: Vec<(String, FieldRule)>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn copy(mut self, field: impl Into<String>, source_field: impl Into<String>) -> Self {
        self.rules.push((field.into(), FieldRule::Copy(source_field.into())));
        self
    }

    pub fn derive<F>(mut self, field: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.rules.push((field.into(), FieldRule::Derive(Arc::new(f))));
        self
    }

    pub fn rules(&self) -> &[(String, FieldRule)] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Builds a canonical record of type `T` from `record`.
///
/// Copy rules are applied before derive rules, so a derived value always
/// wins over a copied one for the same field. Fails with [`Error::Shape`]
/// only when a produced value cannot be held by its canonical field.
pub fn normalize<T>(record: &Value, mapping: &Mapping) -> Result<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    let mut fields = match serde_json::to_value(T::default())? {
        Value::Object(fields) => fields,
        other => {
            return Err(Error::Shape(format!(
                "canonical record must be an object, got {}",
                other
            )))
        }
    };

    for (field, rule) in &mapping.rules {
        if let FieldRule::Copy(source_field) = rule {
            if let Some(value) = record.get(source_field) {
                fields.insert(field.clone(), value.clone());
            }
        }
    }
    for (field, rule) in &mapping.rules {
        if let FieldRule::Derive(f) = rule {
            fields.insert(field.clone(), f(record));
        }
    }

    serde_json::from_value(Value::Object(fields))
        .map_err(|e| Error::Shape(format!("cannot build canonical record: {}", e)))
}

pub fn normalize_manga(record: &Value, mapping: &Mapping) -> Result<Manga> {
    normalize(record, mapping)
}

pub fn normalize_chapter(record: &Value, mapping: &Mapping) -> Result<Chapter> {
    normalize(record, mapping)
}
