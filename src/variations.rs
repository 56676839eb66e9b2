//! Variation Keys
//!
//! A [`VariationKey`] binds every attribute declared on a variable product to
//! exactly one of its values. Keys are stored as an ordered map, so two keys
//! built from the same selections in a different order are equal and hash
//! identically.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::attributes::{Attribute, AttributeId};

/// Errors raised while building or checking a variation key.
#[derive(Debug, Error, PartialEq)]
pub enum VariationError {
    /// A declared attribute has no selected value.
    #[error("no value selected for attribute {0}")]
    IncompleteSelection(AttributeId),

    /// The selected value is not allowed for the attribute.
    #[error("attribute {attribute} does not allow value {value:?}")]
    UnknownValue {
        /// Attribute the value was selected for
        attribute: AttributeId,

        /// Rejected value
        value: String,
    },

    /// The key's attribute set differs from the declared attributes.
    #[error("variation key {key} does not match the declared attributes")]
    MalformedKey {
        /// Stable rendering of the offending key
        key: String,
    },
}

/// Order-independent identifier of one purchasable combination.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariationKey {
    entries: BTreeMap<AttributeId, String>,
}

impl VariationKey {
    /// Build a key from customer or admin selections, validated against the
    /// attributes declared on a product.
    ///
    /// # Errors
    ///
    /// - [`VariationError::MalformedKey`]: a selection names an attribute that
    ///   is not declared.
    /// - [`VariationError::IncompleteSelection`]: a declared attribute has no value.
    /// - [`VariationError::UnknownValue`]: a value is not allowed by its attribute.
    pub fn build<K, V>(
        declared: &[&Attribute],
        selections: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self, VariationError>
    where
        K: Into<AttributeId>,
        V: Into<String>,
    {
        let entries: BTreeMap<AttributeId, String> = selections
            .into_iter()
            .map(|(attribute, value)| (attribute.into(), value.into()))
            .collect();

        if entries
            .keys()
            .any(|id| !declared.iter().any(|attribute| attribute.id() == id))
        {
            return Err(VariationError::MalformedKey {
                key: Self { entries }.to_stable_string(),
            });
        }

        if let Some(missing) = declared
            .iter()
            .find(|attribute| !entries.contains_key(attribute.id()))
        {
            return Err(VariationError::IncompleteSelection(missing.id().clone()));
        }

        let key = Self { entries };
        key.check_values(declared)?;

        Ok(key)
    }

    /// Check that every value bound to one of `declared` is allowed by that
    /// attribute. Attributes the key does not bind are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`VariationError::UnknownValue`] for the first disallowed value.
    pub fn check_values(&self, declared: &[&Attribute]) -> Result<(), VariationError> {
        let disallowed = declared.iter().find_map(|attribute| {
            self.get(attribute.id())
                .filter(|value| !attribute.allows(value))
                .map(|value| (attribute.id(), value))
        });

        match disallowed {
            Some((attribute, value)) => Err(VariationError::UnknownValue {
                attribute: attribute.clone(),
                value: value.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Build a key without validating it against any attributes.
    ///
    /// Used for keys that arrive from storage; shape is re-checked when the
    /// key is attached to a product.
    pub fn from_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<AttributeId>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(attribute, value)| (attribute.into(), value.into()))
                .collect(),
        }
    }

    /// Every combination of values for the given attributes, in attribute
    /// declaration order and value display order.
    ///
    /// Returns an empty list if any attribute has no values, or if no
    /// attributes are given.
    pub fn combinations(declared: &[&Attribute]) -> Vec<Self> {
        if declared.is_empty() {
            return Vec::new();
        }

        declared.iter().fold(vec![Self::default()], |keys, attribute| {
            keys.iter()
                .flat_map(|key| {
                    attribute.values().iter().map(move |value| {
                        let mut next = key.clone();
                        next.entries.insert(attribute.id().clone(), value.clone());
                        next
                    })
                })
                .collect()
        })
    }

    /// The value bound to `attribute`, if any.
    pub fn get(&self, attribute: &AttributeId) -> Option<&str> {
        self.entries.get(attribute).map(String::as_str)
    }

    /// Iterate over `(attribute, value)` pairs in attribute id order.
    pub fn iter(&self) -> impl Iterator<Item = (&AttributeId, &str)> {
        self.entries
            .iter()
            .map(|(attribute, value)| (attribute, value.as_str()))
    }

    /// Number of bound attributes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no attribute is bound.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the key binds exactly the given attributes, no more and no fewer.
    pub fn matches_shape(&self, declared: &[AttributeId]) -> bool {
        self.entries.len() == declared.len()
            && declared.iter().all(|id| self.entries.contains_key(id))
    }

    /// Check that the key binds exactly the given attributes.
    ///
    /// # Errors
    ///
    /// Returns [`VariationError::MalformedKey`] on any mismatch.
    pub fn ensure_shape(&self, declared: &[AttributeId]) -> Result<(), VariationError> {
        if self.matches_shape(declared) {
            Ok(())
        } else {
            Err(VariationError::MalformedKey {
                key: self.to_stable_string(),
            })
        }
    }

    /// Canonical rendering: `attribute=value` pairs sorted by attribute id and
    /// joined with `;`. Reserved characters are backslash-escaped so distinct
    /// keys never render the same.
    pub fn to_stable_string(&self) -> String {
        let mut out = String::new();

        for (index, (attribute, value)) in self.entries.iter().enumerate() {
            if index > 0 {
                out.push(';');
            }

            push_escaped(&mut out, attribute.as_str());
            out.push('=');
            push_escaped(&mut out, value);
        }

        out
    }
}

impl fmt::Display for VariationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_stable_string())
    }
}

fn push_escaped(out: &mut String, raw: &str) {
    for ch in raw.chars() {
        if matches!(ch, '\\' | '=' | ';') {
            out.push('\\');
        }

        out.push(ch);
    }
}
