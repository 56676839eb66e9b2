//! Attributes
//!
//! Named axes of product variation (e.g. "Color") and their ordered,
//! enumerated values.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::products::string_id;

string_id!(
    /// Attribute identifier
    AttributeId
);

/// Errors related to attribute definitions.
#[derive(Debug, Error, PartialEq)]
pub enum AttributeError {
    /// The same value was listed twice for one attribute.
    #[error("attribute {attribute} lists value {value:?} more than once")]
    DuplicateValue {
        /// Attribute being defined
        attribute: AttributeId,

        /// Repeated value
        value: String,
    },

    /// An attribute with this id already exists in the catalog.
    #[error("attribute {0} already exists")]
    DuplicateAttribute(AttributeId),

    /// The attribute is not known to the catalog.
    #[error("unknown attribute {0}")]
    UnknownAttribute(AttributeId),

    /// The value is not one of the attribute's allowed values.
    #[error("attribute {attribute} has no value {value:?}")]
    UnknownValue {
        /// Attribute searched
        attribute: AttributeId,

        /// Missing value
        value: String,
    },
}

/// Attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AttributeRecord", into = "AttributeRecord")]
pub struct Attribute {
    id: AttributeId,
    name: String,
    values: SmallVec<[String; 5]>,
}

impl Attribute {
    /// Create a new attribute with its allowed values in display order.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::DuplicateValue`] if a value repeats.
    pub fn new<V: Into<String>>(
        id: impl Into<AttributeId>,
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Result<Self, AttributeError> {
        let id = id.into();
        let mut collected: SmallVec<[String; 5]> = SmallVec::new();

        for value in values {
            let value = value.into();

            if collected.contains(&value) {
                return Err(AttributeError::DuplicateValue {
                    attribute: id,
                    value,
                });
            }

            collected.push(value);
        }

        Ok(Self {
            id,
            name: name.into(),
            values: collected,
        })
    }

    /// Attribute id
    pub fn id(&self) -> &AttributeId {
        &self.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Allowed values, in display order.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Whether `value` is one of the allowed values.
    pub fn allows(&self, value: &str) -> bool {
        self.values.iter().any(|allowed| allowed == value)
    }

    fn push_value(&mut self, value: String) -> Result<(), AttributeError> {
        if self.allows(&value) {
            return Err(AttributeError::DuplicateValue {
                attribute: self.id.clone(),
                value,
            });
        }

        self.values.push(value);

        Ok(())
    }

    fn drop_value(&mut self, value: &str) -> Result<(), AttributeError> {
        let position = self
            .values
            .iter()
            .position(|allowed| allowed == value)
            .ok_or_else(|| AttributeError::UnknownValue {
                attribute: self.id.clone(),
                value: value.to_string(),
            })?;

        self.values.remove(position);

        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct AttributeRecord {
    id: AttributeId,
    name: String,
    values: Vec<String>,
}

impl TryFrom<AttributeRecord> for Attribute {
    type Error = AttributeError;

    fn try_from(record: AttributeRecord) -> Result<Self, Self::Error> {
        Attribute::new(record.id, record.name, record.values)
    }
}

impl From<Attribute> for AttributeRecord {
    fn from(attribute: Attribute) -> Self {
        Self {
            id: attribute.id,
            name: attribute.name,
            values: attribute.values.into_vec(),
        }
    }
}

/// The set of attributes known to the catalog, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct AttributeCatalog {
    attributes: FxHashMap<AttributeId, Attribute>,
}

impl AttributeCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an attribute.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::DuplicateAttribute`] if the id is taken.
    pub fn insert(&mut self, attribute: Attribute) -> Result<(), AttributeError> {
        if self.attributes.contains_key(attribute.id()) {
            return Err(AttributeError::DuplicateAttribute(attribute.id().clone()));
        }

        self.attributes.insert(attribute.id().clone(), attribute);

        Ok(())
    }

    /// Look up an attribute by id.
    pub fn get(&self, id: &AttributeId) -> Option<&Attribute> {
        self.attributes.get(id)
    }

    /// Look up an attribute, failing if it is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::UnknownAttribute`] if the id is not registered.
    pub fn require(&self, id: &AttributeId) -> Result<&Attribute, AttributeError> {
        self.get(id)
            .ok_or_else(|| AttributeError::UnknownAttribute(id.clone()))
    }

    /// Resolve a list of ids into attributes, preserving order.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::UnknownAttribute`] for the first unknown id.
    pub fn resolve<'c>(
        &'c self,
        ids: &[AttributeId],
    ) -> Result<Vec<&'c Attribute>, AttributeError> {
        ids.iter().map(|id| self.require(id)).collect()
    }

    /// Append a new allowed value to an attribute.
    ///
    /// # Errors
    ///
    /// Fails if the attribute is unknown or already allows the value.
    pub fn add_value(
        &mut self,
        id: &AttributeId,
        value: impl Into<String>,
    ) -> Result<(), AttributeError> {
        self.attributes
            .get_mut(id)
            .ok_or_else(|| AttributeError::UnknownAttribute(id.clone()))?
            .push_value(value.into())
    }

    /// Remove an allowed value without checking whether it is in use.
    ///
    /// Callers go through [`crate::catalog::Catalog::remove_attribute_value`],
    /// which refuses to drop values bound by a variant.
    pub(crate) fn remove_value(
        &mut self,
        id: &AttributeId,
        value: &str,
    ) -> Result<(), AttributeError> {
        self.attributes
            .get_mut(id)
            .ok_or_else(|| AttributeError::UnknownAttribute(id.clone()))?
            .drop_value(value)
    }

    /// Iterate over all attributes.
    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.values()
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn color() -> Result<Attribute, AttributeError> {
        Attribute::new("color", "Color", ["Black", "Gray"])
    }

    #[test]
    fn new_keeps_value_order() -> TestResult {
        let attribute = Attribute::new("size", "Size", ["S", "M", "L"])?;

        assert_eq!(attribute.values(), ["S", "M", "L"]);
        assert!(attribute.allows("M"));
        assert!(!attribute.allows("XL"));

        Ok(())
    }

    #[test]
    fn new_rejects_duplicate_values() {
        let result = Attribute::new("color", "Color", ["Black", "Black"]);

        assert_eq!(
            result,
            Err(AttributeError::DuplicateValue {
                attribute: AttributeId::new("color"),
                value: "Black".to_string(),
            })
        );
    }

    #[test]
    fn insert_rejects_duplicate_ids() -> TestResult {
        let mut catalog = AttributeCatalog::new();
        catalog.insert(color()?)?;

        let result = catalog.insert(color()?);

        assert_eq!(
            result,
            Err(AttributeError::DuplicateAttribute(AttributeId::new("color")))
        );

        Ok(())
    }

    #[test]
    fn resolve_preserves_order_and_reports_unknown() -> TestResult {
        let mut catalog = AttributeCatalog::new();
        catalog.insert(color()?)?;
        catalog.insert(Attribute::new("size", "Size", ["S", "M"])?)?;

        let resolved = catalog.resolve(&[AttributeId::new("size"), AttributeId::new("color")])?;
        let ids: Vec<&str> = resolved.iter().map(|a| a.id().as_str()).collect();

        assert_eq!(ids, ["size", "color"]);

        let missing = catalog.resolve(&[AttributeId::new("material")]);

        assert!(matches!(
            missing,
            Err(AttributeError::UnknownAttribute(id)) if id.as_str() == "material"
        ));

        Ok(())
    }

    #[test]
    fn add_value_appends_and_rejects_repeats() -> TestResult {
        let mut catalog = AttributeCatalog::new();
        catalog.insert(color()?)?;

        let id = AttributeId::new("color");
        catalog.add_value(&id, "White")?;

        assert_eq!(catalog.require(&id)?.values(), ["Black", "Gray", "White"]);
        assert!(catalog.add_value(&id, "Gray").is_err());

        Ok(())
    }

    #[test]
    fn deserializing_validates_values() {
        let yaml = "id: color\nname: Color\nvalues: [Black, Black]\n";

        let result: Result<Attribute, _> = serde_norway::from_str(yaml);

        assert!(result.is_err());
    }
}
