//! Variable Products

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    attributes::{Attribute, AttributeCatalog, AttributeError, AttributeId},
    products::{
        CategoryId, ImageRef, PricingError, ProductId, ProductStatus, SelectionError, Sku,
        check_pricing,
        variants::{NewVariant, VariantError, VariantPatch, VariantRecord, VariantWrite},
    },
    variations::VariationKey,
};

/// Errors constructing a variable product.
#[derive(Debug, Error, PartialEq)]
pub enum ProductError {
    /// A variable product must declare at least one attribute.
    #[error("variable product {0} declares no attributes")]
    NoAttributes(ProductId),

    /// The same attribute is declared twice.
    #[error("attribute {0} is declared more than once")]
    RepeatedAttribute(AttributeId),

    /// A variable product needs at least one base image to fall back on.
    #[error("variable product {0} has no base images")]
    MissingBaseImage(ProductId),

    /// Pricing error on a simple product.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// One of the initial variants was rejected.
    #[error(transparent)]
    Variant(#[from] VariantError),
}

/// A base product plus its variants, all keyed over the same attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "VariableProductRecord<'a>")]
pub struct VariableProduct<'a> {
    id: ProductId,
    title: String,
    description: String,
    categories: BTreeSet<CategoryId>,
    base_images: Vec<ImageRef>,
    attributes: Vec<AttributeId>,
    variants: Vec<VariantRecord<'a>>,
    is_featured: bool,
    status: ProductStatus,
}

impl<'a> VariableProduct<'a> {
    /// Create a variable product with no variants.
    ///
    /// # Errors
    ///
    /// Fails if no attributes are declared, an attribute repeats, or there
    /// are no base images.
    pub fn new(
        id: impl Into<ProductId>,
        title: impl Into<String>,
        attributes: impl IntoIterator<Item = AttributeId>,
        base_images: impl IntoIterator<Item = ImageRef>,
    ) -> Result<Self, ProductError> {
        let id = id.into();
        let mut declared: Vec<AttributeId> = Vec::new();

        for attribute in attributes {
            if declared.contains(&attribute) {
                return Err(ProductError::RepeatedAttribute(attribute));
            }

            declared.push(attribute);
        }

        if declared.is_empty() {
            return Err(ProductError::NoAttributes(id));
        }

        let base_images: Vec<ImageRef> = base_images.into_iter().collect();

        if base_images.is_empty() {
            return Err(ProductError::MissingBaseImage(id));
        }

        Ok(Self {
            id,
            title: title.into(),
            description: String::new(),
            categories: BTreeSet::new(),
            base_images,
            attributes: declared,
            variants: Vec::new(),
            is_featured: false,
            status: ProductStatus::Draft,
        })
    }

    /// Add the initial variants, each validated as by [`Self::add_variant`].
    ///
    /// # Errors
    ///
    /// Returns the first rejected variant's error.
    pub fn with_variants(
        mut self,
        variants: impl IntoIterator<Item = NewVariant<'a>>,
    ) -> Result<Self, ProductError> {
        for variant in variants {
            self.add_variant(variant)?;
        }

        Ok(self)
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the categories.
    #[must_use]
    pub fn with_categories(mut self, categories: impl IntoIterator<Item = CategoryId>) -> Self {
        self.categories = categories.into_iter().collect();
        self
    }

    /// Set the publication status.
    #[must_use]
    pub fn with_status(mut self, status: ProductStatus) -> Self {
        self.status = status;
        self
    }

    /// Mark as featured.
    #[must_use]
    pub fn featured(mut self, is_featured: bool) -> Self {
        self.is_featured = is_featured;
        self
    }

    /// Product id
    pub fn id(&self) -> &ProductId {
        &self.id
    }

    /// Product title
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Product description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Category ids
    pub fn categories(&self) -> &BTreeSet<CategoryId> {
        &self.categories
    }

    /// Base images, never empty
    pub fn base_images(&self) -> &[ImageRef] {
        &self.base_images
    }

    /// Declared attributes, in display order. Every variant key binds exactly these.
    pub fn attributes(&self) -> &[AttributeId] {
        &self.attributes
    }

    /// Variants, in insertion order
    pub fn variants(&self) -> &[VariantRecord<'a>] {
        &self.variants
    }

    /// Whether the product is featured
    pub fn is_featured(&self) -> bool {
        self.is_featured
    }

    /// Publication status
    pub fn status(&self) -> ProductStatus {
        self.status
    }

    /// Change the publication status.
    pub fn set_status(&mut self, status: ProductStatus) {
        self.status = status;
    }

    /// Find a variant by SKU.
    pub fn variant_by_sku(&self, sku: &Sku) -> Option<&VariantRecord<'a>> {
        self.variants.iter().find(|variant| variant.sku() == sku)
    }

    /// Find the variant for a variation key.
    pub fn variant_for_key(&self, key: &VariationKey) -> Option<&VariantRecord<'a>> {
        self.variants.iter().find(|variant| variant.key() == key)
    }

    /// Build a key for this product from raw selections, validating values
    /// against the attribute catalog.
    ///
    /// # Errors
    ///
    /// Fails if a declared attribute is unknown to the catalog or the
    /// selections do not form a valid key.
    pub fn key_for<K, V>(
        &self,
        catalog: &AttributeCatalog,
        selections: impl IntoIterator<Item = (K, V)>,
    ) -> Result<VariationKey, SelectionError>
    where
        K: Into<AttributeId>,
        V: Into<String>,
    {
        let declared = catalog.resolve(&self.attributes)?;

        Ok(VariationKey::build(&declared, selections)?)
    }

    /// Keys of the full attribute grid that have no variant yet.
    ///
    /// # Errors
    ///
    /// Fails if a declared attribute is unknown to the catalog.
    pub fn missing_keys(
        &self,
        catalog: &AttributeCatalog,
    ) -> Result<Vec<VariationKey>, AttributeError> {
        let declared = catalog.resolve(&self.attributes)?;

        Ok(VariationKey::combinations(&declared)
            .into_iter()
            .filter(|key| self.variant_for_key(key).is_none())
            .collect())
    }

    /// Apply a variant write.
    ///
    /// The candidate record is validated in full before the product is
    /// touched; on error nothing changes.
    ///
    /// # Errors
    ///
    /// - [`VariantError::UnknownSku`]: a patch targets a SKU that does not exist.
    /// - [`VariantError::MalformedKey`]: the key does not bind exactly the declared attributes.
    /// - [`VariantError::DuplicateVariation`]: another variant has an equal key.
    /// - [`VariantError::DuplicateSku`]: another variant has the same SKU.
    /// - [`VariantError::Pricing`]: invalid price, discount price or currency.
    pub fn apply(&mut self, write: VariantWrite<'a>) -> Result<&VariantRecord<'a>, VariantError> {
        self.write(write, &[])
    }

    /// Apply a variant write, also checking the key's values against the
    /// attribute catalog.
    ///
    /// # Errors
    ///
    /// As [`Self::apply`], plus:
    /// - [`VariantError::Attribute`]: a declared attribute is not in `catalog`.
    /// - [`VariantError::DisallowedValue`]: the key binds a value its
    ///   attribute does not allow.
    pub fn apply_in(
        &mut self,
        catalog: &AttributeCatalog,
        write: VariantWrite<'a>,
    ) -> Result<&VariantRecord<'a>, VariantError> {
        let declared = catalog.resolve(&self.attributes)?;

        self.write(write, &declared)
    }

    /// Check every variant's key values against the attribute catalog.
    ///
    /// # Errors
    ///
    /// - [`VariantError::Attribute`]: a declared attribute is not in `catalog`.
    /// - [`VariantError::DisallowedValue`]: the first variant binding a value
    ///   its attribute does not allow.
    pub fn check_values(&self, catalog: &AttributeCatalog) -> Result<(), VariantError> {
        let declared = catalog.resolve(&self.attributes)?;

        self.variants
            .iter()
            .try_for_each(|variant| check_variant_values(variant, &declared))
    }

    fn write(
        &mut self,
        write: VariantWrite<'a>,
        allowed: &[&Attribute],
    ) -> Result<&VariantRecord<'a>, VariantError> {
        let written = match write {
            VariantWrite::New(new) => self.insert_variant(VariantRecord::from(new), allowed),
            VariantWrite::Patch { sku, patch } => self.patch_variant(&sku, patch, allowed),
        };

        let position = match written {
            Ok(position) => position,
            Err(err) => {
                warn!(product = %self.id, error = %err, "rejected variant write");

                return Err(err);
            }
        };

        let Some(variant) = self.variants.get(position) else {
            unreachable!("written variant position is always in bounds")
        };

        Ok(variant)
    }

    /// Add a variant.
    ///
    /// # Errors
    ///
    /// See [`Self::apply`].
    pub fn add_variant(
        &mut self,
        variant: NewVariant<'a>,
    ) -> Result<&VariantRecord<'a>, VariantError> {
        self.apply(VariantWrite::New(variant))
    }

    /// Patch the variant keyed by `sku`.
    ///
    /// # Errors
    ///
    /// See [`Self::apply`].
    pub fn update_variant(
        &mut self,
        sku: &Sku,
        patch: VariantPatch<'a>,
    ) -> Result<&VariantRecord<'a>, VariantError> {
        self.apply(VariantWrite::Patch {
            sku: sku.clone(),
            patch,
        })
    }

    /// Remove the variant keyed by `sku`, returning it if it existed.
    ///
    /// Blocking removal while stock is reserved by open orders is up to the
    /// caller.
    pub fn remove_variant(&mut self, sku: &Sku) -> Option<VariantRecord<'a>> {
        let position = self.position_of(sku)?;

        debug!(product = %self.id, %sku, "removing variant");

        Some(self.variants.remove(position))
    }

    /// The variant's own images, or the product's base images when the
    /// variant has none. Never empty.
    pub fn resolve_images<'v>(&'v self, variant: &'v VariantRecord<'a>) -> &'v [ImageRef] {
        if variant.images().is_empty() {
            &self.base_images
        } else {
            variant.images()
        }
    }

    /// Point a variant's images at base images by index.
    ///
    /// # Errors
    ///
    /// - [`VariantError::UnknownSku`]: no variant has `sku`.
    /// - [`VariantError::ImageIndexOutOfBounds`]: an index is past the base images.
    pub fn assign_base_images(&mut self, sku: &Sku, indices: &[usize]) -> Result<(), VariantError> {
        let position = self
            .position_of(sku)
            .ok_or_else(|| VariantError::UnknownSku(sku.clone()))?;

        let images = indices
            .iter()
            .map(|&index| {
                self.base_images
                    .get(index)
                    .cloned()
                    .ok_or(VariantError::ImageIndexOutOfBounds {
                        index,
                        len: self.base_images.len(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(variant) = self.variants.get_mut(position) {
            variant.set_images(images);
        }

        Ok(())
    }

    fn position_of(&self, sku: &Sku) -> Option<usize> {
        self.variants.iter().position(|variant| variant.sku() == sku)
    }

    fn insert_variant(
        &mut self,
        candidate: VariantRecord<'a>,
        allowed: &[&Attribute],
    ) -> Result<usize, VariantError> {
        self.validate(&candidate, None, allowed)?;

        debug!(
            product = %self.id,
            sku = %candidate.sku(),
            key = %candidate.key(),
            "adding variant"
        );

        self.variants.push(candidate);

        Ok(self.variants.len() - 1)
    }

    fn patch_variant(
        &mut self,
        sku: &Sku,
        patch: VariantPatch<'a>,
        allowed: &[&Attribute],
    ) -> Result<usize, VariantError> {
        let (position, current) = self
            .variants
            .iter()
            .enumerate()
            .find(|(_, variant)| variant.sku() == sku)
            .ok_or_else(|| VariantError::UnknownSku(sku.clone()))?;

        let candidate = current.patched(patch);

        self.validate(&candidate, Some(position), allowed)?;

        debug!(
            product = %self.id,
            %sku,
            new_sku = %candidate.sku(),
            key = %candidate.key(),
            "updating variant"
        );

        if let Some(slot) = self.variants.get_mut(position) {
            *slot = candidate;
        }

        Ok(position)
    }

    /// Check a candidate record against the product, ignoring the variant at
    /// `replacing` (the one being patched). Key values are checked against
    /// `allowed` only when it is non-empty.
    fn validate(
        &self,
        candidate: &VariantRecord<'a>,
        replacing: Option<usize>,
        allowed: &[&Attribute],
    ) -> Result<(), VariantError> {
        if !candidate.key().matches_shape(&self.attributes) {
            return Err(VariantError::MalformedKey {
                sku: candidate.sku().clone(),
                key: candidate.key().to_stable_string(),
            });
        }

        check_variant_values(candidate, allowed)?;

        let others = || {
            self.variants
                .iter()
                .enumerate()
                .filter(move |(index, _)| Some(*index) != replacing)
                .map(|(_, variant)| variant)
        };

        if let Some(existing) = others().find(|other| other.key() == candidate.key()) {
            return Err(VariantError::DuplicateVariation {
                key: candidate.key().to_stable_string(),
                existing: existing.sku().clone(),
            });
        }

        if others().any(|other| other.sku() == candidate.sku()) {
            return Err(VariantError::DuplicateSku(candidate.sku().clone()));
        }

        let pricing = |source| VariantError::Pricing {
            sku: candidate.sku().clone(),
            source,
        };

        check_pricing(&candidate.price(), candidate.discount_price().as_ref()).map_err(pricing)?;

        if let Some(other) = others().next() {
            let expected = other.price().currency();
            let actual = candidate.price().currency();

            if expected != actual {
                return Err(pricing(PricingError::CurrencyMismatch {
                    expected: expected.iso_alpha_code,
                    actual: actual.iso_alpha_code,
                }));
            }
        }

        Ok(())
    }
}

fn check_variant_values(
    variant: &VariantRecord<'_>,
    allowed: &[&Attribute],
) -> Result<(), VariantError> {
    variant
        .key()
        .check_values(allowed)
        .map_err(|source| VariantError::DisallowedValue {
            sku: variant.sku().clone(),
            source,
        })
}

#[derive(Deserialize)]
struct VariableProductRecord<'a> {
    id: ProductId,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    categories: BTreeSet<CategoryId>,
    base_images: Vec<ImageRef>,
    attributes: Vec<AttributeId>,
    #[serde(default)]
    variants: Vec<VariantRecord<'a>>,
    #[serde(default)]
    is_featured: bool,
    #[serde(default)]
    status: ProductStatus,
}

impl<'a> TryFrom<VariableProductRecord<'a>> for VariableProduct<'a> {
    type Error = ProductError;

    fn try_from(record: VariableProductRecord<'a>) -> Result<Self, Self::Error> {
        let mut product = VariableProduct::new(
            record.id,
            record.title,
            record.attributes,
            record.base_images,
        )?
        .with_description(record.description)
        .with_categories(record.categories)
        .with_status(record.status)
        .featured(record.is_featured);

        for variant in record.variants {
            product.insert_variant(variant, &[])?;
        }

        Ok(product)
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::{
        Money,
        iso::{GBP, USD},
    };
    use testresult::TestResult;

    use crate::variations::VariationError;

    use super::*;

    fn key(color: &str, size: &str) -> VariationKey {
        VariationKey::from_entries([("color", color), ("size", size)])
    }

    fn chair<'a>() -> Result<VariableProduct<'a>, ProductError> {
        VariableProduct::new(
            "chair",
            "Chair",
            [AttributeId::new("color"), AttributeId::new("size")],
            [ImageRef::new("chair.jpg"), ImageRef::new("chair-side.jpg")],
        )?
        .with_variants([
            NewVariant::new(key("Black", "S"), "CH-BS", Money::from_minor(5_000, USD)),
            NewVariant::new(key("Black", "M"), "CH-BM", Money::from_minor(5_500, USD)),
        ])
    }

    #[test]
    fn new_requires_attributes_and_images() {
        let no_attributes = VariableProduct::new("p", "P", [], [ImageRef::new("a.jpg")]);
        let no_images = VariableProduct::new("p", "P", [AttributeId::new("color")], []);
        let repeated = VariableProduct::new(
            "p",
            "P",
            [AttributeId::new("color"), AttributeId::new("color")],
            [ImageRef::new("a.jpg")],
        );

        assert!(matches!(no_attributes, Err(ProductError::NoAttributes(_))));
        assert!(matches!(no_images, Err(ProductError::MissingBaseImage(_))));
        assert!(matches!(repeated, Err(ProductError::RepeatedAttribute(_))));
    }

    #[test]
    fn add_variant_rejects_equal_key_in_any_entry_order() -> TestResult {
        let mut product = chair()?;
        let reversed = VariationKey::from_entries([("size", "S"), ("color", "Black")]);

        let result = product.add_variant(NewVariant::new(
            reversed,
            "CH-BS-2",
            Money::from_minor(5_000, USD),
        ));

        assert_eq!(
            result.err(),
            Some(VariantError::DuplicateVariation {
                key: "color=Black;size=S".to_string(),
                existing: Sku::new("CH-BS"),
            })
        );
        assert_eq!(product.variants().len(), 2);

        Ok(())
    }

    #[test]
    fn add_variant_rejects_reused_sku() -> TestResult {
        let mut product = chair()?;

        let result = product.add_variant(NewVariant::new(
            key("Gray", "S"),
            "CH-BS",
            Money::from_minor(5_000, USD),
        ));

        assert_eq!(result.err(), Some(VariantError::DuplicateSku(Sku::new("CH-BS"))));

        Ok(())
    }

    #[test]
    fn add_variant_rejects_malformed_keys() -> TestResult {
        let mut product = chair()?;

        let too_few = VariationKey::from_entries([("color", "Gray")]);
        let too_many =
            VariationKey::from_entries([("color", "Gray"), ("size", "S"), ("material", "Oak")]);

        for key in [too_few, too_many] {
            let result =
                product.add_variant(NewVariant::new(key, "CH-X", Money::from_minor(1, USD)));

            assert!(matches!(result, Err(VariantError::MalformedKey { .. })));
        }

        assert_eq!(product.variants().len(), 2);

        Ok(())
    }

    #[test]
    fn add_variant_rejects_bad_pricing_and_currency() -> TestResult {
        let mut product = chair()?;

        let above = NewVariant::new(key("Gray", "S"), "CH-GS", Money::from_minor(100, USD))
            .with_discount_price(Money::from_minor(200, USD));
        let pounds = NewVariant::new(key("Gray", "M"), "CH-GM", Money::from_minor(100, GBP));

        assert!(matches!(
            product.add_variant(above),
            Err(VariantError::Pricing {
                source: PricingError::DiscountAbovePrice { .. },
                ..
            })
        ));
        assert!(matches!(
            product.add_variant(pounds),
            Err(VariantError::Pricing {
                source: PricingError::CurrencyMismatch { .. },
                ..
            })
        ));

        Ok(())
    }

    #[test]
    fn update_variant_applies_patch() -> TestResult {
        let mut product = chair()?;

        let updated = product.update_variant(
            &Sku::new("CH-BM"),
            VariantPatch {
                price: Some(Money::from_minor(6_000, USD)),
                quantity: Some(4),
                ..VariantPatch::default()
            },
        )?;

        assert_eq!(updated.price(), Money::from_minor(6_000, USD));
        assert_eq!(updated.quantity(), 4);

        Ok(())
    }

    #[test]
    fn update_variant_may_keep_its_own_key_and_sku() -> TestResult {
        let mut product = chair()?;

        product.update_variant(
            &Sku::new("CH-BS"),
            VariantPatch {
                sku: Some(Sku::new("CH-BS")),
                key: Some(key("Black", "S")),
                ..VariantPatch::default()
            },
        )?;

        assert_eq!(product.variants().len(), 2);

        Ok(())
    }

    #[test]
    fn failed_update_leaves_product_unchanged() -> TestResult {
        let mut product = chair()?;
        let before = product.clone();

        let result = product.update_variant(
            &Sku::new("CH-BM"),
            VariantPatch {
                key: Some(key("Black", "S")),
                quantity: Some(99),
                ..VariantPatch::default()
            },
        );

        assert!(matches!(result, Err(VariantError::DuplicateVariation { .. })));
        assert_eq!(product, before);

        Ok(())
    }

    #[test]
    fn update_variant_rejects_another_variants_sku() -> TestResult {
        let mut product = chair()?;
        let before = product.clone();

        let result = product.update_variant(
            &Sku::new("CH-BM"),
            VariantPatch {
                sku: Some(Sku::new("CH-BS")),
                ..VariantPatch::default()
            },
        );

        assert_eq!(result.err(), Some(VariantError::DuplicateSku(Sku::new("CH-BS"))));
        assert_eq!(product, before);

        Ok(())
    }

    #[test]
    fn update_variant_rejects_malformed_key() -> TestResult {
        let mut product = chair()?;
        let before = product.clone();

        let result = product.update_variant(
            &Sku::new("CH-BM"),
            VariantPatch {
                key: Some(VariationKey::from_entries([("color", "Gray")])),
                price: Some(Money::from_minor(1, USD)),
                ..VariantPatch::default()
            },
        );

        assert!(matches!(result, Err(VariantError::MalformedKey { .. })));
        assert_eq!(product, before);

        Ok(())
    }

    #[test]
    fn apply_in_rejects_disallowed_values() -> TestResult {
        let mut catalog = AttributeCatalog::new();
        catalog.insert(Attribute::new("color", "Color", ["Black", "Gray"])?)?;
        catalog.insert(Attribute::new("size", "Size", ["S", "M"])?)?;

        let mut product = chair()?;
        let before = product.clone();

        let added = product.apply_in(
            &catalog,
            VariantWrite::New(NewVariant::new(
                key("Purple", "S"),
                "CH-PS",
                Money::from_minor(5_000, USD),
            )),
        );

        assert_eq!(
            added.err(),
            Some(VariantError::DisallowedValue {
                sku: Sku::new("CH-PS"),
                source: VariationError::UnknownValue {
                    attribute: AttributeId::new("color"),
                    value: "Purple".to_string(),
                },
            })
        );

        let patched = product.apply_in(
            &catalog,
            VariantWrite::Patch {
                sku: Sku::new("CH-BM"),
                patch: VariantPatch {
                    key: Some(key("Black", "XL")),
                    ..VariantPatch::default()
                },
            },
        );

        assert!(matches!(patched, Err(VariantError::DisallowedValue { .. })));
        assert_eq!(product, before);

        product.apply_in(
            &catalog,
            VariantWrite::New(NewVariant::new(
                key("Gray", "S"),
                "CH-GS",
                Money::from_minor(5_000, USD),
            )),
        )?;

        assert_eq!(product.variants().len(), 3);

        Ok(())
    }

    #[test]
    fn check_values_reports_first_disallowed_variant() -> TestResult {
        let mut catalog = AttributeCatalog::new();
        catalog.insert(Attribute::new("color", "Color", ["Gray"])?)?;
        catalog.insert(Attribute::new("size", "Size", ["S", "M"])?)?;

        let product = chair()?;

        let result = product.check_values(&catalog);

        assert!(matches!(
            result,
            Err(VariantError::DisallowedValue { sku, .. }) if sku == Sku::new("CH-BS")
        ));

        Ok(())
    }

    #[test]
    fn update_unknown_sku_fails() -> TestResult {
        let mut product = chair()?;

        let result = product.update_variant(&Sku::new("NOPE"), VariantPatch::default());

        assert_eq!(result.err(), Some(VariantError::UnknownSku(Sku::new("NOPE"))));

        Ok(())
    }

    #[test]
    fn remove_variant_is_unconditional() -> TestResult {
        let mut product = chair()?;

        let removed = product.remove_variant(&Sku::new("CH-BS"));

        assert!(removed.is_some());
        assert!(product.remove_variant(&Sku::new("CH-BS")).is_none());
        assert_eq!(product.variants().len(), 1);

        Ok(())
    }

    #[test]
    fn resolve_images_falls_back_to_base_images() -> TestResult {
        let mut product = chair()?;
        product.update_variant(
            &Sku::new("CH-BM"),
            VariantPatch {
                images: Some(vec![ImageRef::new("black-m.jpg")]),
                ..VariantPatch::default()
            },
        )?;

        let small = product.variant_by_sku(&Sku::new("CH-BS")).ok_or("missing CH-BS")?;
        let medium = product.variant_by_sku(&Sku::new("CH-BM")).ok_or("missing CH-BM")?;

        assert_eq!(product.resolve_images(small), product.base_images());
        assert_eq!(product.resolve_images(medium), [ImageRef::new("black-m.jpg")]);

        Ok(())
    }

    #[test]
    fn assign_base_images_checks_bounds() -> TestResult {
        let mut product = chair()?;
        let sku = Sku::new("CH-BS");

        product.assign_base_images(&sku, &[1])?;

        let variant = product.variant_by_sku(&sku).ok_or("missing CH-BS")?;
        assert_eq!(variant.images(), [ImageRef::new("chair-side.jpg")]);

        let result = product.assign_base_images(&sku, &[0, 2]);

        assert_eq!(
            result,
            Err(VariantError::ImageIndexOutOfBounds { index: 2, len: 2 })
        );

        let variant = product.variant_by_sku(&sku).ok_or("missing CH-BS")?;
        assert_eq!(variant.images(), [ImageRef::new("chair-side.jpg")]);

        Ok(())
    }

    #[test]
    fn missing_keys_lists_unfilled_combinations() -> TestResult {
        let mut catalog = AttributeCatalog::new();
        catalog.insert(Attribute::new("color", "Color", ["Black", "Gray"])?)?;
        catalog.insert(Attribute::new("size", "Size", ["S", "M"])?)?;

        let product = chair()?;
        let missing = product.missing_keys(&catalog)?;

        assert_eq!(missing, [key("Gray", "S"), key("Gray", "M")]);

        Ok(())
    }

    #[test]
    fn key_for_validates_against_catalog() -> TestResult {
        let mut catalog = AttributeCatalog::new();
        catalog.insert(Attribute::new("color", "Color", ["Black", "Gray"])?)?;
        catalog.insert(Attribute::new("size", "Size", ["S", "M"])?)?;

        let product = chair()?;

        let built = product.key_for(&catalog, [("size", "S"), ("color", "Black")])?;
        let incomplete = product.key_for(&catalog, [("size", "S")]);

        assert_eq!(built, key("Black", "S"));
        assert!(matches!(incomplete, Err(SelectionError::Variation(_))));

        Ok(())
    }

    #[test]
    fn deserializing_revalidates_variants() {
        let yaml = r"
id: chair
title: Chair
base_images: [chair.jpg]
attributes: [color]
variants:
  - sku: A
    key: { color: Black }
    price: { amount: 100, currency: USD }
    quantity: 1
  - sku: B
    key: { color: Black }
    price: { amount: 100, currency: USD }
    quantity: 1
";

        let result: Result<VariableProduct<'_>, _> = serde_norway::from_str(yaml);

        assert!(result.is_err());
    }
}
