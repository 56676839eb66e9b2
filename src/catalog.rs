//! Catalog
//!
//! In-memory product and attribute store. Persistence lives behind the
//! [`ProductSource`] trait; this store is what tests, fixtures and the demo
//! use.

use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::debug;

use crate::{
    attributes::{Attribute, AttributeCatalog, AttributeError, AttributeId},
    orders::Order,
    products::{
        Product, ProductId, ProductStatus, Sku, VariantError, VariantRecord, VariantWrite,
    },
};

/// Errors raised by catalog maintenance.
#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    /// A product with this id already exists.
    #[error("product {0} already exists")]
    DuplicateProduct(ProductId),

    /// No product has this id.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// An open order still references the product.
    #[error("product {product} is referenced by open order {order}")]
    ReferencedByOpenOrder {
        /// Product being destroyed
        product: ProductId,

        /// First open order found referencing it
        order: String,
    },

    /// An attribute value is bound by a variant and cannot be removed.
    #[error("value {value:?} of attribute {attribute} is used by SKU {sku}")]
    ValueInUse {
        /// Attribute being edited
        attribute: AttributeId,

        /// Value being removed
        value: String,

        /// First variant found using it
        sku: Sku,
    },

    /// Variant writes need a variable product.
    #[error("product {0} is not a variable product")]
    NotVariable(ProductId),

    /// A variable product declares an attribute the catalog does not know.
    #[error(transparent)]
    Attribute(#[from] AttributeError),

    /// A variant was rejected.
    #[error(transparent)]
    Variant(#[from] VariantError),
}

/// Read access to products and attributes, as supplied by the persistence
/// layer.
pub trait ProductSource<'a> {
    /// Look up a product by id.
    fn product(&self, id: &ProductId) -> Option<&Product<'a>>;

    /// The attribute catalog products are keyed against.
    fn attributes(&self) -> &AttributeCatalog;
}

/// In-memory catalog
#[derive(Debug, Clone, Default)]
pub struct Catalog<'a> {
    attributes: AttributeCatalog,
    products: FxHashMap<ProductId, Product<'a>>,
}

impl<'a> Catalog<'a> {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an attribute.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Attribute`] if the id is taken.
    pub fn insert_attribute(&mut self, attribute: Attribute) -> Result<(), CatalogError> {
        Ok(self.attributes.insert(attribute)?)
    }

    /// Mutable access to the attribute catalog for adding values.
    pub fn attributes_mut(&mut self) -> &mut AttributeCatalog {
        &mut self.attributes
    }

    /// Remove an allowed value from an attribute.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::ValueInUse`]: a variant's key binds the value.
    /// - [`CatalogError::Attribute`]: the attribute or value is unknown.
    pub fn remove_attribute_value(
        &mut self,
        attribute: &AttributeId,
        value: &str,
    ) -> Result<(), CatalogError> {
        let in_use = self
            .products
            .values()
            .filter_map(|product| match product {
                Product::Variable(product) => Some(product),
                Product::Simple(_) => None,
            })
            .flat_map(|product| product.variants())
            .find(|variant| variant.key().get(attribute) == Some(value));

        if let Some(variant) = in_use {
            return Err(CatalogError::ValueInUse {
                attribute: attribute.clone(),
                value: value.to_string(),
                sku: variant.sku().clone(),
            });
        }

        Ok(self.attributes.remove_value(attribute, value)?)
    }

    /// Add a product.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::DuplicateProduct`]: the id is taken.
    /// - [`CatalogError::Attribute`]: a variable product declares an unknown attribute.
    /// - [`CatalogError::Variant`]: a variant binds a value its attribute
    ///   does not allow.
    pub fn insert_product(&mut self, product: impl Into<Product<'a>>) -> Result<(), CatalogError> {
        let product = product.into();

        if self.products.contains_key(product.id()) {
            return Err(CatalogError::DuplicateProduct(product.id().clone()));
        }

        self.attributes.resolve(product.declared_attributes())?;

        if let Product::Variable(variable) = &product {
            variable.check_values(&self.attributes)?;
        }

        debug!(product = %product.id(), kind = ?product.kind(), "inserting product");

        self.products.insert(product.id().clone(), product);

        Ok(())
    }

    /// Add or patch a variant of a variable product, checking the key's
    /// values against the attribute catalog.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::ProductNotFound`]: no such product.
    /// - [`CatalogError::NotVariable`]: the product is a simple product.
    /// - [`CatalogError::Variant`]: the write was rejected; the product is
    ///   unchanged.
    pub fn apply_variant(
        &mut self,
        id: &ProductId,
        write: VariantWrite<'a>,
    ) -> Result<&VariantRecord<'a>, CatalogError> {
        match self.products.get_mut(id) {
            Some(Product::Variable(product)) => Ok(product.apply_in(&self.attributes, write)?),
            Some(Product::Simple(_)) => Err(CatalogError::NotVariable(id.clone())),
            None => Err(CatalogError::ProductNotFound(id.clone())),
        }
    }

    /// Remove a variant by SKU, returning it if it existed.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::ProductNotFound`]: no such product.
    /// - [`CatalogError::NotVariable`]: the product is a simple product.
    pub fn remove_variant(
        &mut self,
        id: &ProductId,
        sku: &Sku,
    ) -> Result<Option<VariantRecord<'a>>, CatalogError> {
        match self.products.get_mut(id) {
            Some(Product::Variable(product)) => Ok(product.remove_variant(sku)),
            Some(Product::Simple(_)) => Err(CatalogError::NotVariable(id.clone())),
            None => Err(CatalogError::ProductNotFound(id.clone())),
        }
    }

    /// Change a product's publication status (soft destroy).
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ProductNotFound`] for unknown ids.
    pub fn set_status(
        &mut self,
        id: &ProductId,
        status: ProductStatus,
    ) -> Result<(), CatalogError> {
        self.products
            .get_mut(id)
            .ok_or_else(|| CatalogError::ProductNotFound(id.clone()))?
            .set_status(status);

        Ok(())
    }

    /// Remove a product outright (hard destroy).
    ///
    /// # Errors
    ///
    /// - [`CatalogError::ReferencedByOpenOrder`]: an open order references it.
    /// - [`CatalogError::ProductNotFound`]: no such product.
    pub fn remove_product<'o>(
        &mut self,
        id: &ProductId,
        orders: impl IntoIterator<Item = &'o Order<'o>>,
    ) -> Result<Product<'a>, CatalogError> {
        let blocking = orders
            .into_iter()
            .find(|order| order.is_open() && order.references_product(id));

        if let Some(order) = blocking {
            return Err(CatalogError::ReferencedByOpenOrder {
                product: id.clone(),
                order: order.id().to_string(),
            });
        }

        debug!(product = %id, "removing product");

        self.products
            .remove(id)
            .ok_or_else(|| CatalogError::ProductNotFound(id.clone()))
    }

    /// Iterate over all products.
    pub fn products(&self) -> impl Iterator<Item = &Product<'a>> {
        self.products.values()
    }

    /// Number of products.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog has no products.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl<'a> ProductSource<'a> for Catalog<'a> {
    fn product(&self, id: &ProductId) -> Option<&Product<'a>> {
        self.products.get(id)
    }

    fn attributes(&self) -> &AttributeCatalog {
        &self.attributes
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::{Money, iso::USD};
    use testresult::TestResult;

    use crate::{
        products::{ImageRef, NewVariant, SimpleProduct, VariableProduct, VariantPatch},
        variations::{VariationError, VariationKey},
    };

    use super::*;

    fn catalog<'a>() -> Result<Catalog<'a>, Box<dyn std::error::Error>> {
        let mut catalog = Catalog::new();
        catalog.insert_attribute(Attribute::new("color", "Color", ["Black", "Gray"])?)?;

        let chair = VariableProduct::new(
            "chair",
            "Chair",
            [AttributeId::new("color")],
            [ImageRef::new("chair.jpg")],
        )?
        .with_variants([NewVariant::new(
            VariationKey::from_entries([("color", "Black")]),
            "CH-B",
            Money::from_minor(5_000, USD),
        )])?;

        catalog.insert_product(chair)?;
        catalog.insert_product(SimpleProduct::new(
            "lamp",
            "Lamp",
            "LMP-1",
            Money::from_minor(2_000, USD),
        )?)?;

        Ok(catalog)
    }

    #[test]
    fn insert_product_rejects_duplicates() -> TestResult {
        let mut catalog = catalog()?;

        let result = catalog.insert_product(SimpleProduct::new(
            "lamp",
            "Lamp",
            "LMP-2",
            Money::from_minor(1, USD),
        )?);

        assert_eq!(
            result,
            Err(CatalogError::DuplicateProduct(ProductId::new("lamp")))
        );

        Ok(())
    }

    #[test]
    fn insert_product_rejects_unknown_attributes() -> TestResult {
        let mut catalog = catalog()?;

        let sofa = VariableProduct::new(
            "sofa",
            "Sofa",
            [AttributeId::new("fabric")],
            [ImageRef::new("sofa.jpg")],
        )?;

        let result = catalog.insert_product(sofa);

        assert!(matches!(
            result,
            Err(CatalogError::Attribute(AttributeError::UnknownAttribute(_)))
        ));

        Ok(())
    }

    #[test]
    fn insert_product_rejects_disallowed_variant_values() -> TestResult {
        let mut catalog = catalog()?;

        let stool = VariableProduct::new(
            "stool",
            "Stool",
            [AttributeId::new("color")],
            [ImageRef::new("stool.jpg")],
        )?
        .with_variants([NewVariant::new(
            VariationKey::from_entries([("color", "Purple")]),
            "ST-P",
            Money::from_minor(3_000, USD),
        )])?;

        let result = catalog.insert_product(stool);

        assert_eq!(
            result,
            Err(CatalogError::Variant(VariantError::DisallowedValue {
                sku: Sku::new("ST-P"),
                source: VariationError::UnknownValue {
                    attribute: AttributeId::new("color"),
                    value: "Purple".to_string(),
                },
            }))
        );
        assert!(catalog.product(&ProductId::new("stool")).is_none());

        Ok(())
    }

    #[test]
    fn apply_variant_checks_values_against_attributes() -> TestResult {
        let mut catalog = catalog()?;
        let chair = ProductId::new("chair");
        let before = catalog.product(&chair).cloned();

        let purple = catalog.apply_variant(
            &chair,
            VariantWrite::New(NewVariant::new(
                VariationKey::from_entries([("color", "Purple")]),
                "CH-P",
                Money::from_minor(5_000, USD),
            )),
        );

        assert!(matches!(
            purple,
            Err(CatalogError::Variant(VariantError::DisallowedValue { .. }))
        ));

        let recolored = catalog.apply_variant(
            &chair,
            VariantWrite::Patch {
                sku: Sku::new("CH-B"),
                patch: VariantPatch {
                    key: Some(VariationKey::from_entries([("color", "Purple")])),
                    ..VariantPatch::default()
                },
            },
        );

        assert!(matches!(
            recolored,
            Err(CatalogError::Variant(VariantError::DisallowedValue { .. }))
        ));
        assert_eq!(catalog.product(&chair).cloned(), before);

        let gray = catalog.apply_variant(
            &chair,
            VariantWrite::New(NewVariant::new(
                VariationKey::from_entries([("color", "Gray")]),
                "CH-G",
                Money::from_minor(5_200, USD),
            )),
        )?;

        assert_eq!(gray.sku(), &Sku::new("CH-G"));

        Ok(())
    }

    #[test]
    fn variant_writes_need_a_variable_product() -> TestResult {
        let mut catalog = catalog()?;
        let lamp = ProductId::new("lamp");
        let sofa = ProductId::new("sofa");

        assert_eq!(
            catalog.remove_variant(&lamp, &Sku::new("LMP-1")),
            Err(CatalogError::NotVariable(lamp))
        );
        assert_eq!(
            catalog.remove_variant(&sofa, &Sku::new("SF-1")),
            Err(CatalogError::ProductNotFound(sofa))
        );

        let removed = catalog.remove_variant(&ProductId::new("chair"), &Sku::new("CH-B"))?;

        assert!(removed.is_some());

        Ok(())
    }

    #[test]
    fn value_in_use_cannot_be_removed() -> TestResult {
        let mut catalog = catalog()?;
        let color = AttributeId::new("color");

        let result = catalog.remove_attribute_value(&color, "Black");

        assert_eq!(
            result,
            Err(CatalogError::ValueInUse {
                attribute: color.clone(),
                value: "Black".to_string(),
                sku: Sku::new("CH-B"),
            })
        );

        catalog.remove_attribute_value(&color, "Gray")?;

        assert_eq!(catalog.attributes().require(&color)?.values(), ["Black"]);

        Ok(())
    }

    #[test]
    fn set_status_soft_destroys() -> TestResult {
        let mut catalog = catalog()?;
        let id = ProductId::new("lamp");

        catalog.set_status(&id, ProductStatus::Private)?;

        assert_eq!(
            catalog.product(&id).map(Product::status),
            Some(ProductStatus::Private)
        );

        Ok(())
    }

    #[test]
    fn remove_product_without_orders() -> TestResult {
        let mut catalog = catalog()?;

        let removed = catalog.remove_product(&ProductId::new("lamp"), [])?;

        assert_eq!(removed.id().as_str(), "lamp");
        assert_eq!(catalog.len(), 1);

        Ok(())
    }
}
