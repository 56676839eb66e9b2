//! Product Fixtures

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::{
    attributes::AttributeId,
    fixtures::FixtureError,
    money::parse_money,
    products::{
        CategoryId, ImageRef, NewVariant, Product, ProductStatus, SimpleProduct, VariableProduct,
    },
    variations::VariationKey,
};

/// Wrapper for products in YAML
#[derive(Debug, Deserialize)]
pub struct ProductsFixture {
    /// Map of product id -> product fixture
    pub products: FxHashMap<String, ProductFixture>,
}

/// Product Fixture
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProductFixture {
    /// A single-SKU product
    Simple {
        /// Product title
        title: String,

        /// Stock keeping unit
        sku: String,

        /// Price (e.g., "20.00 USD")
        price: String,

        /// Optional discount price
        #[serde(default)]
        discount_price: Option<String>,

        /// Units in stock
        #[serde(default)]
        quantity: u32,

        /// Informational attributes
        #[serde(default)]
        attributes: BTreeMap<String, Vec<String>>,

        /// Images
        #[serde(default)]
        images: Vec<String>,

        /// Category ids
        #[serde(default)]
        categories: Vec<String>,

        /// Publication status
        #[serde(default)]
        status: ProductStatus,
    },

    /// A product with one variant per attribute combination
    Variable {
        /// Product title
        title: String,

        /// Declared attribute ids
        attributes: Vec<String>,

        /// Base images
        base_images: Vec<String>,

        /// Variants
        #[serde(default)]
        variants: Vec<VariantFixture>,

        /// Category ids
        #[serde(default)]
        categories: Vec<String>,

        /// Publication status
        #[serde(default)]
        status: ProductStatus,
    },
}

/// Variant Fixture
#[derive(Debug, Deserialize)]
pub struct VariantFixture {
    /// Stock keeping unit
    pub sku: String,

    /// Attribute id -> value
    pub key: BTreeMap<String, String>,

    /// Price (e.g., "50.00 USD")
    pub price: String,

    /// Optional discount price
    #[serde(default)]
    pub discount_price: Option<String>,

    /// Units in stock
    #[serde(default)]
    pub quantity: u32,

    /// Indices into the product's base images
    #[serde(default)]
    pub images: Vec<usize>,
}

impl ProductFixture {
    /// Build the product, using `id` as its product id.
    ///
    /// # Errors
    ///
    /// Returns an error if a price cannot be parsed or the product is invalid.
    pub fn into_product<'a>(self, id: &str) -> Result<Product<'a>, FixtureError> {
        match self {
            ProductFixture::Simple {
                title,
                sku,
                price,
                discount_price,
                quantity,
                attributes,
                images,
                categories,
                status,
            } => {
                let mut product = SimpleProduct::new(id, title, sku, parse_money(&price)?)?
                    .with_quantity(quantity)
                    .with_images(images.into_iter().map(ImageRef::from))
                    .with_categories(categories.into_iter().map(CategoryId::from))
                    .with_status(status);

                if let Some(discount_price) = discount_price {
                    product = product.with_discount_price(parse_money(&discount_price)?)?;
                }

                for (attribute, values) in attributes {
                    product = product.with_attribute(attribute, values);
                }

                Ok(product.into())
            }
            ProductFixture::Variable {
                title,
                attributes,
                base_images,
                variants,
                categories,
                status,
            } => {
                let mut product = VariableProduct::new(
                    id,
                    title,
                    attributes.into_iter().map(AttributeId::from),
                    base_images.into_iter().map(ImageRef::from),
                )?
                .with_categories(categories.into_iter().map(CategoryId::from))
                .with_status(status);

                for variant in variants {
                    let indices = variant.images.clone();
                    let record = product.add_variant(variant.try_into()?)?;
                    let sku = record.sku().clone();

                    if !indices.is_empty() {
                        product.assign_base_images(&sku, &indices)?;
                    }
                }

                Ok(product.into())
            }
        }
    }
}

impl TryFrom<VariantFixture> for NewVariant<'_> {
    type Error = FixtureError;

    fn try_from(fixture: VariantFixture) -> Result<Self, Self::Error> {
        let mut variant = NewVariant::new(
            VariationKey::from_entries(fixture.key),
            fixture.sku,
            parse_money(&fixture.price)?,
        )
        .with_quantity(fixture.quantity);

        if let Some(discount_price) = fixture.discount_price {
            variant = variant.with_discount_price(parse_money(&discount_price)?);
        }

        Ok(variant)
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::{Money, iso::USD};
    use testresult::TestResult;

    use crate::products::ProductKind;

    use super::*;

    #[test]
    fn simple_fixture_builds_product() -> TestResult {
        let yaml = r"
kind: simple
title: Desk Lamp
sku: LMP-1
price: 20.00 USD
discount_price: 18.00 USD
attributes:
  color: [White]
";

        let fixture: ProductFixture = serde_norway::from_str(yaml)?;
        let product = fixture.into_product("lamp")?;

        assert_eq!(product.kind(), ProductKind::Simple);
        assert_eq!(
            product.unit(None).map(|(_, price)| price),
            Some(Money::from_minor(1_800, USD))
        );

        Ok(())
    }

    #[test]
    fn variable_fixture_assigns_variant_images() -> TestResult {
        let yaml = r"
kind: variable
title: Chair
attributes: [color]
base_images: [front.jpg, side.jpg]
variants:
  - sku: CH-B
    key: { color: Black }
    price: 50.00 USD
    images: [1]
";

        let fixture: ProductFixture = serde_norway::from_str(yaml)?;
        let product = fixture.into_product("chair")?;
        let key = VariationKey::from_entries([("color", "Black")]);

        assert_eq!(
            product.display_image(Some(&key)),
            Some(&ImageRef::new("side.jpg"))
        );

        Ok(())
    }

    #[test]
    fn malformed_price_is_reported() -> TestResult {
        let yaml = r"
kind: simple
title: Desk Lamp
sku: LMP-1
price: 20.00USD
";

        let fixture: ProductFixture = serde_norway::from_str(yaml)?;

        assert!(matches!(
            fixture.into_product("lamp"),
            Err(FixtureError::InvalidPrice(_))
        ));

        Ok(())
    }
}
