//! Simple Products

use std::collections::{BTreeMap, BTreeSet};

use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};

use crate::{
    attributes::AttributeId,
    money::serde_money,
    products::{
        CategoryId, ImageRef, ProductId, ProductStatus, Sku, check_pricing, effective_price,
        variable::ProductError,
    },
};

/// Simple product
///
/// A single purchasable SKU. Its attributes are informational only; a cart
/// line for a simple product is identified by the product id alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SimpleProductRecord<'a>")]
pub struct SimpleProduct<'a> {
    id: ProductId,
    title: String,
    description: String,
    sku: Sku,
    #[serde(with = "serde_money")]
    price: Money<'a, Currency>,
    #[serde(with = "serde_money::option")]
    discount_price: Option<Money<'a, Currency>>,
    quantity: u32,
    attributes: BTreeMap<AttributeId, BTreeSet<String>>,
    categories: BTreeSet<CategoryId>,
    images: Vec<ImageRef>,
    is_featured: bool,
    status: ProductStatus,
}

impl<'a> SimpleProduct<'a> {
    /// Create a simple product with no stock.
    ///
    /// # Errors
    ///
    /// Returns [`ProductError::Pricing`] if the price is negative.
    pub fn new(
        id: impl Into<ProductId>,
        title: impl Into<String>,
        sku: impl Into<Sku>,
        price: Money<'a, Currency>,
    ) -> Result<Self, ProductError> {
        check_pricing(&price, None)?;

        Ok(Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            sku: sku.into(),
            price,
            discount_price: None,
            quantity: 0,
            attributes: BTreeMap::new(),
            categories: BTreeSet::new(),
            images: Vec::new(),
            is_featured: false,
            status: ProductStatus::Draft,
        })
    }

    /// Set the discount price.
    ///
    /// # Errors
    ///
    /// Returns [`ProductError::Pricing`] if the discount is negative, above
    /// the price, or in another currency.
    pub fn with_discount_price(
        mut self,
        discount_price: Money<'a, Currency>,
    ) -> Result<Self, ProductError> {
        check_pricing(&self.price, Some(&discount_price))?;

        self.discount_price = Some(discount_price);

        Ok(self)
    }

    /// Set the stock quantity.
    #[must_use]
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Record an informational attribute and the values it is offered in.
    #[must_use]
    pub fn with_attribute<V: Into<String>>(
        mut self,
        attribute: impl Into<AttributeId>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.attributes
            .entry(attribute.into())
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    /// Set the images.
    #[must_use]
    pub fn with_images(mut self, images: impl IntoIterator<Item = ImageRef>) -> Self {
        self.images = images.into_iter().collect();
        self
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

    /// Stock keeping unit
    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    /// Regular price
    pub fn price(&self) -> Money<'a, Currency> {
        self.price
    }

    /// Discount price, if any
    pub fn discount_price(&self) -> Option<Money<'a, Currency>> {
        self.discount_price
    }

    /// Price the customer pays
    pub fn effective_price(&self) -> Money<'a, Currency> {
        effective_price(self.price, self.discount_price)
    }

    /// Units in stock
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Informational attributes
    pub fn attributes(&self) -> &BTreeMap<AttributeId, BTreeSet<String>> {
        &self.attributes
    }

    /// Category ids
    pub fn categories(&self) -> &BTreeSet<CategoryId> {
        &self.categories
    }

    /// Images
    pub fn images(&self) -> &[ImageRef] {
        &self.images
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
}

#[derive(Deserialize)]
struct SimpleProductRecord<'a> {
    id: ProductId,
    title: String,
    #[serde(default)]
    description: String,
    sku: Sku,
    #[serde(with = "serde_money")]
    price: Money<'a, Currency>,
    #[serde(with = "serde_money::option", default)]
    discount_price: Option<Money<'a, Currency>>,
    #[serde(default)]
    quantity: u32,
    #[serde(default)]
    attributes: BTreeMap<AttributeId, BTreeSet<String>>,
    #[serde(default)]
    categories: BTreeSet<CategoryId>,
    #[serde(default)]
    images: Vec<ImageRef>,
    #[serde(default)]
    is_featured: bool,
    #[serde(default)]
    status: ProductStatus,
}

impl<'a> TryFrom<SimpleProductRecord<'a>> for SimpleProduct<'a> {
    type Error = ProductError;

    fn try_from(record: SimpleProductRecord<'a>) -> Result<Self, Self::Error> {
        check_pricing(&record.price, record.discount_price.as_ref())?;

        Ok(Self {
            id: record.id,
            title: record.title,
            description: record.description,
            sku: record.sku,
            price: record.price,
            discount_price: record.discount_price,
            quantity: record.quantity,
            attributes: record.attributes,
            categories: record.categories,
            images: record.images,
            is_featured: record.is_featured,
            status: record.status,
        })
    }
}
