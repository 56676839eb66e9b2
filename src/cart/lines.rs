//! Line Items

use std::fmt;

use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};

use crate::{
    attributes::AttributeId,
    cart::CartError,
    catalog::ProductSource,
    money::serde_money,
    products::{Product, ProductId, ProductKind},
    variations::VariationKey,
};

/// Identity of a cart line.
///
/// Simple products are identified by product id alone. Variable products
/// also carry the variation key, compared by mapping equality so the order
/// attributes were selected in never matters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LineKey {
    /// Line for a simple product
    Simple(ProductId),

    /// Line for one variant of a variable product
    Variable(ProductId, VariationKey),
}

impl LineKey {
    /// Product the line refers to
    pub fn product_id(&self) -> &ProductId {
        match self {
            LineKey::Simple(id) | LineKey::Variable(id, _) => id,
        }
    }

    /// Kind of product the line refers to
    pub fn kind(&self) -> ProductKind {
        match self {
            LineKey::Simple(_) => ProductKind::Simple,
            LineKey::Variable(..) => ProductKind::Variable,
        }
    }

    /// Variation key, for variable product lines
    pub fn variation(&self) -> Option<&VariationKey> {
        match self {
            LineKey::Simple(_) => None,
            LineKey::Variable(_, key) => Some(key),
        }
    }

    /// Canonical string used to index lines.
    ///
    /// The product id is length-prefixed so ids containing separators cannot
    /// collide with a neighbouring variation key.
    pub fn stable_key(&self) -> String {
        let id = self.product_id().as_str();

        match self {
            LineKey::Simple(_) => format!("simple:{}:{id}", id.len()),
            LineKey::Variable(_, key) => {
                format!("variable:{}:{id}:{}", id.len(), key.to_stable_string())
            }
        }
    }
}

impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineKey::Simple(id) => write!(f, "{id}"),
            LineKey::Variable(id, key) => write!(f, "{id} [{key}]"),
        }
    }
}

/// A cart entry: one product (and variation) at a captured unit price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LineItemRecord<'a>", into = "LineItemRecord<'a>")]
pub struct LineItem<'a> {
    key: LineKey,
    quantity: u32,
    unit_price: Money<'a, Currency>,
}

impl<'a> LineItem<'a> {
    /// Create a line item.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] if `quantity` is zero.
    pub fn new(
        key: LineKey,
        quantity: u32,
        unit_price: Money<'a, Currency>,
    ) -> Result<Self, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }

        Ok(Self {
            key,
            quantity,
            unit_price,
        })
    }

    /// Build a line from a customer selection, capturing the current
    /// effective price of the chosen unit.
    ///
    /// Simple products ignore `selections`. Variable products turn them into
    /// a [`VariationKey`] against their declared attributes and require a
    /// variant with that key.
    ///
    /// # Errors
    ///
    /// - [`CartError::InvalidQuantity`]: `quantity` is zero.
    /// - [`CartError::ProductNotFound`]: the source has no such product.
    /// - [`CartError::Selection`]: the selections do not form a valid key.
    /// - [`CartError::VariantUnavailable`]: no variant has the selected key.
    pub fn resolve<S, K, V>(
        source: &S,
        product_id: &ProductId,
        selections: impl IntoIterator<Item = (K, V)>,
        quantity: u32,
    ) -> Result<Self, CartError>
    where
        S: ProductSource<'a> + ?Sized,
        K: Into<AttributeId>,
        V: Into<String>,
    {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }

        let product = source
            .product(product_id)
            .ok_or_else(|| CartError::ProductNotFound(product_id.clone()))?;

        let key = match product {
            Product::Simple(_) => LineKey::Simple(product_id.clone()),
            Product::Variable(variable) => LineKey::Variable(
                product_id.clone(),
                variable.key_for(source.attributes(), selections)?,
            ),
        };

        let Some((_, unit_price)) = product.unit(key.variation()) else {
            return Err(CartError::VariantUnavailable {
                product: product_id.clone(),
                key: key
                    .variation()
                    .map(VariationKey::to_stable_string)
                    .unwrap_or_default(),
            });
        };

        Self::new(key, quantity, unit_price)
    }

    /// Line identity
    pub fn key(&self) -> &LineKey {
        &self.key
    }

    /// Product the line refers to
    pub fn product_id(&self) -> &ProductId {
        self.key.product_id()
    }

    /// Number of units, always at least one
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Unit price captured when the line was added
    pub fn unit_price(&self) -> Money<'a, Currency> {
        self.unit_price
    }

    /// `unit_price × quantity`
    ///
    /// # Errors
    ///
    /// Returns [`CartError::AmountOverflow`] if the product does not fit in
    /// minor units.
    pub fn line_total(&self) -> Result<Money<'a, Currency>, CartError> {
        let minor = self
            .unit_price
            .to_minor_units()
            .checked_mul(i64::from(self.quantity))
            .ok_or(CartError::AmountOverflow)?;

        Ok(Money::from_minor(minor, self.unit_price.currency()))
    }

    pub(crate) fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
    }

    pub(crate) fn merge(&mut self, incoming: LineItem<'a>) {
        self.quantity = self.quantity.saturating_add(incoming.quantity);
        self.unit_price = incoming.unit_price;
    }
}

#[derive(Clone, Serialize, Deserialize)]
struct LineItemRecord<'a> {
    product_id: ProductId,
    kind: ProductKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key: Option<VariationKey>,
    quantity: u32,
    #[serde(with = "serde_money")]
    unit_price: Money<'a, Currency>,
}

impl<'a> From<LineItem<'a>> for LineItemRecord<'a> {
    fn from(item: LineItem<'a>) -> Self {
        let kind = item.key.kind();

        let (product_id, key) = match item.key {
            LineKey::Simple(id) => (id, None),
            LineKey::Variable(id, key) => (id, Some(key)),
        };

        Self {
            product_id,
            kind,
            key,
            quantity: item.quantity,
            unit_price: item.unit_price,
        }
    }
}

impl<'a> TryFrom<LineItemRecord<'a>> for LineItem<'a> {
    type Error = CartError;

    fn try_from(record: LineItemRecord<'a>) -> Result<Self, Self::Error> {
        let key = match (record.kind, record.key) {
            (ProductKind::Simple, _) => LineKey::Simple(record.product_id),
            (ProductKind::Variable, Some(key)) => LineKey::Variable(record.product_id, key),
            (ProductKind::Variable, None) => {
                return Err(CartError::MissingVariation(record.product_id));
            }
        };

        Self::new(key, record.quantity, record.unit_price)
    }
}
