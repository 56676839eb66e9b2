//! Products
//!
//! Simple products are a single purchasable SKU. Variable products explode
//! into [`variants::VariantRecord`]s, one per [`VariationKey`].

use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    attributes::{AttributeError, AttributeId},
    variations::{VariationError, VariationKey},
};

pub mod simple;
pub mod variable;
pub mod variants;

pub use simple::SimpleProduct;
pub use variable::{ProductError, VariableProduct};
pub use variants::{NewVariant, VariantError, VariantPatch, VariantRecord, VariantWrite};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash,
            ::serde::Serialize, ::serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw identifier.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

pub(crate) use string_id;

string_id!(
    /// Product identifier
    ProductId
);

string_id!(
    /// Category identifier
    CategoryId
);

string_id!(
    /// Stock keeping unit, unique within a product
    Sku
);

string_id!(
    /// Reference to a stored image (path or URL)
    ImageRef
);

/// Publication status of a product.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    /// Not yet visible to customers
    #[default]
    Draft,

    /// Listed and purchasable
    Public,

    /// Reachable by direct link only
    Private,
}

/// Shape of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    /// A flat SKU without purchasable combinations
    Simple,

    /// A base product with one variant per attribute combination
    Variable,
}

/// Errors in a price / discount price pair.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// The price is below zero.
    #[error("price {0} is negative")]
    NegativePrice(i64),

    /// The discount price is below zero.
    #[error("discount price {0} is negative")]
    NegativeDiscountPrice(i64),

    /// The discount price exceeds the regular price.
    #[error("discount price {discount} exceeds price {price}")]
    DiscountAbovePrice {
        /// Regular price in minor units
        price: i64,

        /// Discount price in minor units
        discount: i64,
    },

    /// The two prices, or a price and its product, use different currencies.
    #[error("currency {actual} does not match {expected}")]
    CurrencyMismatch {
        /// Currency already in use
        expected: &'static str,

        /// Currency offered
        actual: &'static str,
    },
}

/// Check that `price ≥ 0` and, when present, `0 ≤ discount ≤ price` in the
/// same currency.
///
/// # Errors
///
/// Returns the first [`PricingError`] found.
pub fn check_pricing(
    price: &Money<'_, Currency>,
    discount: Option<&Money<'_, Currency>>,
) -> Result<(), PricingError> {
    if price.to_minor_units() < 0 {
        return Err(PricingError::NegativePrice(price.to_minor_units()));
    }

    let Some(discount) = discount else {
        return Ok(());
    };

    if discount.currency() != price.currency() {
        return Err(PricingError::CurrencyMismatch {
            expected: price.currency().iso_alpha_code,
            actual: discount.currency().iso_alpha_code,
        });
    }

    if discount.to_minor_units() < 0 {
        return Err(PricingError::NegativeDiscountPrice(
            discount.to_minor_units(),
        ));
    }

    if discount.to_minor_units() > price.to_minor_units() {
        return Err(PricingError::DiscountAbovePrice {
            price: price.to_minor_units(),
            discount: discount.to_minor_units(),
        });
    }

    Ok(())
}

/// The price a customer pays: the discount price if present, else the price.
pub fn effective_price<'a>(
    price: Money<'a, Currency>,
    discount: Option<Money<'a, Currency>>,
) -> Money<'a, Currency> {
    discount.unwrap_or(price)
}

/// Errors turning raw attribute selections into a key for a product.
#[derive(Debug, Error, PartialEq)]
pub enum SelectionError {
    /// A declared attribute is missing from the catalog.
    #[error(transparent)]
    Attribute(#[from] AttributeError),

    /// The selections do not form a valid key.
    #[error(transparent)]
    Variation(#[from] VariationError),
}

/// Any product in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Product<'a> {
    /// Single-SKU product
    Simple(SimpleProduct<'a>),

    /// Product with variants
    Variable(VariableProduct<'a>),
}

impl<'a> Product<'a> {
    /// Product id
    pub fn id(&self) -> &ProductId {
        match self {
            Product::Simple(product) => product.id(),
            Product::Variable(product) => product.id(),
        }
    }

    /// Product kind
    pub fn kind(&self) -> ProductKind {
        match self {
            Product::Simple(_) => ProductKind::Simple,
            Product::Variable(_) => ProductKind::Variable,
        }
    }

    /// Product title
    pub fn title(&self) -> &str {
        match self {
            Product::Simple(product) => product.title(),
            Product::Variable(product) => product.title(),
        }
    }

    /// Publication status
    pub fn status(&self) -> ProductStatus {
        match self {
            Product::Simple(product) => product.status(),
            Product::Variable(product) => product.status(),
        }
    }

    /// Change the publication status (soft destroy / restore).
    pub fn set_status(&mut self, status: ProductStatus) {
        match self {
            Product::Simple(product) => product.set_status(status),
            Product::Variable(product) => product.set_status(status),
        }
    }

    /// The SKU and effective unit price for a purchasable unit of this
    /// product. Simple products ignore `key`; variable products need the key
    /// of an existing variant.
    pub fn unit(&self, key: Option<&VariationKey>) -> Option<(&Sku, Money<'a, Currency>)> {
        match (self, key) {
            (Product::Simple(product), _) => Some((product.sku(), product.effective_price())),
            (Product::Variable(product), Some(key)) => product
                .variant_for_key(key)
                .map(|variant| (variant.sku(), variant.effective_price())),
            (Product::Variable(_), None) => None,
        }
    }

    /// The first image to show for a purchasable unit, if any.
    pub fn display_image(&self, key: Option<&VariationKey>) -> Option<&ImageRef> {
        match (self, key) {
            (Product::Simple(product), _) => product.images().first(),
            (Product::Variable(product), Some(key)) => product
                .variant_for_key(key)
                .and_then(|variant| product.resolve_images(variant).first()),
            (Product::Variable(product), None) => product.base_images().first(),
        }
    }

    /// Whether a variant or the simple product itself is keyed by `sku`.
    pub fn has_sku(&self, sku: &Sku) -> bool {
        match self {
            Product::Simple(product) => product.sku() == sku,
            Product::Variable(product) => product.variant_by_sku(sku).is_some(),
        }
    }

    /// Attribute ids the product declares (empty for simple products, whose
    /// attributes are informational).
    pub fn declared_attributes(&self) -> &[AttributeId] {
        match self {
            Product::Simple(_) => &[],
            Product::Variable(product) => product.attributes(),
        }
    }
}

impl<'a> From<SimpleProduct<'a>> for Product<'a> {
    fn from(product: SimpleProduct<'a>) -> Self {
        Product::Simple(product)
    }
}

impl<'a> From<VariableProduct<'a>> for Product<'a> {
    fn from(product: VariableProduct<'a>) -> Self {
        Product::Variable(product)
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{GBP, USD};

    use super::*;

    #[test]
    fn check_pricing_accepts_valid_pairs() {
        let price = Money::from_minor(5_000, USD);
        let discount = Money::from_minor(4_500, USD);

        assert_eq!(check_pricing(&price, None), Ok(()));
        assert_eq!(check_pricing(&price, Some(&discount)), Ok(()));
        assert_eq!(check_pricing(&price, Some(&price)), Ok(()));
    }

    #[test]
    fn check_pricing_rejects_negative_price() {
        let price = Money::from_minor(-1, USD);

        assert_eq!(
            check_pricing(&price, None),
            Err(PricingError::NegativePrice(-1))
        );
    }

    #[test]
    fn check_pricing_rejects_discount_above_price() {
        let price = Money::from_minor(5_000, USD);
        let discount = Money::from_minor(5_001, USD);

        assert_eq!(
            check_pricing(&price, Some(&discount)),
            Err(PricingError::DiscountAbovePrice {
                price: 5_000,
                discount: 5_001,
            })
        );
    }

    #[test]
    fn check_pricing_rejects_mixed_currencies() {
        let price = Money::from_minor(5_000, USD);
        let discount = Money::from_minor(100, GBP);

        assert!(matches!(
            check_pricing(&price, Some(&discount)),
            Err(PricingError::CurrencyMismatch { .. })
        ));
    }

    #[test]
    fn effective_price_prefers_discount() {
        let price = Money::from_minor(5_000, USD);
        let discount = Money::from_minor(4_000, USD);

        assert_eq!(effective_price(price, Some(discount)), discount);
        assert_eq!(effective_price(price, None), price);
    }

    #[test]
    fn status_and_kind_serialize_as_snake_case() -> testresult::TestResult {
        assert_eq!(serde_json::to_string(&ProductStatus::Public)?, "\"public\"");
        assert_eq!(serde_json::to_string(&ProductKind::Variable)?, "\"variable\"");

        Ok(())
    }
}
