//! Cart Fixtures

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::{
    fixtures::FixtureError,
    money::{parse_money, parse_percentage},
    orders::CheckoutDetails,
    totals::{DiscountEffect, ShippingPolicy},
};

/// A scripted shopping session: selections added in order, plus the
/// discount, shipping and checkout inputs for placing the order.
#[derive(Debug, Deserialize)]
pub struct CartFixture {
    /// Cart currency code
    pub currency: String,

    /// Selections, added to the cart in order
    pub lines: Vec<CartLineFixture>,

    /// Discount: `"10%"`, `"0.1"` or an amount like `"5.00 USD"`
    #[serde(default)]
    pub discount: Option<String>,

    /// Shipping policy
    #[serde(default)]
    pub shipping: Option<ShippingFixture>,

    /// Checkout details
    pub checkout: CheckoutDetails,
}

/// One add-to-cart action
#[derive(Debug, Deserialize)]
pub struct CartLineFixture {
    /// Product id
    pub product: String,

    /// Attribute id -> chosen value (ignored for simple products)
    #[serde(default)]
    pub selections: BTreeMap<String, String>,

    /// Units to add
    pub quantity: u32,
}

/// Shipping policy fixture
#[derive(Debug, Deserialize)]
pub struct ShippingFixture {
    /// Flat fee (e.g., "10.00 USD"); omitted means free shipping
    #[serde(default)]
    pub flat_fee: Option<String>,

    /// Subtotal at which shipping becomes free
    #[serde(default)]
    pub free_over: Option<String>,
}

/// Parse a discount string. Amounts carry a currency code; anything else is
/// read as a percentage.
///
/// # Errors
///
/// Returns an error if the string is neither a valid amount nor a valid
/// percentage.
pub fn parse_discount<'a>(discount: Option<&str>) -> Result<DiscountEffect<'a>, FixtureError> {
    let Some(raw) = discount.map(str::trim) else {
        return Ok(DiscountEffect::None);
    };

    if raw.chars().any(char::is_alphabetic) {
        Ok(DiscountEffect::Fixed(parse_money(raw)?))
    } else {
        Ok(DiscountEffect::Percentage(parse_percentage(raw)?))
    }
}

impl ShippingFixture {
    /// Build the shipping policy.
    ///
    /// # Errors
    ///
    /// Returns an error if an amount cannot be parsed.
    pub fn to_policy<'a>(&self) -> Result<ShippingPolicy<'a>, FixtureError> {
        let mut policy = match &self.flat_fee {
            Some(fee) => ShippingPolicy::flat(parse_money(fee)?),
            None => ShippingPolicy::free(),
        };

        if let Some(threshold) = &self.free_over {
            policy = policy.with_free_threshold(parse_money(threshold)?);
        }

        Ok(policy)
    }
}
