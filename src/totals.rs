//! Totals
//!
//! Pure order total calculation: subtotal, discount, shipping and grand total.

use decimal_percentage::Percentage;
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    cart::{CartError, LineItem, subtotal},
    money::{PriceParseError, percent_of_minor, serde_money},
};

/// Errors raised while computing totals.
#[derive(Debug, Error, PartialEq)]
pub enum TotalsError {
    /// A fixed discount or shipping amount is in another currency.
    #[error("{field} has currency {actual}, but the order is in {expected}")]
    CurrencyMismatch {
        /// Which input was mismatched
        field: &'static str,

        /// Order currency
        expected: &'static str,

        /// Input currency
        actual: &'static str,
    },

    /// An amount does not fit in minor units.
    #[error("amount overflowed")]
    AmountOverflow,

    /// Summing the lines failed.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Applying a percentage failed.
    #[error(transparent)]
    Percent(#[from] PriceParseError),
}

/// Discount supplied by the pricing collaborator.
#[derive(Debug, Clone, Copy, Default)]
pub enum DiscountEffect<'a> {
    /// No discount
    #[default]
    None,

    /// Percentage of the subtotal, e.g. 10% off
    Percentage(Percentage),

    /// Fixed amount off the subtotal, never more than the subtotal
    Fixed(Money<'a, Currency>),
}

/// Shipping charge policy.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShippingPolicy<'a> {
    flat_fee: Option<Money<'a, Currency>>,
    free_shipping_threshold: Option<Money<'a, Currency>>,
}

impl<'a> ShippingPolicy<'a> {
    /// Charge `fee` on every non-empty order.
    pub fn flat(fee: Money<'a, Currency>) -> Self {
        Self {
            flat_fee: Some(fee),
            free_shipping_threshold: None,
        }
    }

    /// Never charge for shipping.
    pub fn free() -> Self {
        Self::default()
    }

    /// Waive the fee once the subtotal reaches `threshold`.
    #[must_use]
    pub fn with_free_threshold(mut self, threshold: Money<'a, Currency>) -> Self {
        self.free_shipping_threshold = Some(threshold);
        self
    }

    /// Flat fee, if shipping is ever charged
    pub fn flat_fee(&self) -> Option<Money<'a, Currency>> {
        self.flat_fee
    }

    /// Subtotal at which shipping becomes free
    pub fn free_shipping_threshold(&self) -> Option<Money<'a, Currency>> {
        self.free_shipping_threshold
    }
}

/// Order totals. `grand_total = subtotal - discount + shipping`, never below
/// zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderTotals<'a> {
    /// `Σ unit_price × quantity`
    #[serde(with = "serde_money")]
    pub subtotal: Money<'a, Currency>,

    /// Amount taken off the subtotal
    #[serde(with = "serde_money")]
    pub discount: Money<'a, Currency>,

    /// Shipping charge
    #[serde(with = "serde_money")]
    pub shipping: Money<'a, Currency>,

    /// Amount payable
    #[serde(with = "serde_money")]
    pub grand_total: Money<'a, Currency>,
}

/// Compute totals for `items` priced in `currency`.
///
/// The discount is clamped to `[0, subtotal]`. Shipping is free when the
/// subtotal is zero or reaches the policy's threshold.
///
/// # Errors
///
/// - [`TotalsError::CurrencyMismatch`]: a fixed discount or shipping amount
///   is in another currency.
/// - [`TotalsError::Cart`]: a line is in another currency or the subtotal
///   overflows.
/// - [`TotalsError::Percent`]: the percentage cannot be applied.
/// - [`TotalsError::AmountOverflow`]: the grand total overflows.
pub fn compute_totals<'a>(
    items: &[LineItem<'a>],
    currency: &'static Currency,
    discount: &DiscountEffect<'_>,
    shipping: &ShippingPolicy<'_>,
) -> Result<OrderTotals<'a>, TotalsError> {
    let subtotal = subtotal(items, currency)?.to_minor_units();

    let discount = match discount {
        DiscountEffect::None => 0,
        DiscountEffect::Percentage(percent) => percent_of_minor(percent, subtotal)?,
        DiscountEffect::Fixed(amount) => minor_in(amount, currency, "discount")?,
    }
    .clamp(0, subtotal.max(0));

    let free_threshold = shipping
        .free_shipping_threshold
        .map(|threshold| minor_in(&threshold, currency, "free shipping threshold"))
        .transpose()?;

    let shipping = match shipping.flat_fee {
        Some(_) if subtotal == 0 => 0,
        Some(_) if free_threshold.is_some_and(|threshold| subtotal >= threshold) => 0,
        Some(fee) => minor_in(&fee, currency, "shipping fee")?.max(0),
        None => 0,
    };

    let grand_total = subtotal
        .checked_sub(discount)
        .and_then(|net| net.checked_add(shipping))
        .ok_or(TotalsError::AmountOverflow)?
        .max(0);

    Ok(OrderTotals {
        subtotal: Money::from_minor(subtotal, currency),
        discount: Money::from_minor(discount, currency),
        shipping: Money::from_minor(shipping, currency),
        grand_total: Money::from_minor(grand_total, currency),
    })
}

fn minor_in(
    amount: &Money<'_, Currency>,
    currency: &'static Currency,
    field: &'static str,
) -> Result<i64, TotalsError> {
    if amount.currency() == currency {
        Ok(amount.to_minor_units())
    } else {
        Err(TotalsError::CurrencyMismatch {
            field,
            expected: currency.iso_alpha_code,
            actual: amount.currency().iso_alpha_code,
        })
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{GBP, USD};
    use testresult::TestResult;

    use crate::{cart::LineKey, products::ProductId, variations::VariationKey};

    use super::*;

    fn lines<'a>(prices: &[(i64, u32)]) -> Result<Vec<LineItem<'a>>, CartError> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &(minor, quantity))| {
                LineItem::new(
                    LineKey::Simple(ProductId::new(format!("p{i}"))),
                    quantity,
                    Money::from_minor(minor, USD),
                )
            })
            .collect()
    }

    #[test]
    fn percentage_discount_with_flat_shipping() -> TestResult {
        let items = [LineItem::new(
            LineKey::Variable(
                ProductId::new("chair"),
                VariationKey::from_entries([("color", "Black"), ("size", "S")]),
            ),
            3,
            Money::from_minor(5_000, USD),
        )?];

        let totals = compute_totals(
            &items,
            USD,
            &DiscountEffect::Percentage(Percentage::from(0.1)),
            &ShippingPolicy::flat(Money::from_minor(1_000, USD)),
        )?;

        assert_eq!(totals.subtotal, Money::from_minor(15_000, USD));
        assert_eq!(totals.discount, Money::from_minor(1_500, USD));
        assert_eq!(totals.shipping, Money::from_minor(1_000, USD));
        assert_eq!(totals.grand_total, Money::from_minor(14_500, USD));

        Ok(())
    }

    #[test]
    fn fixed_discount_never_exceeds_subtotal() -> TestResult {
        let items = lines(&[(400, 1)])?;

        let totals = compute_totals(
            &items,
            USD,
            &DiscountEffect::Fixed(Money::from_minor(1_000, USD)),
            &ShippingPolicy::free(),
        )?;

        assert_eq!(totals.discount, Money::from_minor(400, USD));
        assert_eq!(totals.grand_total, Money::from_minor(0, USD));

        Ok(())
    }

    #[test]
    fn empty_order_ships_free() -> TestResult {
        let totals = compute_totals(
            &[],
            USD,
            &DiscountEffect::None,
            &ShippingPolicy::flat(Money::from_minor(1_000, USD)),
        )?;

        assert_eq!(totals.shipping, Money::from_minor(0, USD));
        assert_eq!(totals.grand_total, Money::from_minor(0, USD));

        Ok(())
    }

    #[test]
    fn threshold_waives_shipping() -> TestResult {
        let policy = ShippingPolicy::flat(Money::from_minor(1_000, USD))
            .with_free_threshold(Money::from_minor(5_000, USD));

        let below = compute_totals(&lines(&[(4_999, 1)])?, USD, &DiscountEffect::None, &policy)?;
        let at = compute_totals(&lines(&[(2_500, 2)])?, USD, &DiscountEffect::None, &policy)?;

        assert_eq!(below.shipping, Money::from_minor(1_000, USD));
        assert_eq!(at.shipping, Money::from_minor(0, USD));

        Ok(())
    }

    #[test]
    fn compute_totals_is_pure() -> TestResult {
        let items = lines(&[(1_999, 2), (350, 3)])?;
        let discount = DiscountEffect::Percentage(Percentage::from(0.15));
        let shipping = ShippingPolicy::flat(Money::from_minor(499, USD));

        let first = compute_totals(&items, USD, &discount, &shipping)?;
        let second = compute_totals(&items, USD, &discount, &shipping)?;

        assert_eq!(first, second);
        assert!(first.grand_total.to_minor_units() >= 0);

        Ok(())
    }

    #[test]
    fn foreign_currency_discount_is_rejected() -> TestResult {
        let result = compute_totals(
            &lines(&[(1_000, 1)])?,
            USD,
            &DiscountEffect::Fixed(Money::from_minor(100, GBP)),
            &ShippingPolicy::free(),
        );

        assert_eq!(
            result,
            Err(TotalsError::CurrencyMismatch {
                field: "discount",
                expected: "USD",
                actual: "GBP",
            })
        );

        Ok(())
    }

    #[test]
    fn totals_serialize_amounts_as_records() -> TestResult {
        let totals = compute_totals(
            &lines(&[(250, 2)])?,
            USD,
            &DiscountEffect::None,
            &ShippingPolicy::free(),
        )?;

        let json = serde_json::to_value(totals)?;

        assert_eq!(
            json.get("grand_total"),
            Some(&serde_json::json!({ "amount": 500, "currency": "USD" }))
        );

        Ok(())
    }
}
