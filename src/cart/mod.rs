//! Cart
//!
//! Reconciles cart line items by identity rather than position. Adding a line
//! whose [`LineKey`] is already present merges quantities into the existing
//! line; every failed operation leaves the cart exactly as it was.

use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{
    money::serde_money,
    products::{ProductId, SelectionError},
};

pub mod lines;

pub use lines::{LineItem, LineKey};

/// Errors raised by cart operations.
#[derive(Debug, Error, PartialEq)]
pub enum CartError {
    /// A line's unit price is in a different currency from the cart.
    #[error("line has currency {actual}, but cart has currency {expected}")]
    CurrencyMismatch {
        /// Cart currency
        expected: &'static str,

        /// Line currency
        actual: &'static str,
    },

    /// No line has the given key.
    #[error("no cart line for {0}")]
    LineNotFound(String),

    /// Quantities must be at least one; use `remove` to drop a line.
    #[error("quantity must be at least 1, got {0}")]
    InvalidQuantity(u32),

    /// The product does not exist.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// A variable product has no variant for the selected key.
    #[error("product {product} has no variant for {key}")]
    VariantUnavailable {
        /// Product selected
        product: ProductId,

        /// Stable rendering of the selected key
        key: String,
    },

    /// A stored variable product line has no variation key.
    #[error("line for variable product {0} has no variation key")]
    MissingVariation(ProductId),

    /// The selections do not form a valid key.
    #[error(transparent)]
    Selection(#[from] SelectionError),

    /// An amount does not fit in minor units.
    #[error("amount overflowed")]
    AmountOverflow,
}

/// A customer's cart.
///
/// Lines keep insertion order. A lookup index keyed by
/// [`LineKey::stable_key`] makes merges O(1) on average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CartRecord<'a>", into = "CartRecord<'a>")]
pub struct Cart<'a> {
    currency: &'static Currency,
    items: Vec<LineItem<'a>>,
    index: FxHashMap<String, usize>,
}

impl<'a> Cart<'a> {
    /// Create an empty cart priced in `currency`.
    #[must_use]
    pub fn new(currency: &'static Currency) -> Self {
        Cart {
            currency,
            items: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    /// Add a line, merging it into an existing line with an equal key.
    ///
    /// A merge sums the quantities (saturating) and keeps the position of
    /// the existing line; the unit price becomes the incoming line's price.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::CurrencyMismatch`] if the line is priced in
    /// another currency.
    pub fn add_or_merge(&mut self, item: LineItem<'a>) -> Result<&LineItem<'a>, CartError> {
        let actual = item.unit_price().currency();

        if actual != self.currency {
            return Err(CartError::CurrencyMismatch {
                expected: self.currency.iso_alpha_code,
                actual: actual.iso_alpha_code,
            });
        }

        let stable = item.key().stable_key();

        let position = if let Some(&position) = self.index.get(&stable) {
            let existing = self.line_at(position)?;
            let before = existing.quantity();

            existing.merge(item);

            debug!(
                key = %stable,
                before,
                after = existing.quantity(),
                "merged cart line"
            );

            position
        } else {
            let position = self.items.len();

            debug!(key = %stable, quantity = item.quantity(), "appended cart line");

            self.items.push(item);
            self.index.insert(stable, position);

            position
        };

        self.items
            .get(position)
            .ok_or_else(|| CartError::LineNotFound(position.to_string()))
    }

    /// Set a line's quantity.
    ///
    /// # Errors
    ///
    /// - [`CartError::InvalidQuantity`]: `quantity` is zero.
    /// - [`CartError::LineNotFound`]: no line has `key`.
    pub fn set_quantity(&mut self, key: &LineKey, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }

        let line = self.find_mut(key)?;

        debug!(
            key = %key,
            before = line.quantity(),
            after = quantity,
            "set cart line quantity"
        );

        line.set_quantity(quantity);

        Ok(())
    }

    /// Remove a line. Removing an absent line is a no-op.
    ///
    /// Returns the removed line, if there was one.
    pub fn remove(&mut self, key: &LineKey) -> Option<LineItem<'a>> {
        let position = self.index.remove(&key.stable_key())?;

        if position >= self.items.len() {
            return None;
        }

        let removed = self.items.remove(position);

        for slot in self.index.values_mut() {
            if *slot > position {
                *slot -= 1;
            }
        }

        debug!(key = %key, quantity = removed.quantity(), "removed cart line");

        Some(removed)
    }

    /// Add one unit to a line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if no line has `key`.
    pub fn increment(&mut self, key: &LineKey) -> Result<u32, CartError> {
        let line = self.find_mut(key)?;
        let quantity = line.quantity().saturating_add(1);

        line.set_quantity(quantity);

        debug!(key = %key, quantity, "incremented cart line");

        Ok(quantity)
    }

    /// Remove one unit from a line, never going below one.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if no line has `key`.
    pub fn decrement(&mut self, key: &LineKey) -> Result<u32, CartError> {
        let line = self.find_mut(key)?;
        let quantity = line.quantity().saturating_sub(1).max(1);

        line.set_quantity(quantity);

        debug!(key = %key, quantity, "decremented cart line");

        Ok(quantity)
    }

    /// Get the line with `key`.
    pub fn get(&self, key: &LineKey) -> Option<&LineItem<'a>> {
        self.index
            .get(&key.stable_key())
            .and_then(|&position| self.items.get(position))
    }

    /// Iterate over the lines in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &LineItem<'a>> {
        self.items.iter()
    }

    /// The lines in insertion order.
    pub fn items(&self) -> &[LineItem<'a>] {
        &self.items
    }

    /// Number of lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of quantities across all lines.
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity())).sum()
    }

    /// Cart currency
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// `Σ unit_price × quantity` over all lines.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::AmountOverflow`] if the sum does not fit in minor
    /// units.
    pub fn subtotal(&self) -> Result<Money<'a, Currency>, CartError> {
        subtotal(&self.items, self.currency)
    }

    /// Drop every line.
    pub fn clear(&mut self) {
        debug!(lines = self.items.len(), "cleared cart");

        self.items.clear();
        self.index.clear();
    }

    /// Serialise the cart for client-side storage.
    ///
    /// # Errors
    ///
    /// Propagates [`serde_json`] errors.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Restore a stored cart. Duplicate lines are merged on the way in.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON, zero quantities, variable lines without keys
    /// or lines in another currency.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    fn find_mut(&mut self, key: &LineKey) -> Result<&mut LineItem<'a>, CartError> {
        let position = *self
            .index
            .get(&key.stable_key())
            .ok_or_else(|| CartError::LineNotFound(key.to_string()))?;

        self.line_at(position)
    }

    fn line_at(&mut self, position: usize) -> Result<&mut LineItem<'a>, CartError> {
        self.items
            .get_mut(position)
            .ok_or_else(|| CartError::LineNotFound(position.to_string()))
    }
}

/// `Σ unit_price × quantity` over `items`, zero in `currency` when empty.
///
/// # Errors
///
/// - [`CartError::CurrencyMismatch`]: a line is in another currency.
/// - [`CartError::AmountOverflow`]: the sum does not fit in minor units.
pub fn subtotal<'a>(
    items: &[LineItem<'a>],
    currency: &'static Currency,
) -> Result<Money<'a, Currency>, CartError> {
    let minor = items.iter().try_fold(0_i64, |acc, item| {
        let line = item.line_total()?;

        if line.currency() != currency {
            return Err(CartError::CurrencyMismatch {
                expected: currency.iso_alpha_code,
                actual: line.currency().iso_alpha_code,
            });
        }

        acc.checked_add(line.to_minor_units())
            .ok_or(CartError::AmountOverflow)
    })?;

    Ok(Money::from_minor(minor, currency))
}

#[derive(Clone, Serialize, Deserialize)]
struct CartRecord<'a> {
    #[serde(with = "serde_money::currency")]
    currency: &'static Currency,
    #[serde(default)]
    items: Vec<LineItem<'a>>,
}

impl<'a> From<Cart<'a>> for CartRecord<'a> {
    fn from(cart: Cart<'a>) -> Self {
        Self {
            currency: cart.currency,
            items: cart.items,
        }
    }
}

impl<'a> TryFrom<CartRecord<'a>> for Cart<'a> {
    type Error = CartError;

    fn try_from(record: CartRecord<'a>) -> Result<Self, Self::Error> {
        let mut cart = Cart::new(record.currency);

        for item in record.items {
            cart.add_or_merge(item)?;
        }

        Ok(cart)
    }
}
