//! Orders
//!
//! An order freezes a reconciled cart into line snapshots and totals, then
//! moves forward through [`OrderStatus`].

use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::{
    cart::{Cart, CartError, LineItem},
    catalog::ProductSource,
    money::serde_money,
    products::{ImageRef, ProductId, ProductKind, Sku, string_id},
    totals::{DiscountEffect, OrderTotals, ShippingPolicy, TotalsError, compute_totals},
    variations::VariationKey,
};

pub mod checkout;
pub mod status;
mod summary;

pub use checkout::{Address, CheckoutDetails, PaymentMethod};
pub use status::OrderStatus;

string_id!(
    /// Order identifier
    OrderId
);

/// Errors raised while placing or progressing an order.
#[derive(Debug, Error, PartialEq)]
pub enum OrderError {
    /// Orders cannot be placed from an empty cart.
    #[error("cannot place an order from an empty cart")]
    EmptyCart,

    /// The status change is not allowed.
    #[error("order cannot move from {from} to {to}")]
    InvalidTransition {
        /// Current status
        from: OrderStatus,

        /// Requested status
        to: OrderStatus,
    },

    /// Only orders in a terminal status can be archived.
    #[error("order in status {0} cannot be archived")]
    NotArchivable(OrderStatus),

    /// A cart line refers to a product that no longer exists.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// A cart line refers to a variant that no longer exists.
    #[error("product {product} has no variant for {key}")]
    VariantUnavailable {
        /// Product of the line
        product: ProductId,

        /// Stable rendering of the line's key
        key: String,
    },

    /// Line totals could not be computed.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Order totals could not be computed.
    #[error(transparent)]
    Totals(#[from] TotalsError),

    /// Writing the summary failed.
    #[error("IO error")]
    Io,
}

/// Snapshot of one purchased unit, frozen at placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine<'a> {
    /// Product purchased
    pub product_id: ProductId,

    /// Product kind
    pub kind: ProductKind,

    /// Variation bought, for variable products
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<VariationKey>,

    /// Product title at placement
    pub title: String,

    /// SKU at placement
    pub sku: Sku,

    /// Image shown for the line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,

    /// Units bought
    pub quantity: u32,

    /// Unit price captured in the cart
    #[serde(with = "serde_money")]
    pub unit_price: Money<'a, Currency>,

    /// `unit_price × quantity`
    #[serde(with = "serde_money")]
    pub line_total: Money<'a, Currency>,
}

impl<'a> OrderLine<'a> {
    fn snapshot<S>(source: &S, item: &LineItem<'a>) -> Result<Self, OrderError>
    where
        S: ProductSource<'a> + ?Sized,
    {
        let product_id = item.product_id();

        let product = source
            .product(product_id)
            .ok_or_else(|| OrderError::ProductNotFound(product_id.clone()))?;

        let key = item.key().variation();

        let (sku, _) = product
            .unit(key)
            .ok_or_else(|| OrderError::VariantUnavailable {
                product: product_id.clone(),
                key: key.map(VariationKey::to_stable_string).unwrap_or_default(),
            })?;

        Ok(Self {
            product_id: product_id.clone(),
            kind: item.key().kind(),
            key: key.cloned(),
            title: product.title().to_string(),
            sku: sku.clone(),
            image: product.display_image(key).cloned(),
            quantity: item.quantity(),
            unit_price: item.unit_price(),
            line_total: item.line_total()?,
        })
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order<'a> {
    id: OrderId,
    status: OrderStatus,
    #[serde(with = "serde_money::currency")]
    currency: &'static Currency,
    lines: Vec<OrderLine<'a>>,
    totals: OrderTotals<'a>,
    checkout: CheckoutDetails,
    #[serde(default)]
    archived: bool,
}

impl<'a> Order<'a> {
    /// Place an order from a reconciled cart.
    ///
    /// Unit prices are the ones captured when lines were added; products are
    /// only consulted for titles, SKUs and images.
    ///
    /// # Errors
    ///
    /// - [`OrderError::EmptyCart`]: the cart has no lines.
    /// - [`OrderError::ProductNotFound`] / [`OrderError::VariantUnavailable`]:
    ///   a line no longer resolves against the catalog.
    /// - [`OrderError::Totals`]: totals could not be computed.
    #[instrument(skip_all, fields(order = %id))]
    pub fn place<S>(
        id: OrderId,
        cart: &Cart<'a>,
        source: &S,
        discount: &DiscountEffect<'_>,
        shipping: &ShippingPolicy<'_>,
        checkout: CheckoutDetails,
    ) -> Result<Self, OrderError>
    where
        S: ProductSource<'a> + ?Sized,
    {
        if cart.is_empty() {
            warn!("rejected empty cart");

            return Err(OrderError::EmptyCart);
        }

        let lines = cart
            .iter()
            .map(|item| OrderLine::snapshot(source, item))
            .collect::<Result<Vec<_>, _>>()?;

        let totals = compute_totals(cart.items(), cart.currency(), discount, shipping)?;

        debug!(
            lines = lines.len(),
            grand_total = %totals.grand_total,
            payment_method = %checkout.payment_method,
            "placed order"
        );

        Ok(Self {
            id,
            status: OrderStatus::PendingPayment,
            currency: cart.currency(),
            lines,
            totals,
            checkout,
            archived: false,
        })
    }

    /// Move to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::InvalidTransition`] when `next` is not strictly
    /// ahead of the current status, or the current status is terminal.
    #[instrument(skip(self), fields(order = %self.id, from = %self.status))]
    pub fn transition(&mut self, next: OrderStatus) -> Result<(), OrderError> {
        if !self.status.can_transition_to(next) {
            warn!(to = %next, "rejected status transition");

            return Err(OrderError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }

        debug!(to = %next, "order status changed");

        self.status = next;

        Ok(())
    }

    /// Cancel the order.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::InvalidTransition`] if the order is already
    /// completed or cancelled.
    pub fn cancel(&mut self) -> Result<(), OrderError> {
        self.transition(OrderStatus::Cancelled)
    }

    /// Hide a finished order from active listings.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::NotArchivable`] unless the order is completed or
    /// cancelled.
    pub fn archive(&mut self) -> Result<(), OrderError> {
        if !self.status.is_terminal() {
            return Err(OrderError::NotArchivable(self.status));
        }

        self.archived = true;

        Ok(())
    }

    /// Whether the order can still progress.
    pub fn is_open(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Whether any line refers to `product`.
    pub fn references_product(&self, product: &ProductId) -> bool {
        self.lines.iter().any(|line| &line.product_id == product)
    }

    /// Order id
    pub fn id(&self) -> &OrderId {
        &self.id
    }

    /// Current status
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Order currency
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Line snapshots in cart order
    pub fn lines(&self) -> &[OrderLine<'a>] {
        &self.lines
    }

    /// Totals
    pub fn totals(&self) -> &OrderTotals<'a> {
        &self.totals
    }

    /// Shipping, billing and payment details
    pub fn checkout(&self) -> &CheckoutDetails {
        &self.checkout
    }

    /// Whether the order has been archived
    pub fn is_archived(&self) -> bool {
        self.archived
    }
}
