//! Storefront prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    attributes::{Attribute, AttributeCatalog, AttributeError, AttributeId},
    cart::{Cart, CartError, LineItem, LineKey},
    catalog::{Catalog, CatalogError, ProductSource},
    orders::{
        Address, CheckoutDetails, Order, OrderError, OrderId, OrderLine, OrderStatus,
        PaymentMethod,
    },
    products::{
        NewVariant, Product, ProductError, ProductId, ProductKind, ProductStatus, SelectionError,
        SimpleProduct, Sku, VariableProduct, VariantError, VariantRecord,
    },
    totals::{DiscountEffect, OrderTotals, ShippingPolicy, TotalsError, compute_totals},
    variations::{VariationError, VariationKey},
};
