//! Storefront
//!
//! Storefront models configurable products and their variations, reconciles
//! shopping cart line items, and turns carts into priced orders that move
//! through a forward-only status lifecycle.

pub mod attributes;
pub mod cart;
pub mod catalog;
pub mod fixtures;
pub mod money;
pub mod orders;
pub mod prelude;
pub mod products;
pub mod totals;
pub mod utils;
pub mod variations;
