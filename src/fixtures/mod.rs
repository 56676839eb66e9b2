//! Fixtures
//!
//! YAML fixture sets: `attributes/<set>.yml`, `products/<set>.yml` and
//! `carts/<set>.yml` under a base directory.

use std::{
    fs,
    path::{Path, PathBuf},
};

use rusty_money::iso::Currency;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::{
    cart::{Cart, CartError, LineItem},
    catalog::{Catalog, CatalogError},
    fixtures::{attributes::AttributesFixture, carts::CartFixture, products::ProductsFixture},
    money::{PriceParseError, currency_for_code},
    orders::CheckoutDetails,
    products::{Product, ProductError, ProductId, VariantError},
    totals::{DiscountEffect, ShippingPolicy},
};

pub mod attributes;
pub mod carts;
pub mod products;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Invalid percentage format
    #[error("Invalid percentage format: {0}")]
    InvalidPercentage(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Currency mismatch between products, or between products and the cart
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// No cart script loaded
    #[error("No cart loaded")]
    NoCart,

    /// Invalid product definition
    #[error(transparent)]
    Product(#[from] ProductError),

    /// Invalid variant definition
    #[error(transparent)]
    Variant(#[from] VariantError),

    /// Catalog rejected an attribute or product
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Cart line could not be resolved or added
    #[error(transparent)]
    Cart(#[from] CartError),
}

impl From<PriceParseError> for FixtureError {
    fn from(error: PriceParseError) -> Self {
        match error {
            PriceParseError::InvalidPrice(raw) => FixtureError::InvalidPrice(raw),
            PriceParseError::InvalidPercentage(raw) => FixtureError::InvalidPercentage(raw),
            PriceParseError::UnknownCurrency(code) => FixtureError::UnknownCurrency(code),
            error @ PriceParseError::PercentConversion => {
                FixtureError::InvalidPercentage(error.to_string())
            }
        }
    }
}

/// A loaded fixture set
#[derive(Debug)]
pub struct Fixture<'a> {
    /// Base path for fixture files
    base_path: PathBuf,

    catalog: Catalog<'a>,

    /// Currency of the loaded products
    currency: Option<&'static Currency>,

    cart: Option<CartFixture>,
}

impl<'a> Fixture<'a> {
    /// Create a new empty fixture with default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            catalog: Catalog::new(),
            currency: None,
            cart: None,
        }
    }

    /// Load attributes from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or an attribute
    /// id repeats.
    pub fn load_attributes(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: AttributesFixture = self.read("attributes", name)?;

        for attribute in fixture.attributes {
            self.catalog.insert_attribute(attribute)?;
        }

        Ok(self)
    }

    /// Load products from a YAML fixture file. Attributes must be loaded
    /// first.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, a product is
    /// invalid, or products use different currencies.
    pub fn load_products(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: ProductsFixture = self.read("products", name)?;

        for (id, product_fixture) in fixture.products {
            let product = product_fixture.into_product(&id)?;

            for code in product_currencies(&product) {
                self.check_currency(currency_for_code(code)?)?;
            }

            self.catalog.insert_product(product)?;
        }

        debug!(set = name, products = self.catalog.len(), "loaded products");

        Ok(self)
    }

    /// Load a cart script from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or its currency
    /// differs from the products'.
    pub fn load_cart(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: CartFixture = self.read("carts", name)?;

        self.check_currency(currency_for_code(&fixture.currency)?)?;
        self.cart = Some(fixture);

        Ok(self)
    }

    /// Load a complete fixture set (attributes, products and cart with the
    /// same name)
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        Self::from_set_in("./fixtures", name)
    }

    /// Load a complete fixture set from `base_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set_in(base_path: impl Into<PathBuf>, name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::with_base_path(base_path);

        fixture
            .load_attributes(name)?
            .load_products(name)?
            .load_cart(name)?;

        Ok(fixture)
    }

    /// The catalog built from the fixture
    pub fn catalog(&self) -> &Catalog<'a> {
        &self.catalog
    }

    /// Mutable catalog access
    pub fn catalog_mut(&mut self) -> &mut Catalog<'a> {
        &mut self.catalog
    }

    /// Replay the cart script, reconciling lines as they are added.
    ///
    /// # Errors
    ///
    /// Returns an error if no cart is loaded or a line cannot be resolved.
    pub fn cart(&self) -> Result<Cart<'a>, FixtureError> {
        let script = self.cart.as_ref().ok_or(FixtureError::NoCart)?;
        let mut cart = Cart::new(currency_for_code(&script.currency)?);

        for line in &script.lines {
            let item = LineItem::resolve(
                &self.catalog,
                &ProductId::new(line.product.as_str()),
                line.selections
                    .iter()
                    .map(|(attribute, value)| (attribute.as_str(), value.as_str())),
                line.quantity,
            )?;

            cart.add_or_merge(item)?;
        }

        Ok(cart)
    }

    /// Discount from the cart script
    ///
    /// # Errors
    ///
    /// Returns an error if no cart is loaded or the discount is malformed.
    pub fn discount(&self) -> Result<DiscountEffect<'a>, FixtureError> {
        let script = self.cart.as_ref().ok_or(FixtureError::NoCart)?;

        carts::parse_discount(script.discount.as_deref())
    }

    /// Shipping policy from the cart script
    ///
    /// # Errors
    ///
    /// Returns an error if no cart is loaded or an amount is malformed.
    pub fn shipping(&self) -> Result<ShippingPolicy<'a>, FixtureError> {
        let script = self.cart.as_ref().ok_or(FixtureError::NoCart)?;

        script
            .shipping
            .as_ref()
            .map_or_else(|| Ok(ShippingPolicy::free()), carts::ShippingFixture::to_policy)
    }

    /// Checkout details from the cart script
    ///
    /// # Errors
    ///
    /// Returns an error if no cart is loaded.
    pub fn checkout(&self) -> Result<&CheckoutDetails, FixtureError> {
        self.cart
            .as_ref()
            .map(|script| &script.checkout)
            .ok_or(FixtureError::NoCart)
    }

    /// Currency of the loaded products, if any were loaded
    pub fn currency(&self) -> Option<&'static Currency> {
        self.currency
    }

    fn read<T: DeserializeOwned>(&self, category: &str, name: &str) -> Result<T, FixtureError> {
        let file_path = fixture_path(&self.base_path, category, name);
        let contents = fs::read_to_string(&file_path)?;

        Ok(serde_norway::from_str(&contents)?)
    }

    fn check_currency(&mut self, currency: &'static Currency) -> Result<(), FixtureError> {
        match self.currency {
            Some(existing) if existing != currency => Err(FixtureError::CurrencyMismatch(
                existing.iso_alpha_code.to_string(),
                currency.iso_alpha_code.to_string(),
            )),
            Some(_) => Ok(()),
            None => {
                self.currency = Some(currency);

                Ok(())
            }
        }
    }
}

impl Default for Fixture<'_> {
    fn default() -> Self {
        Self::new()
    }
}

fn fixture_path(base: &Path, category: &str, name: &str) -> PathBuf {
    base.join(category).join(format!("{name}.yml"))
}

/// ISO codes of every price on `product`.
fn product_currencies(product: &Product<'_>) -> Vec<&'static str> {
    match product {
        Product::Simple(simple) => vec![simple.price().currency().iso_alpha_code],
        Product::Variable(variable) => variable
            .variants()
            .iter()
            .map(|variant| variant.price().currency().iso_alpha_code)
            .collect(),
    }
}
