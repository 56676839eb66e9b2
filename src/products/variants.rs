//! Variants
//!
//! Concrete purchasable units of a variable product and the write payloads
//! used to create or patch them.

use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    attributes::AttributeError,
    money::serde_money,
    products::{ImageRef, PricingError, Sku, effective_price},
    variations::{VariationError, VariationKey},
};

/// Errors raised by variant writes. The product is left untouched whenever
/// one of these is returned.
#[derive(Debug, Error, PartialEq)]
pub enum VariantError {
    /// Another variant already has an equal variation key.
    #[error("variation {key} already exists as SKU {existing}")]
    DuplicateVariation {
        /// Stable rendering of the colliding key
        key: String,

        /// SKU of the variant that owns the key
        existing: Sku,
    },

    /// Another variant already uses this SKU.
    #[error("SKU {0} is already used by another variant")]
    DuplicateSku(Sku),

    /// The key does not bind exactly the product's declared attributes.
    #[error("variation key {key} for SKU {sku} does not match the product attributes")]
    MalformedKey {
        /// SKU being written
        sku: Sku,

        /// Stable rendering of the key
        key: String,
    },

    /// The key binds a value its attribute does not allow.
    #[error("SKU {sku} has an invalid variation: {source}")]
    DisallowedValue {
        /// SKU being written
        sku: Sku,

        /// Offending attribute and value
        source: VariationError,
    },

    /// A declared attribute is missing from the attribute catalog.
    #[error(transparent)]
    Attribute(#[from] AttributeError),

    /// No variant has this SKU.
    #[error("no variant with SKU {0}")]
    UnknownSku(Sku),

    /// The variant's prices are invalid.
    #[error("invalid pricing for SKU {sku}: {source}")]
    Pricing {
        /// SKU being written
        sku: Sku,

        /// Underlying pricing problem
        source: PricingError,
    },

    /// An image index points past the product's base images.
    #[error("image index {index} is out of bounds for {len} base images")]
    ImageIndexOutOfBounds {
        /// Requested index
        index: usize,

        /// Number of base images
        len: usize,
    },
}

/// One concrete purchasable unit of a variable product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantRecord<'a> {
    sku: Sku,
    key: VariationKey,
    #[serde(with = "serde_money")]
    price: Money<'a, Currency>,
    #[serde(with = "serde_money::option", default)]
    discount_price: Option<Money<'a, Currency>>,
    quantity: u32,
    #[serde(default)]
    images: Vec<ImageRef>,
}

impl<'a> VariantRecord<'a> {
    /// Stock keeping unit
    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    /// Variation key
    pub fn key(&self) -> &VariationKey {
        &self.key
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

    /// Whether at least `requested` units are in stock.
    pub fn in_stock(&self, requested: u32) -> bool {
        self.quantity >= requested
    }

    /// The variant's own images (may be empty; see
    /// [`crate::products::VariableProduct::resolve_images`]).
    pub fn images(&self) -> &[ImageRef] {
        &self.images
    }

    pub(crate) fn set_images(&mut self, images: Vec<ImageRef>) {
        self.images = images;
    }

    pub(crate) fn patched(&self, patch: VariantPatch<'a>) -> Self {
        let mut next = self.clone();

        if let Some(sku) = patch.sku {
            next.sku = sku;
        }

        if let Some(key) = patch.key {
            next.key = key;
        }

        if let Some(price) = patch.price {
            next.price = price;
        }

        if let Some(discount_price) = patch.discount_price {
            next.discount_price = discount_price;
        }

        if let Some(quantity) = patch.quantity {
            next.quantity = quantity;
        }

        if let Some(images) = patch.images {
            next.images = images;
        }

        next
    }
}

/// Payload for a variant that does not exist yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVariant<'a> {
    /// Variation key
    pub key: VariationKey,

    /// Stock keeping unit
    pub sku: Sku,

    /// Regular price
    pub price: Money<'a, Currency>,

    /// Optional discount price
    pub discount_price: Option<Money<'a, Currency>>,

    /// Units in stock
    pub quantity: u32,

    /// Variant images
    pub images: Vec<ImageRef>,
}

impl<'a> NewVariant<'a> {
    /// Create a payload with no discount, no stock and no images.
    pub fn new(key: VariationKey, sku: impl Into<Sku>, price: Money<'a, Currency>) -> Self {
        Self {
            key,
            sku: sku.into(),
            price,
            discount_price: None,
            quantity: 0,
            images: Vec::new(),
        }
    }

    /// Set the discount price.
    #[must_use]
    pub fn with_discount_price(mut self, discount_price: Money<'a, Currency>) -> Self {
        self.discount_price = Some(discount_price);
        self
    }

    /// Set the stock quantity.
    #[must_use]
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Set the variant images.
    #[must_use]
    pub fn with_images(mut self, images: impl IntoIterator<Item = ImageRef>) -> Self {
        self.images = images.into_iter().collect();
        self
    }
}

impl<'a> From<NewVariant<'a>> for VariantRecord<'a> {
    fn from(new: NewVariant<'a>) -> Self {
        Self {
            sku: new.sku,
            key: new.key,
            price: new.price,
            discount_price: new.discount_price,
            quantity: new.quantity,
            images: new.images,
        }
    }
}

/// Partial update of an existing variant. `None` leaves a field unchanged;
/// `discount_price: Some(None)` clears the discount.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariantPatch<'a> {
    /// Replacement SKU
    pub sku: Option<Sku>,

    /// Replacement variation key
    pub key: Option<VariationKey>,

    /// Replacement price
    pub price: Option<Money<'a, Currency>>,

    /// Replacement discount price (`Some(None)` clears it)
    pub discount_price: Option<Option<Money<'a, Currency>>>,

    /// Replacement stock quantity
    pub quantity: Option<u32>,

    /// Replacement images
    pub images: Option<Vec<ImageRef>>,
}

/// A variant write: either a new variant or a patch of an existing one.
/// Both go through the same validation.
#[derive(Debug, Clone, PartialEq)]
pub enum VariantWrite<'a> {
    /// Create a variant
    New(NewVariant<'a>),

    /// Patch the variant currently keyed by `sku`
    Patch {
        /// SKU of the variant to patch
        sku: Sku,

        /// Fields to change
        patch: VariantPatch<'a>,
    },
}

impl VariantWrite<'_> {
    /// SKU the write targets.
    pub fn sku(&self) -> &Sku {
        match self {
            VariantWrite::New(new) => &new.sku,
            VariantWrite::Patch { sku, .. } => sku,
        }
    }
}
