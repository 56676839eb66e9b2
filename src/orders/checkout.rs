//! Checkout details
//!
//! Shipping and billing information handed over by the checkout
//! collaborator. The addresses are stored as given.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    /// Cash on delivery
    Cod,

    /// Card payment through the payment provider
    CardPayment,

    /// Manual bank transfer
    BankTransfer,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cod => "cod",
            Self::CardPayment => "card-payment",
            Self::BankTransfer => "bank-transfer",
        })
    }
}

/// Postal address
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Recipient name
    pub name: String,

    /// First address line
    pub line1: String,

    /// Second address line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,

    /// City or town
    pub city: String,

    /// State, province or county
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Postal code
    pub postal_code: String,

    /// Country code
    pub country: String,

    /// Contact phone number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Everything checkout supplies besides the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutDetails {
    /// Where to ship
    pub shipping_info: Address,

    /// Who pays; defaults to the shipping address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_info: Option<Address>,

    /// Payment method tag
    pub payment_method: PaymentMethod,
}

impl CheckoutDetails {
    /// Ship and bill to the same address.
    pub fn new(shipping_info: Address, payment_method: PaymentMethod) -> Self {
        Self {
            shipping_info,
            billing_info: None,
            payment_method,
        }
    }

    /// Bill to a separate address.
    #[must_use]
    pub fn with_billing(mut self, billing_info: Address) -> Self {
        self.billing_info = Some(billing_info);
        self
    }

    /// The billing address, falling back to the shipping address.
    pub fn billing_address(&self) -> &Address {
        self.billing_info.as_ref().unwrap_or(&self.shipping_info)
    }
}
