//! Money
//!
//! Parsing, currency lookup and serialisation helpers for [`Money`] values.
//! Amounts are always held in minor units.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{
    Money,
    iso::{AUD, CAD, Currency, EUR, GBP, JPY, USD},
};
use thiserror::Error;

/// Errors raised while reading prices, percentages or currency codes.
#[derive(Debug, Error, PartialEq)]
pub enum PriceParseError {
    /// The price string was not in `AMOUNT CURRENCY` form.
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// The percentage string could not be read.
    #[error("Invalid percentage format: {0}")]
    InvalidPercentage(String),

    /// The currency code is not supported.
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// A percentage could not be applied to an amount without overflow.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,
}

/// Look up a supported ISO 4217 currency by its alphabetic code.
///
/// # Errors
///
/// Returns [`PriceParseError::UnknownCurrency`] for unsupported codes.
pub fn currency_for_code(code: &str) -> Result<&'static Currency, PriceParseError> {
    match code {
        "GBP" => Ok(GBP),
        "USD" => Ok(USD),
        "EUR" => Ok(EUR),
        "JPY" => Ok(JPY),
        "CAD" => Ok(CAD),
        "AUD" => Ok(AUD),
        other => Err(PriceParseError::UnknownCurrency(other.to_string())),
    }
}

/// Parse price string (e.g., "2.99 GBP") into minor units and currency
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY",
/// if the amount cannot be parsed as a decimal, or if the currency code
/// is not recognized.
pub fn parse_price(s: &str) -> Result<(i64, &'static Currency), PriceParseError> {
    let parts: Vec<&str> = s.split_whitespace().collect();

    let [amount, code] = parts.as_slice() else {
        return Err(PriceParseError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let amount = amount
        .parse::<Decimal>()
        .map_err(|_err| PriceParseError::InvalidPrice(s.to_string()))?;

    let currency = currency_for_code(code)?;

    let scale = Decimal::from_u32(10_u32.pow(currency.exponent))
        .ok_or_else(|| PriceParseError::InvalidPrice(s.to_string()))?;

    let minor_units = amount
        .checked_mul(scale)
        .and_then(|value| value.round_dp(0).to_i64())
        .ok_or_else(|| PriceParseError::InvalidPrice(s.to_string()))?;

    Ok((minor_units, currency))
}

/// Parse a price string straight into [`Money`].
///
/// # Errors
///
/// See [`parse_price`].
pub fn parse_money(s: &str) -> Result<Money<'static, Currency>, PriceParseError> {
    let (minor, currency) = parse_price(s)?;

    Ok(Money::from_minor(minor, currency))
}

/// Parse percentage string (e.g., "15%" or "0.15") into a `Percentage`
///
/// Accepts two formats:
/// - Percentage format: "15%" for 15%
/// - Decimal format: "0.15" for 15%
///
/// # Errors
///
/// Returns an error if the string cannot be parsed.
pub fn parse_percentage(s: &str) -> Result<Percentage, PriceParseError> {
    let trimmed = s.trim();

    if let Some(percent_str) = trimmed.strip_suffix('%') {
        let value = percent_str
            .trim()
            .parse::<f64>()
            .map_err(|_err| PriceParseError::InvalidPercentage(s.to_string()))?;

        Ok(Percentage::from(value / 100.0))
    } else {
        let value = trimmed
            .parse::<f64>()
            .map_err(|_err| PriceParseError::InvalidPercentage(s.to_string()))?;

        Ok(Percentage::from(value))
    }
}

/// Apply a percentage to a minor unit amount, rounding half away from zero.
///
/// # Errors
///
/// Returns [`PriceParseError::PercentConversion`] if the result cannot be
/// represented in minor units.
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, PriceParseError> {
    let minor = Decimal::from_i64(minor).ok_or(PriceParseError::PercentConversion)?;

    ((*percent) * Decimal::ONE)
        .checked_mul(minor)
        .ok_or(PriceParseError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(PriceParseError::PercentConversion)
}

/// Serde adapter storing [`Money`] as `{ amount, currency }` in minor units.
pub mod serde_money {
    use rusty_money::{Money, iso::Currency};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::currency_for_code;

    #[derive(Serialize, Deserialize)]
    struct MoneyRecord {
        amount: i64,
        currency: String,
    }

    impl From<&Money<'_, Currency>> for MoneyRecord {
        fn from(money: &Money<'_, Currency>) -> Self {
            Self {
                amount: money.to_minor_units(),
                currency: money.currency().iso_alpha_code.to_string(),
            }
        }
    }

    fn into_money<'a, E: serde::de::Error>(
        record: MoneyRecord,
    ) -> Result<Money<'a, Currency>, E> {
        let currency = currency_for_code(&record.currency).map_err(E::custom)?;

        Ok(Money::from_minor(record.amount, currency))
    }

    /// Serialize a [`Money`] value.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(
        money: &Money<'_, Currency>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        MoneyRecord::from(money).serialize(serializer)
    }

    /// Deserialize a [`Money`] value.
    ///
    /// # Errors
    ///
    /// Fails on malformed records or unsupported currency codes.
    pub fn deserialize<'de, 'a, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Money<'a, Currency>, D::Error> {
        into_money(MoneyRecord::deserialize(deserializer)?)
    }

    /// Adapter for `Option<Money>` fields.
    pub mod option {
        use super::{Currency, Deserialize, Deserializer, Money, MoneyRecord, Serialize, Serializer};

        /// Serialize an optional [`Money`] value.
        ///
        /// # Errors
        ///
        /// Propagates serializer errors.
        #[expect(clippy::ref_option, reason = "signature required by serde `with`")]
        pub fn serialize<S: Serializer>(
            money: &Option<Money<'_, Currency>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            money.as_ref().map(MoneyRecord::from).serialize(serializer)
        }

        /// Deserialize an optional [`Money`] value.
        ///
        /// # Errors
        ///
        /// Fails on malformed records or unsupported currency codes.
        pub fn deserialize<'de, 'a, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Money<'a, Currency>>, D::Error> {
            Option::<MoneyRecord>::deserialize(deserializer)?
                .map(super::into_money)
                .transpose()
        }
    }

    /// Adapter for bare `&'static Currency` fields, stored as the ISO code.
    pub mod currency {
        use super::{Currency, Deserialize, Deserializer, Serializer, currency_for_code};

        /// Serialize a currency as its ISO code.
        ///
        /// # Errors
        ///
        /// Propagates serializer errors.
        pub fn serialize<S: Serializer>(
            currency: &&'static Currency,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(currency.iso_alpha_code)
        }

        /// Deserialize a currency from its ISO code.
        ///
        /// # Errors
        ///
        /// Fails on unsupported currency codes.
        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<&'static Currency, D::Error> {
            let code = String::deserialize(deserializer)?;

            currency_for_code(&code).map_err(serde::de::Error::custom)
        }
    }
}
