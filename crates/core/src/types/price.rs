//! Type-safe money types using decimal arithmetic.
//!
//! Prices are stored in the currency's standard unit (e.g. `19.99`), never as
//! floating point. Discounts are whole percentages.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Amount formatted with exactly two decimal places, as payment
    /// providers expect (`"12.50"`).
    #[must_use]
    pub fn amount_string(&self) -> String {
        format!("{:.2}", self.amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} {}", self.amount, self.currency_code)
    }
}

/// Errors that can occur when parsing a [`CurrencyCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CurrencyCodeError {
    /// The code is not three ASCII letters.
    #[error("currency code must be three ASCII letters, got {0:?}")]
    Invalid(String),
}

/// ISO 4217 currency code (`USD`, `EUR`, `BYN`, ...).
///
/// Stored upper-case. Any three-letter code is accepted; whether the payment
/// provider supports it is the provider's decision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parse a currency code, normalizing to upper case.
    ///
    /// # Errors
    ///
    /// Returns `CurrencyCodeError::Invalid` unless the input is exactly three
    /// ASCII letters.
    pub fn parse(s: &str) -> Result<Self, CurrencyCodeError> {
        let trimmed = s.trim();
        if trimmed.len() != 3 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CurrencyCodeError::Invalid(s.to_owned()));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self("USD".to_owned())
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = CurrencyCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

/// Errors that can occur when constructing a [`Discount`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DiscountError {
    /// Percentage outside `0..=100`.
    #[error("discount must be between 0 and 100 percent, got {0}")]
    OutOfRange(i64),
}

/// A whole-percent discount in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Discount(u8);

impl Discount {
    /// No discount.
    pub const NONE: Self = Self(0);

    /// Create a discount from a percentage.
    ///
    /// # Errors
    ///
    /// Returns `DiscountError::OutOfRange` for values above 100 or below 0.
    pub fn new(percent: i64) -> Result<Self, DiscountError> {
        u8::try_from(percent)
            .ok()
            .filter(|p| *p <= 100)
            .map(Self)
            .ok_or(DiscountError::OutOfRange(percent))
    }

    /// The percentage as an integer.
    #[must_use]
    pub const fn percent(self) -> u8 {
        self.0
    }

    /// Multiplier applied to a price: `(100 - percent) / 100`.
    #[must_use]
    pub fn factor(self) -> Decimal {
        Decimal::from(100 - u32::from(self.0)) / Decimal::ONE_HUNDRED
    }
}

impl TryFrom<i64> for Discount {
    type Error = DiscountError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Discount> for i64 {
    fn from(discount: Discount) -> Self {
        Self::from(discount.0)
    }
}

impl fmt::Display for Discount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

// SQLx support (with postgres feature): stored as INTEGER with a CHECK constraint.
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Discount {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i32 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i32 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Discount {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let percent = <i32 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(i64::from(percent))?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Discount {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i32 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&i32::from(self.0), buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_discount_range() {
        assert_eq!(Discount::new(0).unwrap(), Discount::NONE);
        assert_eq!(Discount::new(100).unwrap().percent(), 100);
        assert_eq!(Discount::new(101), Err(DiscountError::OutOfRange(101)));
        assert_eq!(Discount::new(-1), Err(DiscountError::OutOfRange(-1)));
    }

    #[test]
    fn test_discount_factor() {
        assert_eq!(
            Discount::new(20).unwrap().factor(),
            Decimal::from_str("0.8").unwrap()
        );
        assert_eq!(Discount::NONE.factor(), Decimal::ONE);
        assert_eq!(Discount::new(100).unwrap().factor(), Decimal::ZERO);
    }

    #[test]
    fn test_discount_serde_rejects_out_of_range() {
        assert!(serde_json::from_str::<Discount>("150").is_err());
        let parsed: Discount = serde_json::from_str("15").unwrap();
        assert_eq!(parsed.percent(), 15);
    }

    #[test]
    fn test_currency_code_parse() {
        assert_eq!(CurrencyCode::parse("byn").unwrap().as_str(), "BYN");
        assert!(CurrencyCode::parse("US").is_err());
        assert!(CurrencyCode::parse("U$D").is_err());
    }

    #[test]
    fn test_price_amount_string_has_two_decimals() {
        let price = Price::new(Decimal::from(180), CurrencyCode::default());
        assert_eq!(price.amount_string(), "180.00");
        assert_eq!(price.to_string(), "180.00 USD");
    }
}
