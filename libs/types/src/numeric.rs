//! Non-negative decimal price type
//!
//! Uses rust_decimal for deterministic arithmetic (no floating-point
//! errors). Prices may be zero — a fully zero reading is rejected by
//! the producer's acceptance policy, not by the type.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::FeedError;

/// A non-negative price in the quote currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Create a price, rejecting negative values.
    pub fn new(value: Decimal) -> Result<Self, FeedError> {
        if value.is_sign_negative() {
            return Err(FeedError::NegativePrice(value.to_string()));
        }
        Ok(Self(value))
    }

    /// Create a price from a whole number.
    pub fn from_u64(value: u64) -> Self {
        Self(Decimal::from(value))
    }

    /// A zero price. Valid as a value; the acceptance policy decides
    /// whether a reading made of zeros carries information.
    pub const ZERO: Price = Price(Decimal::ZERO);

    /// Get the inner decimal.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Whether this price is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Lossy conversion for analysis code (regression fits).
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(f64::NAN)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = FeedError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl FromStr for Price {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s)
            .map_err(|e| FeedError::MalformedPayload(format!("invalid price '{}': {}", s, e)))?;
        Self::new(value)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
