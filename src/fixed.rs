//! Decimal-string encodings of on-chain fixed-point values.
//!
//! Token amounts are stored on chain with 18 decimals, while ratios and scores
//! use FixidityLib's 24 decimals. Both routinely exceed what an `f64` holds
//! exactly before scaling, so they are parsed into a big-integer mantissa and
//! only narrowed once scaled.

use log::warn;
use num_bigint::BigInt;
use std::fmt;
use std::str::FromStr;

pub const WEI_DECIMALS: u32 = 18;
pub const FIXIDITY_DECIMALS: u32 = 24;

// Anything further out than this is not a value the chain produces.
const MAX_EXPONENT: i64 = 4096;

#[derive(Debug, PartialEq, Eq)]
pub struct ParseDecimalError(String);

impl fmt::Display for ParseDecimalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid decimal string: {:?}", self.0)
    }
}

impl std::error::Error for ParseDecimalError {}

/// `mantissa * 10^-scale`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decimal {
    mantissa: BigInt,
    scale: u32,
}

impl Decimal {
    pub fn zero() -> Self {
        Self {
            mantissa: BigInt::from(0u8),
            scale: 0,
        }
    }

    /// Divides by `10^places` without losing precision.
    pub fn shift(mut self, places: u32) -> Self {
        self.scale += places;
        self
    }

    pub fn mul(&self, other: &Decimal) -> Decimal {
        Decimal {
            mantissa: &self.mantissa * &other.mantissa,
            scale: self.scale + other.scale,
        }
    }

    pub fn from_f64(value: f64) -> Result<Decimal, ParseDecimalError> {
        if !value.is_finite() {
            return Err(ParseDecimalError(value.to_string()));
        }
        format!("{:e}", value).parse()
    }

    /// Narrows to the nearest `f64`.
    pub fn to_f64(&self) -> f64 {
        format!("{}e-{}", self.mantissa, self.scale)
            .parse::<f64>()
            .unwrap_or(0.0)
    }
}

impl FromStr for Decimal {
    type Err = ParseDecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseDecimalError(s.to_string());
        let trimmed = s.trim();

        let (coefficient, exponent) = match trimmed.find(|c: char| c == 'e' || c == 'E') {
            Some(i) => {
                let exponent = trimmed[i + 1..].parse::<i64>().map_err(|_| err())?;
                (&trimmed[..i], exponent)
            }
            None => (trimmed, 0),
        };
        if exponent.abs() > MAX_EXPONENT {
            return Err(err());
        }

        let (negative, unsigned) = match coefficient.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, coefficient.strip_prefix('+').unwrap_or(coefficient)),
        };
        let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        let digits = format!("{}{}", int_part, frac_part);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }

        let mut mantissa = BigInt::from_str(&digits).map_err(|_| err())?;
        if negative {
            mantissa = -mantissa;
        }

        let scale = frac_part.len() as i64 - exponent;
        if scale < 0 {
            mantissa *= BigInt::from(10u8).pow(scale.unsigned_abs() as u32);
            return Ok(Decimal { mantissa, scale: 0 });
        }
        Ok(Decimal {
            mantissa,
            scale: scale as u32,
        })
    }
}

/// Parses `raw`, treating an empty or malformed string as zero.
pub fn parse_or_zero(raw: &str) -> Decimal {
    if raw.trim().is_empty() {
        return Decimal::zero();
    }
    match raw.parse() {
        Ok(d) => d,
        Err(e) => {
            warn!("{}, using 0", e);
            Decimal::zero()
        }
    }
}

/// Token amount with 18 decimals, in whole units.
pub fn from_wei(raw: &str) -> f64 {
    parse_or_zero(raw).shift(WEI_DECIMALS).to_f64()
}

/// Fixidity fraction with 24 decimals, kept at full precision.
pub fn from_fixidity_decimal(raw: &str) -> Decimal {
    parse_or_zero(raw).shift(FIXIDITY_DECIMALS)
}

/// Fixidity fraction with 24 decimals.
pub fn from_fixidity(raw: &str) -> f64 {
    from_fixidity_decimal(raw).to_f64()
}
