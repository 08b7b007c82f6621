use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const USDT_CURRENCY_CODE: &str = "USDT";
pub const USDT_CURRENCY_CODE_LOWER: &str = "usdt";

/// USDT on TRC20 carries six decimal places. The ledger reports amounts as integer minor units.
pub const USDT_DECIMALS: u32 = 6;
const MINOR_UNITS_PER_USDT: i64 = 1_000_000;
/// Order matching and display both work at four fractional digits, i.e. steps of 100 minor units.
const MATCH_PRECISION_STEP: i64 = 100;

//--------------------------------------     UsdtAmount       ---------------------------------------------------------
/// A fixed-point USDT amount, stored as an integer number of minor units (10^-6 USDT).
///
/// All arithmetic and comparisons happen on the integer representation. The amount is never routed through a binary
/// float, so `1_500_000` minor units is exactly `1.5000` USDT and stays that way.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct UsdtAmount(i64);

op!(binary UsdtAmount, Add, add);
op!(binary UsdtAmount, Sub, sub);
op!(inplace UsdtAmount, SubAssign, sub_assign);
op!(unary UsdtAmount, Neg, neg);

impl Mul<i64> for UsdtAmount {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for UsdtAmount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in USDT minor units: {0}")]
pub struct UsdtConversionError(String);

impl From<i64> for UsdtAmount {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for UsdtAmount {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for UsdtAmount {}

impl TryFrom<u64> for UsdtAmount {
    type Error = UsdtConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(UsdtConversionError(format!("Value {value} is too large to convert to UsdtAmount")))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl FromStr for UsdtAmount {
    type Err = UsdtConversionError;

    /// Parses a ledger-native amount: a decimal integer string of minor units (e.g. `"1500000"` is 1.5 USDT).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let minor = s.trim().parse::<i64>().map_err(|e| UsdtConversionError(format!("{s}: {e}")))?;
        Ok(Self(minor))
    }
}

impl Display for UsdtAmount {
    /// Renders the amount with exactly four fractional digits, e.g. `1.5000`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let minor = self.rounded_4dp().0;
        let sign = if minor < 0 { "-" } else { "" };
        let abs = minor.saturating_abs();
        write!(f, "{sign}{}.{:04}", abs / MINOR_UNITS_PER_USDT, (abs % MINOR_UNITS_PER_USDT) / MATCH_PRECISION_STEP)
    }
}

impl UsdtAmount {
    pub fn value(&self) -> i64 {
        self.0
    }

    /// An amount of whole USDT.
    pub fn from_usdt(usdt: i64) -> Self {
        Self(usdt * MINOR_UNITS_PER_USDT)
    }

    /// Parses the integer minor-unit string the transfer-history API uses.
    pub fn from_minor_units(s: &str) -> Result<Self, UsdtConversionError> {
        s.parse()
    }

    /// Rounds half-up to four fractional digits. This is the canonical precision for order matching: a transfer
    /// amount and an order's requested amount are compared only after both pass through this rounding.
    pub fn rounded_4dp(&self) -> Self {
        let rem = self.0.rem_euclid(MATCH_PRECISION_STEP);
        let floor = self.0 - rem;
        if rem * 2 >= MATCH_PRECISION_STEP {
            Self(floor + MATCH_PRECISION_STEP)
        } else {
            Self(floor)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn minor_units_to_display() {
        let amount = UsdtAmount::from_minor_units("1500000").unwrap();
        assert_eq!(amount.to_string(), "1.5000");
        let amount = UsdtAmount::from_minor_units("10000000").unwrap();
        assert_eq!(amount.to_string(), "10.0000");
        let amount = UsdtAmount::from_minor_units("99990").unwrap();
        assert_eq!(amount.to_string(), "0.1000");
    }

    #[test]
    fn malformed_minor_units_are_rejected() {
        assert!(UsdtAmount::from_minor_units("1.5").is_err());
        assert!(UsdtAmount::from_minor_units("banana").is_err());
        assert!(UsdtAmount::from_minor_units("").is_err());
    }

    #[test]
    fn rounding_is_half_up_at_four_digits() {
        assert_eq!(UsdtAmount::from(123_449).rounded_4dp(), UsdtAmount::from(123_400));
        assert_eq!(UsdtAmount::from(123_450).rounded_4dp(), UsdtAmount::from(123_500));
        assert_eq!(UsdtAmount::from(123_456).rounded_4dp(), UsdtAmount::from(123_500));
        assert_eq!(UsdtAmount::from(1_500_000).rounded_4dp(), UsdtAmount::from(1_500_000));
    }

    #[test]
    fn matching_precision_is_stable_under_rounding() {
        // 9.99995 and 10.00000 USDT both round to the same match key.
        let a = UsdtAmount::from(9_999_950).rounded_4dp();
        let b = UsdtAmount::from_usdt(10).rounded_4dp();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "10.0000");
        // 9.9999 does not.
        let c = UsdtAmount::from(9_999_900).rounded_4dp();
        assert_ne!(b, c);
        assert_eq!(c.to_string(), "9.9999");
    }

    #[test]
    fn arithmetic() {
        let a = UsdtAmount::from_usdt(3);
        let b = UsdtAmount::from(500_000);
        assert_eq!(a + b, UsdtAmount::from(3_500_000));
        assert_eq!(a - b, UsdtAmount::from(2_500_000));
        assert_eq!(b * 4, UsdtAmount::from_usdt(2));
        assert_eq!(-b, UsdtAmount::from(-500_000));
        let total: UsdtAmount = [a, b, b].into_iter().sum();
        assert_eq!(total, UsdtAmount::from(4_000_000));
    }
}
