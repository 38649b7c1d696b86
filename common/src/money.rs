//! [`Money`]-related definitions.

use std::{fmt, str::FromStr};

use rust_decimal::{Decimal, RoundingStrategy};

use crate::define_kind;

/// Fixed-point amount of money in some [`Currency`].
///
/// The amount always carries exactly [`Money::SCALE`] fractional digits.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Money {
    /// Amount of this [`Money`].
    amount: Decimal,

    /// [`Currency`] of this amount.
    currency: Currency,
}

impl Money {
    /// Number of fractional digits stored for every amount.
    pub const SCALE: u32 = 2;

    /// Total number of digits an amount may be stored with.
    pub const PRECISION: u32 = 14;

    /// Creates a new [`Money`] rounding the `amount` half-to-even to
    /// [`Money::SCALE`] fractional digits.
    #[must_use]
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        let mut amount = amount.round_dp_with_strategy(
            Self::SCALE,
            RoundingStrategy::MidpointNearestEven,
        );
        amount.rescale(Self::SCALE);
        Self { amount, currency }
    }

    /// Returns the amount of this [`Money`].
    #[must_use]
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns the [`Currency`] of this [`Money`].
    #[must_use]
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Indicates whether this [`Money`] is below zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    /// Indicates whether the amount of this [`Money`] fits into
    /// [`Money::PRECISION`] digits.
    #[must_use]
    pub fn fits_precision(&self) -> bool {
        let limit = Decimal::from(10_i64.pow(Self::PRECISION - Self::SCALE));
        self.amount.abs() < limit
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { amount, currency } = self;
        write!(f, "{amount}{currency}")
    }
}

impl FromStr for Money {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() < 4 || !s.is_char_boundary(s.len() - 3) {
            return Err("too short");
        }

        let (amount, currency) = s.split_at(s.len() - 3);
        let amount = Decimal::from_str(amount.trim_end())
            .map_err(|_| "invalid amount")?;
        let currency =
            Currency::from_str(currency).map_err(|_| "invalid currency")?;

        Ok(Self::new(amount, currency))
    }
}

define_kind! {
    #[doc = "Currency of a [`Money`] amount."]
    enum Currency {
        #[doc = "US Dollar."]
        Usd,

        #[doc = "Canadian Dollar."]
        Cad,

        #[doc = "Euro."]
        Eur,
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::{Currency, Money};

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn normalizes_scale() {
        let m = Money::new(decimal("9500"), Currency::Usd);
        assert_eq!(m.amount().scale(), 2);
        assert_eq!(m.to_string(), "9500.00USD");

        let m = Money::new(decimal("10.125"), Currency::Eur);
        assert_eq!(m.amount(), decimal("10.12"));

        let m = Money::new(decimal("10.135"), Currency::Eur);
        assert_eq!(m.amount(), decimal("10.14"));
    }

    #[test]
    fn detects_negative_amounts() {
        assert!(Money::new(decimal("-0.01"), Currency::Usd).is_negative());
        assert!(!Money::new(decimal("0"), Currency::Usd).is_negative());
        assert!(!Money::new(decimal("-0.001"), Currency::Usd).is_negative());
        assert!(!Money::new(decimal("1"), Currency::Usd).is_negative());
    }

    #[test]
    fn checks_precision() {
        let fits = |s| Money::new(decimal(s), Currency::Usd).fits_precision();

        assert!(fits("999999999999.99"));
        assert!(fits("-999999999999.99"));
        assert!(fits("0"));
        assert!(!fits("1000000000000"));
        assert!(!fits("999999999999.995"));
        assert!(!fits("10000000000000"));
    }

    #[test]
    fn from_str() {
        assert_eq!(
            Money::from_str("123.45USD").unwrap(),
            Money::new(decimal("123.45"), Currency::Usd),
        );
        assert_eq!(
            Money::from_str("123 CAD").unwrap(),
            Money::new(decimal("123"), Currency::Cad),
        );

        assert!(Money::from_str("123.45").is_err());
        assert!(Money::from_str("123.45Us").is_err());
        assert!(Money::from_str("123.45usd").is_err());
        assert!(Money::from_str("abcUSD").is_err());
    }
}
