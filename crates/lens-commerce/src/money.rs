//! Prices in integer minor units.
//!
//! Provider prices arrive as floats; they are converted to cents before any
//! arithmetic so spreads and averages don't drift.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Currencies the shopping provider reports for the supported markets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Currency {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::CAD => "CAD",
            Currency::AUD => "AUD",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::USD => "$",
            Currency::EUR => "\u{20ac}",
            Currency::GBP => "\u{00a3}",
            Currency::CAD => "CA$",
            Currency::AUD => "A$",
        }
    }

    /// Currency of a provider market (`gl` country code). Unknown markets are USD.
    pub fn for_country(gl: &str) -> Self {
        match gl.trim().to_lowercase().as_str() {
            "gb" | "uk" => Currency::GBP,
            "ca" => Currency::CAD,
            "au" => Currency::AUD,
            "de" | "fr" | "es" | "it" | "nl" | "be" | "at" | "ie" | "pt" | "fi" => Currency::EUR,
            _ => Currency::USD,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A price in cents of one currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Money {
    pub amount_cents: i64,
    pub currency: Currency,
}

impl Money {
    pub fn new(amount_cents: i64, currency: Currency) -> Self {
        Self {
            amount_cents,
            currency,
        }
    }

    /// Round a provider float to the nearest cent.
    ///
    /// ```
    /// use lens_commerce::money::{Money, Currency};
    /// let price = Money::from_decimal(24.99, Currency::USD);
    /// assert_eq!(price.amount_cents, 2499);
    /// ```
    pub fn from_decimal(amount: f64, currency: Currency) -> Self {
        Self::new((amount * 100.0).round() as i64, currency)
    }

    pub fn zero(currency: Currency) -> Self {
        Self::new(0, currency)
    }

    pub fn is_zero(&self) -> bool {
        self.amount_cents == 0
    }

    pub fn is_positive(&self) -> bool {
        self.amount_cents > 0
    }

    /// Symbol and two decimals, e.g. "$24.99".
    pub fn display(&self) -> String {
        let sign = if self.amount_cents < 0 { "-" } else { "" };
        let cents = self.amount_cents.unsigned_abs();
        format!("{}{}{}.{:02}", sign, self.currency.symbol(), cents / 100, cents % 100)
    }

    /// `None` on currency mismatch or overflow.
    pub fn try_add(&self, other: &Money) -> Option<Money> {
        if self.currency != other.currency {
            return None;
        }
        self.amount_cents
            .checked_add(other.amount_cents)
            .map(|cents| Money::new(cents, self.currency))
    }

    /// `None` on currency mismatch or overflow.
    pub fn try_subtract(&self, other: &Money) -> Option<Money> {
        if self.currency != other.currency {
            return None;
        }
        self.amount_cents
            .checked_sub(other.amount_cents)
            .map(|cents| Money::new(cents, self.currency))
    }

    /// Divide by a count, rounding to the nearest cent.
    pub fn divide_rounded(&self, count: usize) -> Option<Money> {
        if count == 0 {
            return None;
        }
        let cents = (self.amount_cents as f64 / count as f64).round() as i64;
        Some(Money::new(cents, self.currency))
    }

    /// Sum in `currency`; `None` if any value is in another currency.
    pub fn try_sum<'a>(mut iter: impl Iterator<Item = &'a Money>, currency: Currency) -> Option<Money> {
        iter.try_fold(Money::zero(currency), |acc, m| acc.try_add(m))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_decimal_rounds_to_cents() {
        assert_eq!(Money::from_decimal(24.99, Currency::USD).amount_cents, 2499);
        assert_eq!(Money::from_decimal(0.005, Currency::USD).amount_cents, 1);
        assert_eq!(Money::from_decimal(129.999, Currency::USD).amount_cents, 13000);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::new(1495, Currency::USD).display(), "$14.95");
        assert_eq!(Money::new(5, Currency::GBP).display(), "\u{00a3}0.05");
        assert_eq!(Money::new(-250, Currency::USD).display(), "-$2.50");
        assert_eq!(format!("{}", Money::new(2999, Currency::AUD)), "A$29.99");
    }

    #[test]
    fn test_checked_arithmetic() {
        let a = Money::new(1000, Currency::USD);
        let b = Money::new(300, Currency::USD);
        assert_eq!(a.try_add(&b).map(|m| m.amount_cents), Some(1300));
        assert_eq!(a.try_subtract(&b).map(|m| m.amount_cents), Some(700));
        assert_eq!(a.try_add(&Money::new(1, Currency::EUR)), None);
        assert_eq!(Money::new(i64::MAX, Currency::USD).try_add(&b), None);
    }

    #[test]
    fn test_divide_rounded() {
        let m = Money::new(1000, Currency::USD);
        assert_eq!(m.divide_rounded(3).map(|m| m.amount_cents), Some(333));
        assert_eq!(m.divide_rounded(0), None);
    }

    #[test]
    fn test_try_sum() {
        let prices = [Money::new(100, Currency::USD), Money::new(250, Currency::USD)];
        assert_eq!(Money::try_sum(prices.iter(), Currency::USD).map(|m| m.amount_cents), Some(350));

        let mixed = [Money::new(100, Currency::USD), Money::new(100, Currency::EUR)];
        assert_eq!(Money::try_sum(mixed.iter(), Currency::USD), None);
    }

    #[test]
    fn test_currency_for_country() {
        assert_eq!(Currency::for_country("us"), Currency::USD);
        assert_eq!(Currency::for_country("GB"), Currency::GBP);
        assert_eq!(Currency::for_country("de"), Currency::EUR);
        assert_eq!(Currency::for_country("zz"), Currency::USD);
    }
}
