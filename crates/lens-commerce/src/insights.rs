//! Price insights over a result set.

use crate::money::{Currency, Money};
use crate::offer::ShoppingResult;
use serde::{Deserialize, Serialize};

/// Upper bound for [`PriceInsights::resale_score`].
pub const MAX_RESALE_SCORE: u32 = 100;

/// Spread and value analysis across the priced offers of a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceInsights {
    pub lowest: Money,
    pub highest: Money,
    pub average: Money,
    /// `highest - lowest`.
    pub spread: Money,
    /// Spread relative to the lowest price, as a percentage capped at 100.
    pub resale_score: u32,
    /// Number of priced offers considered.
    pub offer_count: usize,
    /// Position of the cheapest offer.
    pub best_value_position: u32,
}

impl PriceInsights {
    /// Compute insights in USD. Returns `None` when no offer has a price.
    pub fn from_results(results: &[ShoppingResult]) -> Option<Self> {
        Self::from_results_in(results, Currency::USD)
    }

    /// Compute insights in the given currency.
    pub fn from_results_in(results: &[ShoppingResult], currency: Currency) -> Option<Self> {
        let priced: Vec<(&ShoppingResult, Money)> = results
            .iter()
            .filter(|r| r.has_price())
            .map(|r| (r, r.money(currency)))
            .collect();

        let (best, lowest) = priced
            .iter()
            .min_by_key(|(r, m)| (m.amount_cents, r.position))
            .map(|(r, m)| (*r, *m))?;
        let highest = priced.iter().map(|(_, m)| *m).max_by_key(|m| m.amount_cents)?;

        let total = Money::try_sum(priced.iter().map(|(_, m)| m), currency)?;
        let average = total.divide_rounded(priced.len())?;
        let spread = highest.try_subtract(&lowest)?;

        Some(Self {
            lowest,
            highest,
            average,
            spread,
            resale_score: resale_score(spread, lowest),
            offer_count: priced.len(),
            best_value_position: best.position,
        })
    }

    /// Savings from buying the cheapest offer instead of the average one.
    pub fn savings_vs_average(&self) -> Money {
        self.average
            .try_subtract(&self.lowest)
            .unwrap_or_else(|| Money::zero(self.lowest.currency))
    }
}

fn resale_score(spread: Money, lowest: Money) -> u32 {
    if !lowest.is_positive() {
        return 0;
    }
    let pct = (spread.amount_cents as f64 / lowest.amount_cents as f64 * 100.0).round();
    (pct.max(0.0) as u32).min(MAX_RESALE_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offer::tests::offer;

    #[test]
    fn test_insights_basic() {
        let results = vec![offer(1, "A", 24.99), offer(2, "B", 34.99), offer(3, "C", 19.99)];
        let insights = PriceInsights::from_results(&results).unwrap();

        assert_eq!(insights.lowest.display(), "$19.99");
        assert_eq!(insights.highest.display(), "$34.99");
        assert_eq!(insights.average.amount_cents, 2666);
        assert_eq!(insights.spread.amount_cents, 1500);
        assert_eq!(insights.best_value_position, 3);
        assert_eq!(insights.offer_count, 3);
        // 15.00 / 19.99 = 75%
        assert_eq!(insights.resale_score, 75);
    }

    #[test]
    fn test_resale_score_capped() {
        let results = vec![offer(1, "A", 10.0), offer(2, "B", 149.99)];
        let insights = PriceInsights::from_results(&results).unwrap();
        assert_eq!(insights.resale_score, MAX_RESALE_SCORE);
    }

    #[test]
    fn test_unpriced_offers_ignored() {
        let results = vec![offer(1, "A", 0.0), offer(2, "B", 5.0)];
        let insights = PriceInsights::from_results(&results).unwrap();
        assert_eq!(insights.offer_count, 1);
        assert_eq!(insights.resale_score, 0);
        assert!(insights.spread.is_zero());
    }

    #[test]
    fn test_no_priced_offers() {
        assert!(PriceInsights::from_results(&[]).is_none());
        assert!(PriceInsights::from_results(&[offer(1, "A", 0.0)]).is_none());
    }

    #[test]
    fn test_savings_vs_average() {
        let results = vec![offer(1, "A", 10.0), offer(2, "B", 20.0)];
        let insights = PriceInsights::from_results(&results).unwrap();
        assert_eq!(insights.savings_vs_average().display(), "$5.00");
    }
}
