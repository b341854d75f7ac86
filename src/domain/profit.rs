//! Spread and profit arithmetic.
//!
//! All fees are fractions (0.001 = 0.1%). Inputs are validated before
//! any computation so invalid numbers never propagate into trading
//! decisions.

use rust_decimal::Decimal;

use crate::error::ValidationError;

use super::money::{Price, Quantity};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Net spread between a sell-side bid and a buy-side ask, as a
/// percentage after both legs' fees.
///
/// ```text
/// ((sell_bid - buy_ask) / buy_ask) * 100 - (buy_fee_pct + sell_fee_pct)
/// ```
pub fn net_spread_pct(
    buy_ask: Price,
    sell_bid: Price,
    buy_fee: Decimal,
    sell_fee: Decimal,
) -> Result<Decimal, ValidationError> {
    if buy_ask <= Decimal::ZERO {
        return Err(ValidationError::NonPositivePrice(buy_ask));
    }
    if sell_bid <= Decimal::ZERO {
        return Err(ValidationError::NonPositivePrice(sell_bid));
    }

    let gross = (sell_bid - buy_ask) / buy_ask * HUNDRED;
    Ok(gross - buy_fee * HUNDRED - sell_fee * HUNDRED)
}

/// Full cost/revenue decomposition of a two-legged arbitrage trade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfitBreakdown {
    pub buy_cost: Decimal,
    pub buy_fee: Decimal,
    pub total_buy_cost: Decimal,
    pub sell_revenue: Decimal,
    pub sell_fee: Decimal,
    pub net_revenue: Decimal,
    pub profit_usd: Decimal,
    pub profit_pct: Decimal,
}

impl ProfitBreakdown {
    /// Compute the breakdown for buying `quantity` at `buy_price` and
    /// selling it at `sell_price`, with per-leg fee fractions.
    pub fn calculate(
        buy_price: Price,
        sell_price: Price,
        quantity: Quantity,
        buy_fee: Decimal,
        sell_fee: Decimal,
    ) -> Result<Self, ValidationError> {
        if buy_price <= Decimal::ZERO {
            return Err(ValidationError::NonPositivePrice(buy_price));
        }
        if sell_price <= Decimal::ZERO {
            return Err(ValidationError::NonPositivePrice(sell_price));
        }
        if quantity <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveQuantity(quantity));
        }

        let buy_cost = buy_price * quantity;
        let buy_fee_cost = buy_cost * buy_fee;
        let total_buy_cost = buy_cost + buy_fee_cost;

        let sell_revenue = sell_price * quantity;
        let sell_fee_cost = sell_revenue * sell_fee;
        let net_revenue = sell_revenue - sell_fee_cost;

        let profit_usd = net_revenue - total_buy_cost;
        let profit_pct = profit_usd / total_buy_cost * HUNDRED;

        Ok(Self {
            buy_cost,
            buy_fee: buy_fee_cost,
            total_buy_cost,
            sell_revenue,
            sell_fee: sell_fee_cost,
            net_revenue,
            profit_usd,
            profit_pct,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn net_spread_subtracts_both_fees() {
        // ((101 - 100) / 100) * 100 - 0.1 - 0.1 = 0.8
        let spread = net_spread_pct(dec!(100), dec!(101), dec!(0.001), dec!(0.001)).unwrap();
        assert_eq!(spread, dec!(0.8));
    }

    #[test]
    fn net_spread_can_be_negative() {
        let spread = net_spread_pct(dec!(100), dec!(100), dec!(0.001), dec!(0.001)).unwrap();
        assert_eq!(spread, dec!(-0.2));
    }

    #[test]
    fn net_spread_rejects_non_positive_prices() {
        assert_eq!(
            net_spread_pct(dec!(0), dec!(101), dec!(0.001), dec!(0.001)),
            Err(ValidationError::NonPositivePrice(dec!(0)))
        );
        assert_eq!(
            net_spread_pct(dec!(100), dec!(-1), dec!(0.001), dec!(0.001)),
            Err(ValidationError::NonPositivePrice(dec!(-1)))
        );
    }

    #[test]
    fn breakdown_matches_reference_example() {
        // buy 100, sell 101, qty 1, 0.1% per leg
        let p = ProfitBreakdown::calculate(dec!(100), dec!(101), dec!(1), dec!(0.001), dec!(0.001))
            .unwrap();

        assert_eq!(p.buy_cost, dec!(100));
        assert_eq!(p.buy_fee, dec!(0.100));
        assert_eq!(p.total_buy_cost, dec!(100.100));
        assert_eq!(p.sell_revenue, dec!(101));
        assert_eq!(p.sell_fee, dec!(0.101));
        assert_eq!(p.net_revenue, dec!(100.899));
        assert_eq!(p.profit_usd, dec!(0.799));
        // 0.799 / 100.1 * 100 = 0.79820...%
        assert!((p.profit_pct - dec!(0.798)).abs() < dec!(0.001));
    }

    #[test]
    fn breakdown_profit_identity_holds() {
        let p = ProfitBreakdown::calculate(
            dec!(43210.55),
            dec!(43333.21),
            dec!(0.37),
            dec!(0.001),
            dec!(0.002),
        )
        .unwrap();

        assert_eq!(p.profit_usd, p.net_revenue - p.total_buy_cost);
        assert_eq!(p.total_buy_cost, p.buy_cost + p.buy_fee);
        assert_eq!(p.net_revenue, p.sell_revenue - p.sell_fee);
    }

    #[test]
    fn breakdown_rejects_invalid_inputs() {
        assert!(matches!(
            ProfitBreakdown::calculate(dec!(0), dec!(101), dec!(1), dec!(0.001), dec!(0.001)),
            Err(ValidationError::NonPositivePrice(_))
        ));
        assert!(matches!(
            ProfitBreakdown::calculate(dec!(100), dec!(101), dec!(0), dec!(0.001), dec!(0.001)),
            Err(ValidationError::NonPositiveQuantity(_))
        ));
    }
}
