//! Coin pricing and seller commission.
//!
//! 1 coin is shown as 1000 VND across the storefront. Catalog prices are kept
//! in VND and rounded up to whole coins at purchase time.

pub const VND_PER_COIN: i64 = 1000;

/// `(max sale in coins, flat fee)`, checked in order.
const COMMISSION_TIERS: [(i64, i64); 3] = [(50, 2), (200, 5), (500, 10)];

/// Fee for sales above the last tier.
const TOP_TIER_FEE: i64 = 20;

/// How a sale is divided between the platform and the seller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleSplit {
    pub commission: i64,
    pub seller_amount: i64,
}

/// Coin price of a catalog item: `ceil(price_vnd / 1000)`.
pub fn coin_price(price_vnd: i64) -> i64 {
    if price_vnd <= 0 {
        return 0;
    }
    (price_vnd as u64).div_ceil(VND_PER_COIN as u64) as i64
}

/// Coins granted for a bank top-up, rounded down.
pub fn coins_for_topup(amount_vnd: i64) -> i64 {
    amount_vnd.max(0) / VND_PER_COIN
}

/// Flat platform fee for a sale, never more than the sale itself.
pub fn seller_commission(coins: i64) -> i64 {
    if coins <= 0 {
        return 0;
    }
    let fee = COMMISSION_TIERS
        .iter()
        .find(|(max, _)| coins <= *max)
        .map(|(_, fee)| *fee)
        .unwrap_or(TOP_TIER_FEE);
    fee.min(coins)
}

pub fn split_sale(coins: i64) -> SaleSplit {
    let commission = seller_commission(coins);
    SaleSplit {
        commission,
        seller_amount: coins.max(0) - commission,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coin_price_rounds_up_to_whole_coins() {
        assert_eq!(coin_price(150_000), 150);
        assert_eq!(coin_price(150_001), 151);
        assert_eq!(coin_price(999), 1);
        assert_eq!(coin_price(1), 1);
        assert_eq!(coin_price(0), 0);
        assert_eq!(coin_price(-5_000), 0);
    }

    #[test]
    fn topup_rounds_down() {
        assert_eq!(coins_for_topup(50_000), 50);
        assert_eq!(coins_for_topup(50_999), 50);
        assert_eq!(coins_for_topup(999), 0);
        assert_eq!(coins_for_topup(-1), 0);
    }

    #[test]
    fn commission_follows_tiers() {
        assert_eq!(seller_commission(1), 1);
        assert_eq!(seller_commission(2), 2);
        assert_eq!(seller_commission(50), 2);
        assert_eq!(seller_commission(51), 5);
        assert_eq!(seller_commission(200), 5);
        assert_eq!(seller_commission(201), 10);
        assert_eq!(seller_commission(500), 10);
        assert_eq!(seller_commission(501), 20);
        assert_eq!(seller_commission(10_000), 20);
        assert_eq!(seller_commission(0), 0);
    }

    #[test]
    fn split_always_adds_up() {
        for coins in [1, 2, 3, 49, 50, 51, 199, 200, 201, 500, 501, 12_345] {
            let split = split_sale(coins);
            assert_eq!(split.commission + split.seller_amount, coins);
            assert!(split.seller_amount >= 0);
        }
    }
}
