use pwy_common::Cents;

/// The share of each order's total retained by the marketplace before the transfer to the restaurant's connected
/// account.
pub const PLATFORM_FEE_PERCENT: i64 = 5;

/// The platform fee for an order amount, rounded to the nearest integer minor currency unit.
pub fn platform_fee(amount: Cents) -> Cents {
    Cents::from((amount.value() * PLATFORM_FEE_PERCENT + 50) / 100)
}

#[cfg(test)]
mod test {
    use pwy_common::Cents;

    use super::platform_fee;

    #[test]
    fn five_percent_of_100_dollars() {
        let amount = Cents::from(10_000);
        let fee = platform_fee(amount);
        assert_eq!(fee, Cents::from(500));
        // The merchant receives the remainder
        assert_eq!(amount - fee, Cents::from(9_500));
    }

    #[test]
    fn fee_rounds_to_the_nearest_cent() {
        // 5% of $9.99 is 49.95¢, which rounds up to 50¢
        assert_eq!(platform_fee(Cents::from(999)), Cents::from(50));
        // 5% of $9.89 is 49.45¢, which rounds down to 49¢
        assert_eq!(platform_fee(Cents::from(989)), Cents::from(49));
        assert_eq!(platform_fee(Cents::from(0)), Cents::from(0));
        assert_eq!(platform_fee(Cents::from(10)), Cents::from(1));
    }
}
