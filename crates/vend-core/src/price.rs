//! Unit pricing derived from the demand signal.

/// `floor(starting_price * ema / target)`, all internal-scale.
///
/// The price is never compounded from a previous price. It is derived
/// fresh from the demand signal against the fixed starting baseline, so
/// recomputation after any number of skipped periods needs no history
/// beyond the current `ema`. Monotonic in `ema`; zero demand prices at
/// zero. `None` on overflow or a zero target.
pub fn unit_price(ema: u128, target: u128, starting_price: u128) -> Option<u128> {
    if target == 0 {
        return None;
    }
    starting_price.checked_mul(ema).map(|scaled| scaled / target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_price_at_target_is_starting_price() {
        assert_eq!(unit_price(100, 100, 1_000_000), Some(1_000_000));
    }

    #[test]
    fn test_price_at_zero_demand_is_zero() {
        assert_eq!(unit_price(0, 100, 1_000_000), Some(0));
    }

    #[test]
    fn test_price_scales_linearly() {
        assert_eq!(unit_price(110, 100, 1000), Some(1100));
        assert_eq!(unit_price(90, 100, 1000), Some(900));
        assert_eq!(unit_price(200, 100, 1000), Some(2000));
    }

    #[test]
    fn test_price_truncates() {
        // 1000 * 105 / 1000 = 105; 7 * 105 / 1000 = 0.735 -> 0
        assert_eq!(unit_price(105, 1000, 7), Some(0));
    }

    #[test]
    fn test_overflow_detected() {
        assert_eq!(unit_price(u128::MAX, 100, 2), None);
    }

    #[test]
    fn test_zero_target_refused() {
        assert_eq!(unit_price(100, 0, 1000), None);
    }

    proptest! {
        #[test]
        fn prop_identity_at_target(
            target in 1u128..1_000_000_000_000,
            starting_price in 0u128..1_000_000_000_000,
        ) {
            prop_assert_eq!(unit_price(target, target, starting_price), Some(starting_price));
        }

        #[test]
        fn prop_monotonic_in_demand(
            ema in 0u128..1_000_000_000,
            bump in 1u128..1_000_000,
            target in 1u128..1_000_000_000,
            starting_price in 0u128..1_000_000_000,
        ) {
            let low = unit_price(ema, target, starting_price).unwrap();
            let high = unit_price(ema + bump, target, starting_price).unwrap();
            prop_assert!(high >= low);
        }
    }
}
