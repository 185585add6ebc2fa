//! Safe-spend arithmetic for the native-coin leg.
//!
//! Pure integer math throughout: the safety fraction arrives as basis
//! points (converted once at settings load), so no floating-point drift
//! ever touches a financial quantity.

/// How much of a balance may be committed to a swap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpendOutcome {
    Spend(u64),
    /// Nothing left once the fee/rent reserve is withheld.
    InsufficientAfterReserve,
    /// The reserve left something, but the safety margin floors it to zero.
    /// Only reachable when `safety_bps` rounds to zero, i.e. a config error.
    InsufficientAfterSafetyMargin,
}

/// `spendable = max(0, balance - reserve)`, then
/// `spend = floor(spendable * safety_bps / 10_000)`.
pub fn compute_spendable(balance: u64, reserve: u64, safety_bps: u64) -> SpendOutcome {
    let spendable = balance.saturating_sub(reserve);
    if spendable == 0 {
        return SpendOutcome::InsufficientAfterReserve;
    }

    let spend = (spendable as u128 * safety_bps as u128 / 10_000) as u64;
    if spend == 0 {
        return SpendOutcome::InsufficientAfterSafetyMargin;
    }
    SpendOutcome::Spend(spend)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spend(balance: u64, reserve: u64, bps: u64) -> u64 {
        match compute_spendable(balance, reserve, bps) {
            SpendOutcome::Spend(v) => v,
            other => panic!("expected a spend amount, got {other:?}"),
        }
    }

    #[test]
    fn reference_vector() {
        // 1 SOL balance, 0.01 SOL reserve, 85% safety margin.
        assert_eq!(spend(1_000_000_000, 10_000_000, 8_500), 841_500_000);
    }

    #[test]
    fn reserve_exhausts_balance() {
        assert_eq!(
            compute_spendable(5, 5, 8_500),
            SpendOutcome::InsufficientAfterReserve
        );
        assert_eq!(
            compute_spendable(5, 9, 8_500),
            SpendOutcome::InsufficientAfterReserve
        );
        assert_eq!(
            compute_spendable(0, 0, 8_500),
            SpendOutcome::InsufficientAfterReserve
        );
    }

    #[test]
    fn zero_safety_margin_is_flagged() {
        assert_eq!(
            compute_spendable(1_000, 0, 0),
            SpendOutcome::InsufficientAfterSafetyMargin
        );
    }

    #[test]
    fn monotonic_in_balance_antitone_in_reserve() {
        let mut last = 0;
        for balance in (100_000..1_000_000).step_by(77_777) {
            let s = spend(balance, 50_000, 8_500);
            assert!(s >= last);
            assert!(s <= balance);
            last = s;
        }

        let mut last = u64::MAX;
        for reserve in (0..900_000).step_by(100_000) {
            let s = spend(1_000_000, reserve, 8_500);
            assert!(s <= last);
            last = s;
        }
    }

    #[test]
    fn no_overflow_near_u64_max() {
        // u128 intermediate keeps the product from wrapping.
        assert_eq!(spend(u64::MAX, 0, 10_000), u64::MAX);
    }
}
