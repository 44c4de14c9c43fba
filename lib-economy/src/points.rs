//! Point and currency conversion
//!
//! Pure integer arithmetic on wei amounts held as `u128`:
//! - 1 point per 0.001 ETH (10^15 wei), remainder discarded
//! - 1 ETH = 3,000,000 KRW for campaign bookkeeping
//!
//! Results saturate instead of wrapping on absurd inputs.

/// Wei per ether
pub const WEI_PER_ETH: u128 = 1_000_000_000_000_000_000;

/// Wei per point (0.001 ETH)
pub const WEI_PER_POINT: u128 = 1_000_000_000_000_000;

/// Fixed exchange rate used for campaign amounts
pub const KRW_PER_ETH: u128 = 3_000_000;

/// Points earned for a donation of `wei`
pub fn points_for_wei(wei: u128) -> u64 {
    u64::try_from(wei / WEI_PER_POINT).unwrap_or(u64::MAX)
}

/// KRW value of `wei`, rounded down
pub fn wei_to_krw(wei: u128) -> u64 {
    let krw = match wei.checked_mul(KRW_PER_ETH) {
        Some(scaled) => scaled / WEI_PER_ETH,
        None => (wei / WEI_PER_ETH).saturating_mul(KRW_PER_ETH),
    };
    u64::try_from(krw).unwrap_or(u64::MAX)
}

/// Wei needed to donate `krw`, rounded down
pub fn krw_to_wei(krw: u64) -> u128 {
    u128::from(krw) * WEI_PER_ETH / KRW_PER_ETH
}

/// Decimal ether string with 18 fractional digits
pub fn format_ether(wei: u128) -> String {
    format!("{}.{:018}", wei / WEI_PER_ETH, wei % WEI_PER_ETH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_floor_division() {
        assert_eq!(points_for_wei(0), 0);
        assert_eq!(points_for_wei(WEI_PER_POINT - 1), 0);
        assert_eq!(points_for_wei(WEI_PER_POINT), 1);
        assert_eq!(points_for_wei(10_000_000_000_000_000), 10); // 0.01 ETH
        assert_eq!(points_for_wei(WEI_PER_ETH), 1000);
    }

    #[test]
    fn test_points_saturate() {
        assert_eq!(points_for_wei(u128::MAX), u64::MAX);
    }

    #[test]
    fn test_krw_conversion() {
        assert_eq!(wei_to_krw(WEI_PER_ETH), 3_000_000);
        assert_eq!(wei_to_krw(10_000_000_000_000_000), 30_000); // 0.01 ETH
        assert_eq!(krw_to_wei(3_000_000), WEI_PER_ETH);
        assert_eq!(krw_to_wei(30_000), 10_000_000_000_000_000);
        assert_eq!(wei_to_krw(krw_to_wei(12_345)), 12_345);
        assert_eq!(wei_to_krw(krw_to_wei(10)), 9);
    }

    #[test]
    fn test_krw_conversion_does_not_overflow() {
        assert_eq!(wei_to_krw(u128::MAX), u64::MAX);
    }

    #[test]
    fn test_format_ether() {
        assert_eq!(format_ether(WEI_PER_ETH), "1.000000000000000000");
        assert_eq!(format_ether(1), "0.000000000000000001");
    }
}
