use alloy_primitives::{
    utils::{format_ether, format_units},
    U256,
};

/// Drops trailing fractional zeroes but keeps one decimal, `1.500` -> `1.5`,
/// `2.000` -> `2.0`
fn trim_fraction(formatted: String) -> String {
    if !formatted.contains('.') {
        return formatted;
    }
    let mut trimmed = formatted.trim_end_matches('0').to_string();
    if trimmed.ends_with('.') {
        trimmed.push('0');
    }
    trimmed
}

pub fn format_gwei(wei: U256) -> String {
    format_units(wei, "gwei")
        .map(trim_fraction)
        .unwrap_or_else(|_| wei.to_string())
}

pub fn format_ether_short(wei: U256) -> String {
    trim_fraction(format_ether(wei))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gwei() {
        assert_eq!(format_gwei(U256::from(1_000_000_000u64)), "1.0");
        assert_eq!(format_gwei(U256::from(12_500_000u64)), "0.0125");
        assert_eq!(format_gwei(U256::from(30_000_000_000u64)), "30.0");
    }

    #[test]
    fn test_ether() {
        assert_eq!(format_ether_short(U256::from(1_500_000_000_000_000_000u64)), "1.5");
        assert_eq!(format_ether_short(U256::ZERO), "0.0");
    }
}
