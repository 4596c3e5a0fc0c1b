use alloy::primitives::U256;

/// Convert a base-unit quantity (decimal or 0x-hex string) into a
/// human-readable decimal string at the given number of decimal places.
///
/// The conversion runs entirely on `U256`, so it is exact for every value a
/// 256-bit chain can produce. Every displayed or exported monetary figure
/// flows through here. Fail-soft: malformed input yields "0", never a panic.
pub fn format_units(raw: &str, decimals: u32) -> String {
    // ERC-20 decimals is a uint8; anything beyond that range is a lying
    // contract and formats as zero rather than padding unbounded.
    if decimals > u8::MAX as u32 {
        return "0".to_string();
    }
    if raw.is_empty() || raw == "0" {
        return "0".to_string();
    }

    let (negative, magnitude) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };

    let base_units = match parse_base_units(magnitude) {
        Some(v) => v,
        None => return "0".to_string(),
    };
    if base_units.is_zero() {
        return "0".to_string();
    }

    let digits = base_units.to_string();
    // Pad until the string is longer than the decimal count so the integer
    // part always keeps at least one digit.
    let width = (decimals as usize) + 1;
    let padded = if digits.len() < width {
        format!("{digits:0>width$}")
    } else {
        digits
    };

    let split = padded.len() - decimals as usize;
    let integer = &padded[..split];
    let fraction = padded[split..].trim_end_matches('0');

    let mut result = integer.to_string();
    if !fraction.is_empty() {
        result.push('.');
        result.push_str(fraction);
    }
    if negative {
        result.insert(0, '-');
    }
    result
}

/// `format_units` with the decimal count supplied as a string, the form token
/// metadata arrives in. A non-numeric count yields "0".
pub fn format_base_units(raw: &str, decimals: &str) -> String {
    match decimals.trim().parse::<u32>() {
        Ok(d) => format_units(raw, d),
        Err(_) => "0".to_string(),
    }
}

/// Convert a 0x-prefixed hex quantity to a decimal string. Shared by the
/// adapters that receive JSON-RPC style hex values. "0x", empty, and
/// unparseable input all yield "0".
pub fn hex_to_dec(hex: &str) -> String {
    if hex.is_empty() || hex == "0x" {
        return "0".to_string();
    }
    let digits = hex.strip_prefix("0x").unwrap_or(hex);
    match U256::from_str_radix(digits, 16) {
        Ok(v) => v.to_string(),
        Err(_) => "0".to_string(),
    }
}

fn parse_base_units(raw: &str) -> Option<U256> {
    if let Some(hex) = raw.strip_prefix("0x") {
        return U256::from_str_radix(hex, 16).ok();
    }
    // Take only the integer portion of any already-malformed decimal input.
    let integer = raw.split('.').next().unwrap_or("");
    U256::from_str_radix(integer, 10).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scale a formatted decimal string back to base units.
    fn to_base_units(formatted: &str, decimals: u32) -> String {
        let (integer, fraction) = match formatted.split_once('.') {
            Some((i, f)) => (i, f.to_string()),
            None => (formatted, String::new()),
        };
        let mut digits = format!("{integer}{fraction:0<width$}", width = decimals as usize);
        while digits.len() > 1 && digits.starts_with('0') {
            digits.remove(0);
        }
        digits
    }

    #[test]
    fn test_one_ether() {
        assert_eq!(format_units("1000000000000000000", 18), "1");
    }

    #[test]
    fn test_fractional_value_trims_trailing_zeros() {
        assert_eq!(format_units("1500000000000000000", 18), "1.5");
        assert_eq!(format_units("1050000", 6), "1.05");
    }

    #[test]
    fn test_value_smaller_than_one_unit() {
        assert_eq!(format_units("1", 18), "0.000000000000000001");
        assert_eq!(format_units("42", 6), "0.000042");
    }

    #[test]
    fn test_zero_decimals_is_identity() {
        assert_eq!(format_units("12345", 0), "12345");
    }

    #[test]
    fn test_zero_and_empty_inputs() {
        assert_eq!(format_units("0", 18), "0");
        assert_eq!(format_units("", 18), "0");
        assert_eq!(format_units("0x", 18), "0");
    }

    #[test]
    fn test_hex_and_decimal_paths_agree() {
        // 0xde0b6b3a7640000 == 10^18
        assert_eq!(
            format_units("0xde0b6b3a7640000", 18),
            format_units("1000000000000000000", 18)
        );
        assert_eq!(format_units("0x3b9aca00", 6), "1000");
    }

    #[test]
    fn test_negative_value_keeps_sign() {
        assert_eq!(format_units("-2500000000000000000", 18), "-2.5");
    }

    #[test]
    fn test_malformed_decimal_input_truncates() {
        assert_eq!(format_units("1000000000000000000.9999", 18), "1");
    }

    #[test]
    fn test_garbage_input_is_zero() {
        assert_eq!(format_units("not-a-number", 18), "0");
        assert_eq!(format_units("0xzz", 18), "0");
    }

    #[test]
    fn test_string_decimals() {
        assert_eq!(format_base_units("1000000", "6"), "1");
        assert_eq!(format_base_units("1000000", "banana"), "0");
    }

    #[test]
    fn test_oversized_decimal_count_is_zero() {
        assert_eq!(format_units("1000000", 256), "0");
        assert_eq!(format_base_units("1000000", "4294967296"), "0");
    }

    #[test]
    fn test_max_u256_round_trip() {
        // 2^256 - 1 must survive formatting and rescaling without drift.
        let max = U256::MAX.to_string();
        for decimals in [0u32, 6, 18, 36] {
            let formatted = format_units(&max, decimals);
            assert_eq!(to_base_units(&formatted, decimals), max);
        }
    }

    #[test]
    fn test_round_trip_across_magnitudes() {
        let values = [
            "1",
            "999",
            "1000000",
            "123456789123456789",
            "100000000000000000000000000000000000001",
        ];
        for v in values {
            for decimals in [0u32, 1, 6, 8, 18, 36] {
                let formatted = format_units(v, decimals);
                assert_eq!(to_base_units(&formatted, decimals), v, "v={v} d={decimals}");
            }
        }
    }

    #[test]
    fn test_hex_to_dec() {
        assert_eq!(hex_to_dec("0x0"), "0");
        assert_eq!(hex_to_dec("0x"), "0");
        assert_eq!(hex_to_dec(""), "0");
        assert_eq!(hex_to_dec("0x10"), "16");
        assert_eq!(hex_to_dec("0xde0b6b3a7640000"), "1000000000000000000");
        assert_eq!(hex_to_dec("junk"), "0");
    }

    #[test]
    fn test_hex_to_dec_full_word() {
        // A full 32-byte value stays exact.
        let all_ff = format!("0x{}", "ff".repeat(32));
        assert_eq!(hex_to_dec(&all_ff), U256::MAX.to_string());
    }
}
