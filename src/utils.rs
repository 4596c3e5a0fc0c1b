use alloy::primitives::U256;
use chrono::{DateTime, NaiveDate, Utc};

use crate::data::types::{Direction, HistoryFilters, NormalizedTransaction};
use crate::data::value::format_units;

/// Symbols treated as stablecoins by the downstream stablecoin filter.
const STABLECOINS: &[&str] = &[
    "USDT", "USDC", "DAI", "BUSD", "FDUSD", "TUSD", "USDP", "USDD", "USDE", "PYUSD", "GUSD",
    "FRAX", "LUSD",
];

/// Truncate a hash or address string to "0xabcdef...1234" form.
pub fn truncate_hex(s: &str) -> String {
    if s.len() > 14 {
        format!("{}...{}", &s[..8], &s[s.len() - 4..])
    } else {
        s.to_string()
    }
}

/// Format an already-scaled decimal amount for display: thousands grouping on
/// the integer part, fraction capped at 6 digits.
pub fn format_amount(amount: &str) -> String {
    if amount.is_empty() {
        return "0".to_string();
    }
    let (sign, unsigned) = match amount.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", amount),
    };
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((i, f)) => (i, f),
        None => (unsigned, ""),
    };

    let grouped = group_thousands(integer);
    let fraction = &fraction[..fraction.len().min(6)];
    let fraction = fraction.trim_end_matches('0');

    if fraction.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{fraction}")
    }
}

fn group_thousands(digits: &str) -> String {
    let mut result = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Parse a formatted decimal string into an f64 for USD math. Display only;
/// base-unit amounts never travel through here.
pub fn parse_to_float(amount: &str) -> f64 {
    amount.replace(',', "").parse().unwrap_or(0.0)
}

/// Format a USD amount, flooring tiny nonzero values at "< $0.01".
pub fn format_usd(amount: f64) -> String {
    if amount > 0.0 && amount < 0.01 {
        return "< $0.01".to_string();
    }
    let sign = if amount < 0.0 { "-" } else { "" };
    let formatted = format!("{:.2}", amount.abs());
    let (integer, fraction) = formatted
        .split_once('.')
        .unwrap_or((formatted.as_str(), "00"));
    format!("{sign}${}.{fraction}", group_thousands(integer))
}

/// Format a Unix-epoch moment as "Xm ago", "Xh ago", etc.
pub fn relative_time(timestamp: DateTime<Utc>) -> String {
    let now = Utc::now();
    if timestamp > now {
        return "just now".to_string();
    }
    let diff = (now - timestamp).num_seconds() as u64;
    if diff < 60 {
        format!("{diff}s ago")
    } else if diff < 3600 {
        format!("{}m ago", diff / 60)
    } else if diff < 86400 {
        format!("{}h ago", diff / 3600)
    } else {
        format!("{}d ago", diff / 86400)
    }
}

/// Transaction fee in native units: gas_used * gas_price, exact in U256,
/// formatted at 18 decimals.
pub fn format_fee(gas_used: &str, gas_price: &str) -> String {
    let used = U256::from_str_radix(gas_used, 10).unwrap_or(U256::ZERO);
    let price = U256::from_str_radix(gas_price, 10).unwrap_or(U256::ZERO);
    let fee = used.saturating_mul(price);
    format_units(&fee.to_string(), 18)
}

/// Apply the echoed direction / stablecoin / date-range filters to a
/// transaction list. This is the presentation layer's job; the resolver only
/// attaches the parameters.
pub fn apply_history_filters(
    transactions: &[NormalizedTransaction],
    searched_address: &str,
    filters: &HistoryFilters,
) -> Vec<NormalizedTransaction> {
    let searched = searched_address.to_lowercase();
    let from = filters.from.as_deref().and_then(parse_date);
    let to = filters.to.as_deref().and_then(parse_date);

    transactions
        .iter()
        .filter(|tx| {
            match filters.direction {
                Direction::All => {}
                Direction::Out => {
                    if !tx.from_address.eq_ignore_ascii_case(&searched) {
                        return false;
                    }
                }
                Direction::In => {
                    if tx.from_address.eq_ignore_ascii_case(&searched) {
                        return false;
                    }
                }
            }

            if filters.stablecoins_only {
                let symbol = tx.token_symbol.as_deref().unwrap_or("Native");
                if !STABLECOINS.contains(&symbol.to_uppercase().as_str()) {
                    return false;
                }
            }

            let date = tx.block_timestamp.date_naive();
            if let Some(from) = from {
                if date < from {
                    return false;
                }
            }
            if let Some(to) = to {
                if date > to {
                    return false;
                }
            }

            true
        })
        .cloned()
        .collect()
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn tx(from: &str, symbol: Option<&str>, date: &str) -> NormalizedTransaction {
        NormalizedTransaction {
            hash: "0xh".to_string(),
            nonce: "0".to_string(),
            transaction_index: "0".to_string(),
            from_address: from.to_string(),
            to_address: Some("0xrecipient".to_string()),
            value: "1".to_string(),
            gas: "0".to_string(),
            gas_price: "0".to_string(),
            input: "0x".to_string(),
            receipt_cumulative_gas_used: "0".to_string(),
            receipt_gas_used: "0".to_string(),
            receipt_contract_address: None,
            receipt_status: "1".to_string(),
            block_timestamp: format!("{date}T12:00:00Z").parse().unwrap(),
            block_number: "1".to_string(),
            block_hash: String::new(),
            erc20_transfers: None,
            nft_transfers: None,
            internal_transfers: None,
            token_symbol: symbol.map(str::to_string),
            token_name: None,
            token_decimals: None,
            provider: None,
            detected_chain: None,
            native_price: None,
        }
    }

    #[test]
    fn test_truncate_hex() {
        let hash = "0xddf252ad1be2c89b69c2b068fc378daa952ba7f1";
        assert_eq!(truncate_hex(hash), "0xddf252...a7f1");
        assert_eq!(truncate_hex("0xshort"), "0xshort");
    }

    #[test]
    fn test_format_amount_groups_and_caps_fraction() {
        assert_eq!(format_amount("1234567.123456789"), "1,234,567.123456");
        assert_eq!(format_amount("1000"), "1,000");
        assert_eq!(format_amount("0.5"), "0.5");
        assert_eq!(format_amount("-12345.10"), "-12,345.1");
        assert_eq!(format_amount(""), "0");
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(0.004), "< $0.01");
        assert_eq!(format_usd(0.0), "$0.00");
        assert_eq!(format_usd(1234.567), "$1,234.57");
        assert_eq!(format_usd(-1234567.0), "-$1,234,567.00");
    }

    #[test]
    fn test_parse_to_float() {
        assert_eq!(parse_to_float("1,234.5"), 1234.5);
        assert_eq!(parse_to_float("junk"), 0.0);
    }

    #[test]
    fn test_format_fee_is_exact() {
        // 21000 * 30 gwei = 0.00063 native units.
        assert_eq!(format_fee("21000", "30000000000"), "0.00063");
        assert_eq!(format_fee("", ""), "0");
    }

    #[test]
    fn test_relative_time_buckets() {
        let now = Utc::now();
        assert!(relative_time(now).ends_with("s ago"));
        assert_eq!(relative_time(now - chrono::Duration::minutes(5)), "5m ago");
        assert_eq!(relative_time(now - chrono::Duration::hours(3)), "3h ago");
        assert_eq!(relative_time(now - chrono::Duration::days(2)), "2d ago");
        assert_eq!(
            relative_time(Utc.with_ymd_and_hms(2990, 1, 1, 0, 0, 0).unwrap()),
            "just now"
        );
    }

    #[test]
    fn test_direction_filter() {
        let txs = vec![
            tx("0xME", None, "2024-05-01"),
            tx("0xother", None, "2024-05-01"),
        ];
        let mut filters = HistoryFilters::default();

        filters.direction = Direction::Out;
        let out = apply_history_filters(&txs, "0xme", &filters);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].from_address, "0xME");

        filters.direction = Direction::In;
        let inbound = apply_history_filters(&txs, "0xme", &filters);
        assert_eq!(inbound.len(), 1);
        assert_eq!(inbound[0].from_address, "0xother");
    }

    #[test]
    fn test_stablecoin_filter() {
        let txs = vec![
            tx("0xa", Some("USDC"), "2024-05-01"),
            tx("0xa", Some("usdt"), "2024-05-01"),
            tx("0xa", Some("WETH"), "2024-05-01"),
            tx("0xa", None, "2024-05-01"),
        ];
        let filters = HistoryFilters {
            stablecoins_only: true,
            ..Default::default()
        };
        let kept = apply_history_filters(&txs, "0xa", &filters);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_date_range_filter_is_inclusive() {
        let txs = vec![
            tx("0xa", None, "2024-01-15"),
            tx("0xa", None, "2024-02-15"),
            tx("0xa", None, "2024-03-15"),
        ];
        let filters = HistoryFilters {
            from: Some("2024-02-15".to_string()),
            to: Some("2024-03-15".to_string()),
            ..Default::default()
        };
        let kept = apply_history_filters(&txs, "0xa", &filters);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_unparseable_dates_are_ignored() {
        let txs = vec![tx("0xa", None, "2024-01-15")];
        let filters = HistoryFilters {
            from: Some("yesterday".to_string()),
            ..Default::default()
        };
        assert_eq!(apply_history_filters(&txs, "0xa", &filters).len(), 1);
    }
}
