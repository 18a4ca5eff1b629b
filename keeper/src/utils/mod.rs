//! # Utilities Module
//!
//! Formatting helpers for log lines.

use chrono::{DateTime, TimeZone, Utc};

/// Format a USDC amount (6 decimals) as `"1,234.56 USDC"`.
///
/// Integer arithmetic only; the cents are truncated.
pub fn format_usdc(amount: u64) -> String {
    let whole = amount / 1_000_000;
    let cents = (amount % 1_000_000) / 10_000;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{}.{:02} USDC", grouped, cents)
}

/// Format a bps ratio as a multiplier, e.g. `15000 -> "1.50x"`.
/// `None` renders as infinity.
pub fn format_ratio(bps: Option<u64>) -> String {
    match bps {
        Some(bps) => format!("{}.{:02}x", bps / 10_000, (bps % 10_000) / 100),
        None => "∞".to_string(),
    }
}

/// Unix seconds to RFC 3339, or the raw number if out of range.
pub fn format_unix(ts: i64) -> String {
    Utc.timestamp_opt(ts, 0)
        .single()
        .map(|dt: DateTime<Utc>| dt.to_rfc3339())
        .unwrap_or_else(|| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_usdc() {
        assert_eq!(format_usdc(1_000_000), "1.00 USDC");
        assert_eq!(format_usdc(1_234_567_890), "1,234.56 USDC");
        assert_eq!(format_usdc(999_999_000_000), "999,999.00 USDC");
        assert_eq!(format_usdc(0), "0.00 USDC");
    }

    #[test]
    fn test_format_ratio() {
        assert_eq!(format_ratio(Some(15_000)), "1.50x");
        assert_eq!(format_ratio(Some(24_000)), "2.40x");
        assert_eq!(format_ratio(None), "∞");
    }

    #[test]
    fn test_format_unix() {
        assert_eq!(format_unix(0), "1970-01-01T00:00:00+00:00");
    }
}
