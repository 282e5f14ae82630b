//! Number cleaning for spreadsheet exports

use bigdecimal::BigDecimal;
use std::str::FromStr;

/// Parse a rupiah amount such as "Rp 13.600.000,50".
///
/// Dots are thousands separators and a comma is the decimal mark. Currency
/// symbols, spaces and parentheses are dropped. Anything unparseable is zero.
pub fn clean_rupiah(raw: &str) -> BigDecimal {
    let value = raw.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("nan") {
        return BigDecimal::from(0);
    }

    let cleaned: String = value
        .replace("Rp", "")
        .chars()
        .filter(|c| !matches!(c, ' ' | '(' | ')' | '.'))
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    BigDecimal::from_str(&cleaned).unwrap_or_else(|_| {
        tracing::debug!(raw = raw, "unparseable amount read as zero");
        BigDecimal::from(0)
    })
}

/// Parse a plain quantity ("10", "2.5"); anything else is zero
pub fn parse_quantity(raw: &str) -> BigDecimal {
    let value = raw.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("nan") {
        return BigDecimal::from(0);
    }
    BigDecimal::from_str(value).unwrap_or_else(|_| {
        tracing::debug!(raw = raw, "unparseable quantity read as zero");
        BigDecimal::from(0)
    })
}
