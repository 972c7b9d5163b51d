//! Tolerant money parsing and rendering.
//!
//! The reporting UI exports currency cells in whatever shape the account's
//! locale produced: `$1,234.50`, bare `50`, an em-dash for "no data", or
//! nothing at all. The parser never fails — anything it cannot read is 0.0.

/// Parse a decimal-like export cell into a number.
///
/// Strips `$` and thousands separators. Blank, `-`, `—`, `nan` and `None`
/// cells parse to 0.0, as does anything else unparsable.
pub fn to_number(raw: &str) -> f64 {
    let s = raw.trim();
    if matches!(s, "" | "-" | "—" | "nan" | "None") {
        return 0.0;
    }
    let cleaned: String = s.chars().filter(|c| *c != '$' && *c != ',').collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Round to 2 decimals (cent precision for summed sales/cost).
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Round to 4 decimals (margin precision).
pub fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

/// Render a dollar amount as `$1,234.50` for the misc-notes field.
pub fn format_usd(v: f64) -> String {
    let negative = v < 0.0;
    let fixed = format!("{:.2}", v.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if negative {
        format!("-${grouped}.{frac_part}")
    } else {
        format!("${grouped}.{frac_part}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_number_sentinels() {
        assert_eq!(to_number("—"), 0.0);
        assert_eq!(to_number(""), 0.0);
        assert_eq!(to_number("nan"), 0.0);
        assert_eq!(to_number("None"), 0.0);
        assert_eq!(to_number("-"), 0.0);
        assert_eq!(to_number("   "), 0.0);
    }

    #[test]
    fn test_to_number_currency_shapes() {
        assert_eq!(to_number("$1,234.50"), 1234.50);
        assert_eq!(to_number("100"), 100.0);
        assert_eq!(to_number(" $0.99 "), 0.99);
        assert_eq!(to_number("2,000,000"), 2_000_000.0);
        assert_eq!(to_number("-12.5"), -12.5);
    }

    #[test]
    fn test_to_number_never_panics_on_junk() {
        assert_eq!(to_number("abc"), 0.0);
        assert_eq!(to_number("$"), 0.0);
        assert_eq!(to_number("1.2.3"), 0.0);
        assert_eq!(to_number("NaN"), 0.0); // parses to a float, but not a finite one
        assert_eq!(to_number("inf"), 0.0);
    }

    #[test]
    fn test_rounding() {
        assert_eq!(round2(1.234), 1.23);
        assert_eq!(round2(1.236), 1.24);
        assert_eq!(round2(175.0), 175.0);
        assert_eq!(round4(0.123456), 0.1235);
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(1234.5), "$1,234.50");
        assert_eq!(format_usd(0.0), "$0.00");
        assert_eq!(format_usd(999.999), "$1,000.00");
        assert_eq!(format_usd(1_000_000.0), "$1,000,000.00");
        assert_eq!(format_usd(-42.0), "-$42.00");
    }
}
