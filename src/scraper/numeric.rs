//! Total text-to-number coercion for scraped cell values.
//!
//! Markup on the source site is inconsistent (thousands separators, `%`
//! suffixes, stoppage-time notation, empty cells). Every function here
//! accepts any input and falls back to zero instead of failing.

/// Parse an integer by keeping only ASCII digits.
///
/// `"1,234"` → 1234, `"abc"` → 0, `""` → 0. Overflow also yields 0.
pub fn parse_safe_int(text: &str) -> i64 {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return 0;
    }
    digits.parse().unwrap_or(0)
}

/// Parse a float keeping digits and `.`/`,` separators.
///
/// Commas are treated as decimal points, so `"45,67%"` → 45.67.
/// Ambiguous input such as `"1.2.3"` yields 0.0.
pub fn parse_safe_float(text: &str) -> f64 {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    if cleaned.is_empty() {
        return 0.0;
    }

    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Parse an fbref age cell (`"25-123"` = 25 years, 123 days).
pub fn parse_age(text: &str) -> Option<u32> {
    let years = text.trim().split('-').next().unwrap_or("");
    match parse_safe_int(years) {
        0 => None,
        n => u32::try_from(n).ok(),
    }
}

/// Parse a match minute with stoppage-time notation.
///
/// First-half stoppage stays on 45 (`"45+2'"` → 45) so it buckets with the
/// first half; any other addition is summed (`"90+4'"` → 94) and lands in
/// the extra bucket.
pub fn parse_minute(text: &str) -> u32 {
    let mut parts = text.splitn(2, '+');
    let base = u32::try_from(parse_safe_int(parts.next().unwrap_or(""))).unwrap_or(0);
    let added = parts
        .next()
        .map(|p| u32::try_from(parse_safe_int(p)).unwrap_or(0))
        .unwrap_or(0);

    if base == 0 || base == 45 {
        return base;
    }
    base.saturating_add(added)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_safe_int() {
        assert_eq!(parse_safe_int("123"), 123);
        assert_eq!(parse_safe_int("abc123"), 123);
        assert_eq!(parse_safe_int("1,234"), 1234);
        assert_eq!(parse_safe_int("abc"), 0);
        assert_eq!(parse_safe_int(""), 0);
        assert_eq!(parse_safe_int("  "), 0);
    }

    #[test]
    fn test_parse_safe_int_overflow() {
        assert_eq!(parse_safe_int("99999999999999999999999999"), 0);
    }

    #[test]
    fn test_parse_safe_float() {
        assert_eq!(parse_safe_float("45.67"), 45.67);
        assert_eq!(parse_safe_float("45,67%"), 45.67);
        assert_eq!(parse_safe_float("0.8 xG"), 0.8);
        assert_eq!(parse_safe_float(""), 0.0);
        assert_eq!(parse_safe_float("abc"), 0.0);
        assert_eq!(parse_safe_float("1.2.3"), 0.0);
        assert_eq!(parse_safe_float("."), 0.0);
    }

    #[test]
    fn test_never_panics_on_odd_input() {
        for input in ["—", "∞", "NaN", "-", "1e400", "%%", "١٢٣", "\u{0}"] {
            let _ = parse_safe_int(input);
            let f = parse_safe_float(input);
            assert!(f.is_finite());
        }
    }

    #[test]
    fn test_parse_age() {
        assert_eq!(parse_age("25-123"), Some(25));
        assert_eq!(parse_age("31"), Some(31));
        assert_eq!(parse_age(""), None);
        assert_eq!(parse_age("n/a"), None);
    }

    #[test]
    fn test_parse_minute() {
        assert_eq!(parse_minute("23'"), 23);
        assert_eq!(parse_minute("45+2'"), 45);
        assert_eq!(parse_minute("90+5"), 95);
        assert_eq!(parse_minute("105+1'"), 106);
        assert_eq!(parse_minute("HT"), 0);
    }
}
