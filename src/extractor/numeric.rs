//! Numeric token recognition and normalization
//!
//! Handles `$1,234,567`, `(500)`, `-12.5`, `2.3M`, `45K`, `1.2 billion`.

use crate::models::Scale;
use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    static ref AMOUNT_RE: Regex = Regex::new(
        r"(?ix)
        (?P<open>\()?
        (?P<neg>-)?
        (?:(?P<cur>[$€£¥])\s?)?
        (?P<int>\d{1,3}(?:,\d{3})+|\d+)
        (?:\.(?P<frac>\d+))?
        (?P<close>\))?
        (?:\s?(?P<scale>billion|million|thousand|bn|mn|[kmb])\b)?
        (?P<close_after>\))?
        (?P<pct>\s?%)?
        "
    )
    .expect("amount pattern compiles");
}

/// An amount found inside a line of text
#[derive(Debug, Clone, PartialEq)]
pub struct AmountToken {
    /// Byte span of the token in the source line
    pub start: usize,
    pub end: usize,
    pub value: f64,
    pub scale: Option<Scale>,
    pub currency: Option<String>,
}

/// All amounts in a line, left to right
pub fn find_amounts(line: &str) -> Vec<AmountToken> {
    AMOUNT_RE
        .captures_iter(line)
        .filter_map(|caps| to_token(line, &caps))
        .collect()
}

/// Parse a standalone token such as `"$1,234,567"` or `"(500)"`
pub fn parse_amount(token: &str) -> Option<f64> {
    let trimmed = token.trim();
    let found = find_amounts(trimmed);
    match found.as_slice() {
        [only] if only.start == 0 && only.end == trimmed.len() => Some(only.value),
        _ => None,
    }
}

fn to_token(line: &str, caps: &Captures<'_>) -> Option<AmountToken> {
    let whole = caps.get(0)?;

    if caps.name("pct").is_some() {
        return None;
    }

    // Glued to a word ("FY2023", "Q4") is an identifier, not an amount
    if let Some(prev) = line[..whole.start()].chars().next_back() {
        if prev.is_alphanumeric() || prev == '.' || prev == ',' {
            return None;
        }
    }

    let int = caps.name("int")?;
    let frac = caps.name("frac");
    let frac_part = frac.map(|m| m.as_str()).unwrap_or("");
    let currency = caps.name("cur").map(|m| m.as_str().to_string());
    let scale_match = caps.name("scale");
    let scale = scale_match.and_then(|m| Scale::from_suffix(m.as_str()));
    let close = caps.name("close_after").or_else(|| caps.name("close"));
    let parenthesized = caps.name("open").is_some() && close.is_some();
    let explicit_minus = caps.name("neg").is_some();

    if !explicit_minus && looks_like_year(int.as_str(), frac_part, &currency, scale) {
        return None;
    }

    let value = normalize(int.as_str(), frac_part, scale)?;
    let value = if parenthesized || explicit_minus { -value } else { value };

    // An unmatched parenthesis stays outside the token
    let (start, end) = if parenthesized {
        (whole.start(), whole.end())
    } else {
        let start = [caps.name("neg"), caps.name("cur"), Some(int)]
            .into_iter()
            .flatten()
            .map(|m| m.start())
            .min()
            .unwrap_or(int.start());
        let end = [Some(int), frac, scale_match]
            .into_iter()
            .flatten()
            .map(|m| m.end())
            .max()
            .unwrap_or(int.end());
        (start, end)
    };

    Some(AmountToken {
        start,
        end,
        value,
        scale,
        currency,
    })
}

/// Bare four-digit numbers in 1900..=2100 are column headings, not amounts
fn looks_like_year(
    int_part: &str,
    frac_part: &str,
    currency: &Option<String>,
    scale: Option<Scale>,
) -> bool {
    if int_part.len() != 4 || !frac_part.is_empty() || currency.is_some() || scale.is_some() {
        return false;
    }
    matches!(int_part.parse::<u32>(), Ok(year) if (1900..=2100).contains(&year))
}

/// Exact decimal scaling: digits are parsed as one integer, then the
/// scale multiplier and the decimal divisor are applied.
fn normalize(int_part: &str, frac_part: &str, scale: Option<Scale>) -> Option<f64> {
    let digits: String = int_part
        .chars()
        .filter(|c| c.is_ascii_digit())
        .chain(frac_part.chars())
        .collect();

    let mantissa: f64 = digits.parse().ok()?;
    let divisor = 10f64.powi(frac_part.len() as i32);
    let multiplier = scale.map(Scale::multiplier).unwrap_or(1.0);

    let value = mantissa * multiplier / divisor;
    value.is_finite().then_some(value)
}
