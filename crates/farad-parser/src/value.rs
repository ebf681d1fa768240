//! Numeric literals with SI suffixes.

use crate::error::{Error, Result};

/// Parse a numeric literal, honoring a single case-insensitive SI
/// suffix letter: t=1e12, g=1e9, k=1e3, m=1e-3, u=1e-6, n=1e-9,
/// p=1e-12, f=1e-15.
pub fn parse_value(text: &str) -> Result<f64> {
    if text.is_empty() {
        return Err(Error::InvalidNumber(text.to_string()));
    }

    let last = text
        .chars()
        .last()
        .expect("nonempty")
        .to_ascii_lowercase();
    let (number_part, multiplier) = if last.is_ascii_alphabetic() {
        let multiplier = match last {
            't' => 1e12,
            'g' => 1e9,
            'k' => 1e3,
            'm' => 1e-3,
            'u' => 1e-6,
            'n' => 1e-9,
            'p' => 1e-12,
            'f' => 1e-15,
            _ => return Err(Error::InvalidNumber(text.to_string())),
        };
        (&text[..text.len() - 1], multiplier)
    } else {
        (text, 1.0)
    };

    number_part
        .parse::<f64>()
        .map(|v| v * multiplier)
        .map_err(|_| Error::InvalidNumber(text.to_string()))
}
