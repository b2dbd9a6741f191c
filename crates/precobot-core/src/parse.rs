//! Free-text catalog line parsing.
//!
//! A line like `Bateria iPhone 14 150.00 Tela iPhone 14 300` is a run of
//! name tokens interleaved with price tokens: each price closes the name
//! accumulated so far into one option.

use crate::catalog::ServiceOption;

/// Model label used when an option name has fewer than two words.
pub const UNKNOWN_MODEL: &str = "Unknown";

/// Split one line into (name, price) options.
///
/// Tokenizes on whitespace, accumulating non-numeric tokens as a pending
/// name; a numeric token closes the pending name into an option and resets
/// the buffer. Trailing name tokens with no following price are discarded.
/// A line with no price token yields an empty Vec.
pub fn parse_line(line: &str) -> Vec<ServiceOption> {
    let mut options = Vec::new();
    let mut pending: Vec<&str> = Vec::new();

    for token in line.split_whitespace() {
        if let Some(price) = parse_price_token(token) {
            options.push(ServiceOption::new(pending.join(" "), price));
            pending.clear();
        } else {
            pending.push(token);
        }
    }

    options
}

/// Derive the model label for a parsed line: the second word of the first
/// option's name, or [`UNKNOWN_MODEL`].
pub fn model_label(options: &[ServiceOption]) -> String {
    options
        .first()
        .and_then(|opt| opt.name.split_whitespace().nth(1))
        .unwrap_or(UNKNOWN_MODEL)
        .to_string()
}

/// A token is a price iff, after removing at most one decimal point, the
/// remainder is non-empty and all ASCII digits. Deliberately narrow: no
/// negatives, no scientific notation, no thousands separators.
fn parse_price_token(token: &str) -> Option<f64> {
    let digits = token.replacen('.', "", 1);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}
