//! Fixed-point money handling and currency display formatting.
//!
//! Amounts are stored as integer minor units (cents) so that summing never
//! accumulates binary floating-point error. Floats only appear at the form
//! boundary (HTML number inputs) and are converted to cents immediately.

use crate::Error;

/// A monetary amount in minor units (cents).
pub type Cents = i64;

/// Currency codes and their display symbols.
///
/// Unknown codes fall back to "$".
const CURRENCY_SYMBOLS: [(&str, &str); 14] = [
    ("USD", "$"),
    ("EUR", "€"),
    ("GBP", "£"),
    ("JPY", "¥"),
    ("CAD", "C$"),
    ("AUD", "A$"),
    ("INR", "₹"),
    ("BRL", "R$"),
    ("ZAR", "R"),
    ("CNY", "¥"),
    ("RUB", "₽"),
    ("MXN", "$"),
    ("SGD", "S$"),
    ("CHF", "Fr"),
];

/// Get the display symbol for a currency code, defaulting to "$" for codes
/// that are not in the symbol table.
pub fn currency_symbol(currency_code: &str) -> &'static str {
    CURRENCY_SYMBOLS
        .iter()
        .find(|(code, _)| *code == currency_code)
        .map(|(_, symbol)| *symbol)
        .unwrap_or("$")
}

/// Format `amount` as a currency string, e.g. `format_currency(12_50, "USD")`
/// returns "$12.50".
///
/// Negative amounts place the sign before the symbol, e.g. "-$3.50". No
/// thousands separators are added.
pub fn format_currency(amount: Cents, currency_code: &str) -> String {
    let symbol = currency_symbol(currency_code);
    let sign = if amount < 0 { "-" } else { "" };
    let magnitude = amount.unsigned_abs();

    format!("{sign}{symbol}{}.{:02}", magnitude / 100, magnitude % 100)
}

/// Format `amount` as a bare decimal string without a currency symbol,
/// e.g. "12.50". Used to pre-fill number inputs in forms.
pub fn amount_input_value(amount: Cents) -> String {
    let magnitude = amount.unsigned_abs();
    format!("{}.{:02}", magnitude / 100, magnitude % 100)
}

/// Convert a decimal amount from a form input into cents.
///
/// # Errors
/// Returns [Error::NonPositiveAmount] if the amount is zero, negative, not a
/// finite number, or too large to represent in cents.
pub fn cents_from_amount(amount: f64) -> Result<Cents, Error> {
    if !amount.is_finite() {
        return Err(Error::NonPositiveAmount);
    }

    let cents = (amount * 100.0).round();

    if cents < 1.0 || cents > i64::MAX as f64 {
        return Err(Error::NonPositiveAmount);
    }

    Ok(cents as Cents)
}


#[cfg(test)]
mod cents_from_amount_tests {
    use crate::Error;

    use super::cents_from_amount;

    #[test]
    fn converts_decimal_dollars() {
        assert_eq!(cents_from_amount(12.5), Ok(12_50));
        assert_eq!(cents_from_amount(0.01), Ok(1));
    }

    #[test]
    fn rounds_to_nearest_cent() {
        // 19.99 is not exactly representable as a binary float.
        assert_eq!(cents_from_amount(19.99), Ok(19_99));
    }

    #[test]
    fn rejects_zero_and_negative_amounts() {
        assert_eq!(cents_from_amount(0.0), Err(Error::NonPositiveAmount));
        assert_eq!(cents_from_amount(-5.0), Err(Error::NonPositiveAmount));
    }

    #[test]
    fn rejects_non_finite_amounts() {
        assert_eq!(
            cents_from_amount(f64::INFINITY),
            Err(Error::NonPositiveAmount)
        );
        assert_eq!(cents_from_amount(f64::NAN), Err(Error::NonPositiveAmount));
    }
}
