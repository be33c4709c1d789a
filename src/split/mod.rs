//! Payment amounts, split fractions and the split calculator.

mod expr;

use std::str::FromStr;

use rust_decimal::Decimal;

pub use expr::evaluate;

use crate::{
    errors::{LedgerError, Result},
    ledger::{is_currency, Amount},
};

/// Split applied when the user accepts the default.
pub const DEFAULT_SPLIT: &str = "-0.5";

/// Parses a real number in `[-1, 1]`.
pub fn parse_fraction(text: &str) -> Result<Decimal> {
    let trimmed = text.trim();
    let fraction = Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| LedgerError::InvalidFraction(text.to_string()))?;
    if fraction < Decimal::NEGATIVE_ONE || fraction > Decimal::ONE {
        return Err(LedgerError::InvalidFraction(text.to_string()));
    }
    Ok(fraction)
}

/// Parses `"<expression> <CURRENCY>"`, e.g. `21.87/2 EUR`.
///
/// Empty input is no payment. Without a currency, `default_currency` is used when set.
pub fn parse_payment(text: &str, default_currency: Option<&str>) -> Result<Option<Amount>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    let (expression, currency) = match text.rsplit_once(char::is_whitespace) {
        Some((expression, currency)) if is_currency(currency) => (expression, currency),
        _ => match default_currency {
            Some(currency) => (text, currency),
            None => {
                return Err(LedgerError::InvalidInput(format!(
                    "`{text}` is not `<amount> <CURRENCY>`"
                )))
            }
        },
    };
    let number = evaluate(expression)?;
    Ok(Some(Amount::new(number, currency)))
}

/// Value of a split of `total` described by `spec`.
///
/// `spec` is a fraction of the total in `[-1, 1]`, or an explicit amount that must be
/// in `currency`. A zero result is returned as is.
pub fn compute_split(total: Decimal, currency: &str, spec: &str) -> Result<Decimal> {
    if let Ok(fraction) = parse_fraction(spec) {
        return Ok(fraction * total);
    }
    let mut parts = spec.split_whitespace();
    let (Some(value), Some(split_currency), None) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(LedgerError::InvalidSplit(spec.to_string()));
    };
    if split_currency != currency {
        return Err(LedgerError::InvalidSplit(format!(
            "{spec} (currency must be {currency})"
        )));
    }
    evaluate(value).map_err(|_| LedgerError::InvalidSplit(spec.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn fraction_of_total() {
        assert_eq!(compute_split(dec!(100.00), "USD", "-0.5").unwrap(), dec!(-50.00));
    }

    #[test]
    fn explicit_amount_in_same_currency() {
        assert_eq!(
            compute_split(dec!(100.00), "USD", "25.00 USD").unwrap(),
            dec!(25.00)
        );
    }

    #[test]
    fn explicit_amount_in_other_currency_fails() {
        assert!(matches!(
            compute_split(dec!(100.00), "USD", "25.00 EUR"),
            Err(LedgerError::InvalidSplit(_))
        ));
    }

    #[test]
    fn out_of_range_fraction_is_not_a_split() {
        assert!(matches!(
            compute_split(dec!(100.00), "USD", "1.5"),
            Err(LedgerError::InvalidSplit(_))
        ));
    }

    #[test]
    fn zero_split_is_returned() {
        assert_eq!(compute_split(dec!(42), "EUR", "0").unwrap(), Decimal::ZERO);
    }

    #[test]
    fn fraction_bounds() {
        assert!(matches!(
            parse_fraction("1.5"),
            Err(LedgerError::InvalidFraction(_))
        ));
        assert_eq!(parse_fraction("-1").unwrap(), dec!(-1));
        assert_eq!(parse_fraction("2.5e-1").unwrap(), dec!(0.25));
        assert!(parse_fraction("half").is_err());
    }

    #[test]
    fn payments_accept_expressions() {
        let amount = parse_payment("21.87/2 EUR", None).unwrap().unwrap();
        assert_eq!(amount, Amount::new(dec!(10.935), "EUR"));
        assert_eq!(format!("{amount}"), "10.94 EUR");
    }

    #[test]
    fn payment_currency_falls_back_to_default() {
        assert_eq!(
            parse_payment("-12.5", Some("CHF")).unwrap(),
            Some(Amount::new(dec!(-12.5), "CHF"))
        );
        assert!(matches!(
            parse_payment("-12.5", None),
            Err(LedgerError::InvalidInput(_))
        ));
        assert_eq!(parse_payment("  ", None).unwrap(), None);
    }
}
