use std::{iter::Peekable, str::Chars, str::FromStr};

use rust_decimal::Decimal;

use crate::errors::{LedgerError, Result};

const MAX_NESTING: usize = 64;

/// Evaluates a decimal arithmetic expression with `+ - * /` and parentheses.
///
/// Commas are accepted as thousands separators.
pub fn evaluate(expression: &str) -> Result<Decimal> {
    let mut parser = Parser {
        source: expression,
        chars: expression.chars().peekable(),
        depth: 0,
    };
    let value = parser.sum()?;
    parser.skip_whitespace();
    match parser.chars.next() {
        None => Ok(value),
        Some(c) => Err(parser.error(&format!("unexpected `{c}`"))),
    }
}

struct Parser<'a> {
    source: &'a str,
    chars: Peekable<Chars<'a>>,
    depth: usize,
}

impl Parser<'_> {
    fn error(&self, reason: &str) -> LedgerError {
        LedgerError::InvalidInput(format!("`{}`: {reason}", self.source.trim()))
    }

    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|c| c.is_whitespace()).is_some() {}
    }

    fn next_operator(&mut self, operators: &[char]) -> Option<char> {
        self.skip_whitespace();
        self.chars.next_if(|c| operators.contains(c))
    }

    fn sum(&mut self) -> Result<Decimal> {
        let mut value = self.product()?;
        while let Some(op) = self.next_operator(&['+', '-']) {
            let rhs = self.product()?;
            value = match op {
                '+' => value.checked_add(rhs),
                _ => value.checked_sub(rhs),
            }
            .ok_or_else(|| self.error("overflow"))?;
        }
        Ok(value)
    }

    fn product(&mut self) -> Result<Decimal> {
        let mut value = self.unary()?;
        while let Some(op) = self.next_operator(&['*', '/']) {
            let rhs = self.unary()?;
            value = match op {
                '*' => value.checked_mul(rhs).ok_or_else(|| self.error("overflow"))?,
                _ if rhs.is_zero() => return Err(self.error("division by zero")),
                _ => value.checked_div(rhs).ok_or_else(|| self.error("overflow"))?,
            };
        }
        Ok(value)
    }

    fn unary(&mut self) -> Result<Decimal> {
        let mut negative = false;
        while let Some(sign) = self.next_operator(&['+', '-']) {
            negative ^= sign == '-';
        }
        let value = self.atom()?;
        Ok(if negative { -value } else { value })
    }

    fn atom(&mut self) -> Result<Decimal> {
        self.skip_whitespace();
        if self.chars.next_if_eq(&'(').is_some() {
            if self.depth == MAX_NESTING {
                return Err(self.error("expression too deep"));
            }
            self.depth += 1;
            let value = self.sum()?;
            self.depth -= 1;
            self.skip_whitespace();
            return match self.chars.next() {
                Some(')') => Ok(value),
                _ => Err(self.error("missing `)`")),
            };
        }
        let mut digits = String::new();
        while let Some(c) = self.chars.next_if(|c| c.is_ascii_digit() || *c == '.' || *c == ',') {
            if c != ',' {
                digits.push(c);
            }
        }
        if digits.is_empty() {
            return Err(self.error("expected a number"));
        }
        Decimal::from_str(&digits).map_err(|_| self.error("invalid number"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn precedence_and_parentheses() {
        assert_eq!(evaluate("1 + 2 * 3").unwrap(), dec!(7));
        assert_eq!(evaluate("(1 + 2) * 3").unwrap(), dec!(9));
        assert_eq!(evaluate("10 - 4 - 3").unwrap(), dec!(3));
        assert_eq!(evaluate("-21.87/2").unwrap(), dec!(-10.935));
        assert_eq!(evaluate("1,204.50").unwrap(), dec!(1204.50));
    }

    #[test]
    fn long_sign_runs_and_deep_nesting() {
        assert_eq!(evaluate(&format!("{}1", "-".repeat(200_001))).unwrap(), dec!(-1));
        assert_eq!(evaluate("--+-2").unwrap(), dec!(-2));
        assert_eq!(evaluate("((((3))))").unwrap(), dec!(3));
        let deep = format!("{}1{}", "(".repeat(100_000), ")".repeat(100_000));
        assert!(matches!(evaluate(&deep), Err(LedgerError::InvalidInput(_))));
    }

    #[test]
    fn malformed_expressions_are_invalid_input() {
        for bad in ["", "2 +", "4 / 0", "(1 + 2", "1.2.3", "3 EUR"] {
            assert!(
                matches!(evaluate(bad), Err(LedgerError::InvalidInput(_))),
                "{bad}"
            );
        }
    }
}
