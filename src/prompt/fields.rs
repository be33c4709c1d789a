use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::{Field, Notice, Prompter};
use crate::{
    config::DateOrder,
    dates::parse_date,
    errors::{LedgerError, Result},
    ledger::Amount,
    matching::{Disambiguator, Matcher, Resolution},
    split::{compute_split, parse_payment},
};

const SEARCH_AGAIN: &str = "Search again";
const DIFFERENT_VALUE: &str = "Enter a different value";

/// Runs `attempt` until it succeeds or fails with an unrecoverable error.
///
/// Recoverable failures are shown to the user as warnings.
pub fn retry<P, T>(prompter: &mut P, mut attempt: impl FnMut(&mut P) -> Result<T>) -> Result<T>
where
    P: Prompter + ?Sized,
{
    loop {
        match attempt(prompter) {
            Err(err) if err.is_recoverable() => {
                tracing::debug!(error = %err, "retrying prompt");
                prompter.notify(Notice::warning(err.to_string()));
            }
            other => return other,
        }
    }
}

pub fn prompt_date<P: Prompter + ?Sized>(
    prompter: &mut P,
    message: &str,
    default: Option<&str>,
    today: NaiveDate,
    order: DateOrder,
) -> Result<NaiveDate> {
    retry(prompter, |prompter| {
        let text = prompter.text(Field::Date, message, default)?;
        parse_date(&text, today, order)
    })
}

/// Payment as `<amount> <CURRENCY>`; `None` when empty input is allowed and given.
pub fn prompt_payment<P: Prompter + ?Sized>(
    prompter: &mut P,
    message: &str,
    default: Option<&str>,
    default_currency: Option<&str>,
    allow_empty: bool,
) -> Result<Option<Amount>> {
    retry(prompter, |prompter| {
        let text = prompter.text(Field::Payment, message, default)?;
        match parse_payment(&text, default_currency)? {
            None if !allow_empty => Err(LedgerError::InvalidInput("a value is required".into())),
            payment => Ok(payment),
        }
    })
}

/// Value of a split of `total`, entered as a fraction or an amount in the total's currency.
pub fn prompt_split<P: Prompter + ?Sized>(
    prompter: &mut P,
    message: &str,
    total: &Amount,
    default: Option<&str>,
) -> Result<Decimal> {
    retry(prompter, |prompter| {
        let text = prompter.text(Field::Split, message, default)?;
        compute_split(total.number, &total.currency, &text)
    })
}

/// What to resolve and how to ask for it.
#[derive(Debug, Clone, Copy)]
pub struct FieldRequest<'a> {
    pub field: Field,
    pub message: &'a str,
    /// Value supplied up front (template or command line), resolved before any prompt.
    pub initial: Option<&'a str>,
    /// Restricts the first resolution to these candidates.
    pub choices: Option<&'a [String]>,
    /// Offered as the text prompt's default.
    pub suggestion: Option<&'a str>,
    /// An empty answer is a valid (empty) value.
    pub allow_empty: bool,
}

impl<'a> FieldRequest<'a> {
    pub fn new(field: Field, message: &'a str) -> Self {
        Self {
            field,
            message,
            initial: None,
            choices: None,
            suggestion: None,
            allow_empty: false,
        }
    }
}

/// Drives a [`Disambiguator`] until it settles on one value, asking the user to pick
/// among close matches, search again or keep their literal input.
pub fn resolve_interactively<P, M>(
    prompter: &mut P,
    disambiguator: &Disambiguator<'_, M>,
    request: FieldRequest<'_>,
) -> Result<String>
where
    P: Prompter + ?Sized,
    M: Matcher,
{
    let mut input = request.initial.map(str::to_string);
    let mut choices = request.choices.map(<[String]>::to_vec);
    loop {
        if input.is_none() && choices.is_none() {
            let text = prompter.text(request.field, request.message, request.suggestion)?;
            if text.trim().is_empty() {
                if request.allow_empty {
                    return Ok(String::new());
                }
                prompter.notify(Notice::warning("A value is required"));
                continue;
            }
            input = Some(text);
        }

        let choice = match disambiguator.resolve(input.as_deref(), choices.as_deref()) {
            Ok(Resolution::Resolved(value)) => return Ok(value),
            Ok(Resolution::Ambiguous(choice)) => choice,
            Err(err) if err.is_recoverable() => {
                prompter.notify(Notice::warning(err.to_string()));
                input = None;
                choices = None;
                continue;
            }
            Err(err) => return Err(err),
        };
        if choice.matches.is_empty() {
            input = None;
            choices = None;
            continue;
        }

        let literal = input
            .as_deref()
            .filter(|_| !disambiguator.is_strict())
            .map(|typed| format!("Use \"{}\" as typed", typed.trim()));
        let mut items = choice.matches.clone();
        items.push(SEARCH_AGAIN.to_string());
        items.push(literal.clone().unwrap_or_else(|| DIFFERENT_VALUE.to_string()));
        let title = match &choice.search {
            Some(search) => format!("Several matches for \"{search}\""),
            None => request.message.to_string(),
        };

        let picked = retry(prompter, |prompter| prompter.choose(&title, &items))?;
        match picked {
            index if index < choice.matches.len() => {
                let value = choice.matches[index].clone();
                input = Some(value.clone());
                choices = Some(vec![value]);
            }
            index if index == choice.matches.len() => {
                input = None;
                choices = None;
            }
            _ => match (literal, input.take()) {
                (Some(_), Some(typed)) => return Ok(typed.trim().to_string()),
                _ => choices = None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{matching::FuzzyMatcher, prompt::ScriptedPrompter};

    fn accounts() -> Vec<String> {
        ["Assets:Cash", "Expenses:Food:Groceries", "Expenses:Food:Restaurant"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn ambiguity_is_settled_from_the_menu() {
        let population = accounts();
        let matcher = FuzzyMatcher::default();
        let disambiguator = Disambiguator::new(&matcher, &population, 5);
        let mut prompter = ScriptedPrompter::new(["food", "2"]);
        let value = resolve_interactively(
            &mut prompter,
            &disambiguator,
            FieldRequest::new(Field::Account, "Account"),
        )
        .unwrap();
        assert_eq!(value, "Expenses:Food:Restaurant");
    }

    #[test]
    fn free_field_keeps_literal_input() {
        let population = vec!["Bakery".to_string(), "Bake Shop".to_string()];
        let matcher = FuzzyMatcher::new(0.3);
        let disambiguator = Disambiguator::new(&matcher, &population, 5);
        let mut prompter = ScriptedPrompter::new(["bak", "4"]);
        let value = resolve_interactively(
            &mut prompter,
            &disambiguator,
            FieldRequest::new(Field::Payee, "Payee"),
        )
        .unwrap();
        assert_eq!(value, "bak");
    }

    #[test]
    fn strict_field_reprompts_after_invalid_choice() {
        let population = accounts();
        let matcher = FuzzyMatcher::default();
        let disambiguator = Disambiguator::new(&matcher, &population, 5)
            .strict(|value| population.iter().any(|known| known == value));
        let mut prompter = ScriptedPrompter::new(["Liabilities:Card", "cash"]);
        let value = resolve_interactively(
            &mut prompter,
            &disambiguator,
            FieldRequest::new(Field::Account, "Account"),
        )
        .unwrap();
        assert_eq!(value, "Assets:Cash");
        assert!(prompter.notices()[0].message.contains("Liabilities:Card"));
    }

    #[test]
    fn empty_answer_allowed_for_optional_fields() {
        let population = Vec::new();
        let matcher = FuzzyMatcher::default();
        let disambiguator = Disambiguator::new(&matcher, &population, 5);
        let mut prompter = ScriptedPrompter::new(["<BLANK>"]);
        let mut request = FieldRequest::new(Field::Narration, "Narration");
        request.allow_empty = true;
        assert_eq!(
            resolve_interactively(&mut prompter, &disambiguator, request).unwrap(),
            ""
        );
    }

    #[test]
    fn invalid_payment_is_retried() {
        let mut prompter = ScriptedPrompter::new(["12 eur", "21.87/2 EUR"]);
        let amount = prompt_payment(&mut prompter, "Value", None, None, false)
            .unwrap()
            .unwrap();
        assert_eq!(amount.currency, "EUR");
        assert_eq!(prompter.notices().len(), 1);
    }

    #[test]
    fn split_prompt_uses_default() {
        let total = Amount::new(Decimal::new(10000, 2), "USD");
        let mut prompter = ScriptedPrompter::new(["1.5", "<KEEP>"]);
        let value = prompt_split(&mut prompter, "Split", &total, Some("-0.5")).unwrap();
        assert_eq!(value, Decimal::new(-5000, 2));
    }
}
