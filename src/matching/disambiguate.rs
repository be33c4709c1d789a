use super::Matcher;
use crate::errors::{LedgerError, Result};

/// Outcome of one resolution step.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(String),
    /// More than one candidate fits; the caller narrows the choice and resolves again.
    Ambiguous(AmbiguousChoice),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AmbiguousChoice {
    pub search: Option<String>,
    pub matches: Vec<String>,
}

impl Resolution {
    /// The resolved value, or the ambiguity as [`LedgerError::AmbiguousChoice`].
    pub fn into_value(self) -> Result<String> {
        match self {
            Resolution::Resolved(value) => Ok(value),
            Resolution::Ambiguous(choice) => Err(LedgerError::AmbiguousChoice {
                search: choice.search.unwrap_or_default(),
                matches: choice.matches,
            }),
        }
    }
}

type Membership<'a> = Box<dyn Fn(&str) -> bool + 'a>;

/// Resolves free text to a single value from a known population.
///
/// Literal values outside the population are accepted unless a membership
/// predicate is installed with [`Disambiguator::strict`].
pub struct Disambiguator<'a, M: Matcher> {
    matcher: &'a M,
    population: &'a [String],
    limit: usize,
    membership: Option<Membership<'a>>,
}

impl<'a, M: Matcher> Disambiguator<'a, M> {
    pub fn new(matcher: &'a M, population: &'a [String], limit: usize) -> Self {
        Self {
            matcher,
            population,
            limit: limit.max(1),
            membership: None,
        }
    }

    /// Requires every resolved value to satisfy `is_member`.
    pub fn strict(mut self, is_member: impl Fn(&str) -> bool + 'a) -> Self {
        self.membership = Some(Box::new(is_member));
        self
    }

    pub fn is_strict(&self) -> bool {
        self.membership.is_some()
    }

    /// Resolves `input` against `choices` when given, the whole population otherwise.
    pub fn resolve(&self, input: Option<&str>, choices: Option<&[String]>) -> Result<Resolution> {
        if let Some([only]) = choices {
            return self.accept(only);
        }
        let pool = match choices {
            Some(choices) if !choices.is_empty() => choices,
            _ => self.population,
        };
        let input = input.map(str::trim).filter(|input| !input.is_empty());

        if let Some(term) = input {
            let lowered = term.to_lowercase();
            if let Some(exact) = pool
                .iter()
                .find(|candidate| candidate.trim().to_lowercase() == lowered)
            {
                tracing::debug!(term, value = %exact, "exact match");
                return self.accept(exact);
            }
        }

        let matches: Vec<String> = self
            .matcher
            .rank(pool, input, self.limit)
            .into_iter()
            .map(|(candidate, _)| candidate)
            .collect();

        match (matches.as_slice(), input) {
            ([only], _) => self.accept(only),
            ([], Some(term)) => self.accept(term),
            _ => Ok(Resolution::Ambiguous(AmbiguousChoice {
                search: input.map(str::to_string),
                matches,
            })),
        }
    }

    fn accept(&self, value: &str) -> Result<Resolution> {
        match &self.membership {
            Some(is_member) if !is_member(value) => {
                Err(LedgerError::InvalidChoice(value.to_string()))
            }
            _ => Ok(Resolution::Resolved(value.to_string())),
        }
    }
}
