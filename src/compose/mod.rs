//! Builds a transaction from a template, command-line overrides and prompts.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::{
    config::Config,
    dates::parse_date,
    errors::Result,
    ledger::{format_number, Amount, Entry, Flag, LedgerSession, Posting},
    matching::{Disambiguator, FuzzyMatcher},
    prompt::{
        prompt_date, prompt_payment, prompt_split, resolve_interactively, Field, FieldRequest,
        Notice, Prompter,
    },
    split::{compute_split, parse_payment, DEFAULT_SPLIT},
    template::{LineSpec, SplitSpec, Template, TriState},
};

/// Values given on the command line. They take precedence over template values.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub date: Option<String>,
    pub payee: Option<String>,
    pub narration: Option<String>,
    pub tags: Vec<String>,
    pub incomplete: bool,
    /// Offer splits for valued lines.
    pub split: bool,
}

/// A composed entry awaiting confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub entry: Entry,
    pub warnings: Vec<String>,
}

/// Collects every field of a new entry. Nothing is written.
pub struct TransactionComposer<'a, P: Prompter + ?Sized> {
    session: &'a LedgerSession,
    prompter: &'a mut P,
    matcher: FuzzyMatcher,
    today: NaiveDate,
    accounts: Vec<String>,
    warnings: Vec<String>,
}

impl<'a, P: Prompter + ?Sized> TransactionComposer<'a, P> {
    pub fn new(session: &'a LedgerSession, prompter: &'a mut P, today: NaiveDate) -> Result<Self> {
        let matcher = FuzzyMatcher::new(session.config().match_threshold);
        Ok(Self {
            session,
            prompter,
            matcher,
            today,
            accounts: session.accounts()?,
            warnings: Vec::new(),
        })
    }

    fn config(&self) -> &Config {
        self.session.config()
    }

    fn info(&mut self, message: impl Into<String>) {
        self.prompter.notify(Notice::info(message));
    }

    fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(%message, "composer warning");
        self.warnings.push(message.clone());
        self.prompter.notify(Notice::warning(message));
    }

    pub fn compose(mut self, template: Option<&Template>, overrides: &Overrides) -> Result<Draft> {
        let date = self.date(template, overrides)?;
        self.info(format!("Date will be {date}"));

        let payee = self.payee(template, overrides)?;
        match &payee {
            Some(payee) => self.info(format!("Payee will be {payee}")),
            None => self.info("No payee"),
        }
        let narration = self.narration(template, overrides, payee.as_deref())?;
        match &narration {
            Some(narration) => self.info(format!("Narration will be {narration}")),
            None => self.info("No narration"),
        }

        let mut entry = Entry::new(date);
        entry.flag = if overrides.incomplete {
            Flag::Incomplete
        } else {
            Flag::Complete
        };
        entry.payee = payee;
        entry.narration = narration;
        entry.tags = overrides
            .tags
            .iter()
            .map(|tag| tag.trim_start_matches('#').to_string())
            .filter(|tag| !tag.is_empty())
            .collect();

        match template.and_then(|template| template.lines.as_ref()) {
            Some(lines) => {
                let total = lines.len();
                for (index, line) in lines.iter().enumerate() {
                    self.info(format!("Adding line {} of {total}...", index + 1));
                    self.add_line(&mut entry, line, index + 1, overrides.split)?;
                }
                let mut lineno = total;
                while lineno < 2 {
                    lineno += 1;
                    self.info(format!(
                        "Template provides only {total} line(s); adding line {lineno}."
                    ));
                    self.add_line(&mut entry, &LineSpec::default(), lineno, overrides.split)?;
                }
            }
            None => {
                let mut lineno = 1;
                loop {
                    self.info(format!("Adding line {lineno}..."));
                    self.add_line(&mut entry, &LineSpec::default(), lineno, overrides.split)?;
                    if lineno >= 2 && !self.prompter.confirm("Add another line?", false)? {
                        break;
                    }
                    lineno += 1;
                }
            }
        }

        tracing::debug!(postings = entry.postings.len(), %date, "composed entry");
        Ok(Draft {
            entry,
            warnings: self.warnings,
        })
    }

    fn date(&mut self, template: Option<&Template>, overrides: &Overrides) -> Result<NaiveDate> {
        let order = self.config().date_order;
        let given = overrides
            .date
            .as_deref()
            .or_else(|| template.and_then(|template| template.date.as_deref()));
        if let Some(given) = given {
            match parse_date(given, self.today, order) {
                Ok(date) => return Ok(date),
                Err(err) => self.warn(err.to_string()),
            }
        }
        prompt_date(&mut *self.prompter, "Enter date", Some("today"), self.today, order)
    }

    fn payee(&mut self, template: Option<&Template>, overrides: &Overrides) -> Result<Option<String>> {
        let field = template.map(|template| &template.payee);
        let population = self.session.payees()?;
        self.free_field(Field::Payee, "Enter payee", field, overrides.payee.as_deref(), &population, None)
    }

    fn narration(
        &mut self,
        template: Option<&Template>,
        overrides: &Overrides,
        payee: Option<&str>,
    ) -> Result<Option<String>> {
        let field = template.map(|template| &template.narration);
        let population = self.session.narrations()?;
        let suggestion = match payee {
            Some(payee) => self.session.narrations_for(Some(payee))?.into_iter().next(),
            None => None,
        };
        self.free_field(
            Field::Narration,
            "Enter narration",
            field,
            overrides.narration.as_deref(),
            &population,
            suggestion.as_deref(),
        )
    }

    /// Payee and narration: any value is accepted and empty means absent.
    fn free_field(
        &mut self,
        field: Field,
        message: &str,
        template: Option<&TriState>,
        given: Option<&str>,
        population: &[String],
        suggestion: Option<&str>,
    ) -> Result<Option<String>> {
        let limit = self.config().match_limit;
        let disambiguator = Disambiguator::new(&self.matcher, population, limit);
        let mut request = FieldRequest::new(field, message);
        request.allow_empty = true;
        request.suggestion = suggestion;

        let template = template.cloned().unwrap_or_default();
        match (given, &template) {
            (Some(given), _) => {
                if given.trim().is_empty() {
                    return Ok(None);
                }
                request.initial = Some(given);
            }
            (None, TriState::ForceEmpty) => return Ok(None),
            (None, TriState::Fixed(value)) => request.choices = Some(std::slice::from_ref(value)),
            (None, TriState::Suggestions(values)) => request.choices = Some(values.as_slice()),
            (None, TriState::Unset) => {}
        }

        let value = resolve_interactively(&mut *self.prompter, &disambiguator, request)?;
        Ok(Some(value).filter(|value| !value.trim().is_empty()))
    }

    fn account(&mut self, message: &str, choices: Option<&[String]>, suggestion: Option<&str>) -> Result<String> {
        let limit = self.config().match_limit;
        let accounts = &self.accounts;
        let disambiguator = Disambiguator::new(&self.matcher, accounts, limit)
            .strict(|value| accounts.iter().any(|account| account == value));
        let mut request = FieldRequest::new(Field::Account, message);
        request.choices = choices;
        request.suggestion = suggestion;
        resolve_interactively(&mut *self.prompter, &disambiguator, request)
    }

    fn add_line(&mut self, entry: &mut Entry, line: &LineSpec, lineno: usize, offer_splits: bool) -> Result<()> {
        let suggestion = match line.account.as_option() {
            Some(_) => None,
            None => self
                .session
                .accounts_for(entry.payee.as_deref(), None, Some(lineno))?
                .into_iter()
                .next(),
        };
        let account = self.account("Choose account", line.account.as_option(), suggestion.as_deref())?;
        self.info(format!("Account will be {account}"));

        let units = if line.no_value {
            None
        } else {
            self.line_value(line.value.as_deref())?
        };
        match &units {
            Some(units) => self.info(format!("Value will be {units}")),
            None => self.info("Value will be empty"),
        }
        entry.add_posting(Posting {
            account: account.clone(),
            units: units.clone(),
        });

        let Some(total) = units else {
            return Ok(());
        };
        if !offer_splits {
            return Ok(());
        }
        match &line.splits {
            Some(splits) => {
                for split in splits {
                    self.add_split(entry, &account, &total, split)?;
                }
            }
            None => {
                let mut question = "Add split?";
                while self.prompter.confirm(question, false)? {
                    self.add_split(entry, &account, &total, &SplitSpec::default())?;
                    question = "Add another split?";
                }
            }
        }
        Ok(())
    }

    fn line_value(&mut self, given: Option<&str>) -> Result<Option<Amount>> {
        let default_currency = self.config().default_currency.clone();
        if let Some(given) = given {
            match parse_payment(given, default_currency.as_deref()) {
                Ok(amount) => return Ok(amount),
                Err(err) => self.warn(err.to_string()),
            }
        }
        prompt_payment(
            &mut *self.prompter,
            "Enter value",
            None,
            default_currency.as_deref(),
            true,
        )
    }

    fn add_split(&mut self, entry: &mut Entry, account: &str, total: &Amount, split: &SplitSpec) -> Result<()> {
        let message = format!("Choose split account for {account}");
        let split_account = self.account(&message, split.account.as_option(), None)?;
        self.info(format!("Split account will be {split_account}"));

        let given = match split.value.as_deref() {
            Some(spec) => match compute_split(total.number, &total.currency, spec) {
                Ok(value) => Some(value),
                Err(err) => {
                    self.warn(err.to_string());
                    None
                }
            },
            None => None,
        };
        let value = match given {
            Some(value) => value,
            None => prompt_split(
                &mut *self.prompter,
                "Choose split (fraction or amount with currency)",
                total,
                Some(DEFAULT_SPLIT),
            )?,
        };

        if value == Decimal::ZERO {
            self.warn("Zero value split ignored");
            return Ok(());
        }
        self.info(format!(
            "{total} will be split into {split_account} with value {} {}",
            format_number(value),
            total.currency
        ));
        entry.add_posting(Posting::with_units(split_account, value, total.currency.clone()));
        Ok(())
    }
}
