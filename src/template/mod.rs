//! Reusable transaction templates read from `templates.yaml`.
//!
//! ```yaml
//! rent:
//!   payee: Landlord
//!   narration: false
//!   lines:
//!     - account: Expenses:Housing:Rent
//!       value: 950.00 EUR
//!       splits:
//!         - account: Assets:Receivable:Flatmate
//!           value: -0.5
//!     - account: [Assets:Bank:Checking, Assets:Bank:Savings]
//!       no_value: true
//! ```

use std::{fs, path::Path};

use serde::Deserialize;

use crate::{
    errors::{LedgerError, Result},
    matching::Matcher,
};

/// Template field that may be left to the user, forced empty, fixed, or suggested.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Option<RawField>")]
pub enum TriState {
    #[default]
    Unset,
    ForceEmpty,
    Fixed(String),
    Suggestions(Vec<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawField {
    Flag(bool),
    One(String),
    Many(Vec<String>),
}

impl From<Option<RawField>> for TriState {
    fn from(raw: Option<RawField>) -> Self {
        match raw {
            None | Some(RawField::Flag(true)) => TriState::Unset,
            Some(RawField::Flag(false)) => TriState::ForceEmpty,
            Some(RawField::One(value)) => TriState::Fixed(value),
            Some(RawField::Many(values)) if values.is_empty() => TriState::Unset,
            Some(RawField::Many(mut values)) if values.len() == 1 => {
                TriState::Fixed(values.remove(0))
            }
            Some(RawField::Many(values)) => TriState::Suggestions(values),
        }
    }
}

/// One string or a list of strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Option<OneOrMany>")]
pub struct Choices(pub Vec<String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl From<Option<OneOrMany>> for Choices {
    fn from(raw: Option<OneOrMany>) -> Self {
        match raw {
            None => Choices(Vec::new()),
            Some(OneOrMany::One(value)) => Choices(vec![value]),
            Some(OneOrMany::Many(values)) => Choices(values),
        }
    }
}

impl Choices {
    pub fn as_option(&self) -> Option<&[String]> {
        if self.0.is_empty() {
            None
        } else {
            Some(self.0.as_slice())
        }
    }
}

/// Numbers and strings are both accepted where YAML authors write amounts.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Number(f64),
    Text(String),
}

fn scalar_as_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(|scalar| match scalar {
        Scalar::Number(number) => number.to_string(),
        Scalar::Text(text) => text,
    }))
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LineSpec {
    pub account: Choices,
    /// Payment such as `-12.50 EUR`.
    #[serde(deserialize_with = "scalar_as_string")]
    pub value: Option<String>,
    pub no_value: bool,
    pub splits: Option<Vec<SplitSpec>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SplitSpec {
    pub account: Choices,
    /// Fraction of the line value or `<amount> <CURRENCY>`.
    #[serde(deserialize_with = "scalar_as_string")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Template {
    #[serde(skip)]
    pub label: String,
    pub date: Option<String>,
    pub payee: TriState,
    pub narration: TriState,
    pub lines: Option<Vec<LineSpec>>,
}

/// Templates in file order.
#[derive(Debug, Clone, Default)]
pub struct TemplateStore {
    templates: Vec<Template>,
}

impl TemplateStore {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(LedgerError::TemplateStore(format!(
                "template file `{}` not found",
                path.display()
            )));
        }
        let contents = fs::read_to_string(path)?;
        let store = Self::from_yaml(&contents)?;
        tracing::debug!(path = %path.display(), count = store.templates.len(), "loaded templates");
        Ok(store)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let mapping: serde_yaml::Mapping = serde_yaml::from_str(contents)?;
        let mut templates = Vec::with_capacity(mapping.len());
        for (key, value) in mapping {
            let label = match key {
                serde_yaml::Value::String(label) => label,
                other => {
                    return Err(LedgerError::TemplateStore(format!(
                        "template label must be a string, got {other:?}"
                    )))
                }
            };
            let mut template: Template = serde_yaml::from_value(value)
                .map_err(|err| LedgerError::TemplateStore(format!("template `{label}`: {err}")))?;
            template.label = label;
            templates.push(template);
        }
        Ok(Self { templates })
    }

    pub fn get(&self, label: &str) -> Result<&Template> {
        self.templates
            .iter()
            .find(|template| template.label == label)
            .ok_or_else(|| LedgerError::TemplateNotFound(label.to_string()))
    }

    pub fn labels(&self) -> Vec<String> {
        self.templates
            .iter()
            .map(|template| template.label.clone())
            .collect()
    }

    pub fn search<M: Matcher>(&self, matcher: &M, term: Option<&str>, limit: usize) -> Vec<String> {
        matcher
            .rank(&self.labels(), term, limit)
            .into_iter()
            .map(|(label, _)| label)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::FuzzyMatcher;

    const YAML: &str = r#"
rent:
  payee: Landlord
  narration: false
  lines:
    - account: Expenses:Housing:Rent
      value: 950.00 EUR
      splits:
        - account: Assets:Receivable:Flatmate
          value: -0.5
    - account: [Assets:Bank:Checking, Assets:Bank:Savings]
      no_value: true
groceries:
  payee: [Market, Corner Shop]
  date: today
coffee:
  payee: true
"#;

    #[test]
    fn tri_state_fields() {
        let store = TemplateStore::from_yaml(YAML).unwrap();
        let rent = store.get("rent").unwrap();
        assert_eq!(rent.payee, TriState::Fixed("Landlord".into()));
        assert_eq!(rent.narration, TriState::ForceEmpty);
        let groceries = store.get("groceries").unwrap();
        assert_eq!(
            groceries.payee,
            TriState::Suggestions(vec!["Market".into(), "Corner Shop".into()])
        );
        assert_eq!(groceries.narration, TriState::Unset);
        assert_eq!(groceries.date.as_deref(), Some("today"));
        assert_eq!(store.get("coffee").unwrap().payee, TriState::Unset);
    }

    #[test]
    fn lines_and_splits() {
        let store = TemplateStore::from_yaml(YAML).unwrap();
        let lines = store.get("rent").unwrap().lines.clone().unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].account.0, vec!["Expenses:Housing:Rent"]);
        assert_eq!(lines[0].value.as_deref(), Some("950.00 EUR"));
        let splits = lines[0].splits.as_ref().unwrap();
        assert_eq!(splits[0].value.as_deref(), Some("-0.5"));
        assert!(lines[1].no_value);
        assert_eq!(lines[1].account.0.len(), 2);
    }

    #[test]
    fn unknown_label_is_not_found() {
        let store = TemplateStore::from_yaml(YAML).unwrap();
        assert!(matches!(
            store.get("salary"),
            Err(LedgerError::TemplateNotFound(label)) if label == "salary"
        ));
    }

    #[test]
    fn labels_keep_file_order_and_search() {
        let store = TemplateStore::from_yaml(YAML).unwrap();
        assert_eq!(store.labels(), vec!["rent", "groceries", "coffee"]);
        assert_eq!(
            store.search(&FuzzyMatcher::default(), Some("groc"), 5),
            vec!["groceries"]
        );
    }

    #[test]
    fn missing_file_is_a_store_error() {
        let temp = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            TemplateStore::load(&temp.path().join("templates.yaml")),
            Err(LedgerError::TemplateStore(_))
        ));
    }
}
