use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// A customisation group offered on a menu item, e.g. "Spice Level".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OptionGroup {
    pub name: String,
    pub choices: Vec<String>,
    #[serde(default)]
    pub required: bool,
    /// Shown on the menu; not added to the line total.
    #[serde(default)]
    #[schema(value_type = String)]
    pub additional_cost: Decimal,
}

/// One chosen label, or several for multi-select groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum OptionValue {
    One(String),
    Many(Vec<String>),
}

impl OptionValue {
    fn labels(&self) -> impl Iterator<Item = &str> {
        let labels: Vec<&str> = match self {
            OptionValue::One(label) => vec![label.as_str()],
            OptionValue::Many(labels) => labels.iter().map(String::as_str).collect(),
        };
        labels.into_iter()
    }
}

/// Option-group name to chosen value(s).
pub type SelectedOptions = BTreeMap<String, OptionValue>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionError {
    #[error("unknown option `{0}`")]
    UnknownGroup(String),
    #[error("`{choice}` is not a valid choice for `{group}`")]
    InvalidChoice { group: String, choice: String },
    #[error("option `{0}` needs at least one choice")]
    EmptyChoice(String),
    #[error("option `{0}` is required")]
    MissingRequired(String),
}

/// New keys override old ones.
pub fn merge_options(existing: &mut SelectedOptions, incoming: SelectedOptions) {
    existing.extend(incoming);
}

pub fn validate_options(groups: &[OptionGroup], selected: &SelectedOptions) -> Result<(), OptionError> {
    for (name, value) in selected {
        let group = groups
            .iter()
            .find(|group| &group.name == name)
            .ok_or_else(|| OptionError::UnknownGroup(name.clone()))?;

        let mut labels = value.labels().peekable();
        if labels.peek().is_none() {
            return Err(OptionError::EmptyChoice(name.clone()));
        }
        for label in labels {
            if !group.choices.iter().any(|choice| choice == label) {
                return Err(OptionError::InvalidChoice {
                    group: name.clone(),
                    choice: label.to_string(),
                });
            }
        }
    }

    if let Some(missing) = groups
        .iter()
        .find(|group| group.required && !selected.contains_key(&group.name))
    {
        return Err(OptionError::MissingRequired(missing.name.clone()));
    }

    Ok(())
}
