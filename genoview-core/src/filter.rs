use crate::features::{Annotated, AttrValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Predicate over one feature attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum FilterPredicate {
    /// Case-insensitive text equality, numeric equality for numbers.
    Equals(String),
    OneOf(Vec<String>),
    /// Case-insensitive substring.
    Contains(String),
    /// Inclusive numeric range; an absent bound is open.
    Range { min: Option<f64>, max: Option<f64> },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilterSyntaxError {
    #[error("filter value '{0}' has no operator prefix")]
    MissingOperator(String),
    #[error("unknown filter operator '{0}'")]
    UnknownOperator(String),
    #[error("invalid range bound '{0}'")]
    BadBound(String),
}

const LIST_SEPARATOR: char = '|';
const ESCAPE: char = '\\';

fn escape_item(item: &str) -> String {
    let mut out = String::with_capacity(item.len());
    for ch in item.chars() {
        if ch == LIST_SEPARATOR || ch == ESCAPE {
            out.push(ESCAPE);
        }
        out.push(ch);
    }
    out
}

/// Splits on unescaped separators; `\|` and `\\` stand for literal
/// characters.
fn split_items(value: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        match ch {
            ESCAPE => current.push(chars.next().unwrap_or(ESCAPE)),
            LIST_SEPARATOR => items.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    items.push(current);
    items.retain(|item| !item.is_empty());
    items
}

fn text_equals(attr: &AttrValue, expected: &str) -> bool {
    match attr {
        AttrValue::Text(s) => s.eq_ignore_ascii_case(expected.trim()),
        AttrValue::Number(n) => expected.trim().parse::<f64>().map_or(false, |e| e == *n),
    }
}

impl FilterPredicate {
    pub fn range(min: Option<f64>, max: Option<f64>) -> Self {
        FilterPredicate::Range { min, max }
    }

    pub fn matches(&self, attr: &AttrValue) -> bool {
        match self {
            FilterPredicate::Equals(expected) => text_equals(attr, expected),
            FilterPredicate::OneOf(options) => options.iter().any(|o| text_equals(attr, o)),
            FilterPredicate::Contains(needle) => attr
                .to_string()
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            FilterPredicate::Range { min, max } => match attr.as_number() {
                Some(v) => min.map_or(true, |m| v >= m) && max.map_or(true, |m| v <= m),
                None => false,
            },
        }
    }

    /// Compact form used in URL parameters: `eq:x`, `in:a|b`, `has:x`,
    /// `range:min..max`. A `|` or `\` inside an `in:` item is escaped with
    /// a backslash.
    pub fn to_url_value(&self) -> String {
        let bound = |b: &Option<f64>| b.map(|v| v.to_string()).unwrap_or_default();
        match self {
            FilterPredicate::Equals(v) => format!("eq:{v}"),
            FilterPredicate::OneOf(vs) => {
                let items: Vec<String> = vs.iter().map(|v| escape_item(v)).collect();
                format!("in:{}", items.join("|"))
            }
            FilterPredicate::Contains(v) => format!("has:{v}"),
            FilterPredicate::Range { min, max } => {
                format!("range:{}..{}", bound(min), bound(max))
            }
        }
    }

    pub fn parse_url_value(raw: &str) -> Result<Self, FilterSyntaxError> {
        let (op, value) = raw
            .split_once(':')
            .ok_or_else(|| FilterSyntaxError::MissingOperator(raw.to_string()))?;
        match op {
            "eq" => Ok(FilterPredicate::Equals(value.to_string())),
            "in" => Ok(FilterPredicate::OneOf(split_items(value))),
            "has" => Ok(FilterPredicate::Contains(value.to_string())),
            "range" => {
                let (lo, hi) = value
                    .split_once("..")
                    .ok_or_else(|| FilterSyntaxError::BadBound(value.to_string()))?;
                let parse = |s: &str| -> Result<Option<f64>, FilterSyntaxError> {
                    if s.trim().is_empty() {
                        Ok(None)
                    } else {
                        s.trim()
                            .parse::<f64>()
                            .map(Some)
                            .map_err(|_| FilterSyntaxError::BadBound(s.to_string()))
                    }
                };
                Ok(FilterPredicate::Range {
                    min: parse(lo)?,
                    max: parse(hi)?,
                })
            }
            other => Err(FilterSyntaxError::UnknownOperator(other.to_string())),
        }
    }
}

/// Attribute filters combined with logical AND.
///
/// A filter only constrains features that expose its attribute key, so a
/// `consequence` filter leaves genes and signal untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSet(BTreeMap<String, FilterPredicate>);

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, predicate: FilterPredicate) {
        self.0.insert(key.into(), predicate);
    }

    pub fn remove(&mut self, key: &str) -> Option<FilterPredicate> {
        self.0.remove(key)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn get(&self, key: &str) -> Option<&FilterPredicate> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FilterPredicate)> {
        self.0.iter()
    }

    pub fn matches<T: Annotated + ?Sized>(&self, feature: &T) -> bool {
        self.0.iter().all(|(key, predicate)| match feature.attribute(key) {
            Some(value) => predicate.matches(&value),
            None => true,
        })
    }
}

impl FromIterator<(String, FilterPredicate)> for FilterSet {
    fn from_iter<I: IntoIterator<Item = (String, FilterPredicate)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
