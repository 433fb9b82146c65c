//! Shareable view state as a URL query string.
//!
//! `?chr=17&start=7565097&end=7590856&samples=S001,S004&features=TP53&filter.consequence=eq:missense`
//!
//! Coordinates are the stored 0-based values. Parameters are written in a
//! fixed order with percent-encoded values, so equal states serialize to
//! equal strings. Unknown parameters are ignored on parse.

use crate::cohort::CohortSnapshot;
use crate::error::RegionError;
use crate::events::SelectionSnapshot;
use crate::filter::{FilterPredicate, FilterSet, FilterSyntaxError};
use crate::types::{FeatureId, GenomicRegion};
use std::collections::BTreeSet;
use thiserror::Error;

const FILTER_PREFIX: &str = "filter.";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UrlStateError {
    #[error("missing parameter '{0}'")]
    MissingParameter(&'static str),

    #[error("parameter '{key}' is not a number: '{value}'")]
    BadNumber { key: String, value: String },

    #[error("cannot decode '{0}'")]
    Decode(String),

    #[error(transparent)]
    Region(#[from] RegionError),

    #[error("filter '{key}': {error}")]
    Filter { key: String, error: FilterSyntaxError },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UrlState {
    pub region: Option<GenomicRegion>,
    pub samples: BTreeSet<String>,
    pub features: BTreeSet<FeatureId>,
    pub filters: FilterSet,
}

fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

fn decode(value: &str) -> Result<String, UrlStateError> {
    urlencoding::decode(value)
        .map(|v| v.into_owned())
        .map_err(|_| UrlStateError::Decode(value.to_string()))
}

fn encode_list<'a>(items: impl Iterator<Item = &'a str>) -> String {
    items.map(encode).collect::<Vec<_>>().join(",")
}

fn parse_number(key: &str, value: &str) -> Result<u64, UrlStateError> {
    value
        .trim()
        .replace(',', "")
        .parse()
        .map_err(|_| UrlStateError::BadNumber {
            key: key.to_string(),
            value: value.to_string(),
        })
}

impl UrlState {
    pub fn from_snapshot(snapshot: &CohortSnapshot) -> Self {
        Self {
            region: snapshot.active_region.clone(),
            samples: snapshot.selection.samples.clone(),
            features: snapshot.selection.features.clone(),
            filters: snapshot.filters.clone(),
        }
    }

    pub fn selection(&self) -> SelectionSnapshot {
        SelectionSnapshot {
            samples: self.samples.clone(),
            features: self.features.clone(),
        }
    }

    /// Serializes to `?key=value&...`; an empty state yields `""`.
    pub fn to_query_string(&self) -> String {
        let mut params: Vec<(String, String)> = Vec::new();
        if let Some(region) = &self.region {
            let chrom = region.chromosome();
            let short = chrom.strip_prefix("chr").unwrap_or(chrom);
            params.push(("chr".into(), encode(short)));
            params.push(("start".into(), region.start().to_string()));
            params.push(("end".into(), region.end().to_string()));
        }
        if !self.samples.is_empty() {
            params.push(("samples".into(), encode_list(self.samples.iter().map(String::as_str))));
        }
        if !self.features.is_empty() {
            params.push(("features".into(), encode_list(self.features.iter().map(FeatureId::as_str))));
        }
        for (key, predicate) in self.filters.iter() {
            params.push((
                format!("{FILTER_PREFIX}{}", encode(key)),
                encode(&predicate.to_url_value()),
            ));
        }
        if params.is_empty() {
            return String::new();
        }
        let body: Vec<String> = params.into_iter().map(|(k, v)| format!("{k}={v}")).collect();
        format!("?{}", body.join("&"))
    }

    /// Parses a query string with or without the leading `?`.
    pub fn parse(query: &str) -> Result<Self, UrlStateError> {
        let query = query.trim();
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut state = UrlState::default();
        let (mut chr, mut start, mut end) = (None, None, None);

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = decode(raw_key)?;
            match key.as_str() {
                "chr" => chr = Some(decode(raw_value)?),
                "start" => start = Some(parse_number("start", &decode(raw_value)?)?),
                "end" => end = Some(parse_number("end", &decode(raw_value)?)?),
                "samples" => {
                    for id in raw_value.split(',').filter(|s| !s.is_empty()) {
                        state.samples.insert(decode(id)?);
                    }
                }
                "features" => {
                    for id in raw_value.split(',').filter(|s| !s.is_empty()) {
                        state.features.insert(FeatureId::new(decode(id)?));
                    }
                }
                other => match other.strip_prefix(FILTER_PREFIX) {
                    Some(name) if !name.is_empty() => {
                        let value = decode(raw_value)?;
                        let predicate = FilterPredicate::parse_url_value(&value).map_err(|error| {
                            UrlStateError::Filter {
                                key: name.to_string(),
                                error,
                            }
                        })?;
                        state.filters.insert(name, predicate);
                    }
                    _ => log::debug!("url state: ignoring parameter '{other}'"),
                },
            }
        }

        state.region = match (chr, start, end) {
            (None, None, None) => None,
            (Some(chr), Some(start), Some(end)) => Some(GenomicRegion::new(chr, start, end)?),
            (None, _, _) => return Err(UrlStateError::MissingParameter("chr")),
            (_, None, _) => return Err(UrlStateError::MissingParameter("start")),
            (_, _, None) => return Err(UrlStateError::MissingParameter("end")),
        };
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documented_example_parses() {
        let state = UrlState::parse("?chr=17&start=7565097&end=7590856&samples=S001,S004").unwrap();
        let region = state.region.unwrap();
        assert_eq!(region.chromosome(), "17");
        assert_eq!((region.start(), region.end()), (7_565_097, 7_590_856));
        assert_eq!(state.samples.iter().collect::<Vec<_>>(), vec!["S001", "S004"]);
    }

    #[test]
    fn test_roundtrip_with_escaping() {
        let mut state = UrlState {
            region: Some(GenomicRegion::new("chrX", 10, 500).unwrap()),
            ..Default::default()
        };
        state.samples.insert("TCGA-AB 01".into());
        state.samples.insert("a,b".into());
        state.features.insert("TP53&co".into());
        state
            .filters
            .insert("consequence", FilterPredicate::OneOf(vec!["missense".into(), "nonsense".into()]));
        state.filters.insert("mapq", FilterPredicate::range(Some(20.0), None));
        state.filters.insert(
            "protein_change",
            FilterPredicate::OneOf(vec!["p.R175H|fs".into(), "p.R248Q".into()]),
        );

        let query = state.to_query_string();
        assert!(query.starts_with("?chr=X&start=10&end=500&samples="));
        assert!(!query.contains(' '));

        let back = UrlState::parse(&query).unwrap();
        assert_eq!(back.samples, state.samples);
        assert_eq!(back.features, state.features);
        assert_eq!(back.filters, state.filters);
        assert_eq!(back.region.unwrap().chromosome(), "X");
        assert_eq!(UrlState::parse(&query).unwrap().to_query_string(), query);
    }

    #[test]
    fn test_unknown_keys_ignored_and_errors_reported() {
        let state = UrlState::parse("utm_source=mail&samples=S1").unwrap();
        assert!(state.region.is_none());
        assert_eq!(state.samples.len(), 1);

        assert_eq!(
            UrlState::parse("chr=17&start=10").unwrap_err(),
            UrlStateError::MissingParameter("end")
        );
        assert!(matches!(
            UrlState::parse("chr=17&start=ten&end=20"),
            Err(UrlStateError::BadNumber { .. })
        ));
        assert!(matches!(
            UrlState::parse("chr=17&start=30&end=20"),
            Err(UrlStateError::Region(RegionError::EmptyOrInverted { .. }))
        ));
        assert!(matches!(
            UrlState::parse("filter.gene=TP53"),
            Err(UrlStateError::Filter { .. })
        ));
    }

    #[test]
    fn test_empty_state() {
        assert_eq!(UrlState::default().to_query_string(), "");
        assert_eq!(UrlState::parse("").unwrap(), UrlState::default());
    }
}
