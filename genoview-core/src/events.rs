//! Bus topics and their JSON payloads.

use crate::filter::FilterSet;
use crate::types::{FeatureId, GenomicRegion};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Version stamped on every payload.
pub const SCHEMA_VERSION: u32 = 1;

pub const REGION_CHANGED: &str = "region-changed";
pub const SELECTION_CHANGED: &str = "selection-changed";
pub const FILTERS_CHANGED: &str = "filters-changed";
pub const VISIBLE_FEATURES_CHANGED: &str = "visible-features-changed";

/// Full selected sample and feature sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionSnapshot {
    pub samples: BTreeSet<String>,
    pub features: BTreeSet<FeatureId>,
}

impl SelectionSnapshot {
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty() && self.features.is_empty()
    }

    /// Drops ids not present in the given sets. Returns true if anything
    /// was removed.
    pub fn retain_valid(
        &mut self,
        samples: &BTreeSet<String>,
        features: &BTreeSet<FeatureId>,
    ) -> bool {
        let before = (self.samples.len(), self.features.len());
        self.samples.retain(|s| samples.contains(s));
        self.features.retain(|f| features.contains(f));
        before != (self.samples.len(), self.features.len())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Event {
    RegionChanged {
        schema_version: u32,
        region: GenomicRegion,
        previous: Option<GenomicRegion>,
    },
    SelectionChanged {
        schema_version: u32,
        selection: SelectionSnapshot,
    },
    FiltersChanged {
        schema_version: u32,
        filters: FilterSet,
    },
    VisibleFeaturesChanged {
        schema_version: u32,
        features: BTreeSet<FeatureId>,
        samples: BTreeSet<String>,
    },
    /// Payload of a sibling view's own topic.
    Custom {
        schema_version: u32,
        topic: String,
        body: serde_json::Value,
    },
}

impl Event {
    pub fn region_changed(region: GenomicRegion, previous: Option<GenomicRegion>) -> Self {
        Event::RegionChanged {
            schema_version: SCHEMA_VERSION,
            region,
            previous,
        }
    }

    pub fn selection_changed(selection: SelectionSnapshot) -> Self {
        Event::SelectionChanged {
            schema_version: SCHEMA_VERSION,
            selection,
        }
    }

    pub fn filters_changed(filters: FilterSet) -> Self {
        Event::FiltersChanged {
            schema_version: SCHEMA_VERSION,
            filters,
        }
    }

    pub fn visible_features_changed(
        features: BTreeSet<FeatureId>,
        samples: BTreeSet<String>,
    ) -> Self {
        Event::VisibleFeaturesChanged {
            schema_version: SCHEMA_VERSION,
            features,
            samples,
        }
    }

    pub fn custom(topic: impl Into<String>, body: serde_json::Value) -> Self {
        Event::Custom {
            schema_version: SCHEMA_VERSION,
            topic: topic.into(),
            body,
        }
    }

    pub fn topic(&self) -> &str {
        match self {
            Event::RegionChanged { .. } => REGION_CHANGED,
            Event::SelectionChanged { .. } => SELECTION_CHANGED,
            Event::FiltersChanged { .. } => FILTERS_CHANGED,
            Event::VisibleFeaturesChanged { .. } => VISIBLE_FEATURES_CHANGED,
            Event::Custom { topic, .. } => topic,
        }
    }

    pub fn schema_version(&self) -> u32 {
        match self {
            Event::RegionChanged { schema_version, .. }
            | Event::SelectionChanged { schema_version, .. }
            | Event::FiltersChanged { schema_version, .. }
            | Event::VisibleFeaturesChanged { schema_version, .. }
            | Event::Custom { schema_version, .. } => *schema_version,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
