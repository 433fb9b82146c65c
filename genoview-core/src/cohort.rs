//! Canonical shared state: active region, selections and filters.
//!
//! Every mutation takes the state lock, applies the change, releases the
//! lock and only then publishes, so handlers may read or mutate the store
//! from inside their callbacks. Concurrent gestures resolve as
//! last-write-wins.

use crate::bus::EventBus;
use crate::error::ViewerResult;
use crate::events::{Event, SelectionSnapshot};
use crate::filter::{FilterPredicate, FilterSet};
use crate::types::{FeatureId, Genome, GenomicRegion};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// How a selection gesture combines with the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    Add,
    Remove,
    Replace,
}

/// Copy of the whole store taken under one lock.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortSnapshot {
    pub active_region: Option<GenomicRegion>,
    pub selection: SelectionSnapshot,
    pub filters: FilterSet,
}

#[derive(Debug, Default)]
struct CohortState {
    active_region: Option<GenomicRegion>,
    selection: SelectionSnapshot,
    filters: FilterSet,
}

fn combine<T: Ord + Clone>(
    set: &mut BTreeSet<T>,
    ids: impl IntoIterator<Item = T>,
    mode: SelectionMode,
) {
    match mode {
        SelectionMode::Add => set.extend(ids),
        SelectionMode::Remove => {
            for id in ids {
                set.remove(&id);
            }
        }
        SelectionMode::Replace => *set = ids.into_iter().collect(),
    }
}

#[derive(Debug)]
pub struct CohortStore {
    genome: Genome,
    bus: Arc<EventBus>,
    state: Mutex<CohortState>,
}

impl CohortStore {
    pub fn new(genome: Genome, bus: Arc<EventBus>) -> Self {
        Self {
            genome,
            bus,
            state: Mutex::new(CohortState::default()),
        }
    }

    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Validates `region` against the genome and publishes
    /// `region-changed`. An invalid region leaves the store untouched.
    pub fn set_region(&self, region: GenomicRegion) -> ViewerResult<GenomicRegion> {
        let region = self.genome.canonicalize(&region)?;
        let previous = {
            let mut state = self.state.lock();
            state.active_region.replace(region.clone())
        };
        log::info!("region -> {}", region.locus());
        self.bus.publish(&Event::region_changed(region.clone(), previous));
        Ok(region)
    }

    pub fn active_region(&self) -> Option<GenomicRegion> {
        self.state.lock().active_region.clone()
    }

    /// Single-sample gesture. `Add` is idempotent: after it returns every
    /// subscriber has seen a set containing `sample`.
    pub fn toggle_sample_selection(&self, sample: &str, mode: SelectionMode) -> SelectionSnapshot {
        let id = sample.to_string();
        self.update_selection(|selection| combine(&mut selection.samples, [id], mode))
    }

    /// Multi-sample gesture (brush, lasso).
    pub fn select_samples<I, S>(&self, samples: I, mode: SelectionMode) -> SelectionSnapshot
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = samples.into_iter().map(Into::into).collect();
        self.update_selection(|selection| combine(&mut selection.samples, ids, mode))
    }

    pub fn toggle_feature_selection(
        &self,
        feature: &FeatureId,
        mode: SelectionMode,
    ) -> SelectionSnapshot {
        self.update_selection(|selection| combine(&mut selection.features, [feature.clone()], mode))
    }

    pub fn select_features(
        &self,
        features: impl IntoIterator<Item = FeatureId>,
        mode: SelectionMode,
    ) -> SelectionSnapshot {
        let ids: Vec<FeatureId> = features.into_iter().collect();
        self.update_selection(|selection| combine(&mut selection.features, ids, mode))
    }

    /// Replaces the whole selection, e.g. when restoring URL state.
    pub fn set_selection(&self, selection: SelectionSnapshot) -> SelectionSnapshot {
        self.update_selection(|current| *current = selection)
    }

    pub fn clear_selection(&self) -> SelectionSnapshot {
        self.update_selection(|selection| *selection = SelectionSnapshot::default())
    }

    pub fn selection(&self) -> SelectionSnapshot {
        self.state.lock().selection.clone()
    }

    fn update_selection(&self, mutate: impl FnOnce(&mut SelectionSnapshot)) -> SelectionSnapshot {
        let selection = {
            let mut state = self.state.lock();
            mutate(&mut state.selection);
            state.selection.clone()
        };
        log::debug!(
            "selection -> {} samples, {} features",
            selection.samples.len(),
            selection.features.len()
        );
        self.bus.publish(&Event::selection_changed(selection.clone()));
        selection
    }

    pub fn set_filter(&self, key: impl Into<String>, predicate: FilterPredicate) -> FilterSet {
        let key = key.into();
        self.update_filters(|filters| filters.insert(key, predicate))
    }

    pub fn clear_filter(&self, key: &str) -> FilterSet {
        self.update_filters(|filters| {
            filters.remove(key);
        })
    }

    pub fn clear_filters(&self) -> FilterSet {
        self.update_filters(FilterSet::clear)
    }

    pub fn replace_filters(&self, replacement: FilterSet) -> FilterSet {
        self.update_filters(|filters| *filters = replacement)
    }

    pub fn filters(&self) -> FilterSet {
        self.state.lock().filters.clone()
    }

    fn update_filters(&self, mutate: impl FnOnce(&mut FilterSet)) -> FilterSet {
        let filters = {
            let mut state = self.state.lock();
            mutate(&mut state.filters);
            state.filters.clone()
        };
        log::debug!("filters -> {} active", filters.len());
        self.bus.publish(&Event::filters_changed(filters.clone()));
        filters
    }

    /// Drops selected ids that are not part of the current dataset. Always
    /// publishes `selection-changed`, even when nothing was removed.
    pub fn apply_prune(
        &self,
        valid_samples: &BTreeSet<String>,
        valid_features: &BTreeSet<FeatureId>,
    ) -> SelectionSnapshot {
        self.update_selection(|selection| {
            if selection.retain_valid(valid_samples, valid_features) {
                log::debug!("pruned stale selection ids");
            }
        })
    }

    pub fn snapshot(&self) -> CohortSnapshot {
        let state = self.state.lock();
        CohortSnapshot {
            active_region: state.active_region.clone(),
            selection: state.selection.clone(),
            filters: state.filters.clone(),
        }
    }
}
