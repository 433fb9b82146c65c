//! Sibling views that talk to the viewer only through the bus and the
//! cohort store.

use crate::bus::{EventBus, Subscriptions};
use crate::cohort::{CohortStore, SelectionMode};
use crate::events::{self, Event};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleRow {
    pub id: String,
    pub selected: bool,
    /// Some feature drawn in the current region belongs to this sample.
    pub in_view: bool,
}

#[derive(Debug, Default)]
struct TableState {
    selected: BTreeSet<String>,
    in_view: BTreeSet<String>,
    updates: usize,
}

/// A cohort sample table: one row per sample, highlighting the selection
/// and the samples with features in view.
#[derive(Debug)]
pub struct SampleTable {
    samples: Vec<String>,
    cohort: Arc<CohortStore>,
    state: Arc<Mutex<TableState>>,
    subscriptions: Subscriptions,
}

impl SampleTable {
    pub fn mount<I, S>(cohort: Arc<CohortStore>, samples: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut samples: Vec<String> = samples.into_iter().map(Into::into).collect();
        samples.sort();
        samples.dedup();
        let state = Arc::new(Mutex::new(TableState {
            selected: cohort.selection().samples,
            ..Default::default()
        }));
        let mut subscriptions = Subscriptions::new();
        let bus: &EventBus = cohort.bus();

        let shared = Arc::clone(&state);
        subscriptions.push(bus.subscribe(events::SELECTION_CHANGED, "sample-table.selection", move |event| {
            if let Event::SelectionChanged { selection, .. } = event {
                let mut state = shared.lock();
                state.selected = selection.samples.clone();
                state.updates += 1;
            }
            Ok(())
        }));

        let shared = Arc::clone(&state);
        subscriptions.push(bus.subscribe(
            events::VISIBLE_FEATURES_CHANGED,
            "sample-table.visible",
            move |event| {
                if let Event::VisibleFeaturesChanged { samples, .. } = event {
                    let mut state = shared.lock();
                    state.in_view = samples.clone();
                    state.updates += 1;
                }
                Ok(())
            },
        ));

        Self {
            samples,
            cohort,
            state,
            subscriptions,
        }
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn rows(&self) -> Vec<SampleRow> {
        let state = self.state.lock();
        self.samples
            .iter()
            .map(|id| SampleRow {
                id: id.clone(),
                selected: state.selected.contains(id),
                in_view: state.in_view.contains(id),
            })
            .collect()
    }

    /// Number of bus events applied so far.
    pub fn updates(&self) -> usize {
        self.state.lock().updates
    }

    /// Row click. A plain click replaces the selection; an additive click
    /// adds the sample, or removes it when it is already selected.
    pub fn click_row(&self, sample: &str, additive: bool) {
        let selected = self.state.lock().selected.contains(sample);
        let mode = match (additive, selected) {
            (false, _) => SelectionMode::Replace,
            (true, true) => SelectionMode::Remove,
            (true, false) => SelectionMode::Add,
        };
        self.cohort.toggle_sample_selection(sample, mode);
    }

    pub fn teardown(&mut self) -> usize {
        self.subscriptions.release_all(self.cohort.bus())
    }
}

impl Drop for SampleTable {
    fn drop(&mut self) {
        self.teardown();
    }
}
