/*!
# Coordinator

Wires a [`Viewport`] to the [`CohortStore`] through the [`EventBus`]:

- `region-changed` moves the viewport and dispatches the resulting fetches;
- `selection-changed` and `filters-changed` are echoed into the viewport,
  selection changes also reach the embed `on_selection_change` callback;
- once every track has settled, either after a fetch or right away when a
  move is served from caches, the selection is pruned against the loaded
  dataset and `visible-features-changed` is published for sibling views.
  While a track is in the failed state the prune is skipped, so a provider
  error never removes ids from the store.

Navigation helpers compute the target region from the viewport, release the
viewport lock and route the change through the store. Bus handlers lock the
viewport themselves, so no method may call into the store while holding it.

A coordinator must be created inside a tokio runtime; fetches are spawned
on it and their outcomes are pulled with [`Coordinator::next_outcome`] or
[`Coordinator::settle`].
*/

use crate::bus::{EventBus, Subscriptions};
use crate::cohort::{CohortStore, SelectionMode};
use crate::config::{EmbedConfig, SelectionListener};
use crate::error::ViewerResult;
use crate::events::{self, Event};
use crate::fetch::{FetchDispatcher, FetchOutcome};
use crate::provider::ProviderRegistry;
use crate::surface::Surface;
use crate::track::{ApplyOutcome, VisibleSet};
use crate::types::{GenomicPos, GenomicRegion};
use crate::url_state::UrlState;
use crate::viewport::{ClickEffect, Viewport};
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;

pub struct Coordinator {
    bus: Arc<EventBus>,
    cohort: Arc<CohortStore>,
    viewport: Arc<Mutex<Viewport>>,
    dispatcher: FetchDispatcher,
    outcomes: mpsc::UnboundedReceiver<FetchOutcome>,
    subscriptions: Subscriptions,
    cohort_samples: Arc<Mutex<BTreeSet<String>>>,
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("bus", &self.bus)
            .field("subscriptions", &self.subscriptions.len())
            .field("cohort_samples", &self.cohort_samples.lock().len())
            .finish()
    }
}

fn visible_event(visible: VisibleSet) -> Event {
    Event::visible_features_changed(visible.features, visible.samples)
}

/// Ids to prune against and ids in view, once no track is loading. The
/// dataset is `None` while any track has failed.
struct Settled {
    dataset: Option<VisibleSet>,
    visible: VisibleSet,
}

impl Settled {
    fn capture(vp: &Viewport) -> Option<Self> {
        if !vp.is_settled() {
            return None;
        }
        let dataset = if vp.has_failed_track() {
            log::debug!("coordinator: a track failed, keeping the selection unpruned");
            None
        } else {
            Some(vp.dataset_ids())
        };
        Some(Self {
            dataset,
            visible: vp.visible_features(),
        })
    }

    /// Call with the viewport unlocked.
    fn publish(self, cohort: &CohortStore, registered: &Mutex<BTreeSet<String>>) {
        if let Some(dataset) = self.dataset {
            let mut samples = dataset.samples;
            let registered = registered.lock().clone();
            samples.extend(registered);
            cohort.apply_prune(&samples, &dataset.features);
        }
        cohort.bus().publish(&visible_event(self.visible));
    }
}

impl Coordinator {
    /// Builds the session on a private bus.
    pub fn new(config: EmbedConfig, registry: &ProviderRegistry) -> ViewerResult<Self> {
        Self::with_bus(config, registry, Arc::new(EventBus::new()))
    }

    /// Builds the session on a bus shared with sibling views, then moves to
    /// the configured initial region, which triggers the first fetches.
    pub fn with_bus(
        config: EmbedConfig,
        registry: &ProviderRegistry,
        bus: Arc<EventBus>,
    ) -> ViewerResult<Self> {
        let viewport = Viewport::from_config(&config, registry)?;
        let initial = viewport.region().clone();
        let cohort = Arc::new(CohortStore::new(viewport.genome().clone(), Arc::clone(&bus)));
        let (dispatcher, outcomes) = FetchDispatcher::channel()?;

        let mut coordinator = Self {
            bus,
            cohort,
            viewport: Arc::new(Mutex::new(viewport)),
            dispatcher,
            outcomes,
            subscriptions: Subscriptions::new(),
            cohort_samples: Arc::new(Mutex::new(BTreeSet::new())),
        };
        coordinator.wire(config.on_selection_change.clone());
        coordinator.cohort.set_region(initial)?;
        Ok(coordinator)
    }

    fn wire(&mut self, listener: Option<SelectionListener>) {
        let viewport = Arc::clone(&self.viewport);
        let dispatcher = self.dispatcher.clone();
        let cohort: Weak<CohortStore> = Arc::downgrade(&self.cohort);
        let registered = Arc::clone(&self.cohort_samples);
        let handle = self.bus.subscribe(events::REGION_CHANGED, "viewport.region", move |event| {
            if let Event::RegionChanged { region, .. } = event {
                let (pending, settled) = {
                    let mut vp = viewport.lock();
                    let pending = vp.set_region(region)?;
                    let settled = if pending.is_empty() { Settled::capture(&vp) } else { None };
                    (pending, settled)
                };
                dispatcher.dispatch_all(pending);
                // Every track was served from cache: nothing will arrive
                // through the outcome channel for this move.
                if let (Some(settled), Some(cohort)) = (settled, cohort.upgrade()) {
                    settled.publish(&cohort, &registered);
                }
            }
            Ok(())
        });
        self.subscriptions.push(handle);

        let viewport = Arc::clone(&self.viewport);
        let handle = self.bus.subscribe(events::SELECTION_CHANGED, "viewport.selection", move |event| {
            if let Event::SelectionChanged { selection, .. } = event {
                viewport.lock().set_selection(selection.clone());
                if let Some(listener) = &listener {
                    listener(selection);
                }
            }
            Ok(())
        });
        self.subscriptions.push(handle);

        let viewport = Arc::clone(&self.viewport);
        let bus: Weak<EventBus> = Arc::downgrade(&self.bus);
        let handle = self.bus.subscribe(events::FILTERS_CHANGED, "viewport.filters", move |event| {
            if let Event::FiltersChanged { filters, .. } = event {
                let visible = {
                    let mut vp = viewport.lock();
                    vp.set_filters(filters.clone());
                    vp.visible_features()
                };
                if let Some(bus) = bus.upgrade() {
                    bus.publish(&visible_event(visible));
                }
            }
            Ok(())
        });
        self.subscriptions.push(handle);
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn cohort(&self) -> &Arc<CohortStore> {
        &self.cohort
    }

    /// Runs `f` with the viewport locked. `f` must not touch the store.
    pub fn with_viewport<R>(&self, f: impl FnOnce(&Viewport) -> R) -> R {
        f(&self.viewport.lock())
    }

    pub fn region(&self) -> GenomicRegion {
        self.viewport.lock().region().clone()
    }

    /// Samples known to sibling views; they survive pruning even when no
    /// loaded feature references them.
    pub fn register_samples<I, S>(&mut self, samples: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cohort_samples.lock().extend(samples.into_iter().map(Into::into));
    }

    pub fn go_to(&self, region: GenomicRegion) -> ViewerResult<GenomicRegion> {
        self.cohort.set_region(region)
    }

    pub fn go_to_locus(&self, locus: &str) -> ViewerResult<GenomicRegion> {
        let region: GenomicRegion = locus.parse()?;
        self.go_to(region)
    }

    pub fn zoom(&self, factor: f64, anchor_px: f64) -> ViewerResult<GenomicRegion> {
        let target = self.viewport.lock().zoomed(factor, anchor_px);
        self.go_to(target)
    }

    pub fn pan(&self, delta_px: f64) -> ViewerResult<GenomicRegion> {
        let target = self.viewport.lock().panned(delta_px);
        self.go_to(target)
    }

    pub fn center_on(&self, pos: GenomicPos) -> ViewerResult<GenomicRegion> {
        let target = self.viewport.lock().centered_on(pos);
        self.go_to(target)
    }

    /// Same region, new width; tracks re-fetch at the new resolution.
    pub fn resize(&self, pixel_width: u32) -> ViewerResult<()> {
        let pending = self.viewport.lock().resize(pixel_width)?;
        self.dispatcher.dispatch_all(pending);
        Ok(())
    }

    /// Re-fetches every track, bypassing caches.
    pub fn refresh(&self) {
        let pending = self.viewport.lock().refresh();
        self.dispatcher.dispatch_all(pending);
    }

    /// Routes a click: a hit feature toggles in the selection; mutation
    /// clusters fan out or collapse in place.
    pub fn click(&self, x: f64, y: f64) -> ClickEffect {
        let effect = self.viewport.lock().click(x, y);
        if let ClickEffect::Select(hit) = &effect {
            let mode = if self.cohort.selection().features.contains(&hit.feature) {
                SelectionMode::Remove
            } else {
                SelectionMode::Add
            };
            log::debug!("click {mode:?} {} in {}", hit.feature, hit.track_id);
            self.cohort.toggle_feature_selection(&hit.feature, mode);
        }
        effect
    }

    /// Applies one fetch outcome. When it leaves every track settled, the
    /// selection is pruned against the loaded data and visible ids are
    /// published.
    pub fn apply_outcome(&self, outcome: FetchOutcome) -> Option<ApplyOutcome> {
        let (applied, settled) = {
            let mut vp = self.viewport.lock();
            let applied = vp.apply(outcome);
            let settled = match applied {
                Some(ApplyOutcome::Applied) | Some(ApplyOutcome::Failed { .. }) => Settled::capture(&vp),
                _ => None,
            };
            (applied, settled)
        };
        if let Some(settled) = settled {
            settled.publish(&self.cohort, &self.cohort_samples);
        }
        applied
    }

    /// Waits for the next fetch outcome and applies it. `None` once the
    /// channel is closed.
    pub async fn next_outcome(&mut self) -> Option<ApplyOutcome> {
        let outcome = self.outcomes.recv().await?;
        self.apply_outcome(outcome)
    }

    /// Applies outcomes that have already arrived without waiting.
    pub fn drain_ready(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(outcome) = self.outcomes.try_recv() {
            self.apply_outcome(outcome);
            applied += 1;
        }
        applied
    }

    /// Applies outcomes until no track is loading.
    pub async fn settle(&mut self) {
        while !self.viewport.lock().is_settled() {
            match self.outcomes.recv().await {
                Some(outcome) => {
                    self.apply_outcome(outcome);
                }
                None => break,
            }
        }
    }

    pub fn visible_features(&self) -> VisibleSet {
        self.viewport.lock().visible_features()
    }

    pub fn render(&self, surface: &mut dyn Surface) {
        self.viewport.lock().render(surface);
    }

    pub fn url_state(&self) -> UrlState {
        UrlState::from_snapshot(&self.cohort.snapshot())
    }

    /// Restores filters, selection and region from a parsed URL state. The
    /// region is validated up front and applied last, so the restored
    /// selection is pruned against the data loaded for it.
    pub fn apply_url_state(&self, state: &UrlState) -> ViewerResult<()> {
        let region = state
            .region
            .as_ref()
            .map(|r| self.cohort.genome().canonicalize(r))
            .transpose()?;
        self.cohort.replace_filters(state.filters.clone());
        self.cohort.set_selection(state.selection());
        if let Some(region) = region {
            self.cohort.set_region(region)?;
        }
        Ok(())
    }

    pub fn apply_query(&self, query: &str) -> ViewerResult<()> {
        let state = UrlState::parse(query)?;
        self.apply_url_state(&state)
    }

    /// Releases every bus subscription this coordinator registered and
    /// cancels in-flight fetches. Idempotent.
    pub fn teardown(&mut self) {
        let released = self.subscriptions.release_all(&self.bus);
        if released > 0 {
            log::debug!("coordinator: released {released} subscriptions");
        }
        self.viewport.lock().cancel_all();
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.teardown();
    }
}
