/*!
# Tracks

A track owns one data provider, a private cache of prepared features and the
request bookkeeping that enforces last-viewport-wins:

- every `set_viewport` issues a strictly larger request id and cancels the
  previous request's token;
- `apply` accepts a result only if it carries the latest id.

Kinds form a closed set ([`TrackOptions`] / [`PreparedBody`]) dispatched by
`match`; each kind lives in its own module with `prepare`, `render` and
`hit_test` functions.
*/

pub mod alignment;
pub mod gene;
pub mod junction;
pub mod matrix;
pub mod mutation;
pub mod signal;

use crate::coords::CoordinateSpace;
use crate::events::SelectionSnapshot;
use crate::features::{FeatureSet, TrackKind};
use crate::fetch::PendingFetch;
use crate::filter::FilterSet;
use crate::lod::{LevelOfDetail, Resolution};
use crate::provider::{CancelToken, DataProvider, FetchRequest, ProviderError, RequestId};
use crate::surface::{Paint, Surface, TextStyle, Theme};
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

pub use alignment::{AlignmentData, AlignmentOptions};
pub use gene::{GeneData, GeneOptions};
pub use junction::{ArcScale, JunctionData, JunctionOptions};
pub use matrix::{MatrixData, MatrixOptions};
pub use mutation::{MutationData, MutationOptions};
pub use signal::{SignalOptions, SignalTrackData};

/// Height reserved above the content area for the track label.
pub const LABEL_HEIGHT: f64 = 14.0;
/// Pointer slack on either side of the cursor when hit testing.
pub const HIT_TOLERANCE_PX: f64 = 3.0;

/// Vertical slot a track occupies in the view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackFrame {
    pub top: f64,
    pub height: f64,
    pub width: f64,
}

impl TrackFrame {
    pub fn content_top(&self) -> f64 {
        self.top + LABEL_HEIGHT
    }

    pub fn content_height(&self) -> f64 {
        (self.height - LABEL_HEIGHT).max(0.0)
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn contains_y(&self, y: f64) -> bool {
        y >= self.top && y < self.bottom()
    }
}

/// Everything a kind needs to draw or hit test; no I/O happens through it.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub space: &'a CoordinateSpace,
    pub frame: TrackFrame,
    pub theme: &'a Theme,
    pub filters: &'a FilterSet,
    pub selection: &'a SelectionSnapshot,
}

impl RenderContext<'_> {
    /// Genomic window under `x` widened by the hit tolerance, plus the
    /// position directly under the pointer.
    pub(crate) fn hit_window(&self, x: f64) -> (Span, GenomicPos) {
        let pos = self.space.to_position(x);
        let slack = (HIT_TOLERANCE_PX * self.space.bp_per_pixel()).ceil() as GenomicPos;
        (
            Span::new(pos.saturating_sub(slack), pos.saturating_add(slack + 1)),
            pos,
        )
    }
}

/// Inputs for background preparation of a fetched feature set.
#[derive(Debug, Clone)]
pub struct PrepareContext {
    pub region: GenomicRegion,
    pub resolution: Resolution,
    pub lod: LevelOfDetail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TrackOptions {
    Gene(GeneOptions),
    Mutation(MutationOptions),
    Signal(SignalOptions),
    Alignment(AlignmentOptions),
    Junction(JunctionOptions),
    Matrix(MatrixOptions),
}

impl TrackOptions {
    pub fn default_for(kind: TrackKind) -> Self {
        match kind {
            TrackKind::Gene => TrackOptions::Gene(GeneOptions::default()),
            TrackKind::Mutation => TrackOptions::Mutation(MutationOptions::default()),
            TrackKind::Signal => TrackOptions::Signal(SignalOptions::default()),
            TrackKind::Alignment => TrackOptions::Alignment(AlignmentOptions::default()),
            TrackKind::Junction => TrackOptions::Junction(JunctionOptions::default()),
            TrackKind::Matrix => TrackOptions::Matrix(MatrixOptions::default()),
        }
    }

    pub fn kind(&self) -> TrackKind {
        match self {
            TrackOptions::Gene(_) => TrackKind::Gene,
            TrackOptions::Mutation(_) => TrackKind::Mutation,
            TrackOptions::Signal(_) => TrackKind::Signal,
            TrackOptions::Alignment(_) => TrackKind::Alignment,
            TrackOptions::Junction(_) => TrackKind::Junction,
            TrackOptions::Matrix(_) => TrackKind::Matrix,
        }
    }

    pub fn level_for(&self, resolution: &Resolution) -> LevelOfDetail {
        match self {
            TrackOptions::Alignment(opts) => {
                resolution.level_with(TrackKind::Alignment, &opts.thresholds())
            }
            other => resolution.level_for(other.kind()),
        }
    }

    /// Turns raw provider output into render-ready data. Runs on a blocking
    /// worker thread, so the heavy lifting (sorting, packing, coverage)
    /// lives here rather than in `render`.
    pub fn prepare(
        &self,
        mut features: FeatureSet,
        ctx: &PrepareContext,
    ) -> Result<PreparedFeatures, ProviderError> {
        if features.kind() != self.kind() {
            return Err(ProviderError::KindMismatch {
                expected: self.kind(),
                actual: features.kind(),
            });
        }
        features.retain_overlapping(&ctx.region.span());
        let body = match (self, features) {
            (TrackOptions::Gene(o), FeatureSet::Gene(v)) => PreparedBody::Gene(gene::prepare(v, ctx, o)),
            (TrackOptions::Mutation(_), FeatureSet::Mutation(v)) => {
                PreparedBody::Mutation(mutation::prepare(v))
            }
            (TrackOptions::Signal(_), FeatureSet::Signal(d)) => PreparedBody::Signal(signal::prepare(d, ctx)),
            (TrackOptions::Alignment(o), FeatureSet::Alignment(v)) => {
                PreparedBody::Alignment(alignment::prepare(v, ctx, o))
            }
            (TrackOptions::Junction(_), FeatureSet::Junction(v)) => {
                PreparedBody::Junction(junction::prepare(v))
            }
            (TrackOptions::Matrix(_), FeatureSet::Matrix(v)) => PreparedBody::Matrix(matrix::prepare(v)),
            (options, features) => {
                return Err(ProviderError::KindMismatch {
                    expected: options.kind(),
                    actual: features.kind(),
                })
            }
        };
        Ok(PreparedFeatures {
            region: ctx.region.clone(),
            lod: ctx.lod,
            body,
        })
    }
}

#[derive(Debug, Clone)]
pub enum PreparedBody {
    Gene(GeneData),
    Mutation(MutationData),
    Signal(SignalTrackData),
    Alignment(AlignmentData),
    Junction(JunctionData),
    Matrix(MatrixData),
}

/// Prepared data plus the request window it was built for.
#[derive(Debug, Clone)]
pub struct PreparedFeatures {
    pub region: GenomicRegion,
    pub lod: LevelOfDetail,
    pub body: PreparedBody,
}

/// Feature and sample ids currently drawn by a track.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibleSet {
    pub features: BTreeSet<FeatureId>,
    pub samples: BTreeSet<String>,
}

impl VisibleSet {
    pub fn extend(&mut self, other: VisibleSet) {
        self.features.extend(other.features);
        self.samples.extend(other.samples);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackStatus {
    Idle,
    Loading { request_id: RequestId },
    Ready,
    Failed { message: String },
}

impl fmt::Display for TrackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackStatus::Idle => f.write_str("idle"),
            TrackStatus::Loading { request_id } => write!(f, "loading #{request_id}"),
            TrackStatus::Ready => f.write_str("ready"),
            TrackStatus::Failed { message } => write!(f, "failed: {message}"),
        }
    }
}

/// What happened to a fetch result handed to [`Track::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// Superseded by a later request; dropped without touching the track.
    Stale { latest: RequestId },
    Failed { message: String },
}

/// Result of a click routed to a track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackClick {
    Select(FeatureId),
    /// A mutation cluster was fanned out; carries the cluster key.
    Expanded(FeatureId),
    Collapsed,
    Miss,
}

pub struct Track {
    id: String,
    order: i32,
    height: f64,
    visible: bool,
    provider: Arc<dyn DataProvider>,
    options: TrackOptions,
    status: TrackStatus,
    latest_request: RequestId,
    in_flight: Option<CancelToken>,
    space: Option<CoordinateSpace>,
    data: Option<PreparedFeatures>,
    expanded_cluster: Option<FeatureId>,
}

impl fmt::Debug for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Track")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("order", &self.order)
            .field("status", &self.status)
            .field("latest_request", &self.latest_request)
            .field("provider", &self.provider.describe())
            .finish()
    }
}

impl Track {
    pub fn new(
        id: impl Into<String>,
        order: i32,
        height: f64,
        provider: Arc<dyn DataProvider>,
        options: TrackOptions,
    ) -> Self {
        Self {
            id: id.into(),
            order,
            height: height.max(LABEL_HEIGHT),
            visible: true,
            provider,
            options,
            status: TrackStatus::Idle,
            latest_request: 0,
            in_flight: None,
            space: None,
            data: None,
            expanded_cluster: None,
        }
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn kind(&self) -> TrackKind {
        self.options.kind()
    }

    pub fn options(&self) -> &TrackOptions {
        &self.options
    }

    pub fn status(&self) -> &TrackStatus {
        &self.status
    }

    pub fn latest_request(&self) -> RequestId {
        self.latest_request
    }

    pub fn data(&self) -> Option<&PreparedFeatures> {
        self.data.as_ref()
    }

    pub fn expanded_cluster(&self) -> Option<&FeatureId> {
        self.expanded_cluster.as_ref()
    }

    /// No request outstanding.
    pub fn is_settled(&self) -> bool {
        !matches!(self.status, TrackStatus::Loading { .. })
    }

    fn cache_covers(&self, space: &CoordinateSpace, lod: LevelOfDetail) -> bool {
        let cacheable = matches!(self.kind(), TrackKind::Gene | TrackKind::Mutation);
        match (&self.data, &self.status) {
            (Some(data), TrackStatus::Ready) => {
                cacheable && data.lod == lod && data.region.covers(space.region())
            }
            _ => false,
        }
    }

    /// Moves the track to `space`. Returns the fetch to dispatch, or `None`
    /// when cached gene/mutation features already cover the new region.
    pub fn set_viewport(&mut self, space: CoordinateSpace) -> Option<PendingFetch> {
        let resolution = space.resolution();
        let lod = self.options.level_for(&resolution);
        self.expanded_cluster = None;
        if self.cache_covers(&space, lod) {
            log::debug!("track {}: cache covers {}", self.id, space.region());
            self.space = Some(space);
            return None;
        }
        let region = space.region().clone();
        self.space = Some(space);
        Some(self.issue_request(region, resolution))
    }

    /// Re-issues a request for the current space regardless of the cache.
    pub fn refresh(&mut self) -> Option<PendingFetch> {
        let space = self.space.as_ref()?;
        let (region, resolution) = (space.region().clone(), space.resolution());
        Some(self.issue_request(region, resolution))
    }

    fn issue_request(&mut self, region: GenomicRegion, resolution: Resolution) -> PendingFetch {
        self.cancel_in_flight();
        self.latest_request += 1;
        let cancel = CancelToken::new();
        self.in_flight = Some(cancel.clone());
        self.status = TrackStatus::Loading {
            request_id: self.latest_request,
        };
        log::debug!(
            "track {}: request #{} for {} at {:.2} bp/px",
            self.id,
            self.latest_request,
            region,
            resolution.bp_per_pixel
        );
        PendingFetch {
            track_id: self.id.clone(),
            provider: Arc::clone(&self.provider),
            options: self.options.clone(),
            request: FetchRequest {
                region,
                resolution,
                request_id: self.latest_request,
                cancel,
            },
        }
    }

    pub fn cancel_in_flight(&mut self) {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
    }

    /// Applies a fetch result if it answers the latest request.
    pub fn apply(
        &mut self,
        request_id: RequestId,
        result: Result<PreparedFeatures, ProviderError>,
    ) -> ApplyOutcome {
        if request_id != self.latest_request {
            log::debug!(
                "track {}: dropping stale response #{} (latest #{})",
                self.id,
                request_id,
                self.latest_request
            );
            return ApplyOutcome::Stale {
                latest: self.latest_request,
            };
        }
        self.in_flight = None;
        match result {
            Ok(prepared) => {
                self.data = Some(prepared);
                self.status = TrackStatus::Ready;
                ApplyOutcome::Applied
            }
            Err(err) => {
                let message = err.to_string();
                log::warn!("track {}: fetch #{} failed: {}", self.id, request_id, message);
                self.data = None;
                self.status = TrackStatus::Failed {
                    message: message.clone(),
                };
                ApplyOutcome::Failed { message }
            }
        }
    }

    pub fn render(&self, ctx: &RenderContext<'_>, surface: &mut dyn Surface) {
        surface.begin_group(&self.id);
        let label = TextStyle::new(ctx.theme.font_size, ctx.theme.text).bold();
        surface.text(4.0, ctx.frame.top + LABEL_HEIGHT - 3.0, &self.id, &label);

        match (&self.status, &self.data) {
            (TrackStatus::Failed { message }, _) => render_error_banner(ctx, message, surface),
            (_, Some(data)) => self.render_body(&data.body, ctx, surface),
            (TrackStatus::Loading { .. }, None) => {
                let style = TextStyle::new(ctx.theme.font_size, ctx.theme.muted);
                surface.text(4.0, ctx.frame.content_top() + ctx.theme.font_size, "Loading...", &style);
            }
            _ => {}
        }
        surface.end_group();
    }

    fn render_body(&self, body: &PreparedBody, ctx: &RenderContext<'_>, surface: &mut dyn Surface) {
        match (body, &self.options) {
            (PreparedBody::Gene(d), TrackOptions::Gene(o)) => gene::render(d, o, ctx, surface),
            (PreparedBody::Mutation(d), TrackOptions::Mutation(o)) => {
                mutation::render(d, o, self.expanded_cluster.as_ref(), ctx, surface)
            }
            (PreparedBody::Signal(d), TrackOptions::Signal(o)) => signal::render(d, o, ctx, surface),
            (PreparedBody::Alignment(d), TrackOptions::Alignment(o)) => {
                alignment::render(d, o, ctx, surface)
            }
            (PreparedBody::Junction(d), TrackOptions::Junction(o)) => {
                junction::render(d, o, ctx, surface)
            }
            (PreparedBody::Matrix(d), TrackOptions::Matrix(o)) => matrix::render(d, o, ctx, surface),
            _ => log::error!("track {}: prepared data does not match track kind", self.id),
        }
    }

    /// Feature under the pointer, `y` in view coordinates.
    pub fn hit_test(&self, ctx: &RenderContext<'_>, x: f64, y: f64) -> Option<FeatureId> {
        if !ctx.frame.contains_y(y) || y < ctx.frame.content_top() {
            return None;
        }
        let data = self.data.as_ref()?;
        match (&data.body, &self.options) {
            (PreparedBody::Gene(d), TrackOptions::Gene(o)) => gene::hit_test(d, o, ctx, x, y),
            (PreparedBody::Mutation(d), TrackOptions::Mutation(o)) => {
                mutation::hit_test(d, o, self.expanded_cluster.as_ref(), ctx, x, y)
                    .map(|hit| hit.feature)
            }
            (PreparedBody::Signal(_), _) => None,
            (PreparedBody::Alignment(d), TrackOptions::Alignment(o)) => {
                alignment::hit_test(d, o, ctx, x, y)
            }
            (PreparedBody::Junction(d), TrackOptions::Junction(o)) => {
                junction::hit_test(d, o, ctx, x, y)
            }
            (PreparedBody::Matrix(d), TrackOptions::Matrix(o)) => matrix::hit_test(d, o, ctx, x, y),
            _ => None,
        }
    }

    /// Routes a click. Mutation clusters toggle between collapsed and
    /// fanned-out; everything else selects the feature under the pointer.
    pub fn click(&mut self, ctx: &RenderContext<'_>, x: f64, y: f64) -> TrackClick {
        if let (Some(data), TrackOptions::Mutation(o)) = (&self.data, &self.options) {
            if let PreparedBody::Mutation(d) = &data.body {
                if !ctx.frame.contains_y(y) {
                    return TrackClick::Miss;
                }
                let hit = mutation::hit_test(d, o, self.expanded_cluster.as_ref(), ctx, x, y);
                return match hit {
                    Some(hit) if hit.is_hub && self.expanded_cluster.as_ref() == Some(&hit.cluster) => {
                        self.expanded_cluster = None;
                        TrackClick::Collapsed
                    }
                    Some(hit) if hit.is_hub && hit.size > 1 => {
                        self.expanded_cluster = Some(hit.cluster.clone());
                        TrackClick::Expanded(hit.cluster)
                    }
                    Some(hit) => TrackClick::Select(hit.feature),
                    None => TrackClick::Miss,
                };
            }
        }
        match self.hit_test(ctx, x, y) {
            Some(id) => TrackClick::Select(id),
            None => TrackClick::Miss,
        }
    }

    /// Ids of features drawn in `space` that pass `filters`.
    pub fn visible_features(&self, space: &CoordinateSpace, filters: &FilterSet) -> VisibleSet {
        let Some(data) = &self.data else {
            return VisibleSet::default();
        };
        if !self.visible {
            return VisibleSet::default();
        }
        let window = space.region().span();
        match &data.body {
            PreparedBody::Gene(d) => gene::visible(d, window, filters),
            PreparedBody::Mutation(d) => mutation::visible(d, window, filters),
            PreparedBody::Signal(_) => VisibleSet::default(),
            PreparedBody::Alignment(d) => alignment::visible(d, window, filters),
            PreparedBody::Junction(d) => junction::visible(d, window, filters),
            PreparedBody::Matrix(d) => matrix::visible(d, window, filters),
        }
    }
}

impl Drop for Track {
    fn drop(&mut self) {
        self.cancel_in_flight();
    }
}

fn render_error_banner(ctx: &RenderContext<'_>, message: &str, surface: &mut dyn Surface) {
    let height = (ctx.theme.font_size + 8.0).min(ctx.frame.content_height().max(1.0));
    let paint = Paint::fill(ctx.theme.error_background).with_stroke(ctx.theme.error, 1.0);
    surface.rect(0.0, ctx.frame.content_top(), ctx.frame.width, height, &paint);
    let style = TextStyle::new(ctx.theme.font_size, ctx.theme.error);
    surface.text(
        6.0,
        ctx.frame.content_top() + height / 2.0 + ctx.theme.font_size / 3.0,
        &format!("Failed to load: {message}"),
        &style,
    );
}

/// Collects the ids of `items` overlapping `window` that pass `filters`.
pub(crate) fn collect_visible<T: crate::features::Annotated>(
    items: &[T],
    indices: impl Iterator<Item = usize>,
    filters: &FilterSet,
) -> VisibleSet {
    let mut set = VisibleSet::default();
    for i in indices {
        let item = &items[i];
        if !filters.matches(item) {
            continue;
        }
        set.features.insert(item.feature_id().clone());
        if let Some(sample) = item.sample_id() {
            set.samples.insert(sample.to_string());
        }
    }
    set
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::features::GeneFeature;

    fn gene_set() -> FeatureSet {
        FeatureSet::Gene(vec![GeneFeature {
            id: "TP53".into(),
            name: "TP53".into(),
            span: Span::new(1000, 2000),
            strand: Strand::Reverse,
            exons: vec![Span::new(1000, 1100), Span::new(1900, 2000)],
            biotype: None,
        }])
    }

    fn prepared(track: &Track, space: &CoordinateSpace) -> PreparedFeatures {
        let ctx = prepare_ctx(space, track.options());
        track.options().prepare(gene_set(), &ctx).unwrap()
    }

    #[test]
    fn test_request_ids_increase_and_cancel_previous() {
        let mut track = Track::new(
            "genes",
            0,
            60.0,
            empty_provider(TrackKind::Gene),
            TrackOptions::default_for(TrackKind::Gene),
        );
        let first = track.set_viewport(space(0, 5000, 500)).unwrap();
        let second = track.set_viewport(space(100, 5100, 500)).unwrap();
        assert_eq!(first.request.request_id, 1);
        assert_eq!(second.request.request_id, 2);
        assert!(first.request.cancel.is_cancelled());
        assert!(!second.request.cancel.is_cancelled());
        assert_eq!(track.status(), &TrackStatus::Loading { request_id: 2 });
    }

    #[test]
    fn test_stale_result_is_dropped() {
        let mut track = Track::new(
            "genes",
            0,
            60.0,
            empty_provider(TrackKind::Gene),
            TrackOptions::default_for(TrackKind::Gene),
        );
        let s = space(0, 5000, 500);
        track.set_viewport(s.clone());
        track.set_viewport(s.clone());
        let outcome = track.apply(1, Ok(prepared(&track, &s)));
        assert_eq!(outcome, ApplyOutcome::Stale { latest: 2 });
        assert!(track.data().is_none());
        assert_eq!(track.apply(2, Ok(prepared(&track, &s))), ApplyOutcome::Applied);
        assert!(track.is_settled());
    }

    #[test]
    fn test_gene_cache_skips_refetch_inside_loaded_region() {
        let mut track = Track::new(
            "genes",
            0,
            60.0,
            empty_provider(TrackKind::Gene),
            TrackOptions::default_for(TrackKind::Gene),
        );
        let wide = space(0, 5000, 500);
        track.set_viewport(wide.clone());
        track.apply(1, Ok(prepared(&track, &wide)));
        assert!(track.set_viewport(space(1000, 3000, 500)).is_none());
        assert!(track.set_viewport(space(4000, 9000, 500)).is_some());
    }

    #[test]
    fn test_failure_renders_banner() {
        let mut track = Track::new(
            "genes",
            0,
            60.0,
            empty_provider(TrackKind::Gene),
            TrackOptions::default_for(TrackKind::Gene),
        );
        let s = space(0, 5000, 500);
        track.set_viewport(s.clone());
        let outcome = track.apply(1, Err(ProviderError::Unavailable("offline".into())));
        assert!(matches!(outcome, ApplyOutcome::Failed { .. }));

        let theme = Theme::default();
        let filters = FilterSet::new();
        let selection = SelectionSnapshot::default();
        let ctx = RenderContext {
            space: &s,
            frame: frame(60.0, 500.0),
            theme: &theme,
            filters: &filters,
            selection: &selection,
        };
        let mut list = crate::surface::DisplayList::new();
        track.render(&ctx, &mut list);
        assert!(list
            .texts()
            .any(|t| t == "Failed to load: source unavailable: offline"));
    }

    #[test]
    fn test_prepare_rejects_wrong_kind() {
        let s = space(0, 5000, 500);
        let options = TrackOptions::default_for(TrackKind::Signal);
        let ctx = prepare_ctx(&s, &options);
        assert!(matches!(
            options.prepare(gene_set(), &ctx),
            Err(ProviderError::KindMismatch { .. })
        ));
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let opts: TrackOptions = serde_json::from_str(r#"{"kind":"junction","scale":"log"}"#).unwrap();
        match opts {
            TrackOptions::Junction(j) => assert_eq!(j.scale, ArcScale::Log),
            other => panic!("unexpected {other:?}"),
        }
    }
}
