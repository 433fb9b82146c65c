/*!
# Viewport

Owns the current [`CoordinateSpace`] and the ordered tracks drawn against
it. Navigation never mutates a space in place: every change builds a new
space and hands it to every track, collecting the fetches they need.

Tracks are stacked top to bottom by `order`; hidden tracks keep their slot
in the list but take no vertical space.
*/

use crate::config::EmbedConfig;
use crate::coords::CoordinateSpace;
use crate::error::{RegionError, ViewerError, ViewerResult};
use crate::events::SelectionSnapshot;
use crate::features::TrackKind;
use crate::fetch::{FetchOutcome, PendingFetch};
use crate::filter::FilterSet;
use crate::provider::ProviderRegistry;
use crate::surface::{Surface, Theme};
use crate::track::{
    ApplyOutcome, RenderContext, Track, TrackClick, TrackFrame, TrackStatus, VisibleSet,
};
use crate::types::*;

/// Feature under the pointer and the track that drew it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub track_id: String,
    pub kind: TrackKind,
    pub feature: FeatureId,
}

/// What a click did inside the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickEffect {
    Select(Hit),
    Expanded { track_id: String, cluster: FeatureId },
    Collapsed { track_id: String },
    Miss,
}

#[derive(Debug)]
pub struct Viewport {
    genome: Genome,
    space: CoordinateSpace,
    tracks: Vec<Track>,
    filters: FilterSet,
    selection: SelectionSnapshot,
    theme: Theme,
}

impl Viewport {
    pub fn new(genome: Genome, space: CoordinateSpace) -> Self {
        Self {
            genome,
            space,
            tracks: Vec::new(),
            filters: FilterSet::new(),
            selection: SelectionSnapshot::default(),
            theme: Theme::default(),
        }
    }

    /// Builds the viewport described by an embed config, resolving each
    /// track's source through `registry`.
    pub fn from_config(config: &EmbedConfig, registry: &ProviderRegistry) -> ViewerResult<Self> {
        let genome = config.resolve_genome()?;
        let region = config.resolve_region(&genome)?;
        let space = CoordinateSpace::for_genome(&genome, &region, config.pixel_width)?;
        let mut viewport = Self::new(genome, space);
        for (position, tc) in config.tracks.iter().enumerate() {
            let provider = registry.get(&tc.source).ok_or_else(|| ViewerError::UnknownSource {
                track: tc.id.clone(),
                source_name: tc.source.clone(),
            })?;
            let order = tc.order.unwrap_or(position as i32);
            let track = Track::new(tc.id.clone(), order, tc.height, provider, tc.options.clone())
                .with_visible(tc.visible);
            viewport.add_track(track)?;
        }
        log::info!(
            "viewport: {} on {} with {} tracks",
            viewport.space.region().locus(),
            viewport.genome.name(),
            viewport.tracks.len()
        );
        Ok(viewport)
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Adds a track, rejecting duplicate ids and duplicate orders.
    pub fn add_track(&mut self, track: Track) -> ViewerResult<()> {
        if self.tracks.iter().any(|t| t.id() == track.id()) {
            return Err(ViewerError::DuplicateTrackId(track.id().to_string()));
        }
        if let Some(existing) = self.tracks.iter().find(|t| t.order() == track.order()) {
            return Err(ViewerError::DuplicateTrackOrder {
                order: track.order(),
                first: existing.id().to_string(),
                second: track.id().to_string(),
            });
        }
        let at = self.tracks.partition_point(|t| t.order() < track.order());
        self.tracks.insert(at, track);
        Ok(())
    }

    /// Detaches a track; its in-flight request is cancelled when the
    /// returned value drops.
    pub fn remove_track(&mut self, id: &str) -> ViewerResult<Track> {
        let index = self
            .tracks
            .iter()
            .position(|t| t.id() == id)
            .ok_or_else(|| ViewerError::UnknownTrack(id.to_string()))?;
        Ok(self.tracks.remove(index))
    }

    pub fn set_track_visible(&mut self, id: &str, visible: bool) -> ViewerResult<()> {
        let track = self
            .tracks
            .iter_mut()
            .find(|t| t.id() == id)
            .ok_or_else(|| ViewerError::UnknownTrack(id.to_string()))?;
        track.set_visible(visible);
        Ok(())
    }

    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    pub fn space(&self) -> &CoordinateSpace {
        &self.space
    }

    pub fn region(&self) -> &GenomicRegion {
        self.space.region()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, id: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id() == id)
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn selection(&self) -> &SelectionSnapshot {
        &self.selection
    }

    pub fn set_filters(&mut self, filters: FilterSet) {
        self.filters = filters;
    }

    pub fn set_selection(&mut self, selection: SelectionSnapshot) {
        self.selection = selection;
    }

    fn propagate(&mut self) -> Vec<PendingFetch> {
        let space = self.space.clone();
        self.tracks
            .iter_mut()
            .filter_map(|t| t.set_viewport(space.clone()))
            .collect()
    }

    /// Hands the current space to every track. Used once after construction.
    pub fn start(&mut self) -> Vec<PendingFetch> {
        self.propagate()
    }

    /// Moves to `region` (validated against the genome) and returns the
    /// fetches the tracks need. Setting the current region again is a no-op.
    pub fn set_region(&mut self, region: &GenomicRegion) -> ViewerResult<Vec<PendingFetch>> {
        let region = self.genome.canonicalize(region)?;
        if &region == self.space.region() && self.tracks.iter().all(|t| t.latest_request() > 0) {
            return Ok(Vec::new());
        }
        let length = self
            .genome
            .chromosome_length(region.chromosome())
            .ok_or_else(|| RegionError::UnknownChromosome(region.chromosome().to_string()))?;
        self.space = self.space.with_region(region, length)?;
        Ok(self.propagate())
    }

    /// Re-fetches every track regardless of caches.
    pub fn refresh(&mut self) -> Vec<PendingFetch> {
        let space = self.space.clone();
        self.tracks
            .iter_mut()
            .filter_map(|t| t.refresh().or_else(|| t.set_viewport(space.clone())))
            .collect()
    }

    pub fn resize(&mut self, pixel_width: u32) -> ViewerResult<Vec<PendingFetch>> {
        if pixel_width == self.space.pixel_width() {
            return Ok(Vec::new());
        }
        self.space = self.space.resize(pixel_width)?;
        Ok(self.propagate())
    }

    /// Region after zooming by `factor` around `anchor_px`; the viewport
    /// itself is unchanged until the region is set.
    pub fn zoomed(&self, factor: f64, anchor_px: f64) -> GenomicRegion {
        self.space.zoom(factor, anchor_px).region().clone()
    }

    pub fn panned(&self, delta_px: f64) -> GenomicRegion {
        self.space.pan(delta_px).region().clone()
    }

    pub fn centered_on(&self, pos: GenomicPos) -> GenomicRegion {
        self.space.center_on(pos).region().clone()
    }

    /// Routes a fetch outcome to its track. `None` if the track is gone.
    pub fn apply(&mut self, outcome: FetchOutcome) -> Option<ApplyOutcome> {
        let Some(track) = self.tracks.iter_mut().find(|t| t.id() == outcome.track_id) else {
            log::debug!("viewport: outcome for removed track {}", outcome.track_id);
            return None;
        };
        Some(track.apply(outcome.request_id, outcome.result))
    }

    pub fn cancel_all(&mut self) {
        for track in &mut self.tracks {
            track.cancel_in_flight();
        }
    }

    pub fn is_settled(&self) -> bool {
        self.tracks.iter().all(Track::is_settled)
    }

    pub fn has_failed_track(&self) -> bool {
        self.tracks
            .iter()
            .any(|t| matches!(t.status(), TrackStatus::Failed { .. }))
    }

    /// Frames of the visible tracks, top to bottom, paired with their index.
    pub fn frames(&self) -> Vec<(usize, TrackFrame)> {
        let width = f64::from(self.space.pixel_width());
        let mut top = 0.0;
        let mut frames = Vec::new();
        for (i, track) in self.tracks.iter().enumerate() {
            if !track.is_visible() {
                continue;
            }
            frames.push((
                i,
                TrackFrame {
                    top,
                    height: track.height(),
                    width,
                },
            ));
            top += track.height();
        }
        frames
    }

    pub fn total_height(&self) -> f64 {
        self.frames().last().map_or(0.0, |(_, f)| f.bottom())
    }

    fn context(&self, frame: TrackFrame) -> RenderContext<'_> {
        RenderContext {
            space: &self.space,
            frame,
            theme: &self.theme,
            filters: &self.filters,
            selection: &self.selection,
        }
    }

    /// Draws every visible track. Pure with respect to the held data.
    pub fn render(&self, surface: &mut dyn Surface) {
        for (i, frame) in self.frames() {
            self.tracks[i].render(&self.context(frame), surface);
        }
    }

    pub fn hit_test(&self, x: f64, y: f64) -> Option<Hit> {
        let (i, frame) = self.frames().into_iter().find(|(_, f)| f.contains_y(y))?;
        let track = &self.tracks[i];
        track.hit_test(&self.context(frame), x, y).map(|feature| Hit {
            track_id: track.id().to_string(),
            kind: track.kind(),
            feature,
        })
    }

    pub fn click(&mut self, x: f64, y: f64) -> ClickEffect {
        let Some((i, frame)) = self.frames().into_iter().find(|(_, f)| f.contains_y(y)) else {
            return ClickEffect::Miss;
        };
        let ctx = RenderContext {
            space: &self.space,
            frame,
            theme: &self.theme,
            filters: &self.filters,
            selection: &self.selection,
        };
        let track = &mut self.tracks[i];
        let track_id = track.id().to_string();
        match track.click(&ctx, x, y) {
            TrackClick::Select(feature) => ClickEffect::Select(Hit {
                track_id,
                kind: track.kind(),
                feature,
            }),
            TrackClick::Expanded(cluster) => ClickEffect::Expanded { track_id, cluster },
            TrackClick::Collapsed => ClickEffect::Collapsed { track_id },
            TrackClick::Miss => ClickEffect::Miss,
        }
    }

    /// Ids drawn right now, after filters.
    pub fn visible_features(&self) -> VisibleSet {
        self.collect(&self.filters)
    }

    /// Every id in the loaded data for the current region, ignoring filters.
    pub fn dataset_ids(&self) -> VisibleSet {
        self.collect(&FilterSet::new())
    }

    fn collect(&self, filters: &FilterSet) -> VisibleSet {
        let mut set = VisibleSet::default();
        for track in &self.tracks {
            set.extend(track.visible_features(&self.space, filters));
        }
        set
    }
}
