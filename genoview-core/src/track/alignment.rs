use super::{collect_visible, PrepareContext, RenderContext, VisibleSet};
use crate::features::{AlignmentFeature, CigarKind, SignalBin};
use crate::filter::FilterSet;
use crate::layout::{coverage, pack_rows, RowLayout};
use crate::lod::{LevelOfDetail, LodThresholds, ALIGNMENT_SUMMARY_BPP};
use crate::spatial::IntervalIndex;
use crate::surface::{Paint, Surface, TextAnchor, TextStyle};
use crate::types::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentOptions {
    pub row_height: f64,
    pub row_gap: f64,
    pub max_rows: u32,
    /// Minimum horizontal gap between reads sharing a row.
    pub min_gap_px: f64,
    /// Above this many bp per pixel reads collapse into coverage.
    pub summary_bpp: f64,
}

impl Default for AlignmentOptions {
    fn default() -> Self {
        Self {
            row_height: 6.0,
            row_gap: 1.0,
            max_rows: 500,
            min_gap_px: 2.0,
            summary_bpp: ALIGNMENT_SUMMARY_BPP,
        }
    }
}

impl AlignmentOptions {
    pub fn thresholds(&self) -> LodThresholds {
        LodThresholds {
            alignment_summary_bpp: self.summary_bpp,
        }
    }

    fn pitch(&self) -> f64 {
        self.row_height + self.row_gap
    }
}

#[derive(Debug, Clone)]
pub enum AlignmentData {
    Reads {
        reads: Vec<AlignmentFeature>,
        index: IntervalIndex,
        layout: RowLayout,
    },
    Coverage {
        bins: Vec<SignalBin>,
        bin_size: u64,
        read_count: usize,
    },
}

impl AlignmentData {
    pub fn level(&self) -> LevelOfDetail {
        match self {
            AlignmentData::Reads { .. } => LevelOfDetail::Detail,
            AlignmentData::Coverage { .. } => LevelOfDetail::Summary,
        }
    }
}

pub(super) fn prepare(
    reads: Vec<AlignmentFeature>,
    ctx: &PrepareContext,
    options: &AlignmentOptions,
) -> AlignmentData {
    match ctx.lod {
        LevelOfDetail::Summary => {
            let bin_size = ctx.resolution.bin_size();
            let spans: Vec<Span> = reads.iter().map(|r| r.span).collect();
            AlignmentData::Coverage {
                bins: coverage(&spans, ctx.region.span(), bin_size),
                bin_size,
                read_count: reads.len(),
            }
        }
        LevelOfDetail::Detail => {
            let footprints: Vec<Span> = reads.iter().map(|r| r.footprint()).collect();
            let min_gap = (options.min_gap_px * ctx.resolution.bp_per_pixel).ceil() as GenomicPos;
            let layout = pack_rows(&footprints, min_gap, options.max_rows);
            AlignmentData::Reads {
                index: IntervalIndex::build(footprints),
                reads,
                layout,
            }
        }
    }
}

pub(super) fn render(
    data: &AlignmentData,
    options: &AlignmentOptions,
    ctx: &RenderContext<'_>,
    surface: &mut dyn Surface,
) {
    match data {
        AlignmentData::Reads { reads, index, layout } => {
            render_reads(reads, index, layout, options, ctx, surface)
        }
        AlignmentData::Coverage {
            bins,
            bin_size,
            read_count,
        } => render_coverage(bins, *bin_size, *read_count, ctx, surface),
    }
}

fn render_reads(
    reads: &[AlignmentFeature],
    index: &IntervalIndex,
    layout: &RowLayout,
    options: &AlignmentOptions,
    ctx: &RenderContext<'_>,
    surface: &mut dyn Surface,
) {
    let theme = ctx.theme;
    let mut hidden = layout.overflow;
    for i in index.iter_overlapping(ctx.space.region().span()) {
        let read = &reads[i];
        if !ctx.filters.matches(read) {
            continue;
        }
        let Some(row) = layout.rows[i] else {
            continue;
        };
        let y = ctx.frame.content_top() + row as f64 * options.pitch();
        if y + options.row_height > ctx.frame.bottom() {
            hidden += 1;
            continue;
        }
        let Some((x0, x1)) = ctx.space.span_to_pixels(&read.span) else {
            // Only a soft-clipped overhang is in view.
            draw_edits(read, y, options, ctx, surface);
            continue;
        };
        surface.rect(x0, y, (x1 - x0).max(1.0), options.row_height, &Paint::fill(theme.read));
        draw_edits(read, y, options, ctx, surface);

        let selected = ctx.selection.features.contains(&read.id)
            || read
                .sample_id
                .as_ref()
                .map_or(false, |s| ctx.selection.samples.contains(s));
        if selected {
            let outline = Paint::stroke(theme.selection, 1.5);
            surface.rect(x0, y, (x1 - x0).max(1.0), options.row_height, &outline);
        }
    }

    if hidden > 0 {
        let style = TextStyle::new(theme.font_size - 2.0, theme.muted).anchored(TextAnchor::End);
        surface.text(
            ctx.frame.width - 4.0,
            ctx.frame.top + super::LABEL_HEIGHT - 3.0,
            &format!("+{hidden} reads not shown"),
            &style,
        );
    }
}

/// Edits are drawn at a minimum of one pixel so they never vanish at
/// coarse zoom.
fn draw_edits(
    read: &AlignmentFeature,
    y: f64,
    options: &AlignmentOptions,
    ctx: &RenderContext<'_>,
    surface: &mut dyn Surface,
) {
    let theme = ctx.theme;
    let h = options.row_height;
    for edit in read.edits() {
        let Some((x0, x1)) = ctx.space.span_to_pixels(&edit.span) else {
            continue;
        };
        let w = (x1 - x0).max(1.0);
        match edit.kind {
            CigarKind::SoftClip => surface.rect(x0, y, w, h, &Paint::fill(theme.soft_clip).with_opacity(0.7)),
            CigarKind::Insertion => {
                let tick = 1.0_f64.max(w.min(2.0));
                surface.rect(x0 - 0.5, y - 1.0, tick, h + 2.0, &Paint::fill(theme.insertion))
            }
            CigarKind::Deletion => {
                surface.rect(x0, y, w, h, &Paint::fill(theme.background));
                surface.line(x0, y + h / 2.0, x0 + w, y + h / 2.0, &Paint::stroke(theme.deletion, 1.0));
            }
            CigarKind::Skip => {
                surface.rect(x0, y, w, h, &Paint::fill(theme.background));
                surface.line(x0, y + h / 2.0, x0 + w, y + h / 2.0, &Paint::stroke(theme.muted, 0.5).dashed());
            }
            CigarKind::Mismatch => surface.rect(x0, y, w, h, &Paint::fill(theme.mismatch)),
            CigarKind::Match => {}
        }
    }
}

fn render_coverage(
    bins: &[SignalBin],
    bin_size: u64,
    read_count: usize,
    ctx: &RenderContext<'_>,
    surface: &mut dyn Surface,
) {
    let theme = ctx.theme;
    let window = ctx.space.region().span();
    let max_depth = bins.iter().map(|b| b.value).fold(0.0, f64::max);
    let base = ctx.frame.bottom() - 1.0;
    let usable = (ctx.frame.content_height() - 2.0).max(1.0);
    if max_depth > 0.0 {
        let paint = Paint::fill(theme.coverage);
        for bin in bins {
            if bin.value <= 0.0 {
                continue;
            }
            let span = Span::new(bin.position, bin.position + bin_size);
            let Some(clipped) = span.intersect(&window) else {
                continue;
            };
            let Some((x0, x1)) = ctx.space.span_to_pixels(&clipped) else {
                continue;
            };
            let h = bin.value / max_depth * usable;
            surface.rect(x0, base - h, (x1 - x0).max(1.0), h, &paint);
        }
    }
    let style = TextStyle::new(theme.font_size - 2.0, theme.muted).anchored(TextAnchor::End);
    surface.text(
        ctx.frame.width - 4.0,
        ctx.frame.top + super::LABEL_HEIGHT - 3.0,
        &format!("coverage of {read_count} reads, max {max_depth:.1}x"),
        &style,
    );
}

pub(super) fn hit_test(
    data: &AlignmentData,
    options: &AlignmentOptions,
    ctx: &RenderContext<'_>,
    x: f64,
    y: f64,
) -> Option<FeatureId> {
    let AlignmentData::Reads { reads, index, layout } = data else {
        return None;
    };
    let offset = y - ctx.frame.content_top();
    if offset < 0.0 || offset % options.pitch() > options.row_height {
        return None;
    }
    let row = (offset / options.pitch()).floor() as u32;
    let (window, pos) = ctx.hit_window(x);
    index
        .iter_overlapping(window)
        .filter(|&i| layout.rows[i] == Some(row))
        .filter(|&i| ctx.filters.matches(&reads[i]))
        .min_by_key(|&i| {
            let span = reads[i].footprint();
            let distance = if span.contains(pos) {
                0
            } else {
                span.start.abs_diff(pos).min(span.end.abs_diff(pos))
            };
            (distance, i)
        })
        .map(|i| reads[i].id.clone())
}

pub(super) fn visible(data: &AlignmentData, window: Span, filters: &FilterSet) -> VisibleSet {
    match data {
        AlignmentData::Reads { reads, index, .. } => {
            collect_visible(reads, index.iter_overlapping(window), filters)
        }
        AlignmentData::Coverage { .. } => VisibleSet::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::{PrepareContext, TrackOptions};
    use super::*;
    use crate::coords::CoordinateSpace;
    use crate::events::SelectionSnapshot;
    use crate::features::{parse_cigar, Cigar, TrackKind};
    use crate::surface::{Color, DisplayList, Primitive, Theme};

    fn read(id: &str, start: u64, end: u64, cigar: &str) -> AlignmentFeature {
        AlignmentFeature {
            id: id.into(),
            span: Span::new(start, end),
            strand: Strand::Forward,
            mapq: 60,
            sample_id: Some("S1".into()),
            cigar: Cigar(parse_cigar(cigar).unwrap()),
        }
    }

    fn reads() -> Vec<AlignmentFeature> {
        vec![
            read("r1", 100, 200, "10S50M5D45M"),
            read("r2", 150, 250, "100M"),
            read("r3", 300, 400, "40M2I60M"),
        ]
    }

    fn ctx_for(s: &CoordinateSpace) -> PrepareContext {
        prepare_ctx(s, &TrackOptions::default_for(TrackKind::Alignment))
    }

    fn draw(data: &AlignmentData, s: &CoordinateSpace) -> DisplayList {
        let theme = Theme::default();
        let filters = FilterSet::new();
        let selection = SelectionSnapshot::default();
        let ctx = RenderContext {
            space: s,
            frame: frame(60.0, s.pixel_width() as f64),
            theme: &theme,
            filters: &filters,
            selection: &selection,
        };
        let mut list = DisplayList::new();
        render(data, &AlignmentOptions::default(), &ctx, &mut list);
        list
    }

    fn filled_with(list: &DisplayList, color: Color) -> usize {
        list.count(|p| matches!(p, Primitive::Rect { paint, .. } if paint.fill == Some(color)))
    }

    #[test]
    fn test_reads_pack_into_rows() {
        let s = space(0, 500, 500);
        let data = prepare(reads(), &ctx_for(&s), &AlignmentOptions::default());
        match &data {
            AlignmentData::Reads { layout, .. } => {
                assert_eq!(layout.rows, vec![Some(0), Some(1), Some(0)]);
            }
            other => panic!("expected reads, got {:?}", other.level()),
        }
    }

    #[test]
    fn test_switches_to_coverage_past_threshold() {
        let s = space(0, 400_000, 800);
        let data = prepare(reads(), &ctx_for(&s), &AlignmentOptions::default());
        assert_eq!(data.level(), LevelOfDetail::Summary);
        let s = space(0, 300_000, 800);
        let data = prepare(reads(), &ctx_for(&s), &AlignmentOptions::default());
        assert_eq!(data.level(), LevelOfDetail::Detail);
    }

    #[test]
    fn test_edits_visible_even_when_zoomed_out() {
        // 100 bp per pixel: a 2 bp insertion and 5 bp deletion are sub-pixel.
        let s = space(0, 10_000, 100);
        let data = prepare(reads(), &ctx_for(&s), &AlignmentOptions::default());
        let list = draw(&data, &s);
        let theme = Theme::default();
        assert_eq!(filled_with(&list, theme.soft_clip), 1);
        assert_eq!(filled_with(&list, theme.insertion), 1);
        assert!(list.count(|p| matches!(p, Primitive::Rect { width, .. } if *width >= 1.0)) >= 5);
    }

    #[test]
    fn test_row_cap_reports_overflow() {
        let s = space(0, 500, 500);
        let stacked: Vec<AlignmentFeature> = (0..30)
            .map(|i| read(&format!("r{i}"), 100, 200, "100M"))
            .collect();
        let data = prepare(stacked, &ctx_for(&s), &AlignmentOptions::default());
        let list = draw(&data, &s);
        // 60 px frame leaves room for 6 rows of 7 px.
        assert!(list.texts().any(|t| t == "+24 reads not shown"));
    }

    #[test]
    fn test_hit_test_by_row() {
        let s = space(0, 500, 500);
        let data = prepare(reads(), &ctx_for(&s), &AlignmentOptions::default());
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
        let opts = AlignmentOptions::default();
        let row0 = ctx.frame.content_top() + 2.0;
        let row1 = row0 + opts.pitch();
        assert_eq!(hit_test(&data, &opts, &ctx, 180.0, row0), Some("r1".into()));
        assert_eq!(hit_test(&data, &opts, &ctx, 180.0, row1), Some("r2".into()));
        assert_eq!(hit_test(&data, &opts, &ctx, 350.0, row0), Some("r3".into()));
        assert_eq!(hit_test(&data, &opts, &ctx, 450.0, row0), None);
    }
}
