use super::{collect_visible, PrepareContext, RenderContext, VisibleSet};
use crate::features::GeneFeature;
use crate::filter::FilterSet;
use crate::layout::{pack_rows, RowLayout};
use crate::spatial::IntervalIndex;
use crate::surface::{Paint, Surface, TextAnchor, TextStyle};
use crate::types::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneOptions {
    pub lane_height: f64,
    pub max_lanes: u32,
    /// Horizontal room kept free after each gene for its label.
    pub label_gap_px: f64,
    pub show_labels: bool,
}

impl Default for GeneOptions {
    fn default() -> Self {
        Self {
            lane_height: 22.0,
            max_lanes: 12,
            label_gap_px: 40.0,
            show_labels: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeneData {
    pub genes: Vec<GeneFeature>,
    index: IntervalIndex,
    pub lanes: RowLayout,
}

pub(super) fn prepare(
    genes: Vec<GeneFeature>,
    ctx: &PrepareContext,
    options: &GeneOptions,
) -> GeneData {
    let spans: Vec<Span> = genes.iter().map(|g| g.span).collect();
    let min_gap = (options.label_gap_px * ctx.resolution.bp_per_pixel).ceil() as GenomicPos;
    let lanes = pack_rows(&spans, min_gap, options.max_lanes);
    GeneData {
        index: IntervalIndex::build(spans),
        genes,
        lanes,
    }
}

fn lane_top(ctx: &RenderContext<'_>, options: &GeneOptions, lane: u32) -> f64 {
    ctx.frame.content_top() + lane as f64 * options.lane_height
}

pub(super) fn render(
    data: &GeneData,
    options: &GeneOptions,
    ctx: &RenderContext<'_>,
    surface: &mut dyn Surface,
) {
    let theme = ctx.theme;
    let arrows = ctx.space.resolution().shows_strand_arrows();
    let label_style = TextStyle::new(theme.font_size - 2.0, theme.text).anchored(TextAnchor::Middle);

    for i in data.index.iter_overlapping(ctx.space.region().span()) {
        let gene = &data.genes[i];
        let Some(lane) = data.lanes.rows[i] else {
            continue;
        };
        if !ctx.filters.matches(gene) {
            continue;
        }
        let top = lane_top(ctx, options, lane);
        if top + options.lane_height > ctx.frame.bottom() {
            continue;
        }
        let Some((x0, x1)) = ctx.space.span_to_pixels(&gene.span) else {
            continue;
        };
        let mid = top + options.lane_height * 0.35;
        let block = options.lane_height * 0.45;
        let color = theme.gene;

        surface.line(x0, mid, x1, mid, &Paint::stroke(color, 1.0));

        let blocks: Vec<Span> = if gene.exons.is_empty() {
            vec![gene.span]
        } else {
            gene.exons.clone()
        };
        for exon in &blocks {
            if let Some((e0, e1)) = ctx.space.span_to_pixels(exon) {
                surface.rect(e0, mid - block / 2.0, (e1 - e0).max(1.0), block, &Paint::fill(color));
            }
        }

        if arrows {
            for intron in gene.introns() {
                if let Some((i0, i1)) = ctx.space.span_to_pixels(&intron) {
                    draw_chevrons(surface, i0, i1, mid, gene.strand, &Paint::stroke(color, 1.0));
                }
            }
        }

        if ctx.selection.features.contains(&gene.id) {
            let outline = Paint::stroke(theme.selection, 2.0);
            surface.rect(x0 - 1.0, mid - block / 2.0 - 2.0, (x1 - x0) + 2.0, block + 4.0, &outline);
        }

        if options.show_labels {
            surface.text((x0 + x1) / 2.0, top + options.lane_height - 2.0, &gene.name, &label_style);
        }
    }

    if data.lanes.overflow > 0 {
        let style = TextStyle::new(theme.font_size - 2.0, theme.muted).anchored(TextAnchor::End);
        surface.text(
            ctx.frame.width - 4.0,
            ctx.frame.top + super::LABEL_HEIGHT - 3.0,
            &format!("+{} genes", data.lanes.overflow),
            &style,
        );
    }
}

const CHEVRON_SPACING: f64 = 12.0;
const CHEVRON_SIZE: f64 = 3.0;

fn draw_chevrons(
    surface: &mut dyn Surface,
    x0: f64,
    x1: f64,
    y: f64,
    strand: Strand,
    paint: &Paint,
) {
    let dir = match strand {
        Strand::Forward => 1.0,
        Strand::Reverse => -1.0,
    };
    let mut x = x0 + CHEVRON_SPACING / 2.0;
    while x + CHEVRON_SIZE < x1 {
        surface.line(x - dir * CHEVRON_SIZE, y - CHEVRON_SIZE, x, y, paint);
        surface.line(x - dir * CHEVRON_SIZE, y + CHEVRON_SIZE, x, y, paint);
        x += CHEVRON_SPACING;
    }
}

pub(super) fn hit_test(
    data: &GeneData,
    options: &GeneOptions,
    ctx: &RenderContext<'_>,
    x: f64,
    y: f64,
) -> Option<FeatureId> {
    let lane = ((y - ctx.frame.content_top()) / options.lane_height).floor();
    if lane < 0.0 {
        return None;
    }
    let lane = lane as u32;
    let (window, pos) = ctx.hit_window(x);
    data.index
        .iter_overlapping(window)
        .filter(|&i| data.lanes.rows[i] == Some(lane))
        .filter(|&i| ctx.filters.matches(&data.genes[i]))
        .min_by_key(|&i| {
            let span = data.genes[i].span;
            let distance = if span.contains(pos) {
                0
            } else {
                span.start.abs_diff(pos).min(span.end.abs_diff(pos))
            };
            (distance, i)
        })
        .map(|i| data.genes[i].id.clone())
}

pub(super) fn visible(data: &GeneData, window: Span, filters: &FilterSet) -> VisibleSet {
    collect_visible(&data.genes, data.index.iter_overlapping(window), filters)
}
