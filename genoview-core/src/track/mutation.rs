use super::{collect_visible, RenderContext, VisibleSet, HIT_TOLERANCE_PX};
use crate::features::{Consequence, MutationFeature};
use crate::filter::FilterSet;
use crate::spatial::IntervalIndex;
use crate::surface::{Color, Paint, Surface, TextAnchor, TextStyle};
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MutationOptions {
    /// Head radius of a single mutation; clusters scale by sqrt(count).
    pub unit_radius: f64,
    pub max_radius: f64,
    /// Neighbouring mutations closer than this many pixels merge.
    pub cluster_window_px: f64,
    pub fan_spacing_px: f64,
}

impl Default for MutationOptions {
    fn default() -> Self {
        Self {
            unit_radius: 3.0,
            max_radius: 14.0,
            cluster_window_px: 6.0,
            fan_spacing_px: 9.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MutationData {
    pub mutations: Vec<MutationFeature>,
    index: IntervalIndex,
    by_id: HashMap<FeatureId, usize>,
}

pub(super) fn prepare(mut mutations: Vec<MutationFeature>) -> MutationData {
    mutations.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id)));
    let index = IntervalIndex::build(mutations.iter().map(|m| Span::point(m.position)));
    let by_id = mutations
        .iter()
        .enumerate()
        .map(|(i, m)| (m.id.clone(), i))
        .collect();
    MutationData {
        mutations,
        index,
        by_id,
    }
}

/// Mutations drawn as one glyph.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Id of the first member; stable while the view does not move.
    pub key: FeatureId,
    pub members: Vec<usize>,
    pub x: f64,
    pub worst: Consequence,
}

impl Cluster {
    pub fn radius(&self, options: &MutationOptions) -> f64 {
        (options.unit_radius * (self.members.len() as f64).sqrt()).min(options.max_radius)
    }
}

/// Groups visible mutations left to right: a mutation joins the current
/// cluster when it lies within `cluster_window_px` of the previous one.
pub fn clusters(
    data: &MutationData,
    options: &MutationOptions,
    ctx: &RenderContext<'_>,
) -> Vec<Cluster> {
    clusters_between(data, options, ctx, 0.0, ctx.space.pixel_width() as f64)
}

/// Clusters whose pixel extent intersects `[px_lo, px_hi]`. Chains are
/// followed past both ends of the range, so a cluster has the same members
/// whatever range it was found through.
fn clusters_between(
    data: &MutationData,
    options: &MutationOptions,
    ctx: &RenderContext<'_>,
    px_lo: f64,
    px_hi: f64,
) -> Vec<Cluster> {
    let window = options.cluster_window_px.max(1.0);
    let region = ctx.space.region().span();
    let passes = |m: &MutationFeature| region.contains(m.position) && ctx.filters.matches(m);
    let lo_pos = ctx.space.to_position(px_lo.max(0.0));

    // Walk left from the range start while the chain continues.
    let mut begin = data.mutations.partition_point(|m| m.position < lo_pos);
    let mut chain_x = px_lo;
    for i in (0..begin).rev() {
        let m = &data.mutations[i];
        if m.position < region.start {
            break;
        }
        if !passes(m) {
            continue;
        }
        let x = ctx.space.clamped_pixel(m.position);
        if chain_x - x > window {
            break;
        }
        chain_x = x;
        begin = i;
    }

    let mut out: Vec<(f64, f64, Cluster)> = Vec::new();
    for (i, m) in data.mutations.iter().enumerate().skip(begin) {
        if m.position >= region.end {
            break;
        }
        if !passes(m) {
            continue;
        }
        let x = ctx.space.clamped_pixel(m.position);
        match out.last_mut() {
            Some((_, last_x, cluster)) if x - *last_x <= window => {
                cluster.members.push(i);
                if m.consequence.severity() < cluster.worst.severity() {
                    cluster.worst = m.consequence;
                }
                *last_x = x;
            }
            _ if x > px_hi => break,
            _ => out.push((
                x,
                x,
                Cluster {
                    key: m.id.clone(),
                    members: vec![i],
                    x: 0.0,
                    worst: m.consequence,
                },
            )),
        }
    }
    out.into_iter()
        .filter(|(first_x, last_x, _)| *last_x >= px_lo && *first_x <= px_hi)
        .map(|(_, _, mut cluster)| {
            let sum: f64 = cluster
                .members
                .iter()
                .map(|&i| ctx.space.clamped_pixel(data.mutations[i].position))
                .sum();
            cluster.x = sum / cluster.members.len() as f64;
            cluster
        })
        .collect()
}

pub fn consequence_color(consequence: Consequence) -> Color {
    match consequence {
        Consequence::Missense => Color::rgb(0x00, 0x80, 0x00),
        Consequence::Nonsense => Color::rgb(0x00, 0x00, 0x00),
        Consequence::Frameshift => Color::rgb(0x99, 0x33, 0x04),
        Consequence::Splice => Color::rgb(0xff, 0x8c, 0x00),
        Consequence::InFrameIndel => Color::rgb(0x8b, 0x45, 0x13),
        Consequence::Silent => Color::rgb(0x9e, 0x9e, 0x9e),
        Consequence::Other => Color::rgb(0x61, 0x61, 0x61),
    }
}

struct Geometry {
    baseline: f64,
    head_y: f64,
    fan_y: f64,
}

fn geometry(ctx: &RenderContext<'_>) -> Geometry {
    let top = ctx.frame.content_top();
    let h = ctx.frame.content_height();
    Geometry {
        baseline: top + h - 2.0,
        head_y: top + h * 0.6,
        fan_y: top + h * 0.25,
    }
}

fn fan_x(cluster: &Cluster, options: &MutationOptions, j: usize) -> f64 {
    let n = cluster.members.len() as f64;
    cluster.x + (j as f64 - (n - 1.0) / 2.0) * options.fan_spacing_px
}

fn is_selected(m: &MutationFeature, ctx: &RenderContext<'_>) -> bool {
    ctx.selection.features.contains(&m.id) || ctx.selection.samples.contains(&m.sample_id)
}

pub(super) fn render(
    data: &MutationData,
    options: &MutationOptions,
    expanded: Option<&FeatureId>,
    ctx: &RenderContext<'_>,
    surface: &mut dyn Surface,
) {
    let theme = ctx.theme;
    let geo = geometry(ctx);
    let stem = Paint::stroke(theme.muted, 1.0);
    surface.line(0.0, geo.baseline, ctx.frame.width, geo.baseline, &stem);

    for cluster in clusters(data, options, ctx) {
        let selected = cluster
            .members
            .iter()
            .any(|&i| is_selected(&data.mutations[i], ctx));
        surface.line(cluster.x, geo.baseline, cluster.x, geo.head_y, &stem);

        if expanded == Some(&cluster.key) {
            surface.circle(cluster.x, geo.head_y, options.unit_radius * 0.75, &Paint::fill(theme.muted));
            for (j, &i) in cluster.members.iter().enumerate() {
                let m = &data.mutations[i];
                let x = fan_x(&cluster, options, j);
                surface.line(cluster.x, geo.head_y, x, geo.fan_y, &stem);
                let mut paint = Paint::fill(consequence_color(m.consequence));
                if is_selected(m, ctx) {
                    paint = paint.with_stroke(theme.selection, 2.0);
                }
                surface.circle(x, geo.fan_y, options.unit_radius, &paint);
            }
            continue;
        }

        let r = cluster.radius(options);
        let mut paint = Paint::fill(consequence_color(cluster.worst));
        if selected {
            paint = paint.with_stroke(theme.selection, 2.0);
        }
        surface.circle(cluster.x, geo.head_y, r, &paint);
        if cluster.members.len() > 1 {
            let badge = TextStyle::new((r * 1.1).max(7.0), theme.background).anchored(TextAnchor::Middle);
            surface.text(cluster.x, geo.head_y + r * 0.4, &cluster.members.len().to_string(), &badge);
        }
    }
}

/// A mutation glyph under the pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationHit {
    pub feature: FeatureId,
    pub cluster: FeatureId,
    /// True for the collapsed head or the hub of an expanded cluster.
    pub is_hub: bool,
    pub size: usize,
}

fn expanded_cluster(
    data: &MutationData,
    options: &MutationOptions,
    expanded: Option<&FeatureId>,
    ctx: &RenderContext<'_>,
) -> Option<Cluster> {
    let key = expanded?;
    let position = data.mutations.get(*data.by_id.get(key)?)?.position;
    if !ctx.space.region().span().contains(position) {
        return None;
    }
    let px = ctx.space.clamped_pixel(position);
    clusters_between(data, options, ctx, px, px)
        .into_iter()
        .find(|c| &c.key == key)
}

pub(super) fn hit_test(
    data: &MutationData,
    options: &MutationOptions,
    expanded: Option<&FeatureId>,
    ctx: &RenderContext<'_>,
    x: f64,
    y: f64,
) -> Option<MutationHit> {
    let geo = geometry(ctx);
    let within = |cx: f64, cy: f64, r: f64| (x - cx).hypot(y - cy) <= r + HIT_TOLERANCE_PX;

    if let Some(cluster) = expanded_cluster(data, options, expanded, ctx) {
        let size = cluster.members.len();
        for (j, &i) in cluster.members.iter().enumerate() {
            if within(fan_x(&cluster, options, j), geo.fan_y, options.unit_radius) {
                return Some(MutationHit {
                    feature: data.mutations[i].id.clone(),
                    cluster: cluster.key.clone(),
                    is_hub: false,
                    size,
                });
            }
        }
        if within(cluster.x, geo.head_y, options.unit_radius) {
            return Some(MutationHit {
                feature: cluster.key.clone(),
                cluster: cluster.key,
                is_hub: true,
                size,
            });
        }
    }

    let reach = options.max_radius + HIT_TOLERANCE_PX;
    clusters_between(data, options, ctx, x - reach, x + reach)
        .into_iter()
        .filter(|c| expanded != Some(&c.key))
        .find(|c| within(c.x, geo.head_y, c.radius(options)))
        .map(|cluster| MutationHit {
            feature: cluster.key.clone(),
            size: cluster.members.len(),
            cluster: cluster.key,
            is_hub: true,
        })
}

pub(super) fn visible(data: &MutationData, window: Span, filters: &FilterSet) -> VisibleSet {
    collect_visible(&data.mutations, data.index.iter_overlapping(window), filters)
}
