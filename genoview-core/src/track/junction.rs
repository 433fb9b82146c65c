use super::{collect_visible, RenderContext, VisibleSet, HIT_TOLERANCE_PX};
use crate::features::{Annotated, JunctionFeature};
use crate::filter::FilterSet;
use crate::spatial::IntervalIndex;
use crate::surface::{Paint, Surface, TextAnchor, TextStyle};
use crate::types::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArcScale {
    Linear,
    Log,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JunctionOptions {
    pub scale: ArcScale,
    /// Caps the support used as the top of the scale; `None` uses the
    /// largest support in the data.
    pub max_support: Option<u32>,
    pub min_arc_px: f64,
    pub stroke_width: f64,
    pub label_min_width_px: f64,
}

impl Default for JunctionOptions {
    fn default() -> Self {
        Self {
            scale: ArcScale::Linear,
            max_support: None,
            min_arc_px: 4.0,
            stroke_width: 1.5,
            label_min_width_px: 24.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct JunctionData {
    pub junctions: Vec<JunctionFeature>,
    index: IntervalIndex,
    pub max_support: u32,
}

pub(super) fn prepare(mut junctions: Vec<JunctionFeature>) -> JunctionData {
    junctions.sort_by(|a, b| {
        a.span()
            .start
            .cmp(&b.span().start)
            .then_with(|| a.id.cmp(&b.id))
    });
    let max_support = junctions.iter().map(|j| j.support).max().unwrap_or(0);
    JunctionData {
        index: IntervalIndex::build(junctions.iter().map(|j| j.span())),
        junctions,
        max_support,
    }
}

fn scaled(scale: ArcScale, support: u32) -> f64 {
    match scale {
        ArcScale::Linear => support as f64,
        ArcScale::Log => (1.0 + support as f64).ln(),
    }
}

/// Endpoints and peak height of one arc.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcGeometry {
    pub x0: f64,
    pub x1: f64,
    pub base: f64,
    pub height: f64,
}

impl ArcGeometry {
    /// Height of the curve above `base` at horizontal position `x`.
    pub fn y_at(&self, x: f64) -> Option<f64> {
        let width = self.x1 - self.x0;
        if width.abs() < f64::EPSILON {
            return None;
        }
        let t = (x - self.x0) / width;
        if !(0.0..=1.0).contains(&t) {
            return None;
        }
        Some(self.base - 4.0 * self.height * t * (1.0 - t))
    }
}

pub fn arc_for(
    data: &JunctionData,
    options: &JunctionOptions,
    ctx: &RenderContext<'_>,
    junction: &JunctionFeature,
) -> ArcGeometry {
    let top = options
        .max_support
        .unwrap_or(data.max_support)
        .max(1);
    let available = (ctx.frame.content_height() - 4.0).max(options.min_arc_px);
    let ratio = (scaled(options.scale, junction.support) / scaled(options.scale, top)).min(1.0);
    let span = junction.span();
    ArcGeometry {
        x0: ctx.space.to_pixel_unclamped(span.start),
        x1: ctx.space.to_pixel_unclamped(span.end),
        base: ctx.frame.bottom() - 2.0,
        height: (ratio * available).max(options.min_arc_px),
    }
}

pub(super) fn render(
    data: &JunctionData,
    options: &JunctionOptions,
    ctx: &RenderContext<'_>,
    surface: &mut dyn Surface,
) {
    let theme = ctx.theme;
    let label = TextStyle::new(theme.font_size - 3.0, theme.text).anchored(TextAnchor::Middle);
    for i in data.index.iter_overlapping(ctx.space.region().span()) {
        let junction = &data.junctions[i];
        if !ctx.filters.matches(junction) {
            continue;
        }
        let arc = arc_for(data, options, ctx, junction);
        let color = match junction.strand {
            Strand::Forward => theme.forward,
            Strand::Reverse => theme.reverse,
        };
        let width = if ctx.selection.features.contains(&junction.id) {
            options.stroke_width * 2.0
        } else {
            options.stroke_width
        };
        let mid = (arc.x0 + arc.x1) / 2.0;
        surface.quad_curve(
            (arc.x0, arc.base),
            (mid, arc.base - 2.0 * arc.height),
            (arc.x1, arc.base),
            &Paint::stroke(color, width),
        );
        if (arc.x1 - arc.x0) >= options.label_min_width_px && (0.0..=ctx.frame.width).contains(&mid) {
            surface.text(mid, arc.base - arc.height - 2.0, &junction.support.to_string(), &label);
        }
    }
}

pub(super) fn hit_test(
    data: &JunctionData,
    options: &JunctionOptions,
    ctx: &RenderContext<'_>,
    x: f64,
    y: f64,
) -> Option<FeatureId> {
    let (window, _) = ctx.hit_window(x);
    let slack = HIT_TOLERANCE_PX + options.stroke_width;
    data.index
        .iter_overlapping(window)
        .filter(|&i| ctx.filters.matches(&data.junctions[i]))
        .filter_map(|i| {
            let arc = arc_for(data, options, ctx, &data.junctions[i]);
            let distance = (arc.y_at(x)? - y).abs();
            (distance <= slack).then_some((distance, i))
        })
        .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
        .map(|(_, i)| data.junctions[i].id.clone())
}

pub(super) fn visible(data: &JunctionData, window: Span, filters: &FilterSet) -> VisibleSet {
    collect_visible(&data.junctions, data.index.iter_overlapping(window), filters)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::events::SelectionSnapshot;
    use crate::surface::{DisplayList, Primitive, Theme};

    fn junction(id: &str, donor: u64, acceptor: u64, support: u32) -> JunctionFeature {
        JunctionFeature {
            id: id.into(),
            donor,
            acceptor,
            support,
            strand: Strand::Forward,
        }
    }

    fn data() -> JunctionData {
        prepare(vec![
            junction("j1", 100, 500, 100),
            junction("j2", 600, 300, 10),
        ])
    }

    #[test]
    fn test_arc_height_linear_vs_log() {
        let s = space(0, 1000, 1000);
        let theme = Theme::default();
        let filters = FilterSet::new();
        let selection = SelectionSnapshot::default();
        let ctx = RenderContext {
            space: &s,
            frame: frame(104.0, 1000.0),
            theme: &theme,
            filters: &filters,
            selection: &selection,
        };
        let d = data();
        let linear = JunctionOptions::default();
        let log = JunctionOptions {
            scale: ArcScale::Log,
            ..Default::default()
        };
        let j2 = &d.junctions[1];
        assert_eq!(j2.id, FeatureId::from("j2"));
        let h_lin = arc_for(&d, &linear, &ctx, j2).height;
        let h_log = arc_for(&d, &log, &ctx, j2).height;
        assert!((h_lin - 8.6).abs() < 1e-9);
        assert!(h_log > 40.0 && h_log < 50.0);
        assert_eq!(arc_for(&d, &linear, &ctx, &d.junctions[0]).height, 86.0);
    }

    #[test]
    fn test_hit_test_follows_curve() {
        let s = space(0, 1000, 1000);
        let theme = Theme::default();
        let filters = FilterSet::new();
        let selection = SelectionSnapshot::default();
        let ctx = RenderContext {
            space: &s,
            frame: frame(104.0, 1000.0),
            theme: &theme,
            filters: &filters,
            selection: &selection,
        };
        let d = data();
        let options = JunctionOptions::default();
        let j1 = arc_for(&d, &options, &ctx, &d.junctions[0]);
        let peak = j1.base - j1.height;
        assert_eq!(hit_test(&d, &options, &ctx, 300.0, peak), Some("j1".into()));
        let j2 = arc_for(&d, &options, &ctx, &d.junctions[1]);
        assert_eq!(hit_test(&d, &options, &ctx, 450.0, j2.base - j2.height), Some("j2".into()));
        assert_eq!(hit_test(&d, &options, &ctx, 300.0, peak + 30.0), None);
    }

    #[test]
    fn test_offscreen_endpoint_still_draws() {
        let s = space(400, 1000, 600);
        let theme = Theme::default();
        let filters = FilterSet::new();
        let selection = SelectionSnapshot::default();
        let ctx = RenderContext {
            space: &s,
            frame: frame(104.0, 600.0),
            theme: &theme,
            filters: &filters,
            selection: &selection,
        };
        let mut list = DisplayList::new();
        render(&data(), &JunctionOptions::default(), &ctx, &mut list);
        let starts: Vec<f64> = list
            .items
            .iter()
            .filter_map(|p| match p {
                Primitive::QuadCurve { from, .. } => Some(from.0),
                _ => None,
            })
            .collect();
        assert_eq!(starts, vec![-300.0, -100.0]);
    }
}
