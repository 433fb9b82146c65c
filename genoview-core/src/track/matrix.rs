use super::{collect_visible, RenderContext, VisibleSet};
use crate::features::MatrixCell;
use crate::filter::FilterSet;
use crate::spatial::IntervalIndex;
use crate::surface::{Paint, Surface, TextAnchor, TextStyle};
use crate::types::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixOptions {
    pub row_height: f64,
    /// Colour scale bounds; missing bounds come from the data.
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub show_sample_labels: bool,
}

impl Default for MatrixOptions {
    fn default() -> Self {
        Self {
            row_height: 10.0,
            min_value: None,
            max_value: None,
            show_sample_labels: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MatrixData {
    pub cells: Vec<MatrixCell>,
    index: IntervalIndex,
    /// Row order: sample ids sorted.
    pub samples: Vec<String>,
    pub value_range: (f64, f64),
}

impl MatrixData {
    pub fn row_of(&self, sample: &str) -> Option<usize> {
        self.samples.binary_search_by(|s| s.as_str().cmp(sample)).ok()
    }
}

pub(super) fn prepare(cells: Vec<MatrixCell>) -> MatrixData {
    let mut samples: Vec<String> = cells.iter().map(|c| c.sample_id.clone()).collect();
    samples.sort_unstable();
    samples.dedup();
    let value_range = cells
        .iter()
        .map(|c| c.value)
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            None => Some((v, v)),
        })
        .unwrap_or((0.0, 1.0));
    MatrixData {
        index: IntervalIndex::build(cells.iter().map(|c| c.span)),
        cells,
        samples,
        value_range,
    }
}

fn normalised(value: f64, options: &MatrixOptions, data: &MatrixData) -> f64 {
    let lo = options.min_value.unwrap_or(data.value_range.0);
    let hi = options.max_value.unwrap_or(data.value_range.1);
    if hi - lo <= f64::EPSILON {
        0.5
    } else {
        (value - lo) / (hi - lo)
    }
}

pub(super) fn render(
    data: &MatrixData,
    options: &MatrixOptions,
    ctx: &RenderContext<'_>,
    surface: &mut dyn Surface,
) {
    let theme = ctx.theme;
    let top = ctx.frame.content_top();
    let fits = |row: usize| top + (row + 1) as f64 * options.row_height <= ctx.frame.bottom();

    for i in data.index.iter_overlapping(ctx.space.region().span()) {
        let cell = &data.cells[i];
        if !ctx.filters.matches(cell) {
            continue;
        }
        let Some(row) = data.row_of(&cell.sample_id) else {
            continue;
        };
        if !fits(row) {
            continue;
        }
        let Some((x0, x1)) = ctx.space.span_to_pixels(&cell.span) else {
            continue;
        };
        let color = theme.heat(normalised(cell.value, options, data));
        surface.rect(
            x0,
            top + row as f64 * options.row_height,
            (x1 - x0).max(1.0),
            options.row_height,
            &Paint::fill(color),
        );
    }

    let label_size = (options.row_height - 1.0).min(theme.font_size);
    let label = TextStyle::new(label_size, theme.text).anchored(TextAnchor::End);
    for (row, sample) in data.samples.iter().enumerate() {
        if !fits(row) {
            break;
        }
        let y = top + row as f64 * options.row_height;
        if ctx.selection.samples.contains(sample) {
            let outline = Paint::stroke(theme.selection, 2.0);
            surface.rect(0.0, y, ctx.frame.width, options.row_height, &outline);
        }
        if options.show_sample_labels {
            surface.text(ctx.frame.width - 2.0, y + options.row_height - 1.0, sample, &label);
        }
    }
}

pub(super) fn hit_test(
    data: &MatrixData,
    options: &MatrixOptions,
    ctx: &RenderContext<'_>,
    x: f64,
    y: f64,
) -> Option<FeatureId> {
    let offset = y - ctx.frame.content_top();
    if offset < 0.0 {
        return None;
    }
    let row = (offset / options.row_height).floor() as usize;
    let sample = data.samples.get(row)?;
    let pos = ctx.space.to_position(x);
    data.index
        .iter_overlapping(Span::point(pos))
        .map(|i| &data.cells[i])
        .find(|c| &c.sample_id == sample && ctx.filters.matches(*c))
        .map(|c| c.id.clone())
}

pub(super) fn visible(data: &MatrixData, window: Span, filters: &FilterSet) -> VisibleSet {
    collect_visible(&data.cells, data.index.iter_overlapping(window), filters)
}
