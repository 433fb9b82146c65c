use super::{PrepareContext, RenderContext};
use crate::features::SignalData;
use crate::surface::{Paint, Surface, TextAnchor, TextStyle};
use crate::types::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalOptions {
    /// Fixed top of the y axis. `None` autoscales to the visible maximum.
    pub fixed_max: Option<f64>,
    pub fill_opacity: f64,
}

impl Default for SignalOptions {
    fn default() -> Self {
        Self {
            fixed_max: None,
            fill_opacity: 0.8,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SignalTrackData {
    pub signal: SignalData,
}

impl SignalTrackData {
    pub fn value_at(&self, pos: GenomicPos) -> Option<f64> {
        self.signal.value_at(pos)
    }

    /// Largest value among bins intersecting `window`.
    pub fn visible_max(&self, window: &Span) -> f64 {
        self.signal
            .bins
            .iter()
            .filter(|b| self.signal.bin_span(b).overlaps(window))
            .map(|b| b.value)
            .filter(|v| v.is_finite())
            .fold(0.0, f64::max)
    }
}

/// Providers may return bins in any order; rebinning and lookups need them
/// sorted by position.
pub(super) fn prepare(mut signal: SignalData, ctx: &PrepareContext) -> SignalTrackData {
    signal.bins.sort_by_key(|b| b.position);
    SignalTrackData {
        signal: signal.rebin(ctx.resolution.bin_size()),
    }
}

pub(super) fn render(
    data: &SignalTrackData,
    options: &SignalOptions,
    ctx: &RenderContext<'_>,
    surface: &mut dyn Surface,
) {
    let window = ctx.space.region().span();
    let scale_max = match options.fixed_max {
        Some(max) if max > 0.0 => max,
        _ => data.visible_max(&window),
    };
    let base = ctx.frame.bottom() - 1.0;
    let usable = (ctx.frame.content_height() - 2.0).max(1.0);
    let y_of = |value: f64| {
        if scale_max <= 0.0 {
            base
        } else {
            base - (value.max(0.0) / scale_max).min(1.0) * usable
        }
    };

    let mut points: Vec<(f64, f64)> = Vec::new();
    let mut last_x: Option<f64> = None;
    for bin in &data.signal.bins {
        let Some((x0, x1)) = ctx.space.span_to_pixels(&data.signal.bin_span(bin)) else {
            continue;
        };
        match last_x {
            Some(prev) if (x0 - prev).abs() > 0.5 => {
                points.push((prev, base));
                points.push((x0, base));
            }
            None => points.push((x0, base)),
            _ => {}
        }
        let y = y_of(bin.value);
        points.push((x0, y));
        points.push((x1.max(x0 + 1.0), y));
        last_x = Some(x1.max(x0 + 1.0));
    }
    if let Some(x) = last_x {
        points.push((x, base));
        let paint = Paint::fill(ctx.theme.signal).with_opacity(options.fill_opacity);
        surface.polygon(&points, &paint);
    }

    let style = TextStyle::new(ctx.theme.font_size - 2.0, ctx.theme.muted).anchored(TextAnchor::End);
    surface.text(
        ctx.frame.width - 4.0,
        ctx.frame.top + super::LABEL_HEIGHT - 3.0,
        &format!("[0 - {}]", format_scale(scale_max)),
        &style,
    );
}

fn format_scale(value: f64) -> String {
    if value >= 100.0 || value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}
