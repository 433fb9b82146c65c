/*!
# View Export

Writes the current viewport as a standalone SVG document: background, optional
title, a coordinate ruler, every visible track, a scale bar and a footer that
records the locus and resolution.
*/

use crate::svg_surface::{px, SvgSurface};
use anyhow::{Context, Result};
use genoview_core::types::group_thousands;
use genoview_core::viewport::Viewport;
use serde::{Deserialize, Serialize};
use std::path::Path;
use svg::node::element::{Line, Rectangle, Text};
use svg::node::Comment;
use svg::Document;

const RULER_HEIGHT: f64 = 26.0;
const SCALE_BAR_HEIGHT: f64 = 30.0;
const FOOTER_HEIGHT: f64 = 18.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub show_ruler: bool,
    pub show_scale_bar: bool,
    /// The footer carries a timestamp; disable it for reproducible output.
    pub show_footer: bool,
    pub title: Option<String>,
    pub font_family: String,
    pub provenance_comment: Option<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            show_ruler: true,
            show_scale_bar: true,
            show_footer: true,
            title: None,
            font_family: "Arial, sans-serif".to_string(),
            provenance_comment: None,
        }
    }
}

/// Vertical bands of an exported document.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Layout {
    width: f64,
    title: f64,
    ruler: f64,
    tracks: f64,
    bottom: f64,
}

impl Layout {
    fn tracks_top(&self) -> f64 {
        self.title + self.ruler
    }

    fn bottom_top(&self) -> f64 {
        self.tracks_top() + self.tracks
    }

    fn height(&self) -> f64 {
        self.bottom_top() + self.bottom
    }
}

pub struct ViewExporter {
    config: ExportConfig,
}

impl ViewExporter {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    fn layout(&self, viewport: &Viewport) -> Layout {
        let font = viewport.theme().font_size;
        let mut bottom = 0.0;
        if self.config.show_scale_bar {
            bottom += SCALE_BAR_HEIGHT;
        }
        if self.config.show_footer {
            bottom += FOOTER_HEIGHT;
        }
        Layout {
            width: viewport.space().pixel_width() as f64,
            title: if self.config.title.is_some() { font + 14.0 } else { 0.0 },
            ruler: if self.config.show_ruler { RULER_HEIGHT } else { 0.0 },
            tracks: viewport.total_height(),
            bottom,
        }
    }

    /// Builds the SVG document for the viewport as it currently stands.
    pub fn document(&self, viewport: &Viewport) -> Document {
        let layout = self.layout(viewport);
        let theme = viewport.theme();
        let mut doc = Document::new()
            .set("width", px(layout.width))
            .set("height", px(layout.height()))
            .set("viewBox", (0, 0, px(layout.width), px(layout.height())));

        if let Some(comment) = &self.config.provenance_comment {
            for line in comment.lines() {
                doc = doc.add(Comment::new(format!(" {line} ")));
            }
        }

        doc = doc.add(
            Rectangle::new()
                .set("width", px(layout.width))
                .set("height", px(layout.height()))
                .set("fill", theme.background.to_hex()),
        );

        if let Some(title) = &self.config.title {
            doc = doc.add(
                Text::new(title.as_str())
                    .set("x", px(layout.width / 2.0))
                    .set("y", px(theme.font_size + 6.0))
                    .set("font-family", self.config.font_family.as_str())
                    .set("font-size", px(theme.font_size + 4.0))
                    .set("font-weight", "bold")
                    .set("text-anchor", "middle")
                    .set("fill", theme.text.to_hex()),
            );
        }

        if self.config.show_ruler {
            doc = self.add_ruler(doc, viewport, &layout);
        }

        let mut surface = SvgSurface::translated(self.config.font_family.as_str(), 0.0, layout.tracks_top());
        viewport.render(&mut surface);
        doc = doc.add(surface.finish().set("id", "tracks"));

        let mut y = layout.bottom_top();
        if self.config.show_scale_bar {
            doc = self.add_scale_bar(doc, viewport, y + 12.0);
            y += SCALE_BAR_HEIGHT;
        }
        if self.config.show_footer {
            doc = self.add_footer(doc, viewport, y + FOOTER_HEIGHT - 5.0);
        }
        doc
    }

    fn small_text(&self, content: String, x: f64, y: f64, size: f64, color: String) -> Text {
        Text::new(content)
            .set("x", px(x))
            .set("y", px(y))
            .set("font-family", self.config.font_family.as_str())
            .set("font-size", px(size))
            .set("fill", color)
    }

    fn add_ruler(&self, mut doc: Document, viewport: &Viewport, layout: &Layout) -> Document {
        let theme = viewport.theme();
        let space = viewport.space();
        let region = space.region();
        let base = layout.title + RULER_HEIGHT - 6.0;

        doc = doc.add(
            Line::new()
                .set("x1", 0)
                .set("y1", px(base))
                .set("x2", px(layout.width))
                .set("y2", px(base))
                .set("stroke", theme.text.to_hex())
                .set("stroke-width", 1),
        );
        doc = doc.add(
            self.small_text(
                region.chromosome().to_string(),
                2.0,
                base - 10.0,
                theme.font_size - 1.0,
                theme.text.to_hex(),
            )
            .set("font-weight", "bold"),
        );

        for tick in nice_ticks(region.start() as f64, region.end() as f64, 6) {
            let x = space.to_pixel_unclamped(tick as u64);
            doc = doc
                .add(
                    Line::new()
                        .set("x1", px(x))
                        .set("y1", px(base - 4.0))
                        .set("x2", px(x))
                        .set("y2", px(base))
                        .set("stroke", theme.text.to_hex())
                        .set("stroke-width", 1),
                )
                .add(
                    self.small_text(
                        group_thousands(tick as u64),
                        x,
                        base - 8.0,
                        theme.font_size - 2.0,
                        theme.muted.to_hex(),
                    )
                    .set("text-anchor", "middle"),
                );
        }
        doc
    }

    fn add_scale_bar(&self, doc: Document, viewport: &Viewport, y: f64) -> Document {
        let theme = viewport.theme();
        let bp_per_px = viewport.space().bp_per_pixel();
        let width = viewport.space().pixel_width() as f64;
        let target_bp = (bp_per_px * (width / 5.0).max(60.0)).max(1.0);
        let nice_bp = nice_round_length(target_bp);
        let length = nice_bp / bp_per_px;
        let x = 20.0;
        let stroke = theme.text.to_hex();

        let tick = |at: f64| {
            Line::new()
                .set("x1", px(at))
                .set("y1", px(y - 4.0))
                .set("x2", px(at))
                .set("y2", px(y + 4.0))
                .set("stroke", stroke.clone())
                .set("stroke-width", 1)
        };
        doc.add(
            Line::new()
                .set("x1", px(x))
                .set("y1", px(y))
                .set("x2", px(x + length))
                .set("y2", px(y))
                .set("stroke", stroke.clone())
                .set("stroke-width", 2),
        )
        .add(tick(x))
        .add(tick(x + length))
        .add(
            self.small_text(format_bp(nice_bp), x + length / 2.0, y + 14.0, theme.font_size, stroke.clone())
                .set("text-anchor", "middle"),
        )
    }

    fn add_footer(&self, doc: Document, viewport: &Viewport, y: f64) -> Document {
        let theme = viewport.theme();
        let text = format!(
            "genoview v{} | {} | {:.2} bp/px | Generated: {}",
            genoview_core::VERSION,
            viewport.region().locus(),
            viewport.space().bp_per_pixel(),
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        );
        doc.add(self.small_text(text, 6.0, y, theme.font_size - 2.0, theme.muted.to_hex()))
    }

    pub fn export_string(&self, viewport: &Viewport) -> String {
        self.document(viewport).to_string()
    }

    /// Writes the document to `path`.
    pub fn export_svg<P: AsRef<Path>>(&self, path: P, viewport: &Viewport) -> Result<()> {
        let path = path.as_ref();
        let document = self.document(viewport);
        svg::save(path, &document).with_context(|| format!("failed to write SVG to {}", path.display()))?;
        log::info!("wrote {} ({})", path.display(), viewport.region().locus());
        Ok(())
    }
}

/// Human-friendly base-pair length.
pub fn format_bp(bp: f64) -> String {
    if bp >= 1e9 {
        format!("{:.2} Gb", bp / 1e9)
    } else if bp >= 1e6 {
        format!("{:.2} Mb", bp / 1e6)
    } else if bp >= 1e3 {
        format!("{:.2} kb", bp / 1e3)
    } else {
        format!("{:.0} bp", bp)
    }
}

/// Rounds up to 2, 5 or 10 times a power of ten.
pub fn nice_round_length(x: f64) -> f64 {
    if x <= 0.0 || !x.is_finite() {
        return 1.0;
    }
    let base = 10f64.powf(x.log10().floor());
    let mantissa = x / base;
    let nice = if mantissa <= 1.0 {
        1.0
    } else if mantissa <= 2.0 {
        2.0
    } else if mantissa <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * base
}

/// Round positions between `min` and `max`, about `desired` of them.
pub fn nice_ticks(min: f64, max: f64, desired: usize) -> Vec<f64> {
    let span = (max - min).max(1.0);
    let step = nice_round_length(span / desired.max(1) as f64).max(1.0);
    let mut ticks = Vec::new();
    let mut v = (min / step).ceil() * step;
    while v <= max {
        ticks.push(v);
        v += step;
    }
    ticks
}
