//! Drawing surface abstraction tracks render into.
//!
//! Tracks only speak in primitives (rects, lines, arcs, text) in pixel space.
//! `genoview-render` turns them into an SVG document; [`DisplayList`]
//! records them for tests and for determinism checks.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rrggbb` or `rrggbb`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Paint {
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub stroke_width: f64,
    pub opacity: f64,
    pub dashed: bool,
}

impl Paint {
    pub fn fill(color: Color) -> Self {
        Self {
            fill: Some(color),
            opacity: 1.0,
            ..Default::default()
        }
    }

    pub fn stroke(color: Color, width: f64) -> Self {
        Self {
            stroke: Some(color),
            stroke_width: width,
            opacity: 1.0,
            ..Default::default()
        }
    }

    pub fn with_stroke(mut self, color: Color, width: f64) -> Self {
        self.stroke = Some(color);
        self.stroke_width = width;
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn dashed(mut self) -> Self {
        self.dashed = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

impl TextAnchor {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextAnchor::Start => "start",
            TextAnchor::Middle => "middle",
            TextAnchor::End => "end",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub size: f64,
    pub color: Color,
    pub anchor: TextAnchor,
    pub bold: bool,
}

impl TextStyle {
    pub fn new(size: f64, color: Color) -> Self {
        Self {
            size,
            color,
            anchor: TextAnchor::Start,
            bold: false,
        }
    }

    pub fn anchored(mut self, anchor: TextAnchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }
}

/// Pixel-space drawing target. Origin is the top-left corner of the view.
pub trait Surface {
    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64, paint: &Paint);

    fn line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, paint: &Paint);

    fn circle(&mut self, cx: f64, cy: f64, r: f64, paint: &Paint);

    fn polygon(&mut self, points: &[(f64, f64)], paint: &Paint);

    /// Quadratic Bezier from `from` to `to` bending towards `control`.
    fn quad_curve(&mut self, from: (f64, f64), control: (f64, f64), to: (f64, f64), paint: &Paint);

    fn text(&mut self, x: f64, y: f64, content: &str, style: &TextStyle);

    /// Opens a logical group (one per track); nested calls are allowed.
    fn begin_group(&mut self, _id: &str) {}

    fn end_group(&mut self) {}
}

#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        paint: Paint,
    },
    Line {
        from: (f64, f64),
        to: (f64, f64),
        paint: Paint,
    },
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
        paint: Paint,
    },
    Polygon {
        points: Vec<(f64, f64)>,
        paint: Paint,
    },
    QuadCurve {
        from: (f64, f64),
        control: (f64, f64),
        to: (f64, f64),
        paint: Paint,
    },
    Text {
        x: f64,
        y: f64,
        content: String,
        style: TextStyle,
    },
    BeginGroup(String),
    EndGroup,
}

/// Surface that records every primitive in call order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayList {
    pub items: Vec<Primitive>,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(|p| match p {
            Primitive::Text { content, .. } => Some(content.as_str()),
            _ => None,
        })
    }

    pub fn count(&self, pred: impl Fn(&Primitive) -> bool) -> usize {
        self.items.iter().filter(|p| pred(p)).count()
    }

    /// Replays the recording onto another surface.
    pub fn replay(&self, target: &mut dyn Surface) {
        for item in &self.items {
            match item {
                Primitive::Rect {
                    x,
                    y,
                    width,
                    height,
                    paint,
                } => target.rect(*x, *y, *width, *height, paint),
                Primitive::Line { from, to, paint } => {
                    target.line(from.0, from.1, to.0, to.1, paint)
                }
                Primitive::Circle { cx, cy, r, paint } => target.circle(*cx, *cy, *r, paint),
                Primitive::Polygon { points, paint } => target.polygon(points, paint),
                Primitive::QuadCurve {
                    from,
                    control,
                    to,
                    paint,
                } => target.quad_curve(*from, *control, *to, paint),
                Primitive::Text {
                    x,
                    y,
                    content,
                    style,
                } => target.text(*x, *y, content, style),
                Primitive::BeginGroup(id) => target.begin_group(id),
                Primitive::EndGroup => target.end_group(),
            }
        }
    }
}

impl Surface for DisplayList {
    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64, paint: &Paint) {
        self.items.push(Primitive::Rect {
            x,
            y,
            width,
            height,
            paint: paint.clone(),
        });
    }

    fn line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, paint: &Paint) {
        self.items.push(Primitive::Line {
            from: (x0, y0),
            to: (x1, y1),
            paint: paint.clone(),
        });
    }

    fn circle(&mut self, cx: f64, cy: f64, r: f64, paint: &Paint) {
        self.items.push(Primitive::Circle {
            cx,
            cy,
            r,
            paint: paint.clone(),
        });
    }

    fn polygon(&mut self, points: &[(f64, f64)], paint: &Paint) {
        self.items.push(Primitive::Polygon {
            points: points.to_vec(),
            paint: paint.clone(),
        });
    }

    fn quad_curve(&mut self, from: (f64, f64), control: (f64, f64), to: (f64, f64), paint: &Paint) {
        self.items.push(Primitive::QuadCurve {
            from,
            control,
            to,
            paint: paint.clone(),
        });
    }

    fn text(&mut self, x: f64, y: f64, content: &str, style: &TextStyle) {
        self.items.push(Primitive::Text {
            x,
            y,
            content: content.to_string(),
            style: style.clone(),
        });
    }

    fn begin_group(&mut self, id: &str) {
        self.items.push(Primitive::BeginGroup(id.to_string()));
    }

    fn end_group(&mut self) {
        self.items.push(Primitive::EndGroup);
    }
}

/// Colours and sizes shared by every track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub background: Color,
    pub text: Color,
    pub muted: Color,
    pub forward: Color,
    pub reverse: Color,
    pub gene: Color,
    pub signal: Color,
    pub read: Color,
    pub coverage: Color,
    pub soft_clip: Color,
    pub insertion: Color,
    pub deletion: Color,
    pub mismatch: Color,
    pub junction: Color,
    pub selection: Color,
    pub error: Color,
    pub error_background: Color,
    pub heat_low: Color,
    pub heat_high: Color,
    pub font_size: f64,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color::rgb(0xff, 0xff, 0xff),
            text: Color::rgb(0x22, 0x22, 0x22),
            muted: Color::rgb(0x99, 0x99, 0x99),
            forward: Color::rgb(0x2a, 0x6f, 0xef),
            reverse: Color::rgb(0xe5, 0x39, 0x35),
            gene: Color::rgb(0x1f, 0x3a, 0x93),
            signal: Color::rgb(0x2e, 0x7d, 0x32),
            read: Color::rgb(0xb0, 0xb0, 0xb0),
            coverage: Color::rgb(0x78, 0x78, 0x78),
            soft_clip: Color::rgb(0x00, 0xbc, 0xd4),
            insertion: Color::rgb(0x8e, 0x24, 0xaa),
            deletion: Color::rgb(0x00, 0x00, 0x00),
            mismatch: Color::rgb(0xff, 0x98, 0x00),
            junction: Color::rgb(0x6a, 0x1b, 0x9a),
            selection: Color::rgb(0xff, 0xc1, 0x07),
            error: Color::rgb(0xb7, 0x1c, 0x1c),
            error_background: Color::rgb(0xff, 0xeb, 0xee),
            heat_low: Color::rgb(0x21, 0x66, 0xac),
            heat_high: Color::rgb(0xb2, 0x18, 0x2b),
            font_size: 11.0,
        }
    }
}

impl Theme {
    /// Linear blend between `heat_low` and `heat_high`; `t` is clamped to 0..=1.
    pub fn heat(&self, t: f64) -> Color {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Color::rgb(
            mix(self.heat_low.r, self.heat_high.r),
            mix(self.heat_low.g, self.heat_high.g),
            mix(self.heat_low.b, self.heat_high.b),
        )
    }

    pub fn label_style(&self) -> TextStyle {
        TextStyle::new(self.font_size, self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_round_trip() {
        let c = Color::from_hex("#2a6fef").unwrap();
        assert_eq!(c, Color::rgb(0x2a, 0x6f, 0xef));
        assert_eq!(c.to_hex(), "#2a6fef");
        assert!(Color::from_hex("#12345").is_none());
        assert!(Color::from_hex("zzzzzz").is_none());
    }

    #[test]
    fn test_heat_endpoints() {
        let theme = Theme::default();
        assert_eq!(theme.heat(0.0), theme.heat_low);
        assert_eq!(theme.heat(1.0), theme.heat_high);
        assert_eq!(theme.heat(7.0), theme.heat_high);
    }

    #[test]
    fn test_display_list_replay() {
        let mut list = DisplayList::new();
        list.begin_group("t");
        list.rect(0.0, 0.0, 1.0, 1.0, &Paint::fill(Color::rgb(0, 0, 0)));
        list.text(1.0, 2.0, "hi", &TextStyle::new(10.0, Color::rgb(0, 0, 0)));
        list.end_group();
        let mut copy = DisplayList::new();
        list.replay(&mut copy);
        assert_eq!(copy, list);
        assert_eq!(list.texts().collect::<Vec<_>>(), vec!["hi"]);
    }
}
