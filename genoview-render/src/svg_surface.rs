//! [`Surface`] implementation that builds an `svg` document tree.

use genoview_core::surface::{Paint, Surface, TextStyle};
use svg::node::element::{Circle, Group, Line, Path, Polygon, Rectangle, Text};
use svg::node::Node;

/// Coordinates are written with two decimals so that identical scenes give
/// byte-identical documents.
pub(crate) fn px(value: f64) -> f64 {
    if value.is_finite() {
        (value * 100.0).round() / 100.0
    } else {
        0.0
    }
}

fn painted<T: Node>(mut node: T, paint: &Paint) -> T {
    match paint.fill {
        Some(color) => node.assign("fill", color.to_hex()),
        None => node.assign("fill", "none"),
    }
    if let Some(color) = paint.stroke {
        node.assign("stroke", color.to_hex());
        node.assign("stroke-width", px(paint.stroke_width));
        if paint.dashed {
            node.assign("stroke-dasharray", "4 3");
        }
    }
    if paint.opacity < 1.0 {
        node.assign("opacity", px(paint.opacity));
    }
    node
}

/// Collects track primitives into nested `<g>` elements, one per
/// `begin_group`/`end_group` pair.
#[derive(Debug)]
pub struct SvgSurface {
    font_family: String,
    stack: Vec<Group>,
}

impl SvgSurface {
    pub fn new(font_family: impl Into<String>) -> Self {
        Self {
            font_family: font_family.into(),
            stack: vec![Group::new()],
        }
    }

    /// Surface whose root group is shifted by `(dx, dy)`.
    pub fn translated(font_family: impl Into<String>, dx: f64, dy: f64) -> Self {
        let root = Group::new().set("transform", format!("translate({} {})", px(dx), px(dy)));
        Self {
            font_family: font_family.into(),
            stack: vec![root],
        }
    }

    fn push<T: Node + 'static>(&mut self, node: T) {
        if let Some(top) = self.stack.last_mut() {
            let group = std::mem::replace(top, Group::new());
            *top = group.add(node);
        }
    }

    /// Open groups still on the stack.
    pub fn depth(&self) -> usize {
        self.stack.len().saturating_sub(1)
    }

    /// Closes any unbalanced groups and returns the root group.
    pub fn finish(mut self) -> Group {
        if self.depth() > 0 {
            log::warn!("svg surface: closing {} unbalanced group(s)", self.depth());
        }
        while self.depth() > 0 {
            self.end_group();
        }
        self.stack.pop().unwrap_or_else(Group::new)
    }
}

impl Surface for SvgSurface {
    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64, paint: &Paint) {
        let rect = Rectangle::new()
            .set("x", px(x))
            .set("y", px(y))
            .set("width", px(width.max(0.0)))
            .set("height", px(height.max(0.0)));
        self.push(painted(rect, paint));
    }

    fn line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, paint: &Paint) {
        let line = Line::new()
            .set("x1", px(x0))
            .set("y1", px(y0))
            .set("x2", px(x1))
            .set("y2", px(y1));
        self.push(painted(line, paint));
    }

    fn circle(&mut self, cx: f64, cy: f64, r: f64, paint: &Paint) {
        let circle = Circle::new()
            .set("cx", px(cx))
            .set("cy", px(cy))
            .set("r", px(r));
        self.push(painted(circle, paint));
    }

    fn polygon(&mut self, points: &[(f64, f64)], paint: &Paint) {
        let points = points
            .iter()
            .map(|&(x, y)| format!("{},{}", px(x), px(y)))
            .collect::<Vec<_>>()
            .join(" ");
        self.push(painted(Polygon::new().set("points", points), paint));
    }

    fn quad_curve(&mut self, from: (f64, f64), control: (f64, f64), to: (f64, f64), paint: &Paint) {
        let d = format!(
            "M {} {} Q {} {} {} {}",
            px(from.0),
            px(from.1),
            px(control.0),
            px(control.1),
            px(to.0),
            px(to.1)
        );
        self.push(painted(Path::new().set("d", d), paint));
    }

    fn text(&mut self, x: f64, y: f64, content: &str, style: &TextStyle) {
        let mut text = Text::new(content)
            .set("x", px(x))
            .set("y", px(y))
            .set("font-family", self.font_family.as_str())
            .set("font-size", px(style.size))
            .set("fill", style.color.to_hex())
            .set("text-anchor", style.anchor.as_str());
        if style.bold {
            text = text.set("font-weight", "bold");
        }
        self.push(text);
    }

    fn begin_group(&mut self, id: &str) {
        self.stack.push(Group::new().set("id", id));
    }

    fn end_group(&mut self) {
        if self.stack.len() < 2 {
            return;
        }
        if let Some(group) = self.stack.pop() {
            self.push(group);
        }
    }
}
