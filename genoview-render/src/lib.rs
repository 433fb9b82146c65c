/*!
# genoview Rendering

SVG output for genoview views. [`SvgSurface`] implements the core
[`Surface`](genoview_core::surface::Surface) trait on top of the `svg` crate,
so tracks render into it exactly as they render into a `DisplayList`.
[`ViewExporter`] wraps a whole viewport into a standalone document with a
ruler, scale bar and footer.

Output is deterministic for a given viewport state: coordinates are rounded
to two decimals and the only time-dependent element, the footer timestamp,
can be switched off.
*/

pub mod export;
pub mod svg_surface;

pub use export::{format_bp, ExportConfig, ViewExporter};
pub use svg_surface::SvgSurface;
