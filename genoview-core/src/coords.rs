use crate::error::{CoordError, RegionError};
use crate::lod::Resolution;
use crate::types::*;

pub const DEFAULT_MIN_SPAN: GenomicPos = 1;

// Guards floor() against 0.9999999 artifacts of the float division.
const POSITION_EPSILON: f64 = 1e-9;

/// Linear mapping between one genomic region and a horizontal pixel range.
///
/// A space is a value: `zoom`, `pan`, `resize` and `center_on` return a new
/// space and leave the receiver untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateSpace {
    region: GenomicRegion,
    pixel_width: u32,
    chromosome_length: GenomicPos,
    min_span: GenomicPos,
}

impl CoordinateSpace {
    pub fn new(
        region: GenomicRegion,
        pixel_width: u32,
        chromosome_length: GenomicPos,
    ) -> Result<Self, CoordError> {
        if pixel_width == 0 {
            return Err(CoordError::ZeroWidth);
        }
        if region.end() > chromosome_length {
            return Err(RegionError::BeyondChromosome {
                chromosome: region.chromosome().to_string(),
                end: region.end(),
                length: chromosome_length,
            }
            .into());
        }
        Ok(Self {
            region,
            pixel_width,
            chromosome_length,
            min_span: DEFAULT_MIN_SPAN,
        })
    }

    /// Validates `region` against `genome` and uses its chromosome length
    /// as the maximum span.
    pub fn for_genome(
        genome: &Genome,
        region: &GenomicRegion,
        pixel_width: u32,
    ) -> Result<Self, CoordError> {
        let region = genome.canonicalize(region)?;
        let length = genome
            .chromosome_length(region.chromosome())
            .ok_or_else(|| RegionError::UnknownChromosome(region.chromosome().to_string()))?;
        Self::new(region, pixel_width, length)
    }

    pub fn with_min_span(mut self, min_span: GenomicPos) -> Self {
        self.min_span = min_span.max(1);
        self
    }

    pub fn region(&self) -> &GenomicRegion {
        &self.region
    }

    pub fn pixel_width(&self) -> u32 {
        self.pixel_width
    }

    pub fn chromosome_length(&self) -> GenomicPos {
        self.chromosome_length
    }

    pub fn min_span(&self) -> GenomicPos {
        self.min_span
    }

    pub fn bp_per_pixel(&self) -> f64 {
        self.region.len() as f64 / self.pixel_width as f64
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.bp_per_pixel())
    }

    /// Maps a position to an x offset. Positions further than one region
    /// width outside the region are rejected; use
    /// [`to_pixel_unclamped`](Self::to_pixel_unclamped) for off-screen
    /// projection.
    pub fn to_pixel(&self, pos: GenomicPos) -> Result<f64, CoordError> {
        let len = self.region.len();
        let low = self.region.start().saturating_sub(len);
        let high = self.region.end().saturating_add(len);
        if pos < low || pos > high {
            return Err(CoordError::OutOfRange {
                position: pos,
                start: self.region.start(),
                end: self.region.end(),
            });
        }
        Ok(self.to_pixel_unclamped(pos))
    }

    pub fn to_pixel_unclamped(&self, pos: GenomicPos) -> f64 {
        (pos as f64 - self.region.start() as f64) / self.bp_per_pixel()
    }

    /// Pixel for a position the caller has already clipped to the region.
    pub fn clamped_pixel(&self, pos: GenomicPos) -> f64 {
        debug_assert!(
            self.to_pixel(pos).is_ok(),
            "position {pos} far outside {}",
            self.region
        );
        self.to_pixel_unclamped(pos)
            .clamp(0.0, self.pixel_width as f64)
    }

    /// Clips `span` to the region and returns its `(x0, x1)` pixel extent.
    pub fn span_to_pixels(&self, span: &Span) -> Option<(f64, f64)> {
        let clipped = span.intersect(&self.region.span())?;
        Some((
            self.clamped_pixel(clipped.start),
            self.clamped_pixel(clipped.end),
        ))
    }

    /// Inverse of [`to_pixel`](Self::to_pixel); clamps to the region bounds.
    pub fn to_position(&self, px: f64) -> GenomicPos {
        let px = if px.is_finite() {
            px.clamp(0.0, self.pixel_width as f64)
        } else {
            0.0
        };
        let offset = (px * self.bp_per_pixel() + POSITION_EPSILON).floor() as GenomicPos;
        (self.region.start() + offset).min(self.region.end())
    }

    fn span_limits(&self) -> (GenomicPos, GenomicPos) {
        let max = self.chromosome_length.max(1);
        (self.min_span.min(max), max)
    }

    fn with_start_len(&self, start: i128, len: GenomicPos) -> Self {
        let max_start = (self.chromosome_length - len) as i128;
        let start = start.clamp(0, max_start) as GenomicPos;
        Self {
            region: self.region.with_bounds(start, start + len),
            pixel_width: self.pixel_width,
            chromosome_length: self.chromosome_length,
            min_span: self.min_span,
        }
    }

    /// Scales the span by `factor` (below 1 zooms in) keeping the base under
    /// `anchor_px` fixed. The span is clamped to `[min_span, chromosome]`.
    pub fn zoom(&self, factor: f64, anchor_px: f64) -> Self {
        if !factor.is_finite() || factor <= 0.0 {
            return self.clone();
        }
        let width = self.pixel_width as f64;
        let anchor_px = if anchor_px.is_finite() {
            anchor_px.clamp(0.0, width)
        } else {
            width / 2.0
        };
        let anchor_pos = self.region.start() as f64 + anchor_px * self.bp_per_pixel();

        let (min_len, max_len) = self.span_limits();
        let target = (self.region.len() as f64 * factor).round();
        let new_len = if target >= max_len as f64 {
            max_len
        } else {
            (target as GenomicPos).clamp(min_len, max_len)
        };

        let new_start = anchor_pos - anchor_px * (new_len as f64 / width);
        self.with_start_len(new_start.round() as i128, new_len)
    }

    /// Shifts the region by `delta_px` worth of bases. Positive deltas move
    /// towards higher coordinates; the span length never changes.
    pub fn pan(&self, delta_px: f64) -> Self {
        if !delta_px.is_finite() {
            return self.clone();
        }
        let delta_bp = (delta_px * self.bp_per_pixel()).round() as i128;
        self.with_start_len(self.region.start() as i128 + delta_bp, self.region.len())
    }

    pub fn center_on(&self, pos: GenomicPos) -> Self {
        let len = self.region.len();
        self.with_start_len(pos as i128 - (len / 2) as i128, len)
    }

    pub fn resize(&self, pixel_width: u32) -> Result<Self, CoordError> {
        if pixel_width == 0 {
            return Err(CoordError::ZeroWidth);
        }
        Ok(Self {
            pixel_width,
            ..self.clone()
        })
    }

    /// Same width and limits, different region on the same assembly.
    pub fn with_region(
        &self,
        region: GenomicRegion,
        chromosome_length: GenomicPos,
    ) -> Result<Self, CoordError> {
        Ok(Self::new(region, self.pixel_width, chromosome_length)?.with_min_span(self.min_span))
    }
}
