/*!
# Level of Detail

Resolution is the bp-per-pixel ratio of the current view. Each track kind
maps it to one of two tiers:
- Detail: individual features (reads, exons, single mutations)
- Summary: aggregated stand-ins (coverage instead of reads)
*/

use crate::features::TrackKind;
use serde::{Deserialize, Serialize};

/// Above this many bases per pixel reads collapse into coverage
/// (300 kb across 800 px).
pub const ALIGNMENT_SUMMARY_BPP: f64 = 375.0;

/// Strand chevrons are drawn on genes only below this resolution.
pub const STRAND_ARROW_MAX_BPP: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelOfDetail {
    Detail,
    Summary,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub bp_per_pixel: f64,
}

impl Resolution {
    pub fn new(bp_per_pixel: f64) -> Self {
        Self { bp_per_pixel }
    }

    /// Smallest whole bin covering at least one pixel.
    pub fn bin_size(&self) -> u64 {
        if self.bp_per_pixel.is_finite() && self.bp_per_pixel > 1.0 {
            self.bp_per_pixel.ceil() as u64
        } else {
            1
        }
    }

    pub fn level_for(&self, kind: TrackKind) -> LevelOfDetail {
        self.level_with(kind, &LodThresholds::default())
    }

    pub fn level_with(&self, kind: TrackKind, thresholds: &LodThresholds) -> LevelOfDetail {
        match kind {
            TrackKind::Alignment if self.bp_per_pixel > thresholds.alignment_summary_bpp => {
                LevelOfDetail::Summary
            }
            TrackKind::Signal | TrackKind::Matrix if self.bp_per_pixel > 1.0 => {
                LevelOfDetail::Summary
            }
            _ => LevelOfDetail::Detail,
        }
    }

    pub fn shows_strand_arrows(&self) -> bool {
        self.bp_per_pixel < STRAND_ARROW_MAX_BPP
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LodThresholds {
    pub alignment_summary_bpp: f64,
}

impl Default for LodThresholds {
    fn default() -> Self {
        Self {
            alignment_summary_bpp: ALIGNMENT_SUMMARY_BPP,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bin_size_never_below_one() {
        assert_eq!(Resolution::new(0.25).bin_size(), 1);
        assert_eq!(Resolution::new(1.0).bin_size(), 1);
        assert_eq!(Resolution::new(32.2).bin_size(), 33);
    }

    #[test]
    fn test_alignment_switches_at_threshold() {
        assert_eq!(
            Resolution::new(375.0).level_for(TrackKind::Alignment),
            LevelOfDetail::Detail
        );
        assert_eq!(
            Resolution::new(375.5).level_for(TrackKind::Alignment),
            LevelOfDetail::Summary
        );
        assert_eq!(
            Resolution::new(10_000.0).level_for(TrackKind::Gene),
            LevelOfDetail::Detail
        );
    }

    #[test]
    fn test_strand_arrow_threshold() {
        assert!(Resolution::new(10.0).shows_strand_arrows());
        assert!(!Resolution::new(50.0).shows_strand_arrows());
    }
}
