//! Row packing and coverage derivation shared by gene and alignment tracks.

use crate::features::SignalBin;
use crate::types::*;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RowLayout {
    /// Row assigned to each input span, `None` when it did not fit under
    /// the row cap.
    pub rows: Vec<Option<u32>>,
    pub row_count: u32,
    pub overflow: usize,
}

/// Greedy first-fit interval packing.
///
/// Spans are visited in start order and placed in the lowest row whose last
/// occupant ends at least `min_gap` bases before the span starts. Spans that
/// would need a row beyond `max_rows` are counted in `overflow`.
pub fn pack_rows(spans: &[Span], min_gap: GenomicPos, max_rows: u32) -> RowLayout {
    let mut order: Vec<usize> = (0..spans.len()).collect();
    order.sort_by_key(|&i| (spans[i].start, spans[i].end, i));

    let mut row_ends: Vec<GenomicPos> = Vec::new();
    let mut rows = vec![None; spans.len()];
    let mut overflow = 0;

    for i in order {
        let span = spans[i];
        let slot = row_ends
            .iter()
            .position(|&end| end.saturating_add(min_gap) <= span.start);
        match slot {
            Some(row) => {
                row_ends[row] = span.end.max(span.start + 1);
                rows[i] = Some(row as u32);
            }
            None if (row_ends.len() as u32) < max_rows => {
                row_ends.push(span.end.max(span.start + 1));
                rows[i] = Some(row_ends.len() as u32 - 1);
            }
            None => overflow += 1,
        }
    }

    RowLayout {
        rows,
        row_count: row_ends.len() as u32,
        overflow,
    }
}

/// Per-bin depth obtained by summing the overlap of each span with each bin.
/// The value of a bin is the mean depth over its bases.
pub fn coverage(spans: &[Span], window: Span, bin_size: u64) -> Vec<SignalBin> {
    let bin_size = bin_size.max(1);
    if window.is_empty() {
        return Vec::new();
    }
    let first_bin = window.start / bin_size;
    let n_bins = ((window.end - 1) / bin_size - first_bin + 1) as usize;
    let mut depth = vec![0u64; n_bins];

    for span in spans {
        let Some(clipped) = span.intersect(&window) else {
            continue;
        };
        let mut pos = clipped.start;
        while pos < clipped.end {
            let bin = pos / bin_size;
            let bin_end = ((bin + 1) * bin_size).min(clipped.end);
            depth[(bin - first_bin) as usize] += bin_end - pos;
            pos = bin_end;
        }
    }

    depth
        .into_iter()
        .enumerate()
        .map(|(i, bases)| SignalBin {
            position: (first_bin + i as u64) * bin_size,
            value: bases as f64 / bin_size as f64,
        })
        .collect()
}
