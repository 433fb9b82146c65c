use crate::types::*;
use rayon::prelude::*;

// Below this many entries a sequential sort is faster than fanning out.
const PARALLEL_SORT_THRESHOLD: usize = 16_384;

/// Sorted-array interval index.
///
/// Entries are ordered by start. A query binary-searches the first entry
/// that could still reach the query (`start >= query.start - max_len`) and
/// walks forward until starts pass the query end, so cost is
/// `O(log n + window)` rather than a scan of every feature.
#[derive(Debug, Clone, Default)]
pub struct IntervalIndex {
    entries: Vec<(Span, usize)>,
    max_len: GenomicPos,
}

impl IntervalIndex {
    /// Builds an index over `spans`; the payload of each entry is its
    /// position in the input.
    pub fn build(spans: impl IntoIterator<Item = Span>) -> Self {
        let mut entries: Vec<(Span, usize)> = spans
            .into_iter()
            .enumerate()
            .map(|(idx, span)| (span, idx))
            .collect();
        if entries.len() >= PARALLEL_SORT_THRESHOLD {
            entries.par_sort_unstable_by_key(|(span, idx)| (span.start, span.end, *idx));
        } else {
            entries.sort_unstable_by_key(|(span, idx)| (span.start, span.end, *idx));
        }
        let max_len = entries.iter().map(|(s, _)| s.len()).max().unwrap_or(0);
        Self { entries, max_len }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Indices of every span overlapping `query`, in start order.
    pub fn query(&self, query: Span) -> Vec<usize> {
        self.iter_overlapping(query).collect()
    }

    pub fn iter_overlapping(&self, query: Span) -> impl Iterator<Item = usize> + '_ {
        self.entries_overlapping(query).map(|(_, idx)| *idx)
    }

    /// The overlapping entry whose centre lies closest to `pos`.
    pub fn nearest(&self, query: Span, pos: GenomicPos) -> Option<usize> {
        self.entries_overlapping(query)
            .min_by_key(|(span, idx)| {
                let centre = span.start + span.len() / 2;
                (centre.abs_diff(pos), *idx)
            })
            .map(|(_, idx)| *idx)
    }

    // Zero-length spans on either side count as one base wide.
    fn entries_overlapping(&self, query: Span) -> impl Iterator<Item = &(Span, usize)> + '_ {
        let floor = query.start.saturating_sub(self.max_len.max(1));
        let first = self.entries.partition_point(|(span, _)| span.start < floor);
        let query_end = query.end.max(query.start + 1);
        self.entries[first..]
            .iter()
            .take_while(move |(span, _)| span.start < query_end)
            .filter(move |(span, _)| query.start < span.end.max(span.start + 1))
    }
}
