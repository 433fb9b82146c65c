use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// The closed set of track kinds the engine knows how to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Gene,
    Mutation,
    Signal,
    Alignment,
    Junction,
    Matrix,
}

impl TrackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackKind::Gene => "gene",
            TrackKind::Mutation => "mutation",
            TrackKind::Signal => "signal",
            TrackKind::Alignment => "alignment",
            TrackKind::Junction => "junction",
            TrackKind::Matrix => "matrix",
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attribute value seen by filter predicates.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Text(String),
    Number(f64),
}

impl AttrValue {
    pub fn text(value: impl Into<String>) -> Self {
        AttrValue::Text(value.into())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttrValue::Number(n) => Some(*n),
            AttrValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Text(s) => f.write_str(s),
            AttrValue::Number(n) => write!(f, "{n}"),
        }
    }
}

/// Common surface of every identifiable feature.
pub trait Annotated {
    fn feature_id(&self) -> &FeatureId;

    fn span(&self) -> Span;

    /// Named attribute for filtering; `None` when this kind has no such key.
    fn attribute(&self, key: &str) -> Option<AttrValue>;

    fn sample_id(&self) -> Option<&str> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneFeature {
    pub id: FeatureId,
    pub name: String,
    pub span: Span,
    pub strand: Strand,
    #[serde(default)]
    pub exons: Vec<Span>,
    #[serde(default)]
    pub biotype: Option<String>,
}

impl GeneFeature {
    /// Gaps between consecutive exons.
    pub fn introns(&self) -> Vec<Span> {
        let mut exons = self.exons.clone();
        exons.sort_by_key(|e| e.start);
        exons
            .windows(2)
            .filter(|pair| pair[0].end < pair[1].start)
            .map(|pair| Span::new(pair[0].end, pair[1].start))
            .collect()
    }
}

impl Annotated for GeneFeature {
    fn feature_id(&self) -> &FeatureId {
        &self.id
    }

    fn span(&self) -> Span {
        self.span
    }

    fn attribute(&self, key: &str) -> Option<AttrValue> {
        match key {
            "name" | "gene" => Some(AttrValue::text(&self.name)),
            "biotype" => self.biotype.as_deref().map(AttrValue::text),
            "strand" => Some(AttrValue::text(self.strand.as_str())),
            "length" => Some(AttrValue::Number(self.span.len() as f64)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Consequence {
    Missense,
    Nonsense,
    Frameshift,
    Splice,
    InFrameIndel,
    Silent,
    #[serde(other)]
    Other,
}

impl Consequence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Consequence::Missense => "missense",
            Consequence::Nonsense => "nonsense",
            Consequence::Frameshift => "frameshift",
            Consequence::Splice => "splice",
            Consequence::InFrameIndel => "in_frame_indel",
            Consequence::Silent => "silent",
            Consequence::Other => "other",
        }
    }

    /// Lower is more severe; clusters take the colour of their worst member.
    pub fn severity(&self) -> u8 {
        match self {
            Consequence::Nonsense => 0,
            Consequence::Frameshift => 1,
            Consequence::Splice => 2,
            Consequence::Missense => 3,
            Consequence::InFrameIndel => 4,
            Consequence::Other => 5,
            Consequence::Silent => 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationFeature {
    pub id: FeatureId,
    pub position: GenomicPos,
    pub consequence: Consequence,
    pub sample_id: String,
    pub gene: String,
    #[serde(default)]
    pub protein_change: Option<String>,
}

impl Annotated for MutationFeature {
    fn feature_id(&self) -> &FeatureId {
        &self.id
    }

    fn span(&self) -> Span {
        Span::point(self.position)
    }

    fn attribute(&self, key: &str) -> Option<AttrValue> {
        match key {
            "consequence" => Some(AttrValue::text(self.consequence.as_str())),
            "gene" => Some(AttrValue::text(&self.gene)),
            "sample" => Some(AttrValue::text(&self.sample_id)),
            "protein_change" => self.protein_change.as_deref().map(AttrValue::text),
            "position" => Some(AttrValue::Number(self.position as f64)),
            _ => None,
        }
    }

    fn sample_id(&self) -> Option<&str> {
        Some(&self.sample_id)
    }
}

/// One bin of a continuous signal, starting at `position`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalBin {
    pub position: GenomicPos,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalData {
    pub bin_size: u64,
    pub bins: Vec<SignalBin>,
}

impl SignalData {
    pub fn new(bin_size: u64, bins: Vec<SignalBin>) -> Self {
        Self {
            bin_size: bin_size.max(1),
            bins,
        }
    }

    /// Re-aggregates into bins of `bin_size` bases taking the maximum, so
    /// narrow peaks survive downsampling. Never produces finer bins than the
    /// source.
    pub fn rebin(&self, bin_size: u64) -> SignalData {
        let target = bin_size.max(self.bin_size).max(1);
        if target == self.bin_size {
            return self.clone();
        }
        let mut out: Vec<SignalBin> = Vec::with_capacity(self.bins.len() / 2 + 1);
        for bin in &self.bins {
            let bucket = bin.position / target * target;
            match out.last_mut() {
                Some(last) if last.position == bucket => {
                    if bin.value > last.value {
                        last.value = bin.value;
                    }
                }
                _ => out.push(SignalBin {
                    position: bucket,
                    value: bin.value,
                }),
            }
        }
        SignalData {
            bin_size: target,
            bins: out,
        }
    }

    pub fn bin_span(&self, bin: &SignalBin) -> Span {
        Span::new(bin.position, bin.position.saturating_add(self.bin_size))
    }

    pub fn max_value(&self) -> f64 {
        self.bins
            .iter()
            .map(|b| b.value)
            .filter(|v| v.is_finite())
            .fold(0.0, f64::max)
    }

    /// Value of the bin containing `pos`.
    pub fn value_at(&self, pos: GenomicPos) -> Option<f64> {
        let idx = self.bins.partition_point(|b| b.position <= pos);
        let bin = self.bins.get(idx.checked_sub(1)?)?;
        self.bin_span(bin).contains(pos).then_some(bin.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CigarKind {
    Match,
    Insertion,
    Deletion,
    Skip,
    SoftClip,
    Mismatch,
}

impl CigarKind {
    fn from_code(code: char) -> Option<Self> {
        match code {
            'M' | '=' => Some(CigarKind::Match),
            'I' => Some(CigarKind::Insertion),
            'D' => Some(CigarKind::Deletion),
            'N' => Some(CigarKind::Skip),
            'S' => Some(CigarKind::SoftClip),
            'X' => Some(CigarKind::Mismatch),
            _ => None,
        }
    }

    fn code(&self) -> char {
        match self {
            CigarKind::Match => 'M',
            CigarKind::Insertion => 'I',
            CigarKind::Deletion => 'D',
            CigarKind::Skip => 'N',
            CigarKind::SoftClip => 'S',
            CigarKind::Mismatch => 'X',
        }
    }

    pub fn consumes_reference(&self) -> bool {
        matches!(
            self,
            CigarKind::Match | CigarKind::Deletion | CigarKind::Skip | CigarKind::Mismatch
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CigarOp {
    pub kind: CigarKind,
    pub len: u32,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CigarError {
    #[error("unknown cigar operation '{0}'")]
    UnknownOp(char),
    #[error("cigar operation '{0}' has no length")]
    MissingLength(char),
    #[error("cigar string ends with a dangling length")]
    TrailingLength,
}

/// Edit operations of one read, serialized as a CIGAR string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cigar(pub Vec<CigarOp>);

impl TryFrom<String> for Cigar {
    type Error = CigarError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        parse_cigar(&s).map(Cigar)
    }
}

impl From<Cigar> for String {
    fn from(cigar: Cigar) -> Self {
        cigar.to_string()
    }
}

impl fmt::Display for Cigar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for op in &self.0 {
            write!(f, "{}{}", op.len, op.kind.code())?;
        }
        Ok(())
    }
}

pub fn parse_cigar(s: &str) -> Result<Vec<CigarOp>, CigarError> {
    let mut ops = Vec::new();
    let mut len: Option<u32> = None;
    for c in s.trim().chars() {
        if let Some(d) = c.to_digit(10) {
            len = Some(len.unwrap_or(0).saturating_mul(10).saturating_add(d));
            continue;
        }
        // Hard clips and padding leave nothing to draw.
        if c == 'H' || c == 'P' {
            len.take().ok_or(CigarError::MissingLength(c))?;
            continue;
        }
        let kind = CigarKind::from_code(c).ok_or(CigarError::UnknownOp(c))?;
        let len = len.take().ok_or(CigarError::MissingLength(c))?;
        ops.push(CigarOp { kind, len });
    }
    if len.is_some() {
        return Err(CigarError::TrailingLength);
    }
    Ok(ops)
}

/// A non-match edit placed on the reference axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditSpan {
    pub kind: CigarKind,
    /// Insertions are anchored as a one-base span at the insertion point.
    pub span: Span,
    pub len: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentFeature {
    pub id: FeatureId,
    pub span: Span,
    pub strand: Strand,
    #[serde(default)]
    pub mapq: u8,
    #[serde(default)]
    pub sample_id: Option<String>,
    #[serde(default)]
    pub cigar: Cigar,
}

impl AlignmentFeature {
    /// Soft clips, indels, skips and mismatches on reference coordinates.
    /// Soft clips hang off the read ends.
    pub fn edits(&self) -> Vec<EditSpan> {
        let mut edits = Vec::new();
        let mut pos = self.span.start;
        let mut seen_aligned = false;
        for op in &self.cigar.0 {
            let len = op.len as u64;
            match op.kind {
                CigarKind::Match => {
                    pos += len;
                    seen_aligned = true;
                }
                CigarKind::SoftClip => {
                    let span = if seen_aligned {
                        Span::new(pos, pos + len)
                    } else {
                        Span::new(pos.saturating_sub(len), pos)
                    };
                    edits.push(EditSpan {
                        kind: op.kind,
                        span,
                        len: op.len,
                    });
                }
                CigarKind::Insertion => edits.push(EditSpan {
                    kind: op.kind,
                    span: Span::point(pos),
                    len: op.len,
                }),
                CigarKind::Deletion | CigarKind::Skip | CigarKind::Mismatch => {
                    edits.push(EditSpan {
                        kind: op.kind,
                        span: Span::new(pos, pos + len),
                        len: op.len,
                    });
                    pos += len;
                    seen_aligned = true;
                }
            }
        }
        edits
    }

    /// Extent including soft-clipped overhangs, used for row packing.
    pub fn footprint(&self) -> Span {
        self.edits()
            .iter()
            .filter(|e| e.kind == CigarKind::SoftClip)
            .fold(self.span, |acc, e| {
                Span::new(acc.start.min(e.span.start), acc.end.max(e.span.end))
            })
    }
}

impl Annotated for AlignmentFeature {
    fn feature_id(&self) -> &FeatureId {
        &self.id
    }

    fn span(&self) -> Span {
        self.span
    }

    fn attribute(&self, key: &str) -> Option<AttrValue> {
        match key {
            "mapq" => Some(AttrValue::Number(self.mapq as f64)),
            "strand" => Some(AttrValue::text(self.strand.as_str())),
            "sample" => self.sample_id.as_deref().map(AttrValue::text),
            _ => None,
        }
    }

    fn sample_id(&self) -> Option<&str> {
        self.sample_id.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JunctionFeature {
    pub id: FeatureId,
    pub donor: GenomicPos,
    pub acceptor: GenomicPos,
    pub support: u32,
    pub strand: Strand,
}

impl Annotated for JunctionFeature {
    fn feature_id(&self) -> &FeatureId {
        &self.id
    }

    fn span(&self) -> Span {
        let (lo, hi) = if self.donor <= self.acceptor {
            (self.donor, self.acceptor)
        } else {
            (self.acceptor, self.donor)
        };
        Span::new(lo, hi.max(lo + 1))
    }

    fn attribute(&self, key: &str) -> Option<AttrValue> {
        match key {
            "support" => Some(AttrValue::Number(self.support as f64)),
            "strand" => Some(AttrValue::text(self.strand.as_str())),
            _ => None,
        }
    }
}

/// One cell of a sample-by-position heatmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixCell {
    pub id: FeatureId,
    pub sample_id: String,
    pub span: Span,
    pub value: f64,
}

impl Annotated for MatrixCell {
    fn feature_id(&self) -> &FeatureId {
        &self.id
    }

    fn span(&self) -> Span {
        self.span
    }

    fn attribute(&self, key: &str) -> Option<AttrValue> {
        match key {
            "sample" => Some(AttrValue::text(&self.sample_id)),
            "value" => Some(AttrValue::Number(self.value)),
            _ => None,
        }
    }

    fn sample_id(&self) -> Option<&str> {
        Some(&self.sample_id)
    }
}

/// Typed payload returned by a provider for one track kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "features", rename_all = "lowercase")]
pub enum FeatureSet {
    Gene(Vec<GeneFeature>),
    Mutation(Vec<MutationFeature>),
    Signal(SignalData),
    Alignment(Vec<AlignmentFeature>),
    Junction(Vec<JunctionFeature>),
    Matrix(Vec<MatrixCell>),
}

impl FeatureSet {
    pub fn empty(kind: TrackKind) -> Self {
        match kind {
            TrackKind::Gene => FeatureSet::Gene(Vec::new()),
            TrackKind::Mutation => FeatureSet::Mutation(Vec::new()),
            TrackKind::Signal => FeatureSet::Signal(SignalData::new(1, Vec::new())),
            TrackKind::Alignment => FeatureSet::Alignment(Vec::new()),
            TrackKind::Junction => FeatureSet::Junction(Vec::new()),
            TrackKind::Matrix => FeatureSet::Matrix(Vec::new()),
        }
    }

    pub fn kind(&self) -> TrackKind {
        match self {
            FeatureSet::Gene(_) => TrackKind::Gene,
            FeatureSet::Mutation(_) => TrackKind::Mutation,
            FeatureSet::Signal(_) => TrackKind::Signal,
            FeatureSet::Alignment(_) => TrackKind::Alignment,
            FeatureSet::Junction(_) => TrackKind::Junction,
            FeatureSet::Matrix(_) => TrackKind::Matrix,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FeatureSet::Gene(v) => v.len(),
            FeatureSet::Mutation(v) => v.len(),
            FeatureSet::Signal(s) => s.bins.len(),
            FeatureSet::Alignment(v) => v.len(),
            FeatureSet::Junction(v) => v.len(),
            FeatureSet::Matrix(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops everything that does not intersect `span`. Providers may
    /// over-fetch; nothing outside the requested region reaches a track.
    pub fn retain_overlapping(&mut self, span: &Span) {
        match self {
            FeatureSet::Gene(v) => v.retain(|f| f.span().overlaps(span)),
            FeatureSet::Mutation(v) => v.retain(|f| f.span().overlaps(span)),
            FeatureSet::Signal(s) => {
                let bin_size = s.bin_size;
                s.bins.retain(|b| {
                    Span::new(b.position, b.position.saturating_add(bin_size)).overlaps(span)
                })
            }
            FeatureSet::Alignment(v) => v.retain(|f| f.span().overlaps(span)),
            FeatureSet::Junction(v) => v.retain(|f| f.span().overlaps(span)),
            FeatureSet::Matrix(v) => v.retain(|f| f.span().overlaps(span)),
        }
    }

    /// Spans in storage order; signal bins count as `bin_size` wide.
    pub fn spans(&self) -> Vec<Span> {
        fn spans<T: Annotated>(items: &[T]) -> Vec<Span> {
            items.iter().map(Annotated::span).collect()
        }
        match self {
            FeatureSet::Gene(v) => spans(v),
            FeatureSet::Mutation(v) => spans(v),
            FeatureSet::Signal(s) => s.bins.iter().map(|b| s.bin_span(b)).collect(),
            FeatureSet::Alignment(v) => spans(v),
            FeatureSet::Junction(v) => spans(v),
            FeatureSet::Matrix(v) => spans(v),
        }
    }

    /// Copy of the entries at `indices` (positions in storage order).
    /// Out-of-range indices are skipped.
    pub fn subset(&self, indices: &[usize]) -> FeatureSet {
        fn pick<T: Clone>(items: &[T], indices: &[usize]) -> Vec<T> {
            indices.iter().filter_map(|&i| items.get(i).cloned()).collect()
        }
        match self {
            FeatureSet::Gene(v) => FeatureSet::Gene(pick(v, indices)),
            FeatureSet::Mutation(v) => FeatureSet::Mutation(pick(v, indices)),
            FeatureSet::Signal(s) => FeatureSet::Signal(SignalData {
                bin_size: s.bin_size,
                bins: pick(&s.bins, indices),
            }),
            FeatureSet::Alignment(v) => FeatureSet::Alignment(pick(v, indices)),
            FeatureSet::Junction(v) => FeatureSet::Junction(pick(v, indices)),
            FeatureSet::Matrix(v) => FeatureSet::Matrix(pick(v, indices)),
        }
    }

    pub fn feature_ids(&self) -> BTreeSet<FeatureId> {
        fn ids<T: Annotated>(items: &[T]) -> BTreeSet<FeatureId> {
            items.iter().map(|f| f.feature_id().clone()).collect()
        }
        match self {
            FeatureSet::Gene(v) => ids(v),
            FeatureSet::Mutation(v) => ids(v),
            FeatureSet::Signal(_) => BTreeSet::new(),
            FeatureSet::Alignment(v) => ids(v),
            FeatureSet::Junction(v) => ids(v),
            FeatureSet::Matrix(v) => ids(v),
        }
    }

    pub fn sample_ids(&self) -> BTreeSet<String> {
        fn samples<T: Annotated>(items: &[T]) -> BTreeSet<String> {
            items
                .iter()
                .filter_map(|f| f.sample_id().map(str::to_string))
                .collect()
        }
        match self {
            FeatureSet::Mutation(v) => samples(v),
            FeatureSet::Alignment(v) => samples(v),
            FeatureSet::Matrix(v) => samples(v),
            _ => BTreeSet::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(cigar: &str) -> AlignmentFeature {
        AlignmentFeature {
            id: "r1".into(),
            span: Span::new(100, 200),
            strand: Strand::Forward,
            mapq: 60,
            sample_id: None,
            cigar: Cigar(parse_cigar(cigar).unwrap()),
        }
    }

    #[test]
    fn test_parse_cigar() {
        let ops = parse_cigar("5S10M2I3D4N1X5H").unwrap();
        assert_eq!(ops.len(), 6);
        assert_eq!(ops[0], CigarOp { kind: CigarKind::SoftClip, len: 5 });
        assert_eq!(ops[5], CigarOp { kind: CigarKind::Mismatch, len: 1 });
        assert_eq!(parse_cigar("10Q"), Err(CigarError::UnknownOp('Q')));
        assert_eq!(parse_cigar("M"), Err(CigarError::MissingLength('M')));
        assert_eq!(parse_cigar("10M5"), Err(CigarError::TrailingLength));
    }

    #[test]
    fn test_edits_are_positioned_on_reference() {
        let edits = read("5S10M2I3D20M4S").edits();
        let kinds: Vec<_> = edits.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                CigarKind::SoftClip,
                CigarKind::Insertion,
                CigarKind::Deletion,
                CigarKind::SoftClip
            ]
        );
        assert_eq!(edits[0].span, Span::new(95, 100));
        assert_eq!(edits[1].span, Span::point(110));
        assert_eq!(edits[2].span, Span::new(110, 113));
        assert_eq!(edits[3].span, Span::new(133, 137));
        assert_eq!(read("5S10M2I3D20M4S").footprint(), Span::new(95, 200));
    }

    #[test]
    fn test_introns_between_exons() {
        let gene = GeneFeature {
            id: "g".into(),
            name: "TP53".into(),
            span: Span::new(0, 100),
            strand: Strand::Reverse,
            exons: vec![Span::new(60, 100), Span::new(0, 10), Span::new(30, 40)],
            biotype: Some("protein_coding".into()),
        };
        assert_eq!(gene.introns(), vec![Span::new(10, 30), Span::new(40, 60)]);
        assert_eq!(gene.attribute("biotype"), Some(AttrValue::text("protein_coding")));
        assert_eq!(gene.attribute("consequence"), None);
    }

    #[test]
    fn test_signal_rebin_takes_max() {
        let data = SignalData::new(
            10,
            vec![
                SignalBin { position: 0, value: 1.0 },
                SignalBin { position: 10, value: 5.0 },
                SignalBin { position: 20, value: 2.0 },
                SignalBin { position: 40, value: 3.0 },
            ],
        );
        let coarse = data.rebin(30);
        assert_eq!(coarse.bin_size, 30);
        assert_eq!(
            coarse.bins,
            vec![
                SignalBin { position: 0, value: 5.0 },
                SignalBin { position: 30, value: 3.0 },
            ]
        );
        assert_eq!(data.rebin(1).bin_size, 10);
        assert_eq!(data.value_at(15), Some(5.0));
        assert_eq!(data.value_at(35), None);
    }

    #[test]
    fn test_feature_set_json_shape() {
        let json = r#"{"kind":"mutation","features":[
            {"id":"m1","position":7577538,"consequence":"missense","sample_id":"S1","gene":"TP53"},
            {"id":"m2","position":7578000,"consequence":"stop_gained_weird","sample_id":"S2","gene":"TP53"}
        ]}"#;
        let mut set: FeatureSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.kind(), TrackKind::Mutation);
        assert_eq!(set.len(), 2);
        if let FeatureSet::Mutation(v) = &set {
            assert_eq!(v[1].consequence, Consequence::Other);
        }
        set.retain_overlapping(&Span::new(7_577_000, 7_577_600));
        assert_eq!(set.len(), 1);
        assert_eq!(set.sample_ids().into_iter().collect::<Vec<_>>(), vec!["S1"]);
    }

    #[test]
    fn test_alignment_cigar_deserializes_from_string() {
        let json = r#"{"id":"r","span":{"start":0,"end":10},"strand":"-","cigar":"2S8M"}"#;
        let aln: AlignmentFeature = serde_json::from_str(json).unwrap();
        assert_eq!(aln.cigar.to_string(), "2S8M");
        assert_eq!(aln.strand, Strand::Reverse);
    }
}
