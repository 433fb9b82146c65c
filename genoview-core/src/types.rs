use crate::error::RegionError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub type GenomicPos = u64;

/// Stable identifier of a feature returned by a data provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureId(pub String);

impl FeatureId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FeatureId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for FeatureId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Half-open span `[start, end)` on a single chromosome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: GenomicPos,
    pub end: GenomicPos,
}

impl Span {
    pub fn new(start: GenomicPos, end: GenomicPos) -> Self {
        Self { start, end }
    }

    /// A one-base span at `pos`.
    pub fn point(pos: GenomicPos) -> Self {
        Self {
            start: pos,
            end: pos.saturating_add(1),
        }
    }

    pub fn len(&self) -> GenomicPos {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, pos: GenomicPos) -> bool {
        pos >= self.start && pos < self.end
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn intersect(&self, other: &Span) -> Option<Span> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if start < end {
            Some(Span::new(start, end))
        } else {
            None
        }
    }
}

/// A 0-based, half-open interval on a named chromosome.
///
/// Regions are immutable: navigation always produces a new value. The
/// `start < end` invariant is checked on construction; the upper bound
/// against the chromosome length needs a [`Genome`] and is checked by
/// [`Genome::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RegionRepr", into = "RegionRepr")]
pub struct GenomicRegion {
    chromosome: String,
    start: GenomicPos,
    end: GenomicPos,
}

#[derive(Serialize, Deserialize)]
struct RegionRepr {
    chromosome: String,
    start: GenomicPos,
    end: GenomicPos,
}

impl TryFrom<RegionRepr> for GenomicRegion {
    type Error = RegionError;

    fn try_from(repr: RegionRepr) -> Result<Self, Self::Error> {
        GenomicRegion::new(repr.chromosome, repr.start, repr.end)
    }
}

impl From<GenomicRegion> for RegionRepr {
    fn from(region: GenomicRegion) -> Self {
        Self {
            chromosome: region.chromosome,
            start: region.start,
            end: region.end,
        }
    }
}

impl GenomicRegion {
    pub fn new(
        chromosome: impl Into<String>,
        start: GenomicPos,
        end: GenomicPos,
    ) -> Result<Self, RegionError> {
        let chromosome = chromosome.into();
        if chromosome.trim().is_empty() {
            return Err(RegionError::MissingChromosome);
        }
        if start >= end {
            return Err(RegionError::EmptyOrInverted { start, end });
        }
        Ok(Self {
            chromosome,
            start,
            end,
        })
    }

    pub fn chromosome(&self) -> &str {
        &self.chromosome
    }

    pub fn start(&self) -> GenomicPos {
        self.start
    }

    pub fn end(&self) -> GenomicPos {
        self.end
    }

    pub fn len(&self) -> GenomicPos {
        self.end - self.start
    }

    /// Always false; kept for clippy's `len_without_is_empty`.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }

    pub fn midpoint(&self) -> GenomicPos {
        self.start + self.len() / 2
    }

    /// True when `other` lies on the same chromosome and inside this region.
    pub fn covers(&self, other: &GenomicRegion) -> bool {
        self.chromosome == other.chromosome && self.start <= other.start && other.end <= self.end
    }

    /// Same chromosome, new bounds. Callers guarantee `start < end`.
    pub(crate) fn with_bounds(&self, start: GenomicPos, end: GenomicPos) -> GenomicRegion {
        debug_assert!(start < end, "with_bounds called with {start}..{end}");
        GenomicRegion {
            chromosome: self.chromosome.clone(),
            start,
            end: end.max(start + 1),
        }
    }

    pub(crate) fn renamed(&self, chromosome: &str) -> GenomicRegion {
        GenomicRegion {
            chromosome: chromosome.to_string(),
            start: self.start,
            end: self.end,
        }
    }

    /// Genome-browser locus notation with thousands separators and a
    /// 1-based start, e.g. `chr17:7,565,098-7,590,856`.
    pub fn locus(&self) -> String {
        format!(
            "{}:{}-{}",
            self.chromosome,
            group_thousands(self.start + 1),
            group_thousands(self.end)
        )
    }
}

impl fmt::Display for GenomicRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.chromosome, self.start + 1, self.end)
    }
}

/// Parses `chr:start-end` with a 1-based inclusive start; commas and
/// underscores in numbers are ignored.
impl FromStr for GenomicRegion {
    type Err = RegionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || RegionError::Malformed(s.to_string());
        let (chromosome, range) = s.trim().rsplit_once(':').ok_or_else(malformed)?;
        let (start, end) = range.split_once('-').ok_or_else(malformed)?;
        let start = parse_grouped(start).ok_or_else(malformed)?;
        let end = parse_grouped(end).ok_or_else(malformed)?;
        if start == 0 {
            return Err(malformed());
        }
        GenomicRegion::new(chromosome, start - 1, end)
    }
}

fn parse_grouped(s: &str) -> Option<u64> {
    let digits: String = s
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '_')
        .collect();
    digits.parse().ok()
}

pub fn group_thousands(value: u64) -> String {
    let raw = value.to_string();
    let mut out = String::with_capacity(raw.len() + raw.len() / 3);
    for (i, ch) in raw.chars().enumerate() {
        if i > 0 && (raw.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Lookup key shared by every chromosome-indexed map: case-folded, `chr`
/// prefix removed, `MT` folded into `M`.
pub fn chromosome_key(name: &str) -> String {
    let trimmed = name.trim();
    let stripped = match (trimmed.get(..3), trimmed.get(3..)) {
        (Some(prefix), Some(rest)) if !rest.is_empty() && prefix.eq_ignore_ascii_case("chr") => rest,
        _ => trimmed,
    };
    let upper = stripped.to_ascii_uppercase();
    if upper == "MT" {
        "M".to_string()
    } else {
        upper
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chromosome {
    pub name: String,
    pub length: GenomicPos,
}

/// Assembly name plus its chromosome table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Genome {
    name: String,
    chromosomes: Vec<Chromosome>,
    index: HashMap<String, usize>,
}

const HG19: &[(&str, u64)] = &[
    ("chr1", 249_250_621),
    ("chr2", 243_199_373),
    ("chr3", 198_022_430),
    ("chr4", 191_154_276),
    ("chr5", 180_915_260),
    ("chr6", 171_115_067),
    ("chr7", 159_138_663),
    ("chr8", 146_364_022),
    ("chr9", 141_213_431),
    ("chr10", 135_534_747),
    ("chr11", 135_006_516),
    ("chr12", 133_851_895),
    ("chr13", 115_169_878),
    ("chr14", 107_349_540),
    ("chr15", 102_531_392),
    ("chr16", 90_354_753),
    ("chr17", 81_195_210),
    ("chr18", 78_077_248),
    ("chr19", 59_128_983),
    ("chr20", 63_025_520),
    ("chr21", 48_129_895),
    ("chr22", 51_304_566),
    ("chrX", 155_270_560),
    ("chrY", 59_373_566),
    ("chrM", 16_571),
];

const HG38: &[(&str, u64)] = &[
    ("chr1", 248_956_422),
    ("chr2", 242_193_529),
    ("chr3", 198_295_559),
    ("chr4", 190_214_555),
    ("chr5", 181_538_259),
    ("chr6", 170_805_979),
    ("chr7", 159_345_973),
    ("chr8", 145_138_636),
    ("chr9", 138_394_717),
    ("chr10", 133_797_422),
    ("chr11", 135_086_622),
    ("chr12", 133_275_309),
    ("chr13", 114_364_328),
    ("chr14", 107_043_718),
    ("chr15", 101_991_189),
    ("chr16", 90_338_345),
    ("chr17", 83_257_441),
    ("chr18", 80_373_285),
    ("chr19", 58_617_616),
    ("chr20", 64_444_167),
    ("chr21", 46_709_983),
    ("chr22", 50_818_468),
    ("chrX", 156_040_895),
    ("chrY", 57_227_415),
    ("chrM", 16_569),
];

impl Genome {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            chromosomes: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn from_table(name: &str, table: &[(&str, u64)]) -> Self {
        let mut genome = Genome::new(name);
        for (chrom, length) in table {
            genome.add_chromosome(*chrom, *length);
        }
        genome
    }

    /// GRCh37/hg19 primary assembly.
    pub fn hg19() -> Self {
        Self::from_table("hg19", HG19)
    }

    /// GRCh38/hg38 primary assembly.
    pub fn hg38() -> Self {
        Self::from_table("hg38", HG38)
    }

    /// Built-in assembly by name or common alias.
    pub fn builtin(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "hg19" | "grch37" => Some(Self::hg19()),
            "hg38" | "grch38" => Some(Self::hg38()),
            _ => None,
        }
    }

    pub fn add_chromosome(&mut self, name: impl Into<String>, length: GenomicPos) -> usize {
        let name = name.into();
        let id = self.chromosomes.len();
        self.index.insert(chromosome_key(&name), id);
        self.chromosomes.push(Chromosome { name, length });
        id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn chromosomes(&self) -> &[Chromosome] {
        &self.chromosomes
    }

    /// Alias-tolerant lookup: `17`, `chr17` and `CHR17` resolve alike.
    pub fn chromosome(&self, name: &str) -> Option<&Chromosome> {
        self.index
            .get(&chromosome_key(name))
            .and_then(|&id| self.chromosomes.get(id))
    }

    pub fn chromosome_length(&self, name: &str) -> Option<GenomicPos> {
        self.chromosome(name).map(|c| c.length)
    }

    pub fn validate(&self, region: &GenomicRegion) -> Result<(), RegionError> {
        let chrom = self
            .chromosome(region.chromosome())
            .ok_or_else(|| RegionError::UnknownChromosome(region.chromosome().to_string()))?;
        if region.end() > chrom.length {
            return Err(RegionError::BeyondChromosome {
                chromosome: chrom.name.clone(),
                end: region.end(),
                length: chrom.length,
            });
        }
        Ok(())
    }

    /// Validates `region` and rewrites its chromosome to this assembly's
    /// spelling, so `17:...` and `chr17:...` compare equal afterwards.
    pub fn canonicalize(&self, region: &GenomicRegion) -> Result<GenomicRegion, RegionError> {
        self.validate(region)?;
        match self.chromosome(region.chromosome()) {
            Some(chrom) if chrom.name != region.chromosome() => Ok(region.renamed(&chrom.name)),
            _ => Ok(region.clone()),
        }
    }

    pub fn whole_chromosome(&self, name: &str) -> Result<GenomicRegion, RegionError> {
        let chrom = self
            .chromosome(name)
            .ok_or_else(|| RegionError::UnknownChromosome(name.to_string()))?;
        GenomicRegion::new(chrom.name.clone(), 0, chrom.length)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strand {
    #[serde(rename = "+")]
    Forward,
    #[serde(rename = "-")]
    Reverse,
}

impl From<bool> for Strand {
    fn from(forward: bool) -> Self {
        if forward {
            Strand::Forward
        } else {
            Strand::Reverse
        }
    }
}

impl From<char> for Strand {
    fn from(c: char) -> Self {
        match c {
            '-' => Strand::Reverse,
            _ => Strand::Forward,
        }
    }
}

impl From<Strand> for char {
    fn from(strand: Strand) -> Self {
        match strand {
            Strand::Forward => '+',
            Strand::Reverse => '-',
        }
    }
}

impl Strand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strand::Forward => "+",
            Strand::Reverse => "-",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_rejects_empty_and_inverted() {
        assert!(matches!(
            GenomicRegion::new("chr1", 10, 10),
            Err(RegionError::EmptyOrInverted { .. })
        ));
        assert!(matches!(
            GenomicRegion::new("", 0, 10),
            Err(RegionError::MissingChromosome)
        ));
    }

    #[test]
    fn test_locus_parsing_is_one_based() {
        let region: GenomicRegion = "chr17:7,565,098-7,590,856".parse().unwrap();
        assert_eq!(region.chromosome(), "chr17");
        assert_eq!(region.start(), 7_565_097);
        assert_eq!(region.end(), 7_590_856);
        assert_eq!(region.locus(), "chr17:7,565,098-7,590,856");
        assert_eq!(region.to_string(), "chr17:7565098-7590856");
    }

    #[test]
    fn test_locus_parsing_rejects_garbage() {
        assert!("chr17".parse::<GenomicRegion>().is_err());
        assert!("chr17:abc-10".parse::<GenomicRegion>().is_err());
        assert!("chr17:0-10".parse::<GenomicRegion>().is_err());
    }

    #[test]
    fn test_genome_alias_lookup() {
        let genome = Genome::hg19();
        assert_eq!(genome.chromosome_length("17"), Some(81_195_210));
        assert_eq!(genome.chromosome_length("chr17"), Some(81_195_210));
        assert_eq!(genome.chromosome_length("MT"), Some(16_571));
        assert!(genome.chromosome("chr99").is_none());
    }

    #[test]
    fn test_chromosome_key_handles_multibyte_names() {
        assert_eq!(chromosome_key("ché1"), "CHé1");
        assert_eq!(chromosome_key("é"), "é");
        assert_eq!(chromosome_key("chr"), "CHR");
        assert!(Genome::hg19().chromosome("ché1").is_none());
        let region = GenomicRegion::new("ché1", 0, 10).unwrap();
        assert!(matches!(
            Genome::hg19().canonicalize(&region),
            Err(RegionError::UnknownChromosome(_))
        ));
    }

    #[test]
    fn test_genome_validation() {
        let genome = Genome::hg19();
        let ok = GenomicRegion::new("17", 100, 200).unwrap();
        let canonical = genome.canonicalize(&ok).unwrap();
        assert_eq!(canonical.chromosome(), "chr17");

        let too_long = GenomicRegion::new("chr17", 0, 90_000_000).unwrap();
        assert!(matches!(
            genome.validate(&too_long),
            Err(RegionError::BeyondChromosome { .. })
        ));
        let unknown = GenomicRegion::new("chrZ", 0, 10).unwrap();
        assert!(matches!(
            genome.validate(&unknown),
            Err(RegionError::UnknownChromosome(_))
        ));
    }

    #[test]
    fn test_region_serde_validates() {
        let json = r#"{"chromosome":"chr1","start":50,"end":10}"#;
        assert!(serde_json::from_str::<GenomicRegion>(json).is_err());
        let json = r#"{"chromosome":"chr1","start":10,"end":50}"#;
        let region: GenomicRegion = serde_json::from_str(json).unwrap();
        assert_eq!(region.len(), 40);
    }

    #[test]
    fn test_span_intersection() {
        let a = Span::new(10, 20);
        assert_eq!(a.intersect(&Span::new(15, 30)), Some(Span::new(15, 20)));
        assert_eq!(a.intersect(&Span::new(20, 30)), None);
        assert!(Span::point(5).contains(5));
    }

    #[test]
    fn test_strand_conversions() {
        assert_eq!(Strand::from('-'), Strand::Reverse);
        assert_eq!(char::from(Strand::Forward), '+');
        assert_eq!(Strand::from(true), Strand::Forward);
    }
}
