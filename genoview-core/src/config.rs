//! Embed configuration: genome, initial region, tracks and the optional
//! selection callback. Accepts JSON or TOML; unknown keys are ignored.

use crate::events::SelectionSnapshot;
use crate::track::TrackOptions;
use crate::types::{Chromosome, Genome, GenomicRegion};
use crate::error::{ViewerError, ViewerResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Host callback invoked with the full selection after every change.
pub type SelectionListener = Arc<dyn Fn(&SelectionSnapshot) + Send + Sync>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to read {path}: {error}")]
    Io { path: String, error: std::io::Error },
}

fn default_genome() -> String {
    "hg19".to_string()
}

fn default_pixel_width() -> u32 {
    800
}

fn default_track_height() -> f64 {
    60.0
}

fn default_visible() -> bool {
    true
}

/// Assembly declared inline instead of a built-in table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomGenome {
    pub name: String,
    pub chromosomes: Vec<Chromosome>,
}

impl CustomGenome {
    pub fn to_genome(&self) -> Genome {
        let mut genome = Genome::new(self.name.clone());
        for chrom in &self.chromosomes {
            genome.add_chromosome(chrom.name.clone(), chrom.length);
        }
        genome
    }
}

/// Either a locus string (`chr17:7,565,098-7,590,856`, or a bare
/// chromosome name for the whole chromosome) or explicit 0-based fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RegionSpec {
    Locus(String),
    Explicit(GenomicRegion),
}

impl RegionSpec {
    pub fn resolve(&self, genome: &Genome) -> ViewerResult<GenomicRegion> {
        let region = match self {
            RegionSpec::Locus(locus) if !locus.contains(':') => genome.whole_chromosome(locus.trim())?,
            RegionSpec::Locus(locus) => locus.parse::<GenomicRegion>()?,
            RegionSpec::Explicit(region) => region.clone(),
        };
        Ok(genome.canonicalize(&region)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackConfig {
    pub id: String,
    /// Name under which the provider is registered.
    pub source: String,
    /// Stacking index; defaults to the position in the track list.
    #[serde(default)]
    pub order: Option<i32>,
    #[serde(default = "default_track_height")]
    pub height: f64,
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// `kind` plus the kind's options.
    #[serde(flatten)]
    pub options: TrackOptions,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct EmbedConfig {
    #[serde(default = "default_genome")]
    pub genome: String,
    #[serde(default)]
    pub custom_genome: Option<CustomGenome>,
    pub initial_region: RegionSpec,
    #[serde(default = "default_pixel_width")]
    pub pixel_width: u32,
    #[serde(default)]
    pub tracks: Vec<TrackConfig>,
    #[serde(skip)]
    pub on_selection_change: Option<SelectionListener>,
}

impl fmt::Debug for EmbedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbedConfig")
            .field("genome", &self.genome)
            .field("custom_genome", &self.custom_genome.as_ref().map(|g| &g.name))
            .field("initial_region", &self.initial_region)
            .field("pixel_width", &self.pixel_width)
            .field("tracks", &self.tracks)
            .field("on_selection_change", &self.on_selection_change.is_some())
            .finish()
    }
}

impl EmbedConfig {
    pub fn new(genome: impl Into<String>, initial_region: RegionSpec) -> Self {
        Self {
            genome: genome.into(),
            custom_genome: None,
            initial_region,
            pixel_width: default_pixel_width(),
            tracks: Vec::new(),
            on_selection_change: None,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Loads by extension: `.json` as JSON, anything else as TOML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
            path: path.display().to_string(),
            error,
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&text),
            _ => Self::from_toml(&text),
        }
    }

    pub fn with_track(mut self, track: TrackConfig) -> Self {
        self.tracks.push(track);
        self
    }

    pub fn with_selection_listener<F>(mut self, listener: F) -> Self
    where
        F: Fn(&SelectionSnapshot) + Send + Sync + 'static,
    {
        self.on_selection_change = Some(Arc::new(listener));
        self
    }

    /// Custom genome wins when its name matches `genome` or `genome` is
    /// not a built-in assembly.
    pub fn resolve_genome(&self) -> ViewerResult<Genome> {
        if let Some(custom) = &self.custom_genome {
            if custom.name == self.genome || Genome::builtin(&self.genome).is_none() {
                return Ok(custom.to_genome());
            }
        }
        Genome::builtin(&self.genome).ok_or_else(|| ViewerError::UnknownGenome(self.genome.clone()))
    }

    pub fn resolve_region(&self, genome: &Genome) -> ViewerResult<GenomicRegion> {
        self.initial_region.resolve(genome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::TrackKind;
    use std::io::Write;

    const TOML: &str = r#"
genome = "hg19"
initial_region = "chr17:7,565,098-7,590,856"
pixel_width = 1000
theme_color = "ignored"

[[tracks]]
id = "genes"
kind = "gene"
source = "refseq"
lane_height = 18

[[tracks]]
id = "reads"
kind = "alignment"
source = "bam"
order = 5
height = 200
summary_bpp = 500
"#;

    #[test]
    fn test_toml_config_with_unknown_keys() {
        let config = EmbedConfig::from_toml(TOML).unwrap();
        assert_eq!(config.pixel_width, 1000);
        assert_eq!(config.tracks.len(), 2);
        assert_eq!(config.tracks[0].options.kind(), TrackKind::Gene);
        assert_eq!(config.tracks[0].height, 60.0);
        assert!(config.tracks[0].visible);
        match &config.tracks[1].options {
            TrackOptions::Alignment(a) => assert_eq!(a.summary_bpp, 500.0),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(config.tracks[1].order, Some(5));

        let genome = config.resolve_genome().unwrap();
        let region = config.resolve_region(&genome).unwrap();
        assert_eq!((region.start(), region.end()), (7_565_097, 7_590_856));
    }

    #[test]
    fn test_json_explicit_region_and_defaults() {
        let config = EmbedConfig::from_json(
            r#"{"initial_region":{"chromosome":"17","start":100,"end":200},"extra":[1,2]}"#,
        )
        .unwrap();
        assert_eq!(config.genome, "hg19");
        assert_eq!(config.pixel_width, 800);
        let genome = config.resolve_genome().unwrap();
        assert_eq!(config.resolve_region(&genome).unwrap().chromosome(), "chr17");
    }

    #[test]
    fn test_bare_chromosome_is_whole_chromosome() {
        let genome = Genome::hg38();
        let region = RegionSpec::Locus("chrM".into()).resolve(&genome).unwrap();
        assert_eq!((region.start(), region.end()), (0, 16_569));
    }

    #[test]
    fn test_custom_genome() {
        let config = EmbedConfig::from_json(
            r#"{"genome":"toy","custom_genome":{"name":"toy","chromosomes":[{"name":"ctg1","length":5000}]},
                "initial_region":"ctg1:1-1000"}"#,
        )
        .unwrap();
        let genome = config.resolve_genome().unwrap();
        assert_eq!(genome.name(), "toy");
        assert_eq!(config.resolve_region(&genome).unwrap().end(), 1000);
    }

    #[test]
    fn test_unknown_genome() {
        let config = EmbedConfig::new("mm10", RegionSpec::Locus("chr1".into()));
        assert!(matches!(config.resolve_genome(), Err(ViewerError::UnknownGenome(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(TOML.as_bytes()).unwrap();
        let config = EmbedConfig::load(file.path()).unwrap();
        assert_eq!(config.tracks[1].id, "reads");
    }
}
