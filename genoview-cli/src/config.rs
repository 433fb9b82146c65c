//! Configuration handling for the genoview CLI
//!
//! Loads `genoview.toml`: the `[view]` section is an embed configuration,
//! the `[export]` section controls the SVG output.

use anyhow::{Context, Result};
use genoview_core::config::{EmbedConfig, RegionSpec, TrackConfig};
use genoview_core::features::TrackKind;
use genoview_core::track::TrackOptions;
use genoview_render::ExportConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default = "default_view")]
    pub view: EmbedConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Seconds to wait for every track to load before giving up
    #[serde(default = "default_load_timeout")]
    pub load_timeout_secs: u64,

    /// Worker threads for the fetch runtime (0 = one per core)
    #[serde(default)]
    pub threads: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            load_timeout_secs: default_load_timeout(),
            threads: 0,
        }
    }
}

// Default value functions
fn default_load_timeout() -> u64 { 30 }
fn default_locus() -> String { "chr17:7,565,098-7,590,856".to_string() }

fn default_track(id: &str, source: &str, kind: TrackKind, height: f64) -> TrackConfig {
    TrackConfig {
        id: id.to_string(),
        source: source.to_string(),
        order: None,
        height,
        visible: true,
        options: TrackOptions::default_for(kind),
    }
}

/// Track list matching the sources of `demos/tp53.json`.
fn default_view() -> EmbedConfig {
    EmbedConfig::new("hg19", RegionSpec::Locus(default_locus()))
        .with_track(default_track("genes", "refseq", TrackKind::Gene, 80.0))
        .with_track(default_track("mutations", "somatic", TrackKind::Mutation, 80.0))
        .with_track(default_track("coverage", "rnaseq-coverage", TrackKind::Signal, 50.0))
        .with_track(default_track("reads", "reads", TrackKind::Alignment, 120.0))
        .with_track(default_track("junctions", "junctions", TrackKind::Junction, 60.0))
        .with_track(default_track("copy-number", "copy-number", TrackKind::Matrix, 60.0))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            view: default_view(),
            export: ExportConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => {
                log::info!("Loading configuration from: {}", path.display());
                Self::load_from_file(path)?
            }
            None => {
                let default_path = PathBuf::from("genoview.toml");
                if default_path.exists() {
                    log::info!("Loading configuration from: genoview.toml");
                    Self::load_from_file(&default_path)?
                } else {
                    log::info!("Using default configuration");
                    Self::default()
                }
            }
        };

        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse configuration file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = self.to_toml()?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write configuration file: {}", path.display()))?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    /// Generate example configuration file content
    pub fn example_toml() -> Result<String> {
        Self::default().to_toml()
    }
}
