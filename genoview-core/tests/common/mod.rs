#![allow(dead_code)]

use genoview_core::config::{EmbedConfig, RegionSpec, TrackConfig};
use genoview_core::features::TrackKind;
use genoview_core::provider::{FailingProvider, ProviderRegistry};
use genoview_core::track::TrackOptions;
use std::sync::Arc;

pub const FIXTURE: &str = include_str!("../../../demos/tp53.json");
pub const TP53_LOCUS: &str = "chr17:7,565,098-7,590,856";

pub fn registry() -> ProviderRegistry {
    let mut registry = ProviderRegistry::from_fixture_json(FIXTURE).expect("fixture parses");
    registry.register(
        "offline",
        Arc::new(FailingProvider {
            message: "503 from upstream".into(),
        }),
    );
    registry
}

pub fn track(id: &str, source: &str, kind: TrackKind, height: f64) -> TrackConfig {
    TrackConfig {
        id: id.into(),
        source: source.into(),
        order: None,
        height,
        visible: true,
        options: TrackOptions::default_for(kind),
    }
}

pub fn tp53_config() -> EmbedConfig {
    EmbedConfig::new("hg19", RegionSpec::Locus(TP53_LOCUS.into()))
        .with_track(track("genes", "refseq", TrackKind::Gene, 80.0))
        .with_track(track("mutations", "somatic", TrackKind::Mutation, 80.0))
        .with_track(track("coverage", "rnaseq-coverage", TrackKind::Signal, 50.0))
        .with_track(track("reads", "reads", TrackKind::Alignment, 100.0))
        .with_track(track("junctions", "junctions", TrackKind::Junction, 60.0))
        .with_track(track("copy-number", "copy-number", TrackKind::Matrix, 60.0))
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
