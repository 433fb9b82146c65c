use genoview_core::config::{EmbedConfig, RegionSpec, TrackConfig};
use genoview_core::features::TrackKind;
use genoview_core::provider::ProviderRegistry;
use genoview_core::track::TrackOptions;
use genoview_core::Coordinator;
use genoview_render::{ExportConfig, ViewExporter};

const FIXTURE: &str = include_str!("../../demos/tp53.json");

fn track(id: &str, source: &str, kind: TrackKind) -> TrackConfig {
    TrackConfig {
        id: id.into(),
        source: source.into(),
        order: None,
        height: 70.0,
        visible: true,
        options: TrackOptions::default_for(kind),
    }
}

async fn session(locus: &str) -> Coordinator {
    let _ = env_logger::builder().is_test(true).try_init();
    let registry = ProviderRegistry::from_fixture_json(FIXTURE).unwrap();
    let config = EmbedConfig::new("hg19", RegionSpec::Locus(locus.into()))
        .with_track(track("genes", "refseq", TrackKind::Gene))
        .with_track(track("mutations", "somatic", TrackKind::Mutation))
        .with_track(track("reads", "reads", TrackKind::Alignment))
        .with_track(track("junctions", "junctions", TrackKind::Junction));
    let mut coordinator = Coordinator::new(config, &registry).unwrap();
    coordinator.settle().await;
    coordinator
}

fn exporter() -> ViewExporter {
    ViewExporter::new(ExportConfig {
        show_footer: false, // disable dynamic timestamp
        title: Some("Determinism Test".into()),
        provenance_comment: Some("fixture: tp53.json".into()),
        ..Default::default()
    })
}

#[tokio::test]
async fn svg_export_is_deterministic() {
    let exporter = exporter();
    let dir = tempfile::tempdir().unwrap();
    let f1 = dir.path().join("a.svg");
    let f2 = dir.path().join("b.svg");

    let first = session("chr17:7,576,001-7,580,000").await;
    first.with_viewport(|vp| exporter.export_svg(&f1, vp)).unwrap();
    let second = session("chr17:7,576,001-7,580,000").await;
    second.with_viewport(|vp| exporter.export_svg(&f2, vp)).unwrap();

    let b1 = std::fs::read(&f1).unwrap();
    let b2 = std::fs::read(&f2).unwrap();
    assert_eq!(b1, b2, "SVG bytes differ between identical renders");
}

#[tokio::test]
async fn svg_contains_tracks_ruler_and_title() {
    let coordinator = session("chr17:7,565,098-7,590,856").await;
    let svg = coordinator.with_viewport(|vp| exporter().export_string(vp));

    assert!(svg.contains("<svg"));
    assert!(svg.contains("Determinism Test"));
    assert!(svg.contains("fixture: tp53.json"));
    assert!(svg.contains(r#"id="tracks""#));
    for id in ["genes", "mutations", "reads", "junctions"] {
        assert!(svg.contains(&format!(r#"id="{id}""#)), "missing group {id}");
    }
    assert!(svg.contains("TP53"));
    assert!(svg.contains("7,570,000"));
    assert!(!svg.contains("Generated:"));
}

#[tokio::test]
async fn footer_records_locus() {
    let coordinator = session("chr17:7,576,001-7,580,000").await;
    let exporter = ViewExporter::new(ExportConfig::default());
    let svg = coordinator.with_viewport(|vp| exporter.export_string(vp));
    assert!(svg.contains("chr17:7,576,001-7,580,000"));
    assert!(svg.contains("Generated:"));
}
