mod common;

use common::*;
use genoview_core::bus::EventBus;
use genoview_core::cohort::SelectionMode;
use genoview_core::config::{EmbedConfig, RegionSpec};
use genoview_core::url_state::UrlState;
use genoview_core::events::{self, Event, SelectionSnapshot};
use genoview_core::features::TrackKind;
use genoview_core::filter::{FilterPredicate, FilterSet};
use genoview_core::surface::DisplayList;
use genoview_core::track::TrackStatus;
use genoview_core::views::SampleTable;
use genoview_core::{Coordinator, FeatureId, ViewerError};
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::Arc;

async fn session() -> Coordinator {
    init_logging();
    let mut coordinator = Coordinator::new(tp53_config(), &registry()).expect("coordinator");
    coordinator.settle().await;
    coordinator
}

fn annotation_config(mutation_source: &str) -> EmbedConfig {
    EmbedConfig::new("hg19", RegionSpec::Locus(TP53_LOCUS.into()))
        .with_track(track("genes", "refseq", TrackKind::Gene, 80.0))
        .with_track(track("mutations", mutation_source, TrackKind::Mutation, 80.0))
}

fn count_visible_events(coordinator: &Coordinator) -> Arc<Mutex<usize>> {
    let count = Arc::new(Mutex::new(0));
    let sink = Arc::clone(&count);
    coordinator
        .bus()
        .subscribe(events::VISIBLE_FEATURES_CHANGED, "counter", move |_| {
            *sink.lock() += 1;
            Ok(())
        });
    count
}

fn statuses(coordinator: &Coordinator) -> Vec<(String, TrackStatus)> {
    coordinator.with_viewport(|vp| {
        vp.tracks()
            .iter()
            .map(|t| (t.id().to_string(), t.status().clone()))
            .collect()
    })
}

#[tokio::test]
async fn initial_region_loads_every_track() {
    let coordinator = session().await;
    for (id, status) in statuses(&coordinator) {
        assert_eq!(status, TrackStatus::Ready, "track {id}");
    }
    let visible = coordinator.visible_features();
    assert!(visible.features.contains(&FeatureId::from("MUT-R248Q-S002")));
    assert!(visible.features.contains(&FeatureId::from("ENSG00000141510")));
    assert!(visible.samples.contains("S003"));
    assert_eq!(coordinator.region().locus(), TP53_LOCUS);
}

#[tokio::test]
async fn selection_reaches_viewport_and_callback_synchronously() {
    init_logging();
    let seen: Arc<Mutex<Vec<SelectionSnapshot>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let config = tp53_config().with_selection_listener(move |selection| sink.lock().push(selection.clone()));
    let mut coordinator = Coordinator::new(config, &registry()).unwrap();
    coordinator.settle().await;
    let baseline = seen.lock().len();

    coordinator.cohort().select_samples(["S001", "S004"], SelectionMode::Replace);

    let in_viewport = coordinator.with_viewport(|vp| vp.selection().samples.clone());
    assert_eq!(in_viewport.len(), 2);
    let calls = seen.lock();
    assert_eq!(calls.len(), baseline + 1);
    assert!(calls[calls.len() - 1].samples.contains("S004"));
}

#[tokio::test]
async fn prune_after_refetch_drops_unknown_samples() {
    let mut coordinator = session().await;
    coordinator.cohort().select_samples(["S001", "S999"], SelectionMode::Replace);
    coordinator.refresh();
    coordinator.settle().await;
    let selected: Vec<String> = coordinator.cohort().selection().samples.into_iter().collect();
    assert_eq!(selected, vec!["S001"]);
}

#[tokio::test]
async fn registered_samples_survive_prune() {
    let mut coordinator = session().await;
    coordinator.register_samples(["S999"]);
    coordinator.cohort().select_samples(["S999"], SelectionMode::Replace);
    coordinator.refresh();
    coordinator.settle().await;
    assert!(coordinator.cohort().selection().samples.contains("S999"));
}

#[tokio::test]
async fn same_url_state_renders_identical_views() {
    let query = "?chr=17&start=7576000&end=7580000&samples=S002&filter.consequence=in:missense%7Cnonsense";

    let mut renders = Vec::new();
    let mut states = Vec::new();
    for _ in 0..2 {
        let mut coordinator = session().await;
        coordinator.apply_query(query).unwrap();
        coordinator.settle().await;
        let mut list = DisplayList::new();
        coordinator.render(&mut list);
        renders.push(list);
        states.push(coordinator.url_state().to_query_string());
    }
    assert!(!renders[0].items.is_empty());
    assert_eq!(renders[0], renders[1]);
    assert_eq!(states[0], states[1]);
    assert!(states[0].contains("start=7576000"));
}

#[tokio::test]
async fn filter_composition_is_intersection() {
    let coordinator = session().await;
    let cohort = coordinator.cohort();

    let consequence = FilterPredicate::OneOf(vec!["missense".into(), "nonsense".into()]);
    let sample = FilterPredicate::Equals("S002".into());

    cohort.set_filter("consequence", consequence.clone());
    let only_a = coordinator.visible_features().features;

    cohort.replace_filters(FilterSet::from_iter([("sample".to_string(), sample.clone())]));
    let only_b = coordinator.visible_features().features;

    cohort.set_filter("consequence", consequence);
    let both = coordinator.visible_features().features;

    let expected: BTreeSet<FeatureId> = only_a.intersection(&only_b).cloned().collect();
    assert_eq!(both, expected);
    assert!(both.contains(&FeatureId::from("MUT-R248Q-S002")));
    assert!(both.contains(&FeatureId::from("MUT-R213X-S002")));
    assert!(!both.contains(&FeatureId::from("MUT-R175H-S001")));
    // genes carry neither attribute
    assert!(both.contains(&FeatureId::from("ENSG00000141510")));
}

#[tokio::test]
async fn filters_publish_visible_features() {
    let coordinator = session().await;
    let last: Arc<Mutex<Option<BTreeSet<FeatureId>>>> = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&last);
    let handle = coordinator
        .bus()
        .subscribe(events::VISIBLE_FEATURES_CHANGED, "test", move |event| {
            if let Event::VisibleFeaturesChanged { features, .. } = event {
                *sink.lock() = Some(features.clone());
            }
            Ok(())
        });

    coordinator
        .cohort()
        .set_filter("mapq", FilterPredicate::range(Some(30.0), None));
    let published = last.lock().clone().expect("visible features published");
    assert_eq!(published, coordinator.visible_features().features);
    assert!(!published.contains(&FeatureId::from("read004")));
    assert!(published.contains(&FeatureId::from("read003")));
    coordinator.bus().unsubscribe(&handle);
}

#[tokio::test]
async fn failing_track_is_isolated() {
    init_logging();
    let config = tp53_config().with_track(track("broken", "offline", TrackKind::Signal, 40.0));
    let mut coordinator = Coordinator::new(config, &registry()).unwrap();
    coordinator.settle().await;

    for (id, status) in statuses(&coordinator) {
        if id == "broken" {
            assert!(matches!(status, TrackStatus::Failed { .. }));
        } else {
            assert_eq!(status, TrackStatus::Ready, "track {id}");
        }
    }
    let mut list = DisplayList::new();
    coordinator.render(&mut list);
    assert!(list
        .texts()
        .any(|t| t == "Failed to load: source unavailable: 503 from upstream"));
    assert!(list.texts().any(|t| t == "TP53"));
}

#[tokio::test]
async fn rapid_navigation_keeps_last_viewport() {
    let mut coordinator = session().await;
    coordinator.zoom(0.5, 400.0).unwrap();
    coordinator.pan(120.0).unwrap();
    let target = coordinator.zoom(0.25, 100.0).unwrap();
    coordinator.settle().await;

    assert_eq!(coordinator.region(), target);
    coordinator.with_viewport(|vp| {
        let reads = vp.track("reads").unwrap();
        assert_eq!(reads.status(), &TrackStatus::Ready);
        assert_eq!(reads.data().unwrap().region, target);
    });
}

#[tokio::test]
async fn invalid_navigation_leaves_state() {
    let coordinator = session().await;
    let before = coordinator.region();
    assert!(coordinator.go_to_locus("chr17:80,000,000-90,000,000").is_err());
    assert!(coordinator.go_to_locus("nonsense").is_err());
    assert_eq!(coordinator.region(), before);
    assert_eq!(coordinator.cohort().active_region(), Some(before));
}

#[tokio::test]
async fn click_toggles_feature_selection() {
    let coordinator = session().await;
    let tp53 = FeatureId::from("ENSG00000141510");
    let y = coordinator
        .with_viewport(|vp| {
            (0..80).map(f64::from).find(|&y| {
                vp.hit_test(400.0, y).map(|h| h.feature) == Some(tp53.clone())
            })
        })
        .expect("TP53 lane under x=400");

    coordinator.click(400.0, y);
    assert!(coordinator.cohort().selection().features.contains(&tp53));
    coordinator.click(400.0, y);
    assert!(!coordinator.cohort().selection().features.contains(&tp53));
}

#[tokio::test]
async fn sibling_view_and_teardown_share_one_bus() {
    init_logging();
    let bus = Arc::new(EventBus::new());
    let mut coordinator = Coordinator::with_bus(tp53_config(), &registry(), Arc::clone(&bus)).unwrap();
    let mut table = SampleTable::mount(Arc::clone(coordinator.cohort()), ["S001", "S002", "S003", "S004"]);
    coordinator.settle().await;

    let in_view: Vec<String> = table.rows().into_iter().filter(|r| r.in_view).map(|r| r.id).collect();
    assert_eq!(in_view.len(), 4);

    table.click_row("S003", false);
    assert_eq!(
        coordinator.with_viewport(|vp| vp.selection().samples.clone()),
        BTreeSet::from(["S003".to_string()])
    );

    coordinator.teardown();
    assert_eq!(bus.subscriber_count(events::REGION_CHANGED), 0);
    assert_eq!(bus.subscriber_count(events::SELECTION_CHANGED), 1);
    table.teardown();
    assert_eq!(bus.total_subscribers(), 0);
}

#[tokio::test]
async fn add_on_selected_sample_keeps_it_for_every_subscriber() {
    let coordinator = session().await;
    let last: Arc<Mutex<Option<SelectionSnapshot>>> = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&last);
    coordinator
        .bus()
        .subscribe(events::SELECTION_CHANGED, "test", move |event| {
            if let Event::SelectionChanged { selection, .. } = event {
                *sink.lock() = Some(selection.clone());
            }
            Ok(())
        });

    coordinator.cohort().select_samples(["S001"], SelectionMode::Replace);
    coordinator.cohort().toggle_sample_selection("S001", SelectionMode::Add);

    let seen = last.lock().clone().expect("selection published");
    assert!(seen.samples.contains("S001"));
    assert!(coordinator.with_viewport(|vp| vp.selection().samples.contains("S001")));
}

#[tokio::test]
async fn cached_navigation_prunes_and_publishes_visible_features() {
    init_logging();
    let mut coordinator = Coordinator::new(annotation_config("somatic"), &registry()).unwrap();
    coordinator.settle().await;
    let frameshift = FeatureId::from("MUT-FS-S003");
    coordinator
        .cohort()
        .toggle_feature_selection(&frameshift, SelectionMode::Add);
    let events_seen = count_visible_events(&coordinator);

    coordinator.go_to_locus("chr17:7,577,001-7,579,000").unwrap();
    assert!(coordinator.with_viewport(|vp| vp.is_settled()), "served from cache");
    coordinator.settle().await;

    assert_eq!(*events_seen.lock(), 1);
    assert!(!coordinator.cohort().selection().features.contains(&frameshift));
    let visible = coordinator.visible_features();
    assert!(visible.features.contains(&FeatureId::from("MUT-R248Q-S002")));
    assert!(!visible.features.contains(&frameshift));
}

#[tokio::test]
async fn failed_fetch_keeps_selection_in_store() {
    init_logging();
    let mut coordinator = Coordinator::new(annotation_config("offline"), &registry()).unwrap();
    coordinator.settle().await;
    let mutation = FeatureId::from("MUT-R248Q-S002");
    coordinator
        .cohort()
        .toggle_feature_selection(&mutation, SelectionMode::Add);
    coordinator.cohort().toggle_sample_selection("S002", SelectionMode::Add);
    let events_seen = count_visible_events(&coordinator);

    coordinator.refresh();
    coordinator.settle().await;

    let selection = coordinator.cohort().selection();
    assert!(selection.features.contains(&mutation));
    assert!(selection.samples.contains("S002"));
    assert_eq!(*events_seen.lock(), 1);
    coordinator.with_viewport(|vp| assert!(vp.has_failed_track()));
}

#[tokio::test]
async fn non_ascii_chromosome_is_rejected_not_panicking() {
    let coordinator = session().await;
    let before = coordinator.region();
    let state = UrlState::parse("chr=ch%C3%A91&start=0&end=10").unwrap();
    let region = state.region.clone().expect("region parsed");

    assert!(matches!(coordinator.go_to(region), Err(ViewerError::InvalidRegion(_))));
    assert!(matches!(
        coordinator.apply_url_state(&state),
        Err(ViewerError::InvalidRegion(_))
    ));
    assert_eq!(coordinator.region(), before);
}
