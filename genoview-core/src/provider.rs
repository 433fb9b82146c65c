//! Data provider contract and the in-memory implementation used by the CLI
//! and tests.

use crate::features::{FeatureSet, TrackKind};
use crate::lod::Resolution;
use crate::spatial::IntervalIndex;
use crate::types::*;
use futures::future::{self, BoxFuture};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Per-track, strictly increasing request identifier.
pub type RequestId = u64;

/// Cooperative cancellation flag shared between a track and its in-flight
/// request. Providers may poll it; the fetch worker always checks it once
/// the provider future resolves.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub region: GenomicRegion,
    pub resolution: Resolution,
    pub request_id: RequestId,
    pub cancel: CancelToken,
}

#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// Must echo the id of the request it answers.
    pub request_id: RequestId,
    pub features: FeatureSet,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProviderError {
    #[error("request {0} was cancelled")]
    Cancelled(RequestId),

    #[error("source unavailable: {0}")]
    Unavailable(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("expected {expected} features, provider returned {actual}")]
    KindMismatch { expected: TrackKind, actual: TrackKind },

    #[error("response for request {got} does not match request {expected}")]
    EchoMismatch { expected: RequestId, got: RequestId },
}

/// Supplies typed features for a region.
///
/// Implementations must be cheap to call repeatedly and must return a
/// `'static` future so the engine can run it on a background worker.
pub trait DataProvider: Send + Sync {
    fn fetch(&self, request: FetchRequest) -> BoxFuture<'static, Result<FetchResponse, ProviderError>>;

    /// Short label for logs.
    fn describe(&self) -> String {
        "provider".to_string()
    }
}

/// Features of one chromosome with an index over their spans.
#[derive(Debug, Clone)]
struct IndexedSet {
    features: FeatureSet,
    index: IntervalIndex,
}

/// Region-indexed in-memory arrays keyed by chromosome.
#[derive(Debug, Clone)]
pub struct InMemoryProvider {
    name: String,
    kind: TrackKind,
    by_chromosome: HashMap<String, IndexedSet>,
}

impl InMemoryProvider {
    pub fn new(name: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            name: name.into(),
            kind,
            by_chromosome: HashMap::new(),
        }
    }

    /// Registers the features of one chromosome. Sets of a different kind
    /// than the provider's are rejected.
    pub fn insert(&mut self, chromosome: &str, features: FeatureSet) -> Result<(), ProviderError> {
        if features.kind() != self.kind {
            return Err(ProviderError::KindMismatch {
                expected: self.kind,
                actual: features.kind(),
            });
        }
        let index = IntervalIndex::build(features.spans());
        self.by_chromosome
            .insert(chromosome_key(chromosome), IndexedSet { features, index });
        Ok(())
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    fn features_for(&self, request: &FetchRequest) -> FeatureSet {
        let Some(stored) = self.by_chromosome.get(&chromosome_key(request.region.chromosome())) else {
            return FeatureSet::empty(self.kind);
        };
        let span = request.region.span();
        let mut hits = stored.index.query(span);
        hits.sort_unstable();
        let mut features = stored.features.subset(&hits);
        // The index widens zero-length spans to one base.
        features.retain_overlapping(&span);
        if let FeatureSet::Signal(data) = &features {
            let rebinned = data.rebin(request.resolution.bin_size());
            features = FeatureSet::Signal(rebinned);
        }
        features
    }
}

impl DataProvider for InMemoryProvider {
    fn fetch(
        &self,
        request: FetchRequest,
    ) -> BoxFuture<'static, Result<FetchResponse, ProviderError>> {
        if request.cancel.is_cancelled() {
            return Box::pin(future::ready(Err(ProviderError::Cancelled(request.request_id))));
        }
        let response = FetchResponse {
            request_id: request.request_id,
            features: self.features_for(&request),
        };
        Box::pin(future::ready(Ok(response)))
    }

    fn describe(&self) -> String {
        format!("in-memory '{}' ({})", self.name, self.kind)
    }
}

/// Provider that always fails; stands in for an unreachable backend.
#[derive(Debug, Clone)]
pub struct FailingProvider {
    pub message: String,
}

impl DataProvider for FailingProvider {
    fn fetch(
        &self,
        _request: FetchRequest,
    ) -> BoxFuture<'static, Result<FetchResponse, ProviderError>> {
        Box::pin(future::ready(Err(ProviderError::Unavailable(self.message.clone()))))
    }

    fn describe(&self) -> String {
        "failing provider".to_string()
    }
}

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("invalid fixture json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("source '{source_name}': {error}")]
    Source {
        source_name: String,
        error: ProviderError,
    },
    #[error("source '{0}' mixes feature kinds across chromosomes")]
    MixedKinds(String),
}

#[derive(Deserialize)]
struct Fixture {
    sources: HashMap<String, HashMap<String, FeatureSet>>,
}

/// Source name to provider lookup used when building tracks from config.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn DataProvider>>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.providers.keys().collect();
        names.sort();
        f.debug_struct("ProviderRegistry").field("sources", &names).finish()
    }
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, source: impl Into<String>, provider: Arc<dyn DataProvider>) {
        self.providers.insert(source.into(), provider);
    }

    pub fn get(&self, source: &str) -> Option<Arc<dyn DataProvider>> {
        self.providers.get(source).cloned()
    }

    pub fn sources(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Parses `{"sources": {"<name>": {"<chrom>": {"kind": ..., "features": ...}}}}`
    /// into one [`InMemoryProvider`] per source.
    pub fn from_fixture_json(json: &str) -> Result<Self, FixtureError> {
        let fixture: Fixture = serde_json::from_str(json)?;
        let mut registry = Self::new();
        for (source_name, chromosomes) in fixture.sources {
            let Some(kind) = chromosomes.values().next().map(FeatureSet::kind) else {
                log::warn!("fixture source '{}' has no chromosomes", source_name);
                continue;
            };
            let mut provider = InMemoryProvider::new(source_name.clone(), kind);
            for (chrom, set) in chromosomes {
                if set.kind() != kind {
                    return Err(FixtureError::MixedKinds(source_name));
                }
                provider
                    .insert(&chrom, set)
                    .map_err(|error| FixtureError::Source {
                        source_name: source_name.clone(),
                        error,
                    })?;
            }
            log::debug!("registered fixture source {}", provider.describe());
            registry.register(source_name, Arc::new(provider));
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{SignalBin, SignalData};
    use std::collections::BTreeSet;

    fn request(chrom: &str, start: u64, end: u64, bpp: f64) -> FetchRequest {
        FetchRequest {
            region: GenomicRegion::new(chrom, start, end).unwrap(),
            resolution: Resolution::new(bpp),
            request_id: 7,
            cancel: CancelToken::new(),
        }
    }

    #[test]
    fn test_in_memory_filters_and_echoes() {
        let json = r#"{"sources":{"muts":{"chr17":{"kind":"mutation","features":[
            {"id":"a","position":100,"consequence":"missense","sample_id":"S1","gene":"TP53"},
            {"id":"b","position":900,"consequence":"silent","sample_id":"S2","gene":"TP53"}
        ]}}}}"#;
        let registry = ProviderRegistry::from_fixture_json(json).unwrap();
        let provider = registry.get("muts").unwrap();
        let response = futures::executor::block_on(provider.fetch(request("17", 0, 500, 1.0))).unwrap();
        assert_eq!(response.request_id, 7);
        assert_eq!(response.features.len(), 1);
    }

    #[test]
    fn test_in_memory_returns_only_overlapping_in_storage_order() {
        let mut provider = InMemoryProvider::new("genes", TrackKind::Gene);
        let json = r#"[
            {"id":"far","name":"FAR","span":{"start":50000,"end":51000},"strand":"+","exons":[]},
            {"id":"long","name":"LONG","span":{"start":0,"end":40000},"strand":"+","exons":[]},
            {"id":"near","name":"NEAR","span":{"start":1200,"end":1300},"strand":"-","exons":[]}
        ]"#;
        let genes = serde_json::from_str(json).unwrap();
        provider.insert("chr2", FeatureSet::Gene(genes)).unwrap();

        let response =
            futures::executor::block_on(provider.fetch(request("chr2", 1000, 2000, 1.0))).unwrap();
        assert_eq!(
            response.features.feature_ids(),
            BTreeSet::from([FeatureId::from("long"), FeatureId::from("near")])
        );
        match response.features {
            FeatureSet::Gene(genes) => {
                let ids: Vec<&str> = genes.iter().map(|g| g.id.as_str()).collect();
                assert_eq!(ids, vec!["long", "near"]);
            }
            other => panic!("unexpected {:?}", other.kind()),
        }
    }

    #[test]
    fn test_signal_is_rebinned_to_resolution() {
        let mut provider = InMemoryProvider::new("sig", TrackKind::Signal);
        let bins = (0..100u64)
            .map(|i| SignalBin {
                position: i * 10,
                value: i as f64,
            })
            .collect();
        provider
            .insert("chr1", FeatureSet::Signal(SignalData::new(10, bins)))
            .unwrap();
        let response =
            futures::executor::block_on(provider.fetch(request("chr1", 0, 1000, 100.0))).unwrap();
        match response.features {
            FeatureSet::Signal(data) => {
                assert_eq!(data.bin_size, 100);
                assert_eq!(data.bins.len(), 10);
                assert_eq!(data.bins[0].value, 9.0);
            }
            other => panic!("unexpected {:?}", other.kind()),
        }
    }

    #[test]
    fn test_cancelled_request_is_rejected() {
        let provider = InMemoryProvider::new("g", TrackKind::Gene);
        let req = request("chr1", 0, 10, 1.0);
        req.cancel.cancel();
        let result = futures::executor::block_on(provider.fetch(req));
        assert_eq!(result.unwrap_err(), ProviderError::Cancelled(7));
    }

    #[test]
    fn test_kind_mismatch_on_insert() {
        let mut provider = InMemoryProvider::new("g", TrackKind::Gene);
        let err = provider
            .insert("chr1", FeatureSet::empty(TrackKind::Signal))
            .unwrap_err();
        assert!(matches!(err, ProviderError::KindMismatch { .. }));
    }
}
