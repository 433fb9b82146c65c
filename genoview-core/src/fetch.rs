//! Background fetch worker.
//!
//! A [`PendingFetch`] leaves the track on the UI side, runs the provider
//! future plus the CPU-heavy preparation on the tokio runtime, and comes
//! back as a [`FetchOutcome`] through an unbounded channel. The track then
//! decides whether the outcome is still wanted (see `Track::apply`).

use crate::error::{ViewerError, ViewerResult};
use crate::provider::{DataProvider, FetchRequest, ProviderError, RequestId};
use crate::track::{PrepareContext, PreparedFeatures, TrackOptions};
use std::fmt;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

/// A request issued by a track, not yet dispatched.
pub struct PendingFetch {
    pub track_id: String,
    pub provider: Arc<dyn DataProvider>,
    pub options: TrackOptions,
    pub request: FetchRequest,
}

impl fmt::Debug for PendingFetch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingFetch")
            .field("track_id", &self.track_id)
            .field("request_id", &self.request.request_id)
            .field("region", &self.request.region)
            .field("provider", &self.provider.describe())
            .finish()
    }
}

impl PendingFetch {
    /// Runs the provider call and preparation inline on the current task.
    pub async fn run(self) -> FetchOutcome {
        let track_id = self.track_id.clone();
        let request_id = self.request.request_id;
        let result = execute(self.provider, self.options, self.request).await;
        FetchOutcome {
            track_id,
            request_id,
            result,
        }
    }
}

/// Result of one fetch, tagged with the track and request it answers.
#[derive(Debug)]
pub struct FetchOutcome {
    pub track_id: String,
    pub request_id: RequestId,
    pub result: Result<PreparedFeatures, ProviderError>,
}

async fn execute(
    provider: Arc<dyn DataProvider>,
    options: TrackOptions,
    request: FetchRequest,
) -> Result<PreparedFeatures, ProviderError> {
    let request_id = request.request_id;
    let cancel = request.cancel.clone();
    let ctx = PrepareContext {
        region: request.region.clone(),
        resolution: request.resolution,
        lod: options.level_for(&request.resolution),
    };

    let response = provider.fetch(request).await?;
    if cancel.is_cancelled() {
        return Err(ProviderError::Cancelled(request_id));
    }
    if response.request_id != request_id {
        return Err(ProviderError::EchoMismatch {
            expected: request_id,
            got: response.request_id,
        });
    }

    let features = response.features;
    match tokio::task::spawn_blocking(move || options.prepare(features, &ctx)).await {
        Ok(prepared) => prepared,
        Err(err) => Err(ProviderError::Backend(format!("prepare worker failed: {err}"))),
    }
}

/// Spawns fetches on a tokio runtime and funnels their outcomes into one
/// channel.
#[derive(Debug, Clone)]
pub struct FetchDispatcher {
    runtime: Handle,
    outcomes: mpsc::UnboundedSender<FetchOutcome>,
}

impl FetchDispatcher {
    pub fn new(runtime: Handle, outcomes: mpsc::UnboundedSender<FetchOutcome>) -> Self {
        Self { runtime, outcomes }
    }

    /// Binds to the runtime of the calling context.
    pub fn current(outcomes: mpsc::UnboundedSender<FetchOutcome>) -> ViewerResult<Self> {
        let runtime = Handle::try_current().map_err(|_| ViewerError::NoRuntime)?;
        Ok(Self::new(runtime, outcomes))
    }

    /// Channel pair plus a dispatcher on the current runtime.
    pub fn channel() -> ViewerResult<(Self, mpsc::UnboundedReceiver<FetchOutcome>)> {
        let (tx, rx) = mpsc::unbounded_channel();
        Ok((Self::current(tx)?, rx))
    }

    pub fn dispatch(&self, pending: PendingFetch) {
        log::debug!(
            "dispatching request #{} for track {} ({})",
            pending.request.request_id,
            pending.track_id,
            pending.request.region
        );
        let outcomes = self.outcomes.clone();
        self.runtime.spawn(async move {
            let outcome = pending.run().await;
            if outcomes.send(outcome).is_err() {
                log::debug!("outcome receiver dropped; discarding fetch result");
            }
        });
    }

    pub fn dispatch_all(&self, pending: impl IntoIterator<Item = PendingFetch>) {
        for fetch in pending {
            self.dispatch(fetch);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::CoordinateSpace;
    use crate::features::{FeatureSet, MutationFeature, TrackKind, Consequence};
    use crate::provider::{FailingProvider, FetchResponse, InMemoryProvider};
    use crate::track::Track;
    use crate::types::GenomicRegion;
    use futures::future::BoxFuture;

    fn space() -> CoordinateSpace {
        let region = GenomicRegion::new("chr17", 0, 10_000).unwrap();
        CoordinateSpace::new(region, 1000, 81_195_210).unwrap()
    }

    fn mutation_provider() -> Arc<dyn DataProvider> {
        let mut provider = InMemoryProvider::new("muts", TrackKind::Mutation);
        provider
            .insert(
                "chr17",
                FeatureSet::Mutation(vec![MutationFeature {
                    id: "m1".into(),
                    position: 500,
                    consequence: Consequence::Missense,
                    sample_id: "S1".into(),
                    gene: "TP53".into(),
                    protein_change: Some("R175H".into()),
                }]),
            )
            .unwrap();
        Arc::new(provider)
    }

    struct WrongEcho;

    impl DataProvider for WrongEcho {
        fn fetch(
            &self,
            request: FetchRequest,
        ) -> BoxFuture<'static, Result<FetchResponse, ProviderError>> {
            Box::pin(async move {
                Ok(FetchResponse {
                    request_id: request.request_id + 10,
                    features: FeatureSet::empty(TrackKind::Gene),
                })
            })
        }
    }

    #[tokio::test]
    async fn test_dispatch_delivers_prepared_outcome() {
        let (dispatcher, mut rx) = FetchDispatcher::channel().unwrap();
        let mut track = Track::new(
            "muts",
            0,
            80.0,
            mutation_provider(),
            TrackOptions::default_for(TrackKind::Mutation),
        );
        dispatcher.dispatch(track.set_viewport(space()).unwrap());
        let outcome = rx.recv().await.unwrap();
        assert_eq!(outcome.track_id, "muts");
        assert_eq!(outcome.request_id, 1);
        assert!(outcome.result.is_ok());
        assert_eq!(
            track.apply(outcome.request_id, outcome.result),
            crate::track::ApplyOutcome::Applied
        );
    }

    #[tokio::test]
    async fn test_cancelled_request_reports_cancelled() {
        let mut track = Track::new(
            "muts",
            0,
            80.0,
            mutation_provider(),
            TrackOptions::default_for(TrackKind::Mutation),
        );
        let pending = track.set_viewport(space()).unwrap();
        track.cancel_in_flight();
        let outcome = pending.run().await;
        assert_eq!(outcome.result.unwrap_err(), ProviderError::Cancelled(1));
    }

    #[tokio::test]
    async fn test_echo_mismatch_is_an_error() {
        let mut track = Track::new(
            "genes",
            0,
            80.0,
            Arc::new(WrongEcho),
            TrackOptions::default_for(TrackKind::Gene),
        );
        let outcome = track.set_viewport(space()).unwrap().run().await;
        assert_eq!(
            outcome.result.unwrap_err(),
            ProviderError::EchoMismatch { expected: 1, got: 11 }
        );
    }

    #[tokio::test]
    async fn test_provider_failure_passes_through() {
        let mut track = Track::new(
            "broken",
            0,
            80.0,
            Arc::new(FailingProvider {
                message: "503".into(),
            }),
            TrackOptions::default_for(TrackKind::Signal),
        );
        let outcome = track.set_viewport(space()).unwrap().run().await;
        assert!(matches!(outcome.result, Err(ProviderError::Unavailable(_))));
    }

    #[test]
    fn test_no_runtime_outside_tokio() {
        let (tx, _rx) = mpsc::unbounded_channel();
        assert!(matches!(FetchDispatcher::current(tx), Err(ViewerError::NoRuntime)));
    }
}
