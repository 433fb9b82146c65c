//! genoview core library
//!
//! Coordinate spaces, typed track kinds, the viewport, and the event bus /
//! cohort store / coordinator layer that keeps sibling views in sync.

pub mod types;
pub mod error;
pub mod coords;
pub mod lod;
pub mod features;
pub mod spatial;
pub mod layout;
pub mod surface;
pub mod filter;
pub mod provider;
pub mod fetch;
pub mod track;
pub mod viewport;
pub mod events;
pub mod bus;
pub mod cohort;
pub mod coordinator;
pub mod url_state;
pub mod config;
pub mod views;

// Re-export commonly used types
pub use types::{FeatureId, Genome, GenomicPos, GenomicRegion, Span, Strand};
pub use error::{CoordError, RegionError, ViewerError, ViewerResult};
pub use coords::CoordinateSpace;
pub use features::{FeatureSet, TrackKind};
pub use filter::{FilterPredicate, FilterSet};
pub use provider::{DataProvider, InMemoryProvider, ProviderRegistry};
pub use track::{Track, TrackOptions, TrackStatus};
pub use viewport::Viewport;
pub use events::{Event, SelectionSnapshot};
pub use bus::EventBus;
pub use cohort::{CohortStore, SelectionMode};
pub use coordinator::Coordinator;
pub use url_state::UrlState;
pub use config::{EmbedConfig, TrackConfig};
pub use surface::{DisplayList, Surface, Theme};

/// Version information for the genoview core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
