//! Command implementations for the genoview CLI

pub mod render;
pub mod state;

use crate::config::Config;
use crate::error::{CliError, CliResult};
use genoview_core::config::RegionSpec;
use genoview_core::provider::ProviderRegistry;
use genoview_core::track::TrackStatus;
use genoview_core::url_state::UrlState;
use genoview_core::Coordinator;
use std::path::Path;
use std::time::Duration;

/// Where the view should start, on top of the `[view]` section.
#[derive(Debug, Default, Clone)]
pub struct SessionOptions {
    pub locus: Option<String>,
    pub width: Option<u32>,
    /// URL query restored after the initial load.
    pub state: Option<String>,
}

pub fn load_registry(path: &Path) -> CliResult<ProviderRegistry> {
    if !path.exists() {
        return Err(CliError::file_not_found(path.to_path_buf()));
    }
    let json = std::fs::read_to_string(path)
        .map_err(|e| CliError::invalid_fixture(path.to_path_buf(), e.to_string()))?;
    let registry = ProviderRegistry::from_fixture_json(&json)
        .map_err(|e| CliError::invalid_fixture(path.to_path_buf(), e.to_string()))?;
    log::info!("Loaded {} source(s) from {}", registry.sources().len(), path.display());
    Ok(registry)
}

async fn settle_within(coordinator: &mut Coordinator, secs: u64) -> CliResult<()> {
    if tokio::time::timeout(Duration::from_secs(secs), coordinator.settle())
        .await
        .is_ok()
    {
        return Ok(());
    }
    let pending = coordinator.with_viewport(|vp| {
        vp.tracks()
            .iter()
            .filter(|t| !t.is_settled())
            .map(|t| t.id().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    });
    Err(CliError::LoadTimeout { secs, pending })
}

/// Builds the coordinator, waits for the initial load and restores the
/// URL state if one was given.
pub async fn open_session(config: &Config, data: &Path, options: &SessionOptions) -> CliResult<Coordinator> {
    let registry = load_registry(data)?;
    let mut view = config.view.clone();
    if let Some(locus) = &options.locus {
        view.initial_region = RegionSpec::Locus(locus.clone());
    }
    if let Some(width) = options.width {
        if width == 0 {
            return Err(CliError::config("--width must be positive"));
        }
        view.pixel_width = width;
    }

    let mut coordinator = Coordinator::new(view, &registry)?;
    let timeout = config.general.load_timeout_secs;
    settle_within(&mut coordinator, timeout).await?;

    if let Some(query) = &options.state {
        let state = UrlState::parse(query)?;
        coordinator.apply_url_state(&state)?;
        settle_within(&mut coordinator, timeout).await?;
    }

    coordinator.with_viewport(|vp| {
        for track in vp.tracks() {
            match track.status() {
                TrackStatus::Failed { message } => log::warn!("Track '{}' failed: {}", track.id(), message),
                status => log::debug!("Track '{}': {}", track.id(), status),
            }
        }
    });
    log::info!("View ready at {}", coordinator.region().locus());
    Ok(coordinator)
}
