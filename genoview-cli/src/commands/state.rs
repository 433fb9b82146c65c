//! State command implementation - normalize a URL state and report what it shows

use super::{open_session, SessionOptions};
use crate::config::Config;
use anyhow::{Context, Result};
use genoview_core::events::Event;
use std::path::PathBuf;

pub async fn execute(config: &Config, data: PathBuf, options: SessionOptions, json: bool) -> Result<()> {
    let coordinator = open_session(config, &data, &options).await?;
    let query = coordinator.url_state().to_query_string();
    let visible = coordinator.visible_features();

    if json {
        let report = serde_json::json!({
            "query": query,
            "locus": coordinator.region().locus(),
            "selection": coordinator.cohort().selection(),
            "filters": coordinator.cohort().filters(),
            "visible": Event::visible_features_changed(visible.features, visible.samples),
        });
        let text = serde_json::to_string_pretty(&report).context("Failed to serialize state report")?;
        println!("{text}");
    } else {
        println!("{query}");
        log::info!(
            "{} feature(s) from {} sample(s) in view",
            visible.features.len(),
            visible.samples.len()
        );
    }
    Ok(())
}
