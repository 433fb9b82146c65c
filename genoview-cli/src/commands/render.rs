//! Render command implementation - export the view to SVG

use super::{open_session, SessionOptions};
use crate::config::Config;
use crate::error::CliError;
use anyhow::Result;
use genoview_core::track::TrackStatus;
use genoview_render::ViewExporter;
use std::path::PathBuf;

pub async fn execute(
    config: &Config,
    data: PathBuf,
    output: PathBuf,
    options: SessionOptions,
    title: Option<String>,
    no_footer: bool,
) -> Result<()> {
    log::info!("Starting view rendering");
    log::info!("Data fixture: {}", data.display());
    log::info!("Output file: {}", output.display());

    match output.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("svg") => {}
        _ => log::warn!("Output {} has no .svg extension; writing SVG anyway", output.display()),
    }

    let coordinator = open_session(config, &data, &options).await?;

    let mut export = config.export.clone();
    if title.is_some() {
        export.title = title;
    }
    if no_footer {
        export.show_footer = false;
    }
    let exporter = ViewExporter::new(export);

    coordinator
        .with_viewport(|vp| exporter.export_svg(&output, vp))
        .map_err(|e| CliError::rendering(format!("{e:#}")))?;

    let failed = coordinator.with_viewport(|vp| {
        vp.tracks()
            .iter()
            .filter(|t| matches!(t.status(), TrackStatus::Failed { .. }))
            .count()
    });
    println!(
        "Wrote {} for {}{}",
        output.display(),
        coordinator.region().locus(),
        if failed > 0 {
            format!(" ({failed} track(s) failed to load)")
        } else {
            String::new()
        }
    );
    Ok(())
}
