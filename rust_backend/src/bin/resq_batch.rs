//! RESQ batch binary
//!
//! Reconciles an encounter export and classifies a site statistics export,
//! writing both results as JSON.
//!
//! # Usage
//!
//! ```bash
//! RESQ_EVENTS=data/encounters.json RESQ_SITES=data/sites.json \
//!   cargo run --bin resq-batch
//! ```
//!
//! # Environment Variables
//!
//! - `RESQ_CONFIG`: Path to a TOML config (default: search for `resq.toml`, else built-in defaults)
//! - `RESQ_EVENTS`: Encounter JSON array to reconcile (stage skipped when unset)
//! - `RESQ_SITES`: Site statistics JSON array to classify (stage skipped when unset)
//! - `RESQ_OUTPUT_DIR`: Output directory (default: output)
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use resq_rust::awards::AwardClassifier;
use resq_rust::config::EngineConfig;
use resq_rust::io::{write_json, SiteRowLoader};
use resq_rust::observe::LogSink;
use resq_rust::pipeline::{ReconcileConfig, ReconcilePipeline};
use resq_rust::timeline::Reconciler;

fn load_config() -> anyhow::Result<EngineConfig> {
    match env::var("RESQ_CONFIG") {
        Ok(path) => EngineConfig::from_file(&path)
            .with_context(|| format!("Failed to load config from {}", path)),
        Err(_) => match EngineConfig::from_default_location() {
            Ok(config) => Ok(config),
            Err(e) => {
                info!("{}; using built-in defaults", e);
                Ok(EngineConfig::default())
            }
        },
    }
}

fn reconcile_stage(config: &EngineConfig, events: &Path, output_dir: &Path) -> anyhow::Result<()> {
    let pipeline = ReconcilePipeline::with_config(ReconcileConfig {
        reconciler: Reconciler::from_settings(&config.reconciler),
        fail_fast: false,
    });

    let result = pipeline.process(events, &LogSink)?;
    for rejected in &result.rejected {
        warn!("skipped record #{}: {}", rejected.index, rejected.error);
    }

    let out = output_dir.join("reconciled.json");
    write_json(&out, &result.events)?;
    info!(
        "Reconciled {} records ({} stays corrected, {} unresolved, {} implausible durations, {} rejected) -> {}",
        result.summary.records,
        result.summary.corrected_stays,
        result.summary.unresolved_stays,
        result.summary.implausible_durations,
        result.summary.rejected,
        out.display()
    );
    write_json(&output_dir.join("reconcile_summary.json"), &result.summary)
}

fn award_stage(config: &EngineConfig, sites: &Path, output_dir: &Path) -> anyhow::Result<()> {
    let rows = SiteRowLoader::load_from_file(sites)
        .with_context(|| format!("Failed to load site rows from {}", sites.display()))?;
    let classifier = AwardClassifier::from_settings(&config.award);
    let awards = classifier.classify_all(&rows, &LogSink);

    let out = output_dir.join("awards.json");
    write_json(&out, &awards)?;
    info!(
        "Classified {} sites with the {} policy -> {}",
        awards.len(),
        classifier.policy(),
        out.display()
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    // Initialize logging; `log` records from the library are bridged in
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting RESQ batch");

    let config = load_config()?;
    let output_dir = env::var("RESQ_OUTPUT_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("output"));

    let events = env::var("RESQ_EVENTS").ok().map(PathBuf::from);
    let sites = env::var("RESQ_SITES").ok().map(PathBuf::from);
    if events.is_none() && sites.is_none() {
        anyhow::bail!("Nothing to do: set RESQ_EVENTS and/or RESQ_SITES");
    }

    if let Some(events) = events {
        reconcile_stage(&config, &events, &output_dir)?;
    }
    if let Some(sites) = sites {
        award_stage(&config, &sites, &output_dir)?;
    }

    info!("Done");
    Ok(())
}
