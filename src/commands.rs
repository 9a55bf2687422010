use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::Path;
use tracing::{info, warn};

use crate::collector::{CollectionStatus, DataCollector, SourceStatus};
use crate::config::{CollectArgs, PredictArgs, Settings, SourceMode, TrainArgs};
use crate::data::Season;
use crate::storage::RawStore;

/// How a command finished when it did not fail outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Success,
    /// Finished with data, but some source or sink failed along the way.
    Partial,
}

pub async fn collect(settings: &Settings, args: &CollectArgs) -> Result<CommandOutcome> {
    let season: Season = args
        .season
        .parse()
        .with_context(|| format!("invalid --season '{}'", args.season))?;
    info!("Starting data collection for {} {}", args.league, season);

    let collector = match args.source {
        SourceMode::Live => DataCollector::from_settings(settings)?,
        SourceMode::Demo => DataCollector::demo(settings),
    };
    let collection = collector.collect(&args.league, &season).await?;

    match collection.status() {
        CollectionStatus::Empty => {
            warn!("No data collected");
            return Ok(CommandOutcome::Success);
        }
        CollectionStatus::Failed => {
            anyhow::bail!("no data collected: every source failed");
        }
        CollectionStatus::Complete | CollectionStatus::Partial => {}
    }

    info!("Collected {} matches", collection.matches.len());
    if let Some(report) = &collection.saved {
        for path in report.saved_paths() {
            info!("Data saved to {}", path.display());
        }
    }

    if collection.status() == CollectionStatus::Partial {
        let failed: Vec<&str> = collection
            .sources
            .iter()
            .filter(|s| matches!(s.status, SourceStatus::Failed(_)))
            .map(|s| s.name.as_str())
            .collect();
        let sink_failures = collection
            .saved
            .as_ref()
            .map_or(0, |report| report.failures().len());
        warn!(
            "Partial collection: failed sources {:?}, dropped sources {:?}, {} output file(s) not written",
            failed,
            collection.dropped,
            sink_failures
        );
        return Ok(CommandOutcome::Partial);
    }
    Ok(CommandOutcome::Success)
}

pub fn train(args: &TrainArgs) -> Result<CommandOutcome> {
    info!("Starting model training...");
    info!("Training {} model for {} epochs", args.model, args.epochs);

    println!("\nModel training would include:");
    println!("1. Loading historical match data");
    println!("2. Feature engineering");
    println!("3. Training ML models (XGBoost, Random Forest, etc.)");
    println!("4. Model evaluation and selection");
    Ok(CommandOutcome::Success)
}

pub fn predict(args: &PredictArgs) -> Result<CommandOutcome> {
    let date = args
        .date
        .as_deref()
        .map(parse_match_date)
        .transpose()?;
    info!("Predicting match: {} vs {}", args.home, args.away);

    println!("\nMatch Prediction:");
    println!("Home: {}", args.home);
    println!("Away: {}", args.away);
    match date {
        Some(d) => println!("Date: {}", d),
        None => println!("Date: Not specified"),
    }
    println!("\nPrediction would include:");
    println!("1. Team form analysis");
    println!("2. Head-to-head statistics");
    println!("3. Player availability");
    println!("4. ML model prediction");
    Ok(CommandOutcome::Success)
}

pub async fn status(config_path: &Path, settings: &Settings) -> Result<CommandOutcome> {
    let collector = DataCollector::from_settings(settings)?;
    let store = RawStore::new(settings.output_dir());
    let files = store
        .list_files()
        .await
        .with_context(|| format!("failed to list {}", store.dir().display()))?;

    println!("Config file:        {}", config_path.display());
    println!(
        "football-data.org:  {}",
        if collector.has_authenticated_source() {
            "configured"
        } else {
            "not configured (no API key)"
        }
    );
    println!("Free data source:   stub (returns no data)");
    println!("Source timeout:     {:?}", settings.source_timeout());
    println!("Output directory:   {}", store.dir().display());
    if files.is_empty() {
        println!("Raw data files:     none");
    } else {
        println!("Raw data files:");
        for f in &files {
            println!("  {}", f.display());
        }
    }
    Ok(CommandOutcome::Success)
}

fn parse_match_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("invalid --date '{}': expected YYYY-MM-DD", s))
}
