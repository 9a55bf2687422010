//! Collection orchestrator: fans out to every configured source at once,
//! merges the tables in source order and persists the result.
//!
//! ```text
//!  authenticated (optional) ──┐
//!                             ├─ join_all ─▶ merge_all ─▶ RawStore (csv + parquet)
//!  free / demo ───────────────┘
//! ```

use anyhow::Result;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::data::{merge_all, MatchTable, Season};
use crate::sources::{DemoSource, FootballDataClient, FreeDataClient, MatchSource};
use crate::storage::{RawStore, SaveReport};

/// What one source produced for one request.
#[derive(Debug)]
pub enum SourceOutcome {
    Data(MatchTable),
    Empty,
    Failed(anyhow::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceStatus {
    Rows(usize),
    Empty,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub name: String,
    pub status: SourceStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionStatus {
    /// Data collected, every source and sink succeeded.
    Complete,
    /// Data collected, but a source failed or was dropped, or a sink failed.
    Partial,
    /// No source had data and none failed.
    Empty,
    /// No data, and at least one source failed.
    Failed,
}

/// Result of one `collect` call.
#[derive(Debug)]
pub struct Collection {
    pub matches: MatchTable,
    /// One entry per source, in task order.
    pub sources: Vec<SourceReport>,
    /// Sources whose rows could not be merged (no shared `match_id`).
    pub dropped: Vec<String>,
    /// `None` when there was nothing to save.
    pub saved: Option<SaveReport>,
}

impl Collection {
    pub fn status(&self) -> CollectionStatus {
        let any_failed = self
            .sources
            .iter()
            .any(|s| matches!(s.status, SourceStatus::Failed(_)));
        if self.matches.is_empty() {
            return if any_failed {
                CollectionStatus::Failed
            } else {
                CollectionStatus::Empty
            };
        }
        let sinks_ok = self.saved.as_ref().map_or(true, SaveReport::is_complete);
        if any_failed || !self.dropped.is_empty() || !sinks_ok {
            CollectionStatus::Partial
        } else {
            CollectionStatus::Complete
        }
    }
}

/// Orchestrates data collection from a fixed set of sources.
pub struct DataCollector {
    /// Present only when an API key is configured.
    authenticated: Option<Box<dyn MatchSource>>,
    free: Box<dyn MatchSource>,
    store: RawStore,
    source_timeout: Duration,
}

impl DataCollector {
    pub fn new(
        authenticated: Option<Box<dyn MatchSource>>,
        free: Box<dyn MatchSource>,
        store: RawStore,
        source_timeout: Duration,
    ) -> Self {
        DataCollector {
            authenticated,
            free,
            store,
            source_timeout,
        }
    }

    /// Build the live source set from settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let authenticated: Option<Box<dyn MatchSource>> = match settings.football_data_api_key() {
            Some(key) => {
                let client = FootballDataClient::new(key, settings.football_data_url())?;
                info!("Initialized football-data.org client");
                Some(Box::new(client))
            }
            None => {
                info!("No football-data.org API key configured, skipping that source");
                None
            }
        };
        info!("Initialized free data client");

        Ok(Self::new(
            authenticated,
            Box::new(FreeDataClient::new()),
            RawStore::new(settings.output_dir()),
            settings.source_timeout(),
        ))
    }

    /// Offline collector: demo matches in the free slot, no remote source.
    pub fn demo(settings: &Settings) -> Self {
        Self::new(
            None,
            Box::new(DemoSource::new()),
            RawStore::new(settings.output_dir()),
            settings.source_timeout(),
        )
    }

    pub fn has_authenticated_source(&self) -> bool {
        self.authenticated.is_some()
    }

    /// Sources in merge order: authenticated first, then free.
    fn sources(&self) -> Vec<&dyn MatchSource> {
        self.authenticated
            .as_deref()
            .into_iter()
            .chain(std::iter::once(self.free.as_ref()))
            .collect()
    }

    /// Collect all data for a league and season.
    ///
    /// Source failures and timeouts are logged and count as "no data"; they
    /// never abort the other sources. Persistence failures are reported in
    /// the returned `Collection` and never discard the merged table.
    pub async fn collect(&self, league: &str, season: &Season) -> Result<Collection> {
        let league = validate_league(league)?;
        info!("Collecting data for {} {}", league, season);

        let sources = self.sources();
        let fetches = sources
            .iter()
            .map(|source| fetch_one(*source, league, season, self.source_timeout));
        let outcomes = futures_util::future::join_all(fetches).await;

        let mut reports = Vec::with_capacity(outcomes.len());
        let mut tables = Vec::with_capacity(outcomes.len());
        for (source, outcome) in sources.iter().zip(outcomes) {
            let name = source.name().to_string();
            let status = match outcome {
                SourceOutcome::Data(table) => {
                    info!("Collected {} matches from {}", table.len(), name);
                    let rows = table.len();
                    tables.push((name.clone(), table));
                    SourceStatus::Rows(rows)
                }
                SourceOutcome::Empty => {
                    info!("No matches from {}", name);
                    SourceStatus::Empty
                }
                SourceOutcome::Failed(e) => {
                    warn!("Error collecting from {}: {:#}", name, e);
                    SourceStatus::Failed(format!("{:#}", e))
                }
            };
            reports.push(SourceReport { name, status });
        }

        let merged = merge_all(tables);
        debug!("Merged sources: {:?}", merged.merged);
        let saved = self.store.save(&merged.table, league, season).await;

        Ok(Collection {
            matches: merged.table,
            sources: reports,
            dropped: merged.dropped,
            saved,
        })
    }
}

/// League codes end up in file names and API paths, so only
/// `[A-Za-z0-9_]+` is accepted.
fn validate_league(league: &str) -> Result<&str> {
    let league = league.trim();
    if league.is_empty() {
        anyhow::bail!("league code must not be empty");
    }
    if !league.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
        anyhow::bail!(
            "invalid league code '{}': only letters, digits and '_' are allowed",
            league
        );
    }
    Ok(league)
}

async fn fetch_one(
    source: &dyn MatchSource,
    league: &str,
    season: &Season,
    limit: Duration,
) -> SourceOutcome {
    match tokio::time::timeout(limit, source.fetch_matches(league, season)).await {
        Ok(Ok(table)) if table.is_empty() => SourceOutcome::Empty,
        Ok(Ok(table)) => SourceOutcome::Data(table),
        Ok(Err(e)) => SourceOutcome::Failed(e),
        Err(_) => SourceOutcome::Failed(anyhow::anyhow!("timed out after {:?}", limit)),
    }
}
