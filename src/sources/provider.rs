use anyhow::Result;
use async_trait::async_trait;

use crate::data::{MatchTable, Season};

/// Trait that every match-data source must implement.
#[async_trait]
pub trait MatchSource: Send + Sync {
    /// Fetch all matches for a league and season. An empty table is a valid
    /// answer and distinct from an error.
    async fn fetch_matches(&self, league: &str, season: &Season) -> Result<MatchTable>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}
