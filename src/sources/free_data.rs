use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use super::provider::MatchSource;
use crate::data::{MatchTable, Season};

/// Public-data source (Understat / FBref). Scraping is not implemented yet,
/// so every fetch yields an empty table.
#[derive(Debug, Default)]
pub struct FreeDataClient;

impl FreeDataClient {
    pub fn new() -> Self {
        FreeDataClient
    }
}

#[async_trait]
impl MatchSource for FreeDataClient {
    fn name(&self) -> &str {
        "free-data"
    }

    async fn fetch_matches(&self, league: &str, season: &Season) -> Result<MatchTable> {
        // TODO: scrape Understat/FBref match pages into records
        info!("Would collect free data for {} {}", league, season);
        Ok(MatchTable::empty())
    }
}
