use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::info;

use super::provider::MatchSource;
use crate::data::{MatchRecord, MatchTable, Season};

const DEMO_MATCHES: [(&str, &str, &str, (i32, u32, u32), u32, u32); 3] = [
    ("demo1", "Team A", "Team B", (2024, 1, 1), 2, 1),
    ("demo2", "Team C", "Team D", (2024, 1, 2), 1, 2),
    ("demo3", "Team E", "Team F", (2024, 1, 3), 3, 1),
];

/// Offline source with a fixed handful of matches, for trying the pipeline
/// without an API key.
#[derive(Debug, Default)]
pub struct DemoSource;

impl DemoSource {
    pub fn new() -> Self {
        DemoSource
    }

    pub fn records(league: &str, season: &Season) -> Vec<MatchRecord> {
        DEMO_MATCHES
            .iter()
            .filter_map(|&(id, home, away, (y, m, d), hs, aws)| {
                let date = NaiveDate::from_ymd_opt(y, m, d)?;
                Some(MatchRecord::new(id, home, away, date, league, season, hs, aws))
            })
            .collect()
    }
}

#[async_trait]
impl MatchSource for DemoSource {
    fn name(&self) -> &str {
        "demo"
    }

    async fn fetch_matches(&self, league: &str, season: &Season) -> Result<MatchTable> {
        info!("Collecting demo matches for {} {}", league, season);
        Ok(MatchTable::from_records(&Self::records(league, season)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::models::Outcome;

    #[test]
    fn test_demo_records_are_valid() {
        let records = DemoSource::records("PL", &Season::new(2023));
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.validate().is_ok()));
        assert_eq!(records[1].result, Outcome::AwayWin);
        assert!(records.iter().all(|r| r.league == "PL"));
    }
}
