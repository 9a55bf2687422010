use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use reqwest::Client;
use tracing::{debug, info, warn};
use url::Url;

use super::provider::MatchSource;
use crate::data::table::TableError;
use crate::data::{Cell, Column, MatchRecord, MatchTable, Season};

/// Authenticated client for the football-data.org v4 API.
/// Docs: <https://www.football-data.org/documentation/api>
pub struct FootballDataClient {
    http: Client,
    api_key: String,
    /// Base URL for overriding in tests
    base_url: String,
}

impl FootballDataClient {
    pub fn new(api_key: &str, base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(FootballDataClient {
            http,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn matches_url(&self, league: &str, season: &Season) -> Result<Url> {
        let mut url = Url::parse(&format!(
            "{}/competitions/{}/matches",
            self.base_url, league
        ))
        .with_context(|| format!("Invalid football-data.org URL for league '{}'", league))?;
        url.query_pairs_mut()
            .append_pair("season", &season.start_year().to_string());
        Ok(url)
    }
}

#[async_trait]
impl MatchSource for FootballDataClient {
    fn name(&self) -> &str {
        "football-data.org"
    }

    async fn fetch_matches(&self, league: &str, season: &Season) -> Result<MatchTable> {
        let url = self.matches_url(league, season)?;
        debug!("Fetching matches from {}", url);

        let resp = self
            .http
            .get(url)
            .header("X-Auth-Token", &self.api_key)
            .send()
            .await
            .context("football-data.org request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("football-data.org error {}: {}", status, body);
        }

        let raw: serde_json::Value = resp
            .json()
            .await
            .context("Failed to parse football-data.org response")?;

        let parsed = parse_matches_response(&raw, league, season);
        info!(
            "Collected {} finished matches from football-data.org for {} {}",
            parsed.len(),
            league,
            season
        );
        Ok(build_table(&parsed)?)
    }
}

/// Pre-match 1X2 odds; only present on accounts with the odds add-on.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Odds {
    home_win: f64,
    draw: f64,
    away_win: f64,
}

#[derive(Debug, Clone, PartialEq)]
struct ParsedMatch {
    record: MatchRecord,
    odds: Option<Odds>,
}

fn parse_odds(raw: &serde_json::Value) -> Option<Odds> {
    Some(Odds {
        home_win: raw["homeWin"].as_f64()?,
        draw: raw["draw"].as_f64()?,
        away_win: raw["awayWin"].as_f64()?,
    })
}

/// Record columns, plus `odds_home`/`odds_draw`/`odds_away` when any match
/// carries odds.
fn build_table(parsed: &[ParsedMatch]) -> Result<MatchTable, TableError> {
    if parsed.iter().all(|p| p.odds.is_none()) {
        let records: Vec<MatchRecord> = parsed.iter().map(|p| p.record.clone()).collect();
        return Ok(MatchTable::from_records(&records));
    }

    let mut columns = MatchTable::record_columns();
    columns.extend([
        Column::float("odds_home"),
        Column::float("odds_draw"),
        Column::float("odds_away"),
    ]);
    let mut table = MatchTable::with_columns(columns)?;
    for p in parsed {
        let mut row = MatchTable::record_row(&p.record);
        match p.odds {
            Some(o) => row.extend([
                Some(Cell::Float(o.home_win)),
                Some(Cell::Float(o.draw)),
                Some(Cell::Float(o.away_win)),
            ]),
            None => row.extend([None, None, None]),
        }
        table.push_row(row)?;
    }
    Ok(table)
}

/// Turn a `/competitions/{code}/matches` payload into records. Only finished
/// matches with a full-time score are kept.
fn parse_matches_response(raw: &serde_json::Value, league: &str, season: &Season) -> Vec<ParsedMatch> {
    let matches = match raw["matches"].as_array() {
        Some(a) => a,
        None => return vec![],
    };

    matches
        .iter()
        .filter_map(|m| {
            let match_id = m["id"]
                .as_i64()
                .map(|id| id.to_string())
                .or_else(|| m["id"].as_str().map(str::to_string))?;

            if m["status"].as_str().unwrap_or_default() != "FINISHED" {
                debug!("Skipping match {}: not finished", match_id);
                return None;
            }

            let home_team = m["homeTeam"]["name"].as_str()?;
            let away_team = m["awayTeam"]["name"].as_str()?;
            let date = parse_utc_date(m["utcDate"].as_str()?)?;
            let home_score = u32::try_from(m["score"]["fullTime"]["home"].as_u64()?).ok()?;
            let away_score = u32::try_from(m["score"]["fullTime"]["away"].as_u64()?).ok()?;

            let record = MatchRecord::new(
                match_id, home_team, away_team, date, league, season, home_score, away_score,
            );
            Some(ParsedMatch {
                record,
                odds: parse_odds(&m["odds"]),
            })
        })
        .filter(|parsed| match parsed.record.validate() {
            Ok(()) => true,
            Err(e) => {
                warn!("Skipping invalid match from football-data.org: {}", e);
                false
            }
        })
        .collect()
}

fn parse_utc_date(s: &str) -> Option<NaiveDate> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| NaiveDate::parse_from_str(s.get(..10)?, "%Y-%m-%d").ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::models::Outcome;
    use serde_json::json;

    fn season() -> Season {
        Season::new(2023)
    }

    #[test]
    fn test_parse_finished_matches() {
        let raw = json!({
            "matches": [
                {
                    "id": 436244,
                    "utcDate": "2023-08-11T19:00:00Z",
                    "status": "FINISHED",
                    "homeTeam": { "id": 328, "name": "Burnley FC" },
                    "awayTeam": { "id": 65, "name": "Manchester City FC" },
                    "score": { "winner": "AWAY_TEAM", "fullTime": { "home": 0, "away": 3 } }
                },
                {
                    "id": 436245,
                    "utcDate": "2023-08-12T12:00:00Z",
                    "status": "FINISHED",
                    "homeTeam": { "name": "Arsenal FC" },
                    "awayTeam": { "name": "Nottingham Forest FC" },
                    "score": { "fullTime": { "home": 2, "away": 1 } }
                }
            ]
        });

        let records = parse_matches_response(&raw, "PL", &season());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].record.match_id, "436244");
        assert_eq!(records[0].record.home_team, "Burnley FC");
        assert_eq!(records[0].record.date, NaiveDate::from_ymd_opt(2023, 8, 11).unwrap());
        assert_eq!(records[0].record.league, "PL");
        assert_eq!(records[0].record.season, "2023-2024");
        assert_eq!(records[0].record.result, Outcome::AwayWin);
        assert_eq!(records[1].record.result, Outcome::HomeWin);
    }

    #[test]
    fn test_parse_skips_unplayed_and_incomplete() {
        let raw = json!({
            "matches": [
                {
                    "id": 1,
                    "utcDate": "2024-05-19T15:00:00Z",
                    "status": "SCHEDULED",
                    "homeTeam": { "name": "A" },
                    "awayTeam": { "name": "B" },
                    "score": { "fullTime": { "home": null, "away": null } }
                },
                {
                    "id": 2,
                    "utcDate": "2024-05-19T15:00:00Z",
                    "status": "FINISHED",
                    "homeTeam": { "name": "C" },
                    "awayTeam": { "name": "D" },
                    "score": { "fullTime": { "home": 1, "away": null } }
                }
            ]
        });
        assert!(parse_matches_response(&raw, "PL", &season()).is_empty());
    }

    #[test]
    fn test_parse_skips_blank_ids() {
        let raw = json!({
            "matches": [{
                "id": "",
                "utcDate": "2024-05-19T15:00:00Z",
                "status": "FINISHED",
                "homeTeam": { "name": "A" },
                "awayTeam": { "name": "B" },
                "score": { "fullTime": { "home": 1, "away": 0 } }
            }]
        });
        assert!(parse_matches_response(&raw, "PL", &season()).is_empty());
    }

    #[test]
    fn test_odds_become_float_columns() {
        let raw = json!({
            "matches": [
                {
                    "id": 10,
                    "utcDate": "2023-08-12T14:00:00Z",
                    "status": "FINISHED",
                    "homeTeam": { "name": "Brighton & Hove Albion FC" },
                    "awayTeam": { "name": "Luton Town FC" },
                    "score": { "fullTime": { "home": 4, "away": 1 } },
                    "odds": { "homeWin": 1.3, "draw": 5.5, "awayWin": 9.0 }
                },
                {
                    "id": 11,
                    "utcDate": "2023-08-12T14:00:00Z",
                    "status": "FINISHED",
                    "homeTeam": { "name": "Everton FC" },
                    "awayTeam": { "name": "Fulham FC" },
                    "score": { "fullTime": { "home": 0, "away": 1 } },
                    "odds": { "msg": "Activate Odds-Package in User-Panel to retrieve odds." }
                }
            ]
        });

        let parsed = parse_matches_response(&raw, "PL", &season());
        let table = build_table(&parsed).unwrap();
        assert_eq!(table.columns().len(), 12);
        assert_eq!(table.columns()[9], Column::float("odds_home"));
        assert_eq!(table.cell(0, "odds_home"), Some(&Cell::Float(1.3)));
        assert_eq!(table.cell(0, "odds_away"), Some(&Cell::Float(9.0)));
        assert_eq!(table.cell(1, "odds_draw"), None);
        assert_eq!(table.cell(1, "result"), Some(&Cell::from("A")));
    }

    #[test]
    fn test_without_odds_keeps_record_layout() {
        let raw = json!({
            "matches": [{
                "id": 12,
                "utcDate": "2023-08-13T13:00:00Z",
                "status": "FINISHED",
                "homeTeam": { "name": "Brentford FC" },
                "awayTeam": { "name": "Tottenham Hotspur FC" },
                "score": { "fullTime": { "home": 2, "away": 2 } },
                "odds": { "msg": "Activate Odds-Package in User-Panel to retrieve odds." }
            }]
        });

        let table = build_table(&parse_matches_response(&raw, "PL", &season())).unwrap();
        assert_eq!(table.columns(), MatchTable::record_columns().as_slice());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_parse_without_matches_array() {
        let raw = json!({ "message": "The resource you are looking for is restricted." });
        assert!(parse_matches_response(&raw, "PL", &season()).is_empty());
    }

    #[test]
    fn test_matches_url() {
        let client = FootballDataClient::new("key", "https://api.football-data.org/v4/").unwrap();
        let url = client.matches_url("PL", &season()).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.football-data.org/v4/competitions/PL/matches?season=2023"
        );
    }

    #[test]
    fn test_parse_utc_date_fallback() {
        assert_eq!(
            parse_utc_date("2024-01-02"),
            NaiveDate::from_ymd_opt(2024, 1, 2)
        );
        assert_eq!(parse_utc_date("garbage"), None);
    }
}
