use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid season '{0}': expected YYYY-YYYY with consecutive years")]
    InvalidSeason(String),
    #[error("match has an empty match_id")]
    EmptyMatchId,
    #[error("match {match_id}: result {stated} contradicts score {home}-{away}")]
    ResultMismatch {
        match_id: String,
        stated: Outcome,
        home: u32,
        away: u32,
    },
}

/// Full-time outcome from the home side's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    HomeWin,
    Draw,
    AwayWin,
}

impl Outcome {
    pub fn from_scores(home: u32, away: u32) -> Self {
        match home.cmp(&away) {
            std::cmp::Ordering::Greater => Outcome::HomeWin,
            std::cmp::Ordering::Equal => Outcome::Draw,
            std::cmp::Ordering::Less => Outcome::AwayWin,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Outcome::HomeWin => "H",
            Outcome::Draw => "D",
            Outcome::AwayWin => "A",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A season spanning two calendar years, e.g. `2023-2024`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Season {
    start: i32,
}

impl Season {
    pub fn new(start: i32) -> Self {
        Season { start }
    }

    /// Year the season kicks off in; what football-data.org calls the season.
    pub fn start_year(&self) -> i32 {
        self.start
    }

    pub fn end_year(&self) -> i32 {
        self.start + 1
    }

    /// Filename-safe form: `2023_2024`.
    pub fn file_token(&self) -> String {
        self.to_string().replace('-', "_")
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end_year())
    }
}

impl FromStr for Season {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ModelError::InvalidSeason(s.to_string());
        let (start, end) = s.trim().split_once('-').ok_or_else(invalid)?;
        let is_year = |part: &str| part.len() == 4 && part.bytes().all(|b| b.is_ascii_digit());
        if !is_year(start) || !is_year(end) {
            return Err(invalid());
        }
        let start: i32 = start.parse().map_err(|_| invalid())?;
        let end: i32 = end.parse().map_err(|_| invalid())?;
        if end != start + 1 {
            return Err(invalid());
        }
        Ok(Season::new(start))
    }
}

/// One played match with its full-time score.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    pub match_id: String,
    pub home_team: String,
    pub away_team: String,
    pub date: NaiveDate,
    pub league: String,
    pub season: String,
    pub home_score: u32,
    pub away_score: u32,
    pub result: Outcome,
}

impl MatchRecord {
    /// Build a record, deriving `result` from the score.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        match_id: impl Into<String>,
        home_team: impl Into<String>,
        away_team: impl Into<String>,
        date: NaiveDate,
        league: impl Into<String>,
        season: &Season,
        home_score: u32,
        away_score: u32,
    ) -> Self {
        MatchRecord {
            match_id: match_id.into(),
            home_team: home_team.into(),
            away_team: away_team.into(),
            date,
            league: league.into(),
            season: season.to_string(),
            home_score,
            away_score,
            result: Outcome::from_scores(home_score, away_score),
        }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.match_id.trim().is_empty() {
            return Err(ModelError::EmptyMatchId);
        }
        if self.result != Outcome::from_scores(self.home_score, self.away_score) {
            return Err(ModelError::ResultMismatch {
                match_id: self.match_id.clone(),
                stated: self.result,
                home: self.home_score,
                away: self.away_score,
            });
        }
        Ok(())
    }
}
