//! Persistence of collected match tables under the raw-data directory.

pub mod columnar;

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::data::{MatchTable, Season};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("Parquet encoding failed: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkFormat {
    Csv,
    Parquet,
}

impl SinkFormat {
    pub fn extension(self) -> &'static str {
        match self {
            SinkFormat::Csv => "csv",
            SinkFormat::Parquet => "parquet",
        }
    }
}

impl fmt::Display for SinkFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Outcome of writing one table to every sink. Each sink succeeds or fails
/// on its own.
#[derive(Debug)]
pub struct SaveReport {
    pub csv: Result<PathBuf, SinkError>,
    pub parquet: Result<PathBuf, SinkError>,
}

impl SaveReport {
    pub fn is_complete(&self) -> bool {
        self.csv.is_ok() && self.parquet.is_ok()
    }

    pub fn saved_paths(&self) -> Vec<&Path> {
        [&self.csv, &self.parquet]
            .into_iter()
            .filter_map(|r| r.as_ref().ok().map(PathBuf::as_path))
            .collect()
    }

    pub fn failures(&self) -> Vec<(SinkFormat, &SinkError)> {
        let mut out = Vec::new();
        if let Err(e) = &self.csv {
            out.push((SinkFormat::Csv, e));
        }
        if let Err(e) = &self.parquet {
            out.push((SinkFormat::Parquet, e));
        }
        out
    }
}

/// Writes match tables as `<league>_<season>.csv` and `.parquet`.
#[derive(Debug, Clone)]
pub struct RawStore {
    dir: PathBuf,
}

impl RawStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        RawStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `{league}_{season with '-' replaced by '_'}`
    pub fn file_stem(league: &str, season: &Season) -> String {
        format!("{}_{}", league, season.file_token())
    }

    pub fn path_for(&self, league: &str, season: &Season, format: SinkFormat) -> PathBuf {
        self.dir.join(format!(
            "{}.{}",
            Self::file_stem(league, season),
            format.extension()
        ))
    }

    /// Write `table` to both sinks. An empty table writes nothing and
    /// returns `None`.
    pub async fn save(&self, table: &MatchTable, league: &str, season: &Season) -> Option<SaveReport> {
        if table.is_empty() {
            warn!("No data to save for {} {}", league, season);
            return None;
        }

        if let Err(e) = tokio::fs::create_dir_all(&self.dir).await {
            error!("Failed to create {}: {}", self.dir.display(), e);
            let dir_error = |e: &io::Error| SinkError::Io {
                path: self.dir.clone(),
                source: io::Error::new(e.kind(), e.to_string()),
            };
            return Some(SaveReport {
                csv: Err(dir_error(&e)),
                parquet: Err(dir_error(&e)),
            });
        }

        let csv_path = self.path_for(league, season, SinkFormat::Csv);
        let csv = match encode_csv(table) {
            Ok(bytes) => write_file(csv_path, bytes).await,
            Err(e) => Err(e),
        };

        let parquet_path = self.path_for(league, season, SinkFormat::Parquet);
        let parquet = match columnar::encode(table) {
            Ok(bytes) => write_file(parquet_path, bytes).await,
            Err(e) => Err(e.into()),
        };

        let report = SaveReport { csv, parquet };
        for path in report.saved_paths() {
            info!("Saved data to {}", path.display());
        }
        for (format, e) in report.failures() {
            error!("Failed to save {} output: {}", format, e);
        }
        Some(report)
    }

    /// Raw data files currently in the store directory, sorted by name.
    pub async fn list_files(&self) -> io::Result<Vec<PathBuf>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let known = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e == "csv" || e == "parquet")
                .unwrap_or(false);
            if known {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

async fn write_file(path: PathBuf, bytes: Vec<u8>) -> Result<PathBuf, SinkError> {
    match tokio::fs::write(&path, bytes).await {
        Ok(()) => Ok(path),
        Err(source) => Err(SinkError::Io { path, source }),
    }
}

/// Header row with the column names, then one line per row; nulls are
/// empty fields.
pub fn encode_csv(table: &MatchTable) -> Result<Vec<u8>, SinkError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(table.column_names())?;
    for row in table.rows() {
        wtr.write_record(
            row.iter()
                .map(|cell| cell.as_ref().map(|c| c.to_string()).unwrap_or_default()),
        )?;
    }
    wtr.into_inner()
        .map_err(|e| SinkError::Csv(csv::Error::from(e.into_error())))
}
