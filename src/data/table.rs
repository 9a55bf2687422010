use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

use super::models::MatchRecord;

/// Name of the join key every keyed table carries.
pub const KEY_COLUMN: &str = "match_id";

#[derive(Debug, Error, PartialEq)]
pub enum TableError {
    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),
    #[error("row has {got} cells, table has {expected} columns")]
    Arity { expected: usize, got: usize },
    #[error("column '{column}' holds {expected} values, got {got}")]
    KindMismatch {
        column: String,
        expected: CellKind,
        got: CellKind,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Text,
    Integer,
    Float,
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellKind::Text => f.write_str("text"),
            CellKind::Integer => f.write_str("integer"),
            CellKind::Float => f.write_str("float"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl Cell {
    pub fn kind(&self) -> CellKind {
        match self {
            Cell::Text(_) => CellKind::Text,
            Cell::Integer(_) => CellKind::Integer,
            Cell::Float(_) => CellKind::Float,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Integer(v) => Some(*v as f64),
            Cell::Float(v) => Some(*v),
            Cell::Text(_) => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Integer(v) => write!(f, "{}", v),
            Cell::Float(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<i64> for Cell {
    fn from(v: i64) -> Self {
        Cell::Integer(v)
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Float(v)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub kind: CellKind,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: CellKind) -> Self {
        Column {
            name: name.into(),
            kind,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Column::new(name, CellKind::Text)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Column::new(name, CellKind::Integer)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Column::new(name, CellKind::Float)
    }
}

/// One row; `None` is a null cell.
pub type Row = Vec<Option<Cell>>;

/// Ordered table of match data with typed columns.
///
/// Rows always have exactly one cell per column and every present cell
/// matches its column's kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchTable {
    columns: Vec<Column>,
    rows: Vec<Row>,
}

impl MatchTable {
    pub fn empty() -> Self {
        MatchTable::default()
    }

    pub fn with_columns(columns: Vec<Column>) -> Result<Self, TableError> {
        let mut seen = HashSet::new();
        for col in &columns {
            if !seen.insert(col.name.as_str()) {
                return Err(TableError::DuplicateColumn(col.name.clone()));
            }
        }
        Ok(MatchTable {
            columns,
            rows: Vec::new(),
        })
    }

    /// Canonical match-record layout.
    pub fn record_columns() -> Vec<Column> {
        vec![
            Column::text(KEY_COLUMN),
            Column::text("home_team"),
            Column::text("away_team"),
            Column::text("date"),
            Column::text("league"),
            Column::text("season"),
            Column::integer("home_score"),
            Column::integer("away_score"),
            Column::text("result"),
        ]
    }

    pub fn from_records(records: &[MatchRecord]) -> Self {
        MatchTable {
            columns: Self::record_columns(),
            rows: records.iter().map(Self::record_row).collect(),
        }
    }

    /// Cells of one record in `record_columns` order.
    pub fn record_row(r: &MatchRecord) -> Row {
        vec![
            Some(Cell::Text(r.match_id.clone())),
            Some(Cell::Text(r.home_team.clone())),
            Some(Cell::Text(r.away_team.clone())),
            Some(Cell::Text(r.date.format("%Y-%m-%d").to_string())),
            Some(Cell::Text(r.league.clone())),
            Some(Cell::Text(r.season.clone())),
            Some(Cell::Integer(i64::from(r.home_score))),
            Some(Cell::Integer(i64::from(r.away_score))),
            Some(Cell::Text(r.result.code().to_string())),
        ]
    }

    /// Caller guarantees the row/column invariants.
    pub(crate) fn from_parts(columns: Vec<Column>, rows: Vec<Row>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        MatchTable { columns, rows }
    }

    pub fn push_row(&mut self, row: Row) -> Result<(), TableError> {
        if row.len() != self.columns.len() {
            return Err(TableError::Arity {
                expected: self.columns.len(),
                got: row.len(),
            });
        }
        for (col, cell) in self.columns.iter().zip(&row) {
            if let Some(cell) = cell {
                if cell.kind() != col.kind {
                    return Err(TableError::KindMismatch {
                        column: col.name.clone(),
                        expected: col.kind,
                        got: cell.kind(),
                    });
                }
            }
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// A table with no rows or no columns holds no data.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Index of the `match_id` column, if the table carries one as text.
    pub fn key_index(&self) -> Option<usize> {
        self.column_index(KEY_COLUMN)
            .filter(|&i| self.columns[i].kind == CellKind::Text)
    }

    #[cfg(test)]
    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)?.as_ref()
    }

    #[cfg(test)]
    pub fn match_ids(&self) -> Vec<&str> {
        match self.key_index() {
            Some(idx) => self
                .rows
                .iter()
                .filter_map(|r| r[idx].as_ref().and_then(Cell::as_text))
                .collect(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::models::Season;
    use chrono::NaiveDate;

    #[test]
    fn test_from_records_layout() {
        let season = Season::new(2023);
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let rec = MatchRecord::new("m1", "Arsenal", "Chelsea", date, "PL", &season, 2, 2);
        let table = MatchTable::from_records(&[rec]);

        assert_eq!(
            table.column_names(),
            vec![
                "match_id",
                "home_team",
                "away_team",
                "date",
                "league",
                "season",
                "home_score",
                "away_score",
                "result"
            ]
        );
        assert_eq!(table.len(), 1);
        assert_eq!(table.cell(0, "date"), Some(&Cell::from("2024-03-09")));
        assert_eq!(table.cell(0, "home_score"), Some(&Cell::Integer(2)));
        assert_eq!(table.cell(0, "result"), Some(&Cell::from("D")));
        assert_eq!(table.key_index(), Some(0));
    }

    #[test]
    fn test_push_row_checks_arity_and_kind() {
        let mut table =
            MatchTable::with_columns(vec![Column::text("match_id"), Column::float("odds_home")])
                .unwrap();
        assert!(table
            .push_row(vec![Some("m1".into()), Some(1.8.into())])
            .is_ok());
        assert_eq!(
            table.push_row(vec![Some("m2".into())]),
            Err(TableError::Arity {
                expected: 2,
                got: 1
            })
        );
        assert!(matches!(
            table.push_row(vec![Some("m3".into()), Some("high".into())]),
            Err(TableError::KindMismatch { .. })
        ));
        assert!(table.push_row(vec![Some("m4".into()), None]).is_ok());
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        let err = MatchTable::with_columns(vec![Column::text("a"), Column::integer("a")]);
        assert_eq!(err, Err(TableError::DuplicateColumn("a".into())));
    }

    #[test]
    fn test_emptiness() {
        assert!(MatchTable::empty().is_empty());
        let no_rows = MatchTable::with_columns(MatchTable::record_columns()).unwrap();
        assert!(no_rows.is_empty());
    }

    #[test]
    fn test_key_requires_text_column() {
        let mut table = MatchTable::with_columns(vec![Column::integer("match_id")]).unwrap();
        table.push_row(vec![Some(Cell::Integer(1))]).unwrap();
        assert_eq!(table.key_index(), None);
        assert!(table.match_ids().is_empty());
    }
}
