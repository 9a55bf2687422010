//! Full outer join of per-source match tables on `match_id`.
//!
//! The left table keeps its column names. A non-key column of the right
//! table whose name is already taken gets a `_dup` suffix (`_dup2`, `_dup3`
//! and so on when the suffixed name is taken as well). Output rows are
//! ordered by key, rows without a key last, and duplicate keys produce one
//! row per matching pair.

use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use super::table::{Cell, Column, MatchTable, Row};

pub const DUP_SUFFIX: &str = "_dup";

/// Result of folding several source tables together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Merged {
    pub table: MatchTable,
    /// Sources that contributed to `table`, in merge order.
    pub merged: Vec<String>,
    /// Non-empty sources left out because one side had no `match_id`.
    pub dropped: Vec<String>,
}

/// Merge tables in the order given. The first non-empty table is the base;
/// empty tables are skipped.
pub fn merge_all<I>(sources: I) -> Merged
where
    I: IntoIterator<Item = (String, MatchTable)>,
{
    let mut out = Merged::default();
    let mut base: Option<MatchTable> = None;

    for (name, table) in sources {
        if table.is_empty() {
            continue;
        }
        match base.take() {
            None => {
                base = Some(table);
                out.merged.push(name);
            }
            Some(current) => match outer_join(&current, &table) {
                Some(joined) => {
                    debug!(
                        "Joined {} rows from '{}' into {} rows",
                        table.len(),
                        name,
                        joined.len()
                    );
                    base = Some(joined);
                    out.merged.push(name);
                }
                None => {
                    warn!(
                        "Dropping {} rows from '{}': no shared match_id key to merge on",
                        table.len(),
                        name
                    );
                    base = Some(current);
                    out.dropped.push(name);
                }
            },
        }
    }

    out.table = base.unwrap_or_default();
    out
}

/// Outer-join `right` onto `left` by `match_id`. Returns `None` when either
/// table lacks the key column.
pub fn outer_join(left: &MatchTable, right: &MatchTable) -> Option<MatchTable> {
    let lk = left.key_index()?;
    let rk = right.key_index()?;

    let mut columns: Vec<Column> = left.columns().to_vec();
    let mut taken: HashSet<String> = columns.iter().map(|c| c.name.clone()).collect();
    let right_cols: Vec<usize> = (0..right.columns().len()).filter(|&i| i != rk).collect();
    for &i in &right_cols {
        let col = &right.columns()[i];
        let name = unique_name(&col.name, &taken);
        taken.insert(name.clone());
        columns.push(Column::new(name, col.kind));
    }

    let mut right_by_key: HashMap<&str, Vec<usize>> = HashMap::new();
    for (idx, row) in right.rows().iter().enumerate() {
        if let Some(key) = key_of(row, rk) {
            right_by_key.entry(key).or_default().push(idx);
        }
    }

    let right_width = right_cols.len();
    let mut right_used = vec![false; right.len()];
    let mut rows: Vec<Row> = Vec::with_capacity(left.len().max(right.len()));

    for lrow in left.rows() {
        let matches = key_of(lrow, lk).and_then(|k| right_by_key.get(k));
        match matches {
            Some(indices) => {
                for &ri in indices {
                    right_used[ri] = true;
                    let mut row = lrow.clone();
                    row.extend(right_cols.iter().map(|&c| right.rows()[ri][c].clone()));
                    rows.push(row);
                }
            }
            None => {
                let mut row = lrow.clone();
                row.extend(std::iter::repeat(None).take(right_width));
                rows.push(row);
            }
        }
    }

    for (ri, rrow) in right.rows().iter().enumerate() {
        if right_used[ri] {
            continue;
        }
        let mut row: Row = vec![None; left.columns().len()];
        row[lk] = rrow[rk].clone();
        row.extend(right_cols.iter().map(|&c| rrow[c].clone()));
        rows.push(row);
    }

    rows.sort_by(|a, b| match (key_of(a, lk), key_of(b, lk)) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    Some(MatchTable::from_parts(columns, rows))
}

fn key_of(row: &Row, idx: usize) -> Option<&str> {
    row.get(idx)?.as_ref().and_then(Cell::as_text)
}

fn unique_name(name: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(name) {
        return name.to_string();
    }
    let mut candidate = format!("{}{}", name, DUP_SUFFIX);
    let mut n = 2;
    while taken.contains(&candidate) {
        candidate = format!("{}{}{}", name, DUP_SUFFIX, n);
        n += 1;
    }
    candidate
}
