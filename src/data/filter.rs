use std::collections::BTreeSet;

use thiserror::Error;

use super::columns::{self, CutoffColumn};
use super::model::{CellValue, Schema, Table};
use crate::config::{RANK_WINDOW_ABOVE, RANK_WINDOW_BELOW};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Reasons a submitted query is rejected before any filtering happens.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Please enter a valid numeric rank (digits only), got '{0}'")]
    InvalidRank(String),

    #[error("Unknown cutoff column '{0}'")]
    UnknownCutoffColumn(String),
}

// ---------------------------------------------------------------------------
// Rank and rank window
// ---------------------------------------------------------------------------

/// A validated, non-negative entrance-exam rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rank(u64);

impl Rank {
    /// Accepts a non-empty run of ASCII digits and nothing else: no sign, no
    /// surrounding whitespace, no separators. Ranks too large for `u64`
    /// saturate, which leaves a window no cutoff can reach.
    pub fn parse(input: &str) -> Result<Self, QueryError> {
        if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
            return Err(QueryError::InvalidRank(input.to_string()));
        }
        // Only overflow can fail past the digit check.
        Ok(Rank(input.parse::<u64>().unwrap_or(u64::MAX)))
    }

    pub fn value(self) -> u64 {
        self.0
    }

    pub fn window(self) -> RankWindow {
        RankWindow {
            lower: self.0.saturating_sub(RANK_WINDOW_BELOW),
            upper: self.0.saturating_add(RANK_WINDOW_ABOVE),
        }
    }
}

impl From<u64> for Rank {
    fn from(value: u64) -> Self {
        Rank(value)
    }
}

/// Inclusive range of cutoff ranks considered reachable for a rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankWindow {
    pub lower: u64,
    pub upper: u64,
}

impl RankWindow {
    pub fn contains(&self, cutoff: f64) -> bool {
        cutoff >= self.lower as f64 && cutoff <= self.upper as f64
    }
}

// ---------------------------------------------------------------------------
// Query / result types
// ---------------------------------------------------------------------------

/// One form submission. An empty code set means "no constraint" for that
/// dimension.
#[derive(Debug, Clone)]
pub struct Query {
    pub cutoff: CutoffColumn,
    pub rank: Rank,
    pub branches: BTreeSet<CellValue>,
    pub districts: BTreeSet<CellValue>,
    pub regions: BTreeSet<CellValue>,
    /// Years of establishment.
    pub years: BTreeSet<CellValue>,
}

impl Query {
    pub fn new(cutoff: CutoffColumn, rank: Rank) -> Self {
        Query {
            cutoff,
            rank,
            branches: BTreeSet::new(),
            districts: BTreeSet::new(),
            regions: BTreeSet::new(),
            years: BTreeSet::new(),
        }
    }
}

/// Matching rows projected to the export column order. Rows keep their
/// source order; the cutoff cell holds the coerced number.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    pub cutoff: CutoffColumn,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl ResultTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Matches(ResultTable),
    NoMatches,
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Run a query and classify the outcome.
pub fn run_query(
    table: &Table,
    schema: &Schema,
    query: &Query,
) -> Result<QueryOutcome, QueryError> {
    let result = filter(table, schema, query)?;
    log::info!(
        "Query {} rank {} -> {} match(es)",
        query.cutoff,
        query.rank.value(),
        result.len()
    );
    if result.is_empty() {
        Ok(QueryOutcome::NoMatches)
    } else {
        Ok(QueryOutcome::Matches(result))
    }
}

/// Select the rows of `table` matching `query`.
///
/// The table is only read: the cutoff column is coerced into a per-call list
/// of `(row index, value)` pairs, so concurrent queries cannot observe each
/// other.
pub fn filter(
    table: &Table,
    schema: &Schema,
    query: &Query,
) -> Result<ResultTable, QueryError> {
    let unknown = || QueryError::UnknownCutoffColumn(query.cutoff.to_string());
    let cutoff = schema.cutoff_column(query.cutoff.as_str()).ok_or_else(unknown)?;
    let cutoff_idx = table.column_index(cutoff.as_str()).ok_or_else(unknown)?;

    let mut candidates: Vec<(usize, f64)> = coerce_column(table, cutoff_idx);
    log::debug!("{} rows with a {} cutoff", candidates.len(), cutoff);

    retain_members(table, &mut candidates, columns::BRANCH_CODE, &query.branches);
    retain_members(table, &mut candidates, columns::DIST_CODE, &query.districts);
    if schema.has_region {
        retain_members(table, &mut candidates, columns::REGION_CODE, &query.regions);
    }
    retain_members(table, &mut candidates, columns::YEAR_OF_ESTAB, &query.years);

    let window = query.rank.window();
    candidates.retain(|&(_, v)| window.contains(v));
    log::debug!(
        "{} rows within [{}, {}]",
        candidates.len(),
        window.lower,
        window.upper
    );

    Ok(project(table, cutoff, &candidates))
}

/// Numeric view of one column; rows whose value does not coerce are left out.
fn coerce_column(table: &Table, idx: usize) -> Vec<(usize, f64)> {
    table
        .rows
        .iter()
        .enumerate()
        .filter_map(|(i, row)| row[idx].to_number().map(|v| (i, v)))
        .collect()
}

fn retain_members(
    table: &Table,
    candidates: &mut Vec<(usize, f64)>,
    column: &str,
    selected: &BTreeSet<CellValue>,
) {
    if selected.is_empty() {
        return;
    }
    let Some(idx) = table.column_index(column) else {
        log::warn!("Column '{column}' missing; ignoring its filter");
        return;
    };
    candidates.retain(|&(row, _)| selected.contains(&table.rows[row][idx]));
    log::debug!("{} rows after {column} filter", candidates.len());
}

fn project(table: &Table, cutoff: &CutoffColumn, candidates: &[(usize, f64)]) -> ResultTable {
    let columns = columns::export_columns(cutoff);

    // None marks the cutoff slot, which takes the coerced value.
    let sources: Vec<Option<Option<usize>>> = columns
        .iter()
        .map(|name| {
            if name == cutoff.as_str() {
                return None;
            }
            let idx = table.column_index(name);
            if idx.is_none() {
                log::warn!("Column '{name}' missing; exporting it empty");
            }
            Some(idx)
        })
        .collect();

    let rows = candidates
        .iter()
        .map(|&(row, value)| {
            sources
                .iter()
                .map(|source| match source {
                    None => CellValue::Float(value),
                    Some(Some(idx)) => table.rows[row][*idx].clone(),
                    Some(None) => CellValue::Null,
                })
                .collect()
        })
        .collect();

    ResultTable {
        cutoff: cutoff.clone(),
        columns,
        rows,
    }
}
