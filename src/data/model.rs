use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use serde::{Serialize, Serializer};

use super::columns::{self, CutoffColumn};

// ---------------------------------------------------------------------------
// CellValue – a single cell of the cutoff table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value, as read from a spreadsheet, CSV or Parquet.
/// Filter selections live in `BTreeSet`s, so `CellValue` must be `Ord`.
#[derive(Debug, Clone)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// ISO-8601 date string kept as text.
    Date(String),
    Null,
}

// -- Manual Eq/Ord so CellValue can key BTreeSet; floats use total ordering --

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
                Date(_) => 5,
            }
        }
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) | (Date(a), Date(b)) => a.cmp(b),
            _ => discriminant(self).cmp(&discriminant(other)),
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::String(s) | CellValue::Date(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Null => {}
        }
    }
}

/// Missing cells print as nothing; whole floats print without a fraction
/// (spreadsheets hand back `1998.0` for a year typed as `1998`).
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 => {
                write!(f, "{}", *v as i64)
            }
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Date(d) => write!(f, "{d}"),
            CellValue::Null => Ok(()),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::String(s) | CellValue::Date(s) => serializer.serialize_str(s),
            CellValue::Integer(i) => serializer.serialize_i64(*i),
            CellValue::Float(v) if v.is_finite() => serializer.serialize_f64(*v),
            CellValue::Float(_) | CellValue::Null => serializer.serialize_none(),
            CellValue::Bool(b) => serializer.serialize_bool(*b),
        }
    }
}

impl CellValue {
    /// Numeric coercion used for cutoff columns. Numbers pass through, text is
    /// trimmed and parsed, everything else (and NaN) is absent.
    pub fn to_number(&self) -> Option<f64> {
        let v = match self {
            CellValue::Integer(i) => *i as f64,
            CellValue::Float(v) => *v,
            CellValue::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        (!v.is_nan()).then_some(v)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Text form with surrounding whitespace removed; `Null` stays `Null`.
    pub fn to_trimmed_text(&self) -> CellValue {
        match self {
            CellValue::Null => CellValue::Null,
            other => CellValue::String(other.to_string().trim().to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Table – the loaded cutoff dataset
// ---------------------------------------------------------------------------

/// The dataset after header promotion. Every row holds exactly
/// `columns.len()` cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    /// Build a table from raw source rows.
    ///
    /// Raw row 0 is a placeholder header and is discarded, raw row 1 supplies
    /// the (whitespace-stripped) column labels, everything after is data.
    /// Branch codes are normalised to trimmed text. No further validation:
    /// a source without this layout simply produces an odd-looking table.
    pub fn from_raw_rows<I>(raw_rows: I) -> Self
    where
        I: IntoIterator<Item = Vec<CellValue>>,
    {
        let mut raw = raw_rows.into_iter().skip(1);

        let columns: Vec<String> = raw
            .next()
            .unwrap_or_default()
            .iter()
            .map(|label| label.to_string().trim().to_string())
            .collect();

        let branch_idx = columns.iter().position(|c| c == columns::BRANCH_CODE);
        let width = columns.len();

        let rows = raw
            .map(|mut row| {
                row.resize(width, CellValue::Null);
                if let Some(idx) = branch_idx {
                    row[idx] = row[idx].to_trimmed_text();
                }
                row
            })
            .collect();

        Table { columns, rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Sorted distinct non-null values of a column (empty if it doesn't exist).
    pub fn unique_values(&self, name: &str) -> BTreeSet<CellValue> {
        let Some(idx) = self.column_index(name) else {
            return BTreeSet::new();
        };
        self.rows
            .iter()
            .map(|row| &row[idx])
            .filter(|v| !v.is_null())
            .cloned()
            .collect()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Schema – facts derived once per loaded table
// ---------------------------------------------------------------------------

/// Column-level facts computed at load time and never recomputed per query.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    /// Category+gender cutoff columns, in table order.
    pub cutoff_columns: Vec<CutoffColumn>,
    /// Whether the optional region column exists (and region filtering applies).
    pub has_region: bool,
    pub branch_codes: BTreeSet<CellValue>,
    pub district_codes: BTreeSet<CellValue>,
    pub region_codes: BTreeSet<CellValue>,
    pub year_codes: BTreeSet<CellValue>,
}

impl Schema {
    pub fn from_table(table: &Table) -> Self {
        let has_region = table.column_index(columns::REGION_CODE).is_some();
        Schema {
            cutoff_columns: columns::classify_cutoff_columns(&table.columns),
            has_region,
            branch_codes: table.unique_values(columns::BRANCH_CODE),
            district_codes: table.unique_values(columns::DIST_CODE),
            region_codes: if has_region {
                table.unique_values(columns::REGION_CODE)
            } else {
                BTreeSet::new()
            },
            year_codes: table.unique_values(columns::YEAR_OF_ESTAB),
        }
    }

    pub fn cutoff_column(&self, key: &str) -> Option<&CutoffColumn> {
        self.cutoff_columns.iter().find(|c| c.as_str() == key)
    }
}

// ---------------------------------------------------------------------------
// Dataset – table plus schema, as held by the application
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Dataset {
    pub table: Table,
    pub schema: Schema,
}

impl Dataset {
    pub fn new(table: Table) -> Self {
        let schema = Schema::from_table(&table);
        Dataset { table, schema }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> CellValue {
        CellValue::String(v.to_string())
    }

    #[test]
    fn first_raw_row_is_dropped_and_second_becomes_labels() {
        let table = Table::from_raw_rows(vec![
            vec![s("Unnamed: 0"), s("Unnamed: 1")],
            vec![s("  Inst Code "), s("OC_BOYS\n")],
            vec![s("ABCD"), CellValue::Integer(1200)],
        ]);
        assert_eq!(table.columns, vec!["Inst Code", "OC_BOYS"]);
        assert_eq!(table.rows, vec![vec![s("ABCD"), CellValue::Integer(1200)]]);
    }

    #[test]
    fn branch_codes_become_trimmed_text() {
        let table = Table::from_raw_rows(vec![
            vec![],
            vec![s("Branch Code")],
            vec![s(" CSE ")],
            vec![CellValue::Float(12.0)],
            vec![CellValue::Null],
        ]);
        assert_eq!(
            table.rows,
            vec![vec![s("CSE")], vec![s("12")], vec![CellValue::Null]]
        );
    }

    #[test]
    fn short_rows_are_padded_and_long_rows_cut() {
        let table = Table::from_raw_rows(vec![
            vec![],
            vec![s("a"), s("b")],
            vec![s("1")],
            vec![s("1"), s("2"), s("3")],
        ]);
        assert!(table.rows.iter().all(|r| r.len() == 2));
        assert_eq!(table.rows[0][1], CellValue::Null);
    }

    #[test]
    fn header_only_sources_give_an_empty_table() {
        assert!(Table::from_raw_rows(Vec::new()).columns.is_empty());
        let table = Table::from_raw_rows(vec![vec![s("x")], vec![s("Inst Code")]]);
        assert_eq!(table.columns, vec!["Inst Code"]);
        assert!(table.is_empty());
    }

    #[test]
    fn numeric_coercion() {
        assert_eq!(s(" 31000 ").to_number(), Some(31000.0));
        assert_eq!(CellValue::Integer(7).to_number(), Some(7.0));
        assert_eq!(s("NA").to_number(), None);
        assert_eq!(s("").to_number(), None);
        assert_eq!(CellValue::Float(f64::NAN).to_number(), None);
        assert_eq!(CellValue::Null.to_number(), None);
    }

    #[test]
    fn display_hides_nulls_and_whole_float_fractions() {
        assert_eq!(CellValue::Null.to_string(), "");
        assert_eq!(CellValue::Float(1998.0).to_string(), "1998");
        assert_eq!(CellValue::Float(2.5).to_string(), "2.5");
    }

    #[test]
    fn schema_flags_region_support() {
        let with_region = Table::from_raw_rows(vec![
            vec![],
            vec![s("Branch Code"), s("A_REG"), s("SC_GIRLS")],
            vec![s("CSE"), s("OU"), s("100")],
            vec![s("ECE"), CellValue::Null, s("200")],
        ]);
        let schema = Schema::from_table(&with_region);
        assert!(schema.has_region);
        assert_eq!(schema.region_codes.len(), 1);
        assert_eq!(schema.branch_codes.len(), 2);
        assert_eq!(schema.cutoff_columns.len(), 1);

        let without = Table::from_raw_rows(vec![vec![], vec![s("Branch Code")]]);
        let schema = Schema::from_table(&without);
        assert!(!schema.has_region);
        assert!(schema.region_codes.is_empty());
    }
}
