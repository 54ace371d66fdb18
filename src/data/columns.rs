use std::fmt;

// ---------------------------------------------------------------------------
// Well-known column labels
// ---------------------------------------------------------------------------

pub const INST_CODE: &str = "Inst Code";
pub const INSTITUTE_NAME: &str = "Institute Name";
pub const BRANCH_CODE: &str = "Branch Code";
pub const BRANCH_NAME: &str = "Branch Name";
pub const DIST_CODE: &str = "Dist Code";
pub const PLACE: &str = "Place";
pub const COLLEGE_TYPE: &str = "College Type";
pub const CO_EDUCATION: &str = "Co Education";
pub const YEAR_OF_ESTAB: &str = "Year of Estab";
pub const AFFILIATED_TO: &str = "Affiliated To";
/// Spelled as in the published sheets.
pub const TUITION_FEE: &str = "Tution Fee";
/// Optional region column.
pub const REGION_CODE: &str = "A_REG";

/// Export columns placed before the selected cutoff column.
pub const LEADING_EXPORT_COLUMNS: [&str; 10] = [
    INST_CODE,
    INSTITUTE_NAME,
    BRANCH_CODE,
    BRANCH_NAME,
    DIST_CODE,
    PLACE,
    COLLEGE_TYPE,
    CO_EDUCATION,
    YEAR_OF_ESTAB,
    AFFILIATED_TO,
];

/// Export columns placed after the selected cutoff column.
pub const TRAILING_EXPORT_COLUMNS: [&str; 1] = [TUITION_FEE];

const CUTOFF_MARKERS: [&str; 2] = ["_BOYS", "_GIRLS"];

// ---------------------------------------------------------------------------
// CutoffColumn – a category+gender rank series
// ---------------------------------------------------------------------------

/// Label of a column holding cutoff ranks for one category+gender pair,
/// e.g. `OC_BOYS`. Only produced by [`classify_cutoff_columns`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CutoffColumn(String);

impl CutoffColumn {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CutoffColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether a label names a cutoff-rank series.
pub fn is_cutoff_label(label: &str) -> bool {
    CUTOFF_MARKERS.iter().any(|m| label.contains(m))
}

/// Pick out the cutoff columns from a table's labels, keeping table order.
pub fn classify_cutoff_columns(labels: &[String]) -> Vec<CutoffColumn> {
    labels
        .iter()
        .filter(|l| is_cutoff_label(l))
        .map(|l| CutoffColumn(l.clone()))
        .collect()
}

/// Full export column order for a given cutoff column.
pub fn export_columns(cutoff: &CutoffColumn) -> Vec<String> {
    LEADING_EXPORT_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(std::iter::once(cutoff.as_str().to_string()))
        .chain(TRAILING_EXPORT_COLUMNS.iter().map(|c| c.to_string()))
        .collect()
}

#[cfg(test)]
pub(crate) fn cutoff_column_for_tests(label: &str) -> CutoffColumn {
    CutoffColumn(label.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn keeps_boys_and_girls_columns_in_table_order() {
        let found = classify_cutoff_columns(&labels(&[
            "Inst Code",
            "OC_GIRLS",
            "Branch Code",
            "OC_BOYS",
            "BC_A_BOYS",
            "Tution Fee",
        ]));
        let names: Vec<&str> = found.iter().map(|c| c.as_str()).collect();
        assert_eq!(names, vec!["OC_GIRLS", "OC_BOYS", "BC_A_BOYS"]);
    }

    #[test]
    fn markers_are_case_sensitive_substrings() {
        assert!(is_cutoff_label("EWS_GEN_OU_BOYS"));
        assert!(is_cutoff_label("ST_GIRLS_EXTRA"));
        assert!(!is_cutoff_label("oc_boys"));
        assert!(!is_cutoff_label("BOYS"));
    }

    #[test]
    fn export_order_puts_cutoff_before_fee() {
        let cols = export_columns(&cutoff_column_for_tests("SC_BOYS"));
        assert_eq!(cols.len(), 12);
        assert_eq!(cols[0], INST_CODE);
        assert_eq!(cols[9], AFFILIATED_TO);
        assert_eq!(cols[10], "SC_BOYS");
        assert_eq!(cols[11], TUITION_FEE);
    }
}
