use anyhow::{Context, Result};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::data::filter::ResultTable;
use crate::data::model::CellValue;

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// Header row plus one record per result row, values in display form.
pub fn to_csv(result: &ResultTable) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(&result.columns)
        .context("writing CSV header")?;
    for (i, row) in result.rows.iter().enumerate() {
        writer
            .write_record(row.iter().map(|v| v.to_string()))
            .with_context(|| format!("writing CSV row {i}"))?;
    }
    writer.into_inner().context("flushing CSV")
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

/// `{ "key": <cutoff column>, "result": [ { column: value, ... }, ... ] }`
#[derive(Serialize)]
struct JsonExport<'a> {
    key: &'a str,
    result: Vec<JsonRow<'a>>,
}

/// Serialises as an object whose keys keep export column order.
struct JsonRow<'a> {
    columns: &'a [String],
    cells: &'a [CellValue],
}

impl Serialize for JsonRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, cell) in self.columns.iter().zip(self.cells) {
            map.serialize_entry(column, cell)?;
        }
        map.end()
    }
}

pub fn to_json(result: &ResultTable) -> Result<Vec<u8>> {
    let export = JsonExport {
        key: result.cutoff.as_str(),
        result: result
            .rows
            .iter()
            .map(|cells| JsonRow {
                columns: &result.columns,
                cells,
            })
            .collect(),
    };
    serde_json::to_vec_pretty(&export).context("serialising results to JSON")
}
