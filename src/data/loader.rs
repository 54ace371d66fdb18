use std::path::Path;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use calamine::{open_workbook_auto, Data, Reader};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::model::{CellValue, Dataset, Table};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a cutoff table and derive its schema.
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let table = load_file(path).with_context(|| format!("loading {}", path.display()))?;
    let dataset = Dataset::new(table);
    log::info!(
        "Loaded {} rows, {} columns, {} cutoff columns (region column: {})",
        dataset.table.len(),
        dataset.table.columns.len(),
        dataset.schema.cutoff_columns.len(),
        dataset.schema.has_region
    );
    Ok(dataset)
}

/// Load a cutoff table from a file.  Dispatch by extension.
///
/// Every format yields the same raw layout: a placeholder header row, a row
/// of real column labels, then data (see [`Table::from_raw_rows`]).
///
/// Supported formats:
/// * `.xlsx` / `.xlsm` / `.xlsb` / `.xls` / `.ods` – first worksheet
/// * `.csv`     – comma separated, first line is the placeholder header
/// * `.parquet` – field names are the placeholder header, first record the labels
pub fn load_file(path: &Path) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let raw_rows = match ext.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_spreadsheet(path)?,
        "csv" => read_csv(path)?,
        "parquet" | "pq" => read_parquet(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };

    Ok(Table::from_raw_rows(raw_rows))
}

// ---------------------------------------------------------------------------
// Spreadsheet loader
// ---------------------------------------------------------------------------

fn read_spreadsheet(path: &Path) -> Result<Vec<Vec<CellValue>>> {
    let mut workbook = open_workbook_auto(path).context("opening workbook")?;
    let range = workbook
        .worksheet_range_at(0)
        .context("workbook has no worksheets")?
        .context("reading first worksheet")?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(spreadsheet_cell).collect())
        .collect())
}

fn spreadsheet_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) if s.is_empty() => CellValue::Null,
        Data::String(s) => CellValue::String(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::Float(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Date(s.clone()),
        Data::Error(_) | Data::Empty => CellValue::Null,
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Read every line as a record; the placeholder header is just the first one.
fn read_csv(path: &Path) -> Result<Vec<Vec<CellValue>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context("opening CSV")?;

    reader
        .records()
        .enumerate()
        .map(|(row_no, result)| {
            let record = result.with_context(|| format!("CSV row {row_no}"))?;
            Ok(record.iter().map(guess_cell_type).collect())
        })
        .collect()
}

fn guess_cell_type(s: &str) -> CellValue {
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file laid out like the spreadsheet export: the schema's
/// field names play the role of the placeholder header and the first record
/// carries the real labels, so label-bearing columns are usually Utf8.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn read_parquet(path: &Path) -> Result<Vec<Vec<CellValue>>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;

    let placeholder: Vec<CellValue> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| CellValue::String(f.name().clone()))
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut raw_rows = vec![placeholder];
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            raw_rows.push(
                batch
                    .columns()
                    .iter()
                    .map(|col| arrow_cell(col, row))
                    .collect(),
            );
        }
    }
    Ok(raw_rows)
}

/// Extract a single cell from an Arrow column at a given row.
fn arrow_cell(col: &ArrayRef, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => CellValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => CellValue::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => CellValue::Float(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        other => arrow::util::display::array_value_to_string(col, row)
            .map(CellValue::String)
            .unwrap_or_else(|_| CellValue::String(format!("{other:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema as ArrowSchema};
    use arrow::record_batch::RecordBatch;
    use calamine::{CellErrorType, ExcelDateTime, ExcelDateTimeType};
    use parquet::arrow::ArrowWriter;
    use rust_xlsxwriter::Workbook;

    use super::*;

    const SAMPLE_CSV: &str = "\
Unnamed: 0,Unnamed: 1,Unnamed: 2,Unnamed: 3,Unnamed: 4
 Inst Code ,Branch Code,Dist Code,OC_BOYS,OC_GIRLS
ABCD, CSE ,HYD,31000,
WXYZ,12,WGL,NA,4500
";

    fn temp_file(suffix: &str, contents: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn csv_promotes_second_line_to_labels() {
        let file = temp_file(".csv", SAMPLE_CSV.as_bytes());
        let table = load_file(file.path()).unwrap();

        assert_eq!(
            table.columns,
            vec!["Inst Code", "Branch Code", "Dist Code", "OC_BOYS", "OC_GIRLS"]
        );
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0][1], CellValue::String("CSE".into()));
        assert_eq!(table.rows[1][1], CellValue::String("12".into()));
        assert_eq!(table.rows[0][3], CellValue::Integer(31000));
        assert_eq!(table.rows[0][4], CellValue::Null);
        assert_eq!(table.rows[1][3], CellValue::String("NA".into()));
    }

    #[test]
    fn loading_twice_gives_identical_tables() {
        let file = temp_file(".csv", SAMPLE_CSV.as_bytes());
        assert_eq!(load_file(file.path()).unwrap(), load_file(file.path()).unwrap());
    }

    #[test]
    fn dataset_carries_schema() {
        let file = temp_file(".CSV", SAMPLE_CSV.as_bytes());
        let dataset = load_dataset(file.path()).unwrap();
        let keys: Vec<&str> = dataset
            .schema
            .cutoff_columns
            .iter()
            .map(|c| c.as_str())
            .collect();
        assert_eq!(keys, vec!["OC_BOYS", "OC_GIRLS"]);
        assert!(!dataset.schema.has_region);
        assert_eq!(dataset.schema.district_codes.len(), 2);
    }

    #[test]
    fn parquet_uses_first_record_as_labels() {
        let schema = Arc::new(ArrowSchema::new(vec![
            Field::new("Unnamed: 0", DataType::Utf8, true),
            Field::new("Unnamed: 1", DataType::Utf8, true),
            Field::new("Unnamed: 2", DataType::Int64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec![Some("Branch Code"), Some("CSE ")])),
                Arc::new(StringArray::from(vec![Some("ST_GIRLS"), None])),
                Arc::new(Int64Array::from(vec![Some(0), Some(77)])),
            ],
        )
        .unwrap();

        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(file.reopen().unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = load_file(file.path()).unwrap();
        assert_eq!(table.columns, vec!["Branch Code", "ST_GIRLS", "0"]);
        assert_eq!(
            table.rows,
            vec![vec![
                CellValue::String("CSE".into()),
                CellValue::Null,
                CellValue::Integer(77),
            ]]
        );
    }

    #[test]
    fn spreadsheet_cells_map_to_cell_values() {
        let date = ExcelDateTime::new(45292.5, ExcelDateTimeType::DateTime, false);
        let cases = [
            (Data::Int(7), CellValue::Integer(7)),
            (Data::Float(4500.5), CellValue::Float(4500.5)),
            (Data::String(String::new()), CellValue::Null),
            (Data::String(" CSE ".into()), CellValue::String(" CSE ".into())),
            (Data::Bool(true), CellValue::Bool(true)),
            (Data::DateTime(date), CellValue::Float(45292.5)),
            (
                Data::DateTimeIso("2024-07-01T00:00:00".into()),
                CellValue::Date("2024-07-01T00:00:00".into()),
            ),
            (Data::DurationIso("PT1H".into()), CellValue::Date("PT1H".into())),
            (Data::Error(CellErrorType::Div0), CellValue::Null),
            (Data::Empty, CellValue::Null),
        ];
        for (cell, expected) in cases {
            assert_eq!(spreadsheet_cell(&cell), expected, "{cell:?}");
        }
    }

    #[test]
    fn xlsx_promotes_second_row_and_trims_branch_codes() {
        let file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        let labels = [" Inst Code ", "Branch Code", "Dist Code", "OC_BOYS", "OC_GIRLS"];
        for (col, label) in labels.iter().enumerate() {
            sheet.write_string(0, col as u16, format!("Unnamed: {col}")).unwrap();
            sheet.write_string(1, col as u16, *label).unwrap();
        }
        sheet.write_string(2, 0, "ABCD").unwrap();
        sheet.write_string(2, 1, " CSE ").unwrap();
        sheet.write_string(2, 2, "HYD").unwrap();
        sheet.write_number(2, 3, 31000.0).unwrap();
        sheet.write_string(3, 0, "WXYZ").unwrap();
        sheet.write_number(3, 1, 12.0).unwrap();
        sheet.write_string(3, 2, "WGL").unwrap();
        sheet.write_string(3, 3, "NA").unwrap();
        sheet.write_number(3, 4, 4500.0).unwrap();
        workbook.save(file.path()).unwrap();

        let table = load_file(file.path()).unwrap();
        assert_eq!(
            table.columns,
            vec!["Inst Code", "Branch Code", "Dist Code", "OC_BOYS", "OC_GIRLS"]
        );
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0][1], CellValue::String("CSE".into()));
        assert_eq!(table.rows[1][1], CellValue::String("12".into()));
        assert_eq!(table.rows[0][3].to_number(), Some(31000.0));
        assert_eq!(table.rows[0][4], CellValue::Null);
        assert_eq!(table.rows[1][3], CellValue::String("NA".into()));

        let dataset = load_dataset(file.path()).unwrap();
        assert_eq!(dataset.schema.cutoff_columns.len(), 2);
    }

    #[test]
    fn unknown_extension_is_an_error() {
        let file = temp_file(".txt", b"a,b\n");
        let err = load_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Unsupported file extension"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = load_dataset(Path::new("does-not-exist.xlsx")).unwrap_err();
        assert!(format!("{err:#}").contains("does-not-exist.xlsx"));
    }
}
