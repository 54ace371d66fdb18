use anyhow::Result;

use crate::config::{
    EXPORT_CSV_FILE_NAME, EXPORT_JSON_FILE_NAME, EXPORT_PDF_FILE_NAME, EXPORT_PDF_MIME,
};
use crate::data::filter::ResultTable;

/// Helvetica and Helvetica-Bold advance widths (Adobe AFM, per 1000 em) for
/// printable ASCII, plus WinAnsi encoding. Other characters measure as a digit.
pub mod metrics;
/// Paginated PDF report. [`pdf::layout`] places cells on A4 landscape pages
/// (millimetres, origin top-left) and [`pdf::write_pdf`] turns them into a
/// document with `lopdf`. The header row is drawn on the first page only.
pub mod pdf;
pub mod tabular;

/// The document kinds a result table can be saved as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Pdf,
    Csv,
    Json,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Pdf, ExportFormat::Csv, ExportFormat::Json];

    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "PDF",
            ExportFormat::Csv => "CSV",
            ExportFormat::Json => "JSON",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            ExportFormat::Pdf => EXPORT_PDF_FILE_NAME,
            ExportFormat::Csv => EXPORT_CSV_FILE_NAME,
            ExportFormat::Json => EXPORT_JSON_FILE_NAME,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Pdf => EXPORT_PDF_MIME,
            ExportFormat::Csv => "text/csv",
            ExportFormat::Json => "application/json",
        }
    }

    pub fn render(self, result: &ResultTable) -> Result<Vec<u8>> {
        match self {
            ExportFormat::Pdf => pdf::render_pdf(result),
            ExportFormat::Csv => tabular::to_csv(result),
            ExportFormat::Json => tabular::to_json(result),
        }
    }
}
