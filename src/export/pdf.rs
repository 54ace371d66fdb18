use anyhow::{Context, Result};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};

use super::metrics::{encode_win_ansi, Font, MM_PER_PT};
use crate::config::{
    BODY_CELL_KEEP_CHARS, BODY_CELL_MAX_CHARS, HEADER_CELL_MAX_CHARS, REPORT_DISCLAIMER,
    REPORT_TITLE,
};
use crate::data::columns::{self, CutoffColumn};
use crate::data::filter::ResultTable;

pub const PAGE_WIDTH_MM: f32 = 297.0;
pub const PAGE_HEIGHT_MM: f32 = 210.0;
pub const MARGIN_MM: f32 = 10.0;
/// Distance from the bottom edge below which nothing is placed.
pub const PAGE_BREAK_MARGIN_MM: f32 = 10.0;
/// Horizontal inset of left-aligned text inside its cell.
const CELL_PADDING_MM: f32 = 1.0;
const BORDER_WIDTH_MM: f32 = 0.2;

const TITLE_SIZE: f32 = 14.0;
const TITLE_HEIGHT_MM: f32 = 10.0;
const NOTE_SIZE: f32 = 8.0;
const NOTE_LINE_HEIGHT_MM: f32 = 5.0;
pub const HEADER_SIZE: f32 = 8.0;
pub const BODY_SIZE: f32 = 7.0;
pub const ROW_HEIGHT_MM: f32 = 6.0;

pub const CUTOFF_COLUMN_WIDTH_MM: f32 = 25.0;
pub const DEFAULT_COLUMN_WIDTH_MM: f32 = 25.0;

// ---------------------------------------------------------------------------
// Layout model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// One placed text box, optionally bordered. Text is clipped to the box.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub rect: Rect,
    pub text: String,
    pub font: Font,
    pub size: f32,
    pub align: Align,
    pub border: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub pages: Vec<Page>,
}

// ---------------------------------------------------------------------------
// Text policy
// ---------------------------------------------------------------------------

/// Header labels keep their first 30 characters.
pub fn truncate_header(label: &str) -> String {
    label.chars().take(HEADER_CELL_MAX_CHARS).collect()
}

/// Body values over 50 characters are cut to 47 plus `...`.
pub fn truncate_body(text: &str) -> String {
    if text.chars().count() > BODY_CELL_MAX_CHARS {
        let mut cut: String = text.chars().take(BODY_CELL_KEEP_CHARS).collect();
        cut.push_str("...");
        cut
    } else {
        text.to_string()
    }
}

/// Width of a column before fitting to the page.
pub fn column_width_mm(column: &str, cutoff: &CutoffColumn) -> f32 {
    match column {
        columns::INST_CODE => 20.0,
        columns::INSTITUTE_NAME => 60.0,
        columns::BRANCH_CODE => 20.0,
        columns::BRANCH_NAME => 40.0,
        columns::DIST_CODE => 25.0,
        columns::PLACE => 25.0,
        columns::COLLEGE_TYPE => 25.0,
        columns::CO_EDUCATION => 20.0,
        columns::YEAR_OF_ESTAB => 20.0,
        columns::AFFILIATED_TO => 25.0,
        columns::TUITION_FEE => 20.0,
        c if c == cutoff.as_str() => CUTOFF_COLUMN_WIDTH_MM,
        _ => DEFAULT_COLUMN_WIDTH_MM,
    }
}

/// Lookup widths, scaled down by one common factor when their sum exceeds
/// the printable width. Proportions between columns are kept.
fn fitted_widths(result: &ResultTable) -> Vec<f32> {
    let widths: Vec<f32> = result
        .columns
        .iter()
        .map(|c| column_width_mm(c, &result.cutoff))
        .collect();
    let printable = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
    let total: f32 = widths.iter().sum();
    if total <= printable {
        return widths;
    }
    widths.iter().map(|w| w * printable / total).collect()
}

// ---------------------------------------------------------------------------
// Canvas – cursor-based placement with automatic page breaks
// ---------------------------------------------------------------------------

struct Canvas {
    pages: Vec<Page>,
    y: f32,
}

impl Canvas {
    fn new() -> Self {
        Canvas {
            pages: vec![Page::default()],
            y: MARGIN_MM,
        }
    }

    fn page_break_y() -> f32 {
        PAGE_HEIGHT_MM - PAGE_BREAK_MARGIN_MM
    }

    /// Start a new page if a line of height `h` would cross the break line.
    /// A fresh page always accepts the line.
    fn ensure_room(&mut self, h: f32) {
        if self.y + h > Self::page_break_y() && self.y > MARGIN_MM {
            self.pages.push(Page::default());
            self.y = MARGIN_MM;
        }
    }

    fn ln(&mut self, h: f32) {
        self.y += h;
    }

    /// Place one line of cells side by side, then move below it.
    fn line(&mut self, h: f32, cells: impl IntoIterator<Item = (f32, String)>, style: CellStyle) {
        self.ensure_room(h);
        let mut x = MARGIN_MM;
        let y = self.y;
        if let Some(page) = self.pages.last_mut() {
            for (w, text) in cells {
                page.cells.push(Cell {
                    rect: Rect { x, y, w, h },
                    text,
                    font: style.font,
                    size: style.size,
                    align: style.align,
                    border: style.border,
                });
                x += w;
            }
        }
        self.ln(h);
    }

    /// Word-wrapped paragraph across the printable width.
    fn paragraph(&mut self, h: f32, text: &str, style: CellStyle) {
        let width = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
        for line in wrap_words(text, width - 2.0 * CELL_PADDING_MM, style.font, style.size) {
            self.line(h, [(width, line)], style);
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct CellStyle {
    font: Font,
    size: f32,
    align: Align,
    border: bool,
}

/// Greedy word wrap. A single word wider than the line gets a line of its own.
fn wrap_words(text: &str, max_width: f32, font: Font, size: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if !current.is_empty() && font.text_width_mm(&candidate, size) > max_width {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Place the title band, disclaimer, header row and one row per result row.
pub fn layout(result: &ResultTable) -> Layout {
    let widths = fitted_widths(result);
    let mut canvas = Canvas::new();

    let full_width = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
    canvas.line(
        TITLE_HEIGHT_MM,
        [(full_width, REPORT_TITLE.to_string())],
        CellStyle {
            font: Font::Bold,
            size: TITLE_SIZE,
            align: Align::Center,
            border: false,
        },
    );
    canvas.ln(3.0);

    canvas.paragraph(
        NOTE_LINE_HEIGHT_MM,
        REPORT_DISCLAIMER,
        CellStyle {
            font: Font::Regular,
            size: NOTE_SIZE,
            align: Align::Left,
            border: false,
        },
    );
    canvas.ln(4.0);

    canvas.line(
        ROW_HEIGHT_MM,
        widths
            .iter()
            .zip(&result.columns)
            .map(|(&w, label)| (w, truncate_header(label))),
        CellStyle {
            font: Font::Bold,
            size: HEADER_SIZE,
            align: Align::Center,
            border: true,
        },
    );

    let body = CellStyle {
        font: Font::Regular,
        size: BODY_SIZE,
        align: Align::Center,
        border: true,
    };
    for row in &result.rows {
        canvas.line(
            ROW_HEIGHT_MM,
            widths
                .iter()
                .zip(row)
                .map(|(&w, value)| (w, truncate_body(&value.to_string()))),
            body,
        );
    }

    Layout { pages: canvas.pages }
}

/// Render a result table to PDF bytes, ready to save or stream.
pub fn render_pdf(result: &ResultTable) -> Result<Vec<u8>> {
    let layout = layout(result);
    log::info!(
        "Rendering {} result rows on {} page(s)",
        result.len(),
        layout.pages.len()
    );
    write_pdf(&layout)
}

// ---------------------------------------------------------------------------
// PDF serialisation
// ---------------------------------------------------------------------------

fn pt(mm: f32) -> f32 {
    mm / MM_PER_PT
}

/// PDF user space has its origin bottom-left; the layout's is top-left.
fn rect_operands(rect: &Rect) -> Vec<Object> {
    vec![
        pt(rect.x).into(),
        pt(PAGE_HEIGHT_MM - rect.y - rect.h).into(),
        pt(rect.w).into(),
        pt(rect.h).into(),
    ]
}

fn cell_operations(cell: &Cell, ops: &mut Vec<Operation>) {
    if cell.border {
        ops.push(Operation::new("re", rect_operands(&cell.rect)));
        ops.push(Operation::new("S", vec![]));
    }
    if cell.text.is_empty() {
        return;
    }

    let text_width = cell.font.text_width_mm(&cell.text, cell.size);
    let dx = match cell.align {
        Align::Left => CELL_PADDING_MM,
        Align::Center => (cell.rect.w - text_width) / 2.0,
    };
    let baseline = cell.rect.y + 0.5 * cell.rect.h + 0.3 * cell.size * MM_PER_PT;

    ops.push(Operation::new("q", vec![]));
    ops.push(Operation::new("re", rect_operands(&cell.rect)));
    ops.push(Operation::new("W", vec![]));
    ops.push(Operation::new("n", vec![]));
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new(
        "Tf",
        vec![cell.font.resource_name().into(), cell.size.into()],
    ));
    ops.push(Operation::new(
        "Td",
        vec![
            pt(cell.rect.x + dx).into(),
            pt(PAGE_HEIGHT_MM - baseline).into(),
        ],
    ));
    ops.push(Operation::new(
        "Tj",
        vec![Object::String(encode_win_ansi(&cell.text), StringFormat::Literal)],
    ));
    ops.push(Operation::new("ET", vec![]));
    ops.push(Operation::new("Q", vec![]));
}

fn font_dictionary(font: Font) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => font.base_font(),
        "Encoding" => "WinAnsiEncoding",
    }
}

/// Serialise a layout; one PDF page per layout page.
pub fn write_pdf(layout: &Layout) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let regular_id = doc.add_object(font_dictionary(Font::Regular));
    let bold_id = doc.add_object(font_dictionary(Font::Bold));
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            Font::Regular.resource_name() => regular_id,
            Font::Bold.resource_name() => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(layout.pages.len());
    for (page_no, page) in layout.pages.iter().enumerate() {
        let mut operations = vec![Operation::new("w", vec![pt(BORDER_WIDTH_MM).into()])];
        for cell in &page.cells {
            cell_operations(cell, &mut operations);
        }
        let content = Content { operations }
            .encode()
            .with_context(|| format!("encoding page {}", page_no + 1))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                pt(PAGE_WIDTH_MM).into(),
                pt(PAGE_HEIGHT_MM).into(),
            ],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).context("writing PDF")?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::columns::cutoff_column_for_tests;
    use crate::data::model::CellValue;

    fn result_with(cutoff: &str, rows: Vec<Vec<CellValue>>) -> ResultTable {
        let cutoff = cutoff_column_for_tests(cutoff);
        ResultTable {
            columns: columns::export_columns(&cutoff),
            cutoff,
            rows,
        }
    }

    fn row(inst: &str, name: &str, cutoff: f64) -> Vec<CellValue> {
        let mut cells: Vec<CellValue> = (0..12)
            .map(|i| CellValue::String(format!("c{i}")))
            .collect();
        cells[0] = CellValue::String(inst.to_string());
        cells[1] = CellValue::String(name.to_string());
        cells[7] = CellValue::Null;
        cells[10] = CellValue::Float(cutoff);
        cells
    }

    fn header_cells(layout: &Layout) -> Vec<&Cell> {
        layout
            .pages
            .iter()
            .flat_map(|p| &p.cells)
            .filter(|c| c.font == Font::Bold && c.size == HEADER_SIZE)
            .collect()
    }

    fn body_rows(layout: &Layout) -> Vec<Vec<&Cell>> {
        let cells: Vec<&Cell> = layout
            .pages
            .iter()
            .flat_map(|p| &p.cells)
            .filter(|c| c.border && c.size == BODY_SIZE)
            .collect();
        cells.chunks(12).map(|c| c.to_vec()).collect()
    }

    #[test]
    fn truncation_policy() {
        assert_eq!(truncate_body(&"x".repeat(50)), "x".repeat(50));
        let long = truncate_body(&"y".repeat(51));
        assert_eq!(long, format!("{}...", "y".repeat(47)));
        assert_eq!(long.chars().count(), 50);
        assert_eq!(truncate_header(&"h".repeat(40)), "h".repeat(30));
        assert_eq!(truncate_body(&"\u{e9}".repeat(60)).chars().count(), 50);
    }

    #[test]
    fn widths_come_from_lookup_and_fit_the_page() {
        let cutoff = cutoff_column_for_tests("OC_BOYS");
        assert_eq!(column_width_mm("Institute Name", &cutoff), 60.0);
        assert_eq!(column_width_mm("OC_BOYS", &cutoff), CUTOFF_COLUMN_WIDTH_MM);
        assert_eq!(column_width_mm("Something Else", &cutoff), DEFAULT_COLUMN_WIDTH_MM);

        let result = result_with("OC_BOYS", vec![row("A", "A", 1.0)]);
        let widths = fitted_widths(&result);
        let total: f32 = widths.iter().sum();
        assert!((total - (PAGE_WIDTH_MM - 2.0 * MARGIN_MM)).abs() < 0.01);
        // Institute Name is three times Inst Code in the lookup.
        assert!((widths[1] / widths[0] - 3.0).abs() < 1e-4);
        assert!(widths[1] < 60.0);
    }

    #[test]
    fn one_rendered_row_per_result_row_in_export_order() {
        let long_name = "Institute Of Aeronautical Engineering And Technology Dundigal";
        let result = result_with(
            "BC_A_GIRLS",
            vec![
                row("IARE", long_name, 31000.0),
                row("CBIT", "Chaitanya Bharathi", 4500.5),
                row("VASV", "Vasavi", 18000.0),
            ],
        );
        let layout = layout(&result);

        let header: Vec<&str> = header_cells(&layout).iter().map(|c| c.text.as_str()).collect();
        assert_eq!(header, result.columns.iter().map(String::as_str).collect::<Vec<_>>());

        let rows = body_rows(&layout);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][0].text, "IARE");
        assert_eq!(rows[0][1].text, format!("{}...", &long_name[..47]));
        assert_eq!(rows[0][7].text, "");
        assert_eq!(rows[0][10].text, "31000");
        assert_eq!(rows[1][10].text, "4500.5");
        assert_eq!(rows[2][0].text, "VASV");
        assert!(rows.iter().flatten().all(|c| c.align == Align::Center));
    }

    #[test]
    fn long_cutoff_label_is_cut_in_header() {
        let label = "EWS_GENERAL_OPEN_UNIVERSITY_AREA_BOYS";
        let result = result_with(label, vec![row("A", "A", 1.0)]);
        let layout = layout(&result);
        assert_eq!(header_cells(&layout)[10].text, &label[..30]);
    }

    #[test]
    fn rows_flow_onto_new_pages_without_repeating_header() {
        let rows = (0..80).map(|i| row(&format!("I{i}"), "Name", i as f64)).collect();
        let result = result_with("OC_BOYS", rows);
        let layout = layout(&result);

        assert!(layout.pages.len() >= 3);
        assert_eq!(body_rows(&layout).len(), 80);
        assert_eq!(header_cells(&layout).len(), 12);
        assert!(layout.pages[1]
            .cells
            .iter()
            .all(|c| c.size == BODY_SIZE));
        for page in &layout.pages {
            for cell in &page.cells {
                assert!(cell.rect.y >= MARGIN_MM);
                assert!(cell.rect.y + cell.rect.h <= PAGE_HEIGHT_MM - PAGE_BREAK_MARGIN_MM + 1e-3);
            }
        }
    }

    #[test]
    fn disclaimer_wraps_to_printable_width() {
        let lines = wrap_words(REPORT_DISCLAIMER, 60.0, Font::Regular, NOTE_SIZE);
        assert!(lines.len() > 1);
        assert_eq!(lines.join(" "), REPORT_DISCLAIMER);
        for line in &lines {
            assert!(Font::Regular.text_width_mm(line, NOTE_SIZE) <= 60.0);
        }
    }

    #[test]
    fn rendered_bytes_are_a_readable_pdf() {
        let rows = (0..40).map(|i| row(&format!("I{i}"), "Name", 100.0)).collect();
        let result = result_with("OC_BOYS", rows);
        let pages = layout(&result).pages.len();

        let bytes = render_pdf(&result).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let doc = Document::load_mem(&bytes).unwrap();
        let page_ids: Vec<_> = doc.get_pages().into_values().collect();
        assert_eq!(page_ids.len(), pages);

        let content = Content::decode(&doc.get_page_content(page_ids[0]).unwrap()).unwrap();
        let shown: Vec<Vec<u8>> = content
            .operations
            .iter()
            .filter(|op| op.operator == "Tj")
            .filter_map(|op| match op.operands.first() {
                Some(Object::String(bytes, _)) => Some(bytes.clone()),
                _ => None,
            })
            .collect();
        assert!(shown.contains(&b"Inst Code".to_vec()));
        assert!(shown.contains(&b"I0".to_vec()));
        assert!(shown[0].contains(&0x96));
    }
}
