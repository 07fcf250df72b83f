//! Fixed-layout document export.
//!
//! The layout is expressed against [`DocumentSurface`], the set of drawing
//! capabilities a document backend must offer. Coordinates are millimetres
//! measured from the top-left corner of an A4 page.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::Invoice;
use crate::preview::{COLUMNS, PREVIEW_FALLBACK};
use crate::totals::{format_currency, format_quantity, format_rate, Totals};

/// Shown for any blank header field in the document.
pub const DOCUMENT_FALLBACK: &str = "N/A";
/// Used in the file name when the invoice has no number.
pub const DRAFT_NAME: &str = "draft";

pub const PAGE_WIDTH: f32 = 210.0;
pub const PAGE_HEIGHT: f32 = 297.0;
pub const TOP_MARGIN: f32 = 20.0;
pub const BOTTOM_MARGIN: f32 = 15.0;

const CENTER_X: f32 = PAGE_WIDTH / 2.0;
const LEFT_X: f32 = 20.0;
const META_LABEL_X: f32 = 140.0;
const META_VALUE_X: f32 = 165.0;
const TOTALS_LABEL_X: f32 = 140.0;
const TOTALS_VALUE_X: f32 = 185.0;

const ADDRESS_START_Y: f32 = 54.0;
const LINE_STEP: f32 = 7.0;
const TABLE_MIN_Y: f32 = 70.0;
const TABLE_GAP: f32 = 10.0;
// Distance from the first totals line to the last footer line.
const CLOSING_BLOCK_HEIGHT: f32 = 42.0;

const HEADER_BLUE: Rgb = Rgb(52, 152, 219);
const WHITE: Rgb = Rgb(255, 255, 255);
const BLACK: Rgb = Rgb(0, 0, 0);
const FOOTER_GREY: Rgb = Rgb(100, 100, 100);

pub const FOOTER_LINES: [&str; 2] = ["Thank you for your business!", "Payment is due within 30 days."];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Normal,
    Bold,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub font: FontStyle,
    pub color: Rgb,
    pub align: Align,
}

impl TextStyle {
    pub fn new(size: f32) -> Self {
        Self {
            size,
            font: FontStyle::Normal,
            color: BLACK,
            align: Align::Left,
        }
    }

    pub fn bold(self) -> Self {
        Self { font: FontStyle::Bold, ..self }
    }

    pub fn italic(self) -> Self {
        Self { font: FontStyle::Italic, ..self }
    }

    pub fn color(self, color: Rgb) -> Self {
        Self { color, ..self }
    }

    pub fn align(self, align: Align) -> Self {
        Self { align, ..self }
    }
}

/// A grid table with a filled header row.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSpec {
    pub start_y: f32,
    pub head: Vec<String>,
    pub body: Vec<Vec<String>>,
    pub head_fill: Rgb,
    pub head_text: Rgb,
    pub column_align: Vec<Align>,
    pub font_size: f32,
}

/// Drawing capabilities the exporter needs from a document backend.
pub trait DocumentSurface {
    type Output;
    type Error;

    /// Places text so that `x` is its left edge, centre or right edge
    /// depending on `style.align`. `y` is the baseline.
    fn text(&mut self, text: &str, x: f32, y: f32, style: &TextStyle);

    fn rule(&mut self, from: (f32, f32), to: (f32, f32), width: f32);

    /// Draws the table, breaking onto new pages as needed, and returns the
    /// y coordinate just below its last row.
    fn table(&mut self, table: &TableSpec) -> f32;

    fn new_page(&mut self);

    /// Finalizes the document into a named artifact.
    fn finish(self, file_name: &str) -> std::result::Result<Self::Output, Self::Error>;
}

/// A finished document, handed over in one piece.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Artifact {
    /// Writes the artifact into `dir` under its own name.
    ///
    /// The bytes land in a hidden `.part` file first and are renamed into
    /// place, so a reader never sees a partial document.
    pub fn write_into(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;

        let path = dir.join(&self.file_name);
        let partial = dir.join(format!(".{}.part", self.file_name));

        fs::write(&partial, &self.bytes).map_err(|e| Error::io(&partial, e))?;
        fs::rename(&partial, &path).map_err(|e| Error::io(&path, e))?;

        info!(path = %path.display(), bytes = self.bytes.len(), "wrote artifact");
        Ok(path)
    }
}

/// `invoice_<number>.pdf`, or `invoice_draft.pdf` without a number.
pub fn artifact_file_name(invoice: &Invoice) -> String {
    let number = if invoice.invoice_number.is_empty() {
        DRAFT_NAME.to_string()
    } else {
        invoice.invoice_number.replace(['/', '\\'], "-")
    };
    format!("invoice_{}.pdf", number)
}

fn or_fallback(value: &str) -> &str {
    if value.is_empty() { DOCUMENT_FALLBACK } else { value }
}

fn address_lines(address: &str) -> Vec<&str> {
    if address.is_empty() {
        return vec![DOCUMENT_FALLBACK];
    }
    address.split("\r\n").flat_map(|part| part.split(['\n', '\r'])).collect()
}

/// Builds the item table for `invoice`, starting at `start_y`.
pub fn item_table(invoice: &Invoice, start_y: f32) -> TableSpec {
    let body = invoice
        .items
        .iter()
        .map(|item| {
            let name = if item.name.is_empty() { PREVIEW_FALLBACK } else { item.name.as_str() };
            vec![
                name.to_string(),
                format_quantity(item.quantity()),
                format_currency(item.unit_price()),
                format_currency(item.line_total()),
            ]
        })
        .collect();

    TableSpec {
        start_y,
        head: COLUMNS.iter().map(|c| c.to_string()).collect(),
        body,
        head_fill: HEADER_BLUE,
        head_text: WHITE,
        column_align: vec![Align::Left, Align::Right, Align::Right, Align::Right],
        font_size: 10.0,
    }
}

/// Lays out `invoice` on `surface` and finalizes it.
///
/// The invoice is only read. Whatever the surface fails with is returned
/// unchanged.
pub fn export_document<S: DocumentSurface>(
    invoice: &Invoice,
    mut surface: S,
) -> std::result::Result<S::Output, S::Error> {
    surface.text("INVOICE", CENTER_X, 20.0, &TextStyle::new(24.0).bold().align(Align::Center));

    let address_end = draw_bill_to(&mut surface, invoice);
    draw_metadata(&mut surface, invoice);

    let table_y = TABLE_MIN_Y.max(address_end + TABLE_GAP);
    debug!(address_end, table_y, items = invoice.items.len(), "laying out item table");
    let table_end = surface.table(&item_table(invoice, table_y));

    let mut y = table_end + TABLE_GAP;
    if y + CLOSING_BLOCK_HEIGHT > PAGE_HEIGHT - BOTTOM_MARGIN {
        debug!(y, "totals do not fit, starting a new page");
        surface.new_page();
        y = TOP_MARGIN;
    }

    draw_totals(&mut surface, &invoice.totals(), invoice.tax_rate_percent(), y);
    draw_footer(&mut surface, y);

    surface.finish(&artifact_file_name(invoice))
}

// Returns the y just past the last address line.
fn draw_bill_to<S: DocumentSurface>(surface: &mut S, invoice: &Invoice) -> f32 {
    let body = TextStyle::new(11.0);

    surface.text("Bill To:", LEFT_X, 40.0, &TextStyle::new(12.0).bold());
    surface.text(or_fallback(&invoice.client_name), LEFT_X, 47.0, &body);

    let mut y = ADDRESS_START_Y;
    for line in address_lines(&invoice.address) {
        surface.text(line, LEFT_X, y, &body);
        y += LINE_STEP;
    }
    y
}

fn draw_metadata<S: DocumentSurface>(surface: &mut S, invoice: &Invoice) {
    let label = TextStyle::new(11.0).bold();
    let value = TextStyle::new(11.0);

    surface.text("Invoice #:", META_LABEL_X, 40.0, &label);
    surface.text(or_fallback(&invoice.invoice_number), META_VALUE_X, 40.0, &value);

    surface.text("Date:", META_LABEL_X, 47.0, &label);
    surface.text(or_fallback(&invoice.invoice_date), META_VALUE_X, 47.0, &value);
}

fn draw_totals<S: DocumentSurface>(surface: &mut S, totals: &Totals, tax_rate: f64, y: f32) {
    let label = TextStyle::new(11.0);
    let value = label.align(Align::Right);

    surface.text("Subtotal:", TOTALS_LABEL_X, y, &label);
    surface.text(&format_currency(totals.subtotal), TOTALS_VALUE_X, y, &value);

    let tax_label = format!("Tax ({}%):", format_rate(tax_rate));
    surface.text(&tax_label, TOTALS_LABEL_X, y + 7.0, &label);
    surface.text(&format_currency(totals.tax_amount), TOTALS_VALUE_X, y + 7.0, &value);

    surface.rule((TOTALS_LABEL_X, y + 11.0), (TOTALS_VALUE_X, y + 11.0), 0.5);

    let total_label = TextStyle::new(12.0).bold();
    surface.text("Total:", TOTALS_LABEL_X, y + 18.0, &total_label);
    surface.text(
        &format_currency(totals.total),
        TOTALS_VALUE_X,
        y + 18.0,
        &total_label.align(Align::Right),
    );
}

fn draw_footer<S: DocumentSurface>(surface: &mut S, y: f32) {
    let style = TextStyle::new(10.0)
        .italic()
        .color(FOOTER_GREY)
        .align(Align::Center);

    surface.text(FOOTER_LINES[0], CENTER_X, y + 35.0, &style);
    surface.text(FOOTER_LINES[1], CENTER_X, y + 42.0, &style);
}
