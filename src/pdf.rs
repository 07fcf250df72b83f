//! printpdf backend for [`DocumentSurface`].

use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point, Rect,
};
use tracing::debug;

use crate::error::{Error, Result};
use crate::export::{
    export_document, Align, Artifact, DocumentSurface, FontStyle, Rgb, TableSpec, TextStyle,
    BOTTOM_MARGIN, PAGE_HEIGHT, PAGE_WIDTH, TOP_MARGIN,
};
use crate::model::Invoice;

const PT_TO_MM: f32 = 0.352_778;
const MM_TO_PT: f32 = 2.834_646;

const TABLE_MARGIN: f32 = 14.0;
const COLUMN_WIDTHS: [f32; 4] = [80.0, 30.0, 36.0, 36.0];
const CELL_PADDING: f32 = 2.5;
const LINE_HEIGHT: f32 = 1.15;
const GRID_GREY: Rgb = Rgb(200, 200, 200);
const GRID_WIDTH: f32 = 0.1;

// Advance widths of printable ASCII (32..=126), in 1/1000 em, from the
// standard Helvetica font metrics. Oblique shares the regular widths.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

const FALLBACK_WIDTH: u16 = 556;

/// Width of `text` in millimetres when set in Helvetica at `size` points.
pub fn text_width(text: &str, size: f32, font: FontStyle) -> f32 {
    let widths = match font {
        FontStyle::Bold => &HELVETICA_BOLD_WIDTHS,
        FontStyle::Normal | FontStyle::Italic => &HELVETICA_WIDTHS,
    };
    let units: u32 = text
        .chars()
        .map(|c| match c as u32 {
            code @ 32..=126 => u32::from(widths[(code - 32) as usize]),
            _ => u32::from(FALLBACK_WIDTH),
        })
        .sum();
    units as f32 / 1000.0 * size * PT_TO_MM
}

/// Greedy word wrap to `max_width` millimetres. Words wider than a line are
/// broken between characters.
pub fn wrap_text(text: &str, max_width: f32, size: f32, font: FontStyle) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if text_width(&candidate, size, font) <= max_width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        for c in word.chars() {
            current.push(c);
            if text_width(&current, size, font) > max_width && current.chars().count() > 1 {
                current.pop();
                lines.push(std::mem::replace(&mut current, c.to_string()));
            }
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

fn pdf_color(rgb: Rgb) -> Color {
    Color::Rgb(printpdf::Rgb::new(
        f32::from(rgb.0) / 255.0,
        f32::from(rgb.1) / 255.0,
        f32::from(rgb.2) / 255.0,
        None,
    ))
}

/// An A4 PDF document under construction.
pub struct PdfSurface {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    pages: usize,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
}

impl PdfSurface {
    pub fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;
        let italic = doc.add_builtin_font(BuiltinFont::HelveticaOblique)?;
        let layer = doc.get_page(page).get_layer(layer);

        Ok(Self {
            doc,
            layer,
            pages: 1,
            regular,
            bold,
            italic,
        })
    }

    pub fn pages(&self) -> usize {
        self.pages
    }

    fn font(&self, style: FontStyle) -> &IndirectFontRef {
        match style {
            FontStyle::Normal => &self.regular,
            FontStyle::Bold => &self.bold,
            FontStyle::Italic => &self.italic,
        }
    }

    // printpdf measures y from the bottom of the page.
    fn point(x: f32, y: f32) -> Point {
        Point::new(Mm(x), Mm(PAGE_HEIGHT - y))
    }

    fn stroke(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: Rgb) {
        self.layer.set_outline_color(pdf_color(color));
        self.layer.set_outline_thickness(width * MM_TO_PT);
        self.layer.add_line(Line {
            points: vec![(Self::point(from.0, from.1), false), (Self::point(to.0, to.1), false)],
            is_closed: false,
        });
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgb) {
        self.layer.set_fill_color(pdf_color(color));
        self.layer.add_rect(Rect::new(
            Mm(x),
            Mm(PAGE_HEIGHT - y - height),
            Mm(x + width),
            Mm(PAGE_HEIGHT - y),
        ));
    }

    fn draw_row(&mut self, cells: &[Vec<String>], table: &TableSpec, y: f32, height: f32, style: &TextStyle) {
        let line_height = table.font_size * PT_TO_MM * LINE_HEIGHT;
        let right = TABLE_MARGIN + COLUMN_WIDTHS.iter().sum::<f32>();

        let mut x = TABLE_MARGIN;
        for (i, lines) in cells.iter().enumerate() {
            let width = COLUMN_WIDTHS[i];
            let align = table.column_align.get(i).copied().unwrap_or(Align::Left);
            let anchor = match align {
                Align::Left => x + CELL_PADDING,
                Align::Center => x + width / 2.0,
                Align::Right => x + width - CELL_PADDING,
            };
            let cell_style = style.align(align);

            let mut baseline = y + CELL_PADDING + table.font_size * PT_TO_MM;
            for line in lines {
                self.text(line, anchor, baseline, &cell_style);
                baseline += line_height;
            }
            x += width;
        }

        self.stroke((TABLE_MARGIN, y), (right, y), GRID_WIDTH, GRID_GREY);
        self.stroke((TABLE_MARGIN, y + height), (right, y + height), GRID_WIDTH, GRID_GREY);
        let mut x = TABLE_MARGIN;
        self.stroke((x, y), (x, y + height), GRID_WIDTH, GRID_GREY);
        for width in COLUMN_WIDTHS {
            x += width;
            self.stroke((x, y), (x, y + height), GRID_WIDTH, GRID_GREY);
        }
    }

    fn wrap_row(row: &[String], table: &TableSpec, font: FontStyle) -> (Vec<Vec<String>>, f32) {
        let cells: Vec<Vec<String>> = row
            .iter()
            .zip(COLUMN_WIDTHS)
            .map(|(text, width)| wrap_text(text, width - 2.0 * CELL_PADDING, table.font_size, font))
            .collect();
        let lines = cells.iter().map(Vec::len).max().unwrap_or(1).max(1);
        let height = lines as f32 * table.font_size * PT_TO_MM * LINE_HEIGHT + 2.0 * CELL_PADDING;
        (cells, height)
    }

    fn draw_head(&mut self, table: &TableSpec, y: f32) -> f32 {
        let (cells, height) = Self::wrap_row(&table.head, table, FontStyle::Bold);
        let width: f32 = COLUMN_WIDTHS.iter().sum();
        self.fill_rect(TABLE_MARGIN, y, width, height, table.head_fill);

        let style = TextStyle::new(table.font_size).bold().color(table.head_text);
        let head = TableSpec {
            column_align: vec![Align::Left; table.head.len()],
            ..table.clone()
        };
        self.draw_row(&cells, &head, y, height, &style);
        y + height
    }
}

impl DocumentSurface for PdfSurface {
    type Output = Artifact;
    type Error = Error;

    fn text(&mut self, text: &str, x: f32, y: f32, style: &TextStyle) {
        let width = text_width(text, style.size, style.font);
        let left = match style.align {
            Align::Left => x,
            Align::Center => x - width / 2.0,
            Align::Right => x - width,
        };

        self.layer.set_fill_color(pdf_color(style.color));
        let font = self.font(style.font).clone();
        self.layer.use_text(text, style.size, Mm(left), Mm(PAGE_HEIGHT - y), &font);
    }

    fn rule(&mut self, from: (f32, f32), to: (f32, f32), width: f32) {
        self.stroke(from, to, width, Rgb(0, 0, 0));
    }

    fn table(&mut self, table: &TableSpec) -> f32 {
        let limit = PAGE_HEIGHT - BOTTOM_MARGIN;
        let body_style = TextStyle::new(table.font_size);

        let head_height = Self::wrap_row(&table.head, table, FontStyle::Bold).1;
        let mut start = table.start_y;
        if start + head_height > limit {
            self.new_page();
            start = TOP_MARGIN;
        }

        let mut y = self.draw_head(table, start);
        for row in &table.body {
            let (cells, height) = Self::wrap_row(row, table, FontStyle::Normal);
            if y + height > limit {
                self.new_page();
                y = self.draw_head(table, TOP_MARGIN);
            }
            self.draw_row(&cells, table, y, height, &body_style);
            y += height;
        }
        y
    }

    fn new_page(&mut self) {
        self.pages += 1;
        let (page, layer) = self.doc.add_page(
            Mm(PAGE_WIDTH),
            Mm(PAGE_HEIGHT),
            format!("Page {}", self.pages),
        );
        self.layer = self.doc.get_page(page).get_layer(layer);
        debug!(pages = self.pages, "started page");
    }

    fn finish(self, file_name: &str) -> Result<Artifact> {
        let bytes = self.doc.save_to_bytes()?;
        Ok(Artifact {
            file_name: file_name.to_string(),
            bytes,
        })
    }
}

/// Exports `invoice` as an A4 PDF.
pub fn export_pdf(invoice: &Invoice) -> Result<Artifact> {
    let title = if invoice.invoice_number.is_empty() {
        "Invoice".to_string()
    } else {
        format!("Invoice {}", invoice.invoice_number)
    };
    export_document(invoice, PdfSurface::new(&title)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::item_table;
    use crate::model::LineItem;

    #[test]
    fn digits_share_one_width() {
        let one = text_width("1", 10.0, FontStyle::Normal);
        let eight = text_width("8", 10.0, FontStyle::Normal);
        assert_eq!(one, eight);
        assert!((text_width("$32.37", 11.0, FontStyle::Normal) - 11.0 * 3.058 * PT_TO_MM).abs() < 1e-3);
    }

    #[test]
    fn bold_is_wider() {
        assert!(text_width("Total:", 12.0, FontStyle::Bold) > text_width("Total:", 12.0, FontStyle::Normal));
    }

    #[test]
    fn wrap_keeps_short_text_on_one_line() {
        assert_eq!(wrap_text("Widget", 50.0, 10.0, FontStyle::Normal), vec!["Widget"]);
        assert_eq!(wrap_text("", 50.0, 10.0, FontStyle::Normal), vec![""]);
    }

    #[test]
    fn wrap_breaks_long_text() {
        let text = "Consulting services for the complete redesign of the billing pipeline";
        let lines = wrap_text(text, 75.0, 10.0, FontStyle::Normal);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| text_width(l, 10.0, FontStyle::Normal) <= 75.0));
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn wrap_breaks_long_words() {
        let word = "W".repeat(60);
        let lines = wrap_text(&word, 30.0, 10.0, FontStyle::Normal);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
    }

    #[test]
    fn exports_pdf_bytes() {
        let invoice = Invoice {
            invoice_number: "INV-7".into(),
            items: vec![LineItem::new("Widget", "3", "9.99")],
            ..Invoice::default()
        };

        let artifact = export_pdf(&invoice).unwrap();
        assert_eq!(artifact.file_name, "invoice_INV-7.pdf");
        assert!(artifact.bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn long_tables_continue_on_new_pages() {
        let invoice = Invoice {
            items: (0..80).map(|i| LineItem::new(format!("Item {}", i), "1", "1")).collect(),
            ..Invoice::default()
        };

        let mut surface = PdfSurface::new("Invoice").unwrap();
        let end = surface.table(&item_table(&invoice, 70.0));
        assert!(surface.pages() > 1);
        assert!(end <= PAGE_HEIGHT - BOTTOM_MARGIN);
    }

    #[test]
    fn short_tables_stay_on_first_page() {
        let invoice = Invoice {
            items: vec![LineItem::new("Widget", "1", "1")],
            ..Invoice::default()
        };

        let mut surface = PdfSurface::new("Invoice").unwrap();
        let end = surface.table(&item_table(&invoice, 70.0));
        assert_eq!(surface.pages(), 1);
        assert!(end > 70.0);
    }

    #[test]
    fn header_that_would_cross_the_margin_starts_a_new_page() {
        let invoice = Invoice {
            items: vec![LineItem::new("Widget", "1", "1")],
            ..Invoice::default()
        };
        let table = item_table(&invoice, 280.0);
        let row_height = PdfSurface::wrap_row(&table.head, &table, FontStyle::Bold).1;

        let mut surface = PdfSurface::new("Invoice").unwrap();
        let end = surface.table(&table);
        assert_eq!(surface.pages(), 2);
        assert!((end - (TOP_MARGIN + 2.0 * row_height)).abs() < 1e-3);
    }
}
