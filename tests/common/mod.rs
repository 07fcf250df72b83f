//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::convert::Infallible;

use invoice_generator::export::{DocumentSurface, TableSpec, TextStyle};
use invoice_generator::{Invoice, LineItem};

/// Height every recorded table row is given.
pub const ROW_HEIGHT: f32 = 9.0;

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Text {
        text: String,
        x: f32,
        y: f32,
        style: TextStyle,
    },
    Rule {
        from: (f32, f32),
        to: (f32, f32),
        width: f32,
    },
    Table(TableSpec),
    NewPage,
}

#[derive(Debug)]
pub struct Recording {
    pub file_name: String,
    pub ops: Vec<Op>,
}

impl Recording {
    pub fn text(&self, text: &str) -> Option<(f32, f32, TextStyle)> {
        self.ops.iter().find_map(|op| match op {
            Op::Text { text: t, x, y, style } if t == text => Some((*x, *y, *style)),
            _ => None,
        })
    }

    pub fn text_at(&self, x: f32, y: f32) -> Option<&str> {
        self.ops.iter().find_map(|op| match op {
            Op::Text { text, x: tx, y: ty, .. } if approx(*tx, x) && approx(*ty, y) => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn table(&self) -> &TableSpec {
        self.ops
            .iter()
            .find_map(|op| match op {
                Op::Table(spec) => Some(spec),
                _ => None,
            })
            .expect("document has a table")
    }

    pub fn rules(&self) -> Vec<((f32, f32), (f32, f32), f32)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Rule { from, to, width } => Some((*from, *to, *width)),
                _ => None,
            })
            .collect()
    }

    pub fn page_breaks(&self) -> usize {
        self.ops.iter().filter(|op| matches!(op, Op::NewPage)).count()
    }
}

/// Records drawing calls instead of producing a document.
#[derive(Debug, Default)]
pub struct Recorder {
    ops: Vec<Op>,
}

impl DocumentSurface for Recorder {
    type Output = Recording;
    type Error = Infallible;

    fn text(&mut self, text: &str, x: f32, y: f32, style: &TextStyle) {
        self.ops.push(Op::Text {
            text: text.to_string(),
            x,
            y,
            style: *style,
        });
    }

    fn rule(&mut self, from: (f32, f32), to: (f32, f32), width: f32) {
        self.ops.push(Op::Rule { from, to, width });
    }

    fn table(&mut self, table: &TableSpec) -> f32 {
        self.ops.push(Op::Table(table.clone()));
        table.start_y + ROW_HEIGHT * (table.body.len() + 1) as f32
    }

    fn new_page(&mut self) {
        self.ops.push(Op::NewPage);
    }

    fn finish(self, file_name: &str) -> Result<Recording, Infallible> {
        Ok(Recording {
            file_name: file_name.to_string(),
            ops: self.ops,
        })
    }
}

pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}

pub fn widget_invoice() -> Invoice {
    Invoice {
        client_name: "Acme Corp".into(),
        address: "1 Main St\nSpringfield".into(),
        invoice_number: "INV-001".into(),
        invoice_date: "2026-10-19".into(),
        tax_rate: "8".into(),
        items: vec![LineItem::new("Widget", "3", "9.99")],
    }
}
