//! Live preview of an invoice.
//!
//! [`render_preview`] is a pure mapping from the current [`Invoice`] to a
//! [`PreviewView`] of display strings. The view can then be shown as a
//! terminal table, serialized to JSON, or rendered to a standalone HTML page.

use std::fmt;

use comfy_table::{Attribute, Cell, CellAlignment, Table};
use serde::Serialize;
use tera::{Context, Tera};

use crate::error::Result;
use crate::model::Invoice;
use crate::totals::{format_currency, format_quantity};

/// Shown for any blank field in the preview.
pub const PREVIEW_FALLBACK: &str = "-";
pub const NO_ITEMS_TEXT: &str = "No items added";
pub const COLUMNS: [&str; 4] = ["Item Name", "Quantity", "Price", "Line Total"];

const HTML_TEMPLATE: &str = include_str!("../templates/preview.html.tera");

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PreviewRow {
    Item {
        name: String,
        quantity: String,
        price: String,
        line_total: String,
    },
    /// Stands in for the item table when there are no items.
    Placeholder { text: String, colspan: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewView {
    pub client_name: String,
    pub address: String,
    pub invoice_number: String,
    pub invoice_date: String,
    pub rows: Vec<PreviewRow>,
    pub subtotal: String,
    pub tax: String,
    pub total: String,
}

fn or_fallback(value: &str) -> String {
    if value.is_empty() {
        PREVIEW_FALLBACK.to_string()
    } else {
        value.to_string()
    }
}

pub fn render_preview(invoice: &Invoice) -> PreviewView {
    let rows = if invoice.items.is_empty() {
        vec![PreviewRow::Placeholder {
            text: NO_ITEMS_TEXT.to_string(),
            colspan: COLUMNS.len(),
        }]
    } else {
        invoice
            .items
            .iter()
            .map(|item| PreviewRow::Item {
                name: or_fallback(&item.name),
                quantity: format_quantity(item.quantity()),
                price: format_currency(item.unit_price()),
                line_total: format_currency(item.line_total()),
            })
            .collect()
    };

    let totals = invoice.totals();

    PreviewView {
        client_name: or_fallback(&invoice.client_name),
        address: or_fallback(&invoice.address),
        invoice_number: or_fallback(&invoice.invoice_number),
        invoice_date: or_fallback(&invoice.invoice_date),
        rows,
        subtotal: format_currency(totals.subtotal),
        tax: format_currency(totals.tax_amount),
        total: format_currency(totals.total),
    }
}

impl PreviewView {
    pub fn items_table(&self) -> Table {
        let mut table = Table::new();
        table.set_header(COLUMNS.iter().map(|c| Cell::new(c).add_attribute(Attribute::Bold)));

        for row in &self.rows {
            match row {
                PreviewRow::Item { name, quantity, price, line_total } => {
                    table.add_row(vec![
                        Cell::new(name),
                        Cell::new(quantity).set_alignment(CellAlignment::Right),
                        Cell::new(price).set_alignment(CellAlignment::Right),
                        Cell::new(line_total).set_alignment(CellAlignment::Right),
                    ]);
                }
                PreviewRow::Placeholder { text, .. } => {
                    table.add_row(vec![Cell::new(text)]);
                }
            }
        }
        table
    }

    pub fn totals_table(&self) -> Table {
        let mut table = Table::new();
        table.add_row(vec![
            Cell::new("Subtotal:"),
            Cell::new(&self.subtotal).set_alignment(CellAlignment::Right),
        ]);
        table.add_row(vec![
            Cell::new("Tax:"),
            Cell::new(&self.tax).set_alignment(CellAlignment::Right),
        ]);
        table.add_row(vec![
            Cell::new("Total:").add_attribute(Attribute::Bold),
            Cell::new(&self.total)
                .set_alignment(CellAlignment::Right)
                .add_attribute(Attribute::Bold),
        ]);
        table
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Renders the preview as a standalone HTML page.
    pub fn to_html(&self) -> Result<String> {
        let context = Context::from_serialize(self)?;
        Ok(Tera::one_off(HTML_TEMPLATE, &context, true)?)
    }
}

impl fmt::Display for PreviewView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Bill To:    {}", self.client_name)?;
        for line in self.address.lines() {
            writeln!(f, "            {}", line)?;
        }
        writeln!(f, "Invoice #:  {}", self.invoice_number)?;
        writeln!(f, "Date:       {}", self.invoice_date)?;
        writeln!(f, "{}", self.items_table())?;
        write!(f, "{}", self.totals_table())
    }
}
