//! The edit → recompute → render pipeline.
//!
//! A [`Session`] owns the one mutable [`Invoice`]. Every change goes through
//! [`Session::apply`], which mutates the invoice and re-renders the preview
//! before returning, so the preview always reflects the last edit.

use tracing::{debug, warn};

use crate::error::Result;
use crate::export::Artifact;
use crate::model::{HeaderField, Invoice, ItemField, LineItem};
use crate::pdf::export_pdf;
use crate::preview::{render_preview, PreviewView};

#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    Header(HeaderField, String),
    /// Appends an empty row.
    AddItem,
    Item {
        index: usize,
        field: ItemField,
        value: String,
    },
    RemoveItem(usize),
}

#[derive(Debug)]
pub struct Session {
    invoice: Invoice,
    preview: PreviewView,
    renders: u64,
}

impl Session {
    pub fn new(invoice: Invoice) -> Self {
        let preview = render_preview(&invoice);
        Self {
            invoice,
            preview,
            renders: 1,
        }
    }

    /// A fresh form: empty header and a single empty item row.
    pub fn blank() -> Self {
        Self::new(Invoice {
            items: vec![LineItem::default()],
            ..Invoice::default()
        })
    }

    pub fn invoice(&self) -> &Invoice {
        &self.invoice
    }

    pub fn preview(&self) -> &PreviewView {
        &self.preview
    }

    /// How many times the preview has been rendered.
    pub fn renders(&self) -> u64 {
        self.renders
    }

    /// Applies `edit`, then recomputes and re-renders.
    ///
    /// Edits naming an item that does not exist are ignored, but the preview
    /// is still refreshed.
    pub fn apply(&mut self, edit: Edit) -> &PreviewView {
        match edit {
            Edit::Header(field, value) => self.invoice.set_header(field, value),
            Edit::AddItem => self.invoice.items.push(LineItem::default()),
            Edit::Item { index, field, value } => match self.invoice.items.get_mut(index) {
                Some(item) => item.set(field, value),
                None => warn!(index, "edit for missing item ignored"),
            },
            Edit::RemoveItem(index) => {
                if index < self.invoice.items.len() {
                    self.invoice.items.remove(index);
                } else {
                    warn!(index, "removal of missing item ignored");
                }
            }
        }
        self.refresh()
    }

    fn refresh(&mut self) -> &PreviewView {
        self.preview = render_preview(&self.invoice);
        self.renders += 1;
        debug!(renders = self.renders, total = %self.preview.total, "preview refreshed");
        &self.preview
    }

    /// Exports the current invoice. The session is left untouched.
    pub fn export(&self) -> Result<Artifact> {
        export_pdf(&self.invoice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preview::PreviewRow;

    fn set_item(index: usize, field: ItemField, value: &str) -> Edit {
        Edit::Item {
            index,
            field,
            value: value.to_string(),
        }
    }

    #[test]
    fn blank_session_has_one_empty_row() {
        let session = Session::blank();
        assert_eq!(session.invoice().items.len(), 1);
        assert_eq!(session.preview().rows.len(), 1);
        assert!(matches!(session.preview().rows[0], PreviewRow::Item { .. }));
        assert_eq!(session.preview().total, "$0.00");
    }

    #[test]
    fn every_edit_refreshes_preview() {
        let mut session = Session::blank();

        session.apply(set_item(0, ItemField::Name, "Widget"));
        session.apply(set_item(0, ItemField::Quantity, "3"));
        assert_eq!(session.preview().subtotal, "$0.00");

        let preview = session.apply(set_item(0, ItemField::UnitPrice, "9.99"));
        assert_eq!(preview.subtotal, "$29.97");

        let preview = session.apply(Edit::Header(HeaderField::TaxRate, "8".into()));
        assert_eq!(preview.tax, "$2.40");
        assert_eq!(preview.total, "$32.37");
        assert_eq!(session.renders(), 5);
    }

    #[test]
    fn header_edits_show_in_preview() {
        let mut session = Session::blank();
        let preview = session.apply(Edit::Header(HeaderField::ClientName, "Acme".into()));
        assert_eq!(preview.client_name, "Acme");

        let preview = session.apply(Edit::Header(HeaderField::ClientName, String::new()));
        assert_eq!(preview.client_name, "-");
    }

    #[test]
    fn add_and_remove_items() {
        let mut session = Session::blank();
        session.apply(Edit::AddItem);
        session.apply(set_item(1, ItemField::Quantity, "2"));
        session.apply(set_item(1, ItemField::UnitPrice, "5"));
        assert_eq!(session.preview().rows.len(), 2);
        assert_eq!(session.preview().total, "$10.00");

        session.apply(Edit::RemoveItem(1));
        assert_eq!(session.preview().total, "$0.00");

        let preview = session.apply(Edit::RemoveItem(0));
        assert_eq!(
            preview.rows,
            vec![PreviewRow::Placeholder {
                text: "No items added".into(),
                colspan: 4,
            }]
        );
    }

    #[test]
    fn missing_item_edits_are_ignored() {
        let mut session = Session::blank();
        let before = session.invoice().clone();

        session.apply(set_item(7, ItemField::Quantity, "2"));
        session.apply(Edit::RemoveItem(3));

        assert_eq!(session.invoice(), &before);
        assert_eq!(session.renders(), 3);
    }

    #[test]
    fn export_reads_a_snapshot() {
        let mut session = Session::blank();
        session.apply(Edit::Header(HeaderField::InvoiceNumber, "INV-9".into()));
        let before = session.invoice().clone();

        let artifact = session.export().unwrap();
        assert_eq!(artifact.file_name, "invoice_INV-9.pdf");
        assert_eq!(session.invoice(), &before);
    }
}
