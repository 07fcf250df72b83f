use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};
use crate::totals::{compute_totals, Totals};

// Leading decimal number, the same prefix a browser number parser accepts.
static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?")
        .expect("leading number pattern is valid")
});

/// Coerces raw form text into an amount.
///
/// Blank, unparsable and non-finite input yields `0`, and so does anything
/// negative. This never fails.
pub fn parse_amount(raw: &str) -> f64 {
    let value = LEADING_NUMBER
        .find(raw)
        .and_then(|m| m.as_str().trim().parse::<f64>().ok())
        .unwrap_or(0.0);

    if value.is_finite() && value > 0.0 { value } else { 0.0 }
}

/// One invoice row. Numeric fields hold the raw text the user typed.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct LineItem {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "raw_text")]
    pub quantity: String,
    #[serde(default, deserialize_with = "raw_text")]
    pub unit_price: String,
}

impl LineItem {
    pub fn new(name: impl Into<String>, quantity: impl Into<String>, unit_price: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity: quantity.into(),
            unit_price: unit_price.into(),
        }
    }

    pub fn quantity(&self) -> f64 {
        parse_amount(&self.quantity)
    }

    pub fn unit_price(&self) -> f64 {
        parse_amount(&self.unit_price)
    }

    pub fn line_total(&self) -> f64 {
        self.quantity() * self.unit_price()
    }

    pub fn set(&mut self, field: ItemField, value: impl Into<String>) {
        let value = value.into();
        match field {
            ItemField::Name => self.name = value,
            ItemField::Quantity => self.quantity = value,
            ItemField::UnitPrice => self.unit_price = value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemField {
    Name,
    Quantity,
    UnitPrice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderField {
    ClientName,
    Address,
    InvoiceNumber,
    InvoiceDate,
    TaxRate,
}

impl HeaderField {
    pub const ALL: [HeaderField; 5] = [
        HeaderField::ClientName,
        HeaderField::Address,
        HeaderField::InvoiceNumber,
        HeaderField::InvoiceDate,
        HeaderField::TaxRate,
    ];

    pub fn label(self) -> &'static str {
        match self {
            HeaderField::ClientName => "Client Name",
            HeaderField::Address => "Address",
            HeaderField::InvoiceNumber => "Invoice Number",
            HeaderField::InvoiceDate => "Invoice Date",
            HeaderField::TaxRate => "Tax Rate %",
        }
    }
}

/// The invoice aggregate. Totals are derived on every read and never stored.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Invoice {
    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub address: String, // may span several lines
    #[serde(default, deserialize_with = "raw_text")]
    pub invoice_number: String,
    #[serde(default)]
    pub invoice_date: String,
    #[serde(default, deserialize_with = "raw_text")]
    pub tax_rate: String,
    #[serde(default)]
    pub items: Vec<LineItem>,
}

impl Invoice {
    pub fn tax_rate_percent(&self) -> f64 {
        parse_amount(&self.tax_rate)
    }

    pub fn totals(&self) -> Totals {
        compute_totals(&self.items, self.tax_rate_percent())
    }

    pub fn header(&self, field: HeaderField) -> &str {
        match field {
            HeaderField::ClientName => &self.client_name,
            HeaderField::Address => &self.address,
            HeaderField::InvoiceNumber => &self.invoice_number,
            HeaderField::InvoiceDate => &self.invoice_date,
            HeaderField::TaxRate => &self.tax_rate,
        }
    }

    pub fn set_header(&mut self, field: HeaderField, value: impl Into<String>) {
        let value = value.into();
        match field {
            HeaderField::ClientName => self.client_name = value,
            HeaderField::Address => self.address = value,
            HeaderField::InvoiceNumber => self.invoice_number = value,
            HeaderField::InvoiceDate => self.invoice_date = value,
            HeaderField::TaxRate => self.tax_rate = value,
        }
    }

    pub fn from_toml_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Reads an invoice from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_toml_str(&content).map_err(|source| Error::ParseInvoice {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawField {
    Text(String),
    Integer(i64),
    Float(f64),
}

// Numbers in invoice files stay raw text so they go through `parse_amount`.
fn raw_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawField::deserialize(deserializer)? {
        RawField::Text(s) => s,
        RawField::Integer(i) => i.to_string(),
        RawField::Float(f) => f.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_garbage_coerce_to_zero() {
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("   "), 0.0);
        assert_eq!(parse_amount("abc"), 0.0);
        assert_eq!(parse_amount("."), 0.0);
        assert_eq!(parse_amount("1e999"), 0.0);
    }

    #[test]
    fn parses_leading_number() {
        assert_eq!(parse_amount("3"), 3.0);
        assert_eq!(parse_amount(" 9.99"), 9.99);
        assert_eq!(parse_amount("12abc"), 12.0);
        assert_eq!(parse_amount(".5"), 0.5);
        assert_eq!(parse_amount("5."), 5.0);
        assert_eq!(parse_amount("1e2"), 100.0);
        assert_eq!(parse_amount("+4"), 4.0);
    }

    #[test]
    fn negatives_clamp_to_zero() {
        assert_eq!(parse_amount("-3"), 0.0);
        assert_eq!(parse_amount("-0"), 0.0);
        assert!(parse_amount("-0").is_sign_positive());
    }

    #[test]
    fn blank_quantity_gives_zero_line_total() {
        assert_eq!(LineItem::new("Widget", "", "5").line_total(), 0.0);
        assert_eq!(LineItem::new("Widget", "2", "n/a").line_total(), 0.0);
        assert_eq!(LineItem::new("Widget", "2", "5").line_total(), 10.0);
    }

    #[test]
    fn set_updates_single_field() {
        let mut item = LineItem::default();
        item.set(ItemField::Quantity, "4");
        item.set(ItemField::UnitPrice, "2.5");
        item.set(ItemField::Name, "Bolt");
        assert_eq!(item, LineItem::new("Bolt", "4", "2.5"));
    }

    #[test]
    fn header_accessors_round_trip() {
        let mut invoice = Invoice::default();
        for field in HeaderField::ALL {
            invoice.set_header(field, field.label());
        }
        for field in HeaderField::ALL {
            assert_eq!(invoice.header(field), field.label());
        }
    }

    #[test]
    fn reads_numbers_and_strings_from_toml() {
        let invoice = Invoice::from_toml_str(
            r#"
client_name = "Acme"
invoice_number = 42
tax_rate = 8.5

[[items]]
name = "Widget"
quantity = 3
unit_price = "9.99"

[[items]]
quantity = ""
"#,
        )
        .unwrap();

        assert_eq!(invoice.invoice_number, "42");
        assert_eq!(invoice.tax_rate_percent(), 8.5);
        assert_eq!(invoice.items.len(), 2);
        assert_eq!(invoice.items[0].quantity(), 3.0);
        assert_eq!(invoice.items[0].unit_price(), 9.99);
        assert_eq!(invoice.items[1], LineItem::default());
        assert!(invoice.address.is_empty());
    }
}
