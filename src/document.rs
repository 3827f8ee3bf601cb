// invoice-design-service/src/document.rs

//! Financial documents as they arrive in a render request.
//!
//! These are plain data: the persistence layer that owns them lives
//! elsewhere and hands over fully populated values.

use crate::error::{DocumentError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Largest magnitude accepted for any amount, quantity or rate.
pub const MAX_AMOUNT: f64 = 1.0e12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Invoice,
    Quote,
    Credit,
}

impl DocumentKind {
    /// Translation key of the entity name, also used to build the
    /// `<kind>_number` and `<kind>_date` keys.
    pub fn key(&self) -> &'static str {
        match self {
            DocumentKind::Invoice => "invoice",
            DocumentKind::Quote => "quote",
            DocumentKind::Credit => "credit",
        }
    }

    /// Translation key for the due-date caption.
    pub fn due_date_key(&self) -> &'static str {
        match self {
            DocumentKind::Quote => "valid_until",
            DocumentKind::Invoice | DocumentKind::Credit => "due_date",
        }
    }
}

impl Default for DocumentKind {
    fn default() -> Self {
        DocumentKind::Invoice
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRate {
    pub name: String,
    /// Percentage, e.g. `10.0` for 10%.
    pub rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    pub product_key: String,
    #[serde(default)]
    pub notes: String,
    pub quantity: f64,
    pub cost: f64,
    /// Per-line discount as an amount.
    #[serde(default)]
    pub discount: f64,
    #[serde(default)]
    pub tax_rates: Vec<TaxRate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub address1: Option<String>,
    #[serde(default)]
    pub address2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl Address {
    /// Non-empty address lines in display order.
    pub fn lines(&self) -> Vec<String> {
        let city_line = [&self.city, &self.state, &self.postal_code]
            .iter()
            .filter_map(|part| part.as_deref().map(str::trim).filter(|s| !s.is_empty()))
            .collect::<Vec<_>>()
            .join(", ");

        [
            self.address1.clone().unwrap_or_default(),
            self.address2.clone().unwrap_or_default(),
            city_line,
            self.country.clone().unwrap_or_default(),
        ]
        .into_iter()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerSettings {
    /// e.g. `en`, `en_GB`, `de`
    #[serde(default)]
    pub locale: Option<String>,
    /// ISO 4217 code, e.g. `USD`
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub vat_number: Option<String>,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub settings: CustomerSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub vat_number: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub address: Address,
}

/// Recipient of a document, used for greeting and email fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl Contact {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

/// An invoice, quote or credit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub kind: DocumentKind,
    pub number: String,
    #[serde(default)]
    pub po_number: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    /// Document-level discount: an amount, or a percentage of the subtotal
    /// when `is_amount_discount` is false.
    #[serde(default)]
    pub discount: f64,
    #[serde(default = "default_true")]
    pub is_amount_discount: bool,
    /// Taxes applied to the discounted subtotal.
    #[serde(default)]
    pub tax_rates: Vec<TaxRate>,
    #[serde(default)]
    pub paid_to_date: f64,
    #[serde(default)]
    pub public_notes: Option<String>,
    #[serde(default)]
    pub terms: Option<String>,
    #[serde(default)]
    pub footer: Option<String>,
    pub customer: Customer,
    pub company: Company,
}

fn default_true() -> bool {
    true
}

fn check_amount(field: &str, value: f64) -> Result<()> {
    if value.is_finite() && value.abs() <= MAX_AMOUNT {
        Ok(())
    } else {
        Err(DocumentError::InvalidData(format!(
            "{} = {} is outside the supported range of +/-{}",
            field, value, MAX_AMOUNT
        )))
    }
}

impl Document {
    /// Reject amounts that are not finite or exceed [`MAX_AMOUNT`].
    pub fn check_amounts(&self) -> Result<()> {
        check_amount("discount", self.discount)?;
        check_amount("paid_to_date", self.paid_to_date)?;
        for tax in &self.tax_rates {
            check_amount("tax_rates.rate", tax.rate)?;
        }
        for (index, item) in self.line_items.iter().enumerate() {
            check_amount(&format!("line_items[{}].quantity", index), item.quantity)?;
            check_amount(&format!("line_items[{}].cost", index), item.cost)?;
            check_amount(&format!("line_items[{}].discount", index), item.discount)?;
            for tax in &item.tax_rates {
                check_amount(&format!("line_items[{}].tax_rates.rate", index), tax.rate)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_lines_skip_blanks() {
        let address = Address {
            address1: Some("1 Main St".to_string()),
            address2: Some("  ".to_string()),
            city: Some("Springfield".to_string()),
            state: None,
            postal_code: Some("12345".to_string()),
            country: Some("US".to_string()),
        };
        assert_eq!(address.lines(), vec!["1 Main St", "Springfield, 12345", "US"]);
    }

    #[test]
    fn deserializes_minimal_document() {
        let doc: Document = serde_json::from_value(serde_json::json!({
            "number": "INV-0001",
            "date": "2024-03-01",
            "line_items": [{ "quantity": 2, "cost": 10.5 }],
            "customer": { "name": "Acme" },
            "company": { "name": "Widgets Ltd" }
        }))
        .unwrap();
        assert_eq!(doc.kind, DocumentKind::Invoice);
        assert!(doc.is_amount_discount);
        assert_eq!(doc.line_items[0].quantity, 2.0);
        assert_eq!(doc.date, NaiveDate::from_ymd_opt(2024, 3, 1));
    }

    #[test]
    fn oversized_amounts_are_invalid() {
        let mut doc = Document {
            line_items: vec![LineItem {
                quantity: 1.0,
                cost: 9.0e16,
                ..LineItem::default()
            }],
            ..Document::default()
        };
        let err = doc.check_amounts().unwrap_err();
        assert_eq!(err.error_type(), "invalid_data");
        assert!(err.to_string().contains("line_items[0].cost"));

        doc.line_items[0].cost = 1500.0;
        assert!(doc.check_amounts().is_ok());

        doc.paid_to_date = f64::NAN;
        assert!(doc.check_amounts().is_err());
    }

    #[test]
    fn contact_full_name_trims() {
        let contact = Contact {
            first_name: "Ada".to_string(),
            last_name: String::new(),
            ..Contact::default()
        };
        assert_eq!(contact.full_name(), "Ada");
    }
}
