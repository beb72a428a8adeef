//! Invoice entity type - billing records embedded in a project

use chrono::{DateTime, NaiveDate, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};

/// Direction of the invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum InvoiceType {
    #[default]
    PmcToClient,
    PmcToContractor,
}

impl std::fmt::Display for InvoiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvoiceType::PmcToClient => write!(f, "pmc_to_client"),
            InvoiceType::PmcToContractor => write!(f, "pmc_to_contractor"),
        }
    }
}

/// Invoice lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Issued,
    Paid,
    Overdue,
    Cancelled,
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvoiceStatus::Draft => write!(f, "draft"),
            InvoiceStatus::Issued => write!(f, "issued"),
            InvoiceStatus::Paid => write!(f, "paid"),
            InvoiceStatus::Overdue => write!(f, "overdue"),
            InvoiceStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// An invoice raised against a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    /// Unique identifier
    pub id: EntityId,

    pub project_id: EntityId,

    pub invoice_number: String,

    #[serde(rename = "type", default)]
    pub invoice_type: InvoiceType,

    pub amount: f64,

    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,

    #[serde(default)]
    pub status: InvoiceStatus,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bill_certification_id: Option<EntityId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone_id: Option<EntityId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_path: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an invoice
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub project_id: EntityId,
    pub invoice_number: String,
    pub invoice_type: InvoiceType,
    pub amount: f64,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: InvoiceStatus,
    pub description: String,
    pub bill_certification_id: Option<EntityId>,
    pub milestone_id: Option<EntityId>,
}

impl NewInvoice {
    pub fn new(
        project_id: EntityId,
        invoice_number: impl Into<String>,
        amount: f64,
        issue_date: NaiveDate,
        due_date: NaiveDate,
    ) -> Self {
        Self {
            project_id,
            invoice_number: invoice_number.into(),
            invoice_type: InvoiceType::default(),
            amount,
            issue_date,
            due_date,
            status: InvoiceStatus::default(),
            description: String::new(),
            bill_certification_id: None,
            milestone_id: None,
        }
    }
}

/// Partial update for an invoice; unset fields are left unchanged
#[derive(Debug, Clone, Default)]
pub struct InvoiceUpdate {
    pub invoice_number: Option<String>,
    pub invoice_type: Option<InvoiceType>,
    pub amount: Option<f64>,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<InvoiceStatus>,
    pub description: Option<String>,
    pub paid_date: Option<NaiveDate>,
    pub payment_method: Option<String>,
    pub document_path: Option<String>,
}

impl InvoiceUpdate {
    /// Shallow-merge the set fields onto an existing record
    pub fn apply(self, invoice: &mut Invoice) {
        if let Some(number) = self.invoice_number {
            invoice.invoice_number = number;
        }
        if let Some(invoice_type) = self.invoice_type {
            invoice.invoice_type = invoice_type;
        }
        if let Some(amount) = self.amount {
            invoice.amount = amount;
        }
        if let Some(date) = self.issue_date {
            invoice.issue_date = date;
        }
        if let Some(date) = self.due_date {
            invoice.due_date = date;
        }
        if let Some(status) = self.status {
            invoice.status = status;
        }
        if let Some(description) = self.description {
            invoice.description = description;
        }
        if let Some(date) = self.paid_date {
            invoice.paid_date = Some(date);
        }
        if let Some(method) = self.payment_method {
            invoice.payment_method = Some(method);
        }
        if let Some(path) = self.document_path {
            invoice.document_path = Some(path);
        }
    }
}

impl Entity for Invoice {
    const PREFIX: &'static str = "INV";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn label(&self) -> &str {
        &self.invoice_number
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl Invoice {
    /// Create an invoice with fresh id and timestamps
    pub fn new(input: NewInvoice) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::new(EntityPrefix::Inv),
            project_id: input.project_id,
            invoice_number: input.invoice_number,
            invoice_type: input.invoice_type,
            amount: input.amount,
            issue_date: input.issue_date,
            due_date: input.due_date,
            status: input.status,
            description: input.description,
            bill_certification_id: input.bill_certification_id,
            milestone_id: input.milestone_id,
            paid_date: None,
            payment_method: None,
            document_path: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_invoice_roundtrip() {
        let inv = Invoice::new(NewInvoice::new(
            EntityId::new(EntityPrefix::Prj),
            "INV-2025-001",
            85_000.0,
            date(2025, 4, 1),
            date(2025, 5, 1),
        ));

        let json = serde_json::to_string(&inv).unwrap();
        let parsed: Invoice = serde_json::from_str(&json).unwrap();

        assert_eq!(inv.id, parsed.id);
        assert_eq!(parsed.status, InvoiceStatus::Draft);
        assert_eq!(parsed.invoice_type, InvoiceType::PmcToClient);
    }

    #[test]
    fn test_invoice_type_serializes_snake_case() {
        let json = serde_json::to_string(&InvoiceType::PmcToContractor).unwrap();
        assert_eq!(json, "\"pmc_to_contractor\"");
    }

    #[test]
    fn test_invoice_update_records_payment() {
        let mut inv = Invoice::new(NewInvoice::new(
            EntityId::new(EntityPrefix::Prj),
            "INV-2025-001",
            85_000.0,
            date(2025, 4, 1),
            date(2025, 5, 1),
        ));

        InvoiceUpdate {
            status: Some(InvoiceStatus::Paid),
            paid_date: Some(date(2025, 4, 20)),
            payment_method: Some("bank transfer".to_string()),
            ..Default::default()
        }
        .apply(&mut inv);

        assert_eq!(inv.status, InvoiceStatus::Paid);
        assert_eq!(inv.paid_date, Some(date(2025, 4, 20)));
        assert_eq!(inv.amount, 85_000.0);
    }
}
