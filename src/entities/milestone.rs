//! Milestone entity type - an ordered project phase with owned tasks

use chrono::{DateTime, NaiveDate, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::entities::inspection::Inspection;
use crate::entities::task::Task;

/// Milestone progress status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum MilestoneStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    Delayed,
    Cancelled,
}

impl std::fmt::Display for MilestoneStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MilestoneStatus::NotStarted => write!(f, "not_started"),
            MilestoneStatus::InProgress => write!(f, "in_progress"),
            MilestoneStatus::Completed => write!(f, "completed"),
            MilestoneStatus::Delayed => write!(f, "delayed"),
            MilestoneStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Status of a bill certification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CertificationStatus {
    #[default]
    Draft,
    Submitted,
    Approved,
    Rejected,
    Paid,
}

impl std::fmt::Display for CertificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CertificationStatus::Draft => write!(f, "draft"),
            CertificationStatus::Submitted => write!(f, "submitted"),
            CertificationStatus::Approved => write!(f, "approved"),
            CertificationStatus::Rejected => write!(f, "rejected"),
            CertificationStatus::Paid => write!(f, "paid"),
        }
    }
}

/// A certified bill against a milestone, issued to back an invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillCertification {
    pub id: EntityId,
    pub project_id: EntityId,
    pub milestone_id: EntityId,
    pub certification_number: String,
    pub amount: f64,
    pub certification_date: NaiveDate,
    pub certifying_authority: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub status: CertificationStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_path: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BillCertification {
    pub fn new(
        project_id: EntityId,
        milestone_id: EntityId,
        certification_number: impl Into<String>,
        amount: f64,
        certification_date: NaiveDate,
        certifying_authority: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::new(EntityPrefix::Cert),
            project_id,
            milestone_id,
            certification_number: certification_number.into(),
            amount,
            certification_date,
            certifying_authority: certifying_authority.into(),
            description: String::new(),
            status: CertificationStatus::default(),
            document_path: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A project phase with an ordered position, completion percentage and
/// owned tasks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Milestone {
    /// Unique identifier
    pub id: EntityId,

    pub project_id: EntityId,

    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Position in the project's milestone sequence
    pub order: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,

    #[serde(default)]
    pub status: MilestoneStatus,

    /// 0-100
    #[serde(default)]
    pub completion_percentage: u8,

    #[serde(default)]
    pub tasks: Vec<Task>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bill_certifications: Vec<BillCertification>,

    /// Milestone-level inspections. Absent until the first one is created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inspections: Option<Vec<Inspection>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_amount: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_start_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_end_date: Option<NaiveDate>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a milestone
#[derive(Debug, Clone)]
pub struct NewMilestone {
    pub project_id: EntityId,
    pub name: String,
    pub description: String,
    pub order: u32,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: MilestoneStatus,
    pub completion_percentage: u8,
    pub invoice_amount: Option<f64>,
}

impl NewMilestone {
    pub fn new(project_id: EntityId, name: impl Into<String>, order: u32) -> Self {
        Self {
            project_id,
            name: name.into(),
            description: String::new(),
            order,
            start_date: None,
            end_date: None,
            status: MilestoneStatus::default(),
            completion_percentage: 0,
            invoice_amount: None,
        }
    }
}

/// Partial update for a milestone; unset fields are left unchanged
#[derive(Debug, Clone, Default)]
pub struct MilestoneUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub order: Option<u32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<MilestoneStatus>,
    pub completion_percentage: Option<u8>,
    pub invoice_amount: Option<f64>,
    pub actual_start_date: Option<NaiveDate>,
    pub actual_end_date: Option<NaiveDate>,
}

impl MilestoneUpdate {
    /// Shallow-merge the set fields onto an existing record
    pub fn apply(self, milestone: &mut Milestone) {
        if let Some(name) = self.name {
            milestone.name = name;
        }
        if let Some(description) = self.description {
            milestone.description = description;
        }
        if let Some(order) = self.order {
            milestone.order = order;
        }
        if let Some(date) = self.start_date {
            milestone.start_date = Some(date);
        }
        if let Some(date) = self.end_date {
            milestone.end_date = Some(date);
        }
        if let Some(status) = self.status {
            milestone.status = status;
        }
        if let Some(pct) = self.completion_percentage {
            milestone.completion_percentage = pct.min(100);
        }
        if let Some(amount) = self.invoice_amount {
            milestone.invoice_amount = Some(amount);
        }
        if let Some(date) = self.actual_start_date {
            milestone.actual_start_date = Some(date);
        }
        if let Some(date) = self.actual_end_date {
            milestone.actual_end_date = Some(date);
        }
    }
}

impl Entity for Milestone {
    const PREFIX: &'static str = "MS";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn label(&self) -> &str {
        &self.name
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl Milestone {
    /// Create a milestone with fresh id and timestamps
    pub fn new(input: NewMilestone) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::new(EntityPrefix::Ms),
            project_id: input.project_id,
            name: input.name,
            description: input.description,
            order: input.order,
            start_date: input.start_date,
            end_date: input.end_date,
            status: input.status,
            completion_percentage: input.completion_percentage.min(100),
            tasks: Vec::new(),
            bill_certifications: Vec::new(),
            inspections: None,
            invoice_amount: input.invoice_amount,
            actual_start_date: None,
            actual_end_date: None,
            created_at: now,
            updated_at: now,
        }
    }
}
