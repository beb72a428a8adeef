//! Inspection entity type
//!
//! An inspection carries two orthogonal state machines: `status` tracks
//! scheduling, `compliance` tracks the audit outcome. The record is anchored
//! either to a milestone or to the project itself; see
//! [`crate::core::repository`] for the anchoring rules.

use chrono::{DateTime, NaiveDate, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};

/// Scheduling state of an inspection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum InspectionStatus {
    #[default]
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl std::fmt::Display for InspectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InspectionStatus::Scheduled => write!(f, "scheduled"),
            InspectionStatus::InProgress => write!(f, "in_progress"),
            InspectionStatus::Completed => write!(f, "completed"),
            InspectionStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Audit outcome, independent of scheduling state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum ComplianceStatus {
    Compliant,
    NonCompliant,
    PartiallyCompliant,
    #[default]
    PendingReview,
}

impl std::fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComplianceStatus::Compliant => write!(f, "compliant"),
            ComplianceStatus::NonCompliant => write!(f, "non_compliant"),
            ComplianceStatus::PartiallyCompliant => write!(f, "partially_compliant"),
            ComplianceStatus::PendingReview => write!(f, "pending_review"),
        }
    }
}

/// A site or design inspection record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inspection {
    /// Unique identifier
    pub id: EntityId,

    pub project_id: EntityId,

    /// Requested anchor; resolves to a milestone home only if this id
    /// matches an existing milestone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone_id: Option<EntityId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<EntityId>,

    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Inspector; may no longer resolve to a stored user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inspector_id: Option<EntityId>,

    pub inspection_date: NaiveDate,

    #[serde(default)]
    pub status: InspectionStatus,

    #[serde(default)]
    pub compliance: ComplianceStatus,

    #[serde(default)]
    pub observations: String,

    #[serde(default)]
    pub recommendations: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photos: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_inspection_date: Option<NaiveDate>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an inspection
#[derive(Debug, Clone)]
pub struct NewInspection {
    pub project_id: EntityId,
    pub milestone_id: Option<EntityId>,
    pub task_id: Option<EntityId>,
    pub title: String,
    pub description: String,
    pub inspector_id: Option<EntityId>,
    pub inspection_date: NaiveDate,
    pub status: InspectionStatus,
    pub compliance: ComplianceStatus,
}

impl NewInspection {
    pub fn new(
        project_id: EntityId,
        title: impl Into<String>,
        inspection_date: NaiveDate,
    ) -> Self {
        Self {
            project_id,
            milestone_id: None,
            task_id: None,
            title: title.into(),
            description: String::new(),
            inspector_id: None,
            inspection_date,
            status: InspectionStatus::default(),
            compliance: ComplianceStatus::default(),
        }
    }
}

/// Partial update for an inspection; unset fields are left unchanged
#[derive(Debug, Clone, Default)]
pub struct InspectionUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub inspector_id: Option<EntityId>,
    pub inspection_date: Option<NaiveDate>,
    pub status: Option<InspectionStatus>,
    pub compliance: Option<ComplianceStatus>,
    pub observations: Option<String>,
    pub recommendations: Option<String>,
    pub photos: Option<Vec<String>>,
    pub report_path: Option<String>,
    pub next_inspection_date: Option<NaiveDate>,
}

impl InspectionUpdate {
    /// Shallow-merge the set fields onto an existing record
    pub fn apply(self, inspection: &mut Inspection) {
        if let Some(title) = self.title {
            inspection.title = title;
        }
        if let Some(description) = self.description {
            inspection.description = description;
        }
        if let Some(inspector) = self.inspector_id {
            inspection.inspector_id = Some(inspector);
        }
        if let Some(date) = self.inspection_date {
            inspection.inspection_date = date;
        }
        if let Some(status) = self.status {
            inspection.status = status;
        }
        if let Some(compliance) = self.compliance {
            inspection.compliance = compliance;
        }
        if let Some(observations) = self.observations {
            inspection.observations = observations;
        }
        if let Some(recommendations) = self.recommendations {
            inspection.recommendations = recommendations;
        }
        if let Some(photos) = self.photos {
            inspection.photos = photos;
        }
        if let Some(path) = self.report_path {
            inspection.report_path = Some(path);
        }
        if let Some(date) = self.next_inspection_date {
            inspection.next_inspection_date = Some(date);
        }
    }
}

impl Entity for Inspection {
    const PREFIX: &'static str = "INSP";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn label(&self) -> &str {
        &self.title
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl Inspection {
    /// Create an inspection with fresh id and timestamps
    pub fn new(input: NewInspection) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::new(EntityPrefix::Insp),
            project_id: input.project_id,
            milestone_id: input.milestone_id,
            task_id: input.task_id,
            title: input.title,
            description: input.description,
            inspector_id: input.inspector_id,
            inspection_date: input.inspection_date,
            status: input.status,
            compliance: input.compliance,
            observations: String::new(),
            recommendations: String::new(),
            photos: Vec::new(),
            report_path: None,
            next_inspection_date: None,
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
    fn test_inspection_roundtrip() {
        let insp = Inspection::new(NewInspection::new(
            EntityId::new(EntityPrefix::Prj),
            "Slab reinforcement check",
            date(2025, 6, 12),
        ));

        let json = serde_json::to_string(&insp).unwrap();
        let parsed: Inspection = serde_json::from_str(&json).unwrap();

        assert_eq!(insp.id, parsed.id);
        assert_eq!(parsed.status, InspectionStatus::Scheduled);
        assert_eq!(parsed.compliance, ComplianceStatus::PendingReview);
    }

    #[test]
    fn test_states_are_independent() {
        let mut insp = Inspection::new(NewInspection::new(
            EntityId::new(EntityPrefix::Prj),
            "Facade mockup",
            date(2025, 6, 12),
        ));

        // Completing the visit does not touch the audit outcome
        InspectionUpdate {
            status: Some(InspectionStatus::Completed),
            ..Default::default()
        }
        .apply(&mut insp);
        assert_eq!(insp.status, InspectionStatus::Completed);
        assert_eq!(insp.compliance, ComplianceStatus::PendingReview);

        // And recording the outcome does not touch scheduling
        InspectionUpdate {
            compliance: Some(ComplianceStatus::NonCompliant),
            ..Default::default()
        }
        .apply(&mut insp);
        assert_eq!(insp.status, InspectionStatus::Completed);
        assert_eq!(insp.compliance, ComplianceStatus::NonCompliant);
    }
}
