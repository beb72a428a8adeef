//! Project entity type - the aggregate root for most business data
//!
//! A project's embedded collections (team, milestones, invoices, documents,
//! inspections) are the only durable home for those records. Deleting a
//! project therefore removes all of them; deleting a referenced company or
//! user does not, so readers must tolerate ids that no longer resolve.

use chrono::{DateTime, NaiveDate, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::core::entity::{Entity, Priority};
use crate::core::identity::{EntityId, EntityPrefix};
use crate::entities::company::FolderStructure;
use crate::entities::document::DocumentReference;
use crate::entities::inspection::Inspection;
use crate::entities::invoice::Invoice;
use crate::entities::milestone::Milestone;
use crate::entities::team_member::ProjectTeamMember;

/// Engagement type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum ProjectType {
    Architecture,
    Pmc,
    DesignPmc,
    Liaising,
}

impl std::fmt::Display for ProjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectType::Architecture => write!(f, "architecture"),
            ProjectType::Pmc => write!(f, "pmc"),
            ProjectType::DesignPmc => write!(f, "design_pmc"),
            ProjectType::Liaising => write!(f, "liaising"),
        }
    }
}

/// Project lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Planning,
    Active,
    OnHold,
    Completed,
    Cancelled,
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectStatus::Planning => write!(f, "planning"),
            ProjectStatus::Active => write!(f, "active"),
            ProjectStatus::OnHold => write!(f, "on_hold"),
            ProjectStatus::Completed => write!(f, "completed"),
            ProjectStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// How the fee is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FeeType {
    #[default]
    Fixed,
    Percentage,
    Hourly,
    MilestoneBased,
}

impl std::fmt::Display for FeeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeeType::Fixed => write!(f, "fixed"),
            FeeType::Percentage => write!(f, "percentage"),
            FeeType::Hourly => write!(f, "hourly"),
            FeeType::MilestoneBased => write!(f, "milestone_based"),
        }
    }
}

/// Fee arrangement for a project
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeeStructure {
    #[serde(rename = "type", default)]
    pub fee_type: FeeType,

    #[serde(default)]
    pub amount: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
}

/// A project and everything embedded in it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier
    pub id: EntityId,

    pub name: String,

    #[serde(default)]
    pub description: String,

    pub company_id: EntityId,

    #[serde(rename = "type")]
    pub project_type: ProjectType,

    #[serde(default)]
    pub status: ProjectStatus,

    #[serde(default)]
    pub priority: Priority,

    /// Lead architect; may no longer resolve to a stored user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_lead_architect_id: Option<EntityId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,

    /// Planned duration in days
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<u32>,

    #[serde(default)]
    pub total_fee: f64,

    #[serde(default)]
    pub fee_structure: FeeStructure,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub folder_path: String,

    #[serde(default)]
    pub folder_structure: FolderStructure,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub team: Vec<ProjectTeamMember>,

    #[serde(default)]
    pub milestones: Vec<Milestone>,

    #[serde(default)]
    pub invoices: Vec<Invoice>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub documents: Vec<DocumentReference>,

    /// Project-level inspections (those not anchored to a milestone).
    /// Absent until the first one is created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inspections: Option<Vec<Inspection>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a project
#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub description: String,
    pub company_id: EntityId,
    pub project_type: ProjectType,
    pub status: ProjectStatus,
    pub priority: Priority,
    pub team_lead_architect_id: Option<EntityId>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub estimated_duration: Option<u32>,
    pub total_fee: f64,
    pub fee_structure: FeeStructure,
    pub folder_path: String,
    pub folder_structure: FolderStructure,
}

impl NewProject {
    pub fn new(
        name: impl Into<String>,
        company_id: EntityId,
        project_type: ProjectType,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            company_id,
            project_type,
            status: ProjectStatus::default(),
            priority: Priority::default(),
            team_lead_architect_id: None,
            start_date: None,
            end_date: None,
            estimated_duration: None,
            total_fee: 0.0,
            fee_structure: FeeStructure::default(),
            folder_path: String::new(),
            folder_structure: FolderStructure::default(),
        }
    }
}

/// Partial update for a project's scalar fields; embedded collections are
/// managed through their own repository operations
#[derive(Debug, Clone, Default)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub project_type: Option<ProjectType>,
    pub status: Option<ProjectStatus>,
    pub priority: Option<Priority>,
    pub team_lead_architect_id: Option<EntityId>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub estimated_duration: Option<u32>,
    pub total_fee: Option<f64>,
    pub fee_structure: Option<FeeStructure>,
    pub folder_path: Option<String>,
}

impl ProjectUpdate {
    /// Shallow-merge the set fields onto an existing record
    pub fn apply(self, project: &mut Project) {
        if let Some(name) = self.name {
            project.name = name;
        }
        if let Some(description) = self.description {
            project.description = description;
        }
        if let Some(project_type) = self.project_type {
            project.project_type = project_type;
        }
        if let Some(status) = self.status {
            project.status = status;
        }
        if let Some(priority) = self.priority {
            project.priority = priority;
        }
        if let Some(id) = self.team_lead_architect_id {
            project.team_lead_architect_id = Some(id);
        }
        if let Some(date) = self.start_date {
            project.start_date = Some(date);
        }
        if let Some(date) = self.end_date {
            project.end_date = Some(date);
        }
        if let Some(days) = self.estimated_duration {
            project.estimated_duration = Some(days);
        }
        if let Some(fee) = self.total_fee {
            project.total_fee = fee;
        }
        if let Some(fee_structure) = self.fee_structure {
            project.fee_structure = fee_structure;
        }
        if let Some(path) = self.folder_path {
            project.folder_path = path;
        }
    }
}

impl Entity for Project {
    const PREFIX: &'static str = "PRJ";

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

impl Project {
    /// Create a project with fresh id, timestamps and empty collections
    pub fn new(input: NewProject) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::new(EntityPrefix::Prj),
            name: input.name,
            description: input.description,
            company_id: input.company_id,
            project_type: input.project_type,
            status: input.status,
            priority: input.priority,
            team_lead_architect_id: input.team_lead_architect_id,
            start_date: input.start_date,
            end_date: input.end_date,
            estimated_duration: input.estimated_duration,
            total_fee: input.total_fee,
            fee_structure: input.fee_structure,
            folder_path: input.folder_path,
            folder_structure: input.folder_structure,
            team: Vec::new(),
            milestones: Vec::new(),
            invoices: Vec::new(),
            documents: Vec::new(),
            inspections: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// All inspections on this project, both project-level and
    /// milestone-level, each exactly once
    pub fn all_inspections(&self) -> impl Iterator<Item = &Inspection> {
        self.inspections
            .iter()
            .flatten()
            .chain(self.milestones.iter().flat_map(|m| m.inspections.iter().flatten()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_roundtrip() {
        let company_id = EntityId::new(EntityPrefix::Co);
        let project = Project::new(NewProject::new(
            "Riverside Tower",
            company_id.clone(),
            ProjectType::DesignPmc,
        ));

        let json = serde_json::to_string(&project).unwrap();
        let parsed: Project = serde_json::from_str(&json).unwrap();

        assert_eq!(project.id, parsed.id);
        assert_eq!(parsed.company_id, company_id);
        assert_eq!(parsed.status, ProjectStatus::Planning);
        assert!(parsed.milestones.is_empty());
        assert!(parsed.inspections.is_none());
    }

    #[test]
    fn test_project_type_serializes_snake_case() {
        let json = serde_json::to_string(&ProjectType::DesignPmc).unwrap();
        assert_eq!(json, "\"design_pmc\"");
    }

    #[test]
    fn test_project_update_keeps_collections() {
        let mut project = Project::new(NewProject::new(
            "Riverside Tower",
            EntityId::new(EntityPrefix::Co),
            ProjectType::Pmc,
        ));

        ProjectUpdate {
            status: Some(ProjectStatus::Active),
            total_fee: Some(125_000.0),
            ..Default::default()
        }
        .apply(&mut project);

        assert_eq!(project.status, ProjectStatus::Active);
        assert_eq!(project.total_fee, 125_000.0);
        assert_eq!(project.name, "Riverside Tower");
    }
}
