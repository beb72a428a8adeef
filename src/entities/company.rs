//! Company entity type - the multi-tenancy root

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};

/// A folder inside a company's default folder template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Folder {
    pub name: String,
    pub path: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Folder>,
}

/// Named folder tree applied to new projects
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FolderStructure {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub folders: Vec<Folder>,
}

/// A company: owns projects and users by reference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    /// Unique identifier
    pub id: EntityId,

    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,

    /// Folder template applied when a project is created
    #[serde(default)]
    pub default_folder_structure: FolderStructure,

    /// Name of the report template used for project exports
    #[serde(default = "default_report_template")]
    pub default_report_template: String,

    pub active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_report_template() -> String {
    "standard".to_string()
}

/// Input for creating a company
#[derive(Debug, Clone)]
pub struct NewCompany {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub logo: Option<String>,
    pub default_folder_structure: FolderStructure,
    pub default_report_template: String,
    pub active: bool,
}

impl NewCompany {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: String::new(),
            phone: String::new(),
            email: String::new(),
            logo: None,
            default_folder_structure: FolderStructure::default(),
            default_report_template: default_report_template(),
            active: true,
        }
    }
}

/// Partial update for a company; unset fields are left unchanged
#[derive(Debug, Clone, Default)]
pub struct CompanyUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub logo: Option<String>,
    pub default_folder_structure: Option<FolderStructure>,
    pub default_report_template: Option<String>,
    pub active: Option<bool>,
}

impl CompanyUpdate {
    /// Shallow-merge the set fields onto an existing record
    pub fn apply(self, company: &mut Company) {
        if let Some(name) = self.name {
            company.name = name;
        }
        if let Some(address) = self.address {
            company.address = address;
        }
        if let Some(phone) = self.phone {
            company.phone = phone;
        }
        if let Some(email) = self.email {
            company.email = email;
        }
        if let Some(logo) = self.logo {
            company.logo = Some(logo);
        }
        if let Some(fs) = self.default_folder_structure {
            company.default_folder_structure = fs;
        }
        if let Some(t) = self.default_report_template {
            company.default_report_template = t;
        }
        if let Some(active) = self.active {
            company.active = active;
        }
    }
}

impl Entity for Company {
    const PREFIX: &'static str = "CO";

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

impl Company {
    /// Create a company with fresh id and timestamps
    pub fn new(input: NewCompany) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::new(EntityPrefix::Co),
            name: input.name,
            address: input.address,
            phone: input.phone,
            email: input.email,
            logo: input.logo,
            default_folder_structure: input.default_folder_structure,
            default_report_template: input.default_report_template,
            active: input.active,
            created_at: now,
            updated_at: now,
        }
    }
}
