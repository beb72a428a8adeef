//! User entity type and the fixed role set

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};

/// The single role a user holds. Permission decisions are keyed by this.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum, PartialOrd, Ord,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum Role {
    Management,
    PmcHead,
    TeamLeadArchitect,
    Architect,
    Engineer,
    SiteEngineer,
    Accounts,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Management => write!(f, "management"),
            Role::PmcHead => write!(f, "pmc_head"),
            Role::TeamLeadArchitect => write!(f, "team_lead_architect"),
            Role::Architect => write!(f, "architect"),
            Role::Engineer => write!(f, "engineer"),
            Role::SiteEngineer => write!(f, "site_engineer"),
            Role::Accounts => write!(f, "accounts"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "management" => Ok(Role::Management),
            "pmc_head" => Ok(Role::PmcHead),
            "team_lead_architect" => Ok(Role::TeamLeadArchitect),
            "architect" => Ok(Role::Architect),
            "engineer" => Ok(Role::Engineer),
            "site_engineer" => Ok(Role::SiteEngineer),
            "accounts" => Ok(Role::Accounts),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// A user account. Referenced by id from project teams and the session;
/// deleting a user does not clean those references up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: EntityId,

    pub name: String,
    pub email: String,
    pub role: Role,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<EntityId>,

    /// Projects this user is assigned to
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<EntityId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hourly_rate: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_cost: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,

    pub active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub company_id: Option<EntityId>,
    pub hourly_rate: Option<f64>,
    pub monthly_cost: Option<f64>,
    pub active: bool,
}

impl NewUser {
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            role,
            company_id: None,
            hourly_rate: None,
            monthly_cost: None,
            active: true,
        }
    }
}

/// Partial update for a user; unset fields are left unchanged
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub company_id: Option<EntityId>,
    pub projects: Option<Vec<EntityId>>,
    pub hourly_rate: Option<f64>,
    pub monthly_cost: Option<f64>,
    pub avatar: Option<String>,
    pub active: Option<bool>,
}

impl UserUpdate {
    /// Shallow-merge the set fields onto an existing record
    pub fn apply(self, user: &mut User) {
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        if let Some(company_id) = self.company_id {
            user.company_id = Some(company_id);
        }
        if let Some(projects) = self.projects {
            user.projects = projects;
        }
        if let Some(rate) = self.hourly_rate {
            user.hourly_rate = Some(rate);
        }
        if let Some(cost) = self.monthly_cost {
            user.monthly_cost = Some(cost);
        }
        if let Some(avatar) = self.avatar {
            user.avatar = Some(avatar);
        }
        if let Some(active) = self.active {
            user.active = active;
        }
    }
}

impl Entity for User {
    const PREFIX: &'static str = "USR";

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

impl User {
    /// Create a user with fresh id and timestamps
    pub fn new(input: NewUser) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::new(EntityPrefix::Usr),
            name: input.name,
            email: input.email,
            role: input.role,
            company_id: input.company_id,
            projects: Vec::new(),
            hourly_rate: input.hourly_rate,
            monthly_cost: input.monthly_cost,
            avatar: None,
            active: input.active,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_roundtrip() {
        let user = User::new(NewUser::new("Alice", "alice@acme.com", Role::Admin));

        let json = serde_json::to_string(&user).unwrap();
        let parsed: User = serde_json::from_str(&json).unwrap();

        assert_eq!(user.id, parsed.id);
        assert_eq!(parsed.role, Role::Admin);
    }

    #[test]
    fn test_role_serializes_snake_case() {
        let json = serde_json::to_string(&Role::TeamLeadArchitect).unwrap();
        assert_eq!(json, "\"team_lead_architect\"");
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("pmc_head".parse::<Role>().unwrap(), Role::PmcHead);
        assert_eq!("SITE_ENGINEER".parse::<Role>().unwrap(), Role::SiteEngineer);
        assert!("foreman".parse::<Role>().is_err());
    }

    #[test]
    fn test_user_update_keeps_unset_fields() {
        let mut user = User::new(NewUser::new("Alice", "alice@acme.com", Role::Engineer));

        UserUpdate {
            role: Some(Role::Architect),
            ..Default::default()
        }
        .apply(&mut user);

        assert_eq!(user.role, Role::Architect);
        assert_eq!(user.email, "alice@acme.com");
        assert!(user.active);
    }
}
