//! Project team member - the join between a user and a project

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::identity::{EntityId, EntityPrefix};

/// An assignment of a user to a project, embedded in `Project::team`.
/// The `user_id` may stop resolving if the user is deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectTeamMember {
    pub id: EntityId,
    pub user_id: EntityId,
    pub project_id: EntityId,

    /// Free-form role label on this project (distinct from the user's
    /// access-control role)
    #[serde(default)]
    pub role: String,

    /// Allocation percentage of the member's time
    pub allocation: u8,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hourly_rate: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_cost: Option<f64>,

    pub joined_date: NaiveDate,

    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl ProjectTeamMember {
    pub fn new(
        user_id: EntityId,
        project_id: EntityId,
        role: impl Into<String>,
        allocation: u8,
    ) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Tm),
            user_id,
            project_id,
            role: role.into(),
            allocation: allocation.min(100),
            hourly_rate: None,
            monthly_cost: None,
            joined_date: Utc::now().date_naive(),
            is_active: true,
        }
    }

    /// Effective hourly rate for cost views: the assignment override wins
    /// over the user's own rate
    pub fn effective_hourly_rate(&self, user_rate: Option<f64>) -> Option<f64> {
        self.hourly_rate.or(user_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_roundtrip() {
        let member = ProjectTeamMember::new(
            EntityId::new(EntityPrefix::Usr),
            EntityId::new(EntityPrefix::Prj),
            "Site engineer",
            60,
        );

        let json = serde_json::to_string(&member).unwrap();
        let parsed: ProjectTeamMember = serde_json::from_str(&json).unwrap();

        assert_eq!(member.id, parsed.id);
        assert_eq!(parsed.allocation, 60);
        assert!(parsed.is_active);
    }

    #[test]
    fn test_allocation_is_clamped() {
        let member = ProjectTeamMember::new(
            EntityId::new(EntityPrefix::Usr),
            EntityId::new(EntityPrefix::Prj),
            "Lead",
            130,
        );
        assert_eq!(member.allocation, 100);
    }

    #[test]
    fn test_effective_hourly_rate_prefers_override() {
        let mut member = ProjectTeamMember::new(
            EntityId::new(EntityPrefix::Usr),
            EntityId::new(EntityPrefix::Prj),
            "Lead",
            50,
        );
        assert_eq!(member.effective_hourly_rate(Some(80.0)), Some(80.0));

        member.hourly_rate = Some(95.0);
        assert_eq!(member.effective_hourly_rate(Some(80.0)), Some(95.0));
    }
}
