//! Role-based access control and the login session
//!
//! Permission decisions come from one static table mapping a (resource,
//! action) pair to the set of roles allowed to perform it. A pair that is
//! not in the table is denied for every role. The data layer never consults
//! this module; callers check before invoking mutating repository
//! operations.

use clap::ValueEnum;

use crate::core::repository::{RepoError, Repository};
use crate::entities::{Role, User};

/// Named resources that permissions are granted on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Resource {
    Projects,
    Teams,
    Financials,
    Users,
    Inspections,
    Invoices,
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resource::Projects => write!(f, "projects"),
            Resource::Teams => write!(f, "teams"),
            Resource::Financials => write!(f, "financials"),
            Resource::Users => write!(f, "users"),
            Resource::Inspections => write!(f, "inspections"),
            Resource::Invoices => write!(f, "invoices"),
        }
    }
}

/// Actions that can be performed on a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
    Manage,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::View => write!(f, "view"),
            Action::Create => write!(f, "create"),
            Action::Edit => write!(f, "edit"),
            Action::Delete => write!(f, "delete"),
            Action::Manage => write!(f, "manage"),
        }
    }
}

/// Roles allowed to perform an action on a resource. `None` means the pair
/// is unmapped and therefore denied for everyone. Admin counts as
/// management-equivalent on the projects rows; everywhere else a role is
/// allowed only where it is listed.
pub fn allowed_roles(resource: Resource, action: Action) -> Option<&'static [Role]> {
    use Role::*;
    match (resource, action) {
        (Resource::Projects, Action::View) => Some(&[
            Management,
            PmcHead,
            TeamLeadArchitect,
            Architect,
            Engineer,
            SiteEngineer,
            Admin,
        ]),
        (Resource::Projects, Action::Edit) => {
            Some(&[Management, PmcHead, TeamLeadArchitect, Admin])
        }
        (Resource::Projects, Action::Create) => {
            Some(&[Management, PmcHead, TeamLeadArchitect, Admin])
        }
        (Resource::Projects, Action::Delete) => Some(&[Management, Admin]),

        (Resource::Teams, Action::View) => Some(&[Management, PmcHead, TeamLeadArchitect]),
        (Resource::Teams, Action::Manage) => Some(&[Management, PmcHead, TeamLeadArchitect]),

        (Resource::Financials, Action::View) => Some(&[Management, PmcHead, Accounts]),
        (Resource::Financials, Action::Edit) => Some(&[Management, Accounts]),

        (Resource::Users, Action::View) => Some(&[Management, PmcHead, Admin]),
        (Resource::Users, Action::Manage) => Some(&[Management, Admin]),

        (Resource::Inspections, Action::View) => Some(&[
            Management,
            PmcHead,
            TeamLeadArchitect,
            Architect,
            Engineer,
            SiteEngineer,
        ]),
        (Resource::Inspections, Action::Create) => Some(&[TeamLeadArchitect, SiteEngineer]),
        (Resource::Inspections, Action::Edit) => Some(&[TeamLeadArchitect, SiteEngineer]),

        (Resource::Invoices, Action::View) => Some(&[Management, PmcHead, Accounts]),
        (Resource::Invoices, Action::Create) => Some(&[Accounts, PmcHead]),
        (Resource::Invoices, Action::Edit) => Some(&[Accounts]),

        _ => None,
    }
}

/// The current login session, constructed by the caller and passed where
/// needed. Holds at most one user.
#[derive(Debug, Default)]
pub struct Session {
    user: Option<User>,
}

impl Session {
    /// An empty session with nobody logged in
    pub fn anonymous() -> Self {
        Self { user: None }
    }

    /// Restore the persisted session, re-validating the stored user against
    /// the user store. A session whose user no longer resolves is discarded.
    pub fn restore(repo: &Repository) -> Result<Self, RepoError> {
        let Some(stored) = repo.load_session()? else {
            return Ok(Self::anonymous());
        };
        match repo.user_by_id(&stored.id)? {
            Some(current) => Ok(Self {
                user: Some(current),
            }),
            None => {
                repo.clear_session()?;
                Ok(Self::anonymous())
            }
        }
    }

    /// Look up a user by email and establish the session. The password is
    /// accepted unchecked; this is a local-first placeholder, not a
    /// security boundary. Succeeds iff an active user with that email
    /// exists.
    pub fn login(
        &mut self,
        repo: &Repository,
        email: &str,
        _password: &str,
    ) -> Result<bool, RepoError> {
        let Some(user) = repo.user_by_email(email)?.filter(|u| u.active) else {
            return Ok(false);
        };
        repo.save_session(&user)?;
        self.user = Some(user);
        Ok(true)
    }

    /// Drop the session, in memory and on disk
    pub fn logout(&mut self, repo: &Repository) -> Result<(), RepoError> {
        self.user = None;
        repo.clear_session()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Membership test of the current user's role
    pub fn has_role(&self, role: Role) -> bool {
        self.user.as_ref().is_some_and(|u| u.role == role)
    }

    /// Membership test against a set of roles
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        self.user.as_ref().is_some_and(|u| roles.contains(&u.role))
    }

    /// False without a session user, false for an unmapped pair, otherwise
    /// true iff the user's role is in the mapped set
    pub fn can_access(&self, resource: Resource, action: Action) -> bool {
        if self.user.is_none() {
            return false;
        }
        let Some(roles) = allowed_roles(resource, action) else {
            return false;
        };
        self.has_any_role(roles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::Store;
    use crate::entities::{NewCompany, NewUser, UserUpdate};
    use tempfile::TempDir;

    fn test_repo() -> (TempDir, Repository) {
        let tmp = TempDir::new().unwrap();
        let repo = Repository::with_store(Store::at(tmp.path().to_path_buf()));
        (tmp, repo)
    }

    fn session_for(role: Role) -> (TempDir, Repository, Session) {
        let (tmp, repo) = test_repo();
        let email = format!("{}@acme.com", role);
        repo.create_user(NewUser::new("Test", email.clone(), role))
            .unwrap();
        let mut session = Session::anonymous();
        assert!(session.login(&repo, &email, "unchecked").unwrap());
        (tmp, repo, session)
    }

    #[test]
    fn test_no_session_denies_everything() {
        let session = Session::anonymous();
        assert!(!session.can_access(Resource::Projects, Action::View));
        assert!(!session.has_role(Role::Admin));
    }

    #[test]
    fn test_unmapped_pair_denied_for_every_role() {
        // projects/manage is not in the table: deny regardless of role
        for role in Role::value_variants() {
            let (_tmp, _repo, session) = session_for(*role);
            assert!(!session.can_access(Resource::Projects, Action::Manage));
            assert!(!session.can_access(Resource::Teams, Action::Delete));
        }
    }

    #[test]
    fn test_mapped_pairs_match_table_exactly() {
        let pairs = [
            (Resource::Projects, Action::View),
            (Resource::Projects, Action::Create),
            (Resource::Projects, Action::Delete),
            (Resource::Teams, Action::Manage),
            (Resource::Financials, Action::View),
            (Resource::Financials, Action::Edit),
            (Resource::Users, Action::Manage),
            (Resource::Inspections, Action::Create),
            (Resource::Invoices, Action::Edit),
        ];
        for (resource, action) in pairs {
            let allowed = allowed_roles(resource, action).unwrap();
            for role in Role::value_variants() {
                let (_tmp, _repo, session) = session_for(*role);
                assert_eq!(
                    session.can_access(resource, action),
                    allowed.contains(role),
                    "{}/{} for {}",
                    resource,
                    action,
                    role
                );
            }
        }
    }

    #[test]
    fn test_admin_scenario() {
        // Company "Acme", admin Alice: may create projects, may not create
        // inspections (admin is absent from that row's set)
        let (_tmp, repo) = test_repo();
        let company = repo.create_company(NewCompany::new("Acme")).unwrap();
        let mut alice = NewUser::new("Alice", "alice@acme.com", Role::Admin);
        alice.company_id = Some(company.id);
        repo.create_user(alice).unwrap();

        let mut session = Session::anonymous();
        assert!(session.login(&repo, "alice@acme.com", "whatever").unwrap());

        assert!(session.can_access(Resource::Projects, Action::Create));
        assert!(!session.can_access(Resource::Inspections, Action::Create));
    }

    #[test]
    fn test_login_requires_active_user() {
        let (_tmp, repo) = test_repo();
        let user = repo
            .create_user(NewUser::new("Alice", "alice@acme.com", Role::Admin))
            .unwrap();
        repo.update_user(
            &user.id,
            UserUpdate {
                active: Some(false),
                ..Default::default()
            },
        )
        .unwrap();

        let mut session = Session::anonymous();
        assert!(!session.login(&repo, "alice@acme.com", "x").unwrap());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_login_unknown_email_fails() {
        let (_tmp, repo) = test_repo();
        let mut session = Session::anonymous();
        assert!(!session.login(&repo, "ghost@acme.com", "x").unwrap());
    }

    #[test]
    fn test_password_is_not_verified() {
        let (_tmp, repo) = test_repo();
        repo.create_user(NewUser::new("Alice", "alice@acme.com", Role::Admin))
            .unwrap();

        let mut session = Session::anonymous();
        assert!(session.login(&repo, "alice@acme.com", "").unwrap());
    }

    #[test]
    fn test_restore_roundtrip() {
        let (_tmp, repo) = test_repo();
        repo.create_user(NewUser::new("Alice", "alice@acme.com", Role::PmcHead))
            .unwrap();

        let mut session = Session::anonymous();
        session.login(&repo, "alice@acme.com", "x").unwrap();

        let restored = Session::restore(&repo).unwrap();
        assert!(restored.is_authenticated());
        assert!(restored.has_role(Role::PmcHead));
    }

    #[test]
    fn test_restore_discards_stale_session() {
        let (_tmp, repo) = test_repo();
        let user = repo
            .create_user(NewUser::new("Alice", "alice@acme.com", Role::Admin))
            .unwrap();

        let mut session = Session::anonymous();
        session.login(&repo, "alice@acme.com", "x").unwrap();

        // The user is deleted out from under the stored session
        repo.delete_user(&user.id).unwrap();

        let restored = Session::restore(&repo).unwrap();
        assert!(!restored.is_authenticated());
        assert!(repo.load_session().unwrap().is_none());
    }

    #[test]
    fn test_logout_clears_persisted_session() {
        let (_tmp, repo) = test_repo();
        repo.create_user(NewUser::new("Alice", "alice@acme.com", Role::Admin))
            .unwrap();

        let mut session = Session::anonymous();
        session.login(&repo, "alice@acme.com", "x").unwrap();
        session.logout(&repo).unwrap();

        assert!(!session.is_authenticated());
        assert!(repo.load_session().unwrap().is_none());
    }

    #[test]
    fn test_restore_picks_up_role_changes() {
        // The stored session is re-validated against the user store, so a
        // role change after login is reflected on restore
        let (_tmp, repo) = test_repo();
        let user = repo
            .create_user(NewUser::new("Alice", "alice@acme.com", Role::Engineer))
            .unwrap();

        let mut session = Session::anonymous();
        session.login(&repo, "alice@acme.com", "x").unwrap();

        repo.update_user(
            &user.id,
            UserUpdate {
                role: Some(Role::Management),
                ..Default::default()
            },
        )
        .unwrap();

        let restored = Session::restore(&repo).unwrap();
        assert!(restored.has_role(Role::Management));
    }
}
