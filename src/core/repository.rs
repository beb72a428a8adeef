//! Typed CRUD over the stored collections
//!
//! Top-level entities (companies, projects, users) follow one uniform
//! pattern: load the whole collection, transform it in memory, persist it
//! back in a single write. Nested entities (milestones, tasks, invoices,
//! inspections) live embedded inside their owning project and are reached by
//! scanning the projects collection; every nested mutation re-persists the
//! whole projects collection. Costs are linear in the working set, which is
//! small by design.
//!
//! The repository performs no permission checks. Callers that care about
//! access control consult [`crate::core::access::Session`] before invoking a
//! mutating operation.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::identity::EntityId;
use crate::core::store::{
    Store, StoreError, COMPANIES_KEY, PROJECTS_KEY, SESSION_KEY, SETTINGS_KEY, SYNC_QUEUE_KEY,
    USERS_KEY,
};
use crate::core::workspace::Workspace;
use crate::entities::{
    BillCertification, Company, CompanyUpdate, Inspection, InspectionStatus, InspectionUpdate,
    Invoice, InvoiceStatus, InvoiceUpdate, Milestone, MilestoneUpdate, NewCompany, NewInspection,
    NewInvoice, NewMilestone, NewProject, NewTask, NewUser, Project, ProjectStatus,
    ProjectTeamMember, ProjectUpdate, Task, TaskUpdate, User, UserUpdate,
};

/// Errors from repository operations
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("project {0} not found")]
    ProjectNotFound(EntityId),

    #[error("milestone {0} not found")]
    MilestoneNotFound(EntityId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Where an inspection record ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InspectionAnchor {
    /// Anchored in a milestone's `inspections`
    Milestone(EntityId),
    /// Anchored in the project's own `inspections`
    Project(EntityId),
}

/// Aggregated dashboard figures
#[derive(Debug, Clone, Serialize)]
pub struct DashboardKpi {
    pub total_projects: usize,
    pub active_projects: usize,
    pub completed_projects: usize,
    pub delayed_projects: usize,
    pub total_revenue: f64,
    pub pending_invoices: usize,
    pub overdue_invoices: usize,
    /// Mean allocation percentage of active assignments on active projects
    pub resource_utilization: f64,
    /// Open tasks due within the next seven days
    pub upcoming_deadlines: usize,
    /// Inspections still in the scheduled state
    pub pending_inspections: usize,
    #[serde(skip)]
    pub recent_projects: Vec<Project>,
}

/// Full-dataset backup bundle. On import, each present collection overwrites
/// its key independently; a partial bundle leaves the other keys untouched.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExportBundle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub companies: Option<Vec<Company>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projects: Option<Vec<Project>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<User>>,

    pub exported_at: DateTime<Utc>,
}

/// CRUD access to the workspace data
#[derive(Debug)]
pub struct Repository {
    store: Store,
}

impl Repository {
    /// Open the repository for a workspace
    pub fn open(workspace: &Workspace) -> Self {
        Self {
            store: Store::open(workspace),
        }
    }

    /// Build a repository over an explicit store (used by tests)
    pub fn with_store(store: Store) -> Self {
        Self { store }
    }

    // ------------------------------------------------------------------
    // Companies
    // ------------------------------------------------------------------

    pub fn create_company(&self, input: NewCompany) -> Result<Company, RepoError> {
        let company = Company::new(input);
        let mut companies = self.companies()?;
        companies.push(company.clone());
        self.store.save(COMPANIES_KEY, &companies)?;
        Ok(company)
    }

    pub fn companies(&self) -> Result<Vec<Company>, RepoError> {
        Ok(self.store.load(COMPANIES_KEY)?)
    }

    pub fn company_by_id(&self, id: &EntityId) -> Result<Option<Company>, RepoError> {
        Ok(self.companies()?.into_iter().find(|c| c.id == *id))
    }

    pub fn update_company(
        &self,
        id: &EntityId,
        update: CompanyUpdate,
    ) -> Result<Option<Company>, RepoError> {
        let mut companies = self.companies()?;
        let Some(company) = companies.iter_mut().find(|c| c.id == *id) else {
            return Ok(None);
        };
        update.apply(company);
        company.updated_at = Utc::now();
        let updated = company.clone();
        self.store.save(COMPANIES_KEY, &companies)?;
        Ok(Some(updated))
    }

    pub fn delete_company(&self, id: &EntityId) -> Result<bool, RepoError> {
        let companies = self.companies()?;
        let filtered: Vec<Company> = companies
            .iter()
            .filter(|c| c.id != *id)
            .cloned()
            .collect();
        if filtered.len() == companies.len() {
            return Ok(false);
        }
        self.store.save(COMPANIES_KEY, &filtered)?;
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Projects
    // ------------------------------------------------------------------

    pub fn create_project(&self, input: NewProject) -> Result<Project, RepoError> {
        let project = Project::new(input);
        let mut projects = self.projects(None)?;
        projects.push(project.clone());
        self.store.save(PROJECTS_KEY, &projects)?;
        Ok(project)
    }

    /// All projects, optionally filtered by owning company
    pub fn projects(&self, company_id: Option<&EntityId>) -> Result<Vec<Project>, RepoError> {
        let mut projects: Vec<Project> = self.store.load(PROJECTS_KEY)?;
        if let Some(company_id) = company_id {
            projects.retain(|p| p.company_id == *company_id);
        }
        Ok(projects)
    }

    pub fn project_by_id(&self, id: &EntityId) -> Result<Option<Project>, RepoError> {
        Ok(self.projects(None)?.into_iter().find(|p| p.id == *id))
    }

    pub fn update_project(
        &self,
        id: &EntityId,
        update: ProjectUpdate,
    ) -> Result<Option<Project>, RepoError> {
        let mut projects = self.projects(None)?;
        let Some(project) = projects.iter_mut().find(|p| p.id == *id) else {
            return Ok(None);
        };
        update.apply(project);
        project.updated_at = Utc::now();
        let updated = project.clone();
        self.store.save(PROJECTS_KEY, &projects)?;
        Ok(Some(updated))
    }

    pub fn delete_project(&self, id: &EntityId) -> Result<bool, RepoError> {
        let projects = self.projects(None)?;
        let filtered: Vec<Project> = projects
            .iter()
            .filter(|p| p.id != *id)
            .cloned()
            .collect();
        if filtered.len() == projects.len() {
            return Ok(false);
        }
        self.store.save(PROJECTS_KEY, &filtered)?;
        Ok(true)
    }

    /// Case-insensitive substring search over name, description, type and
    /// status
    pub fn search_projects(&self, query: &str) -> Result<Vec<Project>, RepoError> {
        let needle = query.to_lowercase();
        Ok(self
            .projects(None)?
            .into_iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&needle)
                    || p.description.to_lowercase().contains(&needle)
                    || p.project_type.to_string().contains(&needle)
                    || p.status.to_string().contains(&needle)
            })
            .collect())
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    pub fn create_user(&self, input: NewUser) -> Result<User, RepoError> {
        let user = User::new(input);
        let mut users = self.users()?;
        users.push(user.clone());
        self.store.save(USERS_KEY, &users)?;
        Ok(user)
    }

    pub fn users(&self) -> Result<Vec<User>, RepoError> {
        Ok(self.store.load(USERS_KEY)?)
    }

    pub fn user_by_id(&self, id: &EntityId) -> Result<Option<User>, RepoError> {
        Ok(self.users()?.into_iter().find(|u| u.id == *id))
    }

    pub fn user_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .users()?
            .into_iter()
            .find(|u| u.email.eq_ignore_ascii_case(email)))
    }

    pub fn update_user(
        &self,
        id: &EntityId,
        update: UserUpdate,
    ) -> Result<Option<User>, RepoError> {
        let mut users = self.users()?;
        let Some(user) = users.iter_mut().find(|u| u.id == *id) else {
            return Ok(None);
        };
        update.apply(user);
        user.updated_at = Utc::now();
        let updated = user.clone();
        self.store.save(USERS_KEY, &users)?;
        Ok(Some(updated))
    }

    pub fn delete_user(&self, id: &EntityId) -> Result<bool, RepoError> {
        let users = self.users()?;
        let filtered: Vec<User> = users.iter().filter(|u| u.id != *id).cloned().collect();
        if filtered.len() == users.len() {
            return Ok(false);
        }
        self.store.save(USERS_KEY, &filtered)?;
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Milestones (embedded in projects)
    // ------------------------------------------------------------------

    pub fn create_milestone(&self, input: NewMilestone) -> Result<Milestone, RepoError> {
        let mut projects = self.projects(None)?;
        let project_id = input.project_id.clone();
        let Some(project) = projects.iter_mut().find(|p| p.id == project_id) else {
            return Err(RepoError::ProjectNotFound(project_id));
        };
        let milestone = Milestone::new(input);
        project.milestones.push(milestone.clone());
        project.updated_at = Utc::now();
        self.store.save(PROJECTS_KEY, &projects)?;
        Ok(milestone)
    }

    pub fn milestone_by_id(&self, id: &EntityId) -> Result<Option<Milestone>, RepoError> {
        let projects = self.projects(None)?;
        Ok(locate_milestone(&projects, id)
            .map(|(pi, mi)| projects[pi].milestones[mi].clone()))
    }

    pub fn update_milestone(
        &self,
        id: &EntityId,
        update: MilestoneUpdate,
    ) -> Result<Option<Milestone>, RepoError> {
        let mut projects = self.projects(None)?;
        let Some((pi, mi)) = locate_milestone(&projects, id) else {
            return Ok(None);
        };
        let milestone = &mut projects[pi].milestones[mi];
        update.apply(milestone);
        milestone.updated_at = Utc::now();
        let updated = milestone.clone();
        projects[pi].updated_at = Utc::now();
        self.store.save(PROJECTS_KEY, &projects)?;
        Ok(Some(updated))
    }

    pub fn delete_milestone(&self, id: &EntityId) -> Result<bool, RepoError> {
        let mut projects = self.projects(None)?;
        let Some((pi, mi)) = locate_milestone(&projects, id) else {
            return Ok(false);
        };
        projects[pi].milestones.remove(mi);
        projects[pi].updated_at = Utc::now();
        self.store.save(PROJECTS_KEY, &projects)?;
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Tasks (embedded in milestones)
    // ------------------------------------------------------------------

    pub fn create_task(&self, input: NewTask) -> Result<Task, RepoError> {
        let mut projects = self.projects(None)?;
        let milestone_id = input.milestone_id.clone();
        let Some((pi, mi)) = locate_milestone(&projects, &milestone_id) else {
            return Err(RepoError::MilestoneNotFound(milestone_id));
        };
        let task = Task::new(input);
        projects[pi].milestones[mi].tasks.push(task.clone());
        projects[pi].updated_at = Utc::now();
        self.store.save(PROJECTS_KEY, &projects)?;
        Ok(task)
    }

    pub fn task_by_id(&self, id: &EntityId) -> Result<Option<Task>, RepoError> {
        let projects = self.projects(None)?;
        Ok(locate_task(&projects, id)
            .map(|(pi, mi, ti)| projects[pi].milestones[mi].tasks[ti].clone()))
    }

    pub fn update_task(
        &self,
        id: &EntityId,
        update: TaskUpdate,
    ) -> Result<Option<Task>, RepoError> {
        let mut projects = self.projects(None)?;
        let Some((pi, mi, ti)) = locate_task(&projects, id) else {
            return Ok(None);
        };
        let task = &mut projects[pi].milestones[mi].tasks[ti];
        update.apply(task);
        task.updated_at = Utc::now();
        let updated = task.clone();
        projects[pi].updated_at = Utc::now();
        self.store.save(PROJECTS_KEY, &projects)?;
        Ok(Some(updated))
    }

    pub fn delete_task(&self, id: &EntityId) -> Result<bool, RepoError> {
        let mut projects = self.projects(None)?;
        let Some((pi, mi, ti)) = locate_task(&projects, id) else {
            return Ok(false);
        };
        projects[pi].milestones[mi].tasks.remove(ti);
        projects[pi].updated_at = Utc::now();
        self.store.save(PROJECTS_KEY, &projects)?;
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Invoices (embedded in projects, addressed per project)
    // ------------------------------------------------------------------

    pub fn create_invoice(&self, input: NewInvoice) -> Result<Invoice, RepoError> {
        let mut projects = self.projects(None)?;
        let project_id = input.project_id.clone();
        let Some(project) = projects.iter_mut().find(|p| p.id == project_id) else {
            return Err(RepoError::ProjectNotFound(project_id));
        };
        let invoice = Invoice::new(input);
        project.invoices.push(invoice.clone());
        project.updated_at = Utc::now();
        self.store.save(PROJECTS_KEY, &projects)?;
        Ok(invoice)
    }

    pub fn invoice_by_id(
        &self,
        project_id: &EntityId,
        invoice_id: &EntityId,
    ) -> Result<Option<Invoice>, RepoError> {
        Ok(self
            .project_by_id(project_id)?
            .and_then(|p| p.invoices.into_iter().find(|i| i.id == *invoice_id)))
    }

    pub fn update_invoice(
        &self,
        project_id: &EntityId,
        invoice_id: &EntityId,
        update: InvoiceUpdate,
    ) -> Result<Option<Invoice>, RepoError> {
        let mut projects = self.projects(None)?;
        let Some(project) = projects.iter_mut().find(|p| p.id == *project_id) else {
            return Ok(None);
        };
        let Some(invoice) = project.invoices.iter_mut().find(|i| i.id == *invoice_id) else {
            return Ok(None);
        };
        update.apply(invoice);
        invoice.updated_at = Utc::now();
        let updated = invoice.clone();
        project.updated_at = Utc::now();
        self.store.save(PROJECTS_KEY, &projects)?;
        Ok(Some(updated))
    }

    pub fn delete_invoice(
        &self,
        project_id: &EntityId,
        invoice_id: &EntityId,
    ) -> Result<bool, RepoError> {
        let mut projects = self.projects(None)?;
        let Some(project) = projects.iter_mut().find(|p| p.id == *project_id) else {
            return Ok(false);
        };
        let before = project.invoices.len();
        project.invoices.retain(|i| i.id != *invoice_id);
        if project.invoices.len() == before {
            return Ok(false);
        }
        project.updated_at = Utc::now();
        self.store.save(PROJECTS_KEY, &projects)?;
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Inspections (dual-homed: milestone or project level)
    // ------------------------------------------------------------------

    /// Create an inspection and anchor it.
    ///
    /// If `milestone_id` resolves to an existing milestone (in any project),
    /// the record lands in that milestone's `inspections`. Otherwise it
    /// lands in the owning project's `inspections`. Either home's array is
    /// created lazily on first use.
    pub fn create_inspection(
        &self,
        input: NewInspection,
    ) -> Result<(Inspection, InspectionAnchor), RepoError> {
        let mut projects = self.projects(None)?;

        if let Some(milestone_id) = input.milestone_id.clone() {
            if let Some((pi, mi)) = locate_milestone(&projects, &milestone_id) {
                let inspection = Inspection::new(input);
                projects[pi].milestones[mi]
                    .inspections
                    .get_or_insert_with(Vec::new)
                    .push(inspection.clone());
                projects[pi].updated_at = Utc::now();
                self.store.save(PROJECTS_KEY, &projects)?;
                return Ok((inspection, InspectionAnchor::Milestone(milestone_id)));
            }
        }

        let project_id = input.project_id.clone();
        let Some(project) = projects.iter_mut().find(|p| p.id == project_id) else {
            return Err(RepoError::ProjectNotFound(project_id));
        };
        let inspection = Inspection::new(input);
        project
            .inspections
            .get_or_insert_with(Vec::new)
            .push(inspection.clone());
        project.updated_at = Utc::now();
        self.store.save(PROJECTS_KEY, &projects)?;
        Ok((inspection, InspectionAnchor::Project(project_id)))
    }

    pub fn inspection_by_id(&self, id: &EntityId) -> Result<Option<Inspection>, RepoError> {
        let projects = self.projects(None)?;
        Ok(match locate_inspection(&projects, id) {
            Some(InspectionSlot::Project(pi, ii)) => projects[pi]
                .inspections
                .as_ref()
                .and_then(|list| list.get(ii))
                .cloned(),
            Some(InspectionSlot::Milestone(pi, mi, ii)) => projects[pi].milestones[mi]
                .inspections
                .as_ref()
                .and_then(|list| list.get(ii))
                .cloned(),
            None => None,
        })
    }

    pub fn update_inspection(
        &self,
        id: &EntityId,
        update: InspectionUpdate,
    ) -> Result<Option<Inspection>, RepoError> {
        let mut projects = self.projects(None)?;
        let Some(slot) = locate_inspection(&projects, id) else {
            return Ok(None);
        };
        let updated = match slot {
            InspectionSlot::Project(pi, ii) => {
                let Some(inspection) = projects[pi]
                    .inspections
                    .as_mut()
                    .and_then(|list| list.get_mut(ii))
                else {
                    return Ok(None);
                };
                update.apply(inspection);
                inspection.updated_at = Utc::now();
                let updated = inspection.clone();
                projects[pi].updated_at = Utc::now();
                updated
            }
            InspectionSlot::Milestone(pi, mi, ii) => {
                let Some(inspection) = projects[pi].milestones[mi]
                    .inspections
                    .as_mut()
                    .and_then(|list| list.get_mut(ii))
                else {
                    return Ok(None);
                };
                update.apply(inspection);
                inspection.updated_at = Utc::now();
                let updated = inspection.clone();
                projects[pi].updated_at = Utc::now();
                updated
            }
        };
        self.store.save(PROJECTS_KEY, &projects)?;
        Ok(Some(updated))
    }

    pub fn delete_inspection(&self, id: &EntityId) -> Result<bool, RepoError> {
        let mut projects = self.projects(None)?;
        let Some(slot) = locate_inspection(&projects, id) else {
            return Ok(false);
        };
        let pi = match slot {
            InspectionSlot::Project(pi, ii) => {
                if let Some(list) = projects[pi].inspections.as_mut() {
                    list.remove(ii);
                }
                pi
            }
            InspectionSlot::Milestone(pi, mi, ii) => {
                if let Some(list) = projects[pi].milestones[mi].inspections.as_mut() {
                    list.remove(ii);
                }
                pi
            }
        };
        projects[pi].updated_at = Utc::now();
        self.store.save(PROJECTS_KEY, &projects)?;
        Ok(true)
    }

    /// Every inspection in the workspace, project-level and milestone-level,
    /// each exactly once
    pub fn inspections(&self) -> Result<Vec<Inspection>, RepoError> {
        let projects = self.projects(None)?;
        Ok(projects
            .iter()
            .flat_map(|p| p.all_inspections().cloned().collect::<Vec<_>>())
            .collect())
    }

    // ------------------------------------------------------------------
    // Team assignments (embedded in projects)
    // ------------------------------------------------------------------

    pub fn add_team_member(
        &self,
        project_id: &EntityId,
        user_id: EntityId,
        role: &str,
        allocation: u8,
    ) -> Result<ProjectTeamMember, RepoError> {
        let mut projects = self.projects(None)?;
        let Some(project) = projects.iter_mut().find(|p| p.id == *project_id) else {
            return Err(RepoError::ProjectNotFound(project_id.clone()));
        };
        let member = ProjectTeamMember::new(user_id, project_id.clone(), role, allocation);
        project.team.push(member.clone());
        project.updated_at = Utc::now();
        self.store.save(PROJECTS_KEY, &projects)?;
        Ok(member)
    }

    pub fn remove_team_member(
        &self,
        project_id: &EntityId,
        member_id: &EntityId,
    ) -> Result<bool, RepoError> {
        let mut projects = self.projects(None)?;
        let Some(project) = projects.iter_mut().find(|p| p.id == *project_id) else {
            return Ok(false);
        };
        let before = project.team.len();
        project.team.retain(|m| m.id != *member_id);
        if project.team.len() == before {
            return Ok(false);
        }
        project.updated_at = Utc::now();
        self.store.save(PROJECTS_KEY, &projects)?;
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Bill certifications (embedded in milestones)
    // ------------------------------------------------------------------

    pub fn create_certification(
        &self,
        milestone_id: &EntityId,
        certification_number: &str,
        amount: f64,
        certification_date: NaiveDate,
        certifying_authority: &str,
    ) -> Result<BillCertification, RepoError> {
        let mut projects = self.projects(None)?;
        let Some((pi, mi)) = locate_milestone(&projects, milestone_id) else {
            return Err(RepoError::MilestoneNotFound(milestone_id.clone()));
        };
        let cert = BillCertification::new(
            projects[pi].id.clone(),
            milestone_id.clone(),
            certification_number,
            amount,
            certification_date,
            certifying_authority,
        );
        projects[pi].milestones[mi]
            .bill_certifications
            .push(cert.clone());
        projects[pi].updated_at = Utc::now();
        self.store.save(PROJECTS_KEY, &projects)?;
        Ok(cert)
    }

    /// All certifications on a project, across its milestones
    pub fn certifications(&self, project_id: &EntityId) -> Result<Vec<BillCertification>, RepoError> {
        let Some(project) = self.project_by_id(project_id)? else {
            return Err(RepoError::ProjectNotFound(project_id.clone()));
        };
        Ok(project
            .milestones
            .iter()
            .flat_map(|m| m.bill_certifications.iter().cloned())
            .collect())
    }

    // ------------------------------------------------------------------
    // Session persistence
    // ------------------------------------------------------------------

    /// Persist the logged-in user verbatim under the session key
    pub fn save_session(&self, user: &User) -> Result<(), RepoError> {
        Ok(self.store.write_value(SESSION_KEY, user)?)
    }

    pub fn load_session(&self) -> Result<Option<User>, RepoError> {
        Ok(self.store.read_value(SESSION_KEY)?)
    }

    pub fn clear_session(&self) -> Result<(), RepoError> {
        Ok(self.store.remove(SESSION_KEY)?)
    }

    // ------------------------------------------------------------------
    // Dashboard, export, import
    // ------------------------------------------------------------------

    pub fn dashboard(&self) -> Result<DashboardKpi, RepoError> {
        let projects = self.projects(None)?;
        let today = Utc::now().date_naive();

        let total_projects = projects.len();
        let active_projects = projects
            .iter()
            .filter(|p| p.status == ProjectStatus::Active)
            .count();
        let completed_projects = projects
            .iter()
            .filter(|p| p.status == ProjectStatus::Completed)
            .count();
        let delayed_projects = projects
            .iter()
            .filter(|p| {
                p.status == ProjectStatus::OnHold
                    || (p.end_date.is_some_and(|d| d < today)
                        && p.status != ProjectStatus::Completed)
            })
            .count();
        let total_revenue = projects.iter().map(|p| p.total_fee).sum();

        let pending_invoices = projects
            .iter()
            .flat_map(|p| &p.invoices)
            .filter(|i| i.status == InvoiceStatus::Issued)
            .count();
        let overdue_invoices = projects
            .iter()
            .flat_map(|p| &p.invoices)
            .filter(|i| i.status == InvoiceStatus::Issued && i.due_date < today)
            .count();

        let allocations: Vec<u8> = projects
            .iter()
            .filter(|p| p.status == ProjectStatus::Active)
            .flat_map(|p| &p.team)
            .filter(|m| m.is_active)
            .map(|m| m.allocation)
            .collect();
        let resource_utilization = if allocations.is_empty() {
            0.0
        } else {
            allocations.iter().map(|a| *a as f64).sum::<f64>() / allocations.len() as f64
        };

        let horizon = today + chrono::Duration::days(7);
        let upcoming_deadlines = projects
            .iter()
            .flat_map(|p| &p.milestones)
            .flat_map(|m| &m.tasks)
            .filter(|t| {
                t.status.is_open()
                    && t.due_date.is_some_and(|d| d >= today && d <= horizon)
            })
            .count();

        let pending_inspections = projects
            .iter()
            .flat_map(|p| p.all_inspections())
            .filter(|i| i.status == InspectionStatus::Scheduled)
            .count();

        let mut recent_projects = projects;
        recent_projects.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        recent_projects.truncate(5);

        Ok(DashboardKpi {
            total_projects,
            active_projects,
            completed_projects,
            delayed_projects,
            total_revenue,
            pending_invoices,
            overdue_invoices,
            resource_utilization,
            upcoming_deadlines,
            pending_inspections,
            recent_projects,
        })
    }

    /// Export the full dataset as one bundle
    pub fn export_all(&self) -> Result<ExportBundle, RepoError> {
        Ok(ExportBundle {
            companies: Some(self.companies()?),
            projects: Some(self.projects(None)?),
            users: Some(self.users()?),
            exported_at: Utc::now(),
        })
    }

    /// Import a bundle, overwriting each present collection independently.
    /// Not atomic across keys: a failure mid-way leaves earlier collections
    /// imported and later ones untouched.
    pub fn import_all(&self, json: &str) -> Result<(), RepoError> {
        let bundle: ExportBundle =
            serde_json::from_str(json).map_err(|source| StoreError::Corrupt {
                key: "import".to_string(),
                source,
            })?;

        if let Some(companies) = bundle.companies {
            self.store.save(COMPANIES_KEY, &companies)?;
        }
        if let Some(projects) = bundle.projects {
            self.store.save(PROJECTS_KEY, &projects)?;
        }
        if let Some(users) = bundle.users {
            self.store.save(USERS_KEY, &users)?;
        }
        Ok(())
    }

    /// Remove every stored key, including the reserved ones
    pub fn clear_all(&self) -> Result<(), RepoError> {
        for key in [
            COMPANIES_KEY,
            PROJECTS_KEY,
            USERS_KEY,
            SESSION_KEY,
            SETTINGS_KEY,
            SYNC_QUEUE_KEY,
        ] {
            self.store.remove(key)?;
        }
        Ok(())
    }

    /// Raw stored bytes for a collection key (used by tests)
    pub fn raw_collection(&self, key: &str) -> Option<Vec<u8>> {
        self.store.raw(key)
    }
}

/// Position of a milestone: (project index, milestone index)
fn locate_milestone(projects: &[Project], id: &EntityId) -> Option<(usize, usize)> {
    projects.iter().enumerate().find_map(|(pi, p)| {
        p.milestones
            .iter()
            .position(|m| m.id == *id)
            .map(|mi| (pi, mi))
    })
}

/// Position of a task: (project index, milestone index, task index)
fn locate_task(projects: &[Project], id: &EntityId) -> Option<(usize, usize, usize)> {
    projects.iter().enumerate().find_map(|(pi, p)| {
        p.milestones.iter().enumerate().find_map(|(mi, m)| {
            m.tasks.iter().position(|t| t.id == *id).map(|ti| (pi, mi, ti))
        })
    })
}

/// Where an inspection currently sits, by index
enum InspectionSlot {
    Project(usize, usize),
    Milestone(usize, usize, usize),
}

fn locate_inspection(projects: &[Project], id: &EntityId) -> Option<InspectionSlot> {
    for (pi, project) in projects.iter().enumerate() {
        if let Some(list) = &project.inspections {
            if let Some(ii) = list.iter().position(|i| i.id == *id) {
                return Some(InspectionSlot::Project(pi, ii));
            }
        }
        for (mi, milestone) in project.milestones.iter().enumerate() {
            if let Some(list) = &milestone.inspections {
                if let Some(ii) = list.iter().position(|i| i.id == *id) {
                    return Some(InspectionSlot::Milestone(pi, mi, ii));
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::EntityPrefix;
    use crate::entities::{ProjectType, Role, TaskStatus};
    use tempfile::TempDir;

    fn test_repo() -> (TempDir, Repository) {
        let tmp = TempDir::new().unwrap();
        let repo = Repository::with_store(Store::at(tmp.path().to_path_buf()));
        (tmp, repo)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn seed_project(repo: &Repository) -> Project {
        let company = repo
            .create_company(NewCompany::new("Acme Architecture"))
            .unwrap();
        repo.create_project(NewProject::new(
            "Riverside Tower",
            company.id,
            ProjectType::Pmc,
        ))
        .unwrap()
    }

    #[test]
    fn test_create_assigns_unique_ids_and_equal_timestamps() {
        let (_tmp, repo) = test_repo();
        let a = repo.create_company(NewCompany::new("A")).unwrap();
        let b = repo.create_company(NewCompany::new("B")).unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(a.created_at, a.updated_at);
        assert_eq!(repo.companies().unwrap().len(), 2);
    }

    #[test]
    fn test_update_merges_and_bumps_updated_at() {
        let (_tmp, repo) = test_repo();
        let company = repo.create_company(NewCompany::new("Acme")).unwrap();

        let updated = repo
            .update_company(
                &company.id,
                CompanyUpdate {
                    phone: Some("+1-555-0100".to_string()),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();

        assert_eq!(updated.phone, "+1-555-0100");
        assert_eq!(updated.name, "Acme");
        assert!(updated.updated_at > company.updated_at);
        assert_eq!(updated.created_at, company.created_at);
    }

    #[test]
    fn test_update_missing_id_has_no_side_effect() {
        let (_tmp, repo) = test_repo();
        repo.create_company(NewCompany::new("Acme")).unwrap();
        let before = repo.raw_collection(COMPANIES_KEY).unwrap();

        let missing = EntityId::new(EntityPrefix::Co);
        let result = repo
            .update_company(&missing, CompanyUpdate::default())
            .unwrap();

        assert!(result.is_none());
        assert_eq!(repo.raw_collection(COMPANIES_KEY).unwrap(), before);
    }

    #[test]
    fn test_delete_existing_and_missing() {
        let (_tmp, repo) = test_repo();
        let company = repo.create_company(NewCompany::new("Acme")).unwrap();
        let before = repo.raw_collection(COMPANIES_KEY).unwrap();

        let missing = EntityId::new(EntityPrefix::Co);
        assert!(!repo.delete_company(&missing).unwrap());
        assert_eq!(repo.raw_collection(COMPANIES_KEY).unwrap(), before);

        assert!(repo.delete_company(&company.id).unwrap());
        assert!(repo.companies().unwrap().is_empty());
    }

    #[test]
    fn test_projects_filtered_by_company() {
        let (_tmp, repo) = test_repo();
        let acme = repo.create_company(NewCompany::new("Acme")).unwrap();
        let other = repo.create_company(NewCompany::new("Other")).unwrap();
        repo.create_project(NewProject::new("P1", acme.id.clone(), ProjectType::Pmc))
            .unwrap();
        repo.create_project(NewProject::new("P2", other.id.clone(), ProjectType::Pmc))
            .unwrap();

        assert_eq!(repo.projects(None).unwrap().len(), 2);
        assert_eq!(repo.projects(Some(&acme.id)).unwrap().len(), 1);
    }

    #[test]
    fn test_deleting_company_leaves_projects_dangling() {
        let (_tmp, repo) = test_repo();
        let project = seed_project(&repo);
        let company_id = project.company_id.clone();

        assert!(repo.delete_company(&company_id).unwrap());

        // The project still references the deleted company
        let survivor = repo.project_by_id(&project.id).unwrap().unwrap();
        assert_eq!(survivor.company_id, company_id);
        assert!(repo.company_by_id(&company_id).unwrap().is_none());
    }

    #[test]
    fn test_milestone_crud_through_parent() {
        let (_tmp, repo) = test_repo();
        let project = seed_project(&repo);

        let ms = repo
            .create_milestone(NewMilestone::new(project.id.clone(), "Concept", 1))
            .unwrap();
        assert_eq!(
            repo.project_by_id(&project.id).unwrap().unwrap().milestones.len(),
            1
        );

        let updated = repo
            .update_milestone(
                &ms.id,
                MilestoneUpdate {
                    completion_percentage: Some(40),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.completion_percentage, 40);
        assert!(updated.updated_at > ms.updated_at);

        assert!(repo.delete_milestone(&ms.id).unwrap());
        assert!(repo
            .project_by_id(&project.id)
            .unwrap()
            .unwrap()
            .milestones
            .is_empty());
    }

    #[test]
    fn test_create_milestone_requires_project() {
        let (_tmp, repo) = test_repo();
        let err = repo
            .create_milestone(NewMilestone::new(
                EntityId::new(EntityPrefix::Prj),
                "Orphan",
                1,
            ))
            .unwrap_err();
        assert!(matches!(err, RepoError::ProjectNotFound(_)));
    }

    #[test]
    fn test_task_requires_milestone() {
        let (_tmp, repo) = test_repo();
        let project = seed_project(&repo);

        let err = repo
            .create_task(NewTask::new(
                project.id.clone(),
                EntityId::new(EntityPrefix::Ms),
                "Orphan task",
            ))
            .unwrap_err();
        assert!(matches!(err, RepoError::MilestoneNotFound(_)));
    }

    #[test]
    fn test_task_crud() {
        let (_tmp, repo) = test_repo();
        let project = seed_project(&repo);
        let ms = repo
            .create_milestone(NewMilestone::new(project.id.clone(), "Concept", 1))
            .unwrap();

        let task = repo
            .create_task(NewTask::new(
                project.id.clone(),
                ms.id.clone(),
                "Draft plans",
            ))
            .unwrap();

        let updated = repo
            .update_task(
                &task.id,
                TaskUpdate {
                    status: Some(TaskStatus::InProgress),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, TaskStatus::InProgress);

        assert!(repo.delete_task(&task.id).unwrap());
        assert!(repo.task_by_id(&task.id).unwrap().is_none());
    }

    #[test]
    fn test_invoice_crud_is_project_scoped() {
        let (_tmp, repo) = test_repo();
        let project = seed_project(&repo);

        let invoice = repo
            .create_invoice(NewInvoice::new(
                project.id.clone(),
                "INV-001",
                10_000.0,
                date(2025, 4, 1),
                date(2025, 5, 1),
            ))
            .unwrap();

        assert!(repo
            .invoice_by_id(&project.id, &invoice.id)
            .unwrap()
            .is_some());

        let updated = repo
            .update_invoice(
                &project.id,
                &invoice.id,
                InvoiceUpdate {
                    status: Some(InvoiceStatus::Issued),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, InvoiceStatus::Issued);

        assert!(repo.delete_invoice(&project.id, &invoice.id).unwrap());
        assert!(!repo.delete_invoice(&project.id, &invoice.id).unwrap());
    }

    #[test]
    fn test_inspection_anchors_to_matching_milestone() {
        let (_tmp, repo) = test_repo();
        let project = seed_project(&repo);
        let ms = repo
            .create_milestone(NewMilestone::new(project.id.clone(), "Structure", 1))
            .unwrap();

        let mut input = NewInspection::new(project.id.clone(), "Rebar check", date(2025, 6, 1));
        input.milestone_id = Some(ms.id.clone());

        let (inspection, anchor) = repo.create_inspection(input).unwrap();
        assert_eq!(anchor, InspectionAnchor::Milestone(ms.id.clone()));

        // Exactly one copy, in the milestone home
        let all = repo.inspections().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, inspection.id);

        let stored = repo.project_by_id(&project.id).unwrap().unwrap();
        assert!(stored.inspections.is_none());
        assert_eq!(
            stored.milestones[0].inspections.as_ref().unwrap().len(),
            1
        );
    }

    #[test]
    fn test_inspection_falls_back_to_project_home() {
        let (_tmp, repo) = test_repo();
        let project = seed_project(&repo);

        // Names a milestone that does not exist anywhere
        let mut input = NewInspection::new(project.id.clone(), "Site walk", date(2025, 6, 1));
        input.milestone_id = Some(EntityId::new(EntityPrefix::Ms));

        let (_, anchor) = repo.create_inspection(input).unwrap();
        assert_eq!(anchor, InspectionAnchor::Project(project.id.clone()));

        let stored = repo.project_by_id(&project.id).unwrap().unwrap();
        assert_eq!(stored.inspections.as_ref().unwrap().len(), 1);
        assert_eq!(repo.inspections().unwrap().len(), 1);
    }

    #[test]
    fn test_inspection_create_fails_without_any_parent() {
        let (_tmp, repo) = test_repo();
        let input = NewInspection::new(
            EntityId::new(EntityPrefix::Prj),
            "Nowhere",
            date(2025, 6, 1),
        );
        let err = repo.create_inspection(input).unwrap_err();
        assert!(matches!(err, RepoError::ProjectNotFound(_)));
    }

    #[test]
    fn test_inspection_update_and_delete_check_both_homes() {
        let (_tmp, repo) = test_repo();
        let project = seed_project(&repo);
        let ms = repo
            .create_milestone(NewMilestone::new(project.id.clone(), "Structure", 1))
            .unwrap();

        let mut milestone_level =
            NewInspection::new(project.id.clone(), "Rebar check", date(2025, 6, 1));
        milestone_level.milestone_id = Some(ms.id.clone());
        let (in_ms, _) = repo.create_inspection(milestone_level).unwrap();

        let project_level =
            NewInspection::new(project.id.clone(), "Site walk", date(2025, 6, 2));
        let (in_prj, _) = repo.create_inspection(project_level).unwrap();

        for id in [&in_ms.id, &in_prj.id] {
            let updated = repo
                .update_inspection(
                    id,
                    InspectionUpdate {
                        status: Some(InspectionStatus::Completed),
                        ..Default::default()
                    },
                )
                .unwrap()
                .unwrap();
            assert_eq!(updated.status, InspectionStatus::Completed);
        }

        assert!(repo.delete_inspection(&in_ms.id).unwrap());
        assert!(repo.delete_inspection(&in_prj.id).unwrap());
        assert!(repo.inspections().unwrap().is_empty());
    }

    #[test]
    fn test_export_import_roundtrip() {
        let (_tmp, repo) = test_repo();
        let project = seed_project(&repo);
        repo.create_user(NewUser::new("Alice", "alice@acme.com", Role::Admin))
            .unwrap();
        let ms = repo
            .create_milestone(NewMilestone::new(project.id.clone(), "Concept", 1))
            .unwrap();
        repo.create_task(NewTask::new(project.id.clone(), ms.id, "Plans"))
            .unwrap();

        let bundle = repo.export_all().unwrap();
        let json = serde_json::to_string(&bundle).unwrap();

        // Import into a fresh repository
        let (_tmp2, other) = test_repo();
        other.import_all(&json).unwrap();

        let original = serde_json::to_string(&repo.projects(None).unwrap()).unwrap();
        let imported = serde_json::to_string(&other.projects(None).unwrap()).unwrap();
        assert_eq!(original, imported);
        assert_eq!(other.companies().unwrap().len(), 1);
        assert_eq!(other.users().unwrap().len(), 1);
    }

    #[test]
    fn test_import_partial_bundle_leaves_other_keys() {
        let (_tmp, repo) = test_repo();
        seed_project(&repo);
        repo.create_user(NewUser::new("Alice", "alice@acme.com", Role::Admin))
            .unwrap();

        // Only users in the bundle: companies and projects stay put
        repo.import_all(r#"{"users": [], "exported_at": "2025-01-01T00:00:00Z"}"#)
            .unwrap();

        assert!(repo.users().unwrap().is_empty());
        assert_eq!(repo.companies().unwrap().len(), 1);
        assert_eq!(repo.projects(None).unwrap().len(), 1);
    }

    #[test]
    fn test_import_rejects_malformed_payload() {
        let (_tmp, repo) = test_repo();
        let err = repo.import_all("{oops").unwrap_err();
        assert!(matches!(err, RepoError::Store(StoreError::Corrupt { .. })));
    }

    #[test]
    fn test_dashboard_aggregates() {
        let (_tmp, repo) = test_repo();
        let company = repo.create_company(NewCompany::new("Acme")).unwrap();

        let mut active = NewProject::new("Active", company.id.clone(), ProjectType::Pmc);
        active.status = ProjectStatus::Active;
        active.total_fee = 100_000.0;
        let active = repo.create_project(active).unwrap();

        let mut done = NewProject::new("Done", company.id.clone(), ProjectType::Pmc);
        done.status = ProjectStatus::Completed;
        done.total_fee = 50_000.0;
        repo.create_project(done).unwrap();

        let mut invoice = NewInvoice::new(
            active.id.clone(),
            "INV-001",
            10_000.0,
            date(2020, 1, 1),
            date(2020, 2, 1),
        );
        invoice.status = InvoiceStatus::Issued;
        repo.create_invoice(invoice).unwrap();

        let user = repo
            .create_user(NewUser::new("Bob", "bob@acme.com", Role::Engineer))
            .unwrap();
        repo.add_team_member(&active.id, user.id, "Engineer", 80)
            .unwrap();

        repo.create_inspection(NewInspection::new(
            active.id.clone(),
            "Walkthrough",
            date(2025, 6, 1),
        ))
        .unwrap();

        let kpi = repo.dashboard().unwrap();
        assert_eq!(kpi.total_projects, 2);
        assert_eq!(kpi.active_projects, 1);
        assert_eq!(kpi.completed_projects, 1);
        assert_eq!(kpi.total_revenue, 150_000.0);
        assert_eq!(kpi.pending_invoices, 1);
        assert_eq!(kpi.overdue_invoices, 1); // due 2020, long past
        assert_eq!(kpi.resource_utilization, 80.0);
        assert_eq!(kpi.pending_inspections, 1);
        assert_eq!(kpi.recent_projects.len(), 2);
    }

    #[test]
    fn test_search_projects() {
        let (_tmp, repo) = test_repo();
        let company = repo.create_company(NewCompany::new("Acme")).unwrap();
        repo.create_project(NewProject::new(
            "Riverside Tower",
            company.id.clone(),
            ProjectType::Pmc,
        ))
        .unwrap();
        repo.create_project(NewProject::new(
            "Harbor Mall",
            company.id,
            ProjectType::Architecture,
        ))
        .unwrap();

        assert_eq!(repo.search_projects("riverside").unwrap().len(), 1);
        assert_eq!(repo.search_projects("architecture").unwrap().len(), 1);
        assert_eq!(repo.search_projects("nothing").unwrap().len(), 0);
    }

    #[test]
    fn test_certifications() {
        let (_tmp, repo) = test_repo();
        let project = seed_project(&repo);
        let ms = repo
            .create_milestone(NewMilestone::new(project.id.clone(), "Structure", 1))
            .unwrap();

        repo.create_certification(&ms.id, "RA-001", 25_000.0, date(2025, 5, 1), "Site PMC")
            .unwrap();

        let certs = repo.certifications(&project.id).unwrap();
        assert_eq!(certs.len(), 1);
        assert_eq!(certs[0].certification_number, "RA-001");
    }

    #[test]
    fn test_session_persistence() {
        let (_tmp, repo) = test_repo();
        let user = repo
            .create_user(NewUser::new("Alice", "alice@acme.com", Role::Admin))
            .unwrap();

        repo.save_session(&user).unwrap();
        assert_eq!(repo.load_session().unwrap().unwrap().id, user.id);

        repo.clear_session().unwrap();
        assert!(repo.load_session().unwrap().is_none());
    }

    #[test]
    fn test_clear_all_removes_everything() {
        let (_tmp, repo) = test_repo();
        let project = seed_project(&repo);
        let user = repo
            .create_user(NewUser::new("Alice", "alice@acme.com", Role::Admin))
            .unwrap();
        repo.save_session(&user).unwrap();

        repo.clear_all().unwrap();

        assert!(repo.companies().unwrap().is_empty());
        assert!(repo.projects(None).unwrap().is_empty());
        assert!(repo.users().unwrap().is_empty());
        assert!(repo.load_session().unwrap().is_none());
        assert!(repo.project_by_id(&project.id).unwrap().is_none());
    }
}
