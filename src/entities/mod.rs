//! Entity types for the PMC domain
//!
//! One module per record type. Top-level entities (Company, Project, User)
//! live in their own stored collections; everything else is embedded inside
//! its owning Project.

pub mod company;
pub mod document;
pub mod inspection;
pub mod invoice;
pub mod milestone;
pub mod project;
pub mod task;
pub mod team_member;
pub mod user;

pub use company::{Company, CompanyUpdate, Folder, FolderStructure, NewCompany};
pub use document::{DocumentReference, DocumentType};
pub use inspection::{
    ComplianceStatus, Inspection, InspectionStatus, InspectionUpdate, NewInspection,
};
pub use invoice::{Invoice, InvoiceStatus, InvoiceType, InvoiceUpdate, NewInvoice};
pub use milestone::{
    BillCertification, CertificationStatus, Milestone, MilestoneStatus, MilestoneUpdate,
    NewMilestone,
};
pub use project::{
    FeeStructure, FeeType, NewProject, Project, ProjectStatus, ProjectType, ProjectUpdate,
};
pub use task::{NewTask, Task, TaskStatus, TaskUpdate};
pub use team_member::ProjectTeamMember;
pub use user::{NewUser, Role, User, UserUpdate};
