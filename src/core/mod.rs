//! Core module - identity, persistence, repository and access control

pub mod access;
pub mod config;
pub mod entity;
pub mod identity;
pub mod repository;
pub mod store;
pub mod workspace;

pub use access::{Action, Resource, Session};
pub use config::Config;
pub use entity::Entity;
pub use identity::{EntityId, EntityPrefix, IdParseError};
pub use repository::{DashboardKpi, ExportBundle, RepoError, Repository};
pub use store::{Store, StoreError};
pub use workspace::{Workspace, WorkspaceError};
