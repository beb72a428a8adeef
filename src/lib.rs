//! Atelier: local-first project management for architecture / PMC firms
//!
//! Projects, teams, milestones, tasks, inspections and invoices kept as
//! plain JSON files under a workspace directory, managed from the command
//! line. Single-writer by design: there is no server and no cross-process
//! coordination.

pub mod cli;
pub mod core;
pub mod entities;
