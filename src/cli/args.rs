//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    backup::BackupCommands,
    company::CompanyCommands,
    completions::CompletionsArgs,
    init::InitArgs,
    inspection::InspCommands,
    invoice::InvCommands,
    milestone::MsCommands,
    project::ProjectCommands,
    report::ReportCommands,
    session::LoginArgs,
    status::StatusArgs,
    task::TaskCommands,
    team::TeamCommands,
    user::UserCommands,
};

#[derive(Parser)]
#[command(name = "atelier")]
#[command(author, version, about = "Atelier PMC toolkit")]
#[command(
    long_about = "A local-first toolkit for architecture and PMC firms: projects, teams, milestones, inspections and invoices kept as plain JSON files in your workspace."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Workspace root (default: auto-detect by finding .atelier/)
    #[arg(long, global = true)]
    pub workspace: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new Atelier workspace
    Init(InitArgs),

    /// Company management
    #[command(subcommand)]
    Company(CompanyCommands),

    /// Project management
    #[command(subcommand)]
    Project(ProjectCommands),

    /// User account management
    #[command(subcommand)]
    User(UserCommands),

    /// Project team assignments
    #[command(subcommand)]
    Team(TeamCommands),

    /// Milestone management
    #[command(subcommand)]
    Ms(MsCommands),

    /// Task management
    #[command(subcommand)]
    Task(TaskCommands),

    /// Inspection management
    #[command(subcommand)]
    Insp(InspCommands),

    /// Invoice management
    #[command(subcommand)]
    Inv(InvCommands),

    /// Log in as a user by email
    Login(LoginArgs),

    /// Clear the current session
    Logout,

    /// Show the current session user and permissions
    Whoami,

    /// Show the workspace dashboard
    Status(StatusArgs),

    /// Generate project reports (CSV)
    #[command(subcommand)]
    Report(ReportCommands),

    /// Export, import or clear the full dataset
    #[command(subcommand)]
    Backup(BackupCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (table for list, yaml for show)
    #[default]
    Auto,
    /// Aligned table for terminals
    Table,
    /// JSON format (for programming)
    Json,
    /// YAML format (full fidelity)
    Yaml,
    /// CSV format (for spreadsheets)
    Csv,
    /// Just IDs, one per line
    Id,
}
