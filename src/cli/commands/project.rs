//! `atelier project` command - project management

use chrono::NaiveDate;
use clap::{Args, Subcommand};
use console::style;
use miette::{miette, IntoDiagnostic, Result};

use crate::cli::helpers::{
    effective_format, escape_csv, format_short_id, open_repo, require_access, resolve_entity,
    restore_session, truncate_str,
};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::access::{Action, Resource};
use crate::core::config::Config;
use crate::core::entity::Priority;
use crate::entities::{NewProject, Project, ProjectStatus, ProjectType, ProjectUpdate};

#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// List projects with filtering
    List(ListArgs),

    /// Create a new project
    New(NewArgs),

    /// Show a project's full nested shape
    Show(ShowArgs),

    /// Update scalar fields on a project
    Set(SetArgs),

    /// Delete a project and everything embedded in it
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Filter by owning company (id or name)
    #[arg(long, short = 'c')]
    pub company: Option<String>,

    /// Filter by status
    #[arg(long, short = 's')]
    pub status: Option<ProjectStatus>,

    /// Search in name, description, type and status
    #[arg(long)]
    pub search: Option<String>,

    /// Show count only, not the items
    #[arg(long)]
    pub count: bool,
}

#[derive(Args, Debug)]
pub struct NewArgs {
    /// Project name
    #[arg(long)]
    pub name: String,

    /// Owning company (id or name)
    #[arg(long, short = 'c')]
    pub company: String,

    /// Engagement type
    #[arg(long, short = 't', default_value = "pmc")]
    pub r#type: ProjectType,

    #[arg(long, default_value = "")]
    pub description: String,

    #[arg(long, default_value = "planning")]
    pub status: ProjectStatus,

    #[arg(long, default_value = "medium")]
    pub priority: Priority,

    /// Lead architect (user id or name)
    #[arg(long)]
    pub lead: Option<String>,

    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// End date (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Estimated duration in days
    #[arg(long)]
    pub duration: Option<u32>,

    /// Total fee
    #[arg(long, default_value_t = 0.0)]
    pub fee: f64,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Project ID or fuzzy name query
    pub id: String,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    /// Project ID or fuzzy name query
    pub id: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long, short = 't')]
    pub r#type: Option<ProjectType>,

    #[arg(long)]
    pub status: Option<ProjectStatus>,

    #[arg(long)]
    pub priority: Option<Priority>,

    /// Lead architect (user id or name)
    #[arg(long)]
    pub lead: Option<String>,

    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// End date (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<NaiveDate>,

    #[arg(long)]
    pub duration: Option<u32>,

    #[arg(long)]
    pub fee: Option<f64>,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Project ID or fuzzy name query
    pub id: String,

    /// Skip confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(cmd: ProjectCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ProjectCommands::List(args) => run_list(args, global),
        ProjectCommands::New(args) => run_new(args, global),
        ProjectCommands::Show(args) => run_show(args, global),
        ProjectCommands::Set(args) => run_set(args, global),
        ProjectCommands::Delete(args) => run_delete(args, global),
    }
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let repo = open_repo(global)?;
    let config = Config::load();

    let mut projects: Vec<Project> = if let Some(query) = &args.search {
        repo.search_projects(query).map_err(|e| miette!("{}", e))?
    } else {
        repo.projects(None).map_err(|e| miette!("{}", e))?
    };

    let company_query = args.company.or(config.default_company);
    if let Some(query) = company_query {
        let companies = repo.companies().map_err(|e| miette!("{}", e))?;
        let company = resolve_entity(&companies, &query, "company")?;
        projects.retain(|p| p.company_id == company.id);
    }
    if let Some(status) = args.status {
        projects.retain(|p| p.status == status);
    }

    if args.count {
        println!("{}", projects.len());
        return Ok(());
    }

    let format = effective_format(global, OutputFormat::Table);

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&projects).into_diagnostic()?
            );
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&projects).into_diagnostic()?);
        }
        OutputFormat::Csv => {
            println!("id,name,type,status,priority,total_fee,milestones,invoices");
            for p in &projects {
                println!(
                    "{},{},{},{},{},{},{},{}",
                    p.id,
                    escape_csv(&p.name),
                    p.project_type,
                    p.status,
                    p.priority,
                    p.total_fee,
                    p.milestones.len(),
                    p.invoices.len()
                );
            }
        }
        OutputFormat::Id => {
            for p in &projects {
                println!("{}", p.id);
            }
        }
        _ => {
            if projects.is_empty() {
                println!("No projects found.");
                println!();
                println!("Create one with: {}", style("atelier project new").yellow());
                return Ok(());
            }
            println!(
                "{:<16} {:<30} {:<12} {:<10} {:<10} {:>12}",
                style("ID").bold(),
                style("NAME").bold(),
                style("TYPE").bold(),
                style("STATUS").bold(),
                style("PRIORITY").bold(),
                style("FEE").bold()
            );
            println!("{}", "-".repeat(94));
            for p in &projects {
                println!(
                    "{:<16} {:<30} {:<12} {:<10} {:<10} {:>12.2}",
                    format_short_id(&p.id),
                    truncate_str(&p.name, 28),
                    p.project_type,
                    p.status,
                    p.priority,
                    p.total_fee
                );
            }
            if !global.quiet {
                println!();
                println!("{} project(s) found", style(projects.len()).cyan());
            }
        }
    }

    Ok(())
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let repo = open_repo(global)?;
    let session = restore_session(&repo)?;
    require_access(&session, Resource::Projects, Action::Create)?;

    let companies = repo.companies().map_err(|e| miette!("{}", e))?;
    let company = resolve_entity(&companies, &args.company, "company")?;

    let mut input = NewProject::new(args.name, company.id.clone(), args.r#type);
    input.description = args.description;
    input.status = args.status;
    input.priority = args.priority;
    input.start_date = args.start;
    input.end_date = args.end;
    input.estimated_duration = args.duration;
    input.total_fee = args.fee;
    input.folder_structure = company.default_folder_structure.clone();

    if let Some(lead) = args.lead {
        let users = repo.users().map_err(|e| miette!("{}", e))?;
        input.team_lead_architect_id = Some(resolve_entity(&users, &lead, "user")?.id.clone());
    }

    let project = repo.create_project(input).map_err(|e| miette!("{}", e))?;

    println!(
        "{} Created project {} ({})",
        style("✓").green(),
        style(&project.name).yellow(),
        style(format_short_id(&project.id)).cyan()
    );

    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let repo = open_repo(global)?;
    let projects = repo.projects(None).map_err(|e| miette!("{}", e))?;
    let project = resolve_entity(&projects, &args.id, "project")?;

    let format = effective_format(global, OutputFormat::Yaml);

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(project).into_diagnostic()?
            );
        }
        OutputFormat::Id => println!("{}", project.id),
        _ => {
            print!("{}", serde_yml::to_string(project).into_diagnostic()?);
        }
    }

    Ok(())
}

fn run_set(args: SetArgs, global: &GlobalOpts) -> Result<()> {
    let repo = open_repo(global)?;
    let session = restore_session(&repo)?;
    require_access(&session, Resource::Projects, Action::Edit)?;

    let projects = repo.projects(None).map_err(|e| miette!("{}", e))?;
    let project = resolve_entity(&projects, &args.id, "project")?;
    let id = project.id.clone();

    let mut update = ProjectUpdate {
        name: args.name,
        description: args.description,
        project_type: args.r#type,
        status: args.status,
        priority: args.priority,
        start_date: args.start,
        end_date: args.end,
        estimated_duration: args.duration,
        total_fee: args.fee,
        ..Default::default()
    };

    if let Some(lead) = args.lead {
        let users = repo.users().map_err(|e| miette!("{}", e))?;
        update.team_lead_architect_id = Some(resolve_entity(&users, &lead, "user")?.id.clone());
    }

    let updated = repo
        .update_project(&id, update)
        .map_err(|e| miette!("{}", e))?
        .ok_or_else(|| miette!("project {} vanished mid-update", id))?;

    println!(
        "{} Updated project {} ({})",
        style("✓").green(),
        style(&updated.name).yellow(),
        updated.status
    );

    Ok(())
}

fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let repo = open_repo(global)?;
    let session = restore_session(&repo)?;
    require_access(&session, Resource::Projects, Action::Delete)?;

    let projects = repo.projects(None).map_err(|e| miette!("{}", e))?;
    let project = resolve_entity(&projects, &args.id, "project")?;
    let id = project.id.clone();
    let name = project.name.clone();
    let embedded = project.milestones.len() + project.invoices.len() + project.team.len();

    if !args.yes {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!(
                "Delete project '{}' and its {} embedded record(s)?",
                name, embedded
            ))
            .default(false)
            .interact()
            .into_diagnostic()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    if repo.delete_project(&id).map_err(|e| miette!("{}", e))? {
        println!("{} Deleted project {}", style("✓").green(), name);
    } else {
        return Err(miette!("project {} was not found", id));
    }

    Ok(())
}
