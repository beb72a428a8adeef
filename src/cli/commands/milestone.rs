//! `atelier ms` command - milestone management

use chrono::NaiveDate;
use clap::{Args, Subcommand};
use console::style;
use miette::{miette, IntoDiagnostic, Result};

use crate::cli::helpers::{
    format_short_id, open_repo, require_access, resolve_entity, restore_session, truncate_str,
};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::access::{Action, Resource};
use crate::entities::{Milestone, MilestoneStatus, MilestoneUpdate, NewMilestone};

#[derive(Subcommand, Debug)]
pub enum MsCommands {
    /// List a project's milestones
    List(ListArgs),

    /// Add a milestone to a project
    Add(AddArgs),

    /// Update fields on a milestone
    Set(SetArgs),

    /// Delete a milestone and its tasks
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Project ID or fuzzy name query
    pub project: String,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Project ID or fuzzy name query
    pub project: String,

    /// Milestone name
    #[arg(long)]
    pub name: String,

    #[arg(long, default_value = "")]
    pub description: String,

    /// Position in the sequence (default: appended at the end)
    #[arg(long)]
    pub order: Option<u32>,

    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// End date (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Invoice amount tied to this milestone
    #[arg(long)]
    pub invoice_amount: Option<f64>,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    /// Milestone ID or fuzzy name query
    pub id: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub order: Option<u32>,

    #[arg(long)]
    pub status: Option<MilestoneStatus>,

    /// Completion percentage (0-100)
    #[arg(long)]
    pub completion: Option<u8>,

    #[arg(long)]
    pub start: Option<NaiveDate>,

    #[arg(long)]
    pub end: Option<NaiveDate>,

    #[arg(long)]
    pub actual_start: Option<NaiveDate>,

    #[arg(long)]
    pub actual_end: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Milestone ID or fuzzy name query
    pub id: String,

    /// Skip confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(cmd: MsCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        MsCommands::List(args) => run_list(args, global),
        MsCommands::Add(args) => run_add(args, global),
        MsCommands::Set(args) => run_set(args, global),
        MsCommands::Delete(args) => run_delete(args, global),
    }
}

/// Gather every milestone in the workspace for fuzzy resolution
fn all_milestones(repo: &crate::core::repository::Repository) -> Result<Vec<Milestone>> {
    Ok(repo
        .projects(None)
        .map_err(|e| miette!("{}", e))?
        .into_iter()
        .flat_map(|p| p.milestones)
        .collect())
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let repo = open_repo(global)?;
    let projects = repo.projects(None).map_err(|e| miette!("{}", e))?;
    let project = resolve_entity(&projects, &args.project, "project")?;

    let mut milestones = project.milestones.clone();
    milestones.sort_by_key(|m| m.order);

    match global.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&milestones).into_diagnostic()?
            );
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&milestones).into_diagnostic()?);
        }
        OutputFormat::Id => {
            for m in &milestones {
                println!("{}", m.id);
            }
        }
        _ => {
            if milestones.is_empty() {
                println!("No milestones on {}.", project.name);
                return Ok(());
            }
            println!("\nMilestones on {}\n", style(&project.name).yellow());
            println!(
                "{:<6} {:<16} {:<28} {:<12} {:>5} {:>6}",
                style("ORDER").bold(),
                style("ID").bold(),
                style("NAME").bold(),
                style("STATUS").bold(),
                style("DONE").bold(),
                style("TASKS").bold()
            );
            println!("{}", "-".repeat(80));
            for m in &milestones {
                println!(
                    "{:<6} {:<16} {:<28} {:<12} {:>4}% {:>6}",
                    m.order,
                    format_short_id(&m.id),
                    truncate_str(&m.name, 26),
                    m.status,
                    m.completion_percentage,
                    m.tasks.len()
                );
            }
            println!();
            println!("{} milestone(s)", style(milestones.len()).cyan());
        }
    }

    Ok(())
}

fn run_add(args: AddArgs, global: &GlobalOpts) -> Result<()> {
    let repo = open_repo(global)?;
    let session = restore_session(&repo)?;
    require_access(&session, Resource::Projects, Action::Edit)?;

    let projects = repo.projects(None).map_err(|e| miette!("{}", e))?;
    let project = resolve_entity(&projects, &args.project, "project")?;

    let order = args.order.unwrap_or_else(|| {
        project
            .milestones
            .iter()
            .map(|m| m.order)
            .max()
            .map_or(1, |n| n + 1)
    });

    let mut input = NewMilestone::new(project.id.clone(), args.name, order);
    input.description = args.description;
    input.start_date = args.start;
    input.end_date = args.end;
    input.invoice_amount = args.invoice_amount;

    let milestone = repo.create_milestone(input).map_err(|e| miette!("{}", e))?;

    println!(
        "{} Added milestone {} (#{}) to {} ({})",
        style("✓").green(),
        style(&milestone.name).yellow(),
        milestone.order,
        project.name,
        style(format_short_id(&milestone.id)).cyan()
    );

    Ok(())
}

fn run_set(args: SetArgs, global: &GlobalOpts) -> Result<()> {
    let repo = open_repo(global)?;
    let session = restore_session(&repo)?;
    require_access(&session, Resource::Projects, Action::Edit)?;

    let milestones = all_milestones(&repo)?;
    let milestone = resolve_entity(&milestones, &args.id, "milestone")?;
    let id = milestone.id.clone();

    let update = MilestoneUpdate {
        name: args.name,
        description: args.description,
        order: args.order,
        status: args.status,
        completion_percentage: args.completion,
        start_date: args.start,
        end_date: args.end,
        actual_start_date: args.actual_start,
        actual_end_date: args.actual_end,
        ..Default::default()
    };

    let updated = repo
        .update_milestone(&id, update)
        .map_err(|e| miette!("{}", e))?
        .ok_or_else(|| miette!("milestone {} vanished mid-update", id))?;

    println!(
        "{} Updated milestone {} ({}, {}% complete)",
        style("✓").green(),
        style(&updated.name).yellow(),
        updated.status,
        updated.completion_percentage
    );

    Ok(())
}

fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let repo = open_repo(global)?;
    let session = restore_session(&repo)?;
    require_access(&session, Resource::Projects, Action::Edit)?;

    let milestones = all_milestones(&repo)?;
    let milestone = resolve_entity(&milestones, &args.id, "milestone")?;
    let id = milestone.id.clone();
    let name = milestone.name.clone();

    if !args.yes {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!(
                "Delete milestone '{}' and its {} task(s)?",
                name,
                milestone.tasks.len()
            ))
            .default(false)
            .interact()
            .into_diagnostic()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    if repo.delete_milestone(&id).map_err(|e| miette!("{}", e))? {
        println!("{} Deleted milestone {}", style("✓").green(), name);
    } else {
        return Err(miette!("milestone {} was not found", id));
    }

    Ok(())
}
