//! `atelier insp` command - inspection management

use chrono::NaiveDate;
use clap::{Args, Subcommand};
use console::style;
use miette::{miette, IntoDiagnostic, Result};

use crate::cli::helpers::{
    format_short_id, open_repo, require_access, resolve_entity, restore_session, truncate_str,
    user_name,
};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::access::{Action, Resource};
use crate::core::repository::InspectionAnchor;
use crate::entities::{
    ComplianceStatus, InspectionStatus, InspectionUpdate, NewInspection,
};

#[derive(Subcommand, Debug)]
pub enum InspCommands {
    /// List inspections across the workspace
    List(ListArgs),

    /// Schedule a new inspection
    Add(AddArgs),

    /// Update fields on an inspection
    Set(SetArgs),

    /// Delete an inspection
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Restrict to one project (id or name)
    #[arg(long, short = 'p')]
    pub project: Option<String>,

    /// Filter by scheduling status
    #[arg(long, short = 's')]
    pub status: Option<InspectionStatus>,

    /// Filter by compliance outcome
    #[arg(long)]
    pub compliance: Option<ComplianceStatus>,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Project ID or fuzzy name query
    pub project: String,

    /// Inspection title
    #[arg(long)]
    pub title: String,

    #[arg(long, default_value = "")]
    pub description: String,

    /// Inspection date (YYYY-MM-DD)
    #[arg(long)]
    pub date: NaiveDate,

    /// Anchor milestone (id or name). Falls back to the project when the
    /// query matches no milestone.
    #[arg(long, short = 'm')]
    pub milestone: Option<String>,

    /// Inspector (user id or name)
    #[arg(long)]
    pub inspector: Option<String>,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    /// Inspection ID or fuzzy title query
    pub id: String,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub status: Option<InspectionStatus>,

    #[arg(long)]
    pub compliance: Option<ComplianceStatus>,

    #[arg(long)]
    pub observations: Option<String>,

    #[arg(long)]
    pub recommendations: Option<String>,

    /// Inspector (user id or name)
    #[arg(long)]
    pub inspector: Option<String>,

    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Follow-up inspection date (YYYY-MM-DD)
    #[arg(long)]
    pub next_date: Option<NaiveDate>,

    /// Path to the filed report
    #[arg(long)]
    pub report: Option<String>,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Inspection ID or fuzzy title query
    pub id: String,

    /// Skip confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(cmd: InspCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        InspCommands::List(args) => run_list(args, global),
        InspCommands::Add(args) => run_add(args, global),
        InspCommands::Set(args) => run_set(args, global),
        InspCommands::Delete(args) => run_delete(args, global),
    }
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let repo = open_repo(global)?;
    let users = repo.users().map_err(|e| miette!("{}", e))?;

    let mut inspections = repo.inspections().map_err(|e| miette!("{}", e))?;
    if let Some(project) = &args.project {
        let projects = repo.projects(None).map_err(|e| miette!("{}", e))?;
        let project = resolve_entity(&projects, project, "project")?;
        inspections.retain(|i| i.project_id == project.id);
    }
    if let Some(status) = args.status {
        inspections.retain(|i| i.status == status);
    }
    if let Some(compliance) = args.compliance {
        inspections.retain(|i| i.compliance == compliance);
    }

    match global.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&inspections).into_diagnostic()?
            );
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&inspections).into_diagnostic()?);
        }
        OutputFormat::Id => {
            for i in &inspections {
                println!("{}", i.id);
            }
        }
        _ => {
            if inspections.is_empty() {
                println!("No inspections found.");
                return Ok(());
            }
            println!(
                "{:<16} {:<28} {:<10} {:<12} {:<20} {:<20}",
                style("ID").bold(),
                style("TITLE").bold(),
                style("DATE").bold(),
                style("STATUS").bold(),
                style("COMPLIANCE").bold(),
                style("INSPECTOR").bold()
            );
            println!("{}", "-".repeat(110));
            for i in &inspections {
                println!(
                    "{:<16} {:<28} {:<10} {:<12} {:<20} {:<20}",
                    format_short_id(&i.id),
                    truncate_str(&i.title, 26),
                    i.inspection_date,
                    i.status,
                    i.compliance,
                    truncate_str(&user_name(&users, i.inspector_id.as_ref()), 18)
                );
            }
            println!();
            println!("{} inspection(s)", style(inspections.len()).cyan());
        }
    }

    Ok(())
}

fn run_add(args: AddArgs, global: &GlobalOpts) -> Result<()> {
    let repo = open_repo(global)?;
    let session = restore_session(&repo)?;
    require_access(&session, Resource::Inspections, Action::Create)?;

    let projects = repo.projects(None).map_err(|e| miette!("{}", e))?;
    let project = resolve_entity(&projects, &args.project, "project")?;

    let mut input = NewInspection::new(project.id.clone(), args.title, args.date);
    input.description = args.description;

    if let Some(milestone) = &args.milestone {
        // Resolve against this project's milestones; an unresolvable query
        // still creates the inspection, at project level
        if let Ok(ms) = resolve_entity(&project.milestones, milestone, "milestone") {
            input.milestone_id = Some(ms.id.clone());
        }
    }

    if let Some(inspector) = args.inspector {
        let users = repo.users().map_err(|e| miette!("{}", e))?;
        input.inspector_id = Some(resolve_entity(&users, &inspector, "user")?.id.clone());
    }

    let (inspection, anchor) = repo.create_inspection(input).map_err(|e| miette!("{}", e))?;

    let home = match &anchor {
        InspectionAnchor::Milestone(_) => "milestone",
        InspectionAnchor::Project(_) => "project",
    };
    println!(
        "{} Scheduled inspection {} on {} ({} level, {})",
        style("✓").green(),
        style(&inspection.title).yellow(),
        project.name,
        home,
        style(format_short_id(&inspection.id)).cyan()
    );

    Ok(())
}

fn run_set(args: SetArgs, global: &GlobalOpts) -> Result<()> {
    let repo = open_repo(global)?;
    let session = restore_session(&repo)?;
    require_access(&session, Resource::Inspections, Action::Edit)?;

    let inspections = repo.inspections().map_err(|e| miette!("{}", e))?;
    let inspection = resolve_entity(&inspections, &args.id, "inspection")?;
    let id = inspection.id.clone();

    let mut update = InspectionUpdate {
        title: args.title,
        description: args.description,
        status: args.status,
        compliance: args.compliance,
        observations: args.observations,
        recommendations: args.recommendations,
        inspection_date: args.date,
        next_inspection_date: args.next_date,
        report_path: args.report,
        ..Default::default()
    };

    if let Some(inspector) = args.inspector {
        let users = repo.users().map_err(|e| miette!("{}", e))?;
        update.inspector_id = Some(resolve_entity(&users, &inspector, "user")?.id.clone());
    }

    let updated = repo
        .update_inspection(&id, update)
        .map_err(|e| miette!("{}", e))?
        .ok_or_else(|| miette!("inspection {} vanished mid-update", id))?;

    println!(
        "{} Updated inspection {} ({}, {})",
        style("✓").green(),
        style(&updated.title).yellow(),
        updated.status,
        updated.compliance
    );

    Ok(())
}

fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let repo = open_repo(global)?;
    let session = restore_session(&repo)?;
    require_access(&session, Resource::Inspections, Action::Edit)?;

    let inspections = repo.inspections().map_err(|e| miette!("{}", e))?;
    let inspection = resolve_entity(&inspections, &args.id, "inspection")?;
    let id = inspection.id.clone();
    let title = inspection.title.clone();

    if !args.yes {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!("Delete inspection '{}'?", title))
            .default(false)
            .interact()
            .into_diagnostic()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    if repo.delete_inspection(&id).map_err(|e| miette!("{}", e))? {
        println!("{} Deleted inspection {}", style("✓").green(), title);
    } else {
        return Err(miette!("inspection {} was not found", id));
    }

    Ok(())
}
