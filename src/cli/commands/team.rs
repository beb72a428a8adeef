//! `atelier team` command - project team assignments

use clap::{Args, Subcommand};
use console::style;
use miette::{miette, IntoDiagnostic, Result};

use crate::cli::helpers::{
    format_short_id, open_repo, require_access, resolve_entity, restore_session, truncate_str,
    user_name,
};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::access::{Action, Resource};

#[derive(Subcommand, Debug)]
pub enum TeamCommands {
    /// List a project's team
    List(ListArgs),

    /// Assign a user to a project
    Add(AddArgs),

    /// Remove an assignment from a project
    Remove(RemoveArgs),
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

    /// User to assign (id or name)
    #[arg(long, short = 'u')]
    pub user: String,

    /// Role label on this project (free-form, e.g. "Site engineer")
    #[arg(long, default_value = "")]
    pub role: String,

    /// Allocation percentage (0-100)
    #[arg(long, short = 'a', default_value_t = 100)]
    pub allocation: u8,
}

#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Project ID or fuzzy name query
    pub project: String,

    /// Assignment id, or the assigned user's id or name
    pub member: String,

    /// Skip confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(cmd: TeamCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        TeamCommands::List(args) => run_list(args, global),
        TeamCommands::Add(args) => run_add(args, global),
        TeamCommands::Remove(args) => run_remove(args, global),
    }
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let repo = open_repo(global)?;
    let projects = repo.projects(None).map_err(|e| miette!("{}", e))?;
    let project = resolve_entity(&projects, &args.project, "project")?;
    let users = repo.users().map_err(|e| miette!("{}", e))?;

    match global.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&project.team).into_diagnostic()?
            );
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&project.team).into_diagnostic()?);
        }
        OutputFormat::Id => {
            for m in &project.team {
                println!("{}", m.id);
            }
        }
        _ => {
            if project.team.is_empty() {
                println!("No team assignments on {}.", project.name);
                return Ok(());
            }
            println!("\nTeam on {}\n", style(&project.name).yellow());
            println!(
                "{:<16} {:<22} {:<20} {:>6} {:<8}",
                style("ID").bold(),
                style("USER").bold(),
                style("ROLE").bold(),
                style("ALLOC").bold(),
                style("ACTIVE").bold()
            );
            println!("{}", "-".repeat(76));
            for m in &project.team {
                println!(
                    "{:<16} {:<22} {:<20} {:>5}% {:<8}",
                    format_short_id(&m.id),
                    truncate_str(&user_name(&users, Some(&m.user_id)), 20),
                    truncate_str(&m.role, 18),
                    m.allocation,
                    if m.is_active { "yes" } else { "no" }
                );
            }
            println!();
            println!("{} assignment(s)", style(project.team.len()).cyan());
        }
    }

    Ok(())
}

fn run_add(args: AddArgs, global: &GlobalOpts) -> Result<()> {
    let repo = open_repo(global)?;
    let session = restore_session(&repo)?;
    require_access(&session, Resource::Teams, Action::Manage)?;

    let projects = repo.projects(None).map_err(|e| miette!("{}", e))?;
    let project = resolve_entity(&projects, &args.project, "project")?;
    let users = repo.users().map_err(|e| miette!("{}", e))?;
    let user = resolve_entity(&users, &args.user, "user")?;

    if args.allocation > 100 {
        return Err(miette!("allocation must be 0-100, got {}", args.allocation));
    }

    let member = repo
        .add_team_member(&project.id, user.id.clone(), &args.role, args.allocation)
        .map_err(|e| miette!("{}", e))?;

    println!(
        "{} Assigned {} to {} at {}% ({})",
        style("✓").green(),
        style(&user.name).yellow(),
        style(&project.name).yellow(),
        member.allocation,
        style(format_short_id(&member.id)).cyan()
    );

    Ok(())
}

fn run_remove(args: RemoveArgs, global: &GlobalOpts) -> Result<()> {
    let repo = open_repo(global)?;
    let session = restore_session(&repo)?;
    require_access(&session, Resource::Teams, Action::Manage)?;

    let projects = repo.projects(None).map_err(|e| miette!("{}", e))?;
    let project = resolve_entity(&projects, &args.project, "project")?;
    let users = repo.users().map_err(|e| miette!("{}", e))?;

    // Accept the assignment id, or the assigned user's id/name
    let member = project
        .team
        .iter()
        .find(|m| {
            let mid = m.id.to_string();
            let uid = m.user_id.to_string();
            mid == args.member
                || mid.starts_with(&args.member)
                || uid == args.member
                || uid.starts_with(&args.member)
                || user_name(&users, Some(&m.user_id))
                    .to_lowercase()
                    .contains(&args.member.to_lowercase())
        })
        .ok_or_else(|| {
            miette!(
                "no assignment matching '{}' on project {}",
                args.member,
                project.name
            )
        })?;

    let member_id = member.id.clone();
    let display = user_name(&users, Some(&member.user_id));

    if !args.yes {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!("Remove {} from {}?", display, project.name))
            .default(false)
            .interact()
            .into_diagnostic()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    if repo
        .remove_team_member(&project.id, &member_id)
        .map_err(|e| miette!("{}", e))?
    {
        println!(
            "{} Removed {} from {}",
            style("✓").green(),
            display,
            project.name
        );
    } else {
        return Err(miette!("assignment {} was not found", member_id));
    }

    Ok(())
}
