//! `atelier task` command - task management

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
use crate::core::entity::Priority;
use crate::core::identity::EntityId;
use crate::entities::{NewTask, Task, TaskStatus, TaskUpdate};

#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// List tasks on a project or milestone
    List(ListArgs),

    /// Add a task to a milestone
    Add(AddArgs),

    /// Update fields on a task
    Set(SetArgs),

    /// Delete a task
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Project ID or fuzzy name query
    pub project: String,

    /// Restrict to one milestone (id or name)
    #[arg(long, short = 'm')]
    pub milestone: Option<String>,

    /// Filter by status
    #[arg(long, short = 's')]
    pub status: Option<TaskStatus>,

    /// Filter by assignee (user id or name)
    #[arg(long)]
    pub assignee: Option<String>,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Milestone ID or fuzzy name query
    pub milestone: String,

    /// Task title
    #[arg(long)]
    pub title: String,

    #[arg(long, default_value = "")]
    pub description: String,

    /// Assignee (user id or name)
    #[arg(long)]
    pub assignee: Option<String>,

    #[arg(long, default_value = "medium")]
    pub priority: Priority,

    /// Estimated hours
    #[arg(long, default_value_t = 0.0)]
    pub hours: f64,

    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<NaiveDate>,

    /// Task ids this task depends on (comma-separated, same project)
    #[arg(long, value_delimiter = ',')]
    pub depends_on: Vec<String>,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    /// Task ID or fuzzy title query
    pub id: String,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub status: Option<TaskStatus>,

    #[arg(long)]
    pub priority: Option<Priority>,

    /// Assignee (user id or name)
    #[arg(long)]
    pub assignee: Option<String>,

    #[arg(long)]
    pub hours: Option<f64>,

    #[arg(long)]
    pub actual_hours: Option<f64>,

    #[arg(long)]
    pub due: Option<NaiveDate>,

    /// Completion date; also marks the task completed
    #[arg(long)]
    pub completed: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Task ID or fuzzy title query
    pub id: String,

    /// Skip confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(cmd: TaskCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        TaskCommands::List(args) => run_list(args, global),
        TaskCommands::Add(args) => run_add(args, global),
        TaskCommands::Set(args) => run_set(args, global),
        TaskCommands::Delete(args) => run_delete(args, global),
    }
}

fn all_tasks(repo: &crate::core::repository::Repository) -> Result<Vec<Task>> {
    Ok(repo
        .projects(None)
        .map_err(|e| miette!("{}", e))?
        .into_iter()
        .flat_map(|p| p.milestones)
        .flat_map(|m| m.tasks)
        .collect())
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let repo = open_repo(global)?;
    let projects = repo.projects(None).map_err(|e| miette!("{}", e))?;
    let project = resolve_entity(&projects, &args.project, "project")?;
    let users = repo.users().map_err(|e| miette!("{}", e))?;

    let milestone_filter: Option<EntityId> = match &args.milestone {
        Some(query) => Some(
            resolve_entity(&project.milestones, query, "milestone")?
                .id
                .clone(),
        ),
        None => None,
    };

    let assignee_filter: Option<EntityId> = match &args.assignee {
        Some(query) => Some(resolve_entity(&users, query, "user")?.id.clone()),
        None => None,
    };

    let mut tasks: Vec<&Task> = project
        .milestones
        .iter()
        .filter(|m| milestone_filter.as_ref().map_or(true, |id| m.id == *id))
        .flat_map(|m| &m.tasks)
        .collect();
    if let Some(status) = args.status {
        tasks.retain(|t| t.status == status);
    }
    if let Some(assignee) = &assignee_filter {
        tasks.retain(|t| t.assigned_to.as_ref() == Some(assignee));
    }

    match global.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&tasks).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&tasks).into_diagnostic()?);
        }
        OutputFormat::Id => {
            for t in &tasks {
                println!("{}", t.id);
            }
        }
        _ => {
            if tasks.is_empty() {
                println!("No tasks found on {}.", project.name);
                return Ok(());
            }
            println!("\nTasks on {}\n", style(&project.name).yellow());
            println!(
                "{:<16} {:<30} {:<12} {:<10} {:<20} {:<10}",
                style("ID").bold(),
                style("TITLE").bold(),
                style("STATUS").bold(),
                style("PRIORITY").bold(),
                style("ASSIGNEE").bold(),
                style("DUE").bold()
            );
            println!("{}", "-".repeat(102));
            for t in &tasks {
                println!(
                    "{:<16} {:<30} {:<12} {:<10} {:<20} {:<10}",
                    format_short_id(&t.id),
                    truncate_str(&t.title, 28),
                    t.status,
                    t.priority,
                    truncate_str(&user_name(&users, t.assigned_to.as_ref()), 18),
                    t.due_date.map_or("-".to_string(), |d| d.to_string())
                );
            }
            println!();
            println!("{} task(s)", style(tasks.len()).cyan());
        }
    }

    Ok(())
}

fn run_add(args: AddArgs, global: &GlobalOpts) -> Result<()> {
    let repo = open_repo(global)?;
    let session = restore_session(&repo)?;
    require_access(&session, Resource::Projects, Action::Edit)?;

    let projects = repo.projects(None).map_err(|e| miette!("{}", e))?;
    let milestones: Vec<_> = projects
        .iter()
        .flat_map(|p| p.milestones.iter().cloned())
        .collect();
    let milestone = resolve_entity(&milestones, &args.milestone, "milestone")?;

    let mut input = NewTask::new(milestone.project_id.clone(), milestone.id.clone(), args.title);
    input.description = args.description;
    input.priority = args.priority;
    input.estimated_hours = args.hours;
    input.start_date = args.start;
    input.due_date = args.due;

    if let Some(assignee) = args.assignee {
        let users = repo.users().map_err(|e| miette!("{}", e))?;
        input.assigned_to = Some(resolve_entity(&users, &assignee, "user")?.id.clone());
    }

    // Dependencies must name tasks in the same project
    let project_tasks: Vec<Task> = projects
        .iter()
        .filter(|p| p.id == milestone.project_id)
        .flat_map(|p| p.milestones.iter().flat_map(|m| m.tasks.iter().cloned()))
        .collect();
    for dep in &args.depends_on {
        input
            .dependencies
            .push(resolve_entity(&project_tasks, dep, "task")?.id.clone());
    }

    let task = repo.create_task(input).map_err(|e| miette!("{}", e))?;

    println!(
        "{} Added task {} to {} ({})",
        style("✓").green(),
        style(&task.title).yellow(),
        milestone.name,
        style(format_short_id(&task.id)).cyan()
    );

    Ok(())
}

fn run_set(args: SetArgs, global: &GlobalOpts) -> Result<()> {
    let repo = open_repo(global)?;
    let session = restore_session(&repo)?;
    require_access(&session, Resource::Projects, Action::Edit)?;

    let tasks = all_tasks(&repo)?;
    let task = resolve_entity(&tasks, &args.id, "task")?;
    let id = task.id.clone();

    let mut update = TaskUpdate {
        title: args.title,
        description: args.description,
        status: args.status,
        priority: args.priority,
        estimated_hours: args.hours,
        actual_hours: args.actual_hours,
        due_date: args.due,
        ..Default::default()
    };

    if let Some(date) = args.completed {
        update.completed_date = Some(date);
        update.status.get_or_insert(TaskStatus::Completed);
    }

    if let Some(assignee) = args.assignee {
        let users = repo.users().map_err(|e| miette!("{}", e))?;
        update.assigned_to = Some(resolve_entity(&users, &assignee, "user")?.id.clone());
    }

    let updated = repo
        .update_task(&id, update)
        .map_err(|e| miette!("{}", e))?
        .ok_or_else(|| miette!("task {} vanished mid-update", id))?;

    println!(
        "{} Updated task {} ({})",
        style("✓").green(),
        style(&updated.title).yellow(),
        updated.status
    );

    Ok(())
}

fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let repo = open_repo(global)?;
    let session = restore_session(&repo)?;
    require_access(&session, Resource::Projects, Action::Edit)?;

    let tasks = all_tasks(&repo)?;
    let task = resolve_entity(&tasks, &args.id, "task")?;
    let id = task.id.clone();
    let title = task.title.clone();

    if !args.yes {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!("Delete task '{}'?", title))
            .default(false)
            .interact()
            .into_diagnostic()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    if repo.delete_task(&id).map_err(|e| miette!("{}", e))? {
        println!("{} Deleted task {}", style("✓").green(), title);
    } else {
        return Err(miette!("task {} was not found", id));
    }

    Ok(())
}
