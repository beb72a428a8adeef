//! `atelier user` command - user account management

use clap::{Args, Subcommand};
use console::style;
use miette::{miette, IntoDiagnostic, Result};

use crate::cli::helpers::{
    effective_format, escape_csv, format_short_id, open_repo, require_access, resolve_entity,
    restore_session, truncate_str,
};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::access::{Action, Resource};
use crate::core::identity::EntityId;
use crate::entities::{NewUser, Role, UserUpdate};

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// List user accounts
    List(ListArgs),

    /// Create a new user
    New(NewArgs),

    /// Show a user's details
    Show(ShowArgs),

    /// Update fields on a user
    Set(SetArgs),

    /// Delete a user (team assignments keep their dangling reference)
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Filter by role
    #[arg(long, short = 'r')]
    pub role: Option<Role>,

    /// Only active users
    #[arg(long)]
    pub active: bool,

    /// Show count only, not the items
    #[arg(long)]
    pub count: bool,
}

#[derive(Args, Debug)]
pub struct NewArgs {
    /// Full name
    #[arg(long)]
    pub name: String,

    /// Email (also the login identifier)
    #[arg(long)]
    pub email: String,

    /// Access-control role
    #[arg(long)]
    pub role: Role,

    /// Owning company id
    #[arg(long)]
    pub company: Option<String>,

    /// Billing rate per hour
    #[arg(long)]
    pub hourly_rate: Option<f64>,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// User ID or fuzzy name query
    pub id: String,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    /// User ID or fuzzy name query
    pub id: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub role: Option<Role>,

    #[arg(long)]
    pub hourly_rate: Option<f64>,

    #[arg(long)]
    pub monthly_cost: Option<f64>,

    /// Mark active or inactive (inactive users cannot log in)
    #[arg(long)]
    pub active: Option<bool>,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// User ID or fuzzy name query
    pub id: String,

    /// Skip confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(cmd: UserCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        UserCommands::List(args) => run_list(args, global),
        UserCommands::New(args) => run_new(args, global),
        UserCommands::Show(args) => run_show(args, global),
        UserCommands::Set(args) => run_set(args, global),
        UserCommands::Delete(args) => run_delete(args, global),
    }
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let repo = open_repo(global)?;
    let mut users = repo.users().map_err(|e| miette!("{}", e))?;
    if let Some(role) = args.role {
        users.retain(|u| u.role == role);
    }
    if args.active {
        users.retain(|u| u.active);
    }

    if args.count {
        println!("{}", users.len());
        return Ok(());
    }

    let format = effective_format(global, OutputFormat::Table);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&users).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&users).into_diagnostic()?);
        }
        OutputFormat::Csv => {
            println!("id,name,email,role,active");
            for u in &users {
                println!(
                    "{},{},{},{},{}",
                    u.id,
                    escape_csv(&u.name),
                    escape_csv(&u.email),
                    u.role,
                    u.active
                );
            }
        }
        OutputFormat::Id => {
            for u in &users {
                println!("{}", u.id);
            }
        }
        _ => {
            if users.is_empty() {
                println!("No users found.");
                println!();
                println!("Create one with: {}", style("atelier user new").yellow());
                return Ok(());
            }
            println!(
                "{:<16} {:<22} {:<25} {:<20} {:<8}",
                style("ID").bold(),
                style("NAME").bold(),
                style("EMAIL").bold(),
                style("ROLE").bold(),
                style("ACTIVE").bold()
            );
            println!("{}", "-".repeat(94));
            for u in &users {
                println!(
                    "{:<16} {:<22} {:<25} {:<20} {:<8}",
                    format_short_id(&u.id),
                    truncate_str(&u.name, 20),
                    truncate_str(&u.email, 23),
                    u.role,
                    if u.active { "yes" } else { "no" }
                );
            }
            if !global.quiet {
                println!();
                println!("{} user(s) found", style(users.len()).cyan());
            }
        }
    }

    Ok(())
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let repo = open_repo(global)?;
    let existing = repo.users().map_err(|e| miette!("{}", e))?;

    // First account bootstraps the workspace; after that, user management
    // requires the users/manage permission
    if !existing.is_empty() {
        let session = restore_session(&repo)?;
        require_access(&session, Resource::Users, Action::Manage)?;
    }

    if existing
        .iter()
        .any(|u| u.email.eq_ignore_ascii_case(&args.email))
    {
        return Err(miette!("a user with email '{}' already exists", args.email));
    }

    let mut input = NewUser::new(args.name, args.email, args.role);
    input.hourly_rate = args.hourly_rate;
    if let Some(company) = args.company {
        let companies = repo.companies().map_err(|e| miette!("{}", e))?;
        input.company_id = Some(resolve_entity(&companies, &company, "company")?.id.clone());
    }

    let user = repo.create_user(input).map_err(|e| miette!("{}", e))?;

    println!(
        "{} Created user {} ({}) with role {}",
        style("✓").green(),
        style(&user.name).yellow(),
        style(format_short_id(&user.id)).cyan(),
        user.role
    );
    println!(
        "   Log in with: {}",
        style(format!("atelier login {}", user.email)).yellow()
    );

    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let repo = open_repo(global)?;
    let users = repo.users().map_err(|e| miette!("{}", e))?;
    let user = resolve_entity(&users, &args.id, "user")?;

    let format = effective_format(global, OutputFormat::Yaml);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(user).into_diagnostic()?);
        }
        OutputFormat::Id => println!("{}", user.id),
        _ => {
            print!("{}", serde_yml::to_string(user).into_diagnostic()?);
        }
    }

    Ok(())
}

fn run_set(args: SetArgs, global: &GlobalOpts) -> Result<()> {
    let repo = open_repo(global)?;
    let session = restore_session(&repo)?;
    require_access(&session, Resource::Users, Action::Manage)?;

    let users = repo.users().map_err(|e| miette!("{}", e))?;
    let user = resolve_entity(&users, &args.id, "user")?;
    let id: EntityId = user.id.clone();

    let update = UserUpdate {
        name: args.name,
        email: args.email,
        role: args.role,
        hourly_rate: args.hourly_rate,
        monthly_cost: args.monthly_cost,
        active: args.active,
        ..Default::default()
    };

    let updated = repo
        .update_user(&id, update)
        .map_err(|e| miette!("{}", e))?
        .ok_or_else(|| miette!("user {} vanished mid-update", id))?;

    println!(
        "{} Updated user {} ({})",
        style("✓").green(),
        style(&updated.name).yellow(),
        updated.role
    );

    Ok(())
}

fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let repo = open_repo(global)?;
    let session = restore_session(&repo)?;
    require_access(&session, Resource::Users, Action::Manage)?;

    let users = repo.users().map_err(|e| miette!("{}", e))?;
    let user = resolve_entity(&users, &args.id, "user")?;
    let id = user.id.clone();
    let name = user.name.clone();

    if !args.yes {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!(
                "Delete user '{}'? Team assignments keep the dangling id.",
                name
            ))
            .default(false)
            .interact()
            .into_diagnostic()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    if repo.delete_user(&id).map_err(|e| miette!("{}", e))? {
        println!("{} Deleted user {}", style("✓").green(), name);
    } else {
        return Err(miette!("user {} was not found", id));
    }

    Ok(())
}
