//! `atelier login` / `logout` / `whoami` - session management

use clap::Args;
use console::style;
use miette::{bail, miette, IntoDiagnostic, Result};

use crate::cli::helpers::{open_repo, restore_session};
use crate::cli::GlobalOpts;
use crate::core::access::{allowed_roles, Action, Resource, Session};

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Email of the user to log in as
    pub email: String,

    /// Password. Prompted for when omitted; accepted unchecked either way
    /// (local-first placeholder, not a security boundary).
    #[arg(long)]
    pub password: Option<String>,
}

pub fn run_login(args: LoginArgs, global: &GlobalOpts) -> Result<()> {
    let repo = open_repo(global)?;

    let password = match args.password {
        Some(p) => p,
        None => dialoguer::Password::new()
            .with_prompt("Password")
            .allow_empty_password(true)
            .interact()
            .into_diagnostic()?,
    };

    let mut session = Session::anonymous();
    if !session
        .login(&repo, &args.email, &password)
        .map_err(|e| miette!("{}", e))?
    {
        bail!(
            "login failed: no active user with email '{}'.\n\
             List accounts with: atelier user list",
            args.email
        );
    }

    let Some(user) = session.user() else {
        bail!("login failed");
    };
    println!(
        "{} Logged in as {} ({})",
        style("✓").green(),
        style(&user.name).yellow(),
        user.role
    );

    Ok(())
}

pub fn run_logout(global: &GlobalOpts) -> Result<()> {
    let repo = open_repo(global)?;
    let mut session = restore_session(&repo)?;

    if !session.is_authenticated() {
        println!("No active session.");
        return Ok(());
    }

    session.logout(&repo).map_err(|e| miette!("{}", e))?;
    println!("{} Logged out", style("✓").green());

    Ok(())
}

pub fn run_whoami(global: &GlobalOpts) -> Result<()> {
    let repo = open_repo(global)?;
    let session = restore_session(&repo)?;

    let Some(user) = session.user() else {
        bail!("not logged in. Run 'atelier login <email>' first.");
    };

    println!("\nCurrent User\n");
    println!("Name:   {}", user.name);
    println!("Email:  {}", user.email);
    println!("Role:   {}", user.role);
    println!("Active: {}", user.active);

    println!("\nPermissions:");
    let resources = [
        Resource::Projects,
        Resource::Teams,
        Resource::Financials,
        Resource::Users,
        Resource::Inspections,
        Resource::Invoices,
    ];
    let actions = [
        Action::View,
        Action::Create,
        Action::Edit,
        Action::Delete,
        Action::Manage,
    ];
    for resource in resources {
        let granted: Vec<String> = actions
            .iter()
            .filter(|action| {
                allowed_roles(resource, **action).is_some() && session.can_access(resource, **action)
            })
            .map(|action| action.to_string())
            .collect();
        println!(
            "  {:<12} {}",
            format!("{}:", resource),
            if granted.is_empty() {
                style("none".to_string()).dim().to_string()
            } else {
                granted.join(", ")
            }
        );
    }

    Ok(())
}
