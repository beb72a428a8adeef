//! `atelier company` command - company management

use clap::{Args, Subcommand};
use console::style;
use miette::{miette, IntoDiagnostic, Result};

use crate::cli::helpers::{
    effective_format, escape_csv, format_short_id, open_repo, require_access, resolve_entity,
    restore_session, truncate_str,
};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::access::{Action, Resource};
use crate::entities::{Company, CompanyUpdate, NewCompany};

#[derive(Subcommand, Debug)]
pub enum CompanyCommands {
    /// List companies
    List(ListArgs),

    /// Create a new company
    New(NewArgs),

    /// Show a company's details
    Show(ShowArgs),

    /// Update fields on a company
    Set(SetArgs),

    /// Delete a company (projects keep their dangling reference)
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only active companies
    #[arg(long)]
    pub active: bool,

    /// Show count only, not the items
    #[arg(long)]
    pub count: bool,
}

#[derive(Args, Debug)]
pub struct NewArgs {
    /// Company name
    #[arg(long)]
    pub name: String,

    #[arg(long, default_value = "")]
    pub address: String,

    #[arg(long, default_value = "")]
    pub phone: String,

    #[arg(long, default_value = "")]
    pub email: String,

    /// Logo file path
    #[arg(long)]
    pub logo: Option<String>,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Company ID or fuzzy name query
    pub id: String,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    /// Company ID or fuzzy name query
    pub id: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub address: Option<String>,

    #[arg(long)]
    pub phone: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub logo: Option<String>,

    /// Mark active or inactive
    #[arg(long)]
    pub active: Option<bool>,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Company ID or fuzzy name query
    pub id: String,

    /// Skip confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(cmd: CompanyCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        CompanyCommands::List(args) => run_list(args, global),
        CompanyCommands::New(args) => run_new(args, global),
        CompanyCommands::Show(args) => run_show(args, global),
        CompanyCommands::Set(args) => run_set(args, global),
        CompanyCommands::Delete(args) => run_delete(args, global),
    }
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let repo = open_repo(global)?;
    let mut companies = repo.companies().map_err(|e| miette!("{}", e))?;
    if args.active {
        companies.retain(|c| c.active);
    }

    if args.count {
        println!("{}", companies.len());
        return Ok(());
    }

    let format = effective_format(global, OutputFormat::Table);

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&companies).into_diagnostic()?
            );
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&companies).into_diagnostic()?);
        }
        OutputFormat::Csv => {
            println!("id,name,email,phone,active");
            for c in &companies {
                println!(
                    "{},{},{},{},{}",
                    c.id,
                    escape_csv(&c.name),
                    escape_csv(&c.email),
                    escape_csv(&c.phone),
                    c.active
                );
            }
        }
        OutputFormat::Id => {
            for c in &companies {
                println!("{}", c.id);
            }
        }
        _ => {
            if companies.is_empty() {
                println!("No companies found.");
                println!();
                println!("Create one with: {}", style("atelier company new").yellow());
                return Ok(());
            }
            println!(
                "{:<16} {:<30} {:<25} {:<8}",
                style("ID").bold(),
                style("NAME").bold(),
                style("EMAIL").bold(),
                style("ACTIVE").bold()
            );
            println!("{}", "-".repeat(82));
            for c in &companies {
                println!(
                    "{:<16} {:<30} {:<25} {:<8}",
                    format_short_id(&c.id),
                    truncate_str(&c.name, 28),
                    truncate_str(&c.email, 23),
                    if c.active { "yes" } else { "no" }
                );
            }
            if !global.quiet {
                println!();
                println!("{} company(ies) found", style(companies.len()).cyan());
            }
        }
    }

    Ok(())
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let repo = open_repo(global)?;
    let session = restore_session(&repo)?;
    require_access(&session, Resource::Users, Action::Manage)?;

    let mut input = NewCompany::new(args.name);
    input.address = args.address;
    input.phone = args.phone;
    input.email = args.email;
    input.logo = args.logo;

    let company = repo.create_company(input).map_err(|e| miette!("{}", e))?;

    println!(
        "{} Created company {} ({})",
        style("✓").green(),
        style(&company.name).yellow(),
        style(format_short_id(&company.id)).cyan()
    );

    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let repo = open_repo(global)?;
    let companies = repo.companies().map_err(|e| miette!("{}", e))?;
    let company = resolve_entity(&companies, &args.id, "company")?;

    let format = effective_format(global, OutputFormat::Yaml);

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(company).into_diagnostic()?
            );
        }
        OutputFormat::Id => println!("{}", company.id),
        _ => {
            print!("{}", serde_yml::to_string(company).into_diagnostic()?);
        }
    }

    Ok(())
}

fn run_set(args: SetArgs, global: &GlobalOpts) -> Result<()> {
    let repo = open_repo(global)?;
    let session = restore_session(&repo)?;
    require_access(&session, Resource::Users, Action::Manage)?;

    let companies = repo.companies().map_err(|e| miette!("{}", e))?;
    let company = resolve_entity(&companies, &args.id, "company")?;
    let id = company.id.clone();

    let update = CompanyUpdate {
        name: args.name,
        address: args.address,
        phone: args.phone,
        email: args.email,
        logo: args.logo,
        active: args.active,
        ..Default::default()
    };

    let updated: Company = repo
        .update_company(&id, update)
        .map_err(|e| miette!("{}", e))?
        .ok_or_else(|| miette!("company {} vanished mid-update", id))?;

    println!(
        "{} Updated company {}",
        style("✓").green(),
        style(&updated.name).yellow()
    );

    Ok(())
}

fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let repo = open_repo(global)?;
    let session = restore_session(&repo)?;
    require_access(&session, Resource::Users, Action::Manage)?;

    let companies = repo.companies().map_err(|e| miette!("{}", e))?;
    let company = resolve_entity(&companies, &args.id, "company")?;
    let id = company.id.clone();
    let name = company.name.clone();

    if !args.yes {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!(
                "Delete company '{}'? Projects referencing it keep the dangling id.",
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

    if repo.delete_company(&id).map_err(|e| miette!("{}", e))? {
        println!("{} Deleted company {}", style("✓").green(), name);
    } else {
        return Err(miette!("company {} was not found", id));
    }

    Ok(())
}
