//! `atelier inv` command - invoice management
//!
//! Invoices are addressed per project, so every subcommand takes the owning
//! project first.

use chrono::NaiveDate;
use clap::{Args, Subcommand};
use console::style;
use miette::{miette, IntoDiagnostic, Result};

use crate::cli::helpers::{
    escape_csv, format_short_id, open_repo, require_access, resolve_entity, restore_session,
    truncate_str,
};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::access::{Action, Resource};
use crate::entities::{InvoiceStatus, InvoiceType, InvoiceUpdate, NewInvoice};

#[derive(Subcommand, Debug)]
pub enum InvCommands {
    /// List a project's invoices
    List(ListArgs),

    /// Raise a new invoice on a project
    Add(AddArgs),

    /// Show an invoice's details
    Show(ShowArgs),

    /// Update fields on an invoice
    Set(SetArgs),

    /// Delete an invoice
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Project ID or fuzzy name query
    pub project: String,

    /// Filter by status
    #[arg(long, short = 's')]
    pub status: Option<InvoiceStatus>,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Project ID or fuzzy name query
    pub project: String,

    /// Invoice number (e.g. INV-2025-014)
    #[arg(long)]
    pub number: String,

    /// Amount
    #[arg(long)]
    pub amount: f64,

    /// Issue date (YYYY-MM-DD)
    #[arg(long)]
    pub issued: NaiveDate,

    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: NaiveDate,

    /// Direction of the invoice
    #[arg(long, short = 't', default_value = "pmc_to_client")]
    pub r#type: InvoiceType,

    #[arg(long, default_value = "")]
    pub description: String,

    /// Milestone this invoice bills (id or name)
    #[arg(long, short = 'm')]
    pub milestone: Option<String>,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Project ID or fuzzy name query
    pub project: String,

    /// Invoice ID or number
    pub invoice: String,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    /// Project ID or fuzzy name query
    pub project: String,

    /// Invoice ID or number
    pub invoice: String,

    #[arg(long)]
    pub number: Option<String>,

    #[arg(long)]
    pub amount: Option<f64>,

    #[arg(long)]
    pub status: Option<InvoiceStatus>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub due: Option<NaiveDate>,

    /// Payment date; also marks the invoice paid
    #[arg(long)]
    pub paid: Option<NaiveDate>,

    /// Payment method (e.g. "bank transfer")
    #[arg(long)]
    pub method: Option<String>,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Project ID or fuzzy name query
    pub project: String,

    /// Invoice ID or number
    pub invoice: String,

    /// Skip confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(cmd: InvCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        InvCommands::List(args) => run_list(args, global),
        InvCommands::Add(args) => run_add(args, global),
        InvCommands::Show(args) => run_show(args, global),
        InvCommands::Set(args) => run_set(args, global),
        InvCommands::Delete(args) => run_delete(args, global),
    }
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let repo = open_repo(global)?;
    let projects = repo.projects(None).map_err(|e| miette!("{}", e))?;
    let project = resolve_entity(&projects, &args.project, "project")?;

    let mut invoices = project.invoices.clone();
    if let Some(status) = args.status {
        invoices.retain(|i| i.status == status);
    }

    match global.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&invoices).into_diagnostic()?
            );
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&invoices).into_diagnostic()?);
        }
        OutputFormat::Csv => {
            println!("id,number,type,amount,status,issued,due");
            for i in &invoices {
                println!(
                    "{},{},{},{},{},{},{}",
                    i.id,
                    escape_csv(&i.invoice_number),
                    i.invoice_type,
                    i.amount,
                    i.status,
                    i.issue_date,
                    i.due_date
                );
            }
        }
        OutputFormat::Id => {
            for i in &invoices {
                println!("{}", i.id);
            }
        }
        _ => {
            if invoices.is_empty() {
                println!("No invoices on {}.", project.name);
                return Ok(());
            }
            println!("\nInvoices on {}\n", style(&project.name).yellow());
            println!(
                "{:<16} {:<16} {:>12} {:<10} {:<10} {:<10}",
                style("ID").bold(),
                style("NUMBER").bold(),
                style("AMOUNT").bold(),
                style("STATUS").bold(),
                style("ISSUED").bold(),
                style("DUE").bold()
            );
            println!("{}", "-".repeat(80));
            for i in &invoices {
                println!(
                    "{:<16} {:<16} {:>12.2} {:<10} {:<10} {:<10}",
                    format_short_id(&i.id),
                    truncate_str(&i.invoice_number, 14),
                    i.amount,
                    i.status,
                    i.issue_date,
                    i.due_date
                );
            }
            let total: f64 = invoices.iter().map(|i| i.amount).sum();
            println!();
            println!(
                "{} invoice(s), {} total",
                style(invoices.len()).cyan(),
                style(format!("{:.2}", total)).cyan()
            );
        }
    }

    Ok(())
}

fn run_add(args: AddArgs, global: &GlobalOpts) -> Result<()> {
    let repo = open_repo(global)?;
    let session = restore_session(&repo)?;
    require_access(&session, Resource::Invoices, Action::Create)?;

    let projects = repo.projects(None).map_err(|e| miette!("{}", e))?;
    let project = resolve_entity(&projects, &args.project, "project")?;

    let mut input = NewInvoice::new(
        project.id.clone(),
        args.number,
        args.amount,
        args.issued,
        args.due,
    );
    input.invoice_type = args.r#type;
    input.description = args.description;
    if let Some(milestone) = &args.milestone {
        input.milestone_id = Some(
            resolve_entity(&project.milestones, milestone, "milestone")?
                .id
                .clone(),
        );
    }

    let invoice = repo.create_invoice(input).map_err(|e| miette!("{}", e))?;

    println!(
        "{} Raised invoice {} for {:.2} on {} ({})",
        style("✓").green(),
        style(&invoice.invoice_number).yellow(),
        invoice.amount,
        project.name,
        style(format_short_id(&invoice.id)).cyan()
    );

    Ok(())
}

/// Find an invoice on a project by id, id prefix or invoice number
fn find_invoice<'a>(
    project: &'a crate::entities::Project,
    query: &str,
) -> Result<&'a crate::entities::Invoice> {
    project
        .invoices
        .iter()
        .find(|i| {
            let id = i.id.to_string();
            id == query || id.starts_with(query) || i.invoice_number.eq_ignore_ascii_case(query)
        })
        .ok_or_else(|| miette!("no invoice matching '{}' on {}", query, project.name))
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let repo = open_repo(global)?;
    let projects = repo.projects(None).map_err(|e| miette!("{}", e))?;
    let project = resolve_entity(&projects, &args.project, "project")?;
    let invoice = find_invoice(project, &args.invoice)?;

    match global.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(invoice).into_diagnostic()?
            );
        }
        OutputFormat::Id => println!("{}", invoice.id),
        _ => {
            print!("{}", serde_yml::to_string(invoice).into_diagnostic()?);
        }
    }

    Ok(())
}

fn run_set(args: SetArgs, global: &GlobalOpts) -> Result<()> {
    let repo = open_repo(global)?;
    let session = restore_session(&repo)?;
    require_access(&session, Resource::Invoices, Action::Edit)?;

    let projects = repo.projects(None).map_err(|e| miette!("{}", e))?;
    let project = resolve_entity(&projects, &args.project, "project")?;
    let invoice = find_invoice(project, &args.invoice)?;
    let project_id = project.id.clone();
    let invoice_id = invoice.id.clone();

    let mut update = InvoiceUpdate {
        invoice_number: args.number,
        amount: args.amount,
        status: args.status,
        description: args.description,
        due_date: args.due,
        payment_method: args.method,
        ..Default::default()
    };

    if let Some(date) = args.paid {
        update.paid_date = Some(date);
        update.status.get_or_insert(InvoiceStatus::Paid);
    }

    let updated = repo
        .update_invoice(&project_id, &invoice_id, update)
        .map_err(|e| miette!("{}", e))?
        .ok_or_else(|| miette!("invoice {} vanished mid-update", invoice_id))?;

    println!(
        "{} Updated invoice {} ({})",
        style("✓").green(),
        style(&updated.invoice_number).yellow(),
        updated.status
    );

    Ok(())
}

fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let repo = open_repo(global)?;
    let session = restore_session(&repo)?;
    require_access(&session, Resource::Invoices, Action::Edit)?;

    let projects = repo.projects(None).map_err(|e| miette!("{}", e))?;
    let project = resolve_entity(&projects, &args.project, "project")?;
    let invoice = find_invoice(project, &args.invoice)?;
    let project_id = project.id.clone();
    let invoice_id = invoice.id.clone();
    let number = invoice.invoice_number.clone();

    if !args.yes {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!("Delete invoice '{}'?", number))
            .default(false)
            .interact()
            .into_diagnostic()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    if repo
        .delete_invoice(&project_id, &invoice_id)
        .map_err(|e| miette!("{}", e))?
    {
        println!("{} Deleted invoice {}", style("✓").green(), number);
    } else {
        return Err(miette!("invoice {} was not found", invoice_id));
    }

    Ok(())
}
