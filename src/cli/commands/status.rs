//! `atelier status` command - workspace dashboard

use clap::Args;
use console::style;
use miette::{miette, IntoDiagnostic, Result};

use crate::cli::helpers::{format_short_id, open_repo, truncate_str};
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Skip the recent-projects section
    #[arg(long)]
    pub no_recent: bool,
}

pub fn run(args: StatusArgs, global: &GlobalOpts) -> Result<()> {
    let repo = open_repo(global)?;
    let kpi = repo.dashboard().map_err(|e| miette!("{}", e))?;

    match global.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&kpi).into_diagnostic()?);
            return Ok(());
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&kpi).into_diagnostic()?);
            return Ok(());
        }
        _ => {}
    }

    println!("\n{}\n", style("Workspace Dashboard").bold());

    println!("Projects");
    println!("  Total:      {}", style(kpi.total_projects).cyan());
    println!("  Active:     {}", style(kpi.active_projects).green());
    println!("  Completed:  {}", kpi.completed_projects);
    println!(
        "  Delayed:    {}",
        if kpi.delayed_projects > 0 {
            style(kpi.delayed_projects).red().to_string()
        } else {
            kpi.delayed_projects.to_string()
        }
    );

    println!();
    println!("Financials");
    println!(
        "  Fee volume:       {}",
        style(format!("{:.2}", kpi.total_revenue)).cyan()
    );
    println!("  Pending invoices: {}", kpi.pending_invoices);
    println!(
        "  Overdue invoices: {}",
        if kpi.overdue_invoices > 0 {
            style(kpi.overdue_invoices).red().to_string()
        } else {
            kpi.overdue_invoices.to_string()
        }
    );

    println!();
    println!("Operations");
    println!(
        "  Resource utilization: {:.0}%",
        kpi.resource_utilization
    );
    println!("  Deadlines this week:  {}", kpi.upcoming_deadlines);
    println!("  Pending inspections:  {}", kpi.pending_inspections);

    if !args.no_recent && !kpi.recent_projects.is_empty() {
        println!();
        println!("Recently updated");
        for p in &kpi.recent_projects {
            println!(
                "  {:<16} {:<30} {}",
                style(format_short_id(&p.id)).cyan(),
                truncate_str(&p.name, 28),
                p.status
            );
        }
    }

    println!();
    Ok(())
}
