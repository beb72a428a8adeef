//! `atelier init` command - workspace initialization

use clap::Args;
use console::style;
use miette::{miette, Result};
use std::path::PathBuf;

use crate::core::repository::Repository;
use crate::core::workspace::Workspace;
use crate::entities::{Folder, FolderStructure, NewCompany, NewUser, Role};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Seed the workspace with a demo company and admin user
    #[arg(long)]
    pub sample: bool,
}

pub fn run(args: InitArgs) -> Result<()> {
    let workspace = Workspace::init(&args.path).map_err(|e| miette!("{}", e))?;

    println!(
        "{} Initialized Atelier workspace at {}",
        style("✓").green(),
        style(workspace.root().display()).cyan()
    );

    if args.sample {
        seed_sample_data(&Repository::open(&workspace))?;
    } else {
        println!();
        println!(
            "Create your first user with: {}",
            style("atelier user new --name \"You\" --email you@firm.com --role admin").yellow()
        );
    }

    Ok(())
}

/// Demo data for a first look around: one company, one admin account
fn seed_sample_data(repo: &Repository) -> Result<()> {
    if !repo.companies().map_err(|e| miette!("{}", e))?.is_empty() {
        println!("Workspace already holds data; skipping sample seed.");
        return Ok(());
    }

    let mut company = NewCompany::new("Architecture Consultancy Ltd");
    company.address = "123 Business District, City".to_string();
    company.phone = "+1-555-0123".to_string();
    company.email = "info@archconsult.com".to_string();
    company.default_folder_structure = FolderStructure {
        name: "Standard PMC Structure".to_string(),
        folders: vec![
            Folder {
                name: "Drawings".to_string(),
                path: "drawings".to_string(),
                children: Vec::new(),
            },
            Folder {
                name: "Agreements".to_string(),
                path: "agreements".to_string(),
                children: Vec::new(),
            },
            Folder {
                name: "Billing".to_string(),
                path: "billing".to_string(),
                children: Vec::new(),
            },
        ],
    };
    let company = repo.create_company(company).map_err(|e| miette!("{}", e))?;

    let mut admin = NewUser::new("System Admin", "admin@pmc.com", Role::Admin);
    admin.company_id = Some(company.id.clone());
    admin.hourly_rate = Some(100.0);
    repo.create_user(admin).map_err(|e| miette!("{}", e))?;

    println!();
    println!("{} Seeded sample data:", style("✓").green());
    println!("   Company: {}", style(&company.name).yellow());
    println!(
        "   Admin:   {} (log in with {})",
        "System Admin",
        style("atelier login admin@pmc.com").yellow()
    );

    Ok(())
}
