//! `atelier backup` command - full-dataset export, import and clear

use clap::{Args, Subcommand};
use console::style;
use miette::{miette, IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::helpers::open_repo;
use crate::cli::GlobalOpts;

#[derive(Subcommand, Debug)]
pub enum BackupCommands {
    /// Export companies, projects and users as one JSON bundle
    Export(ExportArgs),

    /// Import a bundle, overwriting each present collection
    Import(ImportArgs),

    /// Remove every stored collection and the session
    Clear(ClearArgs),
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Output file (default: stdout)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Bundle file to import
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct ClearArgs {
    /// Skip confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(cmd: BackupCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        BackupCommands::Export(args) => run_export(args, global),
        BackupCommands::Import(args) => run_import(args, global),
        BackupCommands::Clear(args) => run_clear(args, global),
    }
}

fn run_export(args: ExportArgs, global: &GlobalOpts) -> Result<()> {
    let repo = open_repo(global)?;
    let bundle = repo.export_all().map_err(|e| miette!("{}", e))?;
    let json = serde_json::to_string_pretty(&bundle).into_diagnostic()?;

    match args.output {
        Some(path) => {
            std::fs::write(&path, &json).into_diagnostic()?;
            let counts = format!(
                "{} companies, {} projects, {} users",
                bundle.companies.as_deref().map_or(0, |c| c.len()),
                bundle.projects.as_deref().map_or(0, |p| p.len()),
                bundle.users.as_deref().map_or(0, |u| u.len())
            );
            println!(
                "{} Exported {} to {}",
                style("✓").green(),
                counts,
                style(path.display()).cyan()
            );
        }
        None => println!("{}", json),
    }

    Ok(())
}

fn run_import(args: ImportArgs, global: &GlobalOpts) -> Result<()> {
    let repo = open_repo(global)?;
    let json = std::fs::read_to_string(&args.file).into_diagnostic()?;

    // Collections are overwritten key by key; a malformed bundle fails
    // before any write, but nothing guards against a crash between keys
    repo.import_all(&json).map_err(|e| miette!("{}", e))?;

    println!(
        "{} Imported {}",
        style("✓").green(),
        style(args.file.display()).cyan()
    );
    println!(
        "  {} companies, {} projects, {} users now stored",
        repo.companies().map_err(|e| miette!("{}", e))?.len(),
        repo.projects(None).map_err(|e| miette!("{}", e))?.len(),
        repo.users().map_err(|e| miette!("{}", e))?.len()
    );

    Ok(())
}

fn run_clear(args: ClearArgs, global: &GlobalOpts) -> Result<()> {
    let repo = open_repo(global)?;

    if !args.yes {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt("Remove ALL stored data from this workspace?")
            .default(false)
            .interact()
            .into_diagnostic()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    repo.clear_all().map_err(|e| miette!("{}", e))?;
    println!("{} Cleared all stored data", style("✓").green());

    Ok(())
}
