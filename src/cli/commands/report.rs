//! `atelier report` command - denormalized project reports
//!
//! Renders a project's full nested shape into a spreadsheet-friendly CSV
//! with one section per sheet (info, team, milestones, tasks, inspections,
//! invoices, costs). Formatting lives entirely here; the data layer only
//! supplies the nested project.

use clap::{Args, Subcommand};
use console::style;
use miette::{miette, IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::helpers::{open_repo, resolve_entity, user_name};
use crate::cli::GlobalOpts;
use crate::entities::{Company, Project, User};

#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    /// Multi-section CSV report for one project
    Project(ProjectReportArgs),
}

#[derive(Args, Debug)]
pub struct ProjectReportArgs {
    /// Project ID or fuzzy name query
    pub id: String,

    /// Output file (default: stdout)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn run(cmd: ReportCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ReportCommands::Project(args) => run_project(args, global),
    }
}

fn run_project(args: ProjectReportArgs, global: &GlobalOpts) -> Result<()> {
    let repo = open_repo(global)?;
    let projects = repo.projects(None).map_err(|e| miette!("{}", e))?;
    let project = resolve_entity(&projects, &args.id, "project")?;
    let users = repo.users().map_err(|e| miette!("{}", e))?;
    let companies = repo.companies().map_err(|e| miette!("{}", e))?;

    let csv = render(project, &users, &companies).into_diagnostic()?;

    match args.output {
        Some(path) => {
            std::fs::write(&path, &csv).into_diagnostic()?;
            println!(
                "{} Wrote report for {} to {}",
                style("✓").green(),
                style(&project.name).yellow(),
                style(path.display()).cyan()
            );
        }
        None => print!("{}", csv),
    }

    Ok(())
}

fn render(project: &Project, users: &[User], companies: &[Company]) -> csv::Result<String> {
    let mut w = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());

    let date = |d: Option<chrono::NaiveDate>| d.map_or(String::new(), |d| d.to_string());
    let company_name = companies
        .iter()
        .find(|c| c.id == project.company_id)
        .map_or("unknown company".to_string(), |c| c.name.clone());

    // Project Info
    w.write_record(["Project Info"])?;
    w.write_record(["Name", &project.name])?;
    w.write_record(["Company", &company_name])?;
    w.write_record(["Type", &project.project_type.to_string()])?;
    w.write_record(["Status", &project.status.to_string()])?;
    w.write_record(["Priority", &project.priority.to_string()])?;
    w.write_record(["Start", &date(project.start_date)])?;
    w.write_record(["End", &date(project.end_date)])?;
    w.write_record(["Total fee", &format!("{:.2}", project.total_fee)])?;
    w.write_record(None::<&[u8]>)?;

    // Team
    w.write_record(["Team"])?;
    w.write_record(["Member", "Role", "Allocation", "Hourly rate", "Active"])?;
    for m in &project.team {
        let user = users.iter().find(|u| u.id == m.user_id);
        let rate = m.effective_hourly_rate(user.and_then(|u| u.hourly_rate));
        w.write_record([
            user_name(users, Some(&m.user_id)),
            m.role.clone(),
            format!("{}%", m.allocation),
            rate.map_or(String::new(), |r| format!("{:.2}", r)),
            m.is_active.to_string(),
        ])?;
    }
    w.write_record(None::<&[u8]>)?;

    // Milestones
    w.write_record(["Milestones"])?;
    w.write_record(["Order", "Name", "Status", "Start", "End", "Completion"])?;
    let mut milestones: Vec<_> = project.milestones.iter().collect();
    milestones.sort_by_key(|m| m.order);
    for m in &milestones {
        w.write_record([
            m.order.to_string(),
            m.name.clone(),
            m.status.to_string(),
            date(m.start_date),
            date(m.end_date),
            format!("{}%", m.completion_percentage),
        ])?;
    }
    w.write_record(None::<&[u8]>)?;

    // Tasks
    w.write_record(["Tasks"])?;
    w.write_record(["Milestone", "Title", "Assignee", "Status", "Due"])?;
    for m in &milestones {
        for t in &m.tasks {
            w.write_record([
                m.name.clone(),
                t.title.clone(),
                user_name(users, t.assigned_to.as_ref()),
                t.status.to_string(),
                date(t.due_date),
            ])?;
        }
    }
    w.write_record(None::<&[u8]>)?;

    // Inspections (both homes)
    w.write_record(["Inspections"])?;
    w.write_record(["Title", "Date", "Status", "Compliance", "Inspector"])?;
    for i in project.all_inspections() {
        w.write_record([
            i.title.clone(),
            i.inspection_date.to_string(),
            i.status.to_string(),
            i.compliance.to_string(),
            user_name(users, i.inspector_id.as_ref()),
        ])?;
    }
    w.write_record(None::<&[u8]>)?;

    // Invoices
    w.write_record(["Invoices"])?;
    w.write_record(["Number", "Type", "Amount", "Status", "Issued", "Due"])?;
    for i in &project.invoices {
        w.write_record([
            i.invoice_number.clone(),
            i.invoice_type.to_string(),
            format!("{:.2}", i.amount),
            i.status.to_string(),
            i.issue_date.to_string(),
            i.due_date.to_string(),
        ])?;
    }
    w.write_record(None::<&[u8]>)?;

    // Costs: monthly run rate per assignment, using rate overrides
    w.write_record(["Costs"])?;
    w.write_record(["Member", "Allocation", "Monthly cost"])?;
    let mut total = 0.0;
    for m in &project.team {
        let user = users.iter().find(|u| u.id == m.user_id);
        let monthly = m
            .monthly_cost
            .or_else(|| user.and_then(|u| u.monthly_cost))
            .unwrap_or(0.0)
            * (m.allocation as f64 / 100.0);
        total += monthly;
        w.write_record([
            user_name(users, Some(&m.user_id)),
            format!("{}%", m.allocation),
            format!("{:.2}", monthly),
        ])?;
    }
    w.write_record(["Total", "", &format!("{:.2}", total)])?;

    let bytes = w.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::{EntityId, EntityPrefix};
    use crate::entities::{NewCompany, NewProject, NewUser, ProjectTeamMember, ProjectType, Role};

    #[test]
    fn test_render_contains_all_sections() {
        let company = Company::new(NewCompany::new("Acme"));
        let mut project = Project::new(NewProject::new(
            "Riverside Tower",
            company.id.clone(),
            ProjectType::Pmc,
        ));
        let mut user = User::new(NewUser::new("Alice", "alice@acme.com", Role::Architect));
        user.monthly_cost = Some(8_000.0);
        project.team.push(ProjectTeamMember::new(
            user.id.clone(),
            project.id.clone(),
            "Architect",
            50,
        ));

        let csv = render(&project, &[user], &[company]).unwrap();

        for section in [
            "Project Info",
            "Team",
            "Milestones",
            "Tasks",
            "Inspections",
            "Invoices",
            "Costs",
        ] {
            assert!(csv.contains(section), "missing section {}", section);
        }
        assert!(csv.contains("Riverside Tower"));
        assert!(csv.contains("Acme"));
        assert!(csv.contains("Alice"));
        // 50% of 8000
        assert!(csv.contains("4000.00"));
    }

    #[test]
    fn test_render_tolerates_dangling_references() {
        let mut project = Project::new(NewProject::new(
            "Orphan",
            EntityId::new(EntityPrefix::Co),
            ProjectType::Pmc,
        ));
        project.team.push(ProjectTeamMember::new(
            EntityId::new(EntityPrefix::Usr),
            project.id.clone(),
            "Ghost",
            100,
        ));

        let csv = render(&project, &[], &[]).unwrap();
        assert!(csv.contains("unknown company"));
        assert!(csv.contains("unknown user"));
    }
}
