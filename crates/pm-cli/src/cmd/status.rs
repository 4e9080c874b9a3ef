use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use pm_core::{ItemStatus, WorkItemService};

#[derive(Subcommand)]
pub enum StatusSubcommand {
    /// Override a work item's status (proposed, discovery, planning,
    /// execution, cleanup, review, completed)
    Update { name: String, status: String },
    /// Show work item details
    Show { name: String },
}

pub fn run(service: &WorkItemService, subcmd: StatusSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        StatusSubcommand::Update { name, status } => update(service, &name, &status, json),
        StatusSubcommand::Show { name } => show(service, &name, json),
    }
}

fn update(service: &WorkItemService, name: &str, status: &str, json: bool) -> anyhow::Result<()> {
    let status: ItemStatus = status.parse()?;
    let item = service
        .update_status(name, &status)
        .context("failed to update status")?;

    if json {
        print_json(&item)?;
    } else {
        println!("Updated '{name}' status to: {}", item.status);
    }
    Ok(())
}

fn show(service: &WorkItemService, name: &str, json: bool) -> anyhow::Result<()> {
    let item = service
        .get(name)
        .context("failed to get work item")?;

    if json {
        print_json(&item)?;
        return Ok(());
    }

    println!("Work Item: {}", item.name);
    if let Some(title) = &item.title {
        println!("Title:     {title}");
    }
    if let Some(item_type) = item.item_type {
        println!("Type:      {item_type}");
    }
    println!("Status:    {}", item.status);
    println!("Phase:     {}", item.phase);
    println!("Progress:  {}%", item.progress);
    if !item.assigned_to.is_empty() {
        println!("Assigned:  {}", item.assigned_to);
    }
    println!("Path:      {}", item.path.display());
    if let Some(at) = item.updated_at {
        println!("Updated:   {}", at.format("%Y-%m-%d %H:%M"));
    }

    let counts = item.phase_task_counts(item.phase);
    if counts.total > 0 {
        println!(
            "Tasks:     {}/{} done in {} phase",
            counts.completed, counts.total, item.phase
        );
    }
    Ok(())
}
