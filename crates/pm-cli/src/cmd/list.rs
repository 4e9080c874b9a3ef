use crate::output::{print_json, print_table};
use anyhow::Context;
use chrono::Utc;
use clap::{Args, Subcommand};
use pm_core::{ItemStatus, ItemType, ListFilter, WorkItem, WorkItemService};
use serde::Serialize;

#[derive(Args)]
pub struct ListArgs {
    /// Only show items of this type (feature, bug, experiment)
    #[arg(long = "type", short = 't')]
    item_type: Option<String>,
}

#[derive(Subcommand)]
pub enum ListSubcommand {
    /// List proposed work items
    Proposed(ListArgs),
    /// List work items that are in progress
    Active(ListArgs),
    /// List completed work items that have not been archived
    Completed(ListArgs),
    /// List every work item
    All(ListArgs),
}

#[derive(Serialize)]
struct Row<'a> {
    #[serde(flatten)]
    item: &'a WorkItem,
    stale: bool,
}

pub fn run(service: &WorkItemService, subcmd: ListSubcommand, json: bool) -> anyhow::Result<()> {
    let (label, statuses, args) = match subcmd {
        ListSubcommand::Proposed(args) => ("proposed", vec![ItemStatus::Proposed], args),
        ListSubcommand::Active(args) => ("active", ItemStatus::active().to_vec(), args),
        ListSubcommand::Completed(args) => ("completed", vec![ItemStatus::Completed], args),
        ListSubcommand::All(args) => ("", Vec::new(), args),
    };

    let item_type = args
        .item_type
        .as_deref()
        .map(str::parse::<ItemType>)
        .transpose()?;
    let filter = ListFilter {
        statuses,
        item_type,
    };

    let items = service
        .list(&filter)
        .context("failed to list work items")?;

    let now = Utc::now();
    let timeout = service.config().phase_timeout_days;
    let rows: Vec<Row<'_>> = items
        .iter()
        .map(|item| Row {
            item,
            stale: item.is_stale(now, timeout),
        })
        .collect();

    if json {
        print_json(&rows)?;
        return Ok(());
    }

    if rows.is_empty() {
        match label {
            "" => println!("No work items found."),
            _ => println!("No {label} work items found."),
        }
        return Ok(());
    }

    let table: Vec<[String; 7]> = rows
        .iter()
        .map(|r| {
            [
                r.item.name.clone(),
                r.item.display_title().to_string(),
                r.item.status.to_string(),
                r.item.phase.to_string(),
                format!("{}%", r.item.progress),
                r.item.assigned_to.clone(),
                if r.stale { "yes".into() } else { String::new() },
            ]
        })
        .collect();
    print_table(
        ["NAME", "TITLE", "STATUS", "PHASE", "PROGRESS", "ASSIGNED", "STALE"],
        &table,
    );
    Ok(())
}
