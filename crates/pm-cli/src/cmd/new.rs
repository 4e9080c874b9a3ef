use crate::output::{print_advisory, print_json};
use anyhow::Context;
use clap::Subcommand;
use pm_core::{ItemType, WorkItemService};

#[derive(Subcommand)]
pub enum NewSubcommand {
    /// Create a new feature
    Feature { name: String },
    /// Create a new bug report
    Bug { name: String },
    /// Create a new experiment
    Experiment { name: String },
}

pub fn run(service: &WorkItemService, subcmd: NewSubcommand, json: bool) -> anyhow::Result<()> {
    let (item_type, name) = match subcmd {
        NewSubcommand::Feature { name } => (ItemType::Feature, name),
        NewSubcommand::Bug { name } => (ItemType::Bug, name),
        NewSubcommand::Experiment { name } => (ItemType::Experiment, name),
    };

    let out = service
        .create(item_type, &name)
        .with_context(|| format!("failed to create {item_type} '{name}'"))?;

    if json {
        print_json(&out)?;
    } else {
        println!("Created {item_type}: {}", out.item.name);
        println!("  path: {}", out.item.path.display());
        print_advisory("branch", &out.branch);
    }
    Ok(())
}
