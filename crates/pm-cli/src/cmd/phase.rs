use crate::output::{print_advisory, print_json};
use anyhow::Context;
use clap::Subcommand;
use pm_core::{Phase, WorkItemService};

#[derive(Subcommand)]
pub enum PhaseSubcommand {
    /// Advance a work item to its next phase
    Advance { name: String },
    /// Set the phase directly, skipping task checks (admin override)
    Set { name: String, phase: String },
    /// Show the current phase's tasks
    Tasks { name: String },
    /// Mark a task of the current phase as completed
    Complete {
        name: String,
        /// Task id as shown by `pm phase tasks`
        task_id: usize,
    },
}

pub fn run(service: &WorkItemService, subcmd: PhaseSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        PhaseSubcommand::Advance { name } => advance(service, &name, json),
        PhaseSubcommand::Set { name, phase } => set(service, &name, &phase, json),
        PhaseSubcommand::Tasks { name } => tasks(service, &name, json),
        PhaseSubcommand::Complete { name, task_id } => complete(service, &name, task_id, json),
    }
}

fn advance(service: &WorkItemService, name: &str, json: bool) -> anyhow::Result<()> {
    let out = service
        .advance_phase(name)
        .context("failed to advance phase")?;

    if json {
        print_json(&out)?;
    } else {
        println!(
            "Advanced '{name}': {} -> {} ({} phase)",
            out.from, out.to.status, out.to.phase
        );
        print_advisory("assigned", &out.assignment);
        print_advisory("branch", &out.branch);
    }
    Ok(())
}

fn set(service: &WorkItemService, name: &str, phase: &str, json: bool) -> anyhow::Result<()> {
    let phase: Phase = phase.parse()?;
    let item = service
        .set_phase(name, phase)
        .context("failed to set phase")?;

    if json {
        print_json(&item)?;
    } else {
        println!("Set '{name}' phase to: {}", item.phase);
    }
    Ok(())
}

fn tasks(service: &WorkItemService, name: &str, json: bool) -> anyhow::Result<()> {
    let item = service.get(name).context("failed to get work item")?;
    let tasks = service
        .phase_tasks(name)
        .context("failed to get phase tasks")?;

    if json {
        print_json(&serde_json::json!({
            "name": name,
            "phase": item.phase,
            "tasks": tasks,
        }))?;
        return Ok(());
    }

    if tasks.is_empty() {
        println!("No tasks in {} phase for '{name}'.", item.phase);
        return Ok(());
    }
    println!("Tasks for '{name}' ({} phase):", item.phase);
    for (id, task) in tasks.iter().enumerate() {
        let mark = if task.completed { "x" } else { " " };
        println!("  {id}. [{mark}] {}", task.description);
    }
    Ok(())
}

fn complete(service: &WorkItemService, name: &str, task_id: usize, json: bool) -> anyhow::Result<()> {
    let out = service
        .complete_task(name, task_id)
        .context("failed to complete task")?;

    if json {
        print_json(&out)?;
    } else {
        println!("Completed task {task_id} for '{name}': {}", out.task.description);
        print_advisory("progress", &out.progress);
    }
    Ok(())
}
