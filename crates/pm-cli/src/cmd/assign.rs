use crate::output::print_json;
use anyhow::Context;
use pm_core::WorkItemService;

pub fn run(service: &WorkItemService, name: &str, assignee: &str, json: bool) -> anyhow::Result<()> {
    let item = service
        .assign(name, assignee)
        .with_context(|| format!("failed to assign '{name}'"))?;

    if json {
        print_json(&item)?;
    } else {
        println!("Assigned '{name}' to: {}", item.assigned_to);
    }
    Ok(())
}
