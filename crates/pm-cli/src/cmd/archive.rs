use crate::output::{print_advisory, print_json};
use anyhow::Context;
use pm_core::WorkItemService;

pub fn run(service: &WorkItemService, name: &str, json: bool) -> anyhow::Result<()> {
    let out = service
        .archive(name)
        .with_context(|| format!("failed to archive '{name}'"))?;

    if json {
        print_json(&out)?;
    } else {
        println!("Archived '{name}' to {}", out.path.display());
        print_advisory("postmortem", &out.postmortem);
    }
    Ok(())
}
