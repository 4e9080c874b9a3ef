use crate::output::print_json;
use pm_core::templates;
use pm_core::Config;

pub fn run(config: &Config, json: bool) -> anyhow::Result<()> {
    let text = templates::instructions(&config.backlog_path(), &config.completed_path());
    if json {
        print_json(&serde_json::json!({ "instructions": text }))?;
    } else {
        print!("{text}");
    }
    Ok(())
}
