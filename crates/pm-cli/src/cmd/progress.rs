use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use pm_core::WorkItemService;

#[derive(Subcommand)]
pub enum ProgressSubcommand {
    /// Set the progress percentage (0-100)
    Update {
        name: String,
        #[arg(allow_negative_numbers = true)]
        percent: i64,
    },
    /// Show progress metrics and a completion estimate
    Show { name: String },
}

pub fn run(service: &WorkItemService, subcmd: ProgressSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ProgressSubcommand::Update { name, percent } => update(service, &name, percent, json),
        ProgressSubcommand::Show { name } => show(service, &name, json),
    }
}

fn update(service: &WorkItemService, name: &str, percent: i64, json: bool) -> anyhow::Result<()> {
    let item = service
        .update_progress(name, percent)
        .context("failed to update progress")?;

    if json {
        print_json(&item)?;
    } else {
        println!("Updated '{name}' progress to: {}%", item.progress);
    }
    Ok(())
}

fn show(service: &WorkItemService, name: &str, json: bool) -> anyhow::Result<()> {
    let metrics = service
        .progress_metrics(name)
        .context("failed to get progress metrics")?;
    let prediction = metrics.predict_completion();

    if json {
        print_json(&serde_json::json!({
            "metrics": metrics,
            "prediction": prediction,
            "efficiency": metrics.phase_efficiency(),
        }))?;
        return Ok(());
    }

    print!("{}", metrics.report());
    println!();
    match prediction.at {
        Some(at) => println!(
            "Estimated completion: {} ({})",
            at.format("%Y-%m-%d %H:%M"),
            prediction.message
        ),
        None => println!("Estimated completion: {}", prediction.message),
    }
    Ok(())
}
