use crate::output::print_json;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const GIT_SHA: Option<&str> = option_env!("PM_GIT_SHA");

pub fn run(json: bool) -> anyhow::Result<()> {
    let commit = GIT_SHA.unwrap_or("unknown");
    let platform = format!("{}/{}", std::env::consts::OS, std::env::consts::ARCH);

    if json {
        print_json(&serde_json::json!({
            "version": VERSION,
            "commit": commit,
            "platform": platform,
        }))?;
    } else {
        println!("pm {VERSION}");
        println!("commit:   {commit}");
        println!("platform: {platform}");
    }
    Ok(())
}
