use anyhow::Result;
use discopop_runner_core::process::command_exists;
use discopop_runner_core::{RunnerConfig, ToolSuite};
use tracing::warn;

/// Report which tools resolve and what the config provider knows
pub async fn execute(config: RunnerConfig) -> Result<()> {
    let tools = ToolSuite::new(".", &config);

    let mut missing = 0;
    for (name, available) in tools.availability() {
        if !available {
            missing += 1;
        }
        println!("{} {}", if available { "✓" } else { "✗" }, name);
    }
    let make = config.build.make_command.split_whitespace().next().unwrap_or("make");
    let make_available = command_exists(make, false, "")?;
    println!("{} {}", if make_available { "✓" } else { "✗" }, make);
    println!("{} cmake", if command_exists("cmake", false, "")? { "✓" } else { "✗" });

    let provider = tools.config_provider();
    match provider.version().await {
        Ok(version) => println!("DiscoPoP version: {version}"),
        Err(e) => warn!("Cannot query the DiscoPoP version: {}", e),
    }
    if let Ok(build) = provider.build_directory().await {
        println!("DiscoPoP build directory: {}", build.display());
    }

    if missing > 0 {
        println!("{missing} DiscoPoP tool(s) missing");
    }
    Ok(())
}
