use crate::cli::app::ResultsArgs;
use anyhow::{Context, Result};
use discopop_runner_core::ResultManager;
use serde_json::json;

pub async fn execute(args: ResultsArgs) -> Result<()> {
    let results = ResultManager::new(&args.dot);
    print_results(&results, args.json)
}

pub fn print_results(results: &ResultManager, as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", render_json(results)?);
    } else {
        print!("{}", render_text(results));
    }
    Ok(())
}

fn render_json(results: &ResultManager) -> Result<String> {
    let errors: serde_json::Map<String, serde_json::Value> = results
        .errors()
        .into_iter()
        .map(|(artifact, error)| (artifact.to_string(), error.into()))
        .collect();
    let document = json!({
        "suggestions": results.suggestions(),
        "hotspots": results.hotspots(),
        "errors": errors,
    });
    serde_json::to_string_pretty(&document).context("Failed to serialize results")
}

fn render_text(results: &ResultManager) -> String {
    let mut out = String::new();

    if results.valid_suggestions() {
        let count: usize = results.suggestions().values().map(Vec::len).sum();
        out.push_str(&format!("Suggestions ({count}):\n"));
        for (kind, suggestions) in results.suggestions() {
            out.push_str(&format!("  {kind}:\n"));
            for s in suggestions {
                let mut flags = Vec::new();
                if !s.applicable {
                    flags.push("not applicable");
                }
                if s.applied {
                    flags.push("applied");
                }
                let flags =
                    if flags.is_empty() { String::new() } else { format!(" ({})", flags.join(", ")) };
                out.push_str(&format!(
                    "    #{} {}:{}-{}{}\n",
                    s.pattern_id,
                    s.file_path.display(),
                    s.mapped_start_line,
                    s.mapped_end_line,
                    flags
                ));
            }
        }
    }

    if results.valid_hotspots() {
        let count: usize = results.hotspots().values().map(Vec::len).sum();
        out.push_str(&format!("Hotspots ({count}):\n"));
        for (hotness, hotspots) in results.hotspots() {
            out.push_str(&format!("  {hotness:?}:\n"));
            for h in hotspots {
                out.push_str(&format!(
                    "    {}:{} avg {:.3}\n",
                    h.file_path.display(),
                    h.start_line,
                    h.average_runtime
                ));
            }
        }
    }

    for (artifact, error) in results.errors() {
        out.push_str(&format!("{artifact}: {error}\n"));
    }
    out
}
