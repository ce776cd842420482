// `flame ls`: list a directory inside a project.

use clap::Args;
use flame_client::{ApiClient, DirectoryEntry, Transport};
use serde::{Deserialize, Serialize};

use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct LsArgs {
    /// Project name.
    pub project: String,

    /// Directory path inside the project.
    #[arg(default_value = "/")]
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LsResult {
    pub project: String,
    pub path: String,
    #[serde(default)]
    pub entries: Vec<DirectoryEntry>,
}

pub async fn run<T: Transport>(
    client: &ApiClient<T>,
    args: LsArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let result = fetch(client, args).await?;
    output::print_output(format, &result, format_human)?;
    Ok(())
}

async fn fetch<T: Transport>(client: &ApiClient<T>, args: LsArgs) -> anyhow::Result<LsResult> {
    let entries = client.directory_contents(&args.project, &args.path).await?;
    Ok(LsResult { project: args.project, path: args.path, entries })
}

fn format_human(result: &LsResult) -> String {
    if result.entries.is_empty() {
        return format!("{}:{} is empty.", result.project, result.path);
    }

    let dirs = result.entries.iter().filter(|entry| entry.is_dir()).count();
    let files = result.entries.len() - dirs;
    let mut lines = Vec::with_capacity(result.entries.len() + 1);
    lines.push(format!(
        "{}:{} ({dirs} dir(s), {files} file(s))",
        result.project, result.path
    ));
    for entry in &result.entries {
        lines.push(format!("  {}", entry.name));
    }
    lines.join("\n")
}
