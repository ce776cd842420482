// `flame cat`: print a file from a project.

use clap::Args;
use flame_client::{ApiClient, FileContents, Transport};
use serde::{Deserialize, Serialize};

use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct CatArgs {
    /// Project name.
    pub project: String,

    /// File path inside the project.
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatResult {
    pub project: String,
    pub path: String,
    /// `{ binary, data }` with base64 data for binary files.
    pub contents: FileContents,
}

pub async fn run<T: Transport>(
    client: &ApiClient<T>,
    args: CatArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let result = fetch(client, args).await?;
    output::print_output(format, &result, format_human)?;
    Ok(())
}

async fn fetch<T: Transport>(client: &ApiClient<T>, args: CatArgs) -> anyhow::Result<CatResult> {
    let contents = client.file_contents(&args.project, &args.path).await?;
    Ok(CatResult { project: args.project, path: args.path, contents })
}

fn format_human(result: &CatResult) -> String {
    match &result.contents {
        FileContents::Text(text) => text.trim_end_matches('\n').to_string(),
        FileContents::Binary(bytes) => format!(
            "{}:{} is a binary file ({} bytes). Use --json to get base64 data.",
            result.project,
            result.path,
            bytes.len()
        ),
    }
}
