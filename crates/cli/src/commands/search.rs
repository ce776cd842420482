// `flame search`: search across projects.

use clap::Args;
use flame_client::{ApiClient, SearchResult, Transport};
use serde::{Deserialize, Serialize};

use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Search query.
    pub query: String,

    /// Maximum number of results.
    #[arg(long, default_value_t = 20)]
    pub limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutput {
    pub query: String,
    pub total_matches: usize,
    #[serde(flatten)]
    pub result: SearchResult,
}

pub async fn run<T: Transport>(
    client: &ApiClient<T>,
    args: SearchArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let found = fetch(client, args).await?;
    output::print_output(format, &found, format_human)?;
    Ok(())
}

async fn fetch<T: Transport>(
    client: &ApiClient<T>,
    args: SearchArgs,
) -> anyhow::Result<SearchOutput> {
    let result = client.search(&args.query, args.limit).await?;
    tracing::debug!(items = result.items.len(), "search finished");
    Ok(SearchOutput { query: args.query, total_matches: result.total_matches(), result })
}

fn format_human(output: &SearchOutput) -> String {
    if output.result.items.is_empty() {
        return format!("No results for \"{}\".", output.query);
    }

    let mut lines = Vec::new();
    lines.push(format!(
        "{} match(es) in {} file(s) for \"{}\"",
        output.total_matches,
        output.result.items.len(),
        output.query
    ));
    for item in &output.result.items {
        for hit in &item.matches {
            lines.push(format!("  {}:{}: {}", item.path, hit.line, hit.text));
        }
    }
    lines.join("\n")
}
