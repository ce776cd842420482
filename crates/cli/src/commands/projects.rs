// `flame projects`: list projects visible to the session.

use flame_client::{ApiClient, Transport};
use serde::{Deserialize, Serialize};

use crate::output::{self, OutputFormat};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectsResult {
    #[serde(default)]
    pub projects: Vec<String>,
}

pub async fn run<T: Transport>(client: &ApiClient<T>, format: OutputFormat) -> anyhow::Result<()> {
    let result = fetch(client).await?;
    output::print_output(format, &result, format_human)?;
    Ok(())
}

async fn fetch<T: Transport>(client: &ApiClient<T>) -> anyhow::Result<ProjectsResult> {
    let projects = client.project_list().await?;
    Ok(ProjectsResult { projects })
}

fn format_human(result: &ProjectsResult) -> String {
    if result.projects.is_empty() {
        return "No projects.".into();
    }

    let mut lines = Vec::with_capacity(result.projects.len() + 1);
    lines.push(format!("{} project(s)", result.projects.len()));
    for name in &result.projects {
        lines.push(format!("  {name}"));
    }
    lines.join("\n")
}
