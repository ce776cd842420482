// CLI subcommand dispatch.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Subcommand};
use flame_client::config::TimeoutConfig;
use flame_client::{ApiClient, ClientConfig, Transport};

use crate::output::{self, OutputFormat};

pub mod cat;
pub mod login;
pub mod ls;
pub mod projects;
pub mod search;

/// Flags shared by every subcommand.
#[derive(Debug, Default, Args)]
pub struct GlobalArgs {
    /// Service endpoint (`http(s)://…`, `unix:///path.sock`, or `fixture`).
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Config file to read instead of `~/.flame/config.toml`.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Deadline for every operation in milliseconds (0 disables).
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Serve built-in sample data instead of contacting a service.
    #[arg(long, global = true, conflicts_with = "endpoint")]
    pub fixture: bool,

    /// Force JSON output.
    #[arg(long, global = true)]
    pub json: bool,
}

impl GlobalArgs {
    /// Config file values with command-line overrides applied.
    pub fn resolve_config(&self) -> anyhow::Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::load_from(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => ClientConfig::load(),
        };

        if self.fixture {
            config.endpoint = "fixture".into();
        } else if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if let Some(ms) = self.timeout_ms {
            config.timeouts = TimeoutConfig::uniform(ms);
        }
        Ok(config)
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show whether the current session is logged in
    Login,
    /// List projects
    Projects,
    /// List a directory inside a project
    Ls(ls::LsArgs),
    /// Print a file from a project
    Cat(cat::CatArgs),
    /// Search across projects
    Search(search::SearchArgs),
}

pub fn run(global: GlobalArgs, command: Command) -> anyhow::Result<()> {
    let format = OutputFormat::detect(global.json);
    let result = execute(&global, command, format);
    if let Err(error) = &result {
        output::print_anyhow_error(format, error);
    }
    result
}

fn execute(global: &GlobalArgs, command: Command, format: OutputFormat) -> anyhow::Result<()> {
    let config = global.resolve_config()?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(async {
        let client = ApiClient::from_config(&config)?;
        dispatch(&client, command, format).await
    })
}

async fn dispatch<T: Transport>(
    client: &ApiClient<T>,
    command: Command,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match command {
        Command::Login => login::run(client, format).await,
        Command::Projects => projects::run(client, format).await,
        Command::Ls(args) => ls::run(client, args, format).await,
        Command::Cat(args) => cat::run(client, args, format).await,
        Command::Search(args) => search::run(client, args, format).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use flame_client::transport::fixture::FixtureTransport;
    use tempfile::TempDir;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        global: GlobalArgs,
        #[command(subcommand)]
        command: Command,
    }

    fn parse(args: &[&str]) -> TestCli {
        TestCli::try_parse_from(std::iter::once("flame").chain(args.iter().copied()))
            .expect("arguments should parse")
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = parse(&["search", "readme", "--json", "--timeout-ms", "250"]);
        assert!(cli.global.json);
        assert_eq!(cli.global.timeout_ms, Some(250));
        assert!(matches!(cli.command, Command::Search(_)));
    }

    #[test]
    fn fixture_conflicts_with_endpoint() {
        let parsed = TestCli::try_parse_from([
            "flame",
            "--fixture",
            "--endpoint",
            "http://localhost:1/rpc",
            "projects",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn overrides_replace_config_file_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            "endpoint = \"http://files.example:9000/rpc\"\n[timeouts]\ndefault_ms = 9000\nsearch_ms = 100\n",
        )
        .unwrap();

        let global = GlobalArgs {
            config: Some(path.clone()),
            endpoint: Some("unix:///tmp/flame.sock".into()),
            timeout_ms: Some(1500),
            ..GlobalArgs::default()
        };
        let config = global.resolve_config().unwrap();
        assert_eq!(config.endpoint, "unix:///tmp/flame.sock");
        assert_eq!(config.timeouts, TimeoutConfig::uniform(1500));

        let untouched = GlobalArgs { config: Some(path), ..GlobalArgs::default() };
        let config = untouched.resolve_config().unwrap();
        assert_eq!(config.endpoint, "http://files.example:9000/rpc");
        assert_eq!(config.timeouts.search_ms, Some(100));
    }

    #[test]
    fn fixture_flag_selects_fixture_endpoint() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "endpoint = \"http://files.example:9000/rpc\"\n").unwrap();

        let global = GlobalArgs { config: Some(path), fixture: true, ..GlobalArgs::default() };
        assert_eq!(global.resolve_config().unwrap().endpoint, "fixture");
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let global =
            GlobalArgs { config: Some(tmp.path().join("absent.toml")), ..GlobalArgs::default() };
        let error = global.resolve_config().unwrap_err();
        assert!(format!("{error:#}").contains("failed to load config"));
    }

    #[tokio::test]
    async fn dispatch_runs_against_fixture() {
        let client = ApiClient::new(FixtureTransport::with_defaults());
        dispatch(&client, Command::Projects, OutputFormat::Json).await.unwrap();
        assert_eq!(client.manager().transport().call_count("project.getList"), 1);
    }
}
