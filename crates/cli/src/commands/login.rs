// `flame login`: report whether the session is logged in.

use flame_client::{ApiClient, Transport};
use serde::{Deserialize, Serialize};

use crate::output::{self, OutputFormat};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginStatus {
    pub logged_in: bool,
}

pub async fn run<T: Transport>(client: &ApiClient<T>, format: OutputFormat) -> anyhow::Result<()> {
    let status = fetch(client).await?;
    output::print_output(format, &status, format_human)?;
    Ok(())
}

async fn fetch<T: Transport>(client: &ApiClient<T>) -> anyhow::Result<LoginStatus> {
    let logged_in = client.check_login().await?;
    tracing::debug!(logged_in, "checked login");
    Ok(LoginStatus { logged_in })
}

fn format_human(status: &LoginStatus) -> String {
    if status.logged_in {
        "Logged in.".into()
    } else {
        "Not logged in.".into()
    }
}
