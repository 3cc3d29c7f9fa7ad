//! Health command implementation.

use crate::client::ApiClient;
use crate::config::OutputFormat;
use crate::error::Result;
use crate::output::Formatter;

/// Execute the health command.
pub async fn execute_health(client: &ApiClient, formatter: &Formatter) -> Result<()> {
    let body = client.health().await?;

    match formatter.format() {
        OutputFormat::Json => println!("{}", formatter.format_json(&body)?),
        OutputFormat::Quiet => println!("ok"),
        OutputFormat::Table => println!(
            "{}",
            formatter.success(&format!("Server at {} is healthy", client.base_url()))
        ),
    }
    Ok(())
}
