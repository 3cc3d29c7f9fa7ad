//! Search command implementation.

use crate::cli::SearchArgs;
use crate::client::ApiClient;
use crate::error::{CliError, Result};
use crate::output::Formatter;

/// Execute the search command.
pub async fn execute_search(
    args: SearchArgs,
    client: &ApiClient,
    formatter: &Formatter,
) -> Result<()> {
    if args.query.trim().is_empty() {
        return Err(CliError::InvalidInput("Query must not be empty".to_string()));
    }
    if args.top_k == Some(0) {
        return Err(CliError::InvalidInput(
            "top-k must be at least 1".to_string(),
        ));
    }

    let hits = client.search(&args.query, args.top_k).await?;
    println!("{}", formatter.format_hits(&hits)?);
    Ok(())
}
