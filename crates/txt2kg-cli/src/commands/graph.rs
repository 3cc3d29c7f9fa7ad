//! Graph and triples command implementations.

use crate::cli::DbArgs;
use crate::client::ApiClient;
use crate::config::OutputFormat;
use crate::error::Result;
use crate::output::Formatter;

/// Execute the graph command.
pub async fn execute_graph(args: DbArgs, client: &ApiClient, formatter: &Formatter) -> Result<()> {
    let graph = client.graph(args.db_type.as_deref()).await?;
    println!("{}", formatter.format_graph(&graph)?);
    Ok(())
}

/// Execute the triples command.
pub async fn execute_triples(
    args: DbArgs,
    client: &ApiClient,
    formatter: &Formatter,
) -> Result<()> {
    let stored = client.triples(args.db_type.as_deref()).await?;
    println!("{}", formatter.format_triples(&stored.triples)?);

    if formatter.format() == OutputFormat::Table && !stored.triples.is_empty() {
        println!(
            "{}",
            formatter.info(&format!(
                "{} triple(s) in {}",
                stored.triples.len(),
                stored.database_type
            ))
        );
    }
    Ok(())
}
