//! Clear command implementation.

use crate::cli::ClearArgs;
use crate::client::ApiClient;
use crate::error::Result;
use crate::output::Formatter;
use std::io::{self, Write};

/// Execute the clear command.
pub async fn execute_clear(
    args: ClearArgs,
    client: &ApiClient,
    formatter: &Formatter,
) -> Result<()> {
    // Confirm deletion unless --yes is specified
    if !args.yes {
        let target = args.db_type.as_deref().unwrap_or("the configured");
        println!("About to delete ALL nodes and relationships in {} database.", target);
        print!("Continue? [y/N] ");
        io::stdout().flush()?;

        let mut response = String::new();
        io::stdin().read_line(&mut response)?;

        if !confirmed(&response) {
            println!("{}", formatter.info("Operation cancelled"));
            return Ok(());
        }
    }

    let result = client.clear(args.db_type.as_deref()).await?;
    println!("{}", formatter.success(&result.message));
    Ok(())
}

fn confirmed(response: &str) -> bool {
    let answer = response.trim();
    answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}
