//! Extract command implementation.

use super::import::document_name;
use crate::cli::ExtractArgs;
use crate::client::{ApiClient, ExtractOptions};
use crate::config::OutputFormat;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use std::fs;

/// Execute the extract command.
pub async fn execute_extract(
    args: ExtractArgs,
    client: &ApiClient,
    formatter: &Formatter,
) -> Result<()> {
    let text = fs::read_to_string(&args.file)?;
    if text.trim().is_empty() {
        return Err(CliError::InvalidInput(format!(
            "{} is empty",
            args.file.display()
        )));
    }

    let options = ExtractOptions {
        llm_provider: args.provider,
        chunk_size: args.chunk_size,
        overlap_size: args.overlap,
        ..Default::default()
    }
    .with_model(args.model);

    let extraction = client.extract(&text, &options).await?;
    println!("{}", formatter.format_triples(&extraction.triples)?);

    if formatter.format() == OutputFormat::Table {
        println!(
            "{}",
            formatter.info(&format!(
                "Extracted {} triple(s) from {} chunk(s) with {} ({})",
                extraction.triples.len(),
                extraction.chunk_count,
                extraction.llm_provider,
                extraction.model
            ))
        );
    }

    if args.import {
        if extraction.triples.is_empty() {
            eprintln!("{}", formatter.warning("Nothing to import"));
            return Ok(());
        }
        let document = document_name(&args.file);
        let result = client
            .store_triples(
                &extraction.triples,
                document.as_deref(),
                args.db_type.as_deref(),
            )
            .await?;
        eprintln!("{}", formatter.success(&result.message));
    }

    Ok(())
}
