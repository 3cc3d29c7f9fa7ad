//! Import command implementation.

use crate::cli::ImportArgs;
use crate::client::ApiClient;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use txt2kg_domain::Triple;

#[derive(Deserialize)]
#[serde(untagged)]
enum TripleFile {
    List(Vec<Triple>),
    Wrapped { triples: Vec<Triple> },
}

/// Execute the import command.
pub async fn execute_import(
    args: ImportArgs,
    client: &ApiClient,
    formatter: &Formatter,
) -> Result<()> {
    let triples = read_triples(&args.file)?;
    if triples.is_empty() {
        return Err(CliError::InvalidInput(format!(
            "{} contains no triples",
            args.file.display()
        )));
    }

    let skipped = triples.iter().filter(|t| !t.is_valid()).count();
    if skipped > 0 {
        println!(
            "{}",
            formatter.warning(&format!(
                "{} triple(s) with an empty field will be skipped by the server",
                skipped
            ))
        );
    }

    let document = document_name(&args.file);
    let result = client
        .store_triples(&triples, document.as_deref(), args.db_type.as_deref())
        .await?;
    println!("{}", formatter.success(&result.message));
    Ok(())
}

/// Read a JSON file holding either a triple array or `{"triples": [...]}`.
pub(crate) fn read_triples(path: &Path) -> Result<Vec<Triple>> {
    let content = fs::read_to_string(path)?;
    let parsed: TripleFile = serde_json::from_str(&content).map_err(|e| {
        CliError::InvalidInput(format!(
            "{} is not a triple array or an object with a triples array: {}",
            path.display(),
            e
        ))
    })?;
    Ok(match parsed {
        TripleFile::List(triples) | TripleFile::Wrapped { triples } => triples,
    })
}

pub(crate) fn document_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}
