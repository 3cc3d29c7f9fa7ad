//! Settings command implementation.

use crate::cli::{SettingsAction, SettingsArgs};
use crate::client::ApiClient;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use serde_json::{Map, Value};

/// Execute the settings command.
pub async fn execute_settings(
    args: SettingsArgs,
    client: &ApiClient,
    formatter: &Formatter,
) -> Result<()> {
    match args.action {
        SettingsAction::Get { key } => {
            let settings = client.get_settings(key.as_deref()).await?;
            println!("{}", formatter.format_settings(&settings)?);
        }
        SettingsAction::Set { assignment } => {
            let (key, value) = parse_assignment(&assignment)?;
            let mut settings = Map::new();
            settings.insert(key.clone(), value);
            let result = client.set_settings(settings).await?;
            println!("{}", formatter.success(&format!("{} ({})", result.message, key)));
        }
    }
    Ok(())
}

/// Split `key=value`. The value is taken as JSON when it parses, else as a string.
pub(crate) fn parse_assignment(assignment: &str) -> Result<(String, Value)> {
    let (key, raw) = assignment.split_once('=').ok_or_else(|| {
        CliError::InvalidInput(format!("Expected key=value, got '{}'", assignment))
    })?;

    let key = key.trim();
    if key.is_empty() {
        return Err(CliError::InvalidInput("Setting key must not be empty".to_string()));
    }

    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_string_value() {
        let (key, value) = parse_assignment("graph_db_type=neo4j").unwrap();
        assert_eq!(key, "graph_db_type");
        assert_eq!(value, json!("neo4j"));
    }

    #[test]
    fn test_json_values() {
        assert_eq!(parse_assignment("retries=3").unwrap().1, json!(3));
        assert_eq!(parse_assignment("enabled=true").unwrap().1, json!(true));
        assert_eq!(
            parse_assignment("hosts=[\"a\",\"b\"]").unwrap().1,
            json!(["a", "b"])
        );
    }

    #[test]
    fn test_value_may_contain_equals() {
        let (_, value) = parse_assignment("filter=a=b").unwrap();
        assert_eq!(value, json!("a=b"));
    }

    #[test]
    fn test_invalid_assignments() {
        assert!(parse_assignment("no-equals").is_err());
        assert!(parse_assignment("=value").is_err());
    }
}
