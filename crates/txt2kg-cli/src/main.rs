//! txt2kg CLI - Command-line client for the txt2kg server.

use clap::Parser;
use txt2kg_cli::commands;
use txt2kg_cli::{ApiClient, Cli, Command, Config, Formatter};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> txt2kg_cli::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load().unwrap_or_default(),
    };

    let format = cli.format.map(Into::into).unwrap_or(config.format);
    let color_enabled = !cli.no_color && config.color;
    let formatter = Formatter::new(format, color_enabled);

    let server = cli.server.as_deref().unwrap_or(&config.server_url);
    let client = ApiClient::new(server);

    match cli.command {
        Command::Extract(args) => commands::execute_extract(args, &client, &formatter).await?,
        Command::Import(args) => commands::execute_import(args, &client, &formatter).await?,
        Command::Graph(args) => commands::execute_graph(args, &client, &formatter).await?,
        Command::Triples(args) => commands::execute_triples(args, &client, &formatter).await?,
        Command::Clear(args) => commands::execute_clear(args, &client, &formatter).await?,
        Command::Search(args) => commands::execute_search(args, &client, &formatter).await?,
        Command::Settings(args) => commands::execute_settings(args, &client, &formatter).await?,
        Command::Health => commands::execute_health(&client, &formatter).await?,
    }

    Ok(())
}
