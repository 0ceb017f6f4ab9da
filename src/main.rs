use clap::Parser;

use astradb_manager::cli::{Cli, Commands};
use astradb_manager::commands::{
    handle_bundle_config, handle_config, handle_delete, handle_describe_table,
    handle_describe_type, handle_entries, handle_list, handle_save, handle_schema, handle_test,
};
use astradb_manager::{Config, DatabaseManager, Result};

/// Log filter from ASTRADB_LOG, then RUST_LOG, defaulting to warnings only.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("ASTRADB_LOG")
        .or_else(|_| tracing_subscriber::EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Config file settings with command-line overrides applied.
fn effective_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load()?;
    if let Some(dir) = &cli.config.data_dir {
        config.set_default("data_dir", &dir.to_string_lossy())?;
    }
    if let Some(ms) = cli.config.timeout_ms {
        config.set_default("probe_timeout_ms", &ms.to_string())?;
    }
    Ok(config)
}

async fn run(cli: Cli) -> Result<bool> {
    let config = effective_config(&cli)?;
    let json = cli.config.json;

    // Config commands don't need a manager
    if let Commands::Config { command } = &cli.command {
        return handle_config(&config, command);
    }

    let manager = DatabaseManager::from_config(&config);
    tracing::debug!(root = %manager.layout().root().display(), "using storage root");

    match &cli.command {
        Commands::Save {
            bundle,
            credentials,
            name,
        } => handle_save(&manager, name.as_deref(), bundle, credentials, json).await,
        Commands::Test {
            bundle,
            credentials,
        } => handle_test(&manager, bundle, credentials, json).await,
        Commands::Entries { bundle } => handle_entries(&manager, bundle, json).await,
        Commands::BundleConfig { bundle } => handle_bundle_config(&manager, bundle, json).await,
        Commands::List => handle_list(&manager, json).await,
        Commands::Delete { slug } => handle_delete(&manager, slug, json).await,
        Commands::Schema { slug, filter } => {
            handle_schema(&manager, slug, filter.as_deref(), json).await
        }
        Commands::DescribeTable { slug, table } => {
            handle_describe_table(&manager, slug, table, json).await
        }
        Commands::DescribeType { slug, type_name } => {
            handle_describe_type(&manager, slug, type_name, json).await
        }
        Commands::Config { .. } => Ok(true),
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
