use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use ragstow_core::bootstrap::{build_driver, resolve_config_path};
use ragstow_core::config::Config;
use ragstow_core::vault::EnvVaultProvider;

/// Load PDF documents from a directory, embed them and store them in a Pinecone index.
#[derive(Debug, Parser)]
#[command(name = "ragstow", version, about)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory to load documents from.
    #[arg(long)]
    data: Option<String>,

    /// Target index name.
    #[arg(long)]
    index: Option<String>,

    /// Namespace to upsert into.
    #[arg(long)]
    namespace: Option<String>,

    /// Descend into subdirectories.
    #[arg(long)]
    recursive: bool,
}

impl Cli {
    fn apply(self, config: &mut Config) {
        if let Some(data) = self.data {
            config.documents.path = data;
        }
        if let Some(index) = self.index {
            config.index.name = index;
        }
        if let Some(namespace) = self.namespace {
            config.index.namespace = namespace;
        }
        if self.recursive {
            config.documents.recursive = true;
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_subscriber();

    let mut cli = Cli::parse();
    let config_path = resolve_config_path(cli.config.take());
    let mut config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    cli.apply(&mut config);
    tracing::info!(
        config = %config_path.display(),
        data = %config.documents.path,
        index = %config.index.name,
        namespace = %config.index.namespace,
        "starting ingestion"
    );
    config
        .resolve_secrets(&EnvVaultProvider)
        .await
        .context("failed to resolve secrets")?;

    let mut driver = build_driver(config)?;
    let report = driver.run().await?;

    println!(
        "Documents successfully stored in Pinecone index: {}",
        report.index
    );
    println!(
        "  documents: {}, chunks: {}, upserted: {} (namespace: {}{})",
        report.documents,
        report.chunks,
        report.upserted,
        report.namespace,
        if report.index_created {
            ", index created"
        } else {
            ""
        }
    );
    Ok(())
}

fn init_subscriber() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
