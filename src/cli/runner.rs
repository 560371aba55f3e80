//! CLI runner - executes commands

use crate::catalog::CatalogClient;
use crate::cataloger::{CatalogSummary, Cataloger};
use crate::cli::commands::{Cli, Commands};
use crate::config::AppConfig;
use crate::error::Result;
use crate::report::ReportGenerator;
use crate::source::PostgresExtractor;
use std::path::Path;
use tracing::{info, warn};

/// Default config path probed when no --config flag is given
const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let config = self.load_config()?;

        match self.cli.command.clone().unwrap_or(Commands::Run) {
            Commands::Run => self.run_all(&config).await,
            Commands::Check => self.check(&config).await,
            Commands::Catalog => {
                let summary = self.catalog(&config).await?;
                print_summary(&summary);
                Ok(())
            }
            Commands::Report => self.report(&config).await,
        }
    }

    /// Load configuration from the flag, the default path, or defaults
    fn load_config(&self) -> Result<AppConfig> {
        if let Some(path) = &self.cli.config {
            return AppConfig::from_file(path);
        }
        if Path::new(DEFAULT_CONFIG_PATH).exists() {
            return AppConfig::from_file(DEFAULT_CONFIG_PATH);
        }
        info!("No config file found, using defaults");
        Ok(AppConfig::default())
    }

    /// Verify both external systems are reachable
    async fn check(&self, config: &AppConfig) -> Result<()> {
        let client = CatalogClient::new(&config.catalog)?;
        let version = client.get_version().await?;
        println!(
            "Catalog reachable at {} (version: {})",
            config.catalog.url,
            version
                .get("Version")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("unknown")
        );

        let extractor = PostgresExtractor::connect(&config.source)?;
        extractor.check_connection()?;
        println!(
            "Source reachable: {}@{}:{}",
            config.source.database, config.source.host, config.source.port
        );

        Ok(())
    }

    /// Run the cataloging pass
    async fn catalog(&self, config: &AppConfig) -> Result<CatalogSummary> {
        let client = CatalogClient::new(&config.catalog)?;
        let extractor = PostgresExtractor::connect(&config.source)?;
        let cataloger = Cataloger::new(&client, &extractor, &config.source, &config.catalog.cluster);
        cataloger.catalog_all_tables().await
    }

    /// Generate the discovery report
    async fn report(&self, config: &AppConfig) -> Result<()> {
        let client = CatalogClient::new(&config.catalog)?;
        let files = ReportGenerator::new(&client)
            .generate_report(&self.cli.output)
            .await?;

        println!("Report written:");
        println!("  JSON:          {}", files.json.display());
        println!("  Tables:        {}", files.tables_csv.display());
        println!("  Relationships: {}", files.relationships_csv.display());
        Ok(())
    }

    /// Full pipeline: catalog, then report
    async fn run_all(&self, config: &AppConfig) -> Result<()> {
        let summary = self.catalog(config).await?;
        print_summary(&summary);
        self.report(config).await
    }
}

fn print_summary(summary: &CatalogSummary) {
    println!("Cataloging complete:");
    println!("  Tables created:        {}", summary.tables_created);
    println!("  Columns created:       {}", summary.columns_created);
    println!("  Relationships created: {}", summary.relationships_created);
    if summary.warnings.is_empty() {
        println!("  Warnings:              0");
    } else {
        warn!("{} warnings during cataloging", summary.warnings.len());
        println!("  Warnings:              {}", summary.warnings.len());
        for warning in &summary.warnings {
            println!("    - {warning}");
        }
    }
}
