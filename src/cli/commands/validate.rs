//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating the
//! Folio configuration.

use crate::cli::commands::{EXIT_CONFIG, EXIT_SUCCESS};
use crate::config::{load, FolioConfig};
use clap::Args;
use std::path::Path;

/// Arguments for the validate-config command
#[derive(Args, Debug, Default)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: Option<&Path>) -> anyhow::Result<i32> {
        let source = config_path
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "environment".to_string());
        tracing::info!(source = %source, "Validating configuration");

        println!("Validating configuration from {source}");
        println!();

        // Loading also validates
        match load(config_path) {
            Ok(config) => {
                println!("Configuration is valid");
                println!();
                print_summary(&config);
                Ok(EXIT_SUCCESS)
            }
            Err(e) => {
                println!("Configuration is invalid");
                println!("   Error: {e}");
                Ok(EXIT_CONFIG)
            }
        }
    }
}

fn print_summary(config: &FolioConfig) {
    println!("Configuration Summary:");
    println!("  Log Level: {}", config.application.log_level);
    println!("  Listen Address: {}", config.server.bind_address());
    println!(
        "  Route Prefix: {}",
        if config.server.route_prefix.is_empty() {
            "/"
        } else {
            config.server.route_prefix.as_str()
        }
    );
    println!("  Database: {}", config.database.redacted_url());
    println!("  Max Connections: {}", config.database.max_connections);
    println!("  Row Limit: {}", config.export.row_limit);
    println!("  Fetch Batch Size: {}", config.export.fetch_batch_size);
    println!(
        "  Categories: {}",
        config
            .export
            .ordered_categories()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("  Link Style: {:?}", config.export.link_style);
    println!(
        "  File Logging: {}",
        if config.logging.local_enabled {
            config.logging.local_path.as_str()
        } else {
            "disabled"
        }
    );
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_valid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 9090").unwrap();

        let code = ValidateArgs::default()
            .execute(Some(file.path()))
            .await
            .unwrap();
        assert_eq!(code, EXIT_SUCCESS);
    }

    #[tokio::test]
    async fn test_invalid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[export]\nrow_limit = 0").unwrap();

        let code = ValidateArgs::default()
            .execute(Some(file.path()))
            .await
            .unwrap();
        assert_eq!(code, EXIT_CONFIG);
    }
}
