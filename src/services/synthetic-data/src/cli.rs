//! Command-line interface for the synthetic data generator
//!
//! # Usage
//!
//! ```bash
//! # Template generation
//! synthetic-data generate "I need 250 customer records"
//!
//! # Learn from a sample file and print JSON instead of writing CSV
//! synthetic-data generate "20 rows like my file" --sample sample.csv --format json
//!
//! # Inspect what a request or a file resolves to
//! synthetic-data interpret "sales over time"
//! synthetic-data analyze sample.csv
//!
//! # Run the HTTP service
//! synthetic-data serve --port 8080
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use crate::config::Config;
use crate::fakers;
use crate::ingest;
use crate::interpreter;
use crate::orchestrator::Orchestrator;
use crate::output;
use crate::schema::CustomSchema;
use crate::server;
use crate::types::GenerationRequest;

/// Synthetic tabular data generator
#[derive(Parser, Debug)]
#[command(name = "synthetic-data")]
#[command(about = "Generate synthetic tabular data from natural-language requests")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path (YAML or JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a dataset
    Generate {
        /// What to generate, e.g. "500 employee records"
        request: String,

        /// Explicit record count, appended to the request text
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
        records: Option<u32>,

        /// Custom schema file mapping field names to types
        #[arg(long)]
        schema: Option<PathBuf>,

        /// Sample CSV, Excel or JSON file to learn column patterns from
        #[arg(long)]
        sample: Option<PathBuf>,

        /// Directory for the generated CSV (overrides config)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Random seed for reproducible results
        #[arg(long)]
        seed: Option<u64>,

        /// Write a CSV artifact or print JSON records
        #[arg(short, long, value_enum, default_value = "csv")]
        format: OutputFormat,
    },

    /// Show how a request is interpreted
    Interpret {
        request: String,
    },

    /// Show the patterns learned from a sample file
    Analyze {
        file: PathBuf,
    },

    /// Run the HTTP service
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
}

/// Main CLI runner
pub struct CliRunner {
    config: Config,
}

impl CliRunner {
    /// Loads configuration and initializes logging
    pub fn new(args: &Cli) -> Result<Self> {
        let config = match &args.config {
            Some(path) => Config::load_file(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
            None => Config::from_env().context("Failed to read configuration from environment")?,
        };
        config.validate().context("Invalid configuration")?;

        let log_level = if args.verbose {
            "debug"
        } else {
            config.log_level.as_str()
        };
        Self::init_logging(log_level)?;

        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn init_logging(log_level: &str) -> Result<()> {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                    format!(
                        "synthetic_data={},synthetic_data_service={},tower_http=debug",
                        log_level, log_level
                    )
                    .into()
                }),
            )
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .context("Failed to initialize logging")?;

        Ok(())
    }

    /// Execute CLI command
    pub async fn run(&self, args: &Cli) -> Result<()> {
        match &args.command {
            Commands::Generate {
                request,
                records,
                schema,
                sample,
                output_dir,
                seed,
                format,
            } => self.run_generate(
                request,
                *records,
                schema.as_deref(),
                sample.as_deref(),
                output_dir.as_deref(),
                *seed,
                *format,
            ),
            Commands::Interpret { request } => {
                let plan = interpreter::interpret(request);
                println!("{}", serde_json::to_string_pretty(&plan)?);
                Ok(())
            }
            Commands::Analyze { file } => {
                let summary = ingest::analyze_path(file)
                    .with_context(|| format!("Failed to analyze {}", file.display()))?;
                println!("{}", serde_json::to_string_pretty(&summary)?);
                Ok(())
            }
            Commands::Serve { host, port } => {
                let mut config = self.config.clone();
                if let Some(host) = host {
                    config.host = host.clone();
                }
                if let Some(port) = port {
                    config.port = *port;
                }
                config.validate().context("Invalid server configuration")?;
                server::serve(config).await.context("Server failed")
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn run_generate(
        &self,
        request: &str,
        records: Option<u32>,
        schema_path: Option<&Path>,
        sample_path: Option<&Path>,
        output_dir: Option<&Path>,
        seed: Option<u64>,
        format: OutputFormat,
    ) -> Result<()> {
        let mut generation_request = GenerationRequest::new(request);
        if let Some(count) = records {
            generation_request = generation_request.with_count(count);
        }
        let text = generation_request.effective_text();

        let plan = interpreter::interpret(&text);
        if plan.record_count > self.config.max_records {
            bail!(
                "Requested {} records; the maximum is {} (raise MAX_RECORDS to allow more)",
                plan.record_count,
                self.config.max_records
            );
        }

        let custom_schema = match schema_path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read schema {}", path.display()))?;
                Some(CustomSchema::from_json(&content).context("Invalid custom schema")?)
            }
            None => None,
        };

        let pattern_summary = match sample_path {
            Some(path) => Some(
                ingest::analyze_path(path)
                    .with_context(|| format!("Failed to analyze sample {}", path.display()))?,
            ),
            None => None,
        };

        let seed = seed.or(self.config.seed);
        if seed.is_none() {
            warn!("No seed configured; output will not be reproducible");
        }
        let mut rng = fakers::seeded_rng(seed);

        let dataset = Orchestrator::new().generate(
            &text,
            custom_schema.as_ref(),
            pattern_summary.as_ref(),
            &mut rng,
        )?;
        info!(
            "Generated {} records using strategy {}",
            dataset.len(),
            dataset.strategy
        );

        match format {
            OutputFormat::Csv => {
                let dir = output_dir.unwrap_or(self.config.output_dir.as_path());
                let path = dir.join(output::artifact_file_name(dataset.len(), Uuid::new_v4()));
                output::write_csv(&dataset.records, &path)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("{}", path.display());
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&dataset.records)?);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate() {
        let cli = Cli::try_parse_from([
            "synthetic-data",
            "-v",
            "generate",
            "customer data",
            "--records",
            "25",
            "--seed",
            "7",
            "--format",
            "json",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Generate {
                request,
                records,
                seed,
                format,
                ..
            } => {
                assert_eq!(request, "customer data");
                assert_eq!(records, Some(25));
                assert_eq!(seed, Some(7));
                assert_eq!(format, OutputFormat::Json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_zero_records_rejected() {
        assert!(Cli::try_parse_from(["synthetic-data", "generate", "x", "--records", "0"]).is_err());
    }

    #[test]
    fn test_parse_serve_with_global_config() {
        let cli = Cli::try_parse_from([
            "synthetic-data",
            "serve",
            "--port",
            "9090",
            "--config",
            "settings.yaml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("settings.yaml")));
        assert!(matches!(cli.command, Commands::Serve { port: Some(9090), .. }));
    }
}
