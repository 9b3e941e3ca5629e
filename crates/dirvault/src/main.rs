use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Parser;

use dirvault_core::{display_chain, Orchestrator};

mod config;
use crate::config::Config;

const DEFAULT_CONFIG_FILE: &str = "./dirvault.yml";

/// Zip every subdirectory of the input root and upload each archive to S3.
#[derive(Parser)]
struct Cli {
    #[arg(short, long)]
    config_file: Option<PathBuf>,

    /// Directory whose immediate subdirectories are archived.
    #[arg(short, long)]
    input_root: Option<PathBuf>,

    #[arg(short, long, env = "i8i_OUTPUT_S3_BUCKET")]
    bucket: Option<String>,

    /// Prepended verbatim to every object key.
    #[arg(short, long, env = "i8i_OUTPUT_S3_PREFIX")]
    prefix: Option<String>,

    #[arg(short, long, env = "REGION")]
    region: Option<String>,

    /// Part size in bytes, at least 5 MiB.
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Where archives are staged before upload; defaults to the system temp dir.
    #[arg(long)]
    scratch_dir: Option<PathBuf>,
}

impl Cli {
    fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config_file {
            Some(path) => Config::from_file(path)?,
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Config::from_file(&default)?
                } else {
                    Config::default()
                }
            }
        };

        if let Some(input_root) = &self.input_root {
            config.input_root = input_root.clone();
        }
        if let Some(bucket) = &self.bucket {
            config.bucket = Some(bucket.clone());
        }
        if let Some(prefix) = &self.prefix {
            config.prefix = prefix.clone();
        }
        if let Some(region) = &self.region {
            config.objects.set_region(region.clone());
        }
        if let Some(chunk_size) = self.chunk_size {
            config.chunk_size = chunk_size;
        }
        if let Some(scratch_dir) = &self.scratch_dir {
            config.scratch_dir = Some(scratch_dir.clone());
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(true)
        .compact()
        .init();

    // load configuration
    let config = cli.load_config()?;
    let batch = config.batch_config()?;
    tracing::info!(
        root = %batch.input_root.display(),
        bucket = %batch.bucket,
        prefix = %batch.prefix,
        chunk_size = batch.chunk_size,
        "loaded configuration"
    );

    // initialize object store
    let objects = config.objects.new_objects().await?;

    let orchestrator = Orchestrator::new(batch, objects)?;
    let report = orchestrator.run().await?;

    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(locator) => println!(
                "Directory {} successfully zipped and uploaded to: {locator}",
                outcome.directory
            ),
            Err(e) => println!(
                "Directory {} upload failed: {}",
                outcome.directory,
                display_chain(e)
            ),
        }
    }

    if !report.is_success() {
        return Err(anyhow!(
            "{} of {} directories failed to upload",
            report.failures(),
            report.outcomes.len()
        ));
    }

    Ok(())
}
