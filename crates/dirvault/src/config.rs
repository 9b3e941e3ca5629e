use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use serde::Deserialize;

use dirvault_core::BatchConfig;
use dirvault_objectstore::DEFAULT_PART_SIZE;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_input_root")]
    pub input_root: PathBuf,
    pub bucket: Option<String>,
    #[serde(default)]
    pub prefix: String,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    pub scratch_dir: Option<PathBuf>,
    #[serde(default)]
    pub objects: dirvault_objectstore::Config,
}

fn default_input_root() -> PathBuf {
    PathBuf::from("/input")
}

fn default_chunk_size() -> usize {
    DEFAULT_PART_SIZE
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_root: default_input_root(),
            bucket: None,
            prefix: String::new(),
            chunk_size: default_chunk_size(),
            scratch_dir: None,
            objects: Default::default(),
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Config> {
        let mut f = File::open(path)?;
        let mut s = String::new();
        f.read_to_string(&mut s)?;
        Ok(serde_yaml::from_str(&s)?)
    }

    pub fn batch_config(&self) -> Result<BatchConfig> {
        let bucket = match &self.bucket {
            Some(b) if !b.is_empty() => b.clone(),
            _ => bail!("no destination bucket configured"),
        };
        Ok(BatchConfig {
            input_root: self.input_root.clone(),
            bucket,
            prefix: self.prefix.clone(),
            chunk_size: self.chunk_size,
            scratch_dir: self.scratch_dir.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_config() {
        let config: Config = serde_yaml::from_str(
            r#"
input_root: /srv/outputs
bucket: results
prefix: nightly/
chunk_size: 10485760
scratch_dir: /var/tmp
objects:
  type: S3
  region: eu-central-1
  hostname: minio.internal:9000
  access_key: minio
  secret_key: minio123
  force_path_style: true
"#,
        )
        .unwrap();

        let batch = config.batch_config().unwrap();
        assert_eq!(batch.input_root, PathBuf::from("/srv/outputs"));
        assert_eq!(batch.bucket, "results");
        assert_eq!(batch.prefix, "nightly/");
        assert_eq!(batch.chunk_size, 10 * 1024 * 1024);
        assert_eq!(batch.scratch_dir, Some(PathBuf::from("/var/tmp")));
    }

    #[test]
    fn defaults() {
        let config: Config = serde_yaml::from_str("bucket: results").unwrap();
        assert_eq!(config.input_root, PathBuf::from("/input"));
        assert_eq!(config.prefix, "");
        assert_eq!(config.chunk_size, DEFAULT_PART_SIZE);
        assert!(config.scratch_dir.is_none());
    }

    #[test]
    fn missing_bucket_is_an_error() {
        assert!(Config::default().batch_config().is_err());

        let config = Config {
            bucket: Some(String::new()),
            ..Default::default()
        };
        assert!(config.batch_config().is_err());
    }
}
