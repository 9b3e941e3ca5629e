use std::path::{Path, PathBuf};
use std::sync::Arc;

use dirvault_objectstore::{Key, Locator, ObjectStore, MIN_PART_SIZE};

use super::archive::Archive;
use super::chunks::ChunkReader;
use super::errors::{display_chain, Error, Result, TransferError};
use super::transfer::{Destination, MultipartTransfer};

/// Everything one batch run needs to know, resolved up front by the caller.
#[derive(Clone, Debug)]
pub struct BatchConfig {
    /// Every immediate subdirectory of this directory is archived and uploaded.
    pub input_root: PathBuf,
    pub bucket: String,
    /// Prepended verbatim to every destination key.
    pub prefix: String,
    pub chunk_size: usize,
    pub scratch_dir: Option<PathBuf>,
}

/// Result of archiving and uploading a single directory.
#[derive(Debug)]
pub struct Outcome {
    pub directory: String,
    pub result: Result<Locator>,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<Outcome>,
}

impl BatchReport {
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }

    pub fn is_success(&self) -> bool {
        self.failures() == 0
    }
}

/// Archives and uploads each source directory in turn.
///
/// Directories are processed one at a time; a failed directory is recorded in the
/// [`BatchReport`] and the batch moves on to the next one.
pub struct Orchestrator {
    config: BatchConfig,
    transfer: MultipartTransfer,
}

impl Orchestrator {
    pub fn new(config: BatchConfig, objects: Arc<dyn ObjectStore>) -> Result<Self> {
        if config.chunk_size < MIN_PART_SIZE {
            return Err(Error::InvalidChunkSize(config.chunk_size));
        }
        Ok(Self {
            config,
            transfer: MultipartTransfer::new(objects),
        })
    }

    /// Lists the immediate subdirectories of the input root, sorted by name.
    ///
    /// Symlinks to directories count as directories. Entries that cannot be stat'ed, such as
    /// dangling symlinks, are skipped with a warning. Names that are not valid unicode are
    /// converted lossily for display and key derivation.
    pub async fn discover(&self) -> Result<Vec<(String, PathBuf)>> {
        let root = &self.config.input_root;
        if !tokio::fs::metadata(root).await?.is_dir() {
            return Err(Error::InputRootNotADirectory(root.clone()));
        }

        let mut directories = Vec::new();
        let mut entries = tokio::fs::read_dir(root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            match tokio::fs::metadata(&path).await {
                Ok(metadata) if metadata.is_dir() => {
                    let name = entry.file_name().to_string_lossy().into_owned();
                    directories.push((name, path));
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(entry = %path.display(), error = %e, "skipping unreadable entry");
                }
            }
        }
        directories.sort();
        Ok(directories)
    }

    /// `{prefix}{folder}-outputs-{timestamp}.zip`
    pub fn destination_key(&self, folder: &str, timestamp: i64) -> Result<Key> {
        let key = format!("{}{folder}-outputs-{timestamp}.zip", self.config.prefix);
        Ok(Key::try_from(key)?)
    }

    pub fn destination(&self, key: Key) -> Destination {
        Destination {
            bucket: self.config.bucket.clone(),
            key,
        }
    }

    /// Archives `directory` into a scratch file and transfers it to `destination`.
    ///
    /// The scratch file is removed before this returns, whether or not the transfer succeeded.
    pub async fn archive_and_transfer(
        &self,
        directory: &Path,
        destination: &Destination,
    ) -> Result<Locator> {
        let archive = Archive::create(directory, self.config.scratch_dir.as_deref())
            .await
            .map_err(TransferError::StreamRead)?;
        tracing::info!(
            directory = %directory.display(),
            entries = archive.entries().len(),
            bytes = archive.size(),
            "archived directory"
        );

        let reader = archive.open().map_err(TransferError::StreamRead)?;
        let chunks = ChunkReader::new(reader, self.config.chunk_size).into_stream();
        let locator = self.transfer.transfer(chunks, destination).await?;
        Ok(locator)
    }

    pub async fn run(&self) -> Result<BatchReport> {
        let directories = self.discover().await?;
        tracing::info!(
            root = %self.config.input_root.display(),
            count = directories.len(),
            "discovered directories"
        );

        let mut report = BatchReport::default();
        for (name, path) in directories {
            let timestamp = chrono::Utc::now().timestamp();
            let result = match self.destination_key(&name, timestamp) {
                Ok(key) => {
                    let destination = self.destination(key);
                    self.archive_and_transfer(&path, &destination).await
                }
                Err(e) => Err(e),
            };

            match &result {
                Ok(locator) => tracing::info!(directory = %name, %locator, "uploaded directory"),
                Err(e) => tracing::error!(
                    directory = %name,
                    error = %display_chain(e),
                    "failed to upload directory"
                ),
            }
            report.outcomes.push(Outcome {
                directory: name,
                result,
            });
        }
        Ok(report)
    }
}
