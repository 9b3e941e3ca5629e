//! Zip archives of directory trees, staged in a scratch file.

use std::io::{Error, ErrorKind, Result};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// A deflate-compressed zip of a directory tree.
///
/// The archive lives in a scratch file that is removed when the `Archive` is dropped, whichever
/// way the transfer that uses it ends.
#[derive(Debug)]
pub struct Archive {
    scratch: NamedTempFile,
    entries: Vec<String>,
    size: u64,
}

impl Archive {
    /// Archives every regular file below `directory`, named by its `/`-separated path relative
    /// to `directory`.
    ///
    /// Traversal is sorted by file name so the same tree always produces the same entry order.
    /// Any traversal or read error fails the whole archive rather than leaving entries out. The
    /// scratch file is created in `scratch_dir`, or the system temp dir when `None`.
    pub async fn create(directory: &Path, scratch_dir: Option<&Path>) -> Result<Archive> {
        let directory = directory.to_path_buf();
        let scratch_dir = scratch_dir.map(Path::to_path_buf);
        tokio::task::spawn_blocking(move || write_archive(&directory, scratch_dir.as_deref()))
            .await
            .map_err(|e| Error::new(ErrorKind::Other, e.to_string()))?
    }

    /// Opens a fresh reader positioned at the start of the archive.
    pub fn open(&self) -> Result<tokio::fs::File> {
        Ok(tokio::fs::File::from_std(self.scratch.reopen()?))
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Size of the archive in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn path(&self) -> &Path {
        self.scratch.path()
    }
}

fn write_archive(directory: &Path, scratch_dir: Option<&Path>) -> Result<Archive> {
    if !std::fs::metadata(directory)?.is_dir() {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            format!("not a directory: {}", directory.display()),
        ));
    }

    let mut builder = tempfile::Builder::new();
    builder.prefix("dirvault-").suffix(".zip");
    let scratch = match scratch_dir {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?,
    };

    let mut zip = ZipWriter::new(scratch.as_file());
    let mut entries = Vec::new();

    for entry in WalkDir::new(directory).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_dir() {
            continue;
        }
        // follows symlinks, so links to files are archived with the target's contents
        let metadata = std::fs::metadata(entry.path())?;
        if !metadata.is_file() {
            continue;
        }

        let name = entry_name(directory, entry.path())?;
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .large_file(metadata.len() >= u32::MAX as u64);
        zip.start_file(name.as_str(), options)?;
        let mut file = std::fs::File::open(entry.path())?;
        std::io::copy(&mut file, &mut zip)?;

        tracing::trace!(entry = %name, bytes = metadata.len(), "archived file");
        entries.push(name);
    }
    zip.finish()?;
    drop(zip);

    let size = scratch.as_file().metadata()?.len();
    tracing::debug!(
        directory = %directory.display(),
        scratch = %scratch.path().display(),
        entries = entries.len(),
        bytes = size,
        "created archive"
    );

    Ok(Archive {
        scratch,
        entries,
        size,
    })
}

fn entry_name(root: &Path, path: &Path) -> Result<String> {
    let relative: PathBuf = path
        .strip_prefix(root)
        .map_err(|e| Error::new(ErrorKind::Other, e))?
        .to_path_buf();
    let segments: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(segments.join("/"))
}
