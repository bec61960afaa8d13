//! Dump service
//!
//! Copies every regular file of the log directory into the dump directory:
//! - Flat, subdirectories and special files are skipped
//! - Existing files in the destination are overwritten
//! - Modification and access times are carried over where supported
//!
//! The copy stops at the first error. Files copied before it stay in the
//! destination.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};

/// Reasons a dump can be aborted
#[derive(Debug, Error)]
pub enum DumpError {
    /// Log directory missing or unreadable
    #[error("cannot read log directory {}: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Dump directory missing, read-only or full
    #[error("cannot write to dump directory {}: {source}", path.display())]
    DestinationUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A single file could not be copied
    #[error("failed to copy {}: {source}", file.display())]
    CopyFailure {
        file: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// What a successful dump did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DumpReport {
    /// File names copied, in directory order
    pub copied: Vec<String>,
    /// Entries that were not regular files
    pub skipped: usize,
}

/// Service trait for dumping logs
#[async_trait]
pub trait DumpService: Send + Sync {
    /// Directory the logs end up in
    fn destination(&self) -> &Path;

    /// Copies the current log files into the destination
    async fn dump(&self) -> Result<DumpReport, DumpError>;
}

/// Filesystem implementation of DumpService
pub struct FsDumpService {
    source: PathBuf,
    destination: PathBuf,
}

impl FsDumpService {
    /// Creates a new filesystem dump service
    ///
    /// # Arguments
    /// * `source` - Directory the logs are read from
    /// * `destination` - Directory the logs are copied into, must already exist
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }

    fn source_error(&self, source: io::Error) -> DumpError {
        DumpError::SourceUnavailable {
            path: self.source.clone(),
            source,
        }
    }

    /// Attributes a failed copy to the destination when it is gone or full
    async fn copy_error(&self, file: &Path, source: io::Error) -> DumpError {
        let destination_is_dir = fs::metadata(&self.destination)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);

        let destination_fault = matches!(
            source.kind(),
            io::ErrorKind::StorageFull | io::ErrorKind::ReadOnlyFilesystem
        );

        if !destination_is_dir || destination_fault {
            DumpError::DestinationUnavailable {
                path: self.destination.clone(),
                source,
            }
        } else {
            DumpError::CopyFailure {
                file: file.to_path_buf(),
                source,
            }
        }
    }

    async fn copy_file(&self, from: &Path, to: &Path) -> Result<(), DumpError> {
        if let Err(e) = fs::copy(from, to).await {
            return Err(self.copy_error(from, e).await);
        }

        copy_times(from.to_path_buf(), to.to_path_buf())
            .await
            .map_err(|source| DumpError::CopyFailure {
                file: from.to_path_buf(),
                source,
            })
    }
}

#[async_trait]
impl DumpService for FsDumpService {
    fn destination(&self) -> &Path {
        &self.destination
    }

    async fn dump(&self) -> Result<DumpReport, DumpError> {
        let mut entries = fs::read_dir(&self.source)
            .await
            .map_err(|e| self.source_error(e))?;

        let mut report = DumpReport::default();

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| self.source_error(e))?
        {
            let path = entry.path();

            // Symlinks are followed; anything that cannot be stat'ed is not a regular file
            let is_file = fs::metadata(&path)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false);

            if !is_file {
                debug!("Skipping {} (not a regular file)", path.display());
                report.skipped += 1;
                continue;
            }

            let target = self.destination.join(entry.file_name());
            self.copy_file(&path, &target).await?;

            debug!("Copied {} to {}", path.display(), target.display());
            report
                .copied
                .push(entry.file_name().to_string_lossy().into_owned());
        }

        info!(
            "Copied {} file(s) from {} to {} ({} skipped)",
            report.copied.len(),
            self.source.display(),
            self.destination.display(),
            report.skipped
        );

        Ok(report)
    }
}

/// Carries access and modification times from `from` over to `to`
async fn copy_times(from: PathBuf, to: PathBuf) -> io::Result<()> {
    let result = tokio::task::spawn_blocking(move || -> io::Result<()> {
        let metadata = std::fs::metadata(&from)?;
        let mut times = std::fs::FileTimes::new().set_modified(metadata.modified()?);
        if let Ok(accessed) = metadata.accessed() {
            times = times.set_accessed(accessed);
        }
        // Windows needs write access to set times; a read-only copy on Unix
        // only allows a read handle, which is enough for the owner there
        let file = match std::fs::File::options().write(true).open(&to) {
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => std::fs::File::open(&to)?,
            other => other?,
        };
        file.set_times(times)
    })
    .await
    .map_err(io::Error::other)?;

    match result {
        Err(e) if e.kind() == io::ErrorKind::Unsupported => Ok(()),
        other => other,
    }
}
