use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, warn};

use super::{ArtifactHandle, ArtifactStore};
use crate::error::Log2TxtError;
use crate::pipeline::sanitize::is_plain_name;

/// Prefix of in-flight write files. They are invisible to [`FsStore::list`].
const PARTIAL_PREFIX: &str = ".log2txt-partial-";

/// Plain name outside the in-flight write namespace.
fn is_artifact_name(name: &str) -> bool {
    is_plain_name(name) && !name.starts_with(PARTIAL_PREFIX)
}

/// Artifact store over one flat directory.
///
/// # Path security
/// `root` is canonicalised once in [`FsStore::open`]. Artifact names are
/// plain file names, joined directly onto the root; symlinks inside the root
/// are never followed, so no artifact access can leave the directory.
///
/// # Atomic replace
/// Writes go to a hidden temporary file in the same directory which is then
/// renamed over the target. Readers holding the old file keep reading the
/// old content; new readers see the complete new content.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Open (creating if needed) the directory at `root`.
    ///
    /// # Errors
    /// [`Log2TxtError::Io`] if the directory cannot be created, is not a
    /// directory, or cannot be canonicalised.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, Log2TxtError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|e| Log2TxtError::io(format!("create '{}'", root.display()), e))?;

        let meta = fs::metadata(&root)
            .await
            .map_err(|e| Log2TxtError::io(format!("access '{}'", root.display()), e))?;
        if !meta.is_dir() {
            return Err(Log2TxtError::io(
                format!("open '{}'", root.display()),
                io::Error::new(io::ErrorKind::Other, "not a directory"),
            ));
        }

        let root = fs::canonicalize(&root)
            .await
            .map_err(|e| Log2TxtError::io(format!("canonicalize '{}'", root.display()), e))?;
        debug!("Opened artifact directory {}", root.display());
        Ok(Self { root })
    }

    /// Canonical root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of `name` if it names a regular file in the root.
    async fn existing_file(&self, name: &str) -> Result<PathBuf, Log2TxtError> {
        if !is_artifact_name(name) {
            return Err(Log2TxtError::not_found(name));
        }
        let path = self.root.join(name);
        match fs::symlink_metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            Ok(_) => Err(Log2TxtError::not_found(name)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(Log2TxtError::not_found(name)),
            Err(e) => Err(Log2TxtError::io(format!("stat '{name}'"), e)),
        }
    }
}

#[async_trait]
impl ArtifactStore for FsStore {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    async fn list(&self) -> Result<Vec<String>, Log2TxtError> {
        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(|e| Log2TxtError::io("list artifacts", e))?;

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Log2TxtError::io("list artifacts", e))?
        {
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| Log2TxtError::io("list artifacts", e))?;
            if !file_type.is_file() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name.starts_with(PARTIAL_PREFIX) {
                continue;
            }
            names.push(name);
        }
        names.sort();
        Ok(names)
    }

    async fn read(&self, name: &str) -> Result<Vec<u8>, Log2TxtError> {
        let path = self.existing_file(name).await?;
        fs::read(&path).await.map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Log2TxtError::not_found(name),
            _ => Log2TxtError::io(format!("read '{name}'"), e),
        })
    }

    async fn open(&self, name: &str) -> Result<ArtifactHandle, Log2TxtError> {
        let path = self.existing_file(name).await?;
        let file = fs::File::open(&path).await.map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Log2TxtError::not_found(name),
            _ => Log2TxtError::io(format!("open '{name}'"), e),
        })?;
        let len = file
            .metadata()
            .await
            .map_err(|e| Log2TxtError::io(format!("stat '{name}'"), e))?
            .len();
        Ok(ArtifactHandle {
            name: name.to_string(),
            len,
            reader: Box::new(file),
        })
    }

    async fn write(&self, name: &str, content: &[u8]) -> Result<(), Log2TxtError> {
        if !is_artifact_name(name) {
            return Err(Log2TxtError::Validation(format!(
                "invalid artifact name '{name}'"
            )));
        }
        let root = self.root.clone();
        let target = self.root.join(name);
        let content = content.to_vec();
        let context = format!("write '{name}'");

        tokio::task::spawn_blocking(move || -> io::Result<()> {
            let mut tmp = tempfile::Builder::new()
                .prefix(PARTIAL_PREFIX)
                .tempfile_in(&root)?;
            tmp.write_all(&content)?;
            tmp.as_file().sync_data()?;
            tmp.persist(&target).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| Log2TxtError::Internal(format!("write task panicked: {e}")))?
        .map_err(|e| Log2TxtError::io(context, e))
    }

    async fn remove(&self, name: &str) -> Result<bool, Log2TxtError> {
        if !is_plain_name(name) {
            return Ok(false);
        }
        match fs::remove_file(self.root.join(name)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Log2TxtError::io(format!("delete '{name}'"), e)),
        }
    }

    async fn is_available(&self) -> bool {
        matches!(fs::metadata(&self.root).await, Ok(meta) if meta.is_dir())
    }

    /// Delete partial files left by interrupted writes. A write still in
    /// flight loses its temporary file and fails with `Io`.
    async fn remove_leftovers(&self) -> Result<usize, Log2TxtError> {
        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(|e| Log2TxtError::io("list partial files", e))?;

        let mut removed = 0;
        let mut first_failure = None;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Log2TxtError::io("list partial files", e))?
        {
            let is_partial = entry
                .file_name()
                .to_str()
                .is_some_and(|n| n.starts_with(PARTIAL_PREFIX));
            if !is_partial {
                continue;
            }
            match fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!("Failed to delete {}: {}", entry.path().display(), e);
                    first_failure.get_or_insert(e);
                }
            }
        }

        match first_failure {
            Some(e) => Err(Log2TxtError::io("delete partial files", e)),
            None => Ok(removed),
        }
    }
}
