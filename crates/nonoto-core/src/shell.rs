//! Desktop shell file helpers
//!
//! Generated files are written below a `NONOTO_generations` folder inside a
//! named OS directory, so they can be dragged out of the application.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Folder created under the chosen OS directory
pub const GENERATIONS_DIR: &str = "NONOTO_generations";

/// Named OS directories usable for storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageDirectory {
    Documents,
    Temp,
}

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("Failed to create directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl StorageDirectory {
    fn base(&self) -> PathBuf {
        match self {
            Self::Documents => dirs::document_dir()
                .or_else(dirs::home_dir)
                .unwrap_or_else(std::env::temp_dir),
            Self::Temp => std::env::temp_dir(),
        }
    }
}

/// Resolve a storage path for a generated file
pub fn storage_path(file_name: &str, directory: StorageDirectory) -> PathBuf {
    directory.base().join(GENERATIONS_DIR).join(file_name)
}

/// Write a buffer to a file, creating parent directories first
pub fn save_file(path: &Path, contents: &[u8]) -> Result<(), ShellError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ShellError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, contents).map_err(|source| ShellError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("Shell: Saved {} bytes to {:?}", contents.len(), path);
    Ok(())
}

/// A request to drag a file out of the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragRequest {
    pub file: PathBuf,
    pub icon: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_path_layout() {
        let path = storage_path("generation.mid", StorageDirectory::Temp);
        assert!(path.starts_with(std::env::temp_dir()));
        assert!(path.ends_with(Path::new(GENERATIONS_DIR).join("generation.mid")));
    }

    #[test]
    fn test_save_file_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("out.mid");
        save_file(&path, b"MThd").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"MThd");
    }
}
