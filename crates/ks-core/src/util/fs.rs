//! Filesystem utilities.

use ks_types::{KsError, Result};
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::fs;

/// Expand a leading `~` to the home directory.
pub fn expand_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();

    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }

    path.to_path_buf()
}

/// Read entire file as string (slurp).
pub fn slurp(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            KsError::NotFound(format!("{:?}", path))
        } else {
            KsError::Io(e)
        }
    })
}

/// Write a file by writing a sibling temp file and renaming it into place,
/// so readers never observe a partial write.
pub fn write_atomic(path: impl AsRef<Path>, contents: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;

    let mut temp = tempfile::NamedTempFile::new_in(&parent)?;
    temp.write_all(contents)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| KsError::Io(e.error))?;
    Ok(())
}

/// SHA-256 of some bytes, hex encoded.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_atomic_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("components").join("params.libsonnet");
        write_atomic(&path, b"{}\n").unwrap();
        assert_eq!(slurp(&path).unwrap(), "{}\n");

        write_atomic(&path, b"{ global: {} }\n").unwrap();
        assert_eq!(slurp(&path).unwrap(), "{ global: {} }\n");
    }

    #[test]
    fn test_slurp_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        assert!(slurp(dir.path().join("nope")).unwrap_err().is_not_found());
    }

    #[test]
    fn test_content_hash_is_stable() {
        assert_eq!(content_hash(b"abc"), content_hash(b"abc"));
        assert_ne!(content_hash(b"abc"), content_hash(b"abd"));
        assert_eq!(content_hash(b"").len(), 64);
    }
}
