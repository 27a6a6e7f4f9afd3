use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failure to acquire an on-disk asset. Callers substitute a fallback.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("unable to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("{path} is empty")]
    Empty { path: PathBuf },
}

impl AssetError {
    pub fn path(&self) -> &Path {
        match self {
            AssetError::Io { path, .. }
            | AssetError::Decode { path, .. }
            | AssetError::Empty { path } => path,
        }
    }
}

/// Reads an asset into memory, treating zero-length files as missing.
pub fn read_asset(path: impl AsRef<Path>) -> Result<Vec<u8>, AssetError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if bytes.is_empty() {
        return Err(AssetError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_reports_path() {
        let err = read_asset("does/not/exist.jpg").unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
        assert_eq!(err.path(), Path::new("does/not/exist.jpg"));
    }

    #[test]
    fn empty_file_is_an_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(matches!(read_asset(file.path()), Err(AssetError::Empty { .. })));
    }

    #[test]
    fn reads_contents() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"clip").unwrap();
        assert_eq!(read_asset(file.path()).unwrap(), b"clip");
    }
}
