//! Language model probes
//!
//! The local model is only inspected (existence, header, size), never
//! loaded. Remote providers are probed in [`remote`].

pub mod remote;

pub use remote::*;

use crate::error::Result;
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

const GGUF_MAGIC: &[u8; 4] = b"GGUF";

/// Check whether the local model weights exist
pub fn local_model_exists(path: &Path) -> bool {
    path.is_file()
}

/// Weight file format recognized from the header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ModelFormat {
    Gguf { version: u32 },
    Unknown,
}

impl fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelFormat::Gguf { version } => write!(f, "GGUF v{}", version),
            ModelFormat::Unknown => write!(f, "unrecognized format"),
        }
    }
}

/// What we know about the local model file
#[derive(Debug, Clone, Serialize)]
pub struct LocalModelInfo {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub format: ModelFormat,
}

impl LocalModelInfo {
    /// Read the file header and size
    pub fn inspect(path: &Path) -> Result<Self> {
        let mut file = File::open(path)?;
        let size_bytes = file.metadata()?.len();

        let mut header = [0u8; 8];
        let format = match file.read_exact(&mut header) {
            Ok(()) if &header[..4] == GGUF_MAGIC => ModelFormat::Gguf {
                version: u32::from_le_bytes([header[4], header[5], header[6], header[7]]),
            },
            Ok(()) => ModelFormat::Unknown,
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => ModelFormat::Unknown,
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path: path.to_path_buf(),
            size_bytes,
            format,
        })
    }

    pub fn is_gguf(&self) -> bool {
        matches!(self.format, ModelFormat::Gguf { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_gguf(path: &Path, version: u32) {
        let mut bytes = GGUF_MAGIC.to_vec();
        bytes.extend_from_slice(&version.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 24]);
        std::fs::write(path, bytes).unwrap();
    }

    #[test]
    fn test_inspect_gguf() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("model.gguf");
        write_gguf(&path, 3);

        assert!(local_model_exists(&path));
        let info = LocalModelInfo::inspect(&path).unwrap();
        assert_eq!(info.format, ModelFormat::Gguf { version: 3 });
        assert_eq!(info.size_bytes, 32);
        assert!(info.is_gguf());
        assert_eq!(info.format.to_string(), "GGUF v3");
    }

    #[test]
    fn test_inspect_unknown_and_short_files() {
        let tmp = TempDir::new().unwrap();
        let other = tmp.path().join("model.bin");
        std::fs::write(&other, b"PK\x03\x04 not a gguf file").unwrap();
        assert_eq!(
            LocalModelInfo::inspect(&other).unwrap().format,
            ModelFormat::Unknown
        );

        let short = tmp.path().join("short.gguf");
        std::fs::write(&short, b"GG").unwrap();
        assert_eq!(
            LocalModelInfo::inspect(&short).unwrap().format,
            ModelFormat::Unknown
        );
    }

    #[test]
    fn test_missing_model() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("absent.gguf");
        assert!(!local_model_exists(&path));
        assert!(LocalModelInfo::inspect(&path).is_err());
        assert!(!local_model_exists(tmp.path()));
    }
}
