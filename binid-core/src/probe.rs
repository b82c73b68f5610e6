use crate::{identify, IdentificationResult};
use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Bytes read from the start of a file unless told otherwise. Enough for
/// the PE header of any ordinary DOS stub.
pub const DEFAULT_PROBE_BYTES: usize = 4096;

/// Smallest read that still covers every fixed-offset header field.
pub const MIN_PROBE_BYTES: usize = 64;

/// A file whose leading bytes have been read and identified.
#[derive(Debug, Clone)]
pub struct Probe {
    pub path: String,
    pub bytes_read: usize,
    pub result: IdentificationResult,
}

impl Probe {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_limit(path, DEFAULT_PROBE_BYTES)
    }

    /// Reads at most `limit` bytes (never fewer than [`MIN_PROBE_BYTES`]
    /// unless the file is shorter) and identifies them.
    pub fn open_with_limit<P: AsRef<Path>>(path: P, limit: usize) -> Result<Self> {
        let path = path.as_ref();
        if path.as_os_str().to_string_lossy().trim().is_empty() {
            bail!("File path must not be empty");
        }

        let full_path = std::path::absolute(path)
            .with_context(|| format!("Invalid file path {}", path.display()))?;
        if !full_path.exists() {
            bail!("File does not exist: {}", full_path.display());
        }
        if !full_path.is_file() {
            bail!("Not a regular file: {}", full_path.display());
        }

        let limit = limit.max(MIN_PROBE_BYTES);
        let file = File::open(&full_path)
            .with_context(|| format!("Failed to open {}", full_path.display()))?;
        let mut header = Vec::new();
        file.take(limit as u64)
            .read_to_end(&mut header)
            .with_context(|| format!("Failed to read {}", full_path.display()))?;

        if header.len() < MIN_PROBE_BYTES {
            log::warn!(
                "{} is only {} bytes; identification may be incomplete",
                full_path.display(),
                header.len()
            );
        }

        let result = identify(&header);
        log::info!("{}: {result}", full_path.display());

        Ok(Self {
            path: path.display().to_string(),
            bytes_read: header.len(),
            result,
        })
    }
}
