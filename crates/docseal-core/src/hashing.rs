//! Document hashing.
//!
//! The SHA-256 digest of a file's bytes, hex-encoded in lowercase, is the
//! document identity used for verification and sealing.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::SealError;
use crate::models::SelectedFile;

const HASH_CHUNK_SIZE: usize = 64 * 1024;

/// Length of a hex-encoded SHA-256 digest.
pub const SHA256_HEX_LEN: usize = 64;

/// Digest of a selected file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDigest {
    pub file: SelectedFile,
    pub hash: String,
}

pub fn hash_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// True for a 64-character lowercase hex string.
pub fn is_sha256_hex(value: &str) -> bool {
    value.len() == SHA256_HEX_LEN
        && value
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}

/// Stat a file and enforce the size ceiling without reading it.
pub fn inspect_file(path: &Path, max_size: u64) -> Result<SelectedFile, SealError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| SealError::Hashing(format!("{}: {}", path.display(), e)))?;
    if !metadata.is_file() {
        return Err(SealError::InvalidInput(format!(
            "Not a regular file: {}",
            path.display()
        )));
    }
    let size = metadata.len();
    if size > max_size {
        return Err(SealError::FileTooLarge {
            size,
            limit: max_size,
        });
    }

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document")
        .to_string();

    Ok(SelectedFile {
        path: path.to_path_buf(),
        content_type: guess_content_type(path).to_string(),
        file_name,
        size,
    })
}

/// Hash a file in chunks. Fails if the file is missing, unreadable or over `max_size`.
pub fn hash_file(path: &Path, max_size: u64) -> Result<FileDigest, SealError> {
    let file = inspect_file(path, max_size)?;

    let handle =
        File::open(path).map_err(|e| SealError::Hashing(format!("{}: {}", path.display(), e)))?;
    let mut reader = BufReader::new(handle);
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; HASH_CHUNK_SIZE];
    let mut total: u64 = 0;

    loop {
        let read = reader
            .read(&mut buffer)
            .map_err(|e| SealError::Hashing(format!("{}: {}", path.display(), e)))?;
        if read == 0 {
            break;
        }
        total += read as u64;
        // The file may have grown since it was inspected.
        if total > max_size {
            return Err(SealError::FileTooLarge {
                size: total,
                limit: max_size,
            });
        }
        hasher.update(&buffer[..read]);
    }

    Ok(FileDigest {
        file: SelectedFile { size: total, ..file },
        hash: hex::encode(hasher.finalize()),
    })
}

pub fn guess_content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());
    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("txt") => "text/plain",
        Some("csv") => "text/csv",
        _ => "application/octet-stream",
    }
}
