//! On-disk form of a `VectorIndex`.
//!
//! Two artifacts share a directory:
//! - `index.bin`: bincode-encoded vector blob (dimension, count, flat vectors)
//! - `documents.json`: document records in insertion order, plus the SHA-256
//!   of `index.bin` so a mismatched pair is caught on load
//!
//! Each artifact is written to a `.tmp` sibling, synced and renamed into
//! place. `index.bin` is renamed first; a crash between the two renames
//! leaves an old (or no) manifest whose checksum no longer matches, next to
//! a `documents.json.tmp` whose checksum does. `load` completes such an
//! interrupted save by renaming the pending manifest into place.

use crate::document::Document;
use crate::index::VectorIndex;
use chrono::{DateTime, Utc};
use ragkit_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Current on-disk format version.
pub const FORMAT_VERSION: u32 = 1;

pub const VECTORS_FILE: &str = "index.bin";
pub const DOCUMENTS_FILE: &str = "documents.json";

#[derive(Debug, Serialize, Deserialize)]
struct VectorBlob {
    format_version: u32,
    dimension: u64,
    count: u64,
    vectors: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct ManifestRef<'a> {
    format_version: u32,
    dimension: usize,
    count: usize,
    vectors_sha256: String,
    saved_at: DateTime<Utc>,
    documents: &'a [Document],
}

#[derive(Debug, Deserialize)]
struct Manifest {
    format_version: u32,
    dimension: usize,
    count: usize,
    vectors_sha256: String,
    saved_at: DateTime<Utc>,
    documents: Vec<Document>,
}

/// What a successful load brought in.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedIndex {
    pub count: usize,
    pub saved_at: DateTime<Utc>,
}

/// Whether `dir` holds a saved index.
pub fn index_exists(dir: &Path) -> bool {
    dir.join(VECTORS_FILE).exists() || dir.join(DOCUMENTS_FILE).exists()
}

/// Delete a saved index. Missing artifacts are not an error.
pub fn remove_index(dir: &Path) -> AppResult<()> {
    for name in [VECTORS_FILE, DOCUMENTS_FILE] {
        let path = dir.join(name);
        if path.exists() {
            fs::remove_file(&path)?;
        }
    }
    tracing::debug!("Removed saved index at {:?}", dir);
    Ok(())
}

impl VectorIndex {
    /// Persist the index into `dir`, creating it if needed.
    ///
    /// Returns the save time recorded in the manifest.
    pub fn save(&self, dir: &Path) -> AppResult<DateTime<Utc>> {
        fs::create_dir_all(dir)?;

        let blob = VectorBlob {
            format_version: FORMAT_VERSION,
            dimension: self.dimension as u64,
            count: self.documents.len() as u64,
            vectors: self.vectors.clone(),
        };
        let blob_bytes = bincode::serde::encode_to_vec(&blob, bincode::config::standard())
            .map_err(|e| AppError::Serialization(format!("Failed to encode vectors: {}", e)))?;

        let saved_at = Utc::now();
        let manifest = ManifestRef {
            format_version: FORMAT_VERSION,
            dimension: self.dimension,
            count: self.documents.len(),
            vectors_sha256: sha256_hex(&blob_bytes),
            saved_at,
            documents: &self.documents,
        };
        let manifest_bytes = serde_json::to_vec_pretty(&manifest)?;

        let vectors_tmp = write_tmp(dir, VECTORS_FILE, &blob_bytes)?;
        let documents_tmp = write_tmp(dir, DOCUMENTS_FILE, &manifest_bytes)?;

        fs::rename(&vectors_tmp, dir.join(VECTORS_FILE))?;
        fs::rename(&documents_tmp, dir.join(DOCUMENTS_FILE))?;

        tracing::info!(
            "Saved index with {} documents to {:?}",
            self.documents.len(),
            dir
        );
        Ok(saved_at)
    }

    /// Replace the contents of this index with the one saved in `dir`.
    ///
    /// Every check runs before anything is replaced; on error the index is
    /// unchanged.
    pub fn load(&mut self, dir: &Path) -> AppResult<LoadedIndex> {
        if !index_exists(dir) {
            return Err(AppError::Knowledge(format!(
                "No saved index found in {:?}",
                dir
            )));
        }

        let blob_bytes = read_artifact(dir, VECTORS_FILE)?;
        let blob_sha256 = sha256_hex(&blob_bytes);

        let manifest = match pending_manifest(dir, &blob_sha256)? {
            Some(manifest) => manifest,
            None => {
                let manifest_bytes = read_artifact(dir, DOCUMENTS_FILE)?;
                parse_manifest(&manifest_bytes)?
            }
        };

        if manifest.format_version != FORMAT_VERSION {
            return Err(AppError::CorruptIndex(format!(
                "Unsupported format version {} in {}",
                manifest.format_version, DOCUMENTS_FILE
            )));
        }

        if manifest.dimension != self.dimension {
            return Err(AppError::DimensionMismatch {
                expected: self.dimension,
                actual: manifest.dimension,
            });
        }

        if blob_sha256 != manifest.vectors_sha256 {
            return Err(AppError::CorruptIndex(format!(
                "{} does not match the checksum recorded in {}",
                VECTORS_FILE, DOCUMENTS_FILE
            )));
        }

        let (blob, _): (VectorBlob, usize) =
            bincode::serde::decode_from_slice(&blob_bytes, bincode::config::standard())
                .map_err(|e| {
                    AppError::CorruptIndex(format!("Unreadable {}: {}", VECTORS_FILE, e))
                })?;

        if blob.format_version != FORMAT_VERSION {
            return Err(AppError::CorruptIndex(format!(
                "Unsupported format version {} in {}",
                blob.format_version, VECTORS_FILE
            )));
        }

        if blob.dimension != self.dimension as u64 {
            return Err(AppError::CorruptIndex(format!(
                "{} records dimension {}, {} records {}",
                VECTORS_FILE, blob.dimension, DOCUMENTS_FILE, manifest.dimension
            )));
        }

        let count = manifest.documents.len();
        if manifest.count != count
            || blob.count != count as u64
            || blob.vectors.len() != count * self.dimension
        {
            return Err(AppError::CorruptIndex(format!(
                "Count mismatch: manifest says {}, {} documents, blob says {}, {} vector components",
                manifest.count,
                count,
                blob.count,
                blob.vectors.len()
            )));
        }

        if blob.vectors.iter().any(|x| !x.is_finite()) {
            return Err(AppError::CorruptIndex(format!(
                "{} contains non-finite values",
                VECTORS_FILE
            )));
        }

        self.documents = manifest.documents;
        self.vectors = blob.vectors;

        tracing::info!("Loaded index with {} documents from {:?}", count, dir);

        Ok(LoadedIndex {
            count,
            saved_at: manifest.saved_at,
        })
    }
}

fn parse_manifest(bytes: &[u8]) -> AppResult<Manifest> {
    serde_json::from_slice(bytes)
        .map_err(|e| AppError::CorruptIndex(format!("Unreadable {}: {}", DOCUMENTS_FILE, e)))
}

/// Finish a save that stopped between the two renames.
///
/// Applies only when the committed manifest is missing or does not describe
/// `index.bin` while the pending `.tmp` one does. The pending manifest is
/// renamed into place and returned.
fn pending_manifest(dir: &Path, blob_sha256: &str) -> AppResult<Option<Manifest>> {
    let tmp_path = dir.join(format!("{}.tmp", DOCUMENTS_FILE));
    if !tmp_path.exists() {
        return Ok(None);
    }

    let committed_path = dir.join(DOCUMENTS_FILE);
    if committed_path.exists() {
        let committed = fs::read(&committed_path)?;
        if let Ok(manifest) = parse_manifest(&committed) {
            if manifest.vectors_sha256 == blob_sha256 {
                return Ok(None);
            }
        }
    }

    let pending = match parse_manifest(&fs::read(&tmp_path)?) {
        Ok(manifest) if manifest.vectors_sha256 == blob_sha256 => manifest,
        _ => return Ok(None),
    };

    fs::rename(&tmp_path, &committed_path)?;
    tracing::warn!(
        "Completed an interrupted save in {:?} from the pending {}",
        dir,
        DOCUMENTS_FILE
    );

    Ok(Some(pending))
}

fn read_artifact(dir: &Path, name: &str) -> AppResult<Vec<u8>> {
    let path = dir.join(name);
    if !path.exists() {
        return Err(AppError::CorruptIndex(format!(
            "Missing {} in {:?}",
            name, dir
        )));
    }
    Ok(fs::read(&path)?)
}

fn write_tmp(dir: &Path, name: &str, bytes: &[u8]) -> AppResult<PathBuf> {
    let tmp_path = dir.join(format!("{}.tmp", name));
    let mut file = File::create(&tmp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    Ok(tmp_path)
}

fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}
