//! Text chunking with configurable size and overlap.

use ragkit_core::{AppError, AppResult};

/// Default window width, in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Default number of characters shared by consecutive windows.
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

/// Reject chunking parameters that cannot make progress.
pub fn validate_params(chunk_size: usize, overlap: usize) -> AppResult<()> {
    if chunk_size == 0 {
        return Err(AppError::Config("chunk_size must be greater than 0".to_string()));
    }
    if overlap >= chunk_size {
        return Err(AppError::Config(format!(
            "chunk overlap ({}) must be smaller than chunk_size ({})",
            overlap, chunk_size
        )));
    }
    Ok(())
}

/// Split text into overlapping windows.
///
/// Text no longer than `chunk_size` is returned as a single chunk, untouched.
/// Longer text is cut into windows of `chunk_size` characters starting at
/// offset 0, each new window starting `chunk_size - overlap` characters after
/// the previous one. Windows are trimmed and whitespace-only windows dropped.
///
/// Lengths and offsets count characters, not bytes.
pub fn chunk(text: &str, chunk_size: usize, overlap: usize) -> AppResult<Vec<String>> {
    validate_params(chunk_size, overlap)?;

    // Byte offset of every char, plus the end of the string
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_len = boundaries.len() - 1;

    if char_len <= chunk_size {
        return Ok(vec![text.to_string()]);
    }

    let step = chunk_size - overlap;
    let mut chunks = Vec::with_capacity(char_len / step + 1);
    let mut start = 0;

    while start < char_len {
        let end = (start + chunk_size).min(char_len);
        let window = text[boundaries[start]..boundaries[end]].trim();

        if !window.is_empty() {
            chunks.push(window.to_string());
        }

        start += step;
    }

    tracing::debug!(
        "Chunked {} chars into {} chunks (size: {}, overlap: {})",
        char_len,
        chunks.len(),
        chunk_size,
        overlap
    );

    Ok(chunks)
}
