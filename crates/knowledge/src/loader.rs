//! Source loading: turn a source identifier into text, then into chunks.

use crate::chunker;
use crate::document::{Document, DocumentMetadata};
use async_trait::async_trait;
use ragkit_core::{AppError, AppResult};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Content type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Markdown,
    Html,
    Json,
    Csv,
    PlainText,
}

impl ContentType {
    /// Detect content type from file extension. `None` for unsupported formats.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "md" | "markdown" => Some(Self::Markdown),
            "html" | "htm" => Some(Self::Html),
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            "txt" => Some(Self::PlainText),
            _ => None,
        }
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Html => "html",
            Self::Json => "json",
            Self::Csv => "csv",
            Self::PlainText => "text",
        }
    }
}

/// Turns a source identifier into raw text blobs.
///
/// Extraction from scanned or binary formats happens outside this crate;
/// implementations only deal in text.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// Load the text of one source. A source may yield several blobs.
    async fn load(&self, source: &str) -> AppResult<Vec<String>>;

    /// Content type label recorded on every chunk of `source`.
    fn content_type(&self, source: &str) -> Option<&'static str>;
}

/// Loads local text files.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileLoader;

impl FileLoader {
    pub fn new() -> Self {
        Self
    }

    /// Whether a path has an extension this loader reads.
    pub fn supports(path: &Path) -> bool {
        ContentType::from_path(path).is_some()
    }
}

#[async_trait]
impl DocumentLoader for FileLoader {
    async fn load(&self, source: &str) -> AppResult<Vec<String>> {
        let path = Path::new(source);
        let content_type = ContentType::from_path(path).ok_or_else(|| {
            AppError::Config(format!("Unsupported source format: {}", source))
        })?;

        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AppError::Knowledge(format!("Failed to read {}: {}", source, e)))?;

        let cleaned = match content_type {
            ContentType::Markdown => clean_markdown(&raw),
            ContentType::Html => clean_html(&raw),
            ContentType::Json | ContentType::Csv | ContentType::PlainText => raw,
        };

        Ok(vec![cleaned])
    }

    fn content_type(&self, source: &str) -> Option<&'static str> {
        ContentType::from_path(Path::new(source)).map(|t| t.as_str())
    }
}

/// Runs a loader and the chunker over one source.
pub struct DocumentProcessor<'a> {
    loader: &'a dyn DocumentLoader,
    chunk_size: usize,
    overlap: usize,
}

/// Chunks of one source, before embedding.
#[derive(Debug)]
pub struct PreparedSource {
    pub documents: Vec<Document>,
    pub bytes: usize,
}

impl<'a> DocumentProcessor<'a> {
    pub fn new(loader: &'a dyn DocumentLoader, chunk_size: usize, overlap: usize) -> AppResult<Self> {
        chunker::validate_params(chunk_size, overlap)?;
        Ok(Self {
            loader,
            chunk_size,
            overlap,
        })
    }

    /// Load and chunk `source`. Chunk indices run 0.. across all blobs.
    pub async fn process(&self, source: &str) -> AppResult<PreparedSource> {
        let blobs = self.loader.load(source).await?;
        let content_type = self.loader.content_type(source);

        let mut documents = Vec::new();
        let mut bytes = 0;

        for blob in &blobs {
            bytes += blob.len();
            if blob.trim().is_empty() {
                continue;
            }

            for text in chunker::chunk(blob, self.chunk_size, self.overlap)? {
                let mut metadata = DocumentMetadata::new(source, documents.len())
                    .with_extra("content_hash", serde_json::Value::String(content_hash(&text)));
                if let Some(content_type) = content_type {
                    metadata = metadata.with_extra(
                        "content_type",
                        serde_json::Value::String(content_type.to_string()),
                    );
                }
                documents.push(Document::new(text, metadata));
            }
        }

        tracing::debug!("Prepared {} chunks from {}", documents.len(), source);

        Ok(PreparedSource { documents, bytes })
    }
}

/// Expand directories into the supported files beneath them.
///
/// Plain file paths are passed through as given so an unsupported file
/// surfaces as an error at load time instead of vanishing.
pub fn discover_sources(paths: &[PathBuf]) -> AppResult<Vec<String>> {
    let mut sources = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut found: Vec<String> = walkdir::WalkDir::new(path)
                .follow_links(false)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file() && FileLoader::supports(e.path()))
                .map(|e| e.path().to_string_lossy().into_owned())
                .collect();
            found.sort();
            tracing::debug!("Discovered {} files under {:?}", found.len(), path);
            sources.extend(found);
        } else if path.exists() {
            sources.push(path.to_string_lossy().into_owned());
        } else {
            return Err(AppError::Knowledge(format!("Source not found: {:?}", path)));
        }
    }

    Ok(sources)
}

fn content_hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Clean markdown by removing excess formatting.
fn clean_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for line in text.lines() {
        let trimmed = line.trim_start_matches('#').trim();

        // Horizontal rules and code fences
        if trimmed.starts_with("---") || trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            continue;
        }

        if !trimmed.is_empty() {
            result.push_str(trimmed);
            result.push('\n');
        }
    }

    result.trim().to_string()
}

/// Clean HTML by stripping tags, scripts and styles.
fn clean_html(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut in_tag = false;
    let mut in_script = false;
    let mut in_style = false;

    for (i, ch) in text.char_indices() {
        if ch == '<' {
            in_tag = true;

            let rest = &text[i..];
            if starts_with_ignore_case(rest, "<script") {
                in_script = true;
            } else if starts_with_ignore_case(rest, "</script") {
                in_script = false;
            } else if starts_with_ignore_case(rest, "<style") {
                in_style = true;
            } else if starts_with_ignore_case(rest, "</style") {
                in_style = false;
            }
        } else if ch == '>' {
            in_tag = false;
            result.push(' ');
        } else if !in_tag && !in_script && !in_style {
            result.push(ch);
        }
    }

    result.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn starts_with_ignore_case(haystack: &str, prefix: &str) -> bool {
    haystack
        .get(..prefix.len())
        .map(|head| head.eq_ignore_ascii_case(prefix))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct StaticLoader(Vec<String>);

    #[async_trait]
    impl DocumentLoader for StaticLoader {
        async fn load(&self, _source: &str) -> AppResult<Vec<String>> {
            Ok(self.0.clone())
        }

        fn content_type(&self, _source: &str) -> Option<&'static str> {
            None
        }
    }

    #[test]
    fn test_content_type_detection() {
        assert_eq!(
            ContentType::from_path(Path::new("file.md")),
            Some(ContentType::Markdown)
        );
        assert_eq!(
            ContentType::from_path(Path::new("FILE.TXT")),
            Some(ContentType::PlainText)
        );
        assert_eq!(ContentType::from_path(Path::new("report.pdf")), None);
        assert_eq!(ContentType::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn test_clean_markdown() {
        let input = "# Header\n\nSome text\n\n```rust\ncode\n```\n\nMore text";
        let output = clean_markdown(input);
        assert!(output.contains("Header"));
        assert!(output.contains("Some text"));
        assert!(output.contains("More text"));
        assert!(!output.contains("```"));
    }

    #[test]
    fn test_clean_html() {
        let input = "<html><head><style>p { color: red; }</style></head>\
                     <body><p>Hello <b>world</b></p><script>alert(1)</script></body></html>";
        assert_eq!(clean_html(input), "Hello world");
    }

    #[tokio::test]
    async fn test_file_loader_rejects_pdf() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("scan.pdf");
        fs::write(&path, b"%PDF-1.4").unwrap();

        let err = FileLoader::new()
            .load(&path.to_string_lossy())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[tokio::test]
    async fn test_file_loader_reads_markdown() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("notes.md");
        fs::write(&path, "# Title\n\nBody text").unwrap();

        let blobs = FileLoader::new().load(&path.to_string_lossy()).await.unwrap();
        assert_eq!(blobs, vec!["Title\nBody text".to_string()]);
    }

    #[tokio::test]
    async fn test_processor_numbers_chunks_across_blobs() {
        let loader = StaticLoader(vec!["a".repeat(25), "   ".to_string(), "b".repeat(5)]);
        let processor = DocumentProcessor::new(&loader, 10, 0).unwrap();

        let prepared = processor.process("mem://source").await.unwrap();
        let indices: Vec<usize> = prepared
            .documents
            .iter()
            .map(|d| d.metadata.chunk_index)
            .collect();

        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert_eq!(prepared.documents[3].content, "bbbbb");
        assert_eq!(prepared.bytes, 33);
        assert!(prepared
            .documents
            .iter()
            .all(|d| d.metadata.source == "mem://source"));
        assert!(prepared.documents[0].metadata.get("content_hash").is_some());
    }

    #[test]
    fn test_processor_rejects_bad_overlap() {
        let loader = StaticLoader(vec![]);
        assert!(DocumentProcessor::new(&loader, 10, 10).is_err());
    }

    #[test]
    fn test_discover_sources_sorted_and_filtered() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("sub")).unwrap();
        fs::write(temp.path().join("b.txt"), "b").unwrap();
        fs::write(temp.path().join("a.md"), "a").unwrap();
        fs::write(temp.path().join("sub/c.csv"), "c").unwrap();
        fs::write(temp.path().join("image.png"), "x").unwrap();

        let sources = discover_sources(&[temp.path().to_path_buf()]).unwrap();
        let names: Vec<String> = sources
            .iter()
            .map(|s| {
                Path::new(s)
                    .strip_prefix(temp.path())
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();

        assert_eq!(names, vec!["a.md", "b.txt", "sub/c.csv"]);
    }

    #[test]
    fn test_discover_sources_missing_path() {
        let temp = TempDir::new().unwrap();
        assert!(discover_sources(&[temp.path().join("missing")]).is_err());
    }
}
