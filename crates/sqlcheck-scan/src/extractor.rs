//! SQL segment extraction
//!
//! Source files are treated as opaque bytes. Any quoted literal (double,
//! single or back-quoted) whose text starts with SELECT, INSERT, UPDATE or
//! DELETE is a candidate segment; whether it really is SQL is decided later
//! by the parser.

use regex::bytes::Regex;
use sqlcheck_core::{Location, SqlSegment};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::error::ScanError;

/// Source tag used when a file has no extension
pub const UNKNOWN_SOURCE: &str = "unknown";

/// One alternative per quote style; the body is non-greedy up to the same
/// quote, may span lines and may contain any byte.
const SQL_LITERAL_PATTERN: &str = concat!(
    r#""((?i:SELECT|INSERT|UPDATE|DELETE)(?-u:\b)(?s-u:.*?))""#,
    r#"|'((?i:SELECT|INSERT|UPDATE|DELETE)(?-u:\b)(?s-u:.*?))'"#,
    r#"|`((?i:SELECT|INSERT|UPDATE|DELETE)(?-u:\b)(?s-u:.*?))`"#,
);

/// Turns file content into SQL segments
pub trait Extractor: Send + Sync {
    /// Extractor name for log output
    fn name(&self) -> &'static str;

    /// Extract every candidate segment, in byte-offset order
    fn extract(&self, path: &Path, content: &[u8]) -> Result<Vec<SqlSegment>, ScanError>;
}

/// Language-agnostic extractor matching quoted SQL literals
#[derive(Debug, Clone)]
pub struct RegexExtractor {
    pattern: Regex,
}

impl RegexExtractor {
    /// Compile the literal pattern
    pub fn new() -> Result<Self, ScanError> {
        Ok(Self {
            pattern: Regex::new(SQL_LITERAL_PATTERN)?,
        })
    }
}

impl Extractor for RegexExtractor {
    fn name(&self) -> &'static str {
        "regex"
    }

    fn extract(&self, path: &Path, content: &[u8]) -> Result<Vec<SqlSegment>, ScanError> {
        let source = source_tag(path);
        let mut segments = Vec::new();

        // Lines are counted incrementally since matches arrive in offset order
        let mut line = 1;
        let mut counted_to = 0;

        for captures in self.pattern.captures_iter(content) {
            let Some(literal) = captures.get(0) else {
                continue;
            };
            let Some(body) = (1..=3).find_map(|group| captures.get(group)) else {
                continue;
            };

            line += count_newlines(&content[counted_to..literal.start()]);
            counted_to = literal.start();

            segments.push(SqlSegment::new(
                String::from_utf8_lossy(body.as_bytes()).into_owned(),
                Location::new(path, line),
                source.clone(),
            ));
        }

        Ok(segments)
    }
}

fn count_newlines(bytes: &[u8]) -> usize {
    bytes.iter().filter(|&&b| b == b'\n').count()
}

/// Lower-cased file extension, or `unknown`
pub fn source_tag(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_else(|| UNKNOWN_SOURCE.to_string())
}

/// Maps file extensions to extractors
///
/// Files whose extension has no registered extractor go through the regex
/// extractor. The registry also owns reading the file, so size and binary
/// checks apply to every extractor.
#[derive(Clone)]
pub struct ExtractorRegistry {
    extractors: HashMap<String, Arc<dyn Extractor>>,
    fallback: Arc<dyn Extractor>,
    max_file_bytes: u64,
}

impl ExtractorRegistry {
    /// Registry with only the regex fallback
    pub fn new(max_file_bytes: u64) -> Result<Self, ScanError> {
        Ok(Self {
            extractors: HashMap::new(),
            fallback: Arc::new(RegexExtractor::new()?),
            max_file_bytes,
        })
    }

    /// Use `extractor` for files with `extension` (case-insensitive, leading dot optional)
    pub fn register(&mut self, extension: &str, extractor: Arc<dyn Extractor>) -> &mut Self {
        let key = extension.trim_start_matches('.').to_ascii_lowercase();
        self.extractors.insert(key, extractor);
        self
    }

    /// Extractor responsible for `path`
    pub fn extractor_for(&self, path: &Path) -> &dyn Extractor {
        self.extractors
            .get(&source_tag(path))
            .unwrap_or(&self.fallback)
            .as_ref()
    }

    /// Read `path` and extract its segments
    pub fn extract_file(&self, path: &Path) -> Result<Vec<SqlSegment>, ScanError> {
        let metadata = std::fs::metadata(path).map_err(|source| ScanError::FileSystem {
            path: path.to_path_buf(),
            source,
        })?;

        if metadata.len() > self.max_file_bytes {
            return Err(ScanError::Extraction {
                path: path.to_path_buf(),
                reason: format!(
                    "file is {} bytes, limit is {}",
                    metadata.len(),
                    self.max_file_bytes
                ),
            });
        }

        let content = std::fs::read(path).map_err(|source| ScanError::FileSystem {
            path: path.to_path_buf(),
            source,
        })?;

        if content.contains(&0) {
            return Err(ScanError::Extraction {
                path: path.to_path_buf(),
                reason: "binary content".to_string(),
            });
        }

        let extractor = self.extractor_for(path);
        let segments = extractor.extract(path, &content)?;

        debug!(
            path = %path.display(),
            extractor = extractor.name(),
            segments = segments.len(),
            "extracted segments"
        );

        Ok(segments)
    }
}

impl std::fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut extensions: Vec<&String> = self.extractors.keys().collect();
        extensions.sort();

        f.debug_struct("ExtractorRegistry")
            .field("extensions", &extensions)
            .field("fallback", &self.fallback.name())
            .field("max_file_bytes", &self.max_file_bytes)
            .finish()
    }
}
