//! Source tree scanning
//!
//! This crate handles:
//! - Walking a source tree with extension and exclude filters
//! - Extracting quoted SQL literals from file content
//! - Running extraction concurrently with a bounded worker pool

pub mod error;
pub mod pattern;
pub mod extractor;
pub mod walker;
pub mod pool;
pub mod collect;

pub use error::ScanError;
pub use pattern::{glob_match, ExcludeSet};
pub use extractor::{Extractor, ExtractorRegistry, RegexExtractor, source_tag};
pub use walker::{walk, WalkHandle, WalkOptions};
pub use pool::{PoolHandle, Processor, ScanResult, WorkerPool};
pub use collect::{CollectedSegments, Scanner};
