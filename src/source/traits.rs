use crate::model::{SourceError, SourceKind};
use std::path::PathBuf;

/// Where to find one source's raw export.
#[derive(Debug, Clone)]
pub struct SourceRequest {
    pub kind: SourceKind,
    pub path: PathBuf,
}

/// Hands the raw text of a source to the core. Retrieval itself (downloads,
/// API calls) happens before this point.
pub trait SourceReader {
    fn read(&self, req: &SourceRequest) -> Result<String, SourceError>;
}
