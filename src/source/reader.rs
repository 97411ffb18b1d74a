use crate::model::SourceError;
use crate::source::traits::{SourceReader, SourceRequest};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Reads exports already downloaded to local disk.
pub struct FileReader;

impl FileReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FileReader {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceReader for FileReader {
    fn read(&self, req: &SourceRequest) -> Result<String, SourceError> {
        info!("Reading {} source from {}", req.kind, req.path.display());
        fs::read_to_string(&req.path).map_err(|e| SourceError::Unavailable {
            source_kind: req.kind,
            path: req.path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

/// Serves sources from memory, keyed by path.
#[derive(Default)]
pub struct MemoryReader {
    files: HashMap<PathBuf, String>,
}

impl MemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }
}

impl SourceReader for MemoryReader {
    fn read(&self, req: &SourceRequest) -> Result<String, SourceError> {
        self.files
            .get(&req.path)
            .cloned()
            .ok_or_else(|| SourceError::Unavailable {
                source_kind: req.kind,
                path: req.path.display().to_string(),
                reason: "not found".into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SourceKind;

    #[test]
    fn missing_file_is_unavailable() {
        let req = SourceRequest {
            kind: SourceKind::Rate,
            path: PathBuf::from("/definitely/not/here/mortgage.csv"),
        };
        let err = FileReader::new().read(&req).unwrap_err();
        let SourceError::Unavailable { source_kind, path, .. } = &err;
        assert_eq!(*source_kind, SourceKind::Rate);
        assert!(path.ends_with("mortgage.csv"));
        assert!(err.to_string().starts_with("rate source unavailable"));
    }

    #[test]
    fn memory_reader_serves_registered_paths() {
        let reader = MemoryReader::new().with_file("a.csv", "date,value\n");
        let hit = SourceRequest { kind: SourceKind::Price, path: "a.csv".into() };
        let miss = SourceRequest { kind: SourceKind::Price, path: "b.csv".into() };
        assert_eq!(reader.read(&hit).unwrap(), "date,value\n");
        assert!(reader.read(&miss).is_err());
    }
}
