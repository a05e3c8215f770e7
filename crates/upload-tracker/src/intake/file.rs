use std::path::{Path, PathBuf};

/// Where a raw file came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOrigin {
    /// Dropped onto the drop zone.
    Drop,
    /// Chosen through a file picker.
    Picker,
}

/// A raw file handed over by the presentation layer.
///
/// Cheap to clone; a retry reuses the same handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    pub name: String,
    pub size_bytes: u64,
    /// MIME type reported by the source, if any.
    pub mime_type: Option<String>,
    /// On-disk location, when the file lives on a local filesystem.
    pub location: Option<PathBuf>,
    pub origin: FileOrigin,
}

impl FileHandle {
    /// Internal constructor used by all public constructors.
    fn new_internal(name: &str, size_bytes: u64, origin: FileOrigin) -> Self {
        Self {
            name: name.to_string(),
            size_bytes,
            mime_type: None,
            location: None,
            origin,
        }
    }

    /// Creates a handle for a dropped file.
    pub fn dropped(name: &str, size_bytes: u64) -> Self {
        Self::new_internal(name, size_bytes, FileOrigin::Drop)
    }

    /// Creates a handle for a file chosen through a picker.
    pub fn picked(name: &str, size_bytes: u64) -> Self {
        Self::new_internal(name, size_bytes, FileOrigin::Picker)
    }

    /// Creates a picker handle for a file on disk, reading its size from metadata.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let mut handle = Self::picked(&name, metadata.len());
        handle.location = Some(path.to_path_buf());
        Ok(handle)
    }

    /// Sets the reported MIME type.
    pub fn with_mime_type(mut self, mime_type: &str) -> Self {
        self.mime_type = Some(mime_type.to_string());
        self
    }

    /// Lowercased extension of the file name, without the dot.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
    }

    /// Reported MIME type, or one guessed from the file name.
    pub fn resolved_mime_type(&self) -> String {
        self.mime_type
            .clone()
            .filter(|m| !m.is_empty())
            .or_else(|| Self::detect_mime_type(Path::new(&self.name)))
            .unwrap_or_else(|| "application/octet-stream".to_string())
    }

    fn detect_mime_type(path: &Path) -> Option<String> {
        mime_guess::from_path(path).first().map(|m| m.to_string())
    }
}
