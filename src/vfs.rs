/// A file or directory staged in memory before being written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualEntry {
    /// Target path, relative to the output directory.
    pub destination: std::path::PathBuf,
    /// File bytes. `None` for directories.
    pub content: Option<Vec<u8>>,
    /// Indicates whether this entry is a file (`true`) or a directory (`false`).
    pub is_file: bool,
}
/// The full set of entries a rendered template will create.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VirtualFS {
    pub entries: Vec<VirtualEntry>,
}
impl VirtualFS {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn files(&self) -> impl Iterator<Item = &VirtualEntry> {
        self.entries.iter().filter(|e| e.is_file)
    }

    pub fn directories(&self) -> impl Iterator<Item = &VirtualEntry> {
        self.entries.iter().filter(|e| !e.is_file)
    }
}
