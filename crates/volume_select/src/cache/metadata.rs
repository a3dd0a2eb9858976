//! `metadata.json`: which content and tool versions a cache belongs to

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cache::CacheError;

/// File name of the metadata document inside the cache directory
pub const METADATA_FILE: &str = "metadata.json";

/// Version stamp and build state of a cache directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMetadata {
    /// Version of the world content
    pub content_version: String,
    /// Version of the tool that wrote the cache
    pub tool_version: String,
    /// Whether bounds exist for every baseline partition
    #[serde(default)]
    pub baseline_bounds_built: bool,
}

impl CacheMetadata {
    /// Fresh metadata for the given versions
    pub fn new(content_version: impl Into<String>, tool_version: impl Into<String>) -> Self {
        Self {
            content_version: content_version.into(),
            tool_version: tool_version.into(),
            baseline_bounds_built: false,
        }
    }

    /// Whether this cache was written for the given versions
    pub fn matches(&self, content_version: &str, tool_version: &str) -> bool {
        self.content_version == content_version && self.tool_version == tool_version
    }

    /// Read the metadata of `root`; `Ok(None)` when there is none
    pub fn load(root: &Path) -> Result<Option<Self>, CacheError> {
        let path = root.join(METADATA_FILE);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };
        let metadata = serde_json::from_reader(BufReader::new(file))?;
        Ok(Some(metadata))
    }

    /// Write the metadata of `root` through a temporary file and a rename
    pub fn save(&self, root: &Path) -> Result<(), CacheError> {
        std::fs::create_dir_all(root)?;
        let tmp_path = root.join(format!("{METADATA_FILE}.tmp"));
        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, self)?;
            writer.flush()?;
            let file = writer.into_inner().map_err(io::IntoInnerError::into_error)?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp_path, root.join(METADATA_FILE))?;
        Ok(())
    }
}
