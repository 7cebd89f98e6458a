//! Where class metadata lives between program versions.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::meta_file::{decode_class_info, encode_class_info};
use super::types::FlexClassInfo;
use crate::error::SchemaError;

/// Default file extension of metadata files.
pub const META_EXTENSION: &str = "flexmeta";

/// Persistence for class metadata, one entry per type name.
///
/// Entries are written one at a time. An I/O error during a build leaves
/// the entries written before it in place; each entry on its own is
/// replaced whole.
pub trait MetaStore {
    /// Every readable entry. Unreadable entries are logged and skipped.
    fn load_all(&self) -> Result<Vec<FlexClassInfo>, SchemaError>;

    /// Create or replace the entry for `type_name` with encoded metadata.
    fn store_encoded(&mut self, type_name: &str, bytes: Vec<u8>) -> Result<(), SchemaError>;

    /// Create or replace the entry for `info.type_name`.
    fn store(&mut self, info: &FlexClassInfo) -> Result<(), SchemaError> {
        let bytes = encode_class_info(info)?;
        self.store_encoded(&info.type_name, bytes)
    }

    /// Remove the entry for a type. Removing a missing entry is not an error.
    fn discard(&mut self, type_name: &str) -> Result<(), SchemaError>;
}

/// In-memory store holding encoded metadata.
#[derive(Debug, Clone, Default)]
pub struct MemoryMetaStore {
    entries: BTreeMap<String, Vec<u8>>,
}

impl MemoryMetaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw encoded entry for a type.
    pub fn raw(&self, type_name: &str) -> Option<&[u8]> {
        self.entries.get(type_name).map(Vec::as_slice)
    }

    /// Replace the raw bytes of an entry.
    pub fn insert_raw(&mut self, type_name: impl Into<String>, bytes: Vec<u8>) {
        self.entries.insert(type_name.into(), bytes);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MetaStore for MemoryMetaStore {
    fn load_all(&self) -> Result<Vec<FlexClassInfo>, SchemaError> {
        let mut infos = Vec::with_capacity(self.entries.len());
        for (name, bytes) in &self.entries {
            match decode_class_info(bytes) {
                Ok(info) => infos.push(info),
                Err(e) => warn!(type_name = %name, error = %e, "skipping unreadable metadata"),
            }
        }
        Ok(infos)
    }

    fn store_encoded(&mut self, type_name: &str, bytes: Vec<u8>) -> Result<(), SchemaError> {
        self.entries.insert(type_name.to_string(), bytes);
        Ok(())
    }

    fn discard(&mut self, type_name: &str) -> Result<(), SchemaError> {
        self.entries.remove(type_name);
        Ok(())
    }
}

/// One metadata file per type inside a directory.
#[derive(Debug, Clone)]
pub struct DirMetaStore {
    dir: PathBuf,
    extension: String,
}

impl DirMetaStore {
    /// Open (creating if needed) a metadata directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, SchemaError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(DirMetaStore {
            dir,
            extension: META_EXTENSION.to_string(),
        })
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the metadata of a type.
    pub fn path_for(&self, type_name: &str) -> PathBuf {
        let file_stem: String = type_name
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '_' || c == '.' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.{}", file_stem, self.extension))
    }
}

impl MetaStore for DirMetaStore {
    fn load_all(&self) -> Result<Vec<FlexClassInfo>, SchemaError> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some(self.extension.as_str()) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut infos = Vec::with_capacity(paths.len());
        for path in paths {
            let loaded = fs::read(&path)
                .map_err(SchemaError::from)
                .and_then(|bytes| decode_class_info(&bytes).map_err(SchemaError::from));
            match loaded {
                Ok(info) => infos.push(info),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable metadata file")
                }
            }
        }
        debug!(dir = %self.dir.display(), count = infos.len(), "loaded metadata");
        Ok(infos)
    }

    fn store_encoded(&mut self, type_name: &str, bytes: Vec<u8>) -> Result<(), SchemaError> {
        let path = self.path_for(type_name);
        let partial = path.with_extension(format!("{}.partial", self.extension));
        fs::write(&partial, bytes)?;
        fs::rename(&partial, &path)?;
        Ok(())
    }

    fn discard(&mut self, type_name: &str) -> Result<(), SchemaError> {
        match fs::remove_file(self.path_for(type_name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
