//! Catalog data model and document I/O
//!
//! One document per (locale, module): a `counter` attribute and ordered
//! rows of `{id, name, value, comment}`. Documents are stored as JSON with
//! a fixed field order, 2-space indentation and a trailing newline, so a
//! no-op merge writes byte-identical files.

pub mod skeleton;
pub mod store;

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};

/// Catalog file extension
pub const CATALOG_EXT: &str = "json";

/// One translation row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub comment: String,
}

impl Entry {
    /// Inert row left behind when a key disappears from source.
    ///
    /// Keeping the row (instead of deleting it) preserves the offsets that
    /// external translation tooling may hold into the file.
    pub fn placeholder(old_name: &str) -> Self {
        Self {
            id: -1,
            name: String::new(),
            value: String::new(),
            comment: format!("retired key {}", old_name),
        }
    }

    /// Whether this row is an inert placeholder
    pub fn is_placeholder(&self) -> bool {
        self.name.is_empty()
    }
}

/// Ordered rows for one (locale, module) pair
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModuleCatalog {
    #[serde(default)]
    pub counter: i64,
    #[serde(default)]
    pub rows: Vec<Entry>,
}

impl ModuleCatalog {
    /// Highest id ever allocated for this module, as recorded by this
    /// document. Falls back to the row count when the counter attribute is
    /// missing or zero (old documents), and never reports less than the
    /// largest id actually present.
    pub fn effective_counter(&self) -> i64 {
        let base = if self.counter > 0 {
            self.counter
        } else {
            self.rows.len() as i64
        };
        self.rows.iter().map(|r| r.id).fold(base, i64::max)
    }

    /// Decode a document from a reader
    pub fn from_reader(reader: impl Read, path: &Path) -> CatalogResult<Self> {
        serde_json::from_reader(reader).map_err(|source| CatalogError::Decode {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Encode the document: pretty JSON plus trailing newline
    pub fn to_document(&self) -> String {
        let mut text = serde_json::to_string_pretty(self).expect("catalog serialization");
        text.push('\n');
        text
    }

    /// Load the document at `path`, `None` when absent
    pub fn load(path: &Path) -> CatalogResult<Option<Self>> {
        let file = match fs::File::open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(CatalogError::io(path, err)),
        };
        Self::from_reader(file, path).map(Some)
    }

    /// Write the document at `path`, creating parent directories
    pub fn save(&self, path: &Path) -> CatalogResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| CatalogError::io(parent, err))?;
        }
        fs::write(path, self.to_document()).map_err(|err| CatalogError::io(path, err))
    }
}

/// Catalog file path for a (locale, module) pair:
/// `<root>/<locale>/<module with its extension replaced by .json>`
pub fn catalog_path(root: &Path, locale: &str, module: &str) -> PathBuf {
    root.join(locale).join(module_file(module))
}

/// Module path with the source extension swapped for the catalog one
pub fn module_file(module: &str) -> PathBuf {
    PathBuf::from(module).with_extension(CATALOG_EXT)
}

/// Normalize a filesystem path into a module name: forward slashes, no
/// root or `.` components, so the name can mirror into the catalog tree
pub fn module_name(path: &Path) -> String {
    let parts: Vec<String> = path
        .components()
        .filter_map(|c| match c {
            std::path::Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    parts.join("/")
}
