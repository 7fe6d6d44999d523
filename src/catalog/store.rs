//! Catalog store: per-run merge and persistence
//!
//! The store is the single owner of on-disk catalog state for a run. For
//! every (locale, module) it merges freshly scanned rows into the existing
//! document: disk order is authoritative, retired keys decay to placeholder
//! rows, and brand-new keys are appended. Merging the same scan twice is a
//! no-op, which is what makes apply-mode re-runs byte-identical.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{CatalogError, CatalogResult};

use super::{catalog_path, Entry, ModuleCatalog};

/// A row produced by the current scan, before locale fan-out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreshRow {
    pub id: i64,
    pub name: String,
    /// Default-locale source text
    pub text: String,
}

/// On-disk catalog access for one run
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
    default_locale: String,
}

impl Store {
    pub fn new(root: impl Into<PathBuf>, default_locale: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            default_locale: default_locale.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    /// Locale codes present under the catalog root, sorted
    pub fn locales(&self) -> CatalogResult<Vec<String>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(CatalogError::io(&self.root, err)),
        };
        let mut locales = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| CatalogError::io(&self.root, err))?;
            if entry.path().is_dir() {
                locales.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        locales.sort();
        Ok(locales)
    }

    /// Load the catalog document for (locale, module), `None` when absent
    pub fn load(&self, locale: &str, module: &str) -> CatalogResult<Option<ModuleCatalog>> {
        ModuleCatalog::load(&catalog_path(&self.root, locale, module))
    }

    /// Highest id ever allocated for `module`, across every locale
    pub fn counter_for(&self, module: &str) -> CatalogResult<i64> {
        let mut counter = 0;
        for locale in self.all_locales()? {
            if let Some(catalog) = self.load(&locale, module)? {
                counter = counter.max(catalog.effective_counter());
            }
        }
        Ok(counter)
    }

    /// Default-locale rows for `module`, keyed by row name (placeholders
    /// excluded). Used by the rewriter to re-register already-rewritten
    /// call sites and deduplicate against their source text.
    pub fn default_rows(&self, module: &str) -> CatalogResult<IndexMap<String, Entry>> {
        let mut rows = IndexMap::new();
        if let Some(catalog) = self.load(&self.default_locale, module)? {
            for row in catalog.rows {
                if !row.is_placeholder() {
                    rows.insert(row.name.clone(), row);
                }
            }
        }
        Ok(rows)
    }

    /// Default locale plus every locale found on disk, deduplicated
    fn all_locales(&self) -> CatalogResult<Vec<String>> {
        let mut locales = self.locales()?;
        if !locales.iter().any(|l| l == &self.default_locale) {
            locales.insert(0, self.default_locale.clone());
            locales.sort();
        }
        Ok(locales)
    }

    /// Merge the fresh rows for `module` into every locale and persist.
    ///
    /// With `apply` unset the documents are rendered to `out` instead of
    /// being written to disk. A run that produced no fresh rows leaves the
    /// on-disk catalogs untouched.
    pub fn commit(
        &self,
        module: &str,
        fresh: &[FreshRow],
        apply: bool,
        out: &mut String,
    ) -> CatalogResult<()> {
        if fresh.is_empty() {
            debug!("no catalog rows for {}, skipping", module);
            return Ok(());
        }
        for locale in self.all_locales()? {
            let disk = self.load(&locale, module)?;
            let is_default = locale == self.default_locale;
            let merged = merge(disk.as_ref(), fresh, is_default);
            if merged.rows.is_empty() {
                continue;
            }
            let path = catalog_path(&self.root, &locale, module);
            if apply {
                merged.save(&path)?;
                debug!("wrote {} rows to {}", merged.rows.len(), path.display());
            } else {
                let _ = writeln!(out, "--- {}", path.display());
                out.push_str(&merged.to_document());
            }
        }
        Ok(())
    }
}

/// Merge fresh rows into one locale's on-disk document.
///
/// Disk order wins; the default locale adopts the freshly extracted value
/// and comment while other locales keep their translations; disk keys the
/// scan no longer produced become placeholder rows; new keys are appended
/// unless they already form the trailing suffix of the disk order.
pub fn merge(disk: Option<&ModuleCatalog>, fresh: &[FreshRow], is_default: bool) -> ModuleCatalog {
    let fresh_by_name: IndexMap<&str, &FreshRow> =
        fresh.iter().map(|row| (row.name.as_str(), row)).collect();

    let mut rows: Vec<Entry> = Vec::new();
    let mut matched: Vec<&str> = Vec::new();
    let disk_rows: &[Entry] = disk.map(|d| d.rows.as_slice()).unwrap_or(&[]);

    for row in disk_rows {
        if row.is_placeholder() {
            rows.push(row.clone());
        } else if let Some(new) = fresh_by_name.get(row.name.as_str()) {
            if is_default {
                rows.push(Entry {
                    id: new.id,
                    name: new.name.clone(),
                    value: new.text.clone(),
                    comment: new.name.clone(),
                });
            } else {
                rows.push(row.clone());
            }
            matched.push(row.name.as_str());
        } else {
            rows.push(Entry::placeholder(&row.name));
        }
    }

    let appended: Vec<&FreshRow> = fresh
        .iter()
        .filter(|row| !matched.contains(&row.name.as_str()))
        .collect();

    if !suffix_matches(disk_rows, &appended) {
        for new in &appended {
            if is_default {
                rows.push(Entry {
                    id: new.id,
                    name: new.name.clone(),
                    value: new.text.clone(),
                    comment: new.name.clone(),
                });
            } else {
                rows.push(Entry {
                    id: new.id,
                    name: new.name.clone(),
                    value: String::new(),
                    comment: new.text.clone(),
                });
            }
        }
    }

    let disk_counter = disk.map(ModuleCatalog::effective_counter).unwrap_or(0);
    let counter = rows
        .iter()
        .map(|r| r.id)
        .chain(fresh.iter().map(|r| r.id))
        .fold(disk_counter, i64::max);

    ModuleCatalog { counter, rows }
}

/// Whether the disk rows already end with exactly the to-be-appended key
/// sequence (a crashed prior run can leave that state behind)
fn suffix_matches(disk_rows: &[Entry], appended: &[&FreshRow]) -> bool {
    if appended.is_empty() || disk_rows.len() < appended.len() {
        return false;
    }
    let tail = &disk_rows[disk_rows.len() - appended.len()..];
    tail.iter()
        .zip(appended.iter())
        .all(|(row, new)| row.name == new.name)
}
