//! Skeleton generator: bootstrap a new locale from the default one

use std::path::Path;

use tracing::info;
use walkdir::WalkDir;

use crate::error::{CatalogError, CatalogResult};

use super::{ModuleCatalog, CATALOG_EXT};

/// Create the catalog tree for `target_locale` by mirroring the default
/// locale's tree: every row's value moves into the comment slot (as the
/// translation hint) and the value is cleared.
///
/// Existing files under the target locale are overwritten. This is an
/// explicit bootstrap action, not a merge.
pub fn create_locale(root: &Path, default_locale: &str, target_locale: &str) -> CatalogResult<usize> {
    let source_root = root.join(default_locale);
    let target_root = root.join(target_locale);
    let mut written = 0;

    for entry in WalkDir::new(&source_root) {
        let entry = entry.map_err(|err| {
            let path = err
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| source_root.clone());
            CatalogError::io(path.clone(), err.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().map(|e| e != CATALOG_EXT).unwrap_or(true) {
            continue;
        }

        let mut catalog = ModuleCatalog::load(path)?.unwrap_or_default();
        for row in &mut catalog.rows {
            if row.is_placeholder() {
                continue;
            }
            row.comment = std::mem::take(&mut row.value);
        }

        let rel = path
            .strip_prefix(&source_root)
            .expect("walked path under source root");
        let dest = target_root.join(rel);
        catalog.save(&dest)?;
        info!("created {}", dest.display());
        written += 1;
    }

    Ok(written)
}
