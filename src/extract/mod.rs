//! Batch extraction pipeline
//!
//! Collects script modules from file and directory arguments, then runs
//! each through parse → rewrite → commit. Syntax and directive failures
//! are scoped to the failing file; catalog and source I/O aborts the run.

pub mod format;
pub mod rewrite;
pub mod scan;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::catalog::store::Store;
use crate::catalog::module_name;
use crate::config::Config;
use crate::error::{ExtractError, RunError};
use crate::syntax;

pub use rewrite::{rewrite_module, RewriteError, RewriteOutcome};
pub use scan::{scan, Diagnostic, Match, ScanReport};

/// Source file extension the directory walker picks up
pub const SOURCE_EXT: &str = "scr";

/// Inspection results across a batch
#[derive(Debug, Default)]
pub struct InspectReport {
    pub matches: Vec<(PathBuf, Match)>,
    pub diagnostics: Vec<(PathBuf, Diagnostic)>,
    pub skipped: Vec<(PathBuf, ExtractError)>,
}

/// Extraction results across a batch
#[derive(Debug, Default)]
pub struct ExtractReport {
    pub processed: Vec<PathBuf>,
    pub skipped: Vec<(PathBuf, ExtractError)>,
    pub diagnostics: Vec<(PathBuf, Diagnostic)>,
    /// Rendered source and catalogs in dry-run mode
    pub output: String,
}

/// Batch driver for inspect and extract runs
pub struct Extractor {
    config: Config,
    store: Store,
    /// canonicalized paths already processed this run
    seen: HashSet<PathBuf>,
}

impl Extractor {
    pub fn new(config: Config) -> Self {
        let store = Store::new(&config.catalog_root, config.default_locale.as_str());
        Self {
            config,
            store,
            seen: HashSet::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Read-only scan: report matches and refused call sites
    pub fn inspect(&mut self, paths: &[PathBuf]) -> Result<InspectReport, RunError> {
        let mut report = InspectReport::default();
        for path in self.collect_files(paths)? {
            let text = read_source(&path)?;
            let module = match syntax::parse_source(&text) {
                Ok(module) => module,
                Err(source) => {
                    warn!("skipping {}: parse failed", path.display());
                    report.skipped.push((
                        path.clone(),
                        ExtractError::Syntax {
                            path: path.clone(),
                            source,
                        },
                    ));
                    continue;
                }
            };
            let scanned = scan(&module, &self.config);
            for m in scanned.matches {
                report.matches.push((path.clone(), m));
            }
            for d in scanned.diagnostics {
                report.diagnostics.push((path.clone(), d));
            }
        }
        Ok(report)
    }

    /// Rewrite call sites and merge catalogs.
    ///
    /// In apply mode the rewritten source replaces the input file and the
    /// catalog documents land under the catalog root; otherwise both are
    /// rendered into the report's `output`.
    pub fn extract(&mut self, paths: &[PathBuf]) -> Result<ExtractReport, RunError> {
        let mut report = ExtractReport::default();
        for path in self.collect_files(paths)? {
            self.extract_file(&path, &mut report)?;
        }
        info!("the following have been checked:");
        for path in &report.processed {
            info!("  {}", path.display());
        }
        Ok(report)
    }

    fn extract_file(&self, path: &Path, report: &mut ExtractReport) -> Result<(), RunError> {
        let text = read_source(path)?;
        let module = match syntax::parse_source(&text) {
            Ok(module) => module,
            Err(source) => {
                warn!("skipping {}: parse failed", path.display());
                report.skipped.push((
                    path.to_path_buf(),
                    ExtractError::Syntax {
                        path: path.to_path_buf(),
                        source,
                    },
                ));
                return Ok(());
            }
        };

        let name = module_name(path);
        let counter = self.store.counter_for(&name)?;
        let existing = self.store.default_rows(&name)?;
        debug!("module {} counter at {}", name, counter);

        let outcome = match rewrite_module(&module, &name, &self.config, counter, &existing) {
            Ok(outcome) => outcome,
            Err(err) => {
                // abort this file only; nothing is committed for it
                warn!("skipping {}: {}", path.display(), err);
                report.skipped.push((
                    path.to_path_buf(),
                    match err {
                        RewriteError::UnsupportedDirective(directive) => {
                            ExtractError::UnsupportedDirective {
                                directive,
                                path: path.to_path_buf(),
                            }
                        }
                        RewriteError::MissingFormatArg(index) => ExtractError::MissingFormatArg {
                            index,
                            path: path.to_path_buf(),
                        },
                    },
                ));
                return Ok(());
            }
        };

        for diagnostic in &outcome.diagnostics {
            report
                .diagnostics
                .push((path.to_path_buf(), diagnostic.clone()));
        }

        // the tree transformation succeeded; only now touch the disk
        let printed = syntax::print(&outcome.module);
        if self.config.apply {
            fs::write(path, &printed).map_err(|err| RunError::io(path, err))?;
        } else {
            report.output.push_str(&format!("--- {}\n", path.display()));
            report.output.push_str(&printed);
        }
        self.store
            .commit(&name, &outcome.rows, self.config.apply, &mut report.output)?;

        report.processed.push(path.to_path_buf());
        Ok(())
    }

    /// Expand file and directory arguments into a deduplicated file list
    fn collect_files(&mut self, paths: &[PathBuf]) -> Result<Vec<PathBuf>, RunError> {
        let mut files = Vec::new();
        if paths.is_empty() {
            warn!("no input provided");
            return Ok(files);
        }
        for path in paths {
            let meta = fs::metadata(path).map_err(|err| RunError::io(path, err))?;
            if meta.is_dir() {
                debug!("directory input {}", path.display());
                for entry in WalkDir::new(path).sort_by_file_name() {
                    let entry = entry.map_err(|err| {
                        let at = err
                            .path()
                            .map(Path::to_path_buf)
                            .unwrap_or_else(|| path.clone());
                        RunError::io(at, err.into())
                    })?;
                    if !entry.file_type().is_file() {
                        continue;
                    }
                    let file = entry.path();
                    if file.extension().map(|e| e == SOURCE_EXT).unwrap_or(false)
                        && self.mark_seen(file)?
                    {
                        files.push(file.to_path_buf());
                    }
                }
            } else {
                debug!("file input {}", path.display());
                if self.mark_seen(path)? {
                    files.push(path.clone());
                }
            }
        }
        Ok(files)
    }

    /// Canonical-path dedup: the same file reached via different spellings
    /// is processed once
    fn mark_seen(&mut self, path: &Path) -> Result<bool, RunError> {
        let canonical = fs::canonicalize(path).map_err(|err| RunError::io(path, err))?;
        Ok(self.seen.insert(canonical))
    }
}

fn read_source(path: &Path) -> Result<String, RunError> {
    fs::read_to_string(path).map_err(|err| RunError::io(path, err))
}
