//! Cross-locale catalog validation
//!
//! Compares every non-default catalog against the default locale's and
//! accumulates violations per (locale, key). The pass always runs to
//! completion; the caller decides what a non-empty result means.

pub mod markup;

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use walkdir::WalkDir;

use crate::catalog::store::Store;
use crate::catalog::{Entry, ModuleCatalog, CATALOG_EXT};
use crate::error::{CatalogError, CatalogResult};

/// Marker character whose count must match between default and translation
pub const MARKER_SYMBOL: char = '@';

static CURLY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\d+\}").expect("curly regex"));

/// What a translation got wrong
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    /// Entry stored under a key that is not its own name (structural)
    NameMismatch { stored: String },
    /// Target id diverged from the default locale's id for the same key
    IdMismatch { default_id: i64, target_id: i64 },
    /// `{n}` token present in the default text but missing from the target
    PlaceholderMissing { token: String },
    /// `{n}` token present in the target but unknown to the default text
    PlaceholderExtra { token: String },
    /// `{n}` token used a different number of times
    PlaceholderCount {
        token: String,
        default_count: usize,
        target_count: usize,
    },
    /// Markup error in the target text
    Markup { message: String },
    /// Marker-symbol count diverged
    SymbolParity {
        symbol: char,
        default_count: usize,
        target_count: usize,
    },
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::NameMismatch { stored } => {
                write!(f, "fatally incorrect: stored under '{}'", stored)
            }
            ViolationKind::IdMismatch {
                default_id,
                target_id,
            } => write!(
                f,
                "id desync: default has {}, translation has {}",
                default_id, target_id
            ),
            ViolationKind::PlaceholderMissing { token } => {
                write!(f, "missing placeholder {}", token)
            }
            ViolationKind::PlaceholderExtra { token } => {
                write!(f, "unknown placeholder {} in translation", token)
            }
            ViolationKind::PlaceholderCount {
                token,
                default_count,
                target_count,
            } => write!(
                f,
                "placeholder {} used {} times (should be {})",
                token, target_count, default_count
            ),
            ViolationKind::Markup { message } => write!(f, "markup error: {}", message),
            ViolationKind::SymbolParity {
                symbol,
                default_count,
                target_count,
            } => write!(
                f,
                "unexpected number of {}'s ({} vs {})",
                symbol, target_count, default_count
            ),
        }
    }
}

/// One violation, addressed by locale and key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub locale: String,
    pub key: String,
    pub kind: ViolationKind,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: '{}'\t{}", self.locale, self.key, self.kind)
    }
}

/// Validate one locale against the default. Never aborts early: every key
/// of every module is visited and all violations come back together.
pub fn check_locale(store: &Store, locale: &str) -> CatalogResult<Vec<Violation>> {
    let mut violations = Vec::new();
    if locale == store.default_locale() {
        return Ok(violations);
    }
    for module in default_modules(store)? {
        let default_rows = rows_by_name(store.load(store.default_locale(), &module)?);
        let target_rows = rows_by_name(store.load(locale, &module)?);
        debug!(
            "checking {} keys of {} for {}",
            target_rows.len(),
            module,
            locale
        );
        check_module(locale, &default_rows, &target_rows, &mut violations);
    }
    Ok(violations)
}

/// Validate every locale found on disk against the default
pub fn check_all(store: &Store) -> CatalogResult<Vec<Violation>> {
    let mut violations = Vec::new();
    for locale in store.locales()? {
        violations.extend(check_locale(store, &locale)?);
    }
    Ok(violations)
}

fn check_module(
    locale: &str,
    default_rows: &IndexMap<String, Entry>,
    target_rows: &IndexMap<String, Entry>,
    violations: &mut Vec<Violation>,
) {
    for (stored_key, entry) in target_rows {
        let default = match default_rows.get(stored_key) {
            Some(default) => default,
            // key only exists in the translation; nothing to compare against
            None => continue,
        };
        // untranslated or identical text: nothing custom to check
        if entry.value.is_empty() || entry.value == default.value {
            continue;
        }

        if *stored_key != entry.name {
            violations.push(Violation {
                locale: locale.to_string(),
                key: stored_key.clone(),
                kind: ViolationKind::NameMismatch {
                    stored: entry.name.clone(),
                },
            });
            continue;
        }

        if default.id != entry.id {
            violations.push(Violation {
                locale: locale.to_string(),
                key: stored_key.clone(),
                kind: ViolationKind::IdMismatch {
                    default_id: default.id,
                    target_id: entry.id,
                },
            });
            continue;
        }

        check_placeholders(locale, stored_key, &default.value, &entry.value, violations);
        check_markup(locale, stored_key, &default.value, &entry.value, violations);
        check_symbols(locale, stored_key, &default.value, &entry.value, violations);
    }
}

/// The multiset of `{n}` tokens must match, counting occurrences
fn check_placeholders(
    locale: &str,
    key: &str,
    default: &str,
    target: &str,
    violations: &mut Vec<Violation>,
) {
    let default_counts = curly_counts(default);
    let target_counts = curly_counts(target);

    for (token, default_count) in &default_counts {
        match target_counts.get(token) {
            None => violations.push(Violation {
                locale: locale.to_string(),
                key: key.to_string(),
                kind: ViolationKind::PlaceholderMissing {
                    token: token.clone(),
                },
            }),
            Some(target_count) if target_count != default_count => {
                violations.push(Violation {
                    locale: locale.to_string(),
                    key: key.to_string(),
                    kind: ViolationKind::PlaceholderCount {
                        token: token.clone(),
                        default_count: *default_count,
                        target_count: *target_count,
                    },
                })
            }
            Some(_) => {}
        }
    }
    for token in target_counts.keys() {
        if !default_counts.contains_key(token) {
            violations.push(Violation {
                locale: locale.to_string(),
                key: key.to_string(),
                kind: ViolationKind::PlaceholderExtra {
                    token: token.clone(),
                },
            });
        }
    }
}

/// Markup errors in the target, tolerating invalid tags the default text
/// already carries: invalid-tag errors are reported only when the target
/// has more of them than the default; attribute errors always report.
fn check_markup(
    locale: &str,
    key: &str,
    default: &str,
    target: &str,
    violations: &mut Vec<Violation>,
) {
    let target_errors = markup::validate(target);
    if target_errors.is_empty() {
        return;
    }
    let baseline = markup::validate(default)
        .iter()
        .filter(|e| e.is_invalid_tag())
        .count();
    let target_invalid = target_errors.iter().filter(|e| e.is_invalid_tag()).count();
    let report_invalid_tags = target_invalid > baseline;

    for error in &target_errors {
        if error.is_invalid_tag() && !report_invalid_tags {
            continue;
        }
        violations.push(Violation {
            locale: locale.to_string(),
            key: key.to_string(),
            kind: ViolationKind::Markup {
                message: error.to_string(),
            },
        });
    }
}

fn check_symbols(
    locale: &str,
    key: &str,
    default: &str,
    target: &str,
    violations: &mut Vec<Violation>,
) {
    let default_count = default.matches(MARKER_SYMBOL).count();
    let target_count = target.matches(MARKER_SYMBOL).count();
    if default_count != target_count {
        violations.push(Violation {
            locale: locale.to_string(),
            key: key.to_string(),
            kind: ViolationKind::SymbolParity {
                symbol: MARKER_SYMBOL,
                default_count,
                target_count,
            },
        });
    }
}

fn curly_counts(text: &str) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for token in CURLY_RE.find_iter(text) {
        *counts.entry(token.as_str().to_string()).or_insert(0) += 1;
    }
    counts
}

fn rows_by_name(catalog: Option<ModuleCatalog>) -> IndexMap<String, Entry> {
    let mut rows = IndexMap::new();
    if let Some(catalog) = catalog {
        for row in catalog.rows {
            if !row.is_placeholder() {
                rows.insert(row.name.clone(), row);
            }
        }
    }
    rows
}

/// Catalog module files present under the default locale, as module-file
/// relative paths ("bot/cmds.json" stays addressable via `Store::load`,
/// which maps the module name through the same extension swap)
fn default_modules(store: &Store) -> CatalogResult<Vec<String>> {
    let base = store.root().join(store.default_locale());
    let mut modules = Vec::new();
    if !base.exists() {
        return Ok(modules);
    }
    for entry in WalkDir::new(&base).sort_by_file_name() {
        let entry = entry.map_err(|err| {
            let path = err
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| base.clone());
            CatalogError::io(path, err.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry
            .path()
            .extension()
            .map(|e| e == CATALOG_EXT)
            .unwrap_or(false)
        {
            let rel = entry
                .path()
                .strip_prefix(&base)
                .expect("walked path under locale root");
            modules.push(crate::catalog::module_name(rel));
        }
    }
    Ok(modules)
}
