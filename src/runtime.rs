//! Runtime lookup with default-locale fallback
//!
//! `Runtime` is the process-lifetime companion object rewritten modules
//! resolve their keys against. Catalogs load lazily, one module at a time,
//! and stay cached for the life of the process. Lookups never fail: a
//! missing or untranslated key falls back to the default locale, then to
//! the empty string.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use parking_lot::{Mutex, RwLock};
use tracing::warn;

use crate::catalog::store::Store;
use crate::catalog::Entry;

/// Process-wide translation lookup
#[derive(Debug)]
pub struct Runtime {
    store: Store,
    /// locale → key → entry
    data: RwLock<HashMap<String, HashMap<String, Entry>>>,
    /// modules already pulled from disk; doubles as the per-module
    /// first-population lock
    loaded: Mutex<HashSet<String>>,
}

impl Runtime {
    pub fn new(root: impl Into<PathBuf>, default_locale: impl Into<String>) -> Self {
        Self {
            store: Store::new(root, default_locale),
            data: RwLock::new(HashMap::new()),
            loaded: Mutex::new(HashSet::new()),
        }
    }

    /// Load one module's rows for every locale on disk.
    ///
    /// Idempotent: the first caller populates the cache, later callers
    /// return immediately. Missing or malformed files are skipped with a
    /// warning; the runtime never fails a caller.
    pub fn load(&self, module: &str) {
        let mut loaded = self.loaded.lock();
        if loaded.contains(module) {
            return;
        }
        loaded.insert(module.to_string());

        let locales = match self.store.locales() {
            Ok(locales) => locales,
            Err(err) => {
                warn!("cannot list locales: {}", err);
                return;
            }
        };
        let mut data = self.data.write();
        for locale in locales {
            let catalog = match self.store.load(&locale, module) {
                Ok(Some(catalog)) => catalog,
                Ok(None) => continue,
                Err(err) => {
                    warn!("skipping catalog for {}/{}: {}", locale, module, err);
                    continue;
                }
            };
            let bucket = data.entry(locale).or_default();
            for row in catalog.rows {
                if row.is_placeholder() {
                    continue;
                }
                bucket.insert(row.name.clone(), row);
            }
        }
    }

    /// Resolve (locale, key) to translated text.
    ///
    /// Returns the target locale's value when present and non-empty, the
    /// default locale's value otherwise, and `""` when the key is unknown.
    pub fn lookup(&self, locale: &str, key: &str) -> String {
        self.ensure_module_of(key);
        let data = self.data.read();
        if let Some(entry) = data.get(locale).and_then(|bucket| bucket.get(key)) {
            if !entry.value.is_empty() {
                return entry.value.clone();
            }
        }
        data.get(self.store.default_locale())
            .and_then(|bucket| bucket.get(key))
            .map(|entry| entry.value.clone())
            .unwrap_or_default()
    }

    /// Resolve (locale, key) and substitute `{name}` tokens.
    ///
    /// Substitution is a single left-to-right pass: substituted values are
    /// never re-scanned, so a value containing `{2}` stays literal.
    pub fn lookup_fmt(&self, locale: &str, key: &str, subs: &[(&str, &str)]) -> String {
        let template = self.lookup(locale, key);
        substitute(&template, subs)
    }

    /// Locale codes with loaded rows, sorted
    pub fn locales(&self) -> Vec<String> {
        let mut locales: Vec<String> = self.data.read().keys().cloned().collect();
        locales.sort();
        locales
    }

    /// Whether any rows loaded for `locale`
    pub fn is_supported(&self, locale: &str) -> bool {
        self.data.read().contains_key(locale)
    }

    /// Passthrough marker for a string that has not been extracted yet
    pub fn add(&self, text: &str) -> String {
        warn!("unextracted translation string for add()");
        text.to_string()
    }

    /// Passthrough marker with positional `{1}`-style substitutions
    pub fn add_fmt(&self, text: &str, args: &[&str]) -> String {
        warn!("unextracted translation string for add_fmt()");
        let subs: Vec<(String, &str)> = args
            .iter()
            .enumerate()
            .map(|(i, value)| ((i + 1).to_string(), *value))
            .collect();
        let borrowed: Vec<(&str, &str)> =
            subs.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        substitute(text, &borrowed)
    }

    /// Drop every cached module (test hook)
    pub fn reset(&self) {
        self.loaded.lock().clear();
        self.data.write().clear();
    }

    /// Keys are `<module>:<id>`; derive the module to lazily load it
    fn ensure_module_of(&self, key: &str) {
        if let Some(idx) = key.rfind(':') {
            self.load(&key[..idx]);
        }
    }
}

/// Replace `{name}` tokens in one pass; unknown tokens stay as-is
fn substitute(template: &str, subs: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open..];
        match after.find('}') {
            Some(close) => {
                let token = &after[1..close];
                match subs.iter().find(|(name, _)| *name == token) {
                    Some((_, value)) => out.push_str(value),
                    None => out.push_str(&after[..=close]),
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(after);
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}
