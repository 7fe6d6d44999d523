//! Extraction configuration
//!
//! Consumed by the scanner, rewriter and store; assembled by the CLI.

use std::path::PathBuf;

/// Configuration for one extraction/validation run
#[derive(Debug, Clone)]
pub struct Config {
    /// Plain translatable function names (`t`, `send`, ...)
    pub funcs: Vec<String>,
    /// Formatting translatable function names (`tf`, `sendf`, ...)
    pub fmt_funcs: Vec<String>,
    /// Authoritative source-text locale
    pub default_locale: String,
    /// Root directory of the catalog tree
    pub catalog_root: PathBuf,
    /// Write results to disk instead of stdout
    pub apply: bool,

    /// Runtime module injected into rewritten source
    pub runtime_module: String,
    /// Plain lookup function on the runtime module
    pub lookup_fn: String,
    /// Formatting lookup function on the runtime module
    pub lookup_fmt_fn: String,
    /// Catalog-load hook function on the runtime module
    pub load_fn: String,
    /// Plain marker function (always recognized)
    pub add_fn: String,
    /// Formatting marker function (always recognized)
    pub add_fmt_fn: String,
    /// Conversion helper module for non-string substitutions
    pub convert_module: String,
    /// Name of the injected locale binding
    pub lang_var: String,
    /// Function called to retrieve the current locale
    pub locale_getter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            funcs: Vec::new(),
            fmt_funcs: Vec::new(),
            default_locale: "en-GB".to_string(),
            catalog_root: PathBuf::from("trans"),
            apply: false,
            runtime_module: "loc".to_string(),
            lookup_fn: "lookup".to_string(),
            lookup_fmt_fn: "lookup_fmt".to_string(),
            load_fn: "load".to_string(),
            add_fn: "add".to_string(),
            add_fmt_fn: "add_fmt".to_string(),
            convert_module: "convert".to_string(),
            lang_var: "lang".to_string(),
            locale_getter: "get_locale".to_string(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `name` is a configured translatable function (either set)
    pub fn is_translatable(&self, name: &str) -> bool {
        self.funcs.iter().any(|f| f == name) || self.is_formatting(name)
    }

    /// Whether `name` is a configured formatting function
    pub fn is_formatting(&self, name: &str) -> bool {
        self.fmt_funcs.iter().any(|f| f == name)
    }

    /// Map a formatting function name to its plain counterpart.
    ///
    /// `notifyf` becomes `notify` when `notify` is configured as a plain
    /// function; otherwise the name is returned unchanged.
    pub fn unfmt_name(&self, name: &str) -> String {
        if !name.ends_with('f') {
            return name.to_string();
        }
        for plain in &self.funcs {
            if format!("{}f", plain) == name {
                return plain.clone();
            }
        }
        name.to_string()
    }
}
