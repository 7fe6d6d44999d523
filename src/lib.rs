//! scriptloc — i18n string extraction for script modules
//!
//! Extracts translatable string literals from script source, rewrites the
//! call sites into catalog lookups, persists one catalog per
//! (locale, module), and validates translated catalogs against the
//! default locale.
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use scriptloc::{Config, Extractor};
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut config = Config::new();
//!     config.funcs = vec!["send".to_string()];
//!     config.apply = true;
//!     let mut extractor = Extractor::new(config);
//!     let report = extractor.extract(&[PathBuf::from("bot")])?;
//!     println!("{} modules rewritten", report.processed.len());
//!     Ok(())
//! }
//! ```

#![warn(rust_2018_idioms)]

// Public modules
pub mod catalog;
pub mod check;
pub mod config;
pub mod error;
pub mod extract;
pub mod runtime;
pub mod syntax;

// Utility modules
pub mod util;

// Re-exports
pub use anyhow::{Context, Result};
pub use catalog::skeleton::create_locale;
pub use catalog::store::Store;
pub use check::{check_all, check_locale, Violation};
pub use config::Config;
pub use error::{CatalogError, ExtractError, RunError};
pub use extract::{Extractor, ExtractReport, InspectReport};
pub use runtime::Runtime;

/// Tool version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Tool name
pub const NAME: &str = "scriptloc";
