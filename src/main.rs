//! scriptloc - CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use scriptloc::util::logger;
use scriptloc::{check_all, check_locale, create_locale, Config, Extractor, Store, VERSION};

/// Extract, catalog and validate i18n strings in script modules
#[derive(Parser, Debug)]
#[command(name = "scriptloc")]
#[command(version = VERSION)]
#[command(about = "Extract strings for i18n of your script modules", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Translatable function names
    #[arg(long, value_delimiter = ',', global = true)]
    funcs: Vec<String>,

    /// Formatting translatable function names
    #[arg(long = "fmt-funcs", value_delimiter = ',', global = true)]
    fmt_funcs: Vec<String>,

    /// Authoritative source-text locale
    #[arg(long, default_value = "en-GB", global = true)]
    default_locale: String,

    /// Root directory of the catalog tree
    #[arg(long, default_value = "trans", global = true)]
    catalog_root: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan files and report translatable strings without rewriting
    Inspect {
        /// Files or directories to scan
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,
    },

    /// Rewrite call sites and merge catalogs
    Extract {
        /// Files or directories to extract
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,

        /// Write results to disk instead of stdout
        #[arg(short, long)]
        apply: bool,
    },

    /// Validate one locale's catalogs against the default locale
    Check {
        /// Locale code to validate
        #[arg(value_name = "LOCALE")]
        locale: String,
    },

    /// Validate every locale against the default locale
    CheckAll,

    /// Bootstrap a new locale's catalogs from the default locale
    Create {
        /// Locale code to create
        #[arg(value_name = "LOCALE")]
        locale: String,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    if args.verbose {
        logger::init_debug();
    } else {
        logger::init_cli();
    }

    match run(args) {
        Ok(clean) => {
            if clean {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            tracing::error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(false)` when the run completed but found violations
fn run(args: Args) -> Result<bool> {
    let config = Config {
        funcs: args.funcs,
        fmt_funcs: args.fmt_funcs,
        default_locale: args.default_locale,
        catalog_root: args.catalog_root,
        ..Config::default()
    };

    match args.command {
        Commands::Inspect { paths } => {
            let mut extractor = Extractor::new(config);
            let report = extractor.inspect(&paths).context("inspection failed")?;
            for (path, m) in &report.matches {
                let class = if m.is_formatting { "formatting " } else { "" };
                println!(
                    "{}:{}: {}string \"{}\" in {}()",
                    path.display(),
                    m.line,
                    class,
                    m.literal,
                    m.enclosing_fn
                );
            }
            for (path, d) in &report.diagnostics {
                tracing::warn!("{}:{}: {}", path.display(), d.line(), describe(d));
            }
            for (path, err) in &report.skipped {
                tracing::warn!("skipped {}: {}", path.display(), err);
            }
            Ok(true)
        }
        Commands::Extract { paths, apply } => {
            let config = Config { apply, ..config };
            let mut extractor = Extractor::new(config);
            let report = extractor.extract(&paths).context("extraction failed")?;
            if !apply {
                print!("{}", report.output);
            }
            for (path, err) in &report.skipped {
                tracing::warn!("skipped {}: {}", path.display(), err);
            }
            for (path, d) in &report.diagnostics {
                tracing::warn!("{}:{}: {}", path.display(), d.line(), describe(d));
            }
            Ok(true)
        }
        Commands::Check { locale } => {
            let store = Store::new(&config.catalog_root, config.default_locale.as_str());
            let violations = check_locale(&store, &locale)
                .with_context(|| format!("error found for {}", locale))?;
            report_violations(&violations)
        }
        Commands::CheckAll => {
            let store = Store::new(&config.catalog_root, config.default_locale.as_str());
            let violations = check_all(&store).context("validation failed")?;
            report_violations(&violations)
        }
        Commands::Create { locale } => {
            let written = create_locale(&config.catalog_root, &config.default_locale, &locale)
                .with_context(|| format!("failed to create locale {}", locale))?;
            tracing::info!("created {} catalog files for {}", written, locale);
            Ok(true)
        }
    }
}

fn report_violations(violations: &[scriptloc::Violation]) -> Result<bool> {
    for violation in violations {
        tracing::error!("{}", violation);
    }
    if violations.is_empty() {
        tracing::info!("all catalogs consistent");
        Ok(true)
    } else {
        tracing::error!("{} violations found", violations.len());
        Ok(false)
    }
}

fn describe(diagnostic: &scriptloc::extract::Diagnostic) -> String {
    use scriptloc::extract::Diagnostic;
    match diagnostic {
        Diagnostic::Concatenation { enclosing_fn, .. } => format!(
            "found a concatenated string in {}(); rewrite it as a formatting call",
            enclosing_fn
        ),
        Diagnostic::NonLiteral {
            enclosing_fn,
            found,
            ..
        } => format!("found a {} instead of a literal in {}()", found, enclosing_fn),
    }
}
