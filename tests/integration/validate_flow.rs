//! Extraction-to-validation flow against real temp trees

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use scriptloc::catalog::{catalog_path, module_name, ModuleCatalog};
use scriptloc::check::{check_all, check_locale, ViolationKind};
use scriptloc::{Config, Extractor, Store};

fn extract(root: &Path, paths: &[PathBuf]) {
    let config = Config {
        funcs: vec!["t".to_string()],
        fmt_funcs: vec!["tf".to_string()],
        default_locale: "en".to_string(),
        catalog_root: root.join("trans"),
        apply: true,
        ..Config::default()
    };
    let mut extractor = Extractor::new(config);
    let report = extractor.extract(paths).unwrap();
    assert!(report.skipped.is_empty(), "skipped: {:?}", report.skipped);
}

#[test]
fn test_dropped_placeholder_is_reported() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("m.scr");
    fs::write(&file, "fn f(n) {\n    tf(\"Hello %s\", n)\n}\n").unwrap();
    extract(dir.path(), &[file.clone()]);

    let module = module_name(&file);
    scriptloc::create_locale(&dir.path().join("trans"), "en", "fr").unwrap();

    // translate but drop the placeholder
    let fr_path = catalog_path(&dir.path().join("trans"), "fr", &module);
    let mut fr = ModuleCatalog::load(&fr_path).unwrap().unwrap();
    fr.rows[0].value = "Bonjour".to_string();
    fr.save(&fr_path).unwrap();

    let store = Store::new(dir.path().join("trans"), "en");
    let violations = check_locale(&store, "fr").unwrap();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].locale, "fr");
    assert_eq!(violations[0].key, format!("{}:1", module));
    assert_eq!(
        violations[0].kind,
        ViolationKind::PlaceholderMissing {
            token: "{1}".to_string()
        }
    );
}

#[test]
fn test_faithful_translation_is_clean() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("m.scr");
    fs::write(&file, "fn f(n) {\n    tf(\"Hello %s\", n)\n    t(\"Bye\")\n}\n").unwrap();
    extract(dir.path(), &[file.clone()]);

    let module = module_name(&file);
    scriptloc::create_locale(&dir.path().join("trans"), "en", "fr").unwrap();

    let fr_path = catalog_path(&dir.path().join("trans"), "fr", &module);
    let mut fr = ModuleCatalog::load(&fr_path).unwrap().unwrap();
    fr.rows[0].value = "Bonjour {1}".to_string();
    // second row stays untranslated; that is not a violation
    fr.save(&fr_path).unwrap();

    let store = Store::new(dir.path().join("trans"), "en");
    assert!(check_locale(&store, "fr").unwrap().is_empty());
}

#[test]
fn test_check_all_covers_every_locale() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("m.scr");
    fs::write(&file, "fn f(n) {\n    tf(\"Hi %s\", n)\n}\n").unwrap();
    extract(dir.path(), &[file.clone()]);

    let module = module_name(&file);
    let trans = dir.path().join("trans");
    for locale in ["de", "fr"] {
        scriptloc::create_locale(&trans, "en", locale).unwrap();
        let path = catalog_path(&trans, locale, &module);
        let mut catalog = ModuleCatalog::load(&path).unwrap().unwrap();
        catalog.rows[0].value = "Hallo".to_string(); // placeholder dropped
        catalog.save(&path).unwrap();
    }

    let store = Store::new(trans, "en");
    let violations = check_all(&store).unwrap();
    assert_eq!(violations.len(), 2);
    let locales: Vec<&str> = violations.iter().map(|v| v.locale.as_str()).collect();
    assert!(locales.contains(&"de"));
    assert!(locales.contains(&"fr"));
}
