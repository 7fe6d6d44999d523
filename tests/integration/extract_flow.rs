//! End-to-end extraction scenarios against real temp trees

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use scriptloc::catalog::{catalog_path, module_name, ModuleCatalog};
use scriptloc::{Config, Extractor, Runtime};

fn config(root: &Path) -> Config {
    Config {
        funcs: vec!["t".to_string(), "notify".to_string()],
        fmt_funcs: vec!["notifyf".to_string()],
        default_locale: "en".to_string(),
        catalog_root: root.join("trans"),
        apply: true,
        ..Config::default()
    }
}

fn extract(root: &Path, paths: &[PathBuf]) {
    let mut extractor = Extractor::new(config(root));
    let report = extractor.extract(paths).unwrap();
    assert!(report.skipped.is_empty(), "skipped: {:?}", report.skipped);
}

fn catalog_for(root: &Path, locale: &str, module: &str) -> ModuleCatalog {
    ModuleCatalog::load(&catalog_path(&root.join("trans"), locale, module))
        .unwrap()
        .unwrap_or_else(|| panic!("no catalog for {}/{}", locale, module))
}

#[test]
fn test_two_identical_calls_one_row() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("m.scr");
    fs::write(&file, "fn greet() {\n    t(\"hello\")\n    t(\"hello\")\n}\n").unwrap();

    extract(dir.path(), &[file.clone()]);

    let module = module_name(&file);
    let key = format!("{}:1", module);

    let catalog = catalog_for(dir.path(), "en", &module);
    assert_eq!(catalog.counter, 1);
    assert_eq!(catalog.rows.len(), 1);
    assert_eq!(catalog.rows[0].id, 1);
    assert_eq!(catalog.rows[0].name, key);
    assert_eq!(catalog.rows[0].value, "hello");

    let source = fs::read_to_string(&file).unwrap();
    let lookup = format!("t(loc.lookup(lang, \"{}\"))", key);
    assert_eq!(source.matches(&lookup).count(), 2);
    assert!(source.contains("import loc"));
    assert!(source.contains(&format!("loc.load(\"{}\")", module)));
    assert!(source.contains("let lang = get_locale()"));
}

#[test]
fn test_second_pass_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("m.scr");
    fs::write(
        &file,
        "fn greet(n) {\n    t(\"hello\")\n    notifyf(\"got %d items\", n)\n}\n",
    )
    .unwrap();

    extract(dir.path(), &[file.clone()]);
    let module = module_name(&file);
    let source_once = fs::read_to_string(&file).unwrap();
    let catalog_once =
        fs::read_to_string(catalog_path(&dir.path().join("trans"), "en", &module)).unwrap();

    extract(dir.path(), &[file.clone()]);
    let source_twice = fs::read_to_string(&file).unwrap();
    let catalog_twice =
        fs::read_to_string(catalog_path(&dir.path().join("trans"), "en", &module)).unwrap();

    assert_eq!(source_once, source_twice);
    assert_eq!(catalog_once, catalog_twice);
    // no duplicated scaffolding either
    assert_eq!(source_twice.matches("let lang = get_locale()").count(), 1);
    assert_eq!(source_twice.matches("loc.load(").count(), 1);
    assert_eq!(source_twice.matches("import loc").count(), 1);
}

#[test]
fn test_new_literal_keeps_old_keys_stable() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("m.scr");
    fs::write(&file, "fn greet() {\n    t(\"hello\")\n}\n").unwrap();

    extract(dir.path(), &[file.clone()]);
    let module = module_name(&file);

    // a later edit adds a call
    let source = fs::read_to_string(&file).unwrap();
    let edited = source.replace(
        "    t(loc.lookup",
        "    t(\"fresh text\")\n    t(loc.lookup",
    );
    fs::write(&file, edited).unwrap();
    extract(dir.path(), &[file.clone()]);

    let catalog = catalog_for(dir.path(), "en", &module);
    assert_eq!(catalog.counter, 2);
    // the original key kept its position and id; the new one was appended
    assert_eq!(catalog.rows[0].name, format!("{}:1", module));
    assert_eq!(catalog.rows[0].value, "hello");
    assert_eq!(catalog.rows[1].name, format!("{}:2", module));
    assert_eq!(catalog.rows[1].value, "fresh text");
}

#[test]
fn test_removed_literal_leaves_placeholder_row() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("m.scr");
    fs::write(&file, "fn greet() {\n    t(\"hello\")\n    t(\"bye\")\n}\n").unwrap();

    extract(dir.path(), &[file.clone()]);
    let module = module_name(&file);

    // drop the second call
    let source = fs::read_to_string(&file).unwrap();
    let key2 = format!("{}:2", module);
    let lookup2 = format!("    t(loc.lookup(lang, \"{}\"))\n", key2);
    fs::write(&file, source.replace(&lookup2, "")).unwrap();
    extract(dir.path(), &[file.clone()]);

    let catalog = catalog_for(dir.path(), "en", &module);
    assert_eq!(catalog.rows.len(), 2);
    assert_eq!(catalog.rows[0].value, "hello");
    assert_eq!(catalog.rows[1].id, -1);
    assert!(catalog.rows[1].name.is_empty());
    assert!(catalog.rows[1].comment.contains(&key2));
    // the id is never reused
    assert_eq!(catalog.counter, 2);
}

#[test]
fn test_formatting_round_trip_through_runtime() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("m.scr");
    fs::write(
        &file,
        "fn report(n, name) {\n    notifyf(\"got %d items for %s\", n, name)\n}\n",
    )
    .unwrap();

    extract(dir.path(), &[file.clone()]);
    let module = module_name(&file);
    let key = format!("{}:1", module);

    let catalog = catalog_for(dir.path(), "en", &module);
    assert_eq!(catalog.rows[0].value, "got {1} items for {2}");

    let source = fs::read_to_string(&file).unwrap();
    assert!(source.contains(&format!(
        "notify(loc.lookup_fmt(lang, \"{}\", {{\"1\": convert.int_str(n), \"2\": name}}))",
        key
    )));
    assert!(source.contains("import convert"));

    let runtime = Runtime::new(dir.path().join("trans"), "en");
    assert_eq!(
        runtime.lookup_fmt("en", &key, &[("1", "3"), ("2", "cat")]),
        "got 3 items for cat"
    );
}

#[test]
fn test_translations_survive_re_extraction() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("m.scr");
    fs::write(&file, "fn greet() {\n    t(\"hello\")\n}\n").unwrap();

    extract(dir.path(), &[file.clone()]);
    let module = module_name(&file);

    // bootstrap french and translate the row
    scriptloc::create_locale(&dir.path().join("trans"), "en", "fr").unwrap();
    let fr_path = catalog_path(&dir.path().join("trans"), "fr", &module);
    let mut fr = ModuleCatalog::load(&fr_path).unwrap().unwrap();
    assert_eq!(fr.rows[0].value, "");
    assert_eq!(fr.rows[0].comment, "hello");
    fr.rows[0].value = "bonjour".to_string();
    fr.save(&fr_path).unwrap();

    extract(dir.path(), &[file.clone()]);

    let fr = ModuleCatalog::load(&fr_path).unwrap().unwrap();
    assert_eq!(fr.rows[0].value, "bonjour");

    let runtime = Runtime::new(dir.path().join("trans"), "en");
    let key = format!("{}:1", module);
    assert_eq!(runtime.lookup("fr", &key), "bonjour");
    assert_eq!(runtime.lookup("de", &key), "hello");
}

#[test]
fn test_directory_input_extracts_all_modules() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("bot");
    fs::create_dir_all(src.join("cmds")).unwrap();
    fs::write(src.join("main.scr"), "fn f() {\n    t(\"one\")\n}\n").unwrap();
    fs::write(
        src.join("cmds/admin.scr"),
        "fn g() {\n    t(\"two\")\n}\n",
    )
    .unwrap();
    // non-script files are ignored
    fs::write(src.join("notes.txt"), "not source").unwrap();

    let mut extractor = Extractor::new(config(dir.path()));
    let report = extractor.extract(&[src.clone()]).unwrap();
    assert_eq!(report.processed.len(), 2);

    let main_module = module_name(&src.join("main.scr"));
    let admin_module = module_name(&src.join("cmds/admin.scr"));
    assert_eq!(catalog_for(dir.path(), "en", &main_module).rows.len(), 1);
    assert_eq!(catalog_for(dir.path(), "en", &admin_module).rows.len(), 1);
}
