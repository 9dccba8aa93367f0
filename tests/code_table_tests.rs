//! Tests for code table loading, priority and selection
use std::fs;

use gctk::codes::{CodeRegistry, TablePriority};
use gctk::interpreter::{interpret, InterpreterOptions};
use gctk::{Code, SemanticWarning};
use tempfile::TempDir;

const LASER_TABLE: &str = r#"
[table]
name = "laser"
version = "0.1"
description = "Laser cutter subset"

[[codes]]
name = "G0"
parameters = [{ name = "X" }, { name = "Y" }]

[[codes]]
name = "G01"
parameters = [{ name = "X" }, { name = "Y" }, { name = "F" }]

[[codes]]
name = "M3"
parameters = [{ name = "S", type = "int", constraints = { min_value = 0.0, max_value = 1000.0 } }]

[[codes]]
name = "M5"

[[codes]]
name = "M2"
"#;

fn write_table(dir: &TempDir, file: &str, content: &str) {
    fs::write(dir.path().join(file), content).expect("write table");
}

#[test]
fn test_load_directory() {
    let dir = TempDir::new().expect("temp dir");
    write_table(&dir, "laser.toml", LASER_TABLE);
    write_table(&dir, "broken.toml", "[table\nname = ");
    write_table(&dir, "notes.txt", "not a table");

    let mut registry = CodeRegistry::with_builtin();
    let loaded = registry
        .load_directory(dir.path(), TablePriority::UserGlobal)
        .expect("load directory");

    // The broken file is skipped, the text file ignored
    assert_eq!(loaded, 1);
    assert_eq!(registry.list_tables(), vec!["core", "laser"]);

    let laser = registry.get("laser").expect("laser table");
    assert_eq!(laser.priority, TablePriority::UserGlobal);
    assert_eq!(
        laser.source_path.as_deref(),
        Some(dir.path().join("laser.toml").as_path())
    );
    assert!(laser.table.contains("G1"));
}

#[test]
fn test_missing_directory_is_empty() {
    let dir = TempDir::new().expect("temp dir");
    let mut registry = CodeRegistry::new();
    let loaded = registry
        .load_directory(&dir.path().join("absent"), TablePriority::Workspace)
        .expect("load directory");
    assert_eq!(loaded, 0);
}

#[test]
fn test_workspace_overrides_user_table() {
    let user = TempDir::new().expect("temp dir");
    let workspace = TempDir::new().expect("temp dir");
    write_table(&user, "laser.toml", LASER_TABLE);
    write_table(
        &workspace,
        "laser.toml",
        "[table]\nname = \"laser\"\nversion = \"2.0\"\n\n[[codes]]\nname = \"G0\"\n",
    );

    let mut registry = CodeRegistry::with_builtin();
    registry
        .load_directory(workspace.path(), TablePriority::Workspace)
        .expect("load workspace");
    registry
        .load_directory(user.path(), TablePriority::UserGlobal)
        .expect("load user");

    let laser = registry.get("laser").expect("laser table");
    assert_eq!(laser.priority, TablePriority::Workspace);
    assert_eq!(laser.table.version.as_deref(), Some("2.0"));
}

#[test]
fn test_select_by_path() {
    let dir = TempDir::new().expect("temp dir");
    write_table(&dir, "laser.toml", LASER_TABLE);

    let mut registry = CodeRegistry::with_builtin();
    let path = dir.path().join("laser.toml");
    registry
        .select(path.to_str().expect("utf-8 path"))
        .expect("select table file");
    assert_eq!(registry.active().expect("active").name, "laser");
}

#[test]
fn test_modeline_selects_table() {
    let dir = TempDir::new().expect("temp dir");
    write_table(&dir, "laser.toml", LASER_TABLE);

    let mut registry = CodeRegistry::with_builtin();
    registry
        .load_directory(dir.path(), TablePriority::Workspace)
        .expect("load directory");

    let program = "; gctk_codes=laser\nG0 X1\nM3 S2000\nG2 X2 Y2 I1\nM2\n";
    let name = registry.detect_modeline_table(program).expect("modeline");
    assert!(registry.set_active(&name));

    let options = InterpreterOptions::with_table(registry.active().expect("active").clone());
    let result = interpret(program, &options);
    let warnings: Vec<_> = result
        .diagnostics
        .warnings()
        .map(|d| (d.line, d.kind.clone()))
        .collect();

    assert_eq!(warnings.len(), 2);
    assert_eq!(warnings[0].0, 3);
    assert!(matches!(
        &warnings[0].1,
        gctk::ErrorKind::Semantic(SemanticWarning::InvalidParameter { code, .. }) if code == "M3"
    ));
    assert_eq!(
        warnings[1],
        (
            4,
            gctk::ErrorKind::Semantic(SemanticWarning::UnrecognizedCode {
                code: "G2".to_string()
            })
        )
    );
}

#[test]
fn test_core_table_classification() {
    let table = gctk::CodeTable::core();
    let statement = gctk::parse_line("G59.2").unwrap().unwrap();
    let command = gctk::classify(statement, &table).unwrap();
    assert_eq!(command.codes, vec![Code::WorkCoordinates(8)]);
}
