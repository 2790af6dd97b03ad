// End-to-end checks against the built binary: stdout carries rows only,
// stderr carries exactly one line on failure.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, Connection, Executor};
use tempfile::TempDir;

// Create a database file with the given schema and rows.
fn seed(dir: &Path, sql: &str) -> PathBuf {
    let path = dir.join("app.db");
    tokio_test::block_on(async {
        let mut conn = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .connect()
            .await
            .unwrap();
        conn.execute(sql).await.unwrap();
        conn.close().await.unwrap();
    });
    path
}

// Run the inspector from `cwd` with the given overrides and a clean log env.
fn inspect(cwd: &Path, vars: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_sqlite_inspector"));
    cmd.current_dir(cwd)
        .env_remove("RUST_LOG")
        .env_remove("INSPECTOR__DATABASE_PATH")
        .env_remove("INSPECTOR__QUERY")
        .env_remove("INSPECTOR__FORMAT");
    for (key, value) in vars {
        cmd.env(key, value);
    }
    cmd.output().unwrap()
}

fn stderr_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stderr)
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn prints_rows_as_json_in_order() {
    let dir = TempDir::new().unwrap();
    let db = seed(
        dir.path(),
        "CREATE TABLE items (name TEXT); INSERT INTO items (name) VALUES ('a'), ('b');",
    );

    let output = inspect(
        dir.path(),
        &[
            ("INSPECTOR__DATABASE_PATH", db.to_str().unwrap()),
            ("INSPECTOR__QUERY", "SELECT name FROM items"),
        ],
    );

    assert!(output.status.success());
    assert!(output.stderr.is_empty());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed, serde_json::json!([{ "name": "a" }, { "name": "b" }]));
}

#[test]
fn row_count_and_keys_match_the_table() {
    let dir = TempDir::new().unwrap();
    let mut sql = String::from("CREATE TABLE events (id INTEGER PRIMARY KEY, kind TEXT, weight REAL);");
    for i in 0..25 {
        sql.push_str(&format!(
            "INSERT INTO events (kind, weight) VALUES ('k{}', {}.5);",
            i, i
        ));
    }
    let db = seed(dir.path(), &sql);

    let output = inspect(
        dir.path(),
        &[
            ("INSPECTOR__DATABASE_PATH", db.to_str().unwrap()),
            ("INSPECTOR__QUERY", "SELECT id, kind, weight FROM events"),
        ],
    );

    assert!(output.status.success());
    let parsed: Vec<serde_json::Map<String, serde_json::Value>> =
        serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed.len(), 25);
    for row in &parsed {
        let mut keys: Vec<&str> = row.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["id", "kind", "weight"]);
    }
}

#[test]
fn missing_file_prints_one_error_and_no_rows() {
    let dir = TempDir::new().unwrap();

    let output = inspect(
        dir.path(),
        &[("INSPECTOR__DATABASE_PATH", "/no/such/file.db")],
    );

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let lines = stderr_lines(&output);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("error:"));
    assert!(lines[0].contains("/no/such/file.db"));
}

#[test]
fn unknown_table_behaves_like_missing_file() {
    let dir = TempDir::new().unwrap();
    let db = seed(dir.path(), "CREATE TABLE items (name TEXT);");

    let output = inspect(
        dir.path(),
        &[
            ("INSPECTOR__DATABASE_PATH", db.to_str().unwrap()),
            ("INSPECTOR__QUERY", "SELECT name FROM missing_table"),
        ],
    );

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let lines = stderr_lines(&output);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("error:"));
    assert!(lines[0].contains("no such table"));
}

#[test]
fn repeated_runs_are_byte_identical() {
    let dir = TempDir::new().unwrap();
    let db = seed(
        dir.path(),
        "CREATE TABLE items (name TEXT, qty INTEGER); \
         INSERT INTO items VALUES ('bolt', 4), ('nut', NULL), ('gear', 12);",
    );
    let vars = [
        ("INSPECTOR__DATABASE_PATH", db.to_str().unwrap()),
        ("INSPECTOR__QUERY", "SELECT name, qty FROM items"),
        ("INSPECTOR__FORMAT", "records"),
    ];

    let first = inspect(dir.path(), &vars);
    let second = inspect(dir.path(), &vars);

    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
    assert_eq!(
        String::from_utf8(first.stdout).unwrap(),
        "[1]\n  name: bolt\n  qty: 4\n[2]\n  name: nut\n  qty: NULL\n[3]\n  name: gear\n  qty: 12\n"
    );
}

#[test]
fn settings_file_in_working_directory_is_used() {
    let dir = TempDir::new().unwrap();
    let db = seed(
        dir.path(),
        "CREATE TABLE items (name TEXT); INSERT INTO items (name) VALUES ('only');",
    );
    std::fs::write(
        dir.path().join("Inspector.toml"),
        format!(
            "database_path = {:?}\nquery = \"SELECT name FROM items\"\nformat = \"records\"\n",
            db.to_str().unwrap()
        ),
    )
    .unwrap();

    let output = inspect(dir.path(), &[]);

    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "[1]\n  name: only\n");
}

#[test]
fn invalid_settings_are_reported_once() {
    let dir = TempDir::new().unwrap();

    let output = inspect(dir.path(), &[("INSPECTOR__FORMAT", "xml")]);

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let lines = stderr_lines(&output);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("error:"));
}
