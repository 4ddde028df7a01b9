use rusqlite::Connection;
use thindeck_core::db::migrations::latest_version;
use thindeck_core::db::{open_db, open_db_in_memory, DbError};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "items");
    assert_table_exists(&conn, "item_attributes");
}

#[test]
fn reopening_a_store_file_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("thindeck.db");

    drop(open_db(&path).unwrap());
    let conn = open_db(&path).unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "items");
}

#[test]
fn newer_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 42;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 42);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn attribute_kind_is_constrained() {
    let conn = open_db_in_memory().unwrap();
    conn.execute("INSERT INTO items (table_name) VALUES ('repos');", [])
        .unwrap();
    let item_id = conn.last_insert_rowid();

    let result = conn.execute(
        "INSERT INTO item_attributes (item_id, name, kind, value) VALUES (?1, 'blob', 'B', 'AA==');",
        [item_id],
    );
    assert!(result.is_err());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1);",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "expected table `{table_name}` to exist");
}
