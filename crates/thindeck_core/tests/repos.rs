use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

use rusqlite::Connection;
use thindeck_core::db::{open_db, open_db_in_memory};
use thindeck_core::time::now_epoch_ms;
use thindeck_core::{DyRepos, RepoError, Repos, SqliteRegion};

fn count_named(conn: &Connection, name: &str) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM items i
         JOIN item_attributes a ON a.item_id = i.item_id
         WHERE i.table_name = 'repos' AND a.name = 'name' AND a.value = ?1;",
        [name],
        |row| row.get(0),
    )
    .unwrap()
}

#[test]
fn add_then_get_returns_stamped_repo() {
    let conn = open_db_in_memory().unwrap();
    let repos = DyRepos::new(SqliteRegion::try_new(&conn).unwrap());

    let before = now_epoch_ms();
    let created = repos.add("repo-a").unwrap();
    assert_eq!(created.name, "repo-a");
    assert!(created.updated >= before);

    let fetched = repos.get("repo-a").unwrap();
    assert_eq!(fetched, created);
}

#[test]
fn duplicate_add_is_rejected_and_leaves_one_row() {
    let conn = open_db_in_memory().unwrap();
    let repos = DyRepos::new(SqliteRegion::try_new(&conn).unwrap());

    repos.add("repo-a").unwrap();
    let err = repos.add("repo-a").unwrap_err();

    assert!(matches!(err, RepoError::AlreadyExists(ref name) if name == "repo-a"));
    assert_eq!(count_named(&conn, "repo-a"), 1);
}

#[test]
fn get_missing_name_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repos = DyRepos::new(SqliteRegion::try_new(&conn).unwrap());
    repos.add("present").unwrap();

    let err = repos.get("absent").unwrap_err();
    assert!(matches!(err, RepoError::NotFound(ref name) if name == "absent"));
}

#[test]
fn iterate_yields_each_added_repo_once() {
    let conn = open_db_in_memory().unwrap();
    let repos = DyRepos::new(SqliteRegion::try_new(&conn).unwrap());

    let names: Vec<String> = (0..250).map(|n| format!("repo-{n:03}")).collect();
    for name in &names {
        repos.add(name).unwrap();
    }

    let listed: Vec<String> = repos
        .iterate()
        .map(|repo| repo.unwrap().name)
        .collect();
    assert_eq!(listed.len(), names.len());
    let unique: HashSet<_> = listed.iter().cloned().collect();
    assert_eq!(unique, names.into_iter().collect::<HashSet<_>>());
}

#[test]
fn iterate_is_lazy_and_restartable() {
    let conn = open_db_in_memory().unwrap();
    let repos = DyRepos::new(SqliteRegion::try_new(&conn).unwrap());

    let scan = repos.iterate();
    repos.add("late").unwrap();
    // Nothing was read before the first `next`, so the scan sees `late`.
    assert_eq!(scan.count(), 1);

    repos.add("later").unwrap();
    assert_eq!(repos.iterate().count(), 2);
}

#[test]
fn add_get_duplicate_iterate_scenario() {
    let conn = open_db_in_memory().unwrap();
    let repos = DyRepos::new(SqliteRegion::try_new(&conn).unwrap());

    let created = repos.add("repo-a").unwrap();
    assert_eq!(repos.get("repo-a").unwrap(), created);
    assert!(matches!(
        repos.add("repo-a"),
        Err(RepoError::AlreadyExists(_))
    ));

    let all: Vec<_> = repos.iterate().collect::<Result<_, _>>().unwrap();
    assert_eq!(all, vec![created]);
}

#[test]
fn repos_on_separate_tables_do_not_leak_into_each_other() {
    let conn = open_db_in_memory().unwrap();
    conn.execute("INSERT INTO items (table_name) VALUES ('builds');", [])
        .unwrap();
    let item_id = conn.last_insert_rowid();
    conn.execute(
        "INSERT INTO item_attributes (item_id, name, kind, value) VALUES (?1, 'name', 'S', 'repo-a');",
        [item_id],
    )
    .unwrap();

    let repos = DyRepos::new(SqliteRegion::try_new(&conn).unwrap());
    assert!(matches!(repos.get("repo-a"), Err(RepoError::NotFound(_))));
    repos.add("repo-a").unwrap();
    assert_eq!(repos.iterate().count(), 1);
}

#[test]
fn concurrent_adds_of_same_name_create_one_repo() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("thindeck.db");
    drop(open_db(&path).unwrap());

    const WORKERS: usize = 6;
    let barrier = Arc::new(Barrier::new(WORKERS));
    let handles: Vec<_> = (0..WORKERS)
        .map(|_| {
            let conn = open_db(&path).unwrap();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let repos = DyRepos::new(SqliteRegion::try_new(&conn).unwrap());
                barrier.wait();
                repos.add("contended")
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let created = results.iter().filter(|result| result.is_ok()).count();
    assert_eq!(created, 1);
    assert!(results
        .iter()
        .filter_map(|result| result.as_ref().err())
        .all(|err| matches!(err, RepoError::AlreadyExists(_))));

    let conn = open_db(&path).unwrap();
    assert_eq!(count_named(&conn, "contended"), 1);
}

#[test]
fn one_unreadable_row_does_not_hide_the_rest_of_the_listing() {
    let conn = open_db_in_memory().unwrap();
    let repos = DyRepos::new(SqliteRegion::try_new(&conn).unwrap());
    repos.add("good-1").unwrap();
    repos.add("good-2").unwrap();

    conn.execute("INSERT INTO items (table_name) VALUES ('repos');", [])
        .unwrap();
    let item_id = conn.last_insert_rowid();
    conn.execute(
        "INSERT INTO item_attributes (item_id, name, kind, value)
         VALUES (?1, 'name', 'S', 'decimal-stamp'), (?1, 'updated', 'N', '1.5e12');",
        [item_id],
    )
    .unwrap();
    repos.add("good-3").unwrap();

    let results: Vec<_> = repos.iterate().collect();
    assert_eq!(results.len(), 4);

    let listed: HashSet<String> = results
        .iter()
        .filter_map(|result| result.as_ref().ok())
        .map(|repo| repo.name.clone())
        .collect();
    let expected: HashSet<String> = ["good-1", "good-2", "good-3"]
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(listed, expected);

    let failures: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();
    assert_eq!(failures.len(), 1);
    assert!(matches!(failures[0], RepoError::InvalidData(_)));
    assert!(matches!(
        repos.get("decimal-stamp"),
        Err(RepoError::InvalidData(_))
    ));
}
