//! Integration tests exercising the full prepare → body → cleanup cycle.

use dbtest::fixtures::{self, sample_server};
use dbtest::logging::init_test_logging;
use dbtest::prelude::*;
use memdb::MemoryServer;
use pretty_assertions::assert_eq;

#[test]
fn tracked_user_is_gone_in_the_next_test() {
    init_test_logging();
    let server = sample_server();

    {
        let mut case = CaseGuard::begin(&server, Config::default()).unwrap();
        case.insert_tracked("users", criteria! { "id" => 1, "name" => "Ann" })
            .unwrap();
        case.assert_present("users", &criteria! { "id" => 1 }).unwrap();
    }

    let mut next = CaseGuard::begin(&server, Config::builder().refresh(false).build()).unwrap();
    next.assert_absent("users", &criteria! { "id" => 1 }).unwrap();
}

#[test]
fn pending_orders_are_counted() {
    init_test_logging();
    let server = sample_server();
    let mut case =
        CaseGuard::begin(&server, Config::builder().seed("DatabaseSeeder").build()).unwrap();

    case.assert_row_count(0, "orders", &criteria! { "status" => "pending" })
        .unwrap();
    case.insert_tracked("orders", criteria! { "id" => 5, "status" => "pending" })
        .unwrap();
    case.assert_row_count(1, "orders", &criteria! { "status" => "pending" })
        .unwrap();

    case.finish().unwrap();
    assert_eq!(server.rows("tests", "orders").unwrap().len(), 3);
}

#[test]
fn missing_seed_fails_before_the_body() {
    init_test_logging();
    let server = sample_server();
    let err = assert_error_contains(
        CaseGuard::begin(&server, Config::builder().seed("GhostSeeder").build()),
        "GhostSeeder",
    );

    assert!(matches!(err, DbError::Seed(_)));
    insta::assert_snapshot!(
        err.to_string(),
        @"seed: seed 'GhostSeeder' not found in 'tests/_support/_database/seeds'"
    );
}

#[test]
fn broken_migrations_fail_prepare_verbatim() {
    let server = MemoryServer::new();
    server.register_migrations(
        "tests/_support/_database/migrations",
        vec![
            fixtures::schemas::create_users(),
            fixtures::schemas::create_users(),
        ],
    );

    let err = CaseGuard::begin(&server, Config::default()).err().unwrap();
    assert_eq!(
        err.to_string(),
        "migration: duplicate migration version 1 (create_users and create_users)"
    );
}

#[test]
fn unknown_group_is_a_configuration_error() {
    let server = sample_server();
    let err = TestContext::new(&server, Config::builder().group("reporting").build())
        .err()
        .unwrap();
    assert!(matches!(err, DbError::Configuration(_)));
}

#[test]
fn reset_ignores_what_earlier_tests_left_behind() {
    let server = sample_server();

    {
        let mut dirty = CaseGuard::begin(&server, Config::default()).unwrap();
        // Untracked rows survive cleanup...
        dirty
            .db()
            .insert("users", &criteria! { "id" => 77, "name" => "Leftover" })
            .unwrap();
    }
    assert_eq!(server.rows("tests", "users").unwrap().len(), 1);

    // ...but the next refresh starts from the migrated, empty schema.
    for _ in 0..2 {
        let mut case = CaseGuard::begin(&server, Config::default()).unwrap();
        assert_eq!(case.schema_version(), fixtures::LATEST_VERSION);
        case.assert_row_count(0, "users", &criteria! {}).unwrap();
        assert_eq!(
            server.table_names("tests").unwrap(),
            vec!["orders".to_string(), "users".to_string()]
        );
    }
}

#[test]
fn empty_base_path_uses_backend_defaults() {
    let server = sample_server();
    let config = Config::builder().base_path("").seed("UserSeeder").build();
    let mut case = CaseGuard::begin(&server, config).unwrap();
    case.assert_row_count(3, "users", &criteria! {}).unwrap();
}

#[test]
fn fetch_column_reads_seeded_values() {
    let server = sample_server();
    let mut case =
        CaseGuard::begin(&server, Config::builder().seed("UserSeeder").build()).unwrap();

    assert_eq!(
        case.fetch_column("users", "email", &criteria! { "id" => 2 })
            .unwrap(),
        Some(Value::Text("bob@example.com".into()))
    );
    assert_eq!(
        case.fetch_column("users", "email", &criteria! { "id" => 99 })
            .unwrap(),
        None
    );
    assert_error_contains(
        case.fetch_column("users", "nickname", &criteria! { "id" => 2 }),
        "unknown column 'nickname'",
    );
}

#[test]
fn assertion_failures_name_the_table() {
    let server = sample_server();
    let mut case = CaseGuard::begin(&server, Config::default()).unwrap();

    let err = case
        .assert_present("users", &criteria! { "name" => "Nobody" })
        .unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @"row not found in database: table 'users' where name = 'Nobody'"
    );
}

#[test]
fn cleanup_leaves_untracked_rows() {
    let server = sample_server();
    let mut case = CaseGuard::begin(&server, Config::default()).unwrap();

    case.db()
        .insert("orders", &criteria! { "id" => 1, "status" => "paid" })
        .unwrap();
    case.insert_tracked("orders", criteria! { "status" => "paid", "id" => 2 })
        .unwrap();
    case.insert_tracked("orders", criteria! { "id" => 3, "status" => "paid" })
        .unwrap();

    case.finish().unwrap();
    assert_eq!(server.rows("tests", "orders").unwrap().len(), 1);
}

#[test]
fn extra_seed_mid_test_is_not_tracked() {
    let server = sample_server();
    {
        let mut case = CaseGuard::begin(&server, Config::default()).unwrap();
        case.seed("OrderSeeder").unwrap();
        case.assert_row_count(2, "orders", &criteria! { "status" => "paid" })
            .unwrap();
        assert!(case.ledger().is_empty());
    }
    assert_eq!(server.rows("tests", "orders").unwrap().len(), 3);
}

#[test]
fn parallel_workers_use_separate_groups() {
    let server = sample_server();
    server.add_group("tests_worker_2");

    let mut a = CaseGuard::begin(&server, Config::default()).unwrap();
    let mut b =
        CaseGuard::begin(&server, Config::builder().group("tests_worker_2").build()).unwrap();

    a.insert_tracked("users", criteria! { "id" => 1, "name" => "Ann" })
        .unwrap();
    b.assert_absent("users", &criteria! { "id" => 1 }).unwrap();
}

#[test]
fn config_file_drives_the_case() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dbtest.json");
    std::fs::write(
        &path,
        r#"{ "seed": "OrderSeeder", "base_path": "tests/_support/_database/" }"#,
    )
    .unwrap();

    let server = sample_server();
    let config = Config::from_json_file(&path).unwrap();
    let mut case = CaseGuard::begin(&server, config).unwrap();
    case.assert_row_count(2, "orders", &criteria! { "user_id" => 1 })
        .unwrap();
}
