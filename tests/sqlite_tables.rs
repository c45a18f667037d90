//! Tables over an in-memory SQLite engine

use serde_json::json;
use tenant_tables::{
    AdminTable, Column, Condition, DatabaseConfig, IdPolicy, LogTable, QueryOptions, Row,
    SqliteEngine, TableError, Tenant, TenantTable,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn values(value: serde_json::Value) -> Row {
    value.as_object().unwrap().clone()
}

async fn clusters() -> anyhow::Result<TenantTable<SqliteEngine>> {
    init_tracing();
    let engine = SqliteEngine::connect(&DatabaseConfig::in_memory()).await?;
    let table = TenantTable::new(
        engine,
        "clusters",
        vec![
            Column::text("name", 64),
            Column::text("api_key", 64).hidden(),
        ],
    )?;
    table.init().await?;
    Ok(table)
}

fn cluster(name: &str) -> Row {
    values(json!({"name": name, "api_key": "k-123"}))
}

#[tokio::test]
async fn added_row_is_visible_only_to_its_tenant() -> anyhow::Result<()> {
    let table = clusters().await?;
    let owner = Tenant::new("u1", "p1");

    let mut row = cluster("x");
    row.insert("owner_id".into(), json!("u9"));
    row.insert("project_id".into(), json!("p9"));
    let stored = table.add(row, &owner).await?;

    let id = stored["id"].as_str().unwrap().to_string();
    assert_eq!(id.len(), 36);
    assert_eq!(id, id.to_lowercase());

    let mine = table.get_all(vec![], &owner, QueryOptions::user()).await?;
    assert_eq!(mine.len(), 1);
    assert_eq!(mine.rows[0]["name"], "x");
    assert_eq!(mine.rows[0]["owner_id"], "u1");

    for other in [Tenant::new("u2", "p1"), Tenant::new("u1", "p2"), Tenant::new("u9", "p9")] {
        let theirs = table.get_all(vec![], &other, QueryOptions::user()).await?;
        assert!(theirs.is_empty(), "{other:?} must not see the row");
        let single = table
            .get(vec![Condition::eq("id", id.as_str())], &other, QueryOptions::user())
            .await?;
        assert!(single.is_none());
    }

    let admin = table
        .get_all(vec![], &Tenant::new("root", "any"), QueryOptions::admin())
        .await?;
    assert_eq!(admin.len(), 1);
    Ok(())
}

#[tokio::test]
async fn get_all_returns_rows_in_insertion_order() -> anyhow::Result<()> {
    let table = clusters().await?;
    let tenant = Tenant::new("u1", "p1");
    for name in ["first", "second", "third"] {
        table.add(cluster(name), &tenant).await?;
    }

    let rows = table.get_all(vec![], &tenant, QueryOptions::user()).await?;
    let names: Vec<_> = rows.iter().map(|r| r["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["first", "second", "third"]);
    assert_eq!(rows.columns, ["id", "project_id", "owner_id", "visibility", "name"]);
    Ok(())
}

#[tokio::test]
async fn hidden_columns_require_show_hidden() -> anyhow::Result<()> {
    let table = clusters().await?;
    let tenant = Tenant::new("u1", "p1");
    table.add(cluster("x"), &tenant).await?;
    let by_name = || vec![Condition::eq("name", "x")];

    let plain = table.get(by_name(), &tenant, QueryOptions::user()).await?.unwrap();
    assert!(!plain.contains_key("api_key"));
    let all = table.get_all(by_name(), &tenant, QueryOptions::user()).await?;
    assert!(!all.rows[0].contains_key("api_key"));

    let options = QueryOptions::user().with_hidden();
    let full = table.get(by_name(), &tenant, options).await?.unwrap();
    assert_eq!(full["api_key"], "k-123");
    let all = table.get_all(by_name(), &tenant, options).await?;
    assert_eq!(all.rows[0]["api_key"], "k-123");
    assert!(all.columns.iter().any(|c| c == "api_key"));
    Ok(())
}

#[tokio::test]
async fn delete_then_get_reports_not_found() -> anyhow::Result<()> {
    let table = clusters().await?;
    let tenant = Tenant::new("u1", "p1");
    let stored = table.add(cluster("x"), &tenant).await?;
    let by_id = || vec![Condition::eq("id", stored["id"].clone())];

    // Another tenant's delete matches nothing
    let removed = table
        .delete(by_id(), &Tenant::new("u2", "p1"), QueryOptions::user())
        .await?;
    assert_eq!(removed, 0);

    let removed = table.delete(by_id(), &tenant, QueryOptions::user()).await?;
    assert_eq!(removed, 1);
    assert!(table.get(by_id(), &tenant, QueryOptions::user()).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn update_is_scoped_to_the_caller() -> anyhow::Result<()> {
    let table = clusters().await?;
    let owner = Tenant::new("u1", "p1");
    table.add(cluster("x"), &owner).await?;
    let by_name = |name: &str| vec![Condition::eq("name", name)];

    let changed = table
        .update(
            values(json!({"name": "hijacked"})),
            by_name("x"),
            &Tenant::new("u2", "p1"),
            QueryOptions::user(),
        )
        .await?;
    assert_eq!(changed, 0);

    let changed = table
        .update(
            values(json!({"name": "y", "visibility": "public"})),
            by_name("x"),
            &owner,
            QueryOptions::user(),
        )
        .await?;
    assert_eq!(changed, 1);

    let row = table.get(by_name("y"), &owner, QueryOptions::user()).await?.unwrap();
    assert_eq!(row["visibility"], "public");
    Ok(())
}

#[tokio::test]
async fn invalid_rows_are_rejected_before_insert() -> anyhow::Result<()> {
    let table = clusters().await?;
    let tenant = Tenant::new("u1", "p1");

    let err = table.add(values(json!({"name": "x"})), &tenant).await.unwrap_err();
    assert!(matches!(err, TableError::MissingField(c) if c == "api_key"));

    let mut unknown = cluster("x");
    unknown.insert("color".into(), json!("red"));
    let err = table.add(unknown, &tenant).await.unwrap_err();
    assert!(matches!(err, TableError::UnknownColumn { column, .. } if column == "color"));

    let mut bad_visibility = cluster("x");
    bad_visibility.insert("visibility".into(), json!("everyone"));
    let err = table.add(bad_visibility, &tenant).await.unwrap_err();
    assert!(matches!(err, TableError::InvalidVisibility(_)));

    let err = table
        .get(vec![Condition::eq("name; --", "x")], &tenant, QueryOptions::user())
        .await
        .unwrap_err();
    assert!(err.is_validation());

    assert!(table.get_all(vec![], &tenant, QueryOptions::admin()).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn id_policy_controls_caller_supplied_ids() -> anyhow::Result<()> {
    let generated = clusters().await?;
    let tenant = Tenant::new("u1", "p1");
    let supplied = "00000000-0000-4000-8000-000000000001";

    let mut row = cluster("x");
    row.insert("id".into(), json!(supplied));
    let stored = generated.add(row.clone(), &tenant).await?;
    assert_ne!(stored["id"], supplied);

    let keeping = clusters().await?.with_id_policy(IdPolicy::KeepSupplied);
    let stored = keeping.add(row.clone(), &tenant).await?;
    assert_eq!(stored["id"], supplied);

    // Same id again violates the primary key
    let err = keeping.add(row, &tenant).await.unwrap_err();
    assert!(matches!(err, TableError::Database(_)));
    assert!(!err.is_validation());
    Ok(())
}

#[tokio::test]
async fn empty_supplied_id_is_replaced() -> anyhow::Result<()> {
    let table = clusters().await?.with_id_policy(IdPolicy::KeepSupplied);
    let tenant = Tenant::new("u1", "p1");

    let mut row = cluster("x");
    row.insert("id".into(), json!(""));
    let first = table.add(row.clone(), &tenant).await?;
    let second = table.add(row, &tenant).await?;

    assert_eq!(first["id"].as_str().map(str::len), Some(36));
    assert_ne!(first["id"], second["id"]);
    Ok(())
}

#[tokio::test]
async fn keyword_identifiers_are_quoted() -> anyhow::Result<()> {
    init_tracing();
    let engine = SqliteEngine::in_memory().await?;
    let table = TenantTable::new(
        engine.clone(),
        "group",
        vec![Column::text("order", 10), Column::integer("select")],
    )?;
    table.init().await?;
    let tenant = Tenant::new("u1", "p1");

    table
        .add(values(json!({"order": "asc", "select": 1})), &tenant)
        .await?;
    let by_order = || vec![Condition::eq("order", "asc")];
    let changed = table
        .update(values(json!({"select": 2})), by_order(), &tenant, QueryOptions::user())
        .await?;
    assert_eq!(changed, 1);

    let row = table.get(by_order(), &tenant, QueryOptions::user()).await?.unwrap();
    assert_eq!(row["select"], 2);
    assert_eq!(table.delete(by_order(), &tenant, QueryOptions::user()).await?, 1);

    let log = LogTable::new(engine, "order", vec![])?;
    log.init().await?;
    log.add(Row::new()).await?;
    assert_eq!(log.get_all(vec![], QueryOptions::user()).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn admin_table_crud() -> anyhow::Result<()> {
    init_tracing();
    let engine = SqliteEngine::in_memory().await?;
    let table = AdminTable::new(
        engine,
        "templates",
        vec![Column::integer("version"), Column::text("token", 32).hidden()],
    )?;
    table.init().await?;

    let stored = table
        .add(values(json!({"name": "base", "creator_id": "admin", "version": 1, "token": "t"})))
        .await?;
    let id = stored["id"].as_str().unwrap().to_string();
    assert_eq!(id.len(), 36);

    let by_id = || vec![Condition::eq("id", id.as_str())];
    let changed = table.update(values(json!({"version": 2})), by_id()).await?;
    assert_eq!(changed, 1);

    let row = table.get(by_id(), QueryOptions::user()).await?.unwrap();
    assert_eq!(row["version"], 2);
    assert_eq!(row["creator_id"], "admin");
    assert!(!row.contains_key("token"));
    let row = table.get(by_id(), QueryOptions::user().with_hidden()).await?.unwrap();
    assert_eq!(row["token"], "t");

    table
        .add(values(json!({
            "id": "fixed",
            "name": "other",
            "creator_id": "admin",
            "version": 1,
            "token": "u",
        })))
        .await?;
    assert_eq!(table.get_all(vec![], QueryOptions::user()).await?.len(), 2);
    let fixed = vec![Condition::eq("id", "fixed")];
    assert!(table.get(fixed, QueryOptions::user()).await?.is_some());

    assert_eq!(table.delete(by_id()).await?, 1);
    assert!(table.get(by_id(), QueryOptions::user()).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn log_table_stamps_timestamps() -> anyhow::Result<()> {
    init_tracing();
    let engine = SqliteEngine::in_memory().await?;
    let table = LogTable::new(engine, "audit_log", vec![Column::text("message", 256)])?;
    table.init().await?;
    assert!(table.schema().primary_key().is_none());

    let stored = table.add(values(json!({"message": "started"}))).await?;
    let timestamp = stored["timestamp"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());

    table
        .add(values(json!({"timestamp": "2021-01-01T00:00:00Z", "message": "imported"})))
        .await?;

    let entries = table.get_all(vec![], QueryOptions::user()).await?;
    let messages: Vec<_> = entries.iter().map(|r| r["message"].as_str().unwrap()).collect();
    assert_eq!(messages, ["started", "imported"]);
    assert_eq!(entries.rows[1]["timestamp"], "2021-01-01T00:00:00Z");
    Ok(())
}

#[tokio::test]
async fn log_table_hides_hidden_columns_by_default() -> anyhow::Result<()> {
    init_tracing();
    let engine = SqliteEngine::in_memory().await?;
    let table = LogTable::new(engine, "login_log", vec![Column::text("secret", 10).hidden()])?;
    table.init().await?;
    table.add(values(json!({"secret": "pw"}))).await?;

    let plain = table.get_all(vec![], QueryOptions::user()).await?;
    assert_eq!(plain.columns, ["timestamp"]);
    assert!(!plain.rows[0].contains_key("secret"));

    let full = table.get_all(vec![], QueryOptions::user().with_hidden()).await?;
    assert_eq!(full.rows[0]["secret"], "pw");
    Ok(())
}

#[tokio::test]
async fn file_database_is_created_on_connect() -> anyhow::Result<()> {
    init_tracing();
    let dir = std::env::temp_dir().join(format!("tenant-tables-{}", tenant_tables::generate_id()));
    let config = DatabaseConfig {
        path: dir.join("nested").join("tables.db").to_string_lossy().into_owned(),
        max_connections: 2,
    };

    let engine = SqliteEngine::connect(&config).await?;
    let table = LogTable::new(engine.clone(), "events", vec![])?;
    table.init().await?;
    table.add(Row::new()).await?;
    assert_eq!(table.get_all(vec![], QueryOptions::user()).await?.len(), 1);

    engine.pool().close().await;
    assert!(std::path::Path::new(&config.path).exists());
    std::fs::remove_dir_all(&dir)?;
    Ok(())
}
