use anyhow::{Context, Result};
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use chrono::Utc;
use serde_json::json;
use sqlx::SqlitePool;
use tempfile::tempdir;
use tower::util::ServiceExt;
use uuid::Uuid;

use backoffice::create_app;
use backoffice::models::menu::menu_types;
use backoffice::models::user::roles;
use backoffice::utils::hash_password;

async fn make_pool(path: &std::path::Path) -> Result<SqlitePool> {
    use sqlx::sqlite::SqliteConnectOptions;
    let opts = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(opts).await?;

    let migrator = sqlx::migrate::Migrator::new(
        std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations"),
    )
    .await?;
    migrator.run(&pool).await?;

    Ok(pool)
}

async fn insert_user(
    pool: &SqlitePool,
    name: &str,
    email: &str,
    password: &str,
    role: &str,
) -> Result<Uuid> {
    let id = Uuid::new_v4();
    let now = Utc::now();
    let password_hash = hash_password(password).map_err(|err| anyhow::anyhow!("{err}"))?;

    sqlx::query(
        "INSERT INTO users (id, name, email, password_hash, role, banned, two_factor_enabled, created_at, updated_at) VALUES (?, ?, ?, ?, ?, 0, 0, ?, ?)",
    )
    .bind(id)
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(id)
}

async fn login(app: &axum::Router, email: &str, password: &str) -> Result<String> {
    let req = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header("content-type", "application/json")
        .body(Body::from(json!({"email": email, "password": password}).to_string()))?;

    let resp: Response = app.clone().oneshot(req).await?;
    let body_bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
    let auth_res: serde_json::Value = serde_json::from_slice(&body_bytes)?;
    Ok(auth_res
        .get("token")
        .and_then(|v| v.as_str())
        .context("missing token")?
        .to_string())
}

async fn post_json(
    app: &axum::Router,
    token: &str,
    uri: &str,
    payload: serde_json::Value,
) -> Result<serde_json::Value> {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::from(payload.to_string()))?;

    let resp: Response = app.clone().oneshot(req).await?;
    let status = resp.status();
    let body_bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
    if !status.is_success() {
        panic!("POST {} failed: {} - {}", uri, status, String::from_utf8_lossy(&body_bytes));
    }
    if body_bytes.is_empty() {
        return Ok(serde_json::Value::Null);
    }
    Ok(serde_json::from_slice(&body_bytes)?)
}

async fn get_json(app: &axum::Router, token: &str, uri: &str) -> Result<serde_json::Value> {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())?;

    let resp: Response = app.clone().oneshot(req).await?;
    let status = resp.status();
    let body_bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
    if status != StatusCode::OK {
        panic!("GET {} failed: {} - {}", uri, status, String::from_utf8_lossy(&body_bytes));
    }
    Ok(serde_json::from_slice(&body_bytes)?)
}

fn id_of(value: &serde_json::Value) -> String {
    value.get("id").and_then(|v| v.as_str()).expect("missing id").to_string()
}

#[tokio::test]
async fn admin_view_keeps_unassigned_user_view_does_not() -> Result<()> {
    let dir = tempdir().context("failed to create tempdir")?;
    let pool = make_pool(&dir.path().join("test.db")).await?;
    let app = create_app(pool.clone()).await?;

    let user_id =
        insert_user(&pool, "Ada", "ada@example.com", "password123", roles::USER).await?;
    insert_user(&pool, "Root", "root@example.com", "password123", roles::ADMIN).await?;
    let admin = login(&app, "root@example.com", "password123").await?;
    let user = login(&app, "ada@example.com", "password123").await?;

    let category = post_json(
        &app,
        &admin,
        "/admin/permissions/categories",
        json!({"title": "Invoicing"}),
    )
    .await?;
    let granted_item = post_json(
        &app,
        &admin,
        "/admin/permissions/items",
        json!({"category_id": id_of(&category), "title": "invoice.view"}),
    )
    .await?;
    let ungranted_item = post_json(
        &app,
        &admin,
        "/admin/permissions/items",
        json!({"category_id": id_of(&category), "title": "invoice.approve"}),
    )
    .await?;

    post_json(
        &app,
        &admin,
        &format!(
            "/admin/users/{}/assignments/permission-items/{}",
            user_id,
            id_of(&granted_item)
        ),
        json!({}),
    )
    .await?;

    // admin view: both rows present, flags differ
    let view = get_json(&app, &admin, &format!("/admin/users/{}/permissions", user_id)).await?;
    let rows = view.as_array().context("expected array")?;
    assert_eq!(rows.len(), 2);

    let find = |id: &str| {
        rows.iter()
            .find(|r| r.get("id").and_then(|v| v.as_str()) == Some(id))
            .expect("row missing")
    };
    let granted = find(&id_of(&granted_item));
    assert_eq!(granted.get("is_assigned").and_then(|v| v.as_bool()), Some(true));
    assert_eq!(granted.get("is_effective_active").and_then(|v| v.as_bool()), Some(true));
    assert!(granted.get("assignment_id").is_some());

    let ungranted = find(&id_of(&ungranted_item));
    assert_eq!(ungranted.get("is_assigned").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(
        ungranted.get("is_effective_active").and_then(|v| v.as_bool()),
        Some(false)
    );

    // user view: only the granted row
    let own = get_json(&app, &user, "/me/permissions").await?;
    let own_rows = own.as_array().context("expected array")?;
    assert_eq!(own_rows.len(), 1);
    assert_eq!(
        own_rows[0].get("id").and_then(|v| v.as_str()),
        Some(id_of(&granted_item).as_str())
    );

    // a target user that does not exist yields an empty view, not an error
    let missing = get_json(
        &app,
        &admin,
        &format!("/admin/users/{}/permissions", Uuid::new_v4()),
    )
    .await?;
    assert!(missing.as_array().context("expected array")?.is_empty());

    Ok(())
}

#[tokio::test]
async fn deactivation_forces_effective_false_regardless_of_assignment() -> Result<()> {
    let dir = tempdir().context("failed to create tempdir")?;
    let pool = make_pool(&dir.path().join("test.db")).await?;
    let app = create_app(pool.clone()).await?;

    let user_id =
        insert_user(&pool, "Ada", "ada@example.com", "password123", roles::USER).await?;
    insert_user(&pool, "Root", "root@example.com", "password123", roles::ADMIN).await?;
    let admin = login(&app, "root@example.com", "password123").await?;
    let user = login(&app, "ada@example.com", "password123").await?;

    let category = post_json(
        &app,
        &admin,
        "/admin/permissions/categories",
        json!({"title": "Reports"}),
    )
    .await?;
    let item = post_json(
        &app,
        &admin,
        "/admin/permissions/items",
        json!({"category_id": id_of(&category), "title": "report.export"}),
    )
    .await?;

    post_json(
        &app,
        &admin,
        &format!(
            "/admin/users/{}/assignments/permission-items/{}",
            user_id,
            id_of(&item)
        ),
        json!({}),
    )
    .await?;

    // item inactive: assignment survives but effectiveness dies
    post_json(
        &app,
        &admin,
        &format!("/admin/permissions/items/{}/toggle", id_of(&item)),
        json!({"is_active": false}),
    )
    .await?;

    let view = get_json(&app, &admin, &format!("/admin/users/{}/permissions", user_id)).await?;
    let row = &view.as_array().context("expected array")?[0];
    assert_eq!(row.get("is_assigned").and_then(|v| v.as_bool()), Some(true));
    assert_eq!(row.get("is_effective_active").and_then(|v| v.as_bool()), Some(false));

    let own = get_json(&app, &user, "/me/permissions").await?;
    assert!(own.as_array().context("expected array")?.is_empty());

    // item back on, parent category off: the parent veto applies
    post_json(
        &app,
        &admin,
        &format!("/admin/permissions/items/{}/toggle", id_of(&item)),
        json!({"is_active": true}),
    )
    .await?;
    post_json(
        &app,
        &admin,
        &format!("/admin/permissions/categories/{}/toggle", id_of(&category)),
        json!({"is_active": false}),
    )
    .await?;

    let view = get_json(&app, &admin, &format!("/admin/users/{}/permissions", user_id)).await?;
    let row = &view.as_array().context("expected array")?[0];
    assert_eq!(row.get("is_active").and_then(|v| v.as_bool()), Some(true));
    assert_eq!(
        row.get("is_effective_active").and_then(|v| v.as_bool()),
        Some(false),
        "inactive parent category must veto the item"
    );

    Ok(())
}

#[tokio::test]
async fn duplicate_grant_is_idempotent() -> Result<()> {
    let dir = tempdir().context("failed to create tempdir")?;
    let pool = make_pool(&dir.path().join("test.db")).await?;
    let app = create_app(pool.clone()).await?;

    let user_id =
        insert_user(&pool, "Ada", "ada@example.com", "password123", roles::USER).await?;
    insert_user(&pool, "Root", "root@example.com", "password123", roles::ADMIN).await?;
    let admin = login(&app, "root@example.com", "password123").await?;

    let category = post_json(
        &app,
        &admin,
        "/admin/permissions/categories",
        json!({"title": "Sales"}),
    )
    .await?;
    let item = post_json(
        &app,
        &admin,
        "/admin/permissions/items",
        json!({"category_id": id_of(&category), "title": "sales.view"}),
    )
    .await?;

    let grant_uri = format!(
        "/admin/users/{}/assignments/permission-items/{}",
        user_id,
        id_of(&item)
    );
    let first = post_json(&app, &admin, &grant_uri, json!({})).await?;
    let second = post_json(&app, &admin, &grant_uri, json!({})).await?;

    // same underlying row both times, and only one row in the table
    assert_eq!(first.get("id"), second.get("id"));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM user_permission_items")
        .fetch_one(&pool)
        .await?;
    assert_eq!(count, 1);

    Ok(())
}

#[tokio::test]
async fn auto_assign_grants_active_entries_once() -> Result<()> {
    let dir = tempdir().context("failed to create tempdir")?;
    let pool = make_pool(&dir.path().join("test.db")).await?;
    let app = create_app(pool.clone()).await?;

    let user_id =
        insert_user(&pool, "Ada", "ada@example.com", "password123", roles::USER).await?;
    insert_user(&pool, "Root", "root@example.com", "password123", roles::ADMIN).await?;
    let admin = login(&app, "root@example.com", "password123").await?;
    let user = login(&app, "ada@example.com", "password123").await?;

    let category = post_json(
        &app,
        &admin,
        "/admin/permissions/categories",
        json!({"title": "Everything"}),
    )
    .await?;
    let mut item_ids = Vec::new();
    for title in ["a.one", "a.two", "a.three"] {
        let item = post_json(
            &app,
            &admin,
            "/admin/permissions/items",
            json!({"category_id": id_of(&category), "title": title}),
        )
        .await?;
        item_ids.push(id_of(&item));
    }

    // deactivate one entry; auto-assign must skip it
    post_json(
        &app,
        &admin,
        &format!("/admin/permissions/items/{}/toggle", item_ids[2]),
        json!({"is_active": false}),
    )
    .await?;

    let auto_uri = format!(
        "/admin/users/{}/assignments/permission-items/auto-assign",
        user_id
    );
    let result = post_json(&app, &admin, &auto_uri, json!({})).await?;
    assert_eq!(result.get("created").and_then(|v| v.as_u64()), Some(2));

    // repeating is a no-op
    let result = post_json(&app, &admin, &auto_uri, json!({})).await?;
    assert_eq!(result.get("created").and_then(|v| v.as_u64()), Some(0));

    let own = get_json(&app, &user, "/me/permissions").await?;
    let own_rows = own.as_array().context("expected array")?;
    assert_eq!(own_rows.len(), 2);
    for row in own_rows {
        assert_eq!(row.get("is_auto_assigned").and_then(|v| v.as_bool()), Some(true));
    }

    Ok(())
}

#[tokio::test]
async fn menu_view_combines_items_and_sections_in_order() -> Result<()> {
    let dir = tempdir().context("failed to create tempdir")?;
    let pool = make_pool(&dir.path().join("test.db")).await?;
    let app = create_app(pool.clone()).await?;

    let user_id =
        insert_user(&pool, "Ada", "ada@example.com", "password123", roles::USER).await?;
    insert_user(&pool, "Root", "root@example.com", "password123", roles::ADMIN).await?;
    let admin = login(&app, "root@example.com", "password123").await?;
    let user = login(&app, "ada@example.com", "password123").await?;

    // menus are bootstrapped out of band (seed CLI); mirror that here
    let menu_id = Uuid::new_v4();
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO menus (id, title, menu_type, sort_order, is_active, created_at, updated_at) VALUES (?, ?, ?, 1, 1, ?, ?)",
    )
    .bind(menu_id)
    .bind("Main navigation")
    .bind(menu_types::GENERAL)
    .bind(now)
    .bind(now)
    .execute(&pool)
    .await?;

    let item_b = post_json(
        &app,
        &admin,
        "/admin/menus/items",
        json!({"menu_id": menu_id, "title": "Reports", "sort_order": 2}),
    )
    .await?;
    let item_a = post_json(
        &app,
        &admin,
        "/admin/menus/items",
        json!({"menu_id": menu_id, "title": "Dashboard", "sort_order": 1}),
    )
    .await?;

    let section_category = post_json(
        &app,
        &admin,
        "/admin/sections/categories",
        json!({"title": "Workspace"}),
    )
    .await?;
    let section_item = post_json(
        &app,
        &admin,
        "/admin/sections/items",
        json!({"category_id": id_of(&section_category), "title": "My tasks"}),
    )
    .await?;

    for (kind, id) in [
        ("menu-items", id_of(&item_a)),
        ("menu-items", id_of(&item_b)),
        ("section-items", id_of(&section_item)),
    ] {
        post_json(
            &app,
            &admin,
            &format!("/admin/users/{}/assignments/{}/{}", user_id, kind, id),
            json!({}),
        )
        .await?;
    }

    let menu = get_json(&app, &user, "/me/menu").await?;
    let items = menu.get("items").and_then(|v| v.as_array()).context("items")?;
    let sections = menu
        .get("sections")
        .and_then(|v| v.as_array())
        .context("sections")?;

    assert_eq!(items.len(), 2);
    // ordered by the item's own sort_order within the menu
    assert_eq!(items[0].get("title").and_then(|v| v.as_str()), Some("Dashboard"));
    assert_eq!(items[1].get("title").and_then(|v| v.as_str()), Some("Reports"));

    assert_eq!(sections.len(), 1);
    assert_eq!(
        sections[0]
            .get("parent")
            .and_then(|p| p.get("title"))
            .and_then(|v| v.as_str()),
        Some("Workspace")
    );

    Ok(())
}
