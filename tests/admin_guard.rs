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

#[tokio::test]
async fn admin_endpoints_reject_missing_and_non_admin_tokens() -> Result<()> {
    let dir = tempdir().context("failed to create tempdir")?;
    let pool = make_pool(&dir.path().join("test.db")).await?;
    let app = create_app(pool.clone()).await?;

    insert_user(&pool, "Ada", "ada@example.com", "password123", roles::USER).await?;
    let user_token = login(&app, "ada@example.com", "password123").await?;

    let admin_reads = [
        "/admin/sessions",
        "/admin/users",
        "/admin/offices",
        "/admin/menus",
        "/admin/permissions",
    ];

    for uri in admin_reads {
        // no principal at all -> Unauthorized
        let req = Request::builder().method("GET").uri(uri).body(Body::empty())?;
        let resp: Response = app.clone().oneshot(req).await?;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{uri} without token");

        // wrong role -> Forbidden
        let req = Request::builder()
            .method("GET")
            .uri(uri)
            .header("authorization", format!("Bearer {}", user_token))
            .body(Body::empty())?;
        let resp: Response = app.clone().oneshot(req).await?;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{uri} with user token");

        let body_bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
        let err: serde_json::Value = serde_json::from_slice(&body_bytes)?;
        assert_eq!(err.get("error").and_then(|v| v.as_str()), Some("forbidden"));
    }

    Ok(())
}

#[tokio::test]
async fn forbidden_mutation_performs_zero_writes() -> Result<()> {
    let dir = tempdir().context("failed to create tempdir")?;
    let pool = make_pool(&dir.path().join("test.db")).await?;
    let app = create_app(pool.clone()).await?;

    insert_user(&pool, "Ada", "ada@example.com", "password123", roles::USER).await?;
    let user_token = login(&app, "ada@example.com", "password123").await?;

    let offices_before: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM offices")
        .fetch_one(&pool)
        .await?;

    let req = Request::builder()
        .method("POST")
        .uri("/admin/offices")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", user_token))
        .body(Body::from(json!({"title": "Shadow HQ"}).to_string()))?;
    let resp: Response = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let offices_after: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM offices")
        .fetch_one(&pool)
        .await?;
    assert_eq!(offices_before, offices_after, "forbidden call must not write");

    Ok(())
}

#[tokio::test]
async fn own_views_work_for_regular_users() -> Result<()> {
    let dir = tempdir().context("failed to create tempdir")?;
    let pool = make_pool(&dir.path().join("test.db")).await?;
    let app = create_app(pool.clone()).await?;

    insert_user(&pool, "Ada", "ada@example.com", "password123", roles::USER).await?;
    let user_token = login(&app, "ada@example.com", "password123").await?;

    // nothing assigned yet: empty lists, not errors
    for uri in ["/me/permissions", "/me/offices"] {
        let req = Request::builder()
            .method("GET")
            .uri(uri)
            .header("authorization", format!("Bearer {}", user_token))
            .body(Body::empty())?;
        let resp: Response = app.clone().oneshot(req).await?;
        assert_eq!(resp.status(), StatusCode::OK);
        let body_bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
        let list: Vec<serde_json::Value> = serde_json::from_slice(&body_bytes)?;
        assert!(list.is_empty());
    }

    let req = Request::builder()
        .method("GET")
        .uri("/me/menu")
        .header("authorization", format!("Bearer {}", user_token))
        .body(Body::empty())?;
    let resp: Response = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body_bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
    let menu: serde_json::Value = serde_json::from_slice(&body_bytes)?;
    assert_eq!(menu.get("items").and_then(|v| v.as_array()).map(|a| a.len()), Some(0));
    assert_eq!(menu.get("sections").and_then(|v| v.as_array()).map(|a| a.len()), Some(0));

    Ok(())
}
