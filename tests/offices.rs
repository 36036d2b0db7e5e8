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

async fn create_office(app: &axum::Router, token: &str, title: &str) -> Result<String> {
    let req = Request::builder()
        .method("POST")
        .uri("/admin/offices")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::from(json!({"title": title}).to_string()))?;

    let resp: Response = app.clone().oneshot(req).await?;
    let status = resp.status();
    let body_bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
    if status != StatusCode::CREATED {
        panic!("office create failed: {} - {}", status, String::from_utf8_lossy(&body_bytes));
    }
    let office: serde_json::Value = serde_json::from_slice(&body_bytes)?;
    Ok(office
        .get("id")
        .and_then(|v| v.as_str())
        .context("missing office id")?
        .to_string())
}

async fn list_office_ids(app: &axum::Router, token: &str) -> Result<Vec<String>> {
    let req = Request::builder()
        .method("GET")
        .uri("/admin/offices")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())?;
    let resp: Response = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body_bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
    let offices: Vec<serde_json::Value> = serde_json::from_slice(&body_bytes)?;
    Ok(offices
        .iter()
        .filter_map(|o| o.get("id").and_then(|v| v.as_str()).map(String::from))
        .collect())
}

#[tokio::test]
async fn reorder_applies_and_rolls_back_on_unknown_id() -> Result<()> {
    let dir = tempdir().context("failed to create tempdir")?;
    let pool = make_pool(&dir.path().join("test.db")).await?;
    let app = create_app(pool.clone()).await?;

    insert_user(&pool, "Root", "root@example.com", "password123", roles::ADMIN).await?;
    let token = login(&app, "root@example.com", "password123").await?;

    let first = create_office(&app, &token, "First").await?;
    let second = create_office(&app, &token, "Second").await?;
    let third = create_office(&app, &token, "Third").await?;

    // reorder [third:1, first:2, second:3] then list -> [third, first, second]
    let req = Request::builder()
        .method("PUT")
        .uri("/admin/offices/reorder")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::from(
            json!({"entries": [
                {"id": third, "sort_order": 1},
                {"id": first, "sort_order": 2},
                {"id": second, "sort_order": 3},
            ]})
            .to_string(),
        ))?;
    let resp: Response = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let ids = list_office_ids(&app, &token).await?;
    assert_eq!(ids, vec![third.clone(), first.clone(), second.clone()]);

    // a batch containing an unknown id changes nothing
    let req = Request::builder()
        .method("PUT")
        .uri("/admin/offices/reorder")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::from(
            json!({"entries": [
                {"id": first, "sort_order": 1},
                {"id": Uuid::new_v4(), "sort_order": 2},
            ]})
            .to_string(),
        ))?;
    let resp: Response = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let ids = list_office_ids(&app, &token).await?;
    assert_eq!(ids, vec![third, first, second], "failed batch must roll back fully");

    Ok(())
}

#[tokio::test]
async fn office_delete_refused_while_assigned_then_allowed() -> Result<()> {
    let dir = tempdir().context("failed to create tempdir")?;
    let pool = make_pool(&dir.path().join("test.db")).await?;
    let app = create_app(pool.clone()).await?;

    let user_id =
        insert_user(&pool, "Ada", "ada@example.com", "password123", roles::USER).await?;
    insert_user(&pool, "Root", "root@example.com", "password123", roles::ADMIN).await?;
    let token = login(&app, "root@example.com", "password123").await?;

    let office = create_office(&app, &token, "HQ").await?;

    // grant the office to a user
    let req = Request::builder()
        .method("POST")
        .uri(format!("/admin/users/{}/assignments/offices/{}", user_id, office))
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())?;
    let resp: Response = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::CREATED);

    // delete is refused with Conflict
    let req = Request::builder()
        .method("DELETE")
        .uri(format!("/admin/offices/{}", office))
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())?;
    let resp: Response = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM offices")
        .fetch_one(&pool)
        .await?;
    assert_eq!(count, 1, "refused delete must remove nothing");

    // revoke, then delete succeeds
    let req = Request::builder()
        .method("DELETE")
        .uri(format!("/admin/users/{}/assignments/offices/{}", user_id, office))
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())?;
    let resp: Response = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = Request::builder()
        .method("DELETE")
        .uri(format!("/admin/offices/{}", office))
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())?;
    let resp: Response = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM offices")
        .fetch_one(&pool)
        .await?;
    assert_eq!(count, 0);

    Ok(())
}

#[tokio::test]
async fn default_office_switch_keeps_single_default() -> Result<()> {
    let dir = tempdir().context("failed to create tempdir")?;
    let pool = make_pool(&dir.path().join("test.db")).await?;
    let app = create_app(pool.clone()).await?;

    let user_id =
        insert_user(&pool, "Ada", "ada@example.com", "password123", roles::USER).await?;
    insert_user(&pool, "Root", "root@example.com", "password123", roles::ADMIN).await?;
    let admin_token = login(&app, "root@example.com", "password123").await?;
    let user_token = login(&app, "ada@example.com", "password123").await?;

    let office_one = create_office(&app, &admin_token, "One").await?;
    let office_two = create_office(&app, &admin_token, "Two").await?;

    for office in [&office_one, &office_two] {
        let req = Request::builder()
            .method("POST")
            .uri(format!("/admin/users/{}/assignments/offices/{}", user_id, office))
            .header("authorization", format!("Bearer {}", admin_token))
            .body(Body::empty())?;
        let resp: Response = app.clone().oneshot(req).await?;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    // an office that is not assigned cannot become the default
    let unassigned = create_office(&app, &admin_token, "Elsewhere").await?;
    let req = Request::builder()
        .method("PUT")
        .uri(format!("/me/offices/{}/default", unassigned))
        .header("authorization", format!("Bearer {}", user_token))
        .body(Body::empty())?;
    let resp: Response = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // set one, then the other
    for office in [&office_one, &office_two] {
        let req = Request::builder()
            .method("PUT")
            .uri(format!("/me/offices/{}/default", office))
            .header("authorization", format!("Bearer {}", user_token))
            .body(Body::empty())?;
        let resp: Response = app.clone().oneshot(req).await?;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    // exactly one default row remains, and it is office_two
    let rows: Vec<(Uuid, bool)> = sqlx::query_as(
        "SELECT office_id, is_default FROM user_offices WHERE user_id = ? AND is_default = 1",
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].0, Uuid::parse_str(&office_two)?);

    // visible in the user's own office view as well
    let req = Request::builder()
        .method("GET")
        .uri("/me/offices")
        .header("authorization", format!("Bearer {}", user_token))
        .body(Body::empty())?;
    let resp: Response = app.clone().oneshot(req).await?;
    let body_bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
    let offices: Vec<serde_json::Value> = serde_json::from_slice(&body_bytes)?;
    let defaults: Vec<&serde_json::Value> = offices
        .iter()
        .filter(|o| o.get("is_default").and_then(|v| v.as_bool()) == Some(true))
        .collect();
    assert_eq!(defaults.len(), 1);
    assert_eq!(
        defaults[0].get("id").and_then(|v| v.as_str()),
        Some(office_two.as_str())
    );

    Ok(())
}
