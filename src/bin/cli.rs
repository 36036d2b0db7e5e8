use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use backoffice::models::menu::menu_types;
use backoffice::models::user::roles;
use backoffice::utils::hash_password;

#[derive(Parser, Debug)]
#[command(author, version, about = "backoffice operations tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new empty migration with the provided name
    MakeMigration { name: String },
    /// Apply pending migrations
    MigrateRun,
    /// Show migration status against the current database
    MigrateStatus,
    /// Roll back the last applied migration
    MigrateRollback,
    /// Create an admin user (or promote an existing account)
    CreateAdmin {
        name: String,
        email: String,
        password: String,
    },
    /// Insert the default menu/section/permission catalog
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Try to load env from CWD; when running in Docker the binary CWD may differ,
    // so fall back to the crate-local `.env` using CARGO_MANIFEST_DIR.
    if dotenv().is_err() {
        let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(crate_env);
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::MakeMigration { name } => {
            let path = make_migration_file(&name)?;
            println!("Created migration: {}", path.display());
        }
        Commands::MigrateRun => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            migrator.run(&pool).await?;
            println!("Migrations applied");
        }
        Commands::MigrateStatus => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            print_status(&pool, &migrator).await?;
        }
        Commands::MigrateRollback => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            migrator
                .undo(&pool, 1)
                .await
                .context("no migrations were rolled back")?;
            println!("Rolled back last migration");
        }
        Commands::CreateAdmin { name, email, password } => {
            let pool = get_pool().await?;
            create_admin(&pool, &name, &email, &password).await?;
        }
        Commands::Seed => {
            let pool = get_pool().await?;
            seed_catalog(&pool).await?;
        }
    }

    Ok(())
}

async fn create_admin(pool: &SqlitePool, name: &str, email: &str, password: &str) -> anyhow::Result<()> {
    let password_hash = hash_password(password).map_err(|err| anyhow::anyhow!("{err}"))?;
    let now = Utc::now();

    let existing = sqlx::query("SELECT id FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    match existing {
        Some(row) => {
            let id: Uuid = row.get("id");
            sqlx::query("UPDATE users SET role = ?, updated_at = ? WHERE id = ?")
                .bind(roles::ADMIN)
                .bind(now)
                .bind(id)
                .execute(pool)
                .await?;
            println!("Promoted existing user {} to admin", email);
        }
        None => {
            sqlx::query(
                "INSERT INTO users (id, name, email, password_hash, role, banned, two_factor_enabled, created_at, updated_at) VALUES (?, ?, ?, ?, ?, 0, 0, ?, ?)",
            )
            .bind(Uuid::new_v4())
            .bind(name)
            .bind(email)
            .bind(&password_hash)
            .bind(roles::ADMIN)
            .bind(now)
            .bind(now)
            .execute(pool)
            .await?;
            println!("Created admin user {}", email);
        }
    }

    Ok(())
}

/// Seeds the three menus plus a starter catalog. Idempotent on titles: rows
/// that already exist are skipped.
async fn seed_catalog(pool: &SqlitePool) -> anyhow::Result<()> {
    let now = Utc::now();

    let menus = [
        ("Main navigation", menu_types::GENERAL, 1i64),
        ("User items", menu_types::USER_ITEMS, 2),
        ("User sections", menu_types::USER_SECTIONS, 3),
    ];

    for (title, menu_type, sort_order) in menus {
        let exists: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM menus WHERE title = ?")
            .bind(title)
            .fetch_one(pool)
            .await?;
        if exists > 0 {
            continue;
        }

        sqlx::query(
            "INSERT INTO menus (id, title, menu_type, sort_order, is_active, created_at, updated_at) VALUES (?, ?, ?, ?, 1, ?, ?)",
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(menu_type)
        .bind(sort_order)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;
        println!("Seeded menu: {}", title);
    }

    let categories = [("General access", 1i64)];
    for (title, sort_order) in categories {
        let exists: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM permission_categories WHERE title = ?")
                .bind(title)
                .fetch_one(pool)
                .await?;
        if exists > 0 {
            continue;
        }

        sqlx::query(
            "INSERT INTO permission_categories (id, title, sort_order, is_active, created_at, updated_at) VALUES (?, ?, ?, 1, ?, ?)",
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(sort_order)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;
        println!("Seeded permission category: {}", title);
    }

    println!("Seed complete");
    Ok(())
}

fn make_migration_file(name: &str) -> anyhow::Result<PathBuf> {
    let timestamp = Utc::now().format("%Y%m%d%H%M%S");
    let sanitized = sanitize_name(name);
    let filename = format!("{}_{}.sql", timestamp, sanitized);
    let path = Path::new("migrations").join(filename);

    if path.exists() {
        anyhow::bail!("migration already exists: {}", path.display());
    }

    fs::write(&path, "-- Write your migration SQL here\n")
        .with_context(|| format!("failed to create migration at {}", path.display()))?;

    Ok(path)
}

async fn get_pool() -> anyhow::Result<SqlitePool> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to database")
}

async fn print_status(pool: &SqlitePool, migrator: &sqlx::migrate::Migrator) -> anyhow::Result<()> {
    // If the migrations table doesn't exist, nothing is applied yet
    let db_applied = sqlx::query(
        "SELECT name FROM sqlite_master WHERE type='table' AND name='_sqlx_migrations'",
    )
    .fetch_optional(pool)
    .await?;
    let applied_versions: HashSet<i64> = if db_applied.is_some() {
        let rows = sqlx::query("SELECT version FROM _sqlx_migrations WHERE success = 1")
            .fetch_all(pool)
            .await?;
        rows.iter()
            .filter_map(|row| row.try_get::<i64, _>("version").ok())
            .collect()
    } else {
        HashSet::new()
    };

    println!("{:<8} {:<20} {}", "Status", "Version", "Name");
    for migration in migrator.iter() {
        let version = migration.version;
        let applied = applied_versions.contains(&version);
        let status = if applied { "applied" } else { "pending" };
        let desc = migration.description.as_ref().trim();
        let name = if !desc.is_empty() { desc } else { "unknown" };
        println!("{:<8} {:<20} {}", status, version, name);
    }

    Ok(())
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '_' => c,
            'A'..='Z' => c.to_ascii_lowercase(),
            _ => '_',
        })
        .collect()
}

async fn get_migrator() -> anyhow::Result<sqlx::migrate::Migrator> {
    // Try local ./migrations first (when running from repo root). If that
    // doesn't exist (common in containers where CWD differs), fall back to
    // the crate-local migrations folder determined by CARGO_MANIFEST_DIR.
    let local = Path::new("./migrations");
    let migrator_path = if local.exists() {
        local.to_path_buf()
    } else {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")
    };

    let migrator_path_display = migrator_path.display().to_string();
    sqlx::migrate::Migrator::new(migrator_path)
        .await
        .with_context(|| format!("failed to load migrations from {}", migrator_path_display))
}
