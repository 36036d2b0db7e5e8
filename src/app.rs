use std::sync::Arc;

use axum::http::Method;
use axum::routing::{delete, get, post, put};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::SessionConfig;
use crate::errors::AppError;
use crate::events::{self, EventBus};
use crate::routes::{assignments, auth, catalog, me, offices, sessions, users};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub session: Arc<SessionConfig>,
    pub event_bus: EventBus,
}

impl AppState {
    pub fn new(pool: SqlitePool, session: SessionConfig, event_bus: EventBus) -> Self {
        Self {
            pool,
            session: Arc::new(session),
            event_bus,
        }
    }
}

pub async fn create_app(pool: SqlitePool) -> Result<Router, AppError> {
    let session_config = SessionConfig::from_env()?;

    let (event_bus, event_rx) = events::init_event_bus();
    tokio::spawn(events::start_activity_listener(event_rx, pool.clone()));

    let state = AppState::new(pool, session_config, event_bus);

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/me", get(auth::me))
        .route("/logout", post(auth::logout));

    let admin_routes = Router::new()
        // Sessions
        .route("/sessions", get(sessions::list_sessions))
        .route("/sessions/:id", delete(sessions::delete_session))
        // Users
        .route("/users", get(users::list_users))
        // Per-user assignment views and mutations
        .route("/users/:user_id/menu", get(assignments::get_user_menu))
        .route("/users/:user_id/permissions", get(assignments::get_user_permissions))
        .route("/users/:user_id/offices", get(assignments::get_user_offices))
        .route(
            "/users/:user_id/assignments/:kind/auto-assign",
            post(assignments::auto_assign),
        )
        .route(
            "/users/:user_id/assignments/:kind/:entry_id",
            post(assignments::grant_assignment).delete(assignments::revoke_assignment),
        )
        // Offices
        .route("/offices", get(offices::list_offices).post(offices::create_office))
        .route("/offices/reorder", put(offices::reorder_offices))
        .route(
            "/offices/:id",
            put(offices::update_office).delete(offices::delete_office),
        )
        .route("/offices/:id/toggle", post(offices::toggle_office))
        // Menus
        .route("/menus", get(catalog::list_menus))
        .route("/menus/items", post(catalog::create_menu_item))
        .route("/menus/items/reorder", put(catalog::reorder_menu_items))
        .route("/menus/items/:id", put(catalog::update_menu_item))
        .route("/menus/items/:id/toggle", post(catalog::toggle_menu_item))
        // Sections
        .route("/sections/categories", post(catalog::create_section_category))
        .route(
            "/sections/categories/:id/toggle",
            post(catalog::toggle_section_category),
        )
        .route("/sections/items", post(catalog::create_section_item))
        .route("/sections/items/reorder", put(catalog::reorder_section_items))
        .route("/sections/items/:id", put(catalog::update_section_item))
        .route("/sections/items/:id/toggle", post(catalog::toggle_section_item))
        // Permissions
        .route("/permissions", get(catalog::get_permissions_catalog))
        .route(
            "/permissions/categories",
            post(catalog::create_permission_category),
        )
        .route(
            "/permissions/categories/:id/toggle",
            post(catalog::toggle_permission_category),
        )
        .route("/permissions/items", post(catalog::create_permission_item))
        .route(
            "/permissions/items/reorder",
            put(catalog::reorder_permission_items),
        )
        .route("/permissions/items/:id", put(catalog::update_permission_item))
        .route(
            "/permissions/items/:id/toggle",
            post(catalog::toggle_permission_item),
        );

    let me_routes = Router::new()
        .route("/menu", get(me::my_menu))
        .route("/permissions", get(me::my_permissions))
        .route("/offices", get(me::my_offices))
        .route("/offices/:id/default", put(me::set_default_office));

    let router = Router::new()
        .nest("/auth", auth_routes)
        .nest("/admin", admin_routes)
        .nest("/me", me_routes)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(router)
}
