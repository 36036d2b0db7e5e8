use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Map, Value};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::models;
use crate::resolver;
use crate::routes;

#[derive(OpenApi)]
#[openapi(
	components(
		schemas(
			models::user::User,
			models::user::AuthResponse,
			models::user::LoginRequest,
			models::user::AdminUserRow,
			models::session::SessionWithUser,
			models::office::Office,
			models::office::OfficeCreateRequest,
			models::office::OfficeUpdateRequest,
			models::menu::Menu,
			models::menu::MenuItem,
			models::menu::MenuItemCreateRequest,
			models::menu::SectionCategory,
			models::menu::SectionCategoryCreateRequest,
			models::menu::SectionItem,
			models::menu::SectionItemCreateRequest,
			models::menu::CatalogEntryUpdateRequest,
			models::permission::PermissionCategory,
			models::permission::PermissionCategoryCreateRequest,
			models::permission::PermissionItem,
			models::permission::PermissionItemCreateRequest,
			models::permission::PermissionsCatalog,
			models::assignment::AssignmentKind,
			models::assignment::UserAssignment,
			models::ReorderEntry,
			models::ReorderRequest,
			models::ToggleRequest,
			resolver::EffectiveEntry,
			resolver::ParentRef,
			routes::assignments::UserMenuView,
			routes::assignments::AutoAssignResponse,
			routes::auth::MessageResponse
		)
	),
	tags(
		(name = "Auth", description = "Session issuance and introspection"),
		(name = "Admin", description = "Session and user administration"),
		(name = "Offices", description = "Office catalog administration"),
		(name = "Catalog", description = "Menu, section and permission catalog administration"),
		(name = "Assignments", description = "Per-user catalog assignment"),
		(name = "Me", description = "The caller's own effective views")
	)
)]
pub struct ApiDoc;

pub fn build_openapi(port: u16) -> anyhow::Result<utoipa::openapi::OpenApi> {
	let mut doc = serde_json::to_value(&ApiDoc::openapi())?;

	ensure_security_components(&mut doc);
	ensure_global_security(&mut doc);
	ensure_servers(&mut doc, port);

	Ok(serde_json::from_value(doc)?)
}

pub fn swagger_routes(doc: utoipa::openapi::OpenApi) -> Router {
	let swagger_config = utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"])
		.try_it_out_enabled(true)
		.with_credentials(true)
		.persist_authorization(true);

	let doc_json = Arc::new(serde_json::to_value(&doc).expect("OpenAPI serialization must succeed"));

	let json_route = {
		let doc_json = Arc::clone(&doc_json);
		get(move || {
			let doc_json = Arc::clone(&doc_json);
			async move { Json((*doc_json).clone()) }
		})
	};

	Router::new()
		.route("/api-docs/openapi.json", json_route)
		.merge(SwaggerUi::new("/docs").config(swagger_config))
}

fn ensure_security_components(doc: &mut Value) {
	let components = doc
		.as_object_mut()
		.expect("OpenAPI root must be an object")
		.entry("components")
		.or_insert_with(|| Value::Object(Map::new()))
		.as_object_mut()
		.expect("components must be an object");

	let schemes = components
		.entry("securitySchemes")
		.or_insert_with(|| Value::Object(Map::new()))
		.as_object_mut()
		.expect("securitySchemes must be an object");

	schemes.insert(
		"bearerAuth".to_string(),
		json!({
			"type": "http",
			"scheme": "bearer"
		}),
	);
}

fn ensure_global_security(doc: &mut Value) {
	doc
		.as_object_mut()
		.expect("OpenAPI root must be an object")
		.entry("security")
		.or_insert_with(|| json!([{ "bearerAuth": [] }]));
}

fn ensure_servers(doc: &mut Value, port: u16) {
	let server_url = format!("http://localhost:{}", port);

	match doc.get_mut("servers") {
		Some(Value::Array(arr)) => {
			let has = arr
				.iter()
				.any(|v| v.get("url").and_then(Value::as_str) == Some(server_url.as_str()));
			if !has {
				arr.push(json!({ "url": server_url }));
			}
		}
		_ => {
			doc["servers"] = json!([{ "url": server_url }]);
		}
	}
}
