use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::SqlitePool;
use tokio::sync::broadcast;
use uuid::Uuid;

pub mod loggable;
pub use loggable::{Loggable, Severity};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent<T> {
    pub id: Uuid,
    pub name: &'static str,
    pub occurred_at: DateTime<Utc>,
    pub actor_id: Option<Uuid>,
    pub subject_id: Option<Uuid>,
    pub payload: T,
}

impl<T> DomainEvent<T> {
    pub fn new(name: &'static str, actor_id: Option<Uuid>, subject_id: Option<Uuid>, payload: T) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            occurred_at: Utc::now(),
            actor_id,
            subject_id,
            payload,
        }
    }
}

pub type EventBus = broadcast::Sender<Value>;

pub fn init_event_bus() -> (EventBus, broadcast::Receiver<Value>) {
    broadcast::channel(1024)
}

/// Structured activity payload stored alongside every audit row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityPayload {
    /// The current/new state of the entity
    #[serde(rename = "new")]
    pub current: Value,
    /// The previous state (for update/delete operations)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old: Option<Value>,
    /// Severity level for retention policy
    pub severity: Severity,
}

/// Publish an audit event for any entity implementing `Loggable`.
///
/// # Arguments
/// * `event_bus` - The event bus to send the event to.
/// * `action` - The action performed (e.g., "created", "updated", "deleted").
/// * `actor_id` - The user who performed the action.
/// * `entity` - The entity being logged (must implement `Loggable`).
pub fn log_activity<T: Loggable>(
    event_bus: &EventBus,
    action: &str,
    actor_id: Option<Uuid>,
    entity: &T,
) {
    // Build event name like "office.created"
    let event_name = format!("{}.{}", T::entity_type(), action);

    // We need a 'static lifetime for name, so we leak the string.
    // This is acceptable because event names are a small, bounded set.
    let static_name: &'static str = Box::leak(event_name.into_boxed_str());

    let severity = entity.severity_for_action(action);
    let payload = ActivityPayload {
        current: serde_json::to_value(entity).unwrap_or_default(),
        old: None,
        severity,
    };

    let event = DomainEvent::new(
        static_name,
        actor_id,
        Some(entity.subject_id()),
        serde_json::to_value(&payload).unwrap_or_default(),
    );

    // Fire and forget - logging failures should not break the API
    let _ = event_bus.send(serde_json::to_value(event).unwrap_or_default());
}

/// Drains the event bus into the `activity_log` projection table.
pub async fn start_activity_listener(mut rx: broadcast::Receiver<Value>, pool: SqlitePool) {
    tracing::info!("Activity listener started");
    while let Ok(event) = rx.recv().await {
        let event_json = event.clone();

        // Basic extraction (tolerant)
        let name = event.get("name").and_then(|v| v.as_str()).unwrap_or("unknown");
        let actor_id_str = event.get("actor_id").and_then(|v| v.as_str());
        let subject_id_str = event.get("subject_id").and_then(|v| v.as_str());
        let occurred_at_str = event.get("occurred_at").and_then(|v| v.as_str());

        let description = describe(name);

        let severity = event
            .get("payload")
            .and_then(|p| p.get("severity"))
            .and_then(|s| s.as_str())
            .unwrap_or("important");

        let actor_id = actor_id_str.and_then(|s| Uuid::parse_str(s).ok());
        let subject_id = subject_id_str.and_then(|s| Uuid::parse_str(s).ok());

        let occurred_at = occurred_at_str
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        let id = Uuid::new_v4();

        let result = sqlx::query(
            r#"
            INSERT INTO activity_log (id, event_name, description, actor_id, subject_id, occurred_at, properties, severity)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(&description)
        .bind(actor_id)
        .bind(subject_id)
        .bind(occurred_at)
        .bind(event_json.to_string())
        .bind(severity)
        .execute(&pool)
        .await;

        if let Err(e) = result {
            tracing::error!("Failed to save activity log: {}", e);
        }
    }
}

fn describe(event_name: &str) -> String {
    match event_name {
        "office.created" => "Office created",
        "office.updated" => "Office updated",
        "office.deleted" => "Office deleted",
        "session.deleted" => "Session revoked by admin",
        "assignment.granted" => "Catalog entry granted",
        "assignment.revoked" => "Catalog entry revoked",
        "assignment.auto_assigned" => "Catalog defaults granted",
        "user.login" => "User logged in",
        _ => "System event",
    }
    .to_string()
}
