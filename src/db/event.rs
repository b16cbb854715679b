use async_trait::async_trait;
use sqlx::PgConnection;
use uuid::Uuid;

use super::{EventRepository, PgStore};
use crate::{
    errors::AppError,
    models::{Event, EventDetails},
};

const EVENT_COLUMNS: &str = "id, title, capacity, start_date_time, organizer_id, category_id";

#[async_trait]
impl EventRepository for PgStore {
    async fn find_event(&self, id: Uuid) -> Result<Option<Event>, AppError> {
        let event = sqlx::query_as::<_, Event>(&format!("SELECT {} FROM events WHERE id = $1", EVENT_COLUMNS))
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(event)
    }

    async fn find_event_details(&self, id: Uuid) -> Result<Option<EventDetails>, AppError> {
        let details = sqlx::query_as::<_, EventDetails>(
            "SELECT e.id, e.title, e.capacity, e.start_date_time, e.organizer_id, e.category_id,
                    u.name AS organizer_name, c.name AS category_name
             FROM events e
             LEFT JOIN users u ON u.id = e.organizer_id
             LEFT JOIN categories c ON c.id = e.category_id
             WHERE e.id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(details)
    }
}

/// Loads the event and holds its row lock until the surrounding transaction ends.
pub(crate) async fn lock_event(conn: &mut PgConnection, id: Uuid) -> Result<Option<Event>, sqlx::Error> {
    sqlx::query_as::<_, Event>(&format!("SELECT {} FROM events WHERE id = $1 FOR UPDATE", EVENT_COLUMNS))
        .bind(id)
        .fetch_optional(conn)
        .await
}
