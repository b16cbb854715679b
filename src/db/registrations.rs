use async_trait::async_trait;
use sqlx::PgConnection;
use uuid::Uuid;

use super::{to_count, PgStore, RegistrationRepository};
use crate::{errors::AppError, models::Registration};

const REGISTRATION_COLUMNS: &str = "id, event_id, user_id, guest_identifier, created_at";

#[async_trait]
impl RegistrationRepository for PgStore {
    async fn insert_registration(&self, registration: &Registration) -> Result<(), AppError> {
        let mut conn = self.pool().acquire().await?;
        insert(&mut *conn, registration).await
    }

    async fn find_user_registration(&self, event_id: Uuid, user_id: Uuid) -> Result<Option<Registration>, AppError> {
        let registration = sqlx::query_as::<_, Registration>(&format!(
            "SELECT {} FROM registrations WHERE event_id = $1 AND user_id = $2",
            REGISTRATION_COLUMNS
        ))
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(registration)
    }

    async fn delete_user_registration(&self, event_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let res = sqlx::query("DELETE FROM registrations WHERE event_id = $1 AND user_id = $2")
            .bind(event_id)
            .bind(user_id)
            .execute(self.pool())
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn count_registrations_by_event(&self, event_id: Uuid) -> Result<u64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM registrations WHERE event_id = $1")
            .bind(event_id)
            .fetch_one(self.pool())
            .await?;
        Ok(to_count(count))
    }

    async fn count_registrations_by_user(&self, user_id: Uuid) -> Result<u64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM registrations WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.pool())
            .await?;
        Ok(to_count(count))
    }

    async fn list_registrations_by_event(&self, event_id: Uuid) -> Result<Vec<Registration>, AppError> {
        let registrations = sqlx::query_as::<_, Registration>(&format!(
            "SELECT {} FROM registrations WHERE event_id = $1 ORDER BY created_at ASC, id ASC",
            REGISTRATION_COLUMNS
        ))
        .bind(event_id)
        .fetch_all(self.pool())
        .await?;
        Ok(registrations)
    }
}

pub(crate) async fn insert(conn: &mut PgConnection, registration: &Registration) -> Result<(), AppError> {
    let res = sqlx::query(
        "INSERT INTO registrations (id, event_id, user_id, guest_identifier, created_at)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(registration.id)
    .bind(registration.event_id)
    .bind(registration.user_id)
    .bind(&registration.guest_identifier)
    .bind(registration.created_at)
    .execute(conn)
    .await;
    match res {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(AppError::DuplicateRegistration),
        Err(sqlx::Error::Database(db_err)) if db_err.is_check_violation() => Err(AppError::InvalidState(
            "a registration needs exactly one of user or guest".to_string(),
        )),
        Err(err) => Err(err.into()),
    }
}
