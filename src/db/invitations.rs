use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use super::{to_count, InvitationRepository, PgStore};
use crate::{
    errors::AppError,
    models::{Invitation, InvitationStatus},
};

const INVITATION_COLUMNS: &str =
    "id, event_id, organizer_id, guest_identifier, status, token, expires_at, created_at, updated_at";

#[async_trait]
impl InvitationRepository for PgStore {
    async fn find_invitation_by_token(&self, token: &str) -> Result<Option<Invitation>, AppError> {
        let invitation = sqlx::query_as::<_, Invitation>(&format!(
            "SELECT {} FROM invitations WHERE token = $1",
            INVITATION_COLUMNS
        ))
        .bind(token)
        .fetch_optional(self.pool())
        .await?;
        Ok(invitation)
    }

    async fn find_active_invitation(
        &self,
        event_id: Uuid,
        guest_identifier: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Invitation>, AppError> {
        let mut conn = self.pool().acquire().await?;
        Ok(find_active(&mut *conn, event_id, guest_identifier, now).await?)
    }

    async fn list_invitations_by_event(&self, event_id: Uuid) -> Result<Vec<Invitation>, AppError> {
        let invitations = sqlx::query_as::<_, Invitation>(&format!(
            "SELECT {} FROM invitations WHERE event_id = $1 ORDER BY created_at DESC, id DESC",
            INVITATION_COLUMNS
        ))
        .bind(event_id)
        .fetch_all(self.pool())
        .await?;
        Ok(invitations)
    }

    async fn list_pending_invitations(&self, event_id: Uuid) -> Result<Vec<Invitation>, AppError> {
        let invitations = sqlx::query_as::<_, Invitation>(&format!(
            "SELECT {} FROM invitations WHERE event_id = $1 AND status = 'pending' ORDER BY created_at ASC, id ASC",
            INVITATION_COLUMNS
        ))
        .bind(event_id)
        .fetch_all(self.pool())
        .await?;
        Ok(invitations)
    }

    async fn count_invitations(&self, event_id: Uuid, status: InvitationStatus) -> Result<u64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invitations WHERE event_id = $1 AND status = $2")
            .bind(event_id)
            .bind(status)
            .fetch_one(self.pool())
            .await?;
        Ok(to_count(count))
    }

    async fn resolve_pending_invitation(
        &self,
        id: Uuid,
        status: InvitationStatus,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let mut conn = self.pool().acquire().await?;
        Ok(resolve_pending(&mut *conn, id, status, now).await?)
    }

    async fn expire_stale_invitations(&self, event_id: Uuid, now: DateTime<Utc>) -> Result<u64, AppError> {
        let res = sqlx::query(
            "UPDATE invitations SET status = 'expired', updated_at = $2
             WHERE event_id = $1 AND status = 'pending' AND expires_at < $2",
        )
        .bind(event_id)
        .bind(now)
        .execute(self.pool())
        .await?;
        Ok(res.rows_affected())
    }

    async fn delete_invitation(&self, id: Uuid) -> Result<bool, AppError> {
        let res = sqlx::query("DELETE FROM invitations WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

pub(crate) async fn find_active(
    conn: &mut PgConnection,
    event_id: Uuid,
    guest_identifier: &str,
    now: DateTime<Utc>,
) -> Result<Option<Invitation>, sqlx::Error> {
    sqlx::query_as::<_, Invitation>(&format!(
        "SELECT {} FROM invitations
         WHERE event_id = $1 AND guest_identifier = $2 AND status = 'pending' AND expires_at > $3
         LIMIT 1",
        INVITATION_COLUMNS
    ))
    .bind(event_id)
    .bind(guest_identifier)
    .bind(now)
    .fetch_optional(conn)
    .await
}

pub(crate) async fn resolve_pending(
    conn: &mut PgConnection,
    id: Uuid,
    status: InvitationStatus,
    now: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let res = sqlx::query("UPDATE invitations SET status = $2, updated_at = $3 WHERE id = $1 AND status = 'pending'")
        .bind(id)
        .bind(status)
        .bind(now)
        .execute(conn)
        .await?;
    Ok(res.rows_affected() > 0)
}

pub(crate) async fn insert(conn: &mut PgConnection, invitation: &Invitation) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO invitations
            (id, event_id, organizer_id, guest_identifier, status, token, expires_at, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(invitation.id)
    .bind(invitation.event_id)
    .bind(invitation.organizer_id)
    .bind(&invitation.guest_identifier)
    .bind(invitation.status)
    .bind(&invitation.token)
    .bind(invitation.expires_at)
    .bind(invitation.created_at)
    .bind(invitation.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}
