use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use sqlx::{prelude::FromRow, PgConnection};
use uuid::Uuid;

use super::{event::lock_event, invitations, registrations, to_count, CapacityGuard, PgStore};
use crate::{
    errors::AppError,
    models::{Invitation, InvitationStatus, Registration},
    service::capacity::{has_room, Occupancy},
};

#[derive(FromRow)]
struct OccupancyRow {
    registrations: i64,
    pending: i64,
    accepted: i64,
}

async fn read_occupancy(conn: &mut PgConnection, event_id: Uuid) -> Result<Occupancy, sqlx::Error> {
    let row = sqlx::query_as::<_, OccupancyRow>(
        "SELECT
            (SELECT COUNT(*) FROM registrations WHERE event_id = $1) AS registrations,
            (SELECT COUNT(*) FROM invitations WHERE event_id = $1 AND status = 'pending') AS pending,
            (SELECT COUNT(*) FROM invitations WHERE event_id = $1 AND status = 'accepted') AS accepted",
    )
    .bind(event_id)
    .fetch_one(conn)
    .await?;
    Ok(Occupancy {
        registrations: to_count(row.registrations),
        pending_invitations: to_count(row.pending),
        accepted_invitations: to_count(row.accepted),
    })
}

// Every guarded write locks the event row first, so writers of one event are
// serialized while the count and the insert happen in the same transaction.
#[async_trait]
impl CapacityGuard for PgStore {
    async fn occupancy(&self, event_id: Uuid) -> Result<Occupancy, AppError> {
        let mut conn = self.pool().acquire().await?;
        Ok(read_occupancy(&mut *conn, event_id).await?)
    }

    async fn insert_invitation_guarded(&self, invitation: &Invitation, now: DateTime<Utc>) -> Result<(), AppError> {
        let mut tx = self.pool().begin().await?;
        let event = lock_event(&mut *tx, invitation.event_id)
            .await?
            .ok_or(AppError::NotFound)?;
        if invitations::find_active(&mut *tx, event.id, &invitation.guest_identifier, now)
            .await?
            .is_some()
        {
            return Err(AppError::DuplicateActiveInvitation(invitation.guest_identifier.clone()));
        }
        let occupancy = read_occupancy(&mut *tx, event.id).await?;
        if !has_room(event.capacity, occupancy.occupied()) {
            return Err(AppError::CapacityExceeded);
        }
        invitations::insert(&mut *tx, invitation).await?;
        tx.commit().await?;
        debug!("invitation {} stored for event {}", invitation.id, event.id);
        Ok(())
    }

    async fn accept_invitation_guarded(
        &self,
        invitation: &Invitation,
        registration: &Registration,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut tx = self.pool().begin().await?;
        let event = lock_event(&mut *tx, invitation.event_id)
            .await?
            .ok_or(AppError::NotFound)?;
        let status: Option<InvitationStatus> =
            sqlx::query_scalar("SELECT status FROM invitations WHERE id = $1 FOR UPDATE")
                .bind(invitation.id)
                .fetch_optional(&mut *tx)
                .await?;
        match status {
            None => return Err(AppError::InvalidToken),
            Some(InvitationStatus::Pending) => {}
            Some(_) => return Err(AppError::AlreadyResponded),
        }
        let occupancy = read_occupancy(&mut *tx, event.id).await?;
        if !has_room(event.capacity, occupancy.occupied_without_one_pending()) {
            return Err(AppError::CapacityExceeded);
        }
        if !invitations::resolve_pending(&mut *tx, invitation.id, InvitationStatus::Accepted, now).await? {
            return Err(AppError::AlreadyResponded);
        }
        registrations::insert(&mut *tx, registration).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn register_user_guarded(&self, registration: &Registration) -> Result<(), AppError> {
        let mut tx = self.pool().begin().await?;
        let event = lock_event(&mut *tx, registration.event_id)
            .await?
            .ok_or(AppError::NotFound)?;
        let occupancy = read_occupancy(&mut *tx, event.id).await?;
        if !has_room(event.capacity, occupancy.occupied()) {
            return Err(AppError::CapacityExceeded);
        }
        registrations::insert(&mut *tx, registration).await?;
        tx.commit().await?;
        Ok(())
    }
}
