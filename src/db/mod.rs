pub mod capacity;
pub mod event;
pub mod invitations;
pub mod memory;
pub mod registrations;
pub mod user;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::info;
use sqlx::postgres::{PgPool, PgPoolOptions};
use uuid::Uuid;

use crate::{
    errors::AppError,
    models::{Event, EventDetails, Invitation, InvitationStatus, Registration},
    service::capacity::Occupancy,
};

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn find_event(&self, id: Uuid) -> Result<Option<Event>, AppError>;
    /// Event with organizer and category names resolved.
    async fn find_event_details(&self, id: Uuid) -> Result<Option<EventDetails>, AppError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Display names of the given users; unknown ids are absent from the map.
    async fn find_names(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, String>, AppError>;
}

#[async_trait]
pub trait RegistrationRepository: Send + Sync {
    /// Fails with `DuplicateRegistration` when the user already holds a seat.
    async fn insert_registration(&self, registration: &Registration) -> Result<(), AppError>;
    async fn find_user_registration(&self, event_id: Uuid, user_id: Uuid) -> Result<Option<Registration>, AppError>;
    async fn delete_user_registration(&self, event_id: Uuid, user_id: Uuid) -> Result<bool, AppError>;
    async fn count_registrations_by_event(&self, event_id: Uuid) -> Result<u64, AppError>;
    async fn count_registrations_by_user(&self, user_id: Uuid) -> Result<u64, AppError>;
    /// Oldest first.
    async fn list_registrations_by_event(&self, event_id: Uuid) -> Result<Vec<Registration>, AppError>;
}

#[async_trait]
pub trait InvitationRepository: Send + Sync {
    async fn find_invitation_by_token(&self, token: &str) -> Result<Option<Invitation>, AppError>;
    /// A pending, unexpired invitation for exactly this guest name.
    async fn find_active_invitation(
        &self,
        event_id: Uuid,
        guest_identifier: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Invitation>, AppError>;
    /// Newest first.
    async fn list_invitations_by_event(&self, event_id: Uuid) -> Result<Vec<Invitation>, AppError>;
    /// Oldest first.
    async fn list_pending_invitations(&self, event_id: Uuid) -> Result<Vec<Invitation>, AppError>;
    async fn count_invitations(&self, event_id: Uuid, status: InvitationStatus) -> Result<u64, AppError>;
    /// Moves a still-pending invitation to `status`. Returns false if it was no longer pending.
    async fn resolve_pending_invitation(
        &self,
        id: Uuid,
        status: InvitationStatus,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError>;
    /// Expires every pending invitation of the event whose deadline has passed.
    async fn expire_stale_invitations(&self, event_id: Uuid, now: DateTime<Utc>) -> Result<u64, AppError>;
    async fn delete_invitation(&self, id: Uuid) -> Result<bool, AppError>;
}

/// Writes that consume a seat.
///
/// Each call checks the event's capacity and performs its write as one unit,
/// serialized per event, so concurrent requests cannot over-subscribe it.
#[async_trait]
pub trait CapacityGuard: Send + Sync {
    async fn occupancy(&self, event_id: Uuid) -> Result<Occupancy, AppError>;
    async fn insert_invitation_guarded(&self, invitation: &Invitation, now: DateTime<Utc>) -> Result<(), AppError>;
    /// Marks the invitation accepted and inserts the guest registration together.
    async fn accept_invitation_guarded(
        &self,
        invitation: &Invitation,
        registration: &Registration,
        now: DateTime<Utc>,
    ) -> Result<(), AppError>;
    async fn register_user_guarded(&self, registration: &Registration) -> Result<(), AppError>;
}

pub trait Store: EventRepository + UserRepository + RegistrationRepository + InvitationRepository + CapacityGuard {}

impl<T> Store for T where T: EventRepository + UserRepository + RegistrationRepository + InvitationRepository + CapacityGuard
{}

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

pub async fn init_db_pool(db_url: &str, max_connections: u32) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(db_url)
        .await?;
    info!("connected to postgresql (max {} connections)", max_connections);
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("database migrations applied");
    Ok(pool)
}

pub(crate) fn to_count(n: i64) -> u64 {
    u64::try_from(n).unwrap_or(0)
}
