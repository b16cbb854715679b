//! In-process store for development and tests.
//!
//! All tables sit behind one async mutex; holding it for a whole guarded
//! write gives the same per-event serialization as the row lock in postgres.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{CapacityGuard, EventRepository, InvitationRepository, RegistrationRepository, UserRepository};
use crate::{
    errors::AppError,
    models::{Category, Event, EventDetails, Invitation, InvitationStatus, Registration, User},
    service::capacity::{has_room, Occupancy},
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    categories: HashMap<Uuid, Category>,
    events: HashMap<Uuid, Event>,
    registrations: Vec<Registration>,
    invitations: Vec<Invitation>,
}

impl Tables {
    fn occupancy(&self, event_id: Uuid) -> Occupancy {
        let count_status = |status: InvitationStatus| {
            self.invitations
                .iter()
                .filter(|inv| inv.event_id == event_id && inv.status == status)
                .count() as u64
        };
        Occupancy {
            registrations: self.registrations.iter().filter(|reg| reg.event_id == event_id).count() as u64,
            pending_invitations: count_status(InvitationStatus::Pending),
            accepted_invitations: count_status(InvitationStatus::Accepted),
        }
    }

    fn find_active(&self, event_id: Uuid, guest_identifier: &str, now: DateTime<Utc>) -> Option<&Invitation> {
        self.invitations
            .iter()
            .find(|inv| inv.event_id == event_id && inv.guest_identifier == guest_identifier && inv.is_active(now))
    }

    fn insert_registration(&mut self, registration: &Registration) -> Result<(), AppError> {
        registration.attendee()?;
        if let Some(user_id) = registration.user_id {
            let taken = self
                .registrations
                .iter()
                .any(|reg| reg.event_id == registration.event_id && reg.user_id == Some(user_id));
            if taken {
                return Err(AppError::DuplicateRegistration);
            }
        }
        self.registrations.push(registration.clone());
        Ok(())
    }

    fn resolve_pending(&mut self, id: Uuid, status: InvitationStatus, now: DateTime<Utc>) -> bool {
        match self
            .invitations
            .iter_mut()
            .find(|inv| inv.id == id && inv.status == InvitationStatus::Pending)
        {
            Some(invitation) => {
                invitation.status = status;
                invitation.updated_at = now;
                true
            }
            None => false,
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, user: User) {
        self.tables.lock().await.users.insert(user.id, user);
    }

    pub async fn insert_category(&self, category: Category) {
        self.tables.lock().await.categories.insert(category.id, category);
    }

    pub async fn insert_event(&self, event: Event) {
        self.tables.lock().await.events.insert(event.id, event);
    }

    /// Drops the event and, like the foreign key cascade, its registrations.
    pub async fn delete_event(&self, id: Uuid) -> bool {
        let mut tables = self.tables.lock().await;
        tables.registrations.retain(|reg| reg.event_id != id);
        tables.events.remove(&id).is_some()
    }

    /// Stores an invitation as-is, bypassing every check.
    pub async fn insert_invitation_unchecked(&self, invitation: Invitation) {
        self.tables.lock().await.invitations.push(invitation);
    }
}

#[async_trait]
impl EventRepository for MemoryStore {
    async fn find_event(&self, id: Uuid) -> Result<Option<Event>, AppError> {
        Ok(self.tables.lock().await.events.get(&id).cloned())
    }

    async fn find_event_details(&self, id: Uuid) -> Result<Option<EventDetails>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.events.get(&id).map(|event| EventDetails {
            organizer_name: tables.users.get(&event.organizer_id).map(|user| user.name.clone()),
            category_name: event
                .category_id
                .and_then(|category_id| tables.categories.get(&category_id))
                .map(|category| category.name.clone()),
            event: event.clone(),
        }))
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_names(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, String>, AppError> {
        let tables = self.tables.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.users.get(id).map(|user| (*id, user.name.clone())))
            .collect())
    }
}

#[async_trait]
impl RegistrationRepository for MemoryStore {
    async fn insert_registration(&self, registration: &Registration) -> Result<(), AppError> {
        self.tables.lock().await.insert_registration(registration)
    }

    async fn find_user_registration(&self, event_id: Uuid, user_id: Uuid) -> Result<Option<Registration>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .registrations
            .iter()
            .find(|reg| reg.event_id == event_id && reg.user_id == Some(user_id))
            .cloned())
    }

    async fn delete_user_registration(&self, event_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;
        let before = tables.registrations.len();
        tables
            .registrations
            .retain(|reg| !(reg.event_id == event_id && reg.user_id == Some(user_id)));
        Ok(tables.registrations.len() != before)
    }

    async fn count_registrations_by_event(&self, event_id: Uuid) -> Result<u64, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.registrations.iter().filter(|reg| reg.event_id == event_id).count() as u64)
    }

    async fn count_registrations_by_user(&self, user_id: Uuid) -> Result<u64, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.registrations.iter().filter(|reg| reg.user_id == Some(user_id)).count() as u64)
    }

    async fn list_registrations_by_event(&self, event_id: Uuid) -> Result<Vec<Registration>, AppError> {
        let tables = self.tables.lock().await;
        let mut registrations: Vec<Registration> = tables
            .registrations
            .iter()
            .filter(|reg| reg.event_id == event_id)
            .cloned()
            .collect();
        registrations.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(registrations)
    }
}

#[async_trait]
impl InvitationRepository for MemoryStore {
    async fn find_invitation_by_token(&self, token: &str) -> Result<Option<Invitation>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.invitations.iter().find(|inv| inv.token == token).cloned())
    }

    async fn find_active_invitation(
        &self,
        event_id: Uuid,
        guest_identifier: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Invitation>, AppError> {
        Ok(self.tables.lock().await.find_active(event_id, guest_identifier, now).cloned())
    }

    async fn list_invitations_by_event(&self, event_id: Uuid) -> Result<Vec<Invitation>, AppError> {
        let tables = self.tables.lock().await;
        let mut invitations: Vec<Invitation> = tables
            .invitations
            .iter()
            .filter(|inv| inv.event_id == event_id)
            .cloned()
            .collect();
        invitations.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(invitations)
    }

    async fn list_pending_invitations(&self, event_id: Uuid) -> Result<Vec<Invitation>, AppError> {
        let tables = self.tables.lock().await;
        let mut invitations: Vec<Invitation> = tables
            .invitations
            .iter()
            .filter(|inv| inv.event_id == event_id && inv.status == InvitationStatus::Pending)
            .cloned()
            .collect();
        invitations.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(invitations)
    }

    async fn count_invitations(&self, event_id: Uuid, status: InvitationStatus) -> Result<u64, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .invitations
            .iter()
            .filter(|inv| inv.event_id == event_id && inv.status == status)
            .count() as u64)
    }

    async fn resolve_pending_invitation(
        &self,
        id: Uuid,
        status: InvitationStatus,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        Ok(self.tables.lock().await.resolve_pending(id, status, now))
    }

    async fn expire_stale_invitations(&self, event_id: Uuid, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut tables = self.tables.lock().await;
        let mut changed = 0;
        for invitation in tables.invitations.iter_mut().filter(|inv| {
            inv.event_id == event_id && inv.status == InvitationStatus::Pending && inv.is_past_expiry(now)
        }) {
            invitation.status = InvitationStatus::Expired;
            invitation.updated_at = now;
            changed += 1;
        }
        Ok(changed)
    }

    async fn delete_invitation(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;
        let before = tables.invitations.len();
        tables.invitations.retain(|inv| inv.id != id);
        Ok(tables.invitations.len() != before)
    }
}

#[async_trait]
impl CapacityGuard for MemoryStore {
    async fn occupancy(&self, event_id: Uuid) -> Result<Occupancy, AppError> {
        Ok(self.tables.lock().await.occupancy(event_id))
    }

    async fn insert_invitation_guarded(&self, invitation: &Invitation, now: DateTime<Utc>) -> Result<(), AppError> {
        let mut tables = self.tables.lock().await;
        let capacity = tables
            .events
            .get(&invitation.event_id)
            .map(|event| event.capacity)
            .ok_or(AppError::NotFound)?;
        if tables
            .find_active(invitation.event_id, &invitation.guest_identifier, now)
            .is_some()
        {
            return Err(AppError::DuplicateActiveInvitation(invitation.guest_identifier.clone()));
        }
        if tables.invitations.iter().any(|inv| inv.token == invitation.token) {
            return Err(AppError::InternalError("invitation token collision".to_string()));
        }
        if !has_room(capacity, tables.occupancy(invitation.event_id).occupied()) {
            return Err(AppError::CapacityExceeded);
        }
        tables.invitations.push(invitation.clone());
        Ok(())
    }

    async fn accept_invitation_guarded(
        &self,
        invitation: &Invitation,
        registration: &Registration,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut tables = self.tables.lock().await;
        let capacity = tables
            .events
            .get(&invitation.event_id)
            .map(|event| event.capacity)
            .ok_or(AppError::NotFound)?;
        match tables.invitations.iter().find(|inv| inv.id == invitation.id) {
            None => return Err(AppError::InvalidToken),
            Some(current) if current.status != InvitationStatus::Pending => return Err(AppError::AlreadyResponded),
            Some(_) => {}
        }
        let occupancy = tables.occupancy(invitation.event_id);
        if !has_room(capacity, occupancy.occupied_without_one_pending()) {
            return Err(AppError::CapacityExceeded);
        }
        // registration first: if it is rejected the invitation must stay pending
        tables.insert_registration(registration)?;
        tables.resolve_pending(invitation.id, InvitationStatus::Accepted, now);
        Ok(())
    }

    async fn register_user_guarded(&self, registration: &Registration) -> Result<(), AppError> {
        let mut tables = self.tables.lock().await;
        let capacity = tables
            .events
            .get(&registration.event_id)
            .map(|event| event.capacity)
            .ok_or(AppError::NotFound)?;
        if !has_room(capacity, tables.occupancy(registration.event_id).occupied()) {
            return Err(AppError::CapacityExceeded);
        }
        tables.insert_registration(registration)
    }
}
