use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
}

/// An event as seen by this service. Capacity 0 means the event is uncapped.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub capacity: i32,
    pub start_date_time: DateTime<Utc>,
    pub organizer_id: Uuid,
    pub category_id: Option<Uuid>,
}

/// Event joined with its organizer and category names.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetails {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub event: Event,
    pub organizer_name: Option<String>,
    pub category_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "invitation_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Denied,
    Expired,
}

impl InvitationStatus {
    /// Only pending invitations can still change status.
    pub fn is_terminal(self) -> bool {
        !matches!(self, InvitationStatus::Pending)
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub id: Uuid,
    pub event_id: Uuid,
    pub organizer_id: Uuid,
    pub guest_identifier: String,
    pub status: InvitationStatus,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invitation {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.status == InvitationStatus::Pending && self.expires_at > now
    }

    pub fn is_past_expiry(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Option<Uuid>,
    pub guest_identifier: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Who holds a registered seat: a platform user or a named guest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attendee {
    User(Uuid),
    Guest(String),
}

impl Attendee {
    pub fn from_parts(user_id: Option<Uuid>, guest_identifier: Option<String>) -> Result<Self, AppError> {
        match (user_id, guest_identifier) {
            (Some(user_id), None) => Ok(Attendee::User(user_id)),
            (None, Some(guest)) if !guest.trim().is_empty() => Ok(Attendee::Guest(guest.trim().to_string())),
            (None, Some(_)) => Err(AppError::InvalidState("guest identifier must not be blank".to_string())),
            (Some(_), Some(_)) => Err(AppError::InvalidState(
                "a registration cannot have both a user and a guest".to_string(),
            )),
            (None, None) => Err(AppError::InvalidState(
                "a registration needs either a user or a guest".to_string(),
            )),
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Attendee::User(id) => Some(*id),
            Attendee::Guest(_) => None,
        }
    }

    pub fn guest_identifier(&self) -> Option<&str> {
        match self {
            Attendee::User(_) => None,
            Attendee::Guest(name) => Some(name.as_str()),
        }
    }
}

impl Registration {
    pub fn new(event_id: Uuid, attendee: &Attendee, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id,
            user_id: attendee.user_id(),
            guest_identifier: attendee.guest_identifier().map(str::to_string),
            created_at: now,
        }
    }

    pub fn attendee(&self) -> Result<Attendee, AppError> {
        Attendee::from_parts(self.user_id, self.guest_identifier.clone())
    }
}
