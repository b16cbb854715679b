use chrono::{DateTime, Duration, Utc};
use log::{info, warn};
use uuid::Uuid;

use crate::{
    db::{CapacityGuard, EventRepository, InvitationRepository},
    dto::{InvitationResponse, InvitationView},
    errors::AppError,
    models::{Attendee, Invitation, InvitationStatus, Registration},
    service::{capacity::has_room, crypto::generate_invitation_token},
    state::AppState,
};

pub const DEFAULT_EXPIRATION_HOURS: i64 = 48;

/// Deadline for answering an invitation created at `now`.
///
/// Events more than 48 hours away get a flat 48 hour window; closer events
/// expire halfway between now and the start.
pub fn compute_expiry(event_start: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    let until_event = event_start - now;
    let window = Duration::hours(DEFAULT_EXPIRATION_HOURS);
    if until_event < window {
        now + until_event / 2
    } else {
        now + window
    }
}

pub fn invitation_link(base_url: &str, event_id: Uuid, token: &str) -> String {
    format!(
        "{}/events/{}?invite_token={}",
        base_url.trim_end_matches('/'),
        event_id,
        token
    )
}

#[derive(Debug)]
pub struct CreatedInvitation {
    pub invitation: Invitation,
    pub link: String,
}

pub async fn create(
    state: &AppState,
    event_id: Uuid,
    organizer_id: Uuid,
    guest_identifier: &str,
) -> Result<CreatedInvitation, AppError> {
    let base_url = state.settings.base_url()?;
    let guest = guest_identifier.trim();
    if guest.is_empty() {
        return Err(AppError::BadClientData("guest name must not be empty".to_string()));
    }
    let now = state.now();

    if state.store.find_active_invitation(event_id, guest, now).await?.is_some() {
        return Err(AppError::DuplicateActiveInvitation(guest.to_string()));
    }
    let event = state.store.find_event(event_id).await?.ok_or(AppError::NotFound)?;
    if event.organizer_id != organizer_id {
        return Err(AppError::Unauthorized);
    }
    if event.start_date_time <= now {
        return Err(AppError::EventAlreadyOccurred);
    }
    let occupancy = state.store.occupancy(event_id).await?;
    if !has_room(event.capacity, occupancy.occupied()) {
        return Err(AppError::CapacityExceeded);
    }

    let invitation = Invitation {
        id: Uuid::new_v4(),
        event_id,
        organizer_id,
        guest_identifier: guest.to_string(),
        status: InvitationStatus::Pending,
        token: generate_invitation_token(),
        expires_at: compute_expiry(event.start_date_time, now),
        created_at: now,
        updated_at: now,
    };
    state.store.insert_invitation_guarded(&invitation, now).await?;
    info!(
        "invitation {} created for event {} (expires {})",
        invitation.id, event_id, invitation.expires_at
    );

    let link = invitation_link(base_url, event_id, &invitation.token);
    Ok(CreatedInvitation { invitation, link })
}

/// Expires overdue pending invitations of the event. True when any row changed.
pub async fn sweep_expired(state: &AppState, event_id: Uuid) -> Result<bool, AppError> {
    let changed = state.store.expire_stale_invitations(event_id, state.now()).await?;
    if changed > 0 {
        info!("expired {} stale invitation(s) of event {}", changed, event_id);
    }
    Ok(changed > 0)
}

#[derive(Debug)]
pub struct InvitationList {
    pub invitations: Vec<Invitation>,
    pub cleanup_performed: bool,
}

pub async fn list_by_event(state: &AppState, event_id: Uuid, organizer_id: Uuid) -> Result<InvitationList, AppError> {
    let event = state.store.find_event(event_id).await?.ok_or(AppError::NotFound)?;
    if event.organizer_id != organizer_id {
        return Err(AppError::Unauthorized);
    }
    let cleanup_performed = match sweep_expired(state, event_id).await {
        Ok(changed) => changed,
        Err(err) => {
            warn!("invitation sweep for event {} failed: {}", event_id, err);
            false
        }
    };
    let invitations = state.store.list_invitations_by_event(event_id).await?;
    Ok(InvitationList {
        invitations,
        cleanup_performed,
    })
}

/// Result of opening an invitation link.
///
/// `invitation` is filled whenever the token is known, so the page can show
/// what happened to it; `error` explains why it cannot be answered.
#[derive(Debug)]
pub struct TokenLookup {
    pub invitation: Option<InvitationView>,
    pub error: Option<AppError>,
}

pub async fn get_by_token(state: &AppState, token: &str) -> TokenLookup {
    match lookup_token(state, token).await {
        Ok(lookup) => lookup,
        Err(err) => TokenLookup {
            invitation: None,
            error: Some(err),
        },
    }
}

async fn lookup_token(state: &AppState, token: &str) -> Result<TokenLookup, AppError> {
    let mut invitation = state
        .store
        .find_invitation_by_token(token)
        .await?
        .ok_or(AppError::InvalidToken)?;
    let now = state.now();

    let error = if invitation.status.is_terminal() {
        Some(AppError::AlreadyResponded)
    } else if invitation.is_past_expiry(now) {
        if state
            .store
            .resolve_pending_invitation(invitation.id, InvitationStatus::Expired, now)
            .await?
        {
            invitation.status = InvitationStatus::Expired;
            invitation.updated_at = now;
        }
        Some(AppError::Expired)
    } else {
        None
    };

    let event = state.store.find_event_details(invitation.event_id).await?;
    Ok(TokenLookup {
        invitation: Some(InvitationView { invitation, event }),
        error,
    })
}

pub async fn respond(state: &AppState, token: &str, response: InvitationResponse) -> Result<String, AppError> {
    let invitation = state
        .store
        .find_invitation_by_token(token)
        .await?
        .ok_or(AppError::InvalidToken)?;
    if invitation.status.is_terminal() {
        return Err(AppError::AlreadyResponded);
    }
    let now = state.now();
    if invitation.is_past_expiry(now) {
        state
            .store
            .resolve_pending_invitation(invitation.id, InvitationStatus::Expired, now)
            .await?;
        info!("invitation {} expired before it was answered", invitation.id);
        return Err(AppError::Expired);
    }

    match response {
        InvitationResponse::Denied => {
            if !state
                .store
                .resolve_pending_invitation(invitation.id, InvitationStatus::Denied, now)
                .await?
            {
                return Err(AppError::AlreadyResponded);
            }
            info!("invitation {} denied by {}", invitation.id, invitation.guest_identifier);
            Ok("Invitation declined.".to_string())
        }
        InvitationResponse::Accepted => {
            if state.store.find_event(invitation.event_id).await?.is_none() {
                return Err(AppError::NotFound);
            }
            let registration = Registration::new(
                invitation.event_id,
                &Attendee::Guest(invitation.guest_identifier.clone()),
                now,
            );
            state
                .store
                .accept_invitation_guarded(&invitation, &registration, now)
                .await?;
            info!(
                "invitation {} accepted, guest registration {} created",
                invitation.id, registration.id
            );
            Ok("Invitation accepted.".to_string())
        }
    }
}

pub async fn delete(state: &AppState, invitation_id: Uuid) -> Result<(), AppError> {
    if !state.store.delete_invitation(invitation_id).await? {
        return Err(AppError::NotFound);
    }
    info!("invitation {} deleted", invitation_id);
    Ok(())
}
