use log::info;
use uuid::Uuid;

use crate::{
    db::{CapacityGuard, EventRepository, RegistrationRepository},
    errors::AppError,
    models::{Attendee, Registration},
    state::AppState,
};

/// Records a seat without any capacity check. Exactly one identity must be given.
pub async fn create(
    state: &AppState,
    event_id: Uuid,
    user_id: Option<Uuid>,
    guest_identifier: Option<String>,
) -> Result<Registration, AppError> {
    let attendee = Attendee::from_parts(user_id, guest_identifier)?;
    let registration = Registration::new(event_id, &attendee, state.now());
    state.store.insert_registration(&registration).await?;
    Ok(registration)
}

/// Removes the user's seat, if any.
pub async fn delete(state: &AppState, event_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
    if state.store.delete_user_registration(event_id, user_id).await? {
        info!("registration of user {} for event {} removed", user_id, event_id);
    }
    Ok(())
}

pub async fn count_by_event(state: &AppState, event_id: Uuid) -> Result<u64, AppError> {
    state.store.count_registrations_by_event(event_id).await
}

pub async fn count_by_user(state: &AppState, user_id: Uuid) -> Result<u64, AppError> {
    state.store.count_registrations_by_user(user_id).await
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggled {
    Registered,
    Cancelled,
}

impl Toggled {
    pub fn message(self) -> &'static str {
        match self {
            Toggled::Registered => "Registration confirmed.",
            Toggled::Cancelled => "Registration cancelled.",
        }
    }
}

/// Joins the event, or leaves it when the user is already registered.
pub async fn toggle(state: &AppState, event_id: Uuid, user_id: Uuid) -> Result<Toggled, AppError> {
    if state.store.find_user_registration(event_id, user_id).await?.is_some() {
        delete(state, event_id, user_id).await?;
        return Ok(Toggled::Cancelled);
    }
    if state.store.find_event(event_id).await?.is_none() {
        return Err(AppError::NotFound);
    }
    let registration = Registration::new(event_id, &Attendee::User(user_id), state.now());
    state.store.register_user_guarded(&registration).await?;
    info!("user {} registered for event {}", user_id, event_id);
    Ok(Toggled::Registered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_event, TestContext};
    use chrono::Duration;

    #[actix_rt::test]
    async fn identity_contract_is_enforced() {
        let ctx = TestContext::new();
        let event = seed_event(&ctx, 0, Duration::days(2)).await;

        let err = create(&ctx.state, event.id, Some(Uuid::new_v4()), Some("Ana".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
        let err = create(&ctx.state, event.id, None, None).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
        assert_eq!(count_by_event(&ctx.state, event.id).await.unwrap(), 0);
    }

    #[actix_rt::test]
    async fn users_register_once_guests_many_times() {
        let ctx = TestContext::new();
        let event = seed_event(&ctx, 0, Duration::days(2)).await;
        let user = ctx.user("Rafael Souza").await;

        create(&ctx.state, event.id, Some(user.id), None).await.unwrap();
        let err = create(&ctx.state, event.id, Some(user.id), None).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateRegistration));

        create(&ctx.state, event.id, None, Some("Ana Silva".to_string())).await.unwrap();
        create(&ctx.state, event.id, None, Some("Ana Silva".to_string())).await.unwrap();
        assert_eq!(count_by_event(&ctx.state, event.id).await.unwrap(), 3);
        assert_eq!(count_by_user(&ctx.state, user.id).await.unwrap(), 1);
    }

    #[actix_rt::test]
    async fn delete_is_idempotent() {
        let ctx = TestContext::new();
        let event = seed_event(&ctx, 0, Duration::days(2)).await;
        let user = ctx.user("Rafael Souza").await;
        create(&ctx.state, event.id, Some(user.id), None).await.unwrap();

        delete(&ctx.state, event.id, user.id).await.unwrap();
        delete(&ctx.state, event.id, user.id).await.unwrap();
        assert_eq!(count_by_event(&ctx.state, event.id).await.unwrap(), 0);
    }

    #[actix_rt::test]
    async fn toggle_joins_then_leaves() {
        let ctx = TestContext::new();
        let event = seed_event(&ctx, 2, Duration::days(2)).await;
        let user = ctx.user("Rafael Souza").await;

        assert_eq!(toggle(&ctx.state, event.id, user.id).await.unwrap(), Toggled::Registered);
        assert_eq!(count_by_event(&ctx.state, event.id).await.unwrap(), 1);
        assert_eq!(toggle(&ctx.state, event.id, user.id).await.unwrap(), Toggled::Cancelled);
        assert_eq!(count_by_event(&ctx.state, event.id).await.unwrap(), 0);
    }

    #[actix_rt::test]
    async fn pending_invitations_count_against_direct_joins() {
        let ctx = TestContext::new();
        let event = seed_event(&ctx, 2, Duration::days(2)).await;
        ctx.register_guest(event.id, "Carla Dias").await;
        ctx.pending_invitation(event.id, "Davi Lima").await;
        let user = ctx.user("Rafael Souza").await;

        let err = toggle(&ctx.state, event.id, user.id).await.unwrap_err();
        assert!(matches!(err, AppError::CapacityExceeded));
    }

    #[actix_rt::test]
    async fn toggle_needs_an_event() {
        let ctx = TestContext::new();
        let err = toggle(&ctx.state, Uuid::new_v4(), Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }
}
