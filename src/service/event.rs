use log::warn;
use uuid::Uuid;

use crate::{
    db::{CapacityGuard, EventRepository, InvitationRepository, RegistrationRepository, UserRepository},
    dto::{EventOverview, ParticipantStatus, UnifiedParticipant},
    errors::AppError,
    service::capacity::OccupancyView,
    state::AppState,
};

pub async fn get_overview(state: &AppState, event_id: Uuid) -> Result<EventOverview, AppError> {
    let details = state
        .store
        .find_event_details(event_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let occupancy = state.store.occupancy(event_id).await?;
    Ok(EventOverview {
        occupancy: OccupancyView::new(details.event.capacity, occupancy.occupied()),
        participant_count: occupancy.registrations,
        details,
    })
}

/// Confirmed registrations followed by pending invitations, each oldest first.
pub async fn get_participants(state: &AppState, event_id: Uuid) -> Result<Vec<UnifiedParticipant>, AppError> {
    let registrations = state.store.list_registrations_by_event(event_id).await?;
    let user_ids: Vec<Uuid> = registrations.iter().filter_map(|reg| reg.user_id).collect();
    let names = state.store.find_names(&user_ids).await?;

    let mut participants = Vec::with_capacity(registrations.len());
    for registration in &registrations {
        match (registration.user_id, &registration.guest_identifier) {
            (Some(user_id), _) => match names.get(&user_id) {
                Some(name) => participants.push(UnifiedParticipant {
                    id: user_id,
                    name: name.clone(),
                    status: ParticipantStatus::Confirmed,
                }),
                None => warn!(
                    "registration {} points to unknown user {}, skipped",
                    registration.id, user_id
                ),
            },
            (None, Some(guest)) => participants.push(UnifiedParticipant {
                id: registration.id,
                name: guest.clone(),
                status: ParticipantStatus::Confirmed,
            }),
            (None, None) => warn!("registration {} has no identity, skipped", registration.id),
        }
    }

    let pending = state.store.list_pending_invitations(event_id).await?;
    participants.extend(pending.into_iter().map(|invitation| UnifiedParticipant {
        id: invitation.id,
        name: invitation.guest_identifier,
        status: ParticipantStatus::Pending,
    }));
    Ok(participants)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dto::InvitationResponse,
        models::{Category, Event},
        service::{invitation, registration},
        test_support::{seed_event, TestContext},
    };
    use chrono::Duration;

    #[actix_rt::test]
    async fn participants_merge_registrations_and_pending_invitations() {
        let ctx = TestContext::new();
        let event = seed_event(&ctx, 10, Duration::days(3)).await;
        let user = ctx.user("Rafael Souza").await;
        registration::toggle(&ctx.state, event.id, user.id).await.unwrap();

        ctx.clock.advance(Duration::minutes(1));
        let ana = invitation::create(&ctx.state, event.id, ctx.organizer.id, "Ana Silva")
            .await
            .unwrap();
        invitation::respond(&ctx.state, &ana.invitation.token, InvitationResponse::Accepted)
            .await
            .unwrap();
        let bruno = invitation::create(&ctx.state, event.id, ctx.organizer.id, "Bruno Costa")
            .await
            .unwrap();
        let carla = invitation::create(&ctx.state, event.id, ctx.organizer.id, "Carla Dias")
            .await
            .unwrap();
        invitation::respond(&ctx.state, &carla.invitation.token, InvitationResponse::Denied)
            .await
            .unwrap();

        let participants = get_participants(&ctx.state, event.id).await.unwrap();
        let summary: Vec<(&str, ParticipantStatus)> =
            participants.iter().map(|p| (p.name.as_str(), p.status)).collect();
        assert_eq!(
            summary,
            vec![
                ("Rafael Souza", ParticipantStatus::Confirmed),
                ("Ana Silva", ParticipantStatus::Confirmed),
                ("Bruno Costa", ParticipantStatus::Pending),
            ]
        );
        assert_eq!(participants[0].id, user.id);
        assert_eq!(participants[2].id, bruno.invitation.id);
    }

    #[actix_rt::test]
    async fn unknown_users_are_left_out() {
        let ctx = TestContext::new();
        let event = seed_event(&ctx, 0, Duration::days(3)).await;
        registration::create(&ctx.state, event.id, Some(Uuid::new_v4()), None)
            .await
            .unwrap();
        ctx.register_guest(event.id, "Ana Silva").await;

        let participants = get_participants(&ctx.state, event.id).await.unwrap();
        assert_eq!(participants.len(), 1);
        assert_eq!(participants[0].name, "Ana Silva");
    }

    #[actix_rt::test]
    async fn overview_reports_occupancy_and_names() {
        let ctx = TestContext::new();
        let category = Category {
            id: Uuid::new_v4(),
            name: "Workshops".to_string(),
        };
        ctx.store.insert_category(category.clone()).await;
        ctx.store.insert_user(ctx.organizer.clone()).await;
        let event = Event {
            id: Uuid::new_v4(),
            title: "Pottery night".to_string(),
            capacity: 4,
            start_date_time: ctx.now() + Duration::days(1),
            organizer_id: ctx.organizer.id,
            category_id: Some(category.id),
        };
        ctx.store.insert_event(event.clone()).await;
        ctx.register_guest(event.id, "Ana Silva").await;
        ctx.pending_invitation(event.id, "Bruno Costa").await;

        let overview = get_overview(&ctx.state, event.id).await.unwrap();
        assert_eq!(overview.details.category_name.as_deref(), Some("Workshops"));
        assert_eq!(overview.details.organizer_name.as_deref(), Some("Olivia Organizer"));
        assert_eq!(overview.participant_count, 1);
        assert_eq!(overview.occupancy, OccupancyView::new(4, 2));
    }

    #[actix_rt::test]
    async fn overview_of_missing_event_is_not_found() {
        let ctx = TestContext::new();
        let err = get_overview(&ctx.state, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }
}
