pub mod event;
pub mod invitation;
pub mod user;

use actix_web::web;
use log::{error, info};

use crate::errors::AppError;

fn log_failure(route: &str, err: &AppError) {
    match err {
        AppError::InternalError(_) | AppError::ConfigurationError(_) => error!("{} failed: {}", route, err),
        _ => info!("{} rejected: {}", route, err),
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/events").configure(event::init_routes))
        .service(web::scope("/invitations").configure(invitation::init_routes))
        .service(web::scope("/users").configure(user::init_routes));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::InvitationRepository,
        models::InvitationStatus,
        test_support::{seed_event, TestContext},
    };
    use actix_web::{http::StatusCode, test, App};
    use chrono::Duration;
    use serde_json::{json, Value};

    macro_rules! app {
        ($ctx:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($ctx.state.clone()))
                    .configure(config),
            )
            .await
        };
    }

    #[actix_rt::test]
    async fn invitation_round_trip_over_http() {
        let ctx = TestContext::new();
        let event = seed_event(&ctx, 1, Duration::days(3)).await;
        let app = app!(ctx);

        let req = test::TestRequest::post()
            .uri(&format!("/events/{}/invitations", event.id))
            .set_json(json!({ "organizerId": ctx.organizer.id, "guestIdentifier": "Ana Silva", "path": "/events" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        let token = body["invitation"]["token"].as_str().unwrap().to_string();
        assert!(body["link"].as_str().unwrap().ends_with(&format!("?invite_token={}", token)));

        let req = test::TestRequest::post()
            .uri(&format!("/events/{}/invitations", event.id))
            .set_json(json!({ "organizerId": ctx.organizer.id, "guestIdentifier": "Bruno Costa" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert!(body.get("invitation").is_none());

        let req = test::TestRequest::get().uri(&format!("/invitations/{}", token)).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["guestIdentifier"], "Ana Silva");
        assert_eq!(body["data"]["status"], "pending");
        assert_eq!(body["error"], Value::Null);

        let req = test::TestRequest::post()
            .uri(&format!("/invitations/{}/response", token))
            .set_json(json!({ "response": "accepted" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);

        let req = test::TestRequest::get()
            .uri(&format!("/events/{}/participants", event.id))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!([{ "id": body[0]["id"], "name": "Ana Silva", "status": "confirmed" }]));
    }

    #[actix_rt::test]
    async fn listing_reports_cleanup() {
        let ctx = TestContext::new();
        let event = seed_event(&ctx, 3, Duration::days(3)).await;
        ctx.pending_invitation(event.id, "Ana Silva").await;
        ctx.clock.advance(Duration::hours(2));
        let app = app!(ctx);

        let uri = format!("/events/{}/invitations?organizerId={}", event.id, ctx.organizer.id);
        let body: Value = test::call_and_read_body_json(&app, test::TestRequest::get().uri(&uri).to_request()).await;
        assert_eq!(body["cleanupPerformed"], true);
        assert_eq!(body["invitations"][0]["status"], "expired");

        let body: Value = test::call_and_read_body_json(&app, test::TestRequest::get().uri(&uri).to_request()).await;
        assert_eq!(body["cleanupPerformed"], false);
        assert_eq!(
            ctx.store.count_invitations(event.id, InvitationStatus::Expired).await.unwrap(),
            1
        );
    }

    #[actix_rt::test]
    async fn strangers_cannot_list_invitations() {
        let ctx = TestContext::new();
        let event = seed_event(&ctx, 3, Duration::days(3)).await;
        let app = app!(ctx);

        let uri = format!("/events/{}/invitations?organizerId={}", event.id, uuid::Uuid::new_v4());
        let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["invitations"], json!([]));
        assert!(body["error"].is_string());
    }

    #[actix_rt::test]
    async fn unknown_token_is_not_found() {
        let ctx = TestContext::new();
        let app = app!(ctx);
        let resp = test::call_service(&app, test::TestRequest::get().uri("/invitations/nope").to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"], Value::Null);
    }

    #[actix_rt::test]
    async fn toggle_and_delete_registration() {
        let ctx = TestContext::new();
        let event = seed_event(&ctx, 5, Duration::days(3)).await;
        let user = ctx.user("Rafael Souza").await;
        let app = app!(ctx);

        let req = test::TestRequest::post()
            .uri(&format!("/events/{}/registrations/toggle", event.id))
            .set_json(json!({ "userId": user.id }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["message"], "Registration confirmed.");

        let req = test::TestRequest::get()
            .uri(&format!("/users/{}/registrations/count", user.id))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["count"], 1);

        let req = test::TestRequest::get()
            .uri(&format!("/events/{}/occupancy", event.id))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({ "capacity": 5, "occupied": 1, "available": 4 }));

        for _ in 0..2 {
            let req = test::TestRequest::delete()
                .uri(&format!("/events/{}/registrations/{}", event.id, user.id))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let req = test::TestRequest::get().uri(&format!("/events/{}", event.id)).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["participantCount"], 0);
        assert_eq!(body["organizerName"], "Olivia Organizer");
    }

    #[actix_rt::test]
    async fn delete_invitation_over_http() {
        let ctx = TestContext::new();
        let event = seed_event(&ctx, 3, Duration::days(3)).await;
        let invitation = ctx.pending_invitation(event.id, "Ana Silva").await;
        let app = app!(ctx);

        let uri = format!("/invitations/{}", invitation.id);
        let resp = test::call_service(&app, test::TestRequest::delete().uri(&uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let resp = test::call_service(&app, test::TestRequest::delete().uri(&uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(ctx.store.list_invitations_by_event(event.id).await.unwrap().is_empty());
    }
}
