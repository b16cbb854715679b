use actix_web::{delete, get, post, web, HttpResponse, Responder, ResponseError};
use log::debug;
use uuid::Uuid;

use crate::{
    dto::{
        ActionResponse, CreateInvitationResponse, InvitationListResponse, NewInvitationDto, OrganizerQuery,
        ToggleRegistrationDto,
    },
    service,
    state::AppState,
};

use super::log_failure;

#[get("/{event_id}")]
pub async fn get_overview(event_id: web::Path<Uuid>, state: web::Data<AppState>) -> impl Responder {
    match service::event::get_overview(&state, event_id.into_inner()).await {
        Ok(overview) => HttpResponse::Ok().json(overview),
        Err(err) => {
            log_failure("GET /events/{id}", &err);
            err.error_response()
        }
    }
}

#[get("/{event_id}/occupancy")]
pub async fn get_occupancy(event_id: web::Path<Uuid>, state: web::Data<AppState>) -> impl Responder {
    match service::capacity::get_occupancy(&state, event_id.into_inner()).await {
        Ok(occupancy) => HttpResponse::Ok().json(occupancy),
        Err(err) => {
            log_failure("GET /events/{id}/occupancy", &err);
            err.error_response()
        }
    }
}

#[post("/{event_id}/invitations")]
pub async fn create_invitation(
    event_id: web::Path<Uuid>,
    dto: web::Json<NewInvitationDto>,
    state: web::Data<AppState>,
) -> impl Responder {
    let NewInvitationDto {
        organizer_id,
        guest_identifier,
        path,
    } = dto.into_inner();
    let res = service::invitation::create(&state, event_id.into_inner(), organizer_id, &guest_identifier).await;
    match res {
        Ok(created) => {
            if let Some(path) = path {
                debug!("invitation created from page {}", path);
            }
            HttpResponse::Created().json(CreateInvitationResponse::created(created.invitation, created.link))
        }
        Err(err) => {
            log_failure("POST /events/{id}/invitations", &err);
            HttpResponse::build(err.status_code()).json(CreateInvitationResponse::failed(&err))
        }
    }
}

#[get("/{event_id}/invitations")]
pub async fn list_invitations(
    event_id: web::Path<Uuid>,
    query: web::Query<OrganizerQuery>,
    state: web::Data<AppState>,
) -> impl Responder {
    let res = service::invitation::list_by_event(&state, event_id.into_inner(), query.organizer_id).await;
    match res {
        Ok(list) => HttpResponse::Ok().json(InvitationListResponse {
            invitations: list.invitations,
            cleanup_performed: list.cleanup_performed,
            error: None,
        }),
        Err(err) => {
            log_failure("GET /events/{id}/invitations", &err);
            HttpResponse::build(err.status_code()).json(InvitationListResponse {
                invitations: Vec::new(),
                cleanup_performed: false,
                error: Some(err.public_message()),
            })
        }
    }
}

#[get("/{event_id}/participants")]
pub async fn list_participants(event_id: web::Path<Uuid>, state: web::Data<AppState>) -> impl Responder {
    match service::event::get_participants(&state, event_id.into_inner()).await {
        Ok(participants) => HttpResponse::Ok().json(participants),
        Err(err) => {
            log_failure("GET /events/{id}/participants", &err);
            err.error_response()
        }
    }
}

#[post("/{event_id}/registrations/toggle")]
pub async fn toggle_registration(
    event_id: web::Path<Uuid>,
    dto: web::Json<ToggleRegistrationDto>,
    state: web::Data<AppState>,
) -> impl Responder {
    let ToggleRegistrationDto { user_id, path } = dto.into_inner();
    match service::registration::toggle(&state, event_id.into_inner(), user_id).await {
        Ok(toggled) => {
            if let Some(path) = path {
                debug!("registration toggled from page {}", path);
            }
            HttpResponse::Ok().json(ActionResponse::ok(toggled.message()))
        }
        Err(err) => {
            log_failure("POST /events/{id}/registrations/toggle", &err);
            HttpResponse::build(err.status_code()).json(ActionResponse::failed(&err))
        }
    }
}

#[delete("/{event_id}/registrations/{user_id}")]
pub async fn delete_registration(path: web::Path<(Uuid, Uuid)>, state: web::Data<AppState>) -> impl Responder {
    let (event_id, user_id) = path.into_inner();
    match service::registration::delete(&state, event_id, user_id).await {
        Ok(()) => HttpResponse::Ok().json(ActionResponse::ok("Registration removed.")),
        Err(err) => {
            log_failure("DELETE /events/{id}/registrations/{user}", &err);
            HttpResponse::build(err.status_code()).json(ActionResponse::failed(&err))
        }
    }
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_overview)
        .service(get_occupancy)
        .service(create_invitation)
        .service(list_invitations)
        .service(list_participants)
        .service(toggle_registration)
        .service(delete_registration);
}
