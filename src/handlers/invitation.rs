use actix_web::{delete, get, http::StatusCode, post, web, HttpResponse, Responder, ResponseError};
use log::debug;
use uuid::Uuid;

use crate::{
    dto::{ActionResponse, RespondInvitationDto, TokenLookupResponse},
    service,
    state::AppState,
};

use super::log_failure;

#[get("/{token}")]
pub async fn get_by_token(token: web::Path<String>, state: web::Data<AppState>) -> impl Responder {
    let lookup = service::invitation::get_by_token(&state, &token.into_inner()).await;
    let status = match &lookup.error {
        Some(err) => {
            log_failure("GET /invitations/{token}", err);
            // a known token is still shown to the guest, whatever its state
            if lookup.invitation.is_some() {
                StatusCode::OK
            } else {
                err.status_code()
            }
        }
        None => StatusCode::OK,
    };
    HttpResponse::build(status).json(TokenLookupResponse {
        data: lookup.invitation,
        error: lookup.error.map(|err| err.public_message()),
    })
}

#[post("/{token}/response")]
pub async fn respond(
    token: web::Path<String>,
    dto: web::Json<RespondInvitationDto>,
    state: web::Data<AppState>,
) -> impl Responder {
    let RespondInvitationDto { response, path } = dto.into_inner();
    match service::invitation::respond(&state, &token.into_inner(), response).await {
        Ok(message) => {
            if let Some(path) = path {
                debug!("invitation answered from page {}", path);
            }
            HttpResponse::Ok().json(ActionResponse::ok(message))
        }
        Err(err) => {
            log_failure("POST /invitations/{token}/response", &err);
            HttpResponse::build(err.status_code()).json(ActionResponse::failed(&err))
        }
    }
}

#[delete("/{invitation_id}")]
pub async fn delete_invitation(invitation_id: web::Path<Uuid>, state: web::Data<AppState>) -> impl Responder {
    match service::invitation::delete(&state, invitation_id.into_inner()).await {
        Ok(()) => HttpResponse::Ok().json(ActionResponse::ok("Invitation deleted.")),
        Err(err) => {
            log_failure("DELETE /invitations/{id}", &err);
            HttpResponse::build(err.status_code()).json(ActionResponse::failed(&err))
        }
    }
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_by_token).service(respond).service(delete_invitation);
}
