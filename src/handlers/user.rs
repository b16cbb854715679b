use actix_web::{get, web, HttpResponse, Responder, ResponseError};
use uuid::Uuid;

use crate::{dto::RegistrationCountResponse, service, state::AppState};

use super::log_failure;

#[get("/{user_id}/registrations/count")]
pub async fn count_registrations(user_id: web::Path<Uuid>, state: web::Data<AppState>) -> impl Responder {
    match service::registration::count_by_user(&state, user_id.into_inner()).await {
        Ok(count) => HttpResponse::Ok().json(RegistrationCountResponse { count }),
        Err(err) => {
            log_failure("GET /users/{id}/registrations/count", &err);
            err.error_response()
        }
    }
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(count_registrations);
}
