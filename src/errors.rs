use actix_web::{error, http::StatusCode, HttpResponse};
use derive_more::Display;

#[derive(Debug, Display)]
pub enum AppError {
    #[display(fmt = "internal error: {}", _0)]
    InternalError(String),

    #[display(fmt = "bad request: {}", _0)]
    BadClientData(String),

    #[display(fmt = "event or invitation not found")]
    NotFound,

    #[display(fmt = "only the event organizer can perform this action")]
    Unauthorized,

    #[display(fmt = "invitations cannot be created for events that already happened")]
    EventAlreadyOccurred,

    #[display(fmt = "the event has reached its maximum capacity")]
    CapacityExceeded,

    #[display(fmt = "an active invitation already exists for \"{}\"; if this is someone else, use a different name", _0)]
    DuplicateActiveInvitation(String),

    #[display(fmt = "this invitation is invalid or was not found")]
    InvalidToken,

    #[display(fmt = "this invitation has already been answered")]
    AlreadyResponded,

    #[display(fmt = "this invitation has expired and can no longer be answered")]
    Expired,

    #[display(fmt = "invalid state: {}", _0)]
    InvalidState(String),

    #[display(fmt = "the user is already registered for this event")]
    DuplicateRegistration,

    #[display(fmt = "configuration error: {}", _0)]
    ConfigurationError(String),
}

impl std::error::Error for AppError {}

impl AppError {
    /// Message that is safe to show to the end user; internal details are replaced by a generic text.
    pub fn public_message(&self) -> String {
        match self {
            AppError::InternalError(_) => "Something went wrong, please try again.".to_string(),
            AppError::ConfigurationError(_) => "The service is not configured to perform this action.".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalError(format!("database: {}", err))
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::InternalError(format!("migration: {}", err))
    }
}

impl error::ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .json(serde_json::json!({ "success": false, "message": self.public_message() }))
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadClientData(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidState(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::InvalidToken => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::FORBIDDEN,
            AppError::EventAlreadyOccurred => StatusCode::CONFLICT,
            AppError::CapacityExceeded => StatusCode::CONFLICT,
            AppError::DuplicateActiveInvitation(_) => StatusCode::CONFLICT,
            AppError::AlreadyResponded => StatusCode::CONFLICT,
            AppError::DuplicateRegistration => StatusCode::CONFLICT,
            AppError::Expired => StatusCode::GONE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::ResponseError;

    #[test]
    fn duplicate_invitation_message_names_the_guest() {
        let err = AppError::DuplicateActiveInvitation("Ana Silva".to_string());
        assert!(err.to_string().contains("\"Ana Silva\""));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn internal_details_are_not_exposed() {
        let err = AppError::InternalError("connection refused".to_string());
        assert!(!err.public_message().contains("connection refused"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn expired_maps_to_gone() {
        assert_eq!(AppError::Expired.status_code(), StatusCode::GONE);
        assert_eq!(AppError::Expired.public_message(), AppError::Expired.to_string());
    }
}
