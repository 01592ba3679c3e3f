use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

use crate::Error;

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::StateMismatch | Error::AuthorizationDenied(_) => StatusCode::FORBIDDEN,
            Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Error::NotAuthenticated => StatusCode::UNAUTHORIZED,
            Error::NoResults { .. } => StatusCode::NOT_FOUND,
            Error::HandoffTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Error::TokenExchange(_)
            | Error::Refresh(_)
            | Error::Search { .. }
            | Error::PlaylistCreation(_)
            | Error::Append(_)
            | Error::CurrentUser(_) => StatusCode::BAD_GATEWAY,
            Error::HandoffClosed | Error::Config(_) | Error::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self, "request failed");
            "Internal server error".to_string()
        } else {
            warn!(error = %self, status = status.as_u16(), "request rejected");
            self.to_string()
        };
        (status, message).into_response()
    }
}
