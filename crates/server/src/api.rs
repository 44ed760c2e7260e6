use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request as ExtractRequest},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde::{de::DeserializeOwned, Serialize};
use tidyquote_core::errors::{ApplicationError, DomainError, InterfaceError};
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tracing::{error, warn, Level};
use uuid::Uuid;

use crate::state::AppState;
use crate::{crm, health, quotes, rates};

pub fn router(state: AppState) -> Router {
    let trace = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<_>| {
            tracing::info_span!("http_request", method = %request.method(), uri = %request.uri())
        })
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .merge(health::routes())
        .merge(quotes::routes())
        .merge(rates::routes())
        .merge(crm::routes())
        .layer(trace)
        .with_state(state)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    pub correlation_id: String,
}

/// Handler error; renders as a JSON body with a correlation id that also
/// appears in the log line.
#[derive(Debug)]
pub struct ApiError(pub InterfaceError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
            InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        Self(error.into_interface(Uuid::new_v4().to_string()))
    }
}

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        ApplicationError::from(error).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let interface = self.0;
        if status.is_server_error() {
            error!(
                event_name = "http.request_failed",
                correlation_id = interface.correlation_id(),
                status = status.as_u16(),
                error = interface.message(),
                "request failed"
            );
        } else {
            warn!(
                event_name = "http.request_rejected",
                correlation_id = interface.correlation_id(),
                status = status.as_u16(),
                error = interface.message(),
                "request rejected"
            );
        }

        // Client errors carry the domain message; server errors only the safe text.
        let message = if status.is_client_error() {
            interface.message().to_owned()
        } else {
            interface.user_message().to_owned()
        };
        let body = ErrorBody {
            error: interface.user_message().to_owned(),
            message,
            correlation_id: interface.correlation_id().to_owned(),
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        DomainError::InvalidArgument(format!("request body rejected: {}", rejection.body_text()))
            .into()
    }
}

/// JSON request body whose rejections render through `ApiError`.
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(request: ExtractRequest, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(request, state).await?;
        Ok(Self(value))
    }
}
