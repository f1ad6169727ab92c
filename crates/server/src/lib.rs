use api_types::ApiResponse;
use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::{EngineError, ErrorKind, Money};

pub use server::{ClientId, ServerState, router, run, run_with_listener, spawn_with_listener};

mod accounts;
mod entries;
mod extract;
mod future_payments;
mod server;

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err.kind() {
        ErrorKind::Validation | ErrorKind::InsufficientBalance => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    if err.is_storage() {
        tracing::error!("storage error: {err}");
        return "internal server error".to_string();
    }
    err.to_string()
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(ApiResponse::error(error))).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

pub(crate) type ApiResult<T> = Result<Json<ApiResponse<T>>, ServerError>;

pub(crate) fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::ok(data)))
}

/// Decimal strings from request bodies.
pub(crate) fn parse_money(value: &str) -> Result<Money, ServerError> {
    value.parse().map_err(ServerError::Engine)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use sea_orm::DbErr;

    use super::*;

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::NotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_validation_maps_to_422() {
        let res = ServerError::from(EngineError::Validation("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let res =
            ServerError::from(EngineError::CurrencyMismatch("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn insufficient_balance_maps_to_422() {
        let res =
            ServerError::from(EngineError::InsufficientBalance("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn storage_failures_map_to_500() {
        for err in [
            EngineError::Storage(DbErr::Custom("disk".to_string())),
            EngineError::Conflict("busy".to_string()),
            EngineError::Timeout(Duration::from_secs(5)),
        ] {
            let res = ServerError::from(err).into_response();
            assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn storage_detail_is_not_leaked() {
        let message = message_for_engine_error(EngineError::Storage(DbErr::Custom(
            "secret table layout".to_string(),
        )));
        assert_eq!(message, "internal server error");
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
