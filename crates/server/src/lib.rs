use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{ClientOrigin, ServerState, router, run, run_with_listener, spawn_with_listener};

mod server;
mod transactions;

pub mod types {
    pub mod transaction {
        pub use api_types::transaction::{
            BalanceResponse, ChallengeAccepted, ChallengeNew, DepositNew, HistoryFilter,
            HistoryQuery, HistoryResponse, TransactionKind, TransactionStatus, TransactionView,
            TransferNew, TransferResponse, WithdrawNew,
        };
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::AccountFrozen(_) => StatusCode::FORBIDDEN,
        EngineError::StepUpRequired | EngineError::OtpInvalidOrExpired => StatusCode::UNAUTHORIZED,
        EngineError::Busy => StatusCode::SERVICE_UNAVAILABLE,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::InvalidAmount(_)
        | EngineError::InsufficientFunds(_)
        | EngineError::MinimumBalance(_)
        | EngineError::TransferCap(_)
        | EngineError::DailyCapExceeded(_)
        | EngineError::SelfTransfer => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => {
                (status_for_engine_error(&err), message_for_engine_error(err))
            }
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::KeyNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_frozen_maps_to_403() {
        let res =
            ServerError::from(EngineError::AccountFrozen("blocked".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn step_up_and_bad_codes_map_to_401() {
        let res = ServerError::from(EngineError::StepUpRequired).into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let res = ServerError::from(EngineError::OtpInvalidOrExpired).into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn busy_maps_to_503() {
        let res = ServerError::from(EngineError::Busy).into_response();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn policy_rejections_map_to_422() {
        for err in [
            EngineError::InvalidAmount("x".to_string()),
            EngineError::InsufficientFunds("x".to_string()),
            EngineError::MinimumBalance("x".to_string()),
            EngineError::TransferCap("x".to_string()),
            EngineError::DailyCapExceeded("x".to_string()),
            EngineError::SelfTransfer,
        ] {
            let res = ServerError::from(err).into_response();
            assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        }
    }

    #[test]
    fn database_errors_map_to_500() {
        let res = ServerError::from(EngineError::Database(sea_orm::DbErr::Custom(
            "boom".to_string(),
        )))
        .into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
