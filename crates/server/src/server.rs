use axum::{
    Router,
    extract::{ConnectInfo, Request, State},
    http::{HeaderName, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use sea_orm::{DatabaseConnection, EntityTrait};

use std::net::SocketAddr;
use std::sync::Arc;

use crate::transactions;
use engine::{Engine, accounts};

static ACCOUNT_HEADER: HeaderName = HeaderName::from_static("x-account-id");
static FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
}

/// Network origin of the request, recorded in the audit trail.
#[derive(Clone, Debug)]
pub struct ClientOrigin(pub String);

/// Resolves the externally authenticated caller identity.
///
/// Session issuance lives outside this service: the gateway forwards the
/// authenticated account id in `x-account-id`, and the middleware turns it
/// into an account row injected as a request extension.
async fn identity(
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(account_id) = request
        .headers()
        .get(&ACCOUNT_HEADER)
        .and_then(|value| value.to_str().ok())
    else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    let account = accounts::Entity::find_by_id(account_id)
        .one(&state.db)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;
    let Some(account) = account else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    let origin = client_origin(&request);
    request.extensions_mut().insert(account);
    request.extensions_mut().insert(origin);
    Ok(next.run(request).await)
}

fn client_origin(request: &Request) -> ClientOrigin {
    let forwarded = request
        .headers()
        .get(&FORWARDED_FOR)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string());

    let origin = forwarded.unwrap_or_else(|| {
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    });
    ClientOrigin(origin)
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/deposit", post(transactions::deposit))
        .route("/withdraw", post(transactions::withdraw))
        .route("/transfer/challenge", post(transactions::request_challenge))
        .route("/transfer", post(transactions::transfer))
        .route("/transactions", get(transactions::history))
        .route_layer(middleware::from_fn_with_state(state.clone(), identity))
        .with_state(state)
}

pub async fn run(engine: Engine, db: DatabaseConnection) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, db, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        db,
    };

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}

pub fn spawn_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, db, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
