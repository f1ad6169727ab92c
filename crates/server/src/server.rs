use axum::{
    Router,
    extract::Request,
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Error as AxumError, Header},
    typed_header::TypedHeaderRejection,
};

use std::{net::SocketAddr, sync::Arc};

use crate::{accounts, entries, future_payments};
use engine::Engine;

static CLIENT_ID_HEADER: axum::http::HeaderName = axum::http::HeaderName::from_static("x-client-id");

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// Identity of the caller, as established by the authenticating gateway in
/// front of this service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientId(pub String);

/// `TypedHeader` for the client identity header
///
/// Every request must contain a non-empty "x-client-id" entry in the header.
#[derive(Debug)]
struct ClientIdHeader(String);

impl Header for ClientIdHeader {
    fn name() -> &'static axum::http::HeaderName {
        &CLIENT_ID_HEADER
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, AxumError>
    where
        Self: Sized,
        I: Iterator<Item = &'i axum::http::HeaderValue>,
    {
        let value = values.next().ok_or_else(AxumError::invalid)?;
        let Ok(value) = value.to_str() else {
            return Err(AxumError::invalid());
        };
        let value = value.trim();
        if value.is_empty() {
            return Err(AxumError::invalid());
        }

        Ok(ClientIdHeader(value.to_string()))
    }

    fn encode<E: Extend<axum::http::HeaderValue>>(&self, values: &mut E) {
        match axum::http::HeaderValue::from_str(&self.0) {
            Ok(value) => values.extend(std::iter::once(value)),
            Err(_) => tracing::error!("failed to encode x-client-id header"),
        }
    }
}

async fn identify(
    client_header: Result<TypedHeader<ClientIdHeader>, TypedHeaderRejection>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Ok(TypedHeader(ClientIdHeader(client_id))) = client_header else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    request.extensions_mut().insert(ClientId(client_id));
    Ok(next.run(request).await)
}

pub fn router(engine: Arc<Engine>) -> Router {
    let state = ServerState { engine };
    Router::new()
        .route(
            "/accounts",
            post(accounts::create)
                .get(accounts::list)
                .put(accounts::update),
        )
        .route("/accounts/transfer", post(accounts::transfer))
        .route(
            "/accounts/{id}",
            get(accounts::get).delete(accounts::remove),
        )
        .route(
            "/transactions",
            post(entries::create_transaction).get(entries::list_transactions),
        )
        .route("/transactions/{id}", delete(entries::delete_transaction))
        .route(
            "/expenses",
            post(entries::create_expense).get(entries::list_expenses),
        )
        .route("/expenses/{id}", delete(entries::delete_expense))
        .route(
            "/future-payments",
            post(future_payments::create)
                .get(future_payments::list)
                .put(future_payments::update),
        )
        .route("/future-payments/{id}", delete(future_payments::remove))
        .route_layer(middleware::from_fn(identify))
        .with_state(state)
}

pub async fn run(engine: Arc<Engine>, addr: SocketAddr) {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Arc<Engine>,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(engine)).await
}

pub fn spawn_with_listener(
    engine: Arc<Engine>,
    listener: tokio::net::TcpListener,
) -> Result<SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
