mod config;
mod registry;
mod routes;

use axum::{
    http::{HeaderValue, Request},
    middleware::{Next, from_fn},
};
use claim_flow::{InMemorySessionStorage, SessionRunner};
use std::sync::Arc;
use tracing::{Instrument, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use crate::config::{LogFormat, ServiceConfig};
use crate::registry::ClaimRegistry;
use crate::routes::{AppState, router};

/// Initialize tracing; JSON unless LOG_FORMAT=pretty
fn init_tracing(format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "claims_intake_service=debug,claim_flow=debug,tower_http=debug".into()
    });

    match format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true),
                )
                .init();
        }
    }
}

/// Middleware to add correlation ID to all requests
async fn correlation_id_middleware(
    mut request: Request<axum::body::Body>,
    next: Next,
) -> axum::response::Response {
    let correlation_id = Uuid::new_v4().to_string();

    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        request.headers_mut().insert("x-correlation-id", value);
    }

    let span = tracing::info_span!("http_request", correlation_id = %correlation_id);
    next.run(request).instrument(span).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::from_env()?;
    init_tracing(config.log_format);

    // Sessions live only as long as the process
    info!("Using in-memory session storage");
    let runner = SessionRunner::new(Arc::new(InMemorySessionStorage::new()));

    let app_state = AppState {
        runner,
        registry: ClaimRegistry::new(),
    };

    let app = router(app_state).layer(from_fn(correlation_id_middleware));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Server running on http://{}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
