mod config;
mod http;
mod state;
mod submission;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use dotenvy::dotenv;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use adapter::{
    AkismetConfig, AkismetDetector, HmacAuthorizer, NotificationQueue, PermissionConfig,
    WebhookConfig, WebhookSink,
};
use crate::config::Settings;
use http::router::build_router;
use state::AppState;
use storage::Db;
use submission::CommentService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::new().context("Failed to load configuration")?;

    let db = Db::new(
        &settings.database.url,
        Duration::from_secs(settings.database.timeout_secs),
    )
    .await
    .with_context(|| format!("Failed to open database: {}", settings.database.url))?;

    let comments = build_comment_service(&settings, db.clone())?;
    let state = AppState { db, comments };

    let app = build_router(state, &settings.server.cors_origins);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to address: {}", addr))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

fn build_comment_service(settings: &Settings, db: Db) -> anyhow::Result<CommentService> {
    let mut service = CommentService::new(Arc::new(db));

    match settings.spam.akismet_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => {
            info!("Spam checks enabled (Akismet)");
            let detector = AkismetDetector::new(AkismetConfig {
                key: key.to_string(),
                timeout: Duration::from_secs(settings.spam.timeout_secs),
            })?;
            service = service.with_spam_detector(Arc::new(detector));
        }
        _ => warn!("No Akismet key configured, spam checks disabled"),
    }

    if let Some(p) = &settings.permission {
        info!("Permission checks enabled against {}", p.url);
        let authorizer = HmacAuthorizer::new(PermissionConfig {
            endpoint: p.url.clone(),
            secret: p.secret.clone(),
            requester: p.requester.clone(),
            perm_key: p.perm_key.clone(),
            timeout: Duration::from_secs(p.timeout_secs),
        })?;
        service = service.with_authorizer(Arc::new(authorizer));
    }

    if let Some(n) = &settings.notification {
        info!("Comment notifications enabled via {}", n.webhook_url);
        let sink = WebhookSink::new(WebhookConfig {
            url: n.webhook_url.clone(),
            timeout: Duration::from_secs(n.timeout_secs),
        })?;
        let (queue, rx) = NotificationQueue::new(n.queue_capacity);
        tokio::spawn(adapter::run_worker(rx, Arc::new(sink)));
        service = service.with_notifier(Arc::new(queue));
    }

    Ok(service)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}
