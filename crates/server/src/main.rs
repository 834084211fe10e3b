//! Reactions server entry point.
//!
//! `reactions` serves the API; `reactions migrate` converts legacy favorites
//! into `favorite` reactions and exits.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{Router, middleware};
use reactions_api::{AppState, auth_middleware, router as api_router};
use reactions_common::{Config, NonceSigner};
use reactions_core::{
    EmojiCatalog, MigrationRunner, MigrationService, NotificationService, ReactionRegistry,
    ReactionService, SettingsService,
};
use reactions_db::repositories::{
    ActivityMetaRepository, ActivityRepository, NotificationRepository, SiteOptionRepository,
    UserMetaRepository, UserRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "reactions_server=info,reactions_api=info,reactions_core=info,tower_http=debug"
                    .into()
            }),
        )
        .init();

    let command = std::env::args().nth(1);

    let config = Config::load().context("Failed to load configuration")?;

    let db = reactions_db::init(&config).await?;
    info!("Connected to database");
    reactions_db::migrate(&db).await?;
    info!("Migrations completed");
    let db = Arc::new(db);

    let settings_service = SettingsService::new(SiteOptionRepository::new(Arc::clone(&db)));
    let settings = settings_service.get().await?;

    // The registry is fixed for the lifetime of the process
    let mut registry = ReactionRegistry::with_defaults(settings.into());
    registry.register_custom(&config.reactions.custom);
    let registry = Arc::new(registry);
    info!(reactions = registry.len(), "Reaction registry ready");

    let server_url = config.server.url.clone();
    let user_repo = UserRepository::new(Arc::clone(&db));

    let notification_service = Arc::new(NotificationService::new(
        NotificationRepository::new(Arc::clone(&db)),
        user_repo.clone(),
        Arc::clone(&registry),
        server_url.clone(),
    ));
    let mut reaction_service = ReactionService::new(
        registry,
        ActivityRepository::new(Arc::clone(&db)),
        ActivityMetaRepository::new(Arc::clone(&db)),
        user_repo.clone(),
        server_url.clone(),
    );
    reaction_service.add_observer(notification_service.clone());

    let migration_service = MigrationService::new(
        UserMetaRepository::new(Arc::clone(&db)),
        ActivityRepository::new(Arc::clone(&db)),
        reaction_service.clone(),
        config.reactions.migration_page_size,
    );

    match command.as_deref() {
        None | Some("serve") => {}
        Some("migrate") => return run_migration(migration_service).await,
        Some(other) => anyhow::bail!("Unknown command: {other} (expected `serve` or `migrate`)"),
    }

    let emojis = match &config.reactions.emoji_data_path {
        Some(path) => EmojiCatalog::load(path)?,
        None => EmojiCatalog::default(),
    };

    let state = AppState {
        reaction_service,
        notification_service,
        settings_service,
        migration_service,
        user_repo,
        nonces: NonceSigner::from_config(&config.security),
        emojis: Arc::new(emojis),
        server_url,
    };

    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Run every migration task to completion.
async fn run_migration(migration_service: MigrationService) -> anyhow::Result<()> {
    let mut queue = migration_service.queue().await?;
    for task in queue.tasks() {
        info!(task = task.task.id(), count = task.count, "Queued migration task");
    }

    MigrationRunner::new(migration_service).run(&mut queue).await?;

    for task in queue.tasks() {
        info!(
            task = task.task.id(),
            done = task.done,
            state = ?task.state,
            "Migration task finished"
        );
    }
    Ok(())
}
