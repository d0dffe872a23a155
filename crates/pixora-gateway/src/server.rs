// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, patch, post},
};
use pixora_config::PixoraConfig;
use pixora_core::{
    EmailSender, IdentityProvider, ImageGenerator, ObjectStorage, PaymentProvider, PixoraError,
    StorageAdapter, TrainingProvider,
};
use pixora_credits::{CreditLedger, Pricing};
use pixora_training::{
    CorrelationSigner, ImageGallery, ImageGenerationService, SubmitterSettings,
    TrainingJobSubmitter, TrainingStatusMachine, WEBHOOK_PATH, WebhookVerifier,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::auth_middleware;
use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn StorageAdapter>,
    pub identity: Arc<dyn IdentityProvider>,
    /// `None` disables the billing routes.
    pub payment: Option<Arc<dyn PaymentProvider>>,
    pub ledger: CreditLedger,
    pub submitter: Arc<TrainingJobSubmitter>,
    pub reconciler: Arc<TrainingStatusMachine>,
    pub generator: Arc<ImageGenerationService>,
    pub gallery: Arc<ImageGallery>,
    /// `None` rejects every webhook delivery.
    pub verifier: Option<WebhookVerifier>,
    /// When set, callback URLs must carry a valid correlation token.
    pub correlation_signer: Option<CorrelationSigner>,
    /// Credits granted to a profile created on first sign-in.
    pub signup_grant: i64,
    /// Process start time for uptime reporting.
    pub start_time: Instant,
}

/// External collaborators the API is assembled from.
pub struct Services {
    pub storage: Arc<dyn StorageAdapter>,
    pub ledger: CreditLedger,
    pub identity: Arc<dyn IdentityProvider>,
    pub object_storage: Arc<dyn ObjectStorage>,
    pub trainer: Arc<dyn TrainingProvider>,
    pub image_generator: Arc<dyn ImageGenerator>,
    pub email: Option<Arc<dyn EmailSender>>,
    pub payment: Option<Arc<dyn PaymentProvider>>,
}

impl AppState {
    /// Wire the training and generation services over `services`.
    ///
    /// A missing webhook signing secret is logged and leaves the webhook
    /// route rejecting every delivery.
    pub fn from_config(config: &PixoraConfig, services: Services) -> Result<Self, PixoraError> {
        let pricing = Pricing::from_config(&config.credits);

        let verifier = match &config.webhook.signing_secret {
            Some(secret) => Some(WebhookVerifier::new(
                secret,
                Duration::from_secs(config.webhook.timestamp_tolerance_secs),
            )?),
            None => {
                tracing::warn!("webhook.signing_secret not set; training webhooks will be rejected");
                None
            }
        };
        let correlation_signer = config
            .webhook
            .correlation_secret
            .as_deref()
            .map(|secret| {
                CorrelationSigner::new(
                    secret,
                    Duration::from_secs(config.webhook.correlation_ttl_secs),
                )
            })
            .transpose()?;

        let mut submitter = TrainingJobSubmitter::new(
            services.storage.clone(),
            services.object_storage.clone(),
            services.trainer,
            services.ledger.clone(),
            pricing.clone(),
            SubmitterSettings::from_config(config),
        );
        if let Some(signer) = &correlation_signer {
            submitter = submitter.with_signer(signer.clone());
        }

        let reconciler = TrainingStatusMachine::new(
            services.storage.clone(),
            services.object_storage.clone(),
            services.email,
            config.supabase.training_bucket.clone(),
            config.server.site_url.clone(),
        );
        let generator = ImageGenerationService::new(
            services.storage.clone(),
            services.image_generator,
            services.object_storage.clone(),
            services.ledger.clone(),
            pricing,
            config.supabase.images_bucket.clone(),
        );
        let gallery = ImageGallery::new(
            services.storage.clone(),
            services.object_storage,
            config.supabase.images_bucket.clone(),
            config.supabase.signed_url_ttl_secs,
        );

        Ok(Self {
            storage: services.storage,
            identity: services.identity,
            payment: services.payment,
            ledger: services.ledger,
            submitter: Arc::new(submitter),
            reconciler: Arc::new(reconciler),
            generator: Arc::new(generator),
            gallery: Arc::new(gallery),
            verifier,
            correlation_signer,
            signup_grant: config.credits.signup_grant,
            start_time: Instant::now(),
        })
    }
}

/// Bind address for [`start_server`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Build the application router.
///
/// - `GET /health` and `POST /api/webhooks/training` are public; the webhook
///   authenticates by signature.
/// - Every other `/api` route requires a bearer session.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .route(WEBHOOK_PATH, post(handlers::post_training_webhook))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route("/api/train", post(handlers::post_train))
        .route("/api/generate", post(handlers::post_generate))
        .route("/api/credits", get(handlers::get_credits))
        .route("/api/models", get(handlers::get_models))
        .route("/api/models/{id}", delete(handlers::delete_model))
        .route("/api/profile", patch(handlers::patch_profile))
        .route("/api/images", get(handlers::get_images))
        .route("/api/images/{id}", delete(handlers::delete_image))
        .route("/api/orders", post(handlers::post_order))
        .route(
            "/api/orders/{order_id}/capture",
            post(handlers::post_capture_order),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serve the API until ctrl-c.
pub async fn start_server(config: &ServerConfig, state: AppState) -> Result<(), PixoraError> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| PixoraError::Internal(format!("failed to bind {addr}: {e}")))?;

    tracing::info!("Pixora listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| PixoraError::Internal(format!("server error: {e}")))?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
