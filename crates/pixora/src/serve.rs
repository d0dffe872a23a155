// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `pixora serve` command implementation.
//!
//! Opens the datastore, constructs the provider adapters from configuration,
//! and serves the HTTP API until ctrl-c.

use std::sync::Arc;

use pixora_config::PixoraConfig;
use pixora_core::{
    EmailSender, PaymentProvider, PixoraError, PluginAdapter, StorageAdapter,
};
use pixora_credits::CreditLedger;
use pixora_email::ResendEmailSender;
use pixora_gateway::{AppState, ServerConfig, Services, start_server};
use pixora_paypal::PaypalProvider;
use pixora_replicate::ReplicateProvider;
use pixora_storage::SqliteStorage;
use pixora_supabase::SupabaseAdapter;
use tracing::{info, warn};

/// Runs the `pixora serve` command.
pub async fn run_serve(config: PixoraConfig) -> Result<(), PixoraError> {
    init_tracing(&config.server.log_level);

    info!("starting pixora serve");

    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    let ledger = CreditLedger::new(storage.database()?);
    let storage = Arc::new(storage);

    let replicate = Arc::new(ReplicateProvider::new(&config.replicate)?);
    let supabase = Arc::new(SupabaseAdapter::new(&config.supabase)?);

    let email: Option<Arc<dyn EmailSender>> = if !config.email.enabled {
        info!("email notifications disabled");
        None
    } else {
        match ResendEmailSender::new(&config.email) {
            Ok(sender) => Some(Arc::new(sender)),
            Err(e) => {
                warn!(error = %e, "email notifications unavailable");
                None
            }
        }
    };

    let payment: Option<Arc<dyn PaymentProvider>> = match PaypalProvider::new(&config.paypal) {
        Ok(provider) => Some(Arc::new(provider)),
        Err(e) => {
            warn!(error = %e, "billing routes disabled");
            None
        }
    };

    info!(
        storage = storage.name(),
        identity = supabase.name(),
        provider = replicate.name(),
        email = email.is_some(),
        payments = payment.is_some(),
        "adapters initialized"
    );

    let state = AppState::from_config(
        &config,
        Services {
            storage: storage.clone(),
            ledger,
            identity: supabase.clone(),
            object_storage: supabase,
            trainer: replicate.clone(),
            image_generator: replicate,
            email,
            payment,
        },
    )?;

    let server = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };
    let result = start_server(&server, state).await;

    if let Err(e) = storage.close().await {
        warn!(error = %e, "failed to close storage cleanly");
    }
    result
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pixora={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
