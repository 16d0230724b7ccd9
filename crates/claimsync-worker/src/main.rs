// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! claimsync worker - submission status reconciliation daemon.
//!
//! Spawns one reconciler worker per configured submission kind against a
//! shared PostgreSQL store and runs until Ctrl-C.

use std::sync::Arc;

use tracing::{info, warn};

use claimsync_core::persistence::PostgresStore;
use claimsync_worker::config::Config;
use claimsync_worker::{
    ClaimsTrackingClient, FeatureFlags, LighthouseClient, MetricsSink, ReconcilerWorker,
    ReconcilerWorkerConfig, RunLease, StoreFeatureFlags, StoreLease, SubmissionStatusReconciler,
    TracingMetrics,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before logging so the filter can come from it)
    let dotenv = dotenvy::dotenv();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "claimsync_worker=info".into());
    if std::env::var("CLAIMSYNC_LOG_FORMAT").is_ok_and(|v| v == "json") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    if let Err(e) = dotenv {
        warn!("No .env file loaded: {}", e);
    }

    // Load configuration
    let config = Config::from_env()?;
    let worker_config = ReconcilerWorkerConfig::from_env();

    info!(
        lighthouse_base_url = %config.lighthouse_base_url,
        kinds = ?config.kinds,
        poll_interval_secs = worker_config.poll_interval.as_secs(),
        "Starting claimsync worker"
    );

    // Connect to database
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;

    info!("Connected to database");

    claimsync_core::migrations::run_postgres(&pool).await?;

    info!("Database migrations applied");

    let store: Arc<dyn claimsync_core::SubmissionStore> = Arc::new(PostgresStore::new(pool));
    let client: Arc<dyn ClaimsTrackingClient> = Arc::new(LighthouseClient::new(
        &config.lighthouse_base_url,
        &config.lighthouse_api_key,
        config.http_timeout,
    )?);
    info!(client_type = client.client_type(), "Claims-tracking client initialized");

    let metrics: Arc<dyn MetricsSink> = Arc::new(TracingMetrics);
    let flags: Arc<dyn FeatureFlags> = Arc::new(StoreFeatureFlags::new(store.clone()));
    let lease: Arc<dyn RunLease> = Arc::new(StoreLease::new(store.clone()));

    let mut shutdown_handles = Vec::new();
    let mut tasks = Vec::new();
    for kind in &config.kinds {
        let reconciler =
            SubmissionStatusReconciler::new(*kind, store.clone(), client.clone(), metrics.clone());
        let worker = ReconcilerWorker::new(
            reconciler,
            flags.clone(),
            lease.clone(),
            worker_config.clone(),
        );
        shutdown_handles.push(worker.shutdown_handle());
        tasks.push(tokio::spawn(async move { worker.run().await }));
    }

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    for handle in &shutdown_handles {
        handle.notify_one();
    }
    for task in tasks {
        if let Err(e) = task.await {
            warn!(error = %e, "Reconciler worker task failed");
        }
    }

    info!("claimsync worker shut down");

    Ok(())
}
