// pathgate-service/src/main.rs
// ============================================================================
// Module: PathGate Server Binary
// Description: Entry point wiring config, recovery, and the gRPC server.
// Purpose: Run the PathPolicy service over a file-backed policy engine.
// Dependencies: pathgate-core, pathgate-store-file, pathgate-service, tokio, tonic, tracing
// ============================================================================

//! ## Overview
//! The server loads its configuration, initializes tracing, recovers the
//! committed policy from the policy directory, and serves the `pathgate.v1`
//! gRPC contract until interrupted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use pathgate_core::PolicyEngine;
use pathgate_core::RecoveryOutcome;
use pathgate_core::WallClock;
use pathgate_service::PathPolicyService;
use pathgate_service::ServiceConfig;
use pathgate_store_file::FilePolicyStore;
use tonic::transport::Server;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Loads configuration, recovers the policy, and serves gRPC.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServiceConfig::load()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .init();
    let addr = config.bind_addr()?;

    let store = Arc::new(FilePolicyStore::new(&config.policy_dir));
    let engine = Arc::new(PolicyEngine::new(store, Arc::new(WallClock)));
    match engine.recover_at_start()? {
        RecoveryOutcome::Recovered => tracing::info!("recovered committed policy"),
        RecoveryOutcome::CorruptFallback => {
            tracing::warn!("durable policy copies corrupt; committed deny-all fallback");
        }
        RecoveryOutcome::Absent => {
            tracing::warn!("no durable policy found; engine is open");
        }
    }

    let service = PathPolicyService::new(engine)
        .into_server()
        .max_decoding_message_size(config.max_message_bytes);
    tracing::info!(%addr, policy_dir = %config.policy_dir.display(), "pathgate serving");
    Server::builder()
        .add_service(service)
        .serve_with_shutdown(addr, async {
            if tokio::signal::ctrl_c().await.is_err() {
                tracing::warn!("shutdown signal unavailable");
            }
        })
        .await?;
    Ok(())
}
