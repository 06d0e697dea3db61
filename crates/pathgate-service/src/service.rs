// pathgate-service/src/service.rs
// ============================================================================
// Module: PathGate gRPC Service
// Description: Tonic implementation of the PathPolicy service.
// Purpose: Serve Rotate, Probe, and Get over the policy engine.
// Dependencies: crate::{convert, pb}, pathgate-core, tokio, tokio-stream, tonic, tracing
// ============================================================================

//! ## Overview
//! [`PathPolicyService`] adapts the policy engine to the `pathgate.v1` wire
//! contract. Each rotate stream owns one [`RotateSession`]; when the stream
//! ends without a finalize the session drop rolls the sandbox back. Shape
//! errors map to `InvalidArgument`, querying an instance that holds no policy
//! maps to `FailedPrecondition`, and internal engine faults map to
//! `Internal`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use pathgate_core::GetError;
use pathgate_core::PolicyEngine;
use pathgate_core::ProbeError;
use pathgate_core::RotateError;
use pathgate_core::RotateSession;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::Request;
use tonic::Response;
use tonic::Status;
use tonic::Streaming;

use crate::convert;
use crate::pb::v1 as pb;
use crate::pb::v1::path_policy_server::PathPolicy;
use crate::pb::v1::path_policy_server::PathPolicyServer;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Bound of the per-stream rotate response channel.
const ROTATE_CHANNEL_CAPACITY: usize = 4;

// ============================================================================
// SECTION: Service
// ============================================================================

/// gRPC front end over the policy engine.
#[derive(Debug, Clone)]
pub struct PathPolicyService {
    /// Shared policy engine.
    engine: Arc<PolicyEngine>,
}

impl PathPolicyService {
    /// Creates the service over a shared engine.
    #[must_use]
    pub fn new(engine: Arc<PolicyEngine>) -> Self {
        Self { engine }
    }

    /// Wraps the service in its generated tonic server.
    #[must_use]
    pub fn into_server(self) -> PathPolicyServer<Self> {
        PathPolicyServer::new(self)
    }
}

#[tonic::async_trait]
impl PathPolicy for PathPolicyService {
    type RotateStream = ReceiverStream<Result<pb::RotateResponse, Status>>;

    async fn rotate(
        &self,
        request: Request<Streaming<pb::RotateRequest>>,
    ) -> Result<Response<Self::RotateStream>, Status> {
        let mut inbound = request.into_inner();
        let engine = Arc::clone(&self.engine);
        let (tx, rx) = mpsc::channel(ROTATE_CHANNEL_CAPACITY);
        tokio::spawn(async move {
            let mut session = RotateSession::new(Arc::clone(&engine));
            loop {
                let message = match inbound.message().await {
                    Ok(Some(message)) => message,
                    Ok(None) => break,
                    Err(status) => {
                        tracing::debug!(error = %status, "rotate stream receive failed");
                        break;
                    }
                };
                let reply = handle_rotate_request(&engine, &mut session, message);
                let failed = reply.is_err();
                if tx.send(reply).await.is_err() {
                    break;
                }
                if failed {
                    break;
                }
            }
            // Session drop here rolls back an unfinalized upload.
        });
        Ok(Response::new(ReceiverStream::new(rx)))
    }

    async fn probe(
        &self,
        request: Request<pb::ProbeRequest>,
    ) -> Result<Response<pb::ProbeResponse>, Status> {
        let request = request.into_inner();
        if request.user.is_empty() {
            return Err(Status::invalid_argument("user not specified"));
        }
        let mode = convert::mode_from_pb(request.mode)
            .ok_or_else(|| Status::invalid_argument("mode not specified"))?;
        let path = request
            .path
            .ok_or_else(|| Status::invalid_argument("Nil Probe Request or Path"))?;
        let instance = convert::instance_from_pb(request.instance)
            .ok_or_else(|| Status::invalid_argument("Unknown instance type"))?;
        let outcome = self
            .engine
            .probe(&request.user, &convert::path_from_pb(path), mode, instance)
            .map_err(probe_status)?;
        tracing::debug!(
            user = %request.user,
            version = %outcome.version,
            action = %outcome.action,
            "probe decided"
        );
        Ok(Response::new(pb::ProbeResponse {
            version: outcome.version,
            action: i32::from(convert::action_to_pb(outcome.action)),
        }))
    }

    async fn get(
        &self,
        request: Request<pb::GetRequest>,
    ) -> Result<Response<pb::GetResponse>, Status> {
        let request = request.into_inner();
        let instance = convert::instance_from_pb(request.instance)
            .ok_or_else(|| Status::invalid_argument("Unknown instance type"))?;
        let snapshot = self.engine.get(instance).map_err(get_status)?;
        Ok(Response::new(convert::snapshot_to_get_response(&snapshot)))
    }
}

// ============================================================================
// SECTION: Request Handling
// ============================================================================

/// Handles one rotate stream message against the stream's session.
fn handle_rotate_request(
    engine: &Arc<PolicyEngine>,
    session: &mut RotateSession,
    message: pb::RotateRequest,
) -> Result<pb::RotateResponse, Status> {
    match message.rotate_request {
        Some(pb::rotate_request::RotateRequest::Upload(upload)) => {
            let snapshot = convert::snapshot_from_upload(upload).map_err(|err| {
                if engine.note_decode_error().is_err() {
                    tracing::warn!("statistics lock poisoned while counting decode error");
                }
                Status::invalid_argument(err.to_string())
            })?;
            let version = snapshot.version.clone();
            session.upload(snapshot).map_err(rotate_status)?;
            tracing::info!(%version, "policy staged into sandbox");
            Ok(pb::RotateResponse {})
        }
        Some(pb::rotate_request::RotateRequest::Finalize(_)) => {
            session.finalize().map_err(rotate_status)?;
            tracing::info!("policy rotation finalized");
            Ok(pb::RotateResponse {})
        }
        None => Err(Status::invalid_argument("empty rotate request")),
    }
}

// ============================================================================
// SECTION: Status Mapping
// ============================================================================

/// Maps rotate errors to gRPC statuses.
fn rotate_status(err: RotateError) -> Status {
    match err {
        RotateError::InvalidPolicy(_)
        | RotateError::UploadInProgress
        | RotateError::FinalizeBeforeUpload => Status::invalid_argument(err.to_string()),
        RotateError::Persistence(_) | RotateError::LockPoisoned => {
            Status::internal(err.to_string())
        }
    }
}

/// Maps probe errors to gRPC statuses.
fn probe_status(err: ProbeError) -> Status {
    match err {
        ProbeError::UserNotSpecified => Status::invalid_argument(err.to_string()),
        ProbeError::NilInstance => Status::failed_precondition(err.to_string()),
        ProbeError::LockPoisoned => Status::internal(err.to_string()),
    }
}

/// Maps get errors to gRPC statuses.
fn get_status(err: GetError) -> Status {
    match err {
        GetError::NilInstance => Status::failed_precondition(err.to_string()),
        GetError::LockPoisoned => Status::internal(err.to_string()),
    }
}
