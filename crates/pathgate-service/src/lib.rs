// pathgate-service/src/lib.rs
// ============================================================================
// Module: PathGate Service Library
// Description: gRPC surface, wire conversions, gNMI boundary, configuration.
// Purpose: Expose the transport layer over the PathGate core engine.
// Dependencies: crate::{config, convert, gnmi, pb, service}
// ============================================================================

//! ## Overview
//! The service crate carries everything transport-facing: the generated
//! `pathgate.v1` bindings, fail-closed wire conversions, the tonic
//! `PathPolicy` service, the gNMI-side authorization gate, and the server
//! configuration.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod convert;
pub mod gnmi;
pub mod pb;
pub mod service;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::CONFIG_ENV_VAR;
pub use config::ConfigError;
pub use config::DEFAULT_CONFIG_PATH;
pub use config::ServiceConfig;
pub use convert::DecodeError;
pub use gnmi::ActivePolicyInfo;
pub use gnmi::GnmiAuthorizer;
pub use gnmi::GnmiAuthzError;
pub use service::PathPolicyService;
