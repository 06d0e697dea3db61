// pathgate-service/src/pb.rs
// ============================================================================
// Module: PathGate Wire Bindings
// Description: Generated prost/tonic bindings for pathgate.v1.
// Purpose: Expose the protobuf message and service types under one module.
// Dependencies: tonic, prost
// ============================================================================

//! ## Overview
//! Generated bindings for the `pathgate.v1` protobuf package. The content is
//! produced by `tonic-build` from `proto/pathgate/v1/pathgate.proto`.

/// Generated `pathgate.v1` types and service stubs.
#[allow(
    missing_docs,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::missing_docs_in_private_items,
    reason = "Generated code is exempt from local documentation and style lints."
)]
pub mod v1 {
    tonic::include_proto!("pathgate.v1");
}
