// pathgate-service/build.rs
// ============================================================================
// Module: PathGate Service Build Script
// Description: Compiles the pathgate.v1 protobuf contract.
// Purpose: Generate prost/tonic bindings for the PathPolicy service.
// Dependencies: tonic-build
// ============================================================================

//! Build script generating the `pathgate.v1` gRPC bindings.

/// Compiles `proto/pathgate/v1/pathgate.proto` into Rust sources.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&["proto/pathgate/v1/pathgate.proto"], &["proto"])?;
    Ok(())
}
