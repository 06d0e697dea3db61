// pathgate-store-file/src/lib.rs
// ============================================================================
// Module: PathGate File Store Library
// Description: Durable primary/backup file persistence for PathGate.
// Purpose: Expose the file-backed PolicyPersistence implementation.
// Dependencies: crate::store
// ============================================================================

//! ## Overview
//! File-backed persistence for the committed PathGate policy: two independent
//! JSON copies with atomic replacement and a recovery ladder that degrades to
//! a named deny-all snapshot instead of failing on corrupt content.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::BACKUP_FILE_NAME;
pub use store::FilePolicyStore;
pub use store::PRIMARY_FILE_NAME;
