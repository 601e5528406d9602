// system-tests/src/lib.rs
// ============================================================================
// Module: Consul Acceptance System Tests Library
// Description: Shared configuration and wiring for the cluster acceptance run.
// Purpose: Turn environment settings into a ready-to-run suite context.
// Dependencies: consul-acceptance-core, consul-acceptance-providers
// ============================================================================

//! ## Overview
//! This crate hosts the environment configuration and provider wiring used by
//! the acceptance binaries in `system-tests/tests`. Those binaries install
//! real Consul releases and only build with the `system-tests` feature.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod harness;
