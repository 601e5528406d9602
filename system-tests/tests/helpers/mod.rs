// system-tests/tests/helpers/mod.rs
// ============================================================================
// Module: System Test Helpers
// Description: Shared helpers for the Consul acceptance binaries.
// Purpose: Provide artifact and summary utilities.
// Dependencies: system-tests, consul-acceptance-core
// ============================================================================

//! ## Overview
//! Shared helpers for the Consul acceptance binaries.

#![allow(dead_code, reason = "Shared helpers are reused across multiple test suites.")]

pub mod artifacts;
