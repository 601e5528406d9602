// crates/consul-acceptance-core/src/runtime/handle.rs
// ============================================================================
// Module: Cluster Handle
// Description: Scoped ownership of one installed release.
// Purpose: Guarantee teardown exactly once on every exit path of a case.
// Dependencies: crate::{core, interfaces, runtime::context}
// ============================================================================

//! ## Overview
//! [`ClusterHandle`] is armed before the install is attempted, so a partial
//! install is removed too. Teardown runs through [`ClusterHandle::teardown`]
//! on success, or from `Drop` when a case returns early or unwinds.
//!
//! Invariants:
//! - The deployer's `destroy` is called at most once per handle.
//! - With `no_cleanup_on_failure`, a failed release is left in place and a
//!   `teardown_skipped` event is recorded instead.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::OverrideMap;
use crate::core::ReleaseName;
use crate::interfaces::ConsulClient;
use crate::interfaces::DeployError;
use crate::logging::EventKind;
use crate::runtime::context::CaseScope;
use crate::runtime::context::SuiteContext;

// ============================================================================
// SECTION: Cluster Handle
// ============================================================================

/// One installed release, torn down when the handle is released.
pub struct ClusterHandle<'a> {
    /// Run context owning the deployer.
    ctx: &'a SuiteContext,
    /// Case owning the release.
    scope: &'a CaseScope,
    /// Set when a step of the case failed.
    failed: bool,
    /// Set once teardown has been attempted.
    released: bool,
}

impl<'a> ClusterHandle<'a> {
    /// Installs the case's release with `overrides` layered over the run's
    /// base overrides, blocking until the deployer reports it ready.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError`] when the install fails; the partial release is
    /// torn down before returning.
    pub fn create(
        ctx: &'a SuiteContext,
        scope: &'a CaseScope,
        overrides: &OverrideMap,
    ) -> Result<Self, DeployError> {
        let mut handle = Self {
            ctx,
            scope,
            failed: false,
            released: false,
        };
        let overrides = overrides.layered_over(&ctx.settings().base_overrides);
        scope.emit(
            ctx,
            EventKind::ClusterCreating,
            format!("installing release with {} overrides", overrides.len()),
        );
        if let Err(err) = ctx.deployer().create(&scope.release, &overrides) {
            handle.mark_failed();
            return Err(err);
        }
        scope.emit(ctx, EventKind::ClusterReady, "release reported ready");
        Ok(handle)
    }

    /// Returns the release this handle owns.
    #[must_use]
    pub const fn release(&self) -> &ReleaseName {
        &self.scope.release
    }

    /// Builds a client for the release, with credentials when `secure`.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::ClientSetup`] when the client cannot be built.
    pub fn setup_client(&self, secure: bool) -> Result<Box<dyn ConsulClient>, DeployError> {
        let client = self.ctx.deployer().client(&self.scope.release, secure)?;
        let scheme = if secure { "https with ACL token" } else { "http" };
        self.scope.emit(self.ctx, EventKind::ClientReady, format!("client configured for {scheme}"));
        Ok(client)
    }

    /// Marks the case as failed so teardown honors `no_cleanup_on_failure`.
    pub const fn mark_failed(&mut self) {
        self.failed = true;
    }

    /// Tears the release down now.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::Teardown`] when resources cannot be removed.
    pub fn teardown(mut self) -> Result<(), DeployError> {
        self.released = true;
        self.release_resources()
    }

    /// Removes the release unless a failed release is being preserved.
    fn release_resources(&self) -> Result<(), DeployError> {
        if self.failed && self.ctx.settings().no_cleanup_on_failure {
            self.scope.emit(
                self.ctx,
                EventKind::TeardownSkipped,
                "case failed and cleanup on failure is disabled",
            );
            return Ok(());
        }
        self.scope.emit(self.ctx, EventKind::TeardownStarted, "removing release");
        match self.ctx.deployer().destroy(&self.scope.release) {
            Ok(()) => {
                self.scope.emit(self.ctx, EventKind::TeardownFinished, "release removed");
                Ok(())
            }
            Err(err) => {
                self.scope.emit(self.ctx, EventKind::TeardownFailed, err.to_string());
                Err(err)
            }
        }
    }
}

impl Drop for ClusterHandle<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if std::thread::panicking() {
            self.failed = true;
        }
        let _ = self.release_resources();
    }
}
