//! Upgrade convergence engine.
//!
//! After `spec.version` on an ApiPlatform moves ahead of what is deployed,
//! this engine walks the platform's sub-resources in a fixed dependency
//! order and brings each one onto the new release: application image
//! streams first, then (unless databases are externally managed) the redis
//! and database streams, then the gateway deployment configs staging before
//! production, and finally a prune of stale gateway image-stream tags.
//!
//! Every step is idempotent and performs at most one persisted write. As
//! soon as a step writes, the pass halts with [`UpgradeOutcome::Requeue`]
//! and the controller re-invokes it; a pass that walks every step without
//! writing reports [`UpgradeOutcome::Converged`]. Repeated invocation
//! therefore resumes safely from wherever the previous pass stopped, and
//! each pass mutates the live system at most once.

use kube::ResourceExt;
use tracing::{debug, info};

use crate::crd::api_platform::ApiPlatform;
use crate::crd::deployment_config::DeploymentConfig;
use crate::error::{Error, Result};
use crate::store::ObjectStore;
use crate::templates;

use super::helpers::find_exactly_one;
use super::image_stream::ensure_image_stream;
use super::tags::prune_obsolete_tags;

/// Return contract of a pass and of every step within it.
///
/// `Requeue` is reported if and only if a persisted write occurred; the
/// caller must stop forward progress for the pass when it sees it. Hard
/// failures travel through `Err` instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpgradeOutcome {
    Converged,
    Requeue,
}

impl UpgradeOutcome {
    pub fn requeued(self) -> bool {
        matches!(self, UpgradeOutcome::Requeue)
    }

    fn from_changed(changed: bool) -> Self {
        if changed {
            UpgradeOutcome::Requeue
        } else {
            UpgradeOutcome::Converged
        }
    }
}

/// One upgrade pass over an ApiPlatform's sub-resources.
pub struct Upgrader<'a, S: ObjectStore + ?Sized> {
    platform: &'a ApiPlatform,
    store: &'a S,
    obsolete_tags: &'a [String],
}

impl<'a, S: ObjectStore + ?Sized> Upgrader<'a, S> {
    pub fn new(platform: &'a ApiPlatform, store: &'a S, obsolete_tags: &'a [String]) -> Self {
        Upgrader {
            platform,
            store,
            obsolete_tags,
        }
    }

    /// Run one pass. Halts on the first step that wrote or failed.
    pub async fn upgrade(&self) -> Result<UpgradeOutcome> {
        let outcome = self.upgrade_application_image_streams().await?;
        if outcome.requeued() {
            return Ok(outcome);
        }

        // Externally-hosted databases are out of this operator's authority.
        if !self.platform.is_external_database_enabled() {
            let outcome = self.upgrade_backend_redis_image_stream().await?;
            if outcome.requeued() {
                return Ok(outcome);
            }

            let outcome = self.upgrade_system_redis_image_stream().await?;
            if outcome.requeued() {
                return Ok(outcome);
            }

            let outcome = self.upgrade_system_database_image_stream().await?;
            if outcome.requeued() {
                return Ok(outcome);
            }
        }

        let outcome = self.upgrade_gateway_deployment_configs().await?;
        if outcome.requeued() {
            return Ok(outcome);
        }

        let outcome = self.prune_gateway_image_stream_tags().await?;
        if outcome.requeued() {
            return Ok(outcome);
        }

        Ok(UpgradeOutcome::Converged)
    }

    // ── Image streams ───────────────────────────────────────────────────────

    async fn upgrade_application_image_streams(&self) -> Result<UpgradeOutcome> {
        let streams = [
            templates::gateway_image_stream(self.platform)?,
            templates::backend_image_stream(self.platform)?,
            templates::system_image_stream(self.platform)?,
        ];
        for desired in &streams {
            if ensure_image_stream(self.store, desired).await? {
                return Ok(UpgradeOutcome::Requeue);
            }
        }
        Ok(UpgradeOutcome::Converged)
    }

    async fn upgrade_backend_redis_image_stream(&self) -> Result<UpgradeOutcome> {
        let desired = templates::backend_redis_image_stream(self.platform)?;
        let changed = ensure_image_stream(self.store, &desired).await?;
        Ok(UpgradeOutcome::from_changed(changed))
    }

    async fn upgrade_system_redis_image_stream(&self) -> Result<UpgradeOutcome> {
        let desired = templates::system_redis_image_stream(self.platform)?;
        let changed = ensure_image_stream(self.store, &desired).await?;
        Ok(UpgradeOutcome::from_changed(changed))
    }

    /// Exactly one of the two engine streams is reconciled per pass.
    async fn upgrade_system_database_image_stream(&self) -> Result<UpgradeOutcome> {
        let desired = if self.platform.is_system_postgresql_enabled() {
            templates::system_postgresql_image_stream(self.platform)?
        } else {
            // MySQL is the default engine.
            templates::system_mysql_image_stream(self.platform)?
        };
        let changed = ensure_image_stream(self.store, &desired).await?;
        Ok(UpgradeOutcome::from_changed(changed))
    }

    // ── Deployment configs ──────────────────────────────────────────────────

    /// Staging before production, so a broken image surfaces on staging first.
    async fn upgrade_gateway_deployment_configs(&self) -> Result<UpgradeOutcome> {
        let outcome = self
            .upgrade_deployment_config(templates::gateway_staging_deployment_config(
                self.platform,
            )?)
            .await?;
        if outcome.requeued() {
            return Ok(outcome);
        }

        self.upgrade_deployment_config(templates::gateway_production_deployment_config(
            self.platform,
        )?)
        .await
    }

    async fn upgrade_deployment_config(
        &self,
        desired: DeploymentConfig,
    ) -> Result<UpgradeOutcome> {
        let name = desired.name_any();
        // Fetch-fresh within the mutating step; a missing object is a hard
        // error here — it should already exist at upgrade time.
        let mut existing = self.store.get_deployment_config(&name).await?;

        let changed = ensure_image_change_trigger(&desired, &mut existing)?;
        if changed {
            info!(%name, "updating DeploymentConfig image-change trigger");
            self.store.update_deployment_config(&existing).await?;
            return Ok(UpgradeOutcome::Requeue);
        }
        Ok(UpgradeOutcome::Converged)
    }

    // ── Tag pruning ─────────────────────────────────────────────────────────

    async fn prune_gateway_image_stream_tags(&self) -> Result<UpgradeOutcome> {
        let mut stream = self
            .store
            .get_image_stream(templates::GATEWAY_IMAGE_STREAM)
            .await?;

        if prune_obsolete_tags(&mut stream, self.obsolete_tags) {
            info!(
                name = %stream.name_any(),
                tags = ?self.obsolete_tags,
                "pruning obsolete ImageStream tags"
            );
            self.store.update_image_stream(&stream).await?;
            return Ok(UpgradeOutcome::Requeue);
        }
        Ok(UpgradeOutcome::Converged)
    }
}

/// Align the existing DeploymentConfig's single image-change trigger with the
/// desired one. Only the trigger's `from.name` is inspected and mutated —
/// deployment configs accumulate server-owned state (revision counters,
/// replica status, injected defaults) that must survive the upgrade intact.
///
/// Returns whether the existing object was modified. Fails with
/// [`Error::TriggerShape`] when either side does not carry exactly one
/// image-change trigger; that indicates an unmigrated or tampered object and
/// is not auto-repaired.
pub fn ensure_image_change_trigger(
    desired: &DeploymentConfig,
    existing: &mut DeploymentConfig,
) -> Result<bool> {
    let desired_pos = find_image_change_trigger(desired)?;
    let existing_pos = find_image_change_trigger(existing)?;

    // The predicate guarantees params are present at the found positions.
    // A desired trigger without a target tag would erase the existing
    // reference; reject it instead of writing None.
    let desired_from = desired.spec.triggers[desired_pos]
        .image_change_params
        .as_ref()
        .and_then(|p| p.from.name.clone())
        .ok_or_else(|| {
            Error::config(format!(
                "image-change trigger for DeploymentConfig {:?} names no image-stream tag",
                desired.name_any()
            ))
        })?;
    let existing_params = existing.spec.triggers[existing_pos]
        .image_change_params
        .as_mut();

    if let Some(params) = existing_params {
        if params.from.name.as_deref() != Some(desired_from.as_str()) {
            debug!(
                name = %desired.name_any(),
                from = ?params.from.name,
                to = %desired_from,
                "image-stream tag in image-change trigger changed"
            );
            params.from.name = Some(desired_from);
            return Ok(true);
        }
    }
    Ok(false)
}

fn find_image_change_trigger(dc: &DeploymentConfig) -> Result<usize> {
    find_exactly_one(&dc.spec.triggers, |t| {
        t.is_image_change() && t.image_change_params.is_some()
    })
    .map_err(|e| Error::TriggerShape {
        name: dc.name_any(),
        count: e.count(),
    })
}
