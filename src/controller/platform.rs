//! ApiPlatform controller — the main reconciler.
//!
//! Watches ApiPlatform resources and, whenever `spec.version` has moved
//! ahead of `status.deployedVersion`, drives the upgrade engine until it
//! converges. The engine reports progress one mutation at a time: on
//! `Requeue` the controller re-enters immediately (progress was made), on an
//! error it backs off, and once the pass converges the deployed version is
//! recorded in status.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use kube::{
    api::{Api, Patch, PatchParams, ResourceExt},
    runtime::{
        controller::{Action, Controller},
        events::{Event as KubeEvent, EventType, Recorder, Reporter},
        watcher::Config as WatcherConfig,
    },
    Client, Resource,
};
use k8s_openapi::api::core::v1::ObjectReference;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::crd::api_platform::ApiPlatform;
use crate::error::{Error, Result};
use crate::helpers::{utc_now_rfc3339, OperatorConfig};
use crate::store::KubeStore;

use super::helpers::FIELD_MANAGER;
use super::upgrade::{UpgradeOutcome, Upgrader};

// ── Shared context passed to every reconcile call ─────────────────────────────

pub struct Context {
    pub client: Client,
    pub config: OperatorConfig,
    pub reporter: Reporter,
}

/// Build an ObjectReference from any kube Resource.
fn kube_object_ref<K: Resource<DynamicType = ()>>(obj: &K) -> ObjectReference {
    ObjectReference {
        api_version: Some(K::api_version(&()).to_string()),
        kind: Some(K::kind(&()).to_string()),
        name: Some(obj.name_any()),
        namespace: obj.namespace(),
        uid: obj.meta().uid.clone(),
        resource_version: obj.meta().resource_version.clone(),
        ..Default::default()
    }
}

/// Publish a Kubernetes event attached to the given resource.
/// Errors are logged but never block reconciliation.
async fn publish_event(
    ctx: &Context,
    platform: &ApiPlatform,
    type_: EventType,
    reason: &str,
    note: Option<String>,
) {
    let rec = Recorder::new(ctx.client.clone(), ctx.reporter.clone());
    let oref = kube_object_ref(platform);
    if let Err(e) = rec
        .publish(
            &KubeEvent {
                type_,
                reason: reason.to_string(),
                note,
                action: "Upgrade".to_string(),
                secondary: None,
            },
            &oref,
        )
        .await
    {
        warn!(%e, "failed to publish event");
    }
}

// ── Controller entry point ────────────────────────────────────────────────────

/// Start the ApiPlatform controller. Returns a future that runs forever.
pub async fn run(ctx: Arc<Context>) {
    let platforms: Api<ApiPlatform> = Api::all(ctx.client.clone());

    Controller::new(platforms, WatcherConfig::default())
        .run(reconcile, error_policy, ctx)
        .for_each(|res| async move {
            match res {
                Ok((_obj, _action)) => {}
                Err(e) => warn!("reconcile failed: {e:?}"),
            }
        })
        .await;
}

fn error_policy(platform: Arc<ApiPlatform>, error: &Error, _ctx: Arc<Context>) -> Action {
    let name = platform.name_any();
    warn!(%name, %error, "reconcile error, requeuing in 30s");
    Action::requeue(Duration::from_secs(30))
}

// ── Reconcile ─────────────────────────────────────────────────────────────────

async fn reconcile(platform: Arc<ApiPlatform>, ctx: Arc<Context>) -> Result<Action> {
    let ns = platform.namespace().unwrap_or_default();
    let name = platform.name_any();

    let deployed = platform
        .status
        .as_ref()
        .and_then(|s| s.deployed_version.as_deref());
    if deployed == Some(platform.spec.version.as_str()) {
        debug!(%name, version = %platform.spec.version, "platform already on target release");
        return Ok(Action::await_change());
    }

    info!(
        %name, %ns,
        from = deployed.unwrap_or("<none>"),
        to = %platform.spec.version,
        "upgrading ApiPlatform"
    );

    let store = KubeStore::new(ctx.client.clone(), &ns);
    let upgrader = Upgrader::new(&platform, &store, &ctx.config.obsolete_tags);

    match upgrader.upgrade().await? {
        UpgradeOutcome::Requeue => {
            // One mutation landed; re-enter promptly for the next step.
            debug!(%name, "upgrade pass made progress, requeuing");
            Ok(Action::requeue(Duration::ZERO))
        }
        UpgradeOutcome::Converged => {
            let api: Api<ApiPlatform> = Api::namespaced(ctx.client.clone(), &ns);
            let status_patch = json!({
                "status": {
                    "deployedVersion": platform.spec.version,
                    "lastUpgraded": utc_now_rfc3339(),
                    "message": format!("upgraded to {}", platform.spec.version),
                }
            });
            api.patch_status(
                &name,
                &PatchParams::apply(FIELD_MANAGER),
                &Patch::Merge(&status_patch),
            )
            .await?;

            info!(%name, version = %platform.spec.version, "upgrade converged");
            publish_event(
                &ctx,
                &platform,
                EventType::Normal,
                "UpgradeCompleted",
                Some(format!("Platform upgraded to {}", platform.spec.version)),
            )
            .await;
            Ok(Action::await_change())
        }
    }
}
