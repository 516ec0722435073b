//! Typed view of the OpenShift `apps.openshift.io/v1 DeploymentConfig`.
//!
//! Not a CRD this operator owns — the derive is used only to generate the
//! `Resource` impl so the object can go through typed `Api` calls. Only the
//! fields this operator reads or patches are modelled; everything else stays
//! opaque to server-side owners (replica status, revision counters, runtime
//! defaults) and must never be clobbered by an upgrade.

use k8s_openapi::api::core::v1::{ObjectReference, PodTemplateSpec};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Trigger type value identifying an image-change trigger.
pub const IMAGE_CHANGE_TRIGGER: &str = "ImageChange";

/// Parameters of an ImageChange trigger: redeploy when the image behind the
/// referenced image-stream tag changes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentTriggerImageChangeParams {
    #[serde(default)]
    pub automatic: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub container_names: Vec<String>,

    /// Reference to the tracked ImageStreamTag, e.g. name "gateway:1.4".
    pub from: ObjectReference,
}

/// One entry of `spec.triggers`. A DeploymentConfig may carry several
/// triggers, but at most one of kind ImageChange.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentTriggerPolicy {
    #[serde(rename = "type")]
    pub trigger_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_change_params: Option<DeploymentTriggerImageChangeParams>,
}

impl DeploymentTriggerPolicy {
    pub fn is_image_change(&self) -> bool {
        self.trigger_type == IMAGE_CHANGE_TRIGGER
    }
}

/// DeploymentConfig describes one workload's desired runtime shape.
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "apps.openshift.io",
    version = "v1",
    kind = "DeploymentConfig",
    namespaced,
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentConfigSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub triggers: Vec<DeploymentTriggerPolicy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<PodTemplateSpec>,
}
