//! Typed view of the OpenShift `image.openshift.io/v1 ImageStream`.
//!
//! As with [`super::deployment_config`], the derive only provides the typed
//! `Resource` impl; the platform, not this operator, owns the kind.

use k8s_openapi::api::core::v1::ObjectReference;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One tag → image-source binding of an ImageStream.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TagReference {
    pub name: String,

    /// Source the tag tracks, e.g. a DockerImage reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<ObjectReference>,
}

impl TagReference {
    /// Tag tracking an external docker image.
    pub fn docker(name: impl Into<String>, image: impl Into<String>) -> Self {
        TagReference {
            name: name.into(),
            from: Some(ObjectReference {
                kind: Some("DockerImage".to_string()),
                name: Some(image.into()),
                ..Default::default()
            }),
        }
    }
}

/// ImageStream names a logical image and its tracked tags.
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "image.openshift.io",
    version = "v1",
    kind = "ImageStream",
    namespaced,
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct ImageStreamSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<TagReference>,
}
