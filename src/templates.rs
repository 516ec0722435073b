//! Desired-state builders — pure functions from the ApiPlatform CR to the
//! post-upgrade shape of each sub-resource.
//!
//! Builders never talk to the apiserver; malformed CR configuration surfaces
//! as [`Error::Config`] naming the sub-resource whose construction failed.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{Container, ObjectReference, PodSpec, PodTemplateSpec};
use kube::api::ObjectMeta;

use crate::crd::api_platform::ApiPlatform;
use crate::crd::deployment_config::{
    DeploymentConfig, DeploymentConfigSpec, DeploymentTriggerImageChangeParams,
    DeploymentTriggerPolicy, IMAGE_CHANGE_TRIGGER,
};
use crate::crd::image_stream::{ImageStream, ImageStreamSpec, TagReference};
use crate::error::{Error, Result};

// ── Sub-resource names ────────────────────────────────────────────────────────

pub const GATEWAY_IMAGE_STREAM: &str = "gateway";
pub const BACKEND_IMAGE_STREAM: &str = "backend";
pub const SYSTEM_IMAGE_STREAM: &str = "system";
pub const BACKEND_REDIS_IMAGE_STREAM: &str = "backend-redis";
pub const SYSTEM_REDIS_IMAGE_STREAM: &str = "system-redis";
pub const SYSTEM_MYSQL_IMAGE_STREAM: &str = "system-mysql";
pub const SYSTEM_POSTGRESQL_IMAGE_STREAM: &str = "system-postgresql";

pub const GATEWAY_STAGING_DC: &str = "gateway-staging";
pub const GATEWAY_PRODUCTION_DC: &str = "gateway-production";

const DEFAULT_REGISTRY: &str = "quay.io/apiplatform";
const BACKEND_REDIS_IMAGE: &str = "docker.io/library/redis:6.2";
const SYSTEM_REDIS_IMAGE: &str = "docker.io/library/redis:6.2";
const SYSTEM_MYSQL_IMAGE: &str = "docker.io/library/mysql:8.0";
const SYSTEM_POSTGRESQL_IMAGE: &str = "docker.io/library/postgres:13";

/// Validated release string, with context naming the object being built.
fn release<'a>(platform: &'a ApiPlatform, building: &str) -> Result<&'a str> {
    let version = platform.spec.version.trim();
    if version.is_empty() {
        return Err(Error::config(format!(
            "building {building}: spec.version is empty"
        )));
    }
    Ok(version)
}

fn registry(platform: &ApiPlatform) -> &str {
    platform
        .spec
        .image_registry
        .as_deref()
        .unwrap_or(DEFAULT_REGISTRY)
}

fn labels(version: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("app".to_string(), "apiplatform".to_string()),
        ("apiplatform.io/release".to_string(), version.to_string()),
    ])
}

fn image_stream(
    platform: &ApiPlatform,
    name: &str,
    version: &str,
    tags: Vec<TagReference>,
) -> ImageStream {
    ImageStream {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: platform.metadata.namespace.clone(),
            labels: Some(labels(version)),
            ..Default::default()
        },
        spec: ImageStreamSpec { tags },
    }
}

// ── Application image streams ─────────────────────────────────────────────────

pub fn gateway_image_stream(platform: &ApiPlatform) -> Result<ImageStream> {
    let version = release(platform, "gateway ImageStream")?;
    let image = format!("{}/gateway:{version}", registry(platform));
    let tags = vec![TagReference::docker(version, image)];
    Ok(image_stream(platform, GATEWAY_IMAGE_STREAM, version, tags))
}

pub fn backend_image_stream(platform: &ApiPlatform) -> Result<ImageStream> {
    let version = release(platform, "backend ImageStream")?;
    let image = format!("{}/backend:{version}", registry(platform));
    let tags = vec![TagReference::docker(version, image)];
    Ok(image_stream(platform, BACKEND_IMAGE_STREAM, version, tags))
}

pub fn system_image_stream(platform: &ApiPlatform) -> Result<ImageStream> {
    let version = release(platform, "system ImageStream")?;
    let image = format!("{}/system:{version}", registry(platform));
    Ok(image_stream(
        platform,
        SYSTEM_IMAGE_STREAM,
        version,
        vec![TagReference::docker(version, image)],
    ))
}

// ── Infrastructure image streams ──────────────────────────────────────────────

pub fn backend_redis_image_stream(platform: &ApiPlatform) -> Result<ImageStream> {
    let version = release(platform, "backend-redis ImageStream")?;
    let tags = vec![TagReference::docker(version, BACKEND_REDIS_IMAGE)];
    Ok(image_stream(
        platform,
        BACKEND_REDIS_IMAGE_STREAM,
        version,
        tags,
    ))
}

pub fn system_redis_image_stream(platform: &ApiPlatform) -> Result<ImageStream> {
    let version = release(platform, "system-redis ImageStream")?;
    let tags = vec![TagReference::docker(version, SYSTEM_REDIS_IMAGE)];
    Ok(image_stream(
        platform,
        SYSTEM_REDIS_IMAGE_STREAM,
        version,
        tags,
    ))
}

pub fn system_mysql_image_stream(platform: &ApiPlatform) -> Result<ImageStream> {
    let version = release(platform, "system-mysql ImageStream")?;
    let tags = vec![TagReference::docker(version, SYSTEM_MYSQL_IMAGE)];
    Ok(image_stream(
        platform,
        SYSTEM_MYSQL_IMAGE_STREAM,
        version,
        tags,
    ))
}

pub fn system_postgresql_image_stream(platform: &ApiPlatform) -> Result<ImageStream> {
    let version = release(platform, "system-postgresql ImageStream")?;
    let image = platform
        .spec
        .system
        .as_ref()
        .and_then(|s| s.database.as_ref())
        .and_then(|db| db.postgresql.as_ref())
        .and_then(|pg| pg.image.as_deref())
        .unwrap_or(SYSTEM_POSTGRESQL_IMAGE);
    let tags = vec![TagReference::docker(version, image)];
    Ok(image_stream(
        platform,
        SYSTEM_POSTGRESQL_IMAGE_STREAM,
        version,
        tags,
    ))
}

// ── Gateway deployment configs ────────────────────────────────────────────────

fn gateway_deployment_config(
    platform: &ApiPlatform,
    name: &str,
    environment: &str,
) -> Result<DeploymentConfig> {
    let version = release(platform, &format!("{name} DeploymentConfig"))?;

    Ok(DeploymentConfig {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: platform.metadata.namespace.clone(),
            labels: Some(labels(version)),
            ..Default::default()
        },
        spec: DeploymentConfigSpec {
            replicas: Some(1),
            triggers: vec![
                DeploymentTriggerPolicy {
                    trigger_type: "ConfigChange".to_string(),
                    image_change_params: None,
                },
                DeploymentTriggerPolicy {
                    trigger_type: IMAGE_CHANGE_TRIGGER.to_string(),
                    image_change_params: Some(DeploymentTriggerImageChangeParams {
                        automatic: true,
                        container_names: vec!["gateway".to_string()],
                        from: ObjectReference {
                            kind: Some("ImageStreamTag".to_string()),
                            name: Some(format!("{GATEWAY_IMAGE_STREAM}:{version}")),
                            ..Default::default()
                        },
                    }),
                },
            ],
            template: Some(PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels(version)),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![Container {
                        name: "gateway".to_string(),
                        // Replaced by the ImageChange trigger on rollout.
                        image: Some(format!("{GATEWAY_IMAGE_STREAM}:{version}")),
                        env: Some(vec![k8s_openapi::api::core::v1::EnvVar {
                            name: "DEPLOYMENT_ENV".to_string(),
                            value: Some(environment.to_string()),
                            ..Default::default()
                        }]),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
            }),
        },
    })
}

pub fn gateway_staging_deployment_config(platform: &ApiPlatform) -> Result<DeploymentConfig> {
    gateway_deployment_config(platform, GATEWAY_STAGING_DC, "staging")
}

pub fn gateway_production_deployment_config(platform: &ApiPlatform) -> Result<DeploymentConfig> {
    gateway_deployment_config(platform, GATEWAY_PRODUCTION_DC, "production")
}
