//! Synchronous-looking read/write surface over the live sub-resources.
//!
//! The upgrade engine never talks to the apiserver directly; it goes through
//! [`ObjectStore`] so that every step does fetch-fresh → mutate in memory →
//! persist-once against the same interface. No retry lives here: a 409
//! conflict surfaces as the pass's failure and the outer controller backs
//! off and re-invokes.

use async_trait::async_trait;
use kube::api::{Api, PostParams};
use kube::Client;

use crate::crd::deployment_config::DeploymentConfig;
use crate::crd::image_stream::ImageStream;
use crate::error::{Error, Result};

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get_deployment_config(&self, name: &str) -> Result<DeploymentConfig>;
    async fn update_deployment_config(&self, dc: &DeploymentConfig) -> Result<()>;

    async fn get_image_stream(&self, name: &str) -> Result<ImageStream>;
    async fn create_image_stream(&self, stream: &ImageStream) -> Result<()>;
    async fn update_image_stream(&self, stream: &ImageStream) -> Result<()>;
}

/// Apiserver-backed store scoped to the ApiPlatform's namespace.
pub struct KubeStore {
    client: Client,
    namespace: String,
}

impl KubeStore {
    pub fn new(client: Client, namespace: impl Into<String>) -> Self {
        KubeStore {
            client,
            namespace: namespace.into(),
        }
    }

    fn deployment_configs(&self) -> Api<DeploymentConfig> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    fn image_streams(&self) -> Api<ImageStream> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }
}

/// Translate apiserver failures into the engine's error taxonomy.
fn classify(err: kube::Error, kind: &'static str, name: &str) -> Error {
    match err {
        kube::Error::Api(ref resp) if resp.code == 404 => Error::not_found(kind, name),
        kube::Error::Api(ref resp) if resp.code == 409 => Error::Conflict {
            kind,
            name: name.to_string(),
            source: err,
        },
        other => Error::Kube(other),
    }
}

#[async_trait]
impl ObjectStore for KubeStore {
    async fn get_deployment_config(&self, name: &str) -> Result<DeploymentConfig> {
        self.deployment_configs()
            .get(name)
            .await
            .map_err(|e| classify(e, "DeploymentConfig", name))
    }

    async fn update_deployment_config(&self, dc: &DeploymentConfig) -> Result<()> {
        let name = dc.metadata.name.as_deref().unwrap_or_default();
        self.deployment_configs()
            .replace(name, &PostParams::default(), dc)
            .await
            .map_err(|e| classify(e, "DeploymentConfig", name))?;
        Ok(())
    }

    async fn get_image_stream(&self, name: &str) -> Result<ImageStream> {
        self.image_streams()
            .get(name)
            .await
            .map_err(|e| classify(e, "ImageStream", name))
    }

    async fn create_image_stream(&self, stream: &ImageStream) -> Result<()> {
        let name = stream.metadata.name.as_deref().unwrap_or_default();
        self.image_streams()
            .create(&PostParams::default(), stream)
            .await
            .map_err(|e| classify(e, "ImageStream", name))?;
        Ok(())
    }

    async fn update_image_stream(&self, stream: &ImageStream) -> Result<()> {
        let name = stream.metadata.name.as_deref().unwrap_or_default();
        self.image_streams()
            .replace(name, &PostParams::default(), stream)
            .await
            .map_err(|e| classify(e, "ImageStream", name))?;
        Ok(())
    }
}
