use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ── Spec sub-types ────────────────────────────────────────────────────────────

/// HighAvailabilitySpec enables externally-managed databases. When enabled,
/// the operator has no authority over the redis and database instances and
/// skips every step that would touch their image streams.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct HighAvailabilitySpec {
    #[serde(default)]
    pub enabled: bool,
}

/// PostgresqlSpec selects PostgreSQL as the system database engine.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct PostgresqlSpec {
    /// Override for the PostgreSQL image; defaults to the release image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// SystemDatabaseSpec selects the system database engine. MySQL is the
/// default; setting `postgresql` switches the managed database image stream.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct SystemDatabaseSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postgresql: Option<PostgresqlSpec>,
}

/// SystemSpec groups the system component's configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct SystemSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<SystemDatabaseSpec>,
}

// ── CRD ───────────────────────────────────────────────────────────────────────

/// ApiPlatform is the Schema for the apiplatforms API.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "apiplatform.io",
    version = "v1alpha1",
    kind = "ApiPlatform",
    shortname = "apf",
    namespaced,
    status = "ApiPlatformStatus",
    printcolumn = r#"{"name": "Version", "type": "string", "jsonPath": ".spec.version"}"#,
    printcolumn = r#"{"name": "Deployed", "type": "string", "jsonPath": ".status.deployedVersion"}"#,
    printcolumn = r#"{"name": "Age", "type": "date", "jsonPath": ".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ApiPlatformSpec {
    /// Target platform release, e.g. "1.4". Moving this ahead of
    /// `status.deployedVersion` triggers the upgrade pass.
    pub version: String,

    /// Registry prefix for all platform images.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_registry: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_availability: Option<HighAvailabilitySpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<SystemSpec>,
}

impl ApiPlatform {
    /// Databases are externally managed in high-availability mode.
    pub fn is_external_database_enabled(&self) -> bool {
        self.spec
            .high_availability
            .as_ref()
            .is_some_and(|ha| ha.enabled)
    }

    /// Whether the CR overrides the system database engine to PostgreSQL.
    pub fn is_system_postgresql_enabled(&self) -> bool {
        self.spec
            .system
            .as_ref()
            .and_then(|s| s.database.as_ref())
            .is_some_and(|db| db.postgresql.is_some())
    }
}

// ── Status ────────────────────────────────────────────────────────────────────

/// ApiPlatformStatus defines the observed state of ApiPlatform.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiPlatformStatus {
    /// Release the live sub-resources last converged on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployed_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_upgraded: Option<String>,
}
