use chrono::{SecondsFormat, Utc};

/// Release whose image-stream tags become stale once an upgrade to the
/// current release converges. Pruned together with "latest"; both entries
/// are policy data and can be overridden via operator flags.
pub const PREVIOUS_RELEASE_TAG: &str = "1.3";

/// Current UTC time as RFC 3339, written into `status.lastUpgraded`.
pub fn utc_now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

// ── Operator configuration (injected via CLI flags) ──────────────────────────

/// Cluster-specific configuration injected at startup via CLI flags.
#[derive(Clone, Debug)]
pub struct OperatorConfig {
    /// Image-stream tags removed from the gateway stream after an upgrade.
    pub obsolete_tags: Vec<String>,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        OperatorConfig {
            obsolete_tags: vec!["latest".to_string(), PREVIOUS_RELEASE_TAG.to_string()],
        }
    }
}
