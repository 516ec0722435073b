use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("{kind} {name:?} not found")]
    NotFound { kind: &'static str, name: String },

    #[error("conflict updating {kind} {name:?}: {source}")]
    Conflict {
        kind: &'static str,
        name: String,
        #[source]
        source: kube::Error,
    },

    #[error("found {count} ImageChange triggers in DeploymentConfig {name:?}, expected exactly one")]
    TriggerShape { name: String, count: usize },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Short alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }
}
