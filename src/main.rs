use std::sync::Arc;

use clap::Parser;
use kube::runtime::events::Reporter;
use kube::Client;
use tracing::info;
use tracing_subscriber::EnvFilter;

use apiplatform_operator::controller::platform::{self, Context};
use apiplatform_operator::error::Result;
use apiplatform_operator::helpers::OperatorConfig;

/// Kubernetes operator managing ApiPlatform instances.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Image-stream tag considered obsolete after an upgrade; repeatable.
    /// Defaults to "latest" plus the previous platform release.
    #[arg(long = "obsolete-tag")]
    obsolete_tags: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let mut config = OperatorConfig::default();
    if !args.obsolete_tags.is_empty() {
        config.obsolete_tags = args.obsolete_tags;
    }

    let client = Client::try_default().await?;
    info!(obsolete_tags = ?config.obsolete_tags, "starting apiplatform-operator");

    let ctx = Arc::new(Context {
        client,
        config,
        reporter: Reporter {
            controller: "apiplatform-operator".into(),
            instance: None,
        },
    });

    platform::run(ctx).await;
    Ok(())
}
