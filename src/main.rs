use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use resume_extractor_lib::core::settings::RuntimeSettings;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = RuntimeSettings::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "resume_extractor_lib={level},tower_http={level}",
                level = &settings.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting resume extractor v{}", env!("CARGO_PKG_VERSION"));

    resume_extractor_lib::run(settings).await
}
