use std::path::Path;

use tracing_subscriber::EnvFilter;

use resume_extractor_lib::core::models::UploadedDocument;
use resume_extractor_lib::core::service::CoreService;
use resume_extractor_lib::core::settings::RuntimeSettings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        eprintln!("Usage: extract_harness <resume.pdf|docx|txt>...");
        std::process::exit(1);
    }

    let mut documents = Vec::with_capacity(paths.len());
    for path in &paths {
        if !Path::new(path).exists() {
            eprintln!("File not found: {path}");
            std::process::exit(2);
        }

        let file_name = Path::new(path)
            .file_name()
            .and_then(|v| v.to_str())
            .unwrap_or(path)
            .to_string();
        documents.push(UploadedDocument::new(file_name, tokio::fs::read(path).await?));
    }

    let settings = RuntimeSettings::from_env()?;
    let core = CoreService::new(&settings).await?;
    let results = core.process_batch(documents).await?;

    println!("{}", serde_json::to_string_pretty(&results)?);
    println!();
    println!("{}", results.summary);
    Ok(())
}
