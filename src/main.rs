use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use drive_knowledge_base::config::{Config, SummarizerProvider};
use drive_knowledge_base::drive::{token_provider_from_config, DriveClient, FolderWalker};
use drive_knowledge_base::external::summarizer_from_config;
use drive_knowledge_base::extract::DefaultTextExtractor;
use drive_knowledge_base::knowledge_base::KnowledgeBaseBuilder;

#[derive(Parser, Debug)]
#[command(author, version, about = "Export a Google Drive folder into a summarized Markdown knowledge base", long_about = None)]
struct Args {
    /// Output file path for the knowledge base
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Google Drive folder ID to process (default: My Drive)
    #[arg(short = 'f', long)]
    folder_id: Option<String>,

    /// Path to a Google service account JSON key
    #[arg(short = 'c', long)]
    credentials: Option<String>,

    /// Summarization provider: openai or ollama
    #[arg(long)]
    provider: Option<SummarizerProvider>,

    /// Summarization model name
    #[arg(short = 'm', long)]
    model: Option<String>,

    /// Maximum number of documents processed at once
    #[arg(long)]
    concurrency: Option<usize>,
}

impl Args {
    fn apply(self, config: &mut Config) {
        if let Some(output) = self.output {
            config.output.output_path = output.to_string_lossy().into_owned();
        }
        if let Some(folder_id) = self.folder_id {
            config.drive.root_folder_id = Some(folder_id);
        }
        if let Some(credentials) = self.credentials {
            config.drive.service_account_key_path = Some(credentials);
            config.drive.access_token = None;
        }
        if let Some(provider) = self.provider {
            config.summarizer.set_provider(provider);
        }
        if let Some(model) = self.model {
            config.summarizer.model = model;
        }
        if let Some(concurrency) = self.concurrency {
            config.processing.max_concurrent_documents = concurrency.max(1);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let mut config = Config::from_env().context("Failed to load configuration")?;
    args.apply(&mut config);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.processing.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let tokens = token_provider_from_config(&config.drive)
        .context("Failed to authenticate to Google Drive")?;
    let drive = Arc::new(DriveClient::new(&config.drive, tokens)?);
    let summarizer =
        summarizer_from_config(&config.summarizer).context("Failed to set up summarizer")?;

    let walker = FolderWalker::new(drive.clone());
    let descriptors = walker
        .walk(config.drive.root_folder_id.as_deref())
        .await
        .context("Failed to list Google Drive files")?;
    info!("Found {} files to process", descriptors.len());

    let builder = KnowledgeBaseBuilder::new(drive, Arc::new(DefaultTextExtractor::new()), summarizer)
        .with_max_concurrent(config.processing.max_concurrent_documents)
        .with_title(config.output.title.clone());
    let knowledge_base = builder.build(descriptors).await;

    let output_path = PathBuf::from(&config.output.output_path);
    knowledge_base
        .write_atomic(&output_path)
        .context("Failed to write knowledge base")?;

    info!(
        "Knowledge base created at {:?} with {} documents",
        output_path,
        knowledge_base.documents.len()
    );
    Ok(())
}
