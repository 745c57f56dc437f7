use anyhow::Context;
use clap::{Parser, Subcommand};
use reqwest::Client;
use skill_search::{
    config::Config,
    messaging::{MessageProducer, MessagingService},
    search::{Biz, IndexView},
    sync::SyncEventPublisher,
};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "skill-search-cli")]
#[command(about = "Skill search CLI", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    endpoint: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a search expression such as `biz:all:rust`
    Search {
        #[arg(value_name = "EXPRESSION")]
        expression: String,

        #[arg(short, long)]
        offset: Option<usize>,

        #[arg(short, long)]
        limit: Option<usize>,

        /// Search the admin indices, drafts included
        #[arg(short, long)]
        admin: bool,
    },

    /// Publish a document to the sync topic
    Publish {
        /// Business tag (case, question, skill, questionSet)
        #[arg(short, long)]
        biz: Biz,

        #[arg(short, long)]
        id: String,

        /// JSON file holding the document
        #[arg(short, long)]
        file: std::path::PathBuf,

        #[arg(short, long)]
        admin: bool,
    },

    /// Show sync consumer status
    SyncStatus,

    /// Check server health
    Health,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = Client::new();

    match cli.command {
        Commands::Search {
            expression,
            offset,
            limit,
            admin,
        } => {
            let path = if admin { "/v1/admin/search" } else { "/v1/search" };
            let mut query = vec![("q", expression)];
            if let Some(offset) = offset {
                query.push(("offset", offset.to_string()));
            }
            if let Some(limit) = limit {
                query.push(("limit", limit.to_string()));
            }

            let response = client
                .get(format!("{}{}", cli.endpoint, path))
                .query(&query)
                .send()
                .await?;

            let body: serde_json::Value = response.json().await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }

        Commands::Publish {
            biz,
            id,
            file,
            admin,
        } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let document: serde_json::Value =
                serde_json::from_str(&raw).context("document is not valid JSON")?;

            let config = Config::load().context("failed to load configuration")?;
            let messaging = Arc::new(MessagingService::new(config.messaging.clone()).await?);
            let view = if admin { IndexView::Admin } else { IndexView::Published };

            let publisher = SyncEventPublisher::for_view(messaging.clone(), &config.messaging, view);
            publisher.publish(biz, &id, &document).await?;
            MessageProducer::close(messaging.as_ref()).await?;

            println!("Published {} {} to {}", biz, id, publisher.topic());
        }

        Commands::SyncStatus => {
            let response = client
                .get(format!("{}/v1/sync/status", cli.endpoint))
                .send()
                .await?;

            let body: serde_json::Value = response.json().await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }

        Commands::Health => {
            let response = client
                .get(format!("{}/health", cli.endpoint))
                .send()
                .await?;

            let body: serde_json::Value = response.json().await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
    }

    Ok(())
}
