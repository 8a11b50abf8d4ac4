use aven_rag::Result;
use aven_rag::commands::{ask, ingest, reset, status};
use aven_rag::config::{run_interactive_config, show_config};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "aven-rag")]
#[command(about = "Retrieval-augmented customer support assistant over the Aven knowledge base")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure provider endpoints and credentials
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Chunk, embed, and store the knowledge source (full re-ingestion)
    Ingest,
    /// Ask a question against the knowledge base
    Ask {
        /// The customer question
        query: String,
        /// Recent conversation text to include in the prompt
        #[arg(long)]
        context: Option<String>,
    },
    /// Show connectivity and document-count status
    Status,
    /// Drop the vector collection and all stored documents
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Ingest => {
            ingest().await?;
        }
        Commands::Ask { query, context } => {
            ask(query, context)?;
        }
        Commands::Status => {
            status()?;
        }
        Commands::Reset { yes } => {
            reset(yes)?;
        }
    }

    Ok(())
}
