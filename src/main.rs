use anyhow::Result;
use clap::{ArgGroup, Parser, Subcommand};
use collegegpt::config::{Config, BACKEND_URL_ENV};
use collegegpt::{commands, logging, ui};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "collegegpt")]
#[command(version)]
#[command(about = "Terminal chat client for the CollegeGPT assistant", long_about = None)]
struct Cli {
    /// Backend base URL, e.g. http://localhost:8000
    #[arg(long, global = true, env = BACKEND_URL_ENV)]
    backend_url: Option<String>,

    /// Answer without retrieving document context
    #[arg(long, global = true)]
    no_rag: bool,

    /// Config file to use instead of ~/.collegegpt/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question
    Ask {
        query: String,
        /// Wait for the whole answer instead of streaming it
        #[arg(long)]
        no_stream: bool,
        /// Print the retrieved context (non-streaming only)
        #[arg(long)]
        show_context: bool,
    },
    /// Check backend health
    Health,
    /// Show the model the backend is using
    ModelInfo,
    /// List active backend sessions
    Sessions,
    /// Clear a backend session's memory
    ClearSession { session_id: String },
    /// Search the document store
    Search {
        query: String,
        /// Number of documents to return
        #[arg(short, long, default_value_t = 3)]
        k: usize,
    },
    /// Ingest documents into the vector store
    Ingest {
        /// Data directory on the backend host
        #[arg(long)]
        path: Option<String>,
    },
    /// Remove every document from the vector store
    ClearVectorStore,
    /// Switch the backend between the local and the hosted model
    #[command(group(ArgGroup::new("model").required(true).args(["local", "groq"])))]
    SwitchModel {
        #[arg(long)]
        local: bool,
        #[arg(long)]
        groq: bool,
    },
    /// Show the effective configuration
    Config {
        /// Write it to the config file
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(url) = &cli.backend_url {
        config.set_backend_url(url);
    }
    if cli.no_rag {
        config.use_rag = false;
    }

    let Some(command) = cli.command else {
        let _guard = logging::init_file_logging(&config.log_dir)?;
        return ui::run(config).await;
    };

    logging::init_stderr_logging()?;

    match command {
        Commands::Ask {
            query,
            no_stream,
            show_context,
        } => commands::ask(&config, &query, !no_stream, show_context).await,
        Commands::Health => commands::health(&config).await,
        Commands::ModelInfo => commands::model_info(&config).await,
        Commands::Sessions => commands::sessions(&config).await,
        Commands::ClearSession { session_id } => commands::clear_session(&config, &session_id).await,
        Commands::Search { query, k } => commands::search(&config, &query, k).await,
        Commands::Ingest { path } => commands::ingest(&config, path.as_deref()).await,
        Commands::ClearVectorStore => commands::clear_vector_store(&config).await,
        Commands::SwitchModel { local, .. } => commands::switch_model(&config, local).await,
        Commands::Config { save } => {
            let path = cli.config.unwrap_or_else(Config::default_path);
            commands::show_config(&config, &path, save)
        }
    }
}
