use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use ragchat::args::CommonArgs;
use ragchat::backend::{DocumentFile, HttpBackend};
use ragchat::config::Config;
use ragchat::console;
use ragchat::credentials::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
use ragchat::session::ChatSession;
use ragchat::theme as t;

#[derive(Debug, Parser)]
#[command(name = "ragchat", version, about = "Console chat client for a RAG backend")]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Start the interactive chat console (default)
    Chat,
    /// Register a new client with the backend
    Register,
    /// List or delete registered clients (admin)
    #[command(subcommand)]
    Clients(ClientsCommand),
    /// Upload PDF documents and/or URLs into a client's knowledge base
    Upload(UploadArgs),
}

#[derive(Debug, Subcommand)]
enum ClientsCommand {
    /// List registered clients with their document counts
    List,
    /// Delete a client and all its documents
    Delete {
        client_id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Args)]
struct UploadArgs {
    /// Client to upload into
    #[arg(long = "client", value_name = "CLIENT_ID")]
    client_id: String,
    /// PDF files to upload
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,
    /// Web pages to ingest (repeatable)
    #[arg(long = "url", value_name = "URL")]
    urls: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.common.config_path())?;
    cli.common.apply_overrides(&mut config);

    let _log_guard = init_tracing(&config)?;

    let backend = HttpBackend::new(&config.api_url)?;

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            if config.persist_credentials {
                let store = FileCredentialStore::open(config.credentials_path());
                run_chat(&config, store, &backend).await?;
            } else {
                run_chat(&config, MemoryCredentialStore::new(), &backend).await?;
            }
        }
        Commands::Register => {
            let registered = backend
                .register_client()
                .await
                .context("Registration failed")?;
            println!("{}", t::icon_ok("Client registered."));
            println!("  client_id: {}", t::accent_bright(&registered.client_id));
            println!("  {}", t::muted("Use this id to upload documents and chat."));
        }
        Commands::Clients(ClientsCommand::List) => {
            let clients = backend
                .list_clients()
                .await
                .context("Could not list clients")?;
            if clients.is_empty() {
                println!("{}", t::muted("No clients registered."));
            }
            for client in clients {
                let (docs, chunks) = client
                    .stats
                    .map(|s| (s.documents_count, s.chunks_count))
                    .unwrap_or((0, 0));
                println!(
                    "{}  {}",
                    t::accent_bright(&client.client_id),
                    t::muted(&format!("docs: {docs}  chunks: {chunks}"))
                );
            }
        }
        Commands::Clients(ClientsCommand::Delete { client_id, yes }) => {
            if !yes && !confirm(&format!("Delete client {client_id} and all its documents?"))? {
                println!("{}", t::muted("Aborted."));
                return Ok(());
            }
            backend
                .delete_client(&client_id)
                .await
                .context("Deletion failed")?;
            println!("{}", t::icon_ok(&format!("Client {client_id} deleted.")));
        }
        Commands::Upload(args) => {
            if args.files.is_empty() && args.urls.is_empty() {
                anyhow::bail!("Nothing to upload: pass PDF files and/or --url");
            }
            let mut documents = Vec::with_capacity(args.files.len());
            for path in &args.files {
                let bytes = tokio::fs::read(path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "document.pdf".to_string());
                documents.push(DocumentFile { name, bytes });
            }
            let outcome = backend
                .upload_documents(&args.client_id, documents, &args.urls)
                .await
                .context("Upload failed")?;
            println!("{}", t::icon_ok(&outcome.message));
            for err in &outcome.errors {
                println!("  {}", t::icon_warn(err));
            }
        }
    }

    Ok(())
}

async fn run_chat<S: CredentialStore>(
    config: &Config,
    store: S,
    backend: &HttpBackend,
) -> Result<()> {
    let mut session = ChatSession::new(store);
    if let Some(provider) = &config.default_provider {
        if session.select_provider(provider).is_err() {
            eprintln!(
                "{}",
                t::icon_warn(&format!("Ignoring unknown default provider {provider:?}."))
            );
        }
    }
    console::run_chat(&mut session, backend).await
}

fn confirm(question: &str) -> Result<bool> {
    use std::io::{BufRead, Write};
    print!("{} [y/N]: ", t::warn(question));
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

/// Route tracing output to a log file in the settings dir so the console
/// stays clean.  The returned guard must live for the whole run.
fn init_tracing(config: &Config) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::EnvFilter;

    std::fs::create_dir_all(config.log_dir())
        .with_context(|| format!("Failed to create {}", config.log_dir().display()))?;
    let file_appender = tracing_appender::rolling::daily(config.log_dir(), "ragchat.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_env("RAGCHAT_LOG")
        .unwrap_or_else(|_| EnvFilter::new("ragchat=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(guard)
}
