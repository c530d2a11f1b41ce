use std::io::{Read, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use spiral::api::{self, SecurityConfig};
use spiral::chat::{ChatView, HttpTransport, StreamEvent};
use spiral::config::Config;
use spiral::drafts;
use spiral::models::{ContentType, CreateSessionInput};

#[derive(Parser)]
#[command(name = "spiral")]
#[command(about = "AI writing partner: interview, draft, compare")]
struct Cli {
    /// SQLite database file (overrides SPIRAL_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Serve {
        /// Port for HTTP API (overrides SPIRAL_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Extract draft blocks from a file (or stdin) and print them as JSON
    Parse {
        file: Option<PathBuf>,
    },
    /// List an owner's sessions, newest first
    Sessions {
        #[arg(long)]
        owner: String,
    },
    /// Create a session
    New {
        #[arg(long)]
        owner: String,

        /// tweet, blog, email or essay
        #[arg(long, value_parser = parse_content_type)]
        content_type: Option<ContentType>,

        #[arg(long)]
        title: Option<String>,
    },
    /// Chat with the writing assistant in a session
    Chat {
        #[arg(long)]
        session: Uuid,

        /// Generation endpoint (overrides SPIRAL_CHAT_URL)
        #[arg(long)]
        url: Option<String>,
    },
}

fn parse_content_type(s: &str) -> Result<ContentType, String> {
    ContentType::from_str(s).ok_or_else(|| format!("unknown content type: {s}"))
}

/// Initialize tracing to stderr for one-shot commands so stdout stays clean.
fn init_tracing(use_stderr: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "spiral=debug,tower_http=debug".into()),
    );

    if use_stderr {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let use_stderr = !matches!(cli.command, None | Some(Commands::Serve { .. }));
    init_tracing(use_stderr);

    let mut config = Config::from_env();
    if let Some(db) = cli.db {
        config.db_path = Some(db);
    }

    match cli.command {
        Some(Commands::Serve { port }) => serve(config, port).await?,
        None => serve(config, None).await?,
        Some(Commands::Parse { file }) => {
            let text = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?,
                None => {
                    let mut text = String::new();
                    std::io::stdin().read_to_string(&mut text)?;
                    text
                }
            };
            let parsed = drafts::parse_drafts(&text);
            tracing::debug!(count = parsed.len(), "Parsed drafts");
            println!("{}", serde_json::to_string_pretty(&parsed)?);
        }
        Some(Commands::Sessions { owner }) => {
            let db = config.open_database()?;
            for session in db.list_sessions_by_owner(&owner)? {
                println!(
                    "{}  {:<12} {:<6} {}",
                    session.id,
                    session.status.as_str(),
                    session.content_type.as_str(),
                    session.title
                );
            }
        }
        Some(Commands::New {
            owner,
            content_type,
            title,
        }) => {
            let db = config.open_database()?;
            let session = db.create_session(CreateSessionInput {
                owner_id: owner,
                title,
                content_type,
            })?;
            println!("{}", session.id);
        }
        Some(Commands::Chat { session, url }) => {
            if let Some(url) = url {
                config.chat_url = url;
            }
            chat(config, session).await?;
        }
    }

    Ok(())
}

async fn serve(config: Config, port: Option<u16>) -> anyhow::Result<()> {
    let port = port.unwrap_or(config.port);
    tracing::info!("Starting spiral server on port {}", port);

    let db = config.open_database()?;
    let security = SecurityConfig::from_env();
    if security.api_key.is_some() {
        tracing::info!("API key authentication enabled");
    }
    let app = api::create_router_with_security(db, security);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("spiral server listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Line-oriented chat loop over stdin.
async fn chat(config: Config, session_id: Uuid) -> anyhow::Result<()> {
    let db = config.open_database()?;
    let transport = HttpTransport::new(config.chat_url.clone(), config.chat_api_key.clone());
    let mut view = ChatView::attach(db, transport, session_id).await?;

    println!("# {} ({})", view.session().title, view.session().status.as_str());
    for message in view.messages() {
        println!("{}: {}\n", message.role.as_str(), message.text());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if !view.submit(&line).await? {
            continue;
        }

        let outcome = view
            .drive_with(|event| {
                if let StreamEvent::TextDelta(delta) = event {
                    print!("{delta}");
                    let _ = std::io::stdout().flush();
                }
            })
            .await;
        println!();

        match outcome {
            Ok(Some(outcome)) => {
                for draft in &outcome.drafts {
                    println!(
                        "[draft v{}] {} ({}, {} words)",
                        draft.version, draft.title, draft.strategy, draft.word_count
                    );
                }
                if let Some(status) = outcome.status {
                    println!("[session is now {}]", status.as_str());
                }
            }
            Ok(None) => eprintln!("(reply interrupted; nothing saved)"),
            Err(e) => eprintln!("error: {e}"),
        }
    }

    Ok(())
}
