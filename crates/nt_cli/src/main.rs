use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use nt_cli::screen::ArticleScreen;
use nt_core::config::Config;
use nt_core::logging::init_logging;
use nt_core::{ArticleRef, ProfileStore, SpeechEngine};
use nt_extract::{fetcher_for, Extractor};
use nt_speech::{
    create_engine, estimate_duration, format_duration, segment_into_chunks, DummyEngine,
    EngineKind, PlaybackStatus,
};
use nt_storage::{AppwriteProfileStore, BookmarkSynchronizer, MemoryProfileStore, SessionStore};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// TOML configuration file (defaults to $NT_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        default_value = "memory",
        help = "Profile store. Available stores: memory (default), appwrite"
    )]
    storage: String,
    /// Overrides store.endpoint
    #[arg(long, global = true)]
    backend_url: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Fetch an article and print what was extracted
    Extract {
        /// Article URL or local HTML file
        input: String,
        #[arg(long)]
        json: bool,
        /// List the speech chunks and the listening time
        #[arg(long)]
        chunks: bool,
    },
    /// Open an article and narrate it. Commands on stdin: <enter>/p play or
    /// pause, b bookmark, r rewind, q quit
    Listen {
        input: String,
        #[arg(long, default_value = "command")]
        engine: EngineKind,
        /// Article id used for bookmarks (defaults to the input)
        #[arg(long)]
        id: Option<String>,
        /// Signed-in user id
        #[arg(long)]
        user: Option<String>,
    },
    /// Toggle the bookmark of an article for a user
    Bookmark {
        article_id: String,
        #[arg(long)]
        user: String,
    },
}

async fn create_store(
    kind: &str,
    config: &Config,
    user: Option<&str>,
) -> Result<Arc<dyn ProfileStore>> {
    match kind {
        "memory" => {
            let store = MemoryProfileStore::new();
            if let Some(user) = user {
                store.insert(nt_core::UserProfile::new(user)).await;
            }
            Ok(Arc::new(store))
        }
        "appwrite" => {
            let store = AppwriteProfileStore::new(config.store.clone())
                .context("Appwrite store needs [store] settings or NT_STORE_* variables")?;
            Ok(Arc::new(store))
        }
        other => bail!("Unknown storage '{}'. Available stores: memory, appwrite", other),
    }
}

async fn sign_in(store: &dyn ProfileStore, user: Option<&str>) -> Result<SessionStore> {
    let session = SessionStore::new();
    if let Some(user) = user {
        let profile = store
            .get_profile(user)
            .await
            .with_context(|| format!("Failed to load profile of user {}", user))?;
        session.sign_in(profile);
    }
    Ok(session)
}

async fn extract(config: &Config, input: &str, json: bool, chunks: bool) -> Result<()> {
    let fetcher = fetcher_for(input, &config.fetch)?;

    let article = if json {
        let source = fetcher
            .fetch_article_markup(input)
            .await
            .with_context(|| format!("Failed to fetch {}", input))?;
        let article = Extractor::new(&config.extractor).extract_source(&source);
        println!("{}", serde_json::to_string_pretty(&article)?);
        article
    } else {
        let reference = ArticleRef {
            id: input.to_string(),
            title: String::new(),
            title_url: input.to_string(),
        };
        let mut screen = ArticleScreen::new(
            reference,
            config,
            Arc::new(DummyEngine::new()),
            Arc::new(MemoryProfileStore::new()),
            SessionStore::new(),
        );
        screen
            .open(fetcher.as_ref())
            .await
            .with_context(|| format!("Failed to fetch {}", input))?;
        print!("{}", screen.render());
        screen.extracted().cloned().unwrap_or_default()
    };

    if chunks {
        let text = article.speakable_text();
        let pieces = segment_into_chunks(&text);
        println!();
        for (i, chunk) in pieces.iter().enumerate() {
            println!("{:>3}. {}", i + 1, chunk);
        }
        println!(
            "{} chunks, about {} at {} wpm",
            pieces.len(),
            format_duration(estimate_duration(&text, config.speech.words_per_minute)),
            config.speech.words_per_minute
        );
    }
    Ok(())
}

enum Command {
    TogglePlayback,
    ToggleBookmark,
    Rewind,
    Quit,
    Unknown(String),
}

fn parse_command(line: &str) -> Command {
    match line.trim() {
        "" | "p" => Command::TogglePlayback,
        "b" => Command::ToggleBookmark,
        "r" => Command::Rewind,
        "q" => Command::Quit,
        other => Command::Unknown(other.to_string()),
    }
}

async fn listen(
    config: &Config,
    engine: Arc<dyn SpeechEngine>,
    store: Arc<dyn ProfileStore>,
    session: SessionStore,
    input: &str,
    id: Option<String>,
) -> Result<()> {
    let fetcher = fetcher_for(input, &config.fetch)?;
    let reference = ArticleRef {
        id: id.unwrap_or_else(|| input.to_string()),
        title: String::new(),
        title_url: input.to_string(),
    };
    let mut screen = ArticleScreen::new(reference, config, engine, store, session);
    screen
        .open(fetcher.as_ref())
        .await
        .with_context(|| format!("Failed to open {}", input))?;
    screen.focus();
    print!("{}", screen.render());
    println!("\n[enter/p] play/pause  [b] bookmark  [r] rewind  [q] quit");

    let mut states = screen.playback().subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    screen.toggle_listen();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_command(&line) {
                    Command::TogglePlayback => {
                        let state = screen.toggle_listen();
                        println!(
                            "{:?} at chunk {}/{}",
                            state.status, state.current_chunk_index, state.chunk_count
                        );
                    }
                    Command::ToggleBookmark => match screen.toggle_bookmark() {
                        Ok(handle) => {
                            let label = if screen.bookmark().state().is_bookmarked {
                                "♥ bookmarked"
                            } else {
                                "♡ removed"
                            };
                            println!("{}", label);
                            tokio::spawn(async move {
                                if let Ok(Err(e)) = handle.await {
                                    warn!(error = %e, "Bookmark was not saved");
                                }
                            });
                        }
                        Err(e) => println!("Cannot bookmark: {}", e),
                    },
                    Command::Rewind => {
                        screen.rewind();
                        println!("Back to the start");
                    }
                    Command::Quit => break,
                    Command::Unknown(other) => println!("Unknown command '{}'", other),
                }
            }
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                if states.borrow_and_update().status == PlaybackStatus::Finished {
                    info!("🏁 Finished reading");
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    screen.blur();
    Ok(())
}

async fn bookmark(
    store: Arc<dyn ProfileStore>,
    session: SessionStore,
    article_id: &str,
) -> Result<()> {
    let sync = BookmarkSynchronizer::new(store, session, article_id);
    let before = sync.focus();
    let ids = sync
        .toggle()
        .await
        .with_context(|| format!("Failed to toggle bookmark of {}", article_id))?;
    println!(
        "{} {}",
        if before.is_bookmarked { "Removed" } else { "Bookmarked" },
        article_id
    );
    for id in ids {
        println!("- {}", id);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging("info");
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(url) = cli.backend_url {
        config.store.endpoint = url;
    }

    match cli.command {
        Commands::Extract { input, json, chunks } => extract(&config, &input, json, chunks).await,
        Commands::Listen { input, engine, id, user } => {
            let store = create_store(&cli.storage, &config, user.as_deref()).await?;
            let session = sign_in(store.as_ref(), user.as_deref()).await?;
            let engine = create_engine(engine, &config.speech)?;
            info!(engine = engine.name(), storage = %cli.storage, "🔊 Listening");
            listen(&config, engine, store, session, &input, id).await
        }
        Commands::Bookmark { article_id, user } => {
            let store = create_store(&cli.storage, &config, Some(&user)).await?;
            let session = sign_in(store.as_ref(), Some(&user)).await?;
            bookmark(store, session, &article_id).await
        }
    }
}
