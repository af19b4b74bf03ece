use anyhow::Result;
use cardcore::{next_input_from, CardPatch, CardStatus, CardStore, EventBus, ExecutionEvent};
use cardengine::WorkflowEngine;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Parser)]
#[command(name = "cardflow")]
#[command(about = "Card workflow CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a board file
    Run {
        /// Path to board JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Gemini API key; falls back to mocked completions when absent
        #[arg(long, env = "GEMINI_API_KEY")]
        api_key: Option<String>,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate a board file
    Validate {
        /// Path to board JSON file
        file: PathBuf,
    },

    /// Create a new example board
    Init {
        /// Output file path
        #[arg(short, long, default_value = "board.json")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            file,
            api_key,
            verbose,
        } => {
            if verbose {
                tracing_subscriber::fmt()
                    .with_max_level(tracing::Level::DEBUG)
                    .init();
            } else {
                tracing_subscriber::fmt()
                    .with_max_level(tracing::Level::INFO)
                    .init();
            }

            run_board(file, api_key).await?;
        }

        Commands::Validate { file } => {
            validate_board(file)?;
        }

        Commands::Init { output } => {
            create_example_board(output)?;
        }
    }

    Ok(())
}

async fn run_board(file: PathBuf, api_key: Option<String>) -> Result<()> {
    println!("🚀 Loading board from: {}", file.display());

    let board_json = std::fs::read_to_string(&file)?;
    let store: CardStore = serde_json::from_str(&board_json)?;
    store
        .validate()
        .map_err(|reason| anyhow::anyhow!("invalid board: {reason}"))?;

    let roots = store.roots().count();
    println!("📋 Board: {} cards, {} roots", store.len(), roots);
    println!();

    let store = Arc::new(RwLock::new(store));
    let client = cardclient::client_for(api_key.as_deref());
    let engine = WorkflowEngine::with_event_bus(
        Arc::clone(&store),
        client,
        Arc::new(EventBus::default()),
    );

    // Subscribe to events for real-time output
    let mut events = engine.subscribe_events();

    let event_task = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                ExecutionEvent::RunStarted { roots, total_cards, .. } => {
                    println!("▶️  Run started: {} cards across {} trees", total_cards, roots);
                }
                ExecutionEvent::CardStarted { card_id, .. } => {
                    println!("  ⚡ Running card {}", card_id);
                }
                ExecutionEvent::CardCompleted { card_id, duration_ms, .. } => {
                    println!("  ✅ Card {} completed in {}ms", card_id, duration_ms);
                }
                ExecutionEvent::CardFailed { card_id, error, .. } => {
                    println!("  ❌ Card {} failed: {}", card_id, error);
                }
                ExecutionEvent::RunCompleted { completed, failed, duration_ms, .. } => {
                    if failed == 0 {
                        println!("✨ Run completed successfully in {}ms", duration_ms);
                    } else {
                        println!(
                            "💥 Run settled in {}ms with {} failed card(s), {} completed",
                            duration_ms, failed, completed
                        );
                    }
                }
            }
        }
    });

    let summary = engine.run().await?;

    // Wait for events to finish printing
    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    event_task.abort();

    println!();
    println!("📊 Run Summary:");
    println!("   Run ID: {}", summary.run_id);
    println!("   Completed: {}/{} cards", summary.completed, summary.total);
    if summary.failed > 0 {
        println!("   Failed: {} cards", summary.failed);
    }

    println!();
    println!("📤 Results:");
    let store = store.read().await;
    for card in store.cards.values() {
        let marker = match card.status {
            CardStatus::Done => "✅",
            CardStatus::Error => "❌",
            _ => "⏸️",
        };
        println!("   {} {} — {}", marker, card.id, snippet(&card.prompt));
        if let Some(result) = &card.result {
            println!("      {}", snippet(&next_input_from(result)));
        }
    }

    Ok(())
}

/// First 50 characters, single line, for compact terminal output
fn snippet(text: &str) -> String {
    let flat = text.replace('\n', " ");
    let mut out: String = flat.chars().take(50).collect();
    if flat.chars().count() > 50 {
        out.push_str("...");
    }
    out
}

fn validate_board(file: PathBuf) -> Result<()> {
    println!("🔍 Validating board: {}", file.display());

    let board_json = std::fs::read_to_string(&file)?;
    let store: CardStore = serde_json::from_str(&board_json)?;
    store
        .validate()
        .map_err(|reason| anyhow::anyhow!("invalid board: {reason}"))?;

    println!("✅ Board is valid:");
    println!("   Cards: {}", store.len());
    println!("   Roots: {}", store.roots().count());

    Ok(())
}

fn create_example_board(output: PathBuf) -> Result<()> {
    let mut store = CardStore::new();

    let root = store
        .create_card(None)
        .expect("root creation cannot fail");
    store.apply(
        root,
        CardPatch {
            prompt: Some("Write a short story about a lighthouse keeper.".to_string()),
            position: None,
        },
    );

    for prompt in [
        "Translate the story to French.",
        "List the story's main themes as bullet points.",
    ] {
        let child = store
            .create_card(Some(root))
            .expect("parent exists");
        store.apply(
            child,
            CardPatch {
                prompt: Some(prompt.to_string()),
                position: None,
            },
        );
    }

    let json = serde_json::to_string_pretty(&store)?;
    std::fs::write(&output, json)?;

    println!("✨ Created example board: {}", output.display());
    println!();
    println!("Run it with:");
    println!("  cardflow run --file {}", output.display());

    Ok(())
}
