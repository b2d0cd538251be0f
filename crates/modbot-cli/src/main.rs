// ============================================================================
// modbot-memory — CLI archive inspection tool for modbot conversation memory
// ============================================================================
// Usage:
//   modbot-memory stats                     Show archive statistics
//   modbot-memory list                      List stored conversations
//   modbot-memory show <ID>                 Print one conversation
//   modbot-memory search <QUERY>            Search titles and messages
//   modbot-memory pin <ID>                  Toggle the pinned flag
//   modbot-memory export --output FILE      Export the archive as JSON
//   modbot-memory import FILE               Replace the archive from JSON
// ============================================================================

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use modbot_core::{
    Conversation, ConversationStore, MemoryConfig, RedbStorage, SystemClock, UuidIds,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Modbot conversation archive tool
#[derive(Parser)]
#[command(name = "modbot-memory", version, about = "Inspect and manage the modbot conversation archive")]
struct Cli {
    /// Path to the database file (default: ~/.modbot/memory.redb)
    #[arg(long, global = true)]
    db_path: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show archive statistics (conversations, pins, messages)
    Stats,

    /// List stored conversations in archive order
    List,

    /// Print one conversation with all its messages
    Show {
        id: String,
        /// Print the raw JSON record instead of a transcript
        #[arg(long)]
        json: bool,
    },

    /// Case-insensitive search over titles and message text
    Search { query: String },

    /// Toggle the pinned flag on a conversation
    Pin { id: String },

    /// Delete a conversation
    Delete { id: String },

    /// Give a conversation a new title
    Rename { id: String, title: String },

    /// Export the archive as JSON
    Export {
        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<String>,
    },

    /// Replace the whole archive with the contents of a JSON export
    Import { file: String },

    /// Delete every stored conversation
    Clear {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn init_logging() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("modbot_core=warn".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Could not load .env file: {}", e);
        }
    }
    init_logging()?;

    let cli = Cli::parse();
    let config = MemoryConfig::from_env();
    let db = Arc::new(RedbStorage::open(cli.db_path.as_deref()).context("Failed to open archive")?);
    let store = ConversationStore::new(
        db.clone(),
        &config,
        Arc::new(SystemClock),
        Arc::new(UuidIds),
    );

    match cli.command {
        Commands::Stats => cmd_stats(&store, &db, &config),
        Commands::List => cmd_list(&store),
        Commands::Show { id, json } => cmd_show(&store, &id, json),
        Commands::Search { query } => cmd_search(&store, &query),
        Commands::Pin { id } => cmd_pin(&store, &id),
        Commands::Delete { id } => cmd_delete(&store, &id),
        Commands::Rename { id, title } => cmd_rename(&store, &id, &title),
        Commands::Export { output } => cmd_export(&store, output.as_deref()),
        Commands::Import { file } => cmd_import(&store, &file),
        Commands::Clear { yes } => cmd_clear(&store, yes),
    }
}

fn cmd_stats(store: &ConversationStore, db: &RedbStorage, config: &MemoryConfig) -> Result<()> {
    let stats = store.statistics();

    println!("=== Modbot Memory Stats ===");
    println!("Database: {}", db.path().display());
    println!("Key:      {}", store.storage_key());
    println!();
    println!(
        "Conversations: {} ({} pinned, limit {} unpinned)",
        stats.total_conversations, stats.pinned_conversations, config.max_stored_conversations
    );
    println!(
        "Messages:      {} total, {} per conversation on average",
        stats.total_messages, stats.average_messages_per_conversation
    );
    if let Some(oldest) = stats.oldest_created_at {
        println!("Oldest:        {}", format_timestamp(oldest));
    }
    if let Some(newest) = stats.newest_updated_at {
        println!("Last update:   {}", format_timestamp(newest));
    }

    Ok(())
}

fn print_table(conversations: &[Conversation]) {
    println!(
        "{:<42}  {:<3}  {:>5}  {:<22}  {}",
        "ID", "PIN", "MSGS", "UPDATED", "TITLE"
    );
    println!("{}", "-".repeat(110));

    for conv in conversations {
        println!(
            "{:<42}  {:<3}  {:>5}  {:<22}  {}",
            conv.id,
            if conv.is_pinned { "*" } else { "" },
            conv.messages.len(),
            format_timestamp(conv.updated_at),
            conv.title
        );
    }
}

fn cmd_list(store: &ConversationStore) -> Result<()> {
    let conversations = store.list_all();

    if conversations.is_empty() {
        println!("No conversations stored.");
        return Ok(());
    }

    print_table(&conversations);
    println!("\nTotal: {} conversations", conversations.len());
    Ok(())
}

fn cmd_show(store: &ConversationStore, id: &str, json: bool) -> Result<()> {
    let conv = store
        .load(id)
        .with_context(|| format!("Conversation not found: {}", id))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&conv)?);
        return Ok(());
    }

    println!("{}{}", conv.title, if conv.is_pinned { "  [pinned]" } else { "" });
    println!(
        "created {} · updated {}",
        format_timestamp(conv.created_at),
        format_timestamp(conv.updated_at)
    );
    println!();
    for message in &conv.messages {
        println!("[{}] {}:", format_timestamp(message.timestamp), message.role);
        println!("{}\n", message.content);
    }
    Ok(())
}

fn cmd_search(store: &ConversationStore, query: &str) -> Result<()> {
    let hits = store.search(query);

    if hits.is_empty() {
        println!("No conversations match '{}'.", query);
        return Ok(());
    }

    print_table(&hits);
    println!("\n{} matching conversations", hits.len());
    Ok(())
}

fn cmd_pin(store: &ConversationStore, id: &str) -> Result<()> {
    if !store.pin(id) {
        anyhow::bail!("Could not toggle pin on '{}' (not found or storage error)", id);
    }
    let pinned = store.load(id).map(|c| c.is_pinned).unwrap_or(false);
    println!("{} is now {}", id, if pinned { "pinned" } else { "unpinned" });
    Ok(())
}

fn cmd_delete(store: &ConversationStore, id: &str) -> Result<()> {
    if !store.delete(id) {
        anyhow::bail!("Conversation '{}' was not deleted (not found or storage error)", id);
    }
    println!("Deleted {}", id);
    Ok(())
}

fn cmd_rename(store: &ConversationStore, id: &str, title: &str) -> Result<()> {
    if !store.rename(id, title) {
        anyhow::bail!("Could not rename '{}' (not found or storage error)", id);
    }
    println!("Renamed {}", id);
    Ok(())
}

fn cmd_export(store: &ConversationStore, output: Option<&str>) -> Result<()> {
    let json = store.export_all();

    match output {
        Some(path) => {
            std::fs::write(path, &json).with_context(|| format!("Failed to write {}", path))?;
            println!("Exported {} conversations to {}", store.list_all().len(), path);
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn cmd_import(store: &ConversationStore, file: &str) -> Result<()> {
    let blob = std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file))?;

    if !store.import_all(&blob) {
        anyhow::bail!(
            "Import rejected: {} is not a JSON array of conversations. Archive left unchanged.",
            file
        );
    }
    println!("Imported {} conversations", store.list_all().len());
    Ok(())
}

fn cmd_clear(store: &ConversationStore, yes: bool) -> Result<()> {
    if !yes {
        anyhow::bail!("Refusing to clear the archive without --yes");
    }
    if !store.clear() {
        anyhow::bail!("Failed to clear the archive");
    }
    println!("Archive cleared");
    Ok(())
}
