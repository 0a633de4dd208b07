use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::debug;

use crate::chat::{StartChat, start_direct_chat};
use crate::filters::{apply_filters, parse_filter};
use crate::models::{ChatThread, MessageRecord, MessageStatus, Participant};
use crate::parsers::append_document;
use crate::reconciler::{derive_pair_key, reconcile_with_report};
use crate::sync::{
    CONVERSATIONS_FILE, discover_message_logs, load_data_dir, load_thread_messages, open_store,
};
use crate::utils::{format_activity, format_path_with_tilde, get_data_dir};

/// Environment variable naming the viewing user
pub const USER_ENV: &str = "HACCP_CHAT_USER";

#[derive(Parser)]
#[command(name = "haccp-chat")]
#[command(version = "0.1.0")]
#[command(about = "Reconcile and browse HACCP team chat snapshots", long_about = None)]
pub struct Cli {
    /// Snapshot directory (defaults to ~/.haccp-chat)
    #[arg(long, global = true, env = "HACCP_CHAT_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Participant ID of the viewing user
    #[arg(short, long, global = true, env = "HACCP_CHAT_USER")]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the reconciled chat threads of the user, most recent first
    Threads {
        /// Filter expression, e.g. 'type:group unread:true'
        #[arg(short, long)]
        filter: Option<String>,
        /// Print the threads as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show statistics about the snapshot directory
    Stats,
    /// Print the canonical pair key of two participants
    Key { first: String, second: String },
    /// Show the messages of one thread, oldest first
    History {
        thread_id: String,
        /// Print the messages as JSON
        #[arg(long)]
        json: bool,
    },
    /// Open the direct chat with a peer, creating it if needed
    StartChat {
        peer: String,
        /// Display name of the user
        #[arg(long)]
        name: Option<String>,
        /// Display name of the peer
        #[arg(long)]
        peer_name: Option<String>,
    },
}

pub fn run() -> Result<()> {
    execute(Cli::parse())
}

pub fn execute(cli: Cli) -> Result<()> {
    let Some(command) = &cli.command else {
        println!("Use --help for usage information");
        return Ok(());
    };

    match command {
        Commands::Threads { filter, json } => {
            show_threads(&data_dir(&cli)?, viewer(&cli)?, filter.as_deref(), *json)
        }
        Commands::Stats => show_stats(&data_dir(&cli)?, viewer(&cli)?),
        Commands::Key { first, second } => {
            println!("{}", derive_pair_key(first, second));
            Ok(())
        }
        Commands::History { thread_id, json } => show_history(&data_dir(&cli)?, thread_id, *json),
        Commands::StartChat { peer, name, peer_name } => {
            let user = Participant { id: viewer(&cli)?.to_string(), name: name.clone() };
            let peer = Participant { id: peer.clone(), name: peer_name.clone() };
            start_chat(&data_dir(&cli)?, &user, &peer)
        }
    }
}

fn data_dir(cli: &Cli) -> Result<PathBuf> {
    match &cli.data_dir {
        Some(dir) => Ok(dir.clone()),
        None => get_data_dir(),
    }
}

fn viewer(cli: &Cli) -> Result<&str> {
    match cli.user.as_deref().map(str::trim) {
        Some(user) if !user.is_empty() => Ok(user),
        _ => bail!("No user given: pass --user or set {}", USER_ENV),
    }
}

fn show_threads(data_dir: &Path, viewer: &str, filter: Option<&str>, json: bool) -> Result<()> {
    let snapshot = load_data_dir(data_dir)?.visible_to(viewer);
    let report = reconcile_with_report(&snapshot.conversations, &snapshot.groups, viewer);

    let mut threads = report.threads;
    if let Some(query) = filter {
        let expr = parse_filter(query).with_context(|| format!("Invalid filter: {}", query))?;
        threads = apply_filters(threads, &expr, viewer);
    }
    debug!(shown = threads.len(), "threads listed");

    if json {
        println!("{}", serde_json::to_string_pretty(&threads)?);
        return Ok(());
    }

    if threads.is_empty() {
        println!("No threads for {}", viewer);
        return Ok(());
    }
    for thread in &threads {
        print_thread(thread, viewer);
    }
    Ok(())
}

fn print_thread(thread: &ChatThread, viewer: &str) {
    let unread = match thread.unread_for(viewer) {
        0 => String::new(),
        n => format!("  ({} unread)", n),
    };
    println!(
        "{:<12}  {:<6}  {}  [{}]{}",
        format_activity(thread.last_message_time().as_ref()),
        thread.kind_label(),
        thread.title(),
        thread.id(),
        unread
    );
    if let Some(preview) = thread.last_message() {
        let sender = thread.last_message_sender().unwrap_or("?");
        println!("{:<12}  {}: {}", "", sender, preview);
    }
}

fn show_stats(data_dir: &Path, viewer: &str) -> Result<()> {
    let snapshot = load_data_dir(data_dir)?;
    let visible = snapshot.visible_to(viewer);
    let report = reconcile_with_report(&visible.conversations, &visible.groups, viewer);

    let direct = report.threads.iter().filter(|t| !t.is_group()).count();
    let groups = report.threads.len() - direct;
    let unread: u64 = report.threads.iter().map(|t| u64::from(t.unread_for(viewer))).sum();
    let message_logs = discover_message_logs(data_dir)?.len();

    println!("HACCP Chat Statistics");
    println!("=====================");
    println!("Threads for {}: {}", viewer, report.threads.len());
    println!("  Direct: {}", direct);
    println!("  Groups: {}", groups);
    println!("Unread messages: {}", unread);
    println!();
    println!("Conversation documents: {}", snapshot.conversations.len());
    println!("  Duplicates resolved: {}", report.duplicates_dropped);
    println!("  Malformed dropped: {}", report.malformed_dropped);
    println!("Group documents: {}", snapshot.groups.len());
    println!("Message logs: {}", message_logs);
    println!();
    println!("Data directory: {}", format_path_with_tilde(data_dir));

    Ok(())
}

fn show_history(data_dir: &Path, thread_id: &str, json: bool) -> Result<()> {
    let messages = load_thread_messages(data_dir, thread_id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }

    if messages.is_empty() {
        println!("No messages in {}", thread_id);
        return Ok(());
    }
    for message in &messages {
        print_message(message);
    }
    Ok(())
}

fn print_message(message: &MessageRecord) {
    let time = match &message.timestamp {
        Some(ts) => ts.format("%Y-%m-%d %H:%M").to_string(),
        None => "pending".to_string(),
    };
    let sender =
        if message.sender_name.is_empty() { &message.sender_id } else { &message.sender_name };
    let status = match message.status {
        MessageStatus::Sent => "",
        MessageStatus::Delivered => " ✓",
        MessageStatus::Read => " ✓✓",
    };
    println!("{:<16}  {}: {}{}", time, sender, message.text, status);
    for attachment in &message.attachments {
        println!(
            "{:<16}    [{}] {} ({} bytes)",
            "", attachment.kind, attachment.name, attachment.size
        );
    }
}

fn start_chat(data_dir: &Path, user: &Participant, peer: &Participant) -> Result<()> {
    let store = open_store(data_dir)?;

    match start_direct_chat(&store, user, peer, Utc::now())? {
        StartChat::Existing(record) => {
            println!("Existing conversation {} with {}", record.id, peer.id);
        }
        StartChat::Created(record) => {
            fs::create_dir_all(data_dir).with_context(|| {
                format!("Failed to create data directory {}", data_dir.display())
            })?;
            append_document(&data_dir.join(CONVERSATIONS_FILE), &record)?;
            println!("Created conversation {} with {}", record.id, peer.id);
        }
    }
    Ok(())
}
