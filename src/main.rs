//! StreamSight CLI
//!
//! Thin interactive shell over the session controller: maps terminal input
//! to intents and renders the transcript. All presentation concerns (error
//! prefixes, truncated session ids) live here, not in the core.

use clap::Parser;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use streamsight_lib::{
    default_export_dir, Author, ChatEntry, ErrorKind, HttpTransport, MediaFile, SessionController,
};

#[derive(Parser)]
#[command(name = "streamsight")]
#[command(about = "StreamSight - chat with an AI about your videos and images", long_about = None)]
struct Cli {
    /// Base URL of the analysis backend
    #[arg(
        short,
        long,
        default_value = "http://127.0.0.1:8000",
        env = "STREAMSIGHT_SERVER"
    )]
    server: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let transport = Arc::new(HttpTransport::new(&cli.server));
    let controller = SessionController::new(transport);
    controller.init().await;

    println!("StreamSight — session {}", short_status(&controller));
    println!("Commands: /upload <path> <prompt>, /reset, /export [dir], /status, /quit");

    let mut rendered = 0;
    rendered = render_new(&controller, rendered);

    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_command(line) {
            Command::Quit => break,
            Command::Status => print_status(&controller),
            Command::Reset => {
                controller.reset().await;
                rendered = 0;
                println!("New session {}", short_status(&controller));
            }
            Command::Export(dir) => match export_transcript(&controller, dir) {
                Ok(Some(path)) => println!("Exported to {}", path.display()),
                Ok(None) => println!("Nothing to export yet."),
                Err(e) => eprintln!("Export failed: {e}"),
            },
            Command::Upload { path, prompt } => {
                if prompt.trim().is_empty() {
                    eprintln!("Usage: /upload <path> <prompt>");
                } else {
                    match MediaFile::from_path(&path) {
                        Ok(file) => controller.upload(file, &prompt).await,
                        Err(e) => eprintln!("Cannot read {}: {e}", path.display()),
                    }
                }
            }
            Command::Send(text) => controller.send(&text).await,
            Command::Unknown(cmd) => eprintln!("Unknown command: {cmd}"),
        }

        rendered = render_new(&controller, rendered);
    }

    Ok(())
}

enum Command {
    Upload { path: PathBuf, prompt: String },
    Send(String),
    Reset,
    Export(Option<PathBuf>),
    Status,
    Quit,
    Unknown(String),
}

fn parse_command(line: &str) -> Command {
    if let Some(rest) = line.strip_prefix("/upload ") {
        let mut parts = rest.trim().splitn(2, char::is_whitespace);
        let path = parts.next().unwrap_or_default();
        let prompt = parts.next().unwrap_or_default().trim().to_string();
        return Command::Upload {
            path: PathBuf::from(path),
            prompt,
        };
    }
    match line {
        "/quit" | "/exit" => Command::Quit,
        "/reset" => Command::Reset,
        "/status" => Command::Status,
        "/export" => Command::Export(None),
        _ if line.starts_with("/export ") => {
            Command::Export(Some(PathBuf::from(line["/export ".len()..].trim())))
        }
        _ if line.starts_with('/') => Command::Unknown(line.to_string()),
        _ => Command::Send(line.to_string()),
    }
}

/// Print transcript entries appended since the last render, with the
/// presentation-side prefixes the core deliberately leaves out.
fn render_new(controller: &SessionController, rendered: usize) -> usize {
    let messages = controller.messages();
    for entry in &messages[rendered.min(messages.len())..] {
        println!("{}", format_entry(entry));
    }
    messages.len()
}

fn format_entry(entry: &ChatEntry) -> String {
    match entry.error_kind {
        Some(ErrorKind::Availability) => format!("⚠️  {}", entry.text),
        Some(_) => format!("❌ {}", entry.text),
        None if entry.author == Author::User => format!("You: {}", entry.text),
        None => format!("Bot: {}", entry.text),
    }
}

fn short_status(controller: &SessionController) -> String {
    let status = controller.status();
    format!(
        "{} ({})",
        status.short_session_id,
        if status.is_server_online {
            "server online"
        } else {
            "server offline"
        }
    )
}

fn print_status(controller: &SessionController) {
    let status = controller.status();
    println!("Session:  {}", status.session_id);
    println!(
        "Server:   {}",
        if status.is_server_online {
            "online"
        } else {
            "offline"
        }
    );
    println!(
        "State:    {}",
        if status.is_processing {
            "analyzing upload"
        } else if status.is_bot_loading {
            "awaiting reply"
        } else {
            "idle"
        }
    );
    println!("Messages: {}", status.message_count);
    if let Some(file) = controller.current_file() {
        println!("File:     {} ({} bytes, {})", file.name, file.size, file.mime_type);
    }
}

fn export_transcript(
    controller: &SessionController,
    dir: Option<PathBuf>,
) -> anyhow::Result<Option<PathBuf>> {
    let Some(export) = controller.export() else {
        return Ok(None);
    };
    let dir = dir.unwrap_or_else(default_export_dir);
    Ok(Some(export.write_to(&dir)?))
}
