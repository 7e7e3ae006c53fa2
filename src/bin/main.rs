use clap::Parser;
use document_chat::{
    config::AppConfig,
    extract::read_upload,
    llm::{http_client, ResponseGenerator},
    models::{MemoryStrategy, SessionConfig, Vendor},
    session::Session,
};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Chat with a document and web pages from the terminal
#[derive(Parser, Debug)]
#[command(name = "chat", version, about)]
struct Args {
    /// Document to load (.txt or .pdf)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Web page to include; may be repeated
    #[arg(short, long = "url")]
    urls: Vec<String>,

    /// Model vendor: openai, anthropic or gemini
    #[arg(long)]
    vendor: Option<Vendor>,

    /// Model name; defaults to the vendor's default model
    #[arg(long)]
    model: Option<String>,

    /// Memory strategy: message_buffer, summary or token_buffer
    #[arg(long)]
    memory: Option<MemoryStrategy>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let app = AppConfig::from_env();

    let defaults = &app.session_defaults;
    let vendor = args.vendor.unwrap_or(defaults.vendor);
    let model = args
        .model
        .or_else(|| (vendor == defaults.vendor).then(|| defaults.model.clone()));
    let memory = args.memory.unwrap_or(defaults.memory);

    let mut session = Session::new(SessionConfig::new(vendor, model, memory))?;
    let client = http_client()?;

    if let Some(path) = &args.file {
        let (file_name, bytes) = read_upload(path).await?;
        match session.upload_document(&file_name, &bytes) {
            Ok(()) => println!("Loaded {}", file_name),
            Err(e) => eprintln!("Error: {}", e),
        }
    }

    if !args.urls.is_empty() {
        for failure in session.set_urls(&client, args.urls).await {
            eprintln!("Error extracting text from {}: {}", failure.url, failure.error);
        }
    }

    let generator = ResponseGenerator::from_config(&app, session.config(), client)?;
    info!(session_id = %session.id(), "Terminal chat started");

    println!(
        "Chatting with {} ({}), memory: {}",
        session.config().vendor,
        session.config().model,
        session.config().memory
    );
    println!("Type /memory to show conversation memory, /quit to exit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match line.trim() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/memory" => println!("{}", session.memory_snapshot()),
            question => match session.ask(question, &generator).await {
                Ok(outcome) => {
                    println!("{}", outcome.answer);
                    if let Some(warning) = outcome.memory_warning {
                        eprintln!("Warning: {}", warning);
                    }
                }
                Err(e) => eprintln!("Error: {}", e),
            },
        }
    }

    Ok(())
}
