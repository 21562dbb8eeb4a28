use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use yomigo::{Config, ImageRequest, ParsedSentence, Service, export};

#[derive(Parser)]
#[command(name = "yomigo", version, about = "Break Japanese manga text down into tokens and JMdict definitions")]
struct Cli {
    /// Config file (defaults to ./config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also write the vocabulary CSV to [output].vocabulary_file
    #[arg(long, global = true)]
    export: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Report which collaborators are installed
    Health,
    /// Analyze already extracted text
    Text { text: String },
    /// OCR an image file, then analyze the text
    Image { path: PathBuf },
    /// Analyze every non-empty line of [input].text_file
    Batch,
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_path(path),
        None if Path::new("config.toml").exists() => Config::load(),
        None => Ok(Config::default()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_banner(service: &Service) {
    let health = service.health();
    let status = |name: &str| {
        if health.services.get(name).copied().unwrap_or(false) {
            "Available"
        } else {
            "NOT INSTALLED"
        }
    };

    eprintln!("{}", "=".repeat(50));
    eprintln!("YomiGo");
    eprintln!("{}", "=".repeat(50));
    eprintln!("OCR:        {}", status("ocr"));
    eprintln!("Parser:     {}", status("parser"));
    eprintln!("Dictionary: {}", status("dictionary"));
    eprintln!("{}", "=".repeat(50));
}

fn export_if_requested(enabled: bool, sentence: &ParsedSentence, config: &Config) -> Result<()> {
    if !enabled {
        return Ok(());
    }
    let path = &config.output.vocabulary_file;
    let rows = export::write_vocabulary_file(sentence, path)
        .with_context(|| format!("cannot write vocabulary file {}", path))?;
    eprintln!("wrote {} vocabulary rows to {}", rows, path);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let service = Service::from_config(&config);
    print_banner(&service);

    match cli.command {
        Command::Health => print_json(&service.health())?,
        Command::Text { text } => {
            let sentence = service.process_text(&text).await?;
            print_json(&sentence)?;
            export_if_requested(cli.export, &sentence, &config)?;
        }
        Command::Image { path } => {
            let image = std::fs::read(&path)
                .with_context(|| format!("cannot read image {}", path.display()))?;
            let request = ImageRequest {
                image_data: STANDARD.encode(image),
            };
            let sentence = service.process_image(&request).await?;
            print_json(&sentence)?;
            export_if_requested(cli.export, &sentence, &config)?;
        }
        Command::Batch => {
            let input = std::fs::read_to_string(&config.input.text_file)
                .with_context(|| format!("cannot read input file {}", config.input.text_file))?;

            let mut combined = ParsedSentence::empty();
            for line in input.lines().map(str::trim).filter(|l| !l.is_empty()) {
                let sentence = service.process_text(line).await?;
                print_json(&sentence)?;
                combined.original_text.push_str(&sentence.original_text);
                combined.tokens.extend(sentence.tokens);
            }
            export_if_requested(cli.export, &combined, &config)?;
        }
    }

    service.shutdown().await;
    Ok(())
}
