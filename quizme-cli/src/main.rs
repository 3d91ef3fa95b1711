//! QuizMe CLI - Command-line interface for embeddable quizzes

mod play;

use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use colored::*;
use quizme_core::{AccessGate, CorsPolicy, EmbedSnippet, MemoryStore, PlayerConfig, QuizCatalog};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "quizme")]
#[command(about = "QuizMe - Embeddable quizzes with per-quiz domain allowlists")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a quiz catalog file
    Validate {
        /// Catalog file path
        file: PathBuf,
    },

    /// Evaluate the embed access gate for an origin
    Authorize {
        /// Catalog file path
        #[arg(short, long)]
        data: PathBuf,

        /// Quiz ID
        #[arg(short, long)]
        quiz: String,

        /// Origin of the embedding page
        #[arg(short, long, default_value = "")]
        origin: String,

        /// Output format (json, text)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Echo the matching origin instead of the joined allowlist
        #[arg(long)]
        reflect: bool,
    },

    /// Print the iframe snippet for embedding a quiz
    EmbedCode {
        /// Base URL of the QuizMe server
        #[arg(short, long)]
        base_url: String,

        /// Quiz ID
        #[arg(short, long)]
        quiz: String,

        /// Register this domain on the server before printing the snippet
        #[arg(short, long)]
        domain: Option<String>,

        /// Iframe height (any CSS length)
        #[arg(long, default_value = quizme_core::snippet::DEFAULT_HEIGHT)]
        height: String,
    },

    /// Play a quiz in the terminal
    #[command(group(ArgGroup::new("source").required(true).args(["server", "data"])))]
    Play {
        /// Quiz ID
        #[arg(short, long)]
        quiz: String,

        /// Base URL of a QuizMe server to fetch from
        #[arg(short, long)]
        server: Option<String>,

        /// Catalog file to play from instead of a server
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Feedback delay after checking an answer
        #[arg(long, default_value = "1500")]
        advance_delay_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("quizme=debug")
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Validate { file } => {
            validate_command(&file)?;
        }
        Commands::Authorize {
            data,
            quiz,
            origin,
            format,
            reflect,
        } => {
            authorize_command(&data, &quiz, &origin, &format, reflect)?;
        }
        Commands::EmbedCode {
            base_url,
            quiz,
            domain,
            height,
        } => {
            embed_code_command(&base_url, &quiz, domain, height).await?;
        }
        Commands::Play {
            quiz,
            server,
            data,
            advance_delay_ms,
        } => {
            let source = server
                .map(play::Source::Server)
                .or(data.map(play::Source::Data))
                .context("--server or --data is required")?;
            let config = PlayerConfig {
                advance_delay: Duration::from_millis(advance_delay_ms),
                ..PlayerConfig::default()
            };
            play::run(source, &quiz, config).await?;
        }
    }

    Ok(())
}

fn load_catalog(path: &Path) -> Result<QuizCatalog> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    QuizCatalog::from_json(&contents)
        .with_context(|| format!("Failed to parse catalog: {}", path.display()))
}

fn validate_command(file: &Path) -> Result<()> {
    println!("{} Validating {}...", "→".blue(), file.display());

    let catalog = load_catalog(file);
    match catalog.and_then(|c| c.validate().map(|_| c).map_err(Into::into)) {
        Ok(catalog) => {
            println!("{} Catalog is valid!", "✓".green());
            println!("  Quizzes: {}", catalog.quizzes.len());
            for quiz in &catalog.quizzes {
                let access = if quiz.is_restricted() {
                    format!("{} allowed domain(s)", quiz.allowed_embed_domains.len())
                } else {
                    "open".to_string()
                };
                println!(
                    "  {} {} ({} questions, {})",
                    "▸".blue(),
                    quiz.id,
                    quiz.questions.len(),
                    access
                );
            }
        }
        Err(e) => {
            println!("{} Catalog is invalid:", "✗".red());
            println!("  {:#}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthorizeReport<'a> {
    quiz: &'a str,
    origin: &'a str,
    decision: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    access_control_allow_origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn authorize_command(
    data: &Path,
    quiz: &str,
    origin: &str,
    format: &str,
    reflect: bool,
) -> Result<()> {
    let catalog = load_catalog(data)?;
    let policy = if reflect {
        CorsPolicy::Reflect
    } else {
        CorsPolicy::Joined
    };
    let gate = AccessGate::with_policy(Arc::new(MemoryStore::from_catalog(catalog)), policy);

    let report = match gate.authorize(quiz, Some(origin)) {
        Ok(grant) => AuthorizeReport {
            quiz,
            origin,
            decision: grant.decision.as_str(),
            access_control_allow_origin: Some(grant.allow_origin),
            error: None,
        },
        Err(quizme_core::QuizMeError::Forbidden(msg)) => AuthorizeReport {
            quiz,
            origin,
            decision: "deny",
            access_control_allow_origin: None,
            error: Some(msg),
        },
        Err(e) => return Err(e).with_context(|| format!("Failed to authorize quiz '{}'", quiz)),
    };

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            let status = if report.error.is_none() {
                "ALLOWED".green()
            } else {
                "DENIED".red()
            };

            println!("\n{} Embed Access", "═".blue().bold());
            println!("{} Status: {}", "▸".blue(), status);
            println!("{} Quiz: {}", "▸".blue(), quiz);
            println!(
                "{} Origin: {}",
                "▸".blue(),
                if origin.is_empty() { "(none)" } else { origin }
            );
            println!("{} Decision: {}", "▸".blue(), report.decision);
            if let Some(header) = &report.access_control_allow_origin {
                println!("{} Access-Control-Allow-Origin: {}", "▸".blue(), header);
            }
            if let Some(error) = &report.error {
                println!("{} {}", "▸".blue(), error);
            }
        }
    }

    Ok(())
}

async fn embed_code_command(
    base_url: &str,
    quiz: &str,
    domain: Option<String>,
    height: String,
) -> Result<()> {
    if let Some(domain) = domain {
        let url = play::embed_api_url(base_url, quiz, &["domains"])?;
        eprintln!("{} Registering {} for quiz {}...", "→".blue(), domain, quiz);

        let response = reqwest::Client::new()
            .post(url.clone())
            .json(&serde_json::json!({ "domain": domain }))
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            let message = body["message"].as_str().unwrap_or("no details");
            bail!("Domain registration failed ({}): {}", status, message);
        }
        eprintln!("{} Domain registered", "✓".green());
    }

    let snippet = EmbedSnippet::new(base_url, quiz).height(height);
    println!("{}", snippet.render());
    Ok(())
}
