//! Terminal quiz player

use anyhow::{anyhow, bail, Context, Result};
use colored::*;
use quizme_core::player::{CompletionStats, Correctness, LoadError, Session, Update};
use quizme_core::{
    AccessGate, Command, EmbedEnvelope, EmbedQuiz, Event, MemoryStore, Player, PlayerConfig,
    PlayerDriver, QuizCatalog, QuizMeError,
};
use reqwest::Url;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

/// Where the quiz data comes from
pub enum Source {
    /// A running embed server
    Server(String),
    /// A local catalog file
    Data(PathBuf),
}

/// URL of a quiz's embed API resource, with the quiz id as one encoded segment
pub fn embed_api_url(base_url: &str, quiz_id: &str, tail: &[&str]) -> Result<Url> {
    let mut url =
        Url::parse(base_url).with_context(|| format!("Invalid base URL: {}", base_url))?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("Base URL cannot have a path: {}", base_url))?
        .pop_if_empty()
        .extend(["api", "public", "embed", quiz_id])
        .extend(tail);
    Ok(url)
}

/// Fetch a quiz from the embed data endpoint
pub async fn fetch_from_server(base_url: &str, quiz_id: &str) -> Result<EmbedQuiz, LoadError> {
    let url = embed_api_url(base_url, quiz_id, &[])
        .map_err(|e| LoadError::Transport(format!("{:#}", e)))?;
    debug!("Fetching {}", url);

    let response = reqwest::get(url)
        .await
        .map_err(|e| LoadError::Transport(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(LoadError::Status(status.as_u16()));
    }

    let envelope: EmbedEnvelope = response
        .json()
        .await
        .map_err(|e| LoadError::Malformed(e.to_string()))?;
    Ok(envelope.quiz)
}

/// Load a quiz from a catalog file, as an embedder without an origin would
pub fn load_from_catalog(path: &Path, quiz_id: &str) -> Result<EmbedQuiz, LoadError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| LoadError::Transport(format!("{}: {}", path.display(), e)))?;
    let catalog =
        QuizCatalog::from_json(&text).map_err(|e| LoadError::Malformed(e.to_string()))?;

    let gate = AccessGate::new(Arc::new(MemoryStore::from_catalog(catalog)));
    match gate.authorize(quiz_id, None) {
        Ok(grant) => Ok(grant.quiz),
        Err(QuizMeError::NotFound(_)) => Err(LoadError::Status(404)),
        Err(QuizMeError::Forbidden(_)) => Err(LoadError::Status(403)),
        Err(other) => Err(LoadError::Malformed(other.to_string())),
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Player(Command),
    Quit,
}

/// Map a line of user input to an action
fn parse_input(line: &str, session: Option<&Session>) -> Option<Input> {
    let line = line.trim();
    let command = match line {
        "" => return None,
        "q" | "quit" => return Some(Input::Quit),
        "c" | "check" => Command::Check,
        "s" | "skip" => Command::Skip,
        "r" | "restart" => Command::Restart,
        _ => {
            let options = session
                .and_then(|s| s.current_question())
                .map(|q| q.options.as_slice())
                .unwrap_or_default();
            Command::Select(option_by_key(line, options).unwrap_or(line).to_string())
        }
    };
    Some(Input::Player(command))
}

/// Resolve `1`-based numbers and uppercase letters to an option
fn option_by_key<'a>(key: &str, options: &'a [String]) -> Option<&'a str> {
    let index = match key.parse::<usize>() {
        Ok(n) => n.checked_sub(1)?,
        Err(_) => {
            let mut chars = key.chars();
            match (chars.next(), chars.next()) {
                (Some(c @ 'A'..='Z'), None) => (c as u8 - b'A') as usize,
                _ => return None,
            }
        }
    };
    options.get(index).map(String::as_str)
}

/// Run the player until the user quits or stdin closes
pub async fn run(source: Source, quiz_id: &str, config: PlayerConfig) -> Result<()> {
    let mut driver = PlayerDriver::new(config);
    render(driver.player());

    let outcome = match &source {
        Source::Server(url) => fetch_from_server(url, quiz_id).await,
        Source::Data(path) => load_from_catalog(path, quiz_id),
    };
    driver.handle(Event::Loaded(outcome));
    render(driver.player());

    if driver.player().error_message().is_some() {
        bail!("quiz '{}' could not be loaded", quiz_id);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        // Let a pending advance land before exiting on closed input.
        if !stdin_open && !driver.has_pending_advance() {
            break;
        }

        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                let Some(line) = line? else {
                    stdin_open = false;
                    continue;
                };
                match parse_input(&line, driver.player().session()) {
                    None => {}
                    Some(Input::Quit) => break,
                    Some(Input::Player(command)) => match driver.handle(Event::Command(command)) {
                        Update::Changed => render(driver.player()),
                        _ => println!("{} Nothing to do for '{}'", "!".yellow(), line.trim()),
                    },
                }
            }
            update = driver.step() => match update {
                Some(Update::Changed) => render(driver.player()),
                Some(_) => {}
                None => break,
            },
        }
    }

    driver.shutdown();
    Ok(())
}

fn render(player: &Player) {
    match player {
        Player::Loading => println!("{} Loading quiz...", "→".blue()),
        Player::Failed { message } => {
            println!("\n{} {}", "✗".red(), "Quiz Not Available".red().bold());
            println!("  {}", message);
        }
        Player::Ready(session) => match session.stats() {
            Some(stats) => render_complete(&stats),
            None => render_question(session),
        },
    }
}

fn render_question(session: &Session) {
    let Some(question) = session.current_question() else {
        return;
    };

    println!("\n{} {}", "═".blue().bold(), session.quiz().name.bold());
    println!(
        "{} Question {} of {}    Score: {}",
        "▸".blue(),
        session.index() + 1,
        session.total(),
        session.score()
    );
    println!("\n  {}\n", question.question);

    let answered = session.correctness().is_answered();
    for (i, option) in question.options.iter().enumerate() {
        let label = format!("{}. {}", i + 1, option);
        let is_selected = session.selected() == Some(option.as_str());
        let line = if answered && question.is_correct(option) {
            label.green().bold()
        } else if answered && is_selected {
            label.red()
        } else if is_selected {
            label.cyan().bold()
        } else {
            label.normal()
        };
        println!("    {}", line);
    }

    match session.correctness() {
        Correctness::Unanswered => {
            if let Some(hint) = &question.hint {
                println!("\n  {} {}", "Hint:".dimmed(), hint.dimmed());
            }
            println!(
                "\n  {}",
                "[number/letter] select   c check   s skip   r restart   q quit".dimmed()
            );
        }
        Correctness::Correct => println!("\n  {} Correct!", "✓".green()),
        Correctness::Incorrect => println!(
            "\n  {} Incorrect. The correct answer is {}",
            "✗".red(),
            question.correct_answer.bold()
        ),
    }

    if answered {
        if let Some(explanation) = &question.explanation {
            println!("  {}", explanation);
        }
    }
}

fn render_complete(stats: &CompletionStats) {
    let tier = stats.tier();
    println!("\n{} {}", "═".blue().bold(), "Quiz Complete!".bold());
    println!("{} {}", "▸".blue(), tier.label());
    println!("  {}", tier.message());
    println!(
        "{} Score: {}/{} ({}%)",
        "▸".blue(),
        stats.correct,
        stats.total,
        stats.percentage()
    );
    println!("{} Skipped: {}", "▸".blue(), stats.skipped);
    println!("{} Time spent: {}", "▸".blue(), stats.formatted_time());
    println!("\n  {}", "r restart   q quit".dimmed());
}
