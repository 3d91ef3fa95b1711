//! Quiz player state machine
//!
//! Pure state: no clocks, no tasks. Time enters through [`Session::tick`]
//! and deferred advances through [`Session::advance`]; the
//! [`PlayerDriver`](super::PlayerDriver) decides when to call them.

use super::stats::CompletionStats;
use crate::types::{EmbedQuiz, Question};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message shown when a quiz cannot be loaded
pub const UNAVAILABLE_MESSAGE: &str =
    "Unable to load this quiz. It may have been removed or is not available for embedding.";

/// Why loading a quiz failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// Request never produced a response
    #[error("Transport error: {0}")]
    Transport(String),

    /// Server answered with a non-success status
    #[error("Unexpected status {0}")]
    Status(u16),

    /// Response body could not be understood
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Quiz holds no questions to play
    #[error("Quiz has no questions")]
    NoQuestions,
}

/// Result of checking the current answer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Correctness {
    /// Not checked yet
    #[default]
    Unanswered,
    /// Checked and right
    Correct,
    /// Checked and wrong
    Incorrect,
}

impl Correctness {
    /// Whether the current question has been checked
    pub fn is_answered(&self) -> bool {
        !matches!(self, Correctness::Unanswered)
    }
}

/// Where an advance led
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Moved to the question at this index
    Next(usize),
    /// No questions left
    Completed,
}

/// One traversal of a quiz
#[derive(Debug, Clone)]
pub struct Session {
    quiz: EmbedQuiz,
    index: usize,
    selected: Option<String>,
    correctness: Correctness,
    score: usize,
    skipped: usize,
    elapsed_secs: u64,
    complete: bool,
}

impl Session {
    /// Start a session at the first question
    pub fn new(quiz: EmbedQuiz) -> Result<Self, LoadError> {
        if quiz.questions.is_empty() {
            return Err(LoadError::NoQuestions);
        }

        Ok(Session {
            quiz,
            index: 0,
            selected: None,
            correctness: Correctness::Unanswered,
            score: 0,
            skipped: 0,
            elapsed_secs: 0,
            complete: false,
        })
    }

    /// The quiz being played
    pub fn quiz(&self) -> &EmbedQuiz {
        &self.quiz
    }

    /// Zero-based index of the current question
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of questions in the quiz
    pub fn total(&self) -> usize {
        self.quiz.questions.len()
    }

    /// The question on screen, if the session is still running
    pub fn current_question(&self) -> Option<&Question> {
        if self.complete {
            return None;
        }
        self.quiz.questions.get(self.index)
    }

    /// Currently selected option
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Correctness of the current question
    pub fn correctness(&self) -> Correctness {
        self.correctness
    }

    /// Correct answers so far
    pub fn score(&self) -> usize {
        self.score
    }

    /// Skipped questions so far
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Seconds counted so far
    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    /// Whether every question has been answered or skipped
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Select an option of the current question
    ///
    /// Ignored once the question has been checked, after completion, or when
    /// `option` is not one of the question's options.
    pub fn select_answer(&mut self, option: &str) -> bool {
        if self.correctness.is_answered() {
            return false;
        }
        match self.current_question() {
            Some(question) if question.has_option(option) => {
                self.selected = Some(option.to_string());
                true
            }
            _ => false,
        }
    }

    /// Check the selected option against the correct answer
    ///
    /// Returns `None` when there is nothing to check. The caller is expected
    /// to call [`Session::advance`] once the feedback delay has passed.
    pub fn check_answer(&mut self) -> Option<Correctness> {
        if self.correctness.is_answered() {
            return None;
        }
        let selected = self.selected.as_deref()?;
        let correct = self.current_question()?.is_correct(selected);

        self.correctness = if correct {
            self.score += 1;
            Correctness::Correct
        } else {
            Correctness::Incorrect
        };
        Some(self.correctness)
    }

    /// Move past the current question
    pub fn advance(&mut self) -> Advance {
        if self.complete {
            return Advance::Completed;
        }

        self.selected = None;
        self.correctness = Correctness::Unanswered;

        if self.index + 1 < self.total() {
            self.index += 1;
            Advance::Next(self.index)
        } else {
            self.complete = true;
            Advance::Completed
        }
    }

    /// Skip the current question without scoring
    pub fn skip_question(&mut self) -> Option<Advance> {
        if self.complete {
            return None;
        }
        self.skipped += 1;
        Some(self.advance())
    }

    /// Return to the first question with a clean slate
    pub fn restart(&mut self) {
        self.index = 0;
        self.selected = None;
        self.correctness = Correctness::Unanswered;
        self.score = 0;
        self.skipped = 0;
        self.elapsed_secs = 0;
        self.complete = false;
    }

    /// Count one elapsed second; no-op once complete
    pub fn tick(&mut self) -> bool {
        if self.complete {
            return false;
        }
        self.elapsed_secs += 1;
        true
    }

    /// Statistics for the completion view
    pub fn stats(&self) -> Option<CompletionStats> {
        self.complete.then(|| CompletionStats {
            correct: self.score,
            total: self.total(),
            skipped: self.skipped,
            elapsed_secs: self.elapsed_secs,
        })
    }
}

/// Top-level player state
#[derive(Debug, Clone, Default)]
pub enum Player {
    /// Waiting for quiz data
    #[default]
    Loading,
    /// Loading failed; terminal
    Failed {
        /// User-facing message
        message: String,
    },
    /// Quiz loaded and being played
    Ready(Session),
}

impl Player {
    /// Apply the outcome of the initial fetch
    ///
    /// Only acts while loading; a second outcome is ignored.
    pub fn finish_loading(&mut self, outcome: Result<EmbedQuiz, LoadError>) {
        if !matches!(self, Player::Loading) {
            return;
        }

        *self = match outcome.and_then(Session::new) {
            Ok(session) => Player::Ready(session),
            Err(e) => {
                tracing::warn!("Error loading quiz: {}", e);
                Player::Failed {
                    message: UNAVAILABLE_MESSAGE.to_string(),
                }
            }
        };
    }

    /// The running session, if loaded
    pub fn session(&self) -> Option<&Session> {
        match self {
            Player::Ready(session) => Some(session),
            _ => None,
        }
    }

    /// Mutable access to the running session, if loaded
    pub fn session_mut(&mut self) -> Option<&mut Session> {
        match self {
            Player::Ready(session) => Some(session),
            _ => None,
        }
    }

    /// Error message when loading failed
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Player::Failed { message } => Some(message),
            _ => None,
        }
    }
}
