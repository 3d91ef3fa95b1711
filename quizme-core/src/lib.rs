//! QuizMe Core - embeddable quiz access control and player
//!
//! This crate provides the access gate that decides which sites may embed a
//! quiz, the quiz stores it reads from, and the single-player state machine
//! that plays a quiz.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod gate;
pub mod player;
pub mod snippet;
pub mod store;
pub mod types;

pub use error::{QuizMeError, Result};
pub use gate::{AccessGate, CorsPolicy, Decision, Grant};
pub use player::{Command, Event, Player, PlayerConfig, PlayerDriver};
pub use snippet::EmbedSnippet;
pub use store::{DomainUpdate, JsonFileStore, MemoryStore, QuizStore};
pub use types::{EmbedEnvelope, EmbedQuiz, Question, Quiz, QuizCatalog};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
