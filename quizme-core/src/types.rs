//! Quiz data model and wire formats

use crate::error::{QuizMeError, Result};
use serde::{Deserialize, Deserializer, Serialize};

/// A single multiple-choice question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "QuestionRecord")]
pub struct Question {
    /// Prompt text
    pub question: String,
    /// Answer options, in display order
    pub options: Vec<String>,
    /// Exact value of the correct option
    pub correct_answer: String,
    /// Optional hint shown to the player
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Optional explanation of the answer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Question as it may appear on the wire, including the legacy `answers` field
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionRecord {
    question: String,
    options: Option<Vec<String>>,
    answers: Option<Vec<String>>,
    correct_answer: String,
    hint: Option<String>,
    explanation: Option<String>,
}

impl From<QuestionRecord> for Question {
    fn from(record: QuestionRecord) -> Self {
        Question {
            question: record.question,
            options: record.options.or(record.answers).unwrap_or_default(),
            correct_answer: record.correct_answer,
            hint: record.hint.filter(|h| !h.is_empty()),
            explanation: record.explanation.filter(|e| !e.is_empty()),
        }
    }
}

impl Question {
    /// Create a question without hint or explanation
    pub fn new(
        question: impl Into<String>,
        options: Vec<String>,
        correct_answer: impl Into<String>,
    ) -> Self {
        Question {
            question: question.into(),
            options,
            correct_answer: correct_answer.into(),
            hint: None,
            explanation: None,
        }
    }

    /// Check whether `answer` is exactly the correct option
    pub fn is_correct(&self, answer: &str) -> bool {
        self.correct_answer == answer
    }

    /// Check whether `option` is one of this question's options
    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }

    /// Validate that the correct answer is among the options
    pub fn validate(&self) -> Result<()> {
        if self.options.is_empty() {
            return Err(QuizMeError::InvalidInput(format!(
                "question '{}' has no options",
                self.question
            )));
        }
        if !self.has_option(&self.correct_answer) {
            return Err(QuizMeError::InvalidInput(format!(
                "question '{}': correct answer '{}' is not one of its options",
                self.question, self.correct_answer
            )));
        }
        Ok(())
    }
}

/// A quiz as held by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "QuizRecord")]
pub struct Quiz {
    /// Quiz identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Source text the quiz was generated from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Ordered questions
    pub questions: Vec<Question>,
    /// Declared question count
    pub total_questions: usize,
    /// Origins allowed to embed this quiz; empty means unrestricted
    pub allowed_embed_domains: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuizRecord {
    id: String,
    name: String,
    text: Option<String>,
    #[serde(deserialize_with = "deserialize_questions")]
    questions: Vec<Question>,
    total_questions: Option<usize>,
    allowed_embed_domains: Option<Vec<String>>,
}

impl From<QuizRecord> for Quiz {
    fn from(record: QuizRecord) -> Self {
        let total_questions = record.total_questions.unwrap_or(record.questions.len());
        Quiz {
            id: record.id,
            name: record.name,
            text: record.text,
            questions: record.questions,
            total_questions,
            allowed_embed_domains: record.allowed_embed_domains.unwrap_or_default(),
        }
    }
}

impl Quiz {
    /// Create a quiz with no domain restrictions
    pub fn new(id: impl Into<String>, name: impl Into<String>, questions: Vec<Question>) -> Self {
        let total_questions = questions.len();
        Quiz {
            id: id.into(),
            name: name.into(),
            text: None,
            questions,
            total_questions,
            allowed_embed_domains: Vec::new(),
        }
    }

    /// Restrict embedding to the given domains
    pub fn with_allowed_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_embed_domains = domains.into_iter().map(Into::into).collect();
        self
    }

    /// Whether any embedding restriction is configured
    pub fn is_restricted(&self) -> bool {
        !self.allowed_embed_domains.is_empty()
    }

    /// Validate identifiers and every question
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(QuizMeError::InvalidInput("quiz id is empty".into()));
        }
        if self.questions.is_empty() {
            return Err(QuizMeError::InvalidInput(format!(
                "quiz '{}' has no questions",
                self.id
            )));
        }
        for question in &self.questions {
            question.validate().map_err(|e| match e {
                QuizMeError::InvalidInput(msg) => {
                    QuizMeError::InvalidInput(format!("quiz '{}': {}", self.id, msg))
                }
                other => other,
            })?;
        }
        Ok(())
    }

    /// Public projection served to embedders
    pub fn to_embed(&self) -> EmbedQuiz {
        EmbedQuiz {
            id: self.id.clone(),
            name: self.name.clone(),
            questions: self.questions.clone(),
            total_questions: self.total_questions,
            allowed_embed_domains: self.allowed_embed_domains.clone(),
        }
    }
}

/// Public projection of a quiz, as returned by the embed data endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedQuiz {
    /// Quiz identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Ordered questions
    #[serde(deserialize_with = "deserialize_questions")]
    pub questions: Vec<Question>,
    /// Declared question count
    #[serde(default)]
    pub total_questions: usize,
    /// Origins allowed to embed this quiz
    #[serde(default, deserialize_with = "deserialize_domains")]
    pub allowed_embed_domains: Vec<String>,
}

/// Body of a successful embed data response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedEnvelope {
    /// The quiz
    pub quiz: EmbedQuiz,
}

/// On-disk catalog of quizzes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuizCatalog {
    /// All quizzes
    #[serde(default)]
    pub quizzes: Vec<Quiz>,
}

impl QuizCatalog {
    /// Parse a catalog from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Validate every quiz and reject duplicate ids
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for quiz in &self.quizzes {
            quiz.validate()?;
            if !seen.insert(quiz.id.as_str()) {
                return Err(QuizMeError::InvalidInput(format!(
                    "duplicate quiz id '{}'",
                    quiz.id
                )));
            }
        }
        Ok(())
    }
}

/// Accept questions either as a JSON array or as a string holding one
fn deserialize_questions<'de, D>(deserializer: D) -> std::result::Result<Vec<Question>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum QuestionList {
        Structured(Vec<Question>),
        Encoded(String),
    }

    match QuestionList::deserialize(deserializer)? {
        QuestionList::Structured(questions) => Ok(questions),
        QuestionList::Encoded(text) => serde_json::from_str(&text).map_err(serde::de::Error::custom),
    }
}

fn deserialize_domains<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
