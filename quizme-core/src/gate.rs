//! Access gate for embed requests
//!
//! Decides whether a requesting origin may read a quiz and which
//! `Access-Control-Allow-Origin` value to send back.
//!
//! Matching is substring containment: an allowed domain `example.com`
//! matches any origin that contains `example.com` anywhere, including
//! `https://example.com.attacker.net`. This is the established behavior of
//! the embed API and is kept as-is.

use crate::error::{QuizMeError, Result};
use crate::store::{DomainUpdate, QuizStore};
use crate::types::EmbedQuiz;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Wildcard CORS origin
pub const ANY_ORIGIN: &str = "*";

/// Access decision for an embed request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    /// Quiz has no restrictions
    AllowAll,
    /// Origin is empty or matches an allowed domain
    Allow,
    /// Origin matches none of the allowed domains
    Deny,
}

impl Decision {
    /// Check if the decision lets the quiz be served
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Decision::Deny)
    }

    /// Label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::AllowAll => "allow_all",
            Decision::Allow => "allow",
            Decision::Deny => "deny",
        }
    }
}

/// How the allow-origin header is derived for restricted quizzes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorsPolicy {
    /// Every allowed domain joined by a single space
    #[default]
    Joined,
    /// The matched request origin itself
    Reflect,
}

impl std::str::FromStr for CorsPolicy {
    type Err = QuizMeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "joined" => Ok(CorsPolicy::Joined),
            "reflect" => Ok(CorsPolicy::Reflect),
            other => Err(QuizMeError::InvalidInput(format!(
                "unknown CORS policy '{}' (expected 'joined' or 'reflect')",
                other
            ))),
        }
    }
}

/// A successful authorization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grant {
    /// The decision (never `Deny`)
    pub decision: Decision,
    /// Value for `Access-Control-Allow-Origin`
    pub allow_origin: String,
    /// Whether the allow-origin value depends on the request origin
    pub varies_by_origin: bool,
    /// Public projection of the quiz
    pub quiz: EmbedQuiz,
}

/// Decide access for `origin` against an allowed-domain list
pub fn evaluate(allowed_domains: &[String], origin: &str) -> Decision {
    if allowed_domains.is_empty() {
        return Decision::AllowAll;
    }

    if origin.is_empty() || allowed_domains.iter().any(|d| origin.contains(d.as_str())) {
        Decision::Allow
    } else {
        Decision::Deny
    }
}

/// Gate in front of the quiz store
pub struct AccessGate {
    store: Arc<dyn QuizStore>,
    cors: CorsPolicy,
}

impl AccessGate {
    /// Create a gate with the default CORS policy
    pub fn new(store: Arc<dyn QuizStore>) -> Self {
        Self::with_policy(store, CorsPolicy::default())
    }

    /// Create a gate with an explicit CORS policy
    pub fn with_policy(store: Arc<dyn QuizStore>, cors: CorsPolicy) -> Self {
        AccessGate { store, cors }
    }

    /// Configured CORS policy
    pub fn cors_policy(&self) -> CorsPolicy {
        self.cors
    }

    /// Number of quizzes reachable through this gate
    pub fn quiz_count(&self) -> usize {
        self.store.len()
    }

    /// Authorize an embed data request
    #[instrument(skip(self))]
    pub fn authorize(&self, quiz_id: &str, origin: Option<&str>) -> Result<Grant> {
        let origin = origin.unwrap_or_default();

        let quiz = self
            .store
            .find(quiz_id)?
            .ok_or_else(|| QuizMeError::NotFound(quiz_id.to_string()))?;

        let decision = evaluate(&quiz.allowed_embed_domains, origin);
        debug!("Embed decision for '{}' from '{}': {:?}", quiz_id, origin, decision);

        let (allow_origin, varies_by_origin) = match decision {
            Decision::Deny => {
                return Err(QuizMeError::Forbidden(
                    "This quiz cannot be embedded on this domain".into(),
                ))
            }
            Decision::AllowAll => (ANY_ORIGIN.to_string(), false),
            Decision::Allow => match self.cors {
                CorsPolicy::Reflect if !origin.is_empty() => (origin.to_string(), true),
                _ => (quiz.allowed_embed_domains.join(" "), false),
            },
        };

        Ok(Grant {
            decision,
            allow_origin,
            varies_by_origin,
            quiz: quiz.to_embed(),
        })
    }

    /// Register a domain allowed to embed the quiz
    #[instrument(skip(self))]
    pub fn register_allowed_domain(&self, quiz_id: &str, domain: &str) -> Result<DomainUpdate> {
        let domain = domain.trim();
        if domain.is_empty() {
            return Err(QuizMeError::InvalidInput("Domain is required".into()));
        }
        // Domains end up in the Access-Control-Allow-Origin header.
        if domain.chars().any(char::is_control) {
            return Err(QuizMeError::InvalidInput(
                "Domain contains control characters".into(),
            ));
        }

        let update = self.store.append_allowed_domain(quiz_id, domain)?;
        info!("Domain '{}' for quiz '{}': {}", domain, quiz_id, update.as_str());
        Ok(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::{Question, Quiz};
    use proptest::prelude::*;

    fn quiz(id: &str, domains: &[&str]) -> Quiz {
        Quiz::new(
            id,
            "Gate",
            vec![Question::new("Q?", vec!["a".into(), "b".into()], "a")],
        )
        .with_allowed_domains(domains.iter().copied())
    }

    fn gate_with(quizzes: Vec<Quiz>, cors: CorsPolicy) -> AccessGate {
        let store = MemoryStore::new();
        for q in quizzes {
            store.insert(q);
        }
        AccessGate::with_policy(Arc::new(store), cors)
    }

    #[test]
    fn test_unknown_quiz() {
        let gate = gate_with(vec![], CorsPolicy::Joined);
        let err = gate.authorize("missing", Some("https://a.com")).unwrap_err();
        assert!(matches!(err, QuizMeError::NotFound(_)));
    }

    #[test]
    fn test_unrestricted_quiz_uses_wildcard() {
        let gate = gate_with(vec![quiz("open", &[])], CorsPolicy::Joined);
        let grant = gate.authorize("open", Some("https://anywhere.net")).unwrap();
        assert_eq!(grant.decision, Decision::AllowAll);
        assert_eq!(grant.allow_origin, "*");
        assert_eq!(grant.quiz.id, "open");
    }

    #[test]
    fn test_restricted_quiz_matches_substring() {
        let gate = gate_with(vec![quiz("r", &["example.com"])], CorsPolicy::Joined);

        let grant = gate.authorize("r", Some("https://blog.example.com")).unwrap();
        assert_eq!(grant.decision, Decision::Allow);
        assert_eq!(grant.allow_origin, "example.com");

        let err = gate.authorize("r", Some("https://other.org")).unwrap_err();
        assert!(matches!(err, QuizMeError::Forbidden(_)));
    }

    #[test]
    fn test_substring_rule_is_permissive() {
        let gate = gate_with(vec![quiz("r", &["example.com"])], CorsPolicy::Joined);
        let grant = gate
            .authorize("r", Some("https://example.com.attacker.net"))
            .unwrap();
        assert_eq!(grant.decision, Decision::Allow);
    }

    #[test]
    fn test_missing_origin_is_direct_access() {
        let gate = gate_with(vec![quiz("r", &["example.com"])], CorsPolicy::Joined);
        let grant = gate.authorize("r", None).unwrap();
        assert_eq!(grant.decision, Decision::Allow);
    }

    #[test]
    fn test_joined_policy_space_separates_domains() {
        let gate = gate_with(vec![quiz("r", &["a.com", "b.com"])], CorsPolicy::Joined);
        let grant = gate.authorize("r", Some("https://b.com")).unwrap();
        assert_eq!(grant.allow_origin, "a.com b.com");
        assert!(!grant.varies_by_origin);
    }

    #[test]
    fn test_reflect_policy_echoes_origin() {
        let gate = gate_with(vec![quiz("r", &["a.com", "b.com"])], CorsPolicy::Reflect);
        let grant = gate.authorize("r", Some("https://b.com")).unwrap();
        assert_eq!(grant.allow_origin, "https://b.com");
        assert!(grant.varies_by_origin);
    }

    #[test]
    fn test_register_requires_domain() {
        let gate = gate_with(vec![quiz("r", &[])], CorsPolicy::Joined);
        assert!(matches!(
            gate.register_allowed_domain("r", "   "),
            Err(QuizMeError::InvalidInput(_))
        ));
        assert!(matches!(
            gate.register_allowed_domain("ghost", "a.com"),
            Err(QuizMeError::NotFound(_))
        ));
    }

    #[test]
    fn test_register_rejects_control_characters() {
        let gate = gate_with(vec![quiz("r", &[])], CorsPolicy::Joined);
        assert!(matches!(
            gate.register_allowed_domain("r", "a.com\r\nSet-Cookie: x"),
            Err(QuizMeError::InvalidInput(_))
        ));
        assert!(matches!(
            gate.register_allowed_domain("r", "a\u{7f}.com"),
            Err(QuizMeError::InvalidInput(_))
        ));

        // Nothing was stored, so the quiz stays open
        let grant = gate.authorize("r", Some("https://any.site")).unwrap();
        assert_eq!(grant.allow_origin, "*");
    }

    #[test]
    fn test_register_then_restricts() {
        let gate = gate_with(vec![quiz("r", &[])], CorsPolicy::Joined);
        assert_eq!(
            gate.register_allowed_domain("r", " shop.io ").unwrap(),
            DomainUpdate::Added
        );
        assert_eq!(
            gate.register_allowed_domain("r", "shop.io").unwrap(),
            DomainUpdate::AlreadyPresent
        );

        assert!(gate.authorize("r", Some("https://elsewhere.dev")).is_err());
        let grant = gate.authorize("r", Some("https://shop.io")).unwrap();
        assert_eq!(grant.quiz.allowed_embed_domains, vec!["shop.io"]);
    }

    #[test]
    fn test_cors_policy_from_str() {
        assert_eq!("Reflect".parse::<CorsPolicy>().unwrap(), CorsPolicy::Reflect);
        assert_eq!("joined".parse::<CorsPolicy>().unwrap(), CorsPolicy::Joined);
        assert!("exact".parse::<CorsPolicy>().is_err());
    }

    proptest! {
        #[test]
        fn prop_empty_list_allows_everything(origin in ".*") {
            prop_assert_eq!(evaluate(&[], &origin), Decision::AllowAll);
        }

        #[test]
        fn prop_empty_origin_always_allowed(domains in prop::collection::vec("[a-z]{1,8}\\.com", 1..5)) {
            prop_assert_eq!(evaluate(&domains, ""), Decision::Allow);
        }

        #[test]
        fn prop_non_matching_origin_denied(
            domains in prop::collection::vec("[a-z]{1,8}\\.com", 1..5),
            host in "[0-9]{1,8}",
        ) {
            // Digits-only hosts never contain a lowercase-letter domain.
            let origin = format!("https://{}.org", host);
            prop_assert_eq!(evaluate(&domains, &origin), Decision::Deny);
        }

        #[test]
        fn prop_containing_origin_allowed(
            domains in prop::collection::vec("[a-z]{1,8}\\.com", 1..5),
            pick in any::<prop::sample::Index>(),
        ) {
            let domain = pick.get(&domains);
            let origin = format!("https://www.{}", domain);
            prop_assert_eq!(evaluate(&domains, &origin), Decision::Allow);
        }
    }
}
