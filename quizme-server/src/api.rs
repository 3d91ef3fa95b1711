//! API request and response types

use quizme_core::CorsPolicy;
use serde::{Deserialize, Serialize};

pub use quizme_core::EmbedEnvelope;

/// Domain registration request
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegisterDomainRequest {
    /// Domain (origin substring) allowed to embed the quiz
    #[serde(default)]
    pub domain: Option<String>,
}

/// Acknowledgement for mutations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse {
    /// Always true on a 2xx response
    pub success: bool,
}

impl SuccessResponse {
    /// A successful acknowledgement
    pub fn ok() -> Self {
        SuccessResponse { success: true }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Service status
    pub status: HealthStatus,

    /// Service version
    pub version: String,

    /// Uptime in seconds
    pub uptime_seconds: u64,

    /// Number of quizzes in the store
    pub loaded_quizzes: usize,

    /// How restricted quizzes answer CORS
    pub cors_policy: CorsPolicy,
}

/// Health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Service is healthy
    Healthy,
    /// Service is running but has nothing to serve
    Degraded,
}
