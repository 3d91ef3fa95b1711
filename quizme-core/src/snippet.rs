//! Iframe embed snippet generation

/// Default iframe height
pub const DEFAULT_HEIGHT: &str = "600px";

/// Builder for the iframe tag that embeds a quiz viewer
#[derive(Debug, Clone)]
pub struct EmbedSnippet {
    base_url: String,
    quiz_id: String,
    height: String,
}

impl EmbedSnippet {
    /// Snippet for `quiz_id` served from `base_url`
    pub fn new(base_url: impl Into<String>, quiz_id: impl Into<String>) -> Self {
        EmbedSnippet {
            base_url: base_url.into(),
            quiz_id: quiz_id.into(),
            height: DEFAULT_HEIGHT.to_string(),
        }
    }

    /// Override the iframe height (any CSS length)
    pub fn height(mut self, height: impl Into<String>) -> Self {
        self.height = height.into();
        self
    }

    /// URL of the viewer page
    pub fn viewer_url(&self) -> String {
        format!("{}/embed/{}", self.base_url.trim_end_matches('/'), self.quiz_id)
    }

    /// Render the iframe tag
    pub fn render(&self) -> String {
        format!(
            r#"<iframe
  src="{}"
  width="100%"
  height="{}"
  frameborder="0"
  style="border-radius: 8px; box-shadow: 0 4px 12px rgba(0, 0, 0, 0.1);"
  allow="clipboard-write"
></iframe>"#,
            self.viewer_url(),
            self.height
        )
    }
}
