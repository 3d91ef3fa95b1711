//! Embeddable viewer page

const TEMPLATE: &str = include_str!("../assets/embed.html");

/// Render the viewer page for `quiz_id`
pub fn render(quiz_id: &str) -> String {
    TEMPLATE.replace("{{QUIZ_ID}}", &escape_attr(quiz_id))
}

/// Escape text for use inside a double-quoted HTML attribute
fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
