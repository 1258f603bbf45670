//! Advice template.
//!
//! Output is a pure function of the prompt and the path taken. The prompt is
//! embedded exactly as received.

use crate::domain::types::VerificationPath;

/// Label inserted after "mock response" for each path
fn path_label(path: VerificationPath) -> &'static str {
    match path {
        VerificationPath::V3 => "",
        VerificationPath::V2 => " (verified with reCAPTCHA v2)",
        VerificationPath::V2Passed => " (reCAPTCHA v2 passed)",
    }
}

/// Render advice for `prompt`
pub fn render_advice(prompt: &str, path: VerificationPath) -> String {
    format!(
        "This is a mock response{} for your query about: '{}'.\n\n\
         This proves the frontend is successfully connected to the backend. \
         To get real advice, you would need to integrate a language model here.",
        path_label(path),
        prompt
    )
}
