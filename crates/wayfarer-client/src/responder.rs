//! Pluggable reply generation for AI conversations.
//!
//! The conversation state machine only needs *a* reply; where it comes
//! from is behind the [`Responder`] trait, so the baseline keyword
//! mapping can be swapped for a real AI backend without touching
//! anything else.

use chrono::Local;

/// Produces the assistant's reply to a user prompt.
pub trait Responder: Send + Sync {
    fn reply_to(&self, prompt: &str) -> String;
}

/// Baseline responder: a handful of keyword-to-reply mappings with an
/// echoing fallback.
pub struct KeywordResponder;

impl Responder for KeywordResponder {
    fn reply_to(&self, prompt: &str) -> String {
        let lower = prompt.to_lowercase();

        if lower.contains("hello") || lower.contains("hey") {
            "Hello! I'm the Wayfarer assistant. How can I help you today?".to_string()
        } else if lower.contains("weather") {
            "I can't fetch live weather yet. A weather app will know better.".to_string()
        } else if lower.contains("time") {
            format!("It's currently {}.", Local::now().format("%H:%M"))
        } else if lower.contains("thank") {
            "You're welcome! Anything else I can do?".to_string()
        } else if lower.contains("bye") {
            "Goodbye! Safe travels until next time.".to_string()
        } else {
            format!(
                "You said: {prompt}\n\nThis is a canned reply; a full deployment plugs a real model in here."
            )
        }
    }
}
