//! Follow-up question seam implemented by the presentation shell.

use std::collections::VecDeque;

/// Shell-side channel for follow-up questions.
pub trait Conversation {
    /// Speaks or prints `prompt` and returns the user's answer.
    ///
    /// `None` means the user gave no answer (silence, EOF).
    fn ask(&mut self, prompt: &str) -> Option<String>;
}

/// Conversation replaying a fixed list of answers and recording prompts.
#[derive(Debug, Clone, Default)]
pub struct ScriptedConversation {
    answers: VecDeque<String>,
    prompts: Vec<String>,
}

impl ScriptedConversation {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            prompts: Vec::new(),
        }
    }

    /// Conversation that never answers.
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Conversation for ScriptedConversation {
    fn ask(&mut self, prompt: &str) -> Option<String> {
        self.prompts.push(prompt.to_string());
        self.answers.pop_front()
    }
}

/// Asks `prompt` and returns the trimmed non-empty answer.
pub fn ask_text(conversation: &mut dyn Conversation, prompt: &str) -> Option<String> {
    conversation
        .ask(prompt)
        .map(|answer| answer.trim().to_string())
        .filter(|answer| !answer.is_empty())
}

/// Uses `inline` when non-blank, otherwise asks `prompt`.
pub fn inline_or_ask(
    inline: &str,
    conversation: &mut dyn Conversation,
    prompt: &str,
) -> Option<String> {
    let inline = inline.trim();
    if inline.is_empty() {
        ask_text(conversation, prompt)
    } else {
        Some(inline.to_string())
    }
}

/// Returns whether a spoken answer means yes.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(
        answer.trim().to_lowercase().as_str(),
        "yes" | "y" | "yeah" | "yep" | "sure" | "ok" | "okay" | "confirm" | "do it"
    )
}

#[cfg(test)]
mod tests {
    use super::{inline_or_ask, is_affirmative, Conversation, ScriptedConversation};

    #[test]
    fn scripted_conversation_replays_answers_in_order() {
        let mut conversation = ScriptedConversation::new(["first", "second"]);
        assert_eq!(conversation.ask("one?").as_deref(), Some("first"));
        assert_eq!(conversation.ask("two?").as_deref(), Some("second"));
        assert_eq!(conversation.ask("three?"), None);
        assert_eq!(conversation.prompts(), ["one?", "two?", "three?"]);
    }

    #[test]
    fn inline_argument_skips_question() {
        let mut conversation = ScriptedConversation::new(["asked"]);
        assert_eq!(
            inline_or_ask(" buy milk ", &mut conversation, "What?").as_deref(),
            Some("buy milk")
        );
        assert!(conversation.prompts().is_empty());
        assert_eq!(
            inline_or_ask("", &mut conversation, "What?").as_deref(),
            Some("asked")
        );
    }

    #[test]
    fn recognizes_affirmative_answers() {
        assert!(is_affirmative(" Yes "));
        assert!(is_affirmative("okay"));
        assert!(!is_affirmative("no"));
        assert!(!is_affirmative(""));
    }
}
