//! Keyword command matcher.
//!
//! # Responsibility
//! - Normalize utterances and map them to a [`CommandKind`] through the fixed
//!   trigger table in [`rules`].
//!
//! # Invariants
//! - Matching is pure and deterministic; first rule in table order wins.
//! - Phrases match as contiguous whole words, never inside another word.
//! - Rules with qualifiers require one phrase and one qualifier.

use once_cell::sync::Lazy;
use regex::Regex;

mod rules;

pub use rules::{trigger_rules, CommandKind, TriggerRule};

/// Reply when no trigger phrase matches.
pub const FALLBACK_MESSAGE: &str =
    "I'm not sure how to respond to that. Could you try a different command?";

static WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{Alphabetic}\p{Nd}']+").expect("valid word regex"));

/// Result of a successful match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandMatch {
    pub kind: CommandKind,
    /// Trigger phrase that matched.
    pub phrase: &'static str,
    /// Normalized words following the phrase, empty when none.
    pub argument: String,
    /// Original text following the phrase, with case and punctuation kept.
    pub raw_argument: String,
}

/// One word of an utterance with its byte offset in the original text.
struct Token {
    word: String,
    start: usize,
}

fn tokenize(utterance: &str) -> Vec<Token> {
    WORD_RE
        .find_iter(utterance)
        .map(|found| Token {
            word: found.as_str().to_lowercase(),
            start: found.start(),
        })
        .collect()
}

/// Lower-cases and replaces every non-alphanumeric, non-apostrophe run with
/// one space.
pub fn normalize_utterance(utterance: &str) -> String {
    tokenize(utterance)
        .into_iter()
        .map(|token| token.word)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Returns the first rule matching `utterance`.
pub fn match_command(utterance: &str) -> Option<CommandMatch> {
    let tokens = tokenize(utterance);
    if tokens.is_empty() {
        return None;
    }
    let words = tokens.iter().map(|token| token.word.as_str()).collect::<Vec<_>>();

    let (kind, phrase, end) = trigger_rules()
        .iter()
        .find_map(|rule| rule.matches(&words))?;
    let raw_argument = tokens
        .get(end)
        .map(|token| utterance[token.start..].trim().to_string())
        .unwrap_or_default();

    Some(CommandMatch {
        kind,
        phrase,
        argument: words[end..].join(" "),
        raw_argument,
    })
}

impl TriggerRule {
    /// Returns `(kind, phrase, index past the phrase)` on a match.
    fn matches(&self, words: &[&str]) -> Option<(CommandKind, &'static str, usize)> {
        if !self.qualifiers.is_empty()
            && !self
                .qualifiers
                .iter()
                .any(|qualifier| find_phrase(words, qualifier).is_some())
        {
            return None;
        }

        self.phrases
            .iter()
            .find_map(|phrase| find_phrase(words, phrase).map(|end| (self.kind, *phrase, end)))
    }
}

/// Returns the index just past the first whole-word occurrence of `phrase`.
fn find_phrase(words: &[&str], phrase: &str) -> Option<usize> {
    let needle = phrase.split(' ').collect::<Vec<_>>();
    if needle.is_empty() || needle.len() > words.len() {
        return None;
    }
    words
        .windows(needle.len())
        .position(|window| window == needle.as_slice())
        .map(|start| start + needle.len())
}

/// Parses a number spoken as digits or as a word from zero to twenty.
pub fn parse_spoken_number(value: &str) -> Option<u64> {
    let value = value.trim();
    if let Ok(number) = value.parse::<u64>() {
        return Some(number);
    }
    const WORDS: &[&str] = &[
        "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
        "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen",
        "eighteen", "nineteen", "twenty",
    ];
    WORDS
        .iter()
        .position(|word| word.eq_ignore_ascii_case(value))
        .map(|index| index as u64)
}

/// Returns the first spoken number among the words of `text`.
pub fn first_number(text: &str) -> Option<u64> {
    text.split_whitespace()
        .map(|word| word.trim_start_matches('#'))
        .find_map(parse_spoken_number)
}

#[cfg(test)]
mod tests {
    use super::{first_number, match_command, normalize_utterance, CommandKind};

    #[test]
    fn normalizes_case_punctuation_and_spacing() {
        assert_eq!(
            normalize_utterance("  What's   the WEATHER, in Paris?! "),
            "what's the weather in paris"
        );
        assert_eq!(normalize_utterance("to-do list"), "to do list");
    }

    #[test]
    fn whole_word_matching_ignores_embedded_triggers() {
        assert_eq!(match_command("this is nothing"), None);
        assert_eq!(
            match_command("hi there").map(|found| found.kind),
            Some(CommandKind::Greeting)
        );
    }

    #[test]
    fn argument_is_text_after_phrase() {
        let found = match_command("Add task buy milk").expect("should match");
        assert_eq!(found.kind, CommandKind::AddTask);
        assert_eq!(found.phrase, "add task");
        assert_eq!(found.argument, "buy milk");
    }

    #[test]
    fn raw_argument_keeps_original_text() {
        let found = match_command("Summarize: It rained. We stayed in!").expect("should match");
        assert_eq!(found.kind, CommandKind::Summarize);
        assert_eq!(found.argument, "it rained we stayed in");
        assert_eq!(found.raw_argument, "It rained. We stayed in!");
    }

    #[test]
    fn qualifiers_are_required() {
        assert_eq!(match_command("lock"), None);
        assert_eq!(
            match_command("lock the screen").map(|found| found.kind),
            Some(CommandKind::LockScreen)
        );
        assert_eq!(
            match_command("cancel shutdown").map(|found| found.kind),
            Some(CommandKind::CancelShutdown)
        );
    }

    #[test]
    fn earlier_rules_win() {
        assert_eq!(
            match_command("tell me a joke").map(|found| found.kind),
            Some(CommandKind::TellJoke)
        );
        assert_eq!(
            match_command("stop music").map(|found| found.kind),
            Some(CommandKind::StopMusic)
        );
        assert_eq!(
            match_command("stop").map(|found| found.kind),
            Some(CommandKind::Exit)
        );
    }

    #[test]
    fn parses_spoken_numbers() {
        assert_eq!(first_number("task three please"), Some(3));
        assert_eq!(first_number("number 12"), Some(12));
        assert_eq!(first_number("#4"), Some(4));
        assert_eq!(first_number("none here"), None);
    }
}
