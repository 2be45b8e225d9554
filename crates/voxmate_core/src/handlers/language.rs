//! Language tool handlers.
//!
//! # Responsibility
//! - Translation and language detection through the public Google
//!   translate endpoint.
//! - Offline text tools: spelling fixes, word counts, summaries.
//!
//! # Invariants
//! - Offline tools are pure and never fail.
//! - Online failures return `Sorry, I encountered an error: ...`.

use crate::capability::{Capability, CapabilitySet};
use crate::platform::http::{HttpFetch, OnlineError};
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

const TRANSLATE_URL: &str = "https://translate.googleapis.com/translate_a/single";
const SUMMARY_SENTENCES: usize = 3;

const LANGUAGE_NAMES: &[(&str, &str)] = &[
    ("af", "Afrikaans"),
    ("ar", "Arabic"),
    ("bg", "Bulgarian"),
    ("bn", "Bengali"),
    ("ca", "Catalan"),
    ("cs", "Czech"),
    ("cy", "Welsh"),
    ("da", "Danish"),
    ("de", "German"),
    ("el", "Greek"),
    ("en", "English"),
    ("es", "Spanish"),
    ("et", "Estonian"),
    ("fa", "Persian"),
    ("fi", "Finnish"),
    ("fr", "French"),
    ("gu", "Gujarati"),
    ("he", "Hebrew"),
    ("hi", "Hindi"),
    ("hr", "Croatian"),
    ("hu", "Hungarian"),
    ("id", "Indonesian"),
    ("is", "Icelandic"),
    ("it", "Italian"),
    ("ja", "Japanese"),
    ("kn", "Kannada"),
    ("ko", "Korean"),
    ("lt", "Lithuanian"),
    ("lv", "Latvian"),
    ("ml", "Malayalam"),
    ("mr", "Marathi"),
    ("ms", "Malay"),
    ("nl", "Dutch"),
    ("no", "Norwegian"),
    ("pl", "Polish"),
    ("pt", "Portuguese"),
    ("ro", "Romanian"),
    ("ru", "Russian"),
    ("sk", "Slovak"),
    ("sl", "Slovenian"),
    ("sq", "Albanian"),
    ("sv", "Swedish"),
    ("sw", "Swahili"),
    ("ta", "Tamil"),
    ("te", "Telugu"),
    ("th", "Thai"),
    ("tr", "Turkish"),
    ("uk", "Ukrainian"),
    ("ur", "Urdu"),
    ("vi", "Vietnamese"),
    ("zh-cn", "Chinese (Simplified)"),
    ("zh-tw", "Chinese (Traditional)"),
];

const COMMON_MISSPELLINGS: &[(&str, &str)] = &[
    ("teh", "the"),
    ("dont", "don't"),
    ("cant", "can't"),
    ("wont", "won't"),
    ("isnt", "isn't"),
    ("didnt", "didn't"),
    ("shouldnt", "shouldn't"),
    ("couldnt", "couldn't"),
    ("wouldnt", "wouldn't"),
    ("im", "I'm"),
    ("ive", "I've"),
    ("youre", "you're"),
    ("theyre", "they're"),
    ("thats", "that's"),
    ("hes", "he's"),
    ("shes", "she's"),
    ("theres", "there's"),
    ("alot", "a lot"),
    ("alright", "all right"),
    ("recieve", "receive"),
    ("wierd", "weird"),
    ("beleive", "believe"),
    ("definately", "definitely"),
    ("occured", "occurred"),
    ("untill", "until"),
    ("accross", "across"),
    ("wich", "which"),
];

static MISSPELLING_RES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    COMMON_MISSPELLINGS
        .iter()
        .map(|(wrong, right)| {
            let pattern = format!(r"(?i)\b{}\b", regex::escape(wrong));
            (Regex::new(&pattern).expect("valid misspelling regex"), *right)
        })
        .collect()
});
static SENTENCE_END_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]+").expect("valid sentence end regex"));
static SENTENCE_BREAK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]\s+").expect("valid sentence break regex"));

/// Full language name for an ISO code, or `Unknown (code)`.
pub fn language_name(code: &str) -> String {
    let lowered = code.trim().to_lowercase();
    LANGUAGE_NAMES
        .iter()
        .find(|(known, _)| *known == lowered)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| format!("Unknown ({code})"))
}

/// ISO code for a spoken language name; unknown names pass through.
pub fn language_code(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    if lowered == "chinese" {
        return "zh-cn".to_string();
    }
    LANGUAGE_NAMES
        .iter()
        .find(|(_, known)| known.to_lowercase() == lowered)
        .map(|(code, _)| code.to_string())
        .unwrap_or(lowered)
}

static INLINE_TARGET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(.*\S)\s+(?:to|into)\s+(\p{Alphabetic}+)$").expect("valid inline target regex")
});

/// Splits `"hello world to spanish"` into text and a known target language.
pub fn split_inline_target(inline: &str) -> Option<(String, String)> {
    let captures = INLINE_TARGET_RE.captures(inline.trim())?;
    let language = captures.get(2)?.as_str();
    let known = language.eq_ignore_ascii_case("chinese")
        || LANGUAGE_NAMES
            .iter()
            .any(|(_, name)| name.eq_ignore_ascii_case(language));
    known.then(|| (captures[1].trim().to_string(), language.to_string()))
}

#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub translated_text: String,
    pub source_language: String,
}

/// Reads the nested-array response of the `translate_a/single` endpoint.
pub fn parse_translation(body: &Value) -> Option<Translation> {
    let segments = body.get(0)?.as_array()?;
    let translated_text = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect::<String>();
    if translated_text.is_empty() {
        return None;
    }
    let source_language = body
        .get(2)
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();
    Some(Translation {
        translated_text,
        source_language,
    })
}

fn request_translation(
    http: &dyn HttpFetch,
    text: &str,
    target: &str,
) -> Result<(Value, Translation), OnlineError> {
    let query = [
        ("client", "gtx"),
        ("sl", "auto"),
        ("tl", target),
        ("dt", "t"),
        ("q", text),
    ];
    let body = http.get_json(TRANSLATE_URL, &query)?;
    let translation = parse_translation(&body)
        .ok_or_else(|| OnlineError::Decode("translation shape".to_string()))?;
    Ok((body, translation))
}

/// Translates `text` into the spoken `target_language`.
pub fn translate(
    http: &dyn HttpFetch,
    capabilities: &CapabilitySet,
    text: &str,
    target_language: &str,
) -> String {
    if let Err(message) = capabilities.require(Capability::Translation) {
        return message.to_string();
    }
    let target = language_code(target_language);
    match request_translation(http, text, &target) {
        Ok((_, translation)) => format!(
            "The text in {} translates to {} as: {}",
            language_name(&translation.source_language),
            language_name(&target),
            translation.translated_text
        ),
        Err(err) => {
            warn!("event=translate module=handlers status=error error={}", err);
            format!("Sorry, I encountered an error: {err}")
        }
    }
}

pub fn detect_language(http: &dyn HttpFetch, capabilities: &CapabilitySet, text: &str) -> String {
    if let Err(message) = capabilities.require(Capability::Translation) {
        return message.to_string();
    }
    match request_translation(http, text, "en") {
        Ok((body, translation)) => {
            let name = language_name(&translation.source_language);
            match body.get(6).and_then(Value::as_f64) {
                Some(confidence) => format!(
                    "That appears to be {name} with {:.0}% confidence.",
                    confidence * 100.0
                ),
                None => format!("That appears to be {name}."),
            }
        }
        Err(err) => {
            warn!("event=detect_language module=handlers status=error error={}", err);
            format!("Sorry, I encountered an error: {err}")
        }
    }
}

/// Fixes a small table of common misspellings, case-insensitively.
pub fn correct_spelling(text: &str) -> String {
    MISSPELLING_RES
        .iter()
        .fold(text.to_string(), |current, (pattern, replacement)| {
            pattern.replace_all(&current, *replacement).into_owned()
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextStats {
    pub words: usize,
    pub sentences: usize,
    pub characters: usize,
    pub characters_no_spaces: usize,
}

pub fn count_words(text: &str) -> TextStats {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    TextStats {
        words: collapsed.split(' ').filter(|word| !word.is_empty()).count(),
        // Pieces after splitting on terminators, minus the trailing one.
        sentences: SENTENCE_END_RE.split(&collapsed).count().saturating_sub(1),
        characters: collapsed.chars().count(),
        characters_no_spaces: collapsed.chars().filter(|ch| *ch != ' ').count(),
    }
}

pub fn word_count_report(text: &str) -> String {
    let stats = count_words(text);
    format!(
        "That text has {} words, {} sentences and {} characters ({} without spaces)",
        stats.words, stats.sentences, stats.characters, stats.characters_no_spaces
    )
}

/// Splits after `.`, `!` or `?` followed by whitespace.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for found in SENTENCE_BREAK_RE.find_iter(text) {
        sentences.push(&text[start..found.start() + 1]);
        start = found.end();
    }
    if start < text.len() {
        sentences.push(&text[start..]);
    }
    sentences
}

/// Extractive summary keeping the leading sentences.
pub fn summarize(text: &str, max_sentences: usize) -> String {
    let sentences = split_sentences(text.trim());
    if sentences.len() <= max_sentences {
        return text.trim().to_string();
    }
    sentences[..max_sentences].join(" ")
}

pub fn summarize_default(text: &str) -> String {
    summarize(text, SUMMARY_SENTENCES)
}

#[cfg(test)]
mod tests {
    use super::{
        correct_spelling, count_words, language_code, language_name, parse_translation,
        split_inline_target, split_sentences, summarize,
    };
    use serde_json::json;

    #[test]
    fn splits_inline_target_only_for_known_languages() {
        assert_eq!(
            split_inline_target("Good morning to Spanish"),
            Some(("Good morning".to_string(), "Spanish".to_string()))
        );
        assert_eq!(split_inline_target("talk to mom"), None);
        assert_eq!(split_inline_target("french"), None);
    }

    #[test]
    fn maps_codes_and_names() {
        assert_eq!(language_name("FR"), "French");
        assert_eq!(language_name("xx"), "Unknown (xx)");
        assert_eq!(language_code("Spanish"), "es");
        assert_eq!(language_code("chinese"), "zh-cn");
        assert_eq!(language_code("pt"), "pt");
    }

    #[test]
    fn corrects_common_misspellings_without_touching_its() {
        assert_eq!(
            correct_spelling("Teh dog dont like its bone"),
            "the dog don't like its bone"
        );
        assert_eq!(correct_spelling("I recieve alot"), "I receive a lot");
    }

    #[test]
    fn counts_words_sentences_and_characters() {
        let stats = count_words("  Hello   world. How are you?  ");
        assert_eq!(stats.words, 5);
        assert_eq!(stats.sentences, 2);
        assert_eq!(stats.characters, "Hello world. How are you?".len());
        assert_eq!(stats.characters_no_spaces, 21);
        assert_eq!(count_words("").sentences, 0);
    }

    #[test]
    fn summary_keeps_first_three_sentences() {
        let text = "One. Two! Three? Four. Five.";
        assert_eq!(split_sentences(text), vec!["One.", "Two!", "Three?", "Four.", "Five."]);
        assert_eq!(summarize(text, 3), "One. Two! Three?");
        assert_eq!(summarize("Short text.", 3), "Short text.");
    }

    #[test]
    fn parses_translate_response() {
        let body = json!([[["Hola ", "Hello ", null], ["mundo", "world", null]], null, "en"]);
        let translation = parse_translation(&body).expect("translation should parse");
        assert_eq!(translation.translated_text, "Hola mundo");
        assert_eq!(translation.source_language, "en");
        assert!(parse_translation(&json!({"error": 1})).is_none());
    }
}
