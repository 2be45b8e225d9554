//! Online lookup handlers.
//!
//! # Responsibility
//! - Call one third-party HTTP endpoint per handler and phrase the result.
//! - Build browser URLs for search, WhatsApp Web and mail compose.
//!
//! # Invariants
//! - Every failure maps to a fixed fallback string; nothing propagates.
//! - Response parsing lives in pure `parse_*` functions.

use super::system::open_url;
use crate::capability::{Capability, CapabilitySet};
use crate::logging::sanitize_message;
use crate::platform::http::{HttpFetch, OnlineError};
use crate::platform::CommandRunner;
use log::warn;
use reqwest::Url;
use serde_json::Value;

pub const IP_UNAVAILABLE: &str = "Unable to get IP address";
pub const NO_ADVICE: &str = "I don't have any advice for you right now.";
pub const FALLBACK_JOKE: &str =
    "Why don't scientists trust atoms? Because they make up everything!";
pub const FALLBACK_QUOTE: &str =
    "The only way to do great work is to love what you do. - Steve Jobs";

const IPIFY_URL: &str = "https://api.ipify.org";
const OPENWEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
const NEWSAPI_URL: &str = "https://newsapi.org/v2/top-headlines";
const TMDB_POPULAR_URL: &str = "https://api.themoviedb.org/3/movie/popular";
const ADVICE_URL: &str = "https://api.adviceslip.com/advice";
const JOKE_URL: &str = "https://v2.jokeapi.dev/joke/Any";
const QUOTE_URL: &str = "https://api.quotable.io/random";
const WIKIPEDIA_SUMMARY_URL: &str = "https://en.wikipedia.org/api/rest_v1/page/summary/";
const MAX_LISTED_ITEMS: usize = 5;

fn log_failure(handler: &str, err: &OnlineError) {
    warn!(
        "event=online_call module=handlers status=error handler={} error={}",
        handler,
        sanitize_message(&err.to_string(), 200)
    );
}

pub fn lookup_ip(http: &dyn HttpFetch) -> Result<String, OnlineError> {
    let body = http.get_json(IPIFY_URL, &[("format", "json")])?;
    body.get("ip")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| OnlineError::Decode("missing `ip`".to_string()))
}

pub fn ip_address(http: &dyn HttpFetch, capabilities: &CapabilitySet) -> String {
    if let Err(message) = capabilities.require(Capability::Network) {
        return message.to_string();
    }
    match lookup_ip(http) {
        Ok(ip) => format!("Your IP Address is {ip}."),
        Err(err) => {
            log_failure("ip_address", &err);
            IP_UNAVAILABLE.to_string()
        }
    }
}

/// Resolves the caller's city from their public IP.
pub fn lookup_city(http: &dyn HttpFetch) -> Result<String, OnlineError> {
    let ip = lookup_ip(http)?;
    let city = http.get_text(&format!("https://ipapi.co/{ip}/city/"), &[])?;
    let city = city.trim();
    if city.is_empty() || city.eq_ignore_ascii_case("undefined") {
        return Err(OnlineError::Decode("empty city".to_string()));
    }
    Ok(city.to_string())
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub condition: String,
    pub temperature_c: f64,
    pub feels_like_c: f64,
}

pub fn parse_weather(body: &Value) -> Option<WeatherReport> {
    let condition = body
        .pointer("/weather/0/description")
        .and_then(Value::as_str)?
        .to_string();
    Some(WeatherReport {
        condition,
        temperature_c: body.pointer("/main/temp").and_then(Value::as_f64)?,
        feels_like_c: body.pointer("/main/feels_like").and_then(Value::as_f64)?,
    })
}

pub fn weather(
    http: &dyn HttpFetch,
    capabilities: &CapabilitySet,
    api_key: Option<&str>,
    city: &str,
) -> String {
    if let Err(message) = capabilities.require(Capability::Weather) {
        return message.to_string();
    }
    let Some(api_key) = api_key else {
        return Capability::Weather.unavailable_message().to_string();
    };

    let result = http
        .get_json(
            OPENWEATHER_URL,
            &[("q", city), ("appid", api_key), ("units", "metric")],
        )
        .and_then(|body| {
            parse_weather(&body).ok_or_else(|| OnlineError::Decode("weather shape".to_string()))
        });
    match result {
        Ok(report) => format!(
            "The current temperature in {city} is {:.1}°C, but it feels like {:.1}°C\n\
             Also, the weather report talks about {}",
            report.temperature_c, report.feels_like_c, report.condition
        ),
        Err(err) => {
            log_failure("weather", &err);
            format!("Sorry, I couldn't get the weather report for {city}")
        }
    }
}

pub fn parse_headlines(body: &Value) -> Vec<String> {
    body.get("articles")
        .and_then(Value::as_array)
        .map(|articles| {
            articles
                .iter()
                .filter_map(|article| article.get("title").and_then(Value::as_str))
                .take(MAX_LISTED_ITEMS)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

pub fn news(http: &dyn HttpFetch, capabilities: &CapabilitySet, api_key: Option<&str>) -> String {
    if let Err(message) = capabilities.require(Capability::News) {
        return message.to_string();
    }
    let Some(api_key) = api_key else {
        return Capability::News.unavailable_message().to_string();
    };

    let page_size = MAX_LISTED_ITEMS.to_string();
    let query = [
        ("category", "general"),
        ("language", "en"),
        ("pageSize", page_size.as_str()),
        ("apiKey", api_key),
    ];
    match http.get_json(NEWSAPI_URL, &query) {
        Ok(body) => {
            let headlines = parse_headlines(&body);
            if headlines.is_empty() {
                "No news found".to_string()
            } else {
                format!(
                    "I'm reading out the latest news headlines\n{}",
                    headlines.join("\n")
                )
            }
        }
        Err(err) => {
            log_failure("news", &err);
            format!("Error fetching news: {err}")
        }
    }
}

/// Formats TMDB `movie/popular` results as `"Title (Year)"`.
pub fn parse_movies(body: &Value) -> Vec<String> {
    body.get("results")
        .and_then(Value::as_array)
        .map(|results| {
            results
                .iter()
                .filter_map(|movie| {
                    let title = movie.get("title").and_then(Value::as_str)?;
                    let year = movie
                        .get("release_date")
                        .and_then(Value::as_str)
                        .and_then(|date| date.get(..4))
                        .unwrap_or("N/A");
                    Some(format!("{title} ({year})"))
                })
                .take(MAX_LISTED_ITEMS)
                .collect()
        })
        .unwrap_or_default()
}

pub fn trending_movies(
    http: &dyn HttpFetch,
    capabilities: &CapabilitySet,
    api_key: Option<&str>,
) -> String {
    if let Err(message) = capabilities.require(Capability::Movies) {
        return message.to_string();
    }
    let Some(api_key) = api_key else {
        return Capability::Movies.unavailable_message().to_string();
    };

    match http.get_json(TMDB_POPULAR_URL, &[("api_key", api_key)]) {
        Ok(body) => {
            let movies = parse_movies(&body);
            if movies.is_empty() {
                "No trending movies found".to_string()
            } else {
                format!("Some of the trending movies are:\n{}", movies.join("\n"))
            }
        }
        Err(err) => {
            log_failure("movies", &err);
            format!("Error fetching movies: {err}")
        }
    }
}

pub fn advice(http: &dyn HttpFetch, capabilities: &CapabilitySet) -> String {
    if let Err(message) = capabilities.require(Capability::Network) {
        return message.to_string();
    }
    let advice = http.get_json(ADVICE_URL, &[]).and_then(|body| {
        body.pointer("/slip/advice")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| OnlineError::Decode("missing slip.advice".to_string()))
    });
    match advice {
        Ok(advice) => format!("Here's an advice for you\n{advice}"),
        Err(err) => {
            log_failure("advice", &err);
            NO_ADVICE.to_string()
        }
    }
}

/// Reads JokeAPI `single` and `twopart` joke shapes.
pub fn parse_joke(body: &Value) -> Option<String> {
    match body.get("type").and_then(Value::as_str)? {
        "single" => body.get("joke").and_then(Value::as_str).map(str::to_string),
        "twopart" => {
            let setup = body.get("setup").and_then(Value::as_str)?;
            let delivery = body.get("delivery").and_then(Value::as_str)?;
            Some(format!("{setup} ... {delivery}"))
        }
        _ => None,
    }
}

pub fn online_joke(http: &dyn HttpFetch, capabilities: &CapabilitySet) -> String {
    if let Err(message) = capabilities.require(Capability::Network) {
        return message.to_string();
    }
    let joke = http
        .get_json(JOKE_URL, &[("safe-mode", "")])
        .and_then(|body| parse_joke(&body).ok_or_else(|| OnlineError::Decode("joke shape".to_string())));
    match joke {
        Ok(joke) => joke,
        Err(err) => {
            log_failure("joke", &err);
            FALLBACK_JOKE.to_string()
        }
    }
}

pub fn quote(http: &dyn HttpFetch, capabilities: &CapabilitySet) -> String {
    if let Err(message) = capabilities.require(Capability::Network) {
        return message.to_string();
    }
    let quote = http.get_json(QUOTE_URL, &[]).and_then(|body| {
        let content = body.get("content").and_then(Value::as_str);
        let author = body.get("author").and_then(Value::as_str).unwrap_or("Unknown");
        content
            .map(|content| format!("{content} - {author}"))
            .ok_or_else(|| OnlineError::Decode("missing content".to_string()))
    });
    quote.unwrap_or_else(|err| {
        log_failure("quote", &err);
        FALLBACK_QUOTE.to_string()
    })
}

/// Keeps the first `count` sentences of `text`.
pub fn first_sentences(text: &str, count: usize) -> String {
    let mut end = text.len();
    let mut seen = 0;
    let bytes = text.as_bytes();
    for (index, byte) in bytes.iter().enumerate() {
        if matches!(byte, b'.' | b'!' | b'?')
            && bytes.get(index + 1).map_or(true, u8::is_ascii_whitespace)
        {
            seen += 1;
            if seen == count {
                end = index + 1;
                break;
            }
        }
    }
    text[..end].trim().to_string()
}

pub fn wikipedia_summary_url(topic: &str) -> Option<Url> {
    let mut url = Url::parse(WIKIPEDIA_SUMMARY_URL).ok()?;
    url.path_segments_mut()
        .ok()?
        .pop_if_empty()
        .push(&topic.trim().replace(' ', "_"));
    Some(url)
}

pub fn wikipedia(http: &dyn HttpFetch, capabilities: &CapabilitySet, topic: &str) -> String {
    if let Err(message) = capabilities.require(Capability::Network) {
        return message.to_string();
    }
    let Some(url) = wikipedia_summary_url(topic) else {
        return format!("No information found for {topic} on Wikipedia.");
    };

    match http.get_json(url.as_str(), &[]) {
        Ok(body) => {
            if body.get("type").and_then(Value::as_str) == Some("disambiguation") {
                return format!(
                    "There are multiple results for {topic}. Please be more specific."
                );
            }
            match body.get("extract").and_then(Value::as_str) {
                Some(extract) if !extract.trim().is_empty() => {
                    format!("According to Wikipedia, {}", first_sentences(extract, 2))
                }
                _ => format!("No information found for {topic} on Wikipedia."),
            }
        }
        Err(OnlineError::Status(404)) => format!("No information found for {topic} on Wikipedia."),
        Err(err) => {
            log_failure("wikipedia", &err);
            format!("Error searching Wikipedia: {err}")
        }
    }
}

pub fn youtube_search_url(query: &str) -> Option<Url> {
    Url::parse_with_params(
        "https://www.youtube.com/results",
        &[("search_query", query)],
    )
    .ok()
}

pub fn google_search_url(query: &str) -> Option<Url> {
    Url::parse_with_params("https://www.google.com/search", &[("q", query)]).ok()
}

pub fn youtube(
    runner: &dyn CommandRunner,
    capabilities: &CapabilitySet,
    query: &str,
) -> String {
    let Some(url) = youtube_search_url(query) else {
        return format!("Error playing video: invalid query `{query}`");
    };
    match open_url(runner, capabilities, url.as_str()) {
        Ok(()) => format!("Opening YouTube search for: {query}"),
        Err(message) => message,
    }
}

pub fn google_search(
    runner: &dyn CommandRunner,
    capabilities: &CapabilitySet,
    query: &str,
) -> String {
    let Some(url) = google_search_url(query) else {
        return format!("Error searching Google: invalid query `{query}`");
    };
    match open_url(runner, capabilities, url.as_str()) {
        Ok(()) => format!("Searching Google for: {query}"),
        Err(message) => message,
    }
}

/// Strips separators from a spoken phone number; `None` when it is not one.
pub fn normalize_phone_number(value: &str) -> Option<String> {
    let trimmed = value.trim();
    let (prefix, rest) = match trimmed.strip_prefix('+') {
        Some(rest) => ("+", rest),
        None => ("", trimmed),
    };
    let digits = rest
        .chars()
        .filter(|ch| !matches!(ch, ' ' | '-' | '(' | ')' | '.'))
        .collect::<String>();
    if digits.len() < 7 || digits.len() > 15 || !digits.chars().all(|ch| ch.is_ascii_digit()) {
        return None;
    }
    Some(format!("{prefix}{digits}"))
}

pub fn whatsapp_url(number: &str, message: &str) -> Option<Url> {
    Url::parse_with_params(
        "https://web.whatsapp.com/send",
        &[("phone", number), ("text", message)],
    )
    .ok()
}

pub fn whatsapp(
    runner: &dyn CommandRunner,
    capabilities: &CapabilitySet,
    number: &str,
    message: &str,
) -> String {
    let Some(number) = normalize_phone_number(number) else {
        return "That doesn't look like a phone number. Please try again.".to_string();
    };
    let Some(url) = whatsapp_url(&number, message) else {
        return "Something went wrong while preparing the message.".to_string();
    };
    match open_url(runner, capabilities, url.as_str()) {
        Ok(()) => format!("I've opened WhatsApp Web with your message to {number}."),
        Err(message) => message,
    }
}

pub fn is_plausible_email(address: &str) -> bool {
    let Some((local, domain)) = address.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !address.chars().any(char::is_whitespace)
}

/// Builds a `mailto:` compose URL; spaces are encoded as `%20`.
pub fn mailto_url(to: &str, subject: &str, body: &str) -> Option<String> {
    let url = Url::parse_with_params(
        &format!("mailto:{to}"),
        &[("subject", subject), ("body", body)],
    )
    .ok()?;
    // Form encoding writes spaces as `+`; literal pluses are already `%2B`.
    Some(url.as_str().replace('+', "%20"))
}

pub fn compose_email(
    runner: &dyn CommandRunner,
    capabilities: &CapabilitySet,
    to: &str,
    subject: &str,
    body: &str,
) -> String {
    let to = to.trim();
    if !is_plausible_email(to) {
        return "That doesn't look like an email address. Please try again.".to_string();
    }
    let Some(url) = mailto_url(to, subject, body) else {
        return "Something went wrong while preparing the email.".to_string();
    };
    match open_url(runner, capabilities, &url) {
        Ok(()) => format!("I've opened a new email to {to} in your mail app."),
        Err(message) => message,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        first_sentences, mailto_url, normalize_phone_number, parse_joke, parse_movies,
        parse_weather, wikipedia_summary_url,
    };
    use serde_json::json;

    #[test]
    fn parses_openweather_body() {
        let body = json!({
            "weather": [{"description": "light rain"}],
            "main": {"temp": 12.34, "feels_like": 10.0}
        });
        let report = parse_weather(&body).expect("weather should parse");
        assert_eq!(report.condition, "light rain");
        assert!((report.temperature_c - 12.34).abs() < f64::EPSILON);
        assert!(parse_weather(&json!({"main": {}})).is_none());
    }

    #[test]
    fn parses_both_joke_shapes() {
        assert_eq!(
            parse_joke(&json!({"type": "single", "joke": "A joke."})).as_deref(),
            Some("A joke.")
        );
        assert_eq!(
            parse_joke(&json!({"type": "twopart", "setup": "Q?", "delivery": "A!"})).as_deref(),
            Some("Q? ... A!")
        );
        assert_eq!(parse_joke(&json!({"error": true})), None);
    }

    #[test]
    fn formats_movie_years() {
        let body = json!({"results": [
            {"title": "Alpha", "release_date": "2024-05-01"},
            {"title": "Beta", "release_date": ""},
            {"overview": "no title"}
        ]});
        assert_eq!(parse_movies(&body), vec!["Alpha (2024)", "Beta (N/A)"]);
    }

    #[test]
    fn trims_to_leading_sentences() {
        assert_eq!(
            first_sentences("Rust is a language. It is fast. It is safe.", 2),
            "Rust is a language. It is fast."
        );
        assert_eq!(first_sentences("No terminator here", 2), "No terminator here");
        assert_eq!(first_sentences("Version 1.5 shipped. Done.", 1), "Version 1.5 shipped.");
    }

    #[test]
    fn builds_encoded_urls() {
        let url = wikipedia_summary_url("Alan Turing").expect("url");
        assert_eq!(
            url.as_str(),
            "https://en.wikipedia.org/api/rest_v1/page/summary/Alan_Turing"
        );
        assert_eq!(
            mailto_url("ada@example.com", "Hi there", "1+1 is two").as_deref(),
            Some("mailto:ada@example.com?subject=Hi%20there&body=1%2B1%20is%20two")
        );
    }

    #[test]
    fn normalizes_phone_numbers() {
        assert_eq!(
            normalize_phone_number("+1 (555) 123-4567").as_deref(),
            Some("+15551234567")
        );
        assert_eq!(normalize_phone_number("call me"), None);
        assert_eq!(normalize_phone_number("12"), None);
    }
}
