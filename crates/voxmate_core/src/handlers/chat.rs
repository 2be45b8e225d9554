//! Conversational replies: greetings, time, date, help and farewell.

use chrono::NaiveDateTime;
use rand::seq::SliceRandom;
use rand::Rng;

const OPENING_TEXTS: &[&str] = &[
    "I'm on it.",
    "Working on it right away.",
    "Let me do that for you.",
    "Just a second.",
    "Consider it done.",
    "I'm processing your request.",
    "Right away.",
    "I'll take care of that.",
    "As you wish.",
];

/// Time-of-day greeting used at startup.
pub fn time_greeting(hour: u32, user_name: &str) -> String {
    match hour {
        6..=11 => format!("Good Morning {user_name}"),
        12..=15 => format!("Good afternoon {user_name}"),
        16..=18 => format!("Good Evening {user_name}"),
        _ => format!("Hello {user_name}"),
    }
}

pub fn startup_greeting(hour: u32, user_name: &str, bot_name: &str) -> String {
    format!(
        "{}\nI am {bot_name}. How may I assist you today?",
        time_greeting(hour, user_name)
    )
}

pub fn hello(user_name: &str) -> String {
    format!("Hello {user_name}, how can I help you?")
}

pub fn thanks() -> String {
    "You're welcome! Is there anything else I can help you with?".to_string()
}

pub fn about(bot_name: &str) -> String {
    [
        format!("I am {bot_name}, your personal voice assistant. I can help you with various tasks like:"),
        "Opening applications, searching the web, playing music, setting reminders, taking notes".to_string(),
        "Getting information like weather, news, movies, and more".to_string(),
        "I can also translate text, play games, tell jokes, and perform system operations".to_string(),
        "Just ask me what you need!".to_string(),
    ]
    .join("\n")
}

pub fn current_time(now: NaiveDateTime) -> String {
    format!("The current time is {}", now.format("%I:%M %p"))
}

pub fn current_date(now: NaiveDateTime) -> String {
    format!("Today is {}", now.format("%B %d, %Y"))
}

/// Farewell; late-night hours get a good night.
pub fn farewell(hour: u32) -> String {
    if hour >= 21 || hour < 6 {
        "Good night, take care!".to_string()
    } else {
        "Have a good day!".to_string()
    }
}

/// Short acknowledgement spoken before running a command.
pub fn acknowledgement<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    OPENING_TEXTS.choose(rng).copied().unwrap_or("Just a second.")
}

#[cfg(test)]
mod tests {
    use super::{current_date, current_time, farewell, time_greeting};
    use chrono::NaiveDate;

    #[test]
    fn greeting_follows_hour_bands() {
        assert_eq!(time_greeting(6, "Ada"), "Good Morning Ada");
        assert_eq!(time_greeting(12, "Ada"), "Good afternoon Ada");
        assert_eq!(time_greeting(18, "Ada"), "Good Evening Ada");
        assert_eq!(time_greeting(19, "Ada"), "Hello Ada");
        assert_eq!(time_greeting(3, "Ada"), "Hello Ada");
    }

    #[test]
    fn farewell_says_good_night_late() {
        assert_eq!(farewell(22), "Good night, take care!");
        assert_eq!(farewell(5), "Good night, take care!");
        assert_eq!(farewell(14), "Have a good day!");
    }

    #[test]
    fn formats_time_and_date() {
        let now = NaiveDate::from_ymd_opt(2025, 4, 2)
            .and_then(|date| date.and_hms_opt(15, 5, 0))
            .expect("valid timestamp");
        assert_eq!(current_time(now), "The current time is 03:05 PM");
        assert_eq!(current_date(now), "Today is April 02, 2025");
    }
}
