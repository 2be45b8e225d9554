//! Entertainment handlers: music, jokes, riddles and games.
//!
//! # Invariants
//! - Randomness comes from a caller-supplied RNG so games are reproducible.
//! - The music player owns at most one playback sink at a time.

use crate::command::{first_number, parse_spoken_number};
use crate::conversation::{ask_text, Conversation};
use log::{info, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

const SUPPORTED_AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg"];
const DEFAULT_VOLUME: f32 = 0.5;

pub struct Riddle {
    pub question: &'static str,
    pub answer: &'static str,
}

pub const RIDDLES: &[Riddle] = &[
    Riddle {
        question: "I speak without a mouth and hear without ears. I have no body, but I come alive with wind. What am I?",
        answer: "An echo",
    },
    Riddle {
        question: "What has keys but no locks, space but no room, and you can enter but not go in?",
        answer: "A keyboard",
    },
    Riddle {
        question: "What gets wetter as it dries?",
        answer: "A towel",
    },
    Riddle {
        question: "The more you take, the more you leave behind. What am I?",
        answer: "Footsteps",
    },
    Riddle {
        question: "What has a head, a tail, is brown, and has no legs?",
        answer: "A penny",
    },
    Riddle {
        question: "What comes once in a minute, twice in a moment, but never in a thousand years?",
        answer: "The letter 'M'",
    },
    Riddle {
        question: "I'm light as a feather, yet the strongest person can't hold me for more than a few minutes. What am I?",
        answer: "Breath",
    },
    Riddle {
        question: "What can travel around the world while staying in a corner?",
        answer: "A stamp",
    },
    Riddle {
        question: "What has 13 hearts but no other organs?",
        answer: "A deck of cards",
    },
    Riddle {
        question: "What gets bigger when more is taken away?",
        answer: "A hole",
    },
];

pub const JOKES: &[(&str, &str)] = &[
    ("Why don't scientists trust atoms?", "Because they make up everything!"),
    (
        "Did you hear about the mathematician who's afraid of negative numbers?",
        "He'll stop at nothing to avoid them!",
    ),
    ("Why was the math book sad?", "Because it had too many problems!"),
    (
        "What do you call a parade of rabbits hopping backwards?",
        "A receding hare-line!",
    ),
    (
        "Why don't we tell secrets on a farm?",
        "Because the potatoes have eyes and the corn has ears!",
    ),
    ("What's orange and sounds like a parrot?", "A carrot!"),
    ("How do you organize a space party?", "You planet!"),
    (
        "Why did the scarecrow win an award?",
        "Because he was outstanding in his field!",
    ),
    ("What do you call a fake noodle?", "An impasta!"),
    ("What do you call a belt made of watches?", "A waist of time!"),
];

/// Local joke as `"setup\npunchline"`.
pub fn tell_joke<R: Rng + ?Sized>(rng: &mut R) -> String {
    let (setup, punchline) = JOKES.choose(rng).copied().unwrap_or(JOKES[0]);
    format!("{setup}\n{punchline}")
}

/// Lower-cased words with punctuation and a leading article removed.
fn answer_words(value: &str) -> String {
    let cleaned = value
        .to_lowercase()
        .chars()
        .filter(|ch| ch.is_alphanumeric() || ch.is_whitespace())
        .collect::<String>();
    let words = cleaned.split_whitespace().collect::<Vec<_>>();
    let words = match words.split_first() {
        Some((first, rest)) if ["a", "an", "the"].contains(first) => rest,
        _ => words.as_slice(),
    };
    words.join(" ")
}

fn answer_matches(guess: &str, answer: &str) -> bool {
    let expected = answer_words(answer);
    !expected.is_empty() && answer_words(guess).contains(&expected)
}

/// Asks a riddle, takes one guess, then reveals the answer.
pub fn riddle<R: Rng + ?Sized>(rng: &mut R, conversation: &mut dyn Conversation) -> String {
    let riddle = RIDDLES.choose(rng).unwrap_or(&RIDDLES[0]);
    let guess = ask_text(
        conversation,
        &format!("Here's a riddle for you: {}", riddle.question),
    );

    match guess {
        Some(guess) if answer_matches(&guess, riddle.answer) => {
            format!("Correct! The answer is: {}", riddle.answer)
        }
        _ => format!("The answer is: {}", riddle.answer),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hand {
    Rock,
    Paper,
    Scissors,
}

impl Hand {
    const ALL: [Hand; 3] = [Hand::Rock, Hand::Paper, Hand::Scissors];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "rock" => Some(Self::Rock),
            "paper" => Some(Self::Paper),
            "scissors" | "scissor" => Some(Self::Scissors),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rock => "rock",
            Self::Paper => "paper",
            Self::Scissors => "scissors",
        }
    }

    fn beats(self, other: Hand) -> bool {
        matches!(
            (self, other),
            (Self::Rock, Self::Scissors) | (Self::Paper, Self::Rock) | (Self::Scissors, Self::Paper)
        )
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Scores one round against a computer hand.
pub fn judge_round(player: Hand, computer: Hand) -> String {
    if player == computer {
        format!("It's a tie! Both chose {}.", player.as_str())
    } else if player.beats(computer) {
        format!(
            "You win! {} beats {}.",
            capitalize(player.as_str()),
            computer.as_str()
        )
    } else {
        format!(
            "You lose! {} beats {}.",
            capitalize(computer.as_str()),
            player.as_str()
        )
    }
}

pub fn rock_paper_scissors<R: Rng + ?Sized>(choice: &str, rng: &mut R) -> String {
    let Some(player) = choice.split_whitespace().find_map(Hand::parse) else {
        return "Invalid choice. Please choose rock, paper, or scissors.".to_string();
    };
    let computer = *Hand::ALL.choose(rng).unwrap_or(&Hand::Rock);
    format!("I chose {}. {}", computer.as_str(), judge_round(player, computer))
}

/// Number-guessing game state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuessingGame {
    number: u32,
    attempts: u32,
    max_attempts: u32,
    over: bool,
}

pub const GUESS_MIN: u32 = 1;
pub const GUESS_MAX: u32 = 100;
pub const GUESS_ATTEMPTS: u32 = 10;

impl GuessingGame {
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::with_number(rng.gen_range(GUESS_MIN..=GUESS_MAX))
    }

    pub fn with_number(number: u32) -> Self {
        Self {
            number,
            attempts: 0,
            max_attempts: GUESS_ATTEMPTS,
            over: false,
        }
    }

    pub fn intro() -> String {
        format!("I'm thinking of a number between {GUESS_MIN} and {GUESS_MAX}. Can you guess it?")
    }

    pub fn is_over(&self) -> bool {
        self.over
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    /// Scores one guess. A correct final guess still wins.
    pub fn guess(&mut self, guess: u32) -> String {
        if self.over {
            return format!("The game is over. The number was {}.", self.number);
        }
        self.attempts += 1;

        if guess == self.number {
            self.over = true;
            return format!(
                "Congratulations! You guessed the number {} in {} attempts!",
                self.number, self.attempts
            );
        }
        if self.attempts >= self.max_attempts {
            self.over = true;
            return format!(
                "Sorry, you've used all your attempts. The number was {}.",
                self.number
            );
        }

        let left = self.max_attempts - self.attempts;
        if guess < self.number {
            format!("Too low! You have {left} attempts left.")
        } else {
            format!("Too high! You have {left} attempts left.")
        }
    }
}

/// Plays a full game through the conversation.
pub fn play_guessing_game<R: Rng + ?Sized>(
    rng: &mut R,
    conversation: &mut dyn Conversation,
) -> String {
    let mut game = GuessingGame::new(rng);
    let mut prompt = GuessingGame::intro();
    loop {
        let Some(answer) = ask_text(conversation, &prompt) else {
            return format!("Okay, let's play another time. The number was {}.", game.number());
        };
        let Some(guess) = first_number(&answer).and_then(|n| u32::try_from(n).ok()) else {
            prompt = format!("Please say a number between {GUESS_MIN} and {GUESS_MAX}.");
            continue;
        };

        let message = game.guess(guess);
        if game.is_over() {
            return message;
        }
        prompt = message;
    }
}

/// Audio playback failure.
#[derive(Debug)]
pub enum AudioError {
    /// No usable output device, or the device rejected a new sink.
    Output(String),
    /// Track file could not be opened.
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Track file is not a supported audio format.
    Decode { path: PathBuf, message: String },
}

impl Display for AudioError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Output(message) => write!(f, "audio output unavailable: {message}"),
            Self::Open { path, source } => write!(f, "cannot open `{}`: {source}", path.display()),
            Self::Decode { path, message } => {
                write!(f, "cannot decode `{}`: {message}", path.display())
            }
        }
    }
}

impl Error for AudioError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Playback seam for [`MusicPlayer`].
pub trait AudioBackend {
    /// Starts `path` at `volume` (0.0 to 1.0), replacing current playback.
    fn play(&mut self, path: &Path, volume: f32) -> Result<(), AudioError>;
    fn pause(&mut self) -> Result<(), AudioError>;
    fn resume(&mut self) -> Result<(), AudioError>;
    fn stop(&mut self) -> Result<(), AudioError>;
    /// Changes the volume of the current playback, if any.
    fn set_volume(&mut self, volume: f32) -> Result<(), AudioError>;
}

/// [`AudioBackend`] decoding in-process onto the default output device.
pub struct RodioAudioBackend {
    // Dropping the stream silences every sink created from its handle.
    _stream: OutputStream,
    handle: OutputStreamHandle,
    sink: Option<Sink>,
}

impl RodioAudioBackend {
    /// Opens the default output device.
    pub fn open_default() -> Result<Self, AudioError> {
        let (stream, handle) =
            OutputStream::try_default().map_err(|err| AudioError::Output(err.to_string()))?;
        Ok(Self {
            _stream: stream,
            handle,
            sink: None,
        })
    }
}

impl AudioBackend for RodioAudioBackend {
    fn play(&mut self, path: &Path, volume: f32) -> Result<(), AudioError> {
        self.stop()?;
        let file = File::open(path).map_err(|source| AudioError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let source = Decoder::new(BufReader::new(file)).map_err(|err| AudioError::Decode {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        let sink = Sink::try_new(&self.handle).map_err(|err| AudioError::Output(err.to_string()))?;
        sink.set_volume(volume);
        sink.append(source);
        self.sink = Some(sink);
        Ok(())
    }

    fn pause(&mut self) -> Result<(), AudioError> {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
        Ok(())
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        if let Some(sink) = &self.sink {
            sink.play();
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) -> Result<(), AudioError> {
        if let Some(sink) = &self.sink {
            sink.set_volume(volume);
        }
        Ok(())
    }
}

/// Stand-in when no output device opened; the audio capability is off.
#[derive(Debug, Default)]
pub struct NoAudioBackend;

impl NoAudioBackend {
    fn unavailable() -> AudioError {
        AudioError::Output("no output device".to_string())
    }
}

impl AudioBackend for NoAudioBackend {
    fn play(&mut self, _path: &Path, _volume: f32) -> Result<(), AudioError> {
        Err(Self::unavailable())
    }

    fn pause(&mut self) -> Result<(), AudioError> {
        Err(Self::unavailable())
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        Err(Self::unavailable())
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        Ok(())
    }

    fn set_volume(&mut self, _volume: f32) -> Result<(), AudioError> {
        Err(Self::unavailable())
    }
}

/// Whether the default output device opens on this machine.
pub fn audio_output_available() -> bool {
    match RodioAudioBackend::open_default() {
        Ok(_) => true,
        Err(err) => {
            warn!("event=audio_probe module=handlers status=unavailable error={}", err);
            false
        }
    }
}

/// Music folder player.
pub struct MusicPlayer {
    folder: PathBuf,
    backend: Box<dyn AudioBackend>,
    current_track: Option<String>,
    playing: bool,
    volume: f32,
}

impl MusicPlayer {
    pub fn new(folder: impl Into<PathBuf>, backend: Box<dyn AudioBackend>) -> Self {
        Self {
            folder: folder.into(),
            backend,
            current_track: None,
            playing: false,
            volume: DEFAULT_VOLUME,
        }
    }

    /// Supported audio files in the folder, sorted by name.
    pub fn tracks(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.folder) else {
            return Vec::new();
        };
        let mut tracks = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| {
                Path::new(name)
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| {
                        SUPPORTED_AUDIO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
                    })
                    .unwrap_or(false)
            })
            .collect::<Vec<_>>();
        tracks.sort();
        tracks
    }

    /// Plays a named track (exact, then case-insensitive substring) or a
    /// random one.
    pub fn play<R: Rng + ?Sized>(&mut self, track_name: Option<&str>, rng: &mut R) -> String {
        let tracks = self.tracks();
        if tracks.is_empty() {
            return "No music files found in the music folder".to_string();
        }

        let selected = match track_name.map(str::trim).filter(|name| !name.is_empty()) {
            Some(name) => {
                let lowered = name.to_lowercase();
                let found = tracks
                    .iter()
                    .find(|track| track.as_str() == name)
                    .or_else(|| {
                        tracks
                            .iter()
                            .find(|track| track.to_lowercase().contains(&lowered))
                    });
                match found {
                    Some(track) => track.clone(),
                    None => return format!("No track found matching '{name}'"),
                }
            }
            None => match tracks.choose(rng) {
                Some(track) => track.clone(),
                None => return "No music files found in the music folder".to_string(),
            },
        };

        match self.backend.play(&self.folder.join(&selected), self.volume) {
            Ok(()) => {
                info!("event=music_play module=handlers status=ok track={}", selected);
                let message = format!("Now playing: {selected}");
                self.current_track = Some(selected);
                self.playing = true;
                message
            }
            Err(err) => {
                warn!("event=music_play module=handlers status=error error={}", err);
                format!("Error playing music: {err}")
            }
        }
    }

    pub fn pause(&mut self) -> String {
        if !self.playing {
            return "No music is currently playing".to_string();
        }
        match self.backend.pause() {
            Ok(()) => {
                self.playing = false;
                "Music paused".to_string()
            }
            Err(err) => format!("Error pausing music: {err}"),
        }
    }

    pub fn resume(&mut self) -> String {
        if self.current_track.is_none() || self.playing {
            return "No paused music to resume".to_string();
        }
        match self.backend.resume() {
            Ok(()) => {
                self.playing = true;
                "Music resumed".to_string()
            }
            Err(err) => format!("Error resuming music: {err}"),
        }
    }

    pub fn stop(&mut self) -> String {
        if self.current_track.is_none() {
            return "No music is currently playing".to_string();
        }
        if let Err(err) = self.backend.stop() {
            warn!("event=music_stop module=handlers status=error error={}", err);
        }
        self.playing = false;
        self.current_track = None;
        "Music stopped".to_string()
    }

    /// Sets the volume of the current and later tracks. Accepts `0.0..=1.0`.
    pub fn set_volume(&mut self, volume: f32) -> String {
        if !(0.0..=1.0).contains(&volume) {
            return "Volume must be between 0 and 1".to_string();
        }
        if self.current_track.is_some() {
            if let Err(err) = self.backend.set_volume(volume) {
                warn!("event=music_volume module=handlers status=error error={}", err);
                return format!("Error setting volume: {err}");
            }
        }
        self.volume = volume;
        format!("Volume set to {}%", (volume * 100.0).round() as u32)
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn current_track(&self) -> Option<&str> {
        self.current_track.as_deref()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }
}

/// Reads a spoken volume: `0.5`, `50`, `50 percent`, or a number word.
/// Values above 1 are percentages.
pub fn parse_volume(value: &str) -> Option<f32> {
    let number = value.split_whitespace().find_map(|word| {
        let word = word.trim_end_matches(|ch: char| matches!(ch, '.' | ',' | '!' | '?' | '%'));
        word.parse::<f32>()
            .ok()
            .or_else(|| parse_spoken_number(word).map(|number| number as f32))
    })?;
    Some(if number > 1.0 { number / 100.0 } else { number })
}

#[cfg(test)]
mod tests {
    use super::{
        answer_matches, judge_round, parse_volume, rock_paper_scissors, GuessingGame, Hand,
    };
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn judges_every_outcome() {
        assert_eq!(judge_round(Hand::Rock, Hand::Rock), "It's a tie! Both chose rock.");
        assert_eq!(
            judge_round(Hand::Paper, Hand::Rock),
            "You win! Paper beats rock."
        );
        assert_eq!(
            judge_round(Hand::Paper, Hand::Scissors),
            "You lose! Scissors beats paper."
        );
    }

    #[test]
    fn rejects_unknown_hand() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            rock_paper_scissors("lizard", &mut rng),
            "Invalid choice. Please choose rock, paper, or scissors."
        );
        assert!(rock_paper_scissors("I pick rock", &mut rng).starts_with("I chose "));
    }

    #[test]
    fn guessing_game_hints_and_finishes() {
        let mut game = GuessingGame::with_number(42);
        assert_eq!(game.guess(10), "Too low! You have 9 attempts left.");
        assert_eq!(game.guess(90), "Too high! You have 8 attempts left.");
        assert_eq!(
            game.guess(42),
            "Congratulations! You guessed the number 42 in 3 attempts!"
        );
        assert!(game.is_over());
    }

    #[test]
    fn correct_tenth_guess_wins() {
        let mut game = GuessingGame::with_number(7);
        for _ in 0..9 {
            game.guess(1);
        }
        assert_eq!(
            game.guess(7),
            "Congratulations! You guessed the number 7 in 10 attempts!"
        );
    }

    #[test]
    fn tenth_wrong_guess_ends_game() {
        let mut game = GuessingGame::with_number(7);
        for _ in 0..9 {
            game.guess(1);
        }
        assert_eq!(
            game.guess(2),
            "Sorry, you've used all your attempts. The number was 7."
        );
        assert!(game.is_over());
    }

    #[test]
    fn parses_spoken_volume() {
        assert_eq!(parse_volume("to 50 percent"), Some(0.5));
        assert_eq!(parse_volume("0.25"), Some(0.25));
        assert_eq!(parse_volume("to ten"), Some(0.1));
        assert_eq!(parse_volume("loud"), None);
    }

    #[test]
    fn volume_ignores_trailing_punctuation() {
        assert_eq!(parse_volume("to 0.5."), Some(0.5));
        assert_eq!(parse_volume("to 30%!"), Some(0.3));
    }

    #[test]
    fn riddle_answers_ignore_quotes_and_articles() {
        assert!(answer_matches("the letter m", "The letter 'M'"));
        assert!(answer_matches("It's the letter M!", "The letter 'M'"));
        assert!(answer_matches("an echo", "An echo"));
        assert!(answer_matches("a deck of cards?", "A deck of cards"));
        assert!(!answer_matches("the letter n", "The letter 'M'"));
        assert!(!answer_matches("", "A towel"));
    }
}
