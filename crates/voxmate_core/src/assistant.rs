//! Command dispatcher.
//!
//! # Responsibility
//! - Route one utterance through the matcher to its handler.
//! - Own session state: services, music player, RNG and platform seams.
//!
//! # Invariants
//! - `handle*` never panics or returns an error; a panicking handler yields
//!   [`ERROR_MESSAGE`].
//! - One utterance runs exactly one handler (or the fallback).

use crate::capability::{Capability, CapabilitySet};
use crate::command::{match_command, CommandKind, CommandMatch, FALLBACK_MESSAGE};
use crate::config::AssistantConfig;
use crate::conversation::{inline_or_ask, Conversation};
use crate::handlers::entertainment::{
    parse_volume, play_guessing_game, riddle, rock_paper_scissors, tell_joke,
    AudioBackend, MusicPlayer, NoAudioBackend, RodioAudioBackend,
};
use crate::handlers::system::{DesktopApp, PowerAction, POWER_SUPPLY_ROOT};
use crate::handlers::{chat, language, online, system, tasks};
use crate::logging::sanitize_message;
use crate::model::note::Note;
use crate::model::reminder::Reminder;
use crate::model::todo::TodoItem;
use crate::platform::http::{HttpFetch, OfflineFetcher, ReqwestFetcher};
use crate::platform::{CommandRunner, SystemCommandRunner};
use crate::repo::json_repo::JsonFileRepository;
use crate::service::note_service::NoteService;
use crate::service::reminder_service::ReminderService;
use crate::service::todo_service::TodoService;
use chrono::{Local, NaiveDateTime, Timelike};
use log::{error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use uuid::Uuid;

/// Reply when a handler panics.
pub const ERROR_MESSAGE: &str =
    "Sorry, I encountered an error while processing your request. Please try again.";

const MAX_LOGGED_UTTERANCE_CHARS: usize = 120;

/// Result of one utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    /// Matched handler, `None` for the fallback.
    pub command: Option<CommandKind>,
    pub reply: String,
    /// The shell should end the session.
    pub exit: bool,
}

/// Voice-assistant session.
pub struct Assistant {
    config: AssistantConfig,
    capabilities: CapabilitySet,
    todos: TodoService<JsonFileRepository<TodoItem>>,
    notes: NoteService<JsonFileRepository<Note>>,
    reminders: ReminderService<JsonFileRepository<Reminder>>,
    runner: Box<dyn CommandRunner>,
    http: Box<dyn HttpFetch>,
    music: MusicPlayer,
    rng: StdRng,
    battery_root: PathBuf,
    session_id: Uuid,
}

impl Assistant {
    /// Wires a session from explicit seams.
    pub fn new(
        config: AssistantConfig,
        capabilities: CapabilitySet,
        runner: Box<dyn CommandRunner>,
        http: Box<dyn HttpFetch>,
        audio: Box<dyn AudioBackend>,
    ) -> Self {
        let session_id = Uuid::new_v4();
        info!(
            "event=session_start module=assistant status=ok session_id={} data_dir={} capabilities={}",
            session_id,
            config.data_dir.display(),
            capabilities.summary()
        );
        Self {
            todos: TodoService::new(JsonFileRepository::in_dir(&config.data_dir)),
            notes: NoteService::new(JsonFileRepository::in_dir(&config.data_dir)),
            reminders: ReminderService::new(JsonFileRepository::in_dir(&config.data_dir)),
            music: MusicPlayer::new(config.music_dir.clone(), audio),
            runner,
            http,
            capabilities,
            config,
            rng: StdRng::from_entropy(),
            battery_root: PathBuf::from(POWER_SUPPLY_ROOT),
            session_id,
        }
    }

    /// Wires real OS, HTTP and audio seams and probes capabilities.
    pub fn from_system(config: AssistantConfig) -> Self {
        let runner = SystemCommandRunner::new();
        let mut capabilities = CapabilitySet::probe(&config, &runner);
        let http: Box<dyn HttpFetch> = match ReqwestFetcher::new() {
            Ok(fetcher) => Box::new(fetcher),
            Err(err) => {
                warn!(
                    "event=http_client_init module=assistant status=error error={}",
                    err
                );
                capabilities.remove(Capability::Network);
                Box::new(OfflineFetcher)
            }
        };
        let audio: Box<dyn AudioBackend> = if capabilities.contains(Capability::Audio) {
            match RodioAudioBackend::open_default() {
                Ok(backend) => Box::new(backend),
                Err(err) => {
                    warn!(
                        "event=audio_init module=assistant status=error error={}",
                        err
                    );
                    capabilities.remove(Capability::Audio);
                    Box::new(NoAudioBackend)
                }
            }
        } else {
            Box::new(NoAudioBackend)
        };
        Self::new(
            config,
            capabilities,
            Box::new(runner),
            http,
            audio,
        )
    }

    /// Replaces the RNG with a seeded one.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Reads battery state from another sysfs `power_supply` root.
    pub fn with_battery_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.battery_root = root.into();
        self
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Startup greeting for `hour`.
    pub fn greet(&self, hour: u32) -> String {
        chat::startup_greeting(hour, &self.config.user_name, &self.config.bot_name)
    }

    /// Startup greeting for the current local hour.
    pub fn greet_now(&self) -> String {
        self.greet(Local::now().hour())
    }

    pub fn acknowledgement(&mut self) -> &'static str {
        chat::acknowledgement(&mut self.rng)
    }

    /// Announces reminders due at `now` and marks them notified.
    pub fn due_reminder_announcement(&self, now: NaiveDateTime) -> Option<String> {
        tasks::due_reminder_announcement(&self.reminders, now)
    }

    /// Announces reminders due at the current local time.
    pub fn announce_due_reminders(&self) -> Option<String> {
        self.due_reminder_announcement(Local::now().naive_local())
    }

    /// Handles one utterance at the current local time.
    pub fn handle(&mut self, utterance: &str, conversation: &mut dyn Conversation) -> CommandOutcome {
        self.handle_at(utterance, conversation, Local::now().naive_local())
    }

    /// Handles one utterance at `now`.
    pub fn handle_at(
        &mut self,
        utterance: &str,
        conversation: &mut dyn Conversation,
        now: NaiveDateTime,
    ) -> CommandOutcome {
        let logged = sanitize_message(utterance, MAX_LOGGED_UTTERANCE_CHARS);
        let Some(found) = match_command(utterance) else {
            info!(
                "event=command_match module=assistant status=unmatched session_id={} utterance={}",
                self.session_id, logged
            );
            return CommandOutcome {
                command: None,
                reply: FALLBACK_MESSAGE.to_string(),
                exit: false,
            };
        };

        info!(
            "event=command_match module=assistant status=ok session_id={} command={} phrase={}",
            self.session_id,
            found.kind.as_str(),
            found.phrase
        );

        let kind = found.kind;
        let result = catch_unwind(AssertUnwindSafe(|| self.dispatch(&found, conversation, now)));
        let reply = match result {
            Ok(reply) => reply,
            Err(_) => {
                error!(
                    "event=command_dispatch module=assistant status=panic session_id={} command={}",
                    self.session_id,
                    kind.as_str()
                );
                ERROR_MESSAGE.to_string()
            }
        };

        CommandOutcome {
            command: Some(kind),
            reply,
            exit: kind == CommandKind::Exit,
        }
    }

    fn dispatch(
        &mut self,
        found: &CommandMatch,
        conversation: &mut dyn Conversation,
        now: NaiveDateTime,
    ) -> String {
        let runner = self.runner.as_ref();
        let http = self.http.as_ref();
        let caps = &self.capabilities;
        let config = &self.config;
        let argument = found.argument.as_str();
        let raw = found.raw_argument.as_str();

        match found.kind {
            CommandKind::CancelShutdown => system::cancel_shutdown(runner, caps),
            CommandKind::OpenNotepad => system::open_app(runner, caps, DesktopApp::Notepad),
            CommandKind::OpenDiscord => system::open_app(runner, caps, DesktopApp::Discord),
            CommandKind::OpenCommandPrompt => {
                system::open_app(runner, caps, DesktopApp::CommandPrompt)
            }
            CommandKind::OpenCamera => system::open_app(runner, caps, DesktopApp::Camera),
            CommandKind::OpenCalculator => system::open_app(runner, caps, DesktopApp::Calculator),
            CommandKind::TakeScreenshot => {
                system::take_screenshot(runner, caps, &config.screenshot_dir, now)
            }
            CommandKind::SystemInfo => system::system_info(),
            CommandKind::Battery => system::battery_report(&self.battery_root),
            CommandKind::LockScreen => system::lock_screen(runner, caps),
            CommandKind::Shutdown => {
                system::schedule_power_action(runner, caps, conversation, PowerAction::Shutdown)
            }
            CommandKind::Restart => {
                system::schedule_power_action(runner, caps, conversation, PowerAction::Restart)
            }
            CommandKind::IpAddress => online::ip_address(http, caps),
            CommandKind::Wikipedia => {
                match inline_or_ask(raw, conversation, "What do you want to search on Wikipedia?") {
                    Some(topic) => online::wikipedia(http, caps, &topic),
                    None => "I didn't catch your search query. Please try again.".to_string(),
                }
            }
            CommandKind::YouTube => {
                match inline_or_ask(raw, conversation, "What do you want to play on YouTube?") {
                    Some(video) => online::youtube(runner, caps, &video),
                    None => "I didn't catch what you want to play. Please try again.".to_string(),
                }
            }
            CommandKind::GoogleSearch => {
                match inline_or_ask(raw, conversation, "What do you want to search on Google?") {
                    Some(query) => online::google_search(runner, caps, &query),
                    None => "I didn't catch your search query. Please try again.".to_string(),
                }
            }
            CommandKind::WhatsApp => {
                let Some(number) =
                    inline_or_ask("", conversation, "On what number should I send the message?")
                else {
                    return "I didn't catch the number. Please try again.".to_string();
                };
                match inline_or_ask("", conversation, "What is the message?") {
                    Some(message) => online::whatsapp(runner, caps, &number, &message),
                    None => "I didn't catch your message. Please try again.".to_string(),
                }
            }
            CommandKind::Email => self.email(conversation),
            CommandKind::TellJoke => tell_joke(&mut self.rng),
            CommandKind::Joke => online::online_joke(http, caps),
            CommandKind::Advice => online::advice(http, caps),
            CommandKind::Movies => {
                online::trending_movies(http, caps, config.tmdb_api_key.as_deref())
            }
            CommandKind::News => online::news(http, caps, config.news_api_key.as_deref()),
            CommandKind::Weather => self.weather(argument, raw, conversation),
            CommandKind::AddTask => tasks::add_task(&self.todos, conversation, raw, now),
            CommandKind::CompleteTask => {
                tasks::complete_task(&self.todos, conversation, argument, now)
            }
            CommandKind::RemoveTask => tasks::remove_task(&self.todos, conversation, argument),
            CommandKind::ListTasks => tasks::list_tasks(&self.todos, argument),
            CommandKind::ListReminders => tasks::list_reminders(&self.reminders),
            CommandKind::SetReminder => {
                tasks::set_reminder(&self.reminders, conversation, raw, now)
            }
            CommandKind::TakeNote => tasks::take_note(&self.notes, conversation, raw, now),
            CommandKind::FindNote => tasks::find_note(&self.notes, conversation, raw),
            CommandKind::DeleteNote => tasks::delete_note(&self.notes, conversation, argument),
            CommandKind::ListNotes => tasks::list_notes(&self.notes),
            CommandKind::PlayMusic => self.play_music(raw),
            CommandKind::PauseMusic => self.music_guarded(MusicPlayer::pause),
            CommandKind::ResumeMusic => self.music_guarded(MusicPlayer::resume),
            CommandKind::StopMusic => self.music_guarded(MusicPlayer::stop),
            CommandKind::SetVolume => self.set_volume(raw, conversation),
            CommandKind::Quote => online::quote(http, caps),
            CommandKind::Riddle => riddle(&mut self.rng, conversation),
            CommandKind::RockPaperScissors => {
                match inline_or_ask(
                    argument,
                    conversation,
                    "Let's play rock, paper, scissors. What's your choice?",
                ) {
                    Some(choice) => rock_paper_scissors(&choice, &mut self.rng),
                    None => "I didn't catch your choice. Please try again.".to_string(),
                }
            }
            CommandKind::GuessNumber => play_guessing_game(&mut self.rng, conversation),
            CommandKind::Translate => self.translate(raw, conversation),
            CommandKind::DetectLanguage => {
                match inline_or_ask(
                    raw,
                    conversation,
                    "What text would you like me to identify the language of?",
                ) {
                    Some(text) => language::detect_language(http, caps, &text),
                    None => "I didn't catch the text. Please try again.".to_string(),
                }
            }
            CommandKind::Speak => {
                match inline_or_ask(raw, conversation, "What would you like me to say?") {
                    Some(text) => text,
                    None => "I didn't catch what to say. Please try again.".to_string(),
                }
            }
            CommandKind::SpellCheck => {
                match inline_or_ask(raw, conversation, "What text should I check?") {
                    Some(text) => language::correct_spelling(&text),
                    None => "I didn't catch the text. Please try again.".to_string(),
                }
            }
            CommandKind::CountWords => {
                match inline_or_ask(raw, conversation, "What text should I count?") {
                    Some(text) => language::word_count_report(&text),
                    None => "I didn't catch the text. Please try again.".to_string(),
                }
            }
            CommandKind::Summarize => {
                match inline_or_ask(raw, conversation, "What text should I summarize?") {
                    Some(text) => language::summarize_default(&text),
                    None => "I didn't catch the text. Please try again.".to_string(),
                }
            }
            CommandKind::Time => chat::current_time(now),
            CommandKind::Date => chat::current_date(now),
            CommandKind::Thanks => chat::thanks(),
            CommandKind::About => chat::about(&config.bot_name),
            CommandKind::Greeting => chat::hello(&config.user_name),
            CommandKind::Exit => chat::farewell(now.hour()),
        }
    }

    fn email(&mut self, conversation: &mut dyn Conversation) -> String {
        let Some(to) = inline_or_ask("", conversation, "On what email address do I send?") else {
            return "I didn't catch the address. Please try again.".to_string();
        };
        let subject = inline_or_ask("", conversation, "What should be the subject?").unwrap_or_default();
        let Some(body) = inline_or_ask("", conversation, "What is the message?") else {
            return "I didn't catch your message. Please try again.".to_string();
        };
        online::compose_email(
            self.runner.as_ref(),
            &self.capabilities,
            &to,
            &capitalize_first(&subject),
            &capitalize_first(&body),
        )
    }

    fn weather(&mut self, argument: &str, raw: &str, conversation: &mut dyn Conversation) -> String {
        if let Err(message) = self.capabilities.require(Capability::Weather) {
            return message.to_string();
        }

        let inline_city = city_from_argument(argument, raw);

        let city = match inline_city {
            Some(city) => city,
            None => match online::lookup_city(self.http.as_ref()) {
                Ok(city) => city,
                Err(err) => {
                    warn!("event=weather_city module=assistant status=fallback error={}", err);
                    match inline_or_ask("", conversation, "Which city should I check?") {
                        Some(city) => city,
                        None => return "I didn't catch the city. Please try again.".to_string(),
                    }
                }
            },
        };

        online::weather(
            self.http.as_ref(),
            &self.capabilities,
            self.config.openweather_app_id.as_deref(),
            &city,
        )
    }

    /// Track names keep their punctuation: `my_song.mp3` is matched as typed.
    fn play_music(&mut self, raw: &str) -> String {
        if let Err(message) = self.capabilities.require(Capability::Audio) {
            return message.to_string();
        }
        let name = raw
            .trim_end_matches(|ch: char| matches!(ch, ',' | '!' | '?'))
            .trim()
            .to_lowercase();
        let track = (!name.is_empty()).then_some(name.as_str());
        self.music.play(track, &mut self.rng)
    }

    fn music_guarded(&mut self, action: fn(&mut MusicPlayer) -> String) -> String {
        if let Err(message) = self.capabilities.require(Capability::Audio) {
            return message.to_string();
        }
        action(&mut self.music)
    }

    fn set_volume(&mut self, raw: &str, conversation: &mut dyn Conversation) -> String {
        if let Err(message) = self.capabilities.require(Capability::Audio) {
            return message.to_string();
        }
        let volume = parse_volume(raw).or_else(|| {
            inline_or_ask("", conversation, "What volume? Say a number from 0 to 100.")
                .and_then(|answer| parse_volume(&answer))
        });
        match volume {
            Some(volume) => self.music.set_volume(volume),
            None => "Volume must be between 0 and 1".to_string(),
        }
    }

    fn translate(&mut self, raw: &str, conversation: &mut dyn Conversation) -> String {
        if let Some((text, target)) = language::split_inline_target(raw) {
            return language::translate(self.http.as_ref(), &self.capabilities, &text, &target);
        }
        let Some(text) = inline_or_ask(raw, conversation, "What would you like me to translate?") else {
            return "I didn't catch what to translate. Please try again.".to_string();
        };
        let Some(target) = inline_or_ask(
            "",
            conversation,
            "To what language? For example, say 'spanish', 'french', etc.",
        ) else {
            return "I didn't catch the target language. Please try again.".to_string();
        };
        language::translate(self.http.as_ref(), &self.capabilities, &text, &target)
    }
}

/// `"in london"` / `"for paris"` style arguments name a city.
fn city_from_argument(argument: &str, raw: &str) -> Option<String> {
    let lowered = raw.trim().to_lowercase();
    ["in ", "for "]
        .iter()
        .find(|prefix| lowered.starts_with(**prefix) && !argument.is_empty())
        .map(|prefix| raw.trim()[prefix.len()..].trim().to_string())
        .filter(|city| !city.is_empty())
}

fn capitalize_first(value: &str) -> String {
    let mut chars = value.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
