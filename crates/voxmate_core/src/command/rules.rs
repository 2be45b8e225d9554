//! Static trigger table.
//!
//! Order matters: specific phrases ("tell me a joke", "stop music",
//! "cancel shutdown") sit before the generic ones they contain, and short
//! conversational words ("hi", "stop") sit at the end.

/// Every handler reachable from the matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    CancelShutdown,
    OpenNotepad,
    OpenDiscord,
    OpenCommandPrompt,
    OpenCamera,
    OpenCalculator,
    TakeScreenshot,
    SystemInfo,
    Battery,
    LockScreen,
    Shutdown,
    Restart,
    IpAddress,
    Wikipedia,
    YouTube,
    WhatsApp,
    Email,
    GoogleSearch,
    TellJoke,
    Joke,
    Advice,
    Movies,
    News,
    Weather,
    AddTask,
    CompleteTask,
    RemoveTask,
    ListTasks,
    ListReminders,
    SetReminder,
    TakeNote,
    FindNote,
    DeleteNote,
    ListNotes,
    PlayMusic,
    PauseMusic,
    ResumeMusic,
    StopMusic,
    SetVolume,
    Quote,
    Riddle,
    RockPaperScissors,
    GuessNumber,
    Translate,
    DetectLanguage,
    Speak,
    SpellCheck,
    CountWords,
    Summarize,
    Time,
    Date,
    Thanks,
    About,
    Greeting,
    Exit,
}

impl CommandKind {
    /// Stable snake_case id used in log events.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CancelShutdown => "cancel_shutdown",
            Self::OpenNotepad => "open_notepad",
            Self::OpenDiscord => "open_discord",
            Self::OpenCommandPrompt => "open_command_prompt",
            Self::OpenCamera => "open_camera",
            Self::OpenCalculator => "open_calculator",
            Self::TakeScreenshot => "take_screenshot",
            Self::SystemInfo => "system_info",
            Self::Battery => "battery",
            Self::LockScreen => "lock_screen",
            Self::Shutdown => "shutdown",
            Self::Restart => "restart",
            Self::IpAddress => "ip_address",
            Self::Wikipedia => "wikipedia",
            Self::YouTube => "youtube",
            Self::WhatsApp => "whatsapp",
            Self::Email => "email",
            Self::GoogleSearch => "google_search",
            Self::TellJoke => "tell_joke",
            Self::Joke => "joke",
            Self::Advice => "advice",
            Self::Movies => "movies",
            Self::News => "news",
            Self::Weather => "weather",
            Self::AddTask => "add_task",
            Self::CompleteTask => "complete_task",
            Self::RemoveTask => "remove_task",
            Self::ListTasks => "list_tasks",
            Self::ListReminders => "list_reminders",
            Self::SetReminder => "set_reminder",
            Self::TakeNote => "take_note",
            Self::FindNote => "find_note",
            Self::DeleteNote => "delete_note",
            Self::ListNotes => "list_notes",
            Self::PlayMusic => "play_music",
            Self::PauseMusic => "pause_music",
            Self::ResumeMusic => "resume_music",
            Self::StopMusic => "stop_music",
            Self::SetVolume => "set_volume",
            Self::Quote => "quote",
            Self::Riddle => "riddle",
            Self::RockPaperScissors => "rock_paper_scissors",
            Self::GuessNumber => "guess_number",
            Self::Translate => "translate",
            Self::DetectLanguage => "detect_language",
            Self::Speak => "speak",
            Self::SpellCheck => "spell_check",
            Self::CountWords => "count_words",
            Self::Summarize => "summarize",
            Self::Time => "time",
            Self::Date => "date",
            Self::Thanks => "thanks",
            Self::About => "about",
            Self::Greeting => "greeting",
            Self::Exit => "exit",
        }
    }
}

/// One row of the trigger table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerRule {
    pub kind: CommandKind,
    /// Any one of these phrases triggers the rule.
    pub phrases: &'static [&'static str],
    /// When non-empty, one of these words must also be present.
    pub qualifiers: &'static [&'static str],
}

const fn rule(kind: CommandKind, phrases: &'static [&'static str]) -> TriggerRule {
    TriggerRule {
        kind,
        phrases,
        qualifiers: &[],
    }
}

const fn qualified(
    kind: CommandKind,
    phrases: &'static [&'static str],
    qualifiers: &'static [&'static str],
) -> TriggerRule {
    TriggerRule {
        kind,
        phrases,
        qualifiers,
    }
}

const MACHINE: &[&str] = &["computer", "system", "pc"];

static TRIGGER_RULES: &[TriggerRule] = &[
    rule(
        CommandKind::CancelShutdown,
        &["cancel shutdown", "cancel restart", "abort shutdown"],
    ),
    rule(CommandKind::OpenNotepad, &["open notepad", "open text editor"]),
    rule(CommandKind::OpenDiscord, &["open discord"]),
    rule(
        CommandKind::OpenCommandPrompt,
        &["open command prompt", "open cmd", "open terminal"],
    ),
    rule(CommandKind::OpenCamera, &["open camera"]),
    rule(CommandKind::OpenCalculator, &["open calculator"]),
    rule(
        CommandKind::TakeScreenshot,
        &["take screenshot", "take a screenshot", "screenshot"],
    ),
    rule(
        CommandKind::SystemInfo,
        &["system info", "system information", "system status"],
    ),
    rule(CommandKind::Battery, &["battery"]),
    qualified(
        CommandKind::LockScreen,
        &["lock"],
        &["computer", "screen", "system", "pc"],
    ),
    qualified(
        CommandKind::Shutdown,
        &["shutdown", "shut down", "turn off"],
        MACHINE,
    ),
    qualified(CommandKind::Restart, &["restart", "reboot"], MACHINE),
    rule(CommandKind::IpAddress, &["ip address", "my ip"]),
    rule(CommandKind::Wikipedia, &["wikipedia"]),
    rule(CommandKind::YouTube, &["youtube"]),
    rule(CommandKind::WhatsApp, &["send whatsapp message", "whatsapp"]),
    rule(CommandKind::Email, &["send an email", "send email", "email"]),
    rule(
        CommandKind::GoogleSearch,
        &["search on google", "search google", "google"],
    ),
    rule(CommandKind::TellJoke, &["tell me a joke"]),
    rule(CommandKind::Joke, &["joke"]),
    rule(CommandKind::Advice, &["advice"]),
    rule(CommandKind::Movies, &["trending movies", "movies", "movie"]),
    rule(CommandKind::News, &["news", "headlines"]),
    rule(CommandKind::Weather, &["weather", "forecast"]),
    rule(
        CommandKind::AddTask,
        &["add task", "add a task", "add to do", "new task"],
    ),
    rule(
        CommandKind::CompleteTask,
        &[
            "complete task",
            "mark task as done",
            "finish task",
            "toggle task",
        ],
    ),
    rule(CommandKind::RemoveTask, &["remove task", "delete task"]),
    rule(
        CommandKind::ListTasks,
        &[
            "list tasks",
            "show tasks",
            "show to do list",
            "to do list",
            "my tasks",
        ],
    ),
    rule(
        CommandKind::ListReminders,
        &["list reminders", "show reminders", "my reminders"],
    ),
    rule(
        CommandKind::SetReminder,
        &["set reminder", "set a reminder", "remind me"],
    ),
    rule(
        CommandKind::TakeNote,
        &["take note", "take a note", "make note", "make a note"],
    ),
    rule(
        CommandKind::FindNote,
        &["find note", "find notes", "search notes"],
    ),
    rule(CommandKind::DeleteNote, &["delete note", "remove note"]),
    rule(
        CommandKind::ListNotes,
        &["list notes", "show notes", "my notes"],
    ),
    rule(CommandKind::PlayMusic, &["play music", "play song"]),
    rule(CommandKind::PauseMusic, &["pause music", "pause song"]),
    rule(CommandKind::ResumeMusic, &["resume music", "resume song"]),
    rule(CommandKind::StopMusic, &["stop music", "stop song"]),
    rule(CommandKind::SetVolume, &["set volume", "volume"]),
    rule(CommandKind::Quote, &["quote", "inspiration"]),
    rule(CommandKind::Riddle, &["riddle"]),
    rule(CommandKind::RockPaperScissors, &["rock paper scissors"]),
    rule(
        CommandKind::GuessNumber,
        &["guess the number", "number game", "guessing game"],
    ),
    rule(CommandKind::Translate, &["translate"]),
    rule(
        CommandKind::DetectLanguage,
        &["what language is", "detect language"],
    ),
    rule(CommandKind::Speak, &["speak this", "say this"]),
    rule(
        CommandKind::SpellCheck,
        &["correct spelling", "spell check", "check spelling"],
    ),
    rule(CommandKind::CountWords, &["count words", "word count"]),
    rule(CommandKind::Summarize, &["summarize", "summarise"]),
    rule(CommandKind::Time, &["time"]),
    rule(CommandKind::Date, &["date"]),
    rule(CommandKind::Thanks, &["thank you", "thanks"]),
    rule(
        CommandKind::About,
        &["who are you", "what can you do", "help"],
    ),
    rule(CommandKind::Greeting, &["hello", "hi", "hey"]),
    rule(CommandKind::Exit, &["exit", "quit", "goodbye", "bye", "stop"]),
];

/// The trigger table in match order.
pub fn trigger_rules() -> &'static [TriggerRule] {
    TRIGGER_RULES
}
