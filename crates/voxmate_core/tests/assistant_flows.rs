mod support;

use chrono::NaiveDateTime;
use serde_json::json;
use std::fs;
use support::{harness, harness_with, CannedHttp, PanickingRunner, SilentAudio};
use voxmate_core::{
    Assistant, AssistantConfig, Capability, CapabilitySet, CommandKind, ScriptedConversation,
    ERROR_MESSAGE, FALLBACK_MESSAGE,
};

fn at(value: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M").unwrap()
}

#[test]
fn task_commands_round_trip_through_storage() {
    let mut h = harness(CapabilitySet::all(), CannedHttp::default());
    let now = at("2025-03-01 09:00");
    let mut silent = ScriptedConversation::silent();

    let added = h
        .assistant
        .handle_at("Add task buy milk with high priority", &mut silent, now);
    assert_eq!(added.command, Some(CommandKind::AddTask));
    assert_eq!(added.reply, "Added task: buy milk");

    let listed = h.assistant.handle_at("show tasks", &mut silent, now);
    assert_eq!(
        listed.reply,
        "Here are your tasks:\n1. [□] buy milk (Priority: high)"
    );

    let done = h.assistant.handle_at("complete task one", &mut silent, now);
    assert_eq!(done.reply, "Marked task 1 as completed");
    let missing = h.assistant.handle_at("complete task 9", &mut silent, now);
    assert_eq!(missing.reply, "Task 9 not found");

    let active = h.assistant.handle_at("list tasks", &mut silent, now);
    assert_eq!(active.reply, "Here are your tasks:\nNo active tasks found");
    let all = h.assistant.handle_at("list tasks including completed", &mut silent, now);
    assert!(all.reply.contains("1. [✓] buy milk"));
    assert!(silent.prompts().is_empty());
}

#[test]
fn add_task_asks_follow_up_questions() {
    let mut h = harness(CapabilitySet::all(), CannedHttp::default());
    let mut conversation = ScriptedConversation::new(["water the plants", "low"]);

    let outcome = h
        .assistant
        .handle_at("add a task", &mut conversation, at("2025-03-01 09:00"));
    assert_eq!(outcome.reply, "Added task: water the plants");
    assert_eq!(conversation.prompts().len(), 2);

    let mut silent = ScriptedConversation::silent();
    let listed = h
        .assistant
        .handle_at("my tasks", &mut silent, at("2025-03-01 09:01"));
    assert!(listed.reply.contains("(Priority: low)"));
}

#[test]
fn unmatched_utterance_gets_fallback() {
    let mut h = harness(CapabilitySet::all(), CannedHttp::default());
    let outcome = h.assistant.handle_at(
        "purple monkey dishwasher",
        &mut ScriptedConversation::silent(),
        at("2025-03-01 09:00"),
    );
    assert_eq!(outcome.command, None);
    assert_eq!(outcome.reply, FALLBACK_MESSAGE);
    assert!(!outcome.exit);
}

#[test]
fn missing_capabilities_answer_with_fixed_messages() {
    let mut h = harness(CapabilitySet::none(), CannedHttp::default());
    let now = at("2025-03-01 09:00");
    let cases = [
        ("what's the weather", Capability::Weather),
        ("play music", Capability::Audio),
        ("take a screenshot", Capability::Screenshot),
        ("what is my ip address", Capability::Network),
        ("open calculator", Capability::AppLauncher),
        ("lock the screen", Capability::SystemControl),
        ("trending movies", Capability::Movies),
        ("latest news", Capability::News),
    ];
    for (utterance, capability) in cases {
        let outcome = h
            .assistant
            .handle_at(utterance, &mut ScriptedConversation::silent(), now);
        assert_eq!(
            outcome.reply,
            capability.unavailable_message(),
            "utterance `{utterance}`"
        );
    }
    assert!(h.runner.calls.borrow().is_empty());
}

#[test]
fn offline_features_keep_working_without_capabilities() {
    let mut h = harness(CapabilitySet::none(), CannedHttp::default());
    let now = at("2025-03-01 21:30");
    let mut silent = ScriptedConversation::silent();

    assert_eq!(
        h.assistant.handle_at("what time is it", &mut silent, now).reply,
        "The current time is 09:30 PM"
    );
    assert_eq!(
        h.assistant.handle_at("what's the date", &mut silent, now).reply,
        "Today is March 01, 2025"
    );
    assert_eq!(
        h.assistant
            .handle_at("count words in this sentence please", &mut silent, now)
            .command,
        Some(CommandKind::CountWords)
    );
    assert!(h
        .assistant
        .handle_at("tell me a joke", &mut silent, now)
        .reply
        .contains('\n'));
}

#[test]
fn exit_ends_the_session_with_a_time_aware_farewell() {
    let mut h = harness(CapabilitySet::none(), CannedHttp::default());
    let mut silent = ScriptedConversation::silent();

    let night = h
        .assistant
        .handle_at("goodbye", &mut silent, at("2025-03-01 22:00"));
    assert!(night.exit);
    assert_eq!(night.reply, "Good night, take care!");

    let day = h.assistant.handle_at("bye", &mut silent, at("2025-03-01 10:00"));
    assert_eq!(day.reply, "Have a good day!");
}

#[test]
fn shutdown_requires_confirmation() {
    let mut h = harness(CapabilitySet::all(), CannedHttp::default());
    let now = at("2025-03-01 09:00");

    let mut declined = ScriptedConversation::new(["no"]);
    let outcome = h
        .assistant
        .handle_at("shut down the computer", &mut declined, now);
    assert_eq!(outcome.reply, "Shutdown canceled");
    assert!(h.runner.calls.borrow().is_empty());

    let mut confirmed = ScriptedConversation::new(["yes"]);
    let outcome = h
        .assistant
        .handle_at("shut down the computer", &mut confirmed, now);
    assert_eq!(outcome.reply, "Shutting down your computer in 1 minute");
    let calls = h.runner.calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].program, "shutdown");
    assert_eq!(calls[0].args, vec!["-h".to_string(), "+1".to_string()]);
}

#[test]
fn web_searches_open_the_browser() {
    let mut h = harness(CapabilitySet::all(), CannedHttp::default());
    let outcome = h.assistant.handle_at(
        "search on google rust borrow checker",
        &mut ScriptedConversation::silent(),
        at("2025-03-01 09:00"),
    );
    assert_eq!(outcome.reply, "Searching Google for: rust borrow checker");
    assert_eq!(h.runner.programs(), vec!["xdg-open".to_string()]);
    assert!(h.runner.calls.borrow()[0].args[0].starts_with("https://www.google.com/search?q="));
}

#[test]
fn online_lookups_use_the_http_seam() {
    let http = CannedHttp::default()
        .with_json("https://api.ipify.org", json!({ "ip": "203.0.113.7" }))
        .with_json(
            "https://api.openweathermap.org",
            json!({
                "weather": [{ "description": "light rain" }],
                "main": { "temp": 11.0, "feels_like": 9.5 }
            }),
        )
        .with_json(
            "https://translate.googleapis.com",
            json!([[["Hola", "Hello", null]], null, "en"]),
        );
    let mut h = harness_with(CapabilitySet::all(), http, |config| {
        config.openweather_app_id = Some("test-key".to_string());
    });
    let now = at("2025-03-01 09:00");
    let mut silent = ScriptedConversation::silent();

    assert_eq!(
        h.assistant.handle_at("what is my ip address", &mut silent, now).reply,
        "Your IP Address is 203.0.113.7."
    );
    assert_eq!(
        h.assistant
            .handle_at("what's the weather in Paris", &mut silent, now)
            .reply,
        "The current temperature in Paris is 11.0°C, but it feels like 9.5°C\n\
         Also, the weather report talks about light rain"
    );
    assert_eq!(
        h.assistant.handle_at("translate Hello to Spanish", &mut silent, now).reply,
        "The text in English translates to Spanish as: Hola"
    );
    assert_eq!(
        h.assistant.handle_at("give me some advice", &mut silent, now).reply,
        "I don't have any advice for you right now."
    );
}

#[test]
fn reminders_are_announced_once() {
    let mut h = harness(CapabilitySet::none(), CannedHttp::default());
    let now = at("2025-03-01 09:00");
    let mut silent = ScriptedConversation::silent();

    let set = h
        .assistant
        .handle_at("remind me to call mom in 10 minutes", &mut silent, now);
    assert_eq!(set.reply, "Reminder set for 2025-03-01 09:10: call mom");

    assert_eq!(h.assistant.due_reminder_announcement(at("2025-03-01 09:05")), None);
    assert_eq!(
        h.assistant
            .due_reminder_announcement(at("2025-03-01 09:11"))
            .as_deref(),
        Some("You have 1 reminder due.\nReminder: call mom")
    );
    assert_eq!(h.assistant.due_reminder_announcement(at("2025-03-01 09:12")), None);

    let listed = h.assistant.handle_at("list reminders", &mut silent, now);
    assert_eq!(listed.reply, "You have no upcoming reminders");
}

#[test]
fn reminder_with_bad_time_is_refused() {
    let mut h = harness(CapabilitySet::none(), CannedHttp::default());
    let mut conversation = ScriptedConversation::new(["call the bank", "whenever"]);
    let outcome = h
        .assistant
        .handle_at("set a reminder", &mut conversation, at("2025-03-01 09:00"));
    assert_eq!(
        outcome.reply,
        voxmate_core::service::reminder_service::INVALID_TIME_MESSAGE
    );
}

#[test]
fn notes_can_be_taken_found_and_deleted() {
    let mut h = harness(CapabilitySet::none(), CannedHttp::default());
    let now = at("2025-03-01 09:00");
    let mut silent = ScriptedConversation::silent();

    let taken = h
        .assistant
        .handle_at("take a note buy a new charger cable tomorrow", &mut silent, now);
    assert_eq!(taken.reply, "Added note: buy a new charger cable");

    let found = h.assistant.handle_at("find note Charger", &mut silent, now);
    assert!(found.reply.starts_with("I found 1 note matching 'Charger'"));

    let missing = h.assistant.handle_at("find note umbrella", &mut silent, now);
    assert_eq!(missing.reply, "No notes found containing 'umbrella'");

    let deleted = h.assistant.handle_at("delete note 1", &mut silent, now);
    assert_eq!(deleted.reply, "Deleted note 1");
    assert_eq!(
        h.assistant.handle_at("list notes", &mut silent, now).reply,
        "You have no notes"
    );
}

#[test]
fn music_controls_drive_the_audio_backend() {
    let mut h = harness(CapabilitySet::all(), CannedHttp::default());
    let music_dir = h.assistant.config().music_dir.clone();
    fs::create_dir_all(&music_dir).unwrap();
    fs::write(music_dir.join("calm piano.mp3"), b"").unwrap();
    fs::write(music_dir.join("notes.txt"), b"").unwrap();
    let now = at("2025-03-01 09:00");
    let mut silent = ScriptedConversation::silent();

    assert_eq!(
        h.assistant.handle_at("pause music", &mut silent, now).reply,
        "No music is currently playing"
    );
    assert_eq!(
        h.assistant.handle_at("play music piano", &mut silent, now).reply,
        "Now playing: calm piano.mp3"
    );
    assert_eq!(
        h.audio.last_played.borrow().as_deref(),
        Some(music_dir.join("calm piano.mp3").as_path())
    );
    assert_eq!(
        h.assistant.handle_at("pause music", &mut silent, now).reply,
        "Music paused"
    );
    assert_eq!(
        h.assistant.handle_at("resume music", &mut silent, now).reply,
        "Music resumed"
    );
    assert_eq!(
        h.assistant.handle_at("set volume to 40", &mut silent, now).reply,
        "Volume set to 40%"
    );
    assert_eq!(*h.audio.live_volumes.borrow(), vec![0.4]);
    assert_eq!(
        h.assistant.handle_at("stop music", &mut silent, now).reply,
        "Music stopped"
    );
}

#[test]
fn decimal_volume_survives_normalization() {
    let mut h = harness(CapabilitySet::all(), CannedHttp::default());
    let music_dir = h.assistant.config().music_dir.clone();
    fs::create_dir_all(&music_dir).unwrap();
    fs::write(music_dir.join("calm piano.mp3"), b"").unwrap();
    let now = at("2025-03-01 09:00");
    let mut silent = ScriptedConversation::silent();

    assert_eq!(
        h.assistant.handle_at("set volume to 0.5", &mut silent, now).reply,
        "Volume set to 50%"
    );
    assert!(h.audio.live_volumes.borrow().is_empty());

    h.assistant.handle_at("play music", &mut silent, now);
    assert_eq!(
        h.assistant.handle_at("Set volume to 0.25.", &mut silent, now).reply,
        "Volume set to 25%"
    );
    assert_eq!(*h.audio.live_volumes.borrow(), vec![0.25]);
}

#[test]
fn track_names_keep_their_punctuation() {
    let mut h = harness(CapabilitySet::all(), CannedHttp::default());
    let music_dir = h.assistant.config().music_dir.clone();
    fs::create_dir_all(&music_dir).unwrap();
    fs::write(music_dir.join("my_song.mp3"), b"").unwrap();
    fs::write(music_dir.join("other-tune.ogg"), b"").unwrap();
    let now = at("2025-03-01 09:00");
    let mut silent = ScriptedConversation::silent();

    assert_eq!(
        h.assistant.handle_at("play music my_song", &mut silent, now).reply,
        "Now playing: my_song.mp3"
    );
    assert_eq!(
        h.assistant.handle_at("play song My_Song.mp3", &mut silent, now).reply,
        "Now playing: my_song.mp3"
    );
    assert_eq!(
        h.assistant.handle_at("play music other-tune!", &mut silent, now).reply,
        "Now playing: other-tune.ogg"
    );
    assert_eq!(
        h.audio.last_played.borrow().as_deref(),
        Some(music_dir.join("other-tune.ogg").as_path())
    );
}

#[test]
fn panicking_handler_becomes_an_apology() {
    let root = tempfile::tempdir().unwrap();
    let config = AssistantConfig::rooted_at(root.path());
    config.ensure_dirs().unwrap();
    let mut assistant = Assistant::new(
        config,
        CapabilitySet::all(),
        Box::new(PanickingRunner),
        Box::new(CannedHttp::default()),
        Box::new(SilentAudio::default()),
    );

    let outcome = assistant.handle_at(
        "cancel shutdown",
        &mut ScriptedConversation::silent(),
        at("2025-03-01 09:00"),
    );
    assert_eq!(outcome.command, Some(CommandKind::CancelShutdown));
    assert_eq!(outcome.reply, ERROR_MESSAGE);

    let next = assistant.handle_at(
        "thanks",
        &mut ScriptedConversation::silent(),
        at("2025-03-01 09:00"),
    );
    assert_eq!(
        next.reply,
        "You're welcome! Is there anything else I can help you with?"
    );
}
