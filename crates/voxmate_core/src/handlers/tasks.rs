//! Task-manager handlers: to-dos, reminders and notes.
//!
//! # Responsibility
//! - Collect arguments inline or through follow-up questions.
//! - Turn service results into spoken replies.
//!
//! # Invariants
//! - Storage failures are logged and answered with an apology; they never
//!   abort the session.

use crate::command::first_number;
use crate::conversation::{ask_text, inline_or_ask, Conversation};
use crate::model::note::Note;
use crate::model::reminder::Reminder;
use crate::model::todo::{Priority, TodoItem};
use crate::repo::json_repo::CollectionRepository;
use crate::service::note_service::{format_note_line, NoteService};
use crate::service::reminder_service::{
    format_reminder_line, ReminderService, INVALID_TIME_MESSAGE,
};
use crate::service::todo_service::TodoService;
use crate::service::TaskError;
use chrono::NaiveDateTime;
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

static PRIORITY_SUFFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(.*?)\s+(?:with\s+)?(high|medium|normal|low)\s+priority$")
        .expect("valid priority suffix regex")
});
static RELATIVE_REMINDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:to\s+)?(.+?)\s+(in\s+\d{1,4}\s+(?:minutes?|mins?|hours?|days?))$")
        .expect("valid relative reminder regex")
});
static ABSOLUTE_REMINDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:to\s+)?(.+?)\s+(?:at|on)\s+(\d{4}-\d{2}-\d{2}(?:[ T]\d{1,2}:\d{2}(?::\d{2})?)?)$")
        .expect("valid absolute reminder regex")
});

fn storage_apology(what: &str, err: &TaskError) -> String {
    warn!(
        "event=task_handler module=handlers status=error collection={} error={}",
        what, err
    );
    format!("Sorry, I couldn't access your {what} right now.")
}

/// Splits a trailing "high priority" off an inline task description.
pub fn split_priority(description: &str) -> (String, Option<Priority>) {
    match PRIORITY_SUFFIX_RE.captures(description.trim()) {
        Some(captures) => (captures[1].trim().to_string(), Priority::parse(&captures[2])),
        None => (description.trim().to_string(), None),
    }
}

pub fn add_task<R: CollectionRepository<TodoItem>>(
    todos: &TodoService<R>,
    conversation: &mut dyn Conversation,
    inline: &str,
    now: NaiveDateTime,
) -> String {
    let (description, priority) = if inline.trim().is_empty() {
        let Some(description) = ask_text(conversation, "What task would you like to add?") else {
            return "I didn't catch the task. Please try again.".to_string();
        };
        let priority = ask_text(conversation, "What priority? High, medium, or low?")
            .and_then(|answer| Priority::parse(&answer))
            .unwrap_or_default();
        (description, priority)
    } else {
        let (description, priority) = split_priority(inline);
        (description, priority.unwrap_or_default())
    };

    match todos.add_todo(&description, priority, now) {
        Ok(item) => format!("Added task: {}", item.description),
        Err(TaskError::EmptyText(_)) => "I didn't catch the task. Please try again.".to_string(),
        Err(err) => storage_apology("tasks", &err),
    }
}

fn task_id(
    conversation: &mut dyn Conversation,
    inline: &str,
    prompt: &str,
) -> Option<u64> {
    first_number(inline).or_else(|| {
        ask_text(conversation, prompt).and_then(|answer| first_number(&answer))
    })
}

pub fn complete_task<R: CollectionRepository<TodoItem>>(
    todos: &TodoService<R>,
    conversation: &mut dyn Conversation,
    inline: &str,
    now: NaiveDateTime,
) -> String {
    let Some(id) = task_id(conversation, inline, "What is the task ID?") else {
        return "I need a task number to mark as complete.".to_string();
    };
    match todos.toggle_todo(id, now) {
        Ok(Some(item)) if item.done => format!("Marked task {id} as completed"),
        Ok(Some(_)) => format!("Marked task {id} as not completed"),
        Ok(None) => format!("Task {id} not found"),
        Err(err) => storage_apology("tasks", &err),
    }
}

pub fn remove_task<R: CollectionRepository<TodoItem>>(
    todos: &TodoService<R>,
    conversation: &mut dyn Conversation,
    inline: &str,
) -> String {
    let Some(id) = task_id(conversation, inline, "Which task number should I remove?") else {
        return "I need a task number to remove.".to_string();
    };
    match todos.remove_todo(id) {
        Ok(true) => format!("Removed task {id}"),
        Ok(false) => format!("Task {id} not found"),
        Err(err) => storage_apology("tasks", &err),
    }
}

/// Lists tasks; `show_completed` when the utterance mentions completed or all.
pub fn list_tasks<R: CollectionRepository<TodoItem>>(
    todos: &TodoService<R>,
    argument: &str,
) -> String {
    let show_completed = argument
        .split_whitespace()
        .any(|word| matches!(word, "completed" | "done" | "all"));
    format!("Here are your tasks:\n{}", todos.render_todo_list(show_completed))
}

/// Splits "to call mom in 10 minutes" into text and time.
pub fn split_inline_reminder(inline: &str) -> Option<(String, String)> {
    let inline = inline.trim();
    RELATIVE_REMINDER_RE
        .captures(inline)
        .or_else(|| ABSOLUTE_REMINDER_RE.captures(inline))
        .map(|captures| (captures[1].trim().to_string(), captures[2].trim().to_string()))
}

pub fn set_reminder<R: CollectionRepository<Reminder>>(
    reminders: &ReminderService<R>,
    conversation: &mut dyn Conversation,
    inline: &str,
    now: NaiveDateTime,
) -> String {
    let (text, when) = match split_inline_reminder(inline) {
        Some(parts) => parts,
        None => {
            let inline_text = inline.trim();
            let inline_text = inline_text
                .strip_prefix("to ")
                .unwrap_or(inline_text);
            let Some(text) = inline_or_ask(
                inline_text,
                conversation,
                "What would you like me to remind you about?",
            ) else {
                return "I didn't catch what to remind you about. Please try again.".to_string();
            };
            let Some(when) = ask_text(
                conversation,
                "When should I remind you? Please provide date and time (YYYY-MM-DD HH:MM)",
            ) else {
                return "I didn't catch when to remind you. Please try again.".to_string();
            };
            (text, when)
        }
    };

    match reminders.add_reminder(&text, &when, now) {
        Ok(reminder) => format!(
            "Reminder set for {}: {}",
            reminder.trigger_time.format("%Y-%m-%d %H:%M"),
            reminder.text
        ),
        Err(TaskError::InvalidTime(_)) => INVALID_TIME_MESSAGE.to_string(),
        Err(TaskError::EmptyText(_)) => {
            "I didn't catch what to remind you about. Please try again.".to_string()
        }
        Err(err) => storage_apology("reminders", &err),
    }
}

pub fn list_reminders<R: CollectionRepository<Reminder>>(reminders: &ReminderService<R>) -> String {
    let upcoming = reminders.upcoming_reminders();
    if upcoming.is_empty() {
        return "You have no upcoming reminders".to_string();
    }
    let lines = upcoming
        .iter()
        .map(format_reminder_line)
        .collect::<Vec<_>>()
        .join("\n");
    format!("Here are your reminders:\n{lines}")
}

/// Announcement for reminders due at `now`, or `None` when nothing is due.
pub fn due_reminder_announcement<R: CollectionRepository<Reminder>>(
    reminders: &ReminderService<R>,
    now: NaiveDateTime,
) -> Option<String> {
    let due = match reminders.due_reminders(now) {
        Ok(due) => due,
        Err(err) => {
            warn!(
                "event=reminder_check module=handlers status=error error={}",
                err
            );
            return None;
        }
    };
    if due.is_empty() {
        return None;
    }

    let mut lines = vec![format!(
        "You have {} reminder{} due.",
        due.len(),
        if due.len() > 1 { "s" } else { "" }
    )];
    lines.extend(due.iter().map(|reminder| format!("Reminder: {}", reminder.text)));
    Some(lines.join("\n"))
}

pub fn take_note<R: CollectionRepository<Note>>(
    notes: &NoteService<R>,
    conversation: &mut dyn Conversation,
    inline: &str,
    now: NaiveDateTime,
) -> String {
    let (title, text) = if inline.trim().is_empty() {
        let Some(title) = ask_text(conversation, "What's the title of your note?") else {
            return "I didn't catch the title. Please try again.".to_string();
        };
        let Some(text) = ask_text(conversation, "What's the content of your note?") else {
            return "I didn't catch the content. Please try again.".to_string();
        };
        (title, text)
    } else {
        (String::new(), inline.trim().to_string())
    };

    match notes.add_note(&title, &text, now) {
        Ok(note) => format!("Added note: {}", note.title),
        Err(TaskError::EmptyText(_)) => "I didn't catch the content. Please try again.".to_string(),
        Err(err) => storage_apology("notes", &err),
    }
}

pub fn find_note<R: CollectionRepository<Note>>(
    notes: &NoteService<R>,
    conversation: &mut dyn Conversation,
    inline: &str,
) -> String {
    let Some(query) = inline_or_ask(
        inline,
        conversation,
        "What are you looking for in your notes?",
    ) else {
        return "I didn't catch what to search for. Please try again.".to_string();
    };

    match notes.find_notes(&query) {
        Ok(found) if found.is_empty() => format!("No notes found containing '{query}'"),
        Ok(found) => {
            let mut lines = vec![format!(
                "I found {} note{} matching '{query}'",
                found.len(),
                if found.len() > 1 { "s" } else { "" }
            )];
            for note in &found {
                lines.push(format!("Title: {}", note.title));
                lines.push(format!("Content: {}", note.text));
            }
            lines.join("\n")
        }
        Err(TaskError::EmptyText(_)) => {
            "I didn't catch what to search for. Please try again.".to_string()
        }
        Err(err) => storage_apology("notes", &err),
    }
}

pub fn delete_note<R: CollectionRepository<Note>>(
    notes: &NoteService<R>,
    conversation: &mut dyn Conversation,
    inline: &str,
) -> String {
    let Some(id) = task_id(conversation, inline, "Which note number should I delete?") else {
        return "I need a note number to delete.".to_string();
    };
    match notes.remove_note(id) {
        Ok(true) => format!("Deleted note {id}"),
        Ok(false) => format!("Note {id} not found"),
        Err(err) => storage_apology("notes", &err),
    }
}

pub fn list_notes<R: CollectionRepository<Note>>(notes: &NoteService<R>) -> String {
    let all = notes.list_notes_or_empty();
    if all.is_empty() {
        return "You have no notes".to_string();
    }
    let lines = all
        .iter()
        .map(format_note_line)
        .collect::<Vec<_>>()
        .join("\n");
    format!("Here are your notes:\n{lines}")
}

#[cfg(test)]
mod tests {
    use super::{split_inline_reminder, split_priority};
    use crate::model::todo::Priority;

    #[test]
    fn splits_trailing_priority() {
        assert_eq!(
            split_priority("buy milk with high priority"),
            ("buy milk".to_string(), Some(Priority::High))
        );
        assert_eq!(
            split_priority("file taxes low priority"),
            ("file taxes".to_string(), Some(Priority::Low))
        );
        assert_eq!(split_priority("water plants"), ("water plants".to_string(), None));
    }

    #[test]
    fn splits_inline_reminders() {
        assert_eq!(
            split_inline_reminder("to call mom in 10 minutes"),
            Some(("call mom".to_string(), "in 10 minutes".to_string()))
        );
        assert_eq!(
            split_inline_reminder("to pay rent on 2025-05-01 09:00"),
            Some(("pay rent".to_string(), "2025-05-01 09:00".to_string()))
        );
        assert_eq!(split_inline_reminder("to call mom"), None);
    }
}
