//! To-do use-case service.
//!
//! # Responsibility
//! - Provide add/toggle/update/remove/list APIs over the to-do collection.
//! - Render the spoken list format `"{id}. [✓|□] {description} (Priority: {p})"`.
//!
//! # Invariants
//! - Toggling or updating one id never touches other records.
//! - Listing preserves insertion order.

use super::{required_text, TaskError};
use crate::model::todo::{Priority, TodoItem};
use crate::model::RecordId;
use crate::repo::json_repo::CollectionRepository;
use chrono::NaiveDateTime;
use log::info;

/// Partial update for one to-do item. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoPatch {
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub done: Option<bool>,
}

/// To-do service facade over repository implementations.
pub struct TodoService<R: CollectionRepository<TodoItem>> {
    repo: R,
}

impl<R: CollectionRepository<TodoItem>> TodoService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Adds one open item.
    pub fn add_todo(
        &self,
        description: &str,
        priority: Priority,
        now: NaiveDateTime,
    ) -> Result<TodoItem, TaskError> {
        let description = required_text(description, "task description")?;
        let item = self.repo.add(TodoItem::new(description, priority, now))?;
        info!(
            "event=todo_add module=service status=ok id={} priority={}",
            item.id, item.priority
        );
        Ok(item)
    }

    /// Lists items in insertion order; completed items only when requested.
    pub fn list_todos(&self, show_completed: bool) -> Result<Vec<TodoItem>, TaskError> {
        let items = self.repo.list()?;
        Ok(items
            .into_iter()
            .filter(|item| show_completed || !item.done)
            .collect())
    }

    /// Flips the done flag of one item.
    pub fn toggle_todo(
        &self,
        id: RecordId,
        now: NaiveDateTime,
    ) -> Result<Option<TodoItem>, TaskError> {
        Ok(self.repo.update(id, |item| item.toggle_done(now))?)
    }

    pub fn set_todo_done(
        &self,
        id: RecordId,
        done: bool,
        now: NaiveDateTime,
    ) -> Result<Option<TodoItem>, TaskError> {
        Ok(self.repo.update(id, |item| item.set_done(done, now))?)
    }

    /// Applies a partial update.
    ///
    /// # Errors
    /// - Returns [`TaskError::EmptyText`] when the patch blanks the description.
    pub fn update_todo(
        &self,
        id: RecordId,
        patch: &TodoPatch,
        now: NaiveDateTime,
    ) -> Result<Option<TodoItem>, TaskError> {
        let description = patch
            .description
            .as_deref()
            .map(|value| required_text(value, "task description"))
            .transpose()?;

        Ok(self.repo.update(id, |item| {
            if let Some(description) = description {
                item.description = description;
            }
            if let Some(priority) = patch.priority {
                item.priority = priority;
            }
            if let Some(done) = patch.done {
                if done != item.done {
                    item.set_done(done, now);
                }
            }
        })?)
    }

    /// Removes one item. Unknown ids are a no-op returning `false`.
    pub fn remove_todo(&self, id: RecordId) -> Result<bool, TaskError> {
        let removed = self.repo.remove(id)?;
        info!(
            "event=todo_remove module=service status={} id={}",
            if removed { "ok" } else { "missing" },
            id
        );
        Ok(removed)
    }

    /// Renders the spoken list, substituting an empty collection when the
    /// snapshot cannot be read.
    pub fn render_todo_list(&self, show_completed: bool) -> String {
        let items = self.repo.list_or_empty();
        render_todo_lines(&items, show_completed)
    }
}

/// Formats one item as a list line.
pub fn format_todo_line(item: &TodoItem) -> String {
    let status = if item.done { "✓" } else { "□" };
    format!(
        "{}. [{}] {} (Priority: {})",
        item.id, status, item.description, item.priority
    )
}

/// Renders items as newline-separated list lines with the empty-list messages.
pub fn render_todo_lines(items: &[TodoItem], show_completed: bool) -> String {
    if items.is_empty() {
        return "No tasks found".to_string();
    }

    let lines = items
        .iter()
        .filter(|item| show_completed || !item.done)
        .map(format_todo_line)
        .collect::<Vec<_>>();
    if lines.is_empty() {
        return "No active tasks found".to_string();
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::{format_todo_line, render_todo_lines};
    use crate::model::todo::{Priority, TodoItem};
    use chrono::NaiveDateTime;

    fn item(id: u64, description: &str, done: bool) -> TodoItem {
        let mut item = TodoItem::new(description, Priority::Medium, NaiveDateTime::default());
        item.id = id;
        item.done = done;
        item
    }

    #[test]
    fn formats_open_and_done_lines() {
        assert_eq!(
            format_todo_line(&item(1, "buy milk", false)),
            "1. [□] buy milk (Priority: medium)"
        );
        assert_eq!(
            format_todo_line(&item(2, "pay rent", true)),
            "2. [✓] pay rent (Priority: medium)"
        );
    }

    #[test]
    fn distinguishes_empty_from_all_done() {
        assert_eq!(render_todo_lines(&[], false), "No tasks found");
        assert_eq!(
            render_todo_lines(&[item(1, "done already", true)], false),
            "No active tasks found"
        );
        assert_eq!(
            render_todo_lines(&[item(1, "done already", true)], true),
            "1. [✓] done already (Priority: medium)"
        );
    }
}
